//! Meetcast CLI — compose a published meeting recording into one MP4.
//!
//! Usage:
//!   meetcast --meeting-id <ID> [--format presentation] [--log-stdout]
//!
//! Exits 0 on success, 0 silently when the recording was published in a
//! format other than `presentation`, and nonzero on any failure (scratch
//! files are retained for diagnosis).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use meetcast_common::config::{LoggingConfig, RenderConfig};
use meetcast_ingest::text::AnnotateFontMetrics;
use meetcast_render::pipeline::{render_meeting, RenderRequest};

#[derive(Parser)]
#[command(
    name = "meetcast",
    about = "Render a published meeting recording as a composite video",
    version
)]
struct Cli {
    /// Internal meeting id of the published recording
    #[arg(long)]
    meeting_id: String,

    /// Playback format the recording was published with
    #[arg(long, default_value = "presentation")]
    format: String,

    /// Log to stdout instead of the per-meeting log file
    #[arg(long)]
    log_stdout: bool,

    /// Root of the published recordings tree
    #[arg(long, default_value = "/var/bigbluebutton/published")]
    publish_root: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Only presentation recordings carry the artifacts this tool composes.
    if cli.format != "presentation" {
        return ExitCode::SUCCESS;
    }

    let published_dir = cli.publish_root.join("presentation").join(&cli.meeting_id);
    let video_dir = cli.publish_root.join("video").join(&cli.meeting_id);

    let log_file = (!cli.log_stdout).then(|| published_dir.join("meetcast.log"));
    meetcast_common::logging::init_logging(&LoggingConfig {
        level: "info".to_string(),
        json: false,
        file: log_file,
    });

    let config = RenderConfig::default();
    let metrics = AnnotateFontMetrics::default();
    let request = RenderRequest {
        meeting_id: cli.meeting_id.clone(),
        published_dir,
        video_dir,
    };

    match render_meeting(&request, &config, &metrics).await {
        Ok(rendered) => {
            tracing::info!(
                mp4 = %rendered.mp4.display(),
                frames = rendered.frame_count,
                "Render complete"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(
                meeting = %cli.meeting_id,
                error = %err,
                "Render failed; scratch files retained"
            );
            ExitCode::FAILURE
        }
    }
}
