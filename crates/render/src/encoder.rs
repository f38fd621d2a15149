//! External encoder invocations.
//!
//! Each child process is spawned, awaited to completion, and checked; a
//! nonzero exit surfaces as a tool error carrying the trimmed stderr.

use std::path::Path;
use std::process::{Command, Stdio};

use meetcast_common::{MeetcastError, MeetcastResult};

/// Whether a binary resolves on PATH.
pub fn command_exists(binary: &str) -> bool {
    Command::new("sh")
        .arg("-c")
        .arg(format!("command -v {binary} >/dev/null 2>&1"))
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Run ffmpeg with the prepared arguments, optionally timing the encode.
pub fn run_ffmpeg(args: &[String], benchmark: bool) -> MeetcastResult<()> {
    tracing::debug!(args = ?args, "Running ffmpeg");
    let started = std::time::Instant::now();

    let output = Command::new("ffmpeg")
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| MeetcastError::tool(format!("Failed to start ffmpeg: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(MeetcastError::tool(format!(
            "ffmpeg failed (status {}): {}",
            output.status,
            stderr.trim()
        )));
    }

    if benchmark {
        tracing::info!(
            elapsed_secs = started.elapsed().as_secs_f64(),
            "ffmpeg invocation finished"
        );
    }
    Ok(())
}

/// Dump the intermediate MP4's metadata in ffmetadata form.
pub fn extract_ffmetadata(input: &Path, output: &Path) -> MeetcastResult<()> {
    let mut args: Vec<String> = ["-y", "-hide_banner", "-loglevel", "error", "-i"]
        .map(String::from)
        .to_vec();
    args.push(input.display().to_string());
    args.push("-f".into());
    args.push("ffmetadata".into());
    args.push(output.display().to_string());
    run_ffmpeg(&args, false)
}

/// One subtitle track for the caption pass.
#[derive(Debug, Clone)]
pub struct SubtitleTrack {
    pub vtt: std::path::PathBuf,
    pub language: String,
}

/// Build the chapter/caption remux arguments: stream copy from the
/// intermediate MP4, metadata (with appended chapters) from the dumped
/// file, captions mapped as `mov_text` subtitle streams.
pub fn remux_args(
    input: &Path,
    metadata: &Path,
    subtitles: &[SubtitleTrack],
    output: &Path,
) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-y".into(),
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-i".into(),
        input.display().to_string(),
        "-i".into(),
        metadata.display().to_string(),
    ];
    for track in subtitles {
        args.push("-i".into());
        args.push(track.vtt.display().to_string());
    }

    args.push("-map_metadata".into());
    args.push("1".into());
    args.push("-map".into());
    args.push("0".into());
    for (idx, _) in subtitles.iter().enumerate() {
        args.push("-map".into());
        args.push(format!("{}", idx + 2));
    }

    args.push("-codec".into());
    args.push("copy".into());
    if !subtitles.is_empty() {
        args.push("-c:s".into());
        args.push("mov_text".into());
        for (idx, track) in subtitles.iter().enumerate() {
            args.push(format!("-metadata:s:s:{idx}"));
            args.push(format!("language={}", track.language));
        }
    }

    args.push(output.display().to_string());
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn remux_copies_streams_and_attaches_metadata() {
        let args = remux_args(
            Path::new("/pub/render.mp4"),
            Path::new("/pub/meeting_metadata"),
            &[],
            Path::new("/pub/muxed.mp4"),
        );
        let joined = args.join(" ");
        assert!(joined.contains("-i /pub/render.mp4 -i /pub/meeting_metadata"));
        assert!(joined.contains("-map_metadata 1 -map 0"));
        assert!(joined.contains("-codec copy"));
        assert!(!joined.contains("mov_text"));
        assert_eq!(args.last().unwrap(), "/pub/muxed.mp4");
    }

    #[test]
    fn remux_maps_each_caption_as_mov_text() {
        let subtitles = vec![
            SubtitleTrack {
                vtt: PathBuf::from("/pub/caption_en-US.vtt"),
                language: "en-US".into(),
            },
            SubtitleTrack {
                vtt: PathBuf::from("/pub/caption_de-DE.vtt"),
                language: "de-DE".into(),
            },
        ];
        let args = remux_args(
            Path::new("/pub/render.mp4"),
            Path::new("/pub/meeting_metadata"),
            &subtitles,
            Path::new("/pub/muxed.mp4"),
        );
        let joined = args.join(" ");
        assert!(joined.contains("-map 2 -map 3"));
        assert!(joined.contains("-c:s mov_text"));
        assert!(joined.contains("-metadata:s:s:0 language=en-US"));
        assert!(joined.contains("-metadata:s:s:1 language=de-DE"));
    }
}
