//! The render pipeline: ingest, emit, encode, chapter, publish.
//!
//! One cooperative pass, no internal parallelism. Each external process is
//! awaited before the next stage starts. Scratch cleanup runs only on the
//! success path; a failed run leaves everything behind for diagnosis.

use std::path::{Path, PathBuf};
use std::time::Instant;

use meetcast_common::config::RenderConfig;
use meetcast_common::{MeetcastError, MeetcastResult};
use meetcast_ingest::text::FontMetrics;
use meetcast_ingest::{captions, chat as chat_ingest, cursor as cursor_ingest};
use meetcast_ingest::{metadata, panzoom, shapes};
use meetcast_model::Breakpoints;

use crate::chat::{self, ChatOptions};
use crate::chapters;
use crate::cursor;
use crate::encoder::{self, SubtitleTrack};
use crate::filtergraph::{self, ChatJob, EncoderJob};
use crate::scratch::Scratch;
use crate::whiteboard;

/// One meeting to render.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// Internal meeting id (the published directory name).
    pub meeting_id: String,

    /// Published presentation root holding the source artifacts.
    pub published_dir: PathBuf,

    /// Destination for the rewritten playback descriptor.
    pub video_dir: PathBuf,
}

/// What a successful run produced.
#[derive(Debug)]
pub struct RenderedMeeting {
    pub mp4: PathBuf,
    pub frame_count: usize,
    pub duration_secs: f64,
}

/// Render one meeting end to end.
pub async fn render_meeting(
    request: &RenderRequest,
    config: &RenderConfig,
    metrics: &dyn FontMetrics,
) -> MeetcastResult<RenderedMeeting> {
    let started = Instant::now();
    let published = &request.published_dir;

    let metadata_doc = read_required(&published.join("metadata.xml"))?;
    let meta = metadata::ingest_metadata(&metadata_doc)?;
    tracing::info!(
        meeting = %meta.meeting_name,
        duration_secs = meta.duration_secs,
        "Rendering meeting"
    );

    let scratch = Scratch::create(published)?;

    // Normalize the shapes document once, persist it, then stream the
    // timed ingest over the rewritten form.
    let shapes_doc = read_required(&published.join("shapes.svg"))?;
    let normalizer = shapes::ShapeNormalizer::new(
        metrics,
        config.features.ffmpeg_reference_support,
        published,
    );
    let modified = normalizer.normalize(&shapes_doc)?;
    std::fs::write(scratch.shapes_modified(), &modified)?;

    let mut breakpoints = Breakpoints::new();
    let timeline = shapes::ingest_whiteboard(&modified, &mut breakpoints)?;
    let panzooms = panzoom::ingest_panzooms(
        &read_required(&published.join("panzooms.xml"))?,
        &mut breakpoints,
    )?;
    let cursor_samples =
        cursor_ingest::ingest_cursor(&read_required(&published.join("cursor.xml"))?)?;

    let times = breakpoints.finalize(meta.duration_secs);
    tracing::info!(
        breakpoints = times.len(),
        slides = timeline.slides.len(),
        shapes = timeline.shapes.len(),
        panzooms = panzooms.len(),
        cursor_samples = cursor_samples.len(),
        "Timelines merged"
    );

    let emitted = whiteboard::emit_frames(
        &scratch,
        &times,
        &timeline.slides,
        &timeline.shapes,
        &panzooms,
        &config.layout,
        &config.features,
    )?;

    std::fs::write(
        scratch.cursor_svg(),
        cursor::sprite_svg(config.layout.cursor_radius),
    )?;
    let cursor_commands = cursor::project(&cursor_samples, &panzooms, &config.layout);
    std::fs::write(
        scratch.cursor_timestamps(),
        cursor::command_stream(&cursor_commands),
    )?;

    let chat_render = if config.features.hide_chat {
        None
    } else {
        match std::fs::read_to_string(published.join("slides_new.xml")) {
            Ok(doc) => {
                let messages = chat_ingest::ingest_chat(&doc)?;
                chat::layout_chat(
                    &messages,
                    &config.layout,
                    &ChatOptions {
                        hide_names: config.features.hide_chat_names,
                        name_salt: chat::process_salt(),
                    },
                )
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No chat timeline found; chat panel disabled");
                None
            }
            Err(err) => return Err(err.into()),
        }
    };
    let chat_job = match &chat_render {
        Some(render) => {
            std::fs::write(scratch.chat_svg(), &render.svg)?;
            std::fs::write(
                scratch.chat_timestamps(),
                chat::command_stream(&render.commands),
            )?;
            Some(ChatJob {
                sprite: scratch.chat_svg(),
                commands: scratch.chat_timestamps(),
            })
        }
        None => None,
    };

    let webcams = find_track(&published.join("video"), "webcams")
        .ok_or_else(|| MeetcastError::missing(published.join("video").join("webcams.mp4")))?;
    let deskshare = if config.features.hide_deskshare {
        None
    } else {
        let found = find_track(&published.join("deskshare"), "deskshare");
        if found.is_none() {
            tracing::info!("No desk-share track found; desk-share disabled");
        }
        found
    };

    if !encoder::command_exists("ffmpeg") {
        return Err(MeetcastError::tool("ffmpeg not found on PATH"));
    }

    let threads = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let job = EncoderJob {
        whiteboard_playlist: scratch.whiteboard_timestamps(),
        cursor_sprite: scratch.cursor_svg(),
        cursor_commands: scratch.cursor_timestamps(),
        webcams,
        deskshare,
        chat: chat_job,
        duration_secs: meta.duration_secs,
        meeting_name: meta.meeting_name.clone(),
        threads,
        output: scratch.render_mp4(),
    };
    let args = filtergraph::assemble(&job, &config.layout, &config.encoder);
    encoder::run_ffmpeg(&args, config.encoder.benchmark)?;

    // Chapter pass: dump metadata, append chapter blocks, remux.
    encoder::extract_ffmetadata(&scratch.render_mp4(), &scratch.meeting_metadata())?;
    let chapter_list = chapters::slide_chapters(&timeline.slides, meta.duration_secs);
    let mut metadata_dump = std::fs::read_to_string(scratch.meeting_metadata())?;
    metadata_dump.push_str(&chapters::chapter_blocks(&chapter_list));
    std::fs::write(scratch.meeting_metadata(), metadata_dump)?;

    let subtitles = if config.features.caption_support {
        subtitle_tracks(published)?
    } else {
        Vec::new()
    };
    let remux = encoder::remux_args(
        &scratch.render_mp4(),
        &scratch.meeting_metadata(),
        &subtitles,
        &scratch.muxed_mp4(),
    );
    encoder::run_ffmpeg(&remux, false)?;

    let final_mp4 = published.join("meeting.mp4");
    std::fs::rename(scratch.muxed_mp4(), &final_mp4).map_err(|e| {
        MeetcastError::output(format!("cannot move {} into place: {e}", final_mp4.display()))
    })?;

    let link = video_link(&meta.playback_link, &request.meeting_id);
    let rewritten = metadata::rewrite_for_video(&metadata_doc, &link)?;
    std::fs::create_dir_all(&request.video_dir)?;
    std::fs::write(request.video_dir.join("metadata.xml"), rewritten)?;

    scratch
        .cleanup()
        .map_err(|e| MeetcastError::output(format!("scratch cleanup failed: {e}")))?;

    tracing::info!(
        mp4 = %final_mp4.display(),
        frames = emitted.frame_count,
        chapters = chapter_list.len(),
        elapsed_secs = started.elapsed().as_secs_f64(),
        "Meeting rendered"
    );
    Ok(RenderedMeeting {
        mp4: final_mp4,
        frame_count: emitted.frame_count,
        duration_secs: meta.duration_secs,
    })
}

fn read_required(path: &Path) -> MeetcastResult<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            Err(MeetcastError::missing(path))
        }
        Err(err) => Err(err.into()),
    }
}

/// Look for `<stem>.mp4` then `<stem>.webm` under `dir`.
fn find_track(dir: &Path, stem: &str) -> Option<PathBuf> {
    ["mp4", "webm"]
        .iter()
        .map(|ext| dir.join(format!("{stem}.{ext}")))
        .find(|path| path.exists())
}

fn subtitle_tracks(published: &Path) -> MeetcastResult<Vec<SubtitleTrack>> {
    let tracks = captions::load_captions(&published.join("captions.json"))?;
    Ok(tracks
        .into_iter()
        .filter_map(|track| {
            let vtt = published.join(track.vtt_name());
            vtt.exists().then_some(SubtitleTrack {
                vtt,
                language: track.locale,
            })
        })
        .collect())
}

/// Point the playback link at the rendered video, keeping the original
/// scheme and host when the old link carries one.
fn video_link(original: &str, meeting_id: &str) -> String {
    let video_path = format!("/playback/video/{meeting_id}/");
    match original.find("/playback/") {
        Some(idx) => format!("{}{}", &original[..idx], video_path),
        None => video_path,
    }
}
