//! The recording descriptor: parse for the pipeline, rewrite on success.

use std::io::Cursor;

use meetcast_common::{MeetcastError, MeetcastResult};
use quick_xml::events::{BytesText, Event};
use quick_xml::{Reader, Writer};

/// The facts the pipeline needs from `metadata.xml`.
#[derive(Debug, Clone, PartialEq)]
pub struct MeetingMetadata {
    /// Recording length in seconds (the source stores milliseconds).
    pub duration_secs: f64,

    /// Human-readable meeting name, used as the MP4 title.
    pub meeting_name: String,

    /// Original playback format, e.g. `presentation`.
    pub playback_format: String,

    /// Original playback link.
    pub playback_link: String,
}

/// Parse `metadata.xml`.
pub fn ingest_metadata(doc: &str) -> MeetcastResult<MeetingMetadata> {
    let mut reader = Reader::from_str(doc);
    let mut path: Vec<String> = Vec::new();

    let mut duration_ms: Option<f64> = None;
    let mut meeting_name: Option<String> = None;
    let mut playback_format = String::new();
    let mut playback_link = String::new();

    loop {
        match reader
            .read_event()
            .map_err(|e| MeetcastError::malformed(format!("metadata document: {e}")))?
        {
            Event::Start(start) => {
                path.push(String::from_utf8_lossy(start.local_name().as_ref()).into_owned());
            }
            Event::End(_) => {
                path.pop();
            }
            Event::Text(text) => {
                let value = text
                    .unescape()
                    .map_err(|e| MeetcastError::malformed(format!("metadata document: {e}")))?;
                let value = value.trim();
                if value.is_empty() {
                    continue;
                }
                match path_tail(&path) {
                    Some(["playback", "duration"]) => {
                        duration_ms = value.parse::<f64>().ok();
                    }
                    Some(["meta", "meetingName"]) => {
                        meeting_name = Some(value.to_string());
                    }
                    Some(["playback", "format"]) => {
                        playback_format = value.to_string();
                    }
                    Some(["playback", "link"]) => {
                        playback_link = value.to_string();
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let duration_ms = duration_ms.ok_or_else(|| {
        MeetcastError::malformed("metadata document carries no playback duration")
    })?;
    let meeting_name = meeting_name
        .ok_or_else(|| MeetcastError::malformed("metadata document carries no meetingName"))?;

    Ok(MeetingMetadata {
        duration_secs: duration_ms / 1000.0,
        meeting_name,
        playback_format,
        playback_link,
    })
}

fn path_tail(path: &[String]) -> Option<[&str; 2]> {
    if path.len() < 2 {
        return None;
    }
    Some([&path[path.len() - 2], &path[path.len() - 1]])
}

/// Rewrite the descriptor for the rendered video: `playback/format` becomes
/// `video` and `playback/link` points at the MP4. Everything else passes
/// through untouched.
pub fn rewrite_for_video(doc: &str, link: &str) -> MeetcastResult<String> {
    let mut reader = Reader::from_str(doc);
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    let mut path: Vec<String> = Vec::new();
    let mut replace_text: Option<&str> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| MeetcastError::malformed(format!("metadata document: {e}")))?;
        match event {
            Event::Start(start) => {
                path.push(String::from_utf8_lossy(start.local_name().as_ref()).into_owned());
                let rewrite = match path_tail(&path) {
                    Some(["playback", "format"]) => Some("video"),
                    Some(["playback", "link"]) => Some(link),
                    _ => None,
                };
                writer
                    .write_event(Event::Start(start))
                    .map_err(write_error)?;
                if let Some(text) = rewrite {
                    writer
                        .write_event(Event::Text(BytesText::new(text)))
                        .map_err(write_error)?;
                    replace_text = Some(text);
                }
            }
            Event::End(_) => {
                path.pop();
                replace_text = None;
                writer.write_event(event).map_err(write_error)?;
            }
            Event::Text(_) if replace_text.is_some() => {}
            Event::Eof => break,
            other => {
                writer.write_event(other).map_err(write_error)?;
            }
        }
    }

    String::from_utf8(writer.into_inner().into_inner())
        .map_err(|e| MeetcastError::output(format!("metadata rewrite produced bad UTF-8: {e}")))
}

fn write_error(e: impl std::fmt::Display) -> MeetcastError {
    MeetcastError::output(format!("metadata rewrite failed: {e}"))
}
