//! Streaming reader for the cursor trajectory document.

use meetcast_common::{MeetcastError, MeetcastResult};
use meetcast_model::CursorSample;
use quick_xml::events::Event;
use quick_xml::Reader;

/// Parse `cursor.xml` into time-ordered samples.
///
/// A `<cursor>` element is paired with its most recent enclosing `<event>`;
/// an `<event>` without a `<cursor>` child contributes nothing.
pub fn ingest_cursor(doc: &str) -> MeetcastResult<Vec<CursorSample>> {
    let mut reader = Reader::from_str(doc);
    let mut samples = Vec::new();
    let mut current_time: Option<f64> = None;
    let mut in_cursor = false;

    loop {
        match reader
            .read_event()
            .map_err(|e| MeetcastError::malformed(format!("cursor document: {e}")))?
        {
            Event::Start(start) => match start.local_name().as_ref() {
                b"event" => {
                    current_time = Some(
                        start
                            .attributes()
                            .flatten()
                            .find(|attr| attr.key.as_ref() == b"timestamp")
                            .and_then(|attr| attr.unescape_value().ok())
                            .and_then(|value| value.parse::<f64>().ok())
                            .ok_or_else(|| {
                                MeetcastError::malformed(
                                    "cursor document: event carries no numeric timestamp",
                                )
                            })?,
                    );
                }
                b"cursor" => in_cursor = true,
                _ => {}
            },
            Event::Text(text) if in_cursor => {
                let raw = text
                    .unescape()
                    .map_err(|e| MeetcastError::malformed(format!("cursor document: {e}")))?;
                let time = current_time.ok_or_else(|| {
                    MeetcastError::malformed("cursor document: cursor outside event")
                })?;
                let mut fields = raw.split_whitespace().map(str::parse::<f64>);
                let (Some(Ok(nx)), Some(Ok(ny))) = (fields.next(), fields.next()) else {
                    return Err(MeetcastError::malformed(format!(
                        "cursor document: bad position {raw:?}"
                    )));
                };
                samples.push(CursorSample { time, nx, ny });
            }
            Event::End(end) if end.local_name().as_ref() == b"cursor" => {
                in_cursor = false;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    tracing::debug!(samples = samples.len(), "Cursor trajectory ingested");
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_cursor_with_enclosing_event() {
        let doc = r#"<recording>
            <event timestamp="1.5"><cursor>0.25 0.75</cursor></event>
            <event timestamp="2.0"/>
            <event timestamp="3.0"><cursor>-1.0 -1.0</cursor></event>
        </recording>"#;
        let samples = ingest_cursor(doc).unwrap();

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].time, 1.5);
        assert_eq!((samples[0].nx, samples[0].ny), (0.25, 0.75));
        // A cursor-less event must not shift the pairing.
        assert_eq!(samples[1].time, 3.0);
        assert_eq!((samples[1].nx, samples[1].ny), (-1.0, -1.0));
    }

    #[test]
    fn bad_position_is_malformed() {
        let doc = r#"<recording><event timestamp="1"><cursor>0.5</cursor></event></recording>"#;
        assert!(ingest_cursor(doc).is_err());
    }
}
