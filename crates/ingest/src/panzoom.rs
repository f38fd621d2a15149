//! Streaming reader for the viewport-change event document.

use meetcast_common::{MeetcastError, MeetcastResult};
use meetcast_model::{Breakpoints, PanzoomEvent, ViewBox};
use quick_xml::events::Event;
use quick_xml::Reader;

/// Parse `panzooms.xml` into `(t, viewBox)` pairs, feeding every event
/// timestamp into the breakpoint accumulator.
pub fn ingest_panzooms(
    doc: &str,
    breakpoints: &mut Breakpoints,
) -> MeetcastResult<Vec<PanzoomEvent>> {
    let mut reader = Reader::from_str(doc);
    let mut events = Vec::new();
    let mut current_time: Option<f64> = None;
    let mut in_view_box = false;

    loop {
        match reader
            .read_event()
            .map_err(|e| MeetcastError::malformed(format!("panzoom document: {e}")))?
        {
            Event::Start(start) => match start.local_name().as_ref() {
                b"event" => {
                    current_time = Some(timestamp_attr(&start)?);
                }
                b"viewBox" => in_view_box = true,
                _ => {}
            },
            Event::Text(text) if in_view_box => {
                let raw = text
                    .unescape()
                    .map_err(|e| MeetcastError::malformed(format!("panzoom document: {e}")))?;
                let time = current_time.ok_or_else(|| {
                    MeetcastError::malformed("panzoom document: viewBox outside event")
                })?;
                let view_box = ViewBox::parse(&raw).ok_or_else(|| {
                    MeetcastError::malformed(format!("panzoom document: bad viewBox {raw:?}"))
                })?;
                breakpoints.push(time);
                events.push(PanzoomEvent { time, view_box });
            }
            Event::End(end) if end.local_name().as_ref() == b"viewBox" => {
                in_view_box = false;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    tracing::debug!(events = events.len(), "Panzoom timeline ingested");
    Ok(events)
}

fn timestamp_attr(start: &quick_xml::events::BytesStart<'_>) -> MeetcastResult<f64> {
    start
        .attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == b"timestamp")
        .and_then(|attr| attr.unescape_value().ok())
        .and_then(|value| value.parse::<f64>().ok())
        .ok_or_else(|| MeetcastError::malformed("event element carries no numeric timestamp"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_events_and_feeds_breakpoints() {
        let doc = r#"<recording>
            <event timestamp="0.0"><viewBox>0 0 1600 1200</viewBox></event>
            <event timestamp="4.0"><viewBox>100 50 800 600</viewBox></event>
        </recording>"#;
        let mut bp = Breakpoints::new();
        let events = ingest_panzooms(doc, &mut bp).unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].time, 0.0);
        assert_eq!(events[1].view_box, ViewBox::new(100.0, 50.0, 800.0, 600.0));
        assert_eq!(bp.finalize(10.0), vec![0.0, 4.0, 10.0]);
    }

    #[test]
    fn view_box_outside_event_is_malformed() {
        let doc = "<recording><viewBox>0 0 10 10</viewBox></recording>";
        let mut bp = Breakpoints::new();
        assert!(ingest_panzooms(doc, &mut bp).is_err());
    }
}
