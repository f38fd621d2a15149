//! Streaming reader for the chat timeline document.

use meetcast_common::{MeetcastError, MeetcastResult};
use meetcast_model::ChatMessage;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use unicode_normalization::UnicodeNormalization;

use crate::xml::unescape_lossy;

/// Parse `slides_new.xml` into time-ordered chat messages.
///
/// Only `<chattimeline target="chat">` entries count; name and message are
/// sanitized to plain NFC text here, before any layout runs.
pub fn ingest_chat(doc: &str) -> MeetcastResult<Vec<ChatMessage>> {
    let mut reader = Reader::from_str(doc);
    let mut messages = Vec::new();

    loop {
        match reader
            .read_event()
            .map_err(|e| MeetcastError::malformed(format!("chat document: {e}")))?
        {
            Event::Start(start) | Event::Empty(start) => {
                if start.local_name().as_ref() == b"chattimeline"
                    && attr_of(&start, "target").as_deref() == Some("chat")
                {
                    messages.push(message_from(&start)?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    tracing::debug!(messages = messages.len(), "Chat timeline ingested");
    Ok(messages)
}

fn message_from(start: &BytesStart<'_>) -> MeetcastResult<ChatMessage> {
    let time = attr_of(start, "in")
        .and_then(|v| v.parse::<f64>().ok())
        .ok_or_else(|| MeetcastError::malformed("chattimeline carries no numeric in attribute"))?;
    let name = attr_of(start, "name")
        .ok_or_else(|| MeetcastError::malformed("chattimeline carries no name attribute"))?;
    let text = attr_of(start, "message")
        .ok_or_else(|| MeetcastError::malformed("chattimeline carries no message attribute"))?;

    Ok(ChatMessage {
        time,
        name: sanitize(&name),
        text: sanitize(&text),
    })
}

fn attr_of(start: &BytesStart<'_>, name: &str) -> Option<String> {
    start.attributes().flatten().find_map(|attr| {
        (attr.key.as_ref() == name.as_bytes())
            .then(|| attr.unescape_value().ok())
            .flatten()
            .map(|value| value.into_owned())
    })
}

/// Reduce embedded HTML to plain NFC text: tags removed, character
/// references resolved.
pub fn sanitize(text: &str) -> String {
    let mut stripped = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            c if !in_tag => stripped.push(c),
            _ => {}
        }
    }
    unescape_lossy(&stripped).nfc().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_chat_entries_only() {
        let doc = r#"<popcorn>
            <chattimeline target="chat" name="Ada" message="hello" in="3.5"/>
            <chattimeline target="slide" name="x" message="y" in="4.0"/>
            <chattimeline target="chat" name="Grace" message="hi there" in="7.25"/>
        </popcorn>"#;
        let messages = ingest_chat(doc).unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].name, "Ada");
        assert_eq!(messages[0].time, 3.5);
        assert_eq!(messages[1].text, "hi there");
    }

    #[test]
    fn sanitize_strips_tags_and_resolves_references() {
        assert_eq!(sanitize("<a href=\"x\">link</a> text"), "link text");
        assert_eq!(sanitize("a &amp; b"), "a & b");
        assert_eq!(sanitize("1 &lt; 2"), "1 < 2");
        assert_eq!(sanitize("plain"), "plain");
    }

    #[test]
    fn sanitize_normalizes_to_nfc() {
        // e + combining acute -> precomposed e-acute
        assert_eq!(sanitize("e\u{0301}"), "\u{00e9}");
    }

    #[test]
    fn embedded_markup_in_attribute_is_stripped() {
        let doc = r#"<popcorn><chattimeline target="chat" name="Ada" message="&lt;b&gt;bold&lt;/b&gt; move" in="1.0"/></popcorn>"#;
        let messages = ingest_chat(doc).unwrap();
        assert_eq!(messages[0].text, "bold move");
    }
}
