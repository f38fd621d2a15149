//! Pointwise event streams recorded during the session.
//!
//! All three streams arrive sorted by timestamp; ingest rejects nothing on
//! ordering grounds, but downstream emission assumes monotone input.

use serde::{Deserialize, Serialize};

use crate::viewbox::ViewBox;

/// A viewport change. The view box becomes active at `time` and stays
/// active until the next event's time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanzoomEvent {
    /// Seconds from recording start.
    pub time: f64,

    /// The view box activated by this event.
    pub view_box: ViewBox,
}

/// A cursor position sample, normalized to the active view box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CursorSample {
    /// Seconds from recording start.
    pub time: f64,

    /// Normalized x in `[0, 1]`; out-of-range values mean "hidden" and
    /// project off-canvas.
    pub nx: f64,

    /// Normalized y in `[0, 1]`.
    pub ny: f64,
}

/// One public chat message. Both fields are HTML-sanitized plain text in
/// NFC form by the time this struct exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Seconds from recording start.
    pub time: f64,

    /// Sender display name.
    pub name: String,

    /// Message body.
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panzoom_events_serialize_with_their_view_box() {
        let event = PanzoomEvent {
            time: 4.0,
            view_box: ViewBox::new(0.0, 0.0, 1600.0, 1200.0),
        };
        let json = serde_json::to_string(&event).unwrap();
        let parsed: PanzoomEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, parsed);
    }

    #[test]
    fn chat_message_round_trips() {
        let msg = ChatMessage {
            time: 3.5,
            name: "Ada".into(),
            text: "hello".into(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(msg, serde_json::from_str::<ChatMessage>(&json).unwrap());
    }
}
