//! Timestamped whiteboard content: shape annotations and slide segments.

use serde::{Deserialize, Serialize};

/// A whiteboard annotation visible over a closed time interval.
///
/// `value` is a self-contained `<g>` subtree ready to be embedded in a frame
/// SVG. `id` is the shape's stable identifier: the last dash-separated token
/// of the source document's shape attribute, constant across the partial
/// redraws a single pencil stroke produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeAnnotation {
    /// Seconds from recording start at which the shape appears.
    pub begin: f64,

    /// Seconds from recording start at which the shape disappears.
    pub end: f64,

    /// Serialized `<g>` fragment.
    pub value: String,

    /// Stable shape identifier.
    pub id: String,
}

impl ShapeAnnotation {
    pub fn new(begin: f64, end: f64, value: impl Into<String>, id: impl Into<String>) -> Self {
        debug_assert!(begin <= end);
        Self {
            begin,
            end,
            value: value.into(),
            id: id.into(),
        }
    }

    /// Whether the closed interval `[begin, end]` covers `t`.
    pub fn covers(&self, t: f64) -> bool {
        self.begin <= t && t <= self.end
    }
}

/// One slide's presence on the whiteboard.
///
/// Segments never overlap in time and arrive sorted by `begin`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideSegment {
    /// Image reference: a `data:image/...;base64,...` URI or a `file://`
    /// URI, depending on the reference-support policy flag.
    pub href: String,

    /// Seconds at which the slide becomes current.
    pub begin: f64,

    /// Seconds at which the slide is replaced.
    pub end: f64,

    /// Native image width in slide canvas units.
    pub width: f64,

    /// Native image height in slide canvas units.
    pub height: f64,
}

impl SlideSegment {
    /// Whether this segment is a desk-share placeholder.
    pub fn is_deskshare(&self) -> bool {
        self.href.contains("deskshare")
    }
}
