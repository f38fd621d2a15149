//! Meetcast Ingest
//!
//! Turns the published source artifacts of a meeting into in-memory
//! timelines:
//! - **Shapes:** normalization of the annotated-shapes document plus the
//!   timed whiteboard ingest (slides, shape visibility intervals)
//! - **Panzoom / cursor / chat:** streaming readers over the event XML files
//! - **Metadata / captions:** the recording descriptor and caption manifest
//!
//! Everything here reads; emission lives in `meetcast-render`.

pub mod captions;
pub mod chat;
pub mod cursor;
pub mod metadata;
pub mod panzoom;
pub mod shapes;
pub mod text;
pub mod xml;

pub use captions::CaptionTrack;
pub use metadata::MeetingMetadata;
pub use shapes::{ShapeNormalizer, WhiteboardTimeline};
pub use text::{FontMetrics, FixedAdvanceMetrics};
