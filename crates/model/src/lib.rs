//! Meetcast Timeline Model
//!
//! In-memory representation of a recorded presentation session:
//! - **Annotations:** timestamped whiteboard shapes and slide segments
//! - **Events:** pan/zoom viewport changes, cursor samples, chat messages
//! - **Interval tree:** static index answering "which shapes are visible at t"
//! - **Breakpoints:** the merged set of re-render moments
//!
//! This crate is pure data — no I/O, no parsing, no platform dependencies.

pub mod annotation;
pub mod breakpoints;
pub mod event;
pub mod interval_tree;
pub mod viewbox;

pub use annotation::{ShapeAnnotation, SlideSegment};
pub use breakpoints::Breakpoints;
pub use event::{ChatMessage, CursorSample, PanzoomEvent};
pub use interval_tree::IntervalTree;
pub use viewbox::ViewBox;
