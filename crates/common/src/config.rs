//! Render configuration.
//!
//! The source material for a rendered meeting is laid out by a fixed set of
//! pixel constants plus a handful of feature switches. Everything lives in an
//! immutable [`RenderConfig`] record that is passed through the pipeline; no
//! module-level globals.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete configuration for one render run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Feature switches.
    pub features: FeatureFlags,

    /// Composite frame layout.
    pub layout: Layout,

    /// Encoder settings.
    pub encoder: EncoderSettings,
}

/// Feature switches for optional pipeline behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureFlags {
    /// Gzip whiteboard frames (`.svgz`, best-speed level).
    pub svgz_compression: bool,

    /// Reference slide/poll images as `file://` URIs instead of inlining
    /// base64 data URIs.
    pub ffmpeg_reference_support: bool,

    /// Run the caption mux pass after the chapter pass.
    pub caption_support: bool,

    /// Drop a visible shape when the shape that follows it in z-order has
    /// the same id (the later one supersedes it).
    pub remove_redundant_shapes: bool,

    /// Ignore a recorded desk-share track.
    pub hide_deskshare: bool,

    /// Skip the chat panel entirely.
    pub hide_chat: bool,

    /// Pseudonymize chat sender names.
    pub hide_chat_names: bool,
}

/// Encoder invocation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderSettings {
    /// H.264 constant rate factor, 0-51.
    pub constant_rate_factor: u8,

    /// Log wall-clock timing around the encoder invocation.
    pub benchmark: bool,
}

/// Pixel geometry of the composite output frame.
///
/// The slide box sits immediately right of the webcam column, so the
/// slide-box x offset equals `webcams_width`; the cursor projector relies on
/// that when translating into composite coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layout {
    pub output_width: u32,
    pub output_height: u32,

    pub slides_x: u32,
    pub slides_y: u32,
    pub slides_width: u32,
    pub slides_height: u32,

    pub webcams_x: u32,
    pub webcams_y: u32,
    pub webcams_width: u32,
    pub webcams_height: u32,

    pub chat_outer_x: u32,
    pub chat_outer_y: u32,
    /// Width of the chat crop window and of every chat column.
    pub chat_width: u32,
    /// Height of the chat crop window.
    pub chat_height: u32,
    /// Height of one chat column in the sprite sheet.
    pub chat_canvas_height: u32,
    /// Vertical offset at which fresh messages start in a column. Equal to
    /// `chat_height` so the crop window `[chat_y, chat_y + chat_height]`
    /// ends exactly at the newest message's bottom edge.
    pub chat_starting_offset: u32,
    pub chat_font_size: u32,

    pub cursor_radius: u32,
    pub border_radius: u32,
    pub component_margin: u32,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            svgz_compression: true,
            ffmpeg_reference_support: false,
            caption_support: false,
            remove_redundant_shapes: false,
            hide_deskshare: false,
            hide_chat: false,
            hide_chat_names: false,
        }
    }
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            constant_rate_factor: 23,
            benchmark: false,
        }
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            output_width: 1920,
            output_height: 1080,
            slides_x: 320,
            slides_y: 0,
            slides_width: 1600,
            slides_height: 1080,
            webcams_x: 0,
            webcams_y: 0,
            webcams_width: 320,
            webcams_height: 240,
            chat_outer_x: 0,
            chat_outer_y: 250,
            chat_width: 320,
            chat_height: 820,
            chat_canvas_height: 1640,
            chat_starting_offset: 820,
            chat_font_size: 15,
            cursor_radius: 6,
            border_radius: 12,
            component_margin: 10,
        }
    }
}

impl Layout {
    /// Horizontal advance assumed per chat character (3:5 monospace aspect).
    pub fn chat_font_size_x(&self) -> u32 {
        self.chat_font_size * 6 / 10
    }

    /// Maximum characters per wrapped chat line.
    pub fn max_message_length(&self) -> usize {
        (self.chat_width / self.chat_font_size_x()).saturating_sub(1) as usize
    }

    /// Number of recent messages carried across a chat column transition.
    pub fn chat_tail_capacity(&self) -> usize {
        (self.chat_height as f64 / (3.0 * self.chat_font_size as f64)).ceil() as usize + 1
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "meetcast=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Log file path; stdout when absent.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}
