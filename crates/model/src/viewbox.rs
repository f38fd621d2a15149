//! The logical window over the slide canvas.

use serde::{Deserialize, Serialize};

/// An SVG-style view box, `x y w h` in slide canvas units.
///
/// The active view box defines the portion of the slide visible in the
/// slide area of the composite frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl ViewBox {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Parse the whitespace-separated `x y w h` form used by the viewport
    /// event stream. Returns `None` on any missing or non-numeric field.
    pub fn parse(text: &str) -> Option<Self> {
        let mut fields = text.split_whitespace().map(str::parse::<f64>);
        let x = fields.next()?.ok()?;
        let y = fields.next()?.ok()?;
        let w = fields.next()?.ok()?;
        let h = fields.next()?.ok()?;
        if w <= 0.0 || h <= 0.0 {
            return None;
        }
        Some(Self { x, y, w, h })
    }

    /// Width over height.
    pub fn aspect(&self) -> f64 {
        self.w / self.h
    }
}

impl std::fmt::Display for ViewBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {} {}", self.x, self.y, self.w, self.h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_whitespace_separated_fields() {
        let vb = ViewBox::parse("0 0 1600 1200").unwrap();
        assert_eq!(vb, ViewBox::new(0.0, 0.0, 1600.0, 1200.0));

        let vb = ViewBox::parse("  107.5 -12.25\t800 600 ").unwrap();
        assert_eq!(vb.x, 107.5);
        assert_eq!(vb.y, -12.25);
    }

    #[test]
    fn rejects_malformed_and_degenerate_boxes() {
        assert!(ViewBox::parse("").is_none());
        assert!(ViewBox::parse("0 0 1600").is_none());
        assert!(ViewBox::parse("0 0 x 1200").is_none());
        assert!(ViewBox::parse("0 0 0 1200").is_none());
        assert!(ViewBox::parse("0 0 1600 -5").is_none());
    }

    #[test]
    fn display_round_trips() {
        let vb = ViewBox::new(10.0, 20.0, 1600.0, 900.0);
        assert_eq!(ViewBox::parse(&vb.to_string()), Some(vb));
    }
}
