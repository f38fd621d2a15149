//! Text measurement and measured word wrap for whiteboard text annotations.
//!
//! Pixel widths come from an external font-metric oracle keyed on the
//! DejaVuSans font; the contract is just (string, point size) -> width.

use std::process::Command;

use meetcast_common::{MeetcastError, MeetcastResult};

/// Font-metric oracle.
pub trait FontMetrics {
    /// Rendered width of `text` at `point_size`, in pixels.
    fn measure(&self, text: &str, point_size: f64) -> MeetcastResult<f64>;
}

/// Metrics from ImageMagick's annotate debug channel.
///
/// `convert -debug annotate xc: -family <font> -pointsize <pt> -annotate 0
/// <text> null:` prints a `Metrics:` line on stderr carrying the rendered
/// width.
#[derive(Debug, Clone)]
pub struct AnnotateFontMetrics {
    pub command: String,
    pub font_family: String,
}

impl Default for AnnotateFontMetrics {
    fn default() -> Self {
        Self {
            command: "convert".to_string(),
            font_family: "DejaVuSans".to_string(),
        }
    }
}

impl FontMetrics for AnnotateFontMetrics {
    fn measure(&self, text: &str, point_size: f64) -> MeetcastResult<f64> {
        let output = Command::new(&self.command)
            .args(["-debug", "annotate", "xc:", "-family"])
            .arg(&self.font_family)
            .arg("-pointsize")
            .arg(format!("{point_size}"))
            .args(["-annotate", "0"])
            .arg(text)
            .arg("null:")
            .output()
            .map_err(|e| MeetcastError::tool(format!("Cannot run {}: {e}", self.command)))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        parse_annotate_width(&stderr).ok_or_else(|| {
            MeetcastError::tool(format!(
                "{} reported no text metrics for {:?}",
                self.command, text
            ))
        })
    }
}

fn parse_annotate_width(stderr: &str) -> Option<f64> {
    for line in stderr.lines() {
        let Some(rest) = line.split("width:").nth(1) else {
            continue;
        };
        let number: String = rest
            .trim_start()
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        if let Ok(width) = number.parse::<f64>() {
            return Some(width);
        }
    }
    None
}

/// Deterministic metrics assuming a fixed advance per character.
///
/// Used by tests and as a stand-in when no metric tool is installed.
#[derive(Debug, Clone, Copy)]
pub struct FixedAdvanceMetrics {
    /// Advance as a fraction of the point size.
    pub advance_ratio: f64,
}

impl Default for FixedAdvanceMetrics {
    fn default() -> Self {
        Self { advance_ratio: 0.6 }
    }
}

impl FontMetrics for FixedAdvanceMetrics {
    fn measure(&self, text: &str, point_size: f64) -> MeetcastResult<f64> {
        Ok(text.chars().count() as f64 * point_size * self.advance_ratio)
    }
}

/// Greedy measured wrap.
///
/// Splits `text` by `separator` and accumulates tokens while the joined
/// candidate still fits `max_width`. A single token wider than `max_width`
/// is re-packed with an empty separator (character level), and the last
/// char-level fragment is requeued as the start of the next line so
/// following tokens may join it.
pub fn pack(
    metrics: &dyn FontMetrics,
    text: &str,
    separator: &str,
    point_size: f64,
    max_width: f64,
) -> MeetcastResult<Vec<String>> {
    let tokens: Vec<String> = if separator.is_empty() {
        text.chars().map(String::from).collect()
    } else {
        text.split(separator).map(str::to_string).collect()
    };

    let mut lines = Vec::new();
    let mut acc = String::new();

    for token in tokens {
        let candidate = if acc.is_empty() {
            token.clone()
        } else {
            format!("{acc}{separator}{token}")
        };
        if metrics.measure(&candidate, point_size)? <= max_width {
            acc = candidate;
            continue;
        }

        if !acc.is_empty() {
            lines.push(std::mem::take(&mut acc));
        }

        if separator.is_empty() || metrics.measure(&token, point_size)? <= max_width {
            // A lone oversized character still becomes its own line.
            acc = token;
        } else {
            let mut fragments = pack(metrics, &token, "", point_size, max_width)?;
            let tail = fragments.pop().unwrap_or_default();
            lines.extend(fragments);
            acc = tail;
        }
    }

    if !acc.is_empty() {
        lines.push(acc);
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    // advance 0.6 * pt 10 = 6px per char
    const METRICS: FixedAdvanceMetrics = FixedAdvanceMetrics { advance_ratio: 0.6 };

    fn pack6(text: &str, max_chars: usize) -> Vec<String> {
        pack(&METRICS, text, " ", 10.0, max_chars as f64 * 6.0).unwrap()
    }

    #[test]
    fn short_text_stays_on_one_line() {
        assert_eq!(pack6("hello world", 11), vec!["hello world"]);
    }

    #[test]
    fn overflow_breaks_between_words() {
        assert_eq!(pack6("hello brave world", 11), vec!["hello brave", "world"]);
        assert_eq!(pack6("aa bb cc dd", 5), vec!["aa bb", "cc dd"]);
    }

    #[test]
    fn oversized_word_breaks_char_wise_and_requeues_tail() {
        // "efgh ij" would still overflow four columns, so the requeued
        // fragment stays alone.
        assert_eq!(pack6("abcdefgh ij", 4), vec!["abcd", "efgh", "ij"]);
        // With room, the next word joins the requeued tail.
        assert_eq!(pack6("abcdefghi xy", 7), vec!["abcdefg", "hi xy"]);
    }

    #[test]
    fn parses_imagemagick_annotate_metrics() {
        let stderr = "2026-01-04T10:00:00 0:00.01 0.010u Metrics: text: hi; \
                      font: DejaVuSans; pointsize: 15; width: 18; height: 21";
        assert_eq!(parse_annotate_width(stderr), Some(18.0));
        assert_eq!(parse_annotate_width("no metrics here"), None);
    }

    #[test]
    fn empty_text_yields_no_lines() {
        assert!(pack6("", 10).is_empty());
    }
}
