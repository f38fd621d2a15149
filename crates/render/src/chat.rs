//! Chat sprite-sheet layout.
//!
//! All messages render once into a single SVG laid out as fixed-width
//! columns; playback reveals the newest message by moving a crop window
//! over the sprite via `sendcmd`. A column transition replays the tail of
//! the previous column into the fresh column's header region so the crop
//! window never jumps over unseen text.

use std::collections::VecDeque;
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use meetcast_common::config::Layout;
use meetcast_model::ChatMessage;
use sha1::{Digest, Sha1};

use crate::util::fmt_secs;

/// One crop command: move the crop origin to `(x, y)` at `time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatCommand {
    pub time_ms: u64,
    pub x: u32,
    pub y: u32,
}

/// The laid-out chat sprite and its command stream.
#[derive(Debug)]
pub struct ChatRender {
    pub svg: String,
    pub commands: Vec<ChatCommand>,
    pub width: u32,
    pub height: u32,
}

/// Chat layout options.
#[derive(Debug, Clone, Copy)]
pub struct ChatOptions {
    /// Replace sender names with stable pseudonyms.
    pub hide_names: bool,

    /// Salt mixed into the pseudonym hash, stable per process.
    pub name_salt: u64,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            hide_names: false,
            name_salt: process_salt(),
        }
    }
}

/// Nanosecond-of-startup salt, fixed for the lifetime of the process.
pub fn process_salt() -> u64 {
    static SALT: OnceLock<u64> = OnceLock::new();
    *SALT.get_or_init(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos() as u64)
            .unwrap_or(0)
    })
}

struct TailEntry {
    header: String,
    lines: Vec<String>,
    x: u32,
    rtl: bool,
}

/// Lay out the full message stream. Returns `None` for an empty stream so
/// the caller can omit every chat input and filter branch.
pub fn layout_chat(
    messages: &[ChatMessage],
    layout: &Layout,
    options: &ChatOptions,
) -> Option<ChatRender> {
    if messages.is_empty() {
        return None;
    }

    let font = layout.chat_font_size;
    let max_len = layout.max_message_length().max(1);
    let tail_capacity = layout.chat_tail_capacity();

    let mut body = String::new();
    let mut commands = Vec::with_capacity(messages.len());
    let mut tail: VecDeque<TailEntry> = VecDeque::with_capacity(tail_capacity);

    let mut svg_x = 0u32;
    let mut svg_y = layout.chat_starting_offset;
    let mut chat_x = 0u32;
    let mut chat_y = 0u32;

    for message in messages {
        let name = if options.hide_names {
            pseudonym(&message.name, options.name_salt)
        } else {
            message.name.clone()
        };
        let rtl = is_rtl(&message.text);
        let lines = wrap_message(&message.text, max_len);
        let height = (lines.len() as u32 + 2) * font;

        if svg_y + height > layout.chat_canvas_height {
            // Replay the previous column's footer into the fresh column's
            // header region, bottom-up from the crop window height.
            let mut dup_y = layout.chat_height as i64;
            for entry in &tail {
                if dup_y < 0 {
                    break;
                }
                let x = entry.x + layout.chat_width;
                for line in entry.lines.iter().rev() {
                    write_text(&mut body, layout, x, dup_y, line, entry.rtl, false);
                    dup_y -= font as i64;
                }
                write_text(&mut body, layout, x, dup_y, &entry.header, false, true);
                dup_y -= font as i64;
            }

            svg_x += layout.chat_width;
            chat_x += layout.chat_width;
            svg_y = layout.chat_starting_offset;
            chat_y = height;
        } else {
            chat_y += height;
        }

        commands.push(ChatCommand {
            time_ms: (message.time * 1000.0).round() as u64,
            x: chat_x,
            y: chat_y,
        });

        let header = format!("{}    {}", name, clock_time(message.time));
        let mut y = (svg_y + font) as i64;
        write_text(&mut body, layout, svg_x, y, &header, false, true);
        for line in &lines {
            y += font as i64;
            write_text(&mut body, layout, svg_x, y, line, rtl, false);
        }
        svg_y += height;

        tail.push_front(TailEntry {
            header,
            lines,
            x: svg_x,
            rtl,
        });
        tail.truncate(tail_capacity);
    }

    let width = svg_x + layout.chat_width;
    let height = if svg_x == 0 {
        svg_y
    } else {
        layout.chat_canvas_height
    };

    let svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\">\n{body}</svg>\n"
    );
    Some(ChatRender {
        svg,
        commands,
        width,
        height,
    })
}

/// Serialize the crop-command stream for `sendcmd`.
pub fn command_stream(commands: &[ChatCommand]) -> String {
    let mut out = String::new();
    for cmd in commands {
        out.push_str(&format!(
            "{} crop@c x {}, crop@c y {};\n",
            fmt_secs(cmd.time_ms as f64 / 1000.0),
            cmd.x,
            cmd.y,
        ));
    }
    out
}

fn write_text(
    out: &mut String,
    layout: &Layout,
    x: u32,
    y: i64,
    text: &str,
    rtl: bool,
    bold: bool,
) {
    out.push_str("<text x=\"");
    if rtl {
        out.push_str(&(x + layout.chat_width).to_string());
    } else {
        out.push_str(&x.to_string());
    }
    out.push_str("\" y=\"");
    out.push_str(&y.to_string());
    out.push_str("\" font-family=\"monospace\" font-size=\"");
    out.push_str(&layout.chat_font_size.to_string());
    out.push('"');
    if bold {
        out.push_str(" font-weight=\"bold\"");
    }
    if rtl {
        out.push_str(" text-anchor=\"end\"");
    }
    out.push('>');
    out.push_str(&escape_text(text));
    out.push_str("</text>\n");
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

/// Session clock rendered `HH:MM:SS` (UTC offset zero).
fn clock_time(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

/// Fixed-advance wrap: break at the last space once a line would exceed
/// `max_len` characters, or mid-word when no space fits; the character at a
/// hard break starts the next line.
fn wrap_message(text: &str, max_len: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }

    let mut lines = Vec::new();
    let mut start = 0usize;
    let mut last_space: Option<usize> = None;
    let mut i = 0usize;

    while i < chars.len() {
        if chars[i] == ' ' {
            last_space = Some(i);
        }
        if i - start + 1 > max_len {
            match last_space {
                Some(space) if space >= start => {
                    lines.push(chars[start..space].iter().collect());
                    start = space + 1;
                }
                _ => {
                    lines.push(chars[start..i].iter().collect());
                    start = i;
                }
            }
            last_space = None;
            continue;
        }
        i += 1;
    }

    let tail: String = chars[start..].iter().collect();
    if !tail.is_empty() || lines.is_empty() {
        lines.push(tail);
    }
    lines
}

/// A message is right-to-left iff its first directionally classed
/// character falls in the RTL ranges.
fn is_rtl(text: &str) -> bool {
    for c in text.chars() {
        let cp = c as u32;
        if is_rtl_codepoint(cp) {
            return true;
        }
        if is_ltr_codepoint(c, cp) {
            return false;
        }
    }
    false
}

fn is_rtl_codepoint(cp: u32) -> bool {
    matches!(cp, 0x0591..=0x07FF | 0xFB1D..=0xFDFD | 0xFE70..=0xFEFC)
}

fn is_ltr_codepoint(c: char, cp: u32) -> bool {
    c.is_ascii_alphabetic()
        || matches!(
            cp,
            0x00C0..=0x02B8
                | 0x0300..=0x0590
                | 0x0800..=0x1FFF
                | 0x2C00..=0xFB1C
                | 0xFDFE..=0xFE6F
                | 0xFEFD..=0xFFFF
        )
}

/// Stable pseudonym: the first 11 characters of the bubble-babble encoding
/// of SHA-1(name || salt).
fn pseudonym(name: &str, salt: u64) -> String {
    let mut hasher = Sha1::new();
    hasher.update(name.as_bytes());
    hasher.update(salt.to_le_bytes());
    let digest = hasher.finalize();
    bubble_babble(&digest).chars().take(11).collect()
}

fn bubble_babble(input: &[u8]) -> String {
    const VOWELS: &[u8] = b"aeiouy";
    const CONSONANTS: &[u8] = b"bcdfghklmnprstvzx";

    let rounds = input.len() / 2 + 1;
    let mut seed = 1usize;
    let mut out = String::from("x");

    for i in 0..rounds {
        if i + 1 < rounds || input.len() % 2 != 0 {
            let byte1 = input[2 * i] as usize;
            out.push(VOWELS[(((byte1 >> 6) & 3) + seed) % 6] as char);
            out.push(CONSONANTS[(byte1 >> 2) & 15] as char);
            out.push(VOWELS[((byte1 & 3) + seed / 6) % 6] as char);
            if i + 1 < rounds {
                let byte2 = input[2 * i + 1] as usize;
                out.push(CONSONANTS[(byte2 >> 4) & 15] as char);
                out.push('-');
                out.push(CONSONANTS[byte2 & 15] as char);
                seed = (seed * 5 + byte1 * 7 + byte2) % 36;
            }
        } else {
            out.push(VOWELS[seed % 6] as char);
            out.push(CONSONANTS[16] as char);
            out.push(VOWELS[seed / 6] as char);
        }
    }
    out.push('x');
    out
}
