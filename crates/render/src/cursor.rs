//! Cursor sprite and overlay-command projection.
//!
//! The sprite is a single static SVG; motion happens entirely through
//! `sendcmd` updates to the overlay filter's x/y, one command per recorded
//! sample, projected through the view box active at that moment.

use meetcast_common::config::Layout;
use meetcast_model::{CursorSample, PanzoomEvent, ViewBox};

use crate::util::{fmt_px, fmt_secs};

/// One overlay command: move the cursor sprite to `(x, y)` at `time`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorCommand {
    pub time: f64,
    pub x: f64,
    pub y: f64,
}

/// The static cursor sprite: a red dot on a `2r` square canvas.
pub fn sprite_svg(radius: u32) -> String {
    let size = radius * 2;
    format!(
        concat!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{s}\" height=\"{s}\">",
            "<circle cx=\"{r}\" cy=\"{r}\" r=\"{r}\" fill=\"red\"/>",
            "</svg>\n"
        ),
        s = size,
        r = radius,
    )
}

/// Project every cursor sample into composite-frame coordinates.
///
/// Samples and panzoom events are walked in lockstep; each sample uses the
/// view box active at its timestamp. The slide image is letterboxed into
/// the slide area preserving aspect, so the cursor gets the same centered
/// offsets, then shifts right past the webcam column.
pub fn project(
    samples: &[CursorSample],
    panzooms: &[PanzoomEvent],
    layout: &Layout,
) -> Vec<CursorCommand> {
    let slides_w = layout.slides_width as f64;
    let slides_h = layout.slides_height as f64;
    let radius = layout.cursor_radius as f64;
    let fallback = ViewBox::new(0.0, 0.0, slides_w, slides_h);

    let mut commands = Vec::with_capacity(samples.len());
    let mut pz = 0usize;
    let mut active: Option<ViewBox> = None;

    for sample in samples {
        while pz < panzooms.len() && panzooms[pz].time <= sample.time {
            active = Some(panzooms[pz].view_box);
            pz += 1;
        }
        let view_box = active.unwrap_or(fallback);

        let world_x = sample.nx * view_box.w;
        let world_y = sample.ny * view_box.h;

        let scale = (slides_w / view_box.w).min(slides_h / view_box.h);
        let offset_x = (slides_w - scale * view_box.w) / 2.0;
        let offset_y = (slides_h - scale * view_box.h) / 2.0;

        commands.push(CursorCommand {
            time: sample.time,
            x: world_x * scale + offset_x - radius + layout.webcams_width as f64,
            y: world_y * scale + offset_y - radius,
        });
    }

    commands
}

/// Serialize the command stream for `sendcmd`.
pub fn command_stream(commands: &[CursorCommand]) -> String {
    let mut out = String::new();
    for cmd in commands {
        out.push_str(&format!(
            "{} overlay@m x {}, overlay@m y {};\n",
            fmt_secs(cmd.time),
            fmt_px(cmd.x),
            fmt_px(cmd.y),
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> Layout {
        Layout::default()
    }

    fn panzoom(time: f64, vb: ViewBox) -> PanzoomEvent {
        PanzoomEvent { time, view_box: vb }
    }

    #[test]
    fn sprite_is_a_red_dot_on_a_square_canvas() {
        let svg = sprite_svg(6);
        assert!(svg.contains("width=\"12\" height=\"12\""));
        assert!(svg.contains("<circle cx=\"6\" cy=\"6\" r=\"6\" fill=\"red\"/>"));
    }

    #[test]
    fn centered_sample_lands_in_the_slide_box_center() {
        // 1600x1200 view box into a 1600x1080 slide box: scale 0.9,
        // horizontal letterbox (1600 - 1440) / 2 = 80.
        let layout = layout();
        let panzooms = vec![panzoom(0.0, ViewBox::new(0.0, 0.0, 1600.0, 1200.0))];
        let samples = vec![CursorSample {
            time: 2.0,
            nx: 0.5,
            ny: 0.5,
        }];

        let commands = project(&samples, &panzooms, &layout);
        assert_eq!(commands.len(), 1);
        // 800 * 0.9 + 80 - 6 + 320
        assert!((commands[0].x - 1114.0).abs() < 1e-9);
        // 600 * 0.9 + 0 - 6
        assert!((commands[0].y - 534.0).abs() < 1e-9);
    }

    #[test]
    fn samples_after_a_viewport_change_use_the_new_view_box() {
        let layout = layout();
        let panzooms = vec![
            panzoom(0.0, ViewBox::new(0.0, 0.0, 1600.0, 1200.0)),
            panzoom(4.0, ViewBox::new(0.0, 0.0, 800.0, 600.0)),
        ];
        let samples = vec![
            CursorSample {
                time: 3.9,
                nx: 1.0,
                ny: 1.0,
            },
            CursorSample {
                time: 4.0,
                nx: 1.0,
                ny: 1.0,
            },
        ];

        let commands = project(&samples, &panzooms, &layout);
        // Old box: scale 0.9, x = 1600*0.9 + 80 - 6 + 320.
        assert!((commands[0].x - 1834.0).abs() < 1e-9);
        // New box: scale min(2.0, 1.8) = 1.8, offsets (1600-1440)/2 = 80, 0.
        assert!((commands[1].x - (800.0 * 1.8 + 80.0 - 6.0 + 320.0)).abs() < 1e-9);
        assert!((commands[1].y - (600.0 * 1.8 - 6.0)).abs() < 1e-9);
    }

    #[test]
    fn command_stream_is_monotone_and_three_decimal() {
        let commands = vec![
            CursorCommand {
                time: 0.0,
                x: 107.00049,
                y: 12.3456,
            },
            CursorCommand {
                time: 1.5,
                x: 1.0,
                y: 2.0,
            },
        ];
        let stream = command_stream(&commands);
        let lines: Vec<&str> = stream.lines().collect();
        assert_eq!(lines[0], "0 overlay@m x 107, overlay@m y 12.346;");
        assert_eq!(lines[1], "1.5 overlay@m x 1, overlay@m y 2;");
    }
}
