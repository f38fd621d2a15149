//! Whiteboard frame emission.
//!
//! One SVG per breakpoint interval: the active slide, clipped to the active
//! view box, letterboxed into the slide area, with every visible shape
//! drawn over it in z-order. A concat playlist carries the frame durations
//! for the encoder.

use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;
use meetcast_common::config::{FeatureFlags, Layout};
use meetcast_common::{MeetcastError, MeetcastResult};
use meetcast_model::breakpoints::frame_intervals;
use meetcast_model::{IntervalTree, PanzoomEvent, ShapeAnnotation, SlideSegment, ViewBox};

use crate::scratch::Scratch;

/// Result of the frame emission pass.
#[derive(Debug)]
pub struct EmittedFrames {
    pub frame_count: usize,
    pub playlist: String,
}

/// Emit every frame plus the concat playlist.
pub fn emit_frames(
    scratch: &Scratch,
    times: &[f64],
    slides: &[SlideSegment],
    shapes: &[ShapeAnnotation],
    panzooms: &[PanzoomEvent],
    layout: &Layout,
    features: &FeatureFlags,
) -> MeetcastResult<EmittedFrames> {
    let tree = IntervalTree::build(
        &shapes
            .iter()
            .map(|shape| (shape.begin, shape.end))
            .collect::<Vec<_>>(),
    );

    let svgz = features.svgz_compression;
    let mut playlist = String::new();
    let mut frame_count = 0usize;

    let mut pz = 0usize;
    let mut active_view: Option<ViewBox> = None;
    let mut slide_idx: Option<usize> = None;

    for (index, (t_a, t_b)) in frame_intervals(times).enumerate() {
        while pz < panzooms.len() && panzooms[pz].time <= t_a {
            active_view = Some(panzooms[pz].view_box);
            pz += 1;
        }
        while slides
            .get(slide_idx.map_or(0, |idx| idx + 1))
            .is_some_and(|next| t_a >= next.begin)
        {
            slide_idx = Some(slide_idx.map_or(0, |idx| idx + 1));
        }
        let slide = slide_idx.and_then(|idx| slides.get(idx)).filter(|s| t_a < s.end);

        // The stab is closed on both ends; a shape leaving exactly at t_a
        // belongs to the previous frame, not this one.
        let mut visible: Vec<&ShapeAnnotation> = tree
            .stab(t_a)
            .into_iter()
            .map(|idx| &shapes[idx])
            .filter(|shape| shape.end > t_a)
            .collect();
        if features.remove_redundant_shapes {
            visible = dedup_adjacent(visible);
        }

        let view_box = active_view.unwrap_or_else(|| default_view(slide, layout));
        let svg = compose_frame(slide, &visible, view_box, layout);
        write_frame(scratch, index, &svg, svgz)?;

        playlist.push_str(&format!("file {}\n", scratch.frame_ref(index, svgz)));
        playlist.push_str(&format!("duration {:.1}\n", t_b - t_a));
        frame_count = index + 1;
    }

    // Concat-demuxer convention: the last frame repeats without a duration.
    if frame_count > 0 {
        playlist.push_str(&format!("file {}\n", scratch.frame_ref(frame_count - 1, svgz)));
    }
    std::fs::write(scratch.whiteboard_timestamps(), &playlist)?;

    tracing::info!(frames = frame_count, "Whiteboard frames emitted");
    Ok(EmittedFrames {
        frame_count,
        playlist,
    })
}

/// Drop any shape whose id equals the next visible shape's id; the later
/// one supersedes it.
fn dedup_adjacent<'a>(visible: Vec<&'a ShapeAnnotation>) -> Vec<&'a ShapeAnnotation> {
    let mut kept = Vec::with_capacity(visible.len());
    for (idx, shape) in visible.iter().enumerate() {
        let superseded = visible
            .get(idx + 1)
            .is_some_and(|next| next.id == shape.id);
        if !superseded {
            kept.push(*shape);
        }
    }
    kept
}

fn default_view(slide: Option<&SlideSegment>, layout: &Layout) -> ViewBox {
    match slide {
        Some(slide) => ViewBox::new(0.0, 0.0, slide.width, slide.height),
        None => ViewBox::new(
            0.0,
            0.0,
            layout.slides_width as f64,
            layout.slides_height as f64,
        ),
    }
}

/// Compose one frame.
///
/// The outer view box widens or heightens the active view box to the slide
/// area's aspect ratio, centering the content — the same letterbox the
/// cursor projector assumes. The inner `<svg>` clips to the active view
/// box.
pub fn compose_frame(
    slide: Option<&SlideSegment>,
    visible: &[&ShapeAnnotation],
    view_box: ViewBox,
    layout: &Layout,
) -> String {
    let box_aspect = layout.slides_width as f64 / layout.slides_height as f64;
    let outer = letterbox(view_box, box_aspect);

    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" \
         width=\"{}\" height=\"{}\" viewBox=\"{}\">\n",
        layout.slides_width, layout.slides_height, outer,
    );
    svg.push_str(&format!(
        "<svg x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" viewBox=\"{vb}\">\n",
        view_box.x,
        view_box.y,
        view_box.w,
        view_box.h,
        vb = view_box,
    ));
    if let Some(slide) = slide {
        svg.push_str(&format!(
            "<image xlink:href=\"{}\" width=\"{}\" height=\"{}\"/>\n",
            slide.href, slide.width, slide.height,
        ));
    }
    for shape in visible {
        svg.push_str(&shape.value);
        svg.push('\n');
    }
    svg.push_str("</svg>\n</svg>\n");
    svg
}

fn letterbox(view_box: ViewBox, box_aspect: f64) -> ViewBox {
    if view_box.aspect() > box_aspect {
        let h = view_box.w / box_aspect;
        ViewBox::new(
            view_box.x,
            view_box.y - (h - view_box.h) / 2.0,
            view_box.w,
            h,
        )
    } else {
        let w = view_box.h * box_aspect;
        ViewBox::new(
            view_box.x - (w - view_box.w) / 2.0,
            view_box.y,
            w,
            view_box.h,
        )
    }
}

fn write_frame(scratch: &Scratch, index: usize, svg: &str, svgz: bool) -> MeetcastResult<()> {
    let path = scratch.frame_path(index, svgz);
    if svgz {
        let file = std::fs::File::create(&path)?;
        let mut encoder = GzEncoder::new(file, Compression::fast());
        encoder.write_all(svg.as_bytes())?;
        encoder
            .finish()
            .map_err(|e| MeetcastError::output(format!("cannot gzip frame {index}: {e}")))?;
    } else {
        std::fs::write(&path, svg)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use meetcast_model::Breakpoints;

    fn layout() -> Layout {
        Layout::default()
    }

    fn plain_features() -> FeatureFlags {
        FeatureFlags {
            svgz_compression: false,
            ..FeatureFlags::default()
        }
    }

    fn slide(begin: f64, end: f64) -> SlideSegment {
        SlideSegment {
            href: "file:///pub/slide-1.png".into(),
            begin,
            end,
            width: 1600.0,
            height: 1200.0,
        }
    }

    fn shape(begin: f64, end: f64, id: &str) -> ShapeAnnotation {
        ShapeAnnotation::new(
            begin,
            end,
            format!("<g style=\"stroke:red\"><line id=\"{id}\"/></g>"),
            id,
        )
    }

    #[test]
    fn single_slide_no_shapes_emits_one_frame() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = Scratch::create(dir.path()).unwrap();

        let mut bp = Breakpoints::new();
        bp.extend([0.0, 10.0]);
        let times = bp.finalize(10.0);

        let emitted = emit_frames(
            &scratch,
            &times,
            &[slide(0.0, 10.0)],
            &[],
            &[],
            &layout(),
            &plain_features(),
        )
        .unwrap();

        assert_eq!(emitted.frame_count, 1);
        assert_eq!(
            emitted.playlist,
            "file ../frames/frame0.svg\nduration 10.0\nfile ../frames/frame0.svg\n"
        );
        assert!(scratch.frame_path(0, false).exists());
    }

    #[test]
    fn shape_visibility_tracks_breakpoint_intervals() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = Scratch::create(dir.path()).unwrap();

        let shapes = vec![shape(1.0, 5.0, "a"), shape(3.0, 8.0, "b")];
        let mut bp = Breakpoints::new();
        bp.extend([0.0, 10.0, 1.0, 5.0, 3.0, 8.0]);
        let times = bp.finalize(10.0);
        assert_eq!(times, vec![0.0, 1.0, 3.0, 5.0, 8.0, 10.0]);

        let emitted = emit_frames(
            &scratch,
            &times,
            &[slide(0.0, 10.0)],
            &shapes,
            &[],
            &layout(),
            &plain_features(),
        )
        .unwrap();
        assert_eq!(emitted.frame_count, 5);

        // Interval [3,5): both shapes, a before b.
        let frame = std::fs::read_to_string(scratch.frame_path(2, false)).unwrap();
        let a_pos = frame.find("id=\"a\"").unwrap();
        let b_pos = frame.find("id=\"b\"").unwrap();
        assert!(a_pos < b_pos);

        // Interval [5,8): shape a left exactly at 5, only b remains.
        let frame = std::fs::read_to_string(scratch.frame_path(3, false)).unwrap();
        assert!(!frame.contains("id=\"a\""));
        assert!(frame.contains("id=\"b\""));

        let frame = std::fs::read_to_string(scratch.frame_path(4, false)).unwrap();
        assert!(!frame.contains("id=\"a\""));
        assert!(!frame.contains("id=\"b\""));
    }

    #[test]
    fn panzoom_switches_view_box_at_its_breakpoint() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = Scratch::create(dir.path()).unwrap();

        let panzooms = vec![
            PanzoomEvent {
                time: 0.0,
                view_box: ViewBox::new(0.0, 0.0, 1600.0, 1200.0),
            },
            PanzoomEvent {
                time: 4.0,
                view_box: ViewBox::new(100.0, 50.0, 800.0, 600.0),
            },
        ];
        let mut bp = Breakpoints::new();
        bp.extend([0.0, 10.0, 0.0, 4.0]);
        let times = bp.finalize(10.0);

        emit_frames(
            &scratch,
            &times,
            &[slide(0.0, 10.0)],
            &[],
            &panzooms,
            &layout(),
            &plain_features(),
        )
        .unwrap();

        let before = std::fs::read_to_string(scratch.frame_path(0, false)).unwrap();
        assert!(before.contains("viewBox=\"0 0 1600 1200\""));
        let after = std::fs::read_to_string(scratch.frame_path(1, false)).unwrap();
        assert!(after.contains("viewBox=\"100 50 800 600\""));
    }

    #[test]
    fn adjacent_duplicate_ids_drop_the_earlier_shape() {
        let visible_owned = vec![shape(0.0, 5.0, "a"), shape(1.0, 5.0, "a"), shape(2.0, 5.0, "b")];
        let visible: Vec<&ShapeAnnotation> = visible_owned.iter().collect();
        let kept = dedup_adjacent(visible);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].begin, 1.0);
        assert_eq!(kept[1].id, "b");
    }

    #[test]
    fn letterbox_centers_the_view_box() {
        // Wider than the 40:27 slide box: pad vertically.
        let outer = letterbox(ViewBox::new(0.0, 0.0, 1600.0, 600.0), 1600.0 / 1080.0);
        assert_eq!(outer.w, 1600.0);
        assert!((outer.h - 1080.0).abs() < 1e-9);
        assert!((outer.y - (0.0 - (1080.0 - 600.0) / 2.0)).abs() < 1e-9);

        // Taller: pad horizontally.
        let outer = letterbox(ViewBox::new(0.0, 0.0, 1600.0, 1200.0), 1600.0 / 1080.0);
        assert!((outer.w - 1200.0 * 1600.0 / 1080.0).abs() < 1e-9);
        assert_eq!(outer.h, 1200.0);
    }

    #[test]
    fn playlist_is_deterministic_across_runs() {
        let run = || {
            let dir = tempfile::tempdir().unwrap();
            let scratch = Scratch::create(dir.path()).unwrap();
            let shapes = vec![shape(1.0, 5.0, "a"), shape(3.0, 8.0, "b")];
            let mut bp = Breakpoints::new();
            bp.extend([0.0, 10.0, 1.0, 5.0, 3.0, 8.0]);
            emit_frames(
                &scratch,
                &bp.finalize(10.0),
                &[slide(0.0, 10.0)],
                &shapes,
                &[],
                &layout(),
                &plain_features(),
            )
            .unwrap()
            .playlist
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn svgz_frames_get_the_svgz_extension_and_gzip_magic() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = Scratch::create(dir.path()).unwrap();
        let mut bp = Breakpoints::new();
        bp.extend([0.0, 10.0]);

        let emitted = emit_frames(
            &scratch,
            &bp.finalize(10.0),
            &[slide(0.0, 10.0)],
            &[],
            &[],
            &layout(),
            &FeatureFlags::default(),
        )
        .unwrap();

        assert!(emitted.playlist.starts_with("file ../frames/frame0.svgz\n"));
        let bytes = std::fs::read(scratch.frame_path(0, true)).unwrap();
        assert_eq!(&bytes[..2], &[0x1f, 0x8b]);
    }
}
