//! Chapter derivation and ffmetadata serialization.

use meetcast_model::SlideSegment;

/// One chapter in the final MP4.
#[derive(Debug, Clone, PartialEq)]
pub struct Chapter {
    pub start_secs: f64,
    pub end_secs: f64,
    pub title: String,
}

/// Minimum on-screen span for a slide to earn a chapter.
const MIN_CHAPTER_SPAN_SECS: f64 = 0.25;

/// Derive the chapter list from the slide timeline. Slides and desk-share
/// stretches number independently.
pub fn slide_chapters(slides: &[SlideSegment], duration_secs: f64) -> Vec<Chapter> {
    let mut chapters = Vec::new();
    let mut slide_no = 0u32;
    let mut deskshare_no = 0u32;

    for slide in slides {
        let end = slide.end.min(duration_secs);
        if end - slide.begin <= MIN_CHAPTER_SPAN_SECS || slide.begin >= duration_secs {
            continue;
        }
        let title = if slide.is_deskshare() {
            deskshare_no += 1;
            format!("Screen sharing {deskshare_no}")
        } else {
            slide_no += 1;
            format!("Slide {slide_no}")
        };
        chapters.push(Chapter {
            start_secs: slide.begin,
            end_secs: end,
            title,
        });
    }
    chapters
}

/// Serialize chapters as ffmetadata `[CHAPTER]` blocks, millisecond
/// timebase.
pub fn chapter_blocks(chapters: &[Chapter]) -> String {
    let mut out = String::new();
    for chapter in chapters {
        out.push_str("[CHAPTER]\n");
        out.push_str("TIMEBASE=1/1000\n");
        out.push_str(&format!("START={}\n", (chapter.start_secs * 1000.0).round() as u64));
        out.push_str(&format!("END={}\n", (chapter.end_secs * 1000.0).round() as u64));
        out.push_str(&format!("title={}\n", escape_metadata(&chapter.title)));
    }
    out
}

/// ffmetadata reserves `=`, `;`, `#`, `\` and newline.
fn escape_metadata(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '=' | ';' | '#' | '\\' | '\n') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slide(href: &str, begin: f64, end: f64) -> SlideSegment {
        SlideSegment {
            href: href.to_string(),
            begin,
            end,
            width: 1600.0,
            height: 1200.0,
        }
    }

    #[test]
    fn numbers_slides_and_deskshare_independently() {
        let slides = vec![
            slide("file:///pub/slide-1.png", 0.0, 10.0),
            slide("file:///pub/deskshare/deskshare.png", 10.0, 20.0),
            slide("file:///pub/slide-2.png", 20.0, 30.0),
        ];
        let chapters = slide_chapters(&slides, 30.0);

        let titles: Vec<&str> = chapters.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Slide 1", "Screen sharing 1", "Slide 2"]);
    }

    #[test]
    fn blink_and_past_duration_slides_are_skipped() {
        let slides = vec![
            slide("s1.png", 0.0, 0.2),
            slide("s2.png", 0.2, 10.0),
            slide("s3.png", 12.0, 20.0),
        ];
        let chapters = slide_chapters(&slides, 11.0);

        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].title, "Slide 1");
        assert_eq!(chapters[0].end_secs, 10.0);
    }

    #[test]
    fn chapter_end_clamps_to_duration() {
        let chapters = slide_chapters(&[slide("s.png", 5.0, 60.0)], 12.0);
        assert_eq!(chapters[0].end_secs, 12.0);
    }

    #[test]
    fn blocks_use_millisecond_timebase() {
        let blocks = chapter_blocks(&[Chapter {
            start_secs: 1.5,
            end_secs: 10.0,
            title: "Slide 1".into(),
        }]);
        assert_eq!(
            blocks,
            "[CHAPTER]\nTIMEBASE=1/1000\nSTART=1500\nEND=10000\ntitle=Slide 1\n"
        );
    }

    #[test]
    fn metadata_escaping_covers_reserved_characters() {
        assert_eq!(escape_metadata("a=b;c#d"), "a\\=b\\;c\\#d");
    }
}
