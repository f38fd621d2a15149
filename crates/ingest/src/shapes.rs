//! The annotated-shapes document: normalization and timed ingest.
//!
//! Normalization runs once over a mutable tree and produces the
//! `shapes_modified.svg` scratch document: annotations forced visible, poll
//! and slide image references rebound (file:// or inline data URI), XHTML
//! text bodies converted to measured-wrapped SVG `<text>`. The timed ingest
//! then streams the modified document into slide segments and shape
//! visibility intervals, feeding the breakpoint accumulator.

use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use meetcast_common::{MeetcastError, MeetcastResult};
use meetcast_model::{Breakpoints, ShapeAnnotation, SlideSegment};
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::text::{pack, FontMetrics};
use crate::xml::{XmlElement, XmlNode};

const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// One-shot rewriter for the annotated-shapes document.
pub struct ShapeNormalizer<'a> {
    metrics: &'a dyn FontMetrics,
    reference_support: bool,
    published_dir: &'a Path,
}

impl<'a> ShapeNormalizer<'a> {
    pub fn new(
        metrics: &'a dyn FontMetrics,
        reference_support: bool,
        published_dir: &'a Path,
    ) -> Self {
        Self {
            metrics,
            reference_support,
            published_dir,
        }
    }

    /// Normalize the document and return the rewritten XML.
    pub fn normalize(&self, doc: &str) -> MeetcastResult<String> {
        let mut root = XmlElement::parse_document(doc)?;
        self.visit(&mut root)?;
        Ok(root.to_document())
    }

    fn visit(&self, element: &mut XmlElement) -> MeetcastResult<()> {
        if element.local_name() == "image" && element.attr("class") == Some("slide") {
            self.rebind_image(element)?;
        }
        if element.local_name() == "g" {
            self.normalize_annotation(element)?;
        }
        for child in element.elements_mut() {
            self.visit(child)?;
        }
        Ok(())
    }

    fn normalize_annotation(&self, element: &mut XmlElement) -> MeetcastResult<()> {
        if let Some(style) = element.attr("style") {
            let forced = strip_hidden(style);
            element.set_attr("style", forced);
        }

        let Some(kind) = element.attr("shape").map(str::to_string) else {
            return Ok(());
        };
        if kind.contains("poll") {
            self.rebind_poll(element)?;
        } else if kind.contains("text") {
            self.convert_text(element)?;
        }
        Ok(())
    }

    fn rebind_poll(&self, element: &mut XmlElement) -> MeetcastResult<()> {
        let image = element.first_element_mut().ok_or_else(|| {
            MeetcastError::malformed("poll annotation carries no image element")
        })?;
        self.rebind_image(image)
    }

    fn rebind_image(&self, image: &mut XmlElement) -> MeetcastResult<()> {
        let href = image
            .remove_attr("href")
            .or_else(|| image.remove_attr("xlink:href"))
            .ok_or_else(|| MeetcastError::malformed("image element carries no href"))?;
        let bound = self.image_ref(&href)?;
        image.set_attr("xlink:href", bound);
        image.set_attr("xmlns:xlink", XLINK_NS);
        Ok(())
    }

    fn image_ref(&self, href: &str) -> MeetcastResult<String> {
        if href.starts_with("data:") || href.starts_with("file://") {
            return Ok(href.to_string());
        }
        let path = self.published_dir.join(href);
        if self.reference_support {
            return Ok(format!("file://{}", path.display()));
        }
        let bytes = std::fs::read(&path).map_err(|_| MeetcastError::missing(&path))?;
        Ok(format!(
            "data:{};base64,{}",
            mime_for(&path),
            BASE64.encode(bytes)
        ))
    }

    fn convert_text(&self, element: &mut XmlElement) -> MeetcastResult<()> {
        let style = element.attr("style").unwrap_or_default().to_string();
        let font_size = style_value(&style, "font-size")
            .and_then(|v| v.trim_end_matches("px").parse::<f64>().ok())
            .ok_or_else(|| {
                MeetcastError::malformed("text annotation style carries no font-size")
            })?;
        let color = style_value(&style, "color").unwrap_or("#000000").to_string();

        let switch_idx = element
            .children
            .iter()
            .position(|node| matches!(node, XmlNode::Element(el) if el.local_name() == "switch"))
            .ok_or_else(|| MeetcastError::malformed("text annotation carries no switch"))?;
        let XmlNode::Element(switch) = &element.children[switch_idx] else {
            unreachable!("position matched an element");
        };
        let foreign = switch
            .elements()
            .find(|el| el.local_name() == "foreignObject")
            .ok_or_else(|| {
                MeetcastError::malformed("text annotation switch carries no foreignObject")
            })?;

        let x = float_attr(foreign, "x")?;
        let y = float_attr(foreign, "y")?;
        let width = float_attr(foreign, "width")?;

        let lines = self.wrap_body(foreign, font_size, width)?;

        let mut text = XmlElement::new("text");
        text.set_attr("x", fmt_num(x));
        text.set_attr("y", fmt_num(y));
        text.set_attr("fill", color);
        text.set_attr("xml:space", "preserve");
        for line in lines {
            let mut tspan = XmlElement::new("tspan");
            tspan.set_attr("x", fmt_num(x));
            tspan.set_attr("dy", "1.0em");
            match line {
                TextLine::Text(content) => tspan.children.push(XmlNode::Text(content)),
                TextLine::Blank => tspan
                    .children
                    .push(XmlNode::Element(XmlElement::new("br"))),
            }
            text.children.push(XmlNode::Element(tspan));
        }

        element.children[switch_idx] = XmlNode::Element(text);
        element.set_attr("style", format!("{style};fill:currentcolor"));
        Ok(())
    }

    fn wrap_body(
        &self,
        foreign: &XmlElement,
        font_size: f64,
        max_width: f64,
    ) -> MeetcastResult<Vec<TextLine>> {
        let mut tokens = Vec::new();
        collect_tokens(foreign, &mut tokens);

        let mut lines = Vec::new();
        let mut words: Vec<String> = Vec::new();
        let mut pending_breaks = 0usize;
        for token in tokens {
            match token {
                BodyToken::Break => {
                    self.flush_words(&mut words, font_size, max_width, &mut lines)?;
                    pending_breaks += 1;
                }
                BodyToken::Run(text) => {
                    // The first break in a run just terminates the current
                    // line; the rest each hold a blank line open.
                    for _ in 1..pending_breaks.max(1) {
                        lines.push(TextLine::Blank);
                    }
                    pending_breaks = 0;
                    words.extend(text.split_whitespace().map(str::to_string));
                }
            }
        }
        self.flush_words(&mut words, font_size, max_width, &mut lines)?;
        for _ in 1..pending_breaks.max(1) {
            lines.push(TextLine::Blank);
        }
        Ok(lines)
    }

    fn flush_words(
        &self,
        words: &mut Vec<String>,
        font_size: f64,
        max_width: f64,
        lines: &mut Vec<TextLine>,
    ) -> MeetcastResult<()> {
        if words.is_empty() {
            return Ok(());
        }
        let joined = words.join(" ");
        words.clear();
        for line in pack(self.metrics, &joined, " ", font_size, max_width)? {
            lines.push(TextLine::Text(line));
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq)]
enum TextLine {
    Text(String),
    Blank,
}

enum BodyToken {
    Run(String),
    Break,
}

fn collect_tokens(element: &XmlElement, out: &mut Vec<BodyToken>) {
    for node in &element.children {
        match node {
            XmlNode::Text(text) => {
                if !text.trim().is_empty() {
                    out.push(BodyToken::Run(text.clone()));
                }
            }
            XmlNode::Element(el) if el.local_name() == "br" => out.push(BodyToken::Break),
            XmlNode::Element(el) => collect_tokens(el, out),
        }
    }
}

fn strip_hidden(style: &str) -> String {
    style
        .split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty() && part.replace(' ', "") != "visibility:hidden")
        .collect::<Vec<_>>()
        .join(";")
}

fn style_value<'s>(style: &'s str, key: &str) -> Option<&'s str> {
    style.split(';').find_map(|part| {
        let (k, v) = part.split_once(':')?;
        (k.trim() == key).then(|| v.trim())
    })
}

fn float_attr(element: &XmlElement, name: &str) -> MeetcastResult<f64> {
    element
        .attr(name)
        .and_then(|v| v.parse::<f64>().ok())
        .ok_or_else(|| {
            MeetcastError::malformed(format!(
                "element <{}> carries no numeric {name} attribute",
                element.name
            ))
        })
}

fn fmt_num(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// The whiteboard timeline extracted from the modified shapes document.
#[derive(Debug, Default)]
pub struct WhiteboardTimeline {
    /// Slide segments in document order (non-overlapping, sorted).
    pub slides: Vec<SlideSegment>,

    /// Shape annotations in document order (z-order).
    pub shapes: Vec<ShapeAnnotation>,
}

/// Stream the modified shapes document into slides and shape intervals.
///
/// Every slide bound and every clamped shape enter/leave time is pushed
/// into `breakpoints`.
pub fn ingest_whiteboard(
    doc: &str,
    breakpoints: &mut Breakpoints,
) -> MeetcastResult<WhiteboardTimeline> {
    let mut reader = Reader::from_str(doc);
    let mut timeline = WhiteboardTimeline::default();

    loop {
        match reader
            .read_event()
            .map_err(|e| MeetcastError::malformed(format!("shapes document: {e}")))?
        {
            Event::Start(start) => {
                if is_slide_image(&start) {
                    ingest_slide(&start, &mut timeline, breakpoints)?;
                } else if is_shape_group(&start) {
                    let end = start.to_end().into_owned();
                    let span = reader.read_to_end(end.name()).map_err(|e| {
                        MeetcastError::malformed(format!("shapes document: {e}"))
                    })?;
                    let inner = &doc[span.start as usize..span.end as usize];
                    ingest_shape(&start, inner, &mut timeline, breakpoints)?;
                }
            }
            Event::Empty(start) => {
                if is_slide_image(&start) {
                    ingest_slide(&start, &mut timeline, breakpoints)?;
                } else if is_shape_group(&start) {
                    ingest_shape(&start, "", &mut timeline, breakpoints)?;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    tracing::debug!(
        slides = timeline.slides.len(),
        shapes = timeline.shapes.len(),
        "Whiteboard timeline ingested"
    );
    Ok(timeline)
}

fn is_slide_image(start: &BytesStart<'_>) -> bool {
    local_name_is(start, "image") && attr_of(start, "class").as_deref() == Some("slide")
}

fn is_shape_group(start: &BytesStart<'_>) -> bool {
    local_name_is(start, "g") && attr_of(start, "class").as_deref() == Some("shape")
}

fn local_name_is(start: &BytesStart<'_>, name: &str) -> bool {
    start.local_name().as_ref() == name.as_bytes()
}

fn attr_of(start: &BytesStart<'_>, name: &str) -> Option<String> {
    start.attributes().flatten().find_map(|attr| {
        (attr.key.as_ref() == name.as_bytes())
            .then(|| attr.unescape_value().ok())
            .flatten()
            .map(|value| value.into_owned())
    })
}

fn float_attr_of(start: &BytesStart<'_>, name: &str) -> MeetcastResult<f64> {
    attr_of(start, name)
        .and_then(|v| v.parse::<f64>().ok())
        .ok_or_else(|| {
            MeetcastError::malformed(format!("shapes document: missing numeric {name} attribute"))
        })
}

fn ingest_slide(
    start: &BytesStart<'_>,
    timeline: &mut WhiteboardTimeline,
    breakpoints: &mut Breakpoints,
) -> MeetcastResult<()> {
    let begin = float_attr_of(start, "in")?;
    let end = float_attr_of(start, "out")?;
    let width = float_attr_of(start, "width")?;
    let height = float_attr_of(start, "height")?;
    let href = attr_of(start, "xlink:href")
        .or_else(|| attr_of(start, "href"))
        .ok_or_else(|| MeetcastError::malformed("slide image carries no href"))?;

    breakpoints.push(begin);
    breakpoints.push(end);
    timeline.slides.push(SlideSegment {
        href,
        begin,
        end,
        width,
        height,
    });
    Ok(())
}

fn ingest_shape(
    start: &BytesStart<'_>,
    inner: &str,
    timeline: &mut WhiteboardTimeline,
    breakpoints: &mut Breakpoints,
) -> MeetcastResult<()> {
    let slide = timeline.slides.last().ok_or_else(|| {
        MeetcastError::malformed("shapes document: shape group precedes every slide")
    })?;

    let timestamp = float_attr_of(start, "timestamp")?;
    let undo = float_attr_of(start, "undo")?;
    let shape = attr_of(start, "shape")
        .ok_or_else(|| MeetcastError::malformed("shape group carries no shape attribute"))?;
    let style = attr_of(start, "style").unwrap_or_default();

    let enter = timestamp.max(slide.begin).min(slide.end);
    let undo_or_out = if undo < 0.0 { slide.end } else { undo };
    let leave = undo_or_out.max(slide.begin).min(slide.end).max(enter);

    breakpoints.push(enter);
    breakpoints.push(leave);

    let id = shape.rsplit('-').next().unwrap_or(&shape).to_string();
    let value = format!("<g style=\"{}\">{}</g>", escape(style.as_str()), inner);
    timeline
        .shapes
        .push(ShapeAnnotation::new(enter, leave, value, id));
    Ok(())
}
