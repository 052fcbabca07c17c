//! SVG outline overlay of inspection records.
//!
//! Each record becomes a `<g>` holding a closed, semi-transparent
//! `<path>` in the record's display colour plus its ordinal label, so the
//! overlay can be laid over the survey photo. Coordinates are image
//! pixels; the `viewBox` matches the photo's pixel grid.
//!
//! Optional [`SvgMetadata`] embeds `<title>` and `<desc>` elements, and a
//! [`Highlight`] draws one record with a heavier outline next to a block
//! of annotation text.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Description, Element, Group, Path, Title};
use svg::node::{Node, Text, Value};

use pebble_pipeline::{Contour, Dimensions, InspectionRecord, InspectionRecords};

/// Opacity of the filled outline.
const FILL_OPACITY: f64 = 0.35;
/// Top-left corner of the annotation block.
const ANNOTATION_ORIGIN: (u32, u32) = (10, 30);
/// Distance between annotation baselines.
const ANNOTATION_LINE_HEIGHT: u32 = 18;

/// Metadata to embed in the SVG document.
///
/// All fields are optional. Text values are XML-escaped automatically
/// by the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`.
    ///
    /// Typically the survey image name.
    pub title: Option<&'a str>,

    /// Document description, emitted as `<desc>`.
    pub description: Option<&'a str>,

    /// Filter configuration JSON, emitted inside `<metadata>` wrapped in
    /// a namespaced `<pebble:filter>` element.
    pub config_json: Option<&'a str>,
}

/// A record to emphasise, with the text shown beside the overlay.
#[derive(Debug, Clone, Copy)]
pub struct Highlight<'a> {
    /// The emphasised record.
    pub record: &'a InspectionRecord,
    /// Annotation lines, usually [`InspectionRecord::annotations`].
    pub lines: &'a [String],
}

/// `#rrggbb` notation of an RGB triple.
#[must_use]
pub fn hex_color([r, g, b]: [u8; 3]) -> String {
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// Build a closed SVG path `d` attribute from a contour.
///
/// Uses `M` for the first point, `L` for the rest and `z` to close.
/// Returns an empty string for contours with fewer than 2 points.
///
/// # Examples
///
/// ```
/// use pebble_pipeline::{Contour, Point};
/// use pebble_export::build_outline_data;
///
/// let contour = Contour::new(vec![
///     Point::new(10.0, 20.0),
///     Point::new(30.0, 20.0),
///     Point::new(30.0, 40.0),
/// ]);
/// assert_eq!(build_outline_data(&contour), "M10,20 L30,20 L30,40 z");
/// ```
#[must_use]
pub fn build_outline_data(contour: &Contour) -> String {
    let points = contour.points();
    if points.len() < 2 {
        return String::new();
    }

    let first = &points[0];
    let mut data = Data::new().move_to((first.x, first.y));
    for p in &points[1..] {
        data = data.line_to((p.x, p.y));
    }
    String::from(Value::from(data.close()))
}

fn record_group(record: &InspectionRecord, highlighted: bool) -> Option<Group> {
    let d = build_outline_data(&record.contour);
    if d.is_empty() {
        return None;
    }
    let color = hex_color(record.color);
    let path = Path::new()
        .set("d", d)
        .set("fill", color.as_str())
        .set("fill-opacity", FILL_OPACITY)
        .set("stroke", color.as_str())
        .set("stroke-width", if highlighted { 3 } else { 1 });

    let mut label = Element::new("text");
    label.assign("x", record.bounding_box.x);
    label.assign("y", record.bounding_box.y);
    label.assign("fill", color.as_str());
    label.append(Text::new(record.ordinal.to_string()));

    Some(
        Group::new()
            .set("id", format!("mask-{}", record.ordinal))
            .set("data-mask-id", record.id.0)
            .add(path)
            .add(label),
    )
}

fn annotation_block(lines: &[String]) -> Element {
    let mut block = Element::new("g");
    block.assign("id", "annotations");
    block.assign("fill", "white");
    block.assign("font-family", "monospace");
    block.assign("font-size", 14);
    let (x, y0) = ANNOTATION_ORIGIN;
    let mut y = y0;
    for line in lines {
        let mut text = Element::new("text");
        text.assign("x", x);
        text.assign("y", y);
        text.append(Text::new(line.as_str()));
        block.append(text);
        y += ANNOTATION_LINE_HEIGHT;
    }
    block
}

/// Serialize inspection records into an SVG overlay.
///
/// Records are drawn in build order, so later records paint over earlier
/// ones, matching [`InspectionRecords::pick`]. The highlighted record,
/// if any, is drawn again on top with a heavier outline.
///
/// # Examples
///
/// ```
/// use pebble_pipeline::{Dimensions, InspectionRecords};
/// use pebble_export::{SvgMetadata, to_outline_svg};
///
/// let dims = Dimensions { width: 800, height: 600 };
/// let metadata = SvgMetadata {
///     title: Some("img_001"),
///     ..SvgMetadata::default()
/// };
/// let svg = to_outline_svg(&InspectionRecords::default(), dims, &metadata, None);
/// assert!(svg.contains("<title>img_001</title>"));
/// assert!(svg.contains(r#"viewBox="0 0 800 600""#));
/// ```
#[must_use]
pub fn to_outline_svg(
    records: &InspectionRecords,
    dimensions: Dimensions,
    metadata: &SvgMetadata<'_>,
    highlight: Option<Highlight<'_>>,
) -> String {
    let Dimensions { width, height } = dimensions;
    let mut doc = Document::new()
        .set("width", width)
        .set("height", height)
        .set("viewBox", (0, 0, width, height));

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }

    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    if let Some(config_json) = metadata.config_json {
        let mut filter_el = Element::new("pebble:filter");
        filter_el.assign("xmlns:pebble", "urn:pebble-survey:filter:1");
        filter_el.append(Text::new(config_json));
        let mut metadata_el = Element::new("metadata");
        metadata_el.append(filter_el);
        doc = doc.add(metadata_el);
    }

    let mut outlines = Group::new().set("id", "outlines");
    for record in records.as_slice() {
        if let Some(group) = record_group(record, false) {
            outlines = outlines.add(group);
        }
    }
    doc = doc.add(outlines);

    if let Some(Highlight { record, lines }) = highlight {
        if let Some(group) = record_group(record, true) {
            doc = doc.add(group.set("id", "highlight"));
        }
        if !lines.is_empty() {
            doc = doc.add(annotation_block(lines));
        }
    }

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}
