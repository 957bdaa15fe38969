use serde::Serialize;

use crate::config::{Markers, TemplateSpec};
use crate::docx;
use crate::error::Error;
use crate::media::{GENERATION, PixelSize, REPORTING};
use crate::model::Document;
use crate::package::{DOCUMENT_PART, Package, Relationships};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ImageInfo {
    pub rel_id: String,
    pub part_name: Option<String>,
    pub cx: u64,
    pub cy: u64,
    pub inline: bool,
    /// Screen pixels at 96 dpi, two decimals.
    pub width_px: f64,
    pub height_px: f64,
    /// Raster size a logo would be rendered at for this slot.
    pub generation_px: PixelSize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlaceholderInfo {
    pub paragraph_index: usize,
    pub label: String,
    pub placeholder_text: String,
    pub run_index: Option<usize>,
    pub font_name: Option<String>,
    pub font_size_pt: Option<f32>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Summary {
    pub paragraphs: usize,
    pub images: usize,
    pub placeholders: usize,
    pub labelled: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TemplateReport {
    pub images: Vec<ImageInfo>,
    pub placeholders: Vec<PlaceholderInfo>,
    pub summary: Summary,
}

pub fn analyze(package: &Package, spec: &TemplateSpec) -> Result<TemplateReport, Error> {
    let doc = docx::load(package)?;
    let rels = package.relationships(DOCUMENT_PART)?;
    Ok(report(&doc, &rels, &spec.markers()))
}

/// Report for a document that is already loaded.
pub fn report(doc: &Document, rels: &Relationships, markers: &Markers) -> TemplateReport {
    let images = extract_images(doc, rels);
    let placeholders = detect_placeholders(doc, markers);
    let summary = Summary {
        paragraphs: doc.paragraphs().count(),
        images: images.len(),
        placeholders: placeholders.len(),
        labelled: placeholders.iter().filter(|p| !p.label.is_empty()).count(),
    };
    TemplateReport { images, placeholders, summary }
}

pub fn extract_images(doc: &Document, rels: &Relationships) -> Vec<ImageInfo> {
    let mut images = Vec::new();
    for run in doc.paragraphs().flat_map(|p| p.runs()) {
        for drawing in run.drawings() {
            let Some(rel_id) = drawing.embed_id() else { continue };
            let Some((cx, cy)) = drawing.extent().filter(|(cx, cy)| *cx > 0 && *cy > 0) else {
                continue;
            };
            images.push(ImageInfo {
                rel_id: rel_id.to_string(),
                part_name: rels.get(rel_id).and_then(|rel| rels.part_name(rel)),
                cx,
                cy,
                inline: drawing.is_inline(),
                width_px: round2(REPORTING.pixels(cx)),
                height_px: round2(REPORTING.pixels(cy)),
                generation_px: GENERATION.pixel_size(cx, cy),
            });
        }
    }
    images
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Splits at the first full-width colon, or the first ASCII colon when there
/// is none. Returns `(left, separator, right)`.
pub fn split_label(text: &str) -> Option<(&str, &'static str, &str)> {
    ["：", ":"].into_iter().find_map(|sep| {
        text.split_once(sep).map(|(left, right)| (left, sep, right))
    })
}

pub fn detect_placeholders(doc: &Document, markers: &Markers) -> Vec<PlaceholderInfo> {
    let mut found = Vec::new();
    for (paragraph_index, paragraph) in doc.paragraphs().enumerate() {
        let text = paragraph.text();
        if text.trim().is_empty() {
            continue;
        }
        let texts = paragraph.run_texts();

        if let Some((left, _, right)) = split_label(&text) {
            let right = right.trim();
            let run_index = texts
                .iter()
                .position(|t| !right.is_empty() && t.contains(right))
                .or_else(|| texts.len().checked_sub(1));
            let font = run_index.and_then(|i| paragraph.run(i)).map(|r| r.font()).unwrap_or_default();
            found.push(PlaceholderInfo {
                paragraph_index,
                label: left.trim().to_string(),
                placeholder_text: right.to_string(),
                run_index,
                font_name: font.name.or(font.east_asia),
                font_size_pt: font.size_pt,
            });
            continue;
        }

        for (run_index, run_text) in texts.iter().enumerate() {
            if !markers.contains_marker(run_text) {
                continue;
            }
            let font = paragraph.run(run_index).map(|r| r.font()).unwrap_or_default();
            found.push(PlaceholderInfo {
                paragraph_index,
                label: String::new(),
                placeholder_text: run_text.trim().to_string(),
                run_index: Some(run_index),
                font_name: font.name.or(font.east_asia),
                font_size_pt: font.size_pt,
            });
        }
    }
    found
}
