mod common;

use common::*;
use docx_cover::analyzer::{analyze, detect_placeholders, extract_images, split_label};
use docx_cover::config::Markers;
use docx_cover::docx;
use docx_cover::media::PixelSize;
use docx_cover::package::{DOCUMENT_PART, Package};
use docx_cover::TemplateSpec;

fn template() -> Package {
    let body = format!(
        "<w:p>{}</w:p><w:p>{}{}</w:p><w:p>{}</w:p><w:p>{}{}</w:p>",
        drawing_run("rId5", 914400, 457200),
        styled_run("学生姓名：", "宋体", 14),
        styled_run("×××", "黑体", 16),
        run("Name: XXX"),
        run("Signature "),
        run("[请填写]"),
    );
    Package::from_bytes(build_docx(
        &body,
        &[MediaPart {
            rel_id: "rId5",
            target: "media/image1.png",
            content_type: PNG_CT,
            data: png(8, 4),
        }],
    ))
    .unwrap()
}

#[test]
fn images_report_both_pixel_contexts() {
    let package = template();
    let doc = docx::load(&package).unwrap();
    let rels = package.relationships(DOCUMENT_PART).unwrap();
    let images = extract_images(&doc, &rels);

    assert_eq!(images.len(), 1);
    let image = &images[0];
    assert_eq!(image.rel_id, "rId5");
    assert_eq!(image.part_name.as_deref(), Some("word/media/image1.png"));
    assert_eq!((image.cx, image.cy), (914400, 457200));
    assert!(image.inline);
    assert_eq!(image.width_px, 96.0);
    assert_eq!(image.height_px, 48.0);
    // One inch at 300 dpi, scaled 3×.
    assert_eq!(image.generation_px, PixelSize { width: 900, height: 450 });
}

#[test]
fn reporting_pixels_round_to_two_decimals() {
    let body = format!("<w:p>{}</w:p>", drawing_run("rId5", 1_000_000, 333_333));
    let doc = docx::parse(&document_xml(&body)).unwrap();
    let package = template();
    let rels = package.relationships(DOCUMENT_PART).unwrap();
    let image = &extract_images(&doc, &rels)[0];
    assert_eq!(image.width_px, 104.99);
    assert_eq!(image.height_px, 35.0);
}

#[test]
fn anchored_drawings_are_reported() {
    let body = format!("<w:p>{}</w:p>", anchored_drawing_run("rId5", 914400, 914400));
    let doc = docx::parse(&document_xml(&body)).unwrap();
    let package = template();
    let rels = package.relationships(DOCUMENT_PART).unwrap();
    let images = extract_images(&doc, &rels);
    assert_eq!(images.len(), 1);
    assert!(!images[0].inline);
}

#[test]
fn drawings_without_size_are_skipped() {
    let body = format!("<w:p>{}</w:p>", drawing_run("rId5", 0, 914400));
    let doc = docx::parse(&document_xml(&body)).unwrap();
    let package = template();
    let rels = package.relationships(DOCUMENT_PART).unwrap();
    assert!(extract_images(&doc, &rels).is_empty());
}

#[test]
fn colon_lines_become_labelled_placeholders() {
    let doc = docx::load(&template()).unwrap();
    let found = detect_placeholders(&doc, &Markers::default());

    let name = found.iter().find(|p| p.label == "学生姓名").unwrap();
    assert_eq!(name.paragraph_index, 1);
    assert_eq!(name.placeholder_text, "×××");
    assert_eq!(name.run_index, Some(1));
    assert_eq!(name.font_name.as_deref(), Some("黑体"));
    assert_eq!(name.font_size_pt, Some(16.0));

    let ascii = found.iter().find(|p| p.label == "Name").unwrap();
    assert_eq!(ascii.paragraph_index, 2);
    assert_eq!(ascii.placeholder_text, "XXX");
    assert_eq!(ascii.run_index, Some(0));
}

#[test]
fn filler_runs_without_a_colon_are_anonymous() {
    let doc = docx::load(&template()).unwrap();
    let found = detect_placeholders(&doc, &Markers::default());

    let anonymous: Vec<_> = found.iter().filter(|p| p.label.is_empty()).collect();
    assert_eq!(anonymous.len(), 1);
    assert_eq!(anonymous[0].paragraph_index, 3);
    assert_eq!(anonymous[0].run_index, Some(1));
    assert_eq!(anonymous[0].placeholder_text, "[请填写]");
}

#[test]
fn right_text_split_across_runs_points_at_the_last_run() {
    let body = paragraph(&["邮箱：", "__", "__"]);
    let doc = docx::parse(&document_xml(&body)).unwrap();
    let found = detect_placeholders(&doc, &Markers::default());
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].placeholder_text, "____");
    assert_eq!(found[0].run_index, Some(2));
}

#[test]
fn full_width_colon_wins() {
    assert_eq!(split_label("Time: 10:00：×××"), Some(("Time: 10:00", "：", "×××")));
    assert_eq!(split_label("Name: X"), Some(("Name", ":", " X")));
    assert_eq!(split_label("no separator"), None);
}

#[test]
fn analyze_summarizes() {
    let report = analyze(&template(), &TemplateSpec::default()).unwrap();
    assert_eq!(report.summary.images, 1);
    assert_eq!(report.summary.placeholders, 3);
    assert_eq!(report.summary.labelled, 2);
    assert_eq!(report.summary.paragraphs, 4);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["images"][0]["generation_px"]["width"], 900);
    assert_eq!(json["placeholders"][0]["label"], "学生姓名");
}
