#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::Path;

use docx_cover::xml::{Element, WML_NS};

pub const PNG_CT: &str = "image/png";
pub const JPEG_CT: &str = "image/jpeg";

const NAMESPACES: &str = concat!(
    r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" "#,
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture""#,
);

pub fn document_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document {NAMESPACES}><w:body>{body}<w:sectPr><w:pgSz w:w="11906" w:h="16838"/></w:sectPr></w:body></w:document>"#
    )
}

pub fn run(text: &str) -> String {
    format!(r#"<w:r><w:t xml:space="preserve">{text}</w:t></w:r>"#)
}

/// A run with an explicit typeface and size in points.
pub fn styled_run(text: &str, font: &str, size_pt: u32) -> String {
    format!(
        r#"<w:r><w:rPr><w:rFonts w:ascii="{font}" w:eastAsia="{font}" w:hAnsi="{font}"/><w:b/><w:sz w:val="{}"/></w:rPr><w:t xml:space="preserve">{text}</w:t></w:r>"#,
        size_pt * 2
    )
}

pub fn paragraph(runs: &[&str]) -> String {
    let runs: String = runs.iter().map(|t| run(t)).collect();
    format!("<w:p>{runs}</w:p>")
}

pub fn drawing_run(rel_id: &str, cx: u64, cy: u64) -> String {
    format!(
        r#"<w:r><w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0"><wp:extent cx="{cx}" cy="{cy}"/><wp:docPr id="1" name="Picture 1"/><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture"><pic:pic><pic:nvPicPr><pic:cNvPr id="0" name="image1.png"/><pic:cNvPicPr/></pic:nvPicPr><pic:blipFill><a:blip r:embed="{rel_id}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill><pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r>"#
    )
}

pub fn anchored_drawing_run(rel_id: &str, cx: u64, cy: u64) -> String {
    drawing_run(rel_id, cx, cy)
        .replace("<wp:inline ", "<wp:anchor behindDoc=\"0\" ")
        .replace("</wp:inline>", "</wp:anchor>")
}

/// An image the fixture package carries: relationship id, target relative to
/// `word/`, content type and bytes.
pub struct MediaPart<'a> {
    pub rel_id: &'a str,
    pub target: &'a str,
    pub content_type: &'a str,
    pub data: Vec<u8>,
}

pub fn build_docx(body: &str, media: &[MediaPart]) -> Vec<u8> {
    let mut defaults = String::from(
        r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/>"#,
    );
    let mut seen = Vec::new();
    for part in media {
        let ext = part.target.rsplit('.').next().unwrap_or_default();
        if !seen.contains(&ext) {
            seen.push(ext);
            defaults.push_str(&format!(
                r#"<Default Extension="{ext}" ContentType="{}"/>"#,
                part.content_type
            ));
        }
    }
    let content_types = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">{defaults}<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#
    );
    let package_rels = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;
    let rels: String = media
        .iter()
        .map(|m| {
            format!(
                r#"<Relationship Id="{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="{}"/>"#,
                m.rel_id, m.target
            )
        })
        .collect();
    let document_rels = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>{rels}</Relationships>"#
    );

    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    let mut add = |name: &str, data: &[u8]| {
        zip.start_file(name, options).unwrap();
        zip.write_all(data).unwrap();
    };
    add("[Content_Types].xml", content_types.as_bytes());
    add("_rels/.rels", package_rels.as_bytes());
    add("word/document.xml", document_xml(body).as_bytes());
    add("word/_rels/document.xml.rels", document_rels.as_bytes());
    add("word/styles.xml", br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"/>"#);
    for part in media {
        add(&format!("word/{}", part.target), &part.data);
    }
    zip.finish().unwrap().into_inner()
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, image::ImageFormat::Png)
}

pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, image::ImageFormat::Jpeg)
}

fn encode(width: u32, height: u32, format: image::ImageFormat) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 30, 30]));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img).write_to(&mut out, format).unwrap();
    out.into_inner()
}

pub fn svg(width: u32, height: u32) -> Vec<u8> {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}"><rect width="{width}" height="{height}" fill="navy"/></svg>"#
    )
    .into_bytes()
}

pub fn write(dir: &Path, name: &str, data: &[u8]) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, data).unwrap();
    path
}

/// Text of every `w:t` below `el`, concatenated.
pub fn all_text(el: &Element) -> String {
    let mut out = String::new();
    collect_text(el, &mut out);
    out
}

fn collect_text(el: &Element, out: &mut String) {
    if el.is_wml("t") {
        out.push_str(&el.text());
    }
    for child in el.elements() {
        collect_text(child, out);
    }
}

/// Text of each `w:tc` of a table, in order.
pub fn cell_texts(table: &Element) -> Vec<String> {
    let mut cells = Vec::new();
    for row in table.elements().filter(|e| e.is(WML_NS, "tr")) {
        for cell in row.elements().filter(|e| e.is(WML_NS, "tc")) {
            cells.push(all_text(cell));
        }
    }
    cells
}
