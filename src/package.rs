use std::io::{Cursor, Read, Write};
use std::path::Path;

use crate::error::Error;
use crate::xml::{Element, Node, QName};

pub const DOCUMENT_PART: &str = "word/document.xml";
pub const IMAGE_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
const PKG_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const CT_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

#[derive(Clone, Debug, PartialEq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub external: bool,
}

impl Relationship {
    pub fn is_image(&self) -> bool {
        self.rel_type == IMAGE_REL_TYPE
    }
}

/// Relationships of one source part, in document order.
#[derive(Clone, Debug, Default)]
pub struct Relationships {
    base_dir: String,
    items: Vec<Relationship>,
}

impl Relationships {
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.items.iter().find(|r| r.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.items.iter()
    }

    /// Resolves an internal relationship target to a zip entry name.
    pub fn part_name(&self, rel: &Relationship) -> Option<String> {
        if rel.external {
            return None;
        }
        Some(resolve_target(&self.base_dir, &rel.target))
    }

    fn next_id(&self) -> String {
        let highest = self
            .items
            .iter()
            .filter_map(|r| r.id.strip_prefix("rId"))
            .filter_map(|n| n.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        format!("rId{}", highest + 1)
    }
}

fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

fn rels_part_for(source: &str) -> (String, String) {
    match source.rsplit_once('/') {
        Some((dir, file)) => (dir.to_string(), format!("{dir}/_rels/{file}.rels")),
        None => (String::new(), format!("_rels/{source}.rels")),
    }
}

pub struct Package {
    parts: Vec<(String, Vec<u8>)>,
}

impl Package {
    pub fn open(path: &Path) -> Result<Package, Error> {
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::InputMissing(path.to_path_buf()),
            _ => Error::Io(e),
        })?;
        Package::from_bytes(bytes)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Package, Error> {
        let mut zip = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|_| Error::InvalidDocx("file is not a ZIP archive".into()))?;

        let mut parts = Vec::with_capacity(zip.len());
        for i in 0..zip.len() {
            let mut entry = zip.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            let mut data = Vec::new();
            entry.read_to_end(&mut data)?;
            parts.push((name, data));
        }

        let package = Package { parts };
        if package.part(DOCUMENT_PART).is_none() {
            return Err(Error::InvalidDocx(format!("missing {DOCUMENT_PART}")));
        }
        Ok(package)
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts.iter().find(|(n, _)| n == name).map(|(_, d)| d.as_slice())
    }

    pub fn part_text(&self, name: &str) -> Result<String, Error> {
        let data = self
            .part(name)
            .ok_or_else(|| Error::InvalidDocx(format!("missing {name}")))?;
        String::from_utf8(data.to_vec())
            .map_err(|_| Error::InvalidDocx(format!("{name} is not UTF-8")))
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(n, _)| n.as_str())
    }

    /// Replaces the part's bytes, or appends a new part.
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        match self.parts.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = data,
            None => self.parts.push((name.to_string(), data)),
        }
    }

    /// First `dir/stemN.ext` name not already taken.
    pub fn unused_part_name(&self, dir: &str, stem: &str, ext: &str) -> String {
        (1..)
            .map(|n| format!("{dir}/{stem}{n}.{ext}"))
            .find(|candidate| self.part(candidate).is_none())
            .unwrap_or_else(|| format!("{dir}/{stem}.{ext}"))
    }

    pub fn relationships(&self, source: &str) -> Result<Relationships, Error> {
        let (base_dir, rels_name) = rels_part_for(source);
        let mut items = Vec::new();
        if self.part(&rels_name).is_some() {
            let xml_content = self.part_text(&rels_name)?;
            let xml = roxmltree::Document::parse(&xml_content)?;
            for node in xml.root_element().children() {
                if node.tag_name().name() == "Relationship"
                    && let (Some(id), Some(target)) = (node.attribute("Id"), node.attribute("Target"))
                {
                    items.push(Relationship {
                        id: id.to_string(),
                        rel_type: node.attribute("Type").unwrap_or_default().to_string(),
                        target: target.to_string(),
                        external: node.attribute("TargetMode") == Some("External"),
                    });
                }
            }
        }
        Ok(Relationships { base_dir, items })
    }

    /// Adds an internal relationship from `source` and returns its new id.
    /// `target` is relative to the source part's directory.
    pub fn add_relationship(
        &mut self,
        source: &str,
        rel_type: &str,
        target: &str,
    ) -> Result<String, Error> {
        let id = self.relationships(source)?.next_id();
        let (_, rels_name) = rels_part_for(source);

        let mut root = match self.part(&rels_name) {
            Some(_) => Element::parse(&self.part_text(&rels_name)?)?,
            None => Element::new(pkg_rel_name("Relationships")),
        };
        root.children.push(Node::Element(
            Element::new(pkg_rel_name("Relationship"))
                .with_attr(QName::plain("Id"), id.as_str())
                .with_attr(QName::plain("Type"), rel_type)
                .with_attr(QName::plain("Target"), target),
        ));
        self.set_part(&rels_name, root.to_xml().into_bytes());
        Ok(id)
    }

    /// Content type of a part: an `Override` for it, else the `Default` for
    /// its extension.
    pub fn content_type(&self, part_name: &str) -> Option<String> {
        let xml_content = self.part_text(CONTENT_TYPES_PART).ok()?;
        let xml = roxmltree::Document::parse(&xml_content).ok()?;
        let root = xml.root_element();

        let absolute = format!("/{part_name}");
        let overridden = root
            .children()
            .filter(|n| n.tag_name().name() == "Override")
            .find(|n| n.attribute("PartName").is_some_and(|p| p.eq_ignore_ascii_case(&absolute)))
            .and_then(|n| n.attribute("ContentType"));
        if let Some(ct) = overridden {
            return Some(ct.to_string());
        }

        let (_, ext) = part_name.rsplit_once('.')?;
        root.children()
            .filter(|n| n.tag_name().name() == "Default")
            .find(|n| n.attribute("Extension").is_some_and(|e| e.eq_ignore_ascii_case(ext)))
            .and_then(|n| n.attribute("ContentType"))
            .map(String::from)
    }

    pub fn ensure_default_content_type(
        &mut self,
        extension: &str,
        content_type: &str,
    ) -> Result<(), Error> {
        let mut root = Element::parse(&self.part_text(CONTENT_TYPES_PART)?)?;
        let present = root.elements().any(|e| {
            e.name.local == "Default"
                && e.attr(None, "Extension").is_some_and(|x| x.eq_ignore_ascii_case(extension))
        });
        if present {
            return Ok(());
        }
        // Defaults conventionally precede Overrides.
        let at = root
            .children
            .iter()
            .position(|c| matches!(c, Node::Element(e) if e.name.local == "Override"))
            .unwrap_or(root.children.len());
        let default = Element::new(QName { namespace: Some(CT_NS.into()), prefix: None, local: "Default".into() })
            .with_attr(QName::plain("Extension"), extension)
            .with_attr(QName::plain("ContentType"), content_type);
        root.children.insert(at, Node::Element(default));
        self.set_part(CONTENT_TYPES_PART, root.to_xml().into_bytes());
        Ok(())
    }

    /// Media is stored, everything else deflated, matching what Word writes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let deflated = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        let stored = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        for (name, data) in &self.parts {
            let options = if name.starts_with("word/media/") { stored } else { deflated };
            zip.start_file(name.as_str(), options)?;
            zip.write_all(data)?;
        }
        Ok(zip.finish()?.into_inner())
    }

    pub fn save(&self, path: &Path) -> Result<(), Error> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_bytes()?).map_err(Error::Io)
    }
}

fn pkg_rel_name(local: &str) -> QName {
    QName { namespace: Some(PKG_REL_NS.into()), prefix: None, local: local.into() }
}
