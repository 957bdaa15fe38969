use std::fmt;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::docx::max_drawing_id;
use crate::error::{Error, Warning};
use crate::media::{self, GENERATION, ImageKind, MediaError, PixelSize};
use crate::model::{Block, Document, Drawing, Inline, RunContent};
use crate::package::{DOCUMENT_PART, IMAGE_REL_TYPE, Package, Relationships};

#[derive(Debug, Clone, PartialEq)]
pub enum SwapOutcome {
    /// An existing image part now holds the logo.
    Replaced { part_name: String },
    /// The first drawing was swapped for a new picture.
    Inserted { part_name: String, rel_id: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageSwap {
    pub outcome: SwapOutcome,
    pub warnings: Vec<Warning>,
}

#[derive(Debug)]
pub enum ImageSwapError {
    Logo(PathBuf, std::io::Error),
    UnknownFormat(PathBuf),
    NoPicture,
    NoExtent,
    Package(Error),
}

impl fmt::Display for ImageSwapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSwapError::Logo(path, e) => write!(f, "cannot read {}: {e}", path.display()),
            ImageSwapError::UnknownFormat(path) => {
                write!(f, "unrecognized image format: {}", path.display())
            }
            ImageSwapError::NoPicture => write!(f, "template has no picture to replace"),
            ImageSwapError::NoExtent => write!(f, "first picture has no usable size"),
            ImageSwapError::Package(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ImageSwapError {}

impl From<Error> for ImageSwapError {
    fn from(e: Error) -> Self {
        ImageSwapError::Package(e)
    }
}

/// Overwrites the first image part with the logo when it can be encoded in
/// that part's format; otherwise replaces the first drawing with a new inline
/// picture of the same size.
pub fn replace_first_image(
    package: &mut Package,
    doc: &mut Document,
    logo: &Path,
) -> Result<ImageSwap, ImageSwapError> {
    let data = std::fs::read(logo).map_err(|e| ImageSwapError::Logo(logo.to_path_buf(), e))?;
    let kind = ImageKind::from_path(logo)
        .or_else(|| ImageKind::sniff(&data))
        .ok_or_else(|| ImageSwapError::UnknownFormat(logo.to_path_buf()))?;

    let rels = package.relationships(DOCUMENT_PART)?;
    if let Some((rel_id, part_name, part_kind)) = first_image_part(package, &rels) {
        let slot = slot_size(doc, &rel_id);
        match payload(&data, kind, part_kind, slot) {
            Ok(bytes) => {
                info!("logo written into {part_name} ({rel_id})");
                package.set_part(&part_name, bytes);
                return Ok(ImageSwap {
                    outcome: SwapOutcome::Replaced { part_name },
                    warnings: Vec::new(),
                });
            }
            Err(e) => warn!("cannot reuse {part_name} for the logo: {e}; inserting a new picture"),
        }
    } else {
        debug!("no image part in the document, inserting a new picture");
    }

    insert_picture(package, doc, logo, data, kind)
}

/// First internal image relationship whose part exists with an `image/*`
/// content type.
fn first_image_part(
    package: &Package,
    rels: &Relationships,
) -> Option<(String, String, ImageKind)> {
    rels.iter().filter(|rel| rel.is_image()).find_map(|rel| {
        let part_name = rels.part_name(rel)?;
        let bytes = package.part(&part_name)?;
        let content_type = package.content_type(&part_name)?;
        if !content_type.starts_with("image/") {
            return None;
        }
        let kind =
            ImageKind::from_content_type(&content_type).or_else(|| ImageKind::sniff(bytes))?;
        Some((rel.id.clone(), part_name, kind))
    })
}

/// The logo encoded in the format of the part it is going into.
fn payload(
    data: &[u8],
    from: ImageKind,
    to: ImageKind,
    slot: Option<PixelSize>,
) -> Result<Vec<u8>, MediaError> {
    if from == to {
        return Ok(data.to_vec());
    }
    if to.is_vector() {
        return Err(MediaError::Unsupported(to));
    }
    if from.is_vector() {
        let png = media::rasterize_svg(data, slot)?;
        return match to {
            ImageKind::Png => Ok(png),
            _ => media::transcode(&png, to),
        };
    }
    media::transcode(data, to)
}

/// Generation-resolution size of the drawing showing `rel_id`, or of the
/// first drawing when none does.
fn slot_size(doc: &Document, rel_id: &str) -> Option<PixelSize> {
    let drawings = || doc.paragraphs().flat_map(|p| p.runs()).flat_map(|r| r.drawings());
    let showing = drawings().find(|d| d.embed_id() == Some(rel_id));
    let (cx, cy) = showing.or_else(|| drawings().next())?.extent()?;
    Some(GENERATION.pixel_size(cx, cy))
}

/// Position of the first drawing as (block, inline, content) indices.
fn first_drawing(doc: &Document) -> Option<((usize, usize, usize), &Drawing)> {
    for (b, block) in doc.blocks.iter().enumerate() {
        let Block::Paragraph(paragraph) = block else { continue };
        for (i, inline) in paragraph.inlines.iter().enumerate() {
            let Inline::Run(run) = inline else { continue };
            for (c, item) in run.content.iter().enumerate() {
                if let RunContent::Drawing(drawing) = item {
                    return Some(((b, i, c), drawing));
                }
            }
        }
    }
    None
}

fn insert_picture(
    package: &mut Package,
    doc: &mut Document,
    logo: &Path,
    data: Vec<u8>,
    kind: ImageKind,
) -> Result<ImageSwap, ImageSwapError> {
    let ((b, i, c), drawing) = first_drawing(doc).ok_or(ImageSwapError::NoPicture)?;
    let (cx, cy) = drawing
        .extent()
        .filter(|(cx, cy)| *cx > 0 && *cy > 0)
        .ok_or(ImageSwapError::NoExtent)?;
    let mut warnings = Vec::new();

    let (bytes, kind) = if kind.is_vector() {
        match media::rasterize_svg(&data, Some(GENERATION.pixel_size(cx, cy))) {
            Ok(png) => (png, ImageKind::Png),
            Err(e) => {
                warn!("rasterizing {} failed ({e}), embedding the SVG", logo.display());
                warnings.push(Warning::Rasterization {
                    logo: logo.to_path_buf(),
                    reason: e.to_string(),
                });
                (data, kind)
            }
        }
    } else {
        (data, kind)
    };

    let part_name = package.unused_part_name("word/media", "logo", kind.extension());
    let target = part_name.strip_prefix("word/").unwrap_or(&part_name).to_string();
    package.ensure_default_content_type(kind.extension(), kind.content_type())?;
    let rel_id = package.add_relationship(DOCUMENT_PART, IMAGE_REL_TYPE, &target)?;
    package.set_part(&part_name, bytes);

    let id = max_drawing_id(doc) + 1;
    let picture = Drawing::new_inline(cx, cy, &rel_id, id, "Logo");
    if let Some(Block::Paragraph(paragraph)) = doc.blocks.get_mut(b)
        && let Some(Inline::Run(run)) = paragraph.inlines.get_mut(i)
        && let Some(slot) = run.content.get_mut(c)
    {
        *slot = RunContent::Drawing(picture);
    }

    info!("logo inserted as {part_name} ({rel_id}), {cx}x{cy} EMU");
    Ok(ImageSwap { outcome: SwapOutcome::Inserted { part_name, rel_id }, warnings })
}
