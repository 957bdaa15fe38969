use std::fmt;
use std::io::Cursor;
use std::path::Path;

use resvg::{tiny_skia, usvg};
use serde::Serialize;

use crate::model::EMU_PER_INCH;

/// Largest raster side we are willing to allocate.
const MAX_RASTER_SIDE: u32 = 16_384;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Svg,
    Png,
    Jpeg,
    Gif,
    Bmp,
    Tiff,
    Webp,
    Emf,
    Wmf,
}

impl ImageKind {
    pub fn from_extension(ext: &str) -> Option<ImageKind> {
        match ext.to_ascii_lowercase().as_str() {
            "svg" => Some(ImageKind::Svg),
            "png" => Some(ImageKind::Png),
            "jpg" | "jpeg" | "jpe" => Some(ImageKind::Jpeg),
            "gif" => Some(ImageKind::Gif),
            "bmp" => Some(ImageKind::Bmp),
            "tif" | "tiff" => Some(ImageKind::Tiff),
            "webp" => Some(ImageKind::Webp),
            "emf" => Some(ImageKind::Emf),
            "wmf" => Some(ImageKind::Wmf),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<ImageKind> {
        path.extension().and_then(|e| e.to_str()).and_then(ImageKind::from_extension)
    }

    pub fn from_content_type(content_type: &str) -> Option<ImageKind> {
        match content_type {
            "image/svg+xml" => Some(ImageKind::Svg),
            "image/png" => Some(ImageKind::Png),
            "image/jpeg" | "image/jpg" => Some(ImageKind::Jpeg),
            "image/gif" => Some(ImageKind::Gif),
            "image/bmp" => Some(ImageKind::Bmp),
            "image/tiff" => Some(ImageKind::Tiff),
            "image/webp" => Some(ImageKind::Webp),
            "image/x-emf" | "image/emf" => Some(ImageKind::Emf),
            "image/x-wmf" | "image/wmf" => Some(ImageKind::Wmf),
            _ => None,
        }
    }

    /// Identifies a payload from its leading bytes.
    pub fn sniff(data: &[u8]) -> Option<ImageKind> {
        match data {
            [0x89, b'P', b'N', b'G', ..] => Some(ImageKind::Png),
            [0xFF, 0xD8, ..] => Some(ImageKind::Jpeg),
            [b'G', b'I', b'F', b'8', ..] => Some(ImageKind::Gif),
            [b'B', b'M', ..] => Some(ImageKind::Bmp),
            [b'I', b'I', 0x2A, 0x00, ..] | [b'M', b'M', 0x00, 0x2A, ..] => Some(ImageKind::Tiff),
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some(ImageKind::Webp),
            [0x01, 0x00, 0x00, 0x00, ..] => Some(ImageKind::Emf),
            [0xD7, 0xCD, 0xC6, 0x9A, ..] => Some(ImageKind::Wmf),
            _ => {
                let head = &data[..data.len().min(1024)];
                String::from_utf8_lossy(head).contains("<svg").then_some(ImageKind::Svg)
            }
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageKind::Svg => "svg",
            ImageKind::Png => "png",
            ImageKind::Jpeg => "jpeg",
            ImageKind::Gif => "gif",
            ImageKind::Bmp => "bmp",
            ImageKind::Tiff => "tiff",
            ImageKind::Webp => "webp",
            ImageKind::Emf => "emf",
            ImageKind::Wmf => "wmf",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ImageKind::Svg => "image/svg+xml",
            ImageKind::Png => "image/png",
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Gif => "image/gif",
            ImageKind::Bmp => "image/bmp",
            ImageKind::Tiff => "image/tiff",
            ImageKind::Webp => "image/webp",
            ImageKind::Emf => "image/x-emf",
            ImageKind::Wmf => "image/x-wmf",
        }
    }

    pub fn is_vector(self) -> bool {
        self == ImageKind::Svg
    }

    /// Preference order for logo assets: vector, lossless raster, lossy raster, other.
    pub fn rank(self) -> u8 {
        match self {
            ImageKind::Svg => 0,
            ImageKind::Png | ImageKind::Bmp | ImageKind::Gif | ImageKind::Tiff => 1,
            ImageKind::Jpeg | ImageKind::Webp => 2,
            ImageKind::Emf | ImageKind::Wmf => 3,
        }
    }

    fn raster_format(self) -> Option<image::ImageFormat> {
        match self {
            ImageKind::Png => Some(image::ImageFormat::Png),
            ImageKind::Jpeg => Some(image::ImageFormat::Jpeg),
            ImageKind::Gif => Some(image::ImageFormat::Gif),
            ImageKind::Bmp => Some(image::ImageFormat::Bmp),
            ImageKind::Tiff => Some(image::ImageFormat::Tiff),
            ImageKind::Webp => Some(image::ImageFormat::WebP),
            ImageKind::Svg | ImageKind::Emf | ImageKind::Wmf => None,
        }
    }
}

/// Rank of a file by its extension; unknown extensions sort last.
pub fn rank_of(path: &Path) -> u8 {
    ImageKind::from_path(path).map_or(3, ImageKind::rank)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

/// An EMU-to-pixel conversion context.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Resolution {
    pub dpi: f64,
    pub scale: f64,
}

/// For humans reading an inspection report: screen pixels.
pub const REPORTING: Resolution = Resolution { dpi: 96.0, scale: 1.0 };
/// For rasterizing logos that must stay sharp when the printed page is zoomed.
pub const GENERATION: Resolution = Resolution { dpi: 300.0, scale: 3.0 };

impl Resolution {
    pub fn pixels(&self, emu: u64) -> f64 {
        emu as f64 / EMU_PER_INCH * self.dpi * self.scale
    }

    pub fn pixel_size(&self, cx: u64, cy: u64) -> PixelSize {
        PixelSize {
            width: self.pixels(cx).round() as u32,
            height: self.pixels(cy).round() as u32,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MediaError {
    Svg(String),
    Raster(String),
    BadSize(PixelSize),
    Unsupported(ImageKind),
}

impl fmt::Display for MediaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaError::Svg(e) => write!(f, "invalid SVG: {e}"),
            MediaError::Raster(e) => write!(f, "raster conversion failed: {e}"),
            MediaError::BadSize(size) => {
                write!(f, "unusable raster size {}x{}", size.width, size.height)
            }
            MediaError::Unsupported(kind) => write!(f, "cannot encode {kind:?}"),
        }
    }
}

impl std::error::Error for MediaError {}

/// Renders an SVG to PNG. With a target size the drawing is scaled to fit
/// (aspect preserved, centered, transparent margins); without one it is
/// rendered at its intrinsic size.
pub fn rasterize_svg(data: &[u8], target: Option<PixelSize>) -> Result<Vec<u8>, MediaError> {
    let tree = usvg::Tree::from_data(data, &usvg::Options::default())
        .map_err(|e| MediaError::Svg(e.to_string()))?;
    let intrinsic = tree.size();
    let size = target.unwrap_or(PixelSize {
        width: intrinsic.width().ceil() as u32,
        height: intrinsic.height().ceil() as u32,
    });
    if size.width == 0
        || size.height == 0
        || size.width > MAX_RASTER_SIDE
        || size.height > MAX_RASTER_SIDE
    {
        return Err(MediaError::BadSize(size));
    }

    let mut pixmap =
        tiny_skia::Pixmap::new(size.width, size.height).ok_or(MediaError::BadSize(size))?;
    let scale = (size.width as f32 / intrinsic.width()).min(size.height as f32 / intrinsic.height());
    let dx = (size.width as f32 - intrinsic.width() * scale) / 2.0;
    let dy = (size.height as f32 - intrinsic.height() * scale) / 2.0;
    let transform = tiny_skia::Transform::from_scale(scale, scale).post_translate(dx, dy);
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    pixmap.encode_png().map_err(|e| MediaError::Raster(e.to_string()))
}

/// Re-encodes a raster image into another raster format.
pub fn transcode(data: &[u8], to: ImageKind) -> Result<Vec<u8>, MediaError> {
    let format = to.raster_format().ok_or(MediaError::Unsupported(to))?;
    let decoded = image::load_from_memory(data).map_err(|e| MediaError::Raster(e.to_string()))?;
    // JPEG has no alpha channel.
    let decoded = match to {
        ImageKind::Jpeg => image::DynamicImage::ImageRgb8(flatten_on_white(&decoded)),
        _ => decoded,
    };
    let mut out = Cursor::new(Vec::new());
    decoded
        .write_to(&mut out, format)
        .map_err(|e| MediaError::Raster(e.to_string()))?;
    Ok(out.into_inner())
}

/// Blends every pixel over an opaque white page, so transparent areas come
/// out white instead of black.
pub fn flatten_on_white(img: &image::DynamicImage) -> image::RgbImage {
    let rgba = img.to_rgba8();
    image::RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = u32::from(a);
        let blend = |c: u8| ((u32::from(c) * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        image::Rgb([blend(r), blend(g), blend(b)])
    })
}
