use std::fmt;
use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use log::{info, warn};
use sha2::{Digest, Sha256};

use crate::config::{LOGO_MAPPING_FILE, LogoMapping};
use crate::error::Error;
use crate::media::{ImageKind, MediaError};

/// Raster formats `wrap_directory` picks up.
const WRAPPABLE: [&str; 6] = ["png", "jpg", "jpeg", "webp", "bmp", "gif"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rename {
    pub from: String,
    pub to: String,
}

impl fmt::Display for Rename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// ASCII-safe names for every logo of a directory and the mapping from the
/// original display names to them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MappingPlan {
    pub renames: Vec<Rename>,
    pub mapping: LogoMapping,
}

/// ASCII letters, digits, `-` and `_` of `stem`, spaces turned into `_`.
/// Names with nothing ASCII left become `school_<8 hex digits>`, stable for
/// the same name.
pub fn ascii_name(stem: &str) -> String {
    let stem = stem.trim();
    let kept: String = stem
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .collect();
    let joined = kept.split(' ').filter(|s| !s.is_empty()).collect::<Vec<_>>().join("_");
    let cleaned = joined.trim_matches('_');
    if !cleaned.is_empty() {
        return cleaned.to_string();
    }

    let mut hasher = Sha256::new();
    hasher.update(stem.as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("school_{}", &digest[..8])
}

/// Works out the renames without touching the directory. Files are taken in
/// name order; a name already in use gets `_1`, `_2`, ... before the
/// extension.
pub fn plan_mapping(dir: &Path) -> Result<MappingPlan, Error> {
    let entries = std::fs::read_dir(dir).map_err(|_| Error::InputMissing(dir.to_path_buf()))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        let Ok(name) = entry.file_name().into_string() else { continue };
        if name.starts_with('.') || name == LOGO_MAPPING_FILE || !entry.path().is_file() {
            continue;
        }
        files.push(name);
    }
    files.sort();

    let mut used: Vec<String> = files.clone();
    let mut renames = Vec::new();
    let mut pairs = Vec::new();
    for name in &files {
        let path = Path::new(name);
        let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        let ext = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let base = ascii_name(&stem);
        let mut candidate = format!("{base}{ext}");
        let mut n = 1;
        while candidate != *name && used.contains(&candidate) {
            candidate = format!("{base}_{n}{ext}");
            n += 1;
        }
        used.push(candidate.clone());

        if candidate != *name {
            renames.push(Rename { from: name.clone(), to: candidate.clone() });
        }
        pairs.push((stem, candidate));
    }

    Ok(MappingPlan { renames, mapping: LogoMapping::from_pairs(pairs) })
}

/// Renames the files of `plan` inside `dir` and writes its mapping to
/// `mapping_path`.
pub fn apply_plan(dir: &Path, plan: &MappingPlan, mapping_path: &Path) -> Result<(), Error> {
    for rename in &plan.renames {
        info!("renaming {rename}");
        std::fs::rename(dir.join(&rename.from), dir.join(&rename.to))?;
    }
    if let Some(parent) = mapping_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(mapping_path, plan.mapping.to_json()?)?;
    info!("wrote logo mapping {}", mapping_path.display());
    Ok(())
}

/// An SVG document that shows `data` at its own pixel size. The raster is
/// embedded, not traced.
pub fn wrap_raster(data: &[u8]) -> Result<String, MediaError> {
    let kind = ImageKind::sniff(data)
        .filter(|k| !k.is_vector())
        .ok_or_else(|| MediaError::Raster("not a raster image".into()))?;
    let (w, h) = image::ImageReader::new(std::io::Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| MediaError::Raster(e.to_string()))?
        .into_dimensions()
        .map_err(|e| MediaError::Raster(e.to_string()))?;
    let encoded = BASE64_STANDARD.encode(data);
    Ok(format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>
<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}">
  <image width="{w}" height="{h}" xlink:href="data:{};base64,{encoded}" preserveAspectRatio="xMidYMid meet"/>
</svg>
"#,
        kind.content_type()
    ))
}

/// Default output for `wrap_directory`: a `-svg` sibling of `input`.
pub fn svg_sibling(input: &Path) -> PathBuf {
    let name = input.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    input.with_file_name(format!("{name}-svg"))
}

/// Writes `<stem>.svg` into `output` for every raster logo of `input`.
/// Files that cannot be read as images are logged and skipped.
pub fn wrap_directory(input: &Path, output: &Path) -> Result<Vec<PathBuf>, Error> {
    let entries = std::fs::read_dir(input).map_err(|_| Error::InputMissing(input.to_path_buf()))?;
    let mut sources: Vec<PathBuf> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| WRAPPABLE.contains(&e.to_ascii_lowercase().as_str()))
        })
        .collect();
    sources.sort();

    std::fs::create_dir_all(output)?;
    let mut written = Vec::new();
    for source in sources {
        let data = std::fs::read(&source)?;
        let svg = match wrap_raster(&data) {
            Ok(svg) => svg,
            Err(e) => {
                warn!("skipping {}: {e}", source.display());
                continue;
            }
        };
        let stem = source.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        let target = output.join(format!("{stem}.svg"));
        std::fs::write(&target, svg)?;
        info!("wrote {}", target.display());
        written.push(target);
    }
    Ok(written)
}
