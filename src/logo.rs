use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::config::{LOGO_MAPPING_FILE, LogoMapping};
use crate::error::Error;
use crate::media::rank_of;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct LogoCandidate {
    // Field order is the sort order: format rank, then name.
    pub rank: u8,
    pub file_name: String,
    pub path: PathBuf,
}

impl LogoCandidate {
    fn new(path: PathBuf, file_name: String) -> Self {
        LogoCandidate { rank: rank_of(&path), file_name, path }
    }
}

/// Regular, visible files of `dir`, the mapping file excluded, best first.
pub fn list_candidates(dir: &Path) -> Result<Vec<LogoCandidate>, Error> {
    let entries = std::fs::read_dir(dir).map_err(|_| Error::InputMissing(dir.to_path_buf()))?;
    let mut candidates = Vec::new();
    for entry in entries {
        let entry = entry?;
        let Ok(file_name) = entry.file_name().into_string() else { continue };
        if file_name.starts_with('.') || file_name == LOGO_MAPPING_FILE {
            continue;
        }
        if !entry.file_type()?.is_file() && !entry.path().is_file() {
            continue;
        }
        candidates.push(LogoCandidate::new(entry.path(), file_name));
    }
    candidates.sort();
    Ok(candidates)
}

pub fn resolve_logo(
    dir: &Path,
    name: &str,
    mapping: Option<&LogoMapping>,
) -> Result<Option<PathBuf>, Error> {
    let candidates = list_candidates(dir)?;
    let wanted = name.trim();
    if wanted.is_empty() {
        debug!("empty institution name, no logo lookup");
        return Ok(None);
    }

    if let Some(mapping) = mapping {
        for file_name in mapping.lookup(wanted) {
            let path = dir.join(file_name);
            if path.is_file() {
                debug!("logo for '{wanted}' from mapping: {}", path.display());
                return Ok(Some(path));
            }
            warn!("logo mapping names {file_name} for '{wanted}', but it does not exist");
        }
    }

    let lowered = wanted.to_lowercase();
    let mut matched: Vec<&LogoCandidate> = candidates
        .iter()
        .filter(|c| c.file_name.to_lowercase().contains(&lowered))
        .collect();

    if matched.is_empty() {
        let tokens: Vec<&str> = lowered
            .split(|c: char| c.is_whitespace() || c == '-')
            .filter(|t| !t.is_empty())
            .collect();
        matched = candidates
            .iter()
            .filter(|c| {
                let file_name = c.file_name.to_lowercase();
                tokens.iter().all(|t| file_name.contains(t))
            })
            .collect();
    }

    // Candidates are already sorted, so the first match is the best one.
    Ok(matched.first().map(|c| c.path.clone()))
}

/// A broken mapping file is logged and treated as absent.
pub fn load_mapping(path: Option<&Path>) -> Option<LogoMapping> {
    let path = path?;
    match LogoMapping::load(path) {
        Ok(mapping) => Some(mapping),
        Err(e) => {
            warn!("ignoring logo mapping {}: {e}", path.display());
            None
        }
    }
}
