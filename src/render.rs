use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::debug;

/// Overrides the `soffice` executable when none is passed explicitly.
pub const SOFFICE_ENV: &str = "DOCX_COVER_SOFFICE";

#[derive(Debug)]
pub enum RenderError {
    Launch { program: String, source: std::io::Error },
    Failed { status: Option<i32>, stderr: String },
    NoOutput(PathBuf),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Launch { program, source } => write!(f, "cannot run {program}: {source}"),
            RenderError::Failed { status, stderr } => {
                let code = status.map_or_else(|| "signal".to_string(), |c| c.to_string());
                write!(f, "soffice exited with status {code}: {}", stderr.trim())
            }
            RenderError::NoOutput(path) => write!(f, "soffice did not produce {}", path.display()),
        }
    }
}

impl std::error::Error for RenderError {}

/// `explicit`, else `$DOCX_COVER_SOFFICE`, else `soffice` from `PATH`.
pub fn soffice_program(explicit: Option<&Path>) -> String {
    if let Some(path) = explicit {
        return path.to_string_lossy().into_owned();
    }
    std::env::var(SOFFICE_ENV)
        .ok()
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| "soffice".to_string())
}

/// Converts `docx` into `outdir/<stem>.pdf` with LibreOffice and returns
/// that path.
pub fn convert_to_pdf(
    docx: &Path,
    outdir: &Path,
    soffice: Option<&Path>,
) -> Result<PathBuf, RenderError> {
    let program = soffice_program(soffice);
    debug!("running {program} on {}", docx.display());
    let output = Command::new(&program)
        .arg("--headless")
        .args(["--convert-to", "pdf"])
        .arg(docx)
        .arg("--outdir")
        .arg(outdir)
        .output()
        .map_err(|source| RenderError::Launch { program: program.clone(), source })?;
    if !output.status.success() {
        return Err(RenderError::Failed {
            status: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    let stem = docx.file_stem().unwrap_or_default().to_string_lossy();
    let pdf = outdir.join(format!("{stem}.pdf"));
    if pdf.is_file() { Ok(pdf) } else { Err(RenderError::NoOutput(pdf)) }
}
