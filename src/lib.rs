pub mod analyzer;
pub mod config;
pub mod docx;
mod error;
pub mod image_swap;
pub mod logo;
pub mod logo_assets;
pub mod media;
pub mod model;
pub mod package;
pub mod placeholder;
pub mod render;
pub mod rules;
pub mod table;
pub mod xml;

pub use config::{FieldMapping, LogoMapping, TemplateSpec};
pub use error::{Error, Warning};
pub use package::Package;

use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use analyzer::TemplateReport;
use image_swap::SwapOutcome;
use package::DOCUMENT_PART;

/// Everything one cover needs besides the template specification.
#[derive(Clone, Debug)]
pub struct CoverRequest {
    pub template: PathBuf,
    pub logo_dir: PathBuf,
    pub institution: String,
    pub fields: FieldMapping,
    /// `.docx` or `.pdf`; any other extension is written as `.docx`.
    pub output: PathBuf,
    /// LibreOffice executable for PDF output; see [`render::soffice_program`].
    pub soffice: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CoverReport {
    pub docx: PathBuf,
    pub pdf: Option<PathBuf>,
    pub logo: Option<PathBuf>,
    /// The template as it was before anything was written.
    pub template: TemplateReport,
    pub substitutions: usize,
    pub warnings: Vec<Warning>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PopulateReport {
    pub template: TemplateReport,
    pub logo: Option<SwapOutcome>,
    pub substitutions: usize,
    pub warnings: Vec<Warning>,
}

/// Swaps in the logo (when there is one) and fills the placeholders of an
/// open package. Logo problems are reported as warnings, never as errors.
pub fn populate(
    package: &mut Package,
    logo: Option<&Path>,
    fields: &FieldMapping,
    spec: &TemplateSpec,
) -> Result<PopulateReport, Error> {
    let mut doc = docx::load(package)?;
    let mut warnings = Vec::new();

    let template = analyzer::report(&doc, &package.relationships(DOCUMENT_PART)?, &spec.markers());
    info!(
        "template: {} image(s), {} placeholder(s), {} labelled",
        template.summary.images, template.summary.placeholders, template.summary.labelled
    );
    for found in template.placeholders.iter().filter(|p| !p.label.is_empty()) {
        debug!("paragraph {}: label '{}'", found.paragraph_index, found.label);
    }

    let mut swapped = None;
    if let Some(logo) = logo {
        match image_swap::replace_first_image(package, &mut doc, logo) {
            Ok(swap) => {
                warnings.extend(swap.warnings);
                swapped = Some(swap.outcome);
            }
            Err(e) => {
                warn!("logo {} not placed: {e}", logo.display());
                warnings.push(Warning::ImageSubstitution {
                    logo: logo.to_path_buf(),
                    reason: e.to_string(),
                });
            }
        }
    }

    let substitutions = placeholder::substitute_placeholders(&mut doc, fields, spec);
    info!("{substitutions} placeholder(s) filled");
    docx::store(&doc, package);

    Ok(PopulateReport { template, logo: swapped, substitutions, warnings })
}

pub fn generate_cover(request: &CoverRequest, spec: &TemplateSpec) -> Result<CoverReport, Error> {
    if !request.template.is_file() {
        return Err(Error::InputMissing(request.template.clone()));
    }
    if !request.logo_dir.is_dir() {
        return Err(Error::InputMissing(request.logo_dir.clone()));
    }

    let fields = if request.fields.is_empty() {
        info!("no fields supplied, using the template defaults");
        spec.defaults.clone()
    } else {
        request.fields.clone()
    };

    let workspace = tempfile::tempdir()?;
    let mut package = Package::open(&request.template)?;
    let mut warnings = Vec::new();

    let mapping = logo::load_mapping(LogoMapping::locate(spec, &request.logo_dir).as_deref());
    let logo = logo::resolve_logo(&request.logo_dir, &request.institution, mapping.as_ref())?;
    match &logo {
        Some(path) => info!("logo for '{}': {}", request.institution, path.display()),
        None => {
            warn!("no logo found for '{}'", request.institution);
            warnings.push(Warning::LogoNotFound { name: request.institution.clone() });
        }
    }

    let populated = populate(&mut package, logo.as_deref(), &fields, spec)?;
    warnings.extend(populated.warnings);

    let wants_pdf = has_extension(&request.output, "pdf");
    let docx = if has_extension(&request.output, "docx") {
        request.output.clone()
    } else {
        request.output.with_extension("docx")
    };

    // Built in the workspace, copied out once complete.
    let file_name = docx.file_name().map(PathBuf::from).unwrap_or_else(|| "cover.docx".into());
    let staged = workspace.path().join(file_name);
    package.save(&staged)?;
    if let Some(parent) = docx.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::copy(&staged, &docx)?;
    info!("saved {}", docx.display());

    let mut pdf = None;
    if wants_pdf {
        match render::convert_to_pdf(&staged, workspace.path(), request.soffice.as_deref()) {
            Ok(rendered) => {
                std::fs::copy(&rendered, &request.output)?;
                info!("saved {}", request.output.display());
                pdf = Some(request.output.clone());
            }
            Err(e) => {
                warn!("PDF not generated, DOCX kept at {}: {e}", docx.display());
                warnings.push(Warning::RenderConversion { reason: e.to_string() });
            }
        }
    }

    Ok(CoverReport {
        docx,
        pdf,
        logo,
        template: populated.template,
        substitutions: populated.substitutions,
        warnings,
    })
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().and_then(|e| e.to_str()).is_some_and(|e| e.eq_ignore_ascii_case(ext))
}
