use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum Error {
    InputMissing(PathBuf),
    MappingParse(String),
    InvalidDocx(String),
    Zip(zip::result::ZipError),
    Xml(roxmltree::Error),
    Json(serde_json::Error),
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InputMissing(path) => write!(f, "input not found: {}", path.display()),
            Error::MappingParse(reason) => write!(f, "failed to parse field mapping: {reason}"),
            Error::InvalidDocx(reason) => write!(f, "not a valid DOCX file: {reason}"),
            Error::Zip(e) => write!(f, "ZIP error: {e}"),
            Error::Xml(e) => write!(f, "XML error: {e}"),
            Error::Json(e) => write!(f, "JSON error: {e}"),
            Error::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<zip::result::ZipError> for Error {
    fn from(e: zip::result::ZipError) -> Self {
        Error::Zip(e)
    }
}

impl From<roxmltree::Error> for Error {
    fn from(e: roxmltree::Error) -> Self {
        Error::Xml(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

/// Non-fatal conditions. The pipeline records these and keeps going.
#[derive(Clone, Debug, PartialEq)]
pub enum Warning {
    LogoNotFound { name: String },
    ImageSubstitution { logo: PathBuf, reason: String },
    Rasterization { logo: PathBuf, reason: String },
    RenderConversion { reason: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::LogoNotFound { name } => write!(f, "no logo found for '{name}'"),
            Warning::ImageSubstitution { logo, reason } => {
                write!(f, "could not substitute logo {}: {reason}", logo.display())
            }
            Warning::Rasterization { logo, reason } => {
                write!(f, "could not rasterize {}: {reason}", logo.display())
            }
            Warning::RenderConversion { reason } => write!(f, "PDF conversion skipped: {reason}"),
        }
    }
}
