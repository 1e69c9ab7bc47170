// ABOUTME: Error types for the ocr-deck application
// ABOUTME: Provides structured error handling for each stage of the pipeline

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OcrDeckError {
    #[error("Failed to read file: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("Config file '{}' not found.", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Failed to parse YAML config: {0}")]
    ConfigParseError(String),

    #[error("Missing '{0}' section in config.")]
    MissingSection(&'static str),

    #[error("Missing '{key}' under '{section}' in config.")]
    MissingKey { section: &'static str, key: &'static str },

    #[error("'{key}' under '{section}' must be a string path.")]
    InvalidPathValue { section: &'static str, key: &'static str },

    #[error("Images folder '{}' does not exist or is not a directory.", .0.display())]
    ImagesFolderNotFound(PathBuf),

    #[error("Output filename '{0}' must be a string ending with .pptx.")]
    InvalidOutputFilename(String),

    #[error("'{0}' under 'presentation' must be a numerical value.")]
    NotNumeric(&'static str),

    #[error("'{key}' under 'presentation' is out of range: {message}")]
    OutOfRange { key: &'static str, message: String },

    #[error("'extensions' in config should be a list of file extensions.")]
    InvalidExtensions,

    #[error("Invalid extension '{0}' in 'extensions'; must be a string like '.png'.")]
    InvalidExtension(String),

    #[error("Error reading images folder '{}': {source}", .path.display())]
    DirectoryReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not open or read image '{}': {message}", .path.display())]
    ImageError { path: PathBuf, message: String },

    #[error("OCR error: {0}")]
    OcrError(String),

    #[error("PPTX generation error: {0}")]
    PptxError(String),

    #[error("Logger setup error: {0}")]
    LoggerError(String),
}

impl OcrDeckError {
    /// Whether the error only concerns a single input image.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, OcrDeckError::ImageError { .. })
    }
}

// Implement conversion from zip errors
impl From<zip::result::ZipError> for OcrDeckError {
    fn from(err: zip::result::ZipError) -> Self {
        OcrDeckError::PptxError(format!("ZIP operation failed: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, OcrDeckError>;
