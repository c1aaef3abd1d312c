//! Recognition errors
//!
//! Only input problems are errors. A search that finds no plate is the normal
//! [`Recognition::NotFound`](crate::recognizer::Recognition::NotFound) result.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecognizeError {
    #[error("image {} does not exist", path.display())]
    InputNotFound { path: PathBuf },

    #[error("image {} could not be decoded: {source}", path.display())]
    InputUndecodable {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("OCR failed: {0}")]
    Ocr(String),
}

impl RecognizeError {
    /// Wrap a detector failure, keeping the whole context chain in the message
    pub fn ocr(err: anyhow::Error) -> Self {
        RecognizeError::Ocr(format!("{err:#}"))
    }
}

pub type Result<T> = std::result::Result<T, RecognizeError>;
