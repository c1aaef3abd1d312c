//! Image input
//!
//! Verifies that a referenced image exists and decodes before any OCR runs.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::RecognizeError;

/// An image file that exists and decodes. Detectors read the file themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedImage {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl LoadedImage {
    pub fn new(path: PathBuf, width: u32, height: u32) -> Self {
        Self { path, width, height }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Load and decode an image file
pub fn load_image(path: &Path) -> Result<LoadedImage, RecognizeError> {
    if !path.exists() {
        return Err(RecognizeError::InputNotFound {
            path: path.to_path_buf(),
        });
    }

    let decoded = image::open(path).map_err(|source| RecognizeError::InputUndecodable {
        path: path.to_path_buf(),
        source,
    })?;

    let (width, height) = (decoded.width(), decoded.height());
    debug!("Decoded {:?}: {}x{}", path, width, height);

    Ok(LoadedImage::new(path.to_path_buf(), width, height))
}
