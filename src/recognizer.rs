//! Plate recognizer
//!
//! Composition root: validates the input image, runs the OCR detector, orders
//! the fragments and hands their normalized text to the candidate search.

use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

use crate::capture::load_image;
use crate::config::RecognizerConfig;
use crate::error::{RecognizeError, Result};
use crate::plate::{normalize, CandidateSearch, PlateMatch, PlateRules, Token};
use crate::vision::{order_fragments, Fragment, OcrDetector};

/// Message reported when no plate is found. Never valid plate syntax.
pub const NOT_FOUND_MESSAGE: &str = "No valid plate detected.";

/// Outcome of one recognition call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Recognition {
    /// A plate satisfied one of the grammars
    Plate(PlateMatch),
    /// Every strategy was exhausted without a match
    NotFound,
}

impl Recognition {
    /// The plate text, if any
    pub fn plate(&self) -> Option<&str> {
        match self {
            Recognition::Plate(m) => Some(&m.plate),
            Recognition::NotFound => None,
        }
    }
}

impl From<Option<PlateMatch>> for Recognition {
    fn from(found: Option<PlateMatch>) -> Self {
        found.map_or(Recognition::NotFound, Recognition::Plate)
    }
}

impl fmt::Display for Recognition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recognition::Plate(m) => f.write_str(&m.plate),
            Recognition::NotFound => f.write_str(NOT_FOUND_MESSAGE),
        }
    }
}

/// License plate recognizer over an OCR detector
pub struct PlateRecognizer<D> {
    detector: D,
    rules: PlateRules,
    config: RecognizerConfig,
}

impl<D: OcrDetector> PlateRecognizer<D> {
    pub fn new(detector: D, rules: PlateRules, config: RecognizerConfig) -> Self {
        rules.check();
        debug!(
            "Fragments are treated individually; max_horizontal_gap={} is not applied",
            config.max_horizontal_gap
        );
        Self {
            detector,
            rules,
            config,
        }
    }

    pub fn rules(&self) -> &PlateRules {
        &self.rules
    }

    pub fn config(&self) -> &RecognizerConfig {
        &self.config
    }

    /// Recognize the plate in an image file
    pub fn recognize(&self, image_path: &Path) -> Result<Recognition> {
        let image = load_image(image_path)?;

        let start = Instant::now();
        let fragments = self
            .detector
            .detect(&image)
            .map_err(RecognizeError::ocr)?;

        for fragment in &fragments {
            debug!(
                "Detected '{}' with confidence {:.2}",
                fragment.text, fragment.confidence
            );
        }

        let recognition = self.resolve(fragments);
        info!(
            "{:?}: {} ({} backend, {:?})",
            image_path,
            recognition,
            self.detector.name(),
            start.elapsed()
        );
        Ok(recognition)
    }

    /// Resolve a plate from already detected fragments
    pub fn resolve(&self, fragments: Vec<Fragment>) -> Recognition {
        let tokens: Vec<Token> = order_fragments(fragments)
            .into_iter()
            .map(|fragment| Token::new(normalize(&fragment.text), fragment.confidence))
            .collect();

        CandidateSearch::new(&self.rules, self.config.min_confidence)
            .search(&tokens)
            .into()
    }
}
