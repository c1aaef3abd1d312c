//! platescan - license plate resolution from noisy OCR fragments
//!
//! An external OCR pass reports text fragments with confidences. This crate
//! normalizes them, combines them, corrects visually confusable characters and
//! validates the result against the plate grammars, returning a single plate or
//! a not-found result.

pub mod batch;
pub mod capture;
pub mod config;
pub mod error;
pub mod plate;
pub mod recognizer;
pub mod storage;
pub mod vision;

pub use error::RecognizeError;
pub use plate::{PlateFormat, PlateMatch, PlateRules, Tier};
pub use recognizer::{PlateRecognizer, Recognition, NOT_FOUND_MESSAGE};
pub use vision::{Fragment, OcrDetector};
