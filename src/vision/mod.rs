//! Vision/OCR Layer
//!
//! Text fragments produced by an external OCR pass and the detectors that
//! produce them. The OCR engine itself is a black box; supported backends:
//! - an external command printing fragments as JSON
//! - sidecar JSON files saved next to each image (replay)

pub mod grouping;
pub mod ocr;

pub use grouping::order_fragments;
pub use ocr::{load_fragments, parse_fragments, CommandOcr, SidecarOcr};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::capture::LoadedImage;
use crate::config::{OcrBackend, OcrSettings};

/// Single OCR observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireFragment")]
pub struct Fragment {
    /// Bounding polygon points (x, y)
    #[serde(rename = "bbox")]
    pub polygon: Vec<(f32, f32)>,
    /// Recognized text, as produced by the detector
    pub text: String,
    /// Recognition confidence (0.0 - 1.0)
    pub confidence: f64,
}

impl Fragment {
    pub fn new(polygon: Vec<(f32, f32)>, text: impl Into<String>, confidence: f64) -> Self {
        Self {
            polygon,
            text: text.into(),
            confidence,
        }
    }

    /// Topmost y coordinate of the bounding polygon, 0.0 when it has no points
    pub fn top(&self) -> f32 {
        self.polygon
            .iter()
            .map(|&(_, y)| y)
            .reduce(f32::min)
            .unwrap_or(0.0)
    }
}

/// Accepted JSON shapes: an object, or the `[bbox, text, confidence]` triple
/// most OCR toolkits print
#[derive(Deserialize)]
#[serde(untagged)]
enum WireFragment {
    Object {
        #[serde(alias = "polygon", alias = "box")]
        bbox: Vec<(f32, f32)>,
        text: String,
        #[serde(alias = "prob", alias = "score")]
        confidence: f64,
    },
    Triple(Vec<(f32, f32)>, String, f64),
}

impl From<WireFragment> for Fragment {
    fn from(wire: WireFragment) -> Self {
        match wire {
            WireFragment::Object {
                bbox,
                text,
                confidence,
            } => Fragment::new(bbox, text, confidence),
            WireFragment::Triple(bbox, text, confidence) => Fragment::new(bbox, text, confidence),
        }
    }
}

/// External OCR collaborator
pub trait OcrDetector: Send + Sync {
    /// Detect text fragments in a decoded image
    fn detect(&self, image: &LoadedImage) -> Result<Vec<Fragment>>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

impl<T: OcrDetector + ?Sized> OcrDetector for Box<T> {
    fn detect(&self, image: &LoadedImage) -> Result<Vec<Fragment>> {
        (**self).detect(image)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Build the detector selected in the `[ocr]` settings
pub fn detector_from_settings(settings: &OcrSettings) -> Result<Box<dyn OcrDetector>> {
    match settings.backend {
        OcrBackend::Command => {
            let program = settings.program.clone().ok_or_else(|| {
                anyhow::anyhow!("OCR backend 'command' needs [ocr].program in the config file")
            })?;
            Ok(Box::new(CommandOcr::new(
                program,
                settings.args.clone(),
                settings.language.clone(),
            )))
        }
        OcrBackend::Sidecar => Ok(Box::new(SidecarOcr)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_top() {
        let fragment = Fragment::new(vec![(0.0, 12.0), (30.0, 8.5), (30.0, 20.0)], "AB1", 0.9);
        assert!((fragment.top() - 8.5).abs() < f32::EPSILON);
        assert_eq!(Fragment::new(vec![], "X", 0.5).top(), 0.0);
    }

    #[test]
    fn test_fragment_json_shapes() {
        let json = r#"[
            {"bbox": [[0, 10], [40, 10]], "text": "AB1", "confidence": 0.9},
            [[[0, 50], [40, 50]], "23CD", 0.8],
            {"polygon": [[1, 2]], "text": "x", "prob": 0.1}
        ]"#;
        let fragments: Vec<Fragment> = serde_json::from_str(json).unwrap();
        assert_eq!(fragments.len(), 3);
        assert_eq!(fragments[0].text, "AB1");
        assert_eq!(fragments[1].text, "23CD");
        assert!((fragments[1].confidence - 0.8).abs() < 1e-6);
        assert_eq!(fragments[2].polygon, vec![(1.0, 2.0)]);
    }

    #[test]
    fn test_fragment_serializes_as_object() {
        let fragment = Fragment::new(vec![(1.0, 2.0)], "AB1", 0.5);
        let json = serde_json::to_string(&fragment).unwrap();
        assert!(json.contains("\"bbox\""));
        let back: Fragment = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fragment);
    }

    #[test]
    fn test_command_backend_requires_program() {
        let settings = OcrSettings::default();
        assert!(detector_from_settings(&settings).is_err());

        let settings = OcrSettings {
            backend: OcrBackend::Sidecar,
            ..OcrSettings::default()
        };
        assert_eq!(detector_from_settings(&settings).unwrap().name(), "sidecar");
    }
}
