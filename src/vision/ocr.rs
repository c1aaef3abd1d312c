//! OCR backends
//!
//! The detector is an external program: it receives the image path and prints
//! the detected fragments as JSON on stdout. Saved output can be replayed from
//! sidecar files without running the detector again.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;
use tracing::{debug, info};

use super::{Fragment, OcrDetector};
use crate::capture::LoadedImage;

/// OCR engine running an external detector process
#[derive(Debug, Clone)]
pub struct CommandOcr {
    program: PathBuf,
    args: Vec<String>,
    language: String,
}

impl CommandOcr {
    /// `program` is invoked as `program <args...> --image <path> --lang <language>`
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>, language: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args,
            language: language.into(),
        }
    }

    fn command(&self, image_path: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg("--image")
            .arg(image_path)
            .arg("--lang")
            .arg(&self.language);
        cmd
    }
}

impl OcrDetector for CommandOcr {
    fn detect(&self, image: &LoadedImage) -> Result<Vec<Fragment>> {
        let start = Instant::now();
        debug!(
            "Running OCR: {} {:?} --image {:?} --lang {}",
            self.program.display(),
            self.args,
            image.path,
            self.language
        );

        let output = self
            .command(&image.path)
            .output()
            .with_context(|| format!("Failed to run OCR program {}", self.program.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("OCR program exited with {}: {}", output.status, stderr.trim());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let fragments = parse_fragments(&stdout)?;

        info!(
            "OCR found {} fragments in {:?} ({}x{})",
            fragments.len(),
            start.elapsed(),
            image.width,
            image.height
        );
        Ok(fragments)
    }

    fn name(&self) -> &str {
        "command"
    }
}

/// Replays fragments saved next to each image as `<image>.json`
#[derive(Debug, Clone, Copy, Default)]
pub struct SidecarOcr;

impl SidecarOcr {
    /// Fragment file used for `image_path`
    pub fn sidecar_path(image_path: &Path) -> PathBuf {
        let mut name = image_path.as_os_str().to_owned();
        name.push(".json");
        PathBuf::from(name)
    }
}

impl OcrDetector for SidecarOcr {
    fn detect(&self, image: &LoadedImage) -> Result<Vec<Fragment>> {
        load_fragments(&Self::sidecar_path(&image.path))
    }

    fn name(&self) -> &str {
        "sidecar"
    }
}

/// Load fragments from a JSON file
pub fn load_fragments(path: &Path) -> Result<Vec<Fragment>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read fragments from {}", path.display()))?;
    parse_fragments(&content).with_context(|| format!("Invalid fragments in {}", path.display()))
}

/// Parse a JSON array of fragments, tolerating markdown fences or log lines around it
pub fn parse_fragments(output: &str) -> Result<Vec<Fragment>> {
    let json = extract_json_array(output);
    if json.is_empty() {
        return Ok(vec![]);
    }
    serde_json::from_str(json).context("OCR output is not a JSON fragment list")
}

/// Slice from the first `[` to the last `]`, or the trimmed input when there is none
fn extract_json_array(output: &str) -> &str {
    let output = output.trim();
    match (output.find('['), output.rfind(']')) {
        (Some(start), Some(end)) if start < end => &output[start..=end],
        _ => output,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_extract_json_array_plain() {
        assert_eq!(extract_json_array("[1, 2]"), "[1, 2]");
    }

    #[test]
    fn test_extract_json_array_markdown() {
        let output = "```json\n[{\"a\": 1}]\n```";
        assert_eq!(extract_json_array(output), "[{\"a\": 1}]");
    }

    #[test]
    fn test_extract_json_array_with_log_lines() {
        let output = "loading model...\n[[[0, 1]], \"AB1\", 0.9]\ndone";
        assert_eq!(extract_json_array(output), "[[[0, 1]], \"AB1\", 0.9]");
    }

    #[test]
    fn test_parse_fragments() {
        let fragments = parse_fragments("[[[[0, 1], [5, 1]], \"AB1\", 0.9]]").unwrap();
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].text, "AB1");
        assert!(parse_fragments("   ").unwrap().is_empty());
        assert!(parse_fragments("[]").unwrap().is_empty());
        assert!(parse_fragments("not json").is_err());
    }

    #[test]
    fn test_load_fragments() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"[{{"bbox": [[0, 40]], "text": "23CD", "confidence": 0.8}}]"#
        )
        .unwrap();

        let fragments = load_fragments(file.path()).unwrap();
        assert_eq!(fragments[0].text, "23CD");
        assert!(load_fragments(Path::new("/nonexistent/fragments.json")).is_err());
    }

    #[test]
    fn test_sidecar_path() {
        assert_eq!(
            SidecarOcr::sidecar_path(Path::new("/tmp/car.jpg")),
            PathBuf::from("/tmp/car.jpg.json")
        );
    }

    #[test]
    fn test_missing_program_fails() {
        let ocr = CommandOcr::new("/nonexistent/ocr-program", vec![], "es");
        let image = LoadedImage::new(PathBuf::from("/tmp/plate.png"), 1, 1);
        assert!(ocr.detect(&image).is_err());
    }
}
