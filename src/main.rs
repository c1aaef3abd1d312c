//! platescan - license plate recognition from OCR fragments
//!
//! Runs an external OCR detector on each image and resolves the plate from the
//! detected text.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use platescan::batch::{recognize_all, BatchItem};
use platescan::config::{self, AppConfig, OcrBackend};
use platescan::recognizer::PlateRecognizer;
use platescan::storage;
use platescan::vision::{detector_from_settings, load_fragments, SidecarOcr};

/// platescan - resolve license plates from noisy OCR output
#[derive(Parser, Debug)]
#[command(name = "platescan")]
#[command(about = "Resolve license plates from noisy OCR text fragments")]
struct Args {
    /// Config file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the minimum fragment confidence (0.0 - 1.0)
    #[arg(long, global = true)]
    min_confidence: Option<f64>,

    /// Log every search step
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recognize the plate in one or more images
    Recognize {
        /// Image files
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Number of images processed in parallel
        #[arg(short, long, default_value = "1")]
        jobs: usize,

        /// OCR backend, overriding the config file
        #[arg(long, value_enum)]
        ocr: Option<OcrBackend>,

        /// Print one JSON object per image
        #[arg(long)]
        json: bool,
    },
    /// Resolve a plate from saved OCR fragments (JSON)
    Resolve {
        /// Fragment file: a JSON array of {bbox, text, confidence} or [bbox, text, confidence]
        fragments: PathBuf,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Inspect or create the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the config file location
    Path,
    /// Write the default configuration
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if args.verbose { "debug" } else { "info" }));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => storage::default_config_path()?,
    };

    match args.command {
        Command::Config { action } => run_config(action, &config_path, args.min_confidence),
        Command::Resolve { fragments, json } => {
            let config = load_effective_config(&config_path, args.min_confidence, None)?;
            run_resolve(config, &fragments, json)
        }
        Command::Recognize {
            images,
            jobs,
            ocr,
            json,
        } => {
            let config = load_effective_config(&config_path, args.min_confidence, ocr)?;
            run_recognize(config, images, jobs, json)
        }
    }
}

/// Config file values with command line overrides applied
fn load_effective_config(
    path: &Path,
    min_confidence: Option<f64>,
    ocr: Option<OcrBackend>,
) -> Result<AppConfig> {
    let config = config::load_or_default(path)?;
    Ok(apply_overrides(config, min_confidence, ocr))
}

fn apply_overrides(mut config: AppConfig, min_confidence: Option<f64>, ocr: Option<OcrBackend>) -> AppConfig {
    if let Some(min_confidence) = min_confidence {
        config.recognizer.min_confidence = min_confidence;
    }
    if let Some(backend) = ocr {
        config.ocr.backend = backend;
    }
    config.sanitized()
}

fn run_recognize(config: AppConfig, images: Vec<PathBuf>, jobs: usize, json: bool) -> Result<ExitCode> {
    let detector = detector_from_settings(&config.ocr)?;
    info!("Using {} OCR backend", detector.name());

    let recognizer = PlateRecognizer::new(detector, config.rules, config.recognizer);
    let single = images.len() == 1;
    let items = recognize_all(&recognizer, images, jobs);

    let mut failed = false;
    for item in &items {
        failed |= item.result.is_err();
        print_item(item, single, json)?;
    }

    Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

fn print_item(item: &BatchItem, single: bool, json: bool) -> Result<()> {
    if json {
        println!("{}", item_json(item)?);
    } else {
        println!("{}", item_line(item, single));
    }
    Ok(())
}

/// One JSON object per image: the recognition with an `image` key, or an error object
fn item_json(item: &BatchItem) -> Result<serde_json::Value> {
    Ok(match &item.result {
        Ok(recognition) => {
            let mut value = serde_json::to_value(recognition)?;
            value["image"] = json!(item.path);
            value
        }
        Err(e) => json!({ "image": item.path, "status": "error", "error": e.to_string() }),
    })
}

fn item_line(item: &BatchItem, single: bool) -> String {
    let line = match &item.result {
        Ok(recognition) => recognition.to_string(),
        Err(e) => format!("Error: {}", e),
    };
    if single {
        line
    } else {
        format!("{}: {}", item.path.display(), line)
    }
}

fn run_resolve(config: AppConfig, fragments_path: &Path, json: bool) -> Result<ExitCode> {
    let fragments = load_fragments(fragments_path)?;
    info!("Loaded {} fragments from {:?}", fragments.len(), fragments_path);

    // No image is involved, so the detector is never called
    let recognizer = PlateRecognizer::new(SidecarOcr, config.rules, config.recognizer);
    let recognition = recognizer.resolve(fragments);

    if json {
        println!("{}", serde_json::to_string(&recognition)?);
    } else {
        println!("{}", recognition);
    }

    Ok(ExitCode::SUCCESS)
}

fn run_config(action: ConfigAction, path: &Path, min_confidence: Option<f64>) -> Result<ExitCode> {
    match action {
        ConfigAction::Show => {
            let config = load_effective_config(path, min_confidence, None)?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Path => println!("{}", path.display()),
        ConfigAction::Init { force } => {
            init_config(path, force)?;
            println!("Wrote default configuration to {}", path.display());
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Write the default configuration, refusing to replace a file unless `force`
fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    config::save_config(&AppConfig::default(), path)
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use platescan::error::RecognizeError;
    use platescan::recognizer::Recognition;
    use platescan::vision::Fragment;
    use tempfile::tempdir;

    fn plate_item(path: &str) -> BatchItem {
        let recognizer = PlateRecognizer::new(SidecarOcr, Default::default(), Default::default());
        let fragments = vec![
            Fragment::new(vec![(0.0, 0.0)], "AB1", 0.9),
            Fragment::new(vec![(0.0, 10.0)], "23CD", 0.9),
        ];
        BatchItem {
            path: PathBuf::from(path),
            result: Ok(recognizer.resolve(fragments)),
        }
    }

    #[test]
    fn test_min_confidence_override_is_clamped() {
        let config = apply_overrides(AppConfig::default(), Some(1.7), None);
        assert_eq!(config.recognizer.min_confidence, 1.0);

        let config = apply_overrides(AppConfig::default(), Some(0.8), Some(OcrBackend::Sidecar));
        assert_eq!(config.recognizer.min_confidence, 0.8);
        assert_eq!(config.ocr.backend, OcrBackend::Sidecar);

        let config = apply_overrides(AppConfig::default(), None, None);
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_effective_config_overrides_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[recognizer]\nmin_confidence = 0.7\n").unwrap();

        let config = load_effective_config(&path, None, None).unwrap();
        assert_eq!(config.recognizer.min_confidence, 0.7);

        let config = load_effective_config(&path, Some(-2.0), None).unwrap();
        assert_eq!(config.recognizer.min_confidence, 0.0);
    }

    #[test]
    fn test_item_json_merges_image_key() {
        let value = item_json(&plate_item("cars/a.jpg")).unwrap();
        assert_eq!(value["status"], "plate");
        assert_eq!(value["plate"], "AB123CD");
        assert_eq!(value["tier"], "raw_pair");
        assert_eq!(value["image"], "cars/a.jpg");

        let not_found = BatchItem {
            path: PathBuf::from("b.jpg"),
            result: Ok(Recognition::NotFound),
        };
        let value = item_json(&not_found).unwrap();
        assert_eq!(value, json!({ "status": "not_found", "image": "b.jpg" }));
    }

    #[test]
    fn test_item_json_error_object() {
        let item = BatchItem {
            path: PathBuf::from("missing.jpg"),
            result: Err(RecognizeError::InputNotFound {
                path: PathBuf::from("missing.jpg"),
            }),
        };
        let value = item_json(&item).unwrap();
        assert_eq!(value["image"], "missing.jpg");
        assert_eq!(value["status"], "error");
        assert!(value["error"].as_str().unwrap().contains("missing.jpg"));
    }

    #[test]
    fn test_item_line() {
        assert_eq!(item_line(&plate_item("a.jpg"), true), "AB123CD");
        assert_eq!(item_line(&plate_item("a.jpg"), false), "a.jpg: AB123CD");
    }

    #[test]
    fn test_init_config_writes_loadable_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        init_config(&path, false).unwrap();
        assert_eq!(config::load_config(&path).unwrap(), AppConfig::default());
    }

    #[test]
    fn test_init_config_requires_force_to_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[recognizer]\nmin_confidence = 0.9\n").unwrap();

        assert!(init_config(&path, false).is_err());
        assert_eq!(config::load_config(&path).unwrap().recognizer.min_confidence, 0.9);

        init_config(&path, true).unwrap();
        assert_eq!(config::load_config(&path).unwrap(), AppConfig::default());
    }

    #[test]
    fn test_show_prints_effective_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[recognizer]\nmin_confidence = 3.0\n").unwrap();

        let config = load_effective_config(&path, None, None).unwrap();
        let shown: AppConfig = toml::from_str(&toml::to_string_pretty(&config).unwrap()).unwrap();
        assert_eq!(shown.recognizer.min_confidence, 1.0);
        assert_eq!(shown.rules, config.rules);
    }
}
