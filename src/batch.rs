//! Batch recognition
//!
//! Images are independent: each worker takes the next path from a shared queue
//! and runs a full recognition on it. Nothing is parallelized within one image.

use crossbeam_channel::unbounded;
use std::path::PathBuf;
use std::thread;
use tracing::{debug, warn};

use crate::error::Result;
use crate::recognizer::{PlateRecognizer, Recognition};
use crate::vision::OcrDetector;

/// Result for one image of a batch
#[derive(Debug)]
pub struct BatchItem {
    pub path: PathBuf,
    pub result: Result<Recognition>,
}

/// Recognize every image on up to `jobs` worker threads.
///
/// Results come back in input order.
pub fn recognize_all<D: OcrDetector>(
    recognizer: &PlateRecognizer<D>,
    paths: Vec<PathBuf>,
    jobs: usize,
) -> Vec<BatchItem> {
    let total = paths.len();
    let workers = jobs.clamp(1, total.max(1));
    debug!("Recognizing {} images on {} workers", total, workers);

    let (job_tx, job_rx) = unbounded::<(usize, PathBuf)>();
    let (result_tx, result_rx) = unbounded::<(usize, BatchItem)>();

    for job in paths.into_iter().enumerate() {
        // Receiver is alive until the scope below ends
        let _ = job_tx.send(job);
    }
    drop(job_tx);

    thread::scope(|scope| {
        for worker in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            scope.spawn(move || {
                for (index, path) in job_rx.iter() {
                    debug!("Worker {} processing {:?}", worker, path);
                    let result = recognizer.recognize(&path);
                    if let Err(e) = &result {
                        warn!("{}", e);
                    }
                    let _ = result_tx.send((index, BatchItem { path, result }));
                }
            });
        }
    });
    drop(result_tx);

    let mut items: Vec<(usize, BatchItem)> = result_rx.iter().collect();
    items.sort_by_key(|(index, _)| *index);
    items.into_iter().map(|(_, item)| item).collect()
}
