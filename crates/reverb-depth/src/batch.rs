use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indicatif::ProgressBar;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use reverb_depth_analyzer::{LineDetectionConfig, measure_depth};
use reverb_depth_source::DynImageSource;
use reverb_depth_types::DepthRecord;

const IMAGE_EXTENSIONS: &[&str] = &["png", "pgm", "pnm", "jpg", "jpeg"];

/// Expands the CLI input argument into the ordered list of image files to
/// process. Sidecar metadata files never count as inputs.
pub fn enumerate_inputs(path: &Path) -> io::Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    let mut files = Vec::new();
    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        let candidate = entry.path();
        if !candidate.is_file() {
            continue;
        }
        let extension = candidate
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match extension {
            Some(ext) if IMAGE_EXTENSIONS.contains(&ext.as_str()) => files.push(candidate),
            _ => {}
        }
    }
    files.sort();
    Ok(files)
}

/// Fans the batch out over a bounded worker pool. Each image runs the full
/// pipeline independently; failures become report rows instead of aborting
/// the run, and the returned records are sorted by file name so concurrent
/// execution stays reproducible.
pub struct BatchRunner {
    source: DynImageSource,
    detection: LineDetectionConfig,
    max_concurrency: usize,
}

impl BatchRunner {
    pub fn new(
        source: DynImageSource,
        detection: LineDetectionConfig,
        max_concurrency: usize,
    ) -> Self {
        Self {
            source,
            detection,
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub async fn run(&self, files: Vec<PathBuf>, progress: &ProgressBar) -> Vec<DepthRecord> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = JoinSet::new();

        for path in files {
            let semaphore = Arc::clone(&semaphore);
            let source = Arc::clone(&self.source);
            let detection = self.detection;
            let progress = progress.clone();
            tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return DepthRecord::failure(display_name(&path), "worker stopped"),
                };
                let record = tokio::task::spawn_blocking(move || {
                    process_one(source.as_ref(), &detection, &path)
                })
                .await
                .unwrap_or_else(|err| {
                    DepthRecord::failure("<unknown>", format!("analysis task failed: {err}"))
                });
                progress.inc(1);
                record
            });
        }

        let mut records = Vec::new();
        while let Some(result) = tasks.join_next().await {
            match result {
                Ok(record) => records.push(record),
                Err(err) => {
                    if !err.is_cancelled() {
                        eprintln!("batch join error: {err}");
                    }
                }
            }
        }

        records.sort_by(|a, b| a.file.cmp(&b.file));
        records
    }
}

fn process_one(
    source: &dyn reverb_depth_source::ImageSource,
    detection: &LineDetectionConfig,
    path: &Path,
) -> DepthRecord {
    let name = display_name(path);
    let (image, metadata) = match source.load(path) {
        Ok(loaded) => loaded,
        Err(err) => {
            eprintln!("failed to load {name}: {err}");
            return DepthRecord::failure(name, err.to_string());
        }
    };
    match measure_depth(&image, &metadata, detection) {
        Ok(measurement) => DepthRecord::success(name, measurement.depth_cm),
        Err(err) => {
            eprintln!("analysis failed for {name}: {err}");
            DepthRecord::failure(name, err.to_string())
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_string())
        .unwrap_or_else(|| path.display().to_string())
}
