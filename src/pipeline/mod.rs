pub mod clean;
pub mod extract;

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::db;
use crate::model::NormalizedPosting;
use crate::source;
use crate::staging;

/// Why one record was omitted from output. Skips are per-record decisions;
/// they never abort the surrounding run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("empty input")]
    EmptyInput,
    #[error("malformed JSON: {0}")]
    MalformedInput(String),
    #[error("extraction failed: {0}")]
    ExtractionFault(String),
}

/// Normalize one raw JSON-LD posting: parse, flatten, clean the description.
/// Pure function of its input; identical text always yields an identical
/// posting.
pub fn normalize(raw: &str) -> Result<NormalizedPosting, SkipReason> {
    if raw.trim().is_empty() {
        return Err(SkipReason::EmptyInput);
    }
    let value: Value =
        serde_json::from_str(raw).map_err(|e| SkipReason::MalformedInput(e.to_string()))?;
    let Some(obj) = value.as_object() else {
        return Err(SkipReason::ExtractionFault(
            "top-level JSON is not an object".into(),
        ));
    };
    let mut posting = extract::extract(obj);
    posting.job.description = clean::clean(&posting.job.description);
    Ok(posting)
}

/// Per-stage record tally, printed after each batch stage.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StageCounts {
    pub processed: usize,
    pub empty: usize,
    pub malformed: usize,
    pub faults: usize,
}

impl StageCounts {
    pub fn skipped(&self) -> usize {
        self.empty + self.malformed + self.faults
    }

    fn count_skip(&mut self, reason: &SkipReason) {
        match reason {
            SkipReason::EmptyInput => self.empty += 1,
            SkipReason::MalformedInput(_) => self.malformed += 1,
            SkipReason::ExtractionFault(_) => self.faults += 1,
        }
    }

    pub fn print(&self, stage: &str) {
        println!(
            "{}: {} processed, {} skipped ({} empty, {} malformed, {} faults)",
            stage,
            self.processed,
            self.skipped(),
            self.empty,
            self.malformed,
            self.faults,
        );
    }
}

fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec})")
            .unwrap()
            .progress_chars("=> "),
    );
    pb
}

/// Stage 1: read raw `context` cells from the source CSV and persist each
/// parseable one to the extracted staging area. Blank and unparseable cells
/// are skipped with a warning carrying the row index.
pub fn extract_stage(source_csv: &Path, staging_dir: &Path) -> Result<StageCounts> {
    let contexts = source::read_contexts(source_csv)?;
    let mut counts = StageCounts::default();
    let pb = progress_bar(contexts.len());

    for (index, raw) in contexts.iter().enumerate() {
        if raw.trim().is_empty() {
            warn!(row = index, "empty context cell, skipping");
            counts.empty += 1;
        } else {
            match serde_json::from_str::<Value>(raw) {
                Ok(value) => {
                    staging::write_extracted(staging_dir, index, &value)?;
                    counts.processed += 1;
                }
                Err(e) => {
                    warn!(row = index, error = %e, "malformed JSON, skipping");
                    counts.malformed += 1;
                }
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    Ok(counts)
}

/// Stage 2: normalize every extracted record into the transformed staging
/// area. Records are independent, so each chunk is normalized in parallel;
/// a failing record is logged with its file name and skipped.
pub fn transform_stage(staging_dir: &Path) -> Result<StageCounts> {
    let records = staging::read_extracted(staging_dir)?;
    let mut counts = StageCounts::default();
    let pb = progress_bar(records.len());

    for chunk in records.chunks(500) {
        let results: Vec<_> = chunk
            .par_iter()
            .map(|(name, raw)| (name, normalize(raw)))
            .collect();

        for (name, result) in results {
            match result {
                Ok(posting) => {
                    staging::write_transformed(staging_dir, name, &posting)?;
                    counts.processed += 1;
                }
                Err(reason) => {
                    warn!(record = %name, %reason, "skipping record");
                    counts.count_skip(&reason);
                }
            }
        }
        pb.inc(chunk.len() as u64);
    }

    pb.finish_and_clear();
    Ok(counts)
}

/// Stage 3: insert every transformed posting into the database, job row
/// first, then the five child rows carrying its generated id.
pub fn load_stage(staging_dir: &Path, conn: &rusqlite::Connection) -> Result<usize> {
    let postings = staging::read_transformed(staging_dir)?;
    let pb = progress_bar(postings.len());
    let mut loaded = 0;

    for posting in &postings {
        db::insert_posting(conn, posting)?;
        loaded += 1;
        pb.inc(1);
    }

    pb.finish_and_clear();
    Ok(loaded)
}

/// Run a whole pipeline pass, retrying on systemic failure with exponential
/// backoff. Per-record problems are already contained inside the stages; only
/// errors like an unreadable source file or database reach this level.
pub fn run_with_retry<T>(
    retries: u32,
    base_backoff: Duration,
    mut run: impl FnMut() -> Result<T>,
) -> Result<T> {
    let mut attempt = 0;
    loop {
        match run() {
            Ok(value) => return Ok(value),
            Err(e) if attempt < retries => {
                let backoff = base_backoff * 2u32.pow(attempt);
                warn!(
                    "run failed (attempt {}/{}), retrying in {:.1}s: {:#}",
                    attempt + 1,
                    retries + 1,
                    backoff.as_secs_f64(),
                    e
                );
                std::thread::sleep(backoff);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
