use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;

use crate::model::NormalizedPosting;

/// On-disk intermediate representation between the pipeline stages: one file
/// per record under `<staging>/extracted` holding the raw parsed JSON, and
/// one under `<staging>/transformed` holding the normalized posting grouped
/// by sub-record. Keeps each stage auditable and restartable.
fn extracted_dir(staging: &Path) -> PathBuf {
    staging.join("extracted")
}

fn transformed_dir(staging: &Path) -> PathBuf {
    staging.join("transformed")
}

pub fn write_extracted(staging: &Path, index: usize, value: &Value) -> Result<PathBuf> {
    let dir = extracted_dir(staging);
    fs::create_dir_all(&dir)?;
    let path = dir.join(format!("extracted_{}.json", index));
    fs::write(&path, serde_json::to_string_pretty(value)?)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

/// All extracted records as (file stem, contents), sorted by record index so
/// processing order matches source order.
pub fn read_extracted(staging: &Path) -> Result<Vec<(String, String)>> {
    let dir = extracted_dir(staging);
    let mut records = Vec::new();
    let entries = fs::read_dir(&dir)
        .with_context(|| format!("reading staging directory {}", dir.display()))?;

    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let name = match path.file_stem().and_then(|s| s.to_str()) {
            Some(s) => s.to_string(),
            None => continue,
        };
        let contents =
            fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        records.push((name, contents));
    }

    records.sort_by_key(|(name, _)| record_index(name));
    Ok(records)
}

pub fn write_transformed(staging: &Path, source_name: &str, posting: &NormalizedPosting) -> Result<PathBuf> {
    let dir = transformed_dir(staging);
    fs::create_dir_all(&dir)?;
    let path = dir.join(format!("transformed_{}.json", source_name));
    fs::write(&path, serde_json::to_string_pretty(posting)?)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

/// All transformed postings, sorted by record index.
pub fn read_transformed(staging: &Path) -> Result<Vec<NormalizedPosting>> {
    let dir = transformed_dir(staging);
    let mut files = Vec::new();
    let entries = fs::read_dir(&dir)
        .with_context(|| format!("reading staging directory {}", dir.display()))?;

    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        files.push(path);
    }
    files.sort_by_key(|path| {
        path.file_stem()
            .and_then(|s| s.to_str())
            .map(record_index)
            .unwrap_or(usize::MAX)
    });

    let mut postings = Vec::new();
    for path in files {
        let contents =
            fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        let posting: NormalizedPosting = serde_json::from_str(&contents)
            .with_context(|| format!("parsing {}", path.display()))?;
        postings.push(posting);
    }
    Ok(postings)
}

/// Number of staged records per stage, for the stats report. Counts the same
/// `.json` files the readers process, so stats match what the stages see.
pub fn count_staged(staging: &Path) -> (usize, usize) {
    let count = |dir: PathBuf| {
        fs::read_dir(dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter(|e| {
                        e.path().extension().and_then(|x| x.to_str()) == Some("json")
                    })
                    .count()
            })
            .unwrap_or(0)
    };
    (count(extracted_dir(staging)), count(transformed_dir(staging)))
}

// "extracted_12" -> 12; names without a trailing index sort last.
fn record_index(stem: &str) -> usize {
    stem.rsplit('_')
        .next()
        .and_then(|n| n.parse().ok())
        .unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracted_round_trip_is_index_sorted() {
        let staging = tempfile::tempdir().unwrap();
        for index in [10, 2, 0] {
            let value = serde_json::json!({ "title": format!("job {}", index) });
            write_extracted(staging.path(), index, &value).unwrap();
        }
        let records = read_extracted(staging.path()).unwrap();
        let names: Vec<&str> = records.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["extracted_0", "extracted_2", "extracted_10"]);
        assert!(records[0].1.contains("job 0"));
    }

    #[test]
    fn transformed_round_trip() {
        let staging = tempfile::tempdir().unwrap();
        let mut posting = NormalizedPosting::default();
        posting.job.title = "Engineer".into();
        posting.experience.months_of_experience = Some(12);
        write_transformed(staging.path(), "extracted_0", &posting).unwrap();

        let postings = read_transformed(staging.path()).unwrap();
        assert_eq!(postings, vec![posting]);
    }

    #[test]
    fn counts_reflect_staged_files() {
        let staging = tempfile::tempdir().unwrap();
        assert_eq!(count_staged(staging.path()), (0, 0));
        write_extracted(staging.path(), 0, &serde_json::json!({})).unwrap();
        write_extracted(staging.path(), 1, &serde_json::json!({})).unwrap();
        write_transformed(staging.path(), "extracted_0", &NormalizedPosting::default()).unwrap();
        assert_eq!(count_staged(staging.path()), (2, 1));
    }

    #[test]
    fn non_json_entries_are_not_counted() {
        let staging = tempfile::tempdir().unwrap();
        write_extracted(staging.path(), 0, &serde_json::json!({})).unwrap();
        std::fs::write(staging.path().join("extracted/notes.txt"), "scratch").unwrap();
        std::fs::write(staging.path().join("extracted/partial.json.tmp"), "{}").unwrap();
        assert_eq!(count_staged(staging.path()), (1, 0));
        assert_eq!(read_extracted(staging.path()).unwrap().len(), 1);
    }
}
