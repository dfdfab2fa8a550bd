use std::path::Path;

use anyhow::{anyhow, Context, Result};

/// Read the `context` column from the source CSV in row order. Empty cells
/// are kept as empty strings ("no data for this row") so downstream stages
/// can account for them as skips. A missing file or column is systemic and
/// aborts the run.
pub fn read_contexts(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening source file {}", path.display()))?;

    let headers = reader.headers()?.clone();
    let column = headers
        .iter()
        .position(|h| h == "context")
        .ok_or_else(|| anyhow!("no 'context' column in {}", path.display()))?;

    let mut contexts = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("reading row {} of {}", row, path.display()))?;
        contexts.push(record.get(column).unwrap_or("").to_string());
    }
    Ok(contexts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn csv_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn reads_context_column_in_order() {
        let file = csv_file("id,context\n1,\"{\"\"title\"\":\"\"A\"\"}\"\n2,\n3,plain\n");
        let rows = read_contexts(file.path()).unwrap();
        assert_eq!(rows, vec![r#"{"title":"A"}"#, "", "plain"]);
    }

    #[test]
    fn missing_context_column_is_an_error() {
        let file = csv_file("id,body\n1,x\n");
        let err = read_contexts(file.path()).unwrap_err();
        assert!(err.to_string().contains("context"));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(read_contexts(Path::new("does/not/exist.csv")).is_err());
    }
}
