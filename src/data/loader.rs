//! Delimited-text loading

use super::Dataset;
use crate::error::{EvaluatorError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Tokens read as missing values in every column
const NULL_TOKENS: [&str; 6] = ["", "NA", "N/A", "NaN", "nan", "null"];

/// CSV/TSV reader producing a [`Dataset`]
#[derive(Debug, Clone)]
pub struct DataLoader {
    /// Rows sampled for schema inference
    infer_schema_length: usize,
    /// Explicit separator; inferred from the extension when `None`
    separator: Option<u8>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            infer_schema_length: 1000,
            separator: None,
        }
    }

    pub fn with_infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = rows;
        self
    }

    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = Some(separator);
        self
    }

    /// Tab for `.tsv`/`.tab`, comma otherwise
    fn separator_for(&self, path: &Path) -> u8 {
        if let Some(sep) = self.separator {
            return sep;
        }
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .as_deref()
        {
            Some("tsv") | Some("tab") => b'\t',
            _ => b',',
        }
    }

    /// Load a delimited file with a header row
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Dataset> {
        let path = path.as_ref();
        let start = Instant::now();
        let file = File::open(path).map_err(|e| {
            EvaluatorError::DataError(format!("cannot open '{}': {}", path.display(), e))
        })?;

        let null_values = NullValues::AllColumns(NULL_TOKENS.iter().map(|t| (*t).into()).collect());
        let parse_opts = CsvParseOptions::default()
            .with_separator(self.separator_for(path))
            .with_null_values(Some(null_values));

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(self.infer_schema_length))
            .with_parse_options(parse_opts)
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| EvaluatorError::DataError(format!("cannot parse '{}': {}", path.display(), e)))?;

        if df.width() == 0 {
            return Err(EvaluatorError::DataError(format!(
                "'{}' has no columns",
                path.display()
            )));
        }

        info!(
            path = %path.display(),
            rows = df.height(),
            columns = df.width(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded dataset"
        );
        Ok(Dataset::new(df))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_csv_with_missing_values() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "a,b,Target").unwrap();
        writeln!(file, "1.0,x,3").unwrap();
        writeln!(file, ",y,4").unwrap();
        writeln!(file, "2.5,NA,5").unwrap();
        file.flush().unwrap();

        let ds = DataLoader::new().load(file.path()).unwrap();
        assert_eq!(ds.height(), 3);
        assert_eq!(ds.width(), 3);
        assert_eq!(ds.missing_count(), 2);
    }

    #[test]
    fn test_load_tsv() {
        let mut file = tempfile::Builder::new().suffix(".tsv").tempfile().unwrap();
        writeln!(file, "a\tb").unwrap();
        writeln!(file, "1\t2").unwrap();
        file.flush().unwrap();

        let ds = DataLoader::new().load(file.path()).unwrap();
        assert_eq!(ds.column_names(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_missing_file_is_data_error() {
        let err = DataLoader::new().load("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, EvaluatorError::DataError(_)));
        assert!(err.is_fatal());
    }
}
