// src/process/mod.rs
pub mod raw_table;
pub mod utils;

pub use raw_table::YearlySample;

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use std::{
    fs::File,
    io::{self, BufReader, Read},
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, info, warn};

use utils::{cell_from_bytes, decode_latin1};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("source file for {year} not found: {}", path.display())]
    MissingSource { year: i32, path: PathBuf },
    #[error("input has no header row")]
    NoHeader,
}

/// Open `path` and read its first `max_rows` well-formed records as a
/// [`YearlySample`] tagged with `year`.
///
/// The file is a `delimiter`-separated table with one header row, encoded in
/// ISO-8859-1. Rows wider than the header are dropped and counted; narrower
/// rows are padded with missing cells.
#[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_yearly_sample<P: AsRef<Path>>(
    path: P,
    year: i32,
    max_rows: usize,
    delimiter: u8,
) -> Result<YearlySample> {
    let path = path.as_ref();
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(LoadError::MissingSource {
                year,
                path: path.to_path_buf(),
            }
            .into());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to open {}", path.display()));
        }
    };

    let mut sample = read_yearly_sample(BufReader::new(file), year, max_rows, delimiter)
        .with_context(|| format!("Failed to read sample {}", path.display()))?;
    sample.source = path.to_path_buf();
    Ok(sample)
}

/// Same as [`load_yearly_sample`], over any byte reader.
pub fn read_yearly_sample<R: Read>(
    reader: R,
    year: i32,
    max_rows: usize,
    delimiter: u8,
) -> Result<YearlySample> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true) // row width is checked against the header below
        .from_reader(reader);

    // 1) header row
    let headers: Vec<String> = rdr
        .byte_headers()
        .context("CSV parse error in header row")?
        .iter()
        .map(decode_latin1)
        .collect();
    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Err(LoadError::NoHeader.into());
    }

    let mut sample = YearlySample {
        year,
        source: PathBuf::new(),
        headers,
        rows: Vec::with_capacity(max_rows.min(8192)),
        rejected_rows: 0,
        truncated: false,
    };

    // 2) data rows, stopping at the cap
    let mut records = rdr.byte_records();
    for (idx, result) in records.by_ref().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) if e.is_io_error() => {
                return Err(e).context(format!("I/O error at record {}", idx));
            }
            Err(e) => {
                debug!(year, record = idx, error = %e, "skipping unparseable row");
                sample.rejected_rows += 1;
                continue;
            }
        };

        let cells: Vec<Option<String>> = record.iter().map(cell_from_bytes).collect();
        if !sample.push_row(cells) {
            debug!(
                year,
                record = idx,
                fields = record.len(),
                expected = sample.headers.len(),
                "skipping row wider than header"
            );
            continue;
        }

        if sample.rows.len() >= max_rows {
            break;
        }
    }
    if sample.rows.len() >= max_rows {
        sample.truncated = records.next().is_some();
    }

    if sample.rejected_rows > 0 {
        warn!(
            year,
            rejected = sample.rejected_rows,
            "dropped malformed rows while loading"
        );
    }
    info!(
        year,
        rows = sample.rows.len(),
        columns = sample.headers.len(),
        truncated = sample.truncated,
        "loaded sample"
    );
    Ok(sample)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,flusurv::process=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    #[test]
    fn test_read_latin1_semicolon_table() -> Result<()> {
        init_test_logging();
        let mut content: Vec<u8> = Vec::new();
        content.extend_from_slice(b"idade;sintomas;evolu\xe7\xe3oCaso\n");
        content.extend_from_slice(b"45;Febre, Tosse;Cura\n");
        content.extend_from_slice(b"abc;Dor de Cabe\xe7a;Ignorado\n");
        content.extend_from_slice(b";;\n");

        let sample = read_yearly_sample(Cursor::new(content), 2022, 100, b';')?;

        assert_eq!(sample.year, 2022);
        assert_eq!(sample.headers, vec!["idade", "sintomas", "evoluçãoCaso"]);
        assert_eq!(sample.rows.len(), 3);
        assert_eq!(sample.rows[0][1].as_deref(), Some("Febre, Tosse"));
        assert_eq!(sample.rows[1][1].as_deref(), Some("Dor de Cabeça"));
        assert_eq!(sample.rows[2], vec![None, None, None]);
        assert_eq!(sample.rejected_rows, 0);
        assert!(!sample.truncated);
        Ok(())
    }

    #[test]
    fn test_wide_rows_are_skipped_and_counted() -> Result<()> {
        let content = "a;b\n1;2\n1;2;3\n4\n5;6\n";
        let sample = read_yearly_sample(Cursor::new(content), 2024, 100, b';')?;

        assert_eq!(sample.rows.len(), 3);
        assert_eq!(sample.rejected_rows, 1);
        // short row padded with a missing cell
        assert_eq!(sample.rows[1], vec![Some("4".to_string()), None]);
        Ok(())
    }

    #[test]
    fn test_row_cap() -> Result<()> {
        let mut content = String::from("idade\n");
        for i in 0..20 {
            content.push_str(&format!("{}\n", i));
        }
        let sample = read_yearly_sample(Cursor::new(content), 2022, 5, b';')?;
        assert_eq!(sample.rows.len(), 5);
        assert!(sample.truncated);
        assert_eq!(sample.rows[4][0].as_deref(), Some("4"));

        let exact = read_yearly_sample(Cursor::new("idade\n1\n2\n"), 2022, 2, b';')?;
        assert_eq!(exact.rows.len(), 2);
        assert!(!exact.truncated);
        Ok(())
    }

    #[test]
    fn test_cap_counts_accepted_rows_only() -> Result<()> {
        let content = "a;b\n1;2;3\n1;2\n4;5;6\n7;8\n9;10\n";
        let sample = read_yearly_sample(Cursor::new(content), 2022, 2, b';')?;
        assert_eq!(sample.rows.len(), 2);
        assert_eq!(sample.rejected_rows, 2);
        assert_eq!(sample.rows[1][0].as_deref(), Some("7"));
        Ok(())
    }

    #[test]
    fn test_load_from_disk_sets_source() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        tmp.write_all(b"idade;sintomas\n30;Tosse\n")?;
        let sample = load_yearly_sample(tmp.path(), 2024, 10, b';')?;
        assert_eq!(sample.source, tmp.path());
        assert_eq!(sample.len(), 1);
        Ok(())
    }

    #[test]
    fn test_missing_source_is_typed() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_yearly_sample(dir.path().join("missing.csv"), 2022, 10, b';').unwrap_err();
        match err.downcast_ref::<LoadError>() {
            Some(LoadError::MissingSource { year, .. }) => assert_eq!(*year, 2022),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_empty_file_has_no_header() {
        let err = read_yearly_sample(Cursor::new(""), 2022, 10, b';').unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LoadError>(),
            Some(LoadError::NoHeader)
        ));
    }
}
