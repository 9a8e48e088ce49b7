// ============================================================
// Layer 4 — Dataset Reader
// ============================================================
// Parses the line-delimited review format into Records.
//
// The file is a sequence of blocks separated by blank lines:
//
//   label               ← header, skipped
//   1 great movie       ← <label><whitespace><text>
//   0 awful plot
//                       ← blank line closes the block
//   1 loved it          ← first line of a new block
//
// The first line of a block is a header unless it is itself a
// well-formed record line; this lets files omit headers after
// the first block, at the cost of a warning each time it happens.
// Every later line in a block must be a record.
//
// Any malformed record line aborts the whole read: there is no
// partial dataset.

use anyhow::{anyhow, Context, Result};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::PathBuf,
};

use crate::domain::record::{Dataset, Label, Record};

/// Reads a dataset file from disk.
pub struct DatasetReader {
    path: PathBuf,
}

impl DatasetReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn read(&self) -> Result<Dataset> {
        let file = File::open(&self.path)
            .with_context(|| format!("Cannot open dataset '{}'", self.path.display()))?;

        let records = parse_dataset(BufReader::new(file))
            .with_context(|| format!("Cannot parse dataset '{}'", self.path.display()))?;

        tracing::info!("Read {} records from '{}'", records.len(), self.path.display());
        Ok(records)
    }
}

/// Parse every block of `input` into records, stopping at the first error.
pub fn parse_dataset<R: BufRead>(input: R) -> Result<Dataset> {
    let mut records   = Vec::new();
    let mut is_header = true;

    for (idx, line) in input.lines().enumerate() {
        let line_no = idx + 1;
        let line    = line.with_context(|| format!("Cannot read line {line_no}"))?;

        if line.trim().is_empty() {
            is_header = true;
            continue;
        }

        if is_header {
            is_header = false;
            match parse_record_line(&line) {
                Ok(record) => {
                    tracing::warn!(
                        "Line {} opens a block but reads as a record (label {}); kept as data, not skipped as a header",
                        line_no,
                        record.label,
                    );
                    records.push(record);
                }
                Err(_) => tracing::debug!("Skipping header at line {}: {:?}", line_no, line),
            }
            continue;
        }

        let record = parse_record_line(&line)
            .with_context(|| format!("Malformed record at line {line_no}"))?;
        records.push(record);
    }

    Ok(records)
}

/// Split `<label><whitespace><text>` once on whitespace.
fn parse_record_line(line: &str) -> Result<Record> {
    let trimmed = line.trim();

    let (label, text) = trimmed
        .split_once(char::is_whitespace)
        .ok_or_else(|| anyhow!("expected '<label> <text>', found {trimmed:?}"))?;

    let label: Label = label
        .parse()
        .with_context(|| format!("label {label:?} is not an integer"))?;

    Ok(Record::new(text.trim(), label))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    fn parse(s: &str) -> Result<Dataset> {
        parse_dataset(s.as_bytes())
    }

    #[test]
    fn test_two_blocks() {
        let records = parse("label\n1 great movie\n\n0 bad movie\n").unwrap();
        assert_eq!(
            records,
            vec![Record::new("great movie", 1), Record::new("bad movie", 0)]
        );
    }

    #[test]
    fn test_header_of_each_block_is_skipped() {
        let input   = "positive\n1 good\n1 nice\n\nnegative\n0 bad\n";
        let records = parse(input).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[2], Record::new("bad", 0));
    }

    #[test]
    fn test_text_keeps_inner_whitespace() {
        let records = parse("h\n2\t  not  bad at all  \n").unwrap();
        assert_eq!(records, vec![Record::new("not  bad at all", 2)]);
    }

    #[test]
    fn test_missing_separator_is_an_error() {
        let err = parse("header\n1 fine\nonlyonetoken\n1 never reached\n").unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("line 3"), "{msg}");
        assert!(msg.contains("onlyonetoken"), "{msg}");
    }

    #[test]
    fn test_non_integer_label_is_an_error() {
        let err = parse("header\nx some text\n").unwrap_err();
        assert!(format!("{err:#}").contains("not an integer"));
    }

    #[test]
    fn test_repeated_blank_lines() {
        let records = parse("h\n1 a\n\n\n\n0 b\n").unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_empty_input() {
        assert!(parse("").unwrap().is_empty());
    }

    /// Collects formatted log output in memory.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn parse_logged(s: &str) -> (Dataset, String) {
        let logs       = Captured::default();
        let sink       = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || sink.clone())
            .with_ansi(false)
            .finish();

        let records = tracing::subscriber::with_default(subscriber, || parse(s).unwrap());
        let text    = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        (records, text)
    }

    #[test]
    fn test_numeric_block_opener_is_kept_with_a_warning() {
        let (records, logs) = parse_logged("5 star reviews\n1 great\n");
        assert_eq!(
            records,
            vec![Record::new("star reviews", 5), Record::new("great", 1)]
        );
        assert!(logs.contains("WARN"), "{logs}");
        assert!(logs.contains("Line 1 opens a block"), "{logs}");
    }

    #[test]
    fn test_skipped_header_does_not_warn() {
        let (records, logs) = parse_logged("label\n1 great\n");
        assert_eq!(records.len(), 1);
        assert!(!logs.contains("WARN"), "{logs}");
    }

    #[test]
    fn test_reads_from_file() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("dataset.txt");
        std::fs::write(&path, "label\n1 great movie\n").unwrap();
        let records = DatasetReader::new(&path).read().unwrap();
        assert_eq!(records, vec![Record::new("great movie", 1)]);
    }
}
