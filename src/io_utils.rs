//! Local CSV input for offline use of the inventory commands.
//!
//! [`CsvSource`] exposes a CSV export of the inventory sheet through the same
//! [`TabularSource`] interface as the live spreadsheet client:
//!
//! - **Delimiter resolution**: extension-based auto-detection (`.csv` → comma,
//!   `.tsv` → tab) with manual override support.
//! - **Encoding**: input decoding via `encoding_rs`, defaulting to UTF-8.
//! - **Shape**: rows may be ragged, exactly like a sparse spreadsheet range.
//!   The file is re-read on every fetch, so standard input (`-`) is refused.

use std::{
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow, bail};
use encoding_rs::{Encoding, UTF_8};
use log::debug;

use crate::{
    data::Cell,
    error::{InventoryError, InventoryResult},
    source::{RawTable, TabularSource},
};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

pub fn open_csv_reader_from_path(
    path: &Path,
    delimiter: u8,
) -> Result<csv::Reader<BufReader<File>>> {
    let file = File::open(path).with_context(|| format!("Opening input file {path:?}"))?;
    Ok(open_csv_reader(BufReader::new(file), delimiter))
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

/// Reads every record of a CSV file into a [`RawTable`], header included.
/// Trailing empty cells are dropped the way a spreadsheet range omits them.
pub fn read_table(path: &Path, delimiter: u8, encoding: &'static Encoding) -> Result<RawTable> {
    let mut reader = open_csv_reader_from_path(path, delimiter)?;
    let mut rows = Vec::new();
    for (row_idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", row_idx + 1))?;
        let mut decoded = decode_record(&record, encoding)
            .with_context(|| format!("Decoding row {}", row_idx + 1))?;
        while decoded.last().is_some_and(|cell| cell.is_empty()) {
            decoded.pop();
        }
        rows.push(decoded.into_iter().map(Cell::Text).collect());
    }
    debug!("Read {} row(s) from {path:?}", rows.len());
    Ok(RawTable::new(rows))
}

/// A CSV file standing in for the spreadsheet. Sheet id and range are ignored.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
    delimiter: u8,
    encoding: &'static Encoding,
}

impl CsvSource {
    pub fn new(path: &Path, delimiter: Option<u8>, encoding: &'static Encoding) -> Result<Self> {
        if is_dash(path) {
            bail!(
                "CSV input must be a file path; standard input cannot be re-read for each request"
            );
        }
        Ok(Self {
            path: path.to_path_buf(),
            delimiter: resolve_input_delimiter(path, delimiter),
            encoding,
        })
    }
}

impl TabularSource for CsvSource {
    fn fetch(&self, _sheet_id: &str, _range_expr: &str) -> InventoryResult<RawTable> {
        read_table(&self.path, self.delimiter, self.encoding)
            .map_err(|err| InventoryError::Fetch(format!("{err:#}")))
    }
}
