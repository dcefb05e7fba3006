//! CSV reading and writing
//!
//! [`CsvSource`] validates the header row up front, then hands out a lazy row
//! iterator that can be restarted from the first row any number of times.
//! [`write_enriched`] writes one output row per record with a uniform header.

use serde::Deserialize;
use std::io::Write;
use std::sync::Arc;
use thiserror::Error;

use crate::models::{EnrichedRecord, InputRecord, LookupResult};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Whole-file CSV errors
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("CSV file is empty (no header row)")]
    Empty,

    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("CSV parse error: {0}")]
    Parse(String),

    #[error("CSV write error: {0}")]
    Write(String),
}

impl From<csv::Error> for CsvError {
    fn from(e: csv::Error) -> Self {
        CsvError::Parse(e.to_string())
    }
}

/// A single unreadable row
///
/// `partial` holds whatever fields could be read, fitted to the header, so
/// the row can still be written to the output.
#[derive(Debug, Clone)]
pub struct RowError {
    pub row_index: usize,
    pub partial: InputRecord,
    pub reason: String,
}

/// Uploaded CSV held in memory
#[derive(Debug, Clone)]
pub struct CsvSource {
    data: Arc<[u8]>,
    headers: Arc<[String]>,
}

impl CsvSource {
    /// Parse the header row and check that every required column is present
    pub fn from_bytes(bytes: impl Into<Vec<u8>>, required_columns: &[String]) -> Result<Self, CsvError> {
        let mut data: Vec<u8> = bytes.into();
        if data.starts_with(UTF8_BOM) {
            data.drain(..UTF8_BOM.len());
        }

        let headers: Arc<[String]> = {
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(true)
                .from_reader(data.as_slice());

            let header_record = reader.headers()?;
            if header_record.is_empty() || header_record.iter().all(|h| h.trim().is_empty()) {
                return Err(CsvError::Empty);
            }
            header_record.iter().map(|h| h.trim().to_string()).collect()
        };

        let missing: Vec<String> = required_columns
            .iter()
            .filter(|required| !headers.iter().any(|h| h == *required))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(CsvError::MissingColumns(missing));
        }

        Ok(Self {
            data: data.into(),
            headers,
        })
    }

    pub fn headers(&self) -> &Arc<[String]> {
        &self.headers
    }

    /// Rows from the start of the file, read lazily
    pub fn records(&self) -> impl Iterator<Item = Result<InputRecord, RowError>> + '_ {
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(&self.data[..]);

        reader
            .into_byte_records()
            .enumerate()
            .map(move |(row_index, result)| self.to_record(row_index, result))
    }

    fn to_record(
        &self,
        row_index: usize,
        result: csv::Result<csv::ByteRecord>,
    ) -> Result<InputRecord, RowError> {
        let fail = |partial: InputRecord, reason: String| RowError {
            row_index,
            partial,
            reason,
        };

        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                let empty = InputRecord::from_fields(self.headers.clone(), Vec::<String>::new());
                return Err(fail(empty, e.to_string()));
            }
        };

        let lossy = || raw.iter().map(|f| String::from_utf8_lossy(f).into_owned());

        if raw.len() > self.headers.len() {
            return Err(fail(
                InputRecord::from_fields(self.headers.clone(), lossy()),
                format!("row has {} fields, header has {}", raw.len(), self.headers.len()),
            ));
        }

        match csv::StringRecord::from_byte_record(raw.clone()) {
            Ok(record) => Ok(InputRecord::from_fields(self.headers.clone(), record.iter())),
            Err(e) => Err(fail(
                InputRecord::from_fields(self.headers.clone(), lossy()),
                format!("invalid UTF-8: {}", e),
            )),
        }
    }
}

/// Names of the columns carrying lookup results
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ResultColumns {
    pub email: String,
    pub phone: String,
    pub source: String,
    pub status: String,
}

impl Default for ResultColumns {
    fn default() -> Self {
        Self {
            email: "Enriched Agent Email".to_string(),
            phone: "Enriched Agent Phone".to_string(),
            source: "Lookup Source".to_string(),
            status: "Lookup Status".to_string(),
        }
    }
}

impl ResultColumns {
    fn names(&self) -> [&str; 4] {
        [&self.email, &self.phone, &self.source, &self.status]
    }

    fn values(result: &LookupResult) -> [&str; 4] {
        [
            result.email.as_deref().unwrap_or(""),
            result.phone.as_deref().unwrap_or(""),
            result.source.as_deref().unwrap_or(""),
            result.status.as_str(),
        ]
    }
}

/// Output header: input columns, then result columns not already present
pub fn output_headers(input_headers: &[String], columns: &ResultColumns) -> Vec<String> {
    let mut headers = input_headers.to_vec();
    for name in columns.names() {
        if !headers.iter().any(|h| h == name) {
            headers.push(name.to_string());
        }
    }
    headers
}

/// Serialize enriched records with the header from [`output_headers`]
///
/// A result column that already exists in the input is overwritten in place.
pub fn write_enriched<W: Write>(
    input_headers: &[String],
    records: &[EnrichedRecord],
    columns: &ResultColumns,
    writer: W,
) -> Result<(), CsvError> {
    let headers = output_headers(input_headers, columns);
    let slots: Vec<usize> = columns
        .names()
        .iter()
        .map(|name| headers.iter().position(|h| h == name).unwrap_or(0))
        .collect();

    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer
        .write_record(&headers)
        .map_err(|e| CsvError::Write(e.to_string()))?;

    let mut row: Vec<&str> = Vec::with_capacity(headers.len());
    for enriched in records {
        row.clear();
        row.extend(enriched.record.values().iter().map(String::as_str));
        row.resize(headers.len(), "");
        for (slot, value) in slots.iter().zip(ResultColumns::values(&enriched.result)) {
            row[*slot] = value;
        }
        csv_writer
            .write_record(&row)
            .map_err(|e| CsvError::Write(e.to_string()))?;
    }

    csv_writer.flush().map_err(|e| CsvError::Write(e.to_string()))?;
    Ok(())
}
