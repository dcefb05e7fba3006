//! Batch enrichment
//!
//! Rows are processed strictly one after another, so at most one upstream
//! call is in flight per batch. Per-row failures end up in the status column;
//! only an unreadable file aborts a batch, and that happens before this
//! module is reached.

use serde::Serialize;
use tracing::{info, warn};

use crate::config::ColumnConfig;
use crate::csv_io::{write_enriched, CsvError, CsvSource};
use crate::models::{EnrichedRecord, LookupResult, LookupStatus};
use crate::normalizer::{normalize, ColumnMapping};
use crate::resolver::ResolutionPolicy;

/// Per-status row counts for one batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchCounts {
    pub ok: usize,
    pub no_match: usize,
    pub skipped: usize,
    pub error: usize,
}

impl BatchCounts {
    fn record(&mut self, status: LookupStatus) {
        match status {
            LookupStatus::Ok => self.ok += 1,
            LookupStatus::NoMatch => self.no_match += 1,
            LookupStatus::Skipped => self.skipped += 1,
            LookupStatus::Error => self.error += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.ok + self.no_match + self.skipped + self.error
    }
}

/// Enriched rows of one upload, in input order
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub records: Vec<EnrichedRecord>,
    pub counts: BatchCounts,
}

/// Normalize and resolve every row of `source`
pub async fn enrich_batch(
    source: &CsvSource,
    mapping: &ColumnMapping,
    policy: &ResolutionPolicy,
) -> BatchReport {
    let mut records = Vec::new();
    let mut counts = BatchCounts::default();

    for row in source.records() {
        let enriched = match row {
            Ok(record) => {
                let query = normalize(&record, mapping);
                let row_index = records.len();
                let result = policy.resolve(row_index, &query).await;
                EnrichedRecord { record, result }
            }
            Err(e) => {
                warn!(row_index = e.row_index, outcome = "error", reason = %e.reason, "Unreadable row");
                EnrichedRecord {
                    record: e.partial,
                    result: LookupResult::error(),
                }
            }
        };
        counts.record(enriched.result.status);
        records.push(enriched);
    }

    info!(
        rows = counts.total(),
        ok = counts.ok,
        no_match = counts.no_match,
        skipped = counts.skipped,
        error = counts.error,
        "Batch enrichment complete"
    );

    BatchReport { records, counts }
}

/// Serialized output of one upload
#[derive(Debug, Clone)]
pub struct EnrichedCsv {
    pub contents: Vec<u8>,
    pub counts: BatchCounts,
}

/// Parse an uploaded CSV, enrich every row and serialize the result
///
/// Fails only when the file itself is unusable (no header row, missing
/// required columns, unreadable header) or the output cannot be written.
pub async fn enrich_csv(
    bytes: impl Into<Vec<u8>>,
    columns: &ColumnConfig,
    policy: &ResolutionPolicy,
) -> Result<EnrichedCsv, CsvError> {
    let source = CsvSource::from_bytes(bytes, &columns.required)?;
    let report = enrich_batch(&source, &columns.mapping, policy).await;

    let mut contents = Vec::new();
    write_enriched(source.headers(), &report.records, &columns.output, &mut contents)?;

    Ok(EnrichedCsv {
        contents,
        counts: report.counts,
    })
}
