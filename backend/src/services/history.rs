//! Sales history snapshots and CSV ingestion

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::NaiveDate;
use shared::{
    validate_sales_rows, validate_upload_columns, BusinessType, ItemKey, SalesRecord,
    UploadValidation,
};

use crate::error::{AppError, AppResult};

/// Most row-level parse errors reported for one upload
const MAX_REPORTED_PARSE_ERRORS: usize = 10;

/// Immutable, date-ordered sales history grouped by item
#[derive(Debug, Clone, Default)]
pub struct SalesHistory {
    series: BTreeMap<ItemKey, Vec<SalesRecord>>,
}

impl SalesHistory {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = SalesRecord>) -> Self {
        let mut series: BTreeMap<ItemKey, Vec<SalesRecord>> = BTreeMap::new();
        for record in records {
            series.entry(record.key()).or_default().push(record);
        }
        for rows in series.values_mut() {
            rows.sort_by_key(|r| r.date);
            // a later row for the same day supersedes the earlier one
            let mut deduped: Vec<SalesRecord> = Vec::with_capacity(rows.len());
            for row in rows.drain(..) {
                match deduped.last_mut() {
                    Some(last) if last.date == row.date => *last = row,
                    _ => deduped.push(row),
                }
            }
            *rows = deduped;
        }
        Self { series }
    }

    /// All rows of one item, oldest first
    pub fn series(&self, key: &ItemKey) -> &[SalesRecord] {
        self.series.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Rows of one item dated strictly before `date`
    pub fn before(&self, key: &ItemKey, date: NaiveDate) -> &[SalesRecord] {
        let rows = self.series(key);
        &rows[..rows.partition_point(|r| r.date < date)]
    }

    /// Every item series of one business category
    pub fn business_series(
        &self,
        business_type: BusinessType,
    ) -> impl Iterator<Item = (&ItemKey, &[SalesRecord])> {
        self.series
            .iter()
            .filter(move |(key, _)| key.business_type == business_type)
            .map(|(key, rows)| (key, rows.as_slice()))
    }

    pub fn item_count(&self) -> usize {
        self.series.len()
    }

    pub fn len(&self) -> usize {
        self.series.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &SalesRecord> {
        self.series.values().flatten()
    }

    /// Latest sales date across all items
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.series
            .values()
            .filter_map(|rows| rows.last().map(|r| r.date))
            .max()
    }

    /// This history extended with `new_rows`; new rows win on the same item and day
    pub fn merged(&self, new_rows: &[SalesRecord]) -> SalesHistory {
        SalesHistory::from_records(self.records().cloned().chain(new_rows.iter().cloned()))
    }
}

/// Shared handle to the current history snapshot, replaced wholesale on promotion
#[derive(Debug, Default)]
pub struct HistoryHandle {
    current: RwLock<Arc<SalesHistory>>,
}

impl HistoryHandle {
    pub fn new(history: SalesHistory) -> Self {
        Self {
            current: RwLock::new(Arc::new(history)),
        }
    }

    pub fn snapshot(&self) -> Arc<SalesHistory> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn replace(&self, history: SalesHistory) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(history);
    }
}

/// Load a trusted sales history CSV
pub fn load_sales_csv(path: &Path) -> AppResult<SalesHistory> {
    let mut reader = csv::Reader::from_path(path)?;
    let records = reader
        .deserialize()
        .collect::<Result<Vec<SalesRecord>, csv::Error>>()?;
    tracing::info!(
        "Loaded {} sales rows from {}",
        records.len(),
        path.display()
    );
    Ok(SalesHistory::from_records(records))
}

/// Read and validate an uploaded sales CSV.
///
/// A missing file is `DataNotFound`; content problems land in the report.
pub fn read_sales_upload(path: &Path) -> AppResult<(Vec<SalesRecord>, UploadValidation)> {
    if !path.is_file() {
        return Err(AppError::DataNotFound(path.display().to_string()));
    }

    let mut report = UploadValidation::default();
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let columns: Vec<&str> = headers.iter().map(str::trim).collect();
    validate_upload_columns(&columns, &mut report);
    if !report.errors.is_empty() {
        return Ok((Vec::new(), report.finish()));
    }

    let mut rows = Vec::new();
    let mut parse_errors = 0;
    for (line, result) in reader.deserialize::<SalesRecord>().enumerate() {
        match result {
            Ok(row) => rows.push(row),
            Err(err) => {
                parse_errors += 1;
                if parse_errors <= MAX_REPORTED_PARSE_ERRORS {
                    // line 1 is the header
                    report.error(format!("row {}: {}", line + 2, err));
                }
            }
        }
    }
    if parse_errors > MAX_REPORTED_PARSE_ERRORS {
        report.error(format!(
            "{} more unparseable row(s)",
            parse_errors - MAX_REPORTED_PARSE_ERRORS
        ));
    }

    validate_sales_rows(&rows, &mut report);
    Ok((rows, report.finish()))
}
