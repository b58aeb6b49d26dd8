//! Accuracy log storage and the monitor that aggregates it

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use shared::{
    aggregate, error_metrics, AccuracyAggregate, AccuracyFilter, AccuracyRecord, BusinessType,
    DEGRADED_MAPE,
};

use crate::error::{AppError, AppResult};

/// Append-only store of accuracy records, oldest first
pub trait AccuracyLog: Send + Sync {
    fn append(&self, record: AccuracyRecord) -> AppResult<()>;
    fn records(&self) -> AppResult<Vec<AccuracyRecord>>;
}

#[derive(Debug, Default)]
pub struct MemoryAccuracyLog {
    records: Mutex<Vec<AccuracyRecord>>,
}

impl MemoryAccuracyLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AccuracyLog for MemoryAccuracyLog {
    fn append(&self, record: AccuracyRecord) -> AppResult<()> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
        Ok(())
    }

    fn records(&self) -> AppResult<Vec<AccuracyRecord>> {
        Ok(self
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}

/// Accuracy log persisted as JSON lines, one record per line.
///
/// Appends never rewrite earlier records. Calls do blocking file I/O; async
/// callers run them on the blocking pool.
#[derive(Debug)]
pub struct JsonLinesAccuracyLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonLinesAccuracyLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn read_all(&self) -> AppResult<Vec<AccuracyRecord>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut records = Vec::new();
        for (i, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(&line).map_err(|e| {
                AppError::Storage(format!("{} line {}: {}", self.path.display(), i + 1, e))
            })?;
            records.push(record);
        }
        Ok(records)
    }
}

impl AccuracyLog for JsonLinesAccuracyLog {
    fn append(&self, record: AccuracyRecord) -> AppResult<()> {
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(&line)?;
        Ok(())
    }

    fn records(&self) -> AppResult<Vec<AccuracyRecord>> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.read_all()
    }
}

/// Turns realized sales into accuracy records and rolling health flags
#[derive(Clone)]
pub struct AccuracyMonitor {
    log: Arc<dyn AccuracyLog>,
    window: usize,
}

impl AccuracyMonitor {
    pub fn new(log: Arc<dyn AccuracyLog>, window: usize) -> Self {
        Self { log, window }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Compare predictions with realized demand and append the result to the log
    pub fn log_predictions(
        &self,
        actual: &[f64],
        predicted: &[f64],
        business_type: Option<BusinessType>,
        item_name: Option<String>,
    ) -> AppResult<AccuracyRecord> {
        let metrics = error_metrics(actual, predicted).map_err(|e| AppError::Validation {
            field: "predicted".to_string(),
            message: e.to_string(),
        })?;
        let record = AccuracyRecord::new(metrics, actual.len(), business_type, item_name);
        self.log.append(record.clone())?;

        if record.mape > DEGRADED_MAPE {
            tracing::warn!(
                "Accuracy drift: MAPE {:.2}% exceeds {}% for {}",
                record.mape,
                DEGRADED_MAPE,
                record.item_name.as_deref().unwrap_or("all items")
            );
        } else {
            tracing::info!("Logged accuracy: MAPE {:.2}%", record.mape);
        }
        Ok(record)
    }

    /// Rolling aggregate over the last `n` matching records (default window if `None`)
    pub fn accuracy(&self, filter: &AccuracyFilter, n: Option<usize>) -> AppResult<AccuracyAggregate> {
        let records = self.log.records()?;
        let result = aggregate(&records, filter, n.unwrap_or(self.window));
        if let Some(alert) = &result.alert_message {
            tracing::warn!("{}", alert);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor() -> AccuracyMonitor {
        AccuracyMonitor::new(Arc::new(MemoryAccuracyLog::new()), 7)
    }

    #[test]
    fn log_then_aggregate() {
        let monitor = monitor();
        let record = monitor
            .log_predictions(
                &[40.0, 45.0, 38.0, 50.0, 42.0],
                &[42.0, 43.0, 40.0, 48.0, 41.0],
                Some(BusinessType::Restaurant),
                Some("Jollof Rice".to_string()),
            )
            .unwrap();
        assert_eq!(record.n_predictions, 5);
        assert_eq!(record.mae, 1.8);

        let agg = monitor.accuracy(&AccuracyFilter::default(), None).unwrap();
        assert!(agg.meets_target);
        assert_eq!(agg.history.len(), 1);
    }

    #[test]
    fn mismatched_batch_is_validation_error() {
        let err = monitor()
            .log_predictions(&[1.0, 2.0], &[1.0], None, None)
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[test]
    fn json_log_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.jsonl");
        let first = AccuracyMonitor::new(Arc::new(JsonLinesAccuracyLog::new(&path)), 7);
        first
            .log_predictions(&[10.0, 20.0], &[12.0, 18.0], None, None)
            .unwrap();

        let second = JsonLinesAccuracyLog::new(&path);
        let records = second.records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].mape, 15.0);
    }

    #[test]
    fn missing_json_log_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = JsonLinesAccuracyLog::new(dir.path().join("none.jsonl"));
        assert!(log.records().unwrap().is_empty());
    }

    #[test]
    fn corrupt_line_names_its_position() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.jsonl");
        let log = JsonLinesAccuracyLog::new(&path);
        append_one(&log);
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"{not json\n").unwrap();

        match log.records() {
            Err(AppError::Storage(msg)) => assert!(msg.contains("line 2"), "{}", msg),
            other => panic!("expected storage error, got {:?}", other),
        }
    }

    fn append_one(log: &JsonLinesAccuracyLog) {
        let record = AccuracyRecord::new(
            error_metrics(&[10.0], &[11.0]).unwrap(),
            1,
            None,
            None,
        );
        log.append(record).unwrap();
    }
}
