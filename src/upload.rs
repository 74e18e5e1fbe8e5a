//! Sequential batch upload of imported races.

use std::cell::Cell;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::{StoreError, UploadError};
use crate::race_import::ImportRow;
use crate::records::{RaceInsert, RecordKind};

/// Persistence collaborator: one insert per call, addressed by table.
#[async_trait(?Send)]
pub trait RecordStore {
    async fn insert(&self, kind: RecordKind, record: serde_json::Value) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFailure {
    pub row_name: String,
    pub message: String,
    pub code: Option<String>,
}

/// Result of one batch. `success_count + failures.len()` equals the number
/// of rows submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOutcome {
    pub success_count: usize,
    pub failures: Vec<UploadFailure>,
}

impl UploadOutcome {
    pub fn attempted(&self) -> usize {
        self.success_count + self.failures.len()
    }
}

/// Submits rows one at a time and refuses to start a second batch while one
/// is still running.
#[derive(Debug, Default)]
pub struct BatchUploadDriver {
    in_flight: Cell<bool>,
}

struct InFlight<'a>(&'a Cell<bool>);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl BatchUploadDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.get()
    }

    /// Insert every row into the `races` table, in order, with at most one
    /// insert outstanding. A failed row is recorded and the batch moves on.
    /// `on_progress` receives `(done, total)` after each row.
    pub async fn upload<S, F>(
        &self,
        rows: &[ImportRow],
        store: &S,
        mut on_progress: F,
    ) -> Result<UploadOutcome, UploadError>
    where
        S: RecordStore + ?Sized,
        F: FnMut(usize, usize),
    {
        if rows.is_empty() {
            return Ok(UploadOutcome::default());
        }
        if self.in_flight.replace(true) {
            return Err(UploadError::AlreadyRunning);
        }
        let _guard = InFlight(&self.in_flight);

        let total = rows.len();
        let mut outcome = UploadOutcome::default();

        for (idx, row) in rows.iter().enumerate() {
            match submit_row(row, store).await {
                Ok(()) => outcome.success_count += 1,
                Err(err) => {
                    tracing::warn!(
                        row = %row.name,
                        message = %err.message,
                        code = err.code.as_deref().unwrap_or("unknown"),
                        "race insert failed"
                    );
                    outcome.failures.push(UploadFailure {
                        row_name: row.name.clone(),
                        message: err.message,
                        code: err.code,
                    });
                }
            }
            on_progress(idx + 1, total);
        }

        tracing::info!(
            total,
            succeeded = outcome.success_count,
            failed = outcome.failures.len(),
            "race import finished"
        );
        Ok(outcome)
    }
}

async fn submit_row<S>(row: &ImportRow, store: &S) -> Result<(), StoreError>
where
    S: RecordStore + ?Sized,
{
    let record = serde_json::to_value(RaceInsert::from(row))
        .map_err(|e| StoreError::new(e.to_string()))?;
    store.insert(RecordKind::Races, record).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct MockStore {
        fail_on: Vec<usize>,
        calls: RefCell<Vec<(RecordKind, serde_json::Value)>>,
    }

    #[async_trait(?Send)]
    impl RecordStore for MockStore {
        async fn insert(
            &self,
            kind: RecordKind,
            record: serde_json::Value,
        ) -> Result<(), StoreError> {
            tokio::task::yield_now().await;
            let call = {
                let mut calls = self.calls.borrow_mut();
                calls.push((kind, record));
                calls.len()
            };
            if self.fail_on.contains(&call) {
                return Err(StoreError::new("duplicate key value").with_code("23505"));
            }
            Ok(())
        }
    }

    fn rows(n: usize) -> Vec<ImportRow> {
        (1..=n)
            .map(|i| ImportRow {
                date: format!("2026-06-{i:02}"),
                race_type: "Cestna".into(),
                name: format!("Race {i}"),
                link: String::new(),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_going() {
        let store = MockStore {
            fail_on: vec![3],
            ..Default::default()
        };
        let driver = BatchUploadDriver::new();
        let mut progress = Vec::new();

        let outcome = driver
            .upload(&rows(5), &store, |done, total| progress.push((done, total)))
            .await
            .unwrap();

        assert_eq!(outcome.success_count, 4);
        assert_eq!(
            outcome.failures,
            vec![UploadFailure {
                row_name: "Race 3".into(),
                message: "duplicate key value".into(),
                code: Some("23505".into()),
            }]
        );
        assert_eq!(outcome.attempted(), 5);
        assert_eq!(store.calls.borrow().len(), 5);
        assert_eq!(progress, vec![(1, 5), (2, 5), (3, 5), (4, 5), (5, 5)]);
        assert!(!driver.is_running());
    }

    #[tokio::test]
    async fn test_rows_submitted_in_order_to_races() {
        let store = MockStore::default();
        BatchUploadDriver::new()
            .upload(&rows(3), &store, |_, _| {})
            .await
            .unwrap();

        let calls = store.calls.borrow();
        assert!(calls.iter().all(|(kind, _)| *kind == RecordKind::Races));
        let names: Vec<&str> = calls.iter().map(|(_, r)| r["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["Race 1", "Race 2", "Race 3"]);
        assert_eq!(calls[0].1["race_date"], "2026-06-01");
        assert_eq!(calls[0].1["link"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_empty_batch_is_a_no_op() {
        let store = MockStore::default();
        let mut progress_calls = 0;
        let outcome = BatchUploadDriver::new()
            .upload(&[], &store, |_, _| progress_calls += 1)
            .await
            .unwrap();

        assert_eq!(outcome, UploadOutcome::default());
        assert!(store.calls.borrow().is_empty());
        assert_eq!(progress_calls, 0);
    }

    #[tokio::test]
    async fn test_second_batch_rejected_while_running() {
        let store = MockStore::default();
        let driver = BatchUploadDriver::new();
        let batch = rows(2);

        let (first, second) = tokio::join!(
            driver.upload(&batch, &store, |_, _| {}),
            driver.upload(&batch, &store, |_, _| {}),
        );

        assert_eq!(first.unwrap().success_count, 2);
        assert_eq!(second, Err(UploadError::AlreadyRunning));
        assert_eq!(store.calls.borrow().len(), 2);

        let again = driver.upload(&batch, &store, |_, _| {}).await.unwrap();
        assert_eq!(again.success_count, 2);
    }

    #[tokio::test]
    async fn test_all_rows_failing() {
        let store = MockStore {
            fail_on: vec![1, 2],
            ..Default::default()
        };
        let outcome = BatchUploadDriver::new()
            .upload(&rows(2), &store, |_, _| {})
            .await
            .unwrap();
        assert_eq!(outcome.success_count, 0);
        assert_eq!(outcome.failures.len(), 2);
    }
}
