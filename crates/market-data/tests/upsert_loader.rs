//! 병렬 적재기 테스트 (메모리 저장소)

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use market_core::{Bar, Cycle, Progress};
use market_data::{partition, BarStore, DataError, LoadBatch, Result, UpsertLoader};

type Key = (String, NaiveDate, Cycle);

/// 키 기준 병합을 흉내 내는 메모리 저장소.
#[derive(Default)]
struct MemoryStore {
    rows: Mutex<HashMap<Key, Bar>>,
    failing_batches: HashSet<usize>,
    schema_error: bool,
    analyze_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    schema_ready: AtomicBool,
}

impl MemoryStore {
    fn failing(batches: &[usize]) -> Self {
        Self {
            failing_batches: batches.iter().copied().collect(),
            ..Default::default()
        }
    }

    fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl BarStore for MemoryStore {
    async fn ensure_schema(&self) -> Result<()> {
        if self.schema_error {
            return Err(DataError::ConnectionError("connection refused".to_string()));
        }
        self.schema_ready.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn upsert_batch(&self, batch: &LoadBatch) -> Result<u64> {
        assert!(self.schema_ready.load(Ordering::SeqCst));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_batches.contains(&batch.id) {
            return Err(DataError::Busy("database is locked".to_string()));
        }

        let mut rows = self.rows.lock().unwrap();
        for bar in &batch.rows {
            let (id, date, cycle) = bar.key();
            rows.insert((id.to_string(), date, cycle), bar.clone());
        }
        Ok(batch.len() as u64)
    }

    async fn analyze(&self) -> Result<()> {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn bars(n: usize) -> Vec<Bar> {
    let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    (0..n)
        .map(|i| {
            Bar::daily(
                "000001.SZ",
                base + chrono::Duration::days(i as i64),
                10.0,
                11.0,
                9.0,
                10.5,
                100.0,
                1050.0,
            )
        })
        .collect()
}

#[tokio::test]
async fn test_reloading_same_rows_is_idempotent() {
    let store = Arc::new(MemoryStore::default());
    let loader = UpsertLoader::new(store.clone(), 4);

    for _ in 0..2 {
        let batches = partition(bars(3), 2).unwrap();
        let progress = Arc::new(Progress::hidden("적재", 3));
        let report = loader.load(batches, progress.clone()).await.unwrap();

        assert_eq!(report.rows_loaded, 3);
        assert_eq!(report.batches_succeeded, 2);
        assert_eq!(progress.snapshot().completed, 3);
    }

    assert_eq!(store.len(), 3);
    assert_eq!(store.analyze_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_failed_batch_counts_zero_and_run_continues() {
    let store = Arc::new(MemoryStore::failing(&[1]));
    let loader = UpsertLoader::new(store.clone(), 2);

    let batches = partition(bars(10), 4).unwrap();
    let progress = Arc::new(Progress::hidden("적재", 10));
    let report = loader.load(batches, progress.clone()).await.unwrap();

    assert_eq!(report.batches_total, 3);
    assert_eq!(report.batches_succeeded, 2);
    assert_eq!(report.batches_failed, 1);
    assert_eq!(report.rows_total, 10);
    assert_eq!(report.rows_loaded, 6);
    assert_eq!(report.rows_failed(), 4);
    assert!(report.analyzed);

    let snap = progress.snapshot();
    assert_eq!(snap.completed, 6);
    assert_eq!(snap.failed, 1);
    assert_eq!(store.len(), 6);
}

#[tokio::test]
async fn test_schema_error_aborts_before_any_batch() {
    let store = Arc::new(MemoryStore {
        schema_error: true,
        ..Default::default()
    });
    let loader = UpsertLoader::new(store.clone(), 4);

    let result = loader
        .load(partition(bars(5), 2).unwrap(), Arc::new(Progress::hidden("적재", 5)))
        .await;

    assert!(matches!(result, Err(DataError::ConnectionError(_))));
    assert_eq!(store.len(), 0);
}

#[tokio::test]
async fn test_concurrency_is_bounded() {
    let store = Arc::new(MemoryStore::default());
    let loader = UpsertLoader::new(store.clone(), 3).with_analyze(false);

    let report = loader
        .load(partition(bars(40), 2).unwrap(), Arc::new(Progress::hidden("적재", 40)))
        .await
        .unwrap();

    assert_eq!(report.rows_loaded, 40);
    assert!(!report.analyzed);
    assert!(store.max_in_flight.load(Ordering::SeqCst) <= 3);
    assert_eq!(store.analyze_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_empty_input_loads_nothing() {
    let store = Arc::new(MemoryStore::default());
    let loader = UpsertLoader::new(store.clone(), 4);

    let report = loader
        .load(Vec::new(), Arc::new(Progress::hidden("적재", 0)))
        .await
        .unwrap();

    assert_eq!(report.batches_total, 0);
    assert_eq!(report.rows_loaded, 0);
    assert!(store.schema_ready.load(Ordering::SeqCst));
}
