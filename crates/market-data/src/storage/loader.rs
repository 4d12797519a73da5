//! 배치 병렬 적재.
//!
//! 스키마 확인 후 배치를 최대 `concurrency`개까지 동시에 `BarStore`로 보냅니다.
//! 배치 하나의 실패는 전체 실행을 중단시키지 않으며 0행 적재로 집계됩니다.

use std::sync::Arc;
use std::time::{Duration, Instant};

use market_core::Progress;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use super::BarStore;
use crate::batch::LoadBatch;
use crate::error::Result;

/// 적재 결과 요약.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    /// 전체 배치 수
    pub batches_total: usize,
    /// 성공 배치 수
    pub batches_succeeded: usize,
    /// 실패 배치 수
    pub batches_failed: usize,
    /// 전체 행 수
    pub rows_total: u64,
    /// 실제 적재된 행 수
    pub rows_loaded: u64,
    /// 통계 갱신 성공 여부
    pub analyzed: bool,
    /// 소요 시간
    pub elapsed: Duration,
}

impl LoadReport {
    /// 적재되지 못한 행 수.
    pub fn rows_failed(&self) -> u64 {
        self.rows_total.saturating_sub(self.rows_loaded)
    }

    /// 결과 요약 로그를 출력합니다.
    pub fn log_summary(&self) {
        info!(
            batches = self.batches_total,
            succeeded = self.batches_succeeded,
            failed = self.batches_failed,
            rows_total = self.rows_total,
            rows_loaded = self.rows_loaded,
            analyzed = self.analyzed,
            elapsed_secs = self.elapsed.as_secs_f64(),
            "적재 완료"
        );
    }
}

/// 배치 병렬 적재기.
pub struct UpsertLoader {
    store: Arc<dyn BarStore>,
    concurrency: usize,
    analyze: bool,
}

impl UpsertLoader {
    /// 새 적재기를 생성합니다. 동시성은 최소 1입니다.
    pub fn new(store: Arc<dyn BarStore>, concurrency: usize) -> Self {
        Self {
            store,
            concurrency: concurrency.max(1),
            analyze: true,
        }
    }

    /// 적재 후 통계 갱신(ANALYZE) 여부를 설정합니다.
    pub fn with_analyze(mut self, analyze: bool) -> Self {
        self.analyze = analyze;
        self
    }

    /// 배치를 병렬로 적재합니다.
    ///
    /// 스키마 확인에 실패하면 배치를 하나도 보내지 않고 오류를 반환합니다.
    /// `progress`는 행 단위로 증가하며 실패한 배치는 0행으로 기록됩니다.
    pub async fn load(&self, batches: Vec<LoadBatch>, progress: Arc<Progress>) -> Result<LoadReport> {
        let start = Instant::now();
        let mut report = LoadReport {
            batches_total: batches.len(),
            rows_total: batches.iter().map(|b| b.len() as u64).sum(),
            ..Default::default()
        };

        self.store.ensure_schema().await?;

        if batches.is_empty() {
            info!("적재할 배치가 없습니다");
            report.elapsed = start.elapsed();
            return Ok(report);
        }

        let workers = self.concurrency.min(batches.len()).max(1);
        info!(
            batches = report.batches_total,
            rows = report.rows_total,
            workers,
            "배치 적재 시작"
        );

        let semaphore = Arc::new(Semaphore::new(workers));
        let mut tasks = JoinSet::new();

        for batch in batches {
            let store = Arc::clone(&self.store);
            let semaphore = Arc::clone(&semaphore);
            let progress = Arc::clone(&progress);

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok()?;
                match store.upsert_batch(&batch).await {
                    Ok(rows) => {
                        progress.record_success(rows);
                        Some(rows)
                    }
                    Err(e) => {
                        warn!(batch = batch.id, rows = batch.len(), error = %e, "배치 적재 실패");
                        progress.record_failure(0);
                        None
                    }
                }
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(rows)) => {
                    report.batches_succeeded += 1;
                    report.rows_loaded += rows;
                }
                Ok(None) => report.batches_failed += 1,
                Err(e) => {
                    error!(error = %e, "적재 작업 패닉");
                    report.batches_failed += 1;
                }
            }
        }

        if self.analyze && report.rows_loaded > 0 {
            match self.store.analyze().await {
                Ok(()) => report.analyzed = true,
                Err(e) => warn!(error = %e, "통계 갱신 실패"),
            }
        }

        report.elapsed = start.elapsed();
        Ok(report)
    }
}
