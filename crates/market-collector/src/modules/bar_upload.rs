//! 봉 데이터 적재 모듈.

use std::sync::Arc;

use market_core::{Bar, Progress};
use market_data::{batch_count, partition, BarStore, LoadReport, PgBarStore, UpsertLoader};

use crate::{CollectionStats, CollectorConfig, Result};

/// 행 집합을 배치로 나누어 저장소에 적재합니다.
pub async fn upload_rows(
    store: Arc<dyn BarStore>,
    rows: Vec<Bar>,
    batch_size: usize,
    concurrency: usize,
    analyze: bool,
    progress: Arc<Progress>,
) -> Result<(LoadReport, CollectionStats)> {
    let batches = partition(rows, batch_size)?;

    let report = UpsertLoader::new(store, concurrency)
        .with_analyze(analyze)
        .load(batches, progress)
        .await?;

    let stats = CollectionStats {
        total: report.batches_total,
        success: report.batches_succeeded,
        errors: report.batches_failed,
        rows: report.rows_loaded as usize,
        elapsed: report.elapsed,
    };
    Ok((report, stats))
}

/// 설정의 PostgreSQL 저장소로 행 집합을 적재합니다.
pub async fn upload_bars(
    config: &CollectorConfig,
    rows: Vec<Bar>,
) -> Result<(LoadReport, CollectionStats)> {
    let store = PgBarStore::new(&config.store_config())?;

    tracing::info!(
        table = store.table(),
        rows = rows.len(),
        batches = batch_count(rows.len(), config.load.batch_size),
        batch_size = config.load.batch_size,
        "적재 시작"
    );

    let progress = Arc::new(Progress::new("적재", rows.len() as u64));
    let result = upload_rows(
        Arc::new(store),
        rows,
        config.load.batch_size,
        config.load.concurrency,
        config.load.analyze,
        Arc::clone(&progress),
    )
    .await;
    progress.finish();

    let (report, stats) = result?;
    tracing::info!(
        "{}행 중 {}행 적재",
        report.rows_total,
        report.rows_loaded
    );
    report.log_summary();
    Ok((report, stats))
}

/// 대상 테이블을 생성합니다 (이미 있으면 무시).
pub async fn init_schema(config: &CollectorConfig) -> Result<()> {
    let store = PgBarStore::new(&config.store_config())?;
    store.ensure_schema().await?;
    Ok(())
}

/// 대상 테이블 통계를 갱신합니다.
pub async fn analyze_table(config: &CollectorConfig) -> Result<()> {
    let store = PgBarStore::new(&config.store_config())?;
    store.analyze().await?;
    Ok(())
}
