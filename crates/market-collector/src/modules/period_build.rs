//! 주기봉 생성 모듈.
//!
//! 종목별 일봉 시계열에서 주/월/분기/연봉을 만들어 일봉과 함께 하나의 행 집합으로
//! 합칩니다. 리샘플링은 CPU 작업이므로 blocking 스레드에서 종목 단위로 실행합니다.

use std::sync::Arc;
use std::time::Instant;

use market_core::{Bar, DailySeries, Progress};
use market_data::resample_all_cycles;
use tokio::task::JoinSet;

use crate::{CollectionStats, Result};

/// 한 종목의 적재 대상 행: 일봉 원본 + 모든 주기봉
pub fn rows_for_series(series: DailySeries) -> Vec<Bar> {
    let periodic = resample_all_cycles(&series);
    let mut rows = series.bars;
    rows.reserve(periodic.len());
    rows.extend(periodic);
    rows
}

/// 모든 종목의 행 집합을 만듭니다. 종목 간 순서는 완료 순서입니다.
pub async fn build_rows(
    series: Vec<DailySeries>,
    progress: Arc<Progress>,
) -> Result<(Vec<Bar>, CollectionStats)> {
    let start = Instant::now();
    let mut stats = CollectionStats::new();
    stats.total = series.len();

    let mut tasks = JoinSet::new();
    for s in series {
        tasks.spawn_blocking(move || rows_for_series(s));
    }

    let mut rows = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let instrument_rows = joined?;
        stats.success += 1;
        progress.record_success(1);
        rows.extend(instrument_rows);
    }

    stats.rows = rows.len();
    stats.elapsed = start.elapsed();
    tracing::info!(instruments = stats.success, rows = rows.len(), "주기봉 생성 완료");
    Ok((rows, stats))
}
