//! 일봉 병렬 수집 모듈.
//!
//! 종목마다 하나의 수집 작업을 만들고 Semaphore로 동시 실행 수를 제한합니다.
//! 실패한 종목은 집계만 하고 결과에서 제외하며 나머지 작업은 계속 진행됩니다.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use market_core::{DailySeries, Progress};
use market_data::{DailyBarFetcher, TushareClient};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::split_list;
use crate::{CollectionStats, CollectorConfig, Result};

/// 일봉 수집 결과
#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// 성공한 종목의 일봉 시계열 (완료 순서)
    pub series: Vec<DailySeries>,
    /// 성공 종목 수
    pub succeeded: usize,
    /// 실패 종목 수
    pub failed: usize,
}

impl FetchOutcome {
    /// 수집된 전체 일봉 수
    pub fn total_bars(&self) -> usize {
        self.series.iter().map(DailySeries::len).sum()
    }
}

/// 입력 순서를 유지하며 중복 종목 코드를 제거합니다.
pub fn unique_instruments(instruments: &[String]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(instruments.len());
    instruments
        .iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

/// 종목 목록의 일봉을 병렬로 수집합니다.
///
/// - 같은 종목은 한 번만 조회 (성공+실패 수 = 고유 종목 수)
/// - 최대 `concurrency`개 종목을 동시에 조회
/// - 각 조회 직전에 `request_delay`만큼 대기
/// - 조회 실패와 빈 결과는 실패로 집계
/// - `progress`는 종목 하나가 끝날 때마다 1씩 증가
pub async fn fetch_all(
    fetcher: Arc<dyn DailyBarFetcher>,
    instruments: &[String],
    start: NaiveDate,
    end: NaiveDate,
    concurrency: usize,
    request_delay: Duration,
    progress: Arc<Progress>,
) -> FetchOutcome {
    let mut outcome = FetchOutcome::default();
    let instruments = unique_instruments(instruments);
    if instruments.is_empty() {
        return outcome;
    }

    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for instrument_id in instruments {
        let fetcher = Arc::clone(&fetcher);
        let semaphore = Arc::clone(&semaphore);
        let progress = Arc::clone(&progress);

        tasks.spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                progress.record_failure(1);
                return None;
            };

            if !request_delay.is_zero() {
                tokio::time::sleep(request_delay).await;
            }

            match fetcher.fetch_daily(&instrument_id, start, end).await {
                Ok(bars) if !bars.is_empty() => {
                    let series = DailySeries::from_unsorted(instrument_id.as_str(), bars);
                    tracing::debug!(instrument_id = %instrument_id, bars = series.len(), "수집 완료");
                    progress.record_success(1);
                    Some(series)
                }
                Ok(_) => {
                    tracing::warn!(instrument_id = %instrument_id, "데이터 없음");
                    progress.record_failure(1);
                    None
                }
                Err(e) => {
                    tracing::warn!(instrument_id = %instrument_id, error = %e, "조회 실패");
                    progress.record_failure(1);
                    None
                }
            }
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Some(series)) => {
                outcome.succeeded += 1;
                outcome.series.push(series);
            }
            Ok(None) => outcome.failed += 1,
            Err(e) => {
                tracing::error!(error = %e, "수집 작업 패닉");
                progress.record_failure(1);
                outcome.failed += 1;
            }
        }
    }

    outcome
}

/// 설정에 따라 대상 종목을 결정하고 일봉을 수집합니다.
///
/// `symbols`가 없으면 Tushare 상장 종목 목록에서 제외 접두어를 걸러 사용합니다.
pub async fn collect_daily(
    config: &CollectorConfig,
    symbols: Option<String>,
) -> Result<(FetchOutcome, CollectionStats)> {
    let start = Instant::now();
    let mut stats = CollectionStats::new();

    let client = TushareClient::new(config.tushare_token()?)?
        .with_api_url(config.tushare.api_url.clone());

    let instruments = match symbols {
        Some(ref s) => {
            let syms = split_list(s);
            tracing::info!(count = syms.len(), "지정 종목 수집");
            syms
        }
        None => {
            let syms = client.list_instruments(&config.fetch.exclude_prefixes).await?;
            tracing::info!(count = syms.len(), "상장 종목 조회 완료");
            syms
        }
    };
    let instruments = unique_instruments(&instruments);

    stats.total = instruments.len();
    if instruments.is_empty() {
        tracing::warn!("수집할 종목이 없습니다");
        stats.elapsed = start.elapsed();
        return Ok((FetchOutcome::default(), stats));
    }

    tracing::info!(
        instruments = instruments.len(),
        start_date = %config.fetch.start_date,
        end_date = %config.fetch.end_date,
        concurrency = config.fetch.concurrency,
        "일봉 수집 시작"
    );

    let progress = Arc::new(Progress::new("일봉 수집", instruments.len() as u64));
    let outcome = fetch_all(
        Arc::new(client),
        &instruments,
        config.fetch.start_date,
        config.fetch.end_date,
        config.fetch.concurrency,
        config.fetch.request_delay(),
        Arc::clone(&progress),
    )
    .await;
    progress.finish();

    stats.success = outcome.succeeded;
    stats.errors = outcome.failed;
    stats.rows = outcome.total_bars();
    stats.elapsed = start.elapsed();
    Ok((outcome, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use market_core::Bar;
    use market_data::DataError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// 종목 코드에 따라 성공/실패/빈 결과를 돌려주는 수집기
    #[derive(Default)]
    struct StubFetcher {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        started_at: Mutex<Vec<tokio::time::Instant>>,
    }

    #[async_trait]
    impl DailyBarFetcher for StubFetcher {
        async fn fetch_daily(
            &self,
            instrument_id: &str,
            start: NaiveDate,
            _end: NaiveDate,
        ) -> market_data::Result<Vec<Bar>> {
            self.started_at.lock().unwrap().push(tokio::time::Instant::now());
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            match instrument_id {
                id if id.starts_with("ERR") => Err(DataError::FetchError("boom".to_string())),
                id if id.starts_with("EMPTY") => Ok(Vec::new()),
                id => {
                    let next = start.succ_opt().unwrap();
                    Ok(vec![
                        Bar::daily(id, next, 2.0, 2.0, 2.0, 2.0, 1.0, 1.0),
                        Bar::daily(id, start, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0),
                        Bar::daily(id, start, 9.0, 9.0, 9.0, 9.0, 1.0, 1.0),
                    ])
                }
            }
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
    }

    async fn run(fetcher: Arc<StubFetcher>, ids: &[&str], concurrency: usize) -> (FetchOutcome, Arc<Progress>) {
        let ids: Vec<String> = ids.iter().map(|s| s.to_string()).collect();
        let progress = Arc::new(Progress::hidden("test", ids.len() as u64));
        let outcome = fetch_all(
            fetcher,
            &ids,
            day(),
            day(),
            concurrency,
            Duration::ZERO,
            Arc::clone(&progress),
        )
        .await;
        (outcome, progress)
    }

    #[tokio::test]
    async fn test_failures_are_counted_and_dropped() {
        let (outcome, progress) = run(
            Arc::new(StubFetcher::default()),
            &["000001.SZ", "ERR1", "600000.SH", "EMPTY1"],
            2,
        )
        .await;

        assert_eq!(outcome.succeeded, 2);
        assert_eq!(outcome.failed, 2);
        assert_eq!(outcome.series.len(), 2);

        let snap = progress.snapshot();
        assert_eq!(snap.completed, 4);
        assert_eq!(snap.succeeded, 2);
        assert_eq!(snap.failed, 2);
    }

    #[tokio::test]
    async fn test_series_are_sorted_and_deduplicated() {
        let (outcome, _) = run(Arc::new(StubFetcher::default()), &["000001.SZ"], 1).await;

        let series = &outcome.series[0];
        assert_eq!(series.instrument_id, "000001.SZ");
        assert_eq!(series.len(), 2);
        assert_eq!(series.bars[0].trade_date, day());
        assert_eq!(series.bars[0].close, 1.0);
        assert_eq!(outcome.total_bars(), 2);
    }

    #[tokio::test]
    async fn test_empty_and_single_inputs() {
        let (outcome, progress) = run(Arc::new(StubFetcher::default()), &[], 5).await;
        assert_eq!(outcome.succeeded + outcome.failed, 0);
        assert_eq!(progress.snapshot().percent(), 100.0);

        let (outcome, _) = run(Arc::new(StubFetcher::default()), &["ERR"], 5).await;
        assert_eq!(outcome.failed, 1);
        assert!(outcome.series.is_empty());
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let fetcher = Arc::new(StubFetcher::default());
        let ids: Vec<String> = (0..30).map(|i| format!("{:06}.SZ", i)).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();

        let (outcome, _) = run(Arc::clone(&fetcher), &refs, 3).await;

        assert_eq!(outcome.succeeded, 30);
        assert!(fetcher.max_in_flight.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_duplicate_instruments_are_fetched_once() {
        let fetcher = Arc::new(StubFetcher::default());
        let (outcome, _) = run(
            Arc::clone(&fetcher),
            &["000001.SZ", "600000.SH", "000001.SZ", "ERR1", "ERR1"],
            4,
        )
        .await;

        assert_eq!(outcome.succeeded, 2);
        assert_eq!(outcome.failed, 1);
        assert_eq!(fetcher.started_at.lock().unwrap().len(), 3);

        let mut ids: Vec<&str> = outcome.series.iter().map(|s| s.instrument_id.as_str()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["000001.SZ", "600000.SH"]);

        assert_eq!(
            unique_instruments(&["B".to_string(), "A".to_string(), "B".to_string()]),
            vec!["B", "A"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_delay_paces_each_fetch() {
        let fetcher = Arc::new(StubFetcher::default());
        let ids: Vec<String> = (0..6).map(|i| format!("{:06}.SZ", i)).collect();
        let delay = Duration::from_millis(400);

        let began = tokio::time::Instant::now();
        let outcome = fetch_all(
            Arc::clone(&fetcher) as Arc<dyn DailyBarFetcher>,
            &ids,
            day(),
            day(),
            3,
            delay,
            Arc::new(Progress::hidden("test", 6)),
        )
        .await;
        let elapsed = began.elapsed();

        assert_eq!(outcome.succeeded, 6);

        // 어떤 조회도 대기 시간 전에 시작하지 않음
        let starts = fetcher.started_at.lock().unwrap().clone();
        assert_eq!(starts.len(), 6);
        assert!(starts.iter().all(|&t| t - began >= delay));

        // 동시 3개씩 두 묶음: 묶음마다 대기 400ms + 조회 5ms
        let early = starts.iter().filter(|&&t| t - began < delay * 2).count();
        assert_eq!(early, 3);
        assert!(elapsed >= delay * 2, "elapsed {:?}", elapsed);
        assert!(elapsed < delay * 2 + Duration::from_millis(100), "elapsed {:?}", elapsed);
    }
}
