//! 단계별 진행률 표시.
//!
//! 여러 워커가 동시에 완료를 기록하는 (completed, total) 카운터 쌍과
//! 한 줄로 덮어쓰는 터미널 진행률 표시줄을 제공합니다.
//!
//! 카운터는 원자적으로만 증가하므로 완료 순서와 무관하게 감소하거나
//! 누락/중복 집계되지 않습니다.

use std::sync::atomic::{AtomicU64, Ordering};

use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str = "{msg} {percent:>3}% ({pos}/{len}) [{elapsed_precise}]";

/// 진행률 카운터의 특정 시점 값.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    /// 완료 단위 수
    pub completed: u64,
    /// 전체 단위 수
    pub total: u64,
    /// 성공 건수
    pub succeeded: u64,
    /// 실패 건수
    pub failed: u64,
}

impl ProgressSnapshot {
    /// 완료율 (%). 전체가 0이면 100.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.completed as f64 / self.total as f64 * 100.0
        }
    }
}

/// 워커 간 공유되는 진행률 카운터.
///
/// `Arc<Progress>`로 감싸 각 워커에 전달합니다.
pub struct Progress {
    label: String,
    total: u64,
    completed: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    bar: ProgressBar,
}

impl Progress {
    /// stderr에 진행률 표시줄을 그리는 카운터를 생성합니다.
    pub fn new(label: impl Into<String>, total: u64) -> Self {
        Self::with_bar(label, total, ProgressBar::new(total))
    }

    /// 화면 출력 없이 카운트만 하는 카운터를 생성합니다.
    pub fn hidden(label: impl Into<String>, total: u64) -> Self {
        Self::with_bar(label, total, ProgressBar::hidden())
    }

    fn with_bar(label: impl Into<String>, total: u64, bar: ProgressBar) -> Self {
        let label = label.into();
        bar.set_length(total);
        bar.set_style(
            ProgressStyle::with_template(TEMPLATE).unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.set_message(label.clone());
        Self {
            label,
            total,
            completed: AtomicU64::new(0),
            succeeded: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            bar,
        }
    }

    /// 성공한 작업 단위를 기록합니다. `units`만큼 완료 수가 증가합니다.
    pub fn record_success(&self, units: u64) -> ProgressSnapshot {
        self.succeeded.fetch_add(1, Ordering::SeqCst);
        self.advance(units)
    }

    /// 실패한 작업 단위를 기록합니다.
    ///
    /// 행 단위 진행률에서는 실패한 배치가 0행으로 기록될 수 있습니다.
    pub fn record_failure(&self, units: u64) -> ProgressSnapshot {
        self.failed.fetch_add(1, Ordering::SeqCst);
        self.advance(units)
    }

    fn advance(&self, units: u64) -> ProgressSnapshot {
        let completed = self.completed.fetch_add(units, Ordering::SeqCst) + units;
        self.bar.inc(units);

        let snapshot = ProgressSnapshot {
            completed,
            total: self.total,
            succeeded: self.succeeded.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
        };
        self.bar.set_message(format!(
            "{} 성공: {} 실패: {}",
            self.label, snapshot.succeeded, snapshot.failed
        ));
        snapshot
    }

    /// 현재 카운터 값.
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            completed: self.completed.load(Ordering::SeqCst),
            total: self.total,
            succeeded: self.succeeded.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
        }
    }

    /// 표시줄을 마지막 값으로 고정하고 줄을 바꿉니다.
    pub fn finish(&self) -> ProgressSnapshot {
        self.bar.finish();
        self.snapshot()
    }
}
