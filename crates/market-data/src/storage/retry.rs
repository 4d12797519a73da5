//! 일시적 실패에 대한 지수 백오프 재시도.
//!
//! n번째 재시도 전 대기 시간 = `base_delay × 2^(n-1)` + `[0, max_jitter]` 범위의 임의 지연.
//! 여러 워커가 동시에 잠긴 DB에 재접속을 시도할 때 재시도 시점이 흩어지도록 합니다.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{info, warn};

/// 재시도 정책.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 최대 시도 횟수 (첫 시도 포함)
    pub max_attempts: u32,
    /// 첫 재시도 기본 대기 시간
    pub base_delay: Duration,
    /// 추가 임의 지연 상한
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(5),
            max_jitter: Duration::from_secs(3),
        }
    }
}

impl RetryPolicy {
    /// 재시도 없이 한 번만 시도하는 정책.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_jitter: Duration::ZERO,
        }
    }

    /// `failed_attempts`번 실패한 뒤의 기본 대기 시간 (jitter 제외).
    pub fn backoff(&self, failed_attempts: u32) -> Duration {
        let exponent = failed_attempts.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32 << exponent)
    }

    fn jitter(&self) -> Duration {
        let max_ms = self.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
    }

    /// `operation`을 실행하고, `is_transient`가 참인 오류는 정책에 따라 재시도합니다.
    ///
    /// 일시적이지 않은 오류는 즉시 반환합니다. 시도 횟수를 모두 쓰면 마지막 오류를 반환합니다.
    pub async fn run<T, E, F, Fut>(
        &self,
        name: &str,
        is_transient: impl Fn(&E) -> bool,
        mut operation: F,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        info!(operation = name, attempt, "재시도 후 성공");
                    }
                    return Ok(value);
                }
                Err(e) if is_transient(&e) && attempt < max_attempts => {
                    let delay = self.backoff(attempt) + self.jitter();
                    warn!(
                        operation = name,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "일시적 오류, 재시도 대기"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    if is_transient(&e) {
                        warn!(operation = name, attempts = attempt, error = %e, "최대 재시도 횟수 도달");
                    }
                    return Err(e);
                }
            }
        }
    }
}
