//! 환경변수 기반 설정 모듈.

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use market_core::parse_compact_date;
use market_data::{RetryPolicy, StoreConfig};

use crate::error::CollectorError;
use crate::Result;

/// Collector 전체 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 데이터베이스 URL
    pub database_url: String,
    /// Tushare API 설정
    pub tushare: TushareConfig,
    /// 일봉 수집 설정
    pub fetch: FetchConfig,
    /// 적재 설정
    pub load: LoadConfig,
    /// DB 연결 설정
    pub connection: ConnectionConfig,
}

/// Tushare API 설정
#[derive(Debug, Clone)]
pub struct TushareConfig {
    /// API 토큰 (수집 시 필수)
    pub token: Option<String>,
    /// API 엔드포인트
    pub api_url: String,
}

/// 일봉 수집 설정
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// 동시 수집 종목 수
    pub concurrency: usize,
    /// 종목별 API 호출 전 대기 (밀리초)
    pub request_delay_ms: u64,
    /// 수집 시작일
    pub start_date: NaiveDate,
    /// 수집 종료일
    pub end_date: NaiveDate,
    /// 제외할 종목 코드 접두어
    pub exclude_prefixes: Vec<String>,
}

/// 적재 설정
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// 대상 테이블
    pub table: String,
    /// 배치당 행 수
    pub batch_size: usize,
    /// 동시 적재 배치 수
    pub concurrency: usize,
    /// 적재 후 ANALYZE 실행 여부
    pub analyze: bool,
}

/// DB 연결 설정
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// 연결 최대 시도 횟수
    pub max_attempts: u32,
    /// 재시도 기본 대기 (밀리초)
    pub base_delay_ms: u64,
    /// 재시도 추가 임의 대기 상한 (밀리초)
    pub max_jitter_ms: u64,
    /// 연결 타임아웃 (초)
    pub connect_timeout_secs: u64,
    /// statement_timeout (밀리초)
    pub statement_timeout_ms: u64,
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 키 조회 함수로 설정을 구성합니다.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env = Env(&lookup);

        let database_url = env.get("DATABASE_URL").ok_or_else(|| {
            CollectorError::Config("DATABASE_URL 환경변수가 설정되지 않았습니다".to_string())
        })?;

        let start_date = env.date("FETCH_START_DATE")?.unwrap_or_else(default_start_date);
        let end_date = env
            .date("FETCH_END_DATE")?
            .unwrap_or_else(|| Utc::now().date_naive());

        let config = Self {
            database_url,
            tushare: TushareConfig {
                token: env.get("TUSHARE_TOKEN"),
                api_url: env
                    .get("TUSHARE_API_URL")
                    .unwrap_or_else(|| market_data::provider::tushare::DEFAULT_API_URL.to_string()),
            },
            fetch: FetchConfig {
                concurrency: env.parse("FETCH_CONCURRENCY", 5),
                request_delay_ms: env.parse("FETCH_REQUEST_DELAY_MS", 400),
                start_date,
                end_date,
                exclude_prefixes: env
                    .get("INSTRUMENT_EXCLUDE_PREFIXES")
                    .map(|v| split_list(&v))
                    .unwrap_or_else(|| vec!["8".to_string(), "9".to_string()]),
            },
            load: LoadConfig {
                table: env.get("LOAD_TABLE").unwrap_or_else(|| "stock_data".to_string()),
                batch_size: env.parse("LOAD_BATCH_SIZE", 100_000),
                concurrency: env.parse("LOAD_CONCURRENCY", 4),
                analyze: env.bool("LOAD_ANALYZE", true),
            },
            connection: ConnectionConfig {
                max_attempts: env.parse("DB_CONNECT_MAX_ATTEMPTS", 5),
                base_delay_ms: env.parse("DB_CONNECT_BASE_DELAY_MS", 5_000),
                max_jitter_ms: env.parse("DB_CONNECT_MAX_JITTER_MS", 3_000),
                connect_timeout_secs: env.parse("DB_CONNECT_TIMEOUT_SECS", 10),
                statement_timeout_ms: env.parse("DB_STATEMENT_TIMEOUT_MS", 300_000),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// 값 범위 검증
    pub fn validate(&self) -> Result<()> {
        if self.fetch.concurrency == 0 {
            return Err(CollectorError::Config(
                "FETCH_CONCURRENCY는 1 이상이어야 합니다".to_string(),
            ));
        }
        if self.load.batch_size == 0 {
            return Err(CollectorError::Config(
                "LOAD_BATCH_SIZE는 1 이상이어야 합니다".to_string(),
            ));
        }
        if self.load.concurrency == 0 {
            return Err(CollectorError::Config(
                "LOAD_CONCURRENCY는 1 이상이어야 합니다".to_string(),
            ));
        }
        if self.fetch.start_date > self.fetch.end_date {
            return Err(CollectorError::Config(format!(
                "수집 시작일({})이 종료일({})보다 늦습니다",
                self.fetch.start_date, self.fetch.end_date
            )));
        }
        Ok(())
    }

    /// Tushare 토큰 (없으면 설정 에러)
    pub fn tushare_token(&self) -> Result<&str> {
        self.tushare.token.as_deref().ok_or_else(|| {
            CollectorError::Config("TUSHARE_TOKEN 환경변수가 설정되지 않았습니다".to_string())
        })
    }

    /// 저장소 설정으로 변환
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            database_url: self.database_url.clone(),
            table: self.load.table.clone(),
            connect_timeout: self.connection.connect_timeout(),
            statement_timeout: self.connection.statement_timeout(),
            retry: self.connection.retry_policy(),
        }
    }
}

impl FetchConfig {
    /// API 요청 전 딜레이를 Duration으로 반환
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

impl ConnectionConfig {
    /// 연결 재시도 정책
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_jitter: Duration::from_millis(self.max_jitter_ms),
        }
    }

    /// 연결 타임아웃을 Duration으로 반환
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// statement_timeout을 Duration으로 반환
    pub fn statement_timeout(&self) -> Duration {
        Duration::from_millis(self.statement_timeout_ms)
    }
}

/// 기본 수집 시작일 (2010-01-01)
fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2010, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// 쉼표로 구분된 목록 파싱 (빈 항목 제외)
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// 환경변수 조회 헬퍼
struct Env<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// 값을 파싱 (실패 시 기본값 사용)
    fn parse<T: std::str::FromStr>(&self, key: &str, default: T) -> T {
        self.get(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// bool 값 파싱
    fn bool(&self, key: &str, default: bool) -> bool {
        self.get(key)
            .map(|v| v == "true" || v == "1")
            .unwrap_or(default)
    }

    /// YYYYMMDD 날짜 파싱 (형식 오류는 설정 에러)
    fn date(&self, key: &str) -> Result<Option<NaiveDate>> {
        self.get(key)
            .map(|v| {
                parse_compact_date(&v)
                    .map_err(|e| CollectorError::Config(format!("{}: {}", key, e)))
            })
            .transpose()
    }
}
