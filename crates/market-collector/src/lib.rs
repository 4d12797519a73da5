//! Daily-to-periodic stock bar collector.
//!
//! 이 crate는 다음 파이프라인을 실행하는 바이너리를 제공합니다:
//! - 종목별 일봉 병렬 수집 (Tushare Pro)
//! - 주/월/분기/연봉 생성
//! - PostgreSQL 배치 upsert 적재 및 통계 갱신

pub mod config;
pub mod error;
pub mod modules;
pub mod stats;

pub use config::CollectorConfig;
pub use error::{CollectorError, Result};
pub use stats::CollectionStats;
