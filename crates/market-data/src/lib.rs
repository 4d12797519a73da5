//! 시세 데이터 수집, 주기 리샘플링, 저장.
//!
//! 이 crate는 다음을 제공합니다:
//! - 일봉 조회 trait 및 Tushare Pro 구현
//! - 일봉 → 주/월/분기/연봉 리샘플러
//! - 적재용 고정 크기 배치 분할
//! - PostgreSQL 배치 upsert 저장소와 병렬 적재기
//! - 일시적 연결 실패에 대한 지수 백오프 재시도

pub mod batch;
pub mod error;
pub mod provider;
pub mod resample;
pub mod storage;

pub use error::{DataError, Result};

pub use batch::{batch_count, partition, LoadBatch};
pub use provider::{DailyBarFetcher, TushareClient};
pub use resample::{resample, resample_all_cycles};
pub use storage::{
    BarStore, LoadReport, PgBarStore, RetryPolicy, StoreConfig, UpsertLoader,
};
