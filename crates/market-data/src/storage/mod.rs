//! 봉 데이터 저장소.
//!
//! - `BarStore`: 배치 단위 upsert 저장소 trait
//! - `PgBarStore`: PostgreSQL 구현 (COPY 스테이징 + ON CONFLICT 병합)
//! - `UpsertLoader`: 제한된 동시성으로 배치를 병렬 적재
//! - `RetryPolicy`: 연결 획득 재시도 정책

pub mod loader;
pub mod postgres;
pub mod retry;

use async_trait::async_trait;

use crate::batch::LoadBatch;
use crate::error::Result;

pub use loader::{LoadReport, UpsertLoader};
pub use postgres::{PgBarStore, StoreConfig};
pub use retry::RetryPolicy;

/// (instrument_id, trade_date, cycle) 키 기준으로 봉을 병합 저장하는 저장소.
///
/// 같은 배치를 여러 번 적재해도 결과가 같아야 합니다 (멱등).
#[async_trait]
pub trait BarStore: Send + Sync {
    /// 대상 테이블이 없으면 생성합니다. 이미 있으면 아무것도 하지 않습니다.
    async fn ensure_schema(&self) -> Result<()>;

    /// 배치 하나를 단일 트랜잭션으로 병합하고 적재한 행 수를 반환합니다.
    ///
    /// 실패하면 배치 전체가 롤백됩니다.
    async fn upsert_batch(&self, batch: &LoadBatch) -> Result<u64>;

    /// 적재가 끝난 테이블의 통계를 갱신합니다.
    async fn analyze(&self) -> Result<()>;
}
