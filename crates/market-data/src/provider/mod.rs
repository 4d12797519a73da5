//! 데이터 Provider 모듈.
//!
//! 외부 시세 제공자에서 일봉을 가져오는 경계를 정의합니다.
//!
//! ## Tushare Pro
//! - `TushareClient`: Tushare Pro HTTP API 클라이언트 (토큰 필요)
//! - `daily`: 종목별 일봉 (YYYYMMDD 날짜 범위)
//! - `stock_basic`: 상장 종목 목록

pub mod tushare;

use async_trait::async_trait;
use chrono::NaiveDate;
use market_core::Bar;

use crate::error::Result;

pub use tushare::TushareClient;

/// 종목별 일봉 조회 기능.
///
/// 구현체는 요청 한도와 자체 재시도를 책임집니다. 호출자는 결과를 날짜순으로
/// 정렬/중복 제거한 뒤 사용합니다.
#[async_trait]
pub trait DailyBarFetcher: Send + Sync {
    /// `start`~`end` (양 끝 포함) 구간의 일봉을 조회합니다.
    async fn fetch_daily(
        &self,
        instrument_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>>;
}
