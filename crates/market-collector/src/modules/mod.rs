//! 파이프라인 단계 모듈.
//!
//! 일봉 수집 → 주기봉 생성 → 배치 적재 순서로 실행됩니다.

pub mod bar_upload;
pub mod daily_fetch;
pub mod period_build;

pub use bar_upload::{analyze_table, init_schema, upload_bars, upload_rows};
pub use daily_fetch::{collect_daily, fetch_all, FetchOutcome};
pub use period_build::{build_rows, rows_for_series};
