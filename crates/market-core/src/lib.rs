//! # Market Core
//!
//! 시세 수집 파이프라인의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! - 봉(OHLCV) 데이터와 일봉 시계열
//! - 집계 주기와 기간 경계 규칙
//! - 등락/등락률 계산 및 반올림
//! - 로깅 인프라
//! - 워커 간 공유 진행률 카운터

pub mod domain;
pub mod error;
pub mod logging;
pub mod progress;
pub mod types;

pub use domain::*;
pub use error::*;
pub use logging::*;
pub use progress::{Progress, ProgressSnapshot};
pub use types::*;
