//! 수집 파이프라인의 도메인 모델.

mod bar;

pub use bar::*;
