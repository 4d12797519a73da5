//! 가격 반올림 및 등락 계산 유틸리티.
//!
//! 저장 컬럼은 부동소수점이지만 반올림은 `Decimal`로 수행하여
//! 이진 표현 오차로 소수점 둘째 자리가 흔들리지 않도록 합니다.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

/// 등락/등락률 소수점 자릿수.
pub const CHANGE_DP: u32 = 2;

/// 지정된 소수점 자릿수로 반올림합니다 (은행가 반올림).
///
/// NaN/무한대는 그대로 반환합니다.
pub fn round_dp(value: f64, dp: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(dp, RoundingStrategy::MidpointNearestEven))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

/// 전일(전기간) 종가 대비 등락과 등락률(%)을 계산합니다.
///
/// `pre_close`가 0이면 등락률은 정확히 0입니다.
pub fn price_change(close: f64, pre_close: f64) -> (f64, f64) {
    let change = round_dp(close - pre_close, CHANGE_DP);
    let pct_chg = if pre_close != 0.0 {
        round_dp((close - pre_close) / pre_close * 100.0, CHANGE_DP)
    } else {
        0.0
    };
    (change, pct_chg)
}
