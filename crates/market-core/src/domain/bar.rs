//! 봉(OHLCV) 데이터 타입.
//!
//! - `Bar` - 한 종목의 한 기간(일/주/월/분기/연) 거래 요약
//! - `DailySeries` - 한 종목의 날짜 오름차순 일봉 시계열
//!
//! 값이 비어 있는 필드는 `f64::NAN`으로 표현합니다.
//! 저장 시 NaN은 NULL로 기록됩니다.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{price_change, Cycle};

/// 저장 테이블의 컬럼 순서.
pub const BAR_COLUMNS: [&str; 12] = [
    "instrument_id",
    "trade_date",
    "cycle",
    "open",
    "high",
    "low",
    "close",
    "pre_close",
    "change",
    "pct_chg",
    "volume",
    "amount",
];

/// 고유 키 컬럼 (instrument_id, trade_date, cycle).
pub const BAR_KEY_COLUMNS: [&str; 3] = ["instrument_id", "trade_date", "cycle"];

/// 한 종목의 한 기간 OHLCV 봉.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// 종목 코드 (예: "000001.SZ")
    pub instrument_id: String,
    /// 기간 종료일
    pub trade_date: NaiveDate,
    /// 집계 주기
    pub cycle: Cycle,
    /// 시가
    pub open: f64,
    /// 고가
    pub high: f64,
    /// 저가
    pub low: f64,
    /// 종가
    pub close: f64,
    /// 전기간 종가
    pub pre_close: f64,
    /// 등락
    pub change: f64,
    /// 등락률 (%)
    pub pct_chg: f64,
    /// 거래량
    pub volume: f64,
    /// 거래대금
    pub amount: f64,
}

impl Bar {
    /// 새 일봉을 생성합니다. 전일 종가와 등락은 0으로 초기화됩니다.
    #[allow(clippy::too_many_arguments)]
    pub fn daily(
        instrument_id: impl Into<String>,
        trade_date: NaiveDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
        amount: f64,
    ) -> Self {
        Self {
            instrument_id: instrument_id.into(),
            trade_date,
            cycle: Cycle::Daily,
            open,
            high,
            low,
            close,
            pre_close: 0.0,
            change: 0.0,
            pct_chg: 0.0,
            volume,
            amount,
        }
    }

    /// 전기간 종가를 설정하고 등락/등락률을 다시 계산합니다.
    pub fn with_pre_close(mut self, pre_close: f64) -> Self {
        let (change, pct_chg) = price_change(self.close, pre_close);
        self.pre_close = pre_close;
        self.change = change;
        self.pct_chg = pct_chg;
        self
    }

    /// (instrument_id, trade_date, cycle) 고유 키.
    pub fn key(&self) -> (&str, NaiveDate, Cycle) {
        (&self.instrument_id, self.trade_date, self.cycle)
    }

    /// 고가 ≥ max(시가, 종가) ≥ min(시가, 종가) ≥ 저가 인지 확인합니다.
    pub fn is_well_formed(&self) -> bool {
        self.high >= self.open.max(self.close)
            && self.open.min(self.close) >= self.low
    }
}

/// 한 종목의 일봉 시계열 (날짜 오름차순, 날짜 중복 없음).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySeries {
    /// 종목 코드
    pub instrument_id: String,
    /// 일봉 목록
    pub bars: Vec<Bar>,
}

impl DailySeries {
    /// 임의 순서의 일봉으로 시계열을 만듭니다.
    ///
    /// 날짜 오름차순으로 정렬하고 같은 날짜가 여러 번 있으면 첫 번째만 남깁니다.
    /// 모든 일봉의 종목 코드는 `instrument_id`로 맞춥니다.
    pub fn from_unsorted(instrument_id: impl Into<String>, mut bars: Vec<Bar>) -> Self {
        let instrument_id = instrument_id.into();
        bars.sort_by_key(|b| b.trade_date);
        bars.dedup_by_key(|b| b.trade_date);
        for bar in bars.iter_mut().filter(|b| b.instrument_id != instrument_id) {
            bar.instrument_id.clone_from(&instrument_id);
        }
        Self { instrument_id, bars }
    }

    /// 일봉 개수.
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// 일봉이 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_with_pre_close() {
        let bar = Bar::daily("000001.SZ", date(2), 10.0, 11.0, 9.0, 9.0, 100.0, 900.0)
            .with_pre_close(11.0);
        assert_eq!(bar.change, -2.0);
        assert_eq!(bar.pct_chg, -18.18);

        let first = Bar::daily("000001.SZ", date(2), 10.0, 11.0, 9.0, 11.0, 1.0, 1.0)
            .with_pre_close(0.0);
        assert_eq!(first.change, 11.0);
        assert_eq!(first.pct_chg, 0.0);
    }

    #[test]
    fn test_series_sorted_and_deduplicated() {
        let bars = vec![
            Bar::daily("A", date(4), 3.0, 3.0, 3.0, 3.0, 1.0, 1.0),
            Bar::daily("A", date(2), 1.0, 1.0, 1.0, 1.0, 1.0, 1.0),
            Bar::daily("A", date(3), 2.0, 2.0, 2.0, 2.0, 1.0, 1.0),
            Bar::daily("A", date(2), 9.0, 9.0, 9.0, 9.0, 1.0, 1.0),
        ];
        let series = DailySeries::from_unsorted("A", bars);
        let dates: Vec<_> = series.bars.iter().map(|b| b.trade_date).collect();
        assert_eq!(dates, vec![date(2), date(3), date(4)]);
        assert_eq!(series.len(), 3);
    }

    #[test]
    fn test_series_bars_share_series_id() {
        let bars = vec![
            Bar::daily("000001.sz", date(3), 1.0, 1.0, 1.0, 1.0, 1.0, 1.0),
            Bar::daily("000001.SZ", date(2), 1.0, 1.0, 1.0, 1.0, 1.0, 1.0),
        ];
        let series = DailySeries::from_unsorted("000001.SZ", bars);
        assert!(series.bars.iter().all(|b| b.instrument_id == "000001.SZ"));
    }

    #[test]
    fn test_well_formed() {
        let ok = Bar::daily("A", date(2), 10.0, 12.0, 9.0, 11.0, 1.0, 1.0);
        assert!(ok.is_well_formed());
        let bad = Bar::daily("A", date(2), 10.0, 10.5, 9.0, 11.0, 1.0, 1.0);
        assert!(!bad.is_well_formed());
    }
}
