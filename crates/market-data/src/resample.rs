//! 일봉 → 주기봉 리샘플링.
//!
//! 한 종목의 일봉 시계열을 주기별 달력 경계(금요일 마감 주, 월말, 분기말, 연말)로
//! 나누어 기간별 OHLCV를 집계합니다.
//!
//! # 집계 규칙
//!
//! - 시가: 기간 내 첫 시가, 종가: 기간 내 마지막 종가
//! - 고가/저가: 기간 내 최고/최저
//! - 거래량/거래대금: 기간 합계
//! - `trade_date`: 마지막 거래일이 아닌 기간의 달력상 종료일
//! - `pre_close`: 같은 시계열의 직전 기간 종가 (첫 기간은 0)
//!
//! 값이 빠진(NaN) 일봉 필드는 집계에서 제외되며, 집계 결과 중 하나라도 비어 있는
//! 기간은 결과에서 빠집니다. 일봉이 하나도 없는 기간은 만들어지지 않습니다.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use market_core::{Bar, Cycle, DailySeries};

/// 기간 하나의 집계 중간값.
#[derive(Debug, Default)]
struct PeriodAggregate {
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    volume: Option<f64>,
    amount: Option<f64>,
}

/// 집계 대상 값인지 확인 (NaN/무한대는 결측).
fn present(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

impl PeriodAggregate {
    fn push(&mut self, bar: &Bar) {
        if let Some(open) = present(bar.open) {
            self.open.get_or_insert(open);
        }
        if let Some(high) = present(bar.high) {
            self.high = Some(self.high.map_or(high, |h| h.max(high)));
        }
        if let Some(low) = present(bar.low) {
            self.low = Some(self.low.map_or(low, |l| l.min(low)));
        }
        if let Some(close) = present(bar.close) {
            self.close = Some(close);
        }
        if let Some(volume) = present(bar.volume) {
            self.volume = Some(self.volume.unwrap_or(0.0) + volume);
        }
        if let Some(amount) = present(bar.amount) {
            self.amount = Some(self.amount.unwrap_or(0.0) + amount);
        }
    }

    /// 모든 필드가 채워진 경우에만 (시가, 고가, 저가, 종가, 거래량, 거래대금)을 반환.
    fn complete(&self) -> Option<(f64, f64, f64, f64, f64, f64)> {
        Some((
            self.open?,
            self.high?,
            self.low?,
            self.close?,
            self.volume?,
            self.amount?,
        ))
    }
}

/// 한 종목의 일봉 시계열을 지정 주기로 리샘플링합니다.
///
/// 결과는 `trade_date` 오름차순입니다. `Cycle::Daily`는 입력 일봉을 그대로 반환합니다.
pub fn resample(series: &DailySeries, cycle: Cycle) -> Vec<Bar> {
    if cycle == Cycle::Daily {
        return series.bars.clone();
    }

    // 기간 종료일 기준 그룹핑, 기간 내에서는 입력 순서대로 집계
    let mut periods: BTreeMap<NaiveDate, PeriodAggregate> = BTreeMap::new();
    for bar in &series.bars {
        periods
            .entry(cycle.period_end(bar.trade_date))
            .or_default()
            .push(bar);
    }

    let mut pre_close = 0.0;
    let mut rows = Vec::with_capacity(periods.len());
    for (period_end, aggregate) in periods {
        let Some((open, high, low, close, volume, amount)) = aggregate.complete() else {
            continue;
        };

        let bar = Bar {
            instrument_id: series.instrument_id.clone(),
            trade_date: period_end,
            cycle,
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
        .with_pre_close(pre_close);

        pre_close = close;
        rows.push(bar);
    }

    rows
}

/// 주봉/월봉/분기봉/연봉을 모두 만들어 순서대로 이어 붙입니다.
pub fn resample_all_cycles(series: &DailySeries) -> Vec<Bar> {
    Cycle::PERIODIC
        .iter()
        .flat_map(|&cycle| resample(series, cycle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn flat(d: NaiveDate, price: f64) -> Bar {
        Bar::daily("000001.SZ", d, price, price, price, price, 100.0, price * 100.0)
    }

    fn series(bars: Vec<Bar>) -> DailySeries {
        DailySeries::from_unsorted("000001.SZ", bars)
    }

    #[test]
    fn test_single_week_aggregate() {
        // 2024-01-02(화) ~ 2024-01-04(목)
        let s = series(vec![
            flat(date(2024, 1, 2), 10.0),
            flat(date(2024, 1, 3), 10.5),
            flat(date(2024, 1, 4), 11.0),
        ]);

        let weekly = resample(&s, Cycle::Weekly);
        assert_eq!(weekly.len(), 1);

        let w = &weekly[0];
        assert_eq!(w.trade_date, date(2024, 1, 5));
        assert_eq!(w.cycle, Cycle::Weekly);
        assert_eq!(w.instrument_id, "000001.SZ");
        assert_eq!(w.open, 10.0);
        assert_eq!(w.close, 11.0);
        assert_eq!(w.high, 11.0);
        assert_eq!(w.low, 10.0);
        assert_eq!(w.pre_close, 0.0);
        assert_eq!(w.change, 11.0);
        assert_eq!(w.pct_chg, 0.0);
        assert_eq!(w.volume, 300.0);
        assert_eq!(w.amount, 3150.0);
    }

    #[test]
    fn test_second_week_uses_previous_close() {
        let s = series(vec![
            flat(date(2024, 1, 2), 10.0),
            flat(date(2024, 1, 3), 10.5),
            flat(date(2024, 1, 4), 11.0),
            flat(date(2024, 1, 9), 9.0),
        ]);

        let weekly = resample(&s, Cycle::Weekly);
        assert_eq!(weekly.len(), 2);

        let second = &weekly[1];
        assert_eq!(second.trade_date, date(2024, 1, 12));
        assert_eq!(second.pre_close, 11.0);
        assert_eq!(second.change, -2.0);
        assert_eq!(second.pct_chg, -18.18);
    }

    #[test]
    fn test_empty_periods_are_skipped() {
        // 1월, 4월만 거래 → 2, 3월 월봉 없음
        let s = series(vec![flat(date(2024, 1, 15), 10.0), flat(date(2024, 4, 15), 12.0)]);

        let monthly = resample(&s, Cycle::Monthly);
        let dates: Vec<_> = monthly.iter().map(|b| b.trade_date).collect();
        assert_eq!(dates, vec![date(2024, 1, 31), date(2024, 4, 30)]);
        // 건너뛴 기간과 무관하게 직전 생성 기간의 종가 사용
        assert_eq!(monthly[1].pre_close, 10.0);
        assert_eq!(monthly[1].pct_chg, 20.0);
    }

    #[test]
    fn test_degenerate_period() {
        let bar = Bar::daily("000001.SZ", date(2024, 2, 7), 5.0, 6.0, 4.0, 5.5, 10.0, 55.0);
        let quarterly = resample(&series(vec![bar]), Cycle::Quarterly);
        assert_eq!(quarterly.len(), 1);
        let q = &quarterly[0];
        assert_eq!(q.trade_date, date(2024, 3, 31));
        assert_eq!((q.open, q.high, q.low, q.close), (5.0, 6.0, 4.0, 5.5));
    }

    #[test]
    fn test_period_with_missing_field_is_dropped() {
        let mut missing_open = flat(date(2024, 1, 3), 10.0);
        missing_open.open = f64::NAN;
        let mut partial = flat(date(2024, 1, 9), 12.0);
        partial.open = f64::NAN;

        let s = series(vec![
            missing_open,
            flat(date(2024, 1, 10), 11.0),
            partial,
            flat(date(2024, 1, 16), 13.0),
        ]);
        let weekly = resample(&s, Cycle::Weekly);

        // 첫 주는 시가가 하나도 없어 제외, 둘째 주는 1/10 시가 사용
        let dates: Vec<_> = weekly.iter().map(|b| b.trade_date).collect();
        assert_eq!(dates, vec![date(2024, 1, 12), date(2024, 1, 19)]);
        assert_eq!(weekly[0].open, 11.0);
        assert_eq!(weekly[0].close, 11.0);
        assert_eq!(weekly[0].pre_close, 0.0);
        assert_eq!(weekly[1].pre_close, 11.0);
    }

    #[test]
    fn test_year_boundary_and_all_cycles() {
        let s = series(vec![
            flat(date(2023, 12, 28), 10.0),
            flat(date(2024, 1, 2), 20.0),
        ]);

        let yearly = resample(&s, Cycle::Yearly);
        assert_eq!(yearly.len(), 2);
        assert_eq!(yearly[0].trade_date, date(2023, 12, 31));
        assert_eq!(yearly[1].trade_date, date(2024, 12, 31));
        assert_eq!(yearly[1].pct_chg, 100.0);

        let all = resample_all_cycles(&s);
        // 주 2 + 월 2 + 분기 2 + 연 2
        assert_eq!(all.len(), 8);
        assert!(all.iter().all(|b| b.cycle != Cycle::Daily));
    }

    #[test]
    fn test_daily_is_identity() {
        let s = series(vec![flat(date(2024, 1, 2), 10.0)]);
        assert_eq!(resample(&s, Cycle::Daily), s.bars);
    }
}
