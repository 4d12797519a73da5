//! 봉 집계 주기 정의.
//!
//! 일봉을 기준으로 주봉/월봉/분기봉/연봉을 만들 때 사용하는 주기와
//! 각 주기의 기간 경계(기간 종료일) 규칙을 정의합니다.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// 봉 집계 주기.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cycle {
    /// 일봉
    Daily,
    /// 주봉 (금요일 마감)
    Weekly,
    /// 월봉
    Monthly,
    /// 분기봉
    Quarterly,
    /// 연봉
    Yearly,
}

impl Cycle {
    /// 전체 주기 목록 (일봉 포함).
    pub const ALL: [Cycle; 5] = [
        Cycle::Daily,
        Cycle::Weekly,
        Cycle::Monthly,
        Cycle::Quarterly,
        Cycle::Yearly,
    ];

    /// 일봉에서 리샘플링으로 만들어지는 주기 목록.
    pub const PERIODIC: [Cycle; 4] = [
        Cycle::Weekly,
        Cycle::Monthly,
        Cycle::Quarterly,
        Cycle::Yearly,
    ];

    /// DB `cycle` 컬럼에 저장되는 라벨을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Cycle::Daily => "daily",
            Cycle::Weekly => "weekly",
            Cycle::Monthly => "monthly",
            Cycle::Quarterly => "quarterly",
            Cycle::Yearly => "yearly",
        }
    }

    /// 주어진 날짜가 속한 기간의 달력상 종료일을 반환합니다.
    ///
    /// - 일봉: 해당 날짜
    /// - 주봉: 같은 주의 금요일 (토/일은 다음 금요일)
    /// - 월봉: 해당 월의 말일
    /// - 분기봉: 해당 분기 마지막 달의 말일
    /// - 연봉: 12월 31일
    pub fn period_end(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Cycle::Daily => date,
            Cycle::Weekly => {
                let weekday = date.weekday().num_days_from_monday() as i64;
                // 금요일 = 4
                let offset = (4 - weekday).rem_euclid(7);
                date + Duration::days(offset)
            }
            Cycle::Monthly => last_day_of_month(date.year(), date.month()),
            Cycle::Quarterly => {
                let quarter_end_month = ((date.month() - 1) / 3 + 1) * 3;
                last_day_of_month(date.year(), quarter_end_month)
            }
            Cycle::Yearly => last_day_of_month(date.year(), 12),
        }
    }
}

/// 해당 월의 말일.
fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Cycle {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(Cycle::Daily),
            "weekly" => Ok(Cycle::Weekly),
            "monthly" => Ok(Cycle::Monthly),
            "quarterly" => Ok(Cycle::Quarterly),
            "yearly" => Ok(Cycle::Yearly),
            _ => Err(CoreError::Parse(format!("Invalid cycle: {}", s))),
        }
    }
}
