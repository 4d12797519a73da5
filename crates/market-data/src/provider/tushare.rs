//! Tushare Pro API 클라이언트.
//!
//! 모든 API는 단일 엔드포인트에 JSON으로 요청합니다:
//!
//! ```json
//! {"api_name": "daily", "token": "...", "params": {"ts_code": "000001.SZ"}, "fields": ""}
//! ```
//!
//! 응답은 컬럼명 목록과 행 배열로 구성됩니다:
//!
//! ```json
//! {"code": 0, "msg": "", "data": {"fields": ["ts_code", "trade_date"], "items": [["000001.SZ", "20240105"]]}}
//! ```
//!
//! `code`가 0이 아니면 (토큰 오류, 분당 호출 한도 초과 등) 조회 실패로 처리합니다.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use market_core::{format_compact_date, parse_compact_date, Bar, Cycle};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::DailyBarFetcher;
use crate::error::{DataError, Result};

/// 기본 API 엔드포인트.
pub const DEFAULT_API_URL: &str = "http://api.tushare.pro";

/// 요청 타임아웃.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Tushare Pro API 클라이언트.
#[derive(Clone)]
pub struct TushareClient {
    client: reqwest::Client,
    token: String,
    api_url: String,
}

#[derive(Debug, Deserialize)]
struct TushareResponse {
    code: i64,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    data: Option<TushareTable>,
}

/// 컬럼명 + 행 배열 형태의 응답 데이터.
#[derive(Debug, Deserialize)]
struct TushareTable {
    fields: Vec<String>,
    items: Vec<Vec<Value>>,
}

impl TushareTable {
    fn column(&self, name: &str) -> Result<usize> {
        self.fields
            .iter()
            .position(|f| f == name)
            .ok_or_else(|| DataError::ParseError(format!("응답에 '{}' 컬럼이 없습니다", name)))
    }
}

/// 숫자 셀을 읽습니다. null/비숫자는 결측(NaN).
fn number(row: &[Value], idx: usize) -> f64 {
    row.get(idx).and_then(Value::as_f64).unwrap_or(f64::NAN)
}

fn text(row: &[Value], idx: usize) -> Option<&str> {
    row.get(idx).and_then(Value::as_str)
}

/// `daily` 응답 컬럼 인덱스.
struct DailyColumns {
    trade_date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    pre_close: usize,
    change: usize,
    pct_chg: usize,
    vol: usize,
    amount: usize,
}

impl DailyColumns {
    fn locate(table: &TushareTable) -> Result<Self> {
        Ok(Self {
            trade_date: table.column("trade_date")?,
            open: table.column("open")?,
            high: table.column("high")?,
            low: table.column("low")?,
            close: table.column("close")?,
            pre_close: table.column("pre_close")?,
            change: table.column("change")?,
            pct_chg: table.column("pct_chg")?,
            vol: table.column("vol")?,
            amount: table.column("amount")?,
        })
    }

    /// 응답의 `ts_code` 표기와 관계없이 요청한 종목 코드를 사용합니다.
    fn to_bar(&self, row: &[Value], instrument_id: &str) -> Result<Bar> {
        let trade_date = text(row, self.trade_date)
            .ok_or_else(|| DataError::ParseError("trade_date 값이 없습니다".to_string()))?;

        Ok(Bar {
            instrument_id: instrument_id.to_string(),
            trade_date: parse_compact_date(trade_date)?,
            cycle: Cycle::Daily,
            open: number(row, self.open),
            high: number(row, self.high),
            low: number(row, self.low),
            close: number(row, self.close),
            pre_close: number(row, self.pre_close),
            change: number(row, self.change),
            pct_chg: number(row, self.pct_chg),
            volume: number(row, self.vol),
            amount: number(row, self.amount),
        })
    }
}

impl TushareClient {
    /// 새 클라이언트를 생성합니다.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| DataError::ConfigError(e.to_string()))?;

        Ok(Self {
            client,
            token: token.into(),
            api_url: DEFAULT_API_URL.to_string(),
        })
    }

    /// API 엔드포인트를 변경합니다 (프록시/테스트용).
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    async fn query(&self, api_name: &str, params: Value, fields: &str) -> Result<TushareTable> {
        let body = json!({
            "api_name": api_name,
            "token": self.token,
            "params": params,
            "fields": fields,
        });

        let response: TushareResponse = self
            .client
            .post(&self.api_url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.code != 0 {
            return Err(DataError::FetchError(format!(
                "{} 호출 실패 (code={}): {}",
                api_name,
                response.code,
                response.msg.unwrap_or_default()
            )));
        }

        response
            .data
            .ok_or_else(|| DataError::FetchError(format!("{} 응답에 data가 없습니다", api_name)))
    }

    /// 상장 종목 코드 목록을 조회합니다.
    ///
    /// `exclude_prefixes` 중 하나로 시작하는 코드는 제외합니다.
    pub async fn list_instruments(&self, exclude_prefixes: &[String]) -> Result<Vec<String>> {
        let table = self
            .query("stock_basic", json!({ "list_status": "L" }), "ts_code")
            .await?;
        let ts_code = table.column("ts_code")?;

        let codes: Vec<String> = table
            .items
            .iter()
            .filter_map(|row| text(row, ts_code))
            .filter(|code| !exclude_prefixes.iter().any(|p| code.starts_with(p.as_str())))
            .map(str::to_string)
            .collect();

        debug!(count = codes.len(), "종목 목록 조회 완료");
        Ok(codes)
    }
}

#[async_trait]
impl DailyBarFetcher for TushareClient {
    async fn fetch_daily(
        &self,
        instrument_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>> {
        let params = json!({
            "ts_code": instrument_id,
            "start_date": format_compact_date(start),
            "end_date": format_compact_date(end),
        });
        let table = self.query("daily", params, "").await?;
        let columns = DailyColumns::locate(&table)?;

        // 응답은 최신 날짜부터 내려오므로 오름차순으로 정렬
        let mut bars = table
            .items
            .iter()
            .map(|row| columns.to_bar(row, instrument_id))
            .collect::<Result<Vec<_>>>()?;
        bars.sort_by_key(|b| b.trade_date);

        debug!(instrument_id, rows = bars.len(), "일봉 조회 완료");
        Ok(bars)
    }
}
