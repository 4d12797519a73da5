//! 핵심 에러 타입.

use thiserror::Error;

/// 도메인 타입 처리 중 발생하는 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 잘못된 입력
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),

    /// 파싱 에러
    #[error("파싱 에러: {0}")]
    Parse(String),
}

/// 핵심 작업을 위한 Result 타입.
pub type CoreResult<T> = Result<T, CoreError>;

impl From<chrono::ParseError> for CoreError {
    fn from(err: chrono::ParseError) -> Self {
        CoreError::Parse(err.to_string())
    }
}

/// `YYYYMMDD` 형식의 8자리 날짜를 파싱합니다.
pub fn parse_compact_date(s: &str) -> CoreResult<chrono::NaiveDate> {
    let s = s.trim();
    if s.len() != 8 || !s.chars().all(|c| c.is_ascii_digit()) {
        return Err(CoreError::InvalidInput(format!(
            "날짜는 YYYYMMDD 형식이어야 합니다: {}",
            s
        )));
    }
    Ok(chrono::NaiveDate::parse_from_str(s, "%Y%m%d")?)
}

/// 날짜를 `YYYYMMDD` 형식으로 변환합니다.
pub fn format_compact_date(date: chrono::NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}
