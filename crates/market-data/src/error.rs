//! 데이터 모듈 오류 타입.

use thiserror::Error;

/// 데이터 관련 오류.
#[derive(Debug, Error)]
pub enum DataError {
    /// 데이터베이스 연결 오류 (네트워크/IO)
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    /// 데이터베이스가 다른 세션에 의해 사용 중이거나 연결 수 초과
    #[error("Database busy: {0}")]
    Busy(String),

    /// 쿼리 실행 오류 (스키마, 권한, 제약 조건 등)
    #[error("Query error: {0}")]
    QueryError(String),

    /// 직렬화/역직렬화 오류
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// 잘못된 데이터 형식
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// 설정 오류
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// 타임아웃 오류
    #[error("Operation timeout: {0}")]
    Timeout(String),

    /// 데이터 가져오기 오류 (외부 소스)
    #[error("Fetch error: {0}")]
    FetchError(String),

    /// 파싱 오류
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl DataError {
    /// 재시도하면 성공할 수 있는 일시적 오류인지 확인합니다.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DataError::ConnectionError(_) | DataError::Busy(_) | DataError::Timeout(_)
        )
    }
}

/// 일시적 오류로 취급하는 PostgreSQL SQLSTATE 코드.
///
/// - 55006 object_in_use ("database is being accessed by other users")
/// - 53300 too_many_connections
/// - 57P03 cannot_connect_now
/// - 40001 serialization_failure
/// - 40P01 deadlock_detected
const TRANSIENT_SQLSTATES: [&str; 5] = ["55006", "53300", "57P03", "40001", "40P01"];

impl From<sqlx::Error> for DataError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(e) => DataError::ConnectionError(e.to_string()),
            sqlx::Error::Configuration(e) => DataError::ConfigError(e.to_string()),
            sqlx::Error::Database(db_err) => {
                let code = db_err
                    .code()
                    .map(|c| c.into_owned())
                    .unwrap_or_default();
                if TRANSIENT_SQLSTATES.contains(&code.as_str()) {
                    DataError::Busy(db_err.message().to_string())
                } else {
                    DataError::QueryError(db_err.message().to_string())
                }
            }
            _ => DataError::QueryError(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for DataError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DataError::Timeout(err.to_string())
        } else {
            DataError::FetchError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::SerializationError(err.to_string())
    }
}

impl From<csv::Error> for DataError {
    fn from(err: csv::Error) -> Self {
        DataError::SerializationError(err.to_string())
    }
}

impl From<market_core::CoreError> for DataError {
    fn from(err: market_core::CoreError) -> Self {
        DataError::InvalidData(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(DataError::Busy("in use".into()).is_transient());
        assert!(DataError::Timeout("connect".into()).is_transient());
        assert!(DataError::ConnectionError("reset".into()).is_transient());

        assert!(!DataError::QueryError("permission denied".into()).is_transient());
        assert!(!DataError::ConfigError("bad url".into()).is_transient());
    }

    #[test]
    fn test_from_sqlx_io_is_transient() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err: DataError = sqlx::Error::Io(io).into();
        assert!(err.is_transient());

        let err: DataError = sqlx::Error::RowNotFound.into();
        assert!(!err.is_transient());
    }

    #[test]
    fn test_unclassified_sqlx_errors_are_query_errors() {
        // 연결은 풀 없이 작업마다 새로 맺으므로 풀 타임아웃도 일반 쿼리 오류로 취급
        let err: DataError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, DataError::QueryError(_)));
        assert!(!err.is_transient());
    }
}
