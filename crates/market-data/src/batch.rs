//! 적재용 배치 분할.
//!
//! 전체 행 집합(모든 종목 × 모든 주기)을 입력 순서 그대로 고정 크기 구간으로
//! 자릅니다. 해시 분할이 아닌 연속 구간 분할이므로 적재 행 수 집계가 정확합니다.

use market_core::{Bar, BAR_COLUMNS};

use crate::error::{DataError, Result};

/// 한 번의 트랜잭션으로 적재되는 행 묶음.
#[derive(Debug, Clone)]
pub struct LoadBatch {
    /// 배치 번호 (0부터)
    pub id: usize,
    /// 적재 대상 행
    pub rows: Vec<Bar>,
    /// 대상 컬럼 순서
    pub columns: &'static [&'static str],
}

impl LoadBatch {
    /// 새 배치를 생성합니다.
    pub fn new(id: usize, rows: Vec<Bar>) -> Self {
        Self {
            id,
            rows,
            columns: &BAR_COLUMNS,
        }
    }

    /// 배치 행 수.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// 빈 배치인지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// `total`행을 `batch_size` 단위로 나눌 때의 배치 수 (올림).
pub fn batch_count(total: usize, batch_size: usize) -> usize {
    if batch_size == 0 {
        0
    } else {
        total.div_ceil(batch_size)
    }
}

/// 행 집합을 `batch_size` 크기의 연속 배치로 나눕니다. 마지막 배치는 더 작을 수 있습니다.
pub fn partition(rows: Vec<Bar>, batch_size: usize) -> Result<Vec<LoadBatch>> {
    if batch_size == 0 {
        return Err(DataError::InvalidData(
            "batch_size는 1 이상이어야 합니다".to_string(),
        ));
    }

    let count = batch_count(rows.len(), batch_size);
    let mut iter = rows.into_iter();
    let batches = (0..count)
        .map(|id| LoadBatch::new(id, iter.by_ref().take(batch_size).collect()))
        .collect();

    Ok(batches)
}
