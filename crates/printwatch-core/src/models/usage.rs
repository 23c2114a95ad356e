//! 사용량 집계 결과 모델.
//!
//! 저장하지 않고 요청 시마다 측정값 이력에서 다시 계산한다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 기간별 사용량
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsagePeriodResult {
    pub printer_id: i64,
    /// 기간 길이 (일)
    pub period_days: u32,
    /// 출력 페이지 수 (항상 0 이상)
    pub pages_printed: u64,
    /// 계산에 사용된 유효 측정값 수
    pub readings_used: usize,
    /// 일 평균 (pages_printed / period_days)
    pub average_per_day: f64,
    /// 카운터 감소(리셋)로 판단된 구간 수
    pub counter_resets: usize,
    pub first_reading_at: Option<DateTime<Utc>>,
    pub last_reading_at: Option<DateTime<Utc>>,
}
