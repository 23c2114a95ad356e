//! 사용량 집계.
//!
//! 누적 페이지 카운터 이력에서 기간별 출력 페이지 수를 계산한다.
//! 카운터가 감소하면 리셋(장치 교체/펌웨어 초기화)으로 보고 0부터 다시 센다.
//! 결과는 저장하지 않으며 같은 측정값 집합에 대해 항상 같은 값을 낸다.

use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

use crate::config::MAX_PERIOD_DAYS;
use crate::error::CoreError;
use crate::models::reading::MetricReading;
use crate::models::usage::UsagePeriodResult;
use crate::ports::storage::MetricHistory;

/// 카운터 walk 결과
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterWalk {
    pub pages: u64,
    pub resets: usize,
}

/// 연속 카운터 값의 증가분 합계
///
/// 값이 2개 미만이면 0. 감소 구간은 현재 값을 그대로 증가분으로 더한다.
pub fn walk_counters(counters: &[u64]) -> CounterWalk {
    counters
        .windows(2)
        .fold(CounterWalk::default(), |mut acc, pair| {
            let (prev, curr) = (pair[0], pair[1]);
            if curr >= prev {
                acc.pages += curr - prev;
            } else {
                acc.pages += curr;
                acc.resets += 1;
            }
            acc
        })
}

/// 이미 기간으로 걸러진 측정값 목록에서 사용량 계산
///
/// 페이지 카운터가 UNKNOWN인 측정값은 건너뛴다.
pub fn compute_usage(
    printer_id: i64,
    period_days: u32,
    readings: &[MetricReading],
) -> Result<UsagePeriodResult, CoreError> {
    if period_days == 0 {
        return Err(CoreError::Validation {
            field: "period_days".to_string(),
            message: "기간은 1일 이상이어야 합니다".to_string(),
        });
    }

    let mut valid: Vec<&MetricReading> =
        readings.iter().filter(|r| r.page_count.is_some()).collect();
    valid.sort_by_key(|r| (r.polled_at, r.id));

    let counters: Vec<u64> = valid.iter().filter_map(|r| r.page_count).collect();
    let walk = walk_counters(&counters);

    Ok(UsagePeriodResult {
        printer_id,
        period_days,
        pages_printed: walk.pages,
        readings_used: counters.len(),
        average_per_day: walk.pages as f64 / f64::from(period_days),
        counter_resets: walk.resets,
        first_reading_at: valid.first().map(|r| r.polled_at),
        last_reading_at: valid.last().map(|r| r.polled_at),
    })
}

/// 기간 시작 시각 `now - N일`
///
/// 0일이거나 [`MAX_PERIOD_DAYS`]를 넘으면 검증 에러.
pub fn period_start(now: DateTime<Utc>, days: u32) -> Result<DateTime<Utc>, CoreError> {
    let out_of_range = || CoreError::Validation {
        field: "period_days".to_string(),
        message: format!("기간은 1~{MAX_PERIOD_DAYS}일 사이여야 합니다: {days}"),
    };
    if days == 0 || days > MAX_PERIOD_DAYS {
        return Err(out_of_range());
    }
    TimeDelta::try_days(i64::from(days))
        .and_then(|delta| now.checked_sub_signed(delta))
        .ok_or_else(out_of_range)
}

/// 기간 `[now - N일, now]`의 측정값을 조회해 사용량 계산
pub async fn usage_for_period(
    history: &dyn MetricHistory,
    printer_id: i64,
    period_days: u32,
    now: DateTime<Utc>,
) -> Result<UsagePeriodResult, CoreError> {
    let from = period_start(now, period_days)?;
    let readings = history.list_readings(printer_id, from, now).await?;
    let result = compute_usage(printer_id, period_days, &readings)?;
    debug!(
        "사용량 계산: printer={printer_id}, {period_days}일, {}페이지 (측정값 {}개, 리셋 {}회)",
        result.pages_printed, result.readings_used, result.counter_resets
    );
    Ok(result)
}

/// 여러 기간을 한 번에 계산 (입력 순서 유지)
pub async fn usage_for_periods(
    history: &dyn MetricHistory,
    printer_id: i64,
    periods: &[u32],
    now: DateTime<Utc>,
) -> Result<Vec<UsagePeriodResult>, CoreError> {
    let mut results = Vec::with_capacity(periods.len());
    for &days in periods {
        results.push(usage_for_period(history, printer_id, days, now).await?);
    }
    Ok(results)
}
