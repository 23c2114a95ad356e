//! 통계 API 핸들러.

use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use printwatch_core::fleet;
use printwatch_core::usage;
use serde::Serialize;

use super::FilterQuery;
use crate::error::ApiError;
use crate::AppState;

/// 요약 통계의 사용량 기간 (일)
const SUMMARY_PERIOD_DAYS: u32 = 30;

/// 요약 통계 응답
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    /// 프린터 수
    pub printers: usize,
    /// 최신 측정값이 온라인인 프린터 수
    pub online: usize,
    /// 최신 측정값이 오프라인인 프린터 수
    pub offline: usize,
    /// 아직 수집되지 않은 프린터 수
    pub never_polled: usize,
    /// 최근 30일 출력 페이지 합계
    pub pages_last_30_days: u64,
    /// 토너 부족 프린터 수
    pub low_toner: usize,
    /// 토너 부족 임계값 (%)
    pub low_toner_threshold: u8,
}

/// 요약 통계 조회
///
/// GET /api/stats/summary?location=&model=
pub async fn get_summary(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let statuses =
        fleet::fleet_status(state.registry.as_ref(), state.history.as_ref(), &query.filter())
            .await?;
    let threshold = state.report.low_toner_threshold;
    let now = Utc::now();

    let mut pages = 0u64;
    for status in &statuses {
        let result = usage::usage_for_period(
            state.history.as_ref(),
            status.printer.id,
            SUMMARY_PERIOD_DAYS,
            now,
        )
        .await?;
        pages = pages.saturating_add(result.pages_printed);
    }

    let never_polled = statuses.iter().filter(|s| s.latest.is_none()).count();
    let online = statuses.iter().filter(|s| s.is_online()).count();

    Ok(Json(SummaryResponse {
        printers: statuses.len(),
        online,
        offline: statuses.len() - online - never_polled,
        never_polled,
        pages_last_30_days: pages,
        low_toner: statuses.iter().filter(|s| s.is_toner_low(threshold)).count(),
        low_toner_threshold: threshold,
    }))
}
