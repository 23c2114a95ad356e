//! 사용량 API 핸들러.
//!
//! 사용량은 저장하지 않고 요청마다 측정값 이력에서 다시 계산한다.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use printwatch_core::fleet::{self, PrinterUsage};
use printwatch_core::models::usage::UsagePeriodResult;
use printwatch_core::usage;
use serde::Deserialize;

use super::printers::require_printer;
use super::{parse_periods, FilterQuery};
use crate::error::ApiError;
use crate::AppState;

/// 기간 쿼리 파라미터
#[derive(Debug, Default, Deserialize)]
pub struct PeriodsQuery {
    /// 쉼표로 구분한 기간 목록 (기본: 설정의 usage_periods)
    pub periods: Option<String>,
}

/// 전체 사용량 요약 쿼리 파라미터
#[derive(Debug, Default, Deserialize)]
pub struct UsageSummaryQuery {
    pub periods: Option<String>,
    pub location: Option<String>,
    pub model: Option<String>,
}

/// 프린터 하나의 기간별 사용량
///
/// GET /api/printers/{id}/usage?periods=30,90
pub async fn get_printer_usage(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<PeriodsQuery>,
) -> Result<Json<Vec<UsagePeriodResult>>, ApiError> {
    let periods = parse_periods(query.periods.as_deref(), &state.report.usage_periods)?;
    require_printer(&state, id).await?;

    let results =
        usage::usage_for_periods(state.history.as_ref(), id, &periods, Utc::now()).await?;
    Ok(Json(results))
}

/// 프린터별 기간 사용량 요약
///
/// GET /api/usage/summary?periods=&location=&model=
pub async fn get_usage_summary(
    State(state): State<AppState>,
    Query(query): Query<UsageSummaryQuery>,
) -> Result<Json<Vec<PrinterUsage>>, ApiError> {
    let periods = parse_periods(query.periods.as_deref(), &state.report.usage_periods)?;
    let filter = FilterQuery {
        location: query.location,
        model: query.model,
    }
    .filter();

    let rows = fleet::fleet_usage(
        state.registry.as_ref(),
        state.history.as_ref(),
        &filter,
        &periods,
        Utc::now(),
    )
    .await?;
    Ok(Json(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{add_printer, state};
    use chrono::Duration;
    use printwatch_core::models::reading::{Level, NewReading};
    use printwatch_core::ports::storage::MetricHistory;
    use printwatch_storage::sqlite::SqliteStorage;

    async fn record(storage: &SqliteStorage, printer_id: i64, days_ago: i64, pages: u64) {
        storage
            .append_reading(&NewReading {
                printer_id,
                polled_at: Utc::now() - Duration::days(days_ago) + Duration::minutes(1),
                page_count: Some(pages),
                toner: Level::Unknown,
                drum: Level::Unknown,
                online: true,
                device_status: None,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn printer_usage_per_period() {
        let (state, storage) = state();
        let printer = add_printer(&storage, 1, "1F", None).await;
        record(&storage, printer.id, 60, 1_000).await;
        record(&storage, printer.id, 20, 1_400).await;
        record(&storage, printer.id, 1, 1_700).await;

        let Json(results) = get_printer_usage(
            State(state),
            Path(printer.id),
            Query(PeriodsQuery {
                periods: Some("30,90".to_string()),
            }),
        )
        .await
        .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].period_days, 30);
        assert_eq!(results[0].pages_printed, 300);
        assert_eq!(results[0].readings_used, 2);
        assert_eq!(results[1].pages_printed, 700);
        assert!((results[0].average_per_day - 10.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn default_periods_from_config() {
        let (state, storage) = state();
        let printer = add_printer(&storage, 1, "1F", None).await;

        let Json(results) = get_printer_usage(
            State(state),
            Path(printer.id),
            Query(PeriodsQuery::default()),
        )
        .await
        .unwrap();
        let periods: Vec<u32> = results.iter().map(|r| r.period_days).collect();
        assert_eq!(periods, vec![30, 90, 120, 365]);
        assert!(results.iter().all(|r| r.pages_printed == 0));
    }

    #[tokio::test]
    async fn summary_respects_filter() {
        let (state, storage) = state();
        let a = add_printer(&storage, 1, "1F", None).await;
        let b = add_printer(&storage, 2, "2F", None).await;
        record(&storage, a.id, 3, 10).await;
        record(&storage, a.id, 2, 60).await;
        record(&storage, b.id, 3, 5).await;

        let Json(rows) = get_usage_summary(
            State(state),
            Query(UsageSummaryQuery {
                periods: Some("7".to_string()),
                location: Some("1F".to_string()),
                model: None,
            }),
        )
        .await
        .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].printer.id, a.id);
        assert_eq!(rows[0].periods[0].pages_printed, 50);
    }

    #[tokio::test]
    async fn oversized_period_is_bad_request() {
        let (state, storage) = state();
        let printer = add_printer(&storage, 1, "1F", None).await;

        let err = get_printer_usage(
            State(state.clone()),
            Path(printer.id),
            Query(PeriodsQuery {
                periods: Some("30,4000000000".to_string()),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)), "{err:?}");

        let err = get_usage_summary(
            State(state),
            Query(UsageSummaryQuery {
                periods: Some("36501".to_string()),
                ..Default::default()
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)), "{err:?}");
    }
}
