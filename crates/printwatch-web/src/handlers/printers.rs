//! 프린터 API 핸들러.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use printwatch_core::error::CoreError;
use printwatch_core::fleet::{self, PrinterStatus};
use printwatch_core::models::printer::Printer;
use printwatch_core::models::reading::MetricReading;
use printwatch_core::usage;
use serde::Deserialize;
use tracing::info;

use super::FilterQuery;
use crate::error::ApiError;
use crate::AppState;

/// 기본 이력 조회 기간 (일)
const DEFAULT_HISTORY_DAYS: u32 = 30;

/// 이력 쿼리 파라미터
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// 조회할 일수 (기본: 30)
    pub days: Option<u32>,
}

/// 위치 변경 요청
#[derive(Debug, Deserialize)]
pub struct LocationUpdate {
    pub location: String,
}

/// 프린터 목록 + 최신 측정값
///
/// GET /api/printers?location=&model=
pub async fn list_printers(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<Vec<PrinterStatus>>, ApiError> {
    let statuses =
        fleet::fleet_status(state.registry.as_ref(), state.history.as_ref(), &query.filter())
            .await?;
    Ok(Json(statuses))
}

/// 프린터 상세
///
/// GET /api/printers/{id}
pub async fn get_printer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PrinterStatus>, ApiError> {
    let printer = require_printer(&state, id).await?;
    let latest = state.history.latest_reading(id).await?;
    Ok(Json(PrinterStatus { printer, latest }))
}

/// 측정 이력 (차트 데이터, 시각 오름차순)
///
/// GET /api/printers/{id}/history?days=30
pub async fn get_history(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<MetricReading>>, ApiError> {
    let days = query.days.unwrap_or(DEFAULT_HISTORY_DAYS);
    let to = Utc::now();
    let from = usage::period_start(to, days)?;
    require_printer(&state, id).await?;

    let readings = state.history.list_readings(id, from, to).await?;
    Ok(Json(readings))
}

/// 위치 라벨 변경
///
/// PUT /api/printers/{id}/location
pub async fn update_location(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<LocationUpdate>,
) -> Result<Json<Printer>, ApiError> {
    let location = body.location.trim();
    if location.is_empty() {
        return Err(ApiError::BadRequest("위치가 비어 있습니다".to_string()));
    }
    let printer = state.registry.update_location(id, location).await?;
    info!("프린터 {id} 위치 변경: {location}");
    Ok(Json(printer))
}

/// 프린터 삭제 (측정 이력 포함)
///
/// DELETE /api/printers/{id}
pub async fn delete_printer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if state.registry.delete_printer(id).await? {
        info!("프린터 {id} 삭제");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(CoreError::printer_not_found(id).into())
    }
}

/// 등록된 위치 목록
///
/// GET /api/locations
pub async fn list_locations(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.registry.list_locations().await?))
}

/// 등록된 모델 목록
///
/// GET /api/models
pub async fn list_models(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.registry.list_models().await?))
}

pub(crate) async fn require_printer(state: &AppState, id: i64) -> Result<Printer, ApiError> {
    state
        .registry
        .get_printer(id)
        .await?
        .ok_or_else(|| CoreError::printer_not_found(id).into())
}
