//! API 라우트 정의.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers;
use crate::AppState;

/// API 라우트 생성
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // 프린터
        .route("/printers", get(handlers::printers::list_printers))
        .route(
            "/printers/{id}",
            get(handlers::printers::get_printer).delete(handlers::printers::delete_printer),
        )
        .route(
            "/printers/{id}/history",
            get(handlers::printers::get_history),
        )
        .route(
            "/printers/{id}/location",
            put(handlers::printers::update_location),
        )
        .route("/printers/{id}/usage", get(handlers::usage::get_printer_usage))
        // 필터 값
        .route("/locations", get(handlers::printers::list_locations))
        .route("/models", get(handlers::printers::list_models))
        // 통계
        .route("/stats/summary", get(handlers::stats::get_summary))
        .route("/usage/summary", get(handlers::usage::get_usage_summary))
}
