//! # printwatch-web
//!
//! 대시보드용 JSON API 서버 (Axum).
//!
//! ## 기능
//! - 프린터 목록 + 최신 측정값 조회 (위치/모델 필터)
//! - 프린터별 측정 이력, 기간 사용량
//! - 위치 변경, 프린터 삭제
//! - 요약 통계, 전체 사용량 요약

pub mod error;
pub mod handlers;
pub mod routes;

use axum::Router;
use printwatch_core::config::{ReportConfig, WebConfig};
use printwatch_core::ports::storage::{MetricHistory, PrinterRegistry};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// 포트 바인드 최대 시도 횟수
const MAX_PORT_ATTEMPTS: u16 = 10;

/// 웹 서버 애플리케이션 상태
#[derive(Clone)]
pub struct AppState {
    /// 프린터 레지스트리
    pub registry: Arc<dyn PrinterRegistry>,
    /// 측정값 이력
    pub history: Arc<dyn MetricHistory>,
    /// 사용량 기간, 토너 부족 임계값
    pub report: ReportConfig,
}

/// 대시보드 API 서버
pub struct WebServer {
    config: WebConfig,
    state: AppState,
}

impl WebServer {
    /// 새 웹 서버 생성
    pub fn new(
        registry: Arc<dyn PrinterRegistry>,
        history: Arc<dyn MetricHistory>,
        config: WebConfig,
    ) -> Self {
        Self {
            config,
            state: AppState {
                registry,
                history,
                report: ReportConfig::default(),
            },
        }
    }

    /// 리포트 설정 지정
    pub fn with_report_config(mut self, report: ReportConfig) -> Self {
        self.state.report = report;
        self
    }

    /// 라우터 구성 (테스트에서 직접 호출)
    pub fn router(state: AppState) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .nest("/api", routes::api_routes())
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// 서버 실행
    ///
    /// 기본 포트가 사용 중이면 다음 포트를 시도한다 (최대 10개).
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) -> Result<(), std::io::Error> {
        let host = if self.config.allow_external {
            "0.0.0.0"
        } else {
            "127.0.0.1"
        };

        let app = Self::router(self.state);

        let base_port = self.config.port;
        let mut last_error = None;

        for attempt in 0..MAX_PORT_ATTEMPTS {
            let port = base_port.saturating_add(attempt);
            if port < base_port && attempt > 0 {
                break;
            }

            let addr: SocketAddr = match format!("{host}:{port}").parse() {
                Ok(a) => a,
                Err(e) => {
                    error!("잘못된 주소 {host}:{port}: {e}");
                    continue;
                }
            };

            match TcpListener::bind(addr).await {
                Ok(listener) => {
                    if attempt > 0 {
                        warn!("포트 {base_port} 사용 불가, 대체 포트 {port} 사용");
                    }
                    info!("대시보드 API 서버 시작: http://{addr}");

                    axum::serve(listener, app)
                        .with_graceful_shutdown(async move {
                            loop {
                                if *shutdown_rx.borrow() {
                                    info!("웹 서버 종료 신호 수신");
                                    break;
                                }
                                if shutdown_rx.changed().await.is_err() {
                                    break;
                                }
                            }
                        })
                        .await?;

                    info!("대시보드 API 서버 종료");
                    return Ok(());
                }
                Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
                    warn!("포트 {port} 이미 사용 중, 다음 포트 시도...");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::AddrInUse,
                format!(
                    "포트 {}-{} 모두 사용 불가",
                    base_port,
                    base_port.saturating_add(MAX_PORT_ATTEMPTS - 1)
                ),
            )
        }))
    }

    /// 서버 URL 반환
    pub fn url(&self) -> String {
        format!("http://localhost:{}", self.config.port)
    }
}
