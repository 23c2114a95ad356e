//! # printwatch-app
//!
//! PrintWatch 바이너리 진입점.
//! DI 와이어링, CLI 하위 명령, 라이프사이클 관리, 스케줄러 오케스트레이션.

mod lifecycle;
mod report;
mod scheduler;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use printwatch_core::config::{validate_periods, AppConfig};
use printwatch_core::config_manager::ConfigManager;
use printwatch_core::fleet;
use printwatch_core::models::printer::PrinterFilter;
use printwatch_core::subnet::{load_or_create_subnets, SubnetEntry};
use printwatch_monitor::{
    CollectorSettings, DiscoveryEngine, DiscoverySettings, MetricsCollector, SnmpReader,
};
use printwatch_snmp::AsyncSnmpProbe;
use printwatch_storage::sqlite::SqliteStorage;
use printwatch_web::WebServer;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::lifecycle::LifecycleManager;
use crate::scheduler::{DiscoveryJob, Scheduler, SchedulerConfig};

/// 종료 신호 후 백그라운드 태스크 대기 시간
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// PrintWatch 네트워크 프린터 모니터
///
/// SNMP로 프린터를 탐색하고 페이지 카운터/소모품 잔량을 수집해 사용량을 집계한다.
#[derive(Parser, Debug)]
#[command(name = "printwatch")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 설정 파일 경로 (기본: 플랫폼 설정 디렉토리의 config.json)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// SQLite DB 경로 (설정값보다 우선)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info", global = true)]
    log_level: String,

    /// 서브넷 설정 파일 (설정값보다 우선)
    #[arg(long, global = true)]
    subnets: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 서브넷을 조회해 프린터를 등록/갱신
    Discover,
    /// 등록된 프린터 전체에서 메트릭 1회 수집
    Collect,
    /// 주기적 수집 + 웹 API (SIGINT/SIGTERM까지)
    Run {
        /// 수집 주기 (초, 설정값보다 우선)
        #[arg(long)]
        interval: Option<u64>,
        /// 웹 API 비활성화
        #[arg(long)]
        no_web: bool,
    },
    /// 웹 API만 실행
    Serve,
    /// 프린터 현황 표
    Status,
    /// 단일 기간 사용량 리포트 (위치별)
    Report {
        /// 기간 (일)
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
    /// 여러 기간 사용량 요약
    Summary {
        /// 기간 목록 (일, 기본: 설정의 usage_periods)
        periods: Vec<u32>,
    },
}

/// 로드된 설정과 어댑터
struct App {
    config: AppConfig,
    subnets_path: PathBuf,
    storage: Arc<SqliteStorage>,
}

impl App {
    fn load(args: &Args) -> Result<Self> {
        let config_manager = match &args.config {
            Some(path) => ConfigManager::with_path(path.clone()),
            None => ConfigManager::new(),
        }
        .context("설정 로드 실패")?;
        info!("설정 파일: {}", config_manager.config_path().display());

        let subnets_path = args
            .subnets
            .clone()
            .unwrap_or_else(|| config_manager.subnets_path());
        let db_path = args.db.clone().unwrap_or_else(|| config_manager.db_path());
        let storage = Arc::new(
            SqliteStorage::open(&db_path)
                .with_context(|| format!("DB 열기 실패: {}", db_path.display()))?,
        );

        Ok(Self {
            config: config_manager.get().clone(),
            subnets_path,
            storage,
        })
    }

    fn reader(&self) -> SnmpReader {
        SnmpReader::new(Arc::new(AsyncSnmpProbe::from_config(&self.config.snmp)))
    }

    fn subnets(&self) -> Result<Vec<SubnetEntry>> {
        let subnets =
            load_or_create_subnets(&self.subnets_path, &self.config.discovery.default_location)?;
        if subnets.is_empty() {
            bail!(
                "서브넷 파일에 대상이 없습니다. 파일을 편집해 서브넷을 추가하세요: {}",
                self.subnets_path.display()
            );
        }
        Ok(subnets)
    }

    fn discovery_engine(&self) -> DiscoveryEngine {
        DiscoveryEngine::new(
            self.reader(),
            self.storage.clone(),
            DiscoverySettings::from_config(&self.config),
        )
    }

    fn collector(&self) -> MetricsCollector {
        MetricsCollector::new(
            self.reader(),
            self.storage.clone(),
            self.storage.clone(),
            CollectorSettings::from_config(&self.config),
        )
    }

    fn web_server(&self) -> WebServer {
        WebServer::new(
            self.storage.clone(),
            self.storage.clone(),
            self.config.web.clone(),
        )
        .with_report_config(self.config.report.clone())
    }
}

/// tracing 초기화 (RUST_LOG가 있으면 우선)
fn init_tracing(log_level: &str) {
    let log_filter = format!(
        "printwatch={l},printwatch_app={l},printwatch_core={l},printwatch_snmp={l},printwatch_storage={l},printwatch_monitor={l},printwatch_web={l},tower_http={l}",
        l = log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let app = App::load(&args)?;

    match args.command {
        Command::Discover => discover(&app).await,
        Command::Collect => collect(&app).await,
        Command::Run { interval, no_web } => run(&app, interval, no_web).await,
        Command::Serve => serve(&app).await,
        Command::Status => status(&app).await,
        Command::Report { days } => usage_report(&app, days).await,
        Command::Summary { periods } => usage_summary(&app, periods).await,
    }
}

async fn discover(app: &App) -> Result<()> {
    let subnets = app.subnets()?;
    let report = app.discovery_engine().discover(&subnets).await;
    print!("{}", report::render_discovery(&report));
    Ok(())
}

async fn collect(app: &App) -> Result<()> {
    let report = app.collector().collect().await?;
    print!("{}", report::render_collection(&report));
    Ok(())
}

async fn run(app: &App, interval: Option<u64>, no_web: bool) -> Result<()> {
    let mut scheduler_config = SchedulerConfig::from_config(&app.config);
    if let Some(secs) = interval {
        if secs == 0 {
            bail!("--interval은 1 이상이어야 합니다");
        }
        scheduler_config.poll_interval = Duration::from_secs(secs);
    }

    let mut scheduler = Scheduler::new(scheduler_config.clone(), Arc::new(app.collector()));
    if scheduler_config.discover_on_start {
        scheduler = scheduler.with_discovery(DiscoveryJob {
            engine: app.discovery_engine(),
            subnets: app.subnets()?,
        });
    }

    let lifecycle = LifecycleManager::new();
    let mut tasks = Vec::new();

    let scheduler_rx = lifecycle.subscribe();
    tasks.push(tokio::spawn(async move {
        scheduler.run(scheduler_rx).await;
    }));

    if no_web || !app.config.web.enabled {
        info!("웹 API 비활성화");
    } else {
        tasks.push(spawn_web(app.web_server(), &lifecycle));
    }

    info!("PrintWatch 실행 중 (Ctrl+C로 종료)");
    lifecycle.wait_for_signal().await;

    join_with_grace(tasks).await;
    info!("PrintWatch 종료");
    Ok(())
}

async fn serve(app: &App) -> Result<()> {
    let lifecycle = LifecycleManager::new();
    let task = spawn_web(app.web_server(), &lifecycle);
    lifecycle.wait_for_signal().await;
    join_with_grace(vec![task]).await;
    Ok(())
}

fn spawn_web(server: WebServer, lifecycle: &LifecycleManager) -> tokio::task::JoinHandle<()> {
    let shutdown_rx = lifecycle.subscribe();
    info!("웹 API: {}", server.url());
    tokio::spawn(async move {
        if let Err(e) = server.run(shutdown_rx).await {
            error!("웹 서버 오류: {e}");
        }
    })
}

async fn join_with_grace(tasks: Vec<tokio::task::JoinHandle<()>>) {
    for task in tasks {
        match tokio::time::timeout(SHUTDOWN_GRACE, task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("태스크 비정상 종료: {e}"),
            Err(_) => error!("태스크 종료 대기 시간 초과"),
        }
    }
}

async fn status(app: &App) -> Result<()> {
    let statuses = fleet::fleet_status(
        app.storage.as_ref(),
        app.storage.as_ref(),
        &PrinterFilter::default(),
    )
    .await?;
    print!(
        "{}",
        report::render_status(&statuses, app.config.report.low_toner_threshold)
    );
    Ok(())
}

async fn usage_report(app: &App, days: u32) -> Result<()> {
    validate_periods(&[days])?;
    let rows = fleet::fleet_usage(
        app.storage.as_ref(),
        app.storage.as_ref(),
        &PrinterFilter::default(),
        &[days],
        Utc::now(),
    )
    .await?;
    print!("{}", report::render_usage_report(&rows, days));
    Ok(())
}

async fn usage_summary(app: &App, periods: Vec<u32>) -> Result<()> {
    let periods = if periods.is_empty() {
        app.config.report.usage_periods.clone()
    } else {
        periods
    };
    validate_periods(&periods)?;
    let rows = fleet::fleet_usage(
        app.storage.as_ref(),
        app.storage.as_ref(),
        &PrinterFilter::default(),
        &periods,
        Utc::now(),
    )
    .await?;
    print!("{}", report::render_usage_summary(&rows, &periods));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let args = Args::try_parse_from([
            "printwatch",
            "run",
            "--interval",
            "60",
            "--no-web",
            "--db",
            "/tmp/pw.db",
        ])
        .unwrap();
        assert_eq!(args.db, Some(PathBuf::from("/tmp/pw.db")));
        match args.command {
            Command::Run { interval, no_web } => {
                assert_eq!(interval, Some(60));
                assert!(no_web);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn summary_takes_positional_periods() {
        let args = Args::try_parse_from(["printwatch", "summary", "7", "30"]).unwrap();
        match args.command {
            Command::Summary { periods } => assert_eq!(periods, vec![7, 30]),
            other => panic!("unexpected command: {other:?}"),
        }

        let args = Args::try_parse_from(["printwatch", "report"]).unwrap();
        assert!(matches!(args.command, Command::Report { days: 30 }));
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Args::try_parse_from(["printwatch"]).is_err());
    }
}
