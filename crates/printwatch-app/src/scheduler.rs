//! 수집 스케줄러.
//!
//! 시작 시 탐색(선택) 후 주기마다 메트릭 수집을 실행한다.
//! 종료 신호를 받으면 진행 중인 수집을 버리고 빠져나온다. 수집 future가 drop되면
//! 진행 중인 SNMP 조회 태스크도 abort되며, 이미 기록된 행은 그대로 남는다.

use printwatch_core::config::AppConfig;
use printwatch_core::subnet::SubnetEntry;
use printwatch_monitor::{DiscoveryEngine, MetricsCollector};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// 스케줄러 설정
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// 수집 주기
    pub poll_interval: Duration,
    /// 루프 시작 전 탐색 1회
    pub discover_on_start: bool,
}

impl SchedulerConfig {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            poll_interval: config.collector.poll_interval(),
            discover_on_start: config.collector.discover_on_start,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3600), // 1시간
            discover_on_start: false,
        }
    }
}

/// 탐색 작업 (엔진 + 대상 서브넷)
pub struct DiscoveryJob {
    pub engine: DiscoveryEngine,
    pub subnets: Vec<SubnetEntry>,
}

/// 수집 스케줄러
pub struct Scheduler {
    config: SchedulerConfig,
    collector: Arc<MetricsCollector>,
    discovery: Option<DiscoveryJob>,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig, collector: Arc<MetricsCollector>) -> Self {
        Self {
            config,
            collector,
            discovery: None,
        }
    }

    /// 시작 시 탐색 작업 지정
    pub fn with_discovery(mut self, job: DiscoveryJob) -> Self {
        self.discovery = Some(job);
        self
    }

    /// 종료 신호까지 실행
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) {
        info!(
            "스케줄러 시작: 수집 주기={}초, 시작 탐색={}",
            self.config.poll_interval.as_secs(),
            self.config.discover_on_start
        );

        if self.config.discover_on_start {
            match &self.discovery {
                Some(job) => {
                    tokio::select! {
                        _ = job.engine.discover(&job.subnets) => {}
                        _ = shutdown_rx.changed() => {
                            info!("탐색 중 종료 신호 수신");
                            return;
                        }
                    }
                }
                None => warn!("시작 탐색이 설정되었지만 서브넷 목록이 없음"),
            }
        }

        let mut interval = tokio::time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            if *shutdown_rx.borrow() {
                break;
            }
            tokio::select! {
                _ = interval.tick() => {
                    tokio::select! {
                        result = self.collector.collect() => {
                            if let Err(e) = result {
                                warn!("메트릭 수집 실패: {e}");
                            }
                        }
                        _ = shutdown_rx.changed() => {
                            info!("수집 중 종료 신호 수신, 진행 중인 조회 중단");
                            break;
                        }
                    }
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("스케줄러 종료");
    }
}
