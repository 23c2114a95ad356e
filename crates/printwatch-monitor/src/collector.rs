//! 메트릭 수집기.
//!
//! 등록된 모든 프린터를 동시에 읽어 주기당 한 행씩 기록한다.
//! 한 실행의 모든 행은 같은 폴링 시각을 공유한다.
//! 도달 불가 장치도 오프라인 행을 남긴다 ("확인했고 꺼져 있었음"과 "확인 안 함"은 다르다).

use chrono::{DateTime, Utc};
use printwatch_core::config::AppConfig;
use printwatch_core::error::CoreError;
use printwatch_core::models::printer::{Printer, PrinterFilter};
use printwatch_core::models::reading::NewReading;
use printwatch_core::models::run::{CollectionReport, TargetFailure};
use printwatch_core::ports::storage::{MetricHistory, PrinterRegistry};
use printwatch_core::vendor;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::normalize;
use crate::pool::WorkerPool;
use crate::reader::{ReadOutcome, SnmpReader};

/// 수집 실행 설정
#[derive(Debug, Clone)]
pub struct CollectorSettings {
    pub timeout: Duration,
    pub concurrency: usize,
}

impl CollectorSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            timeout: config.snmp.timeout(),
            concurrency: config.snmp.concurrency,
        }
    }
}

/// 프린터 하나의 기록 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Polled {
    Online,
    Offline,
}

struct PollContext {
    reader: SnmpReader,
    registry: Arc<dyn PrinterRegistry>,
    history: Arc<dyn MetricHistory>,
    timeout: Duration,
    polled_at: DateTime<Utc>,
}

/// 메트릭 수집기
pub struct MetricsCollector {
    reader: SnmpReader,
    registry: Arc<dyn PrinterRegistry>,
    history: Arc<dyn MetricHistory>,
    settings: CollectorSettings,
}

impl MetricsCollector {
    pub fn new(
        reader: SnmpReader,
        registry: Arc<dyn PrinterRegistry>,
        history: Arc<dyn MetricHistory>,
        settings: CollectorSettings,
    ) -> Self {
        Self {
            reader,
            registry,
            history,
            settings,
        }
    }

    /// 현재 시각으로 1회 수집
    pub async fn collect(&self) -> Result<CollectionReport, CoreError> {
        self.collect_at(Utc::now()).await
    }

    /// 지정한 폴링 시각으로 1회 수집
    ///
    /// 레지스트리 조회 실패만 에러로 반환한다. 프린터별 실패는 요약에 담긴다.
    pub async fn collect_at(&self, polled_at: DateTime<Utc>) -> Result<CollectionReport, CoreError> {
        let printers = self.registry.list_printers(&PrinterFilter::default()).await?;
        let mut report = CollectionReport::new(polled_at, printers.len());
        if printers.is_empty() {
            info!("수집 대상 프린터 없음");
            return Ok(report);
        }

        info!(
            "메트릭 수집 시작: 프린터 {}대 (동시 {})",
            printers.len(),
            self.settings.concurrency
        );

        let ctx = Arc::new(PollContext {
            reader: self.reader.clone(),
            registry: Arc::clone(&self.registry),
            history: Arc::clone(&self.history),
            timeout: self.settings.timeout,
            polled_at,
        });

        let outcomes = WorkerPool::new(self.settings.concurrency)
            .run(printers.clone(), move |printer| {
                let ctx = Arc::clone(&ctx);
                async move { poll_printer(&ctx, printer).await }
            })
            .await;

        for (printer, outcome) in printers.iter().zip(outcomes) {
            match outcome {
                Some(Ok(Polled::Online)) => report.online += 1,
                Some(Ok(Polled::Offline)) => report.offline += 1,
                Some(Err(e)) => {
                    warn!("측정값 기록 실패 {} ({}): {e}", printer.name, printer.ip);
                    report.failures.push(TargetFailure {
                        ip: printer.ip,
                        printer_id: Some(printer.id),
                        error: e.to_string(),
                    });
                }
                None => report.failures.push(TargetFailure {
                    ip: printer.ip,
                    printer_id: Some(printer.id),
                    error: "수집 태스크 비정상 종료".to_string(),
                }),
            }
        }

        info!(
            "메트릭 수집 완료: 온라인 {}, 오프라인 {}, 실패 {}",
            report.online,
            report.offline,
            report.failures.len()
        );
        Ok(report)
    }
}

/// 읽기 → 정규화 → 기록. 정규화가 끝난 행만 기록된다.
async fn poll_printer(ctx: &PollContext, printer: Printer) -> Result<Polled, CoreError> {
    let profile = vendor::profile_for(printer.vendor);
    let outcome = ctx
        .reader
        .read(printer.ip, profile.bindings, ctx.timeout)
        .await;

    let values = match outcome {
        ReadOutcome::Unreachable => {
            debug!("{} ({}) 오프라인", printer.name, printer.ip);
            ctx.history
                .append_reading(&NewReading::offline(printer.id, ctx.polled_at))
                .await?;
            return Ok(Polled::Offline);
        }
        ReadOutcome::Partial(values) => values,
    };

    if !values.failed.is_empty() {
        debug!(
            "{} ({}) 일부 OID 실패: {:?}",
            printer.name, printer.ip, values.failed
        );
    }

    let reading = normalize::normalize(printer.id, ctx.polled_at, &values);
    ctx.history.append_reading(&reading).await?;

    if printer.model.is_none() {
        if let Some(model) = normalize::model(&values) {
            // 메타데이터 보강 실패는 측정값 기록에 영향 없음
            if let Err(e) = ctx.registry.update_model(printer.id, model).await {
                warn!("모델명 갱신 실패 {}: {e}", printer.ip);
            }
        }
    }

    Ok(Polled::Online)
}
