//! 프린터 전체 현황 조회.
//!
//! 레지스트리와 측정값 이력을 합쳐 대시보드/콘솔 리포트가 공통으로 쓰는 뷰를 만든다.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::error::CoreError;
use crate::models::printer::{Printer, PrinterFilter};
use crate::models::reading::MetricReading;
use crate::models::usage::UsagePeriodResult;
use crate::ports::storage::{MetricHistory, PrinterRegistry};
use crate::usage;

/// 프린터 + 최신 측정값
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrinterStatus {
    #[serde(flatten)]
    pub printer: Printer,
    /// 아직 한 번도 수집되지 않았으면 None
    pub latest: Option<MetricReading>,
}

impl PrinterStatus {
    pub fn is_online(&self) -> bool {
        self.latest.as_ref().is_some_and(|r| r.online)
    }

    pub fn is_toner_low(&self, threshold_pct: u8) -> bool {
        self.latest
            .as_ref()
            .is_some_and(|r| r.toner.is_low(threshold_pct))
    }
}

/// 프린터별 기간 사용량
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrinterUsage {
    #[serde(flatten)]
    pub printer: Printer,
    pub periods: Vec<UsagePeriodResult>,
}

/// 필터 조건의 프린터와 각자의 최신 측정값
pub async fn fleet_status(
    registry: &dyn PrinterRegistry,
    history: &dyn MetricHistory,
    filter: &PrinterFilter,
) -> Result<Vec<PrinterStatus>, CoreError> {
    let printers = registry.list_printers(filter).await?;
    let mut latest: HashMap<i64, MetricReading> = history
        .latest_readings()
        .await?
        .into_iter()
        .map(|r| (r.printer_id, r))
        .collect();

    Ok(printers
        .into_iter()
        .map(|printer| PrinterStatus {
            latest: latest.remove(&printer.id),
            printer,
        })
        .collect())
}

/// 필터 조건의 프린터별 사용량 (기간 순서 유지)
pub async fn fleet_usage(
    registry: &dyn PrinterRegistry,
    history: &dyn MetricHistory,
    filter: &PrinterFilter,
    periods: &[u32],
    now: DateTime<Utc>,
) -> Result<Vec<PrinterUsage>, CoreError> {
    let printers = registry.list_printers(filter).await?;
    let mut rows = Vec::with_capacity(printers.len());
    for printer in printers {
        let periods = usage::usage_for_periods(history, printer.id, periods, now).await?;
        rows.push(PrinterUsage { printer, periods });
    }
    Ok(rows)
}
