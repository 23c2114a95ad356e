//! 원시 값 → 정규화된 측정값.
//!
//! 토너 우선순위: 벤더 백분율 → 잔량/최대 용량 백분율 → 에러 상태 비트의 LOW
//! → 잔량 -3의 OK → UNKNOWN. 드럼은 백분율 아니면 UNKNOWN.

use chrono::{DateTime, Utc};
use printwatch_core::models::reading::{DeviceStatus, Level, NewReading};
use printwatch_core::vendor::{MetricField, ParsedValue, SupplyLevel};

use crate::reader::DeviceValues;

/// 응답한 장치의 값으로 온라인 측정값 생성
pub fn normalize(printer_id: i64, polled_at: DateTime<Utc>, values: &DeviceValues) -> NewReading {
    NewReading {
        printer_id,
        polled_at,
        page_count: page_count(values),
        toner: toner_level(values),
        drum: drum_level(values),
        online: true,
        device_status: device_status(values),
    }
}

pub fn page_count(values: &DeviceValues) -> Option<u64> {
    match values.get(MetricField::PageCount) {
        Some(ParsedValue::Count(v)) => Some(*v),
        _ => None,
    }
}

pub fn device_status(values: &DeviceValues) -> Option<DeviceStatus> {
    match values.get(MetricField::DeviceStatus) {
        Some(ParsedValue::Status(s)) => Some(*s),
        _ => None,
    }
}

/// 장치가 보고한 모델명
pub fn model(values: &DeviceValues) -> Option<&str> {
    match values.get(MetricField::Model) {
        Some(ParsedValue::Text(t)) => Some(t.as_str()),
        _ => None,
    }
}

pub fn toner_level(values: &DeviceValues) -> Level {
    if let Some(ParsedValue::Percent(p)) = values.get(MetricField::TonerPercent) {
        return Level::Percent(*p);
    }

    let supply = supply(values, MetricField::TonerLevel);
    if let Some(pct) = supply_percent(supply, capacity(values, MetricField::TonerMax)) {
        return Level::Percent(pct);
    }

    if let Some(ParsedValue::Flags(flags)) = values.get(MetricField::ErrorState) {
        if flags.low_toner || flags.no_toner {
            return Level::Low;
        }
    }

    match supply {
        Some(SupplyLevel::SomeRemaining) => Level::Ok,
        _ => Level::Unknown,
    }
}

pub fn drum_level(values: &DeviceValues) -> Level {
    supply_percent(
        supply(values, MetricField::DrumLevel),
        capacity(values, MetricField::DrumMax),
    )
    .map(Level::Percent)
    .unwrap_or(Level::Unknown)
}

/// 잔량/최대 용량 → 0~100 백분율 (최대 용량을 모르면 None)
pub fn supply_percent(level: Option<SupplyLevel>, max: Option<u64>) -> Option<u8> {
    match (level, max) {
        (Some(SupplyLevel::Units(units)), Some(max)) if max > 0 => {
            let pct = units.saturating_mul(100) / max;
            Some(pct.min(100) as u8)
        }
        _ => None,
    }
}

fn supply(values: &DeviceValues, field: MetricField) -> Option<SupplyLevel> {
    match values.get(field) {
        Some(ParsedValue::Supply(s)) => Some(*s),
        _ => None,
    }
}

fn capacity(values: &DeviceValues, field: MetricField) -> Option<u64> {
    match values.get(field) {
        Some(ParsedValue::Capacity(c)) => Some(*c),
        _ => None,
    }
}
