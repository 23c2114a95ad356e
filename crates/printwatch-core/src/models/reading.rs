//! 메트릭 측정값 모델.
//!
//! 프린터별, 폴링 주기별로 한 행씩 추가되는 append-only 시계열.
//! 한 번 기록된 측정값은 수정되지 않는다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 소모품 잔량
///
/// 벤더가 백분율을 제공하지 않으면 상태값만 남는다.
/// `Unknown`은 0%와 구별되는 "조회 불가" 표시다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Level {
    /// 0~100 백분율
    Percent(u8),
    /// 잔량 충분 (수치 미보고)
    Ok,
    /// 잔량 부족
    Low,
    /// 조회 불가
    Unknown,
}

impl Level {
    /// 백분율 값 (있는 경우)
    pub fn percent(&self) -> Option<u8> {
        match self {
            Level::Percent(p) => Some(*p),
            _ => None,
        }
    }

    /// 임계값 미만이거나 LOW 상태인지
    pub fn is_low(&self, threshold_pct: u8) -> bool {
        match self {
            Level::Percent(p) => *p < threshold_pct,
            Level::Low => true,
            Level::Ok | Level::Unknown => false,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Level::Unknown)
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::Percent(p) => write!(f, "{p}%"),
            Level::Ok => f.write_str("OK"),
            Level::Low => f.write_str("LOW"),
            Level::Unknown => f.write_str("UNKNOWN"),
        }
    }
}

/// hrDeviceStatus (HOST-RESOURCES-MIB)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    Unknown,
    Running,
    Warning,
    Testing,
    Down,
}

impl DeviceStatus {
    /// MIB 정수 코드 → 상태 (1~5 이외는 None)
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(DeviceStatus::Unknown),
            2 => Some(DeviceStatus::Running),
            3 => Some(DeviceStatus::Warning),
            4 => Some(DeviceStatus::Testing),
            5 => Some(DeviceStatus::Down),
            _ => None,
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            DeviceStatus::Unknown => 1,
            DeviceStatus::Running => 2,
            DeviceStatus::Warning => 3,
            DeviceStatus::Testing => 4,
            DeviceStatus::Down => 5,
        }
    }
}

/// 저장된 메트릭 측정값
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricReading {
    pub id: i64,
    pub printer_id: i64,
    /// 폴링 주기 시각 (같은 수집 실행의 모든 행이 공유)
    pub polled_at: DateTime<Utc>,
    /// 누적 페이지 카운터 (None = UNKNOWN)
    pub page_count: Option<u64>,
    /// 토너 잔량
    pub toner: Level,
    /// 드럼 잔량 (백분율 또는 UNKNOWN)
    pub drum: Level,
    /// 응답 여부
    pub online: bool,
    /// 장치 상태
    pub device_status: Option<DeviceStatus>,
}

/// 저장 전 측정값 (정규화 완료)
#[derive(Debug, Clone, PartialEq)]
pub struct NewReading {
    pub printer_id: i64,
    pub polled_at: DateTime<Utc>,
    pub page_count: Option<u64>,
    pub toner: Level,
    pub drum: Level,
    pub online: bool,
    pub device_status: Option<DeviceStatus>,
}

impl NewReading {
    /// 완전 무응답 장치의 오프라인 측정값
    pub fn offline(printer_id: i64, polled_at: DateTime<Utc>) -> Self {
        Self {
            printer_id,
            polled_at,
            page_count: None,
            toner: Level::Unknown,
            drum: Level::Unknown,
            online: false,
            device_status: None,
        }
    }
}
