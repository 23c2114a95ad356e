//! 애플리케이션 설정 구조체.
//!
//! SNMP 접속, 탐색, 수집 주기, 저장소 경로, 웹 API, 리포트 기간 등
//! 런타임 설정을 정의한다. 각 컴포넌트는 전역 상태 대신 필요한 섹션을 명시적으로 받는다.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::CoreError;

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// SNMP 접속 설정
    #[serde(default)]
    pub snmp: SnmpConfig,
    /// 탐색 설정
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    /// 수집 루프 설정
    #[serde(default)]
    pub collector: CollectorConfig,
    /// 로컬 저장소 설정
    #[serde(default)]
    pub storage: StorageConfig,
    /// 웹 API 설정
    #[serde(default)]
    pub web: WebConfig,
    /// 리포트 설정
    #[serde(default)]
    pub report: ReportConfig,
}

// ============================================================
// SNMP 설정
// ============================================================

/// SNMP 프로토콜 버전
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnmpVersion {
    #[default]
    V1,
    V2c,
}

/// SNMP 접속 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnmpConfig {
    /// 커뮤니티 문자열
    #[serde(default = "default_community")]
    pub community: String,
    /// 프로토콜 버전
    #[serde(default)]
    pub version: SnmpVersion,
    /// 에이전트 UDP 포트
    #[serde(default = "default_snmp_port")]
    pub port: u16,
    /// OID 하나당 타임아웃 (밀리초)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// 동시 조회 상한 (탐색/수집 공통)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl SnmpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for SnmpConfig {
    fn default() -> Self {
        Self {
            community: default_community(),
            version: SnmpVersion::default(),
            port: default_snmp_port(),
            timeout_ms: default_timeout_ms(),
            concurrency: default_concurrency(),
        }
    }
}

// ============================================================
// 탐색 설정
// ============================================================

/// 탐색 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// 서브넷 목록 파일 (상대 경로는 설정 디렉토리 기준)
    #[serde(default = "default_subnets_file")]
    pub subnets_file: PathBuf,
    /// 위치가 생략된 서브넷의 기본 라벨
    #[serde(default = "default_location")]
    pub default_location: String,
    /// true면 sysDescr에 프린터 키워드가 있어야 등록
    #[serde(default)]
    pub require_printer_keyword: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            subnets_file: default_subnets_file(),
            default_location: default_location(),
            require_printer_keyword: false,
        }
    }
}

// ============================================================
// 수집 설정
// ============================================================

/// 수집 루프 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// 수집 주기 (초)
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// 루프 시작 시 탐색 1회 실행
    #[serde(default)]
    pub discover_on_start: bool,
}

impl CollectorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            discover_on_start: false,
        }
    }
}

/// 로컬 저장소 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite 파일 경로 (None: 플랫폼 데이터 디렉토리)
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

/// 웹 API 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    /// 웹 API 활성화 여부
    #[serde(default = "default_web_enabled")]
    pub enabled: bool,
    /// 웹 서버 포트 (기본: 5000)
    #[serde(default = "default_web_port")]
    pub port: u16,
    /// 외부 접근 허용 여부 (false: 127.0.0.1 only)
    #[serde(default)]
    pub allow_external: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: default_web_enabled(),
            port: default_web_port(),
            allow_external: false,
        }
    }
}

/// 리포트 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// 사용량 요약 기간 목록 (일)
    #[serde(default = "default_usage_periods")]
    pub usage_periods: Vec<u32>,
    /// 토너 부족 판단 임계값 (%)
    #[serde(default = "default_low_toner_threshold")]
    pub low_toner_threshold: u8,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            usage_periods: default_usage_periods(),
            low_toner_threshold: default_low_toner_threshold(),
        }
    }
}

// ============================================================
// 기본값
// ============================================================

fn default_community() -> String {
    "public".to_string()
}

fn default_snmp_port() -> u16 {
    161
}

fn default_timeout_ms() -> u64 {
    2_000
}

fn default_concurrency() -> usize {
    20
}

fn default_subnets_file() -> PathBuf {
    PathBuf::from("subnets.txt")
}

fn default_location() -> String {
    "Auto-discovered".to_string()
}

fn default_poll_interval_secs() -> u64 {
    3_600
}

fn default_web_enabled() -> bool {
    true
}

fn default_web_port() -> u16 {
    5_000
}

fn default_usage_periods() -> Vec<u32> {
    vec![30, 90, 120, 365]
}

fn default_low_toner_threshold() -> u8 {
    20
}

impl AppConfig {
    /// 기본 설정값 반환
    pub fn default_config() -> Self {
        Self::default()
    }

    /// 값 범위 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.snmp.concurrency == 0 {
            return Err(CoreError::Config(
                "snmp.concurrency는 1 이상이어야 합니다".to_string(),
            ));
        }
        if self.snmp.timeout_ms == 0 {
            return Err(CoreError::Config(
                "snmp.timeout_ms는 1 이상이어야 합니다".to_string(),
            ));
        }
        if self.collector.poll_interval_secs == 0 {
            return Err(CoreError::Config(
                "collector.poll_interval_secs는 1 이상이어야 합니다".to_string(),
            ));
        }
        validate_periods(&self.report.usage_periods)?;
        if self.report.low_toner_threshold > 100 {
            return Err(CoreError::Config(
                "report.low_toner_threshold는 0~100 사이여야 합니다".to_string(),
            ));
        }
        Ok(())
    }
}

/// 사용량/이력 조회 기간 상한 (일, 약 100년)
pub const MAX_PERIOD_DAYS: u32 = 36_500;

/// 사용량 기간 목록 검증 (비어 있지 않고 모두 1일 이상, 상한 이하)
pub fn validate_periods(periods: &[u32]) -> Result<(), CoreError> {
    if periods.is_empty() {
        return Err(CoreError::Config("사용량 기간 목록이 비어 있습니다".to_string()));
    }
    if periods.contains(&0) {
        return Err(CoreError::Config("사용량 기간은 1일 이상이어야 합니다".to_string()));
    }
    if let Some(days) = periods.iter().find(|&&d| d > MAX_PERIOD_DAYS) {
        return Err(CoreError::Config(format!(
            "사용량 기간이 너무 깁니다: {days}일 (최대 {MAX_PERIOD_DAYS}일)"
        )));
    }
    Ok(())
}
