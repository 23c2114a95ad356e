//! 저장소 포트.
//!
//! 구현: `printwatch-storage` crate (rusqlite)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::net::Ipv4Addr;

use crate::error::CoreError;
use crate::models::printer::{Printer, PrinterCandidate, PrinterFilter, UpsertOutcome};
use crate::models::reading::{MetricReading, NewReading};

/// 프린터 레지스트리
#[async_trait]
pub trait PrinterRegistry: Send + Sync {
    // ============================================================
    // 등록/갱신
    // ============================================================

    /// 탐색 결과 업서트 (IP 기준, 트랜잭션)
    ///
    /// 기존 레코드가 있으면 위치/모델만 갱신하고 ID와 이름은 유지한다.
    /// 후보의 모델이 None이면 기존 모델을 지우지 않는다.
    async fn upsert_discovered(
        &self,
        candidate: &PrinterCandidate,
    ) -> Result<UpsertOutcome, CoreError>;

    /// 위치 라벨 변경
    async fn update_location(&self, id: i64, location: &str) -> Result<Printer, CoreError>;

    /// 모델명 설정
    async fn update_model(&self, id: i64, model: &str) -> Result<Printer, CoreError>;

    /// 프린터 삭제 (측정값 이력까지 함께 삭제). 존재했으면 true.
    async fn delete_printer(&self, id: i64) -> Result<bool, CoreError>;

    // ============================================================
    // 조회
    // ============================================================

    async fn get_printer(&self, id: i64) -> Result<Option<Printer>, CoreError>;

    async fn find_by_ip(&self, ip: Ipv4Addr) -> Result<Option<Printer>, CoreError>;

    /// 필터 조건의 프린터 목록 (위치, 이름 순)
    async fn list_printers(&self, filter: &PrinterFilter) -> Result<Vec<Printer>, CoreError>;

    /// 등록된 위치 목록 (중복 제거, 정렬)
    async fn list_locations(&self) -> Result<Vec<String>, CoreError>;

    /// 등록된 모델 목록 (중복 제거, 정렬)
    async fn list_models(&self) -> Result<Vec<String>, CoreError>;
}

/// 메트릭 이력 (append-only)
#[async_trait]
pub trait MetricHistory: Send + Sync {
    /// 측정값 추가. 같은 프린터/폴링 시각 중복은 `CoreError::Conflict`.
    async fn append_reading(&self, reading: &NewReading) -> Result<MetricReading, CoreError>;

    /// `[from, to]` 범위 측정값 (시각 오름차순)
    async fn list_readings(
        &self,
        printer_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<MetricReading>, CoreError>;

    /// 프린터의 최신 측정값
    async fn latest_reading(&self, printer_id: i64) -> Result<Option<MetricReading>, CoreError>;

    /// 전체 프린터의 최신 측정값 (프린터당 1개)
    async fn latest_readings(&self) -> Result<Vec<MetricReading>, CoreError>;
}
