//! 배치 실행(탐색/수집) 요약 모델.
//!
//! 배치 작업은 대상 하나의 실패로 중단되지 않고, 대상별 성공/실패를 요약해 반환한다.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::net::Ipv4Addr;

/// 대상별 실패 기록
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetFailure {
    pub ip: Ipv4Addr,
    /// 등록된 프린터인 경우 ID
    pub printer_id: Option<i64>,
    pub error: String,
}

/// 탐색 실행 요약
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiscoveryReport {
    /// 조회한 호스트 수
    pub scanned: usize,
    /// sysDescr에 응답한 호스트 수
    pub responded: usize,
    /// 응답했지만 프린터 키워드가 없어 제외된 호스트 수
    pub skipped_non_printers: usize,
    /// 신규 등록된 프린터 ID
    pub inserted: Vec<i64>,
    /// 위치/모델이 갱신된 프린터 ID
    pub updated: Vec<i64>,
    /// 변경 없는 기존 프린터 수
    pub unchanged: usize,
    /// 저장 실패 등 대상별 실패
    pub failures: Vec<TargetFailure>,
}

/// 수집 실행 요약
#[derive(Debug, Clone, Serialize)]
pub struct CollectionReport {
    /// 이 실행의 모든 측정값이 공유하는 폴링 시각
    pub polled_at: DateTime<Utc>,
    /// 대상 프린터 수
    pub targets: usize,
    /// 온라인 측정값 기록 수
    pub online: usize,
    /// 오프라인 측정값 기록 수
    pub offline: usize,
    /// 저장 실패 등 대상별 실패
    pub failures: Vec<TargetFailure>,
}

impl CollectionReport {
    pub fn new(polled_at: DateTime<Utc>, targets: usize) -> Self {
        Self {
            polled_at,
            targets,
            online: 0,
            offline: 0,
            failures: Vec::new(),
        }
    }

    /// 기록된 측정값 수
    pub fn written(&self) -> usize {
        self.online + self.offline
    }
}
