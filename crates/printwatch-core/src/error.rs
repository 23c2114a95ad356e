//! PrintWatch 핵심 에러 타입.
//!
//! 어댑터 crate는 자체 실패를 `CoreError` 변형으로 매핑해 포트 경계를 넘긴다.

use thiserror::Error;

/// 코어 레이어 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정값 오류 (설정 파일 파싱, 범위 위반 등)
    #[error("설정 에러: {0}")]
    Config(String),

    /// 서브넷 설정 파일의 특정 줄이 잘못됨
    #[error("서브넷 설정 {line}번째 줄 오류 ({value:?}): {reason}")]
    SubnetLine {
        /// 1부터 시작하는 줄 번호
        line: usize,
        /// 문제가 된 원문
        value: String,
        /// 실패 사유
        reason: String,
    },

    /// 필드 유효성 검증 실패
    #[error("유효성 검증 실패: {field}: {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// 리소스를 찾을 수 없음
    #[error("{resource_type} 미발견: {id}")]
    NotFound {
        /// 리소스 종류 (예: "Printer")
        resource_type: String,
        /// 리소스 식별자
        id: String,
    },

    /// 저장소 쓰기 충돌 (유니크 제약 위반 등)
    #[error("쓰기 충돌: {0}")]
    Conflict(String),

    /// 저장소 에러 (디스크, SQLite 내부 실패)
    #[error("저장소 에러: {0}")]
    Storage(String),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// 프린터 미발견 에러 생성
    pub fn printer_not_found(id: i64) -> Self {
        CoreError::NotFound {
            resource_type: "Printer".to_string(),
            id: id.to_string(),
        }
    }
}
