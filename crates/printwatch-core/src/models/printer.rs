//! 프린터 레지스트리 모델.
//!
//! 탐색 엔진이 최초 응답 시 생성하며, 이후에는 위치/모델 메타데이터만 갱신된다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// 벤더 프로파일 태그
///
/// 탐색 시 한 번 결정되어 프린터 레코드에 캐시된다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VendorTag {
    Brother,
    Samsung,
    Hp,
    Canon,
    Epson,
    Xerox,
    Ricoh,
    Lexmark,
    Kyocera,
    Sharp,
    Konica,
    Oki,
    Toshiba,
    Dell,
    /// 알 수 없는 장치 (페이지 카운터만 조회)
    Generic,
}

impl VendorTag {
    /// 전체 태그 목록 (Generic 제외)
    pub const KNOWN: [VendorTag; 14] = [
        VendorTag::Brother,
        VendorTag::Samsung,
        VendorTag::Hp,
        VendorTag::Canon,
        VendorTag::Epson,
        VendorTag::Xerox,
        VendorTag::Ricoh,
        VendorTag::Lexmark,
        VendorTag::Kyocera,
        VendorTag::Sharp,
        VendorTag::Konica,
        VendorTag::Oki,
        VendorTag::Toshiba,
        VendorTag::Dell,
    ];

    /// 저장용 문자열
    pub fn as_str(&self) -> &'static str {
        match self {
            VendorTag::Brother => "brother",
            VendorTag::Samsung => "samsung",
            VendorTag::Hp => "hp",
            VendorTag::Canon => "canon",
            VendorTag::Epson => "epson",
            VendorTag::Xerox => "xerox",
            VendorTag::Ricoh => "ricoh",
            VendorTag::Lexmark => "lexmark",
            VendorTag::Kyocera => "kyocera",
            VendorTag::Sharp => "sharp",
            VendorTag::Konica => "konica",
            VendorTag::Oki => "oki",
            VendorTag::Toshiba => "toshiba",
            VendorTag::Dell => "dell",
            VendorTag::Generic => "generic",
        }
    }
}

impl fmt::Display for VendorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VendorTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "generic" {
            return Ok(VendorTag::Generic);
        }
        VendorTag::KNOWN
            .iter()
            .copied()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| format!("알 수 없는 벤더 태그: {s}"))
    }
}

/// 등록된 프린터
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Printer {
    /// 고유 ID
    pub id: i64,
    /// 표시 이름 (최초 등록 후 탐색으로 변경되지 않음)
    pub name: String,
    /// IP 주소 (유니크)
    pub ip: Ipv4Addr,
    /// 위치 라벨
    pub location: String,
    /// 모델명
    pub model: Option<String>,
    /// 캐시된 벤더 프로파일 태그
    pub vendor: VendorTag,
    /// 등록 시각
    pub created_at: DateTime<Utc>,
}

/// 탐색 엔진이 만든 등록 후보
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrinterCandidate {
    pub ip: Ipv4Addr,
    /// 신규 등록 시에만 사용되는 기본 이름
    pub name: String,
    pub location: String,
    pub model: Option<String>,
    pub vendor: VendorTag,
}

impl PrinterCandidate {
    /// 기본 이름 결정: sysName → 모델명 → `Printer-{ip}`
    pub fn default_name(ip: Ipv4Addr, sys_name: Option<&str>, model: Option<&str>) -> String {
        sys_name
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .or_else(|| model.map(str::trim).filter(|s| !s.is_empty()))
            .map(str::to_string)
            .unwrap_or_else(|| format!("Printer-{ip}"))
    }
}

/// 업서트 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// 새 레코드 생성
    Inserted(Printer),
    /// 기존 레코드의 위치/모델 갱신
    Updated(Printer),
    /// 기존 레코드와 동일 (변경 없음)
    Unchanged(Printer),
}

impl UpsertOutcome {
    /// 결과와 무관하게 최종 프린터 레코드
    pub fn printer(&self) -> &Printer {
        match self {
            UpsertOutcome::Inserted(p) | UpsertOutcome::Updated(p) | UpsertOutcome::Unchanged(p) => p,
        }
    }
}

/// 프린터 목록 필터
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PrinterFilter {
    /// 위치 정확히 일치
    pub location: Option<String>,
    /// 모델 정확히 일치
    pub model: Option<String>,
}

impl PrinterFilter {
    /// 빈 문자열은 필터 없음으로 취급
    pub fn normalized(self) -> Self {
        Self {
            location: self.location.filter(|s| !s.trim().is_empty()),
            model: self.model.filter(|s| !s.trim().is_empty()),
        }
    }
}
