//! 서브넷 설정.
//!
//! 사용자가 편집하는 텍스트 파일 형식:
//!
//! ```text
//! # 주석
//! 192.168.1.0/24,본관 3층
//! 10.0.5.0/28
//! ```
//!
//! 위치를 생략하면 기본 위치 라벨을 쓴다. 잘못된 줄이 하나라도 있으면
//! 줄 번호와 원문을 담은 설정 에러로 전체 파싱이 실패한다.

use serde::Serialize;
use std::fmt;
use std::net::Ipv4Addr;
use std::path::Path;
use tracing::info;

use crate::error::CoreError;

/// 허용하는 가장 넓은 프리픽스 (/16 = 65,534 호스트)
pub const MIN_PREFIX: u8 = 16;

/// 서브넷 한 항목
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubnetEntry {
    /// 네트워크 주소 (호스트 비트 제거됨)
    pub network: Ipv4Addr,
    pub prefix: u8,
    pub location: String,
}

impl SubnetEntry {
    /// `a.b.c.d/n` 파싱. 호스트 비트는 마스킹한다.
    pub fn parse_cidr(cidr: &str) -> Result<(Ipv4Addr, u8), String> {
        let (addr, prefix) = match cidr.split_once('/') {
            Some((addr, prefix)) => (addr.trim(), prefix.trim()),
            None => (cidr.trim(), "32"),
        };
        let addr: Ipv4Addr = addr
            .parse()
            .map_err(|_| format!("IPv4 주소가 아님: {addr}"))?;
        let prefix: u8 = prefix
            .parse()
            .map_err(|_| format!("프리픽스가 숫자가 아님: {prefix}"))?;
        if prefix > 32 {
            return Err(format!("프리픽스 범위 초과: /{prefix}"));
        }
        if prefix < MIN_PREFIX {
            return Err(format!("서브넷이 너무 큼: /{prefix} (최소 /{MIN_PREFIX})"));
        }
        Ok((Ipv4Addr::from(u32::from(addr) & mask(prefix)), prefix))
    }

    /// 조회 대상 호스트 주소
    ///
    /// /30 이하는 네트워크/브로드캐스트 주소를 제외하고, /31은 두 주소 모두,
    /// /32는 단일 주소.
    pub fn hosts(&self) -> impl Iterator<Item = Ipv4Addr> {
        let base = u32::from(self.network);
        let size = 1u64 << (32 - u32::from(self.prefix));
        let (start, end) = if self.prefix >= 31 {
            (0, size)
        } else {
            (1, size - 1)
        };
        (start..end).map(move |offset| Ipv4Addr::from(base + offset as u32))
    }

    pub fn host_count(&self) -> usize {
        match self.prefix {
            32 => 1,
            31 => 2,
            p => (1usize << (32 - u32::from(p))) - 2,
        }
    }
}

impl fmt::Display for SubnetEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}

fn mask(prefix: u8) -> u32 {
    if prefix == 0 {
        0
    } else {
        u32::MAX << (32 - u32::from(prefix))
    }
}

/// 서브넷 설정 텍스트 파싱
pub fn parse_subnets(text: &str, default_location: &str) -> Result<Vec<SubnetEntry>, CoreError> {
    let mut entries = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (cidr, location) = match line.split_once(',') {
            Some((cidr, location)) => (cidr.trim(), location.trim()),
            None => (line, ""),
        };
        let (network, prefix) =
            SubnetEntry::parse_cidr(cidr).map_err(|reason| CoreError::SubnetLine {
                line: idx + 1,
                value: raw.to_string(),
                reason,
            })?;

        let location = if location.is_empty() {
            default_location.to_string()
        } else {
            location.to_string()
        };
        entries.push(SubnetEntry {
            network,
            prefix,
            location,
        });
    }
    Ok(entries)
}

/// 파일에서 서브넷 설정 로드
pub fn load_subnets(path: &Path, default_location: &str) -> Result<Vec<SubnetEntry>, CoreError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        CoreError::Config(format!("서브넷 파일 읽기 실패: {}: {e}", path.display()))
    })?;
    parse_subnets(&text, default_location)
}

/// 첫 실행 시 생성하는 서브넷 파일 예시 (전부 주석이라 대상 0개)
const SAMPLE_SUBNETS: &str = "\
# 프린터를 탐색할 서브넷 목록
# 형식: 서브넷(CIDR),위치
# 위치를 생략하면 설정의 discovery.default_location을 쓴다
# '#'으로 시작하는 줄은 주석
#
# 예시:
# 10.164.1.0/24,본관
# 10.164.2.0/24,북부 지점
# 192.168.1.0/24
#
# 아래에 서브넷을 추가하세요:
";

/// 서브넷 파일 로드. 파일이 없으면 예시 파일을 만든다.
///
/// 새로 만든 예시는 주석뿐이므로 빈 목록을 반환한다.
pub fn load_or_create_subnets(
    path: &Path,
    default_location: &str,
) -> Result<Vec<SubnetEntry>, CoreError> {
    if path.exists() {
        return load_subnets(path, default_location);
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CoreError::Config(format!("서브넷 디렉토리 생성 실패: {}: {e}", parent.display()))
            })?;
        }
    }
    std::fs::write(path, SAMPLE_SUBNETS).map_err(|e| {
        CoreError::Config(format!("서브넷 예시 파일 생성 실패: {}: {e}", path.display()))
    })?;
    info!("서브넷 예시 파일 생성: {}", path.display());
    parse_subnets(SAMPLE_SUBNETS, default_location)
}
