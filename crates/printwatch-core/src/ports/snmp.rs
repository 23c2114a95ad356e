//! SNMP 조회 포트.
//!
//! 전송 계층은 외부 기능으로 취급한다. 단일 OID 조회는 값, 타임아웃,
//! no-such-object 중 하나로만 끝난다. 구현: `printwatch-snmp`.

use async_trait::async_trait;
use std::net::Ipv4Addr;
use std::time::Duration;
use thiserror::Error;

/// SNMP 원시 값
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnmpValue {
    /// INTEGER
    Integer(i64),
    /// Counter32/Gauge32/Counter64/TimeTicks
    Counter(u64),
    /// OCTET STRING (비트 플래그 포함)
    OctetString(Vec<u8>),
}

impl SnmpValue {
    /// 문자열 값 (UTF-8 손실 변환, 앞뒤 공백/NUL 제거)
    pub fn as_text(&self) -> Option<String> {
        match self {
            SnmpValue::OctetString(bytes) => {
                let text = String::from_utf8_lossy(bytes);
                let trimmed = text.trim_matches(|c: char| c.is_whitespace() || c == '\0');
                Some(trimmed.to_string())
            }
            _ => None,
        }
    }

    /// 정수 해석 (숫자 문자열도 허용)
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SnmpValue::Integer(v) => Some(*v),
            SnmpValue::Counter(v) => i64::try_from(*v).ok(),
            SnmpValue::OctetString(_) => self.as_text()?.parse().ok(),
        }
    }
}

/// 단일 OID 조회 실패
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProbeFailure {
    /// 제한 시간 내 응답 없음 (네트워크 도달 불가 포함)
    #[error("응답 시간 초과")]
    Timeout,
    /// 장치는 응답했지만 해당 OID 미지원
    #[error("OID 미지원")]
    NoSuchObject,
}

/// SNMP 단일 OID 조회
#[async_trait]
pub trait SnmpProbe: Send + Sync {
    /// `address`의 `oid` 값을 `timeout` 안에 조회한다. 재시도는 하지 않는다.
    async fn probe(
        &self,
        address: Ipv4Addr,
        oid: &str,
        timeout: Duration,
    ) -> Result<SnmpValue, ProbeFailure>;
}
