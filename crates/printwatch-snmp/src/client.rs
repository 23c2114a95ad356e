//! async-snmp 기반 `SnmpProbe` 구현.
//!
//! 조회마다 UDP 클라이언트를 새로 만들고 GET 한 번으로 끝낸다.
//! 재시도는 하지 않는다. 실패는 다음 폴링 주기에 다시 시도된다.

use async_snmp::client::Retry;
use async_snmp::{Auth, Client, ErrorStatus, Oid, Value};
use async_trait::async_trait;
use printwatch_core::config::{SnmpConfig, SnmpVersion};
use printwatch_core::ports::snmp::{ProbeFailure, SnmpProbe, SnmpValue};
use std::net::Ipv4Addr;
use std::time::Duration;
use tracing::{debug, warn};

/// UDP SNMP 조회기
#[derive(Debug, Clone)]
pub struct AsyncSnmpProbe {
    community: String,
    version: SnmpVersion,
    port: u16,
}

impl AsyncSnmpProbe {
    pub fn new(community: impl Into<String>, version: SnmpVersion, port: u16) -> Self {
        Self {
            community: community.into(),
            version,
            port,
        }
    }

    /// SNMP 설정 섹션에서 생성
    pub fn from_config(config: &SnmpConfig) -> Self {
        Self::new(config.community.clone(), config.version, config.port)
    }

    fn auth(&self) -> Auth {
        match self.version {
            SnmpVersion::V1 => Auth::v1(self.community.clone()),
            SnmpVersion::V2c => Auth::v2c(self.community.clone()),
        }
    }

    async fn get(
        &self,
        address: Ipv4Addr,
        oid: &Oid,
        timeout: Duration,
    ) -> async_snmp::Result<Value> {
        let client = Client::builder(format!("{address}:{}", self.port), self.auth())
            .timeout(timeout)
            .retry(Retry::none())
            .connect()
            .await?;
        Ok(client.get(oid).await?.value)
    }
}

#[async_trait]
impl SnmpProbe for AsyncSnmpProbe {
    async fn probe(
        &self,
        address: Ipv4Addr,
        oid: &str,
        timeout: Duration,
    ) -> Result<SnmpValue, ProbeFailure> {
        let parsed = match Oid::parse(oid) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("잘못된 OID {oid}: {e}");
                return Err(ProbeFailure::NoSuchObject);
            }
        };

        // connect 단계까지 포함한 전체 상한
        let outcome = tokio::time::timeout(timeout, self.get(address, &parsed, timeout)).await;
        match outcome {
            Ok(Ok(value)) => convert_value(value),
            Ok(Err(e)) => {
                debug!("SNMP 조회 실패 {address} {oid}: {e}");
                Err(classify_error(&e))
            }
            Err(_) => {
                debug!("SNMP 조회 시간 초과 {address} {oid}");
                Err(ProbeFailure::Timeout)
            }
        }
    }
}

/// 응답 값 → 도메인 값. 예외 값(noSuchObject 등)은 미지원으로 본다.
pub(crate) fn convert_value(value: Value) -> Result<SnmpValue, ProbeFailure> {
    match value {
        Value::Integer(v) => Ok(SnmpValue::Integer(i64::from(v))),
        Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => {
            Ok(SnmpValue::Counter(u64::from(v)))
        }
        Value::Counter64(v) => Ok(SnmpValue::Counter(v)),
        Value::OctetString(bytes) | Value::Opaque(bytes) => {
            Ok(SnmpValue::OctetString(bytes.to_vec()))
        }
        Value::IpAddress(octets) => Ok(SnmpValue::OctetString(
            Ipv4Addr::from(octets).to_string().into_bytes(),
        )),
        Value::ObjectIdentifier(oid) => Ok(SnmpValue::OctetString(oid.to_string().into_bytes())),
        _ => Err(ProbeFailure::NoSuchObject),
    }
}

/// 에이전트가 응답은 했는지(미지원) 아니면 응답이 없었는지(타임아웃) 구분
pub(crate) fn classify_error(err: &async_snmp::Error) -> ProbeFailure {
    match err {
        async_snmp::Error::Snmp {
            status: ErrorStatus::NoSuchName,
            ..
        } => ProbeFailure::NoSuchObject,
        async_snmp::Error::Snmp { .. } | async_snmp::Error::MalformedResponse { .. } => {
            ProbeFailure::NoSuchObject
        }
        _ => ProbeFailure::Timeout,
    }
}
