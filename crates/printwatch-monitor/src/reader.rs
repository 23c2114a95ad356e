//! SNMP 리더.
//!
//! 프로파일의 OID 묶음을 장치 하나에 대해 순서대로 조회한다. OID마다 독립적으로
//! 실패를 기록하며, 모든 OID가 타임아웃일 때만 장치 도달 불가로 본다.
//! 일부 벤더는 토너/드럼 OID를 에러 없이 빠뜨리므로 이 구분이 온라인 판정을 결정한다.

use printwatch_core::ports::snmp::{ProbeFailure, SnmpProbe};
use printwatch_core::vendor::{MetricField, OidBinding, ParsedValue};
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// 응답한 장치에서 얻은 값 (일부 필드는 실패할 수 있음)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceValues {
    pub values: BTreeMap<MetricField, ParsedValue>,
    /// 타임아웃, 미지원, 해석 실패 필드
    pub failed: Vec<MetricField>,
}

impl DeviceValues {
    pub fn get(&self, field: MetricField) -> Option<&ParsedValue> {
        self.values.get(&field)
    }
}

/// 장치 하나를 읽은 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// 어떤 OID에도 응답 없음
    Unreachable,
    /// 응답함 (값 일부 또는 전부)
    Partial(DeviceValues),
}

impl ReadOutcome {
    pub fn is_reachable(&self) -> bool {
        matches!(self, ReadOutcome::Partial(_))
    }
}

/// `SnmpProbe` 위의 다중 OID 리더
#[derive(Clone)]
pub struct SnmpReader {
    probe: Arc<dyn SnmpProbe>,
}

impl SnmpReader {
    pub fn new(probe: Arc<dyn SnmpProbe>) -> Self {
        Self { probe }
    }

    /// 바인딩 목록을 조회해 해석한다
    pub async fn read(
        &self,
        address: Ipv4Addr,
        bindings: &[OidBinding],
        timeout: Duration,
    ) -> ReadOutcome {
        let mut result = DeviceValues::default();
        let mut responded = bindings.is_empty();

        for binding in bindings {
            match self.probe.probe(address, binding.oid, timeout).await {
                Ok(raw) => {
                    responded = true;
                    match binding.parser.parse(&raw) {
                        Some(parsed) => {
                            trace!("{address} {}={parsed:?}", binding.field);
                            result.values.insert(binding.field, parsed);
                        }
                        None => {
                            debug!("{address} {} 해석 실패: {raw:?}", binding.field);
                            result.failed.push(binding.field);
                        }
                    }
                }
                Err(ProbeFailure::NoSuchObject) => {
                    responded = true;
                    result.failed.push(binding.field);
                }
                Err(ProbeFailure::Timeout) => result.failed.push(binding.field),
            }
        }

        if responded {
            ReadOutcome::Partial(result)
        } else {
            debug!("{address} 도달 불가 (OID {}개 모두 무응답)", bindings.len());
            ReadOutcome::Unreachable
        }
    }

    /// 텍스트 OID 하나 조회 (sysDescr/sysName)
    ///
    /// 응답은 했지만 텍스트가 아니면 빈 문자열로 돌려준다.
    pub async fn read_text(
        &self,
        address: Ipv4Addr,
        oid: &str,
        timeout: Duration,
    ) -> Result<String, ProbeFailure> {
        let raw = self.probe.probe(address, oid, timeout).await?;
        Ok(raw.as_text().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeProbe;
    use assert_matches::assert_matches;
    use printwatch_core::models::printer::VendorTag;
    use printwatch_core::ports::snmp::SnmpValue;
    use printwatch_core::vendor::profile_for;

    const ADDR: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 20);

    fn timeout() -> Duration {
        Duration::from_millis(100)
    }

    #[tokio::test]
    async fn silent_device_is_unreachable() {
        let reader = SnmpReader::new(Arc::new(FakeProbe::new()));
        let outcome = reader
            .read(ADDR, profile_for(VendorTag::Hp).bindings, timeout())
            .await;
        assert_eq!(outcome, ReadOutcome::Unreachable);
    }

    #[tokio::test]
    async fn toner_timeouts_do_not_make_device_offline() {
        let probe = FakeProbe::new()
            .respond(ADDR, "1.3.6.1.2.1.43.10.2.1.4.1.1", SnmpValue::Counter(4321))
            .fail(ADDR, "1.3.6.1.2.1.43.11.1.1.9.1.1", ProbeFailure::Timeout);
        let reader = SnmpReader::new(Arc::new(probe));

        let outcome = reader
            .read(ADDR, profile_for(VendorTag::Hp).bindings, timeout())
            .await;
        let values = assert_matches!(outcome, ReadOutcome::Partial(v) => v);
        assert_eq!(values.get(MetricField::PageCount), Some(&ParsedValue::Count(4321)));
        assert!(values.failed.contains(&MetricField::TonerLevel));
        assert!(values.failed.contains(&MetricField::TonerMax));
    }

    #[tokio::test]
    async fn unsupported_oids_still_mean_reachable() {
        // 응답은 하지만 모든 OID가 미지원
        let probe = FakeProbe::new().device(ADDR);
        let reader = SnmpReader::new(Arc::new(probe));

        let outcome = reader
            .read(ADDR, profile_for(VendorTag::Generic).bindings, timeout())
            .await;
        let values = assert_matches!(outcome, ReadOutcome::Partial(v) => v);
        assert!(values.values.is_empty());
        assert_eq!(values.failed, vec![MetricField::PageCount]);
    }

    #[tokio::test]
    async fn unparsable_value_is_a_field_failure() {
        let probe = FakeProbe::new().respond(
            ADDR,
            "1.3.6.1.2.1.43.10.2.1.4.1.1",
            SnmpValue::OctetString(b"n/a".to_vec()),
        );
        let reader = SnmpReader::new(Arc::new(probe));

        let outcome = reader
            .read(ADDR, profile_for(VendorTag::Generic).bindings, timeout())
            .await;
        let values = assert_matches!(outcome, ReadOutcome::Partial(v) => v);
        assert_eq!(values.failed, vec![MetricField::PageCount]);
    }

    #[tokio::test]
    async fn read_text_trims_identity() {
        let probe = FakeProbe::new().respond(
            ADDR,
            "1.3.6.1.2.1.1.1.0",
            SnmpValue::OctetString(b"Brother NC-8300h\0".to_vec()),
        );
        let reader = SnmpReader::new(Arc::new(probe));
        assert_eq!(
            reader.read_text(ADDR, "1.3.6.1.2.1.1.1.0", timeout()).await,
            Ok("Brother NC-8300h".to_string())
        );
        assert_eq!(
            reader
                .read_text(Ipv4Addr::new(10, 0, 0, 1), "1.3.6.1.2.1.1.1.0", timeout())
                .await,
            Err(ProbeFailure::Timeout)
        );
    }
}
