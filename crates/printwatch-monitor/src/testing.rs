//! 테스트용 가짜 SNMP 조회기.

use async_trait::async_trait;
use printwatch_core::ports::snmp::{ProbeFailure, SnmpProbe, SnmpValue};
use std::collections::{HashMap, HashSet};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// 등록된 장치만 응답한다. 등록된 장치의 미설정 OID는 NoSuchObject,
/// 등록되지 않은 주소는 Timeout.
#[derive(Default)]
pub struct FakeProbe {
    devices: HashSet<Ipv4Addr>,
    answers: HashMap<(Ipv4Addr, String), Result<SnmpValue, ProbeFailure>>,
    delay: Option<Duration>,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    calls: Arc<AtomicUsize>,
}

impl FakeProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn device(mut self, address: Ipv4Addr) -> Self {
        self.devices.insert(address);
        self
    }

    pub fn respond(mut self, address: Ipv4Addr, oid: &str, value: SnmpValue) -> Self {
        self.devices.insert(address);
        self.answers.insert((address, oid.to_string()), Ok(value));
        self
    }

    pub fn fail(mut self, address: Ipv4Addr, oid: &str, failure: ProbeFailure) -> Self {
        self.devices.insert(address);
        self.answers.insert((address, oid.to_string()), Err(failure));
        self
    }

    /// sysDescr 응답 장치 등록
    pub fn printer(self, address: Ipv4Addr, sys_descr: &str) -> Self {
        self.respond(
            address,
            printwatch_core::vendor::SYS_DESCR_OID,
            SnmpValue::OctetString(sys_descr.as_bytes().to_vec()),
        )
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// 동시에 진행된 조회 수의 최댓값
    pub fn peak(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.peak)
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl SnmpProbe for FakeProbe {
    async fn probe(
        &self,
        address: Ipv4Addr,
        oid: &str,
        _timeout: Duration,
    ) -> Result<SnmpValue, ProbeFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let answer = match self.answers.get(&(address, oid.to_string())) {
            Some(answer) => answer.clone(),
            None if self.devices.contains(&address) => Err(ProbeFailure::NoSuchObject),
            None => Err(ProbeFailure::Timeout),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        answer
    }
}
