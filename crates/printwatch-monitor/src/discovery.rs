//! 프린터 탐색 엔진.
//!
//! 서브넷의 호스트마다 sysDescr를 조회하고, 응답한 호스트를 레지스트리에 업서트한다.
//! 조회는 동시에, 업서트는 스캔 순서대로 하나씩 실행하므로 같은 네트워크에 대해
//! 몇 번을 돌려도 같은 레지스트리 상태(같은 ID)가 된다.
//! 응답하지 않는 프린터는 삭제하지 않는다.

use printwatch_core::config::AppConfig;
use printwatch_core::models::printer::{PrinterCandidate, UpsertOutcome};
use printwatch_core::models::run::{DiscoveryReport, TargetFailure};
use printwatch_core::ports::storage::PrinterRegistry;
use printwatch_core::subnet::SubnetEntry;
use printwatch_core::vendor::{self, MetricField, SYS_DESCR_OID, SYS_NAME_OID};
use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::pool::WorkerPool;
use crate::reader::SnmpReader;

/// 탐색 실행 설정
#[derive(Debug, Clone)]
pub struct DiscoverySettings {
    /// OID 하나당 타임아웃
    pub timeout: Duration,
    /// 동시 조회 상한
    pub concurrency: usize,
    /// sysDescr에 프린터 키워드가 있어야 등록
    pub require_printer_keyword: bool,
}

impl DiscoverySettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            timeout: config.snmp.timeout(),
            concurrency: config.snmp.concurrency,
            require_printer_keyword: config.discovery.require_printer_keyword,
        }
    }
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// 호스트 하나의 조회 결과
#[derive(Debug, Clone, PartialEq, Eq)]
enum HostProbe {
    Silent,
    NotPrinter,
    Printer(PrinterCandidate),
}

/// 서브넷 스캔 + 레지스트리 업서트
pub struct DiscoveryEngine {
    reader: SnmpReader,
    registry: Arc<dyn PrinterRegistry>,
    settings: DiscoverySettings,
}

impl DiscoveryEngine {
    pub fn new(
        reader: SnmpReader,
        registry: Arc<dyn PrinterRegistry>,
        settings: DiscoverySettings,
    ) -> Self {
        Self {
            reader,
            registry,
            settings,
        }
    }

    /// 서브넷 목록 전체를 한 번 스캔한다.
    ///
    /// 대상별 실패는 요약에 담기며 실행을 중단시키지 않는다.
    pub async fn discover(&self, subnets: &[SubnetEntry]) -> DiscoveryReport {
        let targets = scan_targets(subnets);
        info!(
            "프린터 탐색 시작: 서브넷 {}개, 호스트 {}개 (동시 {})",
            subnets.len(),
            targets.len(),
            self.settings.concurrency
        );

        let mut report = DiscoveryReport {
            scanned: targets.len(),
            ..DiscoveryReport::default()
        };

        let reader = self.reader.clone();
        let settings = self.settings.clone();
        let probes = WorkerPool::new(self.settings.concurrency)
            .run(targets.clone(), move |(ip, location)| {
                identify_host(reader.clone(), settings.clone(), ip, location)
            })
            .await;

        for ((ip, _), probe) in targets.iter().zip(probes) {
            let candidate = match probe {
                Some(HostProbe::Printer(candidate)) => candidate,
                Some(HostProbe::Silent) => continue,
                Some(HostProbe::NotPrinter) => {
                    report.responded += 1;
                    report.skipped_non_printers += 1;
                    continue;
                }
                None => {
                    report.failures.push(TargetFailure {
                        ip: *ip,
                        printer_id: None,
                        error: "조회 태스크 비정상 종료".to_string(),
                    });
                    continue;
                }
            };
            report.responded += 1;

            match self.registry.upsert_discovered(&candidate).await {
                Ok(UpsertOutcome::Inserted(p)) => {
                    info!("신규 프린터: {} ({}, {})", p.name, p.ip, p.vendor);
                    report.inserted.push(p.id);
                }
                Ok(UpsertOutcome::Updated(p)) => {
                    debug!("프린터 갱신: {} ({})", p.name, p.ip);
                    report.updated.push(p.id);
                }
                Ok(UpsertOutcome::Unchanged(_)) => report.unchanged += 1,
                Err(e) => {
                    warn!("프린터 등록 실패 {ip}: {e}");
                    report.failures.push(TargetFailure {
                        ip: *ip,
                        printer_id: None,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            "프린터 탐색 완료: 응답 {}/{}, 신규 {}, 갱신 {}, 변경 없음 {}, 실패 {}",
            report.responded,
            report.scanned,
            report.inserted.len(),
            report.updated.len(),
            report.unchanged,
            report.failures.len()
        );
        report
    }
}

/// 스캔 대상 (주소, 위치). 서브넷이 겹치면 먼저 나온 항목의 위치를 쓴다.
fn scan_targets(subnets: &[SubnetEntry]) -> Vec<(Ipv4Addr, String)> {
    let mut seen = HashSet::new();
    let mut targets = Vec::new();
    for entry in subnets {
        for ip in entry.hosts() {
            if seen.insert(ip) {
                targets.push((ip, entry.location.clone()));
            }
        }
    }
    targets
}

async fn identify_host(
    reader: SnmpReader,
    settings: DiscoverySettings,
    ip: Ipv4Addr,
    location: String,
) -> HostProbe {
    let identity = match reader.read_text(ip, SYS_DESCR_OID, settings.timeout).await {
        Ok(identity) => identity,
        Err(_) => return HostProbe::Silent,
    };

    if settings.require_printer_keyword && !vendor::looks_like_printer(&identity) {
        debug!("{ip} 프린터 아님: {identity}");
        return HostProbe::NotPrinter;
    }

    let profile = vendor::resolve(&identity);
    let model = match profile.binding(MetricField::Model) {
        Some(binding) => reader
            .read_text(ip, binding.oid, settings.timeout)
            .await
            .ok()
            .filter(|m| !m.is_empty()),
        None => None,
    };
    let sys_name = reader
        .read_text(ip, SYS_NAME_OID, settings.timeout)
        .await
        .ok()
        .filter(|n| !n.is_empty());

    debug!("{ip} 응답: vendor={}, model={model:?}", profile.tag);
    HostProbe::Printer(PrinterCandidate {
        ip,
        name: PrinterCandidate::default_name(ip, sys_name.as_deref(), model.as_deref()),
        location,
        model,
        vendor: profile.tag,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeProbe;
    use printwatch_core::models::printer::{PrinterFilter, VendorTag};
    use printwatch_core::ports::snmp::SnmpValue;
    use printwatch_storage::sqlite::SqliteStorage;
    use std::sync::atomic::Ordering;

    const MODEL_OID: &str = "1.3.6.1.2.1.25.3.2.1.3.1";

    fn subnet(cidr: &str, location: &str) -> SubnetEntry {
        let (network, prefix) = SubnetEntry::parse_cidr(cidr).unwrap();
        SubnetEntry {
            network,
            prefix,
            location: location.to_string(),
        }
    }

    fn settings() -> DiscoverySettings {
        DiscoverySettings {
            timeout: Duration::from_millis(50),
            concurrency: 8,
            require_printer_keyword: false,
        }
    }

    fn office_network() -> FakeProbe {
        FakeProbe::new()
            .printer(Ipv4Addr::new(10, 0, 1, 5), "Brother NC-8300h, Firmware Ver.1.05")
            .respond(
                Ipv4Addr::new(10, 0, 1, 5),
                MODEL_OID,
                SnmpValue::OctetString(b"Brother HL-L5100DN series".to_vec()),
            )
            .respond(
                Ipv4Addr::new(10, 0, 1, 5),
                SYS_NAME_OID,
                SnmpValue::OctetString(b"BRN-3F2A11".to_vec()),
            )
            .printer(Ipv4Addr::new(10, 0, 1, 9), "Linux router 5.15")
    }

    #[tokio::test]
    async fn registers_responders_with_location_and_vendor() {
        let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
        let engine = DiscoveryEngine::new(
            SnmpReader::new(Arc::new(office_network())),
            storage.clone(),
            settings(),
        );

        let report = engine.discover(&[subnet("10.0.1.0/28", "3F")]).await;
        assert_eq!(report.scanned, 14);
        assert_eq!(report.responded, 2);
        assert_eq!(report.inserted.len(), 2);
        assert!(report.failures.is_empty());

        let brother = storage
            .find_by_ip(Ipv4Addr::new(10, 0, 1, 5))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(brother.name, "BRN-3F2A11");
        assert_eq!(brother.vendor, VendorTag::Brother);
        assert_eq!(brother.location, "3F");
        assert_eq!(brother.model.as_deref(), Some("Brother HL-L5100DN series"));

        // sysDescr만 응답한 장치 (모델 OID 없음, 일반 프로파일)
        let other = storage
            .find_by_ip(Ipv4Addr::new(10, 0, 1, 9))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(other.name, "Printer-10.0.1.9");
        assert_eq!(other.vendor, VendorTag::Generic);
    }

    #[tokio::test]
    async fn running_twice_yields_same_registry() {
        let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
        let engine = DiscoveryEngine::new(
            SnmpReader::new(Arc::new(office_network())),
            storage.clone(),
            settings(),
        );
        let subnets = [subnet("10.0.1.0/28", "3F")];

        engine.discover(&subnets).await;
        let before = storage.list_printers(&PrinterFilter::default()).await.unwrap();

        let second = engine.discover(&subnets).await;
        let after = storage.list_printers(&PrinterFilter::default()).await.unwrap();

        assert_eq!(before, after);
        assert!(second.inserted.is_empty());
        assert!(second.updated.is_empty());
        assert_eq!(second.unchanged, 2);
    }

    #[tokio::test]
    async fn rediscovery_moves_location_but_keeps_identity() {
        let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
        let engine = DiscoveryEngine::new(
            SnmpReader::new(Arc::new(office_network())),
            storage.clone(),
            settings(),
        );

        let first = engine.discover(&[subnet("10.0.1.0/28", "3F")]).await;
        let second = engine.discover(&[subnet("10.0.1.0/28", "4F")]).await;

        assert_eq!(second.updated.len(), 2);
        let mut ids = second.updated.clone();
        ids.sort();
        let mut original = first.inserted.clone();
        original.sort();
        assert_eq!(ids, original);

        let brother = storage
            .find_by_ip(Ipv4Addr::new(10, 0, 1, 5))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(brother.location, "4F");
        assert_eq!(brother.name, "BRN-3F2A11");
    }

    #[tokio::test]
    async fn keyword_filter_skips_non_printers() {
        let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
        let engine = DiscoveryEngine::new(
            SnmpReader::new(Arc::new(office_network())),
            storage.clone(),
            DiscoverySettings {
                require_printer_keyword: true,
                ..settings()
            },
        );

        let report = engine.discover(&[subnet("10.0.1.0/28", "3F")]).await;
        assert_eq!(report.responded, 2);
        assert_eq!(report.skipped_non_printers, 1);
        assert_eq!(report.inserted.len(), 1);
    }

    #[tokio::test]
    async fn overlapping_subnets_probe_each_host_once() {
        let probe = office_network();
        let calls = probe.calls();
        let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
        let engine = DiscoveryEngine::new(SnmpReader::new(Arc::new(probe)), storage.clone(), settings());

        let report = engine
            .discover(&[subnet("10.0.1.5/32", "Lobby"), subnet("10.0.1.0/29", "3F")])
            .await;

        assert_eq!(report.scanned, 6);
        let brother = storage
            .find_by_ip(Ipv4Addr::new(10, 0, 1, 5))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(brother.location, "Lobby");
        // 6 sysDescr + 모델/sysName 2개
        assert_eq!(calls.load(Ordering::SeqCst), 8);
    }

    #[tokio::test]
    async fn probe_concurrency_is_bounded() {
        let probe = FakeProbe::new().with_delay(Duration::from_millis(5));
        let peak = probe.peak();
        let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
        let engine = DiscoveryEngine::new(
            SnmpReader::new(Arc::new(probe)),
            storage,
            DiscoverySettings {
                concurrency: 3,
                ..settings()
            },
        );

        let report = engine.discover(&[subnet("10.9.0.0/27", "X")]).await;
        assert_eq!(report.scanned, 30);
        assert_eq!(report.responded, 0);
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }
}
