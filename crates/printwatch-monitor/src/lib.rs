//! # printwatch-monitor
//!
//! 프린터 수집 엔진.
//! 등록된 포트(`SnmpProbe`, `PrinterRegistry`, `MetricHistory`)만 사용하므로
//! 가짜 SNMP 조회기를 주입해 네트워크 없이 테스트할 수 있다.

pub mod collector;
pub mod discovery;
pub mod normalize;
pub mod pool;
pub mod reader;

#[cfg(test)]
pub(crate) mod testing;

pub use collector::{CollectorSettings, MetricsCollector};
pub use discovery::{DiscoveryEngine, DiscoverySettings};
pub use reader::{DeviceValues, ReadOutcome, SnmpReader};
