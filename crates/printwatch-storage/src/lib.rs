//! # printwatch-storage
//!
//! 로컬 저장소 어댑터.
//! SQLite 기반 프린터 레지스트리와 append-only 메트릭 이력, 스키마 마이그레이션을 관리한다.
//!
//! ## 모듈
//! - `sqlite`: `PrinterRegistry` + `MetricHistory` 포트 구현
//! - `migration`: 스키마 마이그레이션

pub mod migration;
pub mod sqlite;
