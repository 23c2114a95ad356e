//! 포트 인터페이스 (trait).
//!
//! Hexagonal Architecture의 포트 레이어.
//! 어댑터 crate가 구현하고 `printwatch-app`에서 `Arc<dyn T>`로 와이어링한다.
//! 탐색/수집 엔진은 이 trait에만 의존하므로 가짜 SNMP 구현으로 테스트할 수 있다.

pub mod snmp;
pub mod storage;
