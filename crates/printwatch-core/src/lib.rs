//! # printwatch-core
//!
//! PrintWatch 도메인 모델, 포트(trait) 정의, 에러 타입.
//! 모든 크레이트가 공유하는 핵심 타입과 순수 도메인 로직을 제공한다.
//!
//! ## 구조
//!
//! - [`models`]: 프린터, 측정값, 사용량, 실행 요약 (serde)
//! - [`ports`]: SNMP 조회 및 저장소 포트 (async_trait)
//! - [`vendor`]: 벤더 프로파일 정적 테이블과 해석기
//! - [`usage`]: 카운터 리셋을 고려한 사용량 집계
//! - [`fleet`]: 프린터 현황/사용량 조회 뷰
//! - [`subnet`]: 서브넷 설정 파일 파싱, 호스트 열거
//! - [`error`]: 핵심 에러 타입 (thiserror)
//! - [`config`]: 애플리케이션 설정 구조체
//! - [`config_manager`]: 설정 파일 관리 (로드/기본값 생성)

pub mod config;
pub mod config_manager;
pub mod error;
pub mod fleet;
pub mod models;
pub mod ports;
pub mod subnet;
pub mod usage;
pub mod vendor;
