//! # printwatch-snmp
//!
//! SNMP 전송 어댑터.
//! `printwatch_core::ports::snmp::SnmpProbe`를 async-snmp 클라이언트로 구현한다.
//! 단일 OID GET만 지원하며 walk/set/trap은 다루지 않는다.

pub mod client;

pub use client::AsyncSnmpProbe;
