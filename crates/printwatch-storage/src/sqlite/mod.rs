//! SQLite 저장소 어댑터.
//!
//! `PrinterRegistry` + `MetricHistory` 포트 구현.
//!
//! 쓰기는 단일 writer 연결로 직렬화된다. 파일 DB는 WAL 모드에서 별도의
//! 읽기 전용 연결을 열어, 대시보드 조회가 수집 중인 쓰기 잠금을 기다리지 않게 한다.
//!
//! # 모듈 구조
//! - `printers`: 프린터 레지스트리 (PrinterRegistry 포트)
//! - `readings`: 측정값 이력 (MetricHistory 포트)

mod printers;
mod readings;

use chrono::{DateTime, SecondsFormat, Utc};
use printwatch_core::error::CoreError;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::info;

use crate::migration;

/// SQLite 저장소
pub struct SqliteStorage {
    writer: Mutex<Connection>,
    /// 파일 DB 전용 읽기 연결 (인메모리 DB는 writer 공유)
    reader: Option<Mutex<Connection>>,
}

impl SqliteStorage {
    /// 파일 기반 SQLite 저장소 생성
    pub fn open(path: &Path) -> Result<Self, CoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let writer = Connection::open(path)
            .map_err(|e| CoreError::Storage(format!("SQLite 열기 실패: {e}")))?;

        writer
            .execute_batch(
                "
                PRAGMA journal_mode=WAL;
                PRAGMA synchronous=NORMAL;
                PRAGMA foreign_keys=ON;
                PRAGMA busy_timeout=5000;
                PRAGMA temp_store=MEMORY;
                ",
            )
            .map_err(|e| CoreError::Storage(format!("PRAGMA 설정 실패: {e}")))?;

        migration::run_migrations(&writer)
            .map_err(|e| CoreError::Storage(format!("마이그레이션 실패: {e}")))?;

        let reader = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| CoreError::Storage(format!("읽기 연결 열기 실패: {e}")))?;
        reader
            .execute_batch("PRAGMA busy_timeout=5000;")
            .map_err(|e| CoreError::Storage(format!("PRAGMA 설정 실패: {e}")))?;

        info!("SQLite 저장소 초기화: {}", path.display());

        Ok(Self {
            writer: Mutex::new(writer),
            reader: Some(Mutex::new(reader)),
        })
    }

    /// 인메모리 SQLite 저장소 생성 (테스트용)
    pub fn open_in_memory() -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| CoreError::Storage(format!("인메모리 SQLite 생성 실패: {e}")))?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| CoreError::Storage(format!("PRAGMA 설정 실패: {e}")))?;

        migration::run_migrations(&conn)
            .map_err(|e| CoreError::Storage(format!("마이그레이션 실패: {e}")))?;

        Ok(Self {
            writer: Mutex::new(conn),
            reader: None,
        })
    }

    pub(super) fn write_conn(&self) -> Result<MutexGuard<'_, Connection>, CoreError> {
        self.writer
            .lock()
            .map_err(|e| CoreError::Internal(format!("잠금 획득 실패: {e}")))
    }

    pub(super) fn read_conn(&self) -> Result<MutexGuard<'_, Connection>, CoreError> {
        self.reader
            .as_ref()
            .unwrap_or(&self.writer)
            .lock()
            .map_err(|e| CoreError::Internal(format!("잠금 획득 실패: {e}")))
    }
}

/// rusqlite 에러 → CoreError (제약 위반은 Conflict)
pub(super) fn storage_err(context: &str, e: rusqlite::Error) -> CoreError {
    match &e {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            CoreError::Conflict(format!("{context}: {e}"))
        }
        _ => CoreError::Storage(format!("{context}: {e}")),
    }
}

/// 고정 폭 RFC3339 (사전순 = 시간순)
pub(super) fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(super) fn parse_ts(idx: usize, raw: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_err(idx, format!("잘못된 시각 {raw}: {e}")))
}

pub(super) fn conversion_err(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        Box::<dyn std::error::Error + Send + Sync>::from(message),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_sort_lexically() {
        let a = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let b = a + chrono::Duration::milliseconds(1);
        assert!(format_ts(&a) < format_ts(&b));
        assert_eq!(parse_ts(0, &format_ts(&b)).unwrap(), b);
    }

    #[test]
    fn file_storage_reopens_with_existing_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("printwatch.db");
        {
            let _storage = SqliteStorage::open(&path).unwrap();
        }
        let storage = SqliteStorage::open(&path).unwrap();
        assert!(storage.reader.is_some());
    }
}
