//! 스키마 마이그레이션.
//!
//! 버전 기반 SQLite 스키마 관리.

use rusqlite::Connection;
use tracing::{debug, info};

/// 현재 스키마 버전
const CURRENT_VERSION: u32 = 1;

/// 스키마 마이그레이션 실행
pub fn run_migrations(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let current = get_version(conn)?;
    info!("현재 스키마 버전: {current}, 목표: {CURRENT_VERSION}");

    if current < 1 {
        migrate_v1(conn)?;
    }

    Ok(())
}

/// 현재 스키마 버전 조회
fn get_version(conn: &Connection) -> Result<u32, rusqlite::Error> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
}

/// V1: printers + metric_readings
fn migrate_v1(conn: &Connection) -> Result<(), rusqlite::Error> {
    debug!("마이그레이션 V1 실행: printers, metric_readings");

    conn.execute_batch(
        "
        BEGIN;

        CREATE TABLE IF NOT EXISTS printers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            ip TEXT NOT NULL UNIQUE,
            location TEXT NOT NULL,
            model TEXT,
            vendor TEXT NOT NULL DEFAULT 'generic',
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_printers_location ON printers(location);
        CREATE INDEX IF NOT EXISTS idx_printers_model ON printers(model);

        -- 폴링 주기당 한 행, 수정 없음
        CREATE TABLE IF NOT EXISTS metric_readings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            printer_id INTEGER NOT NULL REFERENCES printers(id) ON DELETE CASCADE,
            polled_at TEXT NOT NULL,
            page_count INTEGER,
            toner_kind TEXT NOT NULL,
            toner_pct INTEGER,
            drum_kind TEXT NOT NULL,
            drum_pct INTEGER,
            online INTEGER NOT NULL,
            device_status INTEGER,
            UNIQUE (printer_id, polled_at)
        );

        CREATE INDEX IF NOT EXISTS idx_readings_printer_time
            ON metric_readings(printer_id, polled_at);

        INSERT INTO schema_version (version) VALUES (1);

        COMMIT;
        ",
    )?;

    info!("마이그레이션 V1 완료");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_exists(conn: &Connection, name: &str) -> bool {
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                [name],
                |row| row.get(0),
            )
            .unwrap();
        count == 1
    }

    #[test]
    fn migration_creates_tables() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        assert!(table_exists(&conn, "printers"));
        assert!(table_exists(&conn, "metric_readings"));
        assert_eq!(get_version(&conn).unwrap(), CURRENT_VERSION);
    }

    #[test]
    fn migration_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn readings_cascade_with_foreign_keys_on() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
        run_migrations(&conn).unwrap();

        conn.execute(
            "INSERT INTO printers (name, ip, location, created_at) VALUES ('p', '10.0.0.1', 'L', '2024-01-01T00:00:00.000000Z')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO metric_readings (printer_id, polled_at, toner_kind, drum_kind, online)
             VALUES (1, '2024-01-01T00:00:00.000000Z', 'unknown', 'unknown', 0)",
            [],
        )
        .unwrap();
        conn.execute("DELETE FROM printers WHERE id = 1", []).unwrap();

        let left: i64 = conn
            .query_row("SELECT COUNT(*) FROM metric_readings", [], |row| row.get(0))
            .unwrap();
        assert_eq!(left, 0);
    }
}
