//! 측정값 이력 (MetricHistory 포트 구현).
//!
//! append-only: INSERT와 SELECT만 있다. 행 삭제는 프린터 삭제 시 함께 일어난다.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use printwatch_core::error::CoreError;
use printwatch_core::models::reading::{DeviceStatus, Level, MetricReading, NewReading};
use printwatch_core::ports::storage::MetricHistory;
use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

use super::{conversion_err, format_ts, parse_ts, storage_err, SqliteStorage};

const READING_COLUMNS: &str = "id, printer_id, polled_at, page_count, toner_kind, toner_pct, \
                               drum_kind, drum_pct, online, device_status";

/// Level → (kind, pct) 컬럼
fn level_columns(level: &Level) -> (&'static str, Option<i64>) {
    match level {
        Level::Percent(p) => ("percent", Some(i64::from(*p))),
        Level::Ok => ("ok", None),
        Level::Low => ("low", None),
        Level::Unknown => ("unknown", None),
    }
}

fn level_from_columns(idx: usize, kind: &str, pct: Option<i64>) -> Result<Level, rusqlite::Error> {
    match (kind, pct) {
        ("percent", Some(p)) => u8::try_from(p)
            .ok()
            .filter(|p| *p <= 100)
            .map(Level::Percent)
            .ok_or_else(|| conversion_err(idx, format!("잘못된 백분율: {p}"))),
        ("ok", _) => Ok(Level::Ok),
        ("low", _) => Ok(Level::Low),
        ("unknown", _) => Ok(Level::Unknown),
        (other, _) => Err(conversion_err(idx, format!("잘못된 잔량 종류: {other}"))),
    }
}

fn row_to_reading(row: &Row<'_>) -> Result<MetricReading, rusqlite::Error> {
    let polled_at: String = row.get(2)?;
    let page_count: Option<i64> = row.get(3)?;
    let toner_kind: String = row.get(4)?;
    let drum_kind: String = row.get(6)?;
    let device_status: Option<i64> = row.get(9)?;

    Ok(MetricReading {
        id: row.get(0)?,
        printer_id: row.get(1)?,
        polled_at: parse_ts(2, &polled_at)?,
        page_count: page_count.and_then(|v| u64::try_from(v).ok()),
        toner: level_from_columns(4, &toner_kind, row.get(5)?)?,
        drum: level_from_columns(6, &drum_kind, row.get(7)?)?,
        online: row.get(8)?,
        device_status: device_status.and_then(DeviceStatus::from_code),
    })
}

#[async_trait]
impl MetricHistory for SqliteStorage {
    async fn append_reading(&self, reading: &NewReading) -> Result<MetricReading, CoreError> {
        let page_count = reading
            .page_count
            .map(i64::try_from)
            .transpose()
            .map_err(|_| CoreError::Validation {
                field: "page_count".to_string(),
                message: "카운터 값이 저장 범위를 초과합니다".to_string(),
            })?;
        let (toner_kind, toner_pct) = level_columns(&reading.toner);
        let (drum_kind, drum_pct) = level_columns(&reading.drum);

        let conn = self.write_conn()?;
        conn.execute(
            "INSERT INTO metric_readings
                (printer_id, polled_at, page_count, toner_kind, toner_pct, drum_kind, drum_pct, online, device_status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                reading.printer_id,
                format_ts(&reading.polled_at),
                page_count,
                toner_kind,
                toner_pct,
                drum_kind,
                drum_pct,
                reading.online,
                reading.device_status.map(|s| s.code()),
            ],
        )
        .map_err(|e| storage_err("측정값 저장 실패", e))?;
        let id = conn.last_insert_rowid();

        debug!(
            "측정값 저장: printer={} pages={:?} toner={} drum={} online={}",
            reading.printer_id, reading.page_count, reading.toner, reading.drum, reading.online
        );

        Ok(MetricReading {
            id,
            printer_id: reading.printer_id,
            polled_at: reading.polled_at,
            page_count: reading.page_count,
            toner: reading.toner,
            drum: reading.drum,
            online: reading.online,
            device_status: reading.device_status,
        })
    }

    async fn list_readings(
        &self,
        printer_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<MetricReading>, CoreError> {
        let conn = self.read_conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {READING_COLUMNS} FROM metric_readings
                 WHERE printer_id = ?1 AND polled_at >= ?2 AND polled_at <= ?3
                 ORDER BY polled_at ASC, id ASC"
            ))
            .map_err(|e| storage_err("쿼리 준비 실패", e))?;

        let readings = stmt
            .query_map(
                params![printer_id, format_ts(&from), format_ts(&to)],
                row_to_reading,
            )
            .map_err(|e| storage_err("측정값 조회 실패", e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| storage_err("측정값 행 변환 실패", e))?;
        Ok(readings)
    }

    async fn latest_reading(&self, printer_id: i64) -> Result<Option<MetricReading>, CoreError> {
        let conn = self.read_conn()?;
        conn.query_row(
            &format!(
                "SELECT {READING_COLUMNS} FROM metric_readings
                 WHERE printer_id = ?1
                 ORDER BY polled_at DESC, id DESC
                 LIMIT 1"
            ),
            [printer_id],
            row_to_reading,
        )
        .optional()
        .map_err(|e| storage_err("최신 측정값 조회 실패", e))
    }

    async fn latest_readings(&self) -> Result<Vec<MetricReading>, CoreError> {
        let conn = self.read_conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {READING_COLUMNS} FROM metric_readings r
                 WHERE r.id = (
                     SELECT r2.id FROM metric_readings r2
                     WHERE r2.printer_id = r.printer_id
                     ORDER BY r2.polled_at DESC, r2.id DESC
                     LIMIT 1
                 )
                 ORDER BY r.printer_id"
            ))
            .map_err(|e| storage_err("쿼리 준비 실패", e))?;

        let readings = stmt
            .query_map([], row_to_reading)
            .map_err(|e| storage_err("최신 측정값 조회 실패", e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| storage_err("측정값 행 변환 실패", e))?;
        Ok(readings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone};
    use printwatch_core::models::printer::{PrinterCandidate, VendorTag};
    use printwatch_core::ports::storage::PrinterRegistry;
    use std::net::Ipv4Addr;

    async fn storage_with_printer() -> (SqliteStorage, i64) {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let ip = Ipv4Addr::new(10, 1, 0, 9);
        let outcome = storage
            .upsert_discovered(&PrinterCandidate {
                ip,
                name: "P".to_string(),
                location: "L".to_string(),
                model: None,
                vendor: VendorTag::Hp,
            })
            .await
            .unwrap();
        let id = outcome.printer().id;
        (storage, id)
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
    }

    fn online(printer_id: i64, at: DateTime<Utc>, pages: u64) -> NewReading {
        NewReading {
            printer_id,
            polled_at: at,
            page_count: Some(pages),
            toner: Level::Percent(64),
            drum: Level::Unknown,
            online: true,
            device_status: Some(DeviceStatus::Running),
        }
    }

    #[tokio::test]
    async fn append_and_list_in_range_ascending() {
        let (storage, id) = storage_with_printer().await;
        // 역순으로 넣어도 시각 오름차순으로 나온다
        for day in (0..5).rev() {
            storage
                .append_reading(&online(id, t0() + Duration::days(day), 100 * day as u64))
                .await
                .unwrap();
        }

        let readings = storage
            .list_readings(id, t0() + Duration::days(1), t0() + Duration::days(3))
            .await
            .unwrap();
        let pages: Vec<_> = readings.iter().map(|r| r.page_count.unwrap()).collect();
        assert_eq!(pages, vec![100, 200, 300]);
        assert_eq!(readings[0].toner, Level::Percent(64));
        assert_eq!(readings[0].device_status, Some(DeviceStatus::Running));
    }

    #[tokio::test]
    async fn offline_reading_roundtrips_unknowns() {
        let (storage, id) = storage_with_printer().await;
        storage
            .append_reading(&NewReading::offline(id, t0()))
            .await
            .unwrap();

        let latest = storage.latest_reading(id).await.unwrap().unwrap();
        assert!(!latest.online);
        assert_eq!(latest.page_count, None);
        assert_eq!(latest.toner, Level::Unknown);
        assert_eq!(latest.drum, Level::Unknown);
    }

    #[tokio::test]
    async fn duplicate_cycle_is_conflict() {
        let (storage, id) = storage_with_printer().await;
        storage.append_reading(&online(id, t0(), 1)).await.unwrap();
        let err = storage.append_reading(&online(id, t0(), 2)).await.unwrap_err();
        assert_matches!(err, CoreError::Conflict(_));
    }

    #[tokio::test]
    async fn unknown_printer_is_rejected() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        assert!(storage.append_reading(&online(404, t0(), 1)).await.is_err());
    }

    #[tokio::test]
    async fn latest_per_printer() {
        let (storage, a) = storage_with_printer().await;
        let b = storage
            .upsert_discovered(&PrinterCandidate {
                ip: Ipv4Addr::new(10, 1, 0, 10),
                name: "Q".to_string(),
                location: "L".to_string(),
                model: None,
                vendor: VendorTag::Generic,
            })
            .await
            .unwrap()
            .printer()
            .id;

        storage.append_reading(&online(a, t0(), 10)).await.unwrap();
        storage
            .append_reading(&online(a, t0() + Duration::hours(1), 20))
            .await
            .unwrap();
        storage.append_reading(&online(b, t0(), 7)).await.unwrap();

        let latest = storage.latest_readings().await.unwrap();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].printer_id, a);
        assert_eq!(latest[0].page_count, Some(20));
        assert_eq!(latest[1].page_count, Some(7));
    }

    #[test]
    fn level_columns_roundtrip() {
        for level in [Level::Percent(0), Level::Percent(100), Level::Ok, Level::Low, Level::Unknown] {
            let (kind, pct) = level_columns(&level);
            assert_eq!(level_from_columns(0, kind, pct).unwrap(), level);
        }
        assert!(level_from_columns(0, "percent", Some(140)).is_err());
        assert!(level_from_columns(0, "bogus", None).is_err());
    }
}
