//! 프린터 레지스트리 (PrinterRegistry 포트 구현).

use async_trait::async_trait;
use chrono::Utc;
use printwatch_core::error::CoreError;
use printwatch_core::models::printer::{
    Printer, PrinterCandidate, PrinterFilter, UpsertOutcome, VendorTag,
};
use printwatch_core::ports::storage::PrinterRegistry;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::net::Ipv4Addr;
use tracing::{debug, info};

use super::{conversion_err, format_ts, parse_ts, storage_err, SqliteStorage};

const PRINTER_COLUMNS: &str = "id, name, ip, location, model, vendor, created_at";

fn row_to_printer(row: &Row<'_>) -> Result<Printer, rusqlite::Error> {
    let ip: String = row.get(2)?;
    let vendor: String = row.get(5)?;
    let created_at: String = row.get(6)?;
    Ok(Printer {
        id: row.get(0)?,
        name: row.get(1)?,
        ip: ip
            .parse::<Ipv4Addr>()
            .map_err(|e| conversion_err(2, format!("잘못된 IP {ip}: {e}")))?,
        location: row.get(3)?,
        model: row.get(4)?,
        // 알 수 없는 태그는 Generic으로 읽는다
        vendor: vendor.parse().unwrap_or(VendorTag::Generic),
        created_at: parse_ts(6, &created_at)?,
    })
}

fn select_by_id(conn: &Connection, id: i64) -> Result<Option<Printer>, rusqlite::Error> {
    conn.query_row(
        &format!("SELECT {PRINTER_COLUMNS} FROM printers WHERE id = ?1"),
        [id],
        row_to_printer,
    )
    .optional()
}

fn select_by_ip(conn: &Connection, ip: Ipv4Addr) -> Result<Option<Printer>, rusqlite::Error> {
    conn.query_row(
        &format!("SELECT {PRINTER_COLUMNS} FROM printers WHERE ip = ?1"),
        [ip.to_string()],
        row_to_printer,
    )
    .optional()
}

fn require(conn: &Connection, id: i64) -> Result<Printer, CoreError> {
    select_by_id(conn, id)
        .map_err(|e| storage_err("프린터 조회 실패", e))?
        .ok_or_else(|| CoreError::printer_not_found(id))
}

#[async_trait]
impl PrinterRegistry for SqliteStorage {
    // --------------------------------------------------------
    // 등록/갱신
    // --------------------------------------------------------

    async fn upsert_discovered(
        &self,
        candidate: &PrinterCandidate,
    ) -> Result<UpsertOutcome, CoreError> {
        let mut conn = self.write_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| storage_err("트랜잭션 시작 실패", e))?;

        let existing =
            select_by_ip(&tx, candidate.ip).map_err(|e| storage_err("프린터 조회 실패", e))?;

        let outcome = match existing {
            None => {
                tx.execute(
                    "INSERT INTO printers (name, ip, location, model, vendor, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        candidate.name,
                        candidate.ip.to_string(),
                        candidate.location,
                        candidate.model,
                        candidate.vendor.as_str(),
                        format_ts(&Utc::now()),
                    ],
                )
                .map_err(|e| storage_err("프린터 등록 실패", e))?;
                let id = tx.last_insert_rowid();
                let printer = require(&tx, id)?;
                info!("프린터 등록: #{} {} ({})", printer.id, printer.name, printer.ip);
                UpsertOutcome::Inserted(printer)
            }
            Some(current) => {
                // 새 모델을 못 읽었으면 기존 값 유지
                let model = candidate.model.clone().or_else(|| current.model.clone());
                if current.location == candidate.location && current.model == model {
                    UpsertOutcome::Unchanged(current)
                } else {
                    tx.execute(
                        "UPDATE printers SET location = ?1, model = ?2 WHERE id = ?3",
                        params![candidate.location, model, current.id],
                    )
                    .map_err(|e| storage_err("프린터 갱신 실패", e))?;
                    let printer = require(&tx, current.id)?;
                    debug!("프린터 메타데이터 갱신: #{} {}", printer.id, printer.ip);
                    UpsertOutcome::Updated(printer)
                }
            }
        };

        tx.commit()
            .map_err(|e| storage_err("트랜잭션 커밋 실패", e))?;
        Ok(outcome)
    }

    async fn update_location(&self, id: i64, location: &str) -> Result<Printer, CoreError> {
        let conn = self.write_conn()?;
        let changed = conn
            .execute(
                "UPDATE printers SET location = ?1 WHERE id = ?2",
                params![location, id],
            )
            .map_err(|e| storage_err("위치 변경 실패", e))?;
        if changed == 0 {
            return Err(CoreError::printer_not_found(id));
        }
        require(&conn, id)
    }

    async fn update_model(&self, id: i64, model: &str) -> Result<Printer, CoreError> {
        let conn = self.write_conn()?;
        let changed = conn
            .execute(
                "UPDATE printers SET model = ?1 WHERE id = ?2",
                params![model, id],
            )
            .map_err(|e| storage_err("모델 변경 실패", e))?;
        if changed == 0 {
            return Err(CoreError::printer_not_found(id));
        }
        require(&conn, id)
    }

    async fn delete_printer(&self, id: i64) -> Result<bool, CoreError> {
        let mut conn = self.write_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| storage_err("트랜잭션 시작 실패", e))?;

        let readings = tx
            .execute("DELETE FROM metric_readings WHERE printer_id = ?1", [id])
            .map_err(|e| storage_err("측정값 삭제 실패", e))?;
        let removed = tx
            .execute("DELETE FROM printers WHERE id = ?1", [id])
            .map_err(|e| storage_err("프린터 삭제 실패", e))?;

        tx.commit()
            .map_err(|e| storage_err("트랜잭션 커밋 실패", e))?;

        if removed > 0 {
            info!("프린터 삭제: #{id} (측정값 {readings}개)");
        }
        Ok(removed > 0)
    }

    // --------------------------------------------------------
    // 조회
    // --------------------------------------------------------

    async fn get_printer(&self, id: i64) -> Result<Option<Printer>, CoreError> {
        let conn = self.read_conn()?;
        select_by_id(&conn, id).map_err(|e| storage_err("프린터 조회 실패", e))
    }

    async fn find_by_ip(&self, ip: Ipv4Addr) -> Result<Option<Printer>, CoreError> {
        let conn = self.read_conn()?;
        select_by_ip(&conn, ip).map_err(|e| storage_err("프린터 조회 실패", e))
    }

    async fn list_printers(&self, filter: &PrinterFilter) -> Result<Vec<Printer>, CoreError> {
        let conn = self.read_conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {PRINTER_COLUMNS} FROM printers
                 WHERE (?1 IS NULL OR location = ?1) AND (?2 IS NULL OR model = ?2)
                 ORDER BY location, name, id"
            ))
            .map_err(|e| storage_err("쿼리 준비 실패", e))?;

        let printers = stmt
            .query_map(params![filter.location, filter.model], row_to_printer)
            .map_err(|e| storage_err("프린터 목록 조회 실패", e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| storage_err("프린터 행 변환 실패", e))?;
        Ok(printers)
    }

    async fn list_locations(&self) -> Result<Vec<String>, CoreError> {
        let conn = self.read_conn()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT location FROM printers ORDER BY location")
            .map_err(|e| storage_err("쿼리 준비 실패", e))?;
        let locations = stmt
            .query_map([], |row| row.get(0))
            .map_err(|e| storage_err("위치 목록 조회 실패", e))?
            .collect::<Result<Vec<String>, _>>()
            .map_err(|e| storage_err("위치 행 변환 실패", e))?;
        Ok(locations)
    }

    async fn list_models(&self) -> Result<Vec<String>, CoreError> {
        let conn = self.read_conn()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT model FROM printers WHERE model IS NOT NULL ORDER BY model")
            .map_err(|e| storage_err("쿼리 준비 실패", e))?;
        let models = stmt
            .query_map([], |row| row.get(0))
            .map_err(|e| storage_err("모델 목록 조회 실패", e))?
            .collect::<Result<Vec<String>, _>>()
            .map_err(|e| storage_err("모델 행 변환 실패", e))?;
        Ok(models)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn candidate(ip: [u8; 4], location: &str, model: Option<&str>) -> PrinterCandidate {
        let ip = Ipv4Addr::from(ip);
        PrinterCandidate {
            ip,
            name: PrinterCandidate::default_name(ip, None, model),
            location: location.to_string(),
            model: model.map(str::to_string),
            vendor: VendorTag::Brother,
        }
    }

    #[tokio::test]
    async fn insert_then_unchanged() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let c = candidate([10, 0, 0, 2], "HQ", Some("HL-L2350DW"));

        let first = storage.upsert_discovered(&c).await.unwrap();
        assert_matches!(first, UpsertOutcome::Inserted(_));
        let second = storage.upsert_discovered(&c).await.unwrap();
        assert_matches!(second, UpsertOutcome::Unchanged(ref p) if p.id == first.printer().id);
        assert_eq!(first.printer().vendor, VendorTag::Brother);
    }

    #[tokio::test]
    async fn rediscovery_updates_location_but_keeps_name_and_id() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let original = storage
            .upsert_discovered(&candidate([10, 0, 0, 3], "Old", Some("M402")))
            .await
            .unwrap();

        let mut moved = candidate([10, 0, 0, 3], "New", None);
        moved.name = "different-name".to_string();
        let outcome = storage.upsert_discovered(&moved).await.unwrap();

        let printer = assert_matches!(outcome, UpsertOutcome::Updated(p) => p);
        assert_eq!(printer.id, original.printer().id);
        assert_eq!(printer.name, original.printer().name);
        assert_eq!(printer.location, "New");
        // 모델을 못 읽은 재탐색이 기존 모델을 지우지 않는다
        assert_eq!(printer.model.as_deref(), Some("M402"));
    }

    #[tokio::test]
    async fn filters_and_distinct_values() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        for (ip, loc, model) in [
            ([10, 0, 0, 1], "B", Some("X1")),
            ([10, 0, 0, 2], "A", Some("X2")),
            ([10, 0, 0, 3], "A", None),
        ] {
            storage
                .upsert_discovered(&candidate(ip, loc, model))
                .await
                .unwrap();
        }

        let all = storage.list_printers(&PrinterFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].location, "A");

        let only_a = storage
            .list_printers(&PrinterFilter {
                location: Some("A".to_string()),
                model: None,
            })
            .await
            .unwrap();
        assert_eq!(only_a.len(), 2);

        let x1 = storage
            .list_printers(&PrinterFilter {
                location: None,
                model: Some("X1".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(x1.len(), 1);

        assert_eq!(storage.list_locations().await.unwrap(), vec!["A", "B"]);
        assert_eq!(storage.list_models().await.unwrap(), vec!["X1", "X2"]);
    }

    #[tokio::test]
    async fn update_missing_printer_is_not_found() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let err = storage.update_location(99, "Nowhere").await.unwrap_err();
        assert_matches!(err, CoreError::NotFound { .. });
        assert!(!storage.delete_printer(99).await.unwrap());
    }

    #[tokio::test]
    async fn find_by_ip_and_update_model() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let inserted = storage
            .upsert_discovered(&candidate([192, 168, 1, 50], "Lab", None))
            .await
            .unwrap();
        let id = inserted.printer().id;

        let found = storage
            .find_by_ip(Ipv4Addr::new(192, 168, 1, 50))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.name, "Printer-192.168.1.50");

        let updated = storage.update_model(id, "MFC-L2750DW").await.unwrap();
        assert_eq!(updated.model.as_deref(), Some("MFC-L2750DW"));
    }
}
