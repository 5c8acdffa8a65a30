//! SQLite-backed tracker catalog implementation.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};

use super::{CatalogError, EventFilter, RecordWrite, StatusChange, TrackerCatalog};
use crate::tracker::{tracking_key, EventKind, EventOutcome, ScanEvent, ScanStatus, TrackerRecord};

/// SQLite-backed tracker catalog.
///
/// Records are stored as JSON next to a normalized tracking key and an
/// insertion sequence, which gives groups their stable order.
pub struct SqliteTrackerCatalog {
    conn: Mutex<Connection>,
}

impl SqliteTrackerCatalog {
    /// Open (or create) the database file and its tables.
    pub fn new(path: &Path, busy_timeout: Duration) -> Result<Self, CatalogError> {
        let conn = Connection::open(path).map_err(db_error)?;
        conn.busy_timeout(busy_timeout).map_err(db_error)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory catalog (useful for testing).
    pub fn in_memory() -> Result<Self, CatalogError> {
        let conn = Connection::open_in_memory().map_err(db_error)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), CatalogError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS trackers (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                tracking_key TEXT NOT NULL,
                data TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_trackers_tracking_key ON trackers(tracking_key);

            CREATE TABLE IF NOT EXISTS scan_statuses (
                tracker_id TEXT PRIMARY KEY,
                label INTEGER NOT NULL DEFAULT 0,
                packing INTEGER NOT NULL DEFAULT 0,
                dispatch INTEGER NOT NULL DEFAULT 0,
                pending INTEGER NOT NULL DEFAULT 0,
                cancelled INTEGER NOT NULL DEFAULT 0,
                updated_at TEXT NOT NULL
            );

            -- Append-only scan history
            CREATE TABLE IF NOT EXISTS scan_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                tracking_key TEXT NOT NULL,
                tracking_id TEXT NOT NULL,
                tracker_id TEXT,
                event_type TEXT NOT NULL,
                outcome TEXT NOT NULL,
                reason TEXT,
                product_code TEXT,
                timestamp TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_scan_events_tracking_key ON scan_events(tracking_key);
            CREATE INDEX IF NOT EXISTS idx_scan_events_tracker_id ON scan_events(tracker_id);
            CREATE INDEX IF NOT EXISTS idx_scan_events_timestamp ON scan_events(timestamp);
            "#,
        )
        .map_err(db_error)?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, CatalogError> {
        self.conn
            .lock()
            .map_err(|_| CatalogError::Storage("connection lock poisoned".to_string()))
    }

    fn parse_record(data: &str) -> Result<TrackerRecord, CatalogError> {
        serde_json::from_str(data).map_err(|e| CatalogError::Serialization(e.to_string()))
    }

    fn query_records(
        conn: &Connection,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<TrackerRecord>, CatalogError> {
        let mut stmt = conn.prepare(sql).map_err(db_error)?;
        let rows = stmt
            .query_map(params, |row| row.get::<_, String>(0))
            .map_err(db_error)?;

        let mut records = Vec::new();
        for row in rows {
            let data = row.map_err(db_error)?;
            records.push(Self::parse_record(&data)?);
        }
        Ok(records)
    }

    fn write_status(
        conn: &Connection,
        tracker_id: &str,
        status: &ScanStatus,
    ) -> Result<(), CatalogError> {
        let updated = conn
            .execute(
                "UPDATE scan_statuses
                 SET label = ?, packing = ?, dispatch = ?, pending = ?, cancelled = ?, updated_at = ?
                 WHERE tracker_id = ?",
                params![
                    status.label,
                    status.packing,
                    status.dispatch,
                    status.pending,
                    status.cancelled,
                    Utc::now().to_rfc3339(),
                    tracker_id,
                ],
            )
            .map_err(db_error)?;

        if updated == 0 {
            return Err(CatalogError::NotFound(tracker_id.to_string()));
        }
        Ok(())
    }

    fn insert_record(
        conn: &Connection,
        record: &TrackerRecord,
        status: &ScanStatus,
    ) -> Result<(), CatalogError> {
        let exists = conn
            .query_row("SELECT 1 FROM trackers WHERE id = ?", params![&record.id], |_| Ok(()))
            .optional()
            .map_err(db_error)?
            .is_some();
        if exists {
            return Err(CatalogError::AlreadyExists(record.id.clone()));
        }

        let data =
            serde_json::to_string(record).map_err(|e| CatalogError::Serialization(e.to_string()))?;
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO trackers (id, tracking_key, data, updated_at) VALUES (?, ?, ?, ?)",
            params![&record.id, record.tracking_key(), data, &now],
        )
        .map_err(db_error)?;

        conn.execute(
            "INSERT OR REPLACE INTO scan_statuses (tracker_id, label, packing, dispatch, pending, cancelled, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                &record.id,
                status.label,
                status.packing,
                status.dispatch,
                status.pending,
                status.cancelled,
                &now,
            ],
        )
        .map_err(db_error)?;

        Ok(())
    }

    fn overwrite_record(conn: &Connection, record: &TrackerRecord) -> Result<(), CatalogError> {
        let data =
            serde_json::to_string(record).map_err(|e| CatalogError::Serialization(e.to_string()))?;

        let updated = conn
            .execute(
                "UPDATE trackers SET tracking_key = ?, data = ?, updated_at = ? WHERE id = ?",
                params![record.tracking_key(), data, Utc::now().to_rfc3339(), &record.id],
            )
            .map_err(db_error)?;

        if updated == 0 {
            return Err(CatalogError::NotFound(record.id.clone()));
        }
        Ok(())
    }

    fn insert_event(conn: &Connection, event: &ScanEvent) -> Result<i64, CatalogError> {
        conn.execute(
            "INSERT INTO scan_events (tracking_key, tracking_id, tracker_id, event_type, outcome, reason, product_code, timestamp)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                tracking_key(&event.tracking_id),
                event.tracking_id,
                event.tracker_id,
                event.kind.as_str(),
                event.outcome.as_str(),
                event.reason,
                event.product_code,
                event.timestamp.to_rfc3339(),
            ],
        )
        .map_err(db_error)?;

        Ok(conn.last_insert_rowid())
    }

    fn row_to_status(row: &rusqlite::Row) -> rusqlite::Result<ScanStatus> {
        Ok(ScanStatus {
            label: row.get(0)?,
            packing: row.get(1)?,
            dispatch: row.get(2)?,
            pending: row.get(3)?,
            cancelled: row.get(4)?,
        })
    }

    fn row_to_event(row: &rusqlite::Row) -> rusqlite::Result<ScanEvent> {
        let kind_str: String = row.get(3)?;
        let outcome_str: String = row.get(4)?;
        let timestamp_str: String = row.get(7)?;

        let kind = EventKind::parse(&kind_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                rusqlite::types::Type::Text,
                format!("unknown event type '{}'", kind_str).into(),
            )
        })?;
        let outcome = EventOutcome::parse(&outcome_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                4,
                rusqlite::types::Type::Text,
                format!("unknown event outcome '{}'", outcome_str).into(),
            )
        })?;
        let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(ScanEvent {
            id: row.get(0)?,
            tracking_id: row.get(1)?,
            tracker_id: row.get(2)?,
            kind,
            outcome,
            reason: row.get(5)?,
            product_code: row.get(6)?,
            timestamp,
        })
    }

    fn build_where_clause(filter: &EventFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref tracking_id) = filter.tracking_id {
            conditions.push("tracking_key = ?");
            params.push(Box::new(tracking_key(tracking_id)));
        }

        if let Some(ref tracker_id) = filter.tracker_id {
            conditions.push("tracker_id = ?");
            params.push(Box::new(tracker_id.clone()));
        }

        if let Some(kind) = filter.kind {
            conditions.push("event_type = ?");
            params.push(Box::new(kind.as_str()));
        }

        if let Some(ref from) = filter.from {
            conditions.push("timestamp >= ?");
            params.push(Box::new(from.to_rfc3339()));
        }

        if let Some(ref to) = filter.to {
            conditions.push("timestamp <= ?");
            params.push(Box::new(to.to_rfc3339()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }
}

/// Busy and locked databases are worth retrying; everything else is not.
fn db_error(e: rusqlite::Error) -> CatalogError {
    match e.sqlite_error_code() {
        Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => {
            CatalogError::Transient(e.to_string())
        }
        _ => CatalogError::Storage(e.to_string()),
    }
}

impl TrackerCatalog for SqliteTrackerCatalog {
    fn get_group(&self, tracking_id: &str) -> Result<Vec<TrackerRecord>, CatalogError> {
        let conn = self.lock()?;
        let key = tracking_key(tracking_id);
        Self::query_records(
            &conn,
            "SELECT data FROM trackers WHERE tracking_key = ? ORDER BY seq",
            params![key],
        )
    }

    fn get_record(&self, id: &str) -> Result<TrackerRecord, CatalogError> {
        let conn = self.lock()?;
        let data: Option<String> = conn
            .query_row(
                "SELECT data FROM trackers WHERE id = ?",
                params![id],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_error)?;

        match data {
            Some(data) => Self::parse_record(&data),
            None => Err(CatalogError::NotFound(id.to_string())),
        }
    }

    fn get_status(&self, tracker_id: &str) -> Result<ScanStatus, CatalogError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT label, packing, dispatch, pending, cancelled FROM scan_statuses WHERE tracker_id = ?",
            params![tracker_id],
            Self::row_to_status,
        )
        .optional()
        .map_err(db_error)?
        .ok_or_else(|| CatalogError::NotFound(tracker_id.to_string()))
    }

    fn set_status(&self, tracker_id: &str, status: &ScanStatus) -> Result<(), CatalogError> {
        let conn = self.lock()?;
        Self::write_status(&conn, tracker_id, status)
    }

    fn commit(&self, changes: &[StatusChange], events: &[ScanEvent]) -> Result<(), CatalogError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(db_error)?;

        // Dropping the transaction on an early return rolls it back.
        for change in changes {
            Self::write_status(&tx, &change.tracker_id, &change.status)?;
        }
        for event in events {
            Self::insert_event(&tx, event)?;
        }

        tx.commit().map_err(db_error)
    }

    fn create_record(
        &self,
        record: &TrackerRecord,
        status: &ScanStatus,
    ) -> Result<(), CatalogError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(db_error)?;
        Self::insert_record(&tx, record, status)?;
        tx.commit().map_err(db_error)
    }

    fn update_record(&self, record: &TrackerRecord) -> Result<(), CatalogError> {
        let conn = self.lock()?;
        Self::overwrite_record(&conn, record)
    }

    fn write_records(&self, writes: &[RecordWrite]) -> Result<(), CatalogError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(db_error)?;

        for write in writes {
            match write {
                RecordWrite::Create { record, status } => {
                    Self::insert_record(&tx, record, status)?
                }
                RecordWrite::Update(record) => Self::overwrite_record(&tx, record)?,
            }
        }

        tx.commit().map_err(db_error)
    }

    fn list_all(&self) -> Result<Vec<TrackerRecord>, CatalogError> {
        let conn = self.lock()?;
        Self::query_records(&conn, "SELECT data FROM trackers ORDER BY seq", params![])
    }

    fn list_statuses(&self) -> Result<HashMap<String, ScanStatus>, CatalogError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT label, packing, dispatch, pending, cancelled, tracker_id FROM scan_statuses",
            )
            .map_err(db_error)?;

        let rows = stmt
            .query_map([], |row| {
                let status = Self::row_to_status(row)?;
                let tracker_id: String = row.get(5)?;
                Ok((tracker_id, status))
            })
            .map_err(db_error)?;

        let mut statuses = HashMap::new();
        for row in rows {
            let (tracker_id, status) = row.map_err(db_error)?;
            statuses.insert(tracker_id, status);
        }
        Ok(statuses)
    }

    fn append_event(&self, event: &ScanEvent) -> Result<i64, CatalogError> {
        let conn = self.lock()?;
        Self::insert_event(&conn, event)
    }

    fn list_events(&self, filter: &EventFilter) -> Result<Vec<ScanEvent>, CatalogError> {
        let conn = self.lock()?;
        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!(
            "SELECT id, tracking_id, tracker_id, event_type, outcome, reason, product_code, timestamp
             FROM scan_events {} ORDER BY id DESC LIMIT ? OFFSET ?",
            where_clause
        );

        let mut stmt = conn.prepare(&sql).map_err(db_error)?;

        let mut all_params: Vec<Box<dyn rusqlite::ToSql>> = params;
        all_params.push(Box::new(filter.limit));
        all_params.push(Box::new(filter.offset));

        let param_refs: Vec<&dyn rusqlite::ToSql> = all_params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), Self::row_to_event)
            .map_err(db_error)?;

        let mut events = Vec::new();
        for row in rows {
            events.push(row.map_err(db_error)?);
        }
        Ok(events)
    }

    fn bulk_clear(&self, preserve_ids: &HashSet<String>) -> Result<usize, CatalogError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(db_error)?;

        let ids: Vec<String> = {
            let mut stmt = tx.prepare("SELECT id FROM trackers").map_err(db_error)?;
            let rows = stmt
                .query_map([], |row| row.get::<_, String>(0))
                .map_err(db_error)?;
            let mut ids = Vec::new();
            for row in rows {
                ids.push(row.map_err(db_error)?);
            }
            ids
        };

        let mut deleted = 0;
        for id in ids.iter().filter(|id| !preserve_ids.contains(*id)) {
            tx.execute("DELETE FROM scan_events WHERE tracker_id = ?", params![id])
                .map_err(db_error)?;
            tx.execute("DELETE FROM scan_statuses WHERE tracker_id = ?", params![id])
                .map_err(db_error)?;
            tx.execute("DELETE FROM trackers WHERE id = ?", params![id])
                .map_err(db_error)?;
            deleted += 1;
        }

        tx.commit().map_err(db_error)?;
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_catalog() -> SqliteTrackerCatalog {
        SqliteTrackerCatalog::in_memory().unwrap()
    }

    fn add(catalog: &SqliteTrackerCatalog, id: &str, tracking_id: &str) -> TrackerRecord {
        let record = TrackerRecord::new(id, tracking_id);
        catalog
            .create_record(&record, &ScanStatus::default())
            .unwrap();
        record
    }

    fn label_event(record: &TrackerRecord) -> ScanEvent {
        ScanEvent::for_item(record, EventKind::Label, EventOutcome::Scanned)
    }

    #[test]
    fn test_create_and_get_record() {
        let catalog = create_test_catalog();
        let record = add(&catalog, "T1_a", "T1");

        let fetched = catalog.get_record("T1_a").unwrap();
        assert_eq!(fetched, record);
        assert_eq!(catalog.get_status("T1_a").unwrap(), ScanStatus::default());
    }

    #[test]
    fn test_get_missing_record() {
        let catalog = create_test_catalog();
        assert!(matches!(
            catalog.get_record("nope"),
            Err(CatalogError::NotFound(_))
        ));
        assert!(matches!(
            catalog.get_status("nope"),
            Err(CatalogError::NotFound(_))
        ));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let catalog = create_test_catalog();
        add(&catalog, "T1_a", "T1");

        let result =
            catalog.create_record(&TrackerRecord::new("T1_a", "T2"), &ScanStatus::default());
        assert!(matches!(result, Err(CatalogError::AlreadyExists(_))));
    }

    #[test]
    fn test_group_is_case_insensitive_and_in_insertion_order() {
        let catalog = create_test_catalog();
        add(&catalog, "b", "awb1");
        add(&catalog, "other", "AWB2");
        add(&catalog, "a", "AWB1");

        let group = catalog.get_group("Awb1").unwrap();
        let ids: Vec<_> = group.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);

        assert!(catalog.get_group("missing").unwrap().is_empty());
    }

    #[test]
    fn test_update_record_keeps_position() {
        let catalog = create_test_catalog();
        add(&catalog, "first", "T1");
        add(&catalog, "second", "T1");

        let mut record = catalog.get_record("first").unwrap();
        record.courier = "Delhivery".to_string();
        catalog.update_record(&record).unwrap();

        let group = catalog.get_group("T1").unwrap();
        assert_eq!(group[0].id, "first");
        assert_eq!(group[0].courier, "Delhivery");

        let missing = TrackerRecord::new("ghost", "T1");
        assert!(matches!(
            catalog.update_record(&missing),
            Err(CatalogError::NotFound(_))
        ));
    }

    #[test]
    fn test_set_status() {
        let catalog = create_test_catalog();
        add(&catalog, "a", "T1");

        let status = ScanStatus {
            label: true,
            ..Default::default()
        };
        catalog.set_status("a", &status).unwrap();
        assert_eq!(catalog.get_status("a").unwrap(), status);

        assert!(matches!(
            catalog.set_status("ghost", &status),
            Err(CatalogError::NotFound(_))
        ));
    }

    #[test]
    fn test_commit_writes_changes_and_events() {
        let catalog = create_test_catalog();
        let a = add(&catalog, "a", "T1");
        let b = add(&catalog, "b", "T1");

        let labelled = ScanStatus {
            label: true,
            ..Default::default()
        };
        catalog
            .commit(
                &[
                    StatusChange::new("a", labelled),
                    StatusChange::new("b", labelled),
                ],
                &[label_event(&a), label_event(&b)],
            )
            .unwrap();

        assert!(catalog.get_status("a").unwrap().label);
        assert!(catalog.get_status("b").unwrap().label);
        let events = catalog
            .list_events(&EventFilter::new().with_tracking_id("t1"))
            .unwrap();
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_commit_is_all_or_nothing() {
        let catalog = create_test_catalog();
        let a = add(&catalog, "a", "T1");

        let labelled = ScanStatus {
            label: true,
            ..Default::default()
        };
        let result = catalog.commit(
            &[
                StatusChange::new("a", labelled),
                StatusChange::new("ghost", labelled),
            ],
            &[label_event(&a)],
        );

        assert!(matches!(result, Err(CatalogError::NotFound(_))));
        assert!(!catalog.get_status("a").unwrap().label);
        assert!(catalog.list_events(&EventFilter::new()).unwrap().is_empty());
    }

    #[test]
    fn test_write_records_applies_creates_and_updates() {
        let catalog = create_test_catalog();
        let mut existing = add(&catalog, "a", "T1");
        existing.courier = "Ekart".to_string();

        catalog
            .write_records(&[
                RecordWrite::Update(existing),
                RecordWrite::Create {
                    record: TrackerRecord::new("b", "T2"),
                    status: ScanStatus::default(),
                },
            ])
            .unwrap();

        assert_eq!(catalog.get_record("a").unwrap().courier, "Ekart");
        assert_eq!(catalog.get_group("T2").unwrap().len(), 1);
        assert_eq!(catalog.get_status("b").unwrap(), ScanStatus::default());
    }

    #[test]
    fn test_write_records_is_all_or_nothing() {
        let catalog = create_test_catalog();
        add(&catalog, "taken", "T1");

        let result = catalog.write_records(&[
            RecordWrite::Create {
                record: TrackerRecord::new("fresh", "T2"),
                status: ScanStatus::default(),
            },
            RecordWrite::Create {
                record: TrackerRecord::new("taken", "T3"),
                status: ScanStatus::default(),
            },
        ]);

        assert!(matches!(result, Err(CatalogError::AlreadyExists(_))));
        assert!(catalog.get_group("T2").unwrap().is_empty());
        assert_eq!(catalog.list_all().unwrap().len(), 1);
    }

    #[test]
    fn test_list_events_filters_and_orders_newest_first() {
        let catalog = create_test_catalog();
        let a = add(&catalog, "a", "T1");
        let b = add(&catalog, "b", "T2");

        let first = catalog.append_event(&label_event(&a)).unwrap();
        let second = catalog
            .append_event(&ScanEvent::for_item(
                &a,
                EventKind::Packing,
                EventOutcome::Scanned,
            ))
            .unwrap();
        catalog.append_event(&label_event(&b)).unwrap();

        let events = catalog
            .list_events(&EventFilter::new().with_tracker_id("a"))
            .unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id, second);
        assert_eq!(events[1].id, first);

        let packing = catalog
            .list_events(&EventFilter::new().with_kind(EventKind::Packing))
            .unwrap();
        assert_eq!(packing.len(), 1);
        assert_eq!(packing[0].tracker_id.as_deref(), Some("a"));
    }

    #[test]
    fn test_list_events_pagination() {
        let catalog = create_test_catalog();
        let a = add(&catalog, "a", "T1");
        for _ in 0..5 {
            catalog.append_event(&label_event(&a)).unwrap();
        }

        let page = catalog
            .list_events(&EventFilter::new().with_limit(2).with_offset(4))
            .unwrap();
        assert_eq!(page.len(), 1);
    }

    #[test]
    fn test_list_statuses() {
        let catalog = create_test_catalog();
        add(&catalog, "a", "T1");
        add(&catalog, "b", "T2");

        let statuses = catalog.list_statuses().unwrap();
        assert_eq!(statuses.len(), 2);
        assert!(statuses.contains_key("a"));
    }

    #[test]
    fn test_bulk_clear_preserves_ids() {
        let catalog = create_test_catalog();
        let a = add(&catalog, "a", "T1");
        let b = add(&catalog, "b", "T2");
        catalog.append_event(&label_event(&a)).unwrap();
        catalog.append_event(&label_event(&b)).unwrap();

        let preserve: HashSet<String> = ["b".to_string()].into_iter().collect();
        let deleted = catalog.bulk_clear(&preserve).unwrap();

        assert_eq!(deleted, 1);
        let remaining: Vec<_> = catalog.list_all().unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(remaining, vec!["b"]);
        assert!(matches!(
            catalog.get_status("a"),
            Err(CatalogError::NotFound(_))
        ));
        assert_eq!(catalog.list_events(&EventFilter::new()).unwrap().len(), 1);
    }

    #[test]
    fn test_file_based_catalog() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");

        {
            let catalog =
                SqliteTrackerCatalog::new(&db_path, Duration::from_millis(100)).unwrap();
            add(&catalog, "a", "T1");
        }

        assert!(db_path.exists());
        let reopened = SqliteTrackerCatalog::new(&db_path, Duration::from_millis(100)).unwrap();
        assert_eq!(reopened.get_group("t1").unwrap().len(), 1);
    }
}
