use async_trait::async_trait;
use chrono::{DateTime, Local};
use rusqlite::{params, types::Type, Connection, OptionalExtension, Row};
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

use crate::application::ports::RecordRepositoryPort;
use crate::domain::{
    errors::{DomainError, DomainResult},
    record::{InspectionRecord, RecordDraft, RecordFilter, RecordPage},
};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS inspection_records (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    record_id          TEXT NOT NULL UNIQUE,
    inspection_type    TEXT NOT NULL,
    project_name       TEXT,
    location           TEXT,
    column_id          TEXT,
    section_width      INTEGER,
    section_height     INTEGER,
    detected_count     INTEGER,
    design_total       INTEGER,
    compliance_status  TEXT,
    compliance_message TEXT,
    rebar_config       TEXT,
    predictions        TEXT,
    hoop_path          TEXT,
    image_url          TEXT,
    inspector          TEXT,
    created_at         TEXT NOT NULL,
    updated_at         TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_records_type ON inspection_records(inspection_type);
CREATE INDEX IF NOT EXISTS idx_records_created ON inspection_records(created_at);
";

const SELECT_COLUMNS: &str = "id, record_id, inspection_type, project_name, location, column_id, \
    section_width, section_height, detected_count, design_total, compliance_status, \
    compliance_message, rebar_config, predictions, hoop_path, image_url, inspector, created_at";

/// Repositorio de registros sobre SQLite. Una conexión protegida por mutex;
/// cada consulta corre en el pool bloqueante de tokio.
pub struct SqliteRecordRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRecordRepository {
    pub fn open(path: &Path) -> DomainResult<Self> {
        let conn = Connection::open(path).map_err(db_err)?;
        info!("🗄️ Base de datos SQLite: {}", path.display());
        Self::with_connection(conn)
    }

    pub fn in_memory() -> DomainResult<Self> {
        Self::with_connection(Connection::open_in_memory().map_err(db_err)?)
    }

    fn with_connection(conn: Connection) -> DomainResult<Self> {
        conn.execute_batch(SCHEMA).map_err(db_err)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    async fn run<T, F>(&self, job: F) -> DomainResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> DomainResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| DomainError::OperationFailed("Lock de la base de datos fallido".into()))?;
            job(&guard)
        })
        .await
        .map_err(|e| DomainError::OperationFailed(format!("tarea sqlite abortada: {e}")))?
    }
}

fn db_err(e: rusqlite::Error) -> DomainError {
    DomainError::OperationFailed(format!("sqlite: {e}"))
}

fn to_json<T: Serialize>(value: &Option<T>) -> DomainResult<Option<String>> {
    value
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| DomainError::InvalidInput(format!("JSON no serializable: {e}")))
}

fn json_column<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| serde_json::from_str(&s))
        .transpose()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<InspectionRecord> {
    let width: Option<u32> = row.get(6)?;
    let height: Option<u32> = row.get(7)?;
    let created_raw: String = row.get(17)?;
    let created_at = DateTime::parse_from_rfc3339(&created_raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(17, Type::Text, Box::new(e)))?
        .with_timezone(&Local);

    Ok(InspectionRecord {
        id: row.get(0)?,
        record_id: row.get(1)?,
        inspection_type: row.get(2)?,
        project_name: row.get(3)?,
        location: row.get(4)?,
        column_id: row.get(5)?,
        section_size: width.zip(height),
        detected_count: row.get(8)?,
        design_total: row.get(9)?,
        compliance_status: row.get(10)?,
        compliance_message: row.get(11)?,
        rebar_config: json_column(row, 12)?,
        predictions: json_column(row, 13)?,
        hoop_path: json_column(row, 14)?,
        image_url: row.get(15)?,
        inspector: row.get(16)?,
        created_at,
    })
}

fn select_by_id(conn: &Connection, id: i64) -> rusqlite::Result<Option<InspectionRecord>> {
    conn.query_row(
        &format!("SELECT {SELECT_COLUMNS} FROM inspection_records WHERE id = ?1"),
        params![id],
        row_to_record,
    )
    .optional()
}

#[async_trait]
impl RecordRepositoryPort for SqliteRecordRepository {
    async fn insert(&self, draft: RecordDraft) -> DomainResult<InspectionRecord> {
        let rebar_config = to_json(&draft.data.rebar_config)?;
        let predictions = to_json(&draft.data.predictions)?;
        let hoop_path = to_json(&draft.data.hoop_path)?;

        self.run(move |conn| {
            let data = &draft.data;
            let compliance = data.compliance.clone().unwrap_or_default();
            conn.execute(
                "INSERT INTO inspection_records (record_id, inspection_type, project_name, location, column_id, \
                 section_width, section_height, detected_count, design_total, compliance_status, compliance_message, \
                 rebar_config, predictions, hoop_path, image_url, inspector, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?17)",
                params![
                    draft.record_id,
                    draft.inspection_type,
                    data.project_name,
                    data.location,
                    data.column_id,
                    data.section_size.map(|s| s.0),
                    data.section_size.map(|s| s.1),
                    data.detected_count,
                    data.design_total,
                    compliance.status,
                    compliance.message,
                    rebar_config,
                    predictions,
                    hoop_path,
                    data.image_url,
                    data.inspector,
                    draft.created_at.to_rfc3339(),
                ],
            )
            .map_err(db_err)?;

            select_by_id(conn, conn.last_insert_rowid())
                .map_err(db_err)?
                .ok_or_else(|| DomainError::OperationFailed("registro recién insertado no encontrado".into()))
        })
        .await
    }

    async fn list(&self, filter: &RecordFilter) -> DomainResult<RecordPage> {
        let per_page = filter.per_page.max(1);
        let page = filter.page.max(1);
        let offset = i64::from(page - 1) * i64::from(per_page);
        let kind = filter.inspection_type.clone();

        self.run(move |conn| {
            let total: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM inspection_records WHERE (?1 IS NULL OR inspection_type = ?1)",
                    params![kind],
                    |row| row.get(0),
                )
                .map_err(db_err)?;

            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {SELECT_COLUMNS} FROM inspection_records \
                     WHERE (?1 IS NULL OR inspection_type = ?1) \
                     ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3"
                ))
                .map_err(db_err)?;
            let records = stmt
                .query_map(params![kind, per_page, offset], row_to_record)
                .map_err(db_err)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(db_err)?;

            let total = total.max(0) as u64;
            Ok(RecordPage {
                records,
                total,
                page,
                per_page,
                pages: total.div_ceil(u64::from(per_page)),
            })
        })
        .await
    }

    async fn get(&self, id: i64) -> DomainResult<Option<InspectionRecord>> {
        self.run(move |conn| select_by_id(conn, id).map_err(db_err)).await
    }

    async fn delete(&self, id: i64) -> DomainResult<bool> {
        self.run(move |conn| {
            let removed = conn
                .execute("DELETE FROM inspection_records WHERE id = ?1", params![id])
                .map_err(db_err)?;
            Ok(removed > 0)
        })
        .await
    }

    async fn ping(&self) -> bool {
        self.run(|conn| conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)).map_err(db_err))
            .await
            .is_ok()
    }
}
