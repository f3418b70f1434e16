use crate::error::LitefetchError;
use crate::shaper::{self, CellValue, DEFAULT_ROW_LIMIT, QueryResult};
use crate::verbose::Timer;
use rusqlite::serialize::OwnedData;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, DatabaseName, ffi};
use serde::Serialize;
use std::ptr::NonNull;
use tracing::{debug, info};

const LIST_TABLES_SQL: &str = "SELECT name FROM sqlite_master WHERE type='table'";

/// A table and its column names in declared order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableMetadata {
    pub name: String,
    pub columns: Vec<String>,
}

/// Exclusive owner of the in-memory database handle.
///
/// At most one handle is live. [`Session::open`] drops the previous one
/// before installing a new image, so a failed open leaves the session not
/// ready.
pub struct Session {
    conn: Option<Connection>,
    row_limit: Option<usize>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            conn: None,
            row_limit: Some(DEFAULT_ROW_LIMIT),
        }
    }

    /// Cap applied to queries without a limiting clause; `None` disables it.
    pub fn with_row_limit(mut self, row_limit: Option<usize>) -> Self {
        self.row_limit = row_limit;
        self
    }

    pub fn row_limit(&self) -> Option<usize> {
        self.row_limit
    }

    pub fn is_ready(&self) -> bool {
        self.conn.is_some()
    }

    /// Release the current handle, if any.
    pub fn close(&mut self) {
        if self.conn.take().is_some() {
            debug!("database handle released");
        }
    }

    /// Install `buffer` as the engine's read-only in-memory database.
    pub fn open(&mut self, buffer: Vec<u8>) -> Result<(), LitefetchError> {
        self.close();

        let timer = Timer::start();
        let size = buffer.len();
        let data = into_engine_memory(buffer)?;

        let mut conn = Connection::open_in_memory().map_err(|e| LitefetchError::Initialization {
            message: format!("failed to create engine connection: {}", e),
        })?;
        conn.deserialize(DatabaseName::Main, data, true)
            .map_err(|e| LitefetchError::Initialization {
                message: format!("failed to install database image: {}", e),
            })?;

        // Deserialization is lazy; the first catalog read validates the header.
        let tables: i64 = conn
            .query_row("SELECT count(*) FROM sqlite_master", [], |row| row.get(0))
            .map_err(|e| LitefetchError::Initialization {
                message: format!("not a valid database image: {}", e),
            })?;

        if let Err(e) = conn.execute_batch("PRAGMA shrink_memory") {
            debug!(error = %e, "shrink_memory failed");
        }

        info!(
            bytes = size,
            schema_objects = tables,
            elapsed_ms = timer.elapsed_ms() as u64,
            "database opened"
        );
        self.conn = Some(conn);
        Ok(())
    }

    /// Run `query` with the row cap applied and return a header-first table.
    pub fn execute(&self, query: &str) -> Result<QueryResult, LitefetchError> {
        let conn = self.conn.as_ref().ok_or(LitefetchError::NotReady)?;
        let (sql, limit_applied) = shaper::normalize_query(query, self.row_limit);

        debug!(sql = %sql, "running query");
        let timer = Timer::start();

        let (header, flat) = collect_flat(conn, &sql)?;
        let mut result = shaper::pivot_to_table(header, flat);
        result.limit_applied = limit_applied;

        debug!(
            rows = result.rows.len(),
            elapsed_ms = timer.elapsed_ms() as u64,
            "query complete"
        );
        Ok(result)
    }

    /// Enumerate tables from the catalog with their column names.
    pub fn schema(&self) -> Result<Vec<TableMetadata>, LitefetchError> {
        let conn = self.conn.as_ref().ok_or(LitefetchError::NotReady)?;

        debug!(sql = LIST_TABLES_SQL, "listing tables");
        let mut stmt = conn.prepare(LIST_TABLES_SQL).map_err(query_error)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(query_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(query_error)?;

        let mut tables: Vec<TableMetadata> = Vec::with_capacity(names.len());
        for name in names {
            if tables.iter().any(|t| t.name == name) {
                continue;
            }
            let columns = table_columns(conn, &name)?;
            tables.push(TableMetadata { name, columns });
        }
        Ok(tables)
    }
}

/// Pull every row of one statement into a row-major flat sequence.
fn collect_flat(
    conn: &Connection,
    sql: &str,
) -> Result<(Vec<String>, Vec<CellValue>), LitefetchError> {
    let mut stmt = conn.prepare(sql).map_err(query_error)?;
    let header: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();
    let width = header.len();

    let mut flat = Vec::new();
    let mut rows = stmt.query([]).map_err(query_error)?;
    while let Some(row) = rows.next().map_err(query_error)? {
        for i in 0..width {
            flat.push(cell_value(row.get_ref(i).map_err(query_error)?));
        }
    }
    Ok((header, flat))
}

fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>, LitefetchError> {
    let sql = format!("PRAGMA table_info(\"{}\")", table.replace('"', "\"\""));
    debug!(sql = %sql, "describing table");

    let mut stmt = conn.prepare(&sql).map_err(query_error)?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .map_err(query_error)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(query_error)?;
    Ok(columns)
}

fn cell_value(value: ValueRef<'_>) -> CellValue {
    match value {
        ValueRef::Null => CellValue::Null,
        ValueRef::Integer(i) => CellValue::Integer(i),
        ValueRef::Real(f) => CellValue::Real(f),
        // TEXT is not guaranteed to be UTF-8; keep undecodable bytes intact.
        ValueRef::Text(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) => CellValue::Text(text.to_string()),
            Err(_) => CellValue::Blob(bytes.to_vec()),
        },
        ValueRef::Blob(bytes) => CellValue::Blob(bytes.to_vec()),
    }
}

fn query_error(e: rusqlite::Error) -> LitefetchError {
    LitefetchError::Query {
        message: e.to_string(),
    }
}

/// Move `buffer` into an allocation the engine owns and frees on close.
fn into_engine_memory(buffer: Vec<u8>) -> Result<OwnedData, LitefetchError> {
    if buffer.is_empty() {
        return Err(LitefetchError::Initialization {
            message: "not a valid database image: buffer is empty".to_string(),
        });
    }
    let len = buffer.len();

    // SAFETY: sqlite3_malloc64 has no preconditions; a null return is handled.
    let raw = unsafe { ffi::sqlite3_malloc64(len as u64) }.cast::<u8>();
    let ptr = NonNull::new(raw).ok_or_else(|| LitefetchError::Initialization {
        message: format!("engine could not allocate {} bytes", len),
    })?;

    // SAFETY: `ptr` is a fresh allocation of `len` bytes that cannot overlap
    // `buffer`, and it comes from sqlite3_malloc64 as OwnedData requires.
    unsafe {
        std::ptr::copy_nonoverlapping(buffer.as_ptr(), ptr.as_ptr(), len);
        Ok(OwnedData::from_raw_nonnull(ptr, len))
    }
}
