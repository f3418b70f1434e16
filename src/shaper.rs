//! Result shaping: the row cap rewrite applied before execution and the
//! pivot from a row-major value stream into a header-first table.

/// Rows returned when the query carries no limiting clause of its own.
pub const DEFAULT_ROW_LIMIT: usize = 25;

/// A single cell value from a query result.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    Null,
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Integer(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Real(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<Vec<u8>> for CellValue {
    fn from(value: Vec<u8>) -> Self {
        CellValue::Blob(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(CellValue::Null, Into::into)
    }
}

/// The rectangular output of one execute call.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
    /// The automatic cap appended to the query text, if any.
    pub limit_applied: Option<usize>,
}

impl QueryResult {
    /// True when the automatic cap was appended and the result filled it.
    ///
    /// Reaching the cap does not prove more rows exist: a table with exactly
    /// `limit` rows also reaches it.
    pub fn hit_cap(&self) -> bool {
        self.limit_applied
            .is_some_and(|limit| self.rows.len() >= limit)
    }

    /// Header-first view: row 0 holds the column names, data rows follow.
    pub fn into_table(self) -> Vec<Vec<CellValue>> {
        let mut table = Vec::with_capacity(self.rows.len() + 1);
        table.push(self.columns.into_iter().map(CellValue::Text).collect());
        table.extend(self.rows);
        table
    }
}

/// Reshape a row-major flat sequence into rows of `header.len()` cells.
///
/// The engine guarantees a constant column count per statement, so a
/// length that is not a multiple of the width is a contract violation and
/// only checked in debug builds. Trailing cells of a short final row are
/// dropped.
pub fn pivot_to_table(header: Vec<String>, flat: Vec<CellValue>) -> QueryResult {
    let width = header.len();
    if width == 0 {
        return QueryResult {
            columns: header,
            rows: Vec::new(),
            limit_applied: None,
        };
    }
    debug_assert_eq!(flat.len() % width, 0, "cell count must be a multiple of the column count");

    let mut rows = Vec::with_capacity(flat.len() / width);
    let mut cells = flat.into_iter();
    loop {
        let row: Vec<CellValue> = cells.by_ref().take(width).collect();
        if row.len() < width {
            break;
        }
        rows.push(row);
    }

    QueryResult {
        columns: header,
        rows,
        limit_applied: None,
    }
}

/// Strip trailing terminators and append `LIMIT <cap>` unless the text
/// already mentions `limit` anywhere (case-insensitive).
///
/// The check is a substring match, not a parse: a `limit` inside a
/// subquery, identifier or string literal also suppresses the cap.
/// Returns the statement to run and the cap that was appended.
pub fn normalize_query(query: &str, cap: Option<usize>) -> (String, Option<usize>) {
    let statement = query
        .trim()
        .trim_end_matches(|c: char| c == ';' || c.is_whitespace());

    match cap {
        Some(cap) if !statement.to_lowercase().contains("limit") => {
            (format!("{statement} LIMIT {cap}"), Some(cap))
        }
        _ => (statement.to_string(), None),
    }
}
