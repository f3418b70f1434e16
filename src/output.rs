use crate::error::LitefetchError;
use std::io::Write;
use std::path::Path;

/// Print TOON result to stdout.
pub fn print_result(toon_string: &str) {
    print!("{}", toon_string);
}

/// Print error to stderr in the contract format: error: <category>: <message>
pub fn print_error(err: &LitefetchError) {
    eprintln!("error: {}", err);
}

/// Build the file output summary as a TOON object.
///
/// Keys: rows_written (number), file (string), row_cap_reached (bool), and
/// message (string, only when the cap was reached).
pub fn summary_toon(
    rows: usize,
    path: &Path,
    row_cap_reached: bool,
    message: Option<&str>,
) -> Result<String, LitefetchError> {
    let mut map = serde_json::Map::new();
    map.insert("rows_written".to_string(), serde_json::Value::from(rows));
    map.insert(
        "file".to_string(),
        serde_json::Value::String(path.display().to_string()),
    );
    map.insert(
        "row_cap_reached".to_string(),
        serde_json::Value::Bool(row_cap_reached),
    );
    if let Some(msg) = message {
        map.insert(
            "message".to_string(),
            serde_json::Value::String(msg.to_string()),
        );
    }

    toon_format::encode_default(&serde_json::Value::Object(map)).map_err(|e| {
        LitefetchError::Format {
            message: e.to_string(),
        }
    })
}

/// Print the file output summary to stdout.
pub fn print_summary(
    rows: usize,
    path: &Path,
    row_cap_reached: bool,
    message: Option<&str>,
) -> Result<(), LitefetchError> {
    print!("{}", summary_toon(rows, path, row_cap_reached, message)?);
    Ok(())
}

/// Message shown when the automatic row cap was reached. The result may
/// hold every row there is, so it only says more may exist.
pub fn row_cap_message(limit: usize) -> String {
    format!(
        "Showing the first {limit} rows (automatic limit); more may exist. \
         Add a LIMIT clause or use --no-limit to return all rows."
    )
}

/// Print the row cap notice to stderr for interactive visibility.
pub fn print_row_cap_warning(message: &str) {
    eprintln!("warning: {}", message);
}

/// Redraw the load progress line on stderr; a newline follows 100%.
pub fn print_progress(percent: f64) {
    let mut stderr = std::io::stderr().lock();
    let _ = write!(stderr, "\rloading {:>5.1}%", percent);
    if percent >= 100.0 {
        let _ = writeln!(stderr);
    }
    let _ = stderr.flush();
}

fn ensure_parent_exists(path: &Path) -> Result<(), LitefetchError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        return Err(LitefetchError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("parent directory does not exist: {}", parent.display()),
        )));
    }
    Ok(())
}

/// Write TOON string to a file.
pub fn write_file(toon_string: &str, path: &Path) -> Result<(), LitefetchError> {
    write_bytes(toon_string.as_bytes(), path)
}

/// Write raw bytes to a file whose parent directory must already exist.
pub fn write_bytes(bytes: &[u8], path: &Path) -> Result<(), LitefetchError> {
    ensure_parent_exists(path)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Print the `fetch` summary to stdout as a TOON object.
pub fn print_fetch_summary(bytes: usize, path: &Path) -> Result<(), LitefetchError> {
    let mut map = serde_json::Map::new();
    map.insert("bytes_written".to_string(), serde_json::Value::from(bytes));
    map.insert(
        "file".to_string(),
        serde_json::Value::String(path.display().to_string()),
    );
    let toon = toon_format::encode_default(&serde_json::Value::Object(map)).map_err(|e| {
        LitefetchError::Format {
            message: e.to_string(),
        }
    })?;
    print!("{}", toon);
    Ok(())
}
