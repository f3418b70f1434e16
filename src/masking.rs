use secrecy::{ExposeSecret, SecretString};

const REDACTED: &str = "[REDACTED]";

/// Format a secret value, respecting the show_secrets flag.
pub fn format_secret(secret: &SecretString, show_secrets: bool) -> String {
    if show_secrets {
        secret.expose_secret().to_string()
    } else {
        REDACTED.to_string()
    }
}

/// Format an optional secret value.
pub fn format_optional_secret(secret: Option<&SecretString>, show_secrets: bool) -> String {
    match secret {
        Some(s) => format_secret(s, show_secrets),
        None => "(not set)".to_string(),
    }
}

/// Format a URL for diagnostics, hiding its query string.
///
/// Signed download links carry their credentials in the query.
pub fn format_url(url: &str, show_secrets: bool) -> String {
    match url.split_once('?') {
        Some((base, _)) if !show_secrets => format!("{base}?{REDACTED}"),
        _ => url.to_string(),
    }
}
