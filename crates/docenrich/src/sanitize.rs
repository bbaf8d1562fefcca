//! Helpers for sanitizing user-supplied names and keeping secrets out of
//! tracing span attributes.

use std::sync::OnceLock;

use regex::Regex;

const FALLBACK_FILENAME: &str = "upload";

fn unsafe_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("static regex"))
}

/// Reduces a client-supplied filename to a safe ASCII name.
///
/// Path components are dropped, whitespace becomes `_`, any character outside
/// `[A-Za-z0-9_.-]` is removed and leading dots are stripped. An empty result
/// falls back to `upload`.
pub fn secure_filename(filename: &str) -> String {
    let last = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let joined = last.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned = unsafe_chars().replace_all(&joined, "");
    let trimmed = cleaned.trim_start_matches('.').trim_end_matches('.');

    if trimmed.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Strips the query string (SAS tokens, signatures) from a URL.
///
/// Safe for span fields and logs; the returned value still identifies the
/// object.
pub fn redact_url(url: &str) -> String {
    match url.split_once('?') {
        Some((base, _)) => format!("{}?****", base),
        None => url.to_string(),
    }
}
