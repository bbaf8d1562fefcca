//! Mapping from detected ISO 639-1 codes to display names.

/// Reported when no language could be determined.
pub const UNKNOWN_LANGUAGE: &str = "unknown";

const LANGUAGE_NAMES: [(&str, &str); 26] = [
    ("en", "English"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("it", "Italian"),
    ("zh", "Chinese"),
    ("ja", "Japanese"),
    ("ru", "Russian"),
    ("pt", "Portuguese"),
    ("ar", "Arabic"),
    ("hi", "Hindi"),
    ("ko", "Korean"),
    ("tr", "Turkish"),
    ("nl", "Dutch"),
    ("sv", "Swedish"),
    ("pl", "Polish"),
    ("fi", "Finnish"),
    ("da", "Danish"),
    ("no", "Norwegian"),
    ("el", "Greek"),
    ("he", "Hebrew"),
    ("cs", "Czech"),
    ("ro", "Romanian"),
    ("hu", "Hungarian"),
    ("th", "Thai"),
    ("id", "Indonesian"),
];

pub fn language_name(code: &str) -> Option<&'static str> {
    LANGUAGE_NAMES
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, name)| *name)
}

/// Name for a detection outcome: the table name, the code verbatim when the
/// table has no entry, or `unknown`.
pub fn display_name(code: Option<&str>) -> String {
    match code {
        Some(code) => language_name(code).unwrap_or(code).to_string(),
        None => UNKNOWN_LANGUAGE.to_string(),
    }
}
