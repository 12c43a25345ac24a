// src/utils.rs

/// Search term used when the seeker triggers a nearby search with an empty box
pub const DEFAULT_SEARCH_TERM: &str = "iş yerleri";

/// Trim a free-text query, substituting the generic term when blank
pub fn normalize_query(query: &str) -> String {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        DEFAULT_SEARCH_TERM.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Case-insensitive substring match, empty needle matches everything
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Returns the value when it carries non-whitespace text
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
