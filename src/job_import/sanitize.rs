// src/job_import/sanitize.rs
use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

lazy_static! {
    // Shortest <script ...> ... </script> pair, any case, across newlines
    static ref SCRIPT_BLOCK: Regex = Regex::new(r"(?is)<script\b.*?</script\s*>").unwrap();
}

/// Strip embedded script blocks and surrounding whitespace.
///
/// Only guards plain-text fields against script injection. The output is not
/// safe to render as unescaped markup.
pub fn sanitize_text(text: &str) -> String {
    SCRIPT_BLOCK.replace_all(text, "").trim().to_string()
}

/// Lowercase hostname of an absolute URL, or an empty string.
pub fn extract_domain(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
        .unwrap_or_default()
}

/// Keep at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}
