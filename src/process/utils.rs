/// Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    }
}

/// Parse a numeric cell. Empty cells, unparseable text and NaN all count as
/// missing, which is how the dataframe readers treat `""`, `NA` or `NaN`.
pub fn parse_float(raw: Option<&str>) -> Option<f64> {
    let cleaned = clean_str(raw?);
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| !v.is_nan())
}
