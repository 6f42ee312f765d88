use arrow::datatypes::Date32Type;
use chrono::NaiveDate;

/// Observation columns are the ones whose header is made of ASCII digits only.
pub fn is_date_column(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_digit())
}

/// Strict parse of a `"YYYYMMDD"` header into a calendar date.
pub fn parse_yyyymmdd(s: &str) -> Option<NaiveDate> {
    if s.len() != 8 || !is_date_column(s) {
        return None;
    }
    let year: i32 = s[0..4].parse().ok()?;
    let month: u32 = s[4..6].parse().ok()?;
    let day: u32 = s[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// `YYYYMMDD` → days since the Unix epoch, the Arrow `Date32` encoding.
pub fn parse_date32(s: &str) -> Option<i32> {
    parse_yyyymmdd(s).map(Date32Type::from_naive_date)
}
