use chrono::{Datelike, NaiveDate};

/// Day number with 0001-01-01 as day 1 (proleptic Gregorian).
pub fn to_ordinal(date: NaiveDate) -> i64 {
    i64::from(date.num_days_from_ce())
}

pub fn from_ordinal(ordinal: i64) -> Option<NaiveDate> {
    i32::try_from(ordinal)
        .ok()
        .and_then(NaiveDate::from_num_days_from_ce_opt)
}

/// Formats a timestamp-axis position as `mm/YYYY` for tick labels.
pub fn format_month_year(position: f64) -> String {
    if !position.is_finite() {
        return String::new();
    }
    from_ordinal(position.floor() as i64)
        .map(|date| date.format("%m/%Y").to_string())
        .unwrap_or_default()
}
