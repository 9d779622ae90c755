use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};

/// Layouts tried first when the input carries a 4-digit year.
/// Day-first wins over month-first for ambiguous inputs like `03/04/2024`.
const LONG_YEAR_LAYOUTS: &[&str] = &["%d/%m/%Y", "%m/%d/%Y", "%Y-%m-%d"];

/// Layouts tried first when the year is written with 2 digits
const SHORT_YEAR_LAYOUTS: &[&str] = &["%d/%m/%y", "%m/%d/%y"];

/// Generic fallback layouts (month names, other separators)
const FALLBACK_LAYOUTS: &[&str] = &[
    "%Y/%m/%d",
    "%d-%m-%Y",
    "%m-%d-%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d %B, %Y",
    "%A, %B %d, %Y",
    "%A %B %d %Y",
];

/// Parse a date written in any of the conventions seen in generated reports.
///
/// Returns `None` (never panics) when nothing matches. Empty cells, a lone
/// dash, and "assumed complete" markers are treated as no date at all.
pub fn parse_flexible_date(input: &str) -> Option<NaiveDate> {
    let cleaned = input.trim().trim_matches('*').trim();
    if cleaned.is_empty() || cleaned == "-" {
        return None;
    }
    if cleaned.to_lowercase().contains("assumed complete") {
        return None;
    }

    let primary = if has_long_year(cleaned) {
        LONG_YEAR_LAYOUTS
    } else {
        SHORT_YEAR_LAYOUTS
    };
    primary
        .iter()
        .chain(FALLBACK_LAYOUTS)
        .find_map(|layout| NaiveDate::parse_from_str(cleaned, layout).ok())
        .or_else(|| parse_timestamp(cleaned))
}

/// Timestamps with a time component, truncated to the date
fn parse_timestamp(s: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(s, layout).ok())
        .map(|dt| dt.date())
}

/// True if some run of digits in `s` is exactly four long
fn has_long_year(s: &str) -> bool {
    s.split(|c: char| !c.is_ascii_digit()).any(|run| run.len() == 4)
}

/// `YYYY-MM-DD`
pub fn format_iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Format an optional date, empty string when absent (the persisted form)
pub fn format_optional_date(date: Option<NaiveDate>) -> String {
    date.map(format_iso_date).unwrap_or_default()
}

/// `date + n` calendar days, saturating at the representable range
pub fn add_days(date: NaiveDate, n: i64) -> NaiveDate {
    Duration::try_days(n)
        .and_then(|delta| date.checked_add_signed(delta))
        .unwrap_or(if n >= 0 { NaiveDate::MAX } else { NaiveDate::MIN })
}

/// Start of work that ends on `end` after `duration_days` days of duration.
/// Reports state the end as the day the duration runs out, so the start is
/// `end - duration_days`.
pub fn start_from_end(end: NaiveDate, duration_days: i64) -> NaiveDate {
    add_days(end, -duration_days)
}

/// Whole days from `start` to `end` (negative if `end` precedes `start`)
pub fn span_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_from_end() {
        let end = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert_eq!(start_from_end(end, 5), NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(start_from_end(end, 0), end);
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_blank_markers_are_none() {
        assert_eq!(parse_flexible_date(""), None);
        assert_eq!(parse_flexible_date("   "), None);
        assert_eq!(parse_flexible_date("-"), None);
        assert_eq!(parse_flexible_date("Assumed Complete"), None);
        assert_eq!(parse_flexible_date("2024-01-01 (assumed complete)"), None);
    }

    #[test]
    fn test_iso() {
        assert_eq!(parse_flexible_date("2024-03-10"), Some(d(2024, 3, 10)));
        assert_eq!(parse_flexible_date("**2024-03-10**"), Some(d(2024, 3, 10)));
    }

    #[test]
    fn test_day_first_wins_when_ambiguous() {
        assert_eq!(parse_flexible_date("03/04/2024"), Some(d(2024, 4, 3)));
    }

    #[test]
    fn test_month_first_when_day_first_impossible() {
        assert_eq!(parse_flexible_date("12/25/2024"), Some(d(2024, 12, 25)));
    }

    #[test]
    fn test_two_digit_years() {
        assert_eq!(parse_flexible_date("10/03/24"), Some(d(2024, 3, 10)));
        assert_eq!(parse_flexible_date("12/31/24"), Some(d(2024, 12, 31)));
    }

    #[test]
    fn test_fallback_layouts() {
        assert_eq!(parse_flexible_date("March 10, 2024"), Some(d(2024, 3, 10)));
        assert_eq!(parse_flexible_date("Mar 10, 2024"), Some(d(2024, 3, 10)));
        assert_eq!(parse_flexible_date("10 March 2024"), Some(d(2024, 3, 10)));
        assert_eq!(parse_flexible_date("2024/03/10"), Some(d(2024, 3, 10)));
        assert_eq!(parse_flexible_date("2024-03-10T08:30:00Z"), Some(d(2024, 3, 10)));
        assert_eq!(parse_flexible_date("2024-03-10T08:30:00"), Some(d(2024, 3, 10)));
    }

    #[test]
    fn test_garbage_is_none() {
        assert_eq!(parse_flexible_date("TBD"), None);
        assert_eq!(parse_flexible_date("Week 3"), None);
        assert_eq!(parse_flexible_date("31/31/2024"), None);
    }

    #[test]
    fn test_format_and_arithmetic() {
        assert_eq!(format_iso_date(d(2024, 1, 5)), "2024-01-05");
        assert_eq!(format_optional_date(None), "");
        assert_eq!(add_days(d(2024, 2, 28), 1), d(2024, 2, 29));
        assert_eq!(add_days(d(2024, 3, 1), -1), d(2024, 2, 29));
        assert_eq!(span_days(d(2024, 1, 1), d(2024, 1, 18)), 17);
        assert_eq!(span_days(d(2024, 1, 18), d(2024, 1, 1)), -17);
    }
}
