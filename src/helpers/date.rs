//! Date helper functions

use chrono::NaiveDate;

/// Format a date in full format (like "December 20, 2024")
pub fn long_date(date: &NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Format a date in abbreviated format (like "Dec 20, 2024")
pub fn short_date(date: &NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// Format a date as used in `datetime` attributes
pub fn iso_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Midnight UTC of the date, RFC 3339 (for the Atom feed)
pub fn date_rfc3339(date: &NaiveDate) -> String {
    format!("{}T00:00:00Z", iso_date(date))
}
