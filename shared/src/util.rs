use chrono::Datelike;

/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Calendar year in the server's local time zone.
///
/// Document numbers are keyed by this year, so a memo created at 23:59 on
/// 31 December belongs to the closing year even if UTC has already rolled over.
pub fn current_year() -> i32 {
    chrono::Local::now().year()
}

/// Today's date in the server's local time zone
pub fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}
