//! Fixed-window arithmetic (UTC).

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Timelike, Utc};

use curio_types::quota::QuotaWindow;

/// Identifier of the bucket `now` falls in, plus the instant it ends.
pub fn bucket(window: QuotaWindow, now: DateTime<Utc>) -> (String, DateTime<Utc>) {
    match window {
        QuotaWindow::Minute => {
            let start = now
                .with_second(0)
                .and_then(|t| t.with_nanosecond(0))
                .unwrap_or(now);
            (start.format("%Y%m%d%H%M").to_string(), start + Duration::minutes(1))
        }
        QuotaWindow::Day => {
            let start = now
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .map(|t| Utc.from_utc_datetime(&t))
                .unwrap_or(now);
            (start.format("%Y%m%d").to_string(), start + Duration::days(1))
        }
        QuotaWindow::Month => {
            let (year, month) = if now.month() == 12 {
                (now.year() + 1, 1)
            } else {
                (now.year(), now.month() + 1)
            };
            let reset = NaiveDate::from_ymd_opt(year, month, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|t| Utc.from_utc_datetime(&t))
                .unwrap_or(now + Duration::days(31));
            (now.format("%Y%m").to_string(), reset)
        }
    }
}

/// Whole seconds until `resets_at`, never less than one.
pub fn seconds_until(resets_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let millis = (resets_at - now).num_milliseconds().max(0) as u64;
    millis.div_ceil(1000).max(1)
}
