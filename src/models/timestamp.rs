//! Canonical string form for timestamps in the JSON transport.

use chrono::{NaiveDateTime, Timelike};

pub const TIMESTAMP_FORMAT: &str = "%m/%d/%Y, %H:%M:%S:%6f";

pub fn to_string(value: &NaiveDateTime) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse(value: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
}

/// Drops sub-microsecond precision, which the string form cannot carry.
pub fn truncate(value: NaiveDateTime) -> NaiveDateTime {
    let micros = value.nanosecond() / 1_000 * 1_000;
    value.with_nanosecond(micros).unwrap_or(value)
}

pub fn now() -> NaiveDateTime {
    truncate(chrono::Utc::now().naive_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_format_and_parse() {
        let value = NaiveDate::from_ymd_opt(2021, 6, 3)
            .unwrap()
            .and_hms_micro_opt(14, 5, 9, 120_034)
            .unwrap();

        let rendered = to_string(&value);
        assert_eq!(rendered, "06/03/2021, 14:05:09:120034");
        assert_eq!(parse(&rendered).unwrap(), value);
    }

    #[test]
    fn test_truncate_keeps_microseconds() {
        let value = NaiveDate::from_ymd_opt(2021, 6, 3)
            .unwrap()
            .and_hms_nano_opt(1, 2, 3, 456_789_999)
            .unwrap();

        assert_eq!(truncate(value).nanosecond(), 456_789_000);
    }
}
