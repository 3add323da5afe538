//! Date validation against the formats the search index accepts.

use chrono::NaiveDateTime;
use chrono::format::{self, Parsed, StrftimeItems};
use tracing::debug;

/// Accepted formats, tried in order. `%.f` also matches a value without a
/// fraction, so each time shape is listed once with and once without `Z`.
const DATE_FORMATS: &[&str] = &[
    "%Y",
    "%Y-%m",
    "%y-%m",
    "%y-%m-%d",
    "%Y-%m-%d",
    "%y%m%d",
    "%Y%m%d",
    "%m/%d/%y",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%yT%H",
    "%yT%HZ",
    "%yT%H:%M",
    "%yT%H:%MZ",
    "%yT%H:%M:%S%.f",
    "%yT%H:%M:%S%.fZ",
    "%y-%mT%H",
    "%y-%mT%HZ",
    "%y-%mT%H:%M",
    "%y-%mT%H:%MZ",
    "%y-%mT%H:%M:%S%.f",
    "%y-%mT%H:%M:%S%.fZ",
    "%y-%m-%dT%H",
    "%y-%m-%dT%HZ",
    "%y-%m-%dT%H:%M",
    "%y-%m-%dT%H:%MZ",
    "%y-%m-%dT%H:%M:%S%.f",
    "%y-%m-%dT%H:%M:%S%.fZ",
    "%YT%H",
    "%YT%HZ",
    "%YT%H:%M",
    "%YT%H:%MZ",
    "%YT%H:%M:%S%.f",
    "%YT%H:%M:%S%.fZ",
    "%Y-%mT%H",
    "%Y-%mT%HZ",
    "%Y-%mT%H:%M",
    "%Y-%mT%H:%MZ",
    "%Y-%mT%H:%M:%S%.f",
    "%Y-%mT%H:%M:%S%.fZ",
    "%Y-%m-%dT%H",
    "%Y-%m-%dT%HZ",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%MZ",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.fZ",
];

/// Parse a date string in one of the accepted formats.
pub fn parse_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|date_format| parse_with(value, date_format))
}

fn parse_with(value: &str, date_format: &str) -> Option<NaiveDateTime> {
    if !year_width_matches(value, date_format) {
        return None;
    }
    let mut parsed = Parsed::new();
    format::parse(&mut parsed, value, StrftimeItems::new(date_format)).ok()?;
    // Unparsed fields default to the start of their period. A setter fails
    // without overwriting when the field was already parsed.
    let _ = parsed.set_month(1);
    let _ = parsed.set_day(1);
    let _ = parsed.set_hour(0);
    let _ = parsed.set_minute(0);
    let date = parsed.to_naive_date().ok()?;
    let time = parsed.to_naive_time().ok()?;
    Some(date.and_time(time))
}

/// `%Y` takes exactly four digits and `%y` exactly two. chrono reads any
/// width up to that, so a separated year is checked here. Compact formats
/// like `%Y%m%d` are positional and need no check.
fn year_width_matches(value: &str, date_format: &str) -> bool {
    let leading = value.bytes().take_while(u8::is_ascii_digit).count();
    let trailing = value.bytes().rev().take_while(u8::is_ascii_digit).count();
    let separated = date_format.as_bytes().get(2) != Some(&b'%');
    if date_format.starts_with("%Y") && separated {
        leading == 4
    } else if date_format.starts_with("%y") && separated {
        leading == 2
    } else if date_format.ends_with("%Y") {
        trailing == 4
    } else if date_format.ends_with("%y") {
        trailing == 2
    } else {
        true
    }
}

/// True when `value` parses; otherwise logs at debug level.
pub fn validate_date(value: &str, source_record_id: &str) -> bool {
    if parse_date(value).is_some() {
        return true;
    }
    debug!(
        source_record_id,
        date = value,
        "Record ID '{source_record_id}' has a date that couldn't be parsed: '{value}'"
    );
    false
}

/// True when both ends parse and `start <= end`.
pub fn validate_date_range(start: &str, end: &str, source_record_id: &str) -> bool {
    match (parse_date(start), parse_date(end)) {
        (Some(start_date), Some(end_date)) if start_date <= end_date => true,
        (Some(_), Some(_)) => {
            debug!(
                source_record_id,
                "Record ID '{source_record_id}' has a later start date than end date: '{start}', '{end}'"
            );
            false
        }
        _ => {
            debug!(
                source_record_id,
                "Record ID '{source_record_id}' has invalid values in a date range: '{start}', '{end}'"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn accepts_configured_shapes() {
        for value in [
            "2020",
            "2020-03",
            "20-03",
            "2020-03-01",
            "20-03-01",
            "20200301",
            "200301",
            "03/01/2020",
            "03/01/20",
            "2020/03/01",
            "2020T10",
            "20T10Z",
            "2020-03-01T10:15",
            "2020-03-01T10:15:30Z",
            "2020-03-01T10:15:30.123456",
            "2020-03T10:15:30.5Z",
        ] {
            assert!(parse_date(value).is_some(), "expected {value} to parse");
        }
    }

    #[test]
    fn rejects_invalid_values() {
        for value in [
            "",
            "20",
            "2020-13",
            "2020-02-30",
            "March 2020",
            "2020-03-01 10:15:30",
            "2020-03-01T25:00",
            "03/01/2020T10:00",
            "12345",
            "2-03",
            "020-03-01",
            "3/1/202",
        ] {
            assert!(parse_date(value).is_none(), "expected {value} to be rejected");
        }
    }

    #[test]
    fn two_digit_years_pivot() {
        assert_eq!(
            parse_date("68-01-01").map(|date| date.date()),
            NaiveDate::from_ymd_opt(2068, 1, 1)
        );
        assert_eq!(
            parse_date("70-01-01").map(|date| date.date()),
            NaiveDate::from_ymd_opt(1970, 1, 1)
        );
    }

    #[test]
    fn missing_fields_default_to_start_of_period() {
        assert_eq!(
            parse_date("2020"),
            NaiveDate::from_ymd_opt(2020, 1, 1).and_then(|date| date.and_hms_opt(0, 0, 0))
        );
        assert_eq!(
            parse_date("2020-03T10"),
            NaiveDate::from_ymd_opt(2020, 3, 1).and_then(|date| date.and_hms_opt(10, 0, 0))
        );
        assert_eq!(
            parse_date("2020-03-01T10:15:30.5Z"),
            NaiveDate::from_ymd_opt(2020, 3, 1)
                .and_then(|date| date.and_hms_milli_opt(10, 15, 30, 500))
        );
        assert_eq!(
            parse_date("03/01/2020").map(|date| date.date()),
            NaiveDate::from_ymd_opt(2020, 3, 1)
        );
    }

    #[test]
    fn range_requires_ordered_valid_bounds() {
        assert!(validate_date_range("1990", "2000", "rec-1"));
        assert!(validate_date_range("2000", "2000", "rec-1"));
        assert!(!validate_date_range("2001", "2000", "rec-1"));
        assert!(!validate_date_range("1990", "not a date", "rec-1"));
    }
}
