// Date and timezone utilities
// Converts UTC offsets into whole-slot grid rotations

use chrono::{Datelike, Local, NaiveDate, Offset, TimeZone, Utc};
use chrono_tz::Tz;

use crate::models::grid::SLOT_MINUTES;

pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn parse_iso_date(input: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
}

/// The machine's current UTC offset in minutes.
pub fn local_offset_minutes() -> i32 {
    Local::now().offset().fix().local_minus_utc() / 60
}

/// UTC offset in minutes of a named IANA timezone at noon on `date`.
///
/// Noon keeps the sample clear of midnight DST transitions, which is when
/// offset changes actually take effect.
pub fn named_tz_offset_minutes(name: &str, date: NaiveDate) -> Option<i32> {
    let tz: Tz = name.parse().ok()?;
    let noon = tz
        .with_ymd_and_hms(date.year(), date.month(), date.day(), 12, 0, 0)
        .single()?;
    Some(noon.offset().fix().local_minus_utc() / 60)
}

/// Number of whole grid slots a UTC offset rotates the day by, rounded to
/// the nearest slot. UTC+9 maps to 54 slots; UTC-5 maps to -30.
pub fn offset_slots(offset_minutes: i32) -> i32 {
    (offset_minutes as f64 / SLOT_MINUTES as f64).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_parse_iso_date() {
        let date = parse_iso_date("2025-03-09").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 3, 9).unwrap());
        assert!(parse_iso_date("09/03/2025").is_err());
        assert!(parse_iso_date("not a date").is_err());
    }

    #[test_case(540, 54; "tokyo")]
    #[test_case(-300, -30; "new york standard")]
    #[test_case(0, 0; "utc")]
    #[test_case(345, 35; "kathmandu rounds up")]
    #[test_case(-210, -21; "tehran standard")]
    fn test_offset_slots(minutes: i32, expected: i32) {
        assert_eq!(offset_slots(minutes), expected);
    }

    #[test]
    fn test_named_tz_offset() {
        let winter = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let summer = NaiveDate::from_ymd_opt(2025, 7, 15).unwrap();

        assert_eq!(named_tz_offset_minutes("Asia/Tokyo", winter), Some(540));
        assert_eq!(named_tz_offset_minutes("America/New_York", winter), Some(-300));
        assert_eq!(named_tz_offset_minutes("America/New_York", summer), Some(-240));
        assert_eq!(named_tz_offset_minutes("Not/AZone", winter), None);
    }

    #[test]
    fn test_named_tz_feeds_rotation() {
        let winter = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let minutes = named_tz_offset_minutes("Asia/Tokyo", winter).unwrap();
        assert_eq!(offset_slots(minutes), 54);
    }
}
