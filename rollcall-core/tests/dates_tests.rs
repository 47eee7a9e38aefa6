// Tests for candidate date generation

use rollcall_core::dates::{
    ExpansionMode, SeedDate, day_wrap_dates, format_date, is_valid_date, offset_dates,
};

fn seed(s: &str) -> SeedDate {
    s.parse().unwrap()
}

// ============================================================================
// Day-Wrap Tests
// ============================================================================

#[test]
fn test_day_wrap_short_month_drops_invalid_days() {
    let dates = day_wrap_dates(seed("2/28/2023"));
    assert_eq!(dates.len(), 28);
    assert!(dates.iter().all(|d| d.starts_with("02/") && d.ends_with("/2023")));
    for day in 29..=31 {
        assert!(!dates.contains(&format!("02/{}/2023", day)));
    }
    assert_eq!(dates[0], "02/28/2023");
    assert_eq!(dates[1], "02/01/2023");
}

#[test]
fn test_day_wrap_long_month_yields_every_day() {
    let dates = day_wrap_dates(seed("1/31/2024"));
    assert_eq!(dates.len(), 31);
    assert_eq!(dates[0], "01/31/2024");
    assert_eq!(dates[1], "01/01/2024");
    assert_eq!(dates[30], "01/30/2024");
}

#[test]
fn test_day_wrap_leap_february() {
    let dates = day_wrap_dates(seed("2/15/2024"));
    assert_eq!(dates.len(), 29);
    assert!(dates.contains(&"02/29/2024".to_string()));
}

#[test]
fn test_day_wrap_starts_at_seed_day() {
    let dates = day_wrap_dates(seed("4/10/1985"));
    assert_eq!(dates.len(), 30);
    assert_eq!(&dates[..3], ["04/10/1985", "04/11/1985", "04/12/1985"]);
    assert_eq!(dates.last().unwrap(), "04/09/1985");
}

// ============================================================================
// Offset Tests
// ============================================================================

#[test]
fn test_offset_consecutive_days() {
    assert_eq!(
        offset_dates(seed("10/01/1990"), 3, 1),
        vec!["10/01/1990", "10/02/1990", "10/03/1990"]
    );
}

#[test]
fn test_offset_crosses_month_and_year() {
    assert_eq!(
        offset_dates(seed("12/30/1999"), 3, 1),
        vec!["12/30/1999", "12/31/1999", "01/01/2000"]
    );
}

#[test]
fn test_offset_weekly_increment() {
    assert_eq!(
        offset_dates(seed("2/20/2024"), 3, 7),
        vec!["02/20/2024", "02/27/2024", "03/05/2024"]
    );
}

#[test]
fn test_offset_zero_count() {
    assert!(offset_dates(seed("1/1/2000"), 0, 1).is_empty());
}

#[test]
fn test_offset_overflow_stops_early() {
    let dates = offset_dates(seed("1/1/2000"), 3, i64::MAX / 2);
    assert_eq!(dates, vec!["01/01/2000"]);
}

#[test]
fn test_every_generated_date_is_valid() {
    for s in ["2/28/2023", "2/29/2024", "6/30/2001", "12/31/1999"] {
        let mut dates = day_wrap_dates(seed(s));
        dates.extend(offset_dates(seed(s), 40, 3));
        for date in dates {
            let parsed: SeedDate = date.parse().unwrap();
            assert!(is_valid_date(parsed.month(), parsed.day(), parsed.year()));
            assert_eq!(date.len(), 10);
        }
    }
}

// ============================================================================
// Formatting and Mode Tests
// ============================================================================

#[test]
fn test_format_date_pads() {
    assert_eq!(format_date(3, 7, 1954), "03/07/1954");
}

#[test]
fn test_expansion_mode_from_str() {
    assert_eq!(ExpansionMode::from_str("Day-Wrap"), Some(ExpansionMode::DayWrap));
    assert_eq!(ExpansionMode::from_str("offset"), Some(ExpansionMode::Offset));
    assert_eq!(ExpansionMode::from_str("single"), Some(ExpansionMode::Single));
    assert_eq!(ExpansionMode::from_str("weekly"), None);
}
