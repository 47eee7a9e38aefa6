// Seed date parsing and candidate date generation

use crate::error::DateError;
use chrono::{Datelike, NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Every day number the day-wrap search cycles through.
const DAYS_IN_CYCLE: u32 = 31;

/// Upper bound on dates generated from one seed in offset mode.
pub const MAX_OFFSET_COUNT: usize = 3660;

/// How a seed date is turned into candidate dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExpansionMode {
    /// Every valid day of the seed's month, starting at the seed day.
    #[default]
    DayWrap,
    /// `count` dates, each `increment` days after the previous.
    Offset,
    /// The seed date only.
    Single,
}

impl ExpansionMode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "day-wrap" | "daywrap" | "wrap" => Some(ExpansionMode::DayWrap),
            "offset" => Some(ExpansionMode::Offset),
            "single" => Some(ExpansionMode::Single),
            _ => None,
        }
    }
}

/// A calendar-valid `(month, day, year)`. Only built through [`SeedDate::new`]
/// or parsing, so the date always exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedDate {
    month: u32,
    day: u32,
    year: i32,
}

impl SeedDate {
    pub fn new(month: u32, day: u32, year: i32) -> Result<Self, DateError> {
        if is_valid_date(month, day, year) {
            Ok(Self { month, day, year })
        } else {
            Err(DateError::Invalid { month, day, year })
        }
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn to_naive(self) -> NaiveDate {
        // Construction already proved the date exists.
        NaiveDate::from_ymd_opt(self.year, self.month, self.day).unwrap_or(NaiveDate::MIN)
    }
}

impl FromStr for SeedDate {
    type Err = DateError;

    /// `M/D/YYYY`, zero padding optional.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || DateError::Malformed(s.to_string());
        let parts: Vec<&str> = s.trim().split('/').map(str::trim).collect();
        let [month, day, year] = parts.as_slice() else {
            return Err(malformed());
        };
        let month = month.parse::<u32>().map_err(|_| malformed())?;
        let day = day.parse::<u32>().map_err(|_| malformed())?;
        let year = year.parse::<i32>().map_err(|_| malformed())?;
        Self::new(month, day, year)
    }
}

impl fmt::Display for SeedDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_date(self.month, self.day, self.year))
    }
}

/// Month in 1..=12 and day within that month, leap years included.
pub fn is_valid_date(month: u32, day: u32, year: i32) -> bool {
    NaiveDate::from_ymd_opt(year, month, day).is_some()
}

pub fn format_date(month: u32, day: u32, year: i32) -> String {
    format!("{:02}/{:02}/{:04}", month, day, year)
}

/// `count` dates starting at `seed`, stepping `increment` days with real
/// calendar arithmetic. `count` is capped at [`MAX_OFFSET_COUNT`].
pub fn offset_dates(seed: SeedDate, count: usize, increment: i64) -> Vec<String> {
    let start = seed.to_naive();
    let count = if count > MAX_OFFSET_COUNT {
        warn!(
            "Row count {} for {} exceeds {}, truncating",
            count, seed, MAX_OFFSET_COUNT
        );
        MAX_OFFSET_COUNT
    } else {
        count
    };
    let mut out = Vec::new();

    for i in 0..count {
        let date = increment
            .checked_mul(i as i64)
            .and_then(TimeDelta::try_days)
            .and_then(|delta| start.checked_add_signed(delta));
        match date {
            Some(date) => out.push(format_date(date.month(), date.day(), date.year())),
            None => {
                warn!("Date range from {} overflows after {} of {} dates", seed, i, count);
                break;
            }
        }
    }
    out
}

/// Valid days of the seed's month, cycling from the seed day: 31 candidate
/// day numbers with the impossible ones dropped.
pub fn day_wrap_dates(seed: SeedDate) -> Vec<String> {
    (0..DAYS_IN_CYCLE)
        .map(|offset| (seed.day + offset - 1) % DAYS_IN_CYCLE + 1)
        .filter(|&day| is_valid_date(seed.month, day, seed.year))
        .map(|day| format_date(seed.month, day, seed.year))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_unpadded_seed() {
        let seed: SeedDate = "1/5/1990".parse().unwrap();
        assert_eq!(seed, SeedDate::new(1, 5, 1990).unwrap());
        assert_eq!((seed.month(), seed.day(), seed.year()), (1, 5, 1990));
        assert_eq!(seed.to_string(), "01/05/1990");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!("1990-01-05".parse::<SeedDate>(), Err(DateError::Malformed(_))));
        assert!(matches!("aa/01/1990".parse::<SeedDate>(), Err(DateError::Malformed(_))));
        assert!(matches!("1/2/3/4".parse::<SeedDate>(), Err(DateError::Malformed(_))));
        assert!(matches!("".parse::<SeedDate>(), Err(DateError::Malformed(_))));
    }

    #[test]
    fn test_parse_rejects_impossible_date() {
        assert_eq!(
            "04/31/2020".parse::<SeedDate>(),
            Err(DateError::Invalid { month: 4, day: 31, year: 2020 })
        );
    }

    #[test]
    fn test_leap_years() {
        assert!(is_valid_date(2, 29, 2024));
        assert!(!is_valid_date(2, 29, 2023));
        assert!(!is_valid_date(2, 29, 1900));
        assert!(is_valid_date(2, 29, 2000));
        assert!(!is_valid_date(13, 1, 2000));
        assert!(!is_valid_date(0, 1, 2000));
        assert!(!is_valid_date(1, 0, 2000));
    }

    #[test]
    fn test_negative_increment_walks_backwards() {
        let seed = SeedDate::new(3, 1, 2024).unwrap();
        assert_eq!(offset_dates(seed, 2, -1), vec!["03/01/2024", "02/29/2024"]);
    }

    #[test]
    fn test_huge_count_is_capped() {
        let seed = SeedDate::new(1, 1, 1990).unwrap();
        assert_eq!(offset_dates(seed, usize::MAX, 1).len(), MAX_OFFSET_COUNT);
    }
}
