//! Rotation schedules
//!
//! A schedule answers two questions: when does the current period end, and
//! what suffix names the backup of a period that has ended.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, TimeZone};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Unit a rotation interval is counted in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RotationUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
    /// Roll over at local midnight
    Midnight,
    /// Roll over at midnight starting the given weekday (0 = Monday)
    Weekday(u8),
}

impl Default for RotationUnit {
    fn default() -> Self {
        Self::Weekday(0)
    }
}

impl fmt::Display for RotationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seconds => write!(f, "S"),
            Self::Minutes => write!(f, "M"),
            Self::Hours => write!(f, "H"),
            Self::Days => write!(f, "D"),
            Self::Midnight => write!(f, "MIDNIGHT"),
            Self::Weekday(day) => write!(f, "W{}", day),
        }
    }
}

impl FromStr for RotationUnit {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        let unit = match upper.as_str() {
            "S" => Self::Seconds,
            "M" => Self::Minutes,
            "H" => Self::Hours,
            "D" => Self::Days,
            "MIDNIGHT" => Self::Midnight,
            w if w.len() == 2 && w.starts_with('W') => match w[1..].parse::<u8>() {
                Ok(day) if day <= 6 => Self::Weekday(day),
                _ => return Err(ConfigError::UnknownRotationUnit(s.to_string())),
            },
            _ => return Err(ConfigError::UnknownRotationUnit(s.to_string())),
        };
        Ok(unit)
    }
}

impl TryFrom<String> for RotationUnit {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RotationUnit> for String {
    fn from(unit: RotationUnit) -> Self {
        unit.to_string()
    }
}

impl RotationUnit {
    /// strftime pattern naming backups
    pub fn suffix_format(&self) -> &'static str {
        match self {
            Self::Seconds => "%Y-%m-%d_%H-%M-%S",
            Self::Minutes => "%Y-%m-%d_%H-%M",
            Self::Hours => "%Y-%m-%d_%H",
            Self::Days | Self::Midnight | Self::Weekday(_) => "%Y-%m-%d",
        }
    }

    /// Pattern matching a backup suffix produced by [`Self::suffix_format`]
    pub fn suffix_regex(&self) -> Result<Regex, regex::Error> {
        let pattern = match self {
            Self::Seconds => r"^\d{4}-\d{2}-\d{2}_\d{2}-\d{2}-\d{2}$",
            Self::Minutes => r"^\d{4}-\d{2}-\d{2}_\d{2}-\d{2}$",
            Self::Hours => r"^\d{4}-\d{2}-\d{2}_\d{2}$",
            Self::Days | Self::Midnight | Self::Weekday(_) => r"^\d{4}-\d{2}-\d{2}$",
        };
        Regex::new(pattern)
    }
}

/// When to rotate and how many backups to keep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationSchedule {
    pub unit: RotationUnit,
    /// Number of units per period; zero is treated as one
    pub interval: u32,
    /// Backups retained after rotation; zero keeps every backup
    pub backup_count: u32,
}

impl RotationSchedule {
    pub fn new(unit: RotationUnit, interval: u32, backup_count: u32) -> Self {
        Self {
            unit,
            interval,
            backup_count,
        }
    }

    fn interval(&self) -> i64 {
        i64::from(self.interval.max(1))
    }

    fn fixed_period(&self) -> Option<Duration> {
        let n = self.interval();
        match self.unit {
            RotationUnit::Seconds => Some(Duration::seconds(n)),
            RotationUnit::Minutes => Some(Duration::minutes(n)),
            RotationUnit::Hours => Some(Duration::hours(n)),
            RotationUnit::Days | RotationUnit::Midnight | RotationUnit::Weekday(_) => None,
        }
    }

    /// First rollover instant strictly after `from`
    ///
    /// Boundaries are multiples of the period on the local clock, so every
    /// writer of a file agrees on them no matter when it opened the file.
    pub fn next_rollover(&self, from: DateTime<Local>) -> DateTime<Local> {
        if let Some(period) = self.fixed_period() {
            let step = period.num_seconds();
            let local = from.naive_local().and_utc().timestamp();
            let next = (local.div_euclid(step) + 1) * step;
            let naive = DateTime::from_timestamp(next, 0)
                .map(|dt| dt.naive_utc())
                .unwrap_or_else(|| from.naive_local() + period);
            return resolve_local(naive);
        }

        let today = from.date_naive();
        let date = match self.unit {
            RotationUnit::Weekday(day) => {
                let current = i64::from(today.weekday().num_days_from_monday());
                let mut ahead = (i64::from(day) - current).rem_euclid(7);
                if ahead == 0 {
                    ahead = 7;
                }
                today + Duration::days(ahead + 7 * (self.interval() - 1))
            }
            _ => {
                let n = self.interval();
                let next = (i64::from(today.num_days_from_ce()).div_euclid(n) + 1) * n;
                i32::try_from(next)
                    .ok()
                    .and_then(NaiveDate::from_num_days_from_ce_opt)
                    .unwrap_or_else(|| today + Duration::days(n))
            }
        };
        local_midnight(date)
    }

    /// Start of the period that ends at `rollover_at`
    pub fn period_start(&self, rollover_at: DateTime<Local>) -> DateTime<Local> {
        if let Some(period) = self.fixed_period() {
            return rollover_at - period;
        }
        let days = match self.unit {
            RotationUnit::Weekday(_) => 7 * self.interval(),
            _ => self.interval(),
        };
        local_midnight(rollover_at.date_naive() - Duration::days(days))
    }

    /// Backup suffix for the period that ends at `rollover_at`
    pub fn backup_suffix(&self, rollover_at: DateTime<Local>) -> String {
        self.period_start(rollover_at).format(self.unit.suffix_format()).to_string()
    }
}

fn local_midnight(date: NaiveDate) -> DateTime<Local> {
    resolve_local(date.and_hms_opt(0, 0, 0).unwrap_or_default())
}

/// Local instant for a wall-clock time, taking the earlier one across DST folds
fn resolve_local(naive: NaiveDateTime) -> DateTime<Local> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| Local.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("w0".parse::<RotationUnit>().unwrap(), RotationUnit::Weekday(0));
        assert_eq!("midnight".parse::<RotationUnit>().unwrap(), RotationUnit::Midnight);
        assert_eq!("H".parse::<RotationUnit>().unwrap(), RotationUnit::Hours);
        assert!("W7".parse::<RotationUnit>().is_err());
        assert!("weekly".parse::<RotationUnit>().is_err());
        assert_eq!(RotationUnit::Weekday(3).to_string(), "W3");
        assert_eq!(RotationUnit::default(), RotationUnit::Weekday(0));
    }

    #[test]
    fn test_serde_string_form() {
        let unit: RotationUnit = serde_yaml::from_str("MIDNIGHT").unwrap();
        assert_eq!(unit, RotationUnit::Midnight);
        assert_eq!(serde_yaml::to_string(&RotationUnit::Weekday(2)).unwrap().trim(), "W2");
        assert!(serde_yaml::from_str::<RotationUnit>("X").is_err());
    }

    #[test]
    fn test_fixed_interval_rollover() {
        let schedule = RotationSchedule::new(RotationUnit::Hours, 2, 3);
        let from = at(2024, 5, 1, 10, 30, 0);
        assert_eq!(schedule.next_rollover(from), at(2024, 5, 1, 12, 0, 0));
        assert_eq!(schedule.backup_suffix(at(2024, 5, 1, 12, 0, 0)), "2024-05-01_10");
    }

    #[test]
    fn test_writers_opening_at_different_times_agree() {
        let hours = RotationSchedule::new(RotationUnit::Hours, 1, 3);
        let early = hours.next_rollover(at(2024, 5, 1, 10, 2, 0));
        let late = hours.next_rollover(at(2024, 5, 1, 10, 57, 30));
        assert_eq!(early, late);
        assert_eq!(early, at(2024, 5, 1, 11, 0, 0));

        let minutes = RotationSchedule::new(RotationUnit::Minutes, 15, 3);
        assert_eq!(minutes.next_rollover(at(2024, 5, 1, 10, 1, 0)), at(2024, 5, 1, 10, 15, 0));
        assert_eq!(minutes.next_rollover(at(2024, 5, 1, 10, 14, 59)), at(2024, 5, 1, 10, 15, 0));

        let days = RotationSchedule::new(RotationUnit::Days, 3, 3);
        let a = days.next_rollover(at(2024, 5, 2, 1, 0, 0));
        let b = days.next_rollover(at(2024, 5, 4, 23, 0, 0));
        assert_eq!(a, b);
        assert_eq!(a, at(2024, 5, 5, 0, 0, 0));
        assert_eq!(days.backup_suffix(a), (a - Duration::days(3)).format("%Y-%m-%d").to_string());
    }

    #[test]
    fn test_boundary_instant_moves_to_next_period() {
        let schedule = RotationSchedule::new(RotationUnit::Seconds, 10, 3);
        assert_eq!(schedule.next_rollover(at(2024, 5, 1, 10, 0, 10)), at(2024, 5, 1, 10, 0, 20));
    }

    #[test]
    fn test_midnight_rollover() {
        let schedule = RotationSchedule::new(RotationUnit::Midnight, 1, 0);
        let from = at(2024, 5, 1, 23, 59, 59);
        let next = schedule.next_rollover(from);
        assert_eq!(next, at(2024, 5, 2, 0, 0, 0));
        assert_eq!(schedule.backup_suffix(next), "2024-05-01");
    }

    #[test]
    fn test_weekly_rollover_on_monday() {
        let schedule = RotationSchedule::new(RotationUnit::Weekday(0), 1, 12);

        // Wednesday -> next Monday
        assert_eq!(schedule.next_rollover(at(2024, 5, 1, 9, 0, 0)), at(2024, 5, 6, 0, 0, 0));
        // Monday itself -> the Monday after
        assert_eq!(schedule.next_rollover(at(2024, 5, 6, 0, 0, 1)), at(2024, 5, 13, 0, 0, 0));
        assert_eq!(schedule.backup_suffix(at(2024, 5, 13, 0, 0, 0)), "2024-05-06");
    }

    #[test]
    fn test_zero_interval_treated_as_one() {
        let schedule = RotationSchedule::new(RotationUnit::Minutes, 0, 1);
        let from = at(2024, 1, 1, 0, 0, 0);
        assert_eq!(schedule.next_rollover(from), at(2024, 1, 1, 0, 1, 0));
    }

    #[test]
    fn test_suffix_regex_matches_format() {
        for unit in [RotationUnit::Seconds, RotationUnit::Minutes, RotationUnit::Hours, RotationUnit::Midnight] {
            let suffix = at(2024, 2, 3, 4, 5, 6).format(unit.suffix_format()).to_string();
            assert!(unit.suffix_regex().unwrap().is_match(&suffix), "{unit} / {suffix}");
        }
        assert!(!RotationUnit::Days.suffix_regex().unwrap().is_match("2024-02-03.lock"));
    }
}
