//! Time units for the admission window.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::DocgateError;

/// Unit of time a limiter window is measured in.
///
/// A window always spans exactly one unit, so `Minutes` with a request
/// limit of 10 admits 10 calls per minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    #[serde(alias = "NANOSECONDS", alias = "nanosecond")]
    Nanoseconds,
    #[serde(alias = "MICROSECONDS", alias = "microsecond")]
    Microseconds,
    #[serde(alias = "MILLISECONDS", alias = "millisecond")]
    Milliseconds,
    #[serde(alias = "SECONDS", alias = "second")]
    Seconds,
    #[serde(alias = "MINUTES", alias = "minute")]
    Minutes,
    #[serde(alias = "HOURS", alias = "hour")]
    Hours,
    #[serde(alias = "DAYS", alias = "day")]
    Days,
}

impl TimeUnit {
    /// Get the duration of one unit.
    pub fn duration(&self) -> Duration {
        match self {
            TimeUnit::Nanoseconds => Duration::from_nanos(1),
            TimeUnit::Microseconds => Duration::from_micros(1),
            TimeUnit::Milliseconds => Duration::from_millis(1),
            TimeUnit::Seconds => Duration::from_secs(1),
            TimeUnit::Minutes => Duration::from_secs(60),
            TimeUnit::Hours => Duration::from_secs(3600),
            TimeUnit::Days => Duration::from_secs(86400),
        }
    }

    /// Canonical upper-case name, as accepted on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Nanoseconds => "NANOSECONDS",
            TimeUnit::Microseconds => "MICROSECONDS",
            TimeUnit::Milliseconds => "MILLISECONDS",
            TimeUnit::Seconds => "SECONDS",
            TimeUnit::Minutes => "MINUTES",
            TimeUnit::Hours => "HOURS",
            TimeUnit::Days => "DAYS",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeUnit {
    type Err = DocgateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_uppercase();
        let singular = name.strip_suffix('S').unwrap_or(&name);

        match singular {
            "NANOSECOND" => Ok(TimeUnit::Nanoseconds),
            "MICROSECOND" => Ok(TimeUnit::Microseconds),
            "MILLISECOND" => Ok(TimeUnit::Milliseconds),
            "SECOND" => Ok(TimeUnit::Seconds),
            "MINUTE" => Ok(TimeUnit::Minutes),
            "HOUR" => Ok(TimeUnit::Hours),
            "DAY" => Ok(TimeUnit::Days),
            _ => Err(DocgateError::InvalidConfiguration(format!(
                "unknown time unit '{}'",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_unit_duration() {
        assert_eq!(TimeUnit::Nanoseconds.duration(), Duration::from_nanos(1));
        assert_eq!(TimeUnit::Milliseconds.duration(), Duration::from_millis(1));
        assert_eq!(TimeUnit::Seconds.duration(), Duration::from_secs(1));
        assert_eq!(TimeUnit::Minutes.duration(), Duration::from_secs(60));
        assert_eq!(TimeUnit::Hours.duration(), Duration::from_secs(3600));
        assert_eq!(TimeUnit::Days.duration(), Duration::from_secs(86400));
    }

    #[test]
    fn test_parse_upper_case_names() {
        assert_eq!("SECONDS".parse::<TimeUnit>().unwrap(), TimeUnit::Seconds);
        assert_eq!("MINUTES".parse::<TimeUnit>().unwrap(), TimeUnit::Minutes);
        assert_eq!("MICROSECONDS".parse::<TimeUnit>().unwrap(), TimeUnit::Microseconds);
    }

    #[test]
    fn test_parse_is_case_insensitive_and_accepts_singular() {
        assert_eq!("seconds".parse::<TimeUnit>().unwrap(), TimeUnit::Seconds);
        assert_eq!("Hour".parse::<TimeUnit>().unwrap(), TimeUnit::Hours);
        assert_eq!(" day ".parse::<TimeUnit>().unwrap(), TimeUnit::Days);
    }

    #[test]
    fn test_parse_unknown_unit() {
        let err = "FORTNIGHTS".parse::<TimeUnit>().unwrap_err();
        assert!(matches!(err, DocgateError::InvalidConfiguration(_)));
        assert!("".parse::<TimeUnit>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for unit in [TimeUnit::Nanoseconds, TimeUnit::Seconds, TimeUnit::Days] {
            assert_eq!(unit.to_string().parse::<TimeUnit>().unwrap(), unit);
        }
    }

    #[test]
    fn test_deserialize_aliases() {
        let unit: TimeUnit = serde_yaml::from_str("minutes").unwrap();
        assert_eq!(unit, TimeUnit::Minutes);
        let unit: TimeUnit = serde_yaml::from_str("MINUTES").unwrap();
        assert_eq!(unit, TimeUnit::Minutes);
        let unit: TimeUnit = serde_yaml::from_str("minute").unwrap();
        assert_eq!(unit, TimeUnit::Minutes);
    }
}
