use core::str::FromStr;
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use std::time::Duration;

lazy_static! {
    static ref DURATION_REGEX: Regex =
        Regex::new(r"^(?P<value>\d+)(?P<unit>ns|us|ms|s|m|h){1}$").expect("Regex compilation error");
}

/// An error that occurred while parsing a humanized duration string.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    Syntax(String),
    UnitNotSupported(String),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Syntax(ref err) => err.fmt(f),
            Error::UnitNotSupported(ref err) => err.fmt(f),
        }
    }
}

pub struct DurationUnit {
    value: u64,
    unit: TimeUnit,
}

#[derive(Debug, PartialEq)]
pub enum TimeUnit {
    Nanosecond,
    Microsecond,
    Millisecond,
    Second,
    Minute,
    Hour,
}

impl FromStr for DurationUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match DURATION_REGEX.captures(s) {
            Some(caps) => {
                let value = caps
                    .name("value")
                    .and_then(|v| v.as_str().parse().ok())
                    .ok_or_else(|| Error::Syntax(format!("Value part of '{}' is not a valid number", s)))?;
                let unit = caps
                    .name("unit")
                    .map(|u| u.as_str())
                    .unwrap_or_default()
                    .parse::<TimeUnit>()?;
                Ok(Self { value, unit })
            }
            None => Err(Error::Syntax(format!(
                "'{}' is not a correct duration unit value",
                s
            ))),
        }
    }
}

impl From<DurationUnit> for Duration {
    fn from(duration: DurationUnit) -> Self {
        match duration.unit {
            TimeUnit::Nanosecond => Duration::from_nanos(duration.value),
            TimeUnit::Microsecond => Duration::from_micros(duration.value),
            TimeUnit::Millisecond => Duration::from_millis(duration.value),
            TimeUnit::Second => Duration::from_secs(duration.value),
            TimeUnit::Minute => Duration::from_secs(duration.value * 60),
            TimeUnit::Hour => Duration::from_secs(duration.value * 60 * 60),
        }
    }
}

impl FromStr for TimeUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ns" | "nanosecond" | "nanos" | "nanoseconds" => Ok(TimeUnit::Nanosecond),
            "us" | "microsecond" | "micros" | "microseconds" => Ok(TimeUnit::Microsecond),
            "ms" | "millisecond" | "millis" | "milliseconds" => Ok(TimeUnit::Millisecond),
            "s" | "second" | "secs" | "seconds" => Ok(TimeUnit::Second),
            "m" | "minute" | "mins" | "minutes" => Ok(TimeUnit::Minute),
            "h" | "hour" | "hours" => Ok(TimeUnit::Hour),
            _ => Err(Error::UnitNotSupported(format!("Unit '{}' not supported", s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DurationUnit, TimeUnit};
    use std::time::Duration;

    #[test]
    fn test_building_time_unit_from_string() {
        assert_eq!("ns".parse::<TimeUnit>().unwrap(), TimeUnit::Nanosecond);
        assert_eq!("us".parse::<TimeUnit>().unwrap(), TimeUnit::Microsecond);
        assert_eq!("ms".parse::<TimeUnit>().unwrap(), TimeUnit::Millisecond);
        assert_eq!("s".parse::<TimeUnit>().unwrap(), TimeUnit::Second);
        assert_eq!("m".parse::<TimeUnit>().unwrap(), TimeUnit::Minute);
        assert_eq!("h".parse::<TimeUnit>().unwrap(), TimeUnit::Hour);
        assert!("w".parse::<TimeUnit>().is_err());
    }

    #[test]
    fn test_conversion_duration_unit_to_duration() {
        let unit = "200ms".parse::<DurationUnit>().unwrap();
        let result: Duration = unit.into();
        assert_eq!(result, Duration::from_millis(200));

        let unit = "10s".parse::<DurationUnit>().unwrap();
        let result: Duration = unit.into();
        assert_eq!(result, Duration::from_secs(10));
    }

    #[test]
    fn test_rejects_malformed_durations() {
        assert!("10".parse::<DurationUnit>().is_err());
        assert!("ms".parse::<DurationUnit>().is_err());
        assert!("10 s".parse::<DurationUnit>().is_err());
        assert!("-5s".parse::<DurationUnit>().is_err());
    }
}
