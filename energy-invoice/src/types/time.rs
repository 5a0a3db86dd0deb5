use std::{fmt::Display, str::FromStr};

use chrono::{Datelike, Duration, DurationRound, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{
    de::{self, MapAccess, Visitor},
    Deserialize, Deserializer, Serialize, Serializer,
};

use crate::Error;

/// A `chrono` UTC date time.
pub type DateTime = chrono::DateTime<Utc>;

const MONTHS_IN_YEAR: u32 = 12;

/// Truncate an instant to the start of its UTC hour.
///
/// Both consumption and wholesale price series are keyed by this value before they are joined.
#[must_use]
pub fn truncate_to_hour(instant: DateTime) -> DateTime {
    instant
        .duration_trunc(Duration::hours(1))
        .unwrap_or(instant)
}

/// One calendar month of billing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BillingPeriod {
    year: i32,
    month: u32,
}

impl BillingPeriod {
    pub fn new(year: i32, month: u32) -> Result<Self, Error> {
        let period = Self { year, month };

        if !(1..=MONTHS_IN_YEAR).contains(&month) || period.first_day().is_none() {
            return Err(Error::InvalidPeriod { year, month });
        }

        Ok(period)
    }

    /// The period in which `instant` falls, in the local time of `time_zone`.
    #[must_use]
    pub fn containing(instant: DateTime, time_zone: Tz) -> Self {
        let local = instant.with_timezone(&time_zone);

        Self {
            year: local.year(),
            month: local.month(),
        }
    }

    /// The most recent closed period as seen at `now`: the month before the current one.
    #[must_use]
    pub fn last_closed(now: DateTime, time_zone: Tz) -> Self {
        Self::containing(now, time_zone).previous()
    }

    #[must_use]
    pub fn year(self) -> i32 {
        self.year
    }

    #[must_use]
    pub fn month(self) -> u32 {
        self.month
    }

    #[must_use]
    pub fn previous(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: MONTHS_IN_YEAR,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    #[must_use]
    pub fn next(self) -> Self {
        if self.month == MONTHS_IN_YEAR {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// The instant at which this period starts: local midnight of the first day of the month.
    #[must_use]
    pub fn start(self, time_zone: Tz) -> DateTime {
        let naive = self
            .first_day()
            .unwrap_or_else(|| unreachable!("period is validated on construction"))
            .and_time(NaiveTime::MIN);

        time_zone
            .from_local_datetime(&naive)
            .earliest()
            .map(|local| local.with_timezone(&Utc))
            .unwrap_or_else(|| naive.and_utc())
    }

    /// The half-open window `[start, start of next period)`.
    #[must_use]
    pub fn window(self, time_zone: Tz) -> TimeWindow {
        TimeWindow {
            start: self.start(time_zone),
            end: self.next().start(time_zone),
        }
    }

    fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }
}

impl Display for BillingPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for BillingPeriod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidPeriodFormat(s.to_owned());

        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year = year.parse().map_err(|_| invalid())?;
        let month = month.parse().map_err(|_| invalid())?;

        Self::new(year, month)
    }
}

impl Serialize for BillingPeriod {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Accepts `"2024-03"` as well as `{ "year": 2024, "month": 3 }`.
impl<'de> Deserialize<'de> for BillingPeriod {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(PeriodVisitor)
    }
}

struct PeriodVisitor;

impl<'de> Visitor<'de> for PeriodVisitor {
    type Value = BillingPeriod;

    fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str("a `YYYY-MM` string or a map with `year` and `month`")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        v.parse().map_err(E::custom)
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut year = None;
        let mut month = None;

        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "year" => year = Some(map.next_value::<i32>()?),
                "month" => month = Some(map.next_value::<u32>()?),
                _ => {
                    map.next_value::<de::IgnoredAny>()?;
                }
            }
        }

        let year = year.ok_or_else(|| de::Error::missing_field("year"))?;
        let month = month.ok_or_else(|| de::Error::missing_field("month"))?;

        BillingPeriod::new(year, month).map_err(de::Error::custom)
    }
}

/// A half-open range of instants, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start: DateTime,
    pub end: DateTime,
}

impl TimeWindow {
    #[must_use]
    pub fn contains(&self, instant: DateTime) -> bool {
        instant >= self.start && instant < self.end
    }

    /// Narrow this window so it ends after the hour starting at `cutoff`, the cutoff hour itself
    /// included.
    #[must_use]
    pub fn through_hour(self, cutoff: DateTime) -> Self {
        let end = truncate_to_hour(cutoff) + Duration::hours(1);

        Self {
            start: self.start,
            end: end.min(self.end),
        }
    }
}
