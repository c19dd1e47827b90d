//! Frequency codes and calendar steps.
//!
//! A frequency code is the number of periods per year (the same number the
//! engine uses as the seasonal cycle length). Only five codes are supported:
//!
//! | code | frequency     | step      |
//! |------|---------------|-----------|
//! | 12   | month start   | 1 month   |
//! | 1    | year          | 12 months |
//! | 365  | day           | 1 day     |
//! | 4    | quarter start | 3 months  |
//! | 8760 | hour          | 1 hour    |

use chrono::{Months, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Yearly,
    Quarterly,
    Monthly,
    Daily,
    Hourly,
}

impl Frequency {
    pub const ALL: [Frequency; 5] = [
        Frequency::Yearly,
        Frequency::Quarterly,
        Frequency::Monthly,
        Frequency::Daily,
        Frequency::Hourly,
    ];

    pub fn from_code(code: u32) -> Result<Self> {
        match code {
            1 => Ok(Frequency::Yearly),
            4 => Ok(Frequency::Quarterly),
            12 => Ok(Frequency::Monthly),
            365 => Ok(Frequency::Daily),
            8760 => Ok(Frequency::Hourly),
            other => Err(ForecastError::UnsupportedFrequency(other)),
        }
    }

    /// Periods per year.
    pub fn code(self) -> u32 {
        match self {
            Frequency::Yearly => 1,
            Frequency::Quarterly => 4,
            Frequency::Monthly => 12,
            Frequency::Daily => 365,
            Frequency::Hourly => 8760,
        }
    }

    pub fn step(self) -> CalendarStep {
        match self {
            Frequency::Yearly => CalendarStep::Months(12),
            Frequency::Quarterly => CalendarStep::Months(3),
            Frequency::Monthly => CalendarStep::Months(1),
            Frequency::Daily => CalendarStep::Days(1),
            Frequency::Hourly => CalendarStep::Hours(1),
        }
    }

    /// Human-readable label for logs and messages.
    pub fn display_name(self) -> &'static str {
        match self {
            Frequency::Yearly => "year",
            Frequency::Quarterly => "quarter start",
            Frequency::Monthly => "month start",
            Frequency::Daily => "day",
            Frequency::Hourly => "hour",
        }
    }
}

/// Fixed increment between consecutive index entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarStep {
    Months(u32),
    Days(i64),
    Hours(i64),
}

impl CalendarStep {
    /// The `k`-th index entry counted from `start` (`nth(start, 0) == start`).
    ///
    /// Month steps are computed from `start` rather than accumulated, so an
    /// index anchored on the 31st clamps to short months without drifting.
    /// Returns `None` on calendar overflow.
    pub fn nth(self, start: NaiveDateTime, k: usize) -> Option<NaiveDateTime> {
        match self {
            CalendarStep::Months(m) => {
                let total = u32::try_from(k).ok()?.checked_mul(m)?;
                start.checked_add_months(Months::new(total))
            }
            CalendarStep::Days(d) => {
                let days = d.checked_mul(i64::try_from(k).ok()?)?;
                start.checked_add_signed(TimeDelta::try_days(days)?)
            }
            CalendarStep::Hours(h) => {
                let hours = h.checked_mul(i64::try_from(k).ok()?)?;
                start.checked_add_signed(TimeDelta::try_hours(hours)?)
            }
        }
    }

    pub fn next(self, t: NaiveDateTime) -> Option<NaiveDateTime> {
        self.nth(t, 1)
    }

    /// `n` consecutive index entries beginning at `start`.
    pub fn range(self, start: NaiveDateTime, n: usize) -> Option<Vec<NaiveDateTime>> {
        (0..n).map(|k| self.nth(start, k)).collect()
    }
}

/// Map a frequency code to its calendar step.
pub fn resolve(code: u32) -> Result<CalendarStep> {
    Frequency::from_code(code).map(Frequency::step)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn code_steps_span_one_year() {
        // 2021 is not a leap year, so 365 days and 8760 hours are exactly one year.
        let start = at(2021, 1, 1);
        for freq in Frequency::ALL {
            let step = resolve(freq.code()).unwrap();
            let end = step.nth(start, freq.code() as usize).unwrap();
            assert_eq!(end, at(2022, 1, 1), "{}", freq.display_name());
        }
    }

    #[test]
    fn range_is_strictly_increasing() {
        for freq in Frequency::ALL {
            let idx = freq.step().range(at(2020, 1, 1), 50).unwrap();
            assert_eq!(idx.len(), 50);
            assert!(idx.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn unsupported_code_is_rejected() {
        for code in [0, 2, 3, 52, 24, 8766] {
            assert!(matches!(
                resolve(code),
                Err(ForecastError::UnsupportedFrequency(c)) if c == code
            ));
        }
    }

    #[test]
    fn month_end_anchor_does_not_drift() {
        let step = CalendarStep::Months(1);
        let start = at(2024, 1, 31);
        assert_eq!(step.nth(start, 1).unwrap(), at(2024, 2, 29));
        assert_eq!(step.nth(start, 2).unwrap(), at(2024, 3, 31));
    }

    #[test]
    fn hourly_steps_cross_midnight() {
        let start = at(2023, 3, 1).with_hour(23).unwrap();
        let next = Frequency::Hourly.step().next(start).unwrap();
        assert_eq!(next, at(2023, 3, 2));
    }
}
