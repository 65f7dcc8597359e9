//! Recognition periods: calendar months and fiscal quarters.
//!
//! Fiscal year FY*N* runs July 1 of calendar year *N − 1* through June 30 of *N*.
//! Q1 = Jul–Sep and Q2 = Oct–Dec fall in *N − 1*; Q3 = Jan–Mar and Q4 = Apr–Jun fall in *N*.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// A window over which weekly nominations are tallied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Period {
    Month { year: i32, month: u32 },
    Quarter { fiscal_year: i32, quarter: u32 },
}

impl Period {
    pub fn month(year: i32, month: u32) -> Result<Self, AppError> {
        let period = Period::Month { year, month };
        period.validate()?;
        Ok(period)
    }

    pub fn quarter(fiscal_year: i32, quarter: u32) -> Result<Self, AppError> {
        let period = Period::Quarter {
            fiscal_year,
            quarter,
        };
        period.validate()?;
        Ok(period)
    }

    /// Re-checks a period that arrived through deserialization.
    pub fn validate(&self) -> Result<(), AppError> {
        match *self {
            Period::Month { year, month } => {
                if !(1..=12).contains(&month) {
                    return Err(AppError::Validation(format!(
                        "month must be between 1 and 12, got {month}"
                    )));
                }
                NaiveDate::from_ymd_opt(year, month, 1)
                    .map(|_| ())
                    .ok_or_else(|| AppError::Validation(format!("year {year} is out of range")))
            }
            Period::Quarter {
                fiscal_year,
                quarter,
            } => {
                if !(1..=4).contains(&quarter) {
                    return Err(AppError::Validation(format!(
                        "quarter must be between 1 and 4, got {quarter}"
                    )));
                }
                fiscal_year
                    .checked_sub(1)
                    .and_then(|year| NaiveDate::from_ymd_opt(year, 7, 1))
                    .and_then(|_| NaiveDate::from_ymd_opt(fiscal_year, 6, 30))
                    .map(|_| ())
                    .ok_or_else(|| {
                        AppError::Validation(format!("fiscal year {fiscal_year} is out of range"))
                    })
            }
        }
    }

    /// Inclusive first and last calendar day of the period.
    ///
    /// Callers must hold a validated period.
    pub fn window(&self) -> (NaiveDate, NaiveDate) {
        match *self {
            Period::Month { year, month } => (first_of_month(year, month), last_of_month(year, month)),
            Period::Quarter {
                fiscal_year,
                quarter,
            } => {
                let (year, first_month) = quarter_start(fiscal_year, quarter);
                (
                    first_of_month(year, first_month),
                    last_of_month(year, first_month + 2),
                )
            }
        }
    }

    /// Human-readable label, e.g. "December 2025" or "FY2026 Q2".
    pub fn label(&self) -> String {
        match *self {
            Period::Month { year, month } => format!("{} {year}", month_name(month)),
            Period::Quarter {
                fiscal_year,
                quarter,
            } => format!("FY{fiscal_year} Q{quarter}"),
        }
    }
}

/// Maps a calendar date to its (fiscal_year, quarter).
pub fn fiscal_quarter_of(date: NaiveDate) -> (i32, u32) {
    let month = date.month();
    let fiscal_year = if month >= 7 {
        date.year() + 1
    } else {
        date.year()
    };
    let quarter = match month {
        7..=9 => 1,
        10..=12 => 2,
        1..=3 => 3,
        _ => 4,
    };
    (fiscal_year, quarter)
}

/// Names of the three months in a fiscal quarter, in order.
pub fn quarter_months(quarter: u32) -> Vec<&'static str> {
    let first = match quarter {
        1 => 7,
        2 => 10,
        3 => 1,
        4 => 4,
        _ => return Vec::new(),
    };
    (first..first + 3).map(month_name).collect()
}

fn month_name(month: u32) -> &'static str {
    MONTH_NAMES
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("Unknown")
}

/// Calendar year and first month of a fiscal quarter.
fn quarter_start(fiscal_year: i32, quarter: u32) -> (i32, u32) {
    match quarter {
        1 => (fiscal_year.saturating_sub(1), 7),
        2 => (fiscal_year.saturating_sub(1), 10),
        3 => (fiscal_year, 1),
        _ => (fiscal_year, 4),
    }
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

fn last_of_month(year: i32, month: u32) -> NaiveDate {
    let (next_year, next_month) = if month == 12 {
        (year.saturating_add(1), 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_july_starts_next_fiscal_year() {
        assert_eq!(fiscal_quarter_of(date(2025, 7, 1)), (2026, 1));
    }

    #[test]
    fn test_march_is_q3_of_same_fiscal_year() {
        assert_eq!(fiscal_quarter_of(date(2026, 3, 15)), (2026, 3));
    }

    #[test]
    fn test_quarter_boundaries() {
        assert_eq!(fiscal_quarter_of(date(2025, 9, 30)), (2026, 1));
        assert_eq!(fiscal_quarter_of(date(2025, 10, 1)), (2026, 2));
        assert_eq!(fiscal_quarter_of(date(2025, 12, 31)), (2026, 2));
        assert_eq!(fiscal_quarter_of(date(2026, 4, 1)), (2026, 4));
        assert_eq!(fiscal_quarter_of(date(2026, 6, 30)), (2026, 4));
    }

    #[test]
    fn test_month_window_uses_real_last_day() {
        let feb = Period::month(2024, 2).unwrap();
        assert_eq!(feb.window(), (date(2024, 2, 1), date(2024, 2, 29)));
        let apr = Period::month(2026, 4).unwrap();
        assert_eq!(apr.window(), (date(2026, 4, 1), date(2026, 4, 30)));
        let dec = Period::month(2025, 12).unwrap();
        assert_eq!(dec.window(), (date(2025, 12, 1), date(2025, 12, 31)));
    }

    #[test]
    fn test_quarter_windows_for_fy2026() {
        let q = |n| Period::quarter(2026, n).unwrap().window();
        assert_eq!(q(1), (date(2025, 7, 1), date(2025, 9, 30)));
        assert_eq!(q(2), (date(2025, 10, 1), date(2025, 12, 31)));
        assert_eq!(q(3), (date(2026, 1, 1), date(2026, 3, 31)));
        assert_eq!(q(4), (date(2026, 4, 1), date(2026, 6, 30)));
    }

    #[test]
    fn test_every_date_in_quarter_window_maps_back() {
        for quarter in 1..=4 {
            let period = Period::quarter(2026, quarter).unwrap();
            let (start, end) = period.window();
            let mut day = start;
            while day <= end {
                assert_eq!(fiscal_quarter_of(day), (2026, quarter), "day {day}");
                day = day.succ_opt().unwrap();
            }
        }
    }

    #[test]
    fn test_invalid_periods_rejected() {
        assert!(matches!(Period::month(2025, 0), Err(AppError::Validation(_))));
        assert!(matches!(Period::month(2025, 13), Err(AppError::Validation(_))));
        assert!(matches!(Period::quarter(2026, 5), Err(AppError::Validation(_))));
        assert!(matches!(Period::quarter(i32::MIN, 1), Err(AppError::Validation(_))));
        assert!(matches!(Period::quarter(i32::MAX, 4), Err(AppError::Validation(_))));
        assert!(matches!(Period::month(i32::MIN, 1), Err(AppError::Validation(_))));
        let deserialized = Period::Quarter {
            fiscal_year: i32::MIN,
            quarter: 2,
        };
        assert!(matches!(deserialized.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_labels_and_quarter_months() {
        assert_eq!(Period::month(2025, 12).unwrap().label(), "December 2025");
        assert_eq!(Period::quarter(2026, 2).unwrap().label(), "FY2026 Q2");
        assert_eq!(quarter_months(3), vec!["January", "February", "March"]);
        assert!(quarter_months(9).is_empty());
    }

    #[test]
    fn test_period_serde_shape() {
        let json = serde_json::to_value(Period::quarter(2026, 2).unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kind": "quarter", "fiscal_year": 2026, "quarter": 2})
        );
    }
}
