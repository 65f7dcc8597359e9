use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde_json::Value;
use sqlx::FromRow;

use crate::recognition::models::{PeriodWinner, RecognitionRecord};
use crate::recognition::period::Period;

#[derive(Debug, Clone, FromRow)]
pub struct SavedRecognitionRow {
    pub week_ending_date: NaiveDate,
    pub ascend_recognition: Option<Value>,
    pub north_recognition: Option<Value>,
}

impl From<SavedRecognitionRow> for RecognitionRecord {
    fn from(row: SavedRecognitionRow) -> Self {
        RecognitionRecord {
            week_ending_date: row.week_ending_date,
            ascend_recognition: row.ascend_recognition,
            north_recognition: row.north_recognition,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct MonthlyWinnerRow {
    pub recognition_month: NaiveDate,
    pub ascend_winner: Option<Value>,
    pub north_winner: Option<Value>,
    pub updated_at: DateTime<Utc>,
}

impl From<MonthlyWinnerRow> for PeriodWinner {
    fn from(row: MonthlyWinnerRow) -> Self {
        PeriodWinner {
            period: Period::Month {
                year: row.recognition_month.year(),
                month: row.recognition_month.month(),
            },
            ascend_winner: row.ascend_winner,
            north_winner: row.north_winner,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct QuarterlyWinnerRow {
    pub fiscal_year: i32,
    pub quarter: i32,
    pub ascend_winner: Option<Value>,
    pub north_winner: Option<Value>,
    pub updated_at: DateTime<Utc>,
}

impl From<QuarterlyWinnerRow> for PeriodWinner {
    fn from(row: QuarterlyWinnerRow) -> Self {
        PeriodWinner {
            period: Period::Quarter {
                fiscal_year: row.fiscal_year,
                quarter: row.quarter.clamp(1, 4) as u32,
            },
            ascend_winner: row.ascend_winner,
            north_winner: row.north_winner,
            updated_at: row.updated_at,
        }
    }
}
