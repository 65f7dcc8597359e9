//! Recognition persistence.
//!
//! `AppState` holds an `Arc<dyn RecognitionStore>`; `PgRecognitionStore` is the
//! production backend. The tally and resolver code only ever reads weekly rows
//! and writes period-winner rows through this trait.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::with_retry;
use crate::errors::AppError;
use crate::models::recognition::{MonthlyWinnerRow, QuarterlyWinnerRow, SavedRecognitionRow};
use crate::recognition::models::{
    PeriodWinner, RecognitionRecord, StaffScore, WeeklyRecognition, WinnerUpdate,
};
use crate::recognition::period::Period;

/// Which winner table to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AwardFamily {
    Monthly,
    Quarterly,
}

#[async_trait]
pub trait RecognitionStore: Send + Sync {
    /// Weekly rows whose `week_ending_date` is within `[start, end]`, ordered by date.
    async fn records_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RecognitionRecord>, AppError>;

    /// Creates or replaces the row for `week.week_ending_date`.
    async fn upsert_weekly(&self, week: &WeeklyRecognition) -> Result<(), AppError>;

    /// Replaces every staff score stored for `week_ending_date` with `scores`.
    /// Returns the number of rows written.
    async fn replace_scores(
        &self,
        week_ending_date: NaiveDate,
        scores: &[StaffScore],
    ) -> Result<u64, AppError>;

    /// Creates or updates the winner row keyed by `period`, writing only the
    /// columns set in `update`.
    async fn upsert_winner(
        &self,
        period: &Period,
        update: &WinnerUpdate,
    ) -> Result<PeriodWinner, AppError>;

    /// All stored winners for a family, newest period first.
    async fn list_winners(&self, family: AwardFamily) -> Result<Vec<PeriodWinner>, AppError>;
}

// ────────────────────────────────────────────────────────────────────────────
// PostgreSQL backend
// ────────────────────────────────────────────────────────────────────────────

pub struct PgRecognitionStore {
    pool: PgPool,
    max_attempts: u32,
}

impl PgRecognitionStore {
    pub fn new(pool: PgPool, max_attempts: u32) -> Self {
        Self { pool, max_attempts }
    }
}

#[async_trait]
impl RecognitionStore for PgRecognitionStore {
    async fn records_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RecognitionRecord>, AppError> {
        let rows = with_retry("Load weekly recognitions", self.max_attempts, || {
            sqlx::query_as::<_, SavedRecognitionRow>(
                r#"
                SELECT week_ending_date, ascend_recognition, north_recognition
                FROM saved_staff_recognition
                WHERE week_ending_date BETWEEN $1 AND $2
                ORDER BY week_ending_date
                "#,
            )
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
        })
        .await?;

        Ok(rows.into_iter().map(RecognitionRecord::from).collect())
    }

    async fn upsert_weekly(&self, week: &WeeklyRecognition) -> Result<(), AppError> {
        with_retry("Save weekly recognition", self.max_attempts, || {
            sqlx::query(
                r#"
                INSERT INTO saved_staff_recognition
                    (week_ending_date, ascend_recognition, north_recognition,
                     recognition_text, created_by, updated_at)
                VALUES ($1, $2, $3, $4, $5, NOW())
                ON CONFLICT (week_ending_date) DO UPDATE SET
                    ascend_recognition = EXCLUDED.ascend_recognition,
                    north_recognition = EXCLUDED.north_recognition,
                    recognition_text = EXCLUDED.recognition_text,
                    created_by = EXCLUDED.created_by,
                    updated_at = NOW()
                "#,
            )
            .bind(week.week_ending_date)
            .bind(week.ascend_recognition.as_ref().map(Json))
            .bind(week.north_recognition.as_ref().map(Json))
            .bind(&week.recognition_text)
            .bind(week.created_by)
            .execute(&self.pool)
        })
        .await?;

        Ok(())
    }

    async fn replace_scores(
        &self,
        week_ending_date: NaiveDate,
        scores: &[StaffScore],
    ) -> Result<u64, AppError> {
        let written = with_retry("Save staff scores", self.max_attempts, || {
            let pool = self.pool.clone();
            let scores = scores.to_vec();
            async move {
                let mut tx = pool.begin().await?;
                sqlx::query("DELETE FROM staff_recognition_scores WHERE week_ending_date = $1")
                    .bind(week_ending_date)
                    .execute(&mut *tx)
                    .await?;

                let mut inserted = 0;
                if !scores.is_empty() {
                    let mut builder = QueryBuilder::<Postgres>::new(
                        "INSERT INTO staff_recognition_scores \
                         (week_ending_date, staff_member_name, staff_member_id, category_type, \
                          category_name, score, reasoning, created_by) ",
                    );
                    builder.push_values(scores, |mut row, score| {
                        row.push_bind(score.week_ending_date)
                            .push_bind(score.staff_member_name)
                            .push_bind(score.staff_member_id)
                            .push_bind(score.framework.as_str())
                            .push_bind(score.category_name)
                            .push_bind(score.score)
                            .push_bind(score.reasoning)
                            .push_bind(score.created_by);
                    });
                    inserted = builder.build().execute(&mut *tx).await?.rows_affected();
                }

                tx.commit().await?;
                Ok::<u64, sqlx::Error>(inserted)
            }
        })
        .await?;

        Ok(written)
    }

    async fn upsert_winner(
        &self,
        period: &Period,
        update: &WinnerUpdate,
    ) -> Result<PeriodWinner, AppError> {
        period.validate()?;
        let (start, _) = period.window();

        let winner: PeriodWinner = match *period {
            Period::Month { .. } => with_retry("Save monthly winners", self.max_attempts, || {
                sqlx::query_as::<_, MonthlyWinnerRow>(
                    r#"
                    INSERT INTO monthly_staff_recognition
                        (recognition_month, ascend_winner, north_winner)
                    VALUES ($1, $2, $3)
                    ON CONFLICT (recognition_month) DO UPDATE SET
                        ascend_winner = COALESCE(EXCLUDED.ascend_winner, monthly_staff_recognition.ascend_winner),
                        north_winner = COALESCE(EXCLUDED.north_winner, monthly_staff_recognition.north_winner),
                        updated_at = NOW()
                    RETURNING recognition_month, ascend_winner, north_winner, updated_at
                    "#,
                )
                .bind(start)
                .bind(&update.ascend_winner)
                .bind(&update.north_winner)
                .fetch_one(&self.pool)
            })
            .await?
            .into(),
            Period::Quarter {
                fiscal_year,
                quarter,
            } => with_retry("Save quarterly winners", self.max_attempts, || {
                sqlx::query_as::<_, QuarterlyWinnerRow>(
                    r#"
                    INSERT INTO quarterly_staff_recognition
                        (fiscal_year, quarter, ascend_winner, north_winner)
                    VALUES ($1, $2, $3, $4)
                    ON CONFLICT (fiscal_year, quarter) DO UPDATE SET
                        ascend_winner = COALESCE(EXCLUDED.ascend_winner, quarterly_staff_recognition.ascend_winner),
                        north_winner = COALESCE(EXCLUDED.north_winner, quarterly_staff_recognition.north_winner),
                        updated_at = NOW()
                    RETURNING fiscal_year, quarter, ascend_winner, north_winner, updated_at
                    "#,
                )
                .bind(fiscal_year)
                .bind(quarter as i32)
                .bind(&update.ascend_winner)
                .bind(&update.north_winner)
                .fetch_one(&self.pool)
            })
            .await?
            .into(),
        };

        Ok(winner)
    }

    async fn list_winners(&self, family: AwardFamily) -> Result<Vec<PeriodWinner>, AppError> {
        let winners: Vec<PeriodWinner> = match family {
            AwardFamily::Monthly => with_retry("Load monthly winners", self.max_attempts, || {
                sqlx::query_as::<_, MonthlyWinnerRow>(
                    r#"
                    SELECT recognition_month, ascend_winner, north_winner, updated_at
                    FROM monthly_staff_recognition
                    ORDER BY recognition_month DESC
                    "#,
                )
                .fetch_all(&self.pool)
            })
            .await?
            .into_iter()
            .map(PeriodWinner::from)
            .collect(),
            AwardFamily::Quarterly => with_retry("Load quarterly winners", self.max_attempts, || {
                sqlx::query_as::<_, QuarterlyWinnerRow>(
                    r#"
                    SELECT fiscal_year, quarter, ascend_winner, north_winner, updated_at
                    FROM quarterly_staff_recognition
                    ORDER BY fiscal_year DESC, quarter DESC
                    "#,
                )
                .fetch_all(&self.pool)
            })
            .await?
            .into_iter()
            .map(PeriodWinner::from)
            .collect(),
        };

        Ok(winners)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory backend for tests
// ────────────────────────────────────────────────────────────────────────────
