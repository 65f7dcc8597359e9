use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};

/// Tables owned by the recognition service. Each statement is idempotent.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS saved_staff_recognition (
        id BIGSERIAL PRIMARY KEY,
        week_ending_date DATE NOT NULL UNIQUE,
        ascend_recognition JSONB,
        north_recognition JSONB,
        recognition_text TEXT,
        created_by UUID,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS staff_recognition_scores (
        id BIGSERIAL PRIMARY KEY,
        week_ending_date DATE NOT NULL,
        staff_member_name TEXT NOT NULL,
        staff_member_id UUID,
        category_type TEXT NOT NULL CHECK (category_type IN ('ASCEND', 'NORTH')),
        category_name TEXT NOT NULL,
        score INT NOT NULL CHECK (score >= 1 AND score <= 4),
        reasoning TEXT NOT NULL DEFAULT '',
        created_by UUID,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS monthly_staff_recognition (
        id BIGSERIAL PRIMARY KEY,
        recognition_month DATE NOT NULL UNIQUE,
        ascend_winner JSONB,
        north_winner JSONB,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS quarterly_staff_recognition (
        id BIGSERIAL PRIMARY KEY,
        fiscal_year INT NOT NULL,
        quarter INT NOT NULL CHECK (quarter >= 1 AND quarter <= 4),
        ascend_winner JSONB,
        north_winner JSONB,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        UNIQUE (fiscal_year, quarter)
    )
    "#,
];

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Creates the recognition tables if they don't exist.
pub async fn init_tables(pool: &PgPool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    info!(
        "Database tables initialized ({} recognition tables)",
        SCHEMA.len()
    );
    Ok(())
}

/// Runs a store operation, retrying transient failures with linear backoff (1s, 2s, ...).
/// Non-transient errors and the last failed attempt are returned as-is.
pub async fn with_retry<T, F, Fut>(
    operation: &str,
    max_attempts: u32,
    mut run: F,
) -> Result<T, sqlx::Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, sqlx::Error>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match run().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_attempts && is_transient(&e) => {
                let delay = Duration::from_secs(u64::from(attempt));
                warn!(
                    "{operation} attempt {attempt} failed ({e}), retrying after {}ms...",
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Network, pool and connection-class (SQLSTATE 08xxx) failures are worth retrying.
pub fn is_transient(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => true,
        sqlx::Error::Database(db) => db.code().is_some_and(|code| code.starts_with("08")),
        _ => false,
    }
}
