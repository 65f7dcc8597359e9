use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::recognition::models::{AwardFramework, Nomination, PeriodWinner};
use crate::recognition::parser::decode_nomination;
use crate::recognition::period::{fiscal_quarter_of, quarter_months, Period};
use crate::recognition::resolver::{
    complete_tie, resolve_period, Resolution, TieBreakCompletion, TieBreakRequest,
};
use crate::recognition::store::AwardFamily;
use crate::recognition::weekly::{
    evaluate_week, nomination_from_request, save_week, EvaluateRequest, EvaluationResult,
    SaveWeekRequest, WeeklyEntry,
};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct MonthlySelectRequest {
    pub year: i32,
    pub month: u32,
}

#[derive(Deserialize)]
pub struct QuarterlySelectRequest {
    pub fiscal_year: i32,
    pub quarter: u32,
}

#[derive(Deserialize)]
pub struct CompleteTieRequest {
    pub tie: TieBreakRequest,
    pub chosen: String,
}

/// A stored period winner with both detail objects decoded.
#[derive(Serialize)]
pub struct WinnerView {
    pub period: Period,
    pub label: String,
    pub ascend_winner: Option<Nomination>,
    pub north_winner: Option<Nomination>,
    pub updated_at: DateTime<Utc>,
}

impl From<PeriodWinner> for WinnerView {
    fn from(winner: PeriodWinner) -> Self {
        WinnerView {
            label: winner.period.label(),
            period: winner.period,
            ascend_winner: decode_nomination(winner.ascend_winner.as_ref()).into_nomination(),
            north_winner: decode_nomination(winner.north_winner.as_ref()).into_nomination(),
            updated_at: winner.updated_at,
        }
    }
}

#[derive(Deserialize)]
pub struct FiscalQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Serialize)]
pub struct FiscalPeriodResponse {
    pub date: NaiveDate,
    pub fiscal_year: i32,
    pub quarter: u32,
    pub label: String,
    pub months: Vec<&'static str>,
}

#[derive(Deserialize)]
pub struct WeekRangeQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Serialize)]
pub struct SaveWeekResponse {
    pub week: WeeklyEntry,
    pub recognition_text: String,
    pub message: String,
}

/// POST /api/v1/recognition/monthly/select
pub async fn handle_select_monthly(
    State(state): State<AppState>,
    Json(req): Json<MonthlySelectRequest>,
) -> Result<Json<Resolution>, AppError> {
    let period = Period::month(req.year, req.month)?;
    let resolution =
        resolve_period(state.store.as_ref(), Some(state.summarizer.as_ref()), period).await?;
    Ok(Json(resolution))
}

/// POST /api/v1/recognition/quarterly/select
pub async fn handle_select_quarterly(
    State(state): State<AppState>,
    Json(req): Json<QuarterlySelectRequest>,
) -> Result<Json<Resolution>, AppError> {
    let period = Period::quarter(req.fiscal_year, req.quarter)?;
    let resolution =
        resolve_period(state.store.as_ref(), Some(state.summarizer.as_ref()), period).await?;
    Ok(Json(resolution))
}

/// POST /api/v1/recognition/ties/complete
pub async fn handle_complete_tie(
    State(state): State<AppState>,
    Json(req): Json<CompleteTieRequest>,
) -> Result<Json<TieBreakCompletion>, AppError> {
    let completion = complete_tie(state.store.as_ref(), &req.tie, &req.chosen).await?;
    Ok(Json(completion))
}

/// GET /api/v1/recognition/monthly
pub async fn handle_list_monthly(
    State(state): State<AppState>,
) -> Result<Json<Vec<WinnerView>>, AppError> {
    list_winners(&state, AwardFamily::Monthly).await
}

/// GET /api/v1/recognition/quarterly
pub async fn handle_list_quarterly(
    State(state): State<AppState>,
) -> Result<Json<Vec<WinnerView>>, AppError> {
    list_winners(&state, AwardFamily::Quarterly).await
}

async fn list_winners(
    state: &AppState,
    family: AwardFamily,
) -> Result<Json<Vec<WinnerView>>, AppError> {
    let winners = state.store.list_winners(family).await?;
    Ok(Json(winners.into_iter().map(WinnerView::from).collect()))
}

/// GET /api/v1/recognition/fiscal?date=YYYY-MM-DD
pub async fn handle_fiscal_period(
    Query(params): Query<FiscalQuery>,
) -> Result<Json<FiscalPeriodResponse>, AppError> {
    let date = params.date.unwrap_or_else(|| Utc::now().date_naive());
    let (fiscal_year, quarter) = fiscal_quarter_of(date);
    let period = Period::quarter(fiscal_year, quarter)?;
    Ok(Json(FiscalPeriodResponse {
        date,
        fiscal_year,
        quarter,
        label: period.label(),
        months: quarter_months(quarter),
    }))
}

/// PUT /api/v1/recognition/weekly/:date
pub async fn handle_save_week(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
    Json(req): Json<SaveWeekRequest>,
) -> Result<Json<SaveWeekResponse>, AppError> {
    let ascend = nomination_from_request(AwardFramework::Ascend, req.ascend_recognition.as_ref())?;
    let north = nomination_from_request(AwardFramework::North, req.north_recognition.as_ref())?;
    let week = save_week(state.store.as_ref(), date, ascend, north, req.created_by).await?;

    Ok(Json(SaveWeekResponse {
        week: WeeklyEntry {
            week_ending_date: week.week_ending_date,
            ascend_recognition: week.ascend_recognition,
            north_recognition: week.north_recognition,
        },
        recognition_text: week.recognition_text,
        message: format!("Staff recognition saved/updated for week ending {date}"),
    }))
}

/// GET /api/v1/recognition/weekly?start=&end=
pub async fn handle_list_weeks(
    State(state): State<AppState>,
    Query(params): Query<WeekRangeQuery>,
) -> Result<Json<Vec<WeeklyEntry>>, AppError> {
    if params.start > params.end {
        return Err(AppError::Validation(format!(
            "start {} is after end {}",
            params.start, params.end
        )));
    }
    let records = state.store.records_between(params.start, params.end).await?;
    Ok(Json(records.iter().map(WeeklyEntry::from).collect()))
}

/// POST /api/v1/recognition/weekly/evaluate
pub async fn handle_evaluate_week(
    State(state): State<AppState>,
    Json(req): Json<EvaluateRequest>,
) -> Result<Json<EvaluationResult>, AppError> {
    let result = evaluate_week(
        &state.llm,
        state.store.as_ref(),
        &state.config.rubric_dir,
        req,
    )
    .await?;
    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::llm_client::LlmClient;
    use crate::recognition::models::RecognitionRecord;
    use crate::recognition::store::memory::MemoryStore;
    use crate::recognition::summaries::tests::CountingSummarizer;
    use crate::routes::build_router;
    use crate::state::AppState;

    fn test_app(store: Arc<MemoryStore>) -> Router {
        let config = Config {
            database_url: "postgres://unused".to_string(),
            anthropic_api_key: "test-key".to_string(),
            port: 0,
            rust_log: "info".to_string(),
            rubric_dir: PathBuf::from("rubrics"),
            store_max_retries: 1,
        };
        let state = AppState {
            store,
            llm: LlmClient::new(config.anthropic_api_key.clone()).unwrap(),
            summarizer: Arc::new(CountingSummarizer),
            config,
        };
        build_router(state)
    }

    fn week(date: &str, ascend: Option<&str>, north: Option<&str>) -> RecognitionRecord {
        RecognitionRecord {
            week_ending_date: date.parse().unwrap(),
            ascend_recognition: ascend.map(|n| json!({"staff_member": n, "score": 3})),
            north_recognition: north.map(|n| json!({"staff_member": n, "score": 2})),
        }
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(b) => builder
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(test_app(Arc::default()), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_monthly_select_saves_clean_winner() {
        let store = Arc::new(MemoryStore::with_records(vec![
            week("2026-01-03", Some("Alice"), None),
            week("2026-01-10", Some("Alice"), Some("Bob")),
            week("2026-01-17", Some("Bob"), None),
        ]));
        let (status, body) = send(
            test_app(store.clone()),
            "POST",
            "/api/v1/recognition/monthly/select",
            Some(json!({"year": 2026, "month": 1})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ascend"]["status"], "winner");
        assert_eq!(body["ascend"]["staff_member"], "Alice");
        assert_eq!(body["north"]["staff_member"], "Bob");
        assert_eq!(body["saved"]["ascend_winner"]["staff_member"], "Alice");
        assert!(body["message"].as_str().unwrap().contains("January 2026"));
        assert_eq!(store.winner_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_month_is_bad_request() {
        let (status, body) = send(
            test_app(Arc::default()),
            "POST",
            "/api/v1/recognition/monthly/select",
            Some(json!({"year": 2026, "month": 13})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_quarterly_tie_round_trip() {
        let store = Arc::new(MemoryStore::with_records(vec![
            week("2025-10-04", None, Some("Dana")),
            week("2025-11-08", None, Some("Eli")),
        ]));
        let (status, body) = send(
            test_app(store.clone()),
            "POST",
            "/api/v1/recognition/quarterly/select",
            Some(json!({"fiscal_year": 2026, "quarter": 2})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["north"]["status"], "tie");
        assert_eq!(body["north"]["summaries"]["Eli"], "Eli: 1 nominations");
        assert_eq!(body["saved"], Value::Null);

        let tie = body["north"]["tie"].clone();
        let (status, body) = send(
            test_app(store.clone()),
            "POST",
            "/api/v1/recognition/ties/complete",
            Some(json!({"tie": tie, "chosen": "Dana"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["staff_member"], "Dana");
        assert_eq!(body["saved"]["north_winner"]["staff_member"], "Dana");

        let (_, listed) = send(test_app(store), "GET", "/api/v1/recognition/quarterly", None).await;
        assert_eq!(listed[0]["label"], "FY2026 Q2");
        assert_eq!(listed[0]["north_winner"]["staff_member"], "Dana");
        assert_eq!(listed[0]["ascend_winner"], Value::Null);
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_message() {
        let store = Arc::new(MemoryStore::default());
        store.unreachable.store(true, Ordering::SeqCst);
        let (status, body) = send(
            test_app(store),
            "POST",
            "/api/v1/recognition/monthly/select",
            Some(json!({"year": 2026, "month": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "DATABASE_ERROR");
    }

    #[tokio::test]
    async fn test_fiscal_lookup() {
        let (status, body) = send(
            test_app(Arc::default()),
            "GET",
            "/api/v1/recognition/fiscal?date=2025-11-15",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["fiscal_year"], 2026);
        assert_eq!(body["quarter"], 2);
        assert_eq!(body["months"], json!(["October", "November", "December"]));
    }

    #[tokio::test]
    async fn test_save_and_list_week() {
        let store = Arc::new(MemoryStore::default());
        let (status, body) = send(
            test_app(store.clone()),
            "PUT",
            "/api/v1/recognition/weekly/2026-01-10",
            Some(json!({
                "ascend_recognition": {"staff_member": "Alice", "category": "A - Accountability", "score": 4},
                "north_recognition": "{\"staff_member\": \"Bob\"}"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["recognition_text"]
            .as_str()
            .unwrap()
            .contains("**Recipient:** Bob"));

        let (status, listed) = send(
            test_app(store),
            "GET",
            "/api/v1/recognition/weekly?start=2026-01-01&end=2026-01-31",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed[0]["ascend_recognition"]["staff_member"], "Alice");
        assert_eq!(listed[0]["north_recognition"]["staff_member"], "Bob");
    }

    #[tokio::test]
    async fn test_evaluate_without_staff_is_rejected() {
        let (status, _) = send(
            test_app(Arc::default()),
            "POST",
            "/api/v1/recognition/weekly/evaluate",
            Some(json!({"week_ending_date": "2026-01-10", "staff": []})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
