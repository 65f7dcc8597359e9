//! Weekly recognition: LLM evaluation of a week's staff activity, the rendered
//! markdown report, and the rows that feed the monthly and quarterly tallies.

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::prompts::{EVIDENCE_INSTRUCTION, JSON_ONLY_SYSTEM, RATING_SCALE};
use crate::llm_client::LlmClient;
use crate::recognition::models::{
    AwardFramework, Nomination, RecognitionRecord, StaffScore, WeeklyRecognition,
};
use crate::recognition::parser::{decode_nomination, Decoded};
use crate::recognition::prompts::{EVALUATION_PROMPT_TEMPLATE, EVALUATION_SYSTEM};
use crate::recognition::store::RecognitionStore;

pub const ASCEND_RUBRIC_FILE: &str = "ascend_rubric.md";
pub const NORTH_RUBRIC_FILE: &str = "north_rubric.md";

const MIN_SCORE: i64 = 1;
const MAX_SCORE: i64 = 4;

// ────────────────────────────────────────────────────────────────────────────
// Request / response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffActivity {
    #[serde(rename = "type", default = "default_activity_kind")]
    pub kind: String,
    pub text: String,
    #[serde(default)]
    pub ascend_category: Option<String>,
    #[serde(default)]
    pub north_category: Option<String>,
}

fn default_activity_kind() -> String {
    "success".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffPerformance {
    pub name: String,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub well_being_score: Option<i32>,
    #[serde(default)]
    pub activities: Vec<StaffActivity>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvaluateRequest {
    pub week_ending_date: NaiveDate,
    pub staff: Vec<StaffPerformance>,
    /// Persist the week's recognition and the individual scores.
    #[serde(default)]
    pub save: bool,
    #[serde(default)]
    pub created_by: Option<Uuid>,
}

/// Body of `PUT /api/v1/recognition/weekly/{date}`.
///
/// Nominations may arrive as objects or as legacy JSON-encoded strings.
#[derive(Debug, Clone, Deserialize)]
pub struct SaveWeekRequest {
    #[serde(default)]
    pub ascend_recognition: Option<Value>,
    #[serde(default)]
    pub north_recognition: Option<Value>,
    #[serde(default)]
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryScore {
    pub category: String,
    /// `None` when the model returned no usable score.
    pub score: Option<i32>,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaffScoreSet {
    pub staff_member: String,
    pub staff_member_id: Option<Uuid>,
    pub ascend_scores: Vec<CategoryScore>,
    pub north_scores: Vec<CategoryScore>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationResult {
    pub week_ending_date: NaiveDate,
    pub ascend_recognition: Option<Nomination>,
    pub north_recognition: Option<Nomination>,
    pub all_staff_scores: Vec<StaffScoreSet>,
    pub saved: bool,
    pub scores_saved: u64,
    pub message: String,
}

/// One stored week as returned by the listing endpoint. Malformed nominations are `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyEntry {
    pub week_ending_date: NaiveDate,
    pub ascend_recognition: Option<Nomination>,
    pub north_recognition: Option<Nomination>,
}

impl From<&RecognitionRecord> for WeeklyEntry {
    fn from(record: &RecognitionRecord) -> Self {
        let decode = |fw| decode_nomination(record.raw(fw)).into_nomination();
        WeeklyEntry {
            week_ending_date: record.week_ending_date,
            ascend_recognition: decode(AwardFramework::Ascend),
            north_recognition: decode(AwardFramework::North),
        }
    }
}

// Raw model output. Every field is optional because the model's JSON is not trusted.

#[derive(Debug, Default, Deserialize)]
struct RawEvaluation {
    #[serde(default)]
    top_performers: RawTopPerformers,
    #[serde(default)]
    all_staff_scores: Vec<RawStaffScores>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTopPerformers {
    #[serde(default)]
    ascend_recognition: Option<Value>,
    #[serde(default)]
    north_recognition: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawStaffScores {
    #[serde(default)]
    staff_member: String,
    #[serde(default)]
    ascend_scores: Vec<RawCategoryScore>,
    #[serde(default)]
    north_scores: Vec<RawCategoryScore>,
}

#[derive(Debug, Deserialize)]
struct RawCategoryScore {
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    score: Option<Value>,
    #[serde(default)]
    reasoning: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Rubrics and prompt
// ────────────────────────────────────────────────────────────────────────────

pub struct Rubrics {
    pub ascend: String,
    pub north: String,
}

pub async fn load_rubrics(dir: &Path) -> Result<Rubrics, AppError> {
    let read = |file: &'static str| {
        let path = dir.join(file);
        async move {
            tokio::fs::read_to_string(&path).await.map_err(|e| {
                AppError::Internal(anyhow::anyhow!(
                    "Rubric file {} could not be read: {e}",
                    path.display()
                ))
            })
        }
    };
    Ok(Rubrics {
        ascend: read(ASCEND_RUBRIC_FILE).await?,
        north: read(NORTH_RUBRIC_FILE).await?,
    })
}

pub fn build_evaluation_prompt(
    rubrics: &Rubrics,
    staff: &[StaffPerformance],
) -> Result<String, AppError> {
    let staff_json = serde_json::to_string_pretty(staff).map_err(anyhow::Error::from)?;
    Ok(EVALUATION_PROMPT_TEMPLATE
        .replace("{rating_scale}", RATING_SCALE)
        .replace("{evidence}", EVIDENCE_INSTRUCTION)
        .replace("{ascend_rubric}", &rubrics.ascend)
        .replace("{north_rubric}", &rubrics.north)
        .replace("{staff_json}", &staff_json))
}

// ────────────────────────────────────────────────────────────────────────────
// Post-processing
// ────────────────────────────────────────────────────────────────────────────

/// Integer reading of a model score: `3`, `3.7` (truncated) or `"3"`.
fn parse_score(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn clamp_score(score: i64) -> i64 {
    score.clamp(MIN_SCORE, MAX_SCORE)
}

/// A top-performer pick with its score forced into 1-4. Unreadable scores become 1.
fn finalize_top_performer(raw: Option<Value>) -> Option<Nomination> {
    let mut raw = raw?;
    if let Some(obj) = raw.as_object_mut() {
        if let Some(score) = obj.get("score") {
            let clamped = clamp_score(parse_score(score).unwrap_or(0));
            obj.insert("score".to_string(), Value::from(clamped));
        }
    }
    match decode_nomination(Some(&raw)) {
        Decoded::Nomination(n) if n.eligible_name().is_some() => Some(n),
        _ => None,
    }
}

fn finalize_category_scores(raw: Vec<RawCategoryScore>) -> Vec<CategoryScore> {
    raw.into_iter()
        .map(|s| CategoryScore {
            category: s.category.unwrap_or_else(|| "Unknown".to_string()),
            score: s
                .score
                .as_ref()
                .and_then(parse_score)
                .map(|v| clamp_score(v) as i32),
            reasoning: s.reasoning.unwrap_or_default(),
        })
        .collect()
}

fn finalize_evaluation(
    raw: RawEvaluation,
    staff: &[StaffPerformance],
) -> (Option<Nomination>, Option<Nomination>, Vec<StaffScoreSet>) {
    let ascend = finalize_top_performer(raw.top_performers.ascend_recognition);
    let north = finalize_top_performer(raw.top_performers.north_recognition);

    let scores = raw
        .all_staff_scores
        .into_iter()
        .map(|s| {
            let staff_member_id = staff
                .iter()
                .find(|p| p.name == s.staff_member)
                .and_then(|p| p.user_id);
            StaffScoreSet {
                staff_member_id,
                ascend_scores: finalize_category_scores(s.ascend_scores),
                north_scores: finalize_category_scores(s.north_scores),
                staff_member: s.staff_member,
            }
        })
        .collect();

    (ascend, north, scores)
}

/// Flattens per-staff scores into rows. Categories without a score are skipped.
pub fn scores_for_week(
    week_ending_date: NaiveDate,
    sets: &[StaffScoreSet],
    created_by: Option<Uuid>,
) -> Vec<StaffScore> {
    let mut rows = Vec::new();
    for set in sets {
        let staff_member_name = if set.staff_member.trim().is_empty() {
            "Unknown".to_string()
        } else {
            set.staff_member.clone()
        };
        for (framework, scores) in [
            (AwardFramework::Ascend, &set.ascend_scores),
            (AwardFramework::North, &set.north_scores),
        ] {
            for score in scores {
                let Some(value) = score.score else { continue };
                rows.push(StaffScore {
                    week_ending_date,
                    staff_member_name: staff_member_name.clone(),
                    staff_member_id: set.staff_member_id,
                    framework,
                    category_name: score.category.clone(),
                    score: value,
                    reasoning: score.reasoning.clone(),
                    created_by,
                });
            }
        }
    }
    rows
}

/// Markdown report stored alongside the week's nominations.
pub fn render_recognition_report(
    week_ending_date: NaiveDate,
    ascend: Option<&Nomination>,
    north: Option<&Nomination>,
    generated_at: DateTime<Utc>,
) -> String {
    let mut md = format!(
        "# Weekly Staff Recognition Report\n\n**Week Ending:** {week_ending_date}\n**Generated:** {}\n\n",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    );

    for (framework, heading, nomination) in [
        (AwardFramework::Ascend, "## 🌟 ASCEND Recognition", ascend),
        (AwardFramework::North, "## 🧭 NORTH Recognition", north),
    ] {
        md.push_str(heading);
        md.push('\n');
        match nomination {
            Some(n) => {
                md.push_str(&format!(
                    "**Recipient:** {}\n**Category:** {}\n**Performance Score:** {}/4\n**Reasoning:** {}\n\n",
                    n.eligible_name().unwrap_or("Unknown"),
                    n.category.as_deref().unwrap_or("Unknown"),
                    n.score.unwrap_or(0),
                    n.reasoning.as_deref().unwrap_or("No reasoning provided"),
                ));
            }
            None => md.push_str(&format!(
                "No {} recognition awarded this week.\n\n",
                framework.as_str()
            )),
        }
    }

    md.push_str("---\nGenerated by the Housing & Residence Life Staff Recognition System");
    md
}

// ────────────────────────────────────────────────────────────────────────────
// Operations
// ────────────────────────────────────────────────────────────────────────────

/// Asks the model for the week's top performers and per-category scores, and
/// optionally persists both.
pub async fn evaluate_week(
    llm: &LlmClient,
    store: &dyn RecognitionStore,
    rubric_dir: &Path,
    req: EvaluateRequest,
) -> Result<EvaluationResult, AppError> {
    if req.staff.is_empty() {
        return Err(AppError::Validation(
            "At least one staff member's performance data is required".to_string(),
        ));
    }

    let rubrics = load_rubrics(rubric_dir).await?;
    let prompt = build_evaluation_prompt(&rubrics, &req.staff)?;
    let system = format!("{EVALUATION_SYSTEM} {JSON_ONLY_SYSTEM}");

    let raw: RawEvaluation = llm
        .call_json(&prompt, &system)
        .await
        .map_err(|e| AppError::Llm(format!("Weekly evaluation failed: {e}")))?;

    let (ascend, north, all_staff_scores) = finalize_evaluation(raw, &req.staff);
    info!(
        "Evaluated week ending {}: {} staff scored, ascend={}, north={}",
        req.week_ending_date,
        all_staff_scores.len(),
        ascend.is_some(),
        north.is_some()
    );

    let mut result = EvaluationResult {
        week_ending_date: req.week_ending_date,
        ascend_recognition: ascend,
        north_recognition: north,
        all_staff_scores,
        saved: false,
        scores_saved: 0,
        message: format!("Evaluation complete for week ending {}", req.week_ending_date),
    };

    if req.save {
        save_evaluation(store, &mut result, req.created_by).await?;
    }

    Ok(result)
}

/// Stores the evaluated nominations and replaces the week's individual scores,
/// so re-evaluating a week never leaves rows from an earlier run behind.
pub async fn save_evaluation(
    store: &dyn RecognitionStore,
    result: &mut EvaluationResult,
    created_by: Option<Uuid>,
) -> Result<(), AppError> {
    save_week(
        store,
        result.week_ending_date,
        result.ascend_recognition.clone(),
        result.north_recognition.clone(),
        created_by,
    )
    .await?;
    let rows = scores_for_week(result.week_ending_date, &result.all_staff_scores, created_by);
    result.scores_saved = store.replace_scores(result.week_ending_date, &rows).await?;
    result.saved = true;
    result.message = format!(
        "Staff recognition saved for week ending {} with {} individual scores",
        result.week_ending_date, result.scores_saved
    );
    Ok(())
}

/// Stores one week's nominations together with the rendered report.
pub async fn save_week(
    store: &dyn RecognitionStore,
    week_ending_date: NaiveDate,
    ascend_recognition: Option<Nomination>,
    north_recognition: Option<Nomination>,
    created_by: Option<Uuid>,
) -> Result<WeeklyRecognition, AppError> {
    let recognition_text = render_recognition_report(
        week_ending_date,
        ascend_recognition.as_ref(),
        north_recognition.as_ref(),
        Utc::now(),
    );
    let week = WeeklyRecognition {
        week_ending_date,
        ascend_recognition,
        north_recognition,
        recognition_text,
        created_by,
    };
    store.upsert_weekly(&week).await?;
    info!("Saved staff recognition for week ending {week_ending_date}");
    Ok(week)
}

/// Decodes a manually submitted nomination. Present values must decode and name someone.
pub fn nomination_from_request(
    framework: AwardFramework,
    raw: Option<&Value>,
) -> Result<Option<Nomination>, AppError> {
    match decode_nomination(raw) {
        Decoded::Missing => Ok(None),
        Decoded::Malformed => Err(AppError::Validation(format!(
            "{} nomination could not be decoded",
            framework.as_str()
        ))),
        Decoded::Nomination(n) if n.eligible_name().is_none() => {
            warn!("Rejected {} nomination without a staff member", framework.as_str());
            Err(AppError::Validation(format!(
                "{} nomination must name a staff member",
                framework.as_str()
            )))
        }
        Decoded::Nomination(n) => Ok(Some(n)),
    }
}
