//! Winner resolution. Turns a period tally into per-framework outcomes and
//! persists clean wins.
//!
//! Two-step protocol:
//! 1. `resolve_period()` → per framework `NotAwarded | Winner | Tie(TieBreakRequest)`
//! 2. `complete_tie(request, chosen)` → the same write a clean win would make
//!
//! The `TieBreakRequest` is handed back to the caller and returned verbatim on
//! completion; nothing about an open tie is kept server-side.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::recognition::models::{AwardFramework, Nomination, PeriodWinner, WinnerUpdate};
use crate::recognition::period::Period;
use crate::recognition::store::RecognitionStore;
use crate::recognition::summaries::{summarize_tie, summarize_winner, CandidateSummarizer};
use crate::recognition::tally::{find_nomination, tally_period, ScanDiagnostics};

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// Result of scanning one framework's counts for its maximum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Empty,
    Clean { staff_member: String, count: u32 },
    Tie { candidates: Vec<String>, count: u32 },
}

/// A tie awaiting a human choice. Returned to the caller and sent back on completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TieBreakRequest {
    pub period: Period,
    pub framework: AwardFramework,
    /// Every staff member sharing the maximum count, in name order.
    pub candidates: Vec<String>,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CategoryOutcome {
    NotAwarded,
    Winner {
        staff_member: String,
        count: u32,
        nomination: Nomination,
        /// "Why this winner?" text; `None` when no summarizer was supplied.
        summary: Option<String>,
    },
    Tie {
        tie: TieBreakRequest,
        summaries: BTreeMap<String, String>,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub period: Period,
    pub label: String,
    pub ascend: CategoryOutcome,
    pub north: CategoryOutcome,
    pub diagnostics: ScanDiagnostics,
    /// The stored winner row, when at least one framework had a clean win.
    pub saved: Option<PeriodWinner>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TieBreakCompletion {
    pub period: Period,
    pub framework: AwardFramework,
    pub staff_member: String,
    /// `None` when no matching nomination was found and a placeholder was stored.
    pub nomination: Option<Nomination>,
    pub warning: Option<String>,
    pub saved: PeriodWinner,
    pub message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Decision
// ────────────────────────────────────────────────────────────────────────────

/// Picks the single highest count, or every name sharing it.
pub fn decide(counts: &BTreeMap<String, u32>) -> Decision {
    let Some(max) = counts.values().copied().max() else {
        return Decision::Empty;
    };

    let mut leaders: Vec<String> = counts
        .iter()
        .filter(|(_, &count)| count == max)
        .map(|(name, _)| name.clone())
        .collect();

    if leaders.len() > 1 {
        Decision::Tie {
            candidates: leaders,
            count: max,
        }
    } else {
        Decision::Clean {
            staff_member: leaders.remove(0),
            count: max,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Resolution
// ────────────────────────────────────────────────────────────────────────────

/// Tallies the period, writes every clean win in one upsert, and surfaces ties.
///
/// A tie in one framework never blocks the other framework's clean win. Frameworks
/// without a clean win leave their stored winner column untouched.
pub async fn resolve_period(
    store: &dyn RecognitionStore,
    summarizer: Option<&dyn CandidateSummarizer>,
    period: Period,
) -> Result<Resolution, AppError> {
    period.validate()?;
    let window = period.window();
    let records = store.records_between(window.0, window.1).await?;
    let tally = tally_period(&records, window);

    let mut update = WinnerUpdate::default();
    let mut outcomes = Vec::with_capacity(AwardFramework::ALL.len());

    for framework in AwardFramework::ALL {
        let outcome = match decide(tally.counts(framework)) {
            Decision::Empty => CategoryOutcome::NotAwarded,
            Decision::Clean {
                staff_member,
                count,
            } => {
                // The tally counted this name, so a nomination exists in the window.
                let nomination = find_nomination(&records, window, framework, &staff_member)
                    .unwrap_or_else(|| Nomination {
                        staff_member: Some(staff_member.clone()),
                        ..Default::default()
                    });
                update.set(framework, to_detail(&nomination)?);
                let summary = match summarizer {
                    Some(s) => {
                        Some(summarize_winner(s, period, framework, &staff_member, &records).await)
                    }
                    None => None,
                };
                CategoryOutcome::Winner {
                    staff_member,
                    count,
                    nomination,
                    summary,
                }
            }
            Decision::Tie { candidates, count } => {
                let tie = TieBreakRequest {
                    period,
                    framework,
                    candidates,
                    count,
                };
                let summaries = match summarizer {
                    Some(s) => summarize_tie(s, &tie, &records, window).await,
                    None => BTreeMap::new(),
                };
                CategoryOutcome::Tie { tie, summaries }
            }
        };
        outcomes.push(outcome);
    }

    let saved = if update.is_empty() {
        None
    } else {
        Some(store.upsert_winner(&period, &update).await?)
    };

    let mut outcomes = outcomes.into_iter();
    let ascend = outcomes.next().unwrap_or(CategoryOutcome::NotAwarded);
    let north = outcomes.next().unwrap_or(CategoryOutcome::NotAwarded);
    let message = resolution_message(&period, &ascend, &north, &tally.diagnostics);

    info!(
        "Resolved {}: {} records scanned, {} malformed skipped, saved={}",
        period.label(),
        tally.diagnostics.records_scanned,
        tally.diagnostics.skipped_malformed,
        saved.is_some()
    );

    Ok(Resolution {
        period,
        label: period.label(),
        ascend,
        north,
        diagnostics: tally.diagnostics,
        saved,
        message,
    })
}

/// Persists a reviewer's choice for a previously surfaced tie.
///
/// If the chosen name no longer has a nomination in the window, an empty `{}`
/// placeholder is stored and a warning returned, so the decision is still recorded.
pub async fn complete_tie(
    store: &dyn RecognitionStore,
    request: &TieBreakRequest,
    chosen: &str,
) -> Result<TieBreakCompletion, AppError> {
    request.period.validate()?;
    let chosen = chosen.trim();
    if !request.candidates.iter().any(|c| c == chosen) {
        return Err(AppError::Validation(format!(
            "'{chosen}' is not one of the tied candidates: {}",
            request.candidates.join(", ")
        )));
    }

    let window = request.period.window();
    let records = store.records_between(window.0, window.1).await?;
    let nomination = find_nomination(&records, window, request.framework, chosen);

    let (detail, warning) = match &nomination {
        Some(n) => (to_detail(n)?, None),
        None => {
            let warning = format!(
                "No {} nomination found for {chosen} in {}; saved an empty placeholder",
                request.framework.as_str(),
                request.period.label()
            );
            warn!("{warning}");
            (json!({}), Some(warning))
        }
    };

    let mut update = WinnerUpdate::default();
    update.set(request.framework, detail);
    let saved = store.upsert_winner(&request.period, &update).await?;

    info!(
        "Tie for {} {} resolved in favour of {chosen}",
        request.period.label(),
        request.framework.as_str()
    );

    Ok(TieBreakCompletion {
        period: request.period,
        framework: request.framework,
        staff_member: chosen.to_string(),
        message: format!(
            "{chosen} saved as the {} winner for {}",
            request.framework.as_str(),
            request.period.label()
        ),
        nomination,
        warning,
        saved,
    })
}

fn to_detail(nomination: &Nomination) -> Result<Value, AppError> {
    Ok(serde_json::to_value(nomination).map_err(anyhow::Error::from)?)
}

fn resolution_message(
    period: &Period,
    ascend: &CategoryOutcome,
    north: &CategoryOutcome,
    diagnostics: &ScanDiagnostics,
) -> String {
    let label = period.label();
    if matches!(ascend, CategoryOutcome::NotAwarded) && matches!(north, CategoryOutcome::NotAwarded)
    {
        return format!(
            "No staff recognitions found for {label} ({} weekly records scanned, \
             {} ASCEND and {} NORTH eligible nominations). \
             Make sure weekly recognitions for this period have been saved.",
            diagnostics.records_scanned, diagnostics.ascend_eligible, diagnostics.north_eligible
        );
    }

    let part = |framework: AwardFramework, outcome: &CategoryOutcome| match outcome {
        CategoryOutcome::NotAwarded => format!("{}: not awarded", framework.as_str()),
        CategoryOutcome::Winner { staff_member, .. } => {
            format!("{}: {staff_member} saved", framework.as_str())
        }
        CategoryOutcome::Tie { tie, .. } => format!(
            "{}: tie between {}, select a winner",
            framework.as_str(),
            tie.candidates.join(", ")
        ),
    };

    format!(
        "{label}. {}. {}.",
        part(AwardFramework::Ascend, ascend),
        part(AwardFramework::North, north)
    )
}
