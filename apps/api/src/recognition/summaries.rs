//! Candidate summaries: AI-written context explaining a clean win or helping a reviewer break a tie.
//!
//! `AppState` holds an `Arc<dyn CandidateSummarizer>`. A failed summary never
//! fails the resolution; the candidate just shows `NO_SUMMARY`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::warn;

use crate::errors::AppError;
use crate::llm_client::prompts::EVIDENCE_INSTRUCTION;
use crate::llm_client::LlmClient;
use crate::recognition::models::{AwardFramework, Nomination, RecognitionRecord};
use crate::recognition::parser::decode_nomination;
use crate::recognition::period::Period;
use crate::recognition::prompts::{SUMMARY_PROMPT_TEMPLATE, SUMMARY_SYSTEM};
use crate::recognition::resolver::TieBreakRequest;
use crate::recognition::tally::records_in_window;

pub const NO_SUMMARY: &str = "No summary available";

/// Where the candidate stands when the summary is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Standing {
    Tied,
    Winner,
}

impl Standing {
    fn phrase(self) -> &'static str {
        match self {
            Standing::Tied => "is tied for",
            Standing::Winner => "won",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SummaryRequest<'a> {
    pub period: Period,
    pub framework: AwardFramework,
    pub candidate: &'a str,
    pub standing: Standing,
}

#[async_trait]
pub trait CandidateSummarizer: Send + Sync {
    async fn summarize(
        &self,
        request: &SummaryRequest<'_>,
        nominations: &[Nomination],
    ) -> Result<String, AppError>;
}

/// Summarizer backed by the hosted LLM.
pub struct LlmCandidateSummarizer(pub LlmClient);

#[async_trait]
impl CandidateSummarizer for LlmCandidateSummarizer {
    async fn summarize(
        &self,
        request: &SummaryRequest<'_>,
        nominations: &[Nomination],
    ) -> Result<String, AppError> {
        let prompt = build_summary_prompt(request, nominations)?;
        self.0
            .call_text(&prompt, SUMMARY_SYSTEM)
            .await
            .map_err(|e| AppError::Llm(format!("Failed to summarize {}: {e}", request.candidate)))
    }
}

pub fn build_summary_prompt(
    request: &SummaryRequest<'_>,
    nominations: &[Nomination],
) -> Result<String, AppError> {
    let nominations_json =
        serde_json::to_string_pretty(nominations).map_err(anyhow::Error::from)?;
    Ok(SUMMARY_PROMPT_TEMPLATE
        .replace("{candidate}", request.candidate)
        .replace("{standing}", request.standing.phrase())
        .replace("{framework}", request.framework.as_str())
        .replace("{period}", &request.period.label())
        .replace("{evidence}", EVIDENCE_INSTRUCTION)
        .replace("{nominations_json}", &nominations_json))
}

fn nominations_for(
    records: &[RecognitionRecord],
    window: (NaiveDate, NaiveDate),
    framework: AwardFramework,
    candidate: &str,
) -> Vec<Nomination> {
    records_in_window(records, window)
        .into_iter()
        .filter_map(|r| decode_nomination(r.raw(framework)).into_nomination())
        .filter(|n| n.eligible_name() == Some(candidate))
        .collect()
}

async fn summarize_or_fallback(
    summarizer: &dyn CandidateSummarizer,
    request: &SummaryRequest<'_>,
    nominations: &[Nomination],
) -> String {
    match summarizer.summarize(request, nominations).await {
        Ok(text) => text,
        Err(e) => {
            warn!("Summary for {} unavailable: {e}", request.candidate);
            NO_SUMMARY.to_string()
        }
    }
}

/// Summaries for every tied candidate, keyed by name.
pub async fn summarize_tie(
    summarizer: &dyn CandidateSummarizer,
    tie: &TieBreakRequest,
    records: &[RecognitionRecord],
    window: (NaiveDate, NaiveDate),
) -> BTreeMap<String, String> {
    let mut summaries = BTreeMap::new();
    for candidate in &tie.candidates {
        let request = SummaryRequest {
            period: tie.period,
            framework: tie.framework,
            candidate,
            standing: Standing::Tied,
        };
        let nominations = nominations_for(records, window, tie.framework, candidate);
        let summary = summarize_or_fallback(summarizer, &request, &nominations).await;
        summaries.insert(candidate.clone(), summary);
    }
    summaries
}

/// "Why this winner?" text for a clean win.
pub async fn summarize_winner(
    summarizer: &dyn CandidateSummarizer,
    period: Period,
    framework: AwardFramework,
    staff_member: &str,
    records: &[RecognitionRecord],
) -> String {
    let request = SummaryRequest {
        period,
        framework,
        candidate: staff_member,
        standing: Standing::Winner,
    };
    let nominations = nominations_for(records, period.window(), framework, staff_member);
    summarize_or_fallback(summarizer, &request, &nominations).await
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use serde_json::json;

    /// Echoes how many nominations it saw; fails for "Fail".
    pub struct CountingSummarizer;

    #[async_trait]
    impl CandidateSummarizer for CountingSummarizer {
        async fn summarize(
            &self,
            request: &SummaryRequest<'_>,
            nominations: &[Nomination],
        ) -> Result<String, AppError> {
            let candidate = request.candidate;
            if candidate == "Fail" {
                return Err(AppError::Llm("quota exceeded".to_string()));
            }
            Ok(format!("{candidate}: {} nominations", nominations.len()))
        }
    }

    fn tie(candidates: &[&str]) -> TieBreakRequest {
        TieBreakRequest {
            period: Period::month(2026, 1).unwrap(),
            framework: AwardFramework::North,
            candidates: candidates.iter().map(|c| c.to_string()).collect(),
            count: 1,
        }
    }

    fn record(day: u32, north: &str) -> RecognitionRecord {
        RecognitionRecord {
            week_ending_date: NaiveDate::from_ymd_opt(2026, 1, day).unwrap(),
            ascend_recognition: None,
            north_recognition: Some(json!({"staff_member": north, "score": 3})),
        }
    }

    #[tokio::test]
    async fn test_summaries_cover_every_candidate() {
        let records = vec![record(3, "Dana"), record(10, "Eli"), record(17, "Dana")];
        let tie = tie(&["Dana", "Eli"]);
        let summaries =
            summarize_tie(&CountingSummarizer, &tie, &records, tie.period.window()).await;
        assert_eq!(summaries["Dana"], "Dana: 2 nominations");
        assert_eq!(summaries["Eli"], "Eli: 1 nominations");
    }

    #[tokio::test]
    async fn test_failed_summary_falls_back() {
        let records = vec![record(3, "Fail"), record(10, "Eli")];
        let tie = tie(&["Fail", "Eli"]);
        let summaries =
            summarize_tie(&CountingSummarizer, &tie, &records, tie.period.window()).await;
        assert_eq!(summaries["Fail"], NO_SUMMARY);
        assert_eq!(summaries.len(), 2);
    }

    #[test]
    fn test_summary_prompt_names_candidate_and_period() {
        let tie = tie(&["Dana", "Eli"]);
        let nomination = Nomination {
            staff_member: Some("Dana".to_string()),
            reasoning: Some("Mediated a roommate conflict".to_string()),
            ..Default::default()
        };
        let request = SummaryRequest {
            period: tie.period,
            framework: tie.framework,
            candidate: "Dana",
            standing: Standing::Tied,
        };
        let prompt = build_summary_prompt(&request, &[nomination]).unwrap();
        assert!(prompt.contains("Dana is tied for the NORTH recognition award for January 2026"));
        assert!(prompt.contains("Mediated a roommate conflict"));
        assert!(!prompt.contains("{evidence}"));
    }

    #[tokio::test]
    async fn test_winner_summary_uses_only_winner_nominations() {
        let records = vec![record(3, "Dana"), record(10, "Eli"), record(17, "Dana")];
        let period = Period::month(2026, 1).unwrap();
        let summary =
            summarize_winner(&CountingSummarizer, period, AwardFramework::North, "Dana", &records)
                .await;
        assert_eq!(summary, "Dana: 2 nominations");

        let failed =
            summarize_winner(&CountingSummarizer, period, AwardFramework::North, "Fail", &records)
                .await;
        assert_eq!(failed, NO_SUMMARY);
    }

    #[test]
    fn test_winner_prompt_wording() {
        let request = SummaryRequest {
            period: Period::quarter(2026, 2).unwrap(),
            framework: AwardFramework::Ascend,
            candidate: "Alice",
            standing: Standing::Winner,
        };
        let prompt = build_summary_prompt(&request, &[]).unwrap();
        assert!(prompt.contains("Alice won the ASCEND recognition award for FY2026 Q2"));
    }
}
