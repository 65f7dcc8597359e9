use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::recognition::period::Period;

/// The two independent award frameworks a staff member can be nominated under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AwardFramework {
    Ascend,
    North,
}

impl AwardFramework {
    pub const ALL: [AwardFramework; 2] = [AwardFramework::Ascend, AwardFramework::North];

    pub fn as_str(&self) -> &'static str {
        match self {
            AwardFramework::Ascend => "ASCEND",
            AwardFramework::North => "NORTH",
        }
    }
}

/// A nomination detail object: who was recognized, under which sub-pillar, and why.
///
/// Unknown fields are kept in `extra` so the full object round-trips into winner rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Nomination {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staff_member: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_score",
        skip_serializing_if = "Option::is_none"
    )]
    pub score: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Nomination {
    /// The name used as the tally key, if the nomination is tally-eligible.
    pub fn eligible_name(&self) -> Option<&str> {
        self.staff_member
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// Accepts `3`, `3.0` or `"3"`; anything else becomes `None`.
fn lenient_score<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    })
}

/// One week's stored recognition row, with nomination columns exactly as persisted.
///
/// Legacy rows may hold JSON-encoded strings; decode with `parser::decode_nomination`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionRecord {
    pub week_ending_date: NaiveDate,
    pub ascend_recognition: Option<Value>,
    pub north_recognition: Option<Value>,
}

impl RecognitionRecord {
    pub fn raw(&self, framework: AwardFramework) -> Option<&Value> {
        match framework {
            AwardFramework::Ascend => self.ascend_recognition.as_ref(),
            AwardFramework::North => self.north_recognition.as_ref(),
        }
    }
}

/// A week's nominations to persist, always as structured values.
#[derive(Debug, Clone)]
pub struct WeeklyRecognition {
    pub week_ending_date: NaiveDate,
    pub ascend_recognition: Option<Nomination>,
    pub north_recognition: Option<Nomination>,
    pub recognition_text: String,
    pub created_by: Option<uuid::Uuid>,
}

/// Column changes for a period-winner upsert. `None` leaves the stored column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WinnerUpdate {
    pub ascend_winner: Option<Value>,
    pub north_winner: Option<Value>,
}

impl WinnerUpdate {
    pub fn set(&mut self, framework: AwardFramework, detail: Value) {
        match framework {
            AwardFramework::Ascend => self.ascend_winner = Some(detail),
            AwardFramework::North => self.north_winner = Some(detail),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ascend_winner.is_none() && self.north_winner.is_none()
    }
}

/// The stored winners of one monthly or quarterly period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodWinner {
    pub period: Period,
    pub ascend_winner: Option<Value>,
    pub north_winner: Option<Value>,
    pub updated_at: DateTime<Utc>,
}

/// One clamped per-category score for a staff member in a given week.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaffScore {
    pub week_ending_date: NaiveDate,
    pub staff_member_name: String,
    pub staff_member_id: Option<uuid::Uuid>,
    pub framework: AwardFramework,
    pub category_name: String,
    pub score: i32,
    pub reasoning: String,
    pub created_by: Option<uuid::Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nomination_keeps_unknown_fields() {
        let raw = json!({
            "staff_member": "Alice",
            "category": "A - Accountability",
            "score": 4,
            "reasoning": "Covered three duty shifts",
            "week": "2026-01-03"
        });
        let nomination: Nomination = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(nomination.extra.get("week"), Some(&json!("2026-01-03")));
        assert_eq!(serde_json::to_value(&nomination).unwrap(), raw);
    }

    #[test]
    fn test_lenient_score_accepts_strings() {
        let nomination: Nomination =
            serde_json::from_value(json!({"staff_member": "Bob", "score": "3"})).unwrap();
        assert_eq!(nomination.score, Some(3));
        let nomination: Nomination =
            serde_json::from_value(json!({"staff_member": "Bob", "score": "high"})).unwrap();
        assert_eq!(nomination.score, None);
    }

    #[test]
    fn test_blank_name_is_not_eligible() {
        let blank = Nomination {
            staff_member: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(blank.eligible_name(), None);
        assert_eq!(Nomination::default().eligible_name(), None);
    }

    #[test]
    fn test_framework_serializes_upper_case() {
        assert_eq!(
            serde_json::to_value(AwardFramework::North).unwrap(),
            json!("NORTH")
        );
    }
}
