// LLM prompt constants for weekly evaluation and tie-candidate summaries.
// Reuses cross-cutting fragments from llm_client::prompts.

/// Role for the weekly staff evaluation. Sent together with `JSON_ONLY_SYSTEM`.
pub const EVALUATION_SYSTEM: &str =
    "You are evaluating staff performance for a university Housing & Residence Life department.";

/// Weekly evaluation prompt. Replace `{rating_scale}`, `{evidence}`, `{ascend_rubric}`,
/// `{north_rubric}` and `{staff_json}` before sending.
pub const EVALUATION_PROMPT_TEMPLATE: &str = r#"Review the staff performance data and the ASCEND and NORTH rubrics provided below.
Select ONE staff member who best exemplifies an ASCEND pillar and ONE who best exemplifies a NORTH pillar.

{rating_scale}

{evidence}

ASCEND Rubric:
{ascend_rubric}

NORTH Rubric:
{north_rubric}

Staff Performance Data:
{staff_json}

You must provide TWO outputs:
1. Top performers (one for ASCEND, one for NORTH)
2. Scores for every staff member in every category where they logged activities

If a staff member has NO activities in a category, leave that category out of their scores entirely.

Return a JSON object with this EXACT schema, with every score between 1 and 4:
{
  "top_performers": {
    "ascend_recognition": {
      "staff_member": "Full Name",
      "category": "ASCEND Category Letter - Full Name",
      "reasoning": "Specific reasoning based on their activities",
      "score": 3
    },
    "north_recognition": {
      "staff_member": "Full Name",
      "category": "NORTH Pillar Letter - Full Name",
      "reasoning": "Specific reasoning based on their activities",
      "score": 3
    }
  },
  "all_staff_scores": [
    {
      "staff_member": "Full Name",
      "ascend_scores": [
        {"category": "A - Accountability", "score": 3, "reasoning": "Brief reasoning"}
      ],
      "north_scores": [
        {"category": "N - Navigate Change", "score": 2, "reasoning": "Brief reasoning"}
      ]
    }
  ]
}"#;

/// System prompt for winner and tie-candidate summaries. Plain prose output.
pub const SUMMARY_SYSTEM: &str =
    "You help Housing & Residence Life leadership understand and choose recognition winners. \
    Write in plain prose, no headings, no bullet lists, no markdown.";

/// Candidate summary prompt. Replace `{candidate}`, `{standing}`, `{framework}`,
/// `{period}`, `{evidence}` and `{nominations_json}` before sending.
pub const SUMMARY_PROMPT_TEMPLATE: &str = r#"{candidate} {standing} the {framework} recognition award for {period}.

{evidence}

Below is every {framework} nomination {candidate} received during the period:
{nominations_json}

In one paragraph of at most 120 words, summarize how {candidate} exemplified the {framework} framework across these weeks: the sub-pillars recognized, the strongest evidence from the reasoning, and the scores received."#;
