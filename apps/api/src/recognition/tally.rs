//! Period tally: counts eligible nominations per staff member per framework.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::recognition::models::{AwardFramework, Nomination, RecognitionRecord};
use crate::recognition::parser::{decode_nomination, Decoded};

/// What the scan saw, so a "not awarded" outcome can be diagnosed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScanDiagnostics {
    pub records_scanned: usize,
    pub ascend_eligible: usize,
    pub north_eligible: usize,
    /// Nomination values present but not decodable.
    pub skipped_malformed: usize,
    /// Decoded nominations without a staff member.
    pub skipped_ineligible: usize,
    pub weeks: Vec<WeekPresence>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekPresence {
    pub week_ending_date: NaiveDate,
    pub has_ascend: bool,
    pub has_north: bool,
}

/// Frequency counts for one period, keyed by staff display name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeriodTally {
    pub ascend: BTreeMap<String, u32>,
    pub north: BTreeMap<String, u32>,
    pub diagnostics: ScanDiagnostics,
}

impl PeriodTally {
    pub fn counts(&self, framework: AwardFramework) -> &BTreeMap<String, u32> {
        match framework {
            AwardFramework::Ascend => &self.ascend,
            AwardFramework::North => &self.north,
        }
    }

    fn counts_mut(&mut self, framework: AwardFramework) -> &mut BTreeMap<String, u32> {
        match framework {
            AwardFramework::Ascend => &mut self.ascend,
            AwardFramework::North => &mut self.north,
        }
    }
}

/// Records whose week ends inside `[start, end]`, in week order.
pub fn records_in_window(
    records: &[RecognitionRecord],
    (start, end): (NaiveDate, NaiveDate),
) -> Vec<&RecognitionRecord> {
    let mut in_window: Vec<_> = records
        .iter()
        .filter(|r| r.week_ending_date >= start && r.week_ending_date <= end)
        .collect();
    in_window.sort_by_key(|r| r.week_ending_date);
    in_window
}

/// Tallies every eligible nomination in the window. Malformed values are skipped and counted.
pub fn tally_period(records: &[RecognitionRecord], window: (NaiveDate, NaiveDate)) -> PeriodTally {
    let mut tally = PeriodTally::default();

    for record in records_in_window(records, window) {
        tally.diagnostics.records_scanned += 1;
        let mut presence = WeekPresence {
            week_ending_date: record.week_ending_date,
            has_ascend: false,
            has_north: false,
        };

        for framework in AwardFramework::ALL {
            let name = match decode_nomination(record.raw(framework)) {
                Decoded::Missing => continue,
                Decoded::Malformed => {
                    tally.diagnostics.skipped_malformed += 1;
                    continue;
                }
                Decoded::Nomination(n) => match n.eligible_name() {
                    Some(name) => name.to_string(),
                    None => {
                        tally.diagnostics.skipped_ineligible += 1;
                        continue;
                    }
                },
            };

            *tally.counts_mut(framework).entry(name).or_insert(0) += 1;
            match framework {
                AwardFramework::Ascend => {
                    presence.has_ascend = true;
                    tally.diagnostics.ascend_eligible += 1;
                }
                AwardFramework::North => {
                    presence.has_north = true;
                    tally.diagnostics.north_eligible += 1;
                }
            }
        }

        tally.diagnostics.weeks.push(presence);
    }

    tally
}

/// First nomination in the window for `staff_member` under `framework`, scanning in week order.
pub fn find_nomination(
    records: &[RecognitionRecord],
    window: (NaiveDate, NaiveDate),
    framework: AwardFramework,
    staff_member: &str,
) -> Option<Nomination> {
    records_in_window(records, window)
        .into_iter()
        .filter_map(|r| decode_nomination(r.raw(framework)).into_nomination())
        .find(|n| n.eligible_name() == Some(staff_member))
}
