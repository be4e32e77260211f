//! Conflict detection between a candidate shift and already accepted shifts.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shift::ShiftInstance;

/// What to do with a candidate instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "decision")]
pub enum ConflictDecision {
    Accept,
    SkipSilently { conflicts_with: Uuid },
    SkipAndFlag { conflicts_with: Uuid },
    /// Accept the candidate and replace the instance with this id.
    Overwrite { target_id: Uuid },
}

/// Decides how a generated instance coexists with already accepted ones.
///
/// `accepted` holds instances at the candidate's location dated on the
/// candidate's day or an adjacent day, which is enough to catch overnight
/// collisions in both directions.
pub trait ConflictPolicy {
    fn decide(&self, candidate: &ShiftInstance, accepted: &[&ShiftInstance]) -> ConflictDecision;
}

impl<F> ConflictPolicy for F
where
    F: Fn(&ShiftInstance, &[&ShiftInstance]) -> ConflictDecision,
{
    fn decide(&self, candidate: &ShiftInstance, accepted: &[&ShiftInstance]) -> ConflictDecision {
        self(candidate, accepted)
    }
}

/// Reaction of [`StandardPolicy`] to an overlap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapAction {
    /// Skip the candidate and report it.
    #[default]
    Flag,
    /// Skip the candidate without surfacing it as a warning.
    Skip,
    /// Replace the first overlapping instance.
    Overwrite,
    /// Keep both.
    Allow,
}

/// Overlap-based policy. The default flags every overlap and never overwrites.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardPolicy {
    pub on_overlap: OverlapAction,
}

impl StandardPolicy {
    pub fn new(on_overlap: OverlapAction) -> Self {
        Self { on_overlap }
    }
}

impl ConflictPolicy for StandardPolicy {
    fn decide(&self, candidate: &ShiftInstance, accepted: &[&ShiftInstance]) -> ConflictDecision {
        if self.on_overlap == OverlapAction::Allow {
            return ConflictDecision::Accept;
        }
        let Some(hit) = find_overlap(candidate, accepted) else {
            return ConflictDecision::Accept;
        };
        match self.on_overlap {
            OverlapAction::Flag => ConflictDecision::SkipAndFlag {
                conflicts_with: hit.id,
            },
            OverlapAction::Skip => ConflictDecision::SkipSilently {
                conflicts_with: hit.id,
            },
            OverlapAction::Overwrite => ConflictDecision::Overwrite { target_id: hit.id },
            OverlapAction::Allow => ConflictDecision::Accept,
        }
    }
}

/// First instance in `accepted` whose interval overlaps `candidate`.
pub fn find_overlap<'a>(
    candidate: &ShiftInstance,
    accepted: &[&'a ShiftInstance],
) -> Option<&'a ShiftInstance> {
    accepted
        .iter()
        .copied()
        .find(|other| other.id != candidate.id && candidate.overlaps(other))
}

/// Whether `other` could collide with `candidate`: same location, dated on the
/// same day or one day either side.
pub fn is_neighbour(candidate: &ShiftInstance, other: &ShiftInstance) -> bool {
    candidate.location_id == other.location_id
        && (candidate.date - other.date).num_days().abs() <= 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shift::{parse_time, ShiftStatus, ShiftType};
    use chrono::NaiveDate;

    fn instance(location_id: i64, day: u32, start: &str, end: &str) -> ShiftInstance {
        ShiftInstance {
            id: Uuid::now_v7(),
            source_template_shift_id: None,
            location_id,
            professional_id: None,
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            start_time: parse_time(start).unwrap(),
            end_time: parse_time(end).unwrap(),
            shift_type: ShiftType::Normal,
            status: ShiftStatus::Scheduled,
            notes: None,
        }
    }

    #[test]
    fn accepts_when_nothing_overlaps() {
        let existing = instance(1, 4, "07:00", "13:00");
        let candidate = instance(1, 4, "13:00", "19:00");
        let decision = StandardPolicy::default().decide(&candidate, &[&existing]);
        assert_eq!(decision, ConflictDecision::Accept);
    }

    #[test]
    fn default_flags_overlap() {
        let existing = instance(1, 4, "07:00", "19:00");
        let candidate = instance(1, 4, "12:00", "20:00");
        let decision = StandardPolicy::default().decide(&candidate, &[&existing]);
        assert_eq!(
            decision,
            ConflictDecision::SkipAndFlag {
                conflicts_with: existing.id
            }
        );
    }

    #[test]
    fn overnight_from_previous_day_is_detected() {
        let night = instance(1, 4, "19:00", "07:00");
        let morning = instance(1, 5, "06:00", "10:00");
        let decision = StandardPolicy::default().decide(&morning, &[&night]);
        assert_eq!(
            decision,
            ConflictDecision::SkipAndFlag {
                conflicts_with: night.id
            }
        );
    }

    #[test]
    fn actions_map_to_decisions() {
        let existing = instance(1, 4, "07:00", "19:00");
        let candidate = instance(1, 4, "07:00", "19:00");

        let skip = StandardPolicy::new(OverlapAction::Skip).decide(&candidate, &[&existing]);
        assert_eq!(
            skip,
            ConflictDecision::SkipSilently {
                conflicts_with: existing.id
            }
        );

        let overwrite =
            StandardPolicy::new(OverlapAction::Overwrite).decide(&candidate, &[&existing]);
        assert_eq!(
            overwrite,
            ConflictDecision::Overwrite {
                target_id: existing.id
            }
        );

        let allow = StandardPolicy::new(OverlapAction::Allow).decide(&candidate, &[&existing]);
        assert_eq!(allow, ConflictDecision::Accept);
    }

    fn skip_everything(_: &ShiftInstance, accepted: &[&ShiftInstance]) -> ConflictDecision {
        match accepted.first() {
            Some(first) => ConflictDecision::SkipSilently {
                conflicts_with: first.id,
            },
            None => ConflictDecision::Accept,
        }
    }

    #[test]
    fn functions_are_policies() {
        let existing = instance(1, 4, "07:00", "19:00");
        let candidate = instance(1, 4, "20:00", "22:00");
        assert_eq!(skip_everything.decide(&candidate, &[]), ConflictDecision::Accept);
        assert_eq!(
            skip_everything.decide(&candidate, &[&existing]),
            ConflictDecision::SkipSilently {
                conflicts_with: existing.id
            }
        );
    }

    #[test]
    fn neighbours_are_same_location_within_a_day() {
        let base = instance(1, 10, "07:00", "19:00");
        assert!(is_neighbour(&base, &instance(1, 9, "07:00", "19:00")));
        assert!(is_neighbour(&base, &instance(1, 11, "07:00", "19:00")));
        assert!(!is_neighbour(&base, &instance(1, 12, "07:00", "19:00")));
        assert!(!is_neighbour(&base, &instance(2, 10, "07:00", "19:00")));
    }

    #[test]
    fn decision_serializes_with_tag() {
        let json = serde_json::to_value(ConflictDecision::Accept).unwrap();
        assert_eq!(json, serde_json::json!({"decision": "accept"}));
    }
}
