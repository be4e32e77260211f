//! Template application: expand a [`ScheduleTemplate`] over a date range.
//!
//! The range is cut into 7-day weeks and each week is mapped onto a template
//! week, cycling through the rotation for as long as the range lasts. Every
//! generated instance is run past a [`ConflictPolicy`] before it is accepted;
//! rejected candidates come back as data, never as errors.

use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::conflict::{is_neighbour, ConflictDecision, ConflictPolicy, StandardPolicy};
use crate::error::CoreError;
use crate::shift::{ShiftInstance, ShiftStatus};
use crate::template::{ScheduleTemplate, TemplateShift, DAYS_PER_WEEK};
use crate::types::{DbId, WeekdayNumber};

// ---------------------------------------------------------------------------
// Request / outcome
// ---------------------------------------------------------------------------

/// How template weekdays line up with calendar days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyMode {
    /// A Tuesday always pulls from the template's Tuesday slot. Weeks run
    /// Monday to Sunday, so a range starting midweek opens with a partial week.
    KeepWeekday,
    /// The template's day 1 lands on `start_date` whatever weekday it is, and
    /// template weeks are 7-day blocks counted from there.
    #[default]
    Circular,
}

/// Parameters of one application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyRequest {
    pub start_date: NaiveDate,
    /// Inclusive.
    pub end_date: NaiveDate,
    /// Template week aligned with the first week of the range (1-based).
    #[serde(default = "first_week")]
    pub starting_template_week: u32,
    #[serde(default)]
    pub mode: ApplyMode,
}

fn first_week() -> u32 {
    1
}

impl ApplyRequest {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate, mode: ApplyMode) -> Self {
        Self {
            start_date,
            end_date,
            starting_template_week: 1,
            mode,
        }
    }

    pub fn starting_at_week(mut self, week: u32) -> Self {
        self.starting_template_week = week;
        self
    }

    /// Number of calendar days covered, or `None` when the range is inverted.
    pub fn day_count(&self) -> Option<u32> {
        let days = (self.end_date - self.start_date).num_days();
        if days < 0 {
            None
        } else {
            u32::try_from(days + 1).ok()
        }
    }
}

/// A candidate the conflict policy declined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedShift {
    pub instance: ShiftInstance,
    /// Instance that won the slot.
    pub conflicts_with: Uuid,
    /// `true` when the policy asked for the skip to be surfaced to the user.
    pub flagged: bool,
}

/// Result of an application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyOutcome {
    /// Accepted instances, ordered by date, then template weekday, then
    /// template shift id.
    pub generated: Vec<ShiftInstance>,
    pub skipped: Vec<SkippedShift>,
    /// Ids of existing instances the caller should replace with the
    /// corresponding generated ones.
    pub overwritten: Vec<Uuid>,
}

impl ApplyOutcome {
    pub fn flagged(&self) -> impl Iterator<Item = &SkippedShift> {
        self.skipped.iter().filter(|s| s.flagged)
    }

    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.overwritten.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Applier
// ---------------------------------------------------------------------------

/// Expands templates onto the calendar under a conflict policy.
pub struct TemplateApplier<'p> {
    config: EngineConfig,
    policy: &'p dyn ConflictPolicy,
}

static DEFAULT_POLICY: StandardPolicy = StandardPolicy {
    on_overlap: crate::conflict::OverlapAction::Flag,
};

impl Default for TemplateApplier<'static> {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            policy: &DEFAULT_POLICY,
        }
    }
}

impl<'p> TemplateApplier<'p> {
    pub fn new(config: EngineConfig, policy: &'p dyn ConflictPolicy) -> Self {
        Self { config, policy }
    }

    /// Generate instances for `request`. `existing` is only read, to detect
    /// conflicts.
    pub fn apply(
        &self,
        template: &ScheduleTemplate,
        request: &ApplyRequest,
        existing: &[ShiftInstance],
    ) -> Result<ApplyOutcome, CoreError> {
        let day_count = self.check(template, request)?;

        let existing_index = index_by_location_and_date(existing);
        let mut outcome = ApplyOutcome::default();
        let mut cell: Vec<&TemplateShift> = Vec::new();

        for (day_offset, date) in request
            .start_date
            .iter_days()
            .take(day_count as usize)
            .enumerate()
        {
            let (week, weekday) = slot_for(template, request, day_offset as u32, date);

            cell.clear();
            cell.extend(template.cell_iter(week, weekday));
            cell.sort_by_key(|s| s.id);

            for shift in &cell {
                let candidate = materialize(template.location_id(), shift, date);
                self.settle(candidate, existing, &existing_index, &mut outcome);
            }
        }

        tracing::info!(
            template_id = %template.id(),
            start = %request.start_date,
            end = %request.end_date,
            mode = ?request.mode,
            generated = outcome.generated.len(),
            skipped = outcome.skipped.len(),
            overwritten = outcome.overwritten.len(),
            "Applied schedule template"
        );
        Ok(outcome)
    }

    /// Validate everything up front; returns the number of days in range.
    fn check(&self, template: &ScheduleTemplate, request: &ApplyRequest) -> Result<u32, CoreError> {
        template.validate()?;
        if template.week_count() > self.config.max_week_count {
            return Err(CoreError::PreconditionFailed(format!(
                "Template {} has {} weeks but the limit is {}",
                template.id(),
                template.week_count(),
                self.config.max_week_count
            )));
        }

        // Overnight spill and neighbour lookups need the day on either side.
        if request.start_date.pred_opt().is_none() || request.end_date.succ_opt().is_none() {
            return Err(CoreError::InvalidRange(format!(
                "Range {}..={} touches the edge of the supported calendar",
                request.start_date, request.end_date
            )));
        }

        let day_count = request.day_count().ok_or_else(|| {
            CoreError::InvalidRange(format!(
                "End date {} is before start date {}",
                request.end_date, request.start_date
            ))
        })?;
        if day_count > self.config.max_apply_days {
            return Err(CoreError::InvalidRange(format!(
                "Range of {day_count} days exceeds the limit of {}",
                self.config.max_apply_days
            )));
        }

        let week = request.starting_template_week;
        if week == 0 || week > template.week_count() {
            return Err(CoreError::OutOfRange(format!(
                "Starting week {week} is outside 1..={}",
                template.week_count()
            )));
        }
        Ok(day_count)
    }

    /// Run the policy on one candidate and record the result.
    fn settle(
        &self,
        candidate: ShiftInstance,
        existing: &[ShiftInstance],
        existing_index: &HashMap<(DbId, NaiveDate), Vec<usize>>,
        outcome: &mut ApplyOutcome,
    ) {
        let decision = {
            let accepted = accepted_neighbours(&candidate, existing, existing_index, outcome);
            self.policy.decide(&candidate, &accepted)
        };

        match decision {
            ConflictDecision::Accept => outcome.generated.push(candidate),
            ConflictDecision::SkipSilently { conflicts_with } => {
                outcome.skipped.push(SkippedShift {
                    instance: candidate,
                    conflicts_with,
                    flagged: false,
                });
            }
            ConflictDecision::SkipAndFlag { conflicts_with } => {
                tracing::warn!(
                    date = %candidate.date,
                    location_id = candidate.location_id,
                    conflicts_with = %conflicts_with,
                    "Generated shift overlaps an accepted shift"
                );
                outcome.skipped.push(SkippedShift {
                    instance: candidate,
                    conflicts_with,
                    flagged: true,
                });
            }
            ConflictDecision::Overwrite { target_id } => {
                overwrite(candidate, target_id, existing, outcome);
            }
        }
    }
}

/// Apply with the default limits and the default (flagging) policy.
pub fn apply(
    template: &ScheduleTemplate,
    request: &ApplyRequest,
    existing: &[ShiftInstance],
) -> Result<ApplyOutcome, CoreError> {
    TemplateApplier::default().apply(template, request, existing)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Template cell feeding `date`, the `day_offset`-th day of the range.
fn slot_for(
    template: &ScheduleTemplate,
    request: &ApplyRequest,
    day_offset: u32,
    date: NaiveDate,
) -> (u32, WeekdayNumber) {
    let days = u32::from(DAYS_PER_WEEK);
    let (week_offset, weekday) = match request.mode {
        ApplyMode::KeepWeekday => {
            // Whole Mondays crossed since the start, counting its partial week.
            let lead = request.start_date.weekday().num_days_from_monday();
            ((day_offset + lead) / days, iso_weekday(date))
        }
        ApplyMode::Circular => (day_offset / days, (day_offset % days) as u8 + 1),
    };
    let cycle = u64::from(template.week_count());
    let start = u64::from(request.starting_template_week) - 1;
    let week = (start + u64::from(week_offset)) % cycle + 1;
    // week <= week_count, so it fits back into u32.
    (week as u32, weekday)
}

fn materialize(location_id: DbId, shift: &TemplateShift, date: NaiveDate) -> ShiftInstance {
    ShiftInstance {
        id: Uuid::now_v7(),
        source_template_shift_id: Some(shift.id),
        location_id,
        professional_id: shift.professional_id,
        date,
        start_time: shift.start_time,
        end_time: shift.end_time,
        shift_type: shift.shift_type,
        status: ShiftStatus::Scheduled,
        notes: None,
    }
}

fn index_by_location_and_date(existing: &[ShiftInstance]) -> HashMap<(DbId, NaiveDate), Vec<usize>> {
    let mut index: HashMap<(DbId, NaiveDate), Vec<usize>> = HashMap::new();
    for (i, instance) in existing.iter().enumerate() {
        index
            .entry((instance.location_id, instance.date))
            .or_default()
            .push(i);
    }
    index
}

/// Accepted instances that could collide with `candidate`: live existing
/// ones plus those generated so far.
fn accepted_neighbours<'a>(
    candidate: &ShiftInstance,
    existing: &'a [ShiftInstance],
    existing_index: &HashMap<(DbId, NaiveDate), Vec<usize>>,
    outcome: &'a ApplyOutcome,
) -> Vec<&'a ShiftInstance> {
    let mut accepted = Vec::new();

    let window = (-1..=1)
        .filter_map(|delta| candidate.date.checked_add_signed(Duration::days(delta)));
    for date in window {
        if let Some(positions) = existing_index.get(&(candidate.location_id, date)) {
            accepted.extend(
                positions
                    .iter()
                    .map(|&i| &existing[i])
                    .filter(|e| !outcome.overwritten.contains(&e.id)),
            );
        }
    }

    // Generated instances are date-ordered; only the tail can be neighbours.
    let earliest = candidate.date.pred_opt().unwrap_or(candidate.date);
    accepted.extend(
        outcome
            .generated
            .iter()
            .rev()
            .take_while(|g| g.date >= earliest)
            .filter(|g| is_neighbour(candidate, g)),
    );
    accepted
}

fn overwrite(
    candidate: ShiftInstance,
    target_id: Uuid,
    existing: &[ShiftInstance],
    outcome: &mut ApplyOutcome,
) {
    if let Some(position) = outcome.generated.iter().position(|g| g.id == target_id) {
        let replaced = outcome.generated.remove(position);
        outcome.skipped.push(SkippedShift {
            instance: replaced,
            conflicts_with: candidate.id,
            flagged: false,
        });
    } else if existing.iter().any(|e| e.id == target_id) {
        if !outcome.overwritten.contains(&target_id) {
            outcome.overwritten.push(target_id);
        }
    } else {
        tracing::warn!(
            target_id = %target_id,
            "Conflict policy asked to overwrite an unknown shift; keeping both"
        );
    }
    outcome.generated.push(candidate);
}

fn iso_weekday(date: NaiveDate) -> WeekdayNumber {
    date.weekday().number_from_monday() as WeekdayNumber
}
