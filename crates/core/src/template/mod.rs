//! Schedule templates: recurring multi-week rotations addressed by
//! (week, weekday) cells.
//!
//! A [`ScheduleTemplate`] owns its [`TemplateShift`] entries. Reads hand out
//! clones; every mutation goes through [`editor::TemplateEditor`].

pub mod editor;

use chrono::{NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::config::EngineConfig;
use crate::error::CoreError;
use crate::shift::{self, ShiftType};
use crate::types::{DbId, Timestamp, WeekdayNumber};

pub use editor::{TemplateEditor, TemplateShiftPatch};

/// Days per template week.
pub const DAYS_PER_WEEK: u8 = 7;

/// Week count used when the caller does not pick one.
pub const DEFAULT_WEEK_COUNT: u32 = 2;

/// Maximum template name length, in characters.
pub const MAX_NAME_LEN: usize = 200;

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// One recurring assignment slot inside a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateShift {
    pub id: Uuid,
    /// 1-based template week.
    pub week_index: u32,
    /// ISO weekday, 1 = Monday .. 7 = Sunday.
    pub weekday: WeekdayNumber,
    pub start_time: NaiveTime,
    /// Earlier than `start_time` for overnight shifts.
    pub end_time: NaiveTime,
    pub shift_type: ShiftType,
    /// `None` leaves the slot to be filled when the template is applied.
    pub professional_id: Option<DbId>,
}

impl TemplateShift {
    pub fn is_overnight(&self) -> bool {
        shift::is_overnight(self.start_time, self.end_time)
    }

    pub fn cell(&self) -> (u32, WeekdayNumber) {
        (self.week_index, self.weekday)
    }
}

/// Input for creating a template.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewScheduleTemplate {
    /// Trimmed and length-checked by [`validate_name`].
    pub name: String,
    pub location_id: DbId,
    /// Upper bound comes from [`EngineConfig::max_week_count`].
    #[serde(default = "default_week_count")]
    #[validate(range(min = 1))]
    pub week_count: u32,
}

fn default_week_count() -> u32 {
    DEFAULT_WEEK_COUNT
}

/// Reusable rotation pattern owned by one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleTemplate {
    id: Uuid,
    name: String,
    location_id: DbId,
    week_count: u32,
    shifts: Vec<TemplateShift>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl ScheduleTemplate {
    /// Create an empty template using the default engine limits.
    pub fn new(input: NewScheduleTemplate) -> Result<Self, CoreError> {
        Self::with_config(input, &EngineConfig::default())
    }

    /// Create an empty template, checking `week_count` against `config`.
    pub fn with_config(input: NewScheduleTemplate, config: &EngineConfig) -> Result<Self, CoreError> {
        input.validate()?;
        let name = validate_name(&input.name)?;
        validate_week_limit(input.week_count, config)?;

        let now = Utc::now();
        let template = Self {
            id: Uuid::now_v7(),
            name,
            location_id: input.location_id,
            week_count: input.week_count,
            shifts: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        tracing::debug!(
            template_id = %template.id,
            location_id = template.location_id,
            week_count = template.week_count,
            "Created schedule template"
        );
        Ok(template)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location_id(&self) -> DbId {
        self.location_id
    }

    pub fn week_count(&self) -> u32 {
        self.week_count
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    pub fn len(&self) -> usize {
        self.shifts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shifts.is_empty()
    }

    // -----------------------------------------------------------------------
    // Grid reads
    // -----------------------------------------------------------------------

    /// Template shifts in cell `(week, weekday)`, in insertion order.
    pub fn shifts_at(&self, week: u32, weekday: WeekdayNumber) -> Result<Vec<TemplateShift>, CoreError> {
        self.check_cell(week, weekday)?;
        Ok(self.cell_iter(week, weekday).cloned().collect())
    }

    /// Every template shift, in insertion order.
    pub fn all_shifts(&self) -> Vec<TemplateShift> {
        self.shifts.clone()
    }

    pub fn shift(&self, id: Uuid) -> Option<TemplateShift> {
        self.shifts.iter().find(|s| s.id == id).cloned()
    }

    /// Whether any shift is placed in template week `week`.
    pub fn is_week_occupied(&self, week: u32) -> bool {
        self.shifts.iter().any(|s| s.week_index == week)
    }

    /// Re-check the structural invariants. Templates built through the editor
    /// always pass; deserialized snapshots may not.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.week_count == 0 {
            return Err(CoreError::PreconditionFailed(format!(
                "Template {} has a week count of 0",
                self.id
            )));
        }
        for shift in &self.shifts {
            if shift.week_index == 0 || shift.week_index > self.week_count {
                return Err(CoreError::PreconditionFailed(format!(
                    "Template shift {} is in week {} but the template has {} weeks",
                    shift.id, shift.week_index, self.week_count
                )));
            }
            if !(1..=DAYS_PER_WEEK).contains(&shift.weekday) {
                return Err(CoreError::PreconditionFailed(format!(
                    "Template shift {} has weekday {}",
                    shift.id, shift.weekday
                )));
            }
            if shift.start_time == shift.end_time {
                return Err(CoreError::PreconditionFailed(format!(
                    "Template shift {} has zero length",
                    shift.id
                )));
            }
        }
        let mut ids: Vec<Uuid> = self.shifts.iter().map(|s| s.id).collect();
        ids.sort_unstable();
        if ids.windows(2).any(|pair| pair[0] == pair[1]) {
            return Err(CoreError::PreconditionFailed(format!(
                "Template {} contains duplicate shift ids",
                self.id
            )));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Internals shared with the editor and the applier
    // -----------------------------------------------------------------------

    pub(crate) fn cell_iter(
        &self,
        week: u32,
        weekday: WeekdayNumber,
    ) -> impl Iterator<Item = &TemplateShift> {
        self.shifts
            .iter()
            .filter(move |s| s.week_index == week && s.weekday == weekday)
    }

    pub(crate) fn check_cell(&self, week: u32, weekday: WeekdayNumber) -> Result<(), CoreError> {
        if week == 0 || week > self.week_count {
            return Err(CoreError::OutOfRange(format!(
                "Week {week} is outside 1..={}",
                self.week_count
            )));
        }
        if !(1..=DAYS_PER_WEEK).contains(&weekday) {
            return Err(CoreError::OutOfRange(format!(
                "Weekday {weekday} is outside 1..=7"
            )));
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

// ---------------------------------------------------------------------------
// Validators
// ---------------------------------------------------------------------------

/// Trim `name` and enforce the length bounds.
pub fn validate_name(name: &str) -> Result<String, CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Template name must not be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "Template name exceeds {MAX_NAME_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

fn validate_week_limit(week_count: u32, config: &EngineConfig) -> Result<(), CoreError> {
    if week_count == 0 {
        return Err(CoreError::PreconditionFailed(
            "A template needs at least one week".to_string(),
        ));
    }
    if week_count > config.max_week_count {
        return Err(CoreError::OutOfRange(format!(
            "Week count {week_count} exceeds the limit of {}",
            config.max_week_count
        )));
    }
    Ok(())
}
