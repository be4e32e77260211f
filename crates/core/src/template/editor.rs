//! Template mutations.
//!
//! Every operation validates first and mutates second, so a failed call leaves
//! the template (including `updated_at`) exactly as it was.

use chrono::{NaiveTime, Utc};
use uuid::Uuid;

use super::{validate_name, validate_week_limit, ScheduleTemplate, TemplateShift};
use crate::config::EngineConfig;
use crate::error::CoreError;
use crate::shift::{self, ShiftType};
use crate::types::{DbId, WeekdayNumber};

/// Start of the slot created by [`TemplateEditor::add_default_shift`].
pub const DEFAULT_SHIFT_START: (u32, u32) = (7, 0);

/// End of the slot created by [`TemplateEditor::add_default_shift`].
pub const DEFAULT_SHIFT_END: (u32, u32) = (19, 0);

/// Partial update for a template shift. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
pub struct TemplateShiftPatch {
    pub week_index: Option<u32>,
    pub weekday: Option<WeekdayNumber>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub shift_type: Option<ShiftType>,
    /// `Some(None)` unassigns the professional.
    #[serde(default, with = "double_option")]
    pub professional_id: Option<Option<DbId>>,
}

impl TemplateShiftPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Mutable handle over one template.
#[derive(Debug)]
pub struct TemplateEditor<'a> {
    template: &'a mut ScheduleTemplate,
    config: EngineConfig,
}

impl ScheduleTemplate {
    /// Editor using the default engine limits.
    pub fn editor(&mut self) -> TemplateEditor<'_> {
        TemplateEditor::new(self, EngineConfig::default())
    }

    pub fn editor_with(&mut self, config: EngineConfig) -> TemplateEditor<'_> {
        TemplateEditor::new(self, config)
    }

    /// Deep copy under a new name, with fresh template and shift ids.
    pub fn duplicate(&self, name: &str) -> Result<ScheduleTemplate, CoreError> {
        let name = validate_name(name)?;
        let now = Utc::now();
        let copy = ScheduleTemplate {
            id: Uuid::now_v7(),
            name,
            location_id: self.location_id,
            week_count: self.week_count,
            shifts: self
                .shifts
                .iter()
                .map(|s| TemplateShift {
                    id: Uuid::now_v7(),
                    ..s.clone()
                })
                .collect(),
            created_at: now,
            updated_at: now,
        };
        tracing::debug!(
            source_id = %self.id,
            template_id = %copy.id,
            shifts = copy.shifts.len(),
            "Duplicated schedule template"
        );
        Ok(copy)
    }
}

impl<'a> TemplateEditor<'a> {
    pub fn new(template: &'a mut ScheduleTemplate, config: EngineConfig) -> Self {
        Self { template, config }
    }

    /// Read-only view of the template being edited.
    pub fn template(&self) -> &ScheduleTemplate {
        self.template
    }

    // -----------------------------------------------------------------------
    // Shift operations
    // -----------------------------------------------------------------------

    /// Append a shift to cell `(week, weekday)`.
    ///
    /// Cells may hold several simultaneous shifts, so no overlap check is
    /// made against the cell's current entries.
    pub fn add_shift(
        &mut self,
        week: u32,
        weekday: WeekdayNumber,
        start_time: NaiveTime,
        end_time: NaiveTime,
        shift_type: ShiftType,
        professional_id: Option<DbId>,
    ) -> Result<TemplateShift, CoreError> {
        self.template.check_cell(week, weekday)?;
        shift::validate_time_span(start_time, end_time)?;

        let entry = TemplateShift {
            id: self.fresh_id(),
            week_index: week,
            weekday,
            start_time,
            end_time,
            shift_type,
            professional_id,
        };
        self.template.shifts.push(entry.clone());
        self.template.touch();

        tracing::debug!(
            template_id = %self.template.id,
            shift_id = %entry.id,
            week,
            weekday,
            "Added template shift"
        );
        Ok(entry)
    }

    /// Append an unassigned 07:00-19:00 normal shift to `(week, weekday)`.
    pub fn add_default_shift(
        &mut self,
        week: u32,
        weekday: WeekdayNumber,
    ) -> Result<TemplateShift, CoreError> {
        let (start_h, start_m) = DEFAULT_SHIFT_START;
        let (end_h, end_m) = DEFAULT_SHIFT_END;
        let start = NaiveTime::from_hms_opt(start_h, start_m, 0)
            .ok_or_else(|| CoreError::InvalidRange("Bad default start time".to_string()))?;
        let end = NaiveTime::from_hms_opt(end_h, end_m, 0)
            .ok_or_else(|| CoreError::InvalidRange("Bad default end time".to_string()))?;
        self.add_shift(week, weekday, start, end, ShiftType::Normal, None)
    }

    /// Apply `patch` to shift `id`. The shift keeps its id; it moves cells only
    /// when the patch names a week or weekday.
    pub fn update_shift(
        &mut self,
        id: Uuid,
        patch: TemplateShiftPatch,
    ) -> Result<TemplateShift, CoreError> {
        let position = self.position(id)?;
        let current = &self.template.shifts[position];

        let updated = TemplateShift {
            id: current.id,
            week_index: patch.week_index.unwrap_or(current.week_index),
            weekday: patch.weekday.unwrap_or(current.weekday),
            start_time: patch.start_time.unwrap_or(current.start_time),
            end_time: patch.end_time.unwrap_or(current.end_time),
            shift_type: patch.shift_type.unwrap_or(current.shift_type),
            professional_id: patch.professional_id.unwrap_or(current.professional_id),
        };
        self.template.check_cell(updated.week_index, updated.weekday)?;
        shift::validate_time_span(updated.start_time, updated.end_time)?;

        let moved = updated.cell() != current.cell();
        if moved {
            // A moved shift joins the end of its new cell.
            self.template.shifts.remove(position);
            self.template.shifts.push(updated.clone());
        } else {
            self.template.shifts[position] = updated.clone();
        }
        self.template.touch();

        tracing::debug!(
            template_id = %self.template.id,
            shift_id = %id,
            moved,
            "Updated template shift"
        );
        Ok(updated)
    }

    /// Remove shift `id`. Removing an id twice fails with `NotFound`.
    pub fn remove_shift(&mut self, id: Uuid) -> Result<(), CoreError> {
        let position = self.position(id)?;
        self.template.shifts.remove(position);
        self.template.touch();

        tracing::debug!(template_id = %self.template.id, shift_id = %id, "Removed template shift");
        Ok(())
    }

    /// Remove every shift. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.template.shifts.len();
        if removed > 0 {
            self.template.shifts.clear();
            self.template.touch();
        }
        tracing::debug!(template_id = %self.template.id, removed, "Cleared template");
        removed
    }

    // -----------------------------------------------------------------------
    // Template-level operations
    // -----------------------------------------------------------------------

    /// Resize the rotation.
    ///
    /// Shrinking below a week that still holds shifts is rejected; remove
    /// those shifts first.
    pub fn set_week_count(&mut self, week_count: u32) -> Result<(), CoreError> {
        validate_week_limit(week_count, &self.config)?;

        let previous = self.template.week_count;
        let stranded: Vec<u32> = if week_count < previous {
            (week_count + 1..=previous)
                .filter(|&week| self.template.is_week_occupied(week))
                .collect()
        } else {
            Vec::new()
        };
        if !stranded.is_empty() {
            return Err(CoreError::PreconditionFailed(format!(
                "Weeks {stranded:?} still hold shifts; clear them before shrinking to {week_count}"
            )));
        }

        if previous != week_count {
            self.template.week_count = week_count;
            self.template.touch();
        }
        tracing::debug!(
            template_id = %self.template.id,
            previous,
            week_count,
            "Set template week count"
        );
        Ok(())
    }

    pub fn rename(&mut self, name: &str) -> Result<(), CoreError> {
        let name = validate_name(name)?;
        self.template.name = name;
        self.template.touch();
        Ok(())
    }

    /// Move the template to another location. Existing shifts are kept.
    pub fn set_location(&mut self, location_id: DbId) {
        if self.template.location_id != location_id {
            self.template.location_id = location_id;
            self.template.touch();
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn position(&self, id: Uuid) -> Result<usize, CoreError> {
        self.template
            .shifts
            .iter()
            .position(|s| s.id == id)
            .ok_or(CoreError::NotFound {
                entity: "template_shift",
                id,
            })
    }

    fn fresh_id(&self) -> Uuid {
        loop {
            let id = Uuid::now_v7();
            if self.template.shifts.iter().all(|s| s.id != id) {
                return id;
            }
        }
    }
}

/// Distinguishes an absent field from an explicit `null` in patches.
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}
