//! Shift vocabulary shared by templates and generated instances.
//!
//! Holds the shift type and status enums, the dated [`ShiftInstance`], and the
//! time-of-day helpers used to place a shift on the absolute timeline.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;
use crate::types::DbId;

/// `strftime` pattern for wall-clock times exchanged with the view layer.
pub const TIME_FORMAT: &str = "%H:%M";

// ---------------------------------------------------------------------------
// Shift type
// ---------------------------------------------------------------------------

/// Kind of shift. Presentation (colours, labels) belongs to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftType {
    #[default]
    Normal,
    Night,
    Weekend,
    Holiday,
    Coverage,
}

impl ShiftType {
    pub const ALL: [ShiftType; 5] = [
        ShiftType::Normal,
        ShiftType::Night,
        ShiftType::Weekend,
        ShiftType::Holiday,
        ShiftType::Coverage,
    ];

    /// Stable identifier matching the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Night => "night",
            Self::Weekend => "weekend",
            Self::Holiday => "holiday",
            Self::Coverage => "coverage",
        }
    }
}

impl std::str::FromStr for ShiftType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Invalid shift type '{s}'. Must be one of: normal, night, weekend, holiday, coverage"
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// Shift status
// ---------------------------------------------------------------------------

/// Lifecycle status of a dated shift.
///
/// Generation only emits [`ShiftStatus::Scheduled`]; the remaining statuses are
/// assigned afterwards by attendance and swap workflows in the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftStatus {
    #[default]
    Scheduled,
    Confirmed,
    JustifiedAbsence,
    UnjustifiedAbsence,
    Vacation,
    Holiday,
    Leave,
    DayOff,
    Swapped,
}

impl ShiftStatus {
    /// Whether the professional is expected on site for this shift.
    pub fn is_attending(self) -> bool {
        matches!(self, Self::Scheduled | Self::Confirmed)
    }
}

// ---------------------------------------------------------------------------
// Time helpers
// ---------------------------------------------------------------------------

/// Parse an `HH:MM` wall-clock time.
pub fn parse_time(raw: &str) -> Result<NaiveTime, CoreError> {
    NaiveTime::parse_from_str(raw.trim(), TIME_FORMAT)
        .map_err(|_| CoreError::Validation(format!("Invalid time '{raw}', expected HH:MM")))
}

/// Format a wall-clock time as `HH:MM`.
pub fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// Returns `true` when the shift ends on the calendar day after it starts.
pub fn is_overnight(start: NaiveTime, end: NaiveTime) -> bool {
    end < start
}

/// Reject zero-length shifts. Overnight spans are valid.
pub fn validate_time_span(start: NaiveTime, end: NaiveTime) -> Result<(), CoreError> {
    if start == end {
        Err(CoreError::InvalidRange(format!(
            "Shift start and end are both {}",
            format_time(start)
        )))
    } else {
        Ok(())
    }
}

/// Half-open `[start, end)` interval of a shift starting on `date`.
pub fn shift_interval(
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
) -> (NaiveDateTime, NaiveDateTime) {
    let begins = date.and_time(start);
    let mut ends = date.and_time(end);
    if is_overnight(start, end) {
        // Saturates on the last representable day.
        ends = ends
            .checked_add_signed(Duration::days(1))
            .unwrap_or(NaiveDateTime::MAX);
    }
    (begins, ends)
}

/// Length of a shift in minutes, overnight-aware.
pub fn span_minutes(start: NaiveTime, end: NaiveTime) -> i64 {
    let (begins, ends) = shift_interval(NaiveDate::MIN, start, end);
    (ends - begins).num_minutes()
}

// ---------------------------------------------------------------------------
// Shift instance
// ---------------------------------------------------------------------------

/// A concrete, dated shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftInstance {
    pub id: Uuid,
    /// Template shift this instance was generated from, if any.
    pub source_template_shift_id: Option<Uuid>,
    pub location_id: DbId,
    pub professional_id: Option<DbId>,
    /// Day the shift starts on. Overnight shifts end on the following day.
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub shift_type: ShiftType,
    pub status: ShiftStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ShiftInstance {
    /// Absolute `[start, end)` of this shift.
    pub fn interval(&self) -> (NaiveDateTime, NaiveDateTime) {
        shift_interval(self.date, self.start_time, self.end_time)
    }

    pub fn is_overnight(&self) -> bool {
        is_overnight(self.start_time, self.end_time)
    }

    /// Whether both shifts are at the same location and their intervals overlap.
    pub fn overlaps(&self, other: &ShiftInstance) -> bool {
        if self.location_id != other.location_id {
            return false;
        }
        let (a_start, a_end) = self.interval();
        let (b_start, b_end) = other.interval();
        a_start < b_end && b_start < a_end
    }
}
