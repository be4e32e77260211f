//! Shift template engine.
//!
//! Stores recurring multi-week rotation templates, edits them under their
//! structural invariants, and expands them onto calendar date ranges as
//! concrete shift instances. Pure data in, pure data out: no I/O and no
//! process-wide state.

pub mod apply;
pub mod calendar;
pub mod config;
pub mod conflict;
pub mod error;
pub mod shift;
pub mod template;
pub mod types;

pub use apply::{apply, ApplyMode, ApplyOutcome, ApplyRequest, SkippedShift, TemplateApplier};
pub use config::EngineConfig;
pub use conflict::{ConflictDecision, ConflictPolicy, OverlapAction, StandardPolicy};
pub use error::CoreError;
pub use shift::{ShiftInstance, ShiftStatus, ShiftType};
pub use template::{
    NewScheduleTemplate, ScheduleTemplate, TemplateEditor, TemplateShift, TemplateShiftPatch,
};
