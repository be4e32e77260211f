//! Template editing through the public API.

mod common;

use assert_matches::assert_matches;

use common::{init_tracing, time, ward_template};
use rota_core::{CoreError, ShiftType, TemplateShiftPatch};

#[test]
fn every_cell_accepts_a_shift_exactly_once() {
    init_tracing();
    let mut template = ward_template(3);

    for week in 1..=3 {
        for weekday in 1..=7u8 {
            let added = template.editor().add_default_shift(week, weekday).unwrap();
            let cell = template.shifts_at(week, weekday).unwrap();
            assert_eq!(cell.iter().filter(|s| s.id == added.id).count(), 1);
        }
    }
    assert_eq!(template.len(), 21);
    assert_eq!(template.all_shifts().len(), 21);
}

#[test]
fn removed_shift_never_reappears() {
    let mut template = ward_template(1);
    let keep = template.editor().add_default_shift(1, 5).unwrap();
    let removed = template.editor().add_default_shift(1, 5).unwrap();

    template.editor().remove_shift(removed.id).unwrap();
    let cell = template.shifts_at(1, 5).unwrap();
    assert_eq!(cell.len(), 1);
    assert_eq!(cell[0].id, keep.id);

    assert_matches!(
        template.editor().remove_shift(removed.id),
        Err(CoreError::NotFound { .. })
    );
}

#[test]
fn shrinking_week_count_requires_clearing_the_week_first() {
    let mut template = ward_template(2);
    let stranded = template
        .editor()
        .add_shift(2, 3, time(19, 0), time(7, 0), ShiftType::Night, Some(2))
        .unwrap();

    assert_matches!(
        template.editor().set_week_count(1),
        Err(CoreError::PreconditionFailed(_))
    );
    assert_eq!(template.week_count(), 2);
    assert!(template.shift(stranded.id).is_some());

    template.editor().remove_shift(stranded.id).unwrap();
    template.editor().set_week_count(1).unwrap();
    assert_eq!(template.week_count(), 1);
}

#[test]
fn moving_a_shift_out_of_a_week_unblocks_shrinking() {
    let mut template = ward_template(2);
    let shift = template.editor().add_default_shift(2, 1).unwrap();

    template
        .editor()
        .update_shift(
            shift.id,
            TemplateShiftPatch {
                week_index: Some(1),
                ..Default::default()
            },
        )
        .unwrap();
    template.editor().set_week_count(1).unwrap();
    assert_eq!(template.shifts_at(1, 1).unwrap()[0].id, shift.id);
}

#[test]
fn failed_mutations_do_not_bump_updated_at() {
    let mut template = ward_template(1);
    template.editor().add_default_shift(1, 1).unwrap();
    let stamp = template.updated_at();

    let mut editor = template.editor();
    assert!(editor
        .add_shift(1, 1, time(9, 0), time(9, 0), ShiftType::Normal, None)
        .is_err());
    assert!(editor.set_week_count(0).is_err());
    assert!(editor.rename("   ").is_err());
    assert_eq!(template.updated_at(), stamp);
    assert_eq!(template.len(), 1);
}

#[test]
fn snapshot_survives_json() {
    let mut template = ward_template(2);
    template
        .editor()
        .add_shift(2, 6, time(7, 0), time(19, 0), ShiftType::Weekend, Some(3))
        .unwrap();

    let json = serde_json::to_string(&template).unwrap();
    let back: rota_core::ScheduleTemplate = serde_json::from_str(&json).unwrap();
    assert_eq!(back, template);
    assert!(back.validate().is_ok());
}
