//! Calendar arithmetic for weekly and monthly roster views.
//!
//! Weeks run Monday to Sunday throughout the crate.

use chrono::{Datelike, Duration, NaiveDate};

use crate::error::CoreError;
use crate::shift::ShiftInstance;
use crate::types::DbId;

/// The seven days (Monday first) of the week containing `date`.
///
/// Fails with `OutOfRange` for the partial weeks at either end of the
/// supported calendar.
pub fn week_of(date: NaiveDate) -> Result<[NaiveDate; 7], CoreError> {
    let lead = Duration::days(i64::from(date.weekday().num_days_from_monday()));
    let out_of_range = || CoreError::OutOfRange(format!("The week of {date} is not representable"));

    let monday = date.checked_sub_signed(lead).ok_or_else(out_of_range)?;
    monday
        .checked_add_signed(Duration::days(6))
        .ok_or_else(out_of_range)?;
    Ok(std::array::from_fn(|i| monday + Duration::days(i as i64)))
}

/// Month grid for `year`/`month`: leading `None` padding up to the first
/// day's weekday, then every day of the month.
pub fn month_grid(year: i32, month: u32) -> Result<Vec<Option<NaiveDate>>, CoreError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| CoreError::OutOfRange(format!("No such month: {year}-{month:02}")))?;
    let padding = first.weekday().num_days_from_monday() as usize;

    let mut grid: Vec<Option<NaiveDate>> = vec![None; padding];
    grid.extend(
        first
            .iter_days()
            .take_while(|d| d.month() == month)
            .map(Some),
    );
    Ok(grid)
}

/// Instances starting on `date`.
pub fn instances_on(instances: &[ShiftInstance], date: NaiveDate) -> Vec<&ShiftInstance> {
    instances.iter().filter(|i| i.date == date).collect()
}

/// Instances at `location_id` starting on `date`, earliest first.
pub fn instances_for_location_on(
    instances: &[ShiftInstance],
    location_id: DbId,
    date: NaiveDate,
) -> Vec<&ShiftInstance> {
    let mut found: Vec<&ShiftInstance> = instances
        .iter()
        .filter(|i| i.location_id == location_id && i.date == date)
        .collect();
    found.sort_by_key(|i| i.start_time);
    found
}

/// Instances assigned to `professional_id` whose start date lies in
/// `[from, to]`, ordered chronologically.
pub fn instances_for_professional(
    instances: &[ShiftInstance],
    professional_id: DbId,
    from: NaiveDate,
    to: NaiveDate,
) -> Vec<&ShiftInstance> {
    let mut found: Vec<&ShiftInstance> = instances
        .iter()
        .filter(|i| i.professional_id == Some(professional_id) && i.date >= from && i.date <= to)
        .collect();
    found.sort_by_key(|i| i.interval().0);
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shift::{parse_time, ShiftStatus, ShiftType};
    use uuid::Uuid;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn instance(location_id: DbId, professional: Option<DbId>, date: NaiveDate, start: &str) -> ShiftInstance {
        ShiftInstance {
            id: Uuid::now_v7(),
            source_template_shift_id: None,
            location_id,
            professional_id: professional,
            date,
            start_time: parse_time(start).unwrap(),
            end_time: parse_time("23:00").unwrap(),
            shift_type: ShiftType::Normal,
            status: ShiftStatus::Scheduled,
            notes: None,
        }
    }

    #[test]
    fn week_of_starts_on_monday() {
        let week = week_of(d(2024, 3, 6)).unwrap();
        assert_eq!(week[0], d(2024, 3, 4));
        assert_eq!(week[6], d(2024, 3, 10));
        assert_eq!(week_of(d(2024, 3, 10)).unwrap(), week);
    }

    #[test]
    fn week_of_crosses_year_boundary() {
        let week = week_of(d(2025, 1, 1)).unwrap();
        assert_eq!(week[0], d(2024, 12, 30));
        assert_eq!(week[6], d(2025, 1, 5));
    }

    #[test]
    fn week_of_fails_at_calendar_edges() {
        // Only a week that starts on the first day (or ends on the last) fits.
        let min_fits = NaiveDate::MIN.weekday() == chrono::Weekday::Mon;
        assert_eq!(week_of(NaiveDate::MIN).is_ok(), min_fits);
        let max_fits = NaiveDate::MAX.weekday() == chrono::Weekday::Sun;
        assert_eq!(week_of(NaiveDate::MAX).is_ok(), max_fits);

        if !min_fits {
            assert!(matches!(week_of(NaiveDate::MIN), Err(CoreError::OutOfRange(_))));
        }
    }

    #[test]
    fn month_grid_pads_to_first_weekday() {
        // March 2024 starts on a Friday.
        let grid = month_grid(2024, 3).unwrap();
        assert_eq!(grid.iter().take_while(|c| c.is_none()).count(), 4);
        assert_eq!(grid.iter().flatten().count(), 31);
        assert_eq!(grid.last().copied().flatten(), Some(d(2024, 3, 31)));
    }

    #[test]
    fn month_grid_handles_leap_february() {
        let grid = month_grid(2024, 2).unwrap();
        assert_eq!(grid.iter().flatten().count(), 29);
    }

    #[test]
    fn month_grid_rejects_bad_month() {
        assert!(month_grid(2024, 13).is_err());
    }

    #[test]
    fn filters_by_location_and_day() {
        let day = d(2024, 3, 4);
        let shifts = vec![
            instance(1, None, day, "13:00"),
            instance(1, None, day, "07:00"),
            instance(2, None, day, "07:00"),
            instance(1, None, d(2024, 3, 5), "07:00"),
        ];
        assert_eq!(instances_on(&shifts, day).len(), 3);

        let ward = instances_for_location_on(&shifts, 1, day);
        assert_eq!(ward.len(), 2);
        assert!(ward[0].start_time < ward[1].start_time);
    }

    #[test]
    fn filters_by_professional() {
        let shifts = vec![
            instance(1, Some(7), d(2024, 3, 6), "07:00"),
            instance(2, Some(7), d(2024, 3, 4), "07:00"),
            instance(1, Some(8), d(2024, 3, 5), "07:00"),
            instance(1, Some(7), d(2024, 3, 20), "07:00"),
        ];
        let mine = instances_for_professional(&shifts, 7, d(2024, 3, 1), d(2024, 3, 10));
        let dates: Vec<NaiveDate> = mine.iter().map(|i| i.date).collect();
        assert_eq!(dates, vec![d(2024, 3, 4), d(2024, 3, 6)]);
    }
}
