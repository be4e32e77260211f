#![allow(dead_code)]

use chrono::{NaiveDate, NaiveTime};

use rota_core::{NewScheduleTemplate, ScheduleTemplate};

/// Install a test-friendly subscriber once per test binary.
///
/// Honours `RUST_LOG`; defaults to `rota_core=debug`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rota_core=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Empty template for location 1 with `week_count` weeks.
pub fn ward_template(week_count: u32) -> ScheduleTemplate {
    ScheduleTemplate::new(NewScheduleTemplate {
        name: "Clinical ward | Hospital 1".to_string(),
        location_id: 1,
        week_count,
    })
    .expect("valid template input")
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).expect("valid time")
}

/// 2024-03-04, a Monday.
pub fn a_monday() -> NaiveDate {
    date(2024, 3, 4)
}

/// 2024-03-06, a Wednesday.
pub fn a_wednesday() -> NaiveDate {
    date(2024, 3, 6)
}

/// Inclusive range of `days` days starting at `start`.
pub fn days_from(start: NaiveDate, days: i64) -> NaiveDate {
    start + chrono::Duration::days(days - 1)
}
