/// Locations and professionals are owned by the host's store, keyed by BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// ISO weekday number, 1 = Monday .. 7 = Sunday.
pub type WeekdayNumber = u8;
