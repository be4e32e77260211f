use crate::error::CoreError;

/// Default cap on the number of days a single template application may span.
pub const DEFAULT_MAX_APPLY_DAYS: u32 = 366;

/// Default upper bound for a template's week count.
pub const DEFAULT_MAX_WEEK_COUNT: u32 = 52;

/// Engine limits.
///
/// The core never reads the environment on its own; hosts that want
/// env-driven limits call [`EngineConfig::from_env`] once at startup and pass
/// the result around.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Longest inclusive date range `apply` accepts (default: `366`).
    pub max_apply_days: u32,
    /// Largest `week_count` a template may have (default: `52`).
    pub max_week_count: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_apply_days: DEFAULT_MAX_APPLY_DAYS,
            max_week_count: DEFAULT_MAX_WEEK_COUNT,
        }
    }
}

impl EngineConfig {
    /// Load limits from environment variables with defaults.
    ///
    /// | Env Var               | Default |
    /// |-----------------------|---------|
    /// | `ROTA_MAX_APPLY_DAYS` | `366`   |
    /// | `ROTA_MAX_WEEK_COUNT` | `52`    |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_apply_days =
            parse_positive(&lookup, "ROTA_MAX_APPLY_DAYS", DEFAULT_MAX_APPLY_DAYS)?;
        let max_week_count =
            parse_positive(&lookup, "ROTA_MAX_WEEK_COUNT", DEFAULT_MAX_WEEK_COUNT)?;

        let config = Self {
            max_apply_days,
            max_week_count,
        };
        tracing::debug!(
            max_apply_days = config.max_apply_days,
            max_week_count = config.max_week_count,
            "Loaded engine configuration"
        );
        Ok(config)
    }
}

fn parse_positive<F>(lookup: &F, key: &str, default: u32) -> Result<u32, CoreError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    match raw.trim().parse::<u32>() {
        Ok(0) => Err(CoreError::Config(format!("{key} must be at least 1"))),
        Ok(value) => Ok(value),
        Err(_) => Err(CoreError::Config(format!(
            "{key} must be a positive integer, got '{raw}'"
        ))),
    }
}
