//! Configuration access port trait.
//!
//! Adapters only supply raw strings. Typed getters fall back to the default
//! when a key is absent and fail with `ConfigInvalid` when a value is
//! present but does not parse.

use crate::domain::error::EngineError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, EngineError> {
        parse_or(self.get_string(section, key), section, key, default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> Result<f64, EngineError> {
        parse_or(self.get_string(section, key), section, key, default)
    }

    /// Comma-separated list; empty entries are dropped.
    fn get_list(&self, section: &str, key: &str) -> Option<Vec<String>> {
        self.get_string(section, key).map(|raw| {
            raw.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
    }
}

fn parse_or<T>(raw: Option<String>, section: &str, key: &str, default: T) -> Result<T, EngineError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| invalid(section, key, format!("{raw:?}: {e}"))),
    }
}

fn invalid(section: &str, key: &str, reason: String) -> EngineError {
    EngineError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason,
    }
}
