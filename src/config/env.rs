use std::time::Duration;

use humantime::parse_duration;

use crate::error::ConfigError;

pub(super) fn env_string(key: &'static str) -> std::result::Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => Ok(Some(value)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(ConfigError::Other(format!("{key}: {err}"))),
    }
}

pub(super) fn env_duration(
    key: &'static str,
) -> std::result::Result<Option<Duration>, ConfigError> {
    env_string(key)?
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| parse_duration_field(key, value))
        .transpose()
}

pub(super) fn parse_duration_field(
    field: &'static str,
    value: &str,
) -> std::result::Result<Duration, ConfigError> {
    parse_duration(value).map_err(|err| ConfigError::InvalidField {
        field,
        message: err.to_string(),
    })
}
