use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::Result;
use crate::error::Error as NotifyAppError;

mod defaults;
mod env;
mod raw;
mod serde;

pub(crate) use serde::HumantimeDuration;

#[derive(Debug, Clone)]
pub struct Config {
    /// Upper bound on the wait for the host's settings callback.
    pub settings_timeout: Duration,
    /// `None` waits for the authorization answer indefinitely.
    pub authorization_timeout: Option<Duration>,
    pub notify: NotifySettings,
}

#[derive(Debug, Clone)]
pub struct NotifySettings {
    pub appname: String,
    /// Sound name played for [`crate::types::NotificationSound::Default`].
    pub sound: Option<String>,
    pub icon: Option<PathBuf>,
    pub default_delay: Duration,
}

impl Config {
    /// Load configuration from a file and the environment.
    ///
    /// The file is optional; a missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration file cannot be parsed, when
    /// environment overrides are invalid, or when the resulting values fail
    /// validation.
    pub fn from_env_and_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut raw = raw::load(path).map_err(NotifyAppError::from)?;
        raw.apply_env_overrides().map_err(NotifyAppError::from)?;
        raw.validate_and_build()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            settings_timeout: defaults::default_settings_timeout(),
            authorization_timeout: None,
            notify: NotifySettings {
                appname: defaults::default_appname(),
                sound: Some(defaults::default_sound()),
                icon: None,
                default_delay: defaults::default_delay(),
            },
        }
    }
}
