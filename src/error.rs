use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Notify(#[from] NotifyError),
    #[error("telemetry initialization failed: {0}")]
    Telemetry(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(String),
    #[error("invalid configuration for {field}: {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },
    #[error("configuration error: {0}")]
    Other(String),
}

/// Failure description handed back by a notification center.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct HostError {
    message: String,
}

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Error)]
pub enum AuthorizationError {
    #[error("authorization was declined")]
    Denied,
    #[error("authorization request failed: {0}")]
    Host(#[source] HostError),
    #[error("no authorization answer within {}", human(.0))]
    TimedOut(Duration),
    #[error("notification center dropped the authorization callback")]
    Disconnected,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("no notification settings within {}", human(.0))]
    TimedOut(Duration),
    #[error("notification center returned no settings")]
    Missing,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid notification payload: {0}")]
    InvalidPayload(String),
    #[error("notification backend unavailable: {0}")]
    Backend(String),
    #[error("failed to start notification runtime")]
    Runtime {
        #[source]
        source: std::io::Error,
    },
}

fn human(duration: &Duration) -> humantime::FormattedDuration {
    humantime::format_duration(*duration)
}

impl Error {
    /// True for failures caused by the host answering late or not at all.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Authorization(AuthorizationError::TimedOut(_))
                | Self::Settings(SettingsError::TimedOut(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{AuthorizationError, Error, HostError, SettingsError};
    use std::time::Duration;

    #[test]
    fn host_error_displays_its_description() {
        let err = AuthorizationError::Host(HostError::new("prompt unavailable"));
        assert_eq!(
            err.to_string(),
            "authorization request failed: prompt unavailable"
        );
    }

    #[test]
    fn timeouts_are_flagged() {
        let err = Error::from(SettingsError::TimedOut(Duration::from_secs(3)));
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "no notification settings within 3s");
        assert!(!Error::from(SettingsError::Missing).is_timeout());
    }
}
