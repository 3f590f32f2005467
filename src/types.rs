use std::fmt::{self, Display};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use uuid::Uuid;

use crate::config::HumantimeDuration;
use crate::error::NotifyError;

/// Delay applied when the caller does not pick one.
pub const DEFAULT_TIME_INTERVAL: Duration = Duration::from_secs(1);

/// Capabilities asked from the host when requesting authorization.
#[allow(clippy::struct_excessive_bools)]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct AuthorizationOptions {
    pub alert: bool,
    pub badge: bool,
    pub sound: bool,
}

impl AuthorizationOptions {
    pub const ALL: Self = Self {
        alert: true,
        badge: true,
        sound: true,
    };
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthorizationStatus {
    NotDetermined,
    Authorized,
    Denied,
    Provisional,
    Ephemeral,
    Unknown(i64),
}

impl AuthorizationStatus {
    #[must_use]
    pub const fn permits_scheduling(self) -> bool {
        matches!(self, Self::Authorized)
    }
}

impl Display for AuthorizationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotDetermined => f.write_str("not-determined"),
            Self::Authorized => f.write_str("authorized"),
            Self::Denied => f.write_str("denied"),
            Self::Provisional => f.write_str("provisional"),
            Self::Ephemeral => f.write_str("ephemeral"),
            Self::Unknown(code) => write!(f, "unknown({code})"),
        }
    }
}

impl FromStr for AuthorizationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "not-determined" | "not_determined" | "notdetermined" => Ok(Self::NotDetermined),
            "authorized" | "granted" => Ok(Self::Authorized),
            "denied" => Ok(Self::Denied),
            "provisional" => Ok(Self::Provisional),
            "ephemeral" => Ok(Self::Ephemeral),
            other => other
                .parse::<i64>()
                .map(Self::Unknown)
                .map_err(|_| format!("unknown authorization status: {other}")),
        }
    }
}

/// Snapshot of the host's notification settings for this application.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct NotificationSettings {
    pub authorization_status: AuthorizationStatus,
}

impl NotificationSettings {
    #[must_use]
    pub const fn new(authorization_status: AuthorizationStatus) -> Self {
        Self {
            authorization_status,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationSound {
    /// Whatever the host plays by default.
    Default,
    Named(String),
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct NotificationContent {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound: Option<NotificationSound>,
}

/// Fires once, `time_interval` after the request reaches the host.
#[serde_as]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct NotificationTrigger {
    #[serde_as(as = "HumantimeDuration")]
    pub time_interval: Duration,
    pub repeats: bool,
}

impl NotificationTrigger {
    #[must_use]
    pub const fn after(time_interval: Duration) -> Self {
        Self {
            time_interval,
            repeats: false,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct NotificationRequest {
    pub identifier: String,
    pub content: NotificationContent,
    pub trigger: NotificationTrigger,
}

/// Parameters of a single `show_notification` call.
///
/// Only the title is required. The delay defaults to one second, the sound to
/// the host default and the identifier to a fresh UUID. Reusing an identifier
/// that is still pending makes the host replace the earlier notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    title: String,
    subtitle: Option<String>,
    body: Option<String>,
    time_interval: Duration,
    identifier: Option<String>,
    sound: Option<NotificationSound>,
}

impl Notification {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: None,
            body: None,
            time_interval: DEFAULT_TIME_INTERVAL,
            identifier: None,
            sound: Some(NotificationSound::Default),
        }
    }

    #[must_use]
    pub fn subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    #[must_use]
    pub const fn time_interval(mut self, time_interval: Duration) -> Self {
        self.time_interval = time_interval;
        self
    }

    #[must_use]
    pub fn identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    #[must_use]
    pub fn sound(mut self, sound: NotificationSound) -> Self {
        self.sound = Some(sound);
        self
    }

    /// Deliver without any sound.
    #[must_use]
    pub fn silent(mut self) -> Self {
        self.sound = None;
        self
    }

    /// Assemble the content/trigger/identifier triple handed to the host.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::InvalidPayload`] when the title is blank or an
    /// explicit identifier is empty.
    pub fn into_request(self) -> Result<NotificationRequest, NotifyError> {
        if self.title.trim().is_empty() {
            return Err(NotifyError::InvalidPayload(
                "title cannot be empty".to_string(),
            ));
        }
        let identifier = match self.identifier {
            Some(id) if id.is_empty() => {
                return Err(NotifyError::InvalidPayload(
                    "identifier cannot be empty".to_string(),
                ));
            }
            Some(id) => id,
            None => Uuid::new_v4().to_string(),
        };

        Ok(NotificationRequest {
            identifier,
            content: NotificationContent {
                title: self.title,
                subtitle: self.subtitle,
                body: self.body,
                sound: self.sound,
            },
            trigger: NotificationTrigger::after(self.time_interval),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{AuthorizationStatus, Notification, NotificationSound};
    use crate::error::NotifyError;
    use std::str::FromStr;
    use std::time::Duration;

    #[test]
    fn status_from_str_accepts_variants() {
        assert_eq!(
            AuthorizationStatus::from_str("not-determined"),
            Ok(AuthorizationStatus::NotDetermined)
        );
        assert_eq!(
            AuthorizationStatus::from_str("GRANTED"),
            Ok(AuthorizationStatus::Authorized)
        );
        assert_eq!(
            AuthorizationStatus::from_str("7"),
            Ok(AuthorizationStatus::Unknown(7))
        );
        assert!(AuthorizationStatus::from_str("maybe").is_err());
    }

    #[test]
    fn only_authorized_permits_scheduling() {
        assert!(AuthorizationStatus::Authorized.permits_scheduling());
        assert!(!AuthorizationStatus::Provisional.permits_scheduling());
        assert!(!AuthorizationStatus::Unknown(3).permits_scheduling());
    }

    #[test]
    fn request_omits_absent_fields() {
        let request = match Notification::new("Backup done").into_request() {
            Ok(request) => request,
            Err(err) => panic!("unexpected rejection: {err}"),
        };
        assert_eq!(request.content.title, "Backup done");
        assert!(request.content.subtitle.is_none());
        assert!(request.content.body.is_none());
        assert_eq!(request.content.sound, Some(NotificationSound::Default));
        assert_eq!(request.trigger.time_interval, Duration::from_secs(1));
        assert!(!request.trigger.repeats);
        assert!(!request.identifier.is_empty());
    }

    #[test]
    fn generated_identifiers_differ() {
        let first = Notification::new("a").into_request().map(|r| r.identifier);
        let second = Notification::new("a").into_request().map(|r| r.identifier);
        assert!(matches!((first, second), (Ok(a), Ok(b)) if a != b));
    }

    #[test]
    fn blank_title_is_rejected() {
        let err = Notification::new("  ").into_request();
        assert!(matches!(err, Err(NotifyError::InvalidPayload(_))));
        let err = Notification::new("ok").identifier("").into_request();
        assert!(matches!(err, Err(NotifyError::InvalidPayload(_))));
    }

    #[test]
    fn silent_clears_the_sound() {
        let request = Notification::new("quiet")
            .silent()
            .into_request()
            .map(|r| r.content.sound);
        assert!(matches!(request, Ok(None)));
    }
}
