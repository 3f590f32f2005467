//! Synchronous facade over a [`NotificationCenter`].
//!
//! Centers answer through callbacks on threads of their own choosing. Each
//! blocking call here hands the center a one-slot channel sender as the
//! completion and waits on the receiver. Authorization waits without a limit
//! unless [`GatewaySettings::authorization_timeout`] is set; settings fetches
//! always give up after [`GatewaySettings::settings_timeout`].

use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::center::NotificationCenter;
use crate::config::Config;
use crate::error::{AuthorizationError, NotifyError, SettingsError};
use crate::types::{AuthorizationOptions, AuthorizationStatus, Notification, NotificationSettings};

pub const DEFAULT_SETTINGS_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GatewaySettings {
    pub settings_timeout: Duration,
    /// `None` blocks until the center answers, however long that takes.
    pub authorization_timeout: Option<Duration>,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            settings_timeout: DEFAULT_SETTINGS_TIMEOUT,
            authorization_timeout: None,
        }
    }
}

impl From<&Config> for GatewaySettings {
    fn from(config: &Config) -> Self {
        Self {
            settings_timeout: config.settings_timeout,
            authorization_timeout: config.authorization_timeout,
        }
    }
}

pub struct NotificationGateway<C> {
    center: Arc<C>,
    settings: GatewaySettings,
}

impl<C: NotificationCenter> NotificationGateway<C> {
    /// Switch for callers that only want notifications in debug sessions.
    /// Nothing in the gateway reads it.
    pub const IS_DEBUG: bool = false;

    pub fn new(center: Arc<C>) -> Self {
        Self::with_settings(center, GatewaySettings::default())
    }

    pub const fn with_settings(center: Arc<C>, settings: GatewaySettings) -> Self {
        Self { center, settings }
    }

    #[must_use]
    pub const fn is_debug() -> bool {
        Self::IS_DEBUG
    }

    pub const fn center(&self) -> &Arc<C> {
        &self.center
    }

    pub const fn settings(&self) -> GatewaySettings {
        self.settings
    }

    /// Ask for alert, badge and sound permission and wait for the answer.
    ///
    /// Failures are logged and reported as `false`.
    pub fn request_permission(&self) -> bool {
        match self.try_request_permission() {
            Ok(()) => true,
            Err(AuthorizationError::Denied) => {
                info!("notification permission declined");
                false
            }
            Err(err) => {
                error!(error = %err, "request authorization failed");
                false
            }
        }
    }

    /// Like [`Self::request_permission`], with the failure cause.
    ///
    /// # Errors
    ///
    /// [`AuthorizationError::Denied`] when the user declined,
    /// [`AuthorizationError::Host`] when the center reported an error,
    /// [`AuthorizationError::TimedOut`] when a configured limit elapsed and
    /// [`AuthorizationError::Disconnected`] when the center dropped the
    /// completion without calling it.
    pub fn try_request_permission(&self) -> Result<(), AuthorizationError> {
        let (tx, rx) = mpsc::sync_channel(1);
        self.center.request_authorization(
            AuthorizationOptions::ALL,
            Box::new(move |granted, host_error| {
                // The caller may have timed out and dropped the receiver.
                let _ = tx.send((granted, host_error));
            }),
        );

        let (granted, host_error) = match self.settings.authorization_timeout {
            Some(limit) => rx.recv_timeout(limit).map_err(|err| match err {
                RecvTimeoutError::Timeout => AuthorizationError::TimedOut(limit),
                RecvTimeoutError::Disconnected => AuthorizationError::Disconnected,
            })?,
            None => rx.recv().map_err(|_| AuthorizationError::Disconnected)?,
        };

        if granted {
            debug!("notification permission granted");
            return Ok(());
        }
        Err(host_error.map_or(AuthorizationError::Denied, AuthorizationError::Host))
    }

    /// Fetch the center's current settings, waiting at most
    /// `settings_timeout`.
    ///
    /// # Errors
    ///
    /// [`SettingsError::TimedOut`] when the center is slower than the limit,
    /// [`SettingsError::Missing`] when it answers without settings or drops
    /// the completion.
    pub fn notification_settings(&self) -> Result<NotificationSettings, SettingsError> {
        let limit = self.settings.settings_timeout;
        let (tx, rx) = mpsc::sync_channel(1);
        self.center.notification_settings(Box::new(move |settings| {
            let _ = tx.send(settings);
        }));

        match rx.recv_timeout(limit) {
            Ok(Some(settings)) => Ok(settings),
            Ok(None) | Err(RecvTimeoutError::Disconnected) => Err(SettingsError::Missing),
            Err(RecvTimeoutError::Timeout) => Err(SettingsError::TimedOut(limit)),
        }
    }

    /// # Errors
    ///
    /// Same as [`Self::notification_settings`].
    pub fn authorization_status(&self) -> Result<AuthorizationStatus, SettingsError> {
        self.notification_settings()
            .map(|settings| settings.authorization_status)
    }

    /// Whether notifications may be scheduled right now. Never prompts.
    pub fn is_notification_available(&self) -> bool {
        let status = match self.authorization_status() {
            Ok(status) => status,
            Err(err) => {
                error!(error = %err, "unable to get notification settings");
                return false;
            }
        };

        match status {
            AuthorizationStatus::NotDetermined => {
                info!("authorization not determined, permission request pending");
                false
            }
            AuthorizationStatus::Authorized => {
                debug!("authorized, notifications can be scheduled");
                true
            }
            AuthorizationStatus::Denied => {
                info!("denied, application not allowed to display notifications");
                false
            }
            other => {
                info!(status = %other, "notifications unavailable for this authorization status");
                false
            }
        }
    }

    /// Schedule `notification` for delivery after its time interval.
    ///
    /// Requests permission first when notifications are unavailable and
    /// schedules regardless of the answer; without permission the center
    /// discards the notification.
    pub fn show_notification(&self, notification: Notification) {
        if let Err(err) = self.try_show_notification(notification) {
            warn!(error = %err, "notification not scheduled");
        }
    }

    /// Like [`Self::show_notification`], returning the identifier the
    /// notification was scheduled under.
    ///
    /// # Errors
    ///
    /// [`NotifyError::InvalidPayload`] for a blank title or an empty
    /// identifier; the center is not contacted in that case.
    pub fn try_show_notification(&self, notification: Notification) -> Result<String, NotifyError> {
        let request = notification.into_request()?;

        if !self.is_notification_available() {
            let _ = self.request_permission();
        }

        let identifier = request.identifier.clone();
        debug!(
            %identifier,
            title = %request.content.title,
            delay = %humantime::format_duration(request.trigger.time_interval),
            "scheduling notification"
        );
        self.center.add(request);
        Ok(identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::{GatewaySettings, NotificationGateway};
    use crate::center::{ConsentPolicy, MemoryCenter};
    use crate::config::Config;
    use crate::error::{AuthorizationError, NotifyError, SettingsError};
    use crate::types::{AuthorizationStatus, Notification};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    fn gateway(center: MemoryCenter) -> NotificationGateway<MemoryCenter> {
        NotificationGateway::new(Arc::new(center))
    }

    #[test]
    fn settings_follow_config() {
        let config = Config {
            authorization_timeout: Some(Duration::from_secs(10)),
            ..Config::default()
        };
        let settings = GatewaySettings::from(&config);
        assert_eq!(settings.settings_timeout, Duration::from_secs(3));
        assert_eq!(settings.authorization_timeout, Some(Duration::from_secs(10)));
    }

    #[test]
    fn debug_switch_is_off() {
        assert!(!NotificationGateway::<MemoryCenter>::is_debug());
    }

    #[test]
    fn failed_prompt_surfaces_host_error() {
        let gateway = gateway(
            MemoryCenter::new(AuthorizationStatus::NotDetermined)
                .with_consent(ConsentPolicy::Fail("prompt unavailable".to_string())),
        );
        match gateway.try_request_permission() {
            Err(AuthorizationError::Host(err)) => assert_eq!(err.message(), "prompt unavailable"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn declined_prompt_is_denied_without_host_error() {
        let gateway = gateway(
            MemoryCenter::new(AuthorizationStatus::NotDetermined)
                .with_consent(ConsentPolicy::Deny),
        );
        assert!(matches!(
            gateway.try_request_permission(),
            Err(AuthorizationError::Denied)
        ));
    }

    #[test]
    fn authorization_limit_applies_when_configured() {
        let center = MemoryCenter::new(AuthorizationStatus::NotDetermined)
            .with_consent(ConsentPolicy::Ignore);
        let gateway = NotificationGateway::with_settings(
            Arc::new(center),
            GatewaySettings {
                settings_timeout: Duration::from_secs(1),
                authorization_timeout: Some(Duration::from_millis(50)),
            },
        );
        assert!(matches!(
            gateway.try_request_permission(),
            Err(AuthorizationError::TimedOut(limit)) if limit == Duration::from_millis(50)
        ));
        assert!(!gateway.request_permission());
    }

    #[test]
    fn missing_settings_are_reported() {
        let gateway =
            gateway(MemoryCenter::new(AuthorizationStatus::Authorized).without_settings());
        assert!(matches!(
            gateway.notification_settings(),
            Err(SettingsError::Missing)
        ));
        assert!(!gateway.is_notification_available());
    }

    #[test]
    fn dropped_authorization_completion_is_disconnected() {
        let gateway = gateway(
            MemoryCenter::new(AuthorizationStatus::NotDetermined)
                .with_consent(ConsentPolicy::Abandon),
        );
        assert!(gateway.settings().authorization_timeout.is_none());
        assert!(matches!(
            gateway.try_request_permission(),
            Err(AuthorizationError::Disconnected)
        ));
        assert!(!gateway.request_permission());
    }

    #[test]
    fn dropped_settings_completion_is_missing() {
        let gateway = gateway(
            MemoryCenter::new(AuthorizationStatus::Authorized).abandoning_settings(),
        );
        let started = Instant::now();
        assert!(matches!(
            gateway.notification_settings(),
            Err(SettingsError::Missing)
        ));
        assert!(started.elapsed() < gateway.settings().settings_timeout);
        assert!(!gateway.is_notification_available());
    }

    #[test]
    fn invalid_payload_never_reaches_the_center() {
        let gateway = gateway(MemoryCenter::new(AuthorizationStatus::NotDetermined));
        assert!(matches!(
            gateway.try_show_notification(Notification::new("")),
            Err(NotifyError::InvalidPayload(_))
        ));
        assert_eq!(gateway.center().submissions(), 0);
        assert_eq!(gateway.center().prompts(), 0);
    }

    #[test]
    fn authorized_center_is_not_prompted_again() {
        let gateway = gateway(MemoryCenter::new(AuthorizationStatus::Authorized));
        let id = gateway.try_show_notification(Notification::new("Stand up"));
        assert!(matches!(id, Ok(ref id) if !id.is_empty()));
        assert_eq!(gateway.center().prompts(), 0);
        assert_eq!(gateway.center().pending().len(), 1);
    }
}
