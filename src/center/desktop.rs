use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use notify_rust::{Hint, Notification};
use parking_lot::Mutex;
use tokio::runtime::{Builder, Runtime};
use tokio::sync::watch;
use tracing::{debug, trace, warn};

use super::{AuthorizationCallback, NotificationCenter, SettingsCallback};
use crate::config::NotifySettings;
use crate::error::{HostError, NotifyError};
use crate::types::{
    AuthorizationOptions, AuthorizationStatus, NotificationContent, NotificationRequest,
    NotificationSettings, NotificationSound,
};

/// Notification center backed by the session's freedesktop notification
/// server.
///
/// There is no consent prompt on the desktop: authorization succeeds as soon
/// as a notification server answers on the bus.
pub struct DesktopCenter {
    runtime: Runtime,
    style: Arc<DeliveryStyle>,
    // identifier -> generation of the request currently scheduled under it
    pending: Arc<Mutex<HashMap<String, u64>>>,
    // number of entries in `pending`, published after every change
    backlog: Arc<watch::Sender<usize>>,
    generation: AtomicU64,
}

struct DeliveryStyle {
    appname: String,
    default_sound: Option<String>,
    icon: Option<PathBuf>,
}

#[derive(Debug, PartialEq, Eq)]
enum SoundChoice<'a> {
    Named(&'a str),
    ServerDefault,
    Suppressed,
}

impl DesktopCenter {
    /// # Errors
    ///
    /// Fails when the runtime driving callbacks and timers cannot start.
    pub fn new(settings: &NotifySettings) -> Result<Self, NotifyError> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("localnotify-host")
            .enable_time()
            .build()
            .map_err(|source| NotifyError::Runtime { source })?;

        Ok(Self {
            runtime,
            style: Arc::new(DeliveryStyle {
                appname: settings.appname.clone(),
                default_sound: settings.sound.clone(),
                icon: settings.icon.clone(),
            }),
            pending: Arc::new(Mutex::new(HashMap::new())),
            backlog: Arc::new(watch::Sender::new(0)),
            generation: AtomicU64::new(0),
        })
    }

    /// Number of scheduled notifications not displayed yet.
    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }

    /// Block until every scheduled notification has been handed to the
    /// server or `limit` elapses. Returns whether the queue drained.
    /// A `limit` too large for the clock waits without a deadline.
    pub fn wait_idle(&self, limit: Duration) -> bool {
        let mut backlog = self.backlog.subscribe();
        self.runtime.block_on(async move {
            matches!(
                tokio::time::timeout(limit, backlog.wait_for(|count| *count == 0)).await,
                Ok(Ok(_))
            )
        })
    }
}

impl NotificationCenter for DesktopCenter {
    fn request_authorization(&self, options: AuthorizationOptions, completion: AuthorizationCallback) {
        debug!(?options, "desktop authorization requested");
        self.runtime
            .spawn_blocking(move || match notify_rust::get_server_information() {
                Ok(info) => {
                    debug!(
                        server = %info.name,
                        vendor = %info.vendor,
                        spec = %info.spec_version,
                        "notification server reachable"
                    );
                    completion(true, None);
                }
                Err(err) => completion(false, Some(HostError::new(err.to_string()))),
            });
    }

    fn notification_settings(&self, completion: SettingsCallback) {
        self.runtime.spawn_blocking(move || {
            let status = match notify_rust::get_server_information() {
                Ok(_) => AuthorizationStatus::Authorized,
                Err(err) => {
                    warn!(error = %err, "notification server unreachable");
                    AuthorizationStatus::Denied
                }
            };
            completion(Some(NotificationSettings::new(status)));
        });
    }

    fn add(&self, request: NotificationRequest) {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let identifier = request.identifier.clone();
        {
            let mut pending = self.pending.lock();
            if pending.insert(identifier.clone(), generation).is_some() {
                debug!(%identifier, "replacing pending notification");
            }
            self.backlog.send_replace(pending.len());
        }

        let pending = Arc::clone(&self.pending);
        let backlog = Arc::clone(&self.backlog);
        let style = Arc::clone(&self.style);
        self.runtime.spawn(async move {
            tokio::time::sleep(request.trigger.time_interval).await;
            let current = pending.lock().get(&identifier).copied();
            if current != Some(generation) {
                trace!(%identifier, "notification superseded before delivery");
                return;
            }

            match tokio::task::spawn_blocking(move || style.show(&request)).await {
                Ok(Ok(())) => debug!(%identifier, "notification delivered"),
                Ok(Err(err)) => warn!(%identifier, error = %err, "notification delivery failed"),
                Err(err) => warn!(%identifier, error = %err, "notification delivery task aborted"),
            }

            let mut pending = pending.lock();
            if pending.get(&identifier) == Some(&generation) {
                pending.remove(&identifier);
                backlog.send_replace(pending.len());
            }
        });
    }
}

impl DeliveryStyle {
    fn show(&self, request: &NotificationRequest) -> Result<(), NotifyError> {
        let content = &request.content;
        let mut builder = Notification::new();
        builder.appname(&self.appname).summary(&content.title);

        if let Some(body) = compose_body(content) {
            builder.body(&body);
        }
        if let Some(icon) = self.icon.as_deref() {
            builder.icon(&icon.to_string_lossy());
        }
        match sound_choice(content.sound.as_ref(), self.default_sound.as_deref()) {
            SoundChoice::Named(name) => {
                builder.sound_name(name);
            }
            SoundChoice::Suppressed => {
                builder.hint(Hint::SuppressSound(true));
            }
            SoundChoice::ServerDefault => {}
        }

        builder
            .show()
            .map(drop)
            .map_err(|err| NotifyError::Backend(err.to_string()))
    }
}

/// The freedesktop spec has no subtitle; it leads the body instead.
fn compose_body(content: &NotificationContent) -> Option<String> {
    match (content.subtitle.as_deref(), content.body.as_deref()) {
        (Some(subtitle), Some(body)) => Some(format!("{subtitle}\n{body}")),
        (Some(text), None) | (None, Some(text)) => Some(text.to_string()),
        (None, None) => None,
    }
}

fn sound_choice<'a>(
    sound: Option<&'a NotificationSound>,
    default_sound: Option<&'a str>,
) -> SoundChoice<'a> {
    match sound {
        None => SoundChoice::Suppressed,
        Some(NotificationSound::Named(name)) => SoundChoice::Named(name),
        Some(NotificationSound::Default) => {
            default_sound.map_or(SoundChoice::ServerDefault, SoundChoice::Named)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DesktopCenter, SoundChoice, compose_body, sound_choice};
    use crate::config::Config;
    use crate::types::{NotificationContent, NotificationSound};
    use std::time::{Duration, Instant};

    fn content(subtitle: Option<&str>, body: Option<&str>) -> NotificationContent {
        NotificationContent {
            title: "title".to_string(),
            subtitle: subtitle.map(str::to_string),
            body: body.map(str::to_string),
            sound: None,
        }
    }

    #[test]
    fn subtitle_leads_the_body() {
        assert_eq!(
            compose_body(&content(Some("Kitchen"), Some("It looks hungry"))).as_deref(),
            Some("Kitchen\nIt looks hungry")
        );
        assert_eq!(
            compose_body(&content(Some("Kitchen"), None)).as_deref(),
            Some("Kitchen")
        );
        assert!(compose_body(&content(None, None)).is_none());
    }

    #[test]
    fn idle_center_returns_at_once_even_with_an_unbounded_limit() {
        let Ok(center) = DesktopCenter::new(&Config::default().notify) else {
            panic!("runtime should start");
        };
        let started = Instant::now();
        assert!(center.wait_idle(Duration::from_secs(u64::MAX)));
        assert!(center.wait_idle(Duration::ZERO));
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(center.pending(), 0);
    }

    #[test]
    fn default_sound_uses_configured_name() {
        let named = NotificationSound::Named("bell".to_string());
        assert_eq!(
            sound_choice(Some(&NotificationSound::Default), Some("message-new-instant")),
            SoundChoice::Named("message-new-instant")
        );
        assert_eq!(
            sound_choice(Some(&NotificationSound::Default), None),
            SoundChoice::ServerDefault
        );
        assert_eq!(sound_choice(Some(&named), None), SoundChoice::Named("bell"));
        assert_eq!(sound_choice(None, Some("bell")), SoundChoice::Suppressed);
    }
}
