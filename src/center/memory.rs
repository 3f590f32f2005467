use std::collections::HashMap;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, trace};

use super::{AuthorizationCallback, NotificationCenter, SettingsCallback};
use crate::error::HostError;
use crate::types::{
    AuthorizationOptions, AuthorizationStatus, NotificationRequest, NotificationSettings,
};

/// How the simulated user answers the one-time consent prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConsentPolicy {
    Grant,
    Deny,
    /// The prompt fails with this description; the status stays undecided.
    Fail(String),
    /// The host never calls back. Completions are held for the lifetime of
    /// the center.
    Ignore,
    /// The host drops the completion without calling it.
    Abandon,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SettingsReply {
    Answer,
    Empty,
    Abandon,
}

struct Pending {
    request: NotificationRequest,
    // `None` when the delay does not fit in an `Instant`: never due.
    due: Option<Instant>,
}

impl Pending {
    fn is_due(&self, now: Instant) -> bool {
        self.due.is_some_and(|due| due <= now)
    }

    fn order(&self) -> (bool, Option<Instant>) {
        (self.due.is_none(), self.due)
    }
}

#[derive(Default)]
struct State {
    pending: HashMap<String, Pending>,
    submissions: usize,
    prompts: usize,
    // Callbacks the host holds on to without ever answering.
    parked: Vec<AuthorizationCallback>,
}

/// In-process notification center.
///
/// Keeps the authorization decision and the pending queue the way a real host
/// does, answers callbacks from a spawned thread and never shows anything.
pub struct MemoryCenter {
    status: Mutex<AuthorizationStatus>,
    consent: ConsentPolicy,
    settings_latency: Duration,
    authorization_latency: Duration,
    settings_reply: SettingsReply,
    state: Mutex<State>,
}

impl MemoryCenter {
    pub fn new(status: AuthorizationStatus) -> Self {
        Self {
            status: Mutex::new(status),
            consent: ConsentPolicy::Grant,
            settings_latency: Duration::ZERO,
            authorization_latency: Duration::ZERO,
            settings_reply: SettingsReply::Answer,
            state: Mutex::new(State::default()),
        }
    }

    #[must_use]
    pub fn with_consent(mut self, consent: ConsentPolicy) -> Self {
        self.consent = consent;
        self
    }

    /// Delay every settings answer by `latency`.
    #[must_use]
    pub const fn with_settings_latency(mut self, latency: Duration) -> Self {
        self.settings_latency = latency;
        self
    }

    #[must_use]
    pub const fn with_authorization_latency(mut self, latency: Duration) -> Self {
        self.authorization_latency = latency;
        self
    }

    /// Answer settings requests without a settings object.
    #[must_use]
    pub const fn without_settings(mut self) -> Self {
        self.settings_reply = SettingsReply::Empty;
        self
    }

    /// Drop every settings completion without calling it.
    #[must_use]
    pub const fn abandoning_settings(mut self) -> Self {
        self.settings_reply = SettingsReply::Abandon;
        self
    }

    pub fn status(&self) -> AuthorizationStatus {
        *self.status.lock()
    }

    /// Change the stored decision, as a user would from system settings.
    pub fn set_status(&self, status: AuthorizationStatus) {
        *self.status.lock() = status;
    }

    /// Number of times the consent prompt was shown.
    pub fn prompts(&self) -> usize {
        self.state.lock().prompts
    }

    /// Number of `add` calls received, replacements included.
    pub fn submissions(&self) -> usize {
        self.state.lock().submissions
    }

    /// Requests not delivered yet, ordered by due time.
    pub fn pending(&self) -> Vec<NotificationRequest> {
        let state = self.state.lock();
        let mut pending: Vec<&Pending> = state.pending.values().collect();
        pending.sort_by_key(|entry| entry.order());
        pending.into_iter().map(|entry| entry.request.clone()).collect()
    }

    pub fn pending_request(&self, identifier: &str) -> Option<NotificationRequest> {
        self.state
            .lock()
            .pending
            .get(identifier)
            .map(|entry| entry.request.clone())
    }

    /// Remove every request due at `now` and return the ones that would be
    /// displayed. Without authorization they are dropped silently.
    pub fn take_due(&self, now: Instant) -> Vec<NotificationRequest> {
        let mut due: Vec<Pending> = {
            let mut state = self.state.lock();
            let (due, waiting): (HashMap<_, _>, HashMap<_, _>) = std::mem::take(&mut state.pending)
                .into_iter()
                .partition(|(_, entry)| entry.is_due(now));
            state.pending = waiting;
            due.into_values().collect()
        };

        let status = self.status();
        if !status.permits_scheduling() {
            debug!(%status, dropped = due.len(), "dropping due notifications");
            return Vec::new();
        }
        due.sort_by_key(Pending::order);
        due.into_iter().map(|entry| entry.request).collect()
    }

    /// Apply the consent policy.
    fn settle_prompt(&self) -> Prompt {
        let mut status = self.status.lock();
        let current = *status;
        if current != AuthorizationStatus::NotDetermined {
            trace!(status = %current, "authorization already decided");
            return Prompt::Answer(current.permits_scheduling(), None);
        }

        self.state.lock().prompts += 1;
        match &self.consent {
            ConsentPolicy::Grant => {
                *status = AuthorizationStatus::Authorized;
                Prompt::Answer(true, None)
            }
            ConsentPolicy::Deny => {
                *status = AuthorizationStatus::Denied;
                Prompt::Answer(false, None)
            }
            ConsentPolicy::Fail(message) => {
                Prompt::Answer(false, Some(HostError::new(message.clone())))
            }
            ConsentPolicy::Ignore => Prompt::Park,
            ConsentPolicy::Abandon => Prompt::Discard,
        }
    }
}

enum Prompt {
    Answer(bool, Option<HostError>),
    Park,
    Discard,
}

impl NotificationCenter for MemoryCenter {
    fn request_authorization(&self, options: AuthorizationOptions, completion: AuthorizationCallback) {
        debug!(?options, "authorization requested");
        let (granted, error) = match self.settle_prompt() {
            Prompt::Answer(granted, error) => (granted, error),
            Prompt::Park => {
                self.state.lock().parked.push(completion);
                return;
            }
            Prompt::Discard => {
                trace!("authorization completion dropped unanswered");
                return;
            }
        };

        let latency = self.authorization_latency;
        thread::spawn(move || {
            if !latency.is_zero() {
                thread::sleep(latency);
            }
            completion(granted, error);
        });
    }

    fn notification_settings(&self, completion: SettingsCallback) {
        let settings = match self.settings_reply {
            SettingsReply::Answer => Some(NotificationSettings::new(self.status())),
            SettingsReply::Empty => None,
            SettingsReply::Abandon => {
                trace!("settings completion dropped unanswered");
                return;
            }
        };
        let latency = self.settings_latency;
        thread::spawn(move || {
            if !latency.is_zero() {
                thread::sleep(latency);
            }
            completion(settings);
        });
    }

    fn add(&self, request: NotificationRequest) {
        let due = Instant::now().checked_add(request.trigger.time_interval);
        if due.is_none() {
            debug!(identifier = %request.identifier, "delay out of range, notification never due");
        }
        let mut state = self.state.lock();
        state.submissions += 1;
        let replaced = state
            .pending
            .insert(request.identifier.clone(), Pending { request, due })
            .is_some();
        trace!(replaced, pending = state.pending.len(), "notification queued");
    }
}
