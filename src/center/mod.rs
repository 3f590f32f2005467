//! Host notification services.
//!
//! A [`NotificationCenter`] is the platform side of the gateway. Its
//! operations are asynchronous: completions may run later, on any thread.

use crate::error::HostError;
use crate::types::{AuthorizationOptions, NotificationRequest, NotificationSettings};

mod memory;
pub use memory::{ConsentPolicy, MemoryCenter};

#[cfg(target_os = "linux")]
mod desktop;
#[cfg(target_os = "linux")]
pub use desktop::DesktopCenter;

/// Called once with `(granted, error)` when the host settles an
/// authorization request.
pub type AuthorizationCallback = Box<dyn FnOnce(bool, Option<HostError>) + Send + 'static>;

/// Called once with the current settings, or `None` when the host has none.
pub type SettingsCallback = Box<dyn FnOnce(Option<NotificationSettings>) + Send + 'static>;

pub trait NotificationCenter: Send + Sync {
    /// Ask the user for the given capabilities. The host prompts at most once
    /// per install and answers later requests from the stored decision.
    fn request_authorization(&self, options: AuthorizationOptions, completion: AuthorizationCallback);

    fn notification_settings(&self, completion: SettingsCallback);

    /// Hand a request over for delivery. A still-pending request with the
    /// same identifier is replaced.
    fn add(&self, request: NotificationRequest);
}
