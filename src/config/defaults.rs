use std::time::Duration;

pub(super) const fn default_settings_timeout() -> Duration {
    crate::gateway::DEFAULT_SETTINGS_TIMEOUT
}

pub(super) fn default_appname() -> String {
    "localnotify".to_string()
}

pub(super) fn default_sound() -> String {
    "message-new-instant".to_string()
}

pub(super) const fn default_delay() -> Duration {
    crate::types::DEFAULT_TIME_INTERVAL
}
