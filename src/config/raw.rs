use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use serde_with::serde_as;

use crate::Result;
use crate::error::ConfigError;

use super::defaults::{default_appname, default_delay, default_settings_timeout, default_sound};
use super::env::{env_duration, env_string};
use super::{Config, HumantimeDuration, NotifySettings};

pub(super) fn load(path: impl AsRef<Path>) -> std::result::Result<RawConfig, ConfigError> {
    let builder = ::config::Config::builder()
        .add_source(::config::File::from(path.as_ref()).required(false))
        .add_source(
            ::config::Environment::with_prefix("LOCALNOTIFY")
                .separator("__")
                .try_parsing(true),
        );
    deserialize(builder)
}

fn deserialize(
    builder: ::config::ConfigBuilder<::config::builder::DefaultState>,
) -> std::result::Result<RawConfig, ConfigError> {
    builder
        .build()
        .map_err(|err| ConfigError::Other(err.to_string()))?
        .try_deserialize()
        .map_err(|err| ConfigError::Parse(err.to_string()))
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct RawConfig {
    #[serde(default)]
    pub(super) gateway: RawGateway,
    #[serde(default)]
    pub(super) notify: RawNotify,
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub(super) struct RawGateway {
    #[serde(default = "default_settings_timeout")]
    #[serde_as(as = "HumantimeDuration")]
    pub(super) settings_timeout: Duration,
    #[serde(default)]
    #[serde_as(as = "Option<HumantimeDuration>")]
    pub(super) authorization_timeout: Option<Duration>,
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub(super) struct RawNotify {
    #[serde(default = "default_appname")]
    pub(super) appname: String,
    #[serde(default = "default_raw_sound")]
    pub(super) sound: Option<String>,
    #[serde(default)]
    pub(super) icon: Option<PathBuf>,
    #[serde(default = "default_delay")]
    #[serde_as(as = "HumantimeDuration")]
    pub(super) default_delay: Duration,
}

#[allow(clippy::unnecessary_wraps)]
fn default_raw_sound() -> Option<String> {
    Some(default_sound())
}

impl Default for RawGateway {
    fn default() -> Self {
        Self {
            settings_timeout: default_settings_timeout(),
            authorization_timeout: None,
        }
    }
}

impl Default for RawNotify {
    fn default() -> Self {
        Self {
            appname: default_appname(),
            sound: default_raw_sound(),
            icon: None,
            default_delay: default_delay(),
        }
    }
}

impl RawConfig {
    pub(super) fn apply_env_overrides(&mut self) -> std::result::Result<(), ConfigError> {
        if let Some(appname) = env_string("NOTIFY_APPNAME")? {
            self.notify.appname = appname;
        }
        if let Some(timeout) = env_duration("NOTIFY_SETTINGS_TIMEOUT")? {
            self.gateway.settings_timeout = timeout;
        }
        if let Some(timeout) = env_duration("NOTIFY_AUTH_TIMEOUT")? {
            self.gateway.authorization_timeout = Some(timeout);
        }
        if let Some(sound) = env_string("NOTIFY_SOUND")? {
            self.notify.sound = Some(sound);
        }
        if let Some(icon) = env_string("NOTIFY_ICON")? {
            self.notify.icon = Some(PathBuf::from(icon));
        }
        if let Some(delay) = env_duration("NOTIFY_DELAY")? {
            self.notify.default_delay = delay;
        }
        Ok(())
    }

    pub(super) fn validate_and_build(self) -> Result<Config> {
        if self.gateway.settings_timeout.is_zero() {
            return Err(ConfigError::InvalidField {
                field: "gateway.settings_timeout",
                message: "settings timeout must be greater than zero".to_string(),
            }
            .into());
        }
        if self
            .gateway
            .authorization_timeout
            .is_some_and(|timeout| timeout.is_zero())
        {
            return Err(ConfigError::InvalidField {
                field: "gateway.authorization_timeout",
                message: "omit the value to wait indefinitely instead of using zero".to_string(),
            }
            .into());
        }
        let appname = self.notify.appname.trim();
        if appname.is_empty() {
            return Err(ConfigError::InvalidField {
                field: "notify.appname",
                message: "application name cannot be empty".to_string(),
            }
            .into());
        }

        Ok(Config {
            settings_timeout: self.gateway.settings_timeout,
            authorization_timeout: self.gateway.authorization_timeout,
            notify: NotifySettings {
                appname: appname.to_string(),
                sound: self
                    .notify
                    .sound
                    .map(|sound| sound.trim().to_string())
                    .filter(|sound| !sound.is_empty()),
                icon: self.notify.icon,
                default_delay: self.notify.default_delay,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{RawConfig, deserialize};
    use crate::error::{ConfigError, Error};
    use std::path::Path;
    use std::time::Duration;

    fn from_toml(src: &str) -> RawConfig {
        let builder = ::config::Config::builder()
            .add_source(::config::File::from_str(src, ::config::FileFormat::Toml));
        match deserialize(builder) {
            Ok(raw) => raw,
            Err(err) => panic!("failed to load sample config: {err}"),
        }
    }

    #[test]
    fn empty_file_yields_defaults() {
        let config = match RawConfig::default().validate_and_build() {
            Ok(config) => config,
            Err(err) => panic!("defaults must validate: {err}"),
        };
        assert_eq!(config.settings_timeout, Duration::from_secs(3));
        assert!(config.authorization_timeout.is_none());
        assert_eq!(config.notify.appname, "localnotify");
        assert_eq!(config.notify.sound.as_deref(), Some("message-new-instant"));
        assert_eq!(config.notify.default_delay, Duration::from_secs(1));
    }

    #[test]
    fn file_values_are_applied() {
        let raw = from_toml(
            r#"
            [gateway]
            settings_timeout = "500ms"
            authorization_timeout = 30

            [notify]
            appname = "  Reminders "
            sound = ""
            icon = "/usr/share/icons/bell.png"
            default_delay = "5s"
            "#,
        );
        let config = match raw.validate_and_build() {
            Ok(config) => config,
            Err(err) => panic!("sample config must validate: {err}"),
        };
        assert_eq!(config.settings_timeout, Duration::from_millis(500));
        assert_eq!(config.authorization_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.notify.appname, "Reminders");
        assert!(config.notify.sound.is_none());
        assert_eq!(
            config.notify.icon.as_deref(),
            Some(Path::new("/usr/share/icons/bell.png"))
        );
        assert_eq!(config.notify.default_delay, Duration::from_secs(5));
    }

    #[test]
    fn zero_settings_timeout_is_rejected() {
        let raw = from_toml("[gateway]\nsettings_timeout = \"0s\"\n");
        assert!(matches!(
            raw.validate_and_build(),
            Err(Error::Config(ConfigError::InvalidField {
                field: "gateway.settings_timeout",
                ..
            }))
        ));
    }

    #[test]
    fn blank_appname_is_rejected() {
        let raw = from_toml("[notify]\nappname = \" \"\n");
        assert!(matches!(
            raw.validate_and_build(),
            Err(Error::Config(ConfigError::InvalidField {
                field: "notify.appname",
                ..
            }))
        ));
    }
}
