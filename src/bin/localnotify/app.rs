use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[cfg(target_os = "linux")]
use localnotify::center::DesktopCenter;
use localnotify::center::{ConsentPolicy, MemoryCenter, NotificationCenter};
use localnotify::config::Config;
use localnotify::error::{ConfigError, Error as AppError};
#[cfg(not(target_os = "linux"))]
use localnotify::error::NotifyError;
use localnotify::gateway::{GatewaySettings, NotificationGateway};
use localnotify::telemetry::init_tracing;
use localnotify::types::{AuthorizationStatus, Notification, NotificationSound};
use localnotify::Result;
use tracing::{info, warn};

use super::cli::{Cli, Command, ShowArgs};

const DEFAULT_CONFIG: &str = "localnotify.toml";
#[cfg(target_os = "linux")]
const DELIVERY_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// Permission missing or declined.
    Refused,
}

pub fn run(cli: Cli) -> Result<Outcome> {
    init_tracing(cli.log_filter.as_deref(), cli.json_logs)?;

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let mut config = Config::from_env_and_file(&config_path)?;
    apply_overrides(&cli, &mut config)?;
    let settings = GatewaySettings::from(&config);

    if cli.dry_run {
        return run_dry(&cli.command, &config, settings);
    }
    run_desktop(&cli.command, &config, settings)
}

fn apply_overrides(cli: &Cli, config: &mut Config) -> Result<()> {
    if let Some(timeout) = cli.settings_timeout {
        config.settings_timeout = nonzero("cli.settings_timeout", timeout)?;
    }
    if let Some(timeout) = cli.authorization_timeout {
        config.authorization_timeout = Some(nonzero("cli.authorization_timeout", timeout)?);
    }
    Ok(())
}

fn nonzero(field: &'static str, value: Duration) -> Result<Duration> {
    if value.is_zero() {
        return Err(AppError::from(ConfigError::InvalidField {
            field,
            message: "value must be greater than zero".to_string(),
        }));
    }
    Ok(value)
}

fn run_dry(command: &Command, config: &Config, settings: GatewaySettings) -> Result<Outcome> {
    let center = Arc::new(
        MemoryCenter::new(AuthorizationStatus::NotDetermined).with_consent(ConsentPolicy::Grant),
    );
    let gateway = NotificationGateway::with_settings(Arc::clone(&center), settings);
    let outcome = execute(&gateway, command, config)?;

    for request in center.pending() {
        info!(
            identifier = %request.identifier,
            title = %request.content.title,
            delay = %humantime::format_duration(request.trigger.time_interval),
            "dry-run: would deliver notification"
        );
    }
    Ok(outcome)
}

#[cfg(target_os = "linux")]
fn run_desktop(command: &Command, config: &Config, settings: GatewaySettings) -> Result<Outcome> {
    let center = Arc::new(DesktopCenter::new(&config.notify)?);
    let gateway = NotificationGateway::with_settings(Arc::clone(&center), settings);
    let outcome = execute(&gateway, command, config)?;

    // Scheduled deliveries live in this process; stay until they are out.
    if let Command::Show(args) = command {
        let delay = args.delay.unwrap_or(config.notify.default_delay);
        if !center.wait_idle(delay.saturating_add(DELIVERY_GRACE)) {
            warn!(
                pending = center.pending(),
                "exiting with undelivered notifications"
            );
        }
    }
    Ok(outcome)
}

#[cfg(not(target_os = "linux"))]
fn run_desktop(_: &Command, _: &Config, _: GatewaySettings) -> Result<Outcome> {
    Err(AppError::from(NotifyError::Backend(
        "no desktop notification center on this platform, use --dry-run".to_string(),
    )))
}

fn execute<C: NotificationCenter>(
    gateway: &NotificationGateway<C>,
    command: &Command,
    config: &Config,
) -> Result<Outcome> {
    match command {
        Command::RequestPermission => {
            if gateway.request_permission() {
                println!("granted");
                Ok(Outcome::Success)
            } else {
                println!("denied");
                Ok(Outcome::Refused)
            }
        }
        Command::Status { json } => {
            let status = match gateway.authorization_status() {
                Ok(status) => Some(status),
                Err(err) => {
                    warn!(error = %err, "unable to get notification settings");
                    None
                }
            };
            let available = status.is_some_and(AuthorizationStatus::permits_scheduling);
            if *json {
                let report = serde_json::json!({
                    "authorization_status": status,
                    "available": available,
                });
                println!("{report}");
            } else {
                match status {
                    Some(status) => println!("{status}"),
                    None => println!("unknown"),
                }
                println!("available: {available}");
            }
            Ok(if available {
                Outcome::Success
            } else {
                Outcome::Refused
            })
        }
        Command::Show(args) => {
            let identifier = gateway.try_show_notification(build_notification(args, config))?;
            println!("{identifier}");
            Ok(Outcome::Success)
        }
    }
}

fn build_notification(args: &ShowArgs, config: &Config) -> Notification {
    let mut notification = Notification::new(&args.title)
        .time_interval(args.delay.unwrap_or(config.notify.default_delay));
    if let Some(subtitle) = &args.subtitle {
        notification = notification.subtitle(subtitle);
    }
    if let Some(body) = &args.body {
        notification = notification.body(body);
    }
    if let Some(id) = &args.id {
        notification = notification.identifier(id);
    }
    if args.silent {
        notification = notification.silent();
    } else if let Some(sound) = &args.sound {
        notification = notification.sound(NotificationSound::Named(sound.clone()));
    }
    notification
}
