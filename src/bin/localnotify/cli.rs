use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand};
use humantime::parse_duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Schedule local desktop notifications", long_about = None)]
pub struct Cli {
    /// Path of the TOML configuration file.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Explicit log filter (e.g. "localnotify=debug").
    #[arg(long, value_name = "FILTER", global = true)]
    pub log_filter: Option<String>,

    /// Emit logs as JSON (`--features json-logs`).
    #[arg(long, action = ArgAction::SetTrue, global = true)]
    pub json_logs: bool,

    /// Use an in-process center that grants permission and only logs what
    /// would be delivered.
    #[arg(long, action = ArgAction::SetTrue, global = true)]
    pub dry_run: bool,

    /// Give up on the settings query after this long (e.g. "3s").
    #[arg(long, value_parser = parse_duration, global = true)]
    pub settings_timeout: Option<Duration>,

    /// Give up on the permission request after this long. Waits forever by
    /// default.
    #[arg(long, value_parser = parse_duration, global = true)]
    pub authorization_timeout: Option<Duration>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Ask for permission to show alerts, badges and sounds.
    RequestPermission,
    /// Print the current authorization status.
    Status {
        /// Print the settings as JSON.
        #[arg(long, action = ArgAction::SetTrue)]
        json: bool,
    },
    /// Schedule a notification.
    Show(ShowArgs),
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    #[arg(long)]
    pub title: String,

    #[arg(long)]
    pub subtitle: Option<String>,

    #[arg(long)]
    pub body: Option<String>,

    /// Delay before delivery (e.g. "10s"); defaults to `notify.default_delay`.
    #[arg(long, value_parser = parse_duration)]
    pub delay: Option<Duration>,

    /// Identifier; a pending notification with the same one is replaced.
    #[arg(long)]
    pub id: Option<String>,

    /// Sound name to play instead of the default one.
    #[arg(long, conflicts_with = "silent")]
    pub sound: Option<String>,

    /// Deliver without sound.
    #[arg(long, action = ArgAction::SetTrue)]
    pub silent: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
