#[path = "localnotify/app.rs"]
mod app;
#[path = "localnotify/cli.rs"]
mod cli;

use std::error::Error as StdError;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = cli::Cli::parse_args();
    match app::run(cli) {
        Ok(app::Outcome::Success) => ExitCode::SUCCESS,
        Ok(app::Outcome::Refused) => ExitCode::from(2),
        Err(err) => {
            report_error(&err);
            ExitCode::from(1)
        }
    }
}

fn report_error(err: &localnotify::error::Error) {
    eprintln!("Error: {err}");
    let mut source: Option<&dyn StdError> = err.source();
    while let Some(cause) = source {
        eprintln!("  caused by: {cause}");
        source = cause.source();
    }
    if err.is_timeout() {
        eprintln!("hint: the notification service did not answer in time, see --settings-timeout");
    }
}
