use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt};

use crate::Result;
use crate::error::Error;

const FALLBACK_FILTER: &str = "info";

/// Install the global tracing subscriber.
///
/// The filter comes from `explicit_filter`, then `RUST_LOG`, then `info`; the
/// first candidate that parses wins. JSON output needs the `json-logs`
/// feature.
///
/// # Errors
///
/// Fails when no filter candidate parses, when JSON is requested from a
/// binary built without `json-logs`, or when a global subscriber is already
/// installed.
pub fn init_tracing(explicit_filter: Option<&str>, use_json: bool) -> Result<()> {
    let env_filter = std::env::var("RUST_LOG").ok();
    let filter = select_filter(explicit_filter, env_filter.as_deref())?;
    let registry = Registry::default().with(filter);

    if use_json {
        #[cfg(feature = "json-logs")]
        {
            let subscriber = registry.with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .json()
                    .flatten_event(true),
            );
            return tracing::subscriber::set_global_default(subscriber)
                .map_err(|err| Error::Telemetry(err.to_string()));
        }
        #[cfg(not(feature = "json-logs"))]
        return Err(Error::Telemetry(
            "binary was built without the `json-logs` feature".to_string(),
        ));
    }

    // Logs go to stderr so command output on stdout stays scriptable.
    let subscriber = registry.with(
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr),
    );
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|err| Error::Telemetry(err.to_string()))
}

fn select_filter(explicit: Option<&str>, from_env: Option<&str>) -> Result<EnvFilter> {
    explicit
        .into_iter()
        .chain(from_env)
        .chain(std::iter::once(FALLBACK_FILTER))
        .find_map(|candidate| EnvFilter::try_new(candidate).ok())
        .ok_or_else(|| Error::Telemetry("invalid log filter".to_string()))
}

#[cfg(test)]
mod tests {
    use super::select_filter;

    fn rendered(explicit: Option<&str>, from_env: Option<&str>) -> String {
        match select_filter(explicit, from_env) {
            Ok(filter) => filter.to_string(),
            Err(err) => panic!("filter selection failed: {err}"),
        }
    }

    #[test]
    fn explicit_filter_wins() {
        assert_eq!(
            rendered(Some("localnotify=debug"), Some("warn")),
            "localnotify=debug"
        );
    }

    #[test]
    fn invalid_candidates_fall_through() {
        assert_eq!(rendered(Some("localnotify=loud"), Some("warn")), "warn");
        assert_eq!(rendered(None, None), "info");
    }
}
