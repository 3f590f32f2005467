use std::time::Duration;

use humantime::{format_duration, parse_duration};
use serde::Deserialize;
use serde_with::{DeserializeAs, SerializeAs};

/// Duration written either as a humantime string (`"1m 30s"`) or as a number
/// of seconds (`3`, `0.5`). Always serialized as a humantime string.
pub(crate) struct HumantimeDuration;

#[derive(Deserialize)]
#[serde(untagged)]
enum DurationRepr {
    Text(String),
    Seconds(f64),
}

impl<'de> DeserializeAs<'de, Duration> for HumantimeDuration {
    fn deserialize_as<D>(deserializer: D) -> std::result::Result<Duration, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        match DurationRepr::deserialize(deserializer)? {
            DurationRepr::Text(raw) => parse_duration(raw.trim()).map_err(serde::de::Error::custom),
            DurationRepr::Seconds(secs) => {
                Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
            }
        }
    }
}

impl SerializeAs<Duration> for HumantimeDuration {
    fn serialize_as<S>(value: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(&format_duration(*value))
    }
}
