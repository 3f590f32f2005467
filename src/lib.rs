#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod center;
pub mod config;
pub mod error;
pub mod gateway;
pub mod telemetry;
pub mod types;

pub use center::NotificationCenter;
pub use gateway::{GatewaySettings, NotificationGateway};
pub use types::{Notification, NotificationSound};

pub type Result<T> = std::result::Result<T, error::Error>;
