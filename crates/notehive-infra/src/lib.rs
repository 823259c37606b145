//! Notehive Infra Library
//!
//! Cross-cutting infrastructure: telemetry initialization and the push
//! notification fan-out.

#[cfg(feature = "push")]
pub mod push;
pub mod telemetry;

#[cfg(feature = "push")]
pub use push::{DeliveryOutcome, PushService, PushServiceConfig};
pub use telemetry::{init_telemetry, shutdown_telemetry};
