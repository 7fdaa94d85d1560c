//! AM2302 Sensor Driver for Embedded Rust
//!
//! This crate provides a platform-agnostic driver for the AM2302 (DHT22)
//! temperature and humidity sensor. The sensor talks over a single data line
//! using pulse widths, so the driver busy-polls the line against a monotonic
//! clock and decodes each bit from how long the line stays high.
//!
//! # Features
//! - Blocking synchronous API on top of [`embedded-hal`] 1.0
//! - Explicit protocol state machine with a typed error for every failure
//! - Checksum mismatches are always reported, never silently decoded
//! - Single-shot read sessions with a human-readable report
//! - Designed for `no_std` environments, no heap allocation
//!
//! # Collaborators
//! - [`GpioLine`]: switches the data line between driven and released.
//!   [`OpenDrainLine`] adapts any open-drain [`InputPin`] + [`OutputPin`].
//! - [`Clock`]: monotonic microsecond time source for timeouts.
//! - [`DelayNs`]: wake pulse and settle hold.
//!
//! # Optional Features
//! - `defmt`: Implements `defmt::Format` and logs through `defmt`
//! - `log`: Logs through the `log` facade
//! - `serde`: Serialize/deserialize readings and configuration
//! - `std`: Adds [`StdClock`](clock::StdClock)
//!
//! [`embedded-hal`]: https://docs.rs/embedded-hal
//! [`InputPin`]: embedded_hal::digital::InputPin
//! [`OutputPin`]: embedded_hal::digital::OutputPin
//! [`DelayNs`]: embedded_hal::delay::DelayNs

#![cfg_attr(not(test), no_std)]

#[cfg(feature = "std")]
extern crate std;

#[macro_use]
mod fmt;

pub mod am2302;
pub mod clock;
pub mod config;
pub mod error;
pub mod frame;
pub mod line;
pub mod session;
pub mod shared;

#[cfg(test)]
mod sim;

pub use am2302::{Am2302, Phase};
pub use clock::{Clock, CounterClock};
pub use config::{DeviceProperties, MIN_READ_INTERVAL_MS, SensorConfig, TimingConfig};
pub use error::{ConfigError, ProtocolError};
pub use frame::{RawFrame, Reading, Report, Tenths};
pub use line::{Direction, GpioLine, OpenDrainLine};
pub use session::Session;
pub use shared::SharedAm2302;
