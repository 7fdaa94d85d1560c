//! Timing budgets and pin binding.

use crate::error::ConfigError;

/// Nominal width of the high pulse encoding a `0` (upper end of 26–28 us).
pub const ZERO_PULSE_US: u32 = 28;

/// Nominal width of the high pulse encoding a `1`.
pub const ONE_PULSE_US: u32 = 70;

/// Minimum spacing between two reads, imposed by the sensor's duty cycle.
///
/// The driver never waits this out itself; callers schedule their reads.
pub const MIN_READ_INTERVAL_MS: u32 = 2_000;

/// Device-tree compatible string of the sensor node.
pub const COMPATIBLE: &str = "aosong,am2302";

/// Device property holding the data line's GPIO number.
pub const PIN_PROPERTY: &str = "gpio_do";

/// Wait budgets for every step of a read, in microseconds.
///
/// There is one budget per kind of wait. The bit-sync budget applies to
/// every bit, the first one included: after the settle hold the sensor is
/// still finishing its preparation pulse, which fits comfortably in it.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimingConfig {
    /// How long the host holds the line low to wake the sensor.
    pub wake_hold_us: u32,
    /// Budget for the sensor's acknowledging low after release.
    pub ack_low_timeout_us: u32,
    /// Budget for the acknowledging low to turn into the preparation high.
    pub ack_high_timeout_us: u32,
    /// Hold after the acknowledge before bit reception starts.
    pub settle_us: u32,
    /// Budget for the low that precedes each bit.
    pub bit_sync_timeout_us: u32,
    /// Budget for the rising edge that starts each bit.
    pub bit_start_timeout_us: u32,
    /// Budget for the high pulse that carries each bit.
    pub bit_measure_timeout_us: u32,
    /// High pulses strictly longer than this decode as `1`.
    pub bit_one_threshold_us: u32,
}

impl TimingConfig {
    /// Budgets that work with the AM2302 datasheet timings and a host whose
    /// polling loop samples at least once per microsecond or so.
    pub const fn datasheet() -> Self {
        Self {
            wake_hold_us: 1_000,
            ack_low_timeout_us: 40,
            ack_high_timeout_us: 80,
            settle_us: 50,
            bit_sync_timeout_us: 80,
            bit_start_timeout_us: 80,
            bit_measure_timeout_us: 90,
            bit_one_threshold_us: 40,
        }
    }

    /// Checks that the budgets can decode a frame at all.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1_000..=2_000).contains(&self.wake_hold_us) {
            return Err(ConfigError::WakeHoldOutOfRange(self.wake_hold_us));
        }
        if self.bit_one_threshold_us <= ZERO_PULSE_US || self.bit_one_threshold_us >= ONE_PULSE_US {
            return Err(ConfigError::ThresholdOutOfRange(self.bit_one_threshold_us));
        }
        if [
            self.ack_low_timeout_us,
            self.ack_high_timeout_us,
            self.bit_sync_timeout_us,
            self.bit_start_timeout_us,
        ]
        .contains(&0)
        {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.bit_measure_timeout_us <= ONE_PULSE_US {
            return Err(ConfigError::MeasureTimeoutTooShort(self.bit_measure_timeout_us));
        }
        Ok(())
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self::datasheet()
    }
}

/// Key/value lookup over a device description (device tree node, ACPI
/// properties, a config file...).
pub trait DeviceProperties {
    /// Whether the description is for a device with this compatible string.
    fn is_compatible(&self, compatible: &str) -> bool;

    /// Whether the named property is present, whatever its value.
    fn has_property(&self, name: &str) -> bool;

    /// Returns the named property as a `u32`, or `None` if it is absent or
    /// not a number.
    fn property_u32(&self, name: &str) -> Option<u32>;

    /// Whether `pin` names a GPIO that exists on this platform.
    fn is_valid_gpio(&self, pin: u32) -> bool {
        let _ = pin;
        true
    }
}

/// Everything needed to bind a driver instance to a sensor.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SensorConfig {
    /// GPIO number of the data line.
    pub pin: u32,
    /// Wait budgets.
    #[cfg_attr(feature = "serde", serde(default))]
    pub timing: TimingConfig,
}

impl SensorConfig {
    /// Configuration for the given pin with default timing.
    pub const fn new(pin: u32) -> Self {
        Self {
            pin,
            timing: TimingConfig::datasheet(),
        }
    }

    /// Reads the pin number from the `gpio_do` property of a device
    /// described as [`COMPATIBLE`].
    pub fn from_properties<P>(properties: &P) -> Result<Self, ConfigError>
    where
        P: DeviceProperties + ?Sized,
    {
        if !properties.is_compatible(COMPATIBLE) {
            return Err(ConfigError::NotCompatible);
        }
        if !properties.has_property(PIN_PROPERTY) {
            return Err(ConfigError::MissingProperty(PIN_PROPERTY));
        }
        let pin = properties
            .property_u32(PIN_PROPERTY)
            .ok_or(ConfigError::InvalidProperty(PIN_PROPERTY))?;
        if !properties.is_valid_gpio(pin) {
            return Err(ConfigError::InvalidPin(pin));
        }
        Ok(Self::new(pin))
    }
}
