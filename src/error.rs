use core::fmt;

/// Errors returned by a single read of the AM2302.
///
/// Every variant is recoverable: the line is back in its idle state when one
/// of these is returned and the caller may try again after the sensor's
/// minimum read interval.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError<E> {
    /// The sensor did not pull the line low after the wake pulse.
    NoAckLow,
    /// The sensor pulled the line low but never released it high.
    NoAckHigh,
    /// An expected low/high edge was missing while receiving the given bit.
    BitSyncLost(u8),
    /// The high pulse of the given bit did not end within the measure budget.
    BitTimingError(u8),
    /// The frame arrived in full but its checksum byte does not match.
    ChecksumMismatch {
        /// Sum of the four data bytes, modulo 256.
        expected: u8,
        /// Checksum byte carried by the frame.
        actual: u8,
    },
    /// Error from the GPIO line (direction change, write or read).
    Line(E),
}

impl<E> From<E> for ProtocolError<E> {
    fn from(value: E) -> Self {
        Self::Line(value)
    }
}

impl<E: fmt::Debug> fmt::Display for ProtocolError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoAckLow => f.write_str("sensor did not acknowledge the wake pulse (no low)"),
            Self::NoAckHigh => f.write_str("sensor did not acknowledge the wake pulse (no high)"),
            Self::BitSyncLost(bit) => write!(f, "lost edge synchronisation at bit {bit}"),
            Self::BitTimingError(bit) => write!(f, "high pulse of bit {bit} did not end in time"),
            Self::ChecksumMismatch { expected, actual } => {
                write!(f, "checksum mismatch: computed {expected:#04x}, received {actual:#04x}")
            }
            Self::Line(e) => write!(f, "GPIO line error: {e:?}"),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for ProtocolError<E> {}

/// Errors from building a sensor configuration.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The wake pulse hold must be between 1 and 2 ms.
    WakeHoldOutOfRange(u32),
    /// The bit threshold must sit strictly between the 0 and 1 pulse widths.
    ThresholdOutOfRange(u32),
    /// The measure budget would cut a nominal `1` pulse short.
    MeasureTimeoutTooShort(u32),
    /// A wait budget was set to zero.
    ZeroTimeout,
    /// The device description is not for an AM2302.
    NotCompatible,
    /// A required device property is absent.
    MissingProperty(&'static str),
    /// A device property is present but could not be read as a number.
    InvalidProperty(&'static str),
    /// The configured GPIO does not exist on this platform.
    InvalidPin(u32),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WakeHoldOutOfRange(us) => {
                write!(f, "wake hold of {us} us is outside 1000..=2000 us")
            }
            Self::ThresholdOutOfRange(us) => {
                write!(f, "bit threshold of {us} us is not between 28 and 70 us")
            }
            Self::MeasureTimeoutTooShort(us) => {
                write!(f, "measure timeout of {us} us is shorter than a 1 bit")
            }
            Self::ZeroTimeout => f.write_str("wait timeouts must be non-zero"),
            Self::NotCompatible => f.write_str("device is not compatible with the AM2302 driver"),
            Self::MissingProperty(name) => write!(f, "device property '{name}' not found"),
            Self::InvalidProperty(name) => write!(f, "could not read device property '{name}'"),
            Self::InvalidPin(pin) => write!(f, "GPIO {pin} is not valid"),
        }
    }
}

impl core::error::Error for ConfigError {}
