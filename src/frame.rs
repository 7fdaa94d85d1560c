use core::fmt::{self, Write as _};

use crate::error::ProtocolError;

/// Number of bits in a frame.
pub const FRAME_BITS: u8 = 40;

/// Capacity of a formatted [`Report`].
pub const REPORT_CAPACITY: usize = 80;

/// Human-readable report of one reading.
pub type Report = heapless::String<REPORT_CAPACITY>;

/// A signed fixed-point value with one decimal digit.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tenths(pub i32);

impl Tenths {
    /// The value as a float, e.g. `Tenths(-105)` is `-10.5`.
    pub fn to_f32(self) -> f32 {
        self.0 as f32 / 10.0
    }
}

impl fmt::Display for Tenths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{}", abs / 10, abs % 10)
    }
}

/// Reading returned by the AM2302.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reading {
    /// Relative humidity in tenths of a percent.
    pub humidity: Tenths,
    /// Temperature in tenths of a degree Celsius.
    pub temperature: Tenths,
}

impl Reading {
    /// Relative humidity in percent.
    pub fn humidity_percent(&self) -> f32 {
        self.humidity.to_f32()
    }

    /// Temperature in degrees Celsius.
    pub fn temperature_celsius(&self) -> f32 {
        self.temperature.to_f32()
    }

    /// Formats the reading as `Humidity: 55.0\nTemperature: 23.4\n`.
    pub fn report(&self) -> Report {
        let mut report = Report::new();
        // 25 bytes of labels plus at most 12 per value ("-214748364.8").
        let _ = write!(
            report,
            "Humidity: {}\nTemperature: {}\n",
            self.humidity, self.temperature
        );
        report
    }
}

/// A 40-bit frame as shifted in from the line, most significant bit first.
///
/// Layout: humidity in bits 39–24, temperature sign in bit 23, temperature
/// magnitude in bits 22–8 and the checksum in bits 7–0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RawFrame(u64);

impl RawFrame {
    const MASK: u64 = (1 << FRAME_BITS) - 1;

    /// Wraps a frame value; bits above 39 are dropped.
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits & Self::MASK)
    }

    /// Builds a frame from its five bytes in transmission order.
    pub fn from_bytes(bytes: [u8; 5]) -> Self {
        Self(bytes.iter().fold(0, |acc, b| (acc << 8) | u64::from(*b)))
    }

    /// The frame as a 40-bit integer.
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Shifts `bit` in as the new least significant bit.
    pub fn push(&mut self, bit: bool) {
        self.0 = ((self.0 << 1) | u64::from(bit)) & Self::MASK;
    }

    /// The five bytes in transmission order.
    pub fn bytes(self) -> [u8; 5] {
        let [_, _, _, b0, b1, b2, b3, b4] = self.0.to_be_bytes();
        [b0, b1, b2, b3, b4]
    }

    /// Sum of the four data bytes, modulo 256.
    pub fn checksum(self) -> u8 {
        self.bytes()[..4]
            .iter()
            .fold(0u8, |sum, b| sum.wrapping_add(*b))
    }

    /// Validates the checksum and extracts the reading.
    pub fn decode<E>(self) -> Result<Reading, ProtocolError<E>> {
        let [hum_hi, hum_lo, temp_hi, temp_lo, actual] = self.bytes();

        let expected = self.checksum();
        if expected != actual {
            return Err(ProtocolError::ChecksumMismatch { expected, actual });
        }

        let humidity = i32::from(u16::from_be_bytes([hum_hi, hum_lo]));

        let is_temp_negative = (temp_hi >> 7) != 0;
        let magnitude = i32::from(u16::from_be_bytes([temp_hi & 0b0111_1111, temp_lo]));
        let temperature = if is_temp_negative { -magnitude } else { magnitude };

        Ok(Reading {
            humidity: Tenths(humidity),
            temperature: Tenths(temperature),
        })
    }
}
