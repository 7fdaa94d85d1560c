use embedded_hal::{delay::DelayNs, digital::PinState};

use crate::{
    clock::Clock,
    config::TimingConfig,
    error::{ConfigError, ProtocolError},
    frame::{FRAME_BITS, RawFrame, Reading},
    line::{Direction, GpioLine},
};

/// A step of one read.
///
/// A read walks `WakeLow → ReleaseHigh → AwaitAckLow → AwaitAckHigh`, then
/// `BitSync(i) → BitStart(i) → BitMeasure(i)` for each of the 40 bits, and
/// ends in `Validate`. The index carried by the bit phases is the position of
/// the bit in the frame, 0 being the most significant.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Host holds the line low to wake the sensor.
    WakeLow,
    /// Host drives the line high and releases it.
    ReleaseHigh,
    /// Waiting for the sensor to pull the line low.
    AwaitAckLow,
    /// Waiting for the sensor to release its acknowledge.
    AwaitAckHigh,
    /// Waiting for the low that precedes a bit.
    BitSync(u8),
    /// Waiting for the rising edge that starts a bit.
    BitStart(u8),
    /// Timing the high pulse of a bit.
    BitMeasure(u8),
    /// All bits received; checksum and decode.
    Validate,
}

impl Phase {
    fn after_bit(bit: u8) -> Self {
        if bit + 1 < FRAME_BITS {
            Phase::BitSync(bit + 1)
        } else {
            Phase::Validate
        }
    }
}

/// Returns the bit value encoded by a high pulse of `duration_us`.
pub fn classify_bit(duration_us: u32, threshold_us: u32) -> bool {
    duration_us > threshold_us
}

/// Driver for the AM2302 (DHT22) temperature and humidity sensor.
///
/// Owns the data line for its whole lifetime. Between reads the line is kept
/// idle: driven high, direction output.
pub struct Am2302<LINE, CLOCK, DELAY> {
    line: LINE,
    clock: CLOCK,
    delay: DELAY,
    timing: TimingConfig,
}

impl<LINE, CLOCK, DELAY> Am2302<LINE, CLOCK, DELAY>
where
    LINE: GpioLine,
    CLOCK: Clock,
    DELAY: DelayNs,
{
    /// Creates a new instance of the AM2302 driver with datasheet timing.
    ///
    /// # Arguments
    ///
    /// * `line` - The data line. The caller picks the GPIO; see
    ///   [`SensorConfig`](crate::SensorConfig).
    /// * `clock` - Monotonic clock used for every timeout and measurement.
    /// * `delay` - A delay provider for the wake pulse and settle hold.
    pub fn new(line: LINE, clock: CLOCK, delay: DELAY) -> Self {
        Am2302 {
            line,
            clock,
            delay,
            timing: TimingConfig::datasheet(),
        }
    }

    /// Creates a driver with custom timing, rejecting budgets that cannot
    /// decode a frame.
    pub fn with_timing(
        line: LINE,
        clock: CLOCK,
        delay: DELAY,
        timing: TimingConfig,
    ) -> Result<Self, ConfigError> {
        timing.validate()?;
        Ok(Am2302 {
            line,
            clock,
            delay,
            timing,
        })
    }

    /// The timing budgets in use.
    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    /// Gives back the line, clock and delay.
    pub fn release(self) -> (LINE, CLOCK, DELAY) {
        (self.line, self.clock, self.delay)
    }

    /// Puts the line in its idle state: direction output, driven high.
    pub fn park(&mut self) -> Result<(), LINE::Error> {
        self.line.set_direction(Direction::Output)?;
        self.line.write(PinState::High)
    }

    /// Reads a temperature and humidity measurement from the sensor.
    ///
    /// Runs the wake handshake, receives the 40-bit frame and validates its
    /// checksum. The line is parked again before returning, whatever the
    /// outcome. Nothing is retried; the sensor needs about two seconds
    /// between reads (see [`MIN_READ_INTERVAL_MS`](crate::MIN_READ_INTERVAL_MS)).
    pub fn read(&mut self) -> Result<Reading, ProtocolError<LINE::Error>> {
        let result = self.transfer();
        let parked = self.park();

        match result {
            Ok(reading) => {
                parked?;
                debug!(
                    "am2302: humidity {} temperature {} (tenths)",
                    reading.humidity.0,
                    reading.temperature.0
                );
                Ok(reading)
            }
            Err(e) => {
                if parked.is_err() {
                    warn!("am2302: failed to park line after error");
                }
                Err(e)
            }
        }
    }

    /// Runs every phase of one read, from wake pulse to decoded frame.
    fn transfer(&mut self) -> Result<Reading, ProtocolError<LINE::Error>> {
        let mut frame = RawFrame::default();
        let mut phase = Phase::WakeLow;

        while phase != Phase::Validate {
            phase = self.step(phase, &mut frame).inspect_err(|_| {
                warn!("am2302: read failed in {:?}", phase);
            })?;
        }

        frame.decode().inspect_err(|e| {
            if let ProtocolError::ChecksumMismatch { expected, actual } = e {
                warn!("am2302: checksum mismatch: {} - {}", *actual, *expected);
            }
        })
    }

    /// Performs one phase and returns the one that follows it.
    fn step(
        &mut self,
        phase: Phase,
        frame: &mut RawFrame,
    ) -> Result<Phase, ProtocolError<LINE::Error>> {
        trace!("am2302: {:?}", phase);
        let timing = self.timing;

        let next = match phase {
            Phase::WakeLow => {
                self.line.set_direction(Direction::Output)?;
                self.line.write(PinState::Low)?;
                self.delay.delay_us(timing.wake_hold_us);
                Phase::ReleaseHigh
            }
            Phase::ReleaseHigh => {
                self.line.write(PinState::High)?;
                self.line.set_direction(Direction::Input)?;
                Phase::AwaitAckLow
            }
            Phase::AwaitAckLow => {
                if !self.wait_for_state(PinState::Low, timing.ack_low_timeout_us)? {
                    return Err(ProtocolError::NoAckLow);
                }
                Phase::AwaitAckHigh
            }
            Phase::AwaitAckHigh => {
                if !self.wait_for_state(PinState::High, timing.ack_high_timeout_us)? {
                    return Err(ProtocolError::NoAckHigh);
                }
                self.delay.delay_us(timing.settle_us);
                Phase::BitSync(0)
            }
            Phase::BitSync(bit) => {
                if !self.wait_for_state(PinState::Low, timing.bit_sync_timeout_us)? {
                    return Err(ProtocolError::BitSyncLost(bit));
                }
                Phase::BitStart(bit)
            }
            Phase::BitStart(bit) => {
                if !self.wait_for_state(PinState::High, timing.bit_start_timeout_us)? {
                    return Err(ProtocolError::BitSyncLost(bit));
                }
                Phase::BitMeasure(bit)
            }
            Phase::BitMeasure(bit) => {
                let duration = self
                    .measure_pulse(PinState::High, timing.bit_measure_timeout_us)?
                    .ok_or(ProtocolError::BitTimingError(bit))?;
                frame.push(classify_bit(duration, timing.bit_one_threshold_us));
                Phase::after_bit(bit)
            }
            Phase::Validate => Phase::Validate,
        };

        Ok(next)
    }

    /// Polls until the line reads `state`.
    ///
    /// Returns `false` once more than `timeout_us` passed without seeing it.
    fn wait_for_state(&mut self, state: PinState, timeout_us: u32) -> Result<bool, LINE::Error> {
        let start = self.clock.now();
        loop {
            if self.line.read()? == state {
                return Ok(true);
            }
            let now = self.clock.now();
            if self.clock.micros_between(start, now) > timeout_us {
                return Ok(false);
            }
        }
    }

    /// Measures how long the line stays at `state`, in microseconds.
    ///
    /// Returns `None` if it is still there after `timeout_us`.
    fn measure_pulse(
        &mut self,
        state: PinState,
        timeout_us: u32,
    ) -> Result<Option<u32>, LINE::Error> {
        let start = self.clock.now();
        loop {
            let now = self.clock.now();
            let elapsed = self.clock.micros_between(start, now);
            if self.line.read()? != state {
                return Ok(Some(elapsed));
            }
            if elapsed > timeout_us {
                return Ok(None);
            }
        }
    }
}
