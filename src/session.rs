//! Single-shot read sessions, the way a character device serves the sensor.
//!
//! Opening a session parks the line. The first read measures once and copies
//! as much of the formatted report as fits in the caller's buffer; every
//! further read returns `Ok(0)`, end of stream, until the session is dropped
//! and a new one opened. A buffer of
//! [`REPORT_CAPACITY`](crate::frame::REPORT_CAPACITY) bytes always holds
//! the whole report. Dropping the session parks the line again.

use embedded_hal::delay::DelayNs;

use crate::{
    am2302::Am2302,
    clock::Clock,
    error::ProtocolError,
    line::GpioLine,
};

/// An open read session on an [`Am2302`].
///
/// Holds the driver mutably, so at most one session (or read) can use the
/// line at a time.
pub struct Session<'a, LINE, CLOCK, DELAY>
where
    LINE: GpioLine,
    CLOCK: Clock,
    DELAY: DelayNs,
{
    sensor: &'a mut Am2302<LINE, CLOCK, DELAY>,
    finished: bool,
}

impl<LINE, CLOCK, DELAY> Am2302<LINE, CLOCK, DELAY>
where
    LINE: GpioLine,
    CLOCK: Clock,
    DELAY: DelayNs,
{
    /// Parks the line and starts a read session.
    pub fn open(&mut self) -> Result<Session<'_, LINE, CLOCK, DELAY>, LINE::Error> {
        trace!("am2302: open");
        self.park()?;
        Ok(Session {
            sensor: self,
            finished: false,
        })
    }
}

impl<LINE, CLOCK, DELAY> Session<'_, LINE, CLOCK, DELAY>
where
    LINE: GpioLine,
    CLOCK: Clock,
    DELAY: DelayNs,
{
    /// Measures and copies the report into `buf`, truncated to its length.
    ///
    /// Only the first successful call measures; later ones return `Ok(0)`.
    /// A failed measurement is returned as-is and leaves the session unread,
    /// so the caller may try again later.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, ProtocolError<LINE::Error>> {
        if self.finished {
            return Ok(0);
        }

        let report = self.sensor.read()?.report();
        let count = report.len().min(buf.len());
        buf[..count].copy_from_slice(&report.as_bytes()[..count]);
        self.finished = true;

        Ok(count)
    }
}

impl<LINE, CLOCK, DELAY> Drop for Session<'_, LINE, CLOCK, DELAY>
where
    LINE: GpioLine,
    CLOCK: Clock,
    DELAY: DelayNs,
{
    fn drop(&mut self) {
        trace!("am2302: release");
        if self.sensor.park().is_err() {
            warn!("am2302: failed to park line on release");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        line::Direction,
        sim::{Sim, Waveform},
    };
    use embedded_hal::digital::PinState;

    const FRAME: u64 = 0x02_8D_00_EB_7A;

    #[test]
    fn test_single_shot_per_open() {
        let sim = Sim::new(Waveform::frame(FRAME));
        let mut sensor = sim.sensor();
        let mut buf = [0u8; 80];

        let mut session = sensor.open().unwrap();
        let count = session.read(&mut buf).unwrap();
        assert_eq!(&buf[..count], b"Humidity: 65.3\nTemperature: 23.5\n");
        assert_eq!(session.read(&mut buf), Ok(0));
        assert_eq!(session.read(&mut buf), Ok(0));
        drop(session);

        let mut session = sensor.open().unwrap();
        assert_eq!(session.read(&mut buf), Ok(count));
    }

    #[test]
    fn test_short_buffer_gets_truncated_report() {
        let sim = Sim::new(Waveform::frame(FRAME));
        let mut sensor = sim.sensor();
        let mut session = sensor.open().unwrap();

        let mut buf = [0u8; 8];
        assert_eq!(session.read(&mut buf), Ok(8));
        assert_eq!(&buf, b"Humidity");
        assert_eq!(session.read(&mut buf), Ok(0));
    }

    #[test]
    fn test_failed_read_does_not_end_session() {
        let sim = Sim::new(Waveform::silent());
        let mut sensor = sim.sensor();
        let mut buf = [0u8; 80];

        let mut session = sensor.open().unwrap();
        assert_eq!(session.read(&mut buf), Err(ProtocolError::NoAckLow));

        sim.set_waveform(Waveform::frame(FRAME));
        assert!(session.read(&mut buf).unwrap() > 0);
        assert_eq!(session.read(&mut buf), Ok(0));
    }

    #[test]
    fn test_open_and_release_park_line() {
        let sim = Sim::new(Waveform::frame(FRAME));
        let mut sensor = sim.sensor();

        sim.disturb(Direction::Input, PinState::Low);
        let session = sensor.open().unwrap();
        assert!(sim.is_parked());

        sim.disturb(Direction::Input, PinState::Low);
        drop(session);
        assert!(sim.is_parked());
    }
}
