//! Sharing one sensor between several contexts.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::{Mutex, raw::RawMutex};
use embedded_hal::delay::DelayNs;

use crate::{
    am2302::Am2302,
    clock::Clock,
    error::ProtocolError,
    frame::Reading,
    line::GpioLine,
};

/// An [`Am2302`] behind a blocking mutex.
///
/// Every read holds the mutex for its whole duration (up to a few
/// milliseconds), so reads from different contexts never interleave on the
/// line. Pick `M` for the contexts involved, e.g.
/// `CriticalSectionRawMutex` when interrupts share the sensor.
pub struct SharedAm2302<M: RawMutex, LINE, CLOCK, DELAY> {
    sensor: Mutex<M, RefCell<Am2302<LINE, CLOCK, DELAY>>>,
}

impl<M, LINE, CLOCK, DELAY> SharedAm2302<M, LINE, CLOCK, DELAY>
where
    M: RawMutex,
    LINE: GpioLine,
    CLOCK: Clock,
    DELAY: DelayNs,
{
    /// Wraps a driver for sharing.
    pub fn new(sensor: Am2302<LINE, CLOCK, DELAY>) -> Self {
        Self {
            sensor: Mutex::new(RefCell::new(sensor)),
        }
    }

    /// Reads the sensor while holding the mutex.
    pub fn read(&self) -> Result<Reading, ProtocolError<LINE::Error>> {
        self.lock(|sensor| sensor.read())
    }

    /// Runs `f` with exclusive access to the driver.
    ///
    /// # Panics
    ///
    /// If called again from inside `f`.
    pub fn lock<R>(&self, f: impl FnOnce(&mut Am2302<LINE, CLOCK, DELAY>) -> R) -> R {
        self.sensor.lock(|sensor| f(&mut sensor.borrow_mut()))
    }

    /// Gives the driver back, consuming the wrapper.
    pub fn into_inner(self) -> Am2302<LINE, CLOCK, DELAY> {
        self.sensor.into_inner().into_inner()
    }
}
