//! The bidirectional data line.
//!
//! `embedded-hal` has no trait for reconfiguring a pin between input and
//! output, so the protocol is written against [`GpioLine`] and the
//! [`OpenDrainLine`] adapter covers the common open-drain wiring.

use embedded_hal::digital::{ErrorType, InputPin, OutputPin, PinState};

/// Which side currently drives the line.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// The host drives the line.
    Output,
    /// The line is released to the sensor (and the pull-up).
    Input,
}

/// A single GPIO line that can switch between driving and sampling.
pub trait GpioLine: ErrorType {
    /// Switches the line between host-driven and released.
    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error>;

    /// Drives the given level. Only meaningful while the direction is
    /// [`Direction::Output`].
    fn write(&mut self, level: PinState) -> Result<(), Self::Error>;

    /// Samples the current level of the line.
    fn read(&mut self) -> Result<PinState, Self::Error>;
}

impl<T: GpioLine + ?Sized> GpioLine for &mut T {
    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error> {
        T::set_direction(self, direction)
    }

    fn write(&mut self, level: PinState) -> Result<(), Self::Error> {
        T::write(self, level)
    }

    fn read(&mut self) -> Result<PinState, Self::Error> {
        T::read(self)
    }
}

/// Adapts an open-drain pin with a pull-up into a [`GpioLine`].
///
/// Writing high on an open-drain output releases the line, so "input" is
/// simply a released output and the pin never changes mode.
pub struct OpenDrainLine<PIN> {
    pin: PIN,
}

impl<PIN> OpenDrainLine<PIN>
where
    PIN: InputPin + OutputPin,
{
    /// Wraps an open-drain pin.
    pub fn new(pin: PIN) -> Self {
        Self { pin }
    }

    /// Returns the wrapped pin.
    pub fn release(self) -> PIN {
        self.pin
    }
}

impl<PIN: ErrorType> ErrorType for OpenDrainLine<PIN> {
    type Error = PIN::Error;
}

impl<PIN> GpioLine for OpenDrainLine<PIN>
where
    PIN: InputPin + OutputPin,
{
    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error> {
        match direction {
            Direction::Input => self.pin.set_high(),
            // The output latch already holds the last written level.
            Direction::Output => Ok(()),
        }
    }

    fn write(&mut self, level: PinState) -> Result<(), Self::Error> {
        self.pin.set_state(level)
    }

    fn read(&mut self) -> Result<PinState, Self::Error> {
        Ok(PinState::from(self.pin.is_high()?))
    }
}
