//! Monotonic time sources for timeouts and pulse measurement.

/// A monotonic clock with microsecond (or better) resolution.
///
/// Every wait in the protocol polls [`Clock::now`] between line samples, so
/// `now` should be cheap. Worst-case latency between two samples must stay
/// well under the ~14 us gap between a `0` and a `1` pulse.
pub trait Clock {
    /// An opaque point in time.
    type Instant: Copy;

    /// Returns the current instant.
    fn now(&mut self) -> Self::Instant;

    /// Whole microseconds elapsed from `start` to `end`.
    fn micros_between(&self, start: Self::Instant, end: Self::Instant) -> u32;
}

impl<C: Clock + ?Sized> Clock for &mut C {
    type Instant = C::Instant;

    fn now(&mut self) -> Self::Instant {
        C::now(self)
    }

    fn micros_between(&self, start: Self::Instant, end: Self::Instant) -> u32 {
        C::micros_between(self, start, end)
    }
}

/// Clock over a free-running 32-bit microsecond counter, such as a hardware
/// timer register. Wrap-around is handled, so reads shorter than ~71 minutes
/// measure correctly.
pub struct CounterClock<F> {
    counter: F,
}

impl<F> CounterClock<F>
where
    F: FnMut() -> u32,
{
    /// Creates a clock that calls `counter` for the current tick.
    pub fn new(counter: F) -> Self {
        Self { counter }
    }
}

impl<F> Clock for CounterClock<F>
where
    F: FnMut() -> u32,
{
    type Instant = u32;

    fn now(&mut self) -> u32 {
        (self.counter)()
    }

    fn micros_between(&self, start: u32, end: u32) -> u32 {
        end.wrapping_sub(start)
    }
}

/// Clock backed by [`std::time::Instant`], for Linux hosts driving the line
/// from user space.
#[cfg(feature = "std")]
#[derive(Clone, Copy, Debug, Default)]
pub struct StdClock;

#[cfg(feature = "std")]
impl Clock for StdClock {
    type Instant = std::time::Instant;

    fn now(&mut self) -> Self::Instant {
        std::time::Instant::now()
    }

    fn micros_between(&self, start: Self::Instant, end: Self::Instant) -> u32 {
        let micros = end.saturating_duration_since(start).as_micros();
        u32::try_from(micros).unwrap_or(u32::MAX)
    }
}
