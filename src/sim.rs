//! Simulated sensor for protocol tests.
//!
//! The line, clock and delay share one simulated bus. Time only moves when
//! the driver looks at the clock (one microsecond per `now`) or sleeps, which
//! makes every scenario deterministic. Once the host releases the line the
//! sensor plays a [`Waveform`] from the start.

use core::convert::Infallible;
use std::{cell::RefCell, rc::Rc, vec::Vec};

use embedded_hal::{
    delay::DelayNs,
    digital::{ErrorType, PinState},
};

use crate::{
    am2302::Am2302,
    clock::Clock,
    line::{Direction, GpioLine},
};

const TURNAROUND_US: u32 = 20;
const ACK_US: u32 = 78;
const BIT_LOW_US: u32 = 50;
const ZERO_HIGH_US: u32 = 27;
const ONE_HIGH_US: u32 = 70;

/// What the sensor does with the line after the host releases it.
#[derive(Clone, Debug)]
pub struct Waveform {
    segments: Vec<(PinState, u32)>,
    tail: PinState,
}

impl Waveform {
    /// A sensor that never answers: the pull-up keeps the line high.
    pub fn silent() -> Self {
        Waveform {
            segments: Vec::new(),
            tail: PinState::High,
        }
    }

    /// Turnaround, acknowledging low and preparation high.
    pub fn ack() -> Self {
        Self::silent()
            .segment(PinState::High, TURNAROUND_US)
            .segment(PinState::Low, ACK_US)
            .segment(PinState::High, ACK_US)
    }

    /// A complete, well-timed transmission of `frame`.
    pub fn frame(frame: u64) -> Self {
        Self::ack()
            .bits(frame, 40)
            .segment(PinState::Low, BIT_LOW_US)
            .stall(PinState::High)
    }

    /// Appends the first `count` bits of `frame`, most significant first.
    pub fn bits(mut self, frame: u64, count: u8) -> Self {
        for i in 0..count {
            let bit = (frame >> (39 - i)) & 1 == 1;
            self = self
                .segment(PinState::Low, BIT_LOW_US)
                .segment(PinState::High, if bit { ONE_HIGH_US } else { ZERO_HIGH_US });
        }
        self
    }

    pub fn segment(mut self, level: PinState, duration_us: u32) -> Self {
        self.segments.push((level, duration_us));
        self
    }

    /// Keeps only the first `count` segments.
    pub fn truncate(mut self, count: usize) -> Self {
        self.segments.truncate(count);
        self
    }

    /// Level held forever once the segments run out.
    pub fn stall(mut self, level: PinState) -> Self {
        self.tail = level;
        self
    }

    fn level_at(&self, elapsed_us: u64) -> PinState {
        let mut end = 0u64;
        for (level, duration) in &self.segments {
            end += u64::from(*duration);
            if elapsed_us < end {
                return *level;
            }
        }
        self.tail
    }
}

struct Bus {
    now_us: u64,
    direction: Direction,
    driven: PinState,
    released_at: Option<u64>,
    waveform: Waveform,
}

impl Bus {
    fn level(&self) -> PinState {
        match (self.direction, self.released_at) {
            (Direction::Input, Some(at)) => self.waveform.level_at(self.now_us - at),
            _ => self.driven,
        }
    }
}

/// Handle to a simulated bus, idle at creation.
#[derive(Clone)]
pub struct Sim(Rc<RefCell<Bus>>);

impl Sim {
    pub fn new(waveform: Waveform) -> Self {
        Sim(Rc::new(RefCell::new(Bus {
            now_us: 0,
            direction: Direction::Output,
            driven: PinState::High,
            released_at: None,
            waveform,
        })))
    }

    pub fn set_waveform(&self, waveform: Waveform) {
        self.0.borrow_mut().waveform = waveform;
    }

    pub fn line(&self) -> SimLine {
        SimLine(self.0.clone())
    }

    pub fn clock(&self) -> SimClock {
        SimClock(self.0.clone())
    }

    pub fn delay(&self) -> SimDelay {
        SimDelay(self.0.clone())
    }

    pub fn sensor(&self) -> Am2302<SimLine, SimClock, SimDelay> {
        Am2302::new(self.line(), self.clock(), self.delay())
    }

    /// Whether the host is driving the line high.
    pub fn is_parked(&self) -> bool {
        let bus = self.0.borrow();
        bus.direction == Direction::Output && bus.driven == PinState::High
    }

    /// Forces the line into another state, as a misbehaving caller would.
    pub fn disturb(&self, direction: Direction, driven: PinState) {
        let mut bus = self.0.borrow_mut();
        bus.direction = direction;
        bus.driven = driven;
    }
}

pub struct SimLine(Rc<RefCell<Bus>>);

impl ErrorType for SimLine {
    type Error = Infallible;
}

impl GpioLine for SimLine {
    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error> {
        let mut bus = self.0.borrow_mut();
        match direction {
            Direction::Input if bus.direction == Direction::Output => {
                bus.released_at = Some(bus.now_us);
            }
            Direction::Input => {}
            Direction::Output => bus.released_at = None,
        }
        bus.direction = direction;
        Ok(())
    }

    fn write(&mut self, level: PinState) -> Result<(), Self::Error> {
        self.0.borrow_mut().driven = level;
        Ok(())
    }

    fn read(&mut self) -> Result<PinState, Self::Error> {
        Ok(self.0.borrow().level())
    }
}

pub struct SimClock(Rc<RefCell<Bus>>);

impl Clock for SimClock {
    type Instant = u64;

    fn now(&mut self) -> u64 {
        let mut bus = self.0.borrow_mut();
        let now = bus.now_us;
        bus.now_us += 1;
        now
    }

    fn micros_between(&self, start: u64, end: u64) -> u32 {
        u32::try_from(end - start).unwrap_or(u32::MAX)
    }
}

pub struct SimDelay(Rc<RefCell<Bus>>);

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.borrow_mut().now_us += u64::from(ns).div_ceil(1_000);
    }
}
