//! Simulated hardware for the unit tests.
//!
//! Every pin reads the shared [`SimClock`] without advancing it, while each
//! `now_nanos` call advances it by one tick. That tick stands in for the time
//! one iteration of a polling loop takes, so busy-waits terminate and the
//! edge approximation error is bounded by exactly one tick.

use core::cell::{Cell, RefCell};
use core::convert::Infallible;

use embedded_graphics::prelude::Point;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorKind, ErrorType, InputPin, OutputPin};
use std::string::{String, ToString};
use std::vec::Vec;

use crate::display::Screen;
use crate::{Error, Now};

pub const START_NS: i64 = 1_000_000_000;

pub struct SimClock {
    now: Cell<i64>,
    tick: i64,
    sleeps: RefCell<Vec<u32>>,
}

impl SimClock {
    pub fn new(tick: i64) -> Self {
        Self {
            now: Cell::new(START_NS),
            tick,
            sleeps: RefCell::new(Vec::new()),
        }
    }

    pub fn peek(&self) -> i64 {
        self.now.get()
    }

    pub fn advance(&self, ns: i64) {
        self.now.set(self.now.get() + ns);
    }

    pub fn sleeps(&self) -> Vec<u32> {
        self.sleeps.borrow().clone()
    }
}

impl Now for SimClock {
    fn now_nanos(&self) -> i64 {
        self.advance(self.tick);
        self.now.get()
    }
}

#[derive(Clone, Copy)]
pub struct SimDelay<'a> {
    clock: &'a SimClock,
}

impl<'a> SimDelay<'a> {
    pub fn new(clock: &'a SimClock) -> Self {
        Self { clock }
    }
}

impl DelayNs for SimDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        self.clock.sleeps.borrow_mut().push(ns);
        self.clock.advance(ns as i64);
    }
}

/// An HC-SR04 whose echo goes high `latency` after each trigger pulse and
/// stays high for the width scripted for that pulse. `None` never answers.
/// Pulses past the end of the script reuse its last entry.
pub struct SimSensor<'a> {
    clock: &'a SimClock,
    latency: i64,
    widths: Vec<Option<i64>>,
    pulses: RefCell<Vec<i64>>,
}

impl<'a> SimSensor<'a> {
    pub fn new(clock: &'a SimClock, latency: i64, widths: &[Option<i64>]) -> Self {
        Self {
            clock,
            latency,
            widths: widths.to_vec(),
            pulses: RefCell::new(Vec::new()),
        }
    }

    pub fn pulses(&self) -> Vec<i64> {
        self.pulses.borrow().clone()
    }

    pub fn trigger(&self) -> SimTrigger<'_> {
        SimTrigger { sensor: self }
    }

    pub fn echo(&self) -> SimEcho<'_> {
        SimEcho { sensor: self }
    }

    fn echo_high(&self) -> bool {
        let pulses = self.pulses.borrow();
        let Some(&start) = pulses.last() else {
            return false;
        };
        let index = (pulses.len() - 1).min(self.widths.len().saturating_sub(1));
        match self.widths.get(index).copied().flatten() {
            Some(width) => {
                let t = self.clock.peek();
                t >= start + self.latency && t < start + self.latency + width
            }
            None => false,
        }
    }
}

pub struct SimTrigger<'a> {
    sensor: &'a SimSensor<'a>,
}

impl ErrorType for SimTrigger<'_> {
    type Error = Infallible;
}

impl OutputPin for SimTrigger<'_> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        let at = self.sensor.clock.peek();
        self.sensor.pulses.borrow_mut().push(at);
        Ok(())
    }
}

pub struct SimEcho<'a> {
    sensor: &'a SimSensor<'a>,
}

impl ErrorType for SimEcho<'_> {
    type Error = Infallible;
}

impl InputPin for SimEcho<'_> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.sensor.echo_high())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.sensor.echo_high())
    }
}

/// A button held during each `[from, to)` window of absolute clock time.
pub struct SimButton<'a> {
    clock: &'a SimClock,
    held: Vec<(i64, i64)>,
}

impl<'a> SimButton<'a> {
    pub fn new(clock: &'a SimClock, held: &[(i64, i64)]) -> Self {
        Self {
            clock,
            held: held.to_vec(),
        }
    }

    pub fn released(clock: &'a SimClock) -> Self {
        Self::new(clock, &[])
    }
}

impl ErrorType for SimButton<'_> {
    type Error = Infallible;
}

impl InputPin for SimButton<'_> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        let t = self.clock.peek();
        Ok(self.held.iter().any(|&(from, to)| t >= from && t < to))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

pub struct SimLed<'a> {
    levels: &'a RefCell<Vec<bool>>,
}

impl<'a> SimLed<'a> {
    pub fn new(levels: &'a RefCell<Vec<bool>>) -> Self {
        Self { levels }
    }
}

impl ErrorType for SimLed<'_> {
    type Error = Infallible;
}

impl OutputPin for SimLed<'_> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.levels.borrow_mut().push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.levels.borrow_mut().push(true);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenOp {
    Power(bool),
    Clear,
    Text(String),
    Pixel(i32, i32),
    Flush,
    AutoFlush(bool),
}

pub struct RecordingScreen<'a> {
    ops: &'a RefCell<Vec<ScreenOp>>,
}

impl<'a> RecordingScreen<'a> {
    pub fn new(ops: &'a RefCell<Vec<ScreenOp>>) -> Self {
        Self { ops }
    }

    fn record(&mut self, op: ScreenOp) -> Result<(), Error> {
        self.ops.borrow_mut().push(op);
        Ok(())
    }
}

impl Screen for RecordingScreen<'_> {
    fn set_power(&mut self, on: bool) -> Result<(), Error> {
        self.record(ScreenOp::Power(on))
    }

    fn clear(&mut self) -> Result<(), Error> {
        self.record(ScreenOp::Clear)
    }

    fn text(&mut self, text: &str, _origin: Point) -> Result<(), Error> {
        self.record(ScreenOp::Text(text.to_string()))
    }

    fn set_pixel(&mut self, at: Point) -> Result<(), Error> {
        self.record(ScreenOp::Pixel(at.x, at.y))
    }

    fn flush(&mut self) -> Result<(), Error> {
        self.record(ScreenOp::Flush)
    }

    fn set_auto_flush(&mut self, enabled: bool) {
        self.ops.borrow_mut().push(ScreenOp::AutoFlush(enabled));
    }
}

pub fn texts(ops: &RefCell<Vec<ScreenOp>>) -> Vec<String> {
    ops.borrow()
        .iter()
        .filter_map(|op| match op {
            ScreenOp::Text(text) => Some(text.clone()),
            _ => None,
        })
        .collect()
}

/// A pin whose every read and write fails, like a line behind a dead expander.
pub struct FaultyPin;

impl ErrorType for FaultyPin {
    type Error = ErrorKind;
}

impl InputPin for FaultyPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Err(ErrorKind::Other)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Err(ErrorKind::Other)
    }
}

impl OutputPin for FaultyPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Err(ErrorKind::Other)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Err(ErrorKind::Other)
    }
}

/// A display that dropped off the bus.
pub struct FaultyScreen;

impl Screen for FaultyScreen {
    fn set_power(&mut self, _on: bool) -> Result<(), Error> {
        Err(Error::Display)
    }

    fn clear(&mut self) -> Result<(), Error> {
        Err(Error::Display)
    }

    fn text(&mut self, _text: &str, _origin: Point) -> Result<(), Error> {
        Err(Error::Display)
    }

    fn set_pixel(&mut self, _at: Point) -> Result<(), Error> {
        Err(Error::Display)
    }

    fn flush(&mut self) -> Result<(), Error> {
        Err(Error::Display)
    }

    fn set_auto_flush(&mut self, _enabled: bool) {}
}
