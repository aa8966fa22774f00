use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};

use crate::clock::{sleep_ns, Now};
use crate::{DistanceSample, Error};

/// Shortest time between the starts of two trigger pulses. The sensor needs
/// about 60 ms for the previous ping's reflections to die down.
pub const MIN_PING_INTERVAL_NS: i64 = 70_000_000;

/// How long the trigger is held high. The sensor needs at least 10 us.
pub const TRIGGER_HOLD_NS: u32 = 15_000;

/// Timing configuration for a [`RangingChannel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangingConfig {
    pub min_interval_ns: i64,
    pub trigger_hold_ns: u32,
    /// Give up on an echo after this long. `None` waits forever, which hangs
    /// the caller if the sensor is disconnected or nothing is in range.
    pub echo_timeout_ns: Option<i64>,
}

impl Default for RangingConfig {
    fn default() -> Self {
        Self {
            min_interval_ns: MIN_PING_INTERVAL_NS,
            trigger_hold_ns: TRIGGER_HOLD_NS,
            echo_timeout_ns: None,
        }
    }
}

/// Trigger and echo lines of one HC-SR04.
///
/// The channel remembers when it last pinged and makes the next ping wait only
/// for whatever is left of the minimum interval, so time spent elsewhere
/// (drawing, housekeeping) counts towards the settle time.
pub struct RangingChannel<TRIGPIN, ECHOPIN, CLOCK, DELAY> {
    trigger: TRIGPIN,
    echo: ECHOPIN,
    config: RangingConfig,
    clock: CLOCK,
    delay: DELAY,
    last_trigger_ns: Option<i64>,
}

impl<TRIGPIN, ECHOPIN, CLOCK, DELAY> RangingChannel<TRIGPIN, ECHOPIN, CLOCK, DELAY>
where
    TRIGPIN: OutputPin,
    ECHOPIN: InputPin,
    CLOCK: Now,
    DELAY: DelayNs,
{
    /// Requires the trigger output and the echo input, a clock reporting
    /// nanoseconds via the `Now` trait and a blocking delay.
    pub fn new(
        trigger: TRIGPIN,
        echo: ECHOPIN,
        config: RangingConfig,
        clock: CLOCK,
        delay: DELAY,
    ) -> Self {
        Self {
            trigger,
            echo,
            config,
            clock,
            delay,
            last_trigger_ns: None,
        }
    }

    pub fn config(&self) -> &RangingConfig {
        &self.config
    }

    /// Send one trigger pulse, first sleeping off whatever remains of the
    /// minimum interval since the previous pulse started.
    pub fn trigger_ping(&mut self) -> Result<(), Error> {
        self.trigger.set_low().map_err(Error::pin)?;

        if let Some(last) = self.last_trigger_ns {
            let deficit = self.config.min_interval_ns - (self.clock.now_nanos() - last);
            sleep_ns(&mut self.delay, deficit);
        }

        // the interval is measured between pulse starts
        self.last_trigger_ns = Some(self.clock.now_nanos());
        self.trigger.set_high().map_err(Error::pin)?;
        self.delay.delay_ns(self.config.trigger_hold_ns);
        self.trigger.set_low().map_err(Error::pin)
    }

    /// Busy-wait for the echo pulse and return its width.
    ///
    /// The rising edge is taken as the timestamp following the last low
    /// sample and the falling edge as the timestamp following the last high
    /// sample, so the result is off by at most one loop iteration.
    pub fn await_echo_pulse(&mut self) -> Result<DistanceSample, Error> {
        let started = self.clock.now_nanos();

        let mut rising = started;
        while self.echo.is_low().map_err(Error::pin)? {
            rising = self.clock.now_nanos();
            self.check_deadline(started, rising)?;
        }

        let mut falling = rising;
        while self.echo.is_high().map_err(Error::pin)? {
            falling = self.clock.now_nanos();
            self.check_deadline(started, falling)?;
        }

        Ok(DistanceSample::from_nanos(falling - rising))
    }

    fn check_deadline(&self, started: i64, now: i64) -> Result<(), Error> {
        match self.config.echo_timeout_ns {
            Some(limit) if now - started > limit => {
                #[cfg(feature = "defmt")]
                defmt::warn!("no echo after {} ns", now - started);
                Err(Error::NoEcho)
            }
            _ => Ok(()),
        }
    }
}
