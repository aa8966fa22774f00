use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};

use crate::clock::Now;
use crate::guard::{run_with_background_suppressed, Maintenance};
use crate::{Burst, DistanceSample, Error, RangingChannel};

/// Something that produces raw distance samples on demand.
pub trait Measure {
    /// Take one measurement. The raw width is returned as-is; zero or absurdly
    /// long pulses are the caller's to judge.
    fn measure_once(&mut self) -> Result<DistanceSample, Error>;

    /// Take `len` measurements back to back.
    fn measure_burst(&mut self, len: usize) -> Result<Burst, Error> {
        Burst::acquire(len, || self.measure_once())
    }
}

/// A ranging channel plus the background work that must stay out of its echo
/// timing loop.
pub struct DistanceSampler<TRIGPIN, ECHOPIN, CLOCK, DELAY, MAINT> {
    channel: RangingChannel<TRIGPIN, ECHOPIN, CLOCK, DELAY>,
    maintenance: MAINT,
}

impl<TRIGPIN, ECHOPIN, CLOCK, DELAY, MAINT> DistanceSampler<TRIGPIN, ECHOPIN, CLOCK, DELAY, MAINT>
where
    TRIGPIN: OutputPin,
    ECHOPIN: InputPin,
    CLOCK: Now,
    DELAY: DelayNs,
    MAINT: Maintenance,
{
    pub fn new(channel: RangingChannel<TRIGPIN, ECHOPIN, CLOCK, DELAY>, maintenance: MAINT) -> Self {
        Self {
            channel,
            maintenance,
        }
    }

    pub fn channel(&self) -> &RangingChannel<TRIGPIN, ECHOPIN, CLOCK, DELAY> {
        &self.channel
    }
}

impl<TRIGPIN, ECHOPIN, CLOCK, DELAY, MAINT> Measure
    for DistanceSampler<TRIGPIN, ECHOPIN, CLOCK, DELAY, MAINT>
where
    TRIGPIN: OutputPin,
    ECHOPIN: InputPin,
    CLOCK: Now,
    DELAY: DelayNs,
    MAINT: Maintenance,
{
    fn measure_once(&mut self) -> Result<DistanceSample, Error> {
        self.channel.trigger_ping()?;
        let channel = &mut self.channel;
        run_with_background_suppressed(&mut self.maintenance, || channel.await_echo_pulse())
    }
}
