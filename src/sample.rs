use heapless::Vec;
use libm::sqrt;

use crate::Error;

/// 34.3 cm per 1_000_000 ns, i.e. 343 m/s, kept as an exact ratio.
const CM_PER_NS_NUM: i128 = 343;
const CM_PER_NS_DEN: i128 = 10_000_000;

/// The most samples a single burst can hold.
pub const BURST_CAPACITY: usize = 64;

/// One echo high-pulse width, in nanoseconds.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DistanceSample(i64);

impl DistanceSample {
    pub const fn from_nanos(ns: i64) -> Self {
        Self(ns)
    }

    pub const fn as_nanos(self) -> i64 {
        self.0
    }

    /// Distance in whole centimetres, see [`to_length`].
    pub fn to_length(self) -> i64 {
        to_length(self)
    }
}

/// Convert an echo width to whole centimetres.
///
/// The echo covers the way out and back, so the travelled distance is halved.
/// Rounds half up; negative widths count as zero.
pub fn to_length(sample: DistanceSample) -> i64 {
    let ns = sample.0.max(0) as i128;
    let den = 2 * CM_PER_NS_DEN;
    ((ns * CM_PER_NS_NUM + den / 2) / den) as i64
}

/// Speed of sound in m/s at the given air temperature.
pub fn speed_of_sound(celsius: f64) -> f64 {
    331.5 * sqrt(1.0 + (celsius / 273.15))
}

/// Convert an echo width to centimetres using the temperature adjusted speed of
/// sound instead of the fixed 343 m/s.
pub fn to_length_compensated(sample: DistanceSample, celsius: f64) -> f64 {
    let secs = sample.0.max(0) as f64 / 1_000_000_000.0;
    (speed_of_sound(celsius) * 100.0 * secs) / 2.0
}

/// A fixed-length run of samples in acquisition order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Burst {
    samples: Vec<DistanceSample, BURST_CAPACITY>,
}

impl Burst {
    /// Acquire exactly `len` samples, clamped to `1..=BURST_CAPACITY`, by
    /// calling `measure` once per slot. The first error aborts the burst.
    pub fn acquire<F>(len: usize, mut measure: F) -> Result<Self, Error>
    where
        F: FnMut() -> Result<DistanceSample, Error>,
    {
        let mut samples = Vec::new();
        for _ in 0..len.clamp(1, BURST_CAPACITY) {
            // capacity is checked by the clamp above
            let _ = samples.push(measure()?);
        }
        Ok(Self { samples })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[DistanceSample] {
        &self.samples
    }

    pub fn min(&self) -> DistanceSample {
        self.samples.iter().copied().min().unwrap_or_default()
    }

    pub fn max(&self) -> DistanceSample {
        self.samples.iter().copied().max().unwrap_or_default()
    }

    /// Every sample converted with [`to_length`].
    pub fn lengths(&self) -> impl Iterator<Item = i64> + '_ {
        self.samples.iter().map(|s| s.to_length())
    }
}
