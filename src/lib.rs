//! # sounder
//!
//! A distance sounder built around an HC-SR04 ultrasonic sensor, a small
//! monochrome display and two buttons.
//!
//! The crate is split the way the signal flows:
//!
//! - [`RangingChannel`] sends trigger pulses no closer than 70 ms apart and
//!   busy-waits on the echo line to time the returning pulse.
//! - [`BackgroundTaskGuard`] keeps interruptible background work away from that
//!   busy-wait and runs it once afterwards.
//! - [`DistanceSampler`] combines the two into one [`DistanceSample`] per call,
//!   which [`to_length`] turns into centimetres.
//! - [`OperatorConsole`] lets an operator pick single-shot or burst mode, counts
//!   down, measures and shows the result.
//!
//! All hardware is reached through `embedded-hal` 1.0 traits, a [`Now`] clock
//! and the [`Screen`] display trait, so the logic runs unchanged on a board or
//! against simulated pins.
//!
//! ## Features
//!
//! - `defmt`: log burst timings, single measurements and echo timeouts via
//!   `defmt`, and derive `defmt::Format` for the public types.
//!
//! # Example
//!
//! ```rust, ignore
//! #![no_std]
//! #![no_main]
//!
//! use embassy_executor::Spawner;
//! use embassy_rp::gpio::{Input, Level, Output, Pull};
//! use embassy_time::{Delay, Instant};
//! use sounder::{DistanceSampler, Measure, Now, RangingChannel, RangingConfig};
//! use {defmt_rtt as _, panic_probe as _};
//!
//! struct EmbassyClock;
//!
//! impl Now for EmbassyClock {
//!     fn now_nanos(&self) -> i64 {
//!         Instant::now().as_micros() as i64 * 1_000
//!     }
//! }
//!
//! #[embassy_executor::main]
//! async fn main(_spawner: Spawner) {
//!     let p = embassy_rp::init(Default::default());
//!
//!     let trigger = Output::new(p.PIN_13, Level::Low);
//!     let echo = Input::new(p.PIN_12, Pull::None);
//!     let channel = RangingChannel::new(trigger, echo, RangingConfig::default(), EmbassyClock, Delay);
//!     let mut sampler = DistanceSampler::new(channel, ());
//!
//!     loop {
//!         match sampler.measure_once() {
//!             Ok(sample) => defmt::info!("Distance: {} cm", sample.to_length()),
//!             Err(e) => defmt::info!("Error: {:?}", e),
//!         }
//!     }
//! }
//! ```

#![no_std]

#[cfg(test)]
extern crate std;

mod buttons;
mod clock;
mod console;
mod display;
mod error;
mod guard;
mod ranging;
mod sample;
mod sampler;

#[cfg(test)]
mod sim;

pub use buttons::{ButtonPanel, ButtonState, Press};
pub use clock::{sleep_ns, Now, NS_PER_SEC};
pub use console::{
    blink_count, sparkline_y, ConsoleConfig, ConsoleMode, ConsoleState, OperatorConsole, Reading,
    DEFAULT_BURST_LEN, DEFAULT_COUNTDOWN_SECS, DEFAULT_POLL_INTERVAL_NS, SPARKLINE_BASELINE,
    SPARKLINE_HEIGHT, SPARKLINE_LEFT,
};
pub use display::{GraphicsScreen, Panel, Screen};
pub use error::Error;
pub use guard::{run_with_background_suppressed, BackgroundTaskGuard, Maintenance};
pub use ranging::{RangingChannel, RangingConfig, MIN_PING_INTERVAL_NS, TRIGGER_HOLD_NS};
pub use sample::{
    speed_of_sound, to_length, to_length_compensated, Burst, DistanceSample, BURST_CAPACITY,
};
pub use sampler::{DistanceSampler, Measure};
