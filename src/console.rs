//! The operator console: two buttons, an indicator LED and a small display
//! driving single-shot and burst measurements.
//!
//! Button handling is the pure [`ConsoleState::on_press`]; everything with a
//! side effect (drawing, blinking, sampling, sleeping) happens in
//! [`OperatorConsole::step`], one state at a time.

use core::convert::Infallible;
use core::fmt::{self, Write};

use embedded_graphics::prelude::Point;
use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin, PinState},
};
use heapless::String;

use crate::buttons::{ButtonPanel, Press};
use crate::clock::{sleep_ns, Now, NS_PER_SEC};
use crate::display::Screen;
use crate::{Burst, DistanceSample, Error, Measure, BURST_CAPACITY};

pub const DEFAULT_COUNTDOWN_SECS: u32 = 5;
pub const DEFAULT_BURST_LEN: usize = 50;
pub const DEFAULT_POLL_INTERVAL_NS: i64 = 10_000_000;

/// Full-scale height of the burst sparkline in pixels.
pub const SPARKLINE_HEIGHT: i64 = 10;
pub const SPARKLINE_LEFT: i32 = 10;
/// Bottom row of a 128x32 panel.
pub const SPARKLINE_BASELINE: i32 = 31;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConsoleMode {
    #[default]
    SingleShot,
    BurstMeasure,
}

impl ConsoleMode {
    pub fn toggled(self) -> Self {
        match self {
            ConsoleMode::SingleShot => ConsoleMode::BurstMeasure,
            ConsoleMode::BurstMeasure => ConsoleMode::SingleShot,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Seconds counted down before measuring.
    pub countdown_secs: u32,
    /// Samples per burst, from 1 to [`BURST_CAPACITY`].
    pub burst_len: usize,
    /// Idle sleep between two button polls.
    pub poll_interval_ns: i64,
}

impl ConsoleConfig {
    /// Check that every burst fits in a [`Burst`] buffer.
    pub fn validate(&self) -> Result<(), Error> {
        if (1..=BURST_CAPACITY).contains(&self.burst_len) {
            Ok(())
        } else {
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "burst length {} outside 1..={}",
                self.burst_len,
                BURST_CAPACITY
            );
            Err(Error::Config)
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            countdown_secs: DEFAULT_COUNTDOWN_SECS,
            burst_len: DEFAULT_BURST_LEN,
            poll_interval_ns: DEFAULT_POLL_INTERVAL_NS,
        }
    }
}

/// What a sampling run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reading {
    Single(DistanceSample),
    Burst(Burst),
    /// The sensor never answered within the configured echo timeout.
    NoEcho,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleState {
    ModeSelect { highlighted: ConsoleMode },
    Countdown { mode: ConsoleMode, remaining: u32 },
    Sampling { mode: ConsoleMode },
    ShowResult { mode: ConsoleMode, reading: Reading },
    AwaitAnyPress { mode: ConsoleMode },
}

impl Default for ConsoleState {
    fn default() -> Self {
        ConsoleState::ModeSelect {
            highlighted: ConsoleMode::default(),
        }
    }
}

impl ConsoleState {
    /// The state a button press leads to. Only mode selection and the final
    /// wait react to buttons; the other states ignore them.
    pub fn on_press(self, press: Press, countdown_secs: u32) -> Self {
        match self {
            ConsoleState::ModeSelect { highlighted } => match press {
                Press::Mode => ConsoleState::ModeSelect {
                    highlighted: highlighted.toggled(),
                },
                Press::Enter => ConsoleState::Countdown {
                    mode: highlighted,
                    remaining: countdown_secs,
                },
            },
            ConsoleState::AwaitAnyPress { mode } => ConsoleState::ModeSelect { highlighted: mode },
            other => other,
        }
    }
}

/// Indicator toggles during the countdown second with `remaining` seconds
/// left: always odd, and fewer as zero approaches.
pub fn blink_count(remaining: u32) -> u32 {
    2 * remaining + 1
}

/// Row of a sparkline point. `max` sits [`SPARKLINE_HEIGHT`] rows above the
/// baseline; a flat burst stays on the baseline.
pub fn sparkline_y(length: i64, min: i64, max: i64) -> i32 {
    let span = max - min;
    if span <= 0 {
        return SPARKLINE_BASELINE;
    }
    SPARKLINE_BASELINE - ((length - min) * SPARKLINE_HEIGHT / span) as i32
}

pub struct OperatorConsole<SAMPLER, SCREEN, MODEPIN, ENTERPIN, LEDPIN, CLOCK, DELAY> {
    sampler: SAMPLER,
    screen: SCREEN,
    buttons: ButtonPanel<MODEPIN, ENTERPIN>,
    led: LEDPIN,
    led_on: bool,
    clock: CLOCK,
    delay: DELAY,
    config: ConsoleConfig,
    state: ConsoleState,
    menu_drawn: bool,
    last_burst_ns: Option<i64>,
}

impl<SAMPLER, SCREEN, MODEPIN, ENTERPIN, LEDPIN, CLOCK, DELAY>
    OperatorConsole<SAMPLER, SCREEN, MODEPIN, ENTERPIN, LEDPIN, CLOCK, DELAY>
where
    SAMPLER: Measure,
    SCREEN: Screen,
    MODEPIN: InputPin,
    ENTERPIN: InputPin,
    LEDPIN: OutputPin,
    CLOCK: Now,
    DELAY: DelayNs,
{
    pub fn new(
        sampler: SAMPLER,
        screen: SCREEN,
        buttons: ButtonPanel<MODEPIN, ENTERPIN>,
        led: LEDPIN,
        clock: CLOCK,
        delay: DELAY,
        config: ConsoleConfig,
    ) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            sampler,
            screen,
            buttons,
            led,
            led_on: false,
            clock,
            delay,
            config,
            state: ConsoleState::default(),
            menu_drawn: false,
            last_burst_ns: None,
        })
    }

    pub fn state(&self) -> &ConsoleState {
        &self.state
    }

    /// Wall-clock time the most recent burst took.
    pub fn last_burst_ns(&self) -> Option<i64> {
        self.last_burst_ns
    }

    /// Run the console until an I/O error stops it.
    pub fn run(&mut self) -> Result<Infallible, Error> {
        loop {
            self.step()?;
        }
    }

    /// Do the work of the current state once and move to the next one.
    /// Input states poll the buttons once and sleep if nothing was pressed.
    pub fn step(&mut self) -> Result<(), Error> {
        let next = match &self.state {
            ConsoleState::ModeSelect { highlighted } => {
                let highlighted = *highlighted;
                self.select_mode(highlighted)?
            }
            ConsoleState::Countdown { mode, remaining } => {
                let (mode, remaining) = (*mode, *remaining);
                self.count_down(mode, remaining)?
            }
            ConsoleState::Sampling { mode } => {
                let mode = *mode;
                self.sample(mode)?
            }
            ConsoleState::ShowResult { mode, reading } => {
                show_result(&mut self.screen, reading)?;
                ConsoleState::AwaitAnyPress { mode: *mode }
            }
            ConsoleState::AwaitAnyPress { mode } => {
                let mode = *mode;
                self.await_press(mode)?
            }
        };
        self.state = next;
        Ok(())
    }

    fn select_mode(&mut self, highlighted: ConsoleMode) -> Result<ConsoleState, Error> {
        if !self.menu_drawn {
            let (many, one) = match highlighted {
                ConsoleMode::BurstMeasure => ('*', ' '),
                ConsoleMode::SingleShot => (' ', '*'),
            };
            let menu: String<64> = format(format_args!(
                "left:DOWN. Right:GO\n{many} measure many\n{one} measure one"
            ))?;
            show_message(&mut self.screen, &menu, None)?;
            self.menu_drawn = true;
        }

        let state = ConsoleState::ModeSelect { highlighted };
        let Some(press) = self.buttons.poll()? else {
            self.idle();
            return Ok(state);
        };
        let next = state.on_press(press, self.config.countdown_secs);
        match next {
            ConsoleState::ModeSelect { .. } => self.menu_drawn = false,
            ConsoleState::Countdown { .. } => self.screen.set_power(true)?,
            _ => {}
        }
        Ok(next)
    }

    fn count_down(&mut self, mode: ConsoleMode, remaining: u32) -> Result<ConsoleState, Error> {
        if remaining == 0 {
            show_message(&mut self.screen, "Measuring now", None)?;
            return Ok(ConsoleState::Sampling { mode });
        }

        let text: String<32> = format(format_args!("Measuring in\n  {remaining}sec"))?;
        show_message(&mut self.screen, &text, None)?;

        let blinks = blink_count(remaining);
        for _ in 0..blinks {
            sleep_ns(&mut self.delay, NS_PER_SEC / blinks as i64);
            self.set_led(!self.led_on)?;
        }
        Ok(ConsoleState::Countdown {
            mode,
            remaining: remaining - 1,
        })
    }

    fn sample(&mut self, mode: ConsoleMode) -> Result<ConsoleState, Error> {
        let outcome = match mode {
            ConsoleMode::SingleShot => self.sampler.measure_once().map(|sample| {
                #[cfg(feature = "defmt")]
                defmt::info!(
                    "distance is {} cm over {} ns",
                    sample.to_length(),
                    sample.as_nanos()
                );
                Reading::Single(sample)
            }),
            ConsoleMode::BurstMeasure => self.sample_burst().map(Reading::Burst),
        };
        self.set_led(false)?;

        let reading = match outcome {
            Ok(reading) => reading,
            Err(Error::NoEcho) => Reading::NoEcho,
            Err(e) => return Err(e),
        };
        Ok(ConsoleState::ShowResult { mode, reading })
    }

    fn sample_burst(&mut self) -> Result<Burst, Error> {
        self.set_led(true)?;
        self.screen.set_auto_flush(false);
        let start = self.clock.now_nanos();
        let burst = self.sampler.measure_burst(self.config.burst_len);
        let elapsed = self.clock.now_nanos() - start;
        self.screen.set_auto_flush(true);

        let burst = burst?;
        self.last_burst_ns = Some(elapsed);
        #[cfg(feature = "defmt")]
        defmt::info!("{} runs took {}ms", burst.len(), elapsed / 1_000_000);
        Ok(burst)
    }

    fn await_press(&mut self, mode: ConsoleMode) -> Result<ConsoleState, Error> {
        let state = ConsoleState::AwaitAnyPress { mode };
        match self.buttons.poll()? {
            Some(press) => {
                self.menu_drawn = false;
                Ok(state.on_press(press, self.config.countdown_secs))
            }
            None => {
                self.idle();
                Ok(state)
            }
        }
    }

    fn idle(&mut self) {
        sleep_ns(&mut self.delay, self.config.poll_interval_ns);
    }

    fn set_led(&mut self, on: bool) -> Result<(), Error> {
        self.led.set_state(PinState::from(on)).map_err(Error::pin)?;
        self.led_on = on;
        Ok(())
    }
}

fn format<const N: usize>(args: fmt::Arguments<'_>) -> Result<String<N>, Error> {
    let mut text = String::new();
    text.write_fmt(args).map_err(|_| Error::Display)?;
    Ok(text)
}

/// Redraw the whole display with `text` and, for bursts, the sparkline.
fn show_message<S: Screen>(screen: &mut S, text: &str, sparkline: Option<&Burst>) -> Result<(), Error> {
    screen.set_auto_flush(false);
    screen.clear()?;
    screen.text(text, Point::zero())?;
    if let Some(burst) = sparkline {
        draw_sparkline(screen, burst)?;
    }
    screen.flush()?;
    screen.set_auto_flush(true);
    Ok(())
}

fn show_result<S: Screen>(screen: &mut S, reading: &Reading) -> Result<(), Error> {
    match reading {
        Reading::Single(sample) => {
            let text: String<64> = format(format_args!(
                "measures: {}cm\nAny key to continue",
                sample.to_length()
            ))?;
            show_message(screen, &text, None)
        }
        Reading::Burst(burst) => {
            let text: String<96> = format(format_args!(
                "min:{}cm  max:{}cm\npress key to restart",
                burst.min().to_length(),
                burst.max().to_length()
            ))?;
            show_message(screen, &text, Some(burst))
        }
        Reading::NoEcho => show_message(screen, "no echo\nAny key to continue", None),
    }
}

/// One 2x2 marker per sample, left to right in acquisition order.
fn draw_sparkline<S: Screen>(screen: &mut S, burst: &Burst) -> Result<(), Error> {
    let min = burst.min().to_length();
    let max = burst.max().to_length();
    for (i, length) in burst.lengths().enumerate() {
        let x = SPARKLINE_LEFT + 2 * i as i32;
        let y = sparkline_y(length, min, max);
        for at in [
            Point::new(x, y),
            Point::new(x + 1, y),
            Point::new(x, y - 1),
            Point::new(x + 1, y - 1),
        ] {
            screen.set_pixel(at)?;
        }
    }
    Ok(())
}
