//! Distance sounder on a Raspberry Pi Pico W.
//!
//! Wiring:
//!
//! - HC-SR04 trigger on GP13, echo on GP12 (through a divider if the sensor runs on 5V)
//! - indicator LED on GP18
//! - "mode" button between GP9 (driven high) and GP8, "enter" between GP22 and GP21
//! - SSD1306 on I2C0, SDA GP4 / SCL GP5, used as a 128x32 panel so the text stays readable

#![no_std]
#![no_main]

use critical_section::RestoreState;
use defmt::{info, trace, Debug2Format};
use embassy_executor::Spawner;
use embassy_rp::{
    gpio::{Input, Level, Output, Pull},
    i2c::{Blocking, Config as ConfigI2c, I2c},
    peripherals::I2C0,
};
use embassy_time::{Delay, Instant};
use embedded_graphics::{pixelcolor::BinaryColor, prelude::*};
use ssd1306::{mode::BufferedGraphicsMode, prelude::*, I2CDisplayInterface, Ssd1306};
use {defmt_rtt as _, panic_probe as _};

use sounder::{
    ButtonPanel, ConsoleConfig, DistanceSampler, GraphicsScreen, Maintenance, Now, OperatorConsole,
    Panel, RangingChannel, RangingConfig,
};

type OledDriver = Ssd1306<
    I2CInterface<I2c<'static, I2C0, Blocking>>,
    DisplaySize128x32,
    BufferedGraphicsMode<DisplaySize128x32>,
>;

struct EmbassyClock;

impl Now for EmbassyClock {
    fn now_nanos(&self) -> i64 {
        Instant::now().as_micros() as i64 * 1_000
    }
}

/// Masks interrupts while the echo is being timed; the timer keeps counting,
/// only its handlers and everything else that could preempt the loop wait.
struct InterruptMask {
    restore: Option<RestoreState>,
    windows: u32,
}

impl InterruptMask {
    fn new() -> Self {
        Self {
            restore: None,
            windows: 0,
        }
    }
}

impl Maintenance for InterruptMask {
    fn suspend(&mut self) {
        if self.restore.is_none() {
            // SAFETY: released in `resume`, which the guard always calls.
            self.restore = Some(unsafe { critical_section::acquire() });
        }
    }

    fn resume(&mut self) {
        if let Some(state) = self.restore.take() {
            // SAFETY: `state` came from the matching `acquire` in `suspend`.
            unsafe { critical_section::release(state) };
        }
    }

    fn collect(&mut self) {
        // Nothing is deferred on this target: interrupts that fired during
        // the window are serviced by `release` itself. This only counts windows.
        self.windows = self.windows.wrapping_add(1);
        trace!("echo window {} closed", self.windows);
    }
}

/// The SSD1306 as seen by the console's screen adapter.
struct Oled(OledDriver);

impl OriginDimensions for Oled {
    fn size(&self) -> Size {
        self.0.bounding_box().size
    }
}

impl DrawTarget for Oled {
    type Color = BinaryColor;
    type Error = <OledDriver as DrawTarget>::Error;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        self.0.draw_iter(pixels)
    }
}

impl Panel for Oled {
    type Error = <OledDriver as DrawTarget>::Error;

    fn set_power(&mut self, on: bool) -> Result<(), Self::Error> {
        self.0.set_display_on(on)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.0.flush()
    }
}

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    info!("Running!");

    let trigger = Output::new(p.PIN_13, Level::Low);
    let echo = Input::new(p.PIN_12, Pull::None);
    let led = Output::new(p.PIN_18, Level::Low);

    // each button reads the companion line, which is held high
    let mode = Input::new(p.PIN_8, Pull::Down);
    let _mode_drive = Output::new(p.PIN_9, Level::High);
    let enter = Input::new(p.PIN_21, Pull::Down);
    let _enter_drive = Output::new(p.PIN_22, Level::High);

    let mut i2c_config = ConfigI2c::default();
    i2c_config.frequency = 400_000;
    let i2c = I2c::new_blocking(p.I2C0, p.PIN_5, p.PIN_4, i2c_config);
    let mut oled = Ssd1306::new(
        I2CDisplayInterface::new(i2c),
        DisplaySize128x32,
        DisplayRotation::Rotate0,
    )
    .into_buffered_graphics_mode();
    if let Err(e) = oled.init() {
        defmt::panic!("display init failed: {:?}", Debug2Format(&e));
    }

    let channel = RangingChannel::new(trigger, echo, RangingConfig::default(), EmbassyClock, Delay);
    let sampler = DistanceSampler::new(channel, InterruptMask::new());
    let console = OperatorConsole::new(
        sampler,
        GraphicsScreen::new(Oled(oled)),
        ButtonPanel::new(mode, enter),
        led,
        EmbassyClock,
        Delay,
        ConsoleConfig::default(),
    );
    let mut console = match console {
        Ok(console) => console,
        Err(e) => defmt::panic!("bad console configuration: {}", e),
    };

    match console.run() {
        Ok(never) => match never {},
        Err(e) => defmt::panic!("console stopped: {}", e),
    }
}
