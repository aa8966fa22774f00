//! Display collaborator.
//!
//! The console only needs a handful of operations from the display, captured by
//! [`Screen`]. [`GraphicsScreen`] implements them on top of any monochrome
//! `embedded-graphics` draw target that can also be powered and flushed, such
//! as a buffered SSD1306.

use embedded_graphics::{
    mono_font::{ascii::FONT_6X10, MonoTextStyle},
    pixelcolor::BinaryColor,
    prelude::*,
    text::{Baseline, Text},
};

use crate::Error;

pub trait Screen {
    fn set_power(&mut self, on: bool) -> Result<(), Error>;

    /// Blank the whole frame buffer.
    fn clear(&mut self) -> Result<(), Error>;

    /// Left-aligned text whose first line's top left corner is at `origin`.
    /// `\n` starts a new line.
    fn text(&mut self, text: &str, origin: Point) -> Result<(), Error>;

    fn set_pixel(&mut self, at: Point) -> Result<(), Error>;

    /// Push the frame buffer to the panel.
    fn flush(&mut self) -> Result<(), Error>;

    /// While enabled every write is followed by a flush.
    fn set_auto_flush(&mut self, enabled: bool);
}

/// Panel control that `DrawTarget` does not cover.
pub trait Panel {
    type Error;

    fn set_power(&mut self, on: bool) -> Result<(), Self::Error>;

    fn flush(&mut self) -> Result<(), Self::Error>;
}

pub struct GraphicsScreen<D> {
    target: D,
    style: MonoTextStyle<'static, BinaryColor>,
    auto_flush: bool,
}

impl<D> GraphicsScreen<D>
where
    D: DrawTarget<Color = BinaryColor> + Panel,
{
    /// Wrap a draw target, with FONT_6X10 text and auto-flush on.
    pub fn new(target: D) -> Self {
        Self {
            target,
            style: MonoTextStyle::new(&FONT_6X10, BinaryColor::On),
            auto_flush: true,
        }
    }

    pub fn inner(&self) -> &D {
        &self.target
    }

    fn written(&mut self) -> Result<(), Error> {
        if self.auto_flush {
            Panel::flush(&mut self.target).map_err(|_| Error::Display)
        } else {
            Ok(())
        }
    }
}

impl<D> Screen for GraphicsScreen<D>
where
    D: DrawTarget<Color = BinaryColor> + Panel,
{
    fn set_power(&mut self, on: bool) -> Result<(), Error> {
        Panel::set_power(&mut self.target, on).map_err(|_| Error::Display)
    }

    fn clear(&mut self) -> Result<(), Error> {
        self.target
            .clear(BinaryColor::Off)
            .map_err(|_| Error::Display)?;
        self.written()
    }

    fn text(&mut self, text: &str, origin: Point) -> Result<(), Error> {
        Text::with_baseline(text, origin, self.style, Baseline::Top)
            .draw(&mut self.target)
            .map_err(|_| Error::Display)?;
        self.written()
    }

    fn set_pixel(&mut self, at: Point) -> Result<(), Error> {
        Pixel(at, BinaryColor::On)
            .draw(&mut self.target)
            .map_err(|_| Error::Display)?;
        self.written()
    }

    fn flush(&mut self) -> Result<(), Error> {
        Panel::flush(&mut self.target).map_err(|_| Error::Display)
    }

    fn set_auto_flush(&mut self, enabled: bool) {
        self.auto_flush = enabled;
    }
}
