use embedded_hal::digital::InputPin;

use crate::Error;

/// Levels of both buttons in one poll. `true` means pressed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonState {
    pub mode: bool,
    pub enter: bool,
}

/// A button going from released to pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Press {
    Mode,
    Enter,
}

impl ButtonState {
    /// The press between `previous` and `self`, if any. Holding a button does
    /// not repeat. Mode takes priority whenever it reads pressed, so enter
    /// only counts while mode is released.
    pub fn press_since(self, previous: ButtonState) -> Option<Press> {
        if self.mode {
            (!previous.mode).then_some(Press::Mode)
        } else if self.enter && !previous.enter {
            Some(Press::Enter)
        } else {
            None
        }
    }
}

/// The "mode" and "enter" inputs. Debouncing is left to the wiring; the panel
/// only remembers the previous levels to spot new presses.
pub struct ButtonPanel<MODEPIN, ENTERPIN> {
    mode: MODEPIN,
    enter: ENTERPIN,
    last: ButtonState,
}

impl<MODEPIN, ENTERPIN> ButtonPanel<MODEPIN, ENTERPIN>
where
    MODEPIN: InputPin,
    ENTERPIN: InputPin,
{
    pub fn new(mode: MODEPIN, enter: ENTERPIN) -> Self {
        Self {
            mode,
            enter,
            last: ButtonState::default(),
        }
    }

    /// Current levels, without edge tracking.
    pub fn read(&mut self) -> Result<ButtonState, Error> {
        Ok(ButtonState {
            mode: self.mode.is_high().map_err(Error::pin)?,
            enter: self.enter.is_high().map_err(Error::pin)?,
        })
    }

    /// Read both buttons and report a new press.
    pub fn poll(&mut self) -> Result<Option<Press>, Error> {
        let now = self.read()?;
        let press = now.press_since(self.last);
        self.last = now;
        Ok(press)
    }
}
