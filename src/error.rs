use core::fmt;

use embedded_hal::digital::ErrorKind;

/// Everything that can stop a measurement or the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// A trigger, echo, button or indicator pin could not be read or driven.
    Pin(ErrorKind),
    /// The echo line did not complete a pulse within the configured timeout.
    NoEcho,
    /// The display rejected a draw, flush or power command.
    Display,
    /// A configuration value is outside what the hardware or buffers allow.
    Config,
}

impl Error {
    pub(crate) fn pin<E: embedded_hal::digital::Error>(err: E) -> Self {
        Error::Pin(err.kind())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Pin(kind) => write!(f, "pin error: {kind}"),
            Error::NoEcho => f.write_str("no echo from the ranging sensor"),
            Error::Display => f.write_str("display error"),
            Error::Config => f.write_str("invalid configuration"),
        }
    }
}

impl core::error::Error for Error {}
