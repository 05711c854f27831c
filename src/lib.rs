//! This is a platform-agnostic Rust driver for the TMP117 temperature sensor
//! based on the [`embedded-hal`] traits.
//!
//! [`embedded-hal`]: https://docs.rs/embedded-hal
//!
//! For further details of the device architecture and operation, please refer
//! to the official [`Datasheet`].
//!
//! [`Datasheet`]: https://www.ti.com/lit/gpn/tmp117

#![doc(html_root_url = "https://docs.rs/tmp117/latest")]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(test), no_std)]

#[cfg(feature = "embedded-sensors-hal")]
use embedded_sensors_hal::sensor;
#[cfg(all(feature = "embedded-sensors-hal-async", not(feature = "embedded-sensors-hal")))]
use embedded_sensors_hal_async::sensor;

#[cfg(all(feature = "defmt", feature = "log"))]
compile_error!("Features \"defmt\" and \"log\" are mutually exclusive and cannot be enabled together");

mod fmt;

mod registers;
pub use registers::*;

pub mod timing;
pub use timing::TimingSettings;

#[cfg(feature = "async")]
pub mod asynchronous;

pub mod blocking;

/// A0 pin logic level representation.
#[derive(Debug)]
pub enum A0 {
    /// A0 tied to GND (default).
    Gnd,
    /// A0 tied to V+.
    Vplus,
    /// A0 tied to SDA.
    Sda,
    /// A0 tied to SCL.
    Scl,
}

impl Default for A0 {
    fn default() -> Self {
        Self::Gnd
    }
}

impl From<A0> for u8 {
    fn from(connection: A0) -> Self {
        match connection {
            A0::Gnd => 0b100_1000,
            A0::Vplus => 0b100_1001,
            A0::Sda => 0b100_1010,
            A0::Scl => 0b100_1011,
        }
    }
}

/// A configuration field value outside the range the device accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InvalidSetting {
    /// Conversion mode must be within `0..=3`.
    ConversionMode(u8),
    /// Conversion cycle must be within `0..=7`.
    ConversionCycle(u8),
    /// Averaging mode must be within `0..=3`.
    Average(u8),
}

/// Tmp117 Errors
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// I2C Bus Error
    Bus(E),
    /// Invalid Input Error. Raised before any bus transaction takes place.
    InvalidInput(InvalidSetting),
}

impl<E> From<InvalidSetting> for Error<E> {
    fn from(setting: InvalidSetting) -> Self {
        Self::InvalidInput(setting)
    }
}

// The async crate re-exports the blocking `sensor::Error` trait, so this is
// the one impl for both drivers.
#[cfg(any(feature = "embedded-sensors-hal", feature = "embedded-sensors-hal-async"))]
impl<E: embedded_hal::i2c::Error> sensor::Error for Error<E> {
    fn kind(&self) -> sensor::ErrorKind {
        match *self {
            Self::Bus(_) => sensor::ErrorKind::Peripheral,
            Self::InvalidInput(_) => sensor::ErrorKind::InvalidInput,
        }
    }
}

/// How a sample sequence keeps conversions coming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Sampling {
    /// The device free-runs in continuous conversion mode.
    Continuous,

    /// A new one-shot conversion is triggered after every sample is read.
    /// The device powers down between conversions.
    OneShot,
}

#[cfg(all(test, any(feature = "embedded-sensors-hal", feature = "embedded-sensors-hal-async")))]
mod tests {
    use embedded_hal::i2c::ErrorKind;

    use super::sensor::{self, Error as _};
    use super::*;

    #[test]
    fn sensor_error_kind() {
        let bus: Error<ErrorKind> = Error::Bus(ErrorKind::Other);
        assert_eq!(bus.kind(), sensor::ErrorKind::Peripheral);

        let invalid: Error<ErrorKind> = InvalidSetting::Average(4).into();
        assert_eq!(invalid.kind(), sensor::ErrorKind::InvalidInput);
    }
}
