#![allow(missing_docs)]
use bilge::prelude::*;

use crate::{InvalidSetting, TimingSettings};

/// Temperature resolution of the result, offset and limit registers.
pub(crate) const CELSIUS_PER_BIT: f32 = 7.8125e-3;

pub(crate) fn to_celsius(t: i16) -> f32 {
    f32::from(t) * CELSIUS_PER_BIT
}

/// Rounds toward negative infinity. Values outside the register range
/// saturate.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn to_raw(t: f32) -> i16 {
    let steps = t / CELSIUS_PER_BIT;
    let raw = steps as i16;
    if f32::from(raw) > steps {
        raw.saturating_sub(1)
    } else {
        raw
    }
}

/// Register addresses
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub enum Register {
    /// Temperature result register address.
    Temperature,

    /// Configuration register address.
    Configuration,

    /// Temperature high limit register address.
    HighLimit,

    /// Temperature low limit register address.
    LowLimit,

    /// First general purpose EEPROM word, first half of the NIST ID.
    Eeprom1,

    /// Temperature offset register address.
    TemperatureOffset,

    /// Third general purpose EEPROM word, second half of the NIST ID.
    Eeprom3,

    /// Device ID register address.
    DeviceId,
}

impl From<Register> for u8 {
    fn from(reg: Register) -> Self {
        match reg {
            Register::Temperature => 0x00,
            Register::Configuration => 0x01,
            Register::HighLimit => 0x02,
            Register::LowLimit => 0x03,
            Register::Eeprom1 => 0x05,
            Register::TemperatureOffset => 0x07,
            Register::Eeprom3 => 0x08,
            Register::DeviceId => 0x0f,
        }
    }
}

/// Configuration register.
#[bitsize(16)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, DebugBits, FromBits, PartialEq)]
pub struct Configuration {
    /// Software reset. Always reads back 0.
    pub soft_reset: bool,

    reserved1: bool,

    /// ALERT pin function select
    pub dr_alert: AlertPinSelect,

    /// ALERT pin polarity
    pub polarity: Polarity,

    /// Therm/alert mode select (T/nA)
    pub therm_no_alert: AlertMode,

    /// Conversion averaging mode
    pub average: Average,

    /// Conversion cycle
    pub conversion_cycle: ConversionCycle,

    /// Conversion mode
    pub conversion_mode: ConversionMode,

    /// EEPROM busy flag (read-only)
    pub eeprom_busy: bool,

    /// Data ready flag (read-only). Cleared whenever the temperature or
    /// configuration register is read.
    pub data_ready: bool,

    /// Low alert flag (read-only)
    pub low_alert: bool,

    /// High alert flag (read-only)
    pub high_alert: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self::from(0b0000_0010_0010_0000)
    }
}

impl Configuration {
    /// Bits 2 to 11. Reset, reserved and status bits are never written.
    const WRITABLE: u16 = 0x0ffc;
    const STATUS: u16 = 0xf000;

    /// Decode a raw register word. Every 16-bit value decodes.
    #[must_use]
    pub fn decode(raw: u16) -> Self {
        Self::from(raw)
    }

    /// Encode the writable fields into a register word. Read-only status
    /// bits and the reset bit are always 0.
    #[must_use]
    pub fn encode(&self) -> u16 {
        u16::from(*self) & Self::WRITABLE
    }

    /// Writable fields of `self` combined with the status bits of `status`.
    #[must_use]
    pub(crate) fn with_status_of(self, status: Self) -> Self {
        Self::decode(self.encode() | (u16::from(status) & Self::STATUS))
    }

    /// Status and alert flags.
    #[must_use]
    pub fn flags(&self) -> Flags {
        Flags {
            eeprom_busy: self.eeprom_busy(),
            data_ready: self.data_ready(),
            low_alert: self.low_alert(),
            high_alert: self.high_alert(),
        }
    }

    /// Fields that determine the conversion cycle time.
    #[must_use]
    pub fn timing(&self) -> TimingSettings {
        TimingSettings::new(self.conversion_mode(), self.conversion_cycle(), self.average())
    }

    /// Configure conversion mode, conversion cycle and averaging at once.
    #[must_use]
    pub fn with_timing(self, timing: TimingSettings) -> Self {
        self.with_conversion_mode(timing.mode)
            .with_conversion_cycle(timing.cycle)
            .with_average(timing.average)
    }

    /// Configure conversion mode.
    #[must_use]
    pub fn with_conversion_mode(mut self, mode: ConversionMode) -> Self {
        self.set_conversion_mode(mode);
        self
    }

    /// Configure conversion cycle.
    #[must_use]
    pub fn with_conversion_cycle(mut self, cycle: ConversionCycle) -> Self {
        self.set_conversion_cycle(cycle);
        self
    }

    /// Configure averaging.
    #[must_use]
    pub fn with_average(mut self, average: Average) -> Self {
        self.set_average(average);
        self
    }

    /// Configure therm/alert mode.
    #[must_use]
    pub fn with_therm_no_alert(mut self, mode: AlertMode) -> Self {
        self.set_therm_no_alert(mode);
        self
    }

    /// Configure alert polarity.
    #[must_use]
    pub fn with_polarity(mut self, polarity: Polarity) -> Self {
        self.set_polarity(polarity);
        self
    }

    /// Configure ALERT pin function.
    #[must_use]
    pub fn with_dr_alert(mut self, select: AlertPinSelect) -> Self {
        self.set_dr_alert(select);
        self
    }
}

/// Status and alert flags of the configuration register.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Flags {
    pub eeprom_busy: bool,
    pub data_ready: bool,
    pub low_alert: bool,
    pub high_alert: bool,
}

/// Conversion mode.
#[bitsize(2)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, FromBits, PartialEq, PartialOrd)]
pub enum ConversionMode {
    /// Continuous conversion. A conversion is followed by the standby time
    /// selected by the conversion cycle bits, then the next one starts.
    Continuous,

    /// Shutdown all device circuitry other than the serial interface.
    Shutdown,

    /// Alternate encoding of continuous conversion.
    ContinuousAlt,

    /// One-shot conversion. The device performs a single conversion, then
    /// goes back to shutdown.
    OneShot,
}

impl ConversionMode {
    /// Either of the two continuous conversion encodings.
    #[must_use]
    pub fn is_continuous(self) -> bool {
        matches!(self, Self::Continuous | Self::ContinuousAlt)
    }
}

impl TryFrom<u8> for ConversionMode {
    type Error = InvalidSetting;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Continuous),
            1 => Ok(Self::Shutdown),
            2 => Ok(Self::ContinuousAlt),
            3 => Ok(Self::OneShot),
            _ => Err(InvalidSetting::ConversionMode(value)),
        }
    }
}

/// Conversion cycle selector. Named after the cycle time without averaging;
/// the effective time depends on [`Average`], see [`TimingSettings`].
///
/// | CONV | AVG = 00 | AVG = 01 | AVG = 10 | AVG = 11 |
/// |------|----------|----------|----------|----------|
/// | 000  | 16 ms    | 125 ms   | 0 ms     | 500 ms   |
/// | 001  | 125 ms   | 125 ms   | 0 ms     | 500 ms   |
/// | 010  | 250 ms   | 250 ms   | 0 ms     | 500 ms   |
/// | 011  | 500 ms   | 500 ms   | 0 ms     | 500 ms   |
/// | 100  | 1 s      | 1 s      | 1 s      | 1 s      |
/// | 101  | 4 s      | 4 s      | 4 s      | 4 s      |
/// | 110  | 8 s      | 8 s      | 8 s      | 8 s      |
/// | 111  | 16 s     | 16 s     | 16 s     | 16 s     |
#[bitsize(3)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, FromBits, PartialEq, PartialOrd)]
pub enum ConversionCycle {
    Ms16,
    Ms125,
    Ms250,
    Ms500,
    Ms1000,
    Ms4000,
    Ms8000,
    Ms16000,
}

impl TryFrom<u8> for ConversionCycle {
    type Error = InvalidSetting;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Ms16),
            1 => Ok(Self::Ms125),
            2 => Ok(Self::Ms250),
            3 => Ok(Self::Ms500),
            4 => Ok(Self::Ms1000),
            5 => Ok(Self::Ms4000),
            6 => Ok(Self::Ms8000),
            7 => Ok(Self::Ms16000),
            _ => Err(InvalidSetting::ConversionCycle(value)),
        }
    }
}

/// Conversion averaging mode. The average is accumulated, not running.
#[bitsize(2)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, FromBits, PartialEq, PartialOrd)]
pub enum Average {
    /// No averaging
    NoAverage,

    /// 8 averaged conversions
    Avg8,

    /// 32 averaged conversions
    Avg32,

    /// 64 averaged conversions
    Avg64,
}

impl TryFrom<u8> for Average {
    type Error = InvalidSetting;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::NoAverage),
            1 => Ok(Self::Avg8),
            2 => Ok(Self::Avg32),
            3 => Ok(Self::Avg64),
            _ => Err(InvalidSetting::Average(value)),
        }
    }
}

/// Therm/alert mode select.
#[bitsize(1)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, FromBits, PartialEq, PartialOrd)]
pub enum AlertMode {
    /// Alert mode (default).
    Alert,

    /// Therm mode.
    Therm,
}

/// ALERT pin select.
#[bitsize(1)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, FromBits, PartialEq, PartialOrd)]
pub enum AlertPinSelect {
    /// ALERT pin reflects the alert flags (default).
    Alert,

    /// ALERT pin reflects the data ready flag.
    DataReady,
}

/// Polarity
#[bitsize(1)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, FromBits, PartialEq, PartialOrd)]
pub enum Polarity {
    /// Active low (default).
    ActiveLow,

    /// Active high.
    ActiveHigh,
}

/// Device ID register.
#[bitsize(16)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, DebugBits, FromBits, PartialEq)]
pub struct DeviceId {
    /// Device ID, `0x117` for a TMP117.
    pub device_id: u12,

    /// Revision number.
    pub revision: u4,
}

impl DeviceId {
    const TMP117: u16 = 0x117;

    /// Whether the device identifies as a TMP117.
    #[must_use]
    pub fn is_tmp117(&self) -> bool {
        self.device_id().value() == Self::TMP117
    }
}

/// The two factory-programmed EEPROM words that identify a device for NIST
/// traceability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NistId {
    /// Content of register `0x05`.
    pub word0: u16,

    /// Content of register `0x08`.
    pub word1: u16,
}
