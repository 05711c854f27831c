//! Tmp117 Blocking API
use core::ops::{Deref, DerefMut};

#[cfg(feature = "embedded-sensors-hal")]
use embedded_sensors_hal::sensor;
#[cfg(feature = "embedded-sensors-hal")]
use embedded_sensors_hal::temperature::{DegreesCelsius, TemperatureSensor};

use super::registers::{to_celsius, to_raw};
use super::{
    Average, Configuration, ConversionCycle, ConversionMode, DeviceId, Error, Flags, NistId, Register, Sampling,
    TimingSettings, A0,
};

/// TMP117 blocking device driver
pub struct Tmp117<I2C: embedded_hal::i2c::I2c, DELAY: embedded_hal::delay::DelayNs> {
    /// The concrete I2C bus implementation
    i2c: I2C,

    /// The concrete [`embedded_hal::delay::DelayNs`] implementation
    delay: DELAY,

    /// The I2C address.
    pub(crate) addr: u8,

    /// A local cache of the sensor configuration. Holds the writable fields
    /// of the last write or read and the status flags of the last read.
    config: Configuration,
}

impl<I2C: embedded_hal::i2c::I2c, DELAY: embedded_hal::delay::DelayNs> Tmp117<I2C, DELAY> {
    const SOFT_RESET: u16 = 0x0001;

    /// Create a new TMP117 instance. No bus transaction takes place; the
    /// configuration cache starts at the power-on default.
    pub fn new_blocking(i2c: I2C, delay: DELAY, a0: A0) -> Self {
        Self {
            i2c,
            delay,
            addr: a0.into(),
            config: Configuration::default(),
        }
    }

    /// Create a new TMP117 instance with A0 tied to GND, resulting in an
    /// instance responding to address `0x48`.
    pub fn new_blocking_with_a0_gnd(i2c: I2C, delay: DELAY) -> Self {
        Self::new_blocking(i2c, delay, A0::Gnd)
    }

    /// Create a new TMP117 instance with A0 tied to V+, resulting in an
    /// instance responding to address `0x49`.
    pub fn new_blocking_with_a0_vplus(i2c: I2C, delay: DELAY) -> Self {
        Self::new_blocking(i2c, delay, A0::Vplus)
    }

    /// Create a new TMP117 instance with A0 tied to SDA, resulting in an
    /// instance responding to address `0x4a`.
    pub fn new_blocking_with_a0_sda(i2c: I2C, delay: DELAY) -> Self {
        Self::new_blocking(i2c, delay, A0::Sda)
    }

    /// Create a new TMP117 instance with A0 tied to SCL, resulting in an
    /// instance responding to address `0x4b`.
    pub fn new_blocking_with_a0_scl(i2c: I2C, delay: DELAY) -> Self {
        Self::new_blocking(i2c, delay, A0::Scl)
    }

    /// Create a new TMP117 instance and push `config` to the device.
    ///
    /// # Errors
    ///
    /// `I2C::Error` when the I2C transaction fails
    pub fn new_blocking_configured(i2c: I2C, delay: DELAY, a0: A0, config: Configuration) -> Result<Self, I2C::Error> {
        let mut tmp117 = Self::new_blocking(i2c, delay, a0);
        tmp117.set_configuration(config)?;
        Ok(tmp117)
    }

    /// Create a new TMP117 instance and pull its configuration from the
    /// device.
    ///
    /// # Errors
    ///
    /// `I2C::Error` when the I2C transaction fails
    pub fn new_blocking_from_device(i2c: I2C, delay: DELAY, a0: A0) -> Result<Self, I2C::Error> {
        let mut tmp117 = Self::new_blocking(i2c, delay, a0);
        tmp117.configuration()?;
        Ok(tmp117)
    }

    /// Destroy the driver instance, return the I2C bus instance.
    pub fn destroy(self) -> I2C {
        self.i2c
    }

    /// Read configuration register and refresh the local cache.
    ///
    /// Reading clears the data ready and alert flags on the device.
    ///
    /// # Errors
    ///
    /// `I2C::Error` when the I2C transaction fails
    pub fn configuration(&mut self) -> Result<Configuration, I2C::Error> {
        let data = self.read(Register::Configuration)?;
        self.config = Configuration::decode(u16::from_be_bytes(data));
        Ok(self.config)
    }

    /// The configuration as of the last read or write. May be stale.
    pub fn cached_configuration(&self) -> Configuration {
        self.config
    }

    /// Set configuration register. Status bits are never written.
    ///
    /// # Errors
    ///
    /// `I2C::Error` when the I2C transaction fails
    pub fn set_configuration(&mut self, config: Configuration) -> Result<(), I2C::Error> {
        self.write(Register::Configuration, config.encode().to_be_bytes())?;

        // Only cache config after successful write
        self.config = config.with_status_of(self.config);
        Ok(())
    }

    /// Set conversion mode, conversion cycle and averaging, keeping the
    /// cached alert settings.
    ///
    /// # Errors
    ///
    /// `I2C::Error` when the I2C transaction fails
    pub fn set_timing(&mut self, timing: TimingSettings) -> Result<(), I2C::Error> {
        debug!("tmp117: mode {} cycle {} average {}", timing.mode as u8, timing.cycle as u8, timing.average as u8);
        self.set_configuration(self.config.with_timing(timing))
    }

    /// Timing fields of the cached configuration.
    pub fn timing(&self) -> TimingSettings {
        self.config.timing()
    }

    /// Conversion cycle time in milliseconds for the cached configuration.
    /// Wait at least this long between triggering a conversion and reading
    /// its result.
    pub fn conversion_time_ms(&self) -> u32 {
        self.config.timing().conversion_time_ms()
    }

    /// Start one-shot or continuous conversions with the given conversion
    /// cycle (`0..=7`) and averaging (`0..=3`). With `refresh`, the
    /// configuration is read back right after the write.
    ///
    /// Continuous conversions are written as mode `0b10`
    /// ([`ConversionMode::ContinuousAlt`]), which the device treats the same
    /// as `0b00`.
    ///
    /// # Errors
    ///
    /// `Error::InvalidInput` before any bus transaction when `cycle` or
    /// `average` is out of range, `Error::Bus` when the I2C transaction fails
    pub fn start_measurement(
        &mut self,
        single_shot: bool,
        cycle: u8,
        average: u8,
        refresh: bool,
    ) -> Result<(), Error<I2C::Error>> {
        let mode = if single_shot {
            ConversionMode::OneShot
        } else {
            ConversionMode::ContinuousAlt
        };
        let timing = TimingSettings::new(mode, ConversionCycle::try_from(cycle)?, Average::try_from(average)?);

        self.set_timing(timing).map_err(Error::Bus)?;
        if refresh {
            self.configuration().map_err(Error::Bus)?;
        }
        Ok(())
    }

    /// Read temperature register. The data ready flag is not checked; see
    /// [`Self::data_ready`].
    ///
    /// # Errors
    ///
    /// `I2C::Error` when the I2C transaction fails
    pub fn temperature(&mut self) -> Result<f32, I2C::Error> {
        let raw = self.read(Register::Temperature)?;
        Ok(to_celsius(i16::from_be_bytes(raw)))
    }

    /// Wait for conversion to complete. This method will block for the amount
    /// of time dictated by the conversion mode, conversion cycle and
    /// averaging bits in the [`Configuration`] register.
    ///
    /// # Errors
    ///
    /// `I2C::Error` when the I2C transaction fails
    pub fn wait_for_temperature(&mut self) -> Result<f32, I2C::Error> {
        let config = self.configuration()?;
        self.delay.delay_ms(config.timing().conversion_time_ms());
        self.temperature()
    }

    /// Read status and alert flags. Reading clears them on the device.
    ///
    /// # Errors
    ///
    /// `I2C::Error` when the I2C transaction fails
    pub fn flags(&mut self) -> Result<Flags, I2C::Error> {
        Ok(self.configuration()?.flags())
    }

    /// Whether a conversion result is ready. Reading clears the flag.
    ///
    /// # Errors
    ///
    /// `I2C::Error` when the I2C transaction fails
    pub fn data_ready(&mut self) -> Result<bool, I2C::Error> {
        Ok(self.flags()?.data_ready)
    }

    /// Read temperature offset register
    ///
    /// # Errors
    ///
    /// `I2C::Error` when the I2C transaction fails
    pub fn temperature_offset(&mut self) -> Result<f32, I2C::Error> {
        let raw = self.read(Register::TemperatureOffset)?;
        Ok(to_celsius(i16::from_be_bytes(raw)))
    }

    /// Set temperature offset register. The offset is not range checked.
    ///
    /// # Errors
    ///
    /// `I2C::Error` when the I2C transaction fails
    pub fn set_temperature_offset(&mut self, offset: f32) -> Result<(), I2C::Error> {
        let raw = to_raw(offset);
        self.write(Register::TemperatureOffset, raw.to_be_bytes())
    }

    /// Read temperature low limit register
    ///
    /// # Errors
    ///
    /// `I2C::Error` when the I2C transaction fails
    pub fn low_limit(&mut self) -> Result<f32, I2C::Error> {
        let raw = self.read(Register::LowLimit)?;
        Ok(to_celsius(i16::from_be_bytes(raw)))
    }

    /// Set temperature low limit register
    ///
    /// # Errors
    ///
    /// `I2C::Error` when the I2C transaction fails
    pub fn set_low_limit(&mut self, limit: f32) -> Result<(), I2C::Error> {
        let raw = to_raw(limit);
        self.write(Register::LowLimit, raw.to_be_bytes())
    }

    /// Read temperature high limit register
    ///
    /// # Errors
    ///
    /// `I2C::Error` when the I2C transaction fails
    pub fn high_limit(&mut self) -> Result<f32, I2C::Error> {
        let raw = self.read(Register::HighLimit)?;
        Ok(to_celsius(i16::from_be_bytes(raw)))
    }

    /// Set temperature high limit register
    ///
    /// # Errors
    ///
    /// `I2C::Error` when the I2C transaction fails
    pub fn set_high_limit(&mut self, limit: f32) -> Result<(), I2C::Error> {
        let raw = to_raw(limit);
        self.write(Register::HighLimit, raw.to_be_bytes())
    }

    /// Read device ID register
    ///
    /// # Errors
    ///
    /// `I2C::Error` when the I2C transaction fails
    pub fn device_id(&mut self) -> Result<DeviceId, I2C::Error> {
        let raw = self.read(Register::DeviceId)?;
        Ok(DeviceId::from(u16::from_be_bytes(raw)))
    }

    /// Read the NIST traceability ID
    ///
    /// # Errors
    ///
    /// `I2C::Error` when the I2C transaction fails
    pub fn nist_id(&mut self) -> Result<NistId, I2C::Error> {
        let word0 = u16::from_be_bytes(self.read(Register::Eeprom1)?);
        let word1 = u16::from_be_bytes(self.read(Register::Eeprom3)?);
        Ok(NistId { word0, word1 })
    }

    /// Trigger a software reset. The device resets asynchronously and the
    /// configuration cache is left as is until the next read.
    ///
    /// # Errors
    ///
    /// `I2C::Error` when the I2C transaction fails
    pub fn soft_reset(&mut self) -> Result<(), I2C::Error> {
        let data = self.read(Register::Configuration)?;
        let value = u16::from_be_bytes(data) | Self::SOFT_RESET;
        debug!("tmp117: soft reset");
        self.write(Register::Configuration, value.to_be_bytes())
    }

    /// Whether the device is in one-shot mode, after a fresh read.
    ///
    /// # Errors
    ///
    /// `I2C::Error` when the I2C transaction fails
    pub fn is_one_shot_mode(&mut self) -> Result<bool, I2C::Error> {
        Ok(self.configuration()?.conversion_mode() == ConversionMode::OneShot)
    }

    /// Whether the device is in continuous mode, after a fresh read.
    ///
    /// # Errors
    ///
    /// `I2C::Error` when the I2C transaction fails
    pub fn is_continuous_mode(&mut self) -> Result<bool, I2C::Error> {
        Ok(self.configuration()?.conversion_mode().is_continuous())
    }

    /// Place device in Shutdown mode
    ///
    /// # Errors
    ///
    /// `I2C::Error` when the I2C transaction fails
    pub fn shutdown(&mut self) -> Result<(), I2C::Error> {
        self.set_mode(ConversionMode::Shutdown)
    }

    /// Run `f` with the device configured for `timing`, then place the device
    /// in shutdown mode whether `f` succeeded, failed or panicked.
    ///
    /// # Errors
    ///
    /// The error of `f` if it failed, otherwise `Error::Bus` when an I2C
    /// transaction fails
    pub fn session<T, F>(&mut self, timing: TimingSettings, f: F) -> Result<T, Error<I2C::Error>>
    where
        F: FnOnce(&mut Session<'_, I2C, DELAY>) -> Result<T, Error<I2C::Error>>,
    {
        debug!("tmp117: session start");
        let mut session = Session {
            tmp117: self,
            active: true,
        };
        session.set_timing(timing).map_err(Error::Bus)?;

        let result = f(&mut session);
        let shutdown = session.close();
        debug!("tmp117: session end");

        let value = result?;
        shutdown.map_err(Error::Bus)?;
        Ok(value)
    }

    /// Arm the device for `sampling` and return an endless sequence of
    /// samples. The caller waits [`Self::conversion_time_ms`] between
    /// samples.
    ///
    /// # Errors
    ///
    /// `I2C::Error` when the I2C transaction fails
    pub fn samples(&mut self, sampling: Sampling) -> Result<Samples<'_, I2C, DELAY>, I2C::Error> {
        self.arm(sampling)?;
        Ok(Samples { tmp117: self, sampling })
    }

    fn arm(&mut self, sampling: Sampling) -> Result<(), I2C::Error> {
        match sampling {
            Sampling::Continuous => self.set_mode(ConversionMode::ContinuousAlt),
            Sampling::OneShot => self.set_mode(ConversionMode::OneShot),
        }
    }

    fn set_mode(&mut self, mode: ConversionMode) -> Result<(), I2C::Error> {
        debug!("tmp117: conversion mode {}", mode as u8);
        self.set_configuration(self.config.with_conversion_mode(mode))
    }

    fn read(&mut self, reg: Register) -> Result<[u8; 2], I2C::Error> {
        let mut bytes = [0; 2];
        let addr: u8 = reg.into();
        self.i2c.write_read(self.addr, &[addr], &mut bytes)?;
        trace!("tmp117: read {:#x} -> {:#x}", addr, u16::from_be_bytes(bytes));
        Ok(bytes)
    }

    fn write(&mut self, reg: Register, value: [u8; 2]) -> Result<(), I2C::Error> {
        let mut data = [0; 3];

        data[0] = reg.into();
        data[1..].copy_from_slice(&value);

        trace!("tmp117: write {:#x} <- {:#x}", data[0], u16::from_be_bytes(value));
        self.i2c.write(self.addr, &data)
    }
}

/// The driver borrowed by [`Tmp117::session`]. Dropping it, also while
/// unwinding, writes shutdown mode and ignores a failure to do so.
pub struct Session<'a, I2C: embedded_hal::i2c::I2c, DELAY: embedded_hal::delay::DelayNs> {
    tmp117: &'a mut Tmp117<I2C, DELAY>,
    active: bool,
}

impl<I2C: embedded_hal::i2c::I2c, DELAY: embedded_hal::delay::DelayNs> Session<'_, I2C, DELAY> {
    fn close(mut self) -> Result<(), I2C::Error> {
        self.active = false;
        self.tmp117.shutdown()
    }
}

impl<I2C: embedded_hal::i2c::I2c, DELAY: embedded_hal::delay::DelayNs> Deref for Session<'_, I2C, DELAY> {
    type Target = Tmp117<I2C, DELAY>;

    fn deref(&self) -> &Self::Target {
        &*self.tmp117
    }
}

impl<I2C: embedded_hal::i2c::I2c, DELAY: embedded_hal::delay::DelayNs> DerefMut for Session<'_, I2C, DELAY> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.tmp117
    }
}

impl<I2C: embedded_hal::i2c::I2c, DELAY: embedded_hal::delay::DelayNs> Drop for Session<'_, I2C, DELAY> {
    fn drop(&mut self) {
        if self.active {
            let _ = self.tmp117.shutdown();
        }
    }
}

/// Endless sequence of temperature samples, see [`Tmp117::samples`].
pub struct Samples<'a, I2C: embedded_hal::i2c::I2c, DELAY: embedded_hal::delay::DelayNs> {
    tmp117: &'a mut Tmp117<I2C, DELAY>,
    sampling: Sampling,
}

impl<I2C: embedded_hal::i2c::I2c, DELAY: embedded_hal::delay::DelayNs> Samples<'_, I2C, DELAY> {
    /// Time to wait before pulling the next sample.
    pub fn conversion_time_ms(&self) -> u32 {
        self.tmp117.conversion_time_ms()
    }
}

impl<I2C: embedded_hal::i2c::I2c, DELAY: embedded_hal::delay::DelayNs> Iterator for Samples<'_, I2C, DELAY> {
    type Item = Result<f32, I2C::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let temperature = match self.tmp117.temperature() {
            Ok(t) => t,
            Err(e) => return Some(Err(e)),
        };

        if self.sampling == Sampling::OneShot {
            if let Err(e) = self.tmp117.arm(Sampling::OneShot) {
                return Some(Err(e));
            }
        }

        Some(Ok(temperature))
    }
}

#[cfg(feature = "embedded-sensors-hal")]
impl<I2C: embedded_hal::i2c::I2c, DELAY: embedded_hal::delay::DelayNs> sensor::ErrorType for Tmp117<I2C, DELAY> {
    type Error = Error<I2C::Error>;
}

#[cfg(feature = "embedded-sensors-hal")]
impl<I2C: embedded_hal::i2c::I2c, DELAY: embedded_hal::delay::DelayNs> TemperatureSensor for Tmp117<I2C, DELAY> {
    fn temperature(&mut self) -> Result<DegreesCelsius, Self::Error> {
        self.temperature().map_err(Error::Bus)
    }
}
