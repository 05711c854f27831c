//! Tmp117 Async API
use core::ops::AsyncFnOnce;

#[cfg(feature = "embedded-sensors-hal-async")]
use embedded_sensors_hal_async::sensor;
#[cfg(feature = "embedded-sensors-hal-async")]
use embedded_sensors_hal_async::temperature::{DegreesCelsius, TemperatureSensor};

use super::registers::{to_celsius, to_raw};
use super::{
    Average, Configuration, ConversionCycle, ConversionMode, DeviceId, Error, Flags, NistId, Register, Sampling,
    TimingSettings, A0,
};

/// TMP117 asynchronous device driver
pub struct Tmp117<I2C: embedded_hal_async::i2c::I2c, DELAY: embedded_hal_async::delay::DelayNs> {
    /// The concrete I2C bus implementation
    i2c: I2C,

    /// The concrete [`embedded_hal_async::delay::DelayNs`] implementation
    delay: DELAY,

    /// The I2C address.
    pub(crate) addr: u8,

    /// A local cache of the sensor configuration.
    config: Configuration,
}

impl<I2C: embedded_hal_async::i2c::I2c, DELAY: embedded_hal_async::delay::DelayNs> Tmp117<I2C, DELAY> {
    const SOFT_RESET: u16 = 0x0001;

    /// Create a new TMP117 instance. No bus transaction takes place.
    pub fn new_async(i2c: I2C, delay: DELAY, a0: A0) -> Self {
        Self {
            i2c,
            delay,
            addr: a0.into(),
            config: Configuration::default(),
        }
    }

    /// Create a new TMP117 instance with A0 tied to GND, resulting in an
    /// instance responding to address `0x48`.
    pub fn new_async_with_a0_gnd(i2c: I2C, delay: DELAY) -> Self {
        Self::new_async(i2c, delay, A0::Gnd)
    }

    /// Create a new TMP117 instance with A0 tied to V+, resulting in an
    /// instance responding to address `0x49`.
    pub fn new_async_with_a0_vplus(i2c: I2C, delay: DELAY) -> Self {
        Self::new_async(i2c, delay, A0::Vplus)
    }

    /// Create a new TMP117 instance with A0 tied to SDA, resulting in an
    /// instance responding to address `0x4a`.
    pub fn new_async_with_a0_sda(i2c: I2C, delay: DELAY) -> Self {
        Self::new_async(i2c, delay, A0::Sda)
    }

    /// Create a new TMP117 instance with A0 tied to SCL, resulting in an
    /// instance responding to address `0x4b`.
    pub fn new_async_with_a0_scl(i2c: I2C, delay: DELAY) -> Self {
        Self::new_async(i2c, delay, A0::Scl)
    }

    /// Create a new TMP117 instance and push `config` to the device.
    ///
    /// # Errors
    ///
    /// `I2C::Error` when the I2C transaction fails
    pub async fn new_async_configured(i2c: I2C, delay: DELAY, a0: A0, config: Configuration) -> Result<Self, I2C::Error> {
        let mut tmp117 = Self::new_async(i2c, delay, a0);
        tmp117.set_configuration(config).await?;
        Ok(tmp117)
    }

    /// Create a new TMP117 instance and pull its configuration from the
    /// device.
    ///
    /// # Errors
    ///
    /// `I2C::Error` when the I2C transaction fails
    pub async fn new_async_from_device(i2c: I2C, delay: DELAY, a0: A0) -> Result<Self, I2C::Error> {
        let mut tmp117 = Self::new_async(i2c, delay, a0);
        tmp117.configuration().await?;
        Ok(tmp117)
    }

    /// Destroy the driver instance, return the I2C bus instance.
    pub fn destroy(self) -> I2C {
        self.i2c
    }

    /// Read configuration register and refresh the local cache.
    ///
    /// # Errors
    ///
    /// `I2C::Error` when the I2C transaction fails
    pub async fn configuration(&mut self) -> Result<Configuration, I2C::Error> {
        let data = self.read(Register::Configuration).await?;
        self.config = Configuration::decode(u16::from_be_bytes(data));
        Ok(self.config)
    }

    /// The configuration as of the last read or write.
    pub fn cached_configuration(&self) -> Configuration {
        self.config
    }

    /// Set configuration register
    ///
    /// # Errors
    ///
    /// `I2C::Error` when the I2C transaction fails
    pub async fn set_configuration(&mut self, config: Configuration) -> Result<(), I2C::Error> {
        self.write(Register::Configuration, config.encode().to_be_bytes()).await?;

        // Only cache config after successful write
        self.config = config.with_status_of(self.config);
        Ok(())
    }

    /// Set conversion mode, conversion cycle and averaging.
    ///
    /// # Errors
    ///
    /// `I2C::Error` when the I2C transaction fails
    pub async fn set_timing(&mut self, timing: TimingSettings) -> Result<(), I2C::Error> {
        debug!("tmp117: mode {} cycle {} average {}", timing.mode as u8, timing.cycle as u8, timing.average as u8);
        self.set_configuration(self.config.with_timing(timing)).await
    }

    /// Timing fields of the cached configuration.
    pub fn timing(&self) -> TimingSettings {
        self.config.timing()
    }

    /// Conversion cycle time in milliseconds for the cached configuration.
    pub fn conversion_time_ms(&self) -> u32 {
        self.config.timing().conversion_time_ms()
    }

    /// Start one-shot or continuous conversions with the given conversion
    /// cycle (`0..=7`) and averaging (`0..=3`). Continuous conversions are
    /// written as mode `0b10`.
    ///
    /// # Errors
    ///
    /// `Error::InvalidInput` before any bus transaction when `cycle` or
    /// `average` is out of range, `Error::Bus` when the I2C transaction fails
    pub async fn start_measurement(
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

        self.set_timing(timing).await.map_err(Error::Bus)?;
        if refresh {
            self.configuration().await.map_err(Error::Bus)?;
        }
        Ok(())
    }

    /// Read temperature register
    ///
    /// # Errors
    ///
    /// `I2C::Error` when the I2C transaction fails
    pub async fn temperature(&mut self) -> Result<f32, I2C::Error> {
        let raw = self.read(Register::Temperature).await?;
        Ok(to_celsius(i16::from_be_bytes(raw)))
    }

    /// Wait for conversion to complete, then read the temperature.
    ///
    /// # Errors
    ///
    /// `I2C::Error` when the I2C transaction fails
    pub async fn wait_for_temperature(&mut self) -> Result<f32, I2C::Error> {
        let config = self.configuration().await?;
        self.delay.delay_ms(config.timing().conversion_time_ms()).await;
        self.temperature().await
    }

    /// Read status and alert flags.
    ///
    /// # Errors
    ///
    /// `I2C::Error` when the I2C transaction fails
    pub async fn flags(&mut self) -> Result<Flags, I2C::Error> {
        Ok(self.configuration().await?.flags())
    }

    /// Whether a conversion result is ready. Reading clears the flag.
    ///
    /// # Errors
    ///
    /// `I2C::Error` when the I2C transaction fails
    pub async fn data_ready(&mut self) -> Result<bool, I2C::Error> {
        Ok(self.flags().await?.data_ready)
    }

    /// Read temperature offset register
    ///
    /// # Errors
    ///
    /// `I2C::Error` when the I2C transaction fails
    pub async fn temperature_offset(&mut self) -> Result<f32, I2C::Error> {
        let raw = self.read(Register::TemperatureOffset).await?;
        Ok(to_celsius(i16::from_be_bytes(raw)))
    }

    /// Set temperature offset register
    ///
    /// # Errors
    ///
    /// `I2C::Error` when the I2C transaction fails
    pub async fn set_temperature_offset(&mut self, offset: f32) -> Result<(), I2C::Error> {
        let raw = to_raw(offset);
        self.write(Register::TemperatureOffset, raw.to_be_bytes()).await
    }

    /// Read temperature low limit register
    ///
    /// # Errors
    ///
    /// `I2C::Error` when the I2C transaction fails
    pub async fn low_limit(&mut self) -> Result<f32, I2C::Error> {
        let raw = self.read(Register::LowLimit).await?;
        Ok(to_celsius(i16::from_be_bytes(raw)))
    }

    /// Set temperature low limit register
    ///
    /// # Errors
    ///
    /// `I2C::Error` when the I2C transaction fails
    pub async fn set_low_limit(&mut self, limit: f32) -> Result<(), I2C::Error> {
        let raw = to_raw(limit);
        self.write(Register::LowLimit, raw.to_be_bytes()).await
    }

    /// Read temperature high limit register
    ///
    /// # Errors
    ///
    /// `I2C::Error` when the I2C transaction fails
    pub async fn high_limit(&mut self) -> Result<f32, I2C::Error> {
        let raw = self.read(Register::HighLimit).await?;
        Ok(to_celsius(i16::from_be_bytes(raw)))
    }

    /// Set temperature high limit register
    ///
    /// # Errors
    ///
    /// `I2C::Error` when the I2C transaction fails
    pub async fn set_high_limit(&mut self, limit: f32) -> Result<(), I2C::Error> {
        let raw = to_raw(limit);
        self.write(Register::HighLimit, raw.to_be_bytes()).await
    }

    /// Read device ID register
    ///
    /// # Errors
    ///
    /// `I2C::Error` when the I2C transaction fails
    pub async fn device_id(&mut self) -> Result<DeviceId, I2C::Error> {
        let raw = self.read(Register::DeviceId).await?;
        Ok(DeviceId::from(u16::from_be_bytes(raw)))
    }

    /// Read the NIST traceability ID
    ///
    /// # Errors
    ///
    /// `I2C::Error` when the I2C transaction fails
    pub async fn nist_id(&mut self) -> Result<NistId, I2C::Error> {
        let word0 = u16::from_be_bytes(self.read(Register::Eeprom1).await?);
        let word1 = u16::from_be_bytes(self.read(Register::Eeprom3).await?);
        Ok(NistId { word0, word1 })
    }

    /// Trigger a software reset.
    ///
    /// # Errors
    ///
    /// `I2C::Error` when the I2C transaction fails
    pub async fn soft_reset(&mut self) -> Result<(), I2C::Error> {
        let data = self.read(Register::Configuration).await?;
        let value = u16::from_be_bytes(data) | Self::SOFT_RESET;
        debug!("tmp117: soft reset");
        self.write(Register::Configuration, value.to_be_bytes()).await
    }

    /// Whether the device is in one-shot mode, after a fresh read.
    ///
    /// # Errors
    ///
    /// `I2C::Error` when the I2C transaction fails
    pub async fn is_one_shot_mode(&mut self) -> Result<bool, I2C::Error> {
        Ok(self.configuration().await?.conversion_mode() == ConversionMode::OneShot)
    }

    /// Whether the device is in continuous mode, after a fresh read.
    ///
    /// # Errors
    ///
    /// `I2C::Error` when the I2C transaction fails
    pub async fn is_continuous_mode(&mut self) -> Result<bool, I2C::Error> {
        Ok(self.configuration().await?.conversion_mode().is_continuous())
    }

    /// Place device in Shutdown mode
    ///
    /// # Errors
    ///
    /// `I2C::Error` when the I2C transaction fails
    pub async fn shutdown(&mut self) -> Result<(), I2C::Error> {
        self.set_mode(ConversionMode::Shutdown).await
    }

    /// Run `f` with the device configured for `timing`, then place the device
    /// in shutdown mode whether `f` succeeded or not. Dropping the returned
    /// future before completion skips the shutdown write.
    ///
    /// # Errors
    ///
    /// The error of `f` if it failed, otherwise `Error::Bus` when an I2C
    /// transaction fails
    pub async fn session<T, F>(&mut self, timing: TimingSettings, f: F) -> Result<T, Error<I2C::Error>>
    where
        F: AsyncFnOnce(&mut Self) -> Result<T, Error<I2C::Error>>,
    {
        debug!("tmp117: session start");
        if let Err(e) = self.set_timing(timing).await {
            let _ = self.shutdown().await;
            return Err(Error::Bus(e));
        }

        let result = f(self).await;
        let shutdown = self.shutdown().await;
        debug!("tmp117: session end");

        let value = result?;
        shutdown.map_err(Error::Bus)?;
        Ok(value)
    }

    /// Arm the device for `sampling` and return an endless sequence of
    /// samples.
    ///
    /// # Errors
    ///
    /// `I2C::Error` when the I2C transaction fails
    pub async fn samples(&mut self, sampling: Sampling) -> Result<Samples<'_, I2C, DELAY>, I2C::Error> {
        self.arm(sampling).await?;
        Ok(Samples { tmp117: self, sampling })
    }

    async fn arm(&mut self, sampling: Sampling) -> Result<(), I2C::Error> {
        match sampling {
            Sampling::Continuous => self.set_mode(ConversionMode::ContinuousAlt).await,
            Sampling::OneShot => self.set_mode(ConversionMode::OneShot).await,
        }
    }

    async fn set_mode(&mut self, mode: ConversionMode) -> Result<(), I2C::Error> {
        debug!("tmp117: conversion mode {}", mode as u8);
        self.set_configuration(self.config.with_conversion_mode(mode)).await
    }

    async fn read(&mut self, reg: Register) -> Result<[u8; 2], I2C::Error> {
        let mut bytes = [0; 2];
        let addr: u8 = reg.into();
        self.i2c.write_read(self.addr, &[addr], &mut bytes).await?;
        trace!("tmp117: read {:#x} -> {:#x}", addr, u16::from_be_bytes(bytes));
        Ok(bytes)
    }

    async fn write(&mut self, reg: Register, value: [u8; 2]) -> Result<(), I2C::Error> {
        let mut data = [0; 3];

        data[0] = reg.into();
        data[1..].copy_from_slice(&value);

        trace!("tmp117: write {:#x} <- {:#x}", data[0], u16::from_be_bytes(value));
        self.i2c.write(self.addr, &data).await
    }
}

/// Endless sequence of temperature samples, see [`Tmp117::samples`].
pub struct Samples<'a, I2C: embedded_hal_async::i2c::I2c, DELAY: embedded_hal_async::delay::DelayNs> {
    tmp117: &'a mut Tmp117<I2C, DELAY>,
    sampling: Sampling,
}

impl<I2C: embedded_hal_async::i2c::I2c, DELAY: embedded_hal_async::delay::DelayNs> Samples<'_, I2C, DELAY> {
    /// Time to wait before pulling the next sample.
    pub fn conversion_time_ms(&self) -> u32 {
        self.tmp117.conversion_time_ms()
    }

    /// Read the latest sample. In one-shot sampling the next conversion is
    /// triggered right after the read.
    ///
    /// # Errors
    ///
    /// `I2C::Error` when the I2C transaction fails
    pub async fn next_sample(&mut self) -> Result<f32, I2C::Error> {
        let temperature = self.tmp117.temperature().await?;
        if self.sampling == Sampling::OneShot {
            self.tmp117.arm(Sampling::OneShot).await?;
        }
        Ok(temperature)
    }
}

#[cfg(feature = "embedded-sensors-hal-async")]
impl<I2C: embedded_hal_async::i2c::I2c, DELAY: embedded_hal_async::delay::DelayNs> sensor::ErrorType
    for Tmp117<I2C, DELAY>
{
    type Error = Error<I2C::Error>;
}

#[cfg(feature = "embedded-sensors-hal-async")]
impl<I2C: embedded_hal_async::i2c::I2c, DELAY: embedded_hal_async::delay::DelayNs> TemperatureSensor
    for Tmp117<I2C, DELAY>
{
    async fn temperature(&mut self) -> Result<DegreesCelsius, Self::Error> {
        self.temperature().await.map_err(Error::Bus)
    }
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::delay::{CheckedDelay, NoopDelay, Transaction as DelayTransaction};
    use embedded_hal_mock::eh1::i2c::{Mock, Transaction};

    use super::*;
    use crate::{AlertMode, AlertPinSelect, InvalidSetting, Polarity};

    #[tokio::test]
    async fn handle_a0_pin_accordingly() {
        let expectations = vec![];

        let mock = Mock::new(&expectations);
        let tmp = Tmp117::new_async_with_a0_gnd(mock, NoopDelay::new());
        assert_eq!(tmp.addr, 0x48);
        let mut mock = tmp.destroy();
        mock.done();

        let mock = Mock::new(&expectations);
        let tmp = Tmp117::new_async_with_a0_vplus(mock, NoopDelay::new());
        assert_eq!(tmp.addr, 0x49);
        let mut mock = tmp.destroy();
        mock.done();

        let mock = Mock::new(&expectations);
        let tmp = Tmp117::new_async_with_a0_sda(mock, NoopDelay::new());
        assert_eq!(tmp.addr, 0x4a);
        let mut mock = tmp.destroy();
        mock.done();

        let mock = Mock::new(&expectations);
        let tmp = Tmp117::new_async_with_a0_scl(mock, NoopDelay::new());
        assert_eq!(tmp.addr, 0x4b);
        let mut mock = tmp.destroy();
        mock.done();
    }

    #[tokio::test]
    async fn read_temperature_default_address() {
        let expectations = vec![
            vec![Transaction::write_read(0x48, vec![0x00], vec![0x00, 0x00])],
            vec![Transaction::write_read(0x48, vec![0x00], vec![0x01, 0x90])],
            vec![Transaction::write_read(0x48, vec![0x00], vec![0xff, 0xff])],
        ];
        let temps = [0.0, 3.125, -0.007_812_5];

        for (e, t) in expectations.iter().zip(temps.iter()) {
            let mock = Mock::new(e);
            let mut tmp117 = Tmp117::new_async_with_a0_gnd(mock, NoopDelay::new());
            let result = tmp117.temperature().await;
            assert!(result.is_ok());

            let temp = result.unwrap();
            assert_approx_eq!(temp, *t, 1e-6);

            let mut mock = tmp117.destroy();
            mock.done();
        }
    }

    #[tokio::test]
    async fn start_measurement_then_poll_data_ready() {
        let expectations = vec![
            Transaction::write(0x48, vec![0x01, 0x0a, 0x20]),
            Transaction::write_read(0x48, vec![0x01], vec![0x2a, 0x20]),
            Transaction::write_read(0x48, vec![0x00], vec![0x0c, 0x80]),
        ];

        let mock = Mock::new(&expectations);
        let mut tmp = Tmp117::new_async_with_a0_gnd(mock, NoopDelay::new());

        tmp.start_measurement(false, 4, 1, false).await.unwrap();
        assert_eq!(tmp.timing().mode, ConversionMode::ContinuousAlt);
        assert_eq!(tmp.conversion_time_ms(), 1000);
        assert!(tmp.data_ready().await.unwrap());
        assert_approx_eq!(tmp.temperature().await.unwrap(), 25.0, 1e-4);

        let mut mock = tmp.destroy();
        mock.done();
    }

    #[tokio::test]
    async fn read_write_configuration_register() {
        let expectations = vec![
            Transaction::write_read(0x48, vec![0x01], vec![0x02, 0x20]),
            Transaction::write(0x48, vec![0x01, 0x0f, 0xfc]),
        ];

        let mock = Mock::new(&expectations);
        let mut tmp = Tmp117::new_async_with_a0_gnd(mock, NoopDelay::new());

        let cfg = tmp.configuration().await.unwrap();
        assert_eq!(cfg, Configuration::default());

        let cfg = cfg
            .with_conversion_mode(ConversionMode::OneShot)
            .with_conversion_cycle(ConversionCycle::Ms16000)
            .with_average(Average::Avg64)
            .with_therm_no_alert(AlertMode::Therm)
            .with_polarity(Polarity::ActiveHigh)
            .with_dr_alert(AlertPinSelect::DataReady);

        tmp.set_configuration(cfg).await.unwrap();
        assert_eq!(tmp.cached_configuration(), cfg);
        assert_eq!(tmp.conversion_time_ms(), 1000);

        let mut mock = tmp.destroy();
        mock.done();
    }

    #[tokio::test]
    async fn wait_for_temperature_sleeps_for_conversion_time() {
        let expectations = vec![
            Transaction::write_read(0x48, vec![0x01], vec![0x22, 0x20]),
            Transaction::write_read(0x48, vec![0x00], vec![0x0c, 0x80]),
        ];

        let mock = Mock::new(&expectations);
        let delay = CheckedDelay::new(&[DelayTransaction::async_delay_ms(1000)]);
        let mut delay_check = delay.clone();
        let mut tmp = Tmp117::new_async_with_a0_gnd(mock, delay);

        assert_approx_eq!(tmp.wait_for_temperature().await.unwrap(), 25.0, 1e-4);

        let mut mock = tmp.destroy();
        mock.done();
        delay_check.done();
    }

    #[tokio::test]
    async fn reject_invalid_measurement_settings() {
        let expectations = vec![];

        let mock = Mock::new(&expectations);
        let mut tmp = Tmp117::new_async_with_a0_gnd(mock, NoopDelay::new());

        let result = tmp.start_measurement(false, 8, 1, false).await;
        assert!(matches!(result, Err(Error::InvalidInput(InvalidSetting::ConversionCycle(8)))));

        let mut mock = tmp.destroy();
        mock.done();
    }

    #[tokio::test]
    async fn read_write_offset_and_identification() {
        let expectations = vec![
            Transaction::write(0x48, vec![0x07, 0x01, 0x80]),
            Transaction::write_read(0x48, vec![0x07], vec![0x01, 0x80]),
            Transaction::write_read(0x48, vec![0x0f], vec![0x01, 0x17]),
            Transaction::write_read(0x48, vec![0x05], vec![0x12, 0x34]),
            Transaction::write_read(0x48, vec![0x08], vec![0xab, 0xcd]),
        ];

        let mock = Mock::new(&expectations);
        let mut tmp = Tmp117::new_async_with_a0_gnd(mock, NoopDelay::new());

        tmp.set_temperature_offset(3.0).await.unwrap();
        assert_approx_eq!(tmp.temperature_offset().await.unwrap(), 3.0, 7.8125e-3);
        assert!(tmp.device_id().await.unwrap().is_tmp117());
        assert_eq!(tmp.nist_id().await.unwrap(), NistId { word0: 0x1234, word1: 0xabcd });

        let mut mock = tmp.destroy();
        mock.done();
    }

    #[tokio::test]
    async fn read_write_limits() {
        let expectations = vec![
            Transaction::write(0x48, vec![0x02, 0x0f, 0x00]),
            Transaction::write(0x48, vec![0x03, 0xfb, 0x00]),
            Transaction::write_read(0x48, vec![0x02], vec![0x0f, 0x00]),
            Transaction::write_read(0x48, vec![0x03], vec![0xfb, 0x00]),
        ];

        let mock = Mock::new(&expectations);
        let mut tmp = Tmp117::new_async_with_a0_gnd(mock, NoopDelay::new());

        tmp.set_high_limit(30.0).await.unwrap();
        tmp.set_low_limit(-10.0).await.unwrap();
        assert_approx_eq!(tmp.high_limit().await.unwrap(), 30.0, 1e-4);
        assert_approx_eq!(tmp.low_limit().await.unwrap(), -10.0, 1e-4);

        let mut mock = tmp.destroy();
        mock.done();
    }

    #[tokio::test]
    async fn soft_reset_sets_bit_zero() {
        let expectations = vec![
            Transaction::write_read(0x48, vec![0x01], vec![0x0e, 0x20]),
            Transaction::write(0x48, vec![0x01, 0x0e, 0x21]),
        ];

        let mock = Mock::new(&expectations);
        let mut tmp = Tmp117::new_async_with_a0_gnd(mock, NoopDelay::new());

        assert!(tmp.soft_reset().await.is_ok());

        let mut mock = tmp.destroy();
        mock.done();
    }

    #[tokio::test]
    async fn session_ends_in_shutdown() {
        let expectations = vec![
            Transaction::write(0x48, vec![0x01, 0x03, 0x80]),
            Transaction::write_read(0x48, vec![0x00], vec![0x0c, 0x80]),
            Transaction::write(0x48, vec![0x01, 0x07, 0x80]),
        ];

        let mock = Mock::new(&expectations);
        let mut tmp = Tmp117::new_async_with_a0_gnd(mock, NoopDelay::new());

        let timing = TimingSettings::new(ConversionMode::Continuous, ConversionCycle::Ms16000, Average::NoAverage);
        let result = tmp
            .session(timing, async |tmp: &mut Tmp117<Mock, NoopDelay>| {
                tmp.temperature().await.map_err(Error::Bus)
            })
            .await;
        assert_approx_eq!(result.unwrap(), 25.0, 1e-4);
        assert_eq!(tmp.timing().mode, ConversionMode::Shutdown);

        let mut mock = tmp.destroy();
        mock.done();
    }

    #[tokio::test]
    async fn session_shuts_down_on_error() {
        let expectations = vec![
            Transaction::write(0x48, vec![0x01, 0x02, 0x20]),
            Transaction::write_read(0x48, vec![0x00], vec![0x00, 0x00]).with_error(ErrorKind::Other),
            Transaction::write(0x48, vec![0x01, 0x06, 0x20]),
        ];

        let mock = Mock::new(&expectations);
        let mut tmp = Tmp117::new_async_with_a0_gnd(mock, NoopDelay::new());

        let result = tmp
            .session(TimingSettings::default(), async |tmp: &mut Tmp117<Mock, NoopDelay>| {
                tmp.temperature().await.map_err(Error::Bus)
            })
            .await;
        assert!(matches!(result, Err(Error::Bus(ErrorKind::Other))));
        assert_eq!(tmp.timing().mode, ConversionMode::Shutdown);

        let mut mock = tmp.destroy();
        mock.done();
    }

    #[tokio::test]
    async fn continuous_samples() {
        let expectations = vec![
            Transaction::write(0x48, vec![0x01, 0x0a, 0x20]),
            Transaction::write_read(0x48, vec![0x00], vec![0x0c, 0x80]),
            Transaction::write_read(0x48, vec![0x00], vec![0x0d, 0x00]),
        ];

        let mock = Mock::new(&expectations);
        let mut tmp = Tmp117::new_async_with_a0_gnd(mock, NoopDelay::new());

        let mut samples = tmp.samples(Sampling::Continuous).await.unwrap();
        assert_eq!(samples.conversion_time_ms(), 1000);
        assert_approx_eq!(samples.next_sample().await.unwrap(), 25.0, 1e-4);
        assert_approx_eq!(samples.next_sample().await.unwrap(), 26.0, 1e-4);

        let mut mock = tmp.destroy();
        mock.done();
    }

    #[tokio::test]
    async fn one_shot_samples_rearm_after_each_read() {
        let expectations = vec![
            Transaction::write(0x48, vec![0x01, 0x0e, 0x20]),
            Transaction::write_read(0x48, vec![0x00], vec![0x0c, 0x80]),
            Transaction::write(0x48, vec![0x01, 0x0e, 0x20]),
        ];

        let mock = Mock::new(&expectations);
        let mut tmp = Tmp117::new_async_with_a0_gnd(mock, NoopDelay::new());

        let mut samples = tmp.samples(Sampling::OneShot).await.unwrap();
        assert_eq!(samples.conversion_time_ms(), 125);
        assert_approx_eq!(samples.next_sample().await.unwrap(), 25.0, 1e-4);

        let mut mock = tmp.destroy();
        mock.done();
    }
}
