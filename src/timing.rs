//! Conversion cycle timing.
//!
//! The time between two results depends on the conversion mode, the
//! conversion cycle bits and the averaging mode. In one-shot mode only the
//! active conversion time counts, so the conversion cycle bits have no
//! effect. In continuous mode the standby time cannot be shorter than the
//! time spent averaging.

use crate::{Average, Configuration, ConversionCycle, ConversionMode, InvalidSetting};

/// Cycle time in milliseconds indexed by the conversion cycle bits.
const CONTINUOUS_MS: [u32; 8] = [16, 125, 250, 500, 1000, 4000, 8000, 16000];

/// One-shot conversion time in milliseconds indexed by the averaging bits.
const ONE_SHOT_MS: [u32; 4] = [16, 125, 500, 1000];

/// The configuration fields that determine the conversion cycle time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimingSettings {
    /// Conversion mode.
    pub mode: ConversionMode,
    /// Conversion cycle selector.
    pub cycle: ConversionCycle,
    /// Averaging mode.
    pub average: Average,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Configuration::default().timing()
    }
}

impl TimingSettings {
    /// Create settings from typed fields.
    #[must_use]
    pub const fn new(mode: ConversionMode, cycle: ConversionCycle, average: Average) -> Self {
        Self { mode, cycle, average }
    }

    /// Create settings from raw register field values.
    ///
    /// # Errors
    ///
    /// [`InvalidSetting`] naming the first field outside its range, checked
    /// in the order conversion cycle, averaging, conversion mode.
    pub fn from_raw(mode: u8, cycle: u8, average: u8) -> Result<Self, InvalidSetting> {
        let cycle = ConversionCycle::try_from(cycle)?;
        let average = Average::try_from(average)?;
        let mode = ConversionMode::try_from(mode)?;
        Ok(Self::new(mode, cycle, average))
    }

    /// Conversion cycle time in milliseconds.
    #[must_use]
    pub fn conversion_time_ms(&self) -> u32 {
        let cycle = self.cycle as usize;
        let average = self.average as usize;

        if self.mode == ConversionMode::OneShot {
            return ONE_SHOT_MS[average];
        }

        if average < 2 {
            if cycle == 0 && average == 1 {
                return 125;
            }
            return CONTINUOUS_MS[cycle];
        }

        // 32 or 64 averaged conversions
        if cycle < 4 {
            return 500 * (self.average as u32 - 2);
        }
        CONTINUOUS_MS[cycle]
    }
}

/// Conversion cycle time in milliseconds for raw register field values.
///
/// # Errors
///
/// [`InvalidSetting`] when a field is outside its range.
pub fn conversion_time_ms(mode: u8, cycle: u8, average: u8) -> Result<u32, InvalidSetting> {
    Ok(TimingSettings::from_raw(mode, cycle, average)?.conversion_time_ms())
}
