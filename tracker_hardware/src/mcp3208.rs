//! MCP3208 8-channel 12-bit SPI ADC.
//!
//! Single-ended conversion frame (3 bytes, SPI mode 0):
//! `tx = [0b0000_0110 | ch>>2, (ch & 3) << 6, 0]`, result is the low nibble
//! of `rx[1]` followed by `rx[2]`.

use crate::error::{HwError, Result};

/// Highest valid channel index.
pub const MAX_CHANNEL: u8 = 7;

/// Full-scale count of the 12-bit converter.
pub const FULL_SCALE: i32 = 4095;

/// Command frame for a single-ended read of `channel`.
pub fn command(channel: u8) -> Result<[u8; 3]> {
    if channel > MAX_CHANNEL {
        return Err(HwError::Channel(channel));
    }
    Ok([0x06 | (channel >> 2), (channel & 0x03) << 6, 0x00])
}

/// Extract the 12-bit conversion result from a response frame.
pub fn decode(rx: [u8; 3]) -> i32 {
    (i32::from(rx[1] & 0x0F) << 8) | i32::from(rx[2])
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub use driver::{AdcLightSensors, AdcPanel, Mcp3208, SharedAdc};

#[cfg(all(feature = "hardware", target_os = "linux"))]
mod driver {
    use std::sync::{Arc, Mutex};

    use rppal::spi::{Bus, Mode, SlaveSelect, Spi};
    use tracker_traits::{HwResult, LightSensors, PanelAdc};

    use super::{command, decode};
    use crate::error::{HwError, Result};

    pub struct Mcp3208 {
        spi: Spi,
    }

    impl Mcp3208 {
        /// Open SPI0/CE0 at `clock_hz`.
        pub fn new(clock_hz: u32) -> Result<Self> {
            let spi = Spi::new(Bus::Spi0, SlaveSelect::Ss0, clock_hz, Mode::Mode0)
                .map_err(|e| HwError::Spi(format!("open spi0: {e}")))?;
            Ok(Self { spi })
        }

        pub fn read_channel(&mut self, channel: u8) -> Result<i32> {
            let tx = command(channel)?;
            let mut rx = [0u8; 3];
            let n = self
                .spi
                .transfer(&mut rx, &tx)
                .map_err(|e| HwError::Spi(e.to_string()))?;
            if n != rx.len() {
                return Err(HwError::Spi(format!("short transfer: {n} bytes")));
            }
            Ok(decode(rx))
        }
    }

    /// One converter shared by the sensor bank and the panel channel.
    pub type SharedAdc = Arc<Mutex<Mcp3208>>;

    fn read_shared(adc: &SharedAdc, channel: u8) -> Result<i32> {
        let mut g = adc
            .lock()
            .map_err(|_| HwError::Spi("adc lock poisoned".into()))?;
        g.read_channel(channel)
    }

    pub struct AdcLightSensors {
        adc: SharedAdc,
        channels: [u8; 4],
    }

    impl AdcLightSensors {
        pub fn new(adc: SharedAdc, channels: [u8; 4]) -> Self {
            Self { adc, channels }
        }
    }

    impl LightSensors for AdcLightSensors {
        fn read(&mut self, index: usize) -> HwResult<i32> {
            let ch = *self
                .channels
                .get(index)
                .ok_or_else(|| HwError::Spi(format!("no sensor at index {index}")))?;
            Ok(read_shared(&self.adc, ch)?)
        }
    }

    pub struct AdcPanel {
        adc: SharedAdc,
        channel: u8,
    }

    impl AdcPanel {
        pub fn new(adc: SharedAdc, channel: u8) -> Self {
            Self { adc, channel }
        }
    }

    impl PanelAdc for AdcPanel {
        fn read(&mut self) -> HwResult<i32> {
            Ok(read_shared(&self.adc, self.channel)?)
        }
    }
}
