//! Hobby servo on a GPIO pin, driven by rppal software PWM.

use std::time::Duration;

use rppal::gpio::{Gpio, OutputPin};
use tracker_traits::{Actuator, HwResult};

use crate::error::{HwError, Result};
use crate::servo_pulse_us;

pub struct PwmServo {
    pin: OutputPin,
    period: Duration,
    min_pulse_us: u32,
    max_pulse_us: u32,
}

impl PwmServo {
    pub fn new(bcm_pin: u8, hz: u32, min_pulse_us: u32, max_pulse_us: u32) -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(format!("open gpio: {e}")))?;
        let pin = gpio
            .get(bcm_pin)
            .map_err(|e| HwError::Gpio(format!("open servo pin {bcm_pin}: {e}")))?
            .into_output_low();
        Ok(Self {
            pin,
            period: Duration::from_micros(1_000_000 / u64::from(hz.max(1))),
            min_pulse_us,
            max_pulse_us,
        })
    }
}

impl Actuator for PwmServo {
    fn write_angle(&mut self, angle_deg: i32) -> HwResult<()> {
        let us = servo_pulse_us(angle_deg, self.min_pulse_us, self.max_pulse_us);
        self.pin
            .set_pwm(self.period, Duration::from_micros(u64::from(us)))
            .map_err(|e| HwError::Gpio(e.to_string()))?;
        Ok(())
    }
}

impl Drop for PwmServo {
    fn drop(&mut self) {
        if let Err(e) = self.pin.clear_pwm() {
            tracing::warn!(error = %e, "servo pwm clear failed");
        }
    }
}
