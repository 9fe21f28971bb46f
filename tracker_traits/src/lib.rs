pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// Error type used at every hardware seam.
pub type HwResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Bank of light-dependent resistors, addressed by sensor index.
pub trait LightSensors {
    /// Raw ADC reading for sensor `index`. Values are clamped by the caller.
    fn read(&mut self, index: usize) -> HwResult<i32>;
}

/// ADC channel wired to the panel's voltage divider.
pub trait PanelAdc {
    fn read(&mut self) -> HwResult<i32>;
}

/// Single-axis pointing actuator (hobby servo or similar).
pub trait Actuator {
    /// Command an absolute angle in degrees, already clamped to `[0, 180]`.
    fn write_angle(&mut self, angle_deg: i32) -> HwResult<()>;
}

impl<T: LightSensors + ?Sized> LightSensors for Box<T> {
    fn read(&mut self, index: usize) -> HwResult<i32> {
        (**self).read(index)
    }
}

impl<T: PanelAdc + ?Sized> PanelAdc for Box<T> {
    fn read(&mut self) -> HwResult<i32> {
        (**self).read()
    }
}

impl<T: Actuator + ?Sized> Actuator for Box<T> {
    fn write_angle(&mut self, angle_deg: i32) -> HwResult<()> {
        (**self).write_angle(angle_deg)
    }
}
