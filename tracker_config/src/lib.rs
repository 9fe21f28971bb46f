#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and calibration parsing for the solar tracker.
//!
//! - `Config` and its sections are deserialized from TOML and validated.
//!   Every section is optional; defaults match the stock hardware build.
//! - The calibration CSV loader enforces headers and row count, then the
//!   rows replace the `[[sensors]]` table.
use serde::Deserialize;

/// Number of light sensors on the tracker head.
pub const SENSOR_COUNT: usize = 4;

/// Highest channel index on an 8-channel ADC (MCP3208).
const MAX_ADC_CHANNEL: u8 = 7;

/// One light sensor: where it points and the reading at which it saturates.
///
/// CSV form:
/// mount_angle_deg,calibrated_max
/// 30,2000
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct SensorEntry {
    pub mount_angle_deg: i32,
    pub calibrated_max: i32,
}

fn default_sensors() -> Vec<SensorEntry> {
    [(30, 2000), (70, 3000), (110, 2700), (150, 1000)]
        .into_iter()
        .map(|(mount_angle_deg, calibrated_max)| SensorEntry {
            mount_angle_deg,
            calibrated_max,
        })
        .collect()
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PanelCfg {
    /// ADC count at full-scale reference voltage (4095 for 12-bit).
    pub adc_full_scale: i32,
    /// ADC reference voltage in volts.
    pub reference_v: f32,
    /// Voltage divider ratio between panel and ADC input.
    pub divider_ratio: f32,
    /// Upper clamp for reconstructed panel voltage.
    pub max_voltage: f32,
    /// Assumed (not measured) load current used for the power estimate.
    pub assumed_current_a: f32,
}

impl Default for PanelCfg {
    fn default() -> Self {
        Self {
            adc_full_scale: 4095,
            reference_v: 3.3,
            divider_ratio: 11.0,
            max_voltage: 12.0,
            assumed_current_a: 0.8,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ControlCfg {
    /// Control loop rate; 50 Hz gives the stock 20 ms tick.
    pub tick_hz: u32,
    /// Actuator position at power-up.
    pub initial_angle_deg: i32,
}

impl Default for ControlCfg {
    fn default() -> Self {
        Self {
            tick_hz: 50,
            initial_angle_deg: 90,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HistoryOrder {
    /// Oldest to newest.
    #[default]
    Chronological,
    /// Raw ring storage order starting at slot 0 (legacy dashboards).
    Storage,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct StatusCfg {
    pub history_order: HistoryOrder,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Hardware {
    /// GPIO pin driving the servo signal line.
    pub servo_pin: u8,
    pub servo_min_pulse_us: u32,
    pub servo_max_pulse_us: u32,
    pub servo_hz: u32,
    /// ADC channel per light sensor, in sensor order.
    pub ldr_channels: [u8; SENSOR_COUNT],
    /// ADC channel for the panel voltage divider.
    pub panel_channel: u8,
    pub spi_clock_hz: u32,
}

impl Default for Hardware {
    fn default() -> Self {
        Self {
            servo_pin: 25,
            servo_min_pulse_us: 500,
            servo_max_pulse_us: 2400,
            servo_hz: 50,
            ldr_channels: [0, 1, 2, 3],
            panel_channel: 4,
            spi_clock_hz: 1_000_000,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct RtCfg {
    /// Pin the control thread to this CPU index when set.
    pub control_cpu: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_sensors")]
    pub sensors: Vec<SensorEntry>,
    #[serde(default)]
    pub panel: PanelCfg,
    #[serde(default)]
    pub control: ControlCfg,
    #[serde(default)]
    pub status: StatusCfg,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub hardware: Hardware,
    #[serde(default)]
    pub rt: RtCfg,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sensors: default_sensors(),
            panel: PanelCfg::default(),
            control: ControlCfg::default(),
            status: StatusCfg::default(),
            logging: Logging::default(),
            hardware: Hardware::default(),
            rt: RtCfg::default(),
        }
    }
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Load calibration rows from a CSV with the exact header
/// `mount_angle_deg,calibrated_max` and one row per sensor.
pub fn load_calibration_csv(path: &std::path::Path) -> eyre::Result<Vec<SensorEntry>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open calibration CSV {:?}: {}", path, e))?;

    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["mount_angle_deg", "calibrated_max"];
    let actual: Vec<String> = headers.iter().map(ToString::to_string).collect();
    if actual != expected {
        eyre::bail!(
            "calibration CSV must have headers 'mount_angle_deg,calibrated_max', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::with_capacity(SENSOR_COUNT);
    for (idx, rec) in rdr.deserialize::<SensorEntry>().enumerate() {
        match rec {
            Ok(row) => rows.push(row),
            Err(e) => eyre::bail!("invalid CSV row {}: {}", idx + 2, e),
        }
    }
    if rows.len() != SENSOR_COUNT {
        eyre::bail!(
            "calibration CSV must have exactly {SENSOR_COUNT} rows, got {}",
            rows.len()
        );
    }
    for (i, row) in rows.iter().enumerate() {
        validate_sensor(i, row)?;
    }
    Ok(rows)
}

fn validate_sensor(i: usize, s: &SensorEntry) -> eyre::Result<()> {
    if !(0..=180).contains(&s.mount_angle_deg) {
        eyre::bail!("sensors[{i}].mount_angle_deg must be in [0, 180]");
    }
    if s.calibrated_max <= 0 {
        eyre::bail!("sensors[{i}].calibrated_max must be > 0");
    }
    Ok(())
}

fn positive_finite(v: f32) -> bool {
    v.is_finite() && v > 0.0
}

impl Config {
    /// Replace the sensor table, e.g. with rows from `load_calibration_csv`.
    pub fn with_sensors(mut self, sensors: Vec<SensorEntry>) -> Self {
        self.sensors = sensors;
        self
    }

    pub fn validate(&self) -> eyre::Result<()> {
        // Sensors
        if self.sensors.len() != SENSOR_COUNT {
            eyre::bail!(
                "sensors must list exactly {SENSOR_COUNT} entries, got {}",
                self.sensors.len()
            );
        }
        for (i, s) in self.sensors.iter().enumerate() {
            validate_sensor(i, s)?;
        }

        // Panel
        if self.panel.adc_full_scale <= 0 {
            eyre::bail!("panel.adc_full_scale must be > 0");
        }
        if !positive_finite(self.panel.reference_v) {
            eyre::bail!("panel.reference_v must be a positive number");
        }
        if !positive_finite(self.panel.divider_ratio) {
            eyre::bail!("panel.divider_ratio must be a positive number");
        }
        if !positive_finite(self.panel.max_voltage) {
            eyre::bail!("panel.max_voltage must be a positive number");
        }
        if !(self.panel.assumed_current_a.is_finite() && self.panel.assumed_current_a >= 0.0) {
            eyre::bail!("panel.assumed_current_a must be >= 0");
        }

        // Control
        if self.control.tick_hz == 0 {
            eyre::bail!("control.tick_hz must be > 0");
        }
        if self.control.tick_hz > 1000 {
            eyre::bail!("control.tick_hz is unreasonably large (>1000)");
        }
        if !(0..=180).contains(&self.control.initial_angle_deg) {
            eyre::bail!("control.initial_angle_deg must be in [0, 180]");
        }

        // Hardware
        let hw = &self.hardware;
        if hw.servo_min_pulse_us >= hw.servo_max_pulse_us {
            eyre::bail!("hardware.servo_min_pulse_us must be < servo_max_pulse_us");
        }
        if hw.servo_hz == 0 {
            eyre::bail!("hardware.servo_hz must be > 0");
        }
        let period_us = 1_000_000 / hw.servo_hz;
        if hw.servo_max_pulse_us >= period_us {
            eyre::bail!("hardware.servo_max_pulse_us must be shorter than the servo period");
        }
        let mut channels: Vec<u8> = hw.ldr_channels.to_vec();
        channels.push(hw.panel_channel);
        if let Some(ch) = channels.iter().find(|c| **c > MAX_ADC_CHANNEL) {
            eyre::bail!("hardware ADC channel {ch} out of range (0..={MAX_ADC_CHANNEL})");
        }
        channels.sort_unstable();
        if channels.windows(2).any(|w| w[0] == w[1]) {
            eyre::bail!("hardware ADC channels must be distinct");
        }
        if hw.spi_clock_hz == 0 {
            eyre::bail!("hardware.spi_clock_hz must be > 0");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}
