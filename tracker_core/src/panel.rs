//! Panel voltage sampling and the derived power estimate.

use crate::config::PanelCfg;

/// Latest panel measurement. `power` is an estimate from an assumed current.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PanelState {
    pub voltage: f32,
    pub power: f32,
}

#[derive(Debug, Clone, Default)]
pub struct PanelVoltageSampler {
    cfg: PanelCfg,
}

impl PanelVoltageSampler {
    pub fn new(cfg: PanelCfg) -> Self {
        Self { cfg }
    }

    pub fn cfg(&self) -> &PanelCfg {
        &self.cfg
    }

    /// Reconstruct panel volts from a raw ADC count.
    ///
    /// raw → `[0, reference_v]` at the ADC pin → × divider ratio → clamp to
    /// `[0, max_voltage]`. The clamp absorbs reference noise and divider error.
    pub fn sample(&self, raw_adc: i32) -> f32 {
        let full_scale = self.cfg.adc_full_scale.max(1) as f32;
        let v_adc = (raw_adc as f32 / full_scale) * self.cfg.reference_v;
        let v = v_adc * self.cfg.divider_ratio;
        if !v.is_finite() {
            return 0.0;
        }
        v.clamp(0.0, self.cfg.max_voltage)
    }

    #[inline]
    pub fn power(&self, voltage: f32) -> f32 {
        voltage * self.cfg.assumed_current_a
    }

    pub fn measure(&self, raw_adc: i32) -> PanelState {
        let voltage = self.sample(raw_adc);
        PanelState {
            voltage,
            power: self.power(voltage),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_scale_clamps_to_twelve_volts() {
        // 3.3 V * 11 = 36.3 V before the clamp
        let s = PanelVoltageSampler::default();
        assert!((s.sample(4095) - 12.0).abs() < 1e-6);
    }

    #[test]
    fn mid_scale_is_linear() {
        let s = PanelVoltageSampler::default();
        // 1000 / 4095 * 3.3 * 11 ≈ 8.864
        let v = s.sample(1000);
        assert!((v - 8.864).abs() < 0.01, "v = {v}");
        let p = s.measure(1000);
        assert!((p.power - v * 0.8).abs() < 1e-6);
    }

    #[test]
    fn negative_raw_clamps_to_zero() {
        let s = PanelVoltageSampler::default();
        assert_eq!(s.sample(-10), 0.0);
        assert_eq!(s.measure(0), PanelState::default());
    }
}
