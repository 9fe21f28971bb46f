use proptest::prelude::*;
use tracker_core::calibration::{CalibrationTable, SensorCalibration};
use tracker_core::fusion::{SensorFusion, SensorReading, weighted_centroid};
use tracker_core::slew::{ActuatorState, step};

prop_compose! {
    fn table_strategy()(
        mounts in prop::array::uniform4(0i32..=180),
        ceilings in prop::array::uniform4(1i32..=4095),
    ) -> CalibrationTable {
        let sensors = std::array::from_fn(|i| SensorCalibration {
            mount_angle_deg: mounts[i],
            calibrated_max: ceilings[i],
        });
        CalibrationTable::new(sensors).unwrap()
    }
}

proptest! {
    #[test]
    fn fused_angle_stays_within_lit_mounts(
        table in table_strategy(),
        raws in prop::array::uniform4(-100i32..5000),
    ) {
        let mut fusion = SensorFusion::new(table.clone(), 90);
        let t = fusion.compute(&raws);
        let lit: Vec<i32> = t
            .readings
            .iter()
            .filter(|r| r.raw > 0)
            .map(|r| r.mount_angle_deg)
            .collect();
        if let (Some(lo), Some(hi)) = (lit.iter().min(), lit.iter().max()) {
            prop_assert!(!t.held);
            prop_assert!(t.angle_deg >= *lo && t.angle_deg <= *hi,
                "angle {} outside [{}, {}]", t.angle_deg, lo, hi);
        } else {
            prop_assert!(t.held);
            prop_assert_eq!(t.angle_deg, 90);
        }
    }

    #[test]
    fn darkness_keeps_previous_angle(
        table in table_strategy(),
        raws in prop::array::uniform4(1i32..5000),
        dark_ticks in 1usize..20,
    ) {
        let mut fusion = SensorFusion::new(table, 90);
        let lit = fusion.compute(&raws).angle_deg;
        for _ in 0..dark_ticks {
            let t = fusion.compute(&[0, -3, 0, 0]);
            prop_assert_eq!(t.angle_deg, lit);
        }
    }

    #[test]
    fn readings_never_exceed_ceiling(raw in any::<i32>(), ceiling in 1i32..=i32::MAX) {
        let r = SensorReading::new(raw, SensorCalibration { mount_angle_deg: 45, calibrated_max: ceiling });
        prop_assert!(r.raw >= 0 && r.raw <= ceiling);
        prop_assert!((0.0..=1.0).contains(&r.weight()));
    }

    #[test]
    fn slew_converges_in_exactly_distance_ticks(current in 0i32..=180, target in 0i32..=180) {
        let mut s = ActuatorState::new(current);
        let distance = current.abs_diff(target);
        let mut prev = current;
        for _ in 0..distance {
            let next = s.advance(target);
            prop_assert_eq!(next.abs_diff(prev), 1);
            prop_assert!(next.abs_diff(target) < prev.abs_diff(target));
            prev = next;
        }
        prop_assert_eq!(s.current_pos_deg, target);
        prop_assert_eq!(step(s.current_pos_deg, target), target);
    }
}

#[test]
fn centroid_of_nothing_is_none() {
    assert_eq!(weighted_centroid(&[]), None);
}
