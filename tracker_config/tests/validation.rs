use rstest::rstest;
use tracker_config::load_toml;

const FULL: &str = r#"
[[sensors]]
mount_angle_deg = 30
calibrated_max = 2000

[[sensors]]
mount_angle_deg = 70
calibrated_max = 3000

[[sensors]]
mount_angle_deg = 110
calibrated_max = 2700

[[sensors]]
mount_angle_deg = 150
calibrated_max = 1000

[panel]
adc_full_scale = 4095
reference_v = 3.3
divider_ratio = 11.0
max_voltage = 12.0
assumed_current_a = 0.8

[control]
tick_hz = 50
initial_angle_deg = 90

[status]
history_order = "chronological"

[hardware]
servo_pin = 25
servo_min_pulse_us = 500
servo_max_pulse_us = 2400
servo_hz = 50
ldr_channels = [0, 1, 2, 3]
panel_channel = 4
spi_clock_hz = 1000000
"#;

#[test]
fn accepts_full_stock_config() {
    let cfg = load_toml(FULL).expect("parse TOML");
    cfg.validate().expect("stock config should pass");
    assert_eq!(cfg.sensors[3].calibrated_max, 1000);
    assert_eq!(cfg.hardware.servo_pin, 25);
}

#[rstest]
#[case("[control]\ntick_hz = 0\n", "tick_hz must be > 0")]
#[case("[control]\ntick_hz = 5000\n", "unreasonably large")]
#[case("[control]\ninitial_angle_deg = 181\n", "initial_angle_deg must be in [0, 180]")]
#[case("[panel]\ndivider_ratio = 0.0\n", "divider_ratio must be a positive number")]
#[case("[panel]\nadc_full_scale = 0\n", "adc_full_scale must be > 0")]
#[case("[panel]\nassumed_current_a = -1.0\n", "assumed_current_a must be >= 0")]
#[case(
    "[hardware]\nservo_min_pulse_us = 2400\nservo_max_pulse_us = 500\n",
    "servo_min_pulse_us must be <"
)]
#[case("[hardware]\nldr_channels = [0, 1, 2, 2]\n", "must be distinct")]
#[case("[hardware]\npanel_channel = 9\n", "out of range")]
#[case("[logging]\nrotation = \"weekly\"\n", "logging.rotation")]
fn rejects_out_of_range_values(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    let msg = format!("{err}");
    assert!(msg.contains(needle), "expected '{needle}' in '{msg}'");
}

#[test]
fn rejects_wrong_sensor_count() {
    let toml = r#"
[[sensors]]
mount_angle_deg = 30
calibrated_max = 2000
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("one sensor is not enough");
    assert!(format!("{err}").contains("exactly 4 entries"));
}

#[test]
fn rejects_zero_ceiling_and_bad_mount_angle() {
    let mut cfg = load_toml(FULL).unwrap();
    cfg.sensors[1].calibrated_max = 0;
    let err = cfg.validate().expect_err("zero ceiling");
    assert!(format!("{err}").contains("sensors[1].calibrated_max"));

    let mut cfg = load_toml(FULL).unwrap();
    cfg.sensors[2].mount_angle_deg = 200;
    let err = cfg.validate().expect_err("mount angle past 180");
    assert!(format!("{err}").contains("sensors[2].mount_angle_deg"));
}

#[test]
fn unknown_history_order_is_a_parse_error() {
    assert!(load_toml("[status]\nhistory_order = \"random\"\n").is_err());
}
