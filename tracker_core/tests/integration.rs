//! End-to-end: mocked hardware → TrackerCore ticks → StatusService queries.

use rstest::rstest;
use serde_json::Value;
use tracker_core::mocks::{Failing, RecordingActuator, ScriptedLightSensors, ScriptedPanelAdc};
use tracker_core::{
    HISTORY_LEN, HistoryOrder, LoopCfg, Mode, StatusService, TrackerBuilder, TrackerCore,
};

type MockCore = TrackerCore<ScriptedLightSensors, ScriptedPanelAdc, RecordingActuator>;

struct Rig {
    core: MockCore,
    svc: StatusService,
    sensors: ScriptedLightSensors,
    panel: ScriptedPanelAdc,
    actuator: RecordingActuator,
}

fn rig_with(order: HistoryOrder) -> Rig {
    let sensors = ScriptedLightSensors::new([2000, 3000, 2700, 1000]);
    let panel = ScriptedPanelAdc::new(1000);
    let actuator = RecordingActuator::new();
    let (mut core, link) = TrackerBuilder::new()
        .with_sensors(sensors.clone())
        .with_panel_adc(panel.clone())
        .with_actuator(actuator.clone())
        .build()
        .unwrap();
    core.begin();
    Rig {
        core,
        svc: StatusService::new(link, order),
        sensors,
        panel,
        actuator,
    }
}

fn rig() -> Rig {
    rig_with(HistoryOrder::Chronological)
}

fn data(svc: &mut StatusService) -> Value {
    serde_json::from_str(&svc.handle("/data").body).unwrap()
}

#[test]
fn balanced_light_holds_ninety() {
    let mut r = rig();
    for _ in 0..10 {
        let t = r.core.tick();
        assert_eq!(t.fused.angle_deg, 90);
        assert_eq!(t.angle_deg, 90);
    }
    assert!(r.actuator.writes().iter().all(|a| *a == 90));
}

#[test]
fn manual_override_converges_regardless_of_sensors() {
    let mut r = rig();
    assert_eq!(r.svc.handle("/control?mode=manual&angle=45").body, "OK");
    assert_eq!(r.svc.pending_mode(), Mode::Manual { setpoint_deg: 45 });

    for i in 0..45 {
        // keep the sensors pointing somewhere else entirely
        let bright = if i % 2 == 0 { [0, 0, 0, 1000] } else { [2000, 0, 0, 0] };
        r.sensors.set(bright);
        r.core.tick();
    }
    assert_eq!(r.core.position(), 45);
    let d = data(&mut r.svc);
    assert_eq!(d["mode"], "manual");
    assert_eq!(d["angle"], 45);

    // sensors still sampled and published in manual mode
    r.sensors.set([0, 0, 0, 999]);
    r.core.tick();
    let d = data(&mut r.svc);
    assert_eq!(d["ldr"], serde_json::json!([0, 0, 0, 999]));
    assert_eq!(r.core.position(), 45);
}

#[test]
fn status_reports_target_while_actuator_slews() {
    let mut r = rig();
    r.svc.control("mode=manual&angle=45");
    r.core.tick();
    assert_eq!(r.core.position(), 89);
    let d = data(&mut r.svc);
    assert_eq!(d["angle"], 45);
    assert_eq!(d["mode"], "manual");
    assert_eq!(r.svc.snapshot().angle_deg, 89);
}

#[test]
fn status_reader_tracks_every_published_tick() {
    let mut r = rig();
    for _ in 0..10 {
        r.core.tick();
        assert_eq!(r.svc.snapshot().seq, r.core.seq());
    }
    assert_eq!(r.core.seq(), 10);
}

#[test]
fn auto_command_resumes_tracking() {
    let mut r = rig();
    r.svc.control("mode=manual&angle=60");
    for _ in 0..30 {
        r.core.tick();
    }
    assert_eq!(r.core.position(), 60);
    r.svc.control("mode=auto");
    r.sensors.set([0, 0, 0, 1000]);
    for _ in 0..90 {
        r.core.tick();
    }
    assert_eq!(r.core.position(), 150);
    assert_eq!(data(&mut r.svc)["mode"], "auto");
}

#[rstest]
#[case("mode=sideways")]
#[case("mode=MANUAL")]
#[case("mode=")]
#[case("angle=abc")]
#[case("")]
fn unknown_mode_values_leave_mode_unchanged(#[case] query: &str) {
    let mut r = rig();
    r.svc.control("mode=manual&angle=30");
    assert_eq!(r.svc.handle(&format!("/control?{query}")).body, "OK");
    assert_eq!(r.svc.pending_mode(), Mode::Manual { setpoint_deg: 30 });
}

#[rstest]
#[case("angle=999", 180)]
#[case("angle=-5", 0)]
#[case("angle=+12", 12)]
#[case("angle=%20", 90)]
#[case("angle=%2D5", 0)]
#[case("angle=%2B12", 12)]
fn setpoint_is_clamped(#[case] query: &str, #[case] expected: i32) {
    let mut r = rig();
    r.svc.control(&format!("mode=manual&{query}"));
    assert_eq!(r.svc.pending_mode(), Mode::Manual { setpoint_deg: expected });
}

#[test]
fn status_schema_uses_two_decimal_floats() {
    let mut r = rig();
    r.panel.set(4095);
    r.core.tick();
    let body = r.svc.handle("/data").body;
    // 4095 counts → clamped 12 V, 0.8 A assumed
    assert!(body.starts_with(r#"{"voltage":12.00,"power":9.60,"angle":90,"mode":"auto","ldr":["#), "{body}");
    let v: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v.as_object().unwrap().len(), 5);
    assert_eq!(v["ldr"].as_array().unwrap().len(), 4);
}

#[test]
fn history_has_sixty_entries_in_configured_order() {
    let mut r = rig_with(HistoryOrder::Chronological);
    r.panel.set(4095);
    r.core.tick();
    let hist: Vec<f64> = serde_json::from_str(&r.svc.handle("/history").body).unwrap();
    assert_eq!(hist.len(), HISTORY_LEN);
    assert!((hist[HISTORY_LEN - 1] - 12.0).abs() < 1e-9);
    assert!(hist[..HISTORY_LEN - 1].iter().all(|v| *v == 0.0));

    let mut r = rig_with(HistoryOrder::Storage);
    r.panel.set(4095);
    r.core.tick();
    let hist: Vec<f64> = serde_json::from_str(&r.svc.handle("/history").body).unwrap();
    assert_eq!(hist.len(), HISTORY_LEN);
    assert!((hist[0] - 12.0).abs() < 1e-9);
}

#[test]
fn routing_and_not_found() {
    let mut r = rig();
    let root = r.svc.handle("/");
    assert_eq!(root.status, 200);
    assert_eq!(root.content_type, "text/html");
    let svc = StatusService::new(
        {
            let (_core, link) = TrackerBuilder::new()
                .with_sensors(ScriptedLightSensors::default())
                .with_panel_adc(ScriptedPanelAdc::default())
                .with_actuator(RecordingActuator::new())
                .build()
                .unwrap();
            link
        },
        HistoryOrder::Chronological,
    )
    .with_root_page("<html>dash</html>");
    assert_eq!(svc.root(), "<html>dash</html>");

    let nf = r.svc.handle("/nope");
    assert_eq!(nf.status, 404);
    assert_eq!(nf.body, "Not found");
}

#[test]
fn status_before_first_tick_is_power_up_state() {
    let (_core, link) = TrackerBuilder::new()
        .with_sensors(ScriptedLightSensors::default())
        .with_panel_adc(ScriptedPanelAdc::default())
        .with_actuator(RecordingActuator::new())
        .with_loop(LoopCfg {
            tick_hz: 50,
            initial_angle_deg: 120,
        })
        .build()
        .unwrap();
    let mut svc = StatusService::new(link, HistoryOrder::Chronological);
    let d = data(&mut svc);
    assert_eq!(d["angle"], 120);
    assert_eq!(d["mode"], "auto");
    assert_eq!(d["ldr"], serde_json::json!([0, 0, 0, 0]));
}

#[test]
fn failing_hardware_holds_last_values_and_keeps_ticking() {
    let (mut core, mut link) = TrackerBuilder::new()
        .with_sensors(Failing("ldr bus down"))
        .with_panel_adc(Failing("adc timeout"))
        .with_actuator(Failing("pwm gone"))
        .build()
        .unwrap();
    core.begin();
    for _ in 0..5 {
        let t = core.tick();
        assert_eq!(t.angle_deg, 90);
        assert!(t.fused.held);
    }
    // 1 begin write + 5 ticks × (4 sensors + panel + actuator)
    assert_eq!(core.fault_count(), 31);
    assert_eq!(link.reader.latest().seq, 5);
}
