#![no_main]
use libfuzzer_sys::fuzz_target;
use tracker_core::mocks::{RecordingActuator, ScriptedLightSensors, ScriptedPanelAdc};
use tracker_core::{ControlCommand, HistoryOrder, StatusService, TrackerBuilder};

fuzz_target!(|data: &str| {
    let cmd = ControlCommand::parse(data);
    if let Some(angle) = cmd.angle {
        let _ = tracker_core::clamp_angle(angle);
    }

    let Ok((mut core, link)) = TrackerBuilder::new()
        .with_sensors(ScriptedLightSensors::default())
        .with_panel_adc(ScriptedPanelAdc::default())
        .with_actuator(RecordingActuator::default())
        .build()
    else {
        return;
    };
    let mut service = StatusService::new(link, HistoryOrder::Chronological);
    let _ = service.handle(data);
    let _ = service.handle(&format!("/control?{data}"));
    core.tick();
    assert!((0..=180).contains(&core.position()));
    let _ = service.status();
});
