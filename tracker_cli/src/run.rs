//! Hardware assembly, the `run` request loop, and the deterministic `simulate` driver.

use std::io::{BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use eyre::WrapErr;
use tracker_config::Config;
use tracker_core::{
    CalibrationTable, ControlLoop, LoopCfg, PanelCfg, StatusService, TrackerBuilder, TrackerCore,
};
use tracker_hardware::SimRig;
use tracker_traits::{Actuator, LightSensors, MonotonicClock, PanelAdc};

use crate::cli::{CliError, SimulateArgs};
use crate::rt;

/// How often the request loop checks the shutdown flag.
const POLL: Duration = Duration::from_millis(50);

/// Type-erased seams so `run` is one code path for the Pi and the sim rig.
pub type Rig = (
    Box<dyn LightSensors + Send>,
    Box<dyn PanelAdc + Send>,
    Box<dyn Actuator + Send>,
);

fn sensor_layout(cfg: &Config) -> ([i32; 4], [i32; 4]) {
    let mut mounts = [0; 4];
    let mut ceilings = [0; 4];
    for (i, s) in cfg.sensors.iter().take(4).enumerate() {
        mounts[i] = s.mount_angle_deg;
        ceilings[i] = s.calibrated_max;
    }
    (mounts, ceilings)
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub fn make_rig(cfg: &Config) -> eyre::Result<Rig> {
    use std::sync::Mutex;
    use tracker_hardware::mcp3208::{AdcLightSensors, AdcPanel, Mcp3208};
    use tracker_hardware::servo::PwmServo;

    let hw = &cfg.hardware;
    let adc = Mcp3208::new(hw.spi_clock_hz)
        .map_err(|e| CliError::HardwareInit(format!("open spi: {e}")))?;
    let adc = Arc::new(Mutex::new(adc));
    let servo = PwmServo::new(
        hw.servo_pin,
        hw.servo_hz,
        hw.servo_min_pulse_us,
        hw.servo_max_pulse_us,
    )
    .map_err(|e| CliError::HardwareInit(format!("servo pin {}: {e}", hw.servo_pin)))?;
    tracing::info!(
        servo_pin = hw.servo_pin,
        panel_channel = hw.panel_channel,
        "hardware rig initialized"
    );
    Ok((
        Box::new(AdcLightSensors::new(Arc::clone(&adc), hw.ldr_channels)),
        Box::new(AdcPanel::new(adc, hw.panel_channel)),
        Box::new(servo),
    ))
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
pub fn make_rig(cfg: &Config) -> eyre::Result<Rig> {
    let (mounts, ceilings) = sensor_layout(cfg);
    let rig = SimRig::from_env(mounts, ceilings);
    tracing::info!(sun_deg = rig.sun_deg(), "using simulated rig");
    Ok((
        Box::new(rig.sensors()),
        Box::new(rig.panel_adc()),
        Box::new(rig.servo()),
    ))
}

/// Map the validated config into a core and its status facade.
pub fn build_core<L, P, A>(
    cfg: &Config,
    sensors: L,
    panel_adc: P,
    actuator: A,
) -> eyre::Result<(TrackerCore<L, P, A>, StatusService)>
where
    L: LightSensors,
    P: PanelAdc,
    A: Actuator,
{
    let calibration = CalibrationTable::try_from(cfg.sensors.as_slice())?;
    let (core, link) = TrackerBuilder::new()
        .with_calibration(calibration)
        .with_panel(PanelCfg::from(&cfg.panel))
        .with_loop(LoopCfg::from(&cfg.control))
        .with_sensors(sensors)
        .with_panel_adc(panel_adc)
        .with_actuator(actuator)
        .build()?;
    let service = StatusService::new(link, cfg.status.history_order.into())
        .with_root_page(tracker_ui::DASHBOARD_HTML);
    Ok((core, service))
}

/// Extract the request target from `GET /path HTTP/1.1` or a bare `/path`.
pub fn request_target(line: &str) -> Option<&str> {
    let line = line.trim();
    let line = line.strip_prefix("GET ").unwrap_or(line);
    line.split_whitespace().next()
}

/// Answer one request line; blank lines are ignored.
pub fn serve_line(service: &mut StatusService, line: &str, out: &mut impl Write) -> eyre::Result<()> {
    let Some(target) = request_target(line) else {
        return Ok(());
    };
    let resp = service.handle(target);
    tracing::debug!(target, status = resp.status, "request served");
    writeln!(out, "{}", resp.body).wrap_err("write response")?;
    out.flush().wrap_err("flush stdout")
}

fn spawn_stdin_reader() -> eyre::Result<Receiver<String>> {
    let (tx, rx) = crossbeam_channel::bounded(16);
    std::thread::Builder::new()
        .name("stdin-reader".into())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(l) => {
                        if tx.send(l).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "stdin read failed");
                        break;
                    }
                }
            }
        })
        .wrap_err("spawn stdin reader")?;
    Ok(rx)
}

/// Run the control loop in real time and serve stdin requests until Ctrl-C
/// (or end of input with `exit_on_eof`).
pub fn run(cfg: &Config, exit_on_eof: bool, cpu: Option<usize>) -> eyre::Result<()> {
    let (sensors, panel_adc, actuator) = make_rig(cfg)?;
    let (core, mut service) = build_core(cfg, sensors, panel_adc, actuator)?;

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = Arc::clone(&shutdown);
        if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
            tracing::warn!(error = %e, "failed to install Ctrl-C handler");
        }
    }

    let cpu = cpu.or(cfg.rt.control_cpu);
    let control = ControlLoop::spawn_with(core, MonotonicClock::new(), move || {
        rt::pin_control_thread(cpu);
    })?;
    let requests = spawn_stdin_reader()?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut eof_logged = false;
    while !shutdown.load(Ordering::Relaxed) {
        match requests.recv_timeout(POLL) {
            Ok(line) => serve_line(&mut service, &line, &mut out)?,
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                if exit_on_eof {
                    break;
                }
                if !eof_logged {
                    tracing::info!("stdin closed; running until Ctrl-C");
                    eof_logged = true;
                }
                std::thread::sleep(POLL);
            }
        }
    }

    let (ticks, overruns) = (control.ticks(), control.overruns());
    control.stop();
    tracing::info!(ticks, overruns, "control loop stopped");
    Ok(())
}

/// Step the controller against a sim rig with no thread and no sleeping.
pub fn simulate(cfg: &Config, args: &SimulateArgs) -> eyre::Result<()> {
    let (mounts, ceilings) = sensor_layout(cfg);
    let rig = SimRig::new(mounts, ceilings, args.sun);
    rig.set_sweep_mdeg(args.sweep);

    let (mut core, mut service) = build_core(cfg, rig.sensors(), rig.panel_adc(), rig.servo())?;
    for query in &args.control {
        let query = query.trim_start_matches('?');
        service.handle(&format!("/control?{query}"));
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    core.begin();
    for i in 1..=args.ticks {
        core.tick();
        if args.every > 0 && i % args.every == 0 {
            writeln!(out, "{}", service.status()).wrap_err("write status")?;
        }
    }
    tracing::info!(
        ticks = core.seq(),
        sun_deg = rig.sun_deg(),
        angle = core.position(),
        faults = core.fault_count(),
        "simulation finished"
    );

    writeln!(out, "{}", service.status()).wrap_err("write status")?;
    if args.gauge {
        writeln!(out, "{}", tracker_ui::angle_gauge(core.position(), 37)).wrap_err("write gauge")?;
    }
    if args.history {
        writeln!(out, "{}", service.history()).wrap_err("write history")?;
    }
    Ok(())
}

/// Build the rig, run a few ticks and report. Hardware failures surface as
/// `CliError::HardwareInit`.
pub fn self_check(cfg: &Config) -> eyre::Result<()> {
    const TICKS: u32 = 5;

    let (sensors, panel_adc, actuator) = make_rig(cfg)?;
    let (mut core, mut service) = build_core(cfg, sensors, panel_adc, actuator)?;
    core.begin();
    for _ in 0..TICKS {
        core.tick();
    }
    let faults = core.fault_count();
    if faults > 0 {
        return Err(CliError::HardwareInit(format!(
            "{faults} hardware faults in {TICKS} ticks"
        ))
        .into());
    }
    println!("self-check OK");
    println!("{}", service.status());
    Ok(())
}
