//! Wiring: typed config -> core config, backend construction, and the
//! run/export/self-check command bodies.

use std::path::{Path, PathBuf};
use std::time::Duration;

use eyre::WrapErr;
use pitctl_config::{Calibration, Config};
use pitctl_core::config::{
    AlarmCfg, CoreConfig, DamperCfg, FanCfg, FireOutCfg, LidCfg, PidCfg, ProbeCfg, SamplerCfg,
    SessionCfg, Unit,
};
use pitctl_core::error::Result;
use pitctl_core::hw_error::map_port_error;
use pitctl_core::{BoxedController, PitBuilder};
use pitctl_hardware::FileSessionStore;
use pitctl_traits::ProbeAdc;

use crate::cli::ExportFormat;

/// Session file fallback when the config does not name one.
fn default_session_path() -> PathBuf {
    std::env::temp_dir().join("pitctl_session.bin")
}

pub fn session_path(cfg: &Config) -> PathBuf {
    cfg.session
        .file
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(default_session_path)
}

/// Map the TOML surface onto the core config, applying calibration-CSV
/// overrides on top of the per-probe TOML values.
pub fn core_config(cfg: &Config, calibration: Option<&Calibration>) -> Result<CoreConfig> {
    if cfg.probes.len() != 3 {
        eyre::bail!(
            "config must declare exactly 3 probes (pit, meat1, meat2), found {}",
            cfg.probes.len()
        );
    }

    let mut probes: [ProbeCfg; 3] = std::array::from_fn(|i| {
        let p = &cfg.probes[i];
        ProbeCfg {
            name: p.name.clone(),
            a: p.a,
            b: p.b,
            c: p.c,
            offset: p.offset,
        }
    });

    if let Some(cal) = calibration {
        for (probe, overrides) in probes.iter_mut().zip(cal.probes.iter()) {
            if let Some(a) = overrides.a {
                probe.a = a;
            }
            if let Some(b) = overrides.b {
                probe.b = b;
            }
            if let Some(c) = overrides.c {
                probe.c = c;
            }
            if let Some(offset) = overrides.offset {
                probe.offset = offset;
            }
        }
    }

    Ok(CoreConfig {
        unit: if cfg.is_fahrenheit() {
            Unit::Fahrenheit
        } else {
            Unit::Celsius
        },
        setpoint: cfg.setpoint,
        pid: PidCfg {
            kp: cfg.pid.kp,
            ki: cfg.pid.ki,
            kd: cfg.pid.kd,
            sample_ms: cfg.pid.sample_ms,
        },
        lid: LidCfg {
            drop_pct: cfg.lid.drop_pct,
            recover_pct: cfg.lid.recover_pct,
        },
        fan: FanCfg {
            on_threshold: cfg.fan.on_threshold,
            min_speed: cfg.fan.min_speed,
            kickstart_pct: cfg.fan.kickstart_pct,
            kickstart_ms: cfg.fan.kickstart_ms,
            longpulse_threshold: cfg.fan.longpulse_threshold,
            longpulse_cycle_ms: cfg.fan.longpulse_cycle_ms,
        },
        damper: DamperCfg {
            closed_deg: cfg.damper.closed_deg,
            open_deg: cfg.damper.open_deg,
            min_us: cfg.damper.min_us,
            max_us: cfg.damper.max_us,
        },
        alarm: AlarmCfg {
            pit_band: cfg.alarms.pit_band,
            buzzer_freq: cfg.alarms.buzzer_freq,
            buzzer_on_ms: cfg.alarms.buzzer_on_ms,
            buzzer_off_ms: cfg.alarms.buzzer_off_ms,
            ..AlarmCfg::default()
        },
        fireout: FireOutCfg {
            rate_per_min: cfg.fireout.rate_per_min,
            duration_ms: cfg.fireout.duration_ms,
        },
        session: SessionCfg {
            capacity: cfg.session.capacity,
            sample_interval_ms: cfg.session.sample_interval_ms,
            flush_interval_ms: cfg.session.flush_interval_ms,
        },
        sampler: SamplerCfg {
            interval_ms: cfg.sampler.interval_ms,
            reference_ohms: cfg.sampler.reference_ohms,
            adc_max: cfg.sampler.adc_max,
            open_threshold: cfg.sampler.open_threshold,
            short_threshold: cfg.sampler.short_threshold,
        },
        probes,
        ..CoreConfig::default()
    })
}

/// Assemble a controller over the compiled-in backend (simulation unless the
/// `hardware` feature is active in `pitctl_hardware`).
pub fn build(cfg: &Config, calibration: Option<&Calibration>) -> Result<BoxedController> {
    let core_cfg = core_config(cfg, calibration)?;
    let store = FileSessionStore::new(session_path(cfg));

    PitBuilder::new()
        .with_adc(pitctl_hardware::SimProbes::from_env())
        .with_fan(pitctl_hardware::SimFan::new())
        .with_damper(pitctl_hardware::SimServo::new())
        .with_buzzer(pitctl_hardware::SimBuzzer::new())
        .with_store(store)
        .with_config(core_cfg)
        .build()
}

pub fn run(
    cfg: &Config,
    calibration: Option<&Calibration>,
    setpoint: Option<f32>,
    duration_s: Option<u64>,
    new_session: bool,
    snapshot: bool,
) -> Result<()> {
    let mut controller = build(cfg, calibration).wrap_err("building controller")?;
    controller.begin();

    if let Some(deg) = setpoint {
        controller.set_setpoint(deg);
    }
    if new_session {
        controller.start_session();
    }

    tracing::info!(
        setpoint = controller.setpoint(),
        duration_s,
        "control loop start"
    );

    match duration_s {
        Some(secs) => controller.run_for(Duration::from_secs(secs)),
        None => loop {
            controller.run_for(Duration::from_secs(3600));
        },
    }

    controller.end_session();

    if snapshot {
        let frame = controller.snapshot();
        println!("{}", serde_json::to_string_pretty(&frame)?);
    }
    println!("run complete");
    Ok(())
}

pub fn export(cfg: &Config, format: ExportFormat, out: Option<&Path>) -> Result<()> {
    let store = FileSessionStore::new(session_path(cfg));
    let mut session = pitctl_core::CookSession::new(
        store,
        SessionCfg {
            capacity: cfg.session.capacity,
            sample_interval_ms: cfg.session.sample_interval_ms,
            flush_interval_ms: cfg.session.flush_interval_ms,
        },
    );
    session.begin();

    if session.count() == 0 {
        eyre::bail!("no recorded session at {}", session_path(cfg).display());
    }

    let start = chrono::DateTime::from_timestamp(i64::from(session.start_epoch()), 0)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| String::from("unknown"));
    tracing::info!(points = session.count(), start = %start, "exporting session");

    let body = match format {
        ExportFormat::Csv => session.to_csv(),
        ExportFormat::Json => session.to_json()?,
    };

    match out {
        Some(path) => std::fs::write(path, body).wrap_err("writing export file")?,
        None => print!("{body}"),
    }
    Ok(())
}

pub fn self_check(cfg: &Config, calibration: Option<&Calibration>) -> Result<()> {
    // Config maps cleanly onto the core (this also validates ranges).
    let core_cfg = core_config(cfg, calibration)?;
    let _ = pitctl_core::builder::build_controller(
        pitctl_hardware::SimProbes::from_env(),
        pitctl_hardware::SimFan::new(),
        pitctl_hardware::SimServo::new(),
        pitctl_hardware::SimBuzzer::new(),
        FileSessionStore::new(session_path(cfg)),
        core_cfg,
        None,
    )
    .wrap_err("assembling controller")?;

    // Every probe channel answers.
    let mut adc = pitctl_hardware::SimProbes::from_env();
    for channel in 0..3u8 {
        adc.read(channel)
            .map_err(|e| eyre::Report::new(map_port_error(&*e)))
            .wrap_err_with(|| format!("probe channel {channel}"))?;
    }

    println!("self-check ok");
    Ok(())
}
