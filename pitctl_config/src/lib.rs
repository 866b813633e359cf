//! Typed configuration for the pit controller.
//!
//! The TOML schema mirrors the on-device config file. Sections with sane
//! compiled-in values are optional; tuning-critical sections (pid, fan,
//! alarms, sampler, probes) must be present. Mapping onto
//! `pitctl_core::CoreConfig` happens in the binary crate.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Pid {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
    pub sample_ms: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Lid {
    pub drop_pct: f32,
    pub recover_pct: f32,
}

impl Default for Lid {
    fn default() -> Self {
        Self {
            drop_pct: 6.0,
            recover_pct: 2.0,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Fan {
    pub on_threshold: f32,
    pub min_speed: f32,
    pub kickstart_pct: f32,
    pub kickstart_ms: u64,
    pub longpulse_threshold: f32,
    pub longpulse_cycle_ms: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Damper {
    pub closed_deg: u8,
    pub open_deg: u8,
    pub min_us: u16,
    pub max_us: u16,
}

impl Default for Damper {
    fn default() -> Self {
        Self {
            closed_deg: 0,
            open_deg: 90,
            min_us: 500,
            max_us: 2500,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Alarms {
    pub pit_band: f32,
    pub buzzer_freq: u16,
    pub buzzer_on_ms: u64,
    pub buzzer_off_ms: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FireOut {
    pub rate_per_min: f32,
    pub duration_ms: u64,
}

impl Default for FireOut {
    fn default() -> Self {
        Self {
            rate_per_min: 5.0,
            duration_ms: 600_000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Session {
    pub capacity: usize,
    pub sample_interval_ms: u64,
    pub flush_interval_ms: u64,
    /// Session file path; the sim backend keeps it in a temp directory when
    /// unset.
    pub file: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            capacity: 5760,
            sample_interval_ms: 5000,
            flush_interval_ms: 60_000,
            file: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Sampler {
    pub interval_ms: u64,
    pub reference_ohms: f32,
    pub adc_max: i32,
    pub open_threshold: i32,
    pub short_threshold: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Probe {
    pub name: String,
    pub a: f64,
    pub b: f64,
    pub c: f64,
    #[serde(default)]
    pub offset: f32,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    /// "F" or "C".
    pub units: String,
    pub setpoint: f32,
    pub pid: Pid,
    #[serde(default)]
    pub lid: Lid,
    pub fan: Fan,
    #[serde(default)]
    pub damper: Damper,
    pub alarms: Alarms,
    #[serde(default)]
    pub fireout: FireOut,
    #[serde(default)]
    pub session: Session,
    pub sampler: Sampler,
    /// Exactly three entries: pit, meat1, meat2.
    pub probes: Vec<Probe>,
    #[serde(default)]
    pub logging: Logging,
}

impl Config {
    pub fn is_fahrenheit(&self) -> bool {
        self.units.starts_with('F') || self.units.starts_with('f')
    }
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Per-probe coefficient/offset overrides loaded from a calibration CSV.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProbeCalibration {
    pub a: Option<f64>,
    pub b: Option<f64>,
    pub c: Option<f64>,
    pub offset: Option<f32>,
}

/// Calibration rows for the three probe slots.
#[derive(Debug, Default, Clone, Copy)]
pub struct Calibration {
    pub probes: [ProbeCalibration; 3],
}

/// Strict-format calibration CSV: header `probe,field,value`, probe in
/// {pit, meat1, meat2}, field in {a, b, c, offset}. Unknown names or
/// non-numeric values are data errors.
pub fn load_calibration_csv(path: &std::path::Path) -> std::io::Result<Calibration> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;

    {
        let headers = rdr.headers().map_err(|_| std::io::ErrorKind::InvalidData)?;
        if headers != vec!["probe", "field", "value"] {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "calibration CSV must have headers 'probe,field,value'",
            ));
        }
    }

    let mut cal = Calibration::default();
    for rec in rdr.deserialize::<(String, String, String)>() {
        let (probe, field, value) = rec.map_err(|_| std::io::ErrorKind::InvalidData)?;

        let slot = match probe.as_str() {
            "pit" => 0,
            "meat1" => 1,
            "meat2" => 2,
            _ => return Err(std::io::ErrorKind::InvalidData.into()),
        };

        let entry = &mut cal.probes[slot];
        match field.as_str() {
            "a" | "b" | "c" => {
                let v: f64 = value
                    .parse()
                    .map_err(|_| std::io::ErrorKind::InvalidData)?;
                match field.as_str() {
                    "a" => entry.a = Some(v),
                    "b" => entry.b = Some(v),
                    _ => entry.c = Some(v),
                }
            }
            "offset" => {
                entry.offset = Some(
                    value
                        .parse::<f32>()
                        .map_err(|_| std::io::ErrorKind::InvalidData)?,
                );
            }
            _ => return Err(std::io::ErrorKind::InvalidData.into()),
        }
    }

    Ok(cal)
}
