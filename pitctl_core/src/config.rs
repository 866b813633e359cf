//! Configuration structs consumed by the control kernel.
//!
//! These are plain value types with compiled-in defaults; the typed TOML
//! surface lives in `pitctl_config` and is mapped onto these by the caller.

/// Temperature unit for every user-facing degree value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Unit {
    #[default]
    Fahrenheit,
    Celsius,
}

/// PID gains and sample cadence.
#[derive(Debug, Clone)]
pub struct PidCfg {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
    pub sample_ms: u64,
}

impl Default for PidCfg {
    fn default() -> Self {
        Self {
            kp: 4.0,
            ki: 0.02,
            kd: 5.0,
            sample_ms: 1000,
        }
    }
}

/// Lid-open detection thresholds, as percentages of the setpoint.
#[derive(Debug, Clone)]
pub struct LidCfg {
    /// Drop below setpoint*(1 - drop_pct/100) opens.
    pub drop_pct: f32,
    /// Recovery to setpoint*(1 - recover_pct/100) closes.
    pub recover_pct: f32,
}

impl Default for LidCfg {
    fn default() -> Self {
        Self {
            drop_pct: 6.0,
            recover_pct: 2.0,
        }
    }
}

/// Fan actuator configuration (split-range knee, kick-start, long-pulse).
#[derive(Debug, Clone)]
pub struct FanCfg {
    /// PID output above which the fan engages (split-range knee, percent).
    pub on_threshold: f32,
    /// Lowest sustained speed the blower can hold (percent).
    pub min_speed: f32,
    /// Duty applied during the kick-start burst (percent).
    pub kickstart_pct: f32,
    pub kickstart_ms: u64,
    /// Targets below this run in long-pulse mode (percent).
    pub longpulse_threshold: f32,
    pub longpulse_cycle_ms: u64,
}

impl Default for FanCfg {
    fn default() -> Self {
        Self {
            on_threshold: 70.0,
            min_speed: 15.0,
            kickstart_pct: 75.0,
            kickstart_ms: 500,
            longpulse_threshold: 10.0,
            longpulse_cycle_ms: 10_000,
        }
    }
}

/// Butterfly-damper servo geometry and pulse range.
#[derive(Debug, Clone)]
pub struct DamperCfg {
    pub closed_deg: u8,
    pub open_deg: u8,
    pub min_us: u16,
    pub max_us: u16,
}

impl Default for DamperCfg {
    fn default() -> Self {
        Self {
            closed_deg: 0,
            open_deg: 90,
            min_us: 500,
            max_us: 2500,
        }
    }
}

/// Alarm band, buzzer cadence, and pit-approach window.
#[derive(Debug, Clone)]
pub struct AlarmCfg {
    /// Symmetric deadband around the setpoint (degrees).
    pub pit_band: f32,
    /// |pit - setpoint| at which the pit counts as "reached" (degrees).
    pub reached_window: f32,
    pub buzzer_freq: u16,
    pub buzzer_on_ms: u64,
    pub buzzer_off_ms: u64,
}

impl Default for AlarmCfg {
    fn default() -> Self {
        Self {
            pit_band: 15.0,
            reached_window: 5.0,
            buzzer_freq: 2000,
            buzzer_on_ms: 500,
            buzzer_off_ms: 500,
        }
    }
}

/// Fire-out detection: sustained decline under a saturated fan.
#[derive(Debug, Clone)]
pub struct FireOutCfg {
    /// Minimum decline rate, degrees per minute.
    pub rate_per_min: f32,
    /// Decline must persist this long before the fault is raised.
    pub duration_ms: u64,
}

impl Default for FireOutCfg {
    fn default() -> Self {
        Self {
            rate_per_min: 5.0,
            duration_ms: 600_000,
        }
    }
}

/// Meat-completion predictor cadence.
#[derive(Debug, Clone)]
pub struct PredictorCfg {
    pub sample_interval_ms: u64,
}

impl Default for PredictorCfg {
    fn default() -> Self {
        Self {
            sample_interval_ms: 5000,
        }
    }
}

/// Cook-session ring sizing and cadences.
#[derive(Debug, Clone)]
pub struct SessionCfg {
    /// Ring capacity in points. 5760 holds 8 hours at the 5 s cadence.
    pub capacity: usize,
    pub sample_interval_ms: u64,
    pub flush_interval_ms: u64,
}

impl Default for SessionCfg {
    fn default() -> Self {
        Self {
            capacity: 5760,
            sample_interval_ms: 5000,
            flush_interval_ms: 60_000,
        }
    }
}

/// ADC front-end: divider reference, full-scale counts, fault thresholds.
#[derive(Debug, Clone)]
pub struct SamplerCfg {
    pub interval_ms: u64,
    /// Divider reference resistor (ohms).
    pub reference_ohms: f32,
    /// Full-scale ADC counts (single-ended).
    pub adc_max: i32,
    /// Counts at or above this classify as an open probe.
    pub open_threshold: i32,
    /// Counts at or below this classify as a shorted probe.
    pub short_threshold: i32,
}

impl Default for SamplerCfg {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            reference_ohms: 10_000.0,
            adc_max: 32_767,
            open_threshold: 32_000,
            short_threshold: 200,
        }
    }
}

/// Per-probe Steinhart-Hart coefficients and calibration offset.
#[derive(Debug, Clone)]
pub struct ProbeCfg {
    pub name: String,
    pub a: f64,
    pub b: f64,
    pub c: f64,
    /// Additive calibration offset, degrees in the configured unit.
    pub offset: f32,
}

impl ProbeCfg {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

impl Default for ProbeCfg {
    fn default() -> Self {
        // 100 kOhm food-probe curve.
        Self {
            name: String::from("Probe"),
            a: 7.739_251_279e-4,
            b: 2.088_025_997e-4,
            c: 1.154_400_438e-7,
            offset: 0.0,
        }
    }
}

/// Aggregate configuration for the whole kernel.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub unit: Unit,
    /// Initial pit setpoint, degrees.
    pub setpoint: f32,
    pub pid: PidCfg,
    pub lid: LidCfg,
    pub fan: FanCfg,
    pub damper: DamperCfg,
    pub alarm: AlarmCfg,
    pub fireout: FireOutCfg,
    pub predictor: PredictorCfg,
    pub session: SessionCfg,
    pub sampler: SamplerCfg,
    pub probes: [ProbeCfg; 3],
    pub snapshot_interval_ms: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            unit: Unit::Fahrenheit,
            setpoint: 225.0,
            pid: PidCfg::default(),
            lid: LidCfg::default(),
            fan: FanCfg::default(),
            damper: DamperCfg::default(),
            alarm: AlarmCfg::default(),
            fireout: FireOutCfg::default(),
            predictor: PredictorCfg::default(),
            session: SessionCfg::default(),
            sampler: SamplerCfg::default(),
            probes: [
                ProbeCfg::named("Pit"),
                ProbeCfg::named("Meat 1"),
                ProbeCfg::named("Meat 2"),
            ],
            snapshot_interval_ms: 1000,
        }
    }
}
