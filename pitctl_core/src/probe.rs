//! Probe signal conditioning: ADC counts -> resistance -> Steinhart-Hart ->
//! calibrated degrees, plus open/short classification.
//!
//! A disconnected probe pulls the divider to full scale and a shorted one to
//! ground, so classification happens on the raw counts before any conversion.
//! Consumers must go through `ProbeReading::temp()`, which is `None` for
//! anything but an Ok probe; the raw magnitude is never a disconnection
//! signal.

use crate::config::{ProbeCfg, SamplerCfg, Unit};
use pitctl_traits::ProbeAdc;

/// The three probe slots, in ADC-channel order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum ProbeId {
    Pit,
    Meat1,
    Meat2,
}

impl ProbeId {
    pub const ALL: [ProbeId; 3] = [ProbeId::Pit, ProbeId::Meat1, ProbeId::Meat2];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            ProbeId::Pit => 0,
            ProbeId::Meat1 => 1,
            ProbeId::Meat2 => 2,
        }
    }

    #[inline]
    pub fn channel(self) -> u8 {
        self.index() as u8
    }
}

/// The two meat slots (pit excluded); used by alarms and the predictor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeatProbe {
    Meat1,
    Meat2,
}

impl MeatProbe {
    pub const BOTH: [MeatProbe; 2] = [MeatProbe::Meat1, MeatProbe::Meat2];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            MeatProbe::Meat1 => 0,
            MeatProbe::Meat2 => 1,
        }
    }

    #[inline]
    pub fn probe_id(self) -> ProbeId {
        match self {
            MeatProbe::Meat1 => ProbeId::Meat1,
            MeatProbe::Meat2 => ProbeId::Meat2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbeStatus {
    /// Nothing attached (or not yet sampled): divider at full scale.
    #[default]
    Open,
    Ok,
    /// Divider at ground.
    Short,
}

/// One conditioned sample for one probe.
#[derive(Debug, Clone, Copy)]
pub struct ProbeReading {
    pub raw: i32,
    pub status: ProbeStatus,
    temp: f32,
}

impl ProbeReading {
    /// Calibrated temperature, `None` unless the probe reads Ok.
    #[inline]
    pub fn temp(&self) -> Option<f32> {
        (self.status == ProbeStatus::Ok).then_some(self.temp)
    }

    /// Sentinel form used only for session packing.
    #[inline]
    pub fn temp_or_zero(&self) -> f32 {
        if self.status == ProbeStatus::Ok {
            self.temp
        } else {
            0.0
        }
    }

    #[inline]
    pub fn is_ok(&self) -> bool {
        self.status == ProbeStatus::Ok
    }
}

impl Default for ProbeReading {
    fn default() -> Self {
        Self {
            raw: i32::MAX,
            status: ProbeStatus::Open,
            temp: 0.0,
        }
    }
}

/// Divider equation: R = R_ref * (adc_max / raw - 1). Zero for raw <= 0.
pub fn counts_to_resistance(raw: i32, adc_max: i32, reference_ohms: f32) -> f32 {
    if raw <= 0 {
        return 0.0;
    }
    reference_ohms * (adc_max as f32 / raw as f32 - 1.0)
}

/// Steinhart-Hart: 1/T = A + B ln R + C (ln R)^3, in Kelvin. Zero for a
/// non-positive resistance or a degenerate curve.
pub fn resistance_to_celsius(resistance: f32, a: f64, b: f64, c: f64) -> f32 {
    if resistance <= 0.0 {
        return 0.0;
    }
    let ln_r = f64::from(resistance).ln();
    let inv_t = a + b * ln_r + c * ln_r * ln_r * ln_r;
    if inv_t == 0.0 {
        return 0.0;
    }
    (1.0 / inv_t - 273.15) as f32
}

#[inline]
pub fn celsius_to_unit(celsius: f32, unit: Unit) -> f32 {
    match unit {
        Unit::Celsius => celsius,
        Unit::Fahrenheit => celsius * 1.8 + 32.0,
    }
}

/// Gated three-channel sampler. Owns the ADC port; everything downstream
/// reads the latest `ProbeReading` snapshots.
pub struct ProbeSampler<A> {
    adc: A,
    cfg: SamplerCfg,
    probes: [ProbeCfg; 3],
    unit: Unit,
    readings: [ProbeReading; 3],
    last_sample_ms: Option<u64>,
}

impl<A: ProbeAdc> ProbeSampler<A> {
    pub fn new(adc: A, cfg: SamplerCfg, probes: [ProbeCfg; 3], unit: Unit) -> Self {
        Self {
            adc,
            cfg,
            probes,
            unit,
            readings: [ProbeReading::default(); 3],
            last_sample_ms: None,
        }
    }

    /// Sample all channels if the interval has elapsed. A failed read keeps
    /// the previous snapshot for that probe.
    pub fn update(&mut self, now_ms: u64) {
        if let Some(last) = self.last_sample_ms
            && now_ms.saturating_sub(last) < self.cfg.interval_ms
        {
            return;
        }
        self.last_sample_ms = Some(now_ms);

        for id in ProbeId::ALL {
            let i = id.index();
            match self.adc.read(id.channel()) {
                Ok(raw) => {
                    self.readings[i] = self.condition(raw, i);
                }
                Err(e) => {
                    tracing::warn!(probe = %self.probes[i].name, error = %e, "ADC read failed");
                }
            }
        }
    }

    fn condition(&self, raw: i32, index: usize) -> ProbeReading {
        let status = if raw >= self.cfg.open_threshold {
            ProbeStatus::Open
        } else if raw <= self.cfg.short_threshold {
            ProbeStatus::Short
        } else {
            ProbeStatus::Ok
        };

        let temp = if status == ProbeStatus::Ok {
            let p = &self.probes[index];
            let r = counts_to_resistance(raw, self.cfg.adc_max, self.cfg.reference_ohms);
            celsius_to_unit(resistance_to_celsius(r, p.a, p.b, p.c), self.unit) + p.offset
        } else {
            0.0
        };

        ProbeReading { raw, status, temp }
    }

    pub fn reading(&self, id: ProbeId) -> ProbeReading {
        self.readings[id.index()]
    }

    pub fn statuses(&self) -> [ProbeStatus; 3] {
        [
            self.readings[0].status,
            self.readings[1].status,
            self.readings[2].status,
        ]
    }

    pub fn probe_name(&self, id: ProbeId) -> &str {
        &self.probes[id.index()].name
    }

    pub fn set_coefficients(&mut self, id: ProbeId, a: f64, b: f64, c: f64) {
        let p = &mut self.probes[id.index()];
        p.a = a;
        p.b = b;
        p.c = c;
    }

    pub fn set_offset(&mut self, id: ProbeId, offset: f32) {
        self.probes[id.index()].offset = offset;
    }
}
