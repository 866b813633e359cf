//! Meat-completion predictor: a circular window of thermal samples per meat
//! probe and a least-squares slope over it.
//!
//! Samples are recorded only when the probe reads Ok and the wall clock is
//! valid, so regression timestamps are always real epochs. A non-positive
//! slope yields "no prediction"; the signed rate is still reported so a
//! cooling probe is distinguishable downstream.

use crate::config::PredictorCfg;
use crate::probe::MeatProbe;

pub const WINDOW_SLOTS: usize = 60;
pub const MIN_SAMPLES: usize = 12;
/// Predictions further out than 24 hours are noise; reject them.
const MAX_PREDICT_SECS: f64 = 86_400.0;

#[derive(Debug, Clone, Copy, Default)]
struct ThermalSample {
    timestamp: u32,
    temp: f32,
}

#[derive(Debug, Clone)]
struct ProbeWindow {
    samples: [ThermalSample; WINDOW_SLOTS],
    head: usize,
    count: usize,
    target: f32,
}

impl ProbeWindow {
    fn new() -> Self {
        Self {
            samples: [ThermalSample::default(); WINDOW_SLOTS],
            head: 0,
            count: 0,
            target: 0.0,
        }
    }

    fn push(&mut self, timestamp: u32, temp: f32) {
        self.samples[self.head] = ThermalSample { timestamp, temp };
        self.head = (self.head + 1) % WINDOW_SLOTS;
        if self.count < WINDOW_SLOTS {
            self.count += 1;
        }
    }

    /// Oldest slot: 0 before wrap, otherwise head (the next overwrite).
    fn oldest(&self) -> usize {
        if self.count < WINDOW_SLOTS { 0 } else { self.head }
    }

    fn latest_temp(&self) -> Option<f32> {
        if self.count == 0 {
            return None;
        }
        let latest = (self.head + WINDOW_SLOTS - 1) % WINDOW_SLOTS;
        Some(self.samples[latest].temp)
    }

    /// Ordinary least squares over (timestamp - t0, temp), degrees per
    /// second. Offsetting by the oldest timestamp keeps the sums well inside
    /// f64 precision for epoch-sized x values.
    fn slope(&self) -> f64 {
        if self.count < MIN_SAMPLES {
            return 0.0;
        }

        let oldest = self.oldest();
        let t0 = self.samples[oldest].timestamp;

        let n = self.count as f64;
        let mut sum_x = 0.0;
        let mut sum_y = 0.0;
        let mut sum_xy = 0.0;
        let mut sum_x2 = 0.0;

        for i in 0..self.count {
            let idx = (oldest + i) % WINDOW_SLOTS;
            let s = &self.samples[idx];
            let x = f64::from(s.timestamp.wrapping_sub(t0));
            let y = f64::from(s.temp);
            sum_x += x;
            sum_y += y;
            sum_xy += x * y;
            sum_x2 += x * x;
        }

        let denom = n * sum_x2 - sum_x * sum_x;
        if denom == 0.0 {
            // All timestamps identical.
            return 0.0;
        }
        (n * sum_xy - sum_x * sum_y) / denom
    }
}

#[derive(Debug)]
pub struct EtaPredictor {
    windows: [ProbeWindow; 2],
    sample_interval_ms: u64,
    last_sample_ms: Option<u64>,
}

impl EtaPredictor {
    pub fn new(cfg: &PredictorCfg) -> Self {
        Self {
            windows: [ProbeWindow::new(), ProbeWindow::new()],
            sample_interval_ms: cfg.sample_interval_ms,
            last_sample_ms: None,
        }
    }

    /// Record one sample per connected meat probe if the cadence has elapsed
    /// and the wall clock is valid.
    pub fn update(&mut self, now_ms: u64, epoch: Option<u32>, meat1: Option<f32>, meat2: Option<f32>) {
        if let Some(last) = self.last_sample_ms
            && now_ms.saturating_sub(last) < self.sample_interval_ms
        {
            return;
        }
        self.last_sample_ms = Some(now_ms);

        let Some(epoch) = epoch else { return };

        if let Some(t) = meat1 {
            self.windows[0].push(epoch, t);
        }
        if let Some(t) = meat2 {
            self.windows[1].push(epoch, t);
        }
    }

    /// Inject a sample directly, bypassing the cadence gate. Used for replay
    /// and tests.
    pub fn record_sample(&mut self, meat: MeatProbe, timestamp: u32, temp: f32) {
        self.windows[meat.index()].push(timestamp, temp);
    }

    /// Target preserved across `reset`; 0 disables prediction for the probe.
    pub fn set_target(&mut self, meat: MeatProbe, target: f32) {
        self.windows[meat.index()].target = target;
    }

    pub fn target(&self, meat: MeatProbe) -> f32 {
        self.windows[meat.index()].target
    }

    /// Regression slope in degrees per second (0 with insufficient data).
    pub fn slope(&self, meat: MeatProbe) -> f64 {
        self.windows[meat.index()].slope()
    }

    /// Signed heating rate in degrees per minute.
    pub fn rate_per_min(&self, meat: MeatProbe) -> f32 {
        (self.windows[meat.index()].slope() * 60.0) as f32
    }

    pub fn sample_count(&self, meat: MeatProbe) -> usize {
        self.windows[meat.index()].count
    }

    /// Predicted completion epoch, or `None` when no target is set, data is
    /// insufficient, the probe is already at target, the temperature is not
    /// rising, or the projection lands beyond 24 hours.
    pub fn eta_epoch(&self, meat: MeatProbe, now_epoch: Option<u32>) -> Option<u32> {
        let w = &self.windows[meat.index()];
        if w.target <= 0.0 || w.count < MIN_SAMPLES {
            return None;
        }

        let current = w.latest_temp()?;
        if current >= w.target {
            return None;
        }

        let slope = w.slope();
        if slope <= 0.0 {
            return None;
        }

        let time_to_target = f64::from(w.target - current) / slope;
        if time_to_target > MAX_PREDICT_SECS {
            return None;
        }

        let now = now_epoch?;
        Some(now.saturating_add(time_to_target as u32))
    }

    /// Drop the sample window but keep the target.
    pub fn reset(&mut self, meat: MeatProbe) {
        let w = &mut self.windows[meat.index()];
        w.head = 0;
        w.count = 0;
    }

    pub fn reset_all(&mut self) {
        for meat in MeatProbe::BOTH {
            self.reset(meat);
        }
    }
}
