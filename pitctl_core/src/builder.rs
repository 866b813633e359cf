//! Validated construction for `PitController`.
//!
//! `build_controller` is the generic, statically-dispatched path; `PitBuilder`
//! boxes the ports for callers that assemble them dynamically (the CLI picks
//! backends at runtime). Validation lives in one place and returns
//! `BuildError` for anything a config file could get wrong.

use std::sync::Arc;

use pitctl_traits::clock::{Clock, MonotonicClock};
use pitctl_traits::{Buzzer, DamperServo, FanPwm, ProbeAdc, SessionStore};

use crate::config::CoreConfig;
use crate::controller::PitController;
use crate::error::{BuildError, Result};

/// Controller with boxed ports, as produced by `PitBuilder`.
pub type BoxedController = PitController<
    Box<dyn ProbeAdc + Send>,
    Box<dyn FanPwm + Send>,
    Box<dyn DamperServo + Send>,
    Box<dyn Buzzer + Send>,
    Box<dyn SessionStore + Send>,
>;

/// Check every config value a file could plausibly break.
fn validate(cfg: &CoreConfig) -> Result<()> {
    let invalid = |msg: &'static str| eyre::Report::new(BuildError::InvalidConfig(msg));

    if !(cfg.setpoint.is_finite() && cfg.setpoint >= 0.0) {
        return Err(invalid("setpoint must be finite and >= 0"));
    }
    if cfg.pid.sample_ms == 0 {
        return Err(invalid("pid.sample_ms must be > 0"));
    }
    if cfg.pid.kp < 0.0 || cfg.pid.ki < 0.0 || cfg.pid.kd < 0.0 {
        return Err(invalid("pid gains must be >= 0"));
    }
    if !(cfg.lid.drop_pct > 0.0 && cfg.lid.drop_pct < 100.0) {
        return Err(invalid("lid.drop_pct out of range"));
    }
    if cfg.lid.recover_pct < 0.0 || cfg.lid.recover_pct >= cfg.lid.drop_pct {
        return Err(invalid("lid.recover_pct must be below drop_pct"));
    }
    if !(cfg.fan.on_threshold > 0.0 && cfg.fan.on_threshold < 100.0) {
        return Err(invalid("fan.on_threshold must be inside (0, 100)"));
    }
    if !(cfg.fan.longpulse_threshold > 0.0 && cfg.fan.longpulse_threshold <= 100.0) {
        return Err(invalid("fan.longpulse_threshold out of range"));
    }
    if !(0.0..=100.0).contains(&cfg.fan.min_speed) {
        return Err(invalid("fan.min_speed out of range"));
    }
    if !(cfg.fan.kickstart_pct > 0.0 && cfg.fan.kickstart_pct <= 100.0) {
        return Err(invalid("fan.kickstart_pct out of range"));
    }
    if cfg.fan.longpulse_cycle_ms == 0 {
        return Err(invalid("fan.longpulse_cycle_ms must be > 0"));
    }
    if cfg.damper.closed_deg >= cfg.damper.open_deg || cfg.damper.open_deg > 180 {
        return Err(invalid("damper angles must satisfy closed < open <= 180"));
    }
    if cfg.damper.min_us >= cfg.damper.max_us {
        return Err(invalid("damper pulse range must satisfy min_us < max_us"));
    }
    if cfg.alarm.pit_band <= 0.0 {
        return Err(invalid("alarm.pit_band must be > 0"));
    }
    if cfg.alarm.buzzer_on_ms == 0 || cfg.alarm.buzzer_off_ms == 0 {
        return Err(invalid("alarm buzzer cadence must be > 0"));
    }
    if cfg.fireout.rate_per_min <= 0.0 {
        return Err(invalid("fireout.rate_per_min must be > 0"));
    }
    if cfg.predictor.sample_interval_ms == 0 {
        return Err(invalid("predictor.sample_interval_ms must be > 0"));
    }
    if cfg.session.capacity == 0 {
        return Err(invalid("session.capacity must be > 0"));
    }
    if cfg.session.sample_interval_ms == 0 || cfg.session.flush_interval_ms == 0 {
        return Err(invalid("session cadences must be > 0"));
    }
    if cfg.sampler.interval_ms == 0 {
        return Err(invalid("sampler.interval_ms must be > 0"));
    }
    if cfg.sampler.adc_max <= 0 {
        return Err(invalid("sampler.adc_max must be > 0"));
    }
    if cfg.sampler.open_threshold <= cfg.sampler.short_threshold {
        return Err(invalid("sampler thresholds must satisfy short < open"));
    }
    Ok(())
}

/// Generic construction: validates `cfg` and wires the parts together.
pub fn build_controller<A, F, D, B, S>(
    adc: A,
    fan: F,
    damper: D,
    buzzer: B,
    store: S,
    cfg: CoreConfig,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
) -> Result<PitController<A, F, D, B, S>>
where
    A: ProbeAdc,
    F: FanPwm,
    D: DamperServo,
    B: Buzzer,
    S: SessionStore,
{
    validate(&cfg)?;
    let clock = clock.unwrap_or_else(|| Arc::new(MonotonicClock::new()));
    Ok(PitController::from_parts(
        adc, fan, damper, buzzer, store, cfg, clock,
    ))
}

/// Dynamic builder over boxed ports.
#[derive(Default)]
pub struct PitBuilder {
    adc: Option<Box<dyn ProbeAdc + Send>>,
    fan: Option<Box<dyn FanPwm + Send>>,
    damper: Option<Box<dyn DamperServo + Send>>,
    buzzer: Option<Box<dyn Buzzer + Send>>,
    store: Option<Box<dyn SessionStore + Send>>,
    config: Option<CoreConfig>,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
}

impl PitBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_adc(mut self, adc: impl ProbeAdc + Send + 'static) -> Self {
        self.adc = Some(Box::new(adc));
        self
    }

    pub fn with_fan(mut self, fan: impl FanPwm + Send + 'static) -> Self {
        self.fan = Some(Box::new(fan));
        self
    }

    pub fn with_damper(mut self, damper: impl DamperServo + Send + 'static) -> Self {
        self.damper = Some(Box::new(damper));
        self
    }

    pub fn with_buzzer(mut self, buzzer: impl Buzzer + Send + 'static) -> Self {
        self.buzzer = Some(Box::new(buzzer));
        self
    }

    pub fn with_store(mut self, store: impl SessionStore + Send + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    pub fn with_config(mut self, config: CoreConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<BoxedController> {
        let adc = self
            .adc
            .ok_or_else(|| eyre::Report::new(BuildError::MissingAdc))?;
        let fan = self
            .fan
            .ok_or_else(|| eyre::Report::new(BuildError::MissingFan))?;
        let damper = self
            .damper
            .ok_or_else(|| eyre::Report::new(BuildError::MissingDamper))?;
        let buzzer = self
            .buzzer
            .ok_or_else(|| eyre::Report::new(BuildError::MissingBuzzer))?;
        let store = self
            .store
            .ok_or_else(|| eyre::Report::new(BuildError::MissingStore))?;
        let config = self.config.unwrap_or_default();

        build_controller(adc, fan, damper, buzzer, store, config, self.clock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{MemoryStore, RecordingBuzzer, RecordingPwm, RecordingServo, ScriptedAdc};

    fn full_builder() -> PitBuilder {
        PitBuilder::new()
            .with_adc(ScriptedAdc::new())
            .with_fan(RecordingPwm::new())
            .with_damper(RecordingServo::new())
            .with_buzzer(RecordingBuzzer::new())
            .with_store(MemoryStore::new())
    }

    #[test]
    fn builds_with_defaults() {
        assert!(full_builder().build().is_ok());
    }

    #[test]
    fn missing_ports_are_reported() {
        let err = PitBuilder::new().build().unwrap_err();
        assert!(err.downcast_ref::<BuildError>().is_some());
    }

    #[test]
    fn bad_fan_threshold_is_rejected() {
        let mut cfg = CoreConfig::default();
        cfg.fan.on_threshold = 0.0;
        let err = full_builder().with_config(cfg).build().unwrap_err();
        match err.downcast_ref::<BuildError>() {
            Some(BuildError::InvalidConfig(_)) => {}
            other => panic!("expected InvalidConfig, got {other:?}"),
        }
    }

    #[test]
    fn nonpositive_pit_band_is_rejected() {
        let mut cfg = CoreConfig::default();
        cfg.alarm.pit_band = 0.0;
        assert!(full_builder().with_config(cfg).build().is_err());
    }
}
