//! Alarm state machine: pit deviation (armed after first approach) and
//! meat-completion targets, with acknowledge hysteresis and a buzzer cadence.

use crate::config::AlarmCfg;
use crate::probe::MeatProbe;
use pitctl_traits::Buzzer;

pub const MAX_ACTIVE_ALARMS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum AlarmKind {
    PitHigh,
    PitLow,
    Meat1Done,
    Meat2Done,
}

/// Per-tick alarm inputs. Temperatures are `None` for invalid probes and the
/// machine skips them; magnitude is never used to infer disconnection.
#[derive(Debug, Clone, Copy)]
pub struct AlarmInputs {
    pub pit: Option<f32>,
    pub meat1: Option<f32>,
    pub meat2: Option<f32>,
    pub setpoint: f32,
    /// Pit has at some point reached the setpoint; arms the deviation alarm
    /// so the initial ramp-up does not fire PitLow.
    pub pit_reached: bool,
}

#[derive(Debug)]
pub struct AlarmCenter<B> {
    buzzer: B,
    cfg: AlarmCfg,

    meat_targets: [f32; 2],
    active: Vec<AlarmKind>,

    acknowledged: bool,
    enabled: bool,
    buzzer_on: bool,

    pit_triggered: bool,
    meat_triggered: [bool; 2],
    last_toggle_ms: u64,
}

impl<B: Buzzer> AlarmCenter<B> {
    pub fn new(buzzer: B, cfg: AlarmCfg) -> Self {
        Self {
            buzzer,
            cfg,
            meat_targets: [0.0; 2],
            active: Vec::with_capacity(MAX_ACTIVE_ALARMS),
            acknowledged: false,
            enabled: true,
            buzzer_on: false,
            pit_triggered: false,
            meat_triggered: [false; 2],
            last_toggle_ms: 0,
        }
    }

    /// Evaluate all alarm conditions. Call every tick.
    pub fn update(&mut self, now_ms: u64, inputs: &AlarmInputs) {
        if !self.enabled {
            self.set_buzzer(false);
            return;
        }

        if inputs.pit_reached
            && inputs.setpoint > 0.0
            && let Some(pit) = inputs.pit
            && pit > 0.0
        {
            let high = pit > inputs.setpoint + self.cfg.pit_band;
            let low = pit < inputs.setpoint - self.cfg.pit_band;

            if (high || low) && !self.pit_triggered {
                self.add(if high {
                    AlarmKind::PitHigh
                } else {
                    AlarmKind::PitLow
                });
            } else if !high && !low {
                // Back in band: clear and allow a future re-trigger.
                self.remove(AlarmKind::PitHigh);
                self.remove(AlarmKind::PitLow);
                self.pit_triggered = false;
            }
        }

        for meat in MeatProbe::BOTH {
            let i = meat.index();
            let temp = match meat {
                MeatProbe::Meat1 => inputs.meat1,
                MeatProbe::Meat2 => inputs.meat2,
            };
            let target = self.meat_targets[i];
            if target > 0.0
                && !self.meat_triggered[i]
                && let Some(t) = temp
                && t > 0.0
                && t >= target
            {
                self.add(match meat {
                    MeatProbe::Meat1 => AlarmKind::Meat1Done,
                    MeatProbe::Meat2 => AlarmKind::Meat2Done,
                });
                self.meat_triggered[i] = true;
            }
        }

        self.update_buzzer(now_ms);
    }

    /// Silence the buzzer and clear the active list. Everything active gets
    /// its trigger flag set so it cannot immediately re-fire.
    pub fn acknowledge(&mut self) {
        self.acknowledged = true;
        self.set_buzzer(false);

        for kind in &self.active {
            match kind {
                AlarmKind::PitHigh | AlarmKind::PitLow => self.pit_triggered = true,
                AlarmKind::Meat1Done => self.meat_triggered[0] = true,
                AlarmKind::Meat2Done => self.meat_triggered[1] = true,
            }
        }
        self.active.clear();
        tracing::info!("alarms acknowledged");
    }

    /// Assign a meat target; 0 clears it. Either way the trigger latch is
    /// released so the alarm can fire for the new target.
    pub fn set_meat_target(&mut self, meat: MeatProbe, target: f32) {
        self.meat_targets[meat.index()] = target;
        self.meat_triggered[meat.index()] = false;
    }

    pub fn meat_target(&self, meat: MeatProbe) -> f32 {
        self.meat_targets[meat.index()]
    }

    /// Non-positive bands are rejected silently; the prior value stays.
    pub fn set_pit_band(&mut self, band: f32) {
        if band > 0.0 {
            self.cfg.pit_band = band;
        }
    }

    pub fn pit_band(&self) -> f32 {
        self.cfg.pit_band
    }

    pub fn is_alarming(&self) -> bool {
        !self.active.is_empty() && !self.acknowledged
    }

    pub fn active(&self) -> &[AlarmKind] {
        &self.active
    }

    pub fn is_active(&self, kind: AlarmKind) -> bool {
        self.active.contains(&kind)
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.set_buzzer(false);
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn add(&mut self, kind: AlarmKind) {
        if self.active.contains(&kind) || self.active.len() >= MAX_ACTIVE_ALARMS {
            return;
        }
        self.active.push(kind);
        // A fresh alarm cancels an earlier acknowledgement.
        self.acknowledged = false;
        tracing::info!(?kind, "alarm raised");
    }

    fn remove(&mut self, kind: AlarmKind) {
        self.active.retain(|k| *k != kind);
    }

    fn update_buzzer(&mut self, now_ms: u64) {
        if !self.is_alarming() {
            if self.buzzer_on {
                self.set_buzzer(false);
            }
            return;
        }

        let elapsed = now_ms.saturating_sub(self.last_toggle_ms);
        if self.buzzer_on {
            if elapsed >= self.cfg.buzzer_on_ms {
                self.set_buzzer(false);
                self.last_toggle_ms = now_ms;
            }
        } else if elapsed >= self.cfg.buzzer_off_ms {
            self.set_buzzer(true);
            self.last_toggle_ms = now_ms;
        }
    }

    fn set_buzzer(&mut self, on: bool) {
        let result = if on {
            self.buzzer.tone_on(self.cfg.buzzer_freq)
        } else {
            self.buzzer.tone_off()
        };
        if let Err(e) = result {
            tracing::warn!(on, error = %e, "buzzer write failed");
        }
        self.buzzer_on = on;
    }

    #[inline]
    pub fn is_buzzer_on(&self) -> bool {
        self.buzzer_on
    }
}
