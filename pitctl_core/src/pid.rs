//! Pit PID regulator with sticky lid-open suppression.
//!
//! Direct-acting, output clamped to [0, 100]. The integral only accumulates
//! while the loop is enabled, the lid is closed, and the output is not
//! saturated in the wind-up direction. Lid-open freezes the whole internal
//! state so the controller resumes where it left off once the lid closes.

use crate::config::{LidCfg, PidCfg};

#[derive(Debug)]
pub struct PitPid {
    cfg: PidCfg,
    lid: LidCfg,
    integral: f32,
    prev_error: f32,
    output: f32,
    enabled: bool,
    lid_open: bool,
}

impl PitPid {
    pub fn new(cfg: PidCfg, lid: LidCfg) -> Self {
        Self {
            cfg,
            lid,
            integral: 0.0,
            prev_error: 0.0,
            output: 0.0,
            enabled: true,
            lid_open: false,
        }
    }

    /// One PID sample. Call at the configured cadence with a valid pit
    /// temperature; returns the new output percentage.
    pub fn compute(&mut self, pit: f32, setpoint: f32) -> f32 {
        if !self.enabled {
            self.output = 0.0;
            return self.output;
        }

        self.update_lid_state(pit, setpoint);
        if self.lid_open {
            // Hold integral and prev_error untouched while the lid is open.
            self.output = 0.0;
            return self.output;
        }

        let dt_s = (self.cfg.sample_ms as f32 / 1000.0).max(1e-3);
        let error = setpoint - pit;
        let p = self.cfg.kp * error;
        let d = self.cfg.kd * (error - self.prev_error) / dt_s;
        let unclamped = p + self.integral + d;
        self.output = unclamped.clamp(0.0, 100.0);

        let wound_up = (unclamped >= 100.0 && error > 0.0) || (unclamped <= 0.0 && error < 0.0);
        if !wound_up {
            self.integral = (self.integral + self.cfg.ki * error * dt_s).clamp(0.0, 100.0);
        }
        self.prev_error = error;
        self.output
    }

    /// Force the output to zero without disturbing internal state. Used when
    /// the pit probe is invalid: a sentinel temperature must not reach the
    /// regulator.
    pub fn hold_idle(&mut self) {
        self.output = 0.0;
    }

    fn update_lid_state(&mut self, pit: f32, setpoint: f32) {
        if setpoint <= 0.0 {
            return;
        }
        if !self.lid_open {
            let drop_at = setpoint * (1.0 - self.lid.drop_pct / 100.0);
            if pit < drop_at {
                self.lid_open = true;
                tracing::info!(pit, setpoint, "lid-open detected, output suppressed");
            }
        } else {
            let recover_at = setpoint * (1.0 - self.lid.recover_pct / 100.0);
            if pit >= recover_at {
                self.lid_open = false;
                tracing::info!(pit, setpoint, "lid closed, control resumed");
            }
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.output = 0.0;
            self.lid_open = false;
            self.reset();
        }
    }

    /// Replace the gains. Clears the integral so a retune does not carry a
    /// stale accumulation.
    pub fn set_tunings(&mut self, kp: f32, ki: f32, kd: f32) {
        self.cfg.kp = kp;
        self.cfg.ki = ki;
        self.cfg.kd = kd;
        self.integral = 0.0;
    }

    /// Clear accumulated state (integral, previous error, output).
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = 0.0;
        self.output = 0.0;
    }

    #[inline]
    pub fn output(&self) -> f32 {
        self.output
    }

    #[inline]
    pub fn is_lid_open(&self) -> bool {
        self.lid_open
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn kp(&self) -> f32 {
        self.cfg.kp
    }

    pub fn ki(&self) -> f32 {
        self.cfg.ki
    }

    pub fn kd(&self) -> f32 {
        self.cfg.kd
    }
}
