//! Blower fan actuator: kick-start, min-speed clamp, and long-pulse cycling
//! over a single 8-bit PWM duty at a 25 kHz carrier.
//!
//! State machine: Off -> Kickstart -> (LongPulse | Normal) -> Off. A manual
//! duty override freezes the machine until `off()`.

use crate::config::FanCfg;
use pitctl_traits::FanPwm;

#[derive(Debug)]
pub struct FanDrive<P> {
    pwm: P,
    cfg: FanCfg,

    target_pct: f32,
    current_pct: f32,
    current_duty: u8,

    kickstart_active: bool,
    kickstart_end_ms: u64,

    longpulse_active: bool,
    longpulse_cycle_start_ms: u64,

    /// Previously at 0%; the next non-zero target triggers a kick-start.
    was_off: bool,
    manual: bool,
}

impl<P: FanPwm> FanDrive<P> {
    pub fn new(pwm: P, cfg: FanCfg) -> Self {
        Self {
            pwm,
            cfg,
            target_pct: 0.0,
            current_pct: 0.0,
            current_duty: 0,
            kickstart_active: false,
            kickstart_end_ms: 0,
            longpulse_active: false,
            longpulse_cycle_start_ms: 0,
            was_off: true,
            manual: false,
        }
    }

    /// Request a speed in percent. Ignored while a manual duty is latched.
    pub fn set_speed(&mut self, percent: f32) {
        if self.manual {
            return;
        }
        self.target_pct = percent.clamp(0.0, 100.0);
    }

    /// Advance the state machine. Call every tick.
    pub fn update(&mut self, now_ms: u64) {
        if self.manual {
            return;
        }

        if self.kickstart_active {
            if now_ms >= self.kickstart_end_ms {
                self.kickstart_active = false;
                // Fall through to the normal speed logic below.
            } else {
                self.apply(self.cfg.kickstart_pct);
                return;
            }
        }

        let target = self.target_pct;

        if target <= 0.0 {
            self.was_off = true;
            self.longpulse_active = false;
            self.apply(0.0);
            return;
        }

        if self.was_off {
            self.was_off = false;
            self.kickstart_active = true;
            self.kickstart_end_ms = now_ms + self.cfg.kickstart_ms;
            self.apply(self.cfg.kickstart_pct);
            return;
        }

        if target < self.cfg.longpulse_threshold {
            // Cycle between min speed and off instead of an unachievable
            // constant low PWM. The cycle is anchored at first entry so the
            // on-phase stays consistent while the threshold hovers.
            if !self.longpulse_active {
                self.longpulse_active = true;
                self.longpulse_cycle_start_ms = now_ms;
            }

            let elapsed = now_ms.saturating_sub(self.longpulse_cycle_start_ms);
            let cycle_ms = self.cfg.longpulse_cycle_ms.max(1);
            let pos_in_cycle = elapsed % cycle_ms;
            let on_fraction = target / self.cfg.longpulse_threshold;
            let on_ms = (on_fraction * cycle_ms as f32) as u64;

            if pos_in_cycle < on_ms {
                self.apply(self.cfg.min_speed);
            } else {
                self.apply(0.0);
            }
            return;
        }

        self.longpulse_active = false;

        let effective = if target < self.cfg.min_speed {
            self.cfg.min_speed
        } else {
            target
        };
        self.apply(effective);
    }

    /// Immediately stop the fan, clear every flag, and exit manual mode.
    pub fn off(&mut self) {
        self.target_pct = 0.0;
        self.kickstart_active = false;
        self.longpulse_active = false;
        self.manual = false;
        self.was_off = true;
        self.apply(0.0);
    }

    /// Force a raw duty, bypassing the state machine until `off()`.
    pub fn set_manual_duty(&mut self, duty: u8) {
        self.manual = true;
        self.current_duty = duty;
        self.current_pct = f32::from(duty) / 255.0 * 100.0;
        self.write(duty);
    }

    fn apply(&mut self, pct: f32) {
        let duty = percent_to_duty(pct);
        self.current_pct = if duty == 0 { 0.0 } else { pct };
        self.current_duty = duty;
        self.write(duty);
    }

    fn write(&mut self, duty: u8) {
        if let Err(e) = self.pwm.write_duty(duty) {
            tracing::warn!(duty, error = %e, "fan PWM write failed");
        }
    }

    #[inline]
    pub fn current_pct(&self) -> f32 {
        self.current_pct
    }

    #[inline]
    pub fn current_duty(&self) -> u8 {
        self.current_duty
    }

    #[inline]
    pub fn target_pct(&self) -> f32 {
        self.target_pct
    }

    #[inline]
    pub fn is_kick_starting(&self) -> bool {
        self.kickstart_active
    }

    #[inline]
    pub fn is_long_pulsing(&self) -> bool {
        self.longpulse_active
    }

    #[inline]
    pub fn is_manual(&self) -> bool {
        self.manual
    }
}

/// 0 -> 0, >=100 -> 255, linear with rounding in between.
pub fn percent_to_duty(pct: f32) -> u8 {
    if pct <= 0.0 {
        0
    } else if pct >= 100.0 {
        255
    } else {
        (pct * 255.0 / 100.0 + 0.5) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duty_mapping_endpoints() {
        assert_eq!(percent_to_duty(0.0), 0);
        assert_eq!(percent_to_duty(-3.0), 0);
        assert_eq!(percent_to_duty(100.0), 255);
        assert_eq!(percent_to_duty(120.0), 255);
        assert_eq!(percent_to_duty(50.0), 128);
    }
}
