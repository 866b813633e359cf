//! Butterfly-damper actuator: position percent -> blade angle -> 50 Hz servo
//! pulse width.

use crate::config::DamperCfg;
use pitctl_traits::DamperServo;

#[derive(Debug)]
pub struct DamperDrive<S> {
    servo: S,
    cfg: DamperCfg,
    current_angle: f32,
    current_pct: f32,
}

impl<S: DamperServo> DamperDrive<S> {
    pub fn new(servo: S, cfg: DamperCfg) -> Self {
        let closed = f32::from(cfg.closed_deg);
        Self {
            servo,
            cfg,
            current_angle: closed,
            current_pct: 0.0,
        }
    }

    /// Command a damper position from 0% (closed) to 100% (open).
    pub fn set_position(&mut self, percent: f32) {
        let pct = percent.clamp(0.0, 100.0);
        let closed = f32::from(self.cfg.closed_deg);
        let open = f32::from(self.cfg.open_deg);
        let angle = closed + pct / 100.0 * (open - closed);

        self.current_pct = pct;
        self.current_angle = angle;
        self.write_angle(angle);
    }

    /// Command a raw blade angle (degrees, clamped to the servo's 0-180
    /// range). Position percent is recomputed from the damper travel.
    pub fn set_angle(&mut self, degrees: f32) {
        let angle = degrees.clamp(0.0, 180.0);
        let closed = f32::from(self.cfg.closed_deg);
        let open = f32::from(self.cfg.open_deg);

        self.current_angle = angle;
        self.current_pct = if open > closed {
            ((angle - closed) / (open - closed) * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };
        self.write_angle(angle);
    }

    fn write_angle(&mut self, angle: f32) {
        let us = self.angle_to_us(angle);
        if let Err(e) = self.servo.write_pulse_us(us) {
            tracing::warn!(us, error = %e, "servo pulse write failed");
        }
    }

    /// Linear map of the full 0-180 degree servo range onto the configured
    /// pulse range; the damper itself only uses the closed..open span.
    fn angle_to_us(&self, angle: f32) -> u16 {
        let a = angle.clamp(0.0, 180.0);
        let min = f32::from(self.cfg.min_us);
        let max = f32::from(self.cfg.max_us);
        (min + a / 180.0 * (max - min) + 0.5) as u16
    }

    #[inline]
    pub fn position_pct(&self) -> f32 {
        self.current_pct
    }

    #[inline]
    pub fn current_angle(&self) -> f32 {
        self.current_angle
    }
}
