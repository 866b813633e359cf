//! Split-range mapping: one PID output drives the damper over the full range
//! and the fan only above a configurable knee.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitOutput {
    pub damper_pct: f32,
    pub fan_pct: f32,
}

/// Map a PID output `u` (0-100) into damper and fan percentages. The damper
/// tracks `u` linearly; the fan stays off up to `fan_on_threshold` and scales
/// the remainder of the range to 0-100.
pub fn split_output(u: f32, fan_on_threshold: f32) -> SplitOutput {
    let u = u.clamp(0.0, 100.0);
    let fan = if u <= fan_on_threshold {
        0.0
    } else {
        (u - fan_on_threshold) / (100.0 - fan_on_threshold) * 100.0
    };
    SplitOutput {
        damper_pct: u,
        fan_pct: fan.clamp(0.0, 100.0),
    }
}
