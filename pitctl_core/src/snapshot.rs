//! Point-in-time state emitted to subscribers (UI, network peer, CLI).

use crate::alarm::AlarmKind;

/// Everything an external observer needs, serializable as one frame.
/// Temperatures and the ETA are `None` when the underlying probe is invalid
/// or no prediction exists.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StateSnapshot {
    /// Wall-clock epoch seconds; `None` before time sync.
    pub epoch: Option<u32>,
    pub uptime_ms: u64,

    pub setpoint: f32,
    pub pit: Option<f32>,
    pub meat1: Option<f32>,
    pub meat2: Option<f32>,

    pub fan_pct: f32,
    pub fan_duty: u8,
    pub damper_pct: f32,

    pub lid_open: bool,
    pub pit_reached: bool,

    pub meat1_eta: Option<u32>,
    pub meat2_eta: Option<u32>,
    /// Signed heating rates, degrees per minute.
    pub meat1_rate: f32,
    pub meat2_rate: f32,

    pub alarms: Vec<AlarmKind>,
    pub alarming: bool,
    pub errors: Vec<String>,

    pub session_active: bool,
    pub session_points: usize,
}
