//! Fault monitor: probe open/short entries, fire-out detection from a
//! minute-cadence pit history, and external link state.
//!
//! Faults are advisory; none of them stops control. The operator decides.

use crate::config::FireOutCfg;
use crate::probe::{ProbeId, ProbeStatus};

pub const MAX_FAULTS: usize = 8;

const FIREOUT_SAMPLE_MS: u64 = 60_000;
const PIT_HISTORY_SLOTS: usize = 10;
/// Fan output at or above this counts as saturated for fire-out purposes.
const FAN_SATURATED_PCT: f32 = 95.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    ProbeOpen,
    ProbeShort,
    FireOut,
    LinkLost,
}

#[derive(Debug, Clone)]
pub struct FaultEntry {
    pub kind: FaultKind,
    pub probe: Option<ProbeId>,
    pub message: String,
}

#[derive(Debug)]
pub struct FaultMonitor {
    cfg: FireOutCfg,
    probe_names: [String; 3],
    entries: Vec<FaultEntry>,

    pit_history: [f32; PIT_HISTORY_SLOTS],
    pit_history_idx: usize,
    pit_history_count: usize,
    last_pit_sample_ms: Option<u64>,
    decline_start_ms: u64,
    declining: bool,
    last_pit: f32,

    link_connected: bool,
}

impl FaultMonitor {
    pub fn new(cfg: FireOutCfg, probe_names: [String; 3]) -> Self {
        Self {
            cfg,
            probe_names,
            entries: Vec::with_capacity(MAX_FAULTS),
            pit_history: [0.0; PIT_HISTORY_SLOTS],
            pit_history_idx: 0,
            pit_history_count: 0,
            last_pit_sample_ms: None,
            decline_start_ms: 0,
            declining: false,
            last_pit: 0.0,
            link_connected: true,
        }
    }

    /// Evaluate fault conditions. Call every tick; the fire-out path gates
    /// itself to one sample per minute.
    pub fn update(
        &mut self,
        now_ms: u64,
        pit: Option<f32>,
        fan_pct: f32,
        statuses: [ProbeStatus; 3],
    ) {
        for (i, status) in statuses.iter().enumerate() {
            let probe = ProbeId::ALL[i];
            match status {
                ProbeStatus::Open => {
                    let msg = format!("{} probe disconnected", self.probe_names[i]);
                    self.add(FaultKind::ProbeOpen, Some(probe), msg);
                    self.remove(FaultKind::ProbeShort, Some(probe));
                }
                ProbeStatus::Short => {
                    let msg = format!("{} probe shorted", self.probe_names[i]);
                    self.add(FaultKind::ProbeShort, Some(probe), msg);
                    self.remove(FaultKind::ProbeOpen, Some(probe));
                }
                ProbeStatus::Ok => {
                    self.remove(FaultKind::ProbeOpen, Some(probe));
                    self.remove(FaultKind::ProbeShort, Some(probe));
                }
            }
        }

        self.update_fire_out(now_ms, pit, fan_pct);

        if self.link_connected {
            self.remove(FaultKind::LinkLost, None);
        } else {
            self.add(FaultKind::LinkLost, None, String::from("Network link lost"));
        }
    }

    /// Fire-out: pit declining at or above the configured rate for the
    /// configured duration while the fan is saturated. Sampled once per
    /// minute, so a brief deep dip between samples goes unobserved.
    fn update_fire_out(&mut self, now_ms: u64, pit: Option<f32>, fan_pct: f32) {
        let due = match self.last_pit_sample_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= FIREOUT_SAMPLE_MS,
        };
        if !due {
            return;
        }
        self.last_pit_sample_ms = Some(now_ms);

        let Some(pit) = pit else { return };
        if pit <= 0.0 {
            return;
        }

        self.pit_history[self.pit_history_idx] = pit;
        self.pit_history_idx = (self.pit_history_idx + 1) % PIT_HISTORY_SLOTS;
        if self.pit_history_count < PIT_HISTORY_SLOTS {
            self.pit_history_count += 1;
        }

        if self.pit_history_count >= 2 && self.last_pit > 0.0 {
            let rate_per_min = self.last_pit - pit; // positive = declining

            if rate_per_min >= self.cfg.rate_per_min && fan_pct >= FAN_SATURATED_PCT {
                if !self.declining {
                    self.declining = true;
                    self.decline_start_ms = now_ms;
                    tracing::warn!(rate_per_min, "pit declining at saturated fan");
                }
                if now_ms.saturating_sub(self.decline_start_ms) >= self.cfg.duration_ms {
                    self.add(FaultKind::FireOut, None, String::from("Fire may be out"));
                }
            } else {
                self.declining = false;
                self.decline_start_ms = 0;
                self.remove(FaultKind::FireOut, None);
            }
        }

        self.last_pit = pit;
    }

    pub fn set_link_connected(&mut self, connected: bool) {
        self.link_connected = connected;
    }

    pub fn entries(&self) -> &[FaultEntry] {
        &self.entries
    }

    pub fn messages(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.message.clone()).collect()
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn has(&self, kind: FaultKind) -> bool {
        self.entries.iter().any(|e| e.kind == kind)
    }

    pub fn is_fire_out(&self) -> bool {
        self.has(FaultKind::FireOut)
    }

    /// Drop every entry and reset the decline tracker.
    pub fn clear_all(&mut self) {
        self.entries.clear();
        self.declining = false;
        self.decline_start_ms = 0;
    }

    /// Idempotent on (kind, probe).
    fn add(&mut self, kind: FaultKind, probe: Option<ProbeId>, message: String) {
        if self.exists(kind, probe) || self.entries.len() >= MAX_FAULTS {
            return;
        }
        tracing::warn!(?kind, ?probe, %message, "fault raised");
        self.entries.push(FaultEntry {
            kind,
            probe,
            message,
        });
    }

    /// `probe = None` removes every entry of `kind` regardless of probe.
    fn remove(&mut self, kind: FaultKind, probe: Option<ProbeId>) {
        self.entries
            .retain(|e| e.kind != kind || (probe.is_some() && e.probe != probe));
    }

    fn exists(&self, kind: FaultKind, probe: Option<ProbeId>) -> bool {
        self.entries
            .iter()
            .any(|e| e.kind == kind && e.probe == probe)
    }
}
