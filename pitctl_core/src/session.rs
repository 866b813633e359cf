//! Cook-session recorder: a fixed-capacity ring of packed data points in RAM
//! with an append-only flush to persistent storage and crash recovery on
//! boot.
//!
//! On-disk layout (bit-exact, little-endian):
//!
//! ```text
//! offset 0..3  : start epoch (u32)
//! offset 4..   : 13-byte DataPoint records
//!   0..3   timestamp (u32)
//!   4..5   pit       (i16, x10)
//!   6..7   meat1     (i16, x10)
//!   8..9   meat2     (i16, x10)
//!   10     fan %     (u8)
//!   11     damper %  (u8)
//!   12     flags     (u8)
//! ```

use crate::config::SessionCfg;
use crate::error::Result;
use crate::fixed_point::{deci_from_degrees, degrees_from_deci};
use pitctl_traits::SessionStore;

pub const DATA_POINT_LEN: usize = 13;
const HEADER_LEN: usize = 4;

/// Bit assignments for `DataPoint::flags`.
pub mod flags {
    pub const LID_OPEN: u8 = 0x01;
    pub const ALARM_PIT: u8 = 0x02;
    pub const ALARM_MEAT1: u8 = 0x04;
    pub const ALARM_MEAT2: u8 = 0x08;
    pub const FIRE_OUT: u8 = 0x10;
    pub const PIT_DISC: u8 = 0x20;
    pub const MEAT1_DISC: u8 = 0x40;
    pub const MEAT2_DISC: u8 = 0x80;
}

/// One packed sample. Temperatures are deci-degrees (x10).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DataPoint {
    pub timestamp: u32,
    pub pit_deci: i16,
    pub meat1_deci: i16,
    pub meat2_deci: i16,
    pub fan_pct: u8,
    pub damper_pct: u8,
    pub flags: u8,
}

impl DataPoint {
    pub fn encode(&self) -> [u8; DATA_POINT_LEN] {
        let mut out = [0u8; DATA_POINT_LEN];
        out[0..4].copy_from_slice(&self.timestamp.to_le_bytes());
        out[4..6].copy_from_slice(&self.pit_deci.to_le_bytes());
        out[6..8].copy_from_slice(&self.meat1_deci.to_le_bytes());
        out[8..10].copy_from_slice(&self.meat2_deci.to_le_bytes());
        out[10] = self.fan_pct;
        out[11] = self.damper_pct;
        out[12] = self.flags;
        out
    }

    pub fn decode(b: &[u8; DATA_POINT_LEN]) -> Self {
        Self {
            timestamp: u32::from_le_bytes([b[0], b[1], b[2], b[3]]),
            pit_deci: i16::from_le_bytes([b[4], b[5]]),
            meat1_deci: i16::from_le_bytes([b[6], b[7]]),
            meat2_deci: i16::from_le_bytes([b[8], b[9]]),
            fan_pct: b[10],
            damper_pct: b[11],
            flags: b[12],
        }
    }

    pub fn pit_degrees(&self) -> f32 {
        degrees_from_deci(self.pit_deci)
    }

    pub fn meat1_degrees(&self) -> f32 {
        degrees_from_deci(self.meat1_deci)
    }

    pub fn meat2_degrees(&self) -> f32 {
        degrees_from_deci(self.meat2_deci)
    }
}

/// Unpacked sample handed in by the orchestrator each recording interval.
/// Temperatures use the 0-sentinel form here because the flags carry the
/// disconnection bits.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionSample {
    pub pit: f32,
    pub meat1: f32,
    pub meat2: f32,
    pub fan_pct: u8,
    pub damper_pct: u8,
    pub flags: u8,
}

#[derive(Debug, serde::Serialize)]
struct JsonPoint {
    ts: u32,
    pit: f32,
    meat1: f32,
    meat2: f32,
    fan: u8,
    damper: u8,
    flags: u8,
}

#[derive(Debug)]
pub struct CookSession<S> {
    store: S,
    cfg: SessionCfg,

    ring: Vec<DataPoint>,
    head: usize,
    count: usize,
    wrapped: bool,

    active: bool,
    start_epoch: u32,
    total_points: u64,
    flushed_up_to: u64,
    header_written: bool,

    last_sample_ms: Option<u64>,
    last_flush_ms: u64,
}

impl<S: SessionStore> CookSession<S> {
    pub fn new(store: S, cfg: SessionCfg) -> Self {
        let capacity = cfg.capacity.max(1);
        Self {
            store,
            cfg: SessionCfg { capacity, ..cfg },
            ring: vec![DataPoint::default(); capacity],
            head: 0,
            count: 0,
            wrapped: false,
            active: false,
            start_epoch: 0,
            total_points: 0,
            flushed_up_to: 0,
            header_written: false,
            last_sample_ms: None,
            last_flush_ms: 0,
        }
    }

    /// Attempt crash recovery from the store. A readable prior session file
    /// resumes recording; any read problem starts clean.
    pub fn begin(&mut self) {
        match self.recover() {
            Ok(true) => {
                self.active = true;
                tracing::info!(
                    points = self.count,
                    start_epoch = self.start_epoch,
                    "recovered cook session"
                );
            }
            Ok(false) => {
                tracing::info!("no previous cook session");
            }
            Err(e) => {
                tracing::warn!(error = %e, "session recovery failed, starting clean");
                self.clear_ram();
            }
        }
    }

    fn recover(&mut self) -> std::result::Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let Some(bytes) = self.store.read_all()? else {
            return Ok(false);
        };
        if bytes.len() < HEADER_LEN {
            return Ok(false);
        }

        let start_epoch = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let stored = (bytes.len() - HEADER_LEN) / DATA_POINT_LEN;
        if stored == 0 {
            return Ok(false);
        }

        self.clear_ram();
        self.start_epoch = start_epoch;

        // Keep only the newest `capacity` points; older ones stay on disk.
        let capacity = self.cfg.capacity;
        let skip = stored.saturating_sub(capacity);
        for i in skip..stored {
            let offset = HEADER_LEN + i * DATA_POINT_LEN;
            let mut record = [0u8; DATA_POINT_LEN];
            record.copy_from_slice(&bytes[offset..offset + DATA_POINT_LEN]);
            let dp = DataPoint::decode(&record);
            self.ring[self.head] = dp;
            self.head = (self.head + 1) % capacity;
            self.count += 1;
        }

        self.wrapped = stored > capacity;
        self.total_points = stored as u64;
        self.flushed_up_to = self.total_points;
        self.header_written = true;
        Ok(self.count > 0)
    }

    /// Sample and flush on their own cadences. Call every tick while the
    /// controller runs; a no-op when no session is active.
    pub fn update(&mut self, now_ms: u64, epoch: Option<u32>, sample: &SessionSample) {
        if !self.active {
            return;
        }

        let sample_due = match self.last_sample_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.cfg.sample_interval_ms,
        };

        if sample_due {
            self.last_sample_ms = Some(now_ms);
            self.add_point(DataPoint {
                timestamp: epoch.unwrap_or(0),
                pit_deci: deci_from_degrees(sample.pit),
                meat1_deci: deci_from_degrees(sample.meat1),
                meat2_deci: deci_from_degrees(sample.meat2),
                fan_pct: sample.fan_pct,
                damper_pct: sample.damper_pct,
                flags: sample.flags,
            });
        }

        if now_ms.saturating_sub(self.last_flush_ms) >= self.cfg.flush_interval_ms {
            self.last_flush_ms = now_ms;
            self.flush();
        }
    }

    /// Insert a point at the head, saturating the count at capacity.
    pub fn add_point(&mut self, dp: DataPoint) {
        let capacity = self.cfg.capacity;
        self.ring[self.head] = dp;
        self.head = (self.head + 1) % capacity;
        if self.count < capacity {
            self.count += 1;
        } else {
            self.wrapped = true;
        }
        self.total_points += 1;
    }

    /// Append every not-yet-flushed point, bounded by what the ring still
    /// holds: points older than the ring at flush time are lost by
    /// construction. On a write failure nothing advances and the same span
    /// is retried at the next interval.
    pub fn flush(&mut self) {
        let pending = self.total_points - self.flushed_up_to;
        if pending == 0 {
            return;
        }

        let to_flush = pending.min(self.count as u64) as usize;
        if pending > self.count as u64 {
            tracing::debug!(
                lost = pending - self.count as u64,
                "points aged out of the ring before flush"
            );
        }

        let mut buf = Vec::with_capacity(HEADER_LEN + to_flush * DATA_POINT_LEN);
        if !self.header_written {
            buf.extend_from_slice(&self.start_epoch.to_le_bytes());
        }

        let capacity = self.cfg.capacity;
        let start = (self.head + capacity - to_flush) % capacity;
        for i in 0..to_flush {
            let dp = &self.ring[(start + i) % capacity];
            buf.extend_from_slice(&dp.encode());
        }

        match self.store.append(&buf) {
            Ok(()) => {
                self.header_written = true;
                self.flushed_up_to = self.total_points;
                tracing::debug!(points = to_flush, "session flushed");
            }
            Err(e) => {
                tracing::warn!(error = %e, "session flush failed, will retry");
            }
        }
    }

    /// Start a fresh session: wipe RAM and the stored file, stamp the start
    /// epoch, and begin recording.
    pub fn start_session(&mut self, now_ms: u64, epoch: Option<u32>) {
        self.clear_ram();
        self.remove_stored();
        self.active = true;
        self.start_epoch = epoch.unwrap_or(0);
        self.last_sample_ms = Some(now_ms);
        self.last_flush_ms = now_ms;
        tracing::info!(start_epoch = self.start_epoch, "cook session started");
    }

    /// Flush the tail and stop recording. The file stays for later export.
    pub fn end_session(&mut self) {
        if self.active {
            self.flush();
            self.active = false;
            tracing::info!(total = self.total_points, "cook session ended");
        }
    }

    /// Wipe RAM and the stored file; no session remains active.
    pub fn clear(&mut self) {
        self.clear_ram();
        self.remove_stored();
        tracing::info!("cook session cleared");
    }

    fn clear_ram(&mut self) {
        self.ring.fill(DataPoint::default());
        self.head = 0;
        self.count = 0;
        self.wrapped = false;
        self.active = false;
        self.start_epoch = 0;
        self.total_points = 0;
        self.flushed_up_to = 0;
        self.header_written = false;
        self.last_sample_ms = None;
    }

    fn remove_stored(&mut self) {
        if let Err(e) = self.store.remove() {
            tracing::warn!(error = %e, "failed to remove session file");
        }
        self.header_written = false;
    }

    /// i-th oldest point, translating through the wrap-adjusted origin.
    pub fn get_point(&self, index: usize) -> Option<&DataPoint> {
        if index >= self.count {
            return None;
        }
        let physical = if self.wrapped {
            (self.head + index) % self.cfg.capacity
        } else {
            index
        };
        Some(&self.ring[physical])
    }

    /// CSV of every in-RAM point, oldest first; temperatures in degrees with
    /// one decimal.
    pub fn to_csv(&self) -> String {
        let mut csv = String::with_capacity(64 + self.count * 48);
        csv.push_str("timestamp,pit,meat1,meat2,fan,damper,flags\n");
        for i in 0..self.count {
            if let Some(dp) = self.get_point(i) {
                csv.push_str(&format!(
                    "{},{:.1},{:.1},{:.1},{},{},{}\n",
                    dp.timestamp,
                    dp.pit_degrees(),
                    dp.meat1_degrees(),
                    dp.meat2_degrees(),
                    dp.fan_pct,
                    dp.damper_pct,
                    dp.flags
                ));
            }
        }
        csv
    }

    /// JSON array of every in-RAM point, oldest first.
    pub fn to_json(&self) -> Result<String> {
        let mut rows = Vec::with_capacity(self.count);
        for i in 0..self.count {
            if let Some(dp) = self.get_point(i) {
                rows.push(JsonPoint {
                    ts: dp.timestamp,
                    pit: dp.pit_degrees(),
                    meat1: dp.meat1_degrees(),
                    meat2: dp.meat2_degrees(),
                    fan: dp.fan_pct,
                    damper: dp.damper_pct,
                    flags: dp.flags,
                });
            }
        }
        Ok(serde_json::to_string(&rows)?)
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn total_points(&self) -> u64 {
        self.total_points
    }

    pub fn flushed_up_to(&self) -> u64 {
        self.flushed_up_to
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_wrapped(&self) -> bool {
        self.wrapped
    }

    pub fn start_epoch(&self) -> u32 {
        self.start_epoch
    }

    pub fn capacity(&self) -> usize {
        self.cfg.capacity
    }

    pub fn elapsed_secs(&self, now_epoch: Option<u32>) -> u32 {
        if !self.active || self.start_epoch == 0 {
            return 0;
        }
        match now_epoch {
            Some(now) if now >= self.start_epoch => now - self.start_epoch,
            _ => 0,
        }
    }
}
