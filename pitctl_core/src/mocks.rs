//! Test and simulator helpers: a manually-advanced clock, recording port
//! fakes with shared handles, and an in-memory session store with failure
//! injection.

use std::error::Error;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use pitctl_traits::clock::Clock;
use pitctl_traits::{Buzzer, DamperServo, FanPwm, ProbeAdc, SessionStore};

type BoxedError = Box<dyn Error + Send + Sync>;

/// Deterministic clock whose monotonic time and wall epoch advance only on
/// request. `sleep` advances time instead of blocking. Clones share state.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    offset_ms: Arc<AtomicU64>,
    /// 0 means "wall clock not available".
    epoch_base: Arc<AtomicU32>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset_ms: Arc::new(AtomicU64::new(0)),
            epoch_base: Arc::new(AtomicU32::new(0)),
        }
    }

    /// A clock whose wall time starts at `epoch` and tracks monotonic time.
    pub fn with_epoch(epoch: u32) -> Self {
        let clock = Self::new();
        clock.epoch_base.store(epoch, Ordering::Relaxed);
        clock
    }

    pub fn advance_ms(&self, ms: u64) {
        self.offset_ms.fetch_add(ms, Ordering::Relaxed);
    }

    pub fn set_epoch(&self, epoch: u32) {
        self.epoch_base.store(epoch, Ordering::Relaxed);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + Duration::from_millis(self.offset_ms.load(Ordering::Relaxed))
    }

    fn epoch_secs(&self) -> Option<u32> {
        let base = self.epoch_base.load(Ordering::Relaxed);
        if base == 0 {
            return None;
        }
        Some(base + (self.offset_ms.load(Ordering::Relaxed) / 1000) as u32)
    }

    fn sleep(&self, d: Duration) {
        self.advance_ms(d.as_millis() as u64);
    }
}

/// ADC returning per-channel counts settable from the test side while the
/// controller owns the port. Clones share the channel array.
#[derive(Debug, Clone)]
pub struct ScriptedAdc {
    counts: Arc<Mutex<[i32; 3]>>,
}

impl ScriptedAdc {
    /// All channels start at full scale (reads as open probes).
    pub fn new() -> Self {
        Self {
            counts: Arc::new(Mutex::new([i32::MAX; 3])),
        }
    }

    pub fn set_counts(&self, channel: u8, counts: i32) {
        if let Ok(mut guard) = self.counts.lock() {
            guard[channel as usize % 3] = counts;
        }
    }
}

impl Default for ScriptedAdc {
    fn default() -> Self {
        Self::new()
    }
}

impl ProbeAdc for ScriptedAdc {
    fn read(&mut self, channel: u8) -> Result<i32, BoxedError> {
        let guard = self
            .counts
            .lock()
            .map_err(|_| BoxedError::from("adc mutex poisoned"))?;
        Ok(guard[channel as usize % 3])
    }
}

/// Fan PWM fake recording every duty written. Clones share the history.
#[derive(Debug, Clone, Default)]
pub struct RecordingPwm {
    duties: Arc<Mutex<Vec<u8>>>,
}

impl RecordingPwm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_duty(&self) -> Option<u8> {
        self.duties.lock().ok()?.last().copied()
    }

    pub fn history(&self) -> Vec<u8> {
        self.duties.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

impl FanPwm for RecordingPwm {
    fn write_duty(&mut self, duty: u8) -> Result<(), BoxedError> {
        self.duties
            .lock()
            .map_err(|_| BoxedError::from("pwm mutex poisoned"))?
            .push(duty);
        Ok(())
    }
}

/// Servo fake recording every pulse width written.
#[derive(Debug, Clone, Default)]
pub struct RecordingServo {
    pulses: Arc<Mutex<Vec<u16>>>,
}

impl RecordingServo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_pulse_us(&self) -> Option<u16> {
        self.pulses.lock().ok()?.last().copied()
    }
}

impl DamperServo for RecordingServo {
    fn write_pulse_us(&mut self, us: u16) -> Result<(), BoxedError> {
        self.pulses
            .lock()
            .map_err(|_| BoxedError::from("servo mutex poisoned"))?
            .push(us);
        Ok(())
    }
}

/// Buzzer fake tracking the current tone state.
#[derive(Debug, Clone, Default)]
pub struct RecordingBuzzer {
    on: Arc<AtomicBool>,
    last_freq: Arc<AtomicU32>,
}

impl RecordingBuzzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_on(&self) -> bool {
        self.on.load(Ordering::Relaxed)
    }

    pub fn last_freq(&self) -> u16 {
        self.last_freq.load(Ordering::Relaxed) as u16
    }
}

impl Buzzer for RecordingBuzzer {
    fn tone_on(&mut self, freq_hz: u16) -> Result<(), BoxedError> {
        self.on.store(true, Ordering::Relaxed);
        self.last_freq.store(u32::from(freq_hz), Ordering::Relaxed);
        Ok(())
    }

    fn tone_off(&mut self) -> Result<(), BoxedError> {
        self.on.store(false, Ordering::Relaxed);
        Ok(())
    }
}

/// In-memory session store. `None` contents model an absent file. Appends
/// can be made to fail to exercise the retry path.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<Mutex<Option<Vec<u8>>>>,
    fail_appends: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-seeded with a session file image.
    pub fn with_contents(bytes: Vec<u8>) -> Self {
        let store = Self::default();
        if let Ok(mut guard) = store.data.lock() {
            *guard = Some(bytes);
        }
        store
    }

    pub fn set_fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::Relaxed);
    }

    pub fn contents(&self) -> Option<Vec<u8>> {
        self.data.lock().ok()?.clone()
    }
}

impl SessionStore for MemoryStore {
    fn append(&mut self, bytes: &[u8]) -> Result<(), BoxedError> {
        if self.fail_appends.load(Ordering::Relaxed) {
            return Err(BoxedError::from("storage append failed"));
        }
        let mut guard = self
            .data
            .lock()
            .map_err(|_| BoxedError::from("store mutex poisoned"))?;
        guard.get_or_insert_with(Vec::new).extend_from_slice(bytes);
        Ok(())
    }

    fn read_all(&mut self) -> Result<Option<Vec<u8>>, BoxedError> {
        let guard = self
            .data
            .lock()
            .map_err(|_| BoxedError::from("store mutex poisoned"))?;
        Ok(guard.clone())
    }

    fn remove(&mut self) -> Result<(), BoxedError> {
        let mut guard = self
            .data
            .lock()
            .map_err(|_| BoxedError::from("store mutex poisoned"))?;
        *guard = None;
        Ok(())
    }
}
