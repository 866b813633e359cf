//! The orchestrator: owns every subsystem exclusively, runs the ~100 Hz
//! cooperative tick in dependency order, accepts commands through a channel
//! inbox, and broadcasts state snapshots to subscribers.
//!
//! No subsystem holds a reference to another; shared reads flow through the
//! per-tick values computed here. Commands submitted from other threads are
//! drained at the top of the next tick, which gives mutations shadow
//! semantics: a tick never observes a half-applied command.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded, unbounded};
use pitctl_traits::clock::Clock;
use pitctl_traits::{Buzzer, DamperServo, FanPwm, ProbeAdc, SessionStore};

use crate::alarm::{AlarmCenter, AlarmInputs, AlarmKind};
use crate::config::CoreConfig;
use crate::damper::DamperDrive;
use crate::fan::FanDrive;
use crate::faults::FaultMonitor;
use crate::pid::PitPid;
use crate::predictor::EtaPredictor;
use crate::probe::{MeatProbe, ProbeId, ProbeSampler};
use crate::session::{CookSession, SessionSample, flags};
use crate::snapshot::StateSnapshot;
use crate::split::split_output;

/// Bottom-of-tick sleep for `run_for`.
const TICK_SLEEP: Duration = Duration::from_millis(10);
/// Capacity of each subscriber's snapshot channel; a slow subscriber drops
/// frames rather than stalling the loop.
const SUBSCRIBER_DEPTH: usize = 8;

/// External command surface. Submitted through a `CommandSender` and applied
/// on the scheduler thread at the top of the next tick.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetSetpoint(f32),
    /// A target of 0 clears the target and re-arms the done alarm.
    SetMeatTarget(MeatProbe, f32),
    /// Rejected silently when the band is not positive.
    SetPitBand(f32),
    AcknowledgeAlarms,
    StartSession,
    EndSession,
    ClearSession,
    SetAlarmsEnabled(bool),
    SetPidEnabled(bool),
    SetPidTunings { kp: f32, ki: f32, kd: f32 },
    SetLinkConnected(bool),
    SetManualFanDuty(u8),
    FanOff,
}

/// Cloneable handle for submitting commands from other threads.
#[derive(Debug, Clone)]
pub struct CommandSender(Sender<Command>);

impl CommandSender {
    /// Returns false if the controller has been dropped.
    pub fn send(&self, cmd: Command) -> bool {
        self.0.send(cmd).is_ok()
    }
}

impl<A, F, D, B, S> std::fmt::Debug for PitController<A, F, D, B, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PitController").finish_non_exhaustive()
    }
}

pub struct PitController<A, F, D, B, S> {
    pub(crate) sampler: ProbeSampler<A>,
    pub(crate) pid: PitPid,
    pub(crate) fan: FanDrive<F>,
    pub(crate) damper: DamperDrive<D>,
    pub(crate) alarms: AlarmCenter<B>,
    pub(crate) faults: FaultMonitor,
    pub(crate) predictor: EtaPredictor,
    pub(crate) session: CookSession<S>,

    clock: Arc<dyn Clock + Send + Sync>,
    epoch: Instant,

    setpoint: f32,
    pit_reached: bool,
    reached_window: f32,
    fan_on_threshold: f32,
    pid_sample_ms: u64,
    snapshot_interval_ms: u64,

    last_pid_ms: Option<u64>,
    last_broadcast_ms: u64,

    cmd_tx: Sender<Command>,
    cmd_rx: Receiver<Command>,
    subscribers: Vec<Sender<StateSnapshot>>,
}

impl<A, F, D, B, S> PitController<A, F, D, B, S>
where
    A: ProbeAdc,
    F: FanPwm,
    D: DamperServo,
    B: Buzzer,
    S: SessionStore,
{
    /// Construct from already-validated parts; use the builder instead.
    pub(crate) fn from_parts(
        adc: A,
        fan_pwm: F,
        servo: D,
        buzzer: B,
        store: S,
        cfg: CoreConfig,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        let probe_names = [
            cfg.probes[0].name.clone(),
            cfg.probes[1].name.clone(),
            cfg.probes[2].name.clone(),
        ];
        let (cmd_tx, cmd_rx) = unbounded();
        let epoch = clock.now();

        Self {
            sampler: ProbeSampler::new(adc, cfg.sampler.clone(), cfg.probes.clone(), cfg.unit),
            pid: PitPid::new(cfg.pid.clone(), cfg.lid.clone()),
            fan: FanDrive::new(fan_pwm, cfg.fan.clone()),
            damper: DamperDrive::new(servo, cfg.damper.clone()),
            alarms: AlarmCenter::new(buzzer, cfg.alarm.clone()),
            faults: FaultMonitor::new(cfg.fireout.clone(), probe_names),
            predictor: EtaPredictor::new(&cfg.predictor),
            session: CookSession::new(store, cfg.session.clone()),
            clock,
            epoch,
            setpoint: cfg.setpoint,
            pit_reached: false,
            reached_window: cfg.alarm.reached_window,
            fan_on_threshold: cfg.fan.on_threshold,
            pid_sample_ms: cfg.pid.sample_ms,
            snapshot_interval_ms: cfg.snapshot_interval_ms,
            last_pid_ms: None,
            last_broadcast_ms: 0,
            cmd_tx,
            cmd_rx,
            subscribers: Vec::new(),
        }
    }

    /// One-time startup: recover any prior cook session from storage.
    pub fn begin(&mut self) {
        self.session.begin();
    }

    pub fn command_sender(&self) -> CommandSender {
        CommandSender(self.cmd_tx.clone())
    }

    /// Register a snapshot subscriber. Frames arrive at the snapshot
    /// cadence; a full channel drops the frame for that subscriber.
    pub fn subscribe(&mut self) -> Receiver<StateSnapshot> {
        let (tx, rx) = bounded(SUBSCRIBER_DEPTH);
        self.subscribers.push(tx);
        rx
    }

    /// One scheduler iteration. Never fails: port errors degrade the
    /// affected subsystem and are logged.
    pub fn tick(&mut self) {
        let now_ms = self.clock.ms_since(self.epoch);

        self.drain_commands();

        self.sampler.update(now_ms);
        let pit = self.sampler.reading(ProbeId::Pit);
        let meat1 = self.sampler.reading(ProbeId::Meat1);
        let meat2 = self.sampler.reading(ProbeId::Meat2);

        let pid_due = match self.last_pid_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.pid_sample_ms,
        };
        if pid_due {
            self.last_pid_ms = Some(now_ms);
            match pit.temp() {
                Some(t) => {
                    self.pid.compute(t, self.setpoint);
                    if !self.pit_reached && (t - self.setpoint).abs() <= self.reached_window {
                        self.pit_reached = true;
                        tracing::info!(setpoint = self.setpoint, "pit reached setpoint");
                    }
                }
                None => {
                    // Invalid pit probe: safe idle rather than regulating on
                    // a sentinel value.
                    self.pid.hold_idle();
                }
            }
        }

        let split = split_output(self.pid.output(), self.fan_on_threshold);
        self.damper.set_position(split.damper_pct);
        self.fan.set_speed(split.fan_pct);
        self.fan.update(now_ms);

        self.alarms.update(
            now_ms,
            &AlarmInputs {
                pit: pit.temp(),
                meat1: meat1.temp(),
                meat2: meat2.temp(),
                setpoint: self.setpoint,
                pit_reached: self.pit_reached,
            },
        );

        self.faults.update(
            now_ms,
            pit.temp(),
            self.fan.current_pct(),
            self.sampler.statuses(),
        );

        let epoch_secs = self.clock.epoch_secs();
        self.predictor
            .update(now_ms, epoch_secs, meat1.temp(), meat2.temp());

        let sample = self.session_sample();
        self.session.update(now_ms, epoch_secs, &sample);

        self.broadcast(now_ms);
    }

    /// Run ticks until `duration` elapses, sleeping ~10 ms per iteration.
    pub fn run_for(&mut self, duration: Duration) {
        let deadline = self.clock.now() + duration;
        while self.clock.now() < deadline {
            self.tick();
            self.clock.sleep(TICK_SLEEP);
        }
    }

    fn drain_commands(&mut self) {
        while let Ok(cmd) = self.cmd_rx.try_recv() {
            self.apply(cmd);
        }
    }

    fn apply(&mut self, cmd: Command) {
        tracing::debug!(?cmd, "command applied");
        match cmd {
            Command::SetSetpoint(v) => self.set_setpoint(v),
            Command::SetMeatTarget(meat, target) => self.set_meat_target(meat, target),
            Command::SetPitBand(band) => self.set_pit_band(band),
            Command::AcknowledgeAlarms => self.acknowledge_alarms(),
            Command::StartSession => self.start_session(),
            Command::EndSession => self.end_session(),
            Command::ClearSession => self.clear_session(),
            Command::SetAlarmsEnabled(on) => self.set_alarms_enabled(on),
            Command::SetPidEnabled(on) => self.set_pid_enabled(on),
            Command::SetPidTunings { kp, ki, kd } => self.set_pid_tunings(kp, ki, kd),
            Command::SetLinkConnected(on) => self.set_link_connected(on),
            Command::SetManualFanDuty(duty) => self.fan.set_manual_duty(duty),
            Command::FanOff => self.fan.off(),
        }
    }

    // ── Command entry points (same-thread callers) ───────────────────────

    /// Negative setpoints are rejected silently.
    pub fn set_setpoint(&mut self, degrees: f32) {
        if degrees.is_finite() && degrees >= 0.0 {
            self.setpoint = degrees;
        }
    }

    pub fn set_meat_target(&mut self, meat: MeatProbe, target: f32) {
        self.alarms.set_meat_target(meat, target);
        self.predictor.set_target(meat, target);
    }

    pub fn set_pit_band(&mut self, band: f32) {
        self.alarms.set_pit_band(band);
    }

    pub fn acknowledge_alarms(&mut self) {
        self.alarms.acknowledge();
    }

    pub fn start_session(&mut self) {
        let now_ms = self.clock.ms_since(self.epoch);
        self.session.start_session(now_ms, self.clock.epoch_secs());
    }

    pub fn end_session(&mut self) {
        self.session.end_session();
    }

    pub fn clear_session(&mut self) {
        self.session.clear();
    }

    pub fn set_alarms_enabled(&mut self, enabled: bool) {
        self.alarms.set_enabled(enabled);
    }

    pub fn set_pid_enabled(&mut self, enabled: bool) {
        self.pid.set_enabled(enabled);
    }

    pub fn set_pid_tunings(&mut self, kp: f32, ki: f32, kd: f32) {
        self.pid.set_tunings(kp, ki, kd);
    }

    pub fn set_link_connected(&mut self, connected: bool) {
        self.faults.set_link_connected(connected);
    }

    // ── Observers ────────────────────────────────────────────────────────

    pub fn setpoint(&self) -> f32 {
        self.setpoint
    }

    pub fn pit_reached(&self) -> bool {
        self.pit_reached
    }

    pub fn sampler(&self) -> &ProbeSampler<A> {
        &self.sampler
    }

    pub fn pid(&self) -> &PitPid {
        &self.pid
    }

    pub fn fan(&self) -> &FanDrive<F> {
        &self.fan
    }

    pub fn damper(&self) -> &DamperDrive<D> {
        &self.damper
    }

    pub fn alarms(&self) -> &AlarmCenter<B> {
        &self.alarms
    }

    pub fn faults(&self) -> &FaultMonitor {
        &self.faults
    }

    pub fn predictor(&self) -> &EtaPredictor {
        &self.predictor
    }

    pub fn session(&self) -> &CookSession<S> {
        &self.session
    }

    /// Build the current state frame on demand.
    pub fn snapshot(&self) -> StateSnapshot {
        let now_ms = self.clock.ms_since(self.epoch);
        let epoch_secs = self.clock.epoch_secs();
        let pit = self.sampler.reading(ProbeId::Pit);
        let meat1 = self.sampler.reading(ProbeId::Meat1);
        let meat2 = self.sampler.reading(ProbeId::Meat2);

        StateSnapshot {
            epoch: epoch_secs,
            uptime_ms: now_ms,
            setpoint: self.setpoint,
            pit: pit.temp(),
            meat1: meat1.temp(),
            meat2: meat2.temp(),
            fan_pct: self.fan.current_pct(),
            fan_duty: self.fan.current_duty(),
            damper_pct: self.damper.position_pct(),
            lid_open: self.pid.is_lid_open(),
            pit_reached: self.pit_reached,
            meat1_eta: self.predictor.eta_epoch(MeatProbe::Meat1, epoch_secs),
            meat2_eta: self.predictor.eta_epoch(MeatProbe::Meat2, epoch_secs),
            meat1_rate: self.predictor.rate_per_min(MeatProbe::Meat1),
            meat2_rate: self.predictor.rate_per_min(MeatProbe::Meat2),
            alarms: self.alarms.active().to_vec(),
            alarming: self.alarms.is_alarming(),
            errors: self.faults.messages(),
            session_active: self.session.is_active(),
            session_points: self.session.count(),
        }
    }

    fn session_sample(&self) -> SessionSample {
        let pit = self.sampler.reading(ProbeId::Pit);
        let meat1 = self.sampler.reading(ProbeId::Meat1);
        let meat2 = self.sampler.reading(ProbeId::Meat2);

        let mut flag_bits = 0u8;
        if self.pid.is_lid_open() {
            flag_bits |= flags::LID_OPEN;
        }
        if self.alarms.is_active(AlarmKind::PitHigh) || self.alarms.is_active(AlarmKind::PitLow) {
            flag_bits |= flags::ALARM_PIT;
        }
        if self.alarms.is_active(AlarmKind::Meat1Done) {
            flag_bits |= flags::ALARM_MEAT1;
        }
        if self.alarms.is_active(AlarmKind::Meat2Done) {
            flag_bits |= flags::ALARM_MEAT2;
        }
        if self.faults.is_fire_out() {
            flag_bits |= flags::FIRE_OUT;
        }
        if !pit.is_ok() {
            flag_bits |= flags::PIT_DISC;
        }
        if !meat1.is_ok() {
            flag_bits |= flags::MEAT1_DISC;
        }
        if !meat2.is_ok() {
            flag_bits |= flags::MEAT2_DISC;
        }

        SessionSample {
            pit: pit.temp_or_zero(),
            meat1: meat1.temp_or_zero(),
            meat2: meat2.temp_or_zero(),
            fan_pct: (self.fan.current_pct() + 0.5) as u8,
            damper_pct: (self.damper.position_pct() + 0.5) as u8,
            flags: flag_bits,
        }
    }

    fn broadcast(&mut self, now_ms: u64) {
        if self.subscribers.is_empty() {
            return;
        }
        if now_ms.saturating_sub(self.last_broadcast_ms) < self.snapshot_interval_ms {
            return;
        }
        self.last_broadcast_ms = now_ms;

        let frame = self.snapshot();
        self.subscribers
            .retain(|tx| match tx.try_send(frame.clone()) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => true, // drop the frame, keep the subscriber
                Err(TrySendError::Disconnected(_)) => false,
            });
    }
}
