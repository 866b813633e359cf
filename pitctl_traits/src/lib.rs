pub mod clock;

pub use clock::{Clock, MonotonicClock};

type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Single-ended ADC with one channel per probe.
pub trait ProbeAdc {
    /// Read raw counts from `channel` (0 = pit, 1 = meat1, 2 = meat2).
    fn read(&mut self, channel: u8) -> Result<i32, BoxedError>;
}

/// Fan output: one 8-bit PWM duty register at a fixed 25 kHz carrier.
pub trait FanPwm {
    fn write_duty(&mut self, duty: u8) -> Result<(), BoxedError>;
}

/// Damper servo: standard 50 Hz hobby-servo pulse width in microseconds.
pub trait DamperServo {
    fn write_pulse_us(&mut self, us: u16) -> Result<(), BoxedError>;
}

/// Piezo buzzer with a controllable tone frequency.
pub trait Buzzer {
    fn tone_on(&mut self, freq_hz: u16) -> Result<(), BoxedError>;
    fn tone_off(&mut self) -> Result<(), BoxedError>;
}

/// Append-only persistent backing for the cook-session file.
///
/// A store represents exactly one session file. `read_all` returns None when
/// no file exists yet (fresh boot, or after `remove`).
pub trait SessionStore {
    fn append(&mut self, bytes: &[u8]) -> Result<(), BoxedError>;
    fn read_all(&mut self) -> Result<Option<Vec<u8>>, BoxedError>;
    fn remove(&mut self) -> Result<(), BoxedError>;
}

// Boxed ports forward to the inner implementation so dynamically-assembled
// stacks (the CLI picks backends at runtime) satisfy the same bounds.

impl<T: ProbeAdc + ?Sized> ProbeAdc for Box<T> {
    fn read(&mut self, channel: u8) -> Result<i32, BoxedError> {
        (**self).read(channel)
    }
}

impl<T: FanPwm + ?Sized> FanPwm for Box<T> {
    fn write_duty(&mut self, duty: u8) -> Result<(), BoxedError> {
        (**self).write_duty(duty)
    }
}

impl<T: DamperServo + ?Sized> DamperServo for Box<T> {
    fn write_pulse_us(&mut self, us: u16) -> Result<(), BoxedError> {
        (**self).write_pulse_us(us)
    }
}

impl<T: Buzzer + ?Sized> Buzzer for Box<T> {
    fn tone_on(&mut self, freq_hz: u16) -> Result<(), BoxedError> {
        (**self).tone_on(freq_hz)
    }

    fn tone_off(&mut self) -> Result<(), BoxedError> {
        (**self).tone_off()
    }
}

impl<T: SessionStore + ?Sized> SessionStore for Box<T> {
    fn append(&mut self, bytes: &[u8]) -> Result<(), BoxedError> {
        (**self).append(bytes)
    }

    fn read_all(&mut self) -> Result<Option<Vec<u8>>, BoxedError> {
        (**self).read_all()
    }

    fn remove(&mut self) -> Result<(), BoxedError> {
        (**self).remove()
    }
}
