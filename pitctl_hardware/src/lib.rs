//! pitctl_hardware: hardware and simulation backends behind `pitctl_traits`.
//!
//! Features:
//! - `hardware`: adds Raspberry Pi implementations (rppal PWM
//!   fan/servo/buzzer, ADS1115 probe ADC over I2C).
//! - (default) simulation types that satisfy the traits, so CI on x86
//!   builds without GPIO libraries. The sim backends are always compiled;
//!   the feature only adds the real ones.
//!
//! The file-backed session store works everywhere and lives in `store`.

pub mod error;
pub mod store;

pub use store::FileSessionStore;

pub mod sim {
    use pitctl_traits::{Buzzer, DamperServo, FanPwm, ProbeAdc};
    use std::error::Error;
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU16, Ordering};

    type BoxedError = Box<dyn Error + Send + Sync>;

    /// Simulated three-channel probe ADC with settable counts per channel.
    /// Channels default to full scale, which the sampler classifies as an
    /// open probe. Clones share state.
    #[derive(Debug, Clone)]
    pub struct SimProbes {
        counts: Arc<Mutex<[i32; 3]>>,
    }

    impl SimProbes {
        pub fn new() -> Self {
            Self {
                counts: Arc::new(Mutex::new([32_767; 3])),
            }
        }

        /// Seed channel counts from `PITCTL_SIM_COUNTS` ("pit,meat1,meat2"),
        /// for demos and CLI tests.
        pub fn from_env() -> Self {
            let probes = Self::new();
            if let Ok(spec) = std::env::var("PITCTL_SIM_COUNTS") {
                let parsed: Vec<i32> = spec
                    .split(',')
                    .filter_map(|s| s.trim().parse().ok())
                    .collect();
                if let Ok(mut guard) = probes.counts.lock() {
                    for (slot, value) in guard.iter_mut().zip(parsed) {
                        *slot = value;
                    }
                }
            }
            probes
        }

        pub fn set_counts(&self, channel: u8, counts: i32) {
            if let Ok(mut guard) = self.counts.lock() {
                guard[channel as usize % 3] = counts;
            }
        }
    }

    impl Default for SimProbes {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ProbeAdc for SimProbes {
        fn read(&mut self, channel: u8) -> Result<i32, BoxedError> {
            let guard = self
                .counts
                .lock()
                .map_err(|_| BoxedError::from("sim adc poisoned"))?;
            Ok(guard[channel as usize % 3])
        }
    }

    /// Simulated fan output; remembers the last duty written.
    #[derive(Debug, Clone, Default)]
    pub struct SimFan {
        duty: Arc<AtomicU8>,
    }

    impl SimFan {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn duty(&self) -> u8 {
            self.duty.load(Ordering::Relaxed)
        }
    }

    impl FanPwm for SimFan {
        fn write_duty(&mut self, duty: u8) -> Result<(), BoxedError> {
            self.duty.store(duty, Ordering::Relaxed);
            tracing::trace!(duty, "sim fan duty");
            Ok(())
        }
    }

    /// Simulated damper servo; remembers the last pulse width.
    #[derive(Debug, Clone, Default)]
    pub struct SimServo {
        pulse_us: Arc<AtomicU16>,
    }

    impl SimServo {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn pulse_us(&self) -> u16 {
            self.pulse_us.load(Ordering::Relaxed)
        }
    }

    impl DamperServo for SimServo {
        fn write_pulse_us(&mut self, us: u16) -> Result<(), BoxedError> {
            self.pulse_us.store(us, Ordering::Relaxed);
            tracing::trace!(us, "sim servo pulse");
            Ok(())
        }
    }

    /// Simulated buzzer; tracks tone state.
    #[derive(Debug, Clone, Default)]
    pub struct SimBuzzer {
        on: Arc<AtomicBool>,
    }

    impl SimBuzzer {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn is_on(&self) -> bool {
            self.on.load(Ordering::Relaxed)
        }
    }

    impl Buzzer for SimBuzzer {
        fn tone_on(&mut self, freq_hz: u16) -> Result<(), BoxedError> {
            self.on.store(true, Ordering::Relaxed);
            tracing::trace!(freq_hz, "sim buzzer on");
            Ok(())
        }

        fn tone_off(&mut self) -> Result<(), BoxedError> {
            self.on.store(false, Ordering::Relaxed);
            Ok(())
        }
    }
}

#[cfg(feature = "hardware")]
pub mod hardware {
    use crate::error::HwError;
    use anyhow::{Context, Result};
    use pitctl_traits::{Buzzer, DamperServo, FanPwm, ProbeAdc};
    use std::error::Error;
    use std::time::Duration;

    use ads1x1x::ic::{Ads1115, Resolution16Bit};
    use ads1x1x::mode::OneShot;
    use ads1x1x::{Ads1x1x, ChannelSelection, DynamicOneShot, FullScaleRange, TargetAddr};
    use linux_embedded_hal::I2cdev;
    use rppal::gpio::{Gpio, OutputPin};
    use rppal::pwm::{Channel, Polarity, Pwm};

    type BoxedError = Box<dyn Error + Send + Sync>;
    type Ads = Ads1x1x<I2cdev, Ads1115, Resolution16Bit, OneShot>;

    const FAN_PWM_HZ: f64 = 25_000.0;
    const SERVO_PERIOD: Duration = Duration::from_millis(20);

    /// ADS1115-backed probe ADC, single-ended channels A0..A2.
    pub struct Ads1115Probes {
        adc: Ads,
    }

    impl Ads1115Probes {
        pub fn try_new(i2c_bus: &str) -> Result<Self> {
            let dev = I2cdev::new(i2c_bus).context("open I2C bus for ADS1115")?;
            let mut adc = Ads1x1x::new_ads1115(dev, TargetAddr::default());
            adc.set_full_scale_range(FullScaleRange::Within4_096V)
                .map_err(|e| anyhow::anyhow!("set ADS1115 range: {e:?}"))?;
            Ok(Self { adc })
        }
    }

    impl ProbeAdc for Ads1115Probes {
        fn read(&mut self, channel: u8) -> Result<i32, BoxedError> {
            let selection = match channel {
                0 => ChannelSelection::SingleA0,
                1 => ChannelSelection::SingleA1,
                2 => ChannelSelection::SingleA2,
                other => return Err(Box::new(HwError::BadChannel(other))),
            };
            let raw = nb::block!(self.adc.read(selection))
                .map_err(|e| Box::new(HwError::AdcRead(format!("{e:?}"))) as BoxedError)?;
            Ok(i32::from(raw))
        }
    }

    /// Hardware PWM fan on one of the Pi's PWM channels, 25 kHz carrier.
    pub struct PwmFan {
        pwm: Pwm,
    }

    impl PwmFan {
        pub fn try_new(channel: Channel) -> Result<Self> {
            let pwm = Pwm::with_frequency(channel, FAN_PWM_HZ, 0.0, Polarity::Normal, true)
                .context("open fan PWM channel")?;
            Ok(Self { pwm })
        }
    }

    impl FanPwm for PwmFan {
        fn write_duty(&mut self, duty: u8) -> Result<(), BoxedError> {
            self.pwm
                .set_duty_cycle(f64::from(duty) / 255.0)
                .map_err(|e| Box::new(HwError::Pwm(e.to_string())) as BoxedError)
        }
    }

    /// Standard 50 Hz hobby servo on a hardware PWM channel.
    pub struct PwmServo {
        pwm: Pwm,
    }

    impl PwmServo {
        pub fn try_new(channel: Channel) -> Result<Self> {
            let pwm = Pwm::with_period(
                channel,
                SERVO_PERIOD,
                Duration::from_micros(1500),
                Polarity::Normal,
                true,
            )
            .context("open servo PWM channel")?;
            Ok(Self { pwm })
        }
    }

    impl DamperServo for PwmServo {
        fn write_pulse_us(&mut self, us: u16) -> Result<(), BoxedError> {
            self.pwm
                .set_pulse_width(Duration::from_micros(u64::from(us)))
                .map_err(|e| Box::new(HwError::Servo(e.to_string())) as BoxedError)
        }
    }

    /// Piezo buzzer driven by software PWM at the tone frequency.
    pub struct GpioBuzzer {
        pin: OutputPin,
    }

    impl GpioBuzzer {
        pub fn try_new(bcm_pin: u8) -> Result<Self> {
            let gpio = Gpio::new().context("open GPIO")?;
            let pin = gpio
                .get(bcm_pin)
                .context("get buzzer pin")?
                .into_output_low();
            Ok(Self { pin })
        }
    }

    impl Buzzer for GpioBuzzer {
        fn tone_on(&mut self, freq_hz: u16) -> Result<(), BoxedError> {
            self.pin
                .set_pwm_frequency(f64::from(freq_hz), 0.5)
                .map_err(|e| Box::new(HwError::Buzzer(e.to_string())) as BoxedError)
        }

        fn tone_off(&mut self) -> Result<(), BoxedError> {
            self.pin
                .clear_pwm()
                .map_err(|e| Box::new(HwError::Buzzer(e.to_string())) as BoxedError)
        }
    }
}

// Re-exports for callers (CLI/tests) to pick a backend easily.
pub use sim::{SimBuzzer, SimFan, SimProbes, SimServo};

#[cfg(feature = "hardware")]
pub use hardware::{Ads1115Probes, GpioBuzzer, PwmFan, PwmServo};
