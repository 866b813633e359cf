use thiserror::Error;

/// Typed hardware-layer errors surfaced through the port boundaries.
#[derive(Debug, Error)]
pub enum HwError {
    #[error("ADC channel {0} out of range")]
    BadChannel(u8),
    #[error("ADC conversion failed: {0}")]
    AdcRead(String),
    #[error("PWM write failed: {0}")]
    Pwm(String),
    #[error("servo write failed: {0}")]
    Servo(String),
    #[error("buzzer write failed: {0}")]
    Buzzer(String),
    #[error("session storage i/o: {0}")]
    Storage(#[from] std::io::Error),
}
