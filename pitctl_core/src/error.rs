use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum CoreError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid state: {0}")]
    State(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing probe ADC")]
    MissingAdc,
    #[error("missing fan PWM output")]
    MissingFan,
    #[error("missing damper servo output")]
    MissingDamper,
    #[error("missing buzzer output")]
    MissingBuzzer,
    #[error("missing session store")]
    MissingStore,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
