use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("gpio error: {0}")]
    Gpio(String),
    #[error("bus error: {0}")]
    Bus(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(feature = "hardware")]
impl From<rppal::gpio::Error> for HwError {
    fn from(e: rppal::gpio::Error) -> Self {
        match e {
            rppal::gpio::Error::Io(io) => HwError::Io(io),
            other => HwError::Gpio(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, HwError>;
