use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("uart error: {0}")]
    Uart(String),
    #[error("command source timeout")]
    Timeout,
    #[error("actuator fault: {0}")]
    Actuator(String),
}

pub type Result<T> = std::result::Result<T, HwError>;
