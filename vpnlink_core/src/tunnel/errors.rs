use std::fmt::{self, Display};

/// A central error enum for tunnel-engine errors.
#[derive(Debug)]
pub enum TunnelError {
    IoError(std::io::Error),
    Refused(String),
    Other(String),
}

/// Convert from std::io::Error.
impl From<std::io::Error> for TunnelError {
    fn from(err: std::io::Error) -> TunnelError {
        TunnelError::IoError(err)
    }
}

impl Display for TunnelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TunnelError::IoError(e) => write!(f, "IO error: {}", e),
            TunnelError::Refused(msg) => write!(f, "Tunnel refused: {}", msg),
            TunnelError::Other(msg) => write!(f, "Other error: {}", msg),
        }
    }
}

impl std::error::Error for TunnelError {}
