use std::fmt::{self, Debug, Display};
use std::io;

/// Provides `AirborneError` and maps to other errors to
/// convert to an `AirborneError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum AirborneError {
    /// The population cannot be placed on the grid, or the number of
    /// initially infected people is out of range.
    CapacityError(String),
    /// A parameter is outside of its valid domain.
    ConfigurationError(String),
    /// An output file cannot be written in the requested format.
    ReportError(String),
    IoError(io::Error),
    JsonError(serde_json::Error),
    CsvError(csv::Error),
}

impl AirborneError {
    pub(crate) fn capacity(message: impl Into<String>) -> Self {
        AirborneError::CapacityError(message.into())
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        AirborneError::ConfigurationError(message.into())
    }
}

impl From<io::Error> for AirborneError {
    fn from(error: io::Error) -> Self {
        AirborneError::IoError(error)
    }
}

impl From<serde_json::Error> for AirborneError {
    fn from(error: serde_json::Error) -> Self {
        AirborneError::JsonError(error)
    }
}

impl From<csv::Error> for AirborneError {
    fn from(error: csv::Error) -> Self {
        AirborneError::CsvError(error)
    }
}

impl std::error::Error for AirborneError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AirborneError::IoError(error) => Some(error),
            AirborneError::JsonError(error) => Some(error),
            AirborneError::CsvError(error) => Some(error),
            AirborneError::CapacityError(_)
            | AirborneError::ConfigurationError(_)
            | AirborneError::ReportError(_) => None,
        }
    }
}

impl Display for AirborneError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AirborneError::CapacityError(message) => write!(f, "capacity error: {message}"),
            AirborneError::ConfigurationError(message) => {
                write!(f, "configuration error: {message}")
            }
            AirborneError::ReportError(message) => write!(f, "report error: {message}"),
            AirborneError::IoError(error) => write!(f, "io error: {error}"),
            AirborneError::JsonError(error) => write!(f, "json error: {error}"),
            AirborneError::CsvError(error) => write!(f, "csv error: {error}"),
        }
    }
}
