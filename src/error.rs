use std::{error, fmt};

/// Errors raised synchronously to the caller
///
/// Asynchronous load failures never surface here. They are recorded in the
/// pagination state and reported instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A string that is not a non-negative decimal integer was used as an index
    InvalidSequenceIndex(String),
    /// A client was built before a required collaborator was injected
    MissingCollaborator(&'static str),
    /// A configuration value is out of range
    InvalidConfig(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidSequenceIndex(raw) => write!(f, "invalid sequence index: {raw:?}"),
            Error::MissingCollaborator(name) => write!(f, "missing collaborator: {name}"),
            Error::InvalidConfig(reason) => write!(f, "invalid config: {reason}"),
        }
    }
}

impl error::Error for Error {}
