use crate::check::ValidationError;
use std::fmt;
use std::io;

/// Everything that can go wrong while driving the server under test.
///
/// Scenarios return these; the group runner decides whether a variant
/// counts against the server (a failed test) or against the engine
/// (an errored test).
#[derive(Debug)]
#[non_exhaustive]
pub enum CheckError {
    /// The engine could not reach the server at all.
    Connect(String),
    /// A bounded wait elapsed without the expected data.
    TimedOut(String),
    /// The server's payload failed structural validation.
    Schema(ValidationError),
    /// The server's behavior contradicts the HTTP contract being tested.
    Protocol(String),
    /// A liveness probe found the server process has exited.
    SutCrashed,
    /// An I/O fault inside the engine itself.
    Io(io::Error),
}

impl CheckError {
    /// Engine-side faults become `Error` outcomes rather than `Fail`,
    /// so they never masquerade as server misbehavior.
    pub fn is_engine_side(&self) -> bool {
        matches!(
            self,
            CheckError::Connect(_) | CheckError::SutCrashed | CheckError::Io(_)
        )
    }
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CheckError::Connect(detail) => write!(f, "connection failed: {}", detail),
            CheckError::TimedOut(detail) => write!(f, "timed out waiting for {}", detail),
            CheckError::Schema(err) => write!(f, "response validation failed: {}", err),
            CheckError::Protocol(detail) => write!(f, "protocol violation: {}", detail),
            CheckError::SutCrashed => write!(f, "the server process has exited"),
            CheckError::Io(err) => write!(f, "i/o error: {}", err),
        }
    }
}

impl std::error::Error for CheckError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CheckError::Schema(err) => Some(err),
            CheckError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for CheckError {
    fn from(err: ValidationError) -> Self {
        CheckError::Schema(err)
    }
}

impl From<io::Error> for CheckError {
    fn from(err: io::Error) -> Self {
        CheckError::Io(err)
    }
}
