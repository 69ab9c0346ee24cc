use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolyfillErrorKind {
    UnknownEnvironmentShape,
    OracleFailure,
    RegistryInvalid,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolyfillError {
    pub kind: PolyfillErrorKind,
    pub message: String,
}

impl PolyfillError {
    pub fn new(kind: PolyfillErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for PolyfillError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for PolyfillError {}

pub fn unknown_environment_shape(message: impl Into<String>) -> PolyfillError {
    PolyfillError::new(PolyfillErrorKind::UnknownEnvironmentShape, message)
}

pub fn oracle_failure(message: impl Into<String>) -> PolyfillError {
    PolyfillError::new(PolyfillErrorKind::OracleFailure, message)
}

pub fn registry_invalid(message: impl Into<String>) -> PolyfillError {
    PolyfillError::new(PolyfillErrorKind::RegistryInvalid, message)
}

pub fn internal_error(message: impl Into<String>) -> PolyfillError {
    PolyfillError::new(PolyfillErrorKind::Internal, message)
}
