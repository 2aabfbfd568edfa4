use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum HoistError {
    #[error("I/O Error: {0}")]
    Io(#[from] Arc<std::io::Error>),

    #[error("HTTP Request Error: {0}")]
    Http(#[from] Arc<reqwest::Error>),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Storage Error: {0}")]
    StorageError(String),

    #[error("Network Error: Failed to fetch '{0}': {1}")]
    NetworkError(String, String),

    #[error("Archive Error: {0}")]
    ArchiveError(String),

    #[error("Payload Not Found: {0}")]
    PayloadNotFound(String),

    #[error("Application not found: {0}")]
    ExecutableNotFound(String),

    #[error("Validation Error: {0}")]
    ValidationError(String),

    #[error("Installation Error: {0}")]
    InstallError(String),

    #[error("Generic Error: {0}")]
    Generic(String),
}

impl HoistError {
    /// Errors that end the update step of a run but leave the launch step to
    /// the configured failure policy.
    pub fn is_update_abort(&self) -> bool {
        matches!(
            self,
            HoistError::Io(_)
                | HoistError::Http(_)
                | HoistError::StorageError(_)
                | HoistError::NetworkError(..)
                | HoistError::ArchiveError(_)
                | HoistError::PayloadNotFound(_)
                | HoistError::InstallError(_)
                | HoistError::Generic(_)
        )
    }
}

impl From<std::io::Error> for HoistError {
    fn from(err: std::io::Error) -> Self {
        HoistError::Io(Arc::new(err))
    }
}

impl From<reqwest::Error> for HoistError {
    fn from(err: reqwest::Error) -> Self {
        HoistError::Http(Arc::new(err))
    }
}

impl From<toml::de::Error> for HoistError {
    fn from(err: toml::de::Error) -> Self {
        HoistError::Config(format!("Invalid config file: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, HoistError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_step_errors_are_abort_scoped() {
        assert!(HoistError::NetworkError("u".into(), "boom".into()).is_update_abort());
        assert!(HoistError::ArchiveError("bad zip".into()).is_update_abort());
        assert!(HoistError::PayloadNotFound("none".into()).is_update_abort());
        assert!(!HoistError::ExecutableNotFound("app".into()).is_update_abort());
        assert!(!HoistError::Config("bad".into()).is_update_abort());
    }

    #[test]
    fn internal_update_failures_still_allow_a_launch() {
        assert!(HoistError::Generic("worker panicked".into()).is_update_abort());
        assert!(HoistError::InstallError("rename failed".into()).is_update_abort());
        assert!(!HoistError::ValidationError("file:// url".into()).is_update_abort());
    }

    #[test]
    fn io_errors_convert_through_arc() {
        let err: HoistError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, HoistError::Io(_)));
        assert!(err.to_string().contains("gone"));
    }
}
