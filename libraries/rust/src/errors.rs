use reqwest::Error as ReqwestError;
use serde_json::Error as SerdeError;
use std::io::Error as IOError;
use thiserror::Error as ThisError;
use url::ParseError;

#[derive(ThisError, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    HTTPError(#[from] ReqwestError),
    #[error("JSON error: {0}")]
    SerdeError(#[from] SerdeError),
    #[error("URL error: {0}")]
    URLError(#[from] ParseError),
    #[error("IO error: {0}")]
    IOError(#[from] IOError),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Other error: {0}")]
    OtherError(String),
}

impl Error {
    /// Whether the failure belongs to a single upstream batch. Anything else
    /// would fail every batch the same way and aborts the whole request.
    pub fn is_batch_scoped(&self) -> bool {
        matches!(
            self,
            Error::HTTPError(_) | Error::SerdeError(_) | Error::IOError(_) | Error::OtherError(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_batch_scoped() {
        let serde_error = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();

        assert!(Error::SerdeError(serde_error).is_batch_scoped());
        assert!(Error::OtherError("timeout".to_string()).is_batch_scoped());
        assert!(!Error::URLError(ParseError::RelativeUrlWithoutBase).is_batch_scoped());
        assert!(!Error::ConfigurationError("FMP_API_KEY".to_string()).is_batch_scoped());
    }
}
