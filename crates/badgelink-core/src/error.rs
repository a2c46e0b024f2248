use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Capability errors
    #[error("Serial capability missing: {0}")]
    CapabilityMissing(String),

    // Connection errors
    #[error("Reader connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Reader stream read failed: {0}")]
    ReadFailed(String),

    // Validation errors
    #[error("Invalid identifier format: {0}")]
    InvalidUidFormat(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_missing_display() {
        let error = Error::CapabilityMissing("host has no serial support".to_string());
        assert_eq!(
            error.to_string(),
            "Serial capability missing: host has no serial support"
        );
    }

    #[test]
    fn test_invalid_status_transition_display() {
        let error = Error::InvalidStatusTransition {
            from: "Offline".to_string(),
            to: "Scanning".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid status transition from Offline to Scanning"
        );
    }

    #[test]
    fn test_error_display_and_debug() {
        let errors = vec![
            Error::ConnectionFailed("no matching device".to_string()),
            Error::ReadFailed("device unplugged".to_string()),
            Error::InvalidUidFormat("expected 8-16 hex chars".to_string()),
        ];

        for error in errors {
            let _ = format!("{}", error);
            let _ = format!("{:?}", error);
        }
    }
}
