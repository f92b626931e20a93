//! Error types for probeloop
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur while driving a control loop
#[derive(Debug, Error)]
pub enum ProbeloopError {
    /// Environment failed to observe or apply
    #[error("Environment error: {0}")]
    Environment(String),

    /// Policy failed to decide or adapt
    #[error("Policy error: {0}")]
    Policy(String),

    /// Probe raised instead of reporting a failure
    #[error("Probe error: {0}")]
    Probe(String),

    /// Evaluator could not compute feedback
    #[error("Evaluator error: {0}")]
    Evaluator(String),

    /// Outer-loop planner error
    #[error("Planner error: {0}")]
    Planner(String),

    /// Invalid configuration or construction
    #[error("Config error: {0}")]
    Config(String),

    /// Invalid state transition or operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for probeloop operations
pub type Result<T> = std::result::Result<T, ProbeloopError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_error() {
        let err = ProbeloopError::Environment("corpus offline".to_string());
        assert_eq!(err.to_string(), "Environment error: corpus offline");
    }

    #[test]
    fn test_policy_error() {
        let err = ProbeloopError::Policy("no candidate terms".to_string());
        assert_eq!(err.to_string(), "Policy error: no candidate terms");
    }

    #[test]
    fn test_planner_error() {
        let err = ProbeloopError::Planner("judge unavailable".to_string());
        assert_eq!(err.to_string(), "Planner error: judge unavailable");
    }

    #[test]
    fn test_config_error() {
        let err = ProbeloopError::Config("at least one probe is required".to_string());
        assert_eq!(err.to_string(), "Config error: at least one probe is required");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ProbeloopError = io_err.into();
        assert!(matches!(err, ProbeloopError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: ProbeloopError = json_err.into();
        assert!(matches!(err, ProbeloopError::Json(_)));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_err = serde_yaml::from_str::<Vec<u32>>("{not: [a list").unwrap_err();
        let err: ProbeloopError = yaml_err.into();
        assert!(matches!(err, ProbeloopError::Yaml(_)));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        fn returns_err() -> Result<i32> {
            Err(ProbeloopError::InvalidState("test".to_string()))
        }

        assert!(returns_ok().is_ok());
        assert!(returns_err().is_err());
    }
}
