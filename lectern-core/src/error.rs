#[derive(Debug, thiserror::Error)]
pub enum LecternError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Draft error: {0}")]
    Draft(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Stage error: {0}")]
    Stage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LecternError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LecternError::Stage("auditor returned no report".to_string());
        assert_eq!(err.to_string(), "Stage error: auditor returned no report");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: LecternError = io_err.into();
        assert!(matches!(err, LecternError::Io(_)));
    }

    #[test]
    fn test_error_from_serde() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: LecternError = serde_err.into();
        assert!(matches!(err, LecternError::Serde(_)));
    }

    #[test]
    fn test_result_type() {
        let ok_result: Result<i32> = Ok(42);
        assert_eq!(ok_result.unwrap(), 42);

        let err_result: Result<i32> = Err(LecternError::Config("invalid".to_string()));
        assert!(err_result.is_err());
    }
}
