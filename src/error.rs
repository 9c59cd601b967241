use thiserror::Error;

/// Errors raised by the normalization, regression and scan pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VtnError {
    /// A component lacks a reaction order, is classified twice, or the
    /// configuration is otherwise unusable.
    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    /// An experiment table lacks a column the derivation needs.
    #[error("Experiment '{experiment}' has no column '{column}'")]
    MissingColumn { experiment: String, column: String },

    /// The pooled dataset cannot support a linear fit.
    #[error("Regression error: {reason}")]
    Regression { reason: String },

    /// Malformed input data (tables, CSV rows, config files).
    #[error("Input error: {reason}")]
    Input { reason: String },

    #[error("I/O error on '{path}': {reason}")]
    Io { path: String, reason: String },
}

impl VtnError {
    pub fn configuration(reason: impl Into<String>) -> Self {
        VtnError::Configuration {
            reason: reason.into(),
        }
    }

    pub fn missing_column(experiment: impl Into<String>, column: impl Into<String>) -> Self {
        VtnError::MissingColumn {
            experiment: experiment.into(),
            column: column.into(),
        }
    }

    pub fn regression(reason: impl Into<String>) -> Self {
        VtnError::Regression {
            reason: reason.into(),
        }
    }

    pub fn input(reason: impl Into<String>) -> Self {
        VtnError::Input {
            reason: reason.into(),
        }
    }

    pub fn io(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        VtnError::Io {
            path: path.display().to_string(),
            reason: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, VtnError>;

/// Error surfaced by the `vtn` binary: a message plus the process exit code.
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<VtnError> for AppError {
    fn from(err: VtnError) -> Self {
        let exit_code = match &err {
            VtnError::Configuration { .. } | VtnError::Input { .. } | VtnError::Io { .. } => 2,
            VtnError::MissingColumn { .. } => 3,
            VtnError::Regression { .. } => 4,
        };
        AppError::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_kind() {
        let cfg: AppError = VtnError::configuration("no order for 'A'").into();
        let missing: AppError = VtnError::missing_column("e1", "cat").into();
        let reg: AppError = VtnError::regression("singular").into();
        assert_eq!(cfg.exit_code(), 2);
        assert_eq!(missing.exit_code(), 3);
        assert_eq!(reg.exit_code(), 4);
        assert_eq!(missing.to_string(), "Experiment 'e1' has no column 'cat'");
    }
}
