//! Error types.
//!
//! The library reports failures through [`EngineError`]. The binary wraps them in
//! [`AppError`], which carries the process exit code:
//!
//! - `2`: unreadable input, malformed file, bad configuration
//! - `3`: not enough usable data for a fit
//! - `4`: internal / numerical failure

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the diffusivity / DSA engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Input file schema could not be recognized.
    #[error("Unrecognized format in '{path}': {message}", path = path.display())]
    Format { path: PathBuf, message: String },

    /// Fewer usable samples or points than a regression/fit requires.
    #[error("Insufficient data for {context}: {found} usable point(s), need at least {required}")]
    InsufficientData {
        context: String,
        found: usize,
        required: usize,
    },

    /// Nonlinear refinement failed to converge.
    ///
    /// The Arrhenius fitter recovers from this locally; it only escapes when the
    /// refinement is called directly.
    #[error("Nonlinear fit did not converge after {iterations} iteration(s): {reason}")]
    Convergence { iterations: usize, reason: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error on '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EngineError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn insufficient(context: impl Into<String>, found: usize, required: usize) -> Self {
        EngineError::InsufficientData {
            context: context.into(),
            found,
            required,
        }
    }

    /// Exit code used when this error terminates the binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            EngineError::Format { .. }
            | EngineError::InvalidInput(_)
            | EngineError::Config(_)
            | EngineError::Io { .. }
            | EngineError::Csv(_)
            | EngineError::Json(_) => 2,
            EngineError::InsufficientData { .. } => 3,
            EngineError::Convergence { .. } => 4,
        }
    }
}

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

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
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
    fn engine_errors_map_to_exit_codes() {
        let format = EngineError::Format {
            path: PathBuf::from("msd_T500.dat"),
            message: "3 columns".to_string(),
        };
        assert_eq!(AppError::from(format).exit_code(), 2);

        let short = EngineError::insufficient("Arrhenius fit", 2, 3);
        let app = AppError::from(short);
        assert_eq!(app.exit_code(), 3);
        assert!(app.to_string().contains("2 usable point(s)"));
    }
}
