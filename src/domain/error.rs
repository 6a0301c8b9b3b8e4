//! Domain error types.

/// Top-level error type for alphasim.
#[derive(Debug, thiserror::Error)]
pub enum AlphasimError {
    /// A non-positive close price was consumed mid-run. Fatal for the run.
    #[error("invalid price {price} at step {step}")]
    InvalidPrice { step: usize, price: f64 },

    /// A required value was missing (NaN close, absent aligned pair).
    #[error("data gap at step {step}: {what}")]
    DataGap { step: usize, what: String },

    /// Too little data to produce a result at all.
    #[error("insufficient data: have {have} rows, need at least {need}")]
    InsufficientData { have: usize, need: usize },

    /// The external policy failed or returned an action outside {0, 1, 2}.
    #[error("policy failure at step {step}: {reason}")]
    Policy { step: usize, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    /// A data source could not be read or parsed.
    #[error("data source error: {reason}")]
    Data { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&AlphasimError> for std::process::ExitCode {
    fn from(err: &AlphasimError) -> Self {
        let code: u8 = match err {
            AlphasimError::Io(_) => 1,
            AlphasimError::ConfigParse { .. }
            | AlphasimError::ConfigMissing { .. }
            | AlphasimError::ConfigInvalid { .. } => 2,
            AlphasimError::Data { .. } => 3,
            AlphasimError::InvalidPrice { .. } | AlphasimError::DataGap { .. } => 4,
            AlphasimError::InsufficientData { .. } => 5,
            AlphasimError::Policy { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
