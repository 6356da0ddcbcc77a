use thiserror::Error;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, DomainError>;

/// Validation failures raised by the scaling engine and the study calculators
///
/// All variants are local input errors. None of them are transient, so retrying
/// with the same inputs always fails the same way.
#[derive(Error, Debug)]
pub enum DomainError {
    // ─────────────────────────────────────────────────────────────────────────
    // Scaling Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// A source or target body weight was zero, negative or not finite
    #[error("Invalid {role} weight: {value} kg (must be > 0)")]
    InvalidWeight { role: &'static str, value: f64 },

    /// Species key not present in the species table
    #[error("Unknown species '{0}'")]
    UnknownSpecies(String),

    /// A physiological constant required by the scaling method is not positive
    #[error("Invalid physiological parameter '{field}' for {species}: {value} (must be > 0)")]
    InvalidPhysiologicalParameter {
        species: String,
        field: &'static str,
        value: f64,
    },

    /// Scaling method name could not be resolved
    #[error("Unsupported scaling method '{0}'")]
    InvalidMethod(String),

    /// Base dose was zero, negative or not finite
    #[error("Invalid base dose: {0} mg (must be > 0)")]
    InvalidDose(f64),

    // ─────────────────────────────────────────────────────────────────────────
    // Input Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// A numeric input is outside its admissible range
    #[error("Invalid input '{param}': {reason}")]
    InvalidInput { param: &'static str, reason: String },

    /// Dilution factor outside the configured `[1, max]` bound
    #[error("Invalid dilution factor {factor} (must be within [1, {max}])")]
    InvalidDilutionFactor { factor: f64, max: f64 },

    // ─────────────────────────────────────────────────────────────────────────
    // Study Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Arm name already used within the study
    #[error("Duplicate arm name '{0}'")]
    DuplicateArm(String),

    /// Arm name not found within the study
    #[error("Unknown arm '{0}'")]
    UnknownArm(String),

    // ─────────────────────────────────────────────────────────────────────────
    // Serialization Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Failed to parse a species table
    #[error("Failed to parse species table: {0}")]
    SpeciesTable(#[from] serde_json::Error),

    /// Failed to write CSV output
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
}

impl DomainError {
    pub(crate) fn invalid_input(param: &'static str, reason: impl Into<String>) -> Self {
        DomainError::InvalidInput {
            param,
            reason: reason.into(),
        }
    }
}

/// Reject NaN and infinities before any arithmetic touches them
pub(crate) fn ensure_finite(param: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DomainError::invalid_input(
            param,
            format!("{value} is not a finite number"),
        ))
    }
}
