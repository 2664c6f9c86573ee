use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScaleError {
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("modulus mismatch")]
    ModulusMismatch,

    #[error("moduli {a} and {b} are not coprime")]
    NotCoprime { a: u64, b: u64 },

    #[error("coefficient count must be a power of 2, got {0}")]
    InvalidRingDegree(usize),

    #[error("precondition violated: {0}")]
    PrecondViolation(String),
}

pub type Result<T> = std::result::Result<T, ScaleError>;
