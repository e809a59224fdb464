use thiserror::Error;

/// Errors surfaced by the public API of the core.
///
/// Infeasibility discovered while generating or updating a single candidate
/// insertion is not an error: the generator simply drops the candidate. These
/// variants are reserved for problems that a caller needs to react to.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("predefined parameter string must contain exactly four characters, got {0}")]
    PredefinedStringLength(usize),

    #[error("predefined branching scheme parameter 1st character {0:?} is invalid (expected '3' or '2')")]
    InvalidCutType1(char),

    #[error("predefined branching scheme parameter 2nd character {0:?} is invalid (expected one of 'R', 'N', 'E', 'H')")]
    InvalidCutType2(char),

    #[error("predefined branching scheme parameter 3rd character {0:?} is invalid (expected one of 'V', 'H', 'A')")]
    InvalidFirstStageOrientation(char),

    #[error("predefined branching scheme parameter 4th character {0:?} is invalid (expected 'R' or 'O')")]
    InvalidRotationFlag(char),

    #[error("objective {0:?} is not implemented by the rectangle guillotine branching scheme")]
    UnsupportedObjective(crate::instance::Objective),

    #[error("solution invariant violated: {0}")]
    InvariantViolation(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
