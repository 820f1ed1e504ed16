//! Error types for the tracking engine.
//!
//! Configuration problems surface at engine construction; malformed
//! onset input surfaces when a playback is built. Numerical trouble
//! during tracking (degenerate projections, underdetermined
//! regressions, non-finite scores) is recovered locally and never
//! reaches this type.

use thiserror::Error;

/// Result type alias for tactus operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the tracking engine.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid configuration for {field}: {message}")]
    Config { field: &'static str, message: String },

    #[error("onset times must be non-decreasing (onset {index} decreases)")]
    UnorderedOnsets { index: usize },

    #[error("onset {index} is not a finite number")]
    NonFiniteOnset { index: usize },

    #[error("confidence evaluated over an empty reference window")]
    EmptyReference,

    #[error("tracker dump parse error at line {line}: {message}")]
    DumpParse { line: usize, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable error code, grouped by category.
    ///
    /// - 10-19: configuration
    /// - 20-29: input
    /// - 30-39: evaluation
    /// - 40-49: persistence
    /// - 60-69: I/O
    pub fn code(&self) -> u32 {
        match self {
            Error::Config { .. } => 10,
            Error::UnorderedOnsets { .. } => 20,
            Error::NonFiniteOnset { .. } => 21,
            Error::EmptyReference => 30,
            Error::DumpParse { .. } => 40,
            Error::Io(_) => 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_grouped() {
        let config = Error::Config {
            field: "min_delta",
            message: "must be positive".into(),
        };
        assert_eq!(config.code(), 10);
        assert_eq!(Error::UnorderedOnsets { index: 3 }.code(), 20);
        assert_eq!(Error::EmptyReference.code(), 30);
    }

    #[test]
    fn display_carries_context() {
        let err = Error::DumpParse {
            line: 7,
            message: "expected `ht conf`".into(),
        };
        assert!(err.to_string().contains("line 7"));
    }
}
