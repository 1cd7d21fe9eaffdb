//! Error types for registry parsing and shop generation.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or querying a seed registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The registry file could not be read.
    #[error("failed to read registry file at '{path}': {message}")]
    IoError {
        /// Path to the registry file.
        path: PathBuf,
        /// Description of the I/O error.
        message: String,
    },

    /// The registry JSON is malformed or missing required fields.
    #[error("invalid registry JSON: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
    },

    /// The registry version is not supported.
    #[error("unsupported registry version: expected {expected}, found {actual}")]
    UnsupportedVersion {
        /// Expected version number.
        expected: u32,
        /// Actual version found in the registry.
        actual: u32,
    },

    /// The registry contains no seed definitions.
    #[error("registry contains no seed definitions")]
    EmptySeeds,

    /// Two seed definitions share a name.
    #[error("seed '{name}' is defined more than once")]
    DuplicateSeed {
        /// The repeated seed name.
        name: String,
    },

    /// A seed asks for more vehicles per customer than the generator allows.
    #[error("seed '{name}' asks for {requested} vehicles per customer; the maximum is {max}")]
    TooManyVehicles {
        /// Offending seed name.
        name: String,
        /// Requested vehicles per customer.
        requested: usize,
        /// Largest accepted value.
        max: usize,
    },

    /// The requested seed name was not found in the registry.
    #[error("seed '{name}' not found in registry")]
    SeedNotFound {
        /// The seed name that was not found.
        name: String,
    },
}

/// Errors raised while generating a demo shop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// No unused value could be drawn for a field that must be unique.
    #[error("failed to draw a unique {field} after {max_attempts} attempts")]
    UniqueValueExhausted {
        /// Field that ran out of fresh values.
        field: &'static str,
        /// Number of attempts made before giving up.
        max_attempts: usize,
    },
}
