//! Error types for the Brunel network core

use thiserror::Error;

/// Result type for network operations
pub type Result<T> = std::result::Result<T, BrunelError>;

/// Errors that can occur while building or driving a network
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BrunelError {
    /// Neuron index or connection target outside the population
    #[error("Index {index} out of bounds for population of {len}")]
    IndexOutOfBounds {
        /// Offending index
        index: usize,
        /// Population size
        len: usize,
    },

    /// Malformed argument at an API boundary
    #[error("Invalid argument {parameter}: {value} (expected {constraint})")]
    InvalidArgument {
        /// Argument name
        parameter: String,
        /// Rejected value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// Network could not be constructed from the given configuration
    #[error("Invalid network configuration: {reason}")]
    InvalidConfiguration {
        /// Reason for invalid configuration
        reason: String,
    },
}

impl BrunelError {
    /// Create an index error
    pub fn out_of_bounds(index: usize, len: usize) -> Self {
        Self::IndexOutOfBounds { index, len }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(
        parameter: impl Into<String>,
        value: impl Into<String>,
        constraint: impl Into<String>,
    ) -> Self {
        Self::InvalidArgument {
            parameter: parameter.into(),
            value: value.into(),
            constraint: constraint.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }
}
