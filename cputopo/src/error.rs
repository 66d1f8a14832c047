//! Error taxonomy for topology resolution and load calculation.

use thiserror::Error;

/// Result type returned by drivers.
///
/// Driver failures are opaque to the engine; they are wrapped and passed
/// through to the caller of the accessor that triggered the query.
pub type DriverResult<T> = std::result::Result<T, anyhow::Error>;

/// Errors surfaced by the topology engine.
#[derive(Error, Debug)]
pub enum TopologyError {
    /// The driver reported zero logical processors.
    #[error("driver reported no logical processors")]
    Empty,

    /// A caller passed data whose shape does not match the engine.
    #[error("invalid argument: {argument}")]
    InvalidArgument { argument: String },

    /// A driver query failed.
    #[error("driver query `{operation}` failed")]
    Driver {
        operation: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl TopologyError {
    /// Create an invalid argument error.
    pub fn invalid_argument(argument: impl Into<String>) -> Self {
        TopologyError::InvalidArgument {
            argument: argument.into(),
        }
    }

    /// Wrap a driver failure with the name of the query that produced it.
    pub fn driver(operation: &'static str, source: anyhow::Error) -> Self {
        TopologyError::Driver { operation, source }
    }
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, TopologyError>;
