//! Error types for the strict token parsers.
//!
//! The public decoders never surface these: a rejected token means "no
//! constraint" and is dropped. They exist so the strict parsers can be used
//! and tested on their own.

use thiserror::Error;

/// Result type for strict topology parsing.
pub type TopologyResult<T> = Result<T, TopologyError>;

/// Errors produced while parsing card, tile and quantity tokens.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TopologyError {
    /// The token does not match `card<digits>_gt<digits>`.
    #[error("invalid card/tile token: '{0}'")]
    InvalidCardTile(String),

    /// A card index could not be parsed.
    #[error("invalid card index: '{0}'")]
    InvalidCardIndex(String),

    /// A tile index could not be parsed.
    #[error("invalid tile index: '{0}'")]
    InvalidTileIndex(String),

    /// An annotation clause does not have the `card<N>:<tiles>` shape.
    #[error("malformed annotation clause: '{0}'")]
    MalformedClause(String),

    /// The quantity string is not a valid Kubernetes quantity.
    #[error("invalid quantity '{value}': {reason}")]
    InvalidQuantity { value: String, reason: String },

    /// The quantity is valid but has no exact `i64` representation.
    #[error("quantity '{0}' is not representable as an integer")]
    NonIntegralQuantity(String),
}

impl TopologyError {
    /// Returns true if the error came from quantity parsing.
    pub fn is_quantity_error(&self) -> bool {
        matches!(
            self,
            TopologyError::InvalidQuantity { .. } | TopologyError::NonIntegralQuantity(_)
        )
    }
}
