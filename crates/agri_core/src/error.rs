//! Error types for the farm simulation.
//!
//! Every core operation is request/response: a failed request returns one of
//! these variants and leaves the simulation untouched.

use thiserror::Error;

use crate::math::Money;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all farm simulation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// The player cannot pay for the request.
    #[error("Insufficient funds: need {required}, have {available}")]
    InsufficientFunds {
        /// Amount the request costs.
        required: Money,
        /// Cash on hand.
        available: Money,
    },

    /// The player tried to sell more units than they hold.
    #[error("Insufficient holdings of {instrument}: requested {requested}, held {held}")]
    InsufficientHoldings {
        /// Instrument identifier.
        instrument: String,
        /// Quantity requested.
        requested: u32,
        /// Quantity held.
        held: u32,
    },

    /// Target tile already holds an asset.
    #[error("Tile ({x}, {z}) is already occupied")]
    TileOccupied {
        /// Tile column.
        x: u32,
        /// Tile row.
        z: u32,
    },

    /// Target tile holds nothing to act upon.
    #[error("Tile ({x}, {z}) is empty")]
    TileEmpty {
        /// Tile column.
        x: u32,
        /// Tile row.
        z: u32,
    },

    /// Coordinates fall outside the grid.
    #[error("Tile ({x}, {z}) is outside the {size}x{size} grid")]
    OutOfBounds {
        /// Tile column.
        x: u32,
        /// Tile row.
        z: u32,
        /// Current grid size.
        size: u32,
    },

    /// Instrument identifier not present in the market.
    #[error("Unknown instrument: {0}")]
    UnknownInstrument(String),

    /// Asset identifier not present in the economy catalog (or not buildable).
    #[error("Unknown asset: {0}")]
    UnknownAsset(String),

    /// Livestock placement without the structures it needs.
    #[error("{asset} requires missing structures: {missing:?}")]
    MissingPrerequisite {
        /// Asset being placed.
        asset: String,
        /// Structure identifiers not present on the grid.
        missing: Vec<String>,
    },

    /// Structure has no renovation path (or is already renovated).
    #[error("No upgrade path for {0}")]
    NoUpgradePath(String),

    /// Trade quantities must be positive.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(u32),

    /// One-time insurance already covers the farm.
    #[error("Farm already holds permanent insurance")]
    AlreadyInsured,

    /// No decision is waiting on the player.
    #[error("No pending decision to resolve")]
    NoPendingDecision,

    /// Integrity reached zero; the game must be reinitialized.
    #[error("Game over: integrity exhausted")]
    GameOver,

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path (or embedded name) of the file that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Invalid simulation state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),
}

impl GameError {
    /// Shorthand for an [`GameError::InsufficientFunds`] error.
    #[must_use]
    pub const fn insufficient_funds(required: Money, available: Money) -> Self {
        Self::InsufficientFunds {
            required,
            available,
        }
    }
}
