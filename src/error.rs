use crate::{Price, Timestamp};

use std::fmt::Display;

use thiserror::Error;

/// Bar field that failed validation.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub enum PriceField {
    Open,
    High,
    Low,
    Close,
}

impl Display for PriceField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Open => "open",
            Self::High => "high",
            Self::Low => "low",
            Self::Close => "close",
        };
        f.write_str(name)
    }
}

/// Rejected indicator configuration.
///
/// Returned by config builders and constructors. An indicator can never be
/// created from an invalid config.
#[derive(Error, PartialEq, Clone, Copy, Debug)]
pub enum ConfigError {
    /// Length must be at least one bar.
    #[error("length must be positive, got {0}")]
    InvalidLength(usize),

    /// Multiplier must be a positive, finite number.
    #[error("multiplier must be positive and finite, got {0}")]
    InvalidMultiplier(f64),

    /// Builder finished without a length.
    #[error("length is required")]
    MissingLength,
}

/// Rejected input bar.
///
/// Indicator state is left untouched when a bar is rejected, so the caller
/// may skip it and keep feeding subsequent bars.
#[derive(Error, PartialEq, Clone, Copy, Debug)]
pub enum InputError {
    /// A price is NaN or infinite.
    #[error("{field} price is not finite: {value}")]
    NonFinite { field: PriceField, value: Price },

    /// High is below low.
    #[error("high {high} is below low {low}")]
    InvertedRange { high: Price, low: Price },

    /// `open_time` moved backwards.
    #[error("open_time must be non-decreasing: last={last}, got={got}")]
    OutOfOrder { last: Timestamp, got: Timestamp },
}

/// Crate-level error for whole-series operations.
#[derive(Error, PartialEq, Clone, Copy, Debug)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),

    /// Bar at `index` (position in the input series) was rejected.
    #[error("invalid input at bar {index}: {source}")]
    InvalidInput {
        index: usize,
        #[source]
        source: InputError,
    },
}
