use crate::{ConfigError, InputError, Ohlcv};

use std::{
    fmt::{Debug, Display},
    hash::Hash,
    num::NonZero,
};

/// Configuration for a technical [`Indicator`].
///
/// Every indicator has a corresponding config type that holds its parameters.
/// Configs are value types: cheap to copy, compare, and hash. A config that
/// exists has already been validated.
pub trait IndicatorConfig: Sized + Copy + PartialEq + Eq + Hash + Display + Debug {
    /// Builder type for constructing this config.
    type Builder: IndicatorConfigBuilder<Self>;

    /// Returns a new builder with default values.
    fn builder() -> Self::Builder;

    /// Smoothing length (number of bars).
    fn length(&self) -> usize;
}

/// Builder for an [`IndicatorConfig`].
pub trait IndicatorConfigBuilder<Config>
where
    Config: IndicatorConfig,
{
    /// Sets the indicator length.
    #[must_use]
    fn length(self, length: NonZero<usize>) -> Self;

    /// Builds the config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingLength`] when no length was set, or the
    /// indicator-specific error for any other invalid parameter.
    fn build(self) -> Result<Config, ConfigError>;
}

/// A streaming technical indicator.
///
/// Indicators maintain internal state and update incrementally on each call to
/// [`compute`](Indicator::compute), in O(1) time and memory per bar.
///
/// # Example
///
/// ```
/// use supertrend_ta::{Atr, AtrConfig, Indicator};
/// use std::num::NonZero;
/// # use supertrend_ta::{Ohlcv, Price, Timestamp};
/// #
/// # struct Bar(f64, f64, f64, u64);
/// # impl Ohlcv for Bar {
/// #     fn open(&self) -> Price { self.2 }
/// #     fn high(&self) -> Price { self.0 }
/// #     fn low(&self) -> Price { self.1 }
/// #     fn close(&self) -> Price { self.2 }
/// #     fn open_time(&self) -> Timestamp { self.3 }
/// # }
///
/// let mut atr = Atr::new(AtrConfig::new(NonZero::new(2).unwrap()));
///
/// // First bar: ATR is the bar's own range
/// assert_eq!(atr.compute(&Bar(12.0, 8.0, 10.0, 1)), Ok(4.0));
/// // α = 1/2: 0.5 × 6 + 0.5 × 4 = 5
/// assert_eq!(atr.compute(&Bar(14.0, 8.0, 13.0, 2)), Ok(5.0));
/// ```
pub trait Indicator: Sized + Clone + Display + Debug {
    /// Configuration type for this indicator.
    type Config: IndicatorConfig;

    /// Computed output type. `f64` for simple indicators,
    /// a struct for composite ones (e.g. Supertrend).
    type Output: Copy + Send + Sync + Display + Debug;

    /// Creates a new indicator from the given config.
    fn new(config: Self::Config) -> Self;

    /// The config this indicator was created with.
    fn config(&self) -> &Self::Config;

    /// Feeds a bar and returns the updated indicator value.
    ///
    /// # Errors
    ///
    /// Returns an [`InputError`] if the bar holds a non-finite price, has
    /// `high < low`, or its `open_time` precedes the previous bar's. The
    /// indicator state is unchanged in that case.
    fn compute(&mut self, kline: &impl Ohlcv) -> Result<Self::Output, InputError>;

    /// Returns the last computed indicator value without advancing state,
    /// or `None` if no bar has been accepted yet.
    ///
    /// A cached field read, O(1).
    fn value(&self) -> Option<Self::Output>;

    /// Drops all accumulated state, as if freshly created from the same
    /// config. Use it to start a new, unrelated series.
    fn reset(&mut self);
}
