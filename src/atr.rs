use std::{fmt::Display, num::NonZero};

use crate::{
    ConfigError, Indicator, IndicatorConfig, IndicatorConfigBuilder, InputError, Ohlcv, Price,
    bar_clock::BarClock, ohlcv::validate,
};

/// True range of a bar: `max(high − low, |high − prev_close|, |low − prev_close|)`.
///
/// Without a previous close (first bar of a series) falls back to
/// `high − low`.
///
/// ```
/// use supertrend_ta::true_range;
/// # use supertrend_ta::{Ohlcv, Price, Timestamp};
/// # struct Bar(f64, f64);
/// # impl Ohlcv for Bar {
/// #     fn open(&self) -> Price { self.0 }
/// #     fn high(&self) -> Price { self.0 }
/// #     fn low(&self) -> Price { self.1 }
/// #     fn close(&self) -> Price { self.1 }
/// #     fn open_time(&self) -> Timestamp { 0 }
/// # }
///
/// // Gap up from 100: |130 − 100| beats the bar's own range of 10
/// assert_eq!(true_range(&Bar(130.0, 120.0), Some(100.0)), 30.0);
/// assert_eq!(true_range(&Bar(130.0, 120.0), None), 10.0);
/// ```
#[inline]
#[must_use]
pub fn true_range(ohlcv: &impl Ohlcv, prev_close: Option<Price>) -> Price {
    let hl = ohlcv.high() - ohlcv.low();

    match prev_close {
        Some(prev_close) => {
            let hc = (ohlcv.high() - prev_close).abs();
            let lc = (ohlcv.low() - prev_close).abs();
            hl.max(hc).max(lc)
        }
        None => hl,
    }
}

/// Configuration for the Average True Range ([`Atr`]) indicator.
///
/// # Example
///
/// ```
/// use supertrend_ta::{AtrConfig, IndicatorConfig, IndicatorConfigBuilder};
/// use std::num::NonZero;
///
/// let config = AtrConfig::builder()
///     .length(NonZero::new(14).unwrap())
///     .build()
///     .unwrap();
///
/// assert_eq!(config.length(), 14);
/// ```
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RawAtrConfig")
)]
pub struct AtrConfig {
    length: usize,
}

impl IndicatorConfig for AtrConfig {
    type Builder = AtrConfigBuilder;

    #[inline]
    fn builder() -> Self::Builder {
        AtrConfigBuilder::new()
    }

    #[inline]
    fn length(&self) -> usize {
        self.length
    }
}

impl AtrConfig {
    /// ATR with the given smoothing length.
    #[must_use]
    pub fn new(length: NonZero<usize>) -> Self {
        Self {
            length: length.get(),
        }
    }
}

impl Display for AtrConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AtrConfig({})", self.length)
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawAtrConfig {
    length: usize,
}

#[cfg(feature = "serde")]
impl TryFrom<RawAtrConfig> for AtrConfig {
    type Error = ConfigError;

    fn try_from(raw: RawAtrConfig) -> Result<Self, Self::Error> {
        NonZero::new(raw.length)
            .map(Self::new)
            .ok_or(ConfigError::InvalidLength(raw.length))
    }
}

/// Builder for [`AtrConfig`].
///
/// Length must be set before calling
/// [`build`](IndicatorConfigBuilder::build).
pub struct AtrConfigBuilder {
    length: Option<usize>,
}

impl AtrConfigBuilder {
    fn new() -> Self {
        Self { length: None }
    }
}

impl IndicatorConfigBuilder<AtrConfig> for AtrConfigBuilder {
    #[inline]
    fn length(mut self, length: NonZero<usize>) -> Self {
        self.length.replace(length.get());
        self
    }

    #[inline]
    fn build(self) -> Result<AtrConfig, ConfigError> {
        let length = self.length.ok_or(ConfigError::MissingLength)?;

        Ok(AtrConfig { length })
    }
}

/// Average True Range (ATR) with Wilder's smoothing.
///
/// Measures volatility as an exponentially weighted mean of the
/// [`true_range`] with `α = 1 / length` and no bias adjustment:
///
/// ```text
/// ATR[0] = TR[0]
/// ATR[i] = α × TR[i] + (1 − α) × ATR[i−1]
/// ```
///
/// There is no warm-up: the first bar seeds the average with its own range,
/// so a value is available from the first accepted bar.
///
/// Supports live repainting: feeding a bar with the same `open_time`
/// recomputes from the previous bar's ATR without advancing.
#[derive(Clone, Debug)]
pub struct Atr {
    config: AtrConfig,
    clock: BarClock,
    state: AtrState,
}

impl Indicator for Atr {
    type Config = AtrConfig;
    type Output = Price;

    fn new(config: Self::Config) -> Self {
        Self {
            config,
            clock: BarClock::default(),
            state: AtrState::new(config),
        }
    }

    #[inline]
    fn config(&self) -> &Self::Config {
        &self.config
    }

    #[inline]
    fn compute(&mut self, ohlcv: &impl Ohlcv) -> Result<Price, InputError> {
        validate(ohlcv, false)?;
        let is_next_bar = self.clock.advance(ohlcv.open_time())?;

        Ok(self.state.apply(ohlcv, is_next_bar))
    }

    #[inline]
    fn value(&self) -> Option<Price> {
        self.state.current
    }

    fn reset(&mut self) {
        *self = Self::new(self.config);
    }
}

/// Wilder-smoothed true range recurrence without bar bookkeeping.
///
/// Callers validate the bar and decide whether it advances or repaints.
#[derive(Clone, Copy, Debug)]
pub(crate) struct AtrState {
    alpha: f64,
    cur_close: Option<Price>,
    prev_close: Option<Price>,
    prev_atr: Option<Price>,
    current: Option<Price>,
}

impl AtrState {
    pub(crate) fn new(config: AtrConfig) -> Self {
        Self {
            #[allow(clippy::cast_precision_loss)]
            alpha: 1.0 / config.length as f64,
            cur_close: None,
            prev_close: None,
            prev_atr: None,
            current: None,
        }
    }

    /// Advances (or repaints) with an already validated bar.
    #[inline]
    pub(crate) fn apply(&mut self, ohlcv: &impl Ohlcv, is_next_bar: bool) -> Price {
        if is_next_bar {
            self.prev_close = self.cur_close;
            self.prev_atr = self.current;
        }

        let tr = true_range(ohlcv, self.prev_close);
        let atr = match self.prev_atr {
            Some(prev) => self.alpha * tr + (1.0 - self.alpha) * prev,
            None => tr,
        };

        self.cur_close = Some(ohlcv.close());
        self.current = Some(atr);

        atr
    }
}

impl Display for Atr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ATR({})", self.config.length)
    }
}
