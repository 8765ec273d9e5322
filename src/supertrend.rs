use std::{
    fmt::Display,
    hash::{Hash, Hasher},
    num::NonZero,
};

use tracing::{debug, trace};

use crate::{
    AtrConfig, ConfigError, Error, Indicator, IndicatorConfig, IndicatorConfigBuilder, InputError,
    Ohlcv, Price, PriceSource, atr::AtrState, bar_clock::BarClock, ohlcv::validate,
};

/// ATR multiplier setting the distance of the Supertrend bands from the
/// source price.
///
/// Wraps a positive, finite `f64`. Defaults to `3.0`.
///
/// Implements `Eq` and `Hash` via bit-level comparison, which is safe because
/// NaN is rejected at construction.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "f64", into = "f64")
)]
pub struct Multiplier(f64);

impl Multiplier {
    /// Creates a new band multiplier.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidMultiplier`] if `value` is zero,
    /// negative, NaN or infinite.
    pub fn new(value: f64) -> Result<Self, ConfigError> {
        if value.is_finite() && value > 0.0 {
            Ok(Self(value))
        } else {
            Err(ConfigError::InvalidMultiplier(value))
        }
    }

    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for Multiplier {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for Multiplier {}

impl Hash for Multiplier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl Default for Multiplier {
    fn default() -> Self {
        Self(3.0)
    }
}

impl TryFrom<f64> for Multiplier {
    type Error = ConfigError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Multiplier> for f64 {
    fn from(multiplier: Multiplier) -> Self {
        multiplier.0
    }
}

/// Trend direction reported by [`Supertrend`].
#[derive(PartialEq, Eq, Hash, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// Uptrend: the trend line follows the lower band.
    #[default]
    Long,
    /// Downtrend: the trend line follows the upper band.
    Short,
}

impl Direction {
    /// `1` for [`Long`](Direction::Long), `-1` for [`Short`](Direction::Short).
    #[inline]
    #[must_use]
    pub fn sign(self) -> i8 {
        match self {
            Self::Long => 1,
            Self::Short => -1,
        }
    }

    /// The other direction, i.e. what a reversal flips to.
    #[inline]
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Long => Self::Short,
            Self::Short => Self::Long,
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// How the final bands carry over from one bar to the next.
///
/// Both variants flip direction the same way: `Long` when the close breaks
/// above the previous final upper band, `Short` when it breaks below the
/// previous final lower band, otherwise the direction carries over. They
/// differ in how the bands themselves are held, which changes the output
/// around reversals.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BandRatchet {
    /// Each band only tightens, independent of direction, and is released
    /// once the previous close crosses it:
    ///
    /// ```text
    /// lower = basic_lower  if basic_lower > prev_lower or prev_close < prev_lower
    ///         prev_lower   otherwise
    /// upper = basic_upper  if basic_upper < prev_upper or prev_close > prev_upper
    ///         prev_upper   otherwise
    /// ```
    #[default]
    Standard,
    /// Bands are the basic bands, except when the direction carries over
    /// without a breakout: then the active band may not loosen
    /// (`Long`: `lower = max(basic_lower, prev_lower)`,
    /// `Short`: `upper = min(basic_upper, prev_upper)`).
    InTrend,
}

impl Display for BandRatchet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Final bands and direction of one bar.
#[derive(Clone, Copy, Debug)]
struct BarState {
    upper: Price,
    lower: Price,
    close: Price,
    direction: Direction,
}

impl BandRatchet {
    #[inline]
    fn next(self, prev: &BarState, upper: Price, lower: Price, close: Price) -> BarState {
        let breakout = if close > prev.upper {
            Some(Direction::Long)
        } else if close < prev.lower {
            Some(Direction::Short)
        } else {
            None
        };
        let direction = breakout.unwrap_or(prev.direction);

        let (upper, lower) = match self {
            Self::Standard => {
                let upper = if upper < prev.upper || prev.close > prev.upper {
                    upper
                } else {
                    prev.upper
                };
                let lower = if lower > prev.lower || prev.close < prev.lower {
                    lower
                } else {
                    prev.lower
                };
                (upper, lower)
            }
            Self::InTrend => match (breakout, direction) {
                (None, Direction::Long) => (upper, lower.max(prev.lower)),
                (None, Direction::Short) => (upper.min(prev.upper), lower),
                (Some(_), _) => (upper, lower),
            },
        };

        BarState {
            upper,
            lower,
            close,
            direction,
        }
    }
}

/// Configuration for the [`Supertrend`] indicator.
///
/// # Example
///
/// ```
/// use supertrend_ta::{BandRatchet, Direction, Multiplier, SupertrendConfig};
/// use supertrend_ta::{IndicatorConfig, IndicatorConfigBuilder};
/// use std::num::NonZero;
///
/// let config = SupertrendConfig::builder()
///     .length(NonZero::new(10).unwrap())
///     .multiplier(Multiplier::new(3.0).unwrap())
///     .initial_direction(Direction::Long)
///     .ratchet(BandRatchet::Standard)
///     .build()
///     .unwrap();
///
/// assert_eq!(config, SupertrendConfig::new(10, 3.0).unwrap());
/// assert!(SupertrendConfig::new(0, 3.0).is_err());
/// assert!(SupertrendConfig::new(10, -1.0).is_err());
/// ```
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RawSupertrendConfig")
)]
pub struct SupertrendConfig {
    length: NonZero<usize>,
    multiplier: Multiplier,
    source: PriceSource,
    initial_direction: Direction,
    ratchet: BandRatchet,
}

impl IndicatorConfig for SupertrendConfig {
    type Builder = SupertrendConfigBuilder;

    #[inline]
    fn builder() -> Self::Builder {
        SupertrendConfigBuilder::new()
    }

    #[inline]
    fn length(&self) -> usize {
        self.length.get()
    }
}

const DEFAULT_LENGTH: NonZero<usize> = NonZero::new(10).unwrap();

impl SupertrendConfig {
    /// Supertrend with the given ATR length and multiplier, HL2 source,
    /// starting `Long`, [`BandRatchet::Standard`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidLength`] for a zero length and
    /// [`ConfigError::InvalidMultiplier`] for a multiplier that is not
    /// positive and finite.
    pub fn new(length: usize, multiplier: f64) -> Result<Self, ConfigError> {
        let length = NonZero::new(length).ok_or(ConfigError::InvalidLength(length))?;

        Self::builder()
            .length(length)
            .multiplier(Multiplier::new(multiplier)?)
            .build()
    }

    #[inline]
    #[must_use]
    pub fn multiplier(&self) -> Multiplier {
        self.multiplier
    }

    /// Price the bands are centred on.
    #[inline]
    #[must_use]
    pub fn source(&self) -> PriceSource {
        self.source
    }

    /// Direction assigned to the first bar of a series.
    #[inline]
    #[must_use]
    pub fn initial_direction(&self) -> Direction {
        self.initial_direction
    }

    #[inline]
    #[must_use]
    pub fn ratchet(&self) -> BandRatchet {
        self.ratchet
    }
}

/// Supertrend(10, 3) on HL2.
impl Default for SupertrendConfig {
    fn default() -> Self {
        Self {
            length: DEFAULT_LENGTH,
            multiplier: Multiplier::default(),
            source: PriceSource::default(),
            initial_direction: Direction::default(),
            ratchet: BandRatchet::default(),
        }
    }
}

impl Display for SupertrendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SupertrendConfig({}, {}, {})",
            self.length,
            self.multiplier.value(),
            self.source
        )
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawSupertrendConfig {
    length: usize,
    #[serde(default)]
    multiplier: Multiplier,
    #[serde(default)]
    source: PriceSource,
    #[serde(default)]
    initial_direction: Direction,
    #[serde(default)]
    ratchet: BandRatchet,
}

#[cfg(feature = "serde")]
impl TryFrom<RawSupertrendConfig> for SupertrendConfig {
    type Error = ConfigError;

    fn try_from(raw: RawSupertrendConfig) -> Result<Self, Self::Error> {
        let length = NonZero::new(raw.length).ok_or(ConfigError::InvalidLength(raw.length))?;

        Self::builder()
            .length(length)
            .multiplier(raw.multiplier)
            .source(raw.source)
            .initial_direction(raw.initial_direction)
            .ratchet(raw.ratchet)
            .build()
    }
}

/// Builder for [`SupertrendConfig`].
///
/// Defaults: multiplier = `3.0`, source = [`PriceSource::HL2`],
/// initial direction = [`Direction::Long`],
/// ratchet = [`BandRatchet::Standard`].
/// Length must be set before calling
/// [`build`](IndicatorConfigBuilder::build).
pub struct SupertrendConfigBuilder {
    length: Option<NonZero<usize>>,
    multiplier: Multiplier,
    source: PriceSource,
    initial_direction: Direction,
    ratchet: BandRatchet,
}

impl SupertrendConfigBuilder {
    fn new() -> Self {
        Self {
            length: None,
            multiplier: Multiplier::default(),
            source: PriceSource::default(),
            initial_direction: Direction::default(),
            ratchet: BandRatchet::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn multiplier(mut self, multiplier: Multiplier) -> Self {
        self.multiplier = multiplier;
        self
    }

    #[inline]
    #[must_use]
    pub fn source(mut self, source: PriceSource) -> Self {
        self.source = source;
        self
    }

    #[inline]
    #[must_use]
    pub fn initial_direction(mut self, direction: Direction) -> Self {
        self.initial_direction = direction;
        self
    }

    #[inline]
    #[must_use]
    pub fn ratchet(mut self, ratchet: BandRatchet) -> Self {
        self.ratchet = ratchet;
        self
    }
}

impl IndicatorConfigBuilder<SupertrendConfig> for SupertrendConfigBuilder {
    #[inline]
    fn length(mut self, length: NonZero<usize>) -> Self {
        self.length.replace(length);
        self
    }

    #[inline]
    fn build(self) -> Result<SupertrendConfig, ConfigError> {
        Ok(SupertrendConfig {
            length: self.length.ok_or(ConfigError::MissingLength)?,
            multiplier: self.multiplier,
            source: self.source,
            initial_direction: self.initial_direction,
            ratchet: self.ratchet,
        })
    }
}

/// Supertrend output for one bar.
///
/// The trend line is the lower band in a `Long` trend and the upper band in a
/// `Short` trend. Exactly one of [`long`](Self::long) and
/// [`short`](Self::short) is present.
///
/// With the `serde` feature it serializes every accessor, so `trend_line`,
/// `long` and `short` (`null` on the inactive side) travel with the bands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupertrendValue {
    upper: Price,
    lower: Price,
    atr: Price,
    direction: Direction,
    reversal: bool,
}

impl SupertrendValue {
    /// Active band: lower when `Long`, upper when `Short`.
    #[inline]
    #[must_use]
    pub fn trend_line(&self) -> Price {
        match self.direction {
            Direction::Long => self.lower,
            Direction::Short => self.upper,
        }
    }

    #[inline]
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Trend line while `Long`, otherwise `None`.
    #[inline]
    #[must_use]
    pub fn long(&self) -> Option<Price> {
        (self.direction == Direction::Long).then_some(self.lower)
    }

    /// Trend line while `Short`, otherwise `None`.
    #[inline]
    #[must_use]
    pub fn short(&self) -> Option<Price> {
        (self.direction == Direction::Short).then_some(self.upper)
    }

    /// Final upper band.
    #[inline]
    #[must_use]
    pub fn upper(&self) -> Price {
        self.upper
    }

    /// Final lower band.
    #[inline]
    #[must_use]
    pub fn lower(&self) -> Price {
        self.lower
    }

    /// Average true range the basic bands were built from.
    #[inline]
    #[must_use]
    pub fn atr(&self) -> Price {
        self.atr
    }

    /// `true` when the direction differs from the previous bar's.
    ///
    /// Always `false` on the first bar of a series.
    #[inline]
    #[must_use]
    pub fn is_reversal(&self) -> bool {
        self.reversal
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for SupertrendValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut record = serializer.serialize_struct("SupertrendValue", 8)?;
        record.serialize_field("trend_line", &self.trend_line())?;
        record.serialize_field("direction", &self.direction)?;
        record.serialize_field("long", &self.long())?;
        record.serialize_field("short", &self.short())?;
        record.serialize_field("upper", &self.upper)?;
        record.serialize_field("lower", &self.lower)?;
        record.serialize_field("atr", &self.atr)?;
        record.serialize_field("reversal", &self.reversal)?;
        record.end()
    }
}

impl Display for SupertrendValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ST({}: {})", self.direction, self.trend_line())
    }
}

/// Supertrend.
///
/// A trend-following overlay built from [`Atr`](crate::Atr) bands around the configured
/// source price (HL2 by default):
///
/// ```text
/// basic_upper = source + multiplier × ATR
/// basic_lower = source − multiplier × ATR
/// ```
///
/// The final bands ratchet per [`BandRatchet`]. The direction flips to
/// `Long` when the close breaks above the previous final upper band and to
/// `Short` when it breaks below the previous final lower band; otherwise it
/// carries over (ties carry). The first bar takes the configured initial
/// direction.
///
/// Output is available from the first bar. Each value depends only on the
/// bars fed so far, and the state kept is constant in size.
///
/// Supports live repainting: feeding a bar with the same `open_time`
/// recomputes the current bar from the previous bar's state without
/// advancing.
///
/// # Example
///
/// ```
/// use supertrend_ta::{Direction, Supertrend, SupertrendConfig};
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
/// let mut st = Supertrend::new(SupertrendConfig::new(10, 3.0).unwrap());
///
/// // ATR = 10, bands 100 ± 30, first bar starts Long
/// let value = st.compute(&Bar(105.0, 95.0, 100.0, 1)).unwrap();
/// assert_eq!(value.direction(), Direction::Long);
/// assert_eq!(value.trend_line(), 70.0);
/// assert_eq!(value.short(), None);
/// ```
#[derive(Clone, Debug)]
pub struct Supertrend {
    config: SupertrendConfig,
    multiplier: f64,
    atr: AtrState,
    clock: BarClock,
    prev: Option<BarState>,
    cur: Option<BarState>,
    current: Option<SupertrendValue>,
}

impl Indicator for Supertrend {
    type Config = SupertrendConfig;
    type Output = SupertrendValue;

    fn new(config: Self::Config) -> Self {
        Self {
            config,
            multiplier: config.multiplier.value(),
            atr: AtrState::new(AtrConfig::new(config.length)),
            clock: BarClock::default(),
            prev: None,
            cur: None,
            current: None,
        }
    }

    #[inline]
    fn config(&self) -> &Self::Config {
        &self.config
    }

    #[inline]
    fn compute(&mut self, ohlcv: &impl Ohlcv) -> Result<Self::Output, InputError> {
        let is_next_bar = validate(ohlcv, self.config.source.reads_open())
            .and_then(|()| self.clock.advance(ohlcv.open_time()))
            .inspect_err(|error| {
                debug!(indicator = %self, open_time = ohlcv.open_time(), %error, "rejected bar");
            })?;

        Ok(self.step(ohlcv, is_next_bar))
    }

    #[inline]
    fn value(&self) -> Option<Self::Output> {
        self.current
    }

    fn reset(&mut self) {
        debug!(indicator = %self, "reset");
        *self = Self::new(self.config);
    }
}

impl Supertrend {
    /// Computes Supertrend over a complete series of bars with a fresh
    /// indicator.
    ///
    /// Every element is treated as a new, closed bar in slice order;
    /// `open_time` is not consulted. Returns one value per bar, an empty
    /// vector for an empty series.
    ///
    /// # Errors
    ///
    /// Stops at the first rejected bar and returns
    /// [`Error::InvalidInput`] with its index.
    pub fn process<B: Ohlcv>(
        config: SupertrendConfig,
        bars: &[B],
    ) -> Result<Vec<SupertrendValue>, Error> {
        let mut supertrend = Self::new(config);
        let check_open = config.source.reads_open();

        bars.iter()
            .enumerate()
            .map(|(index, bar)| -> Result<_, Error> {
                validate(bar, check_open).map_err(|source| Error::InvalidInput { index, source })?;
                Ok(supertrend.step(bar, true))
            })
            .collect()
    }

    /// Lazily feeds `bars` through [`compute`](Self::compute).
    ///
    /// Bars are only consumed as the returned iterator is driven, so the
    /// caller can stop between any two bars. The indicator keeps the state
    /// of every bar consumed so far.
    pub fn compute_iter<I>(
        &mut self,
        bars: I,
    ) -> impl Iterator<Item = Result<SupertrendValue, InputError>>
    where
        I: IntoIterator,
        I::Item: Ohlcv,
    {
        bars.into_iter().map(move |bar| self.compute(&bar))
    }

    /// Advances (or repaints) with an already validated bar.
    #[inline]
    fn step(&mut self, ohlcv: &impl Ohlcv, is_next_bar: bool) -> SupertrendValue {
        if is_next_bar {
            self.prev = self.cur;
        }

        let atr = self.atr.apply(ohlcv, is_next_bar);
        let source = self.config.source.extract(ohlcv);
        let upper = source + self.multiplier * atr;
        let lower = source - self.multiplier * atr;
        let close = ohlcv.close();

        let state = match &self.prev {
            Some(prev) => self.config.ratchet.next(prev, upper, lower, close),
            None => BarState {
                upper,
                lower,
                close,
                direction: self.config.initial_direction,
            },
        };

        let value = SupertrendValue {
            upper: state.upper,
            lower: state.lower,
            atr,
            direction: state.direction,
            reversal: self
                .prev
                .is_some_and(|prev| prev.direction != state.direction),
        };

        if value.reversal {
            trace!(
                indicator = %self,
                open_time = ohlcv.open_time(),
                direction = %value.direction,
                trend_line = value.trend_line(),
                "trend reversal"
            );
        }

        self.cur = Some(state);
        self.current = Some(value);

        value
    }
}

impl Display for Supertrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SUPERTREND({}, {}, {})",
            self.config.length, self.multiplier, self.config.source
        )
    }
}
