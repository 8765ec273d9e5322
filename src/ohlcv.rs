use crate::{InputError, PriceField};

/// A price value.
///
/// Semantic alias for [`f64`]. Documents intent in function signatures
/// without introducing newtype construction overhead.
pub type Price = f64;

/// Bar open timestamp or sequence number.
///
/// Opaque to the indicators apart from ordering: equal values repaint the
/// current bar, greater values advance the series.
pub type Timestamp = u64;

/// OHLCV bar data used as input to all indicators.
///
/// Implement this on your own kline/candle type to avoid per-tick
/// conversion. Indicators accept `&impl Ohlcv` and read only the fields
/// they need.
///
/// # Bar boundaries
///
/// Indicators detect new bars by comparing [`open_time`](Ohlcv::open_time)
/// values: same timestamp updates (repaints) the current bar, a new timestamp
/// advances the series. A decreasing timestamp is rejected with
/// [`InputError::OutOfOrder`].
///
/// # Example
///
/// ```
/// use supertrend_ta::{Ohlcv, Price, Timestamp};
///
/// struct MyKline {
///     o: f64, h: f64, l: f64, c: f64,
///     ts: u64,
/// }
///
/// impl Ohlcv for MyKline {
///     fn open(&self) -> Price { self.o }
///     fn high(&self) -> Price { self.h }
///     fn low(&self) -> Price { self.l }
///     fn close(&self) -> Price { self.c }
///     fn open_time(&self) -> Timestamp { self.ts }
/// }
/// ```
pub trait Ohlcv {
    /// Opening price of the bar.
    fn open(&self) -> Price;

    /// Highest price during the bar.
    fn high(&self) -> Price;

    /// Lowest price during the bar.
    fn low(&self) -> Price;

    /// Closing (or latest) price of the bar.
    fn close(&self) -> Price;

    /// Bar open timestamp or sequence number.
    ///
    /// Consecutive calls with the same value repaint the current bar; a
    /// greater value advances the indicator.
    fn open_time(&self) -> Timestamp;

    /// Trade volume during the bar. Defaults to `0.0`.
    ///
    /// None of the indicators in this crate read volume.
    fn volume(&self) -> f64 {
        0.0
    }
}

impl<T: Ohlcv + ?Sized> Ohlcv for &T {
    fn open(&self) -> Price {
        (**self).open()
    }

    fn high(&self) -> Price {
        (**self).high()
    }

    fn low(&self) -> Price {
        (**self).low()
    }

    fn close(&self) -> Price {
        (**self).close()
    }

    fn open_time(&self) -> Timestamp {
        (**self).open_time()
    }

    fn volume(&self) -> f64 {
        (**self).volume()
    }
}

/// Checks the prices an indicator is about to read.
///
/// `high`, `low` and `close` must be finite with `high >= low`. `open` is
/// only checked when `check_open` is set, so bar types without a meaningful
/// open still work with sources that ignore it.
pub(crate) fn validate(ohlcv: &impl Ohlcv, check_open: bool) -> Result<(), InputError> {
    let high = finite(PriceField::High, ohlcv.high())?;
    let low = finite(PriceField::Low, ohlcv.low())?;
    finite(PriceField::Close, ohlcv.close())?;
    if check_open {
        finite(PriceField::Open, ohlcv.open())?;
    }

    if high < low {
        return Err(InputError::InvertedRange { high, low });
    }

    Ok(())
}

#[inline]
fn finite(field: PriceField, value: Price) -> Result<Price, InputError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(InputError::NonFinite { field, value })
    }
}
