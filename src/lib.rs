//! Streaming Supertrend indicator for Rust.
//!
//! Indicators accept any type implementing [`Ohlcv`] and return typed
//! results from the very first bar. Invalid bars are rejected with an
//! [`InputError`] and leave the indicator state untouched.
//!
//! Each indicator type ([`Supertrend`], [`Atr`]) exposes
//! [`new`](Supertrend::new), [`compute`](Supertrend::compute),
//! [`value`](Supertrend::value), and [`reset`](Supertrend::reset) as inherent
//! methods, no trait import needed. Import [`Indicator`] only for generic
//! code.
//!
//! For a complete historical series use [`Supertrend::process`].
//!
//! # Example
//!
//! ```
//! use supertrend_ta::{Direction, Supertrend, SupertrendConfig};
//! # use supertrend_ta::{Ohlcv, Price, Timestamp};
//! #
//! # struct Bar(f64, f64, f64);
//! # impl Ohlcv for Bar {
//! #     fn open(&self) -> Price { self.2 }
//! #     fn high(&self) -> Price { self.0 }
//! #     fn low(&self) -> Price { self.1 }
//! #     fn close(&self) -> Price { self.2 }
//! #     fn open_time(&self) -> Timestamp { 0 }
//! # }
//!
//! let bars = [Bar(105.0, 95.0, 100.0), Bar(130.0, 120.0, 128.0)];
//! let values = Supertrend::process(SupertrendConfig::new(10, 3.0)?, &bars)?;
//!
//! assert_eq!(values.len(), 2);
//! assert_eq!(values[1].direction(), Direction::Long);
//! assert!(!values[1].is_reversal());
//! # Ok::<(), supertrend_ta::Error>(())
//! ```

mod atr;
mod bar_clock;
mod error;
mod indicator;
mod ohlcv;
mod price_source;
mod supertrend;

pub use crate::error::{ConfigError, Error, InputError, PriceField};
pub use crate::indicator::{Indicator, IndicatorConfig, IndicatorConfigBuilder};
pub use crate::ohlcv::{Ohlcv, Price, Timestamp};
pub use crate::price_source::PriceSource;

pub use crate::atr::{Atr, AtrConfig, AtrConfigBuilder, true_range};
pub use crate::supertrend::{
    BandRatchet, Direction, Multiplier, Supertrend, SupertrendConfig, SupertrendConfigBuilder,
    SupertrendValue,
};

macro_rules! impl_indicator_methods {
    ($type:ty, $config:ty, $output:ty) => {
        impl $type {
            /// See [`Indicator::new`].
            #[must_use]
            pub fn new(config: $config) -> Self {
                <Self as Indicator>::new(config)
            }

            /// See [`Indicator::compute`].
            ///
            /// # Errors
            ///
            /// See [`Indicator::compute`].
            #[inline]
            pub fn compute(&mut self, kline: &impl Ohlcv) -> Result<$output, InputError> {
                <Self as Indicator>::compute(self, kline)
            }

            /// See [`Indicator::value`].
            #[must_use]
            #[inline]
            pub fn value(&self) -> Option<$output> {
                <Self as Indicator>::value(self)
            }

            /// See [`Indicator::reset`].
            pub fn reset(&mut self) {
                <Self as Indicator>::reset(self);
            }
        }
    };
}

impl_indicator_methods!(Atr, AtrConfig, Price);
impl_indicator_methods!(Supertrend, SupertrendConfig, SupertrendValue);

#[cfg(test)]
mod test_util;
