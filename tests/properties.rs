//! Property tests for Supertrend invariants.
//!
//! Uses proptest to verify:
//! 1. Exclusivity: exactly one of long/short is present per bar
//! 2. Causality: a value never depends on later bars
//! 3. Direction: carries inside the prior bands, follows breakouts outside
//! 4. Ratchet monotonicity: held bands only tighten
//! 5. Streaming and batch processing agree

use proptest::prelude::*;
use supertrend_ta::{
    BandRatchet, Direction, IndicatorConfig, IndicatorConfigBuilder, Multiplier, Ohlcv, Price,
    Supertrend, SupertrendConfig, SupertrendValue, Timestamp,
};

#[derive(Clone, Copy, Debug)]
struct Bar {
    high: f64,
    low: f64,
    close: f64,
    open_time: u64,
}

impl Ohlcv for Bar {
    fn open(&self) -> Price {
        self.close
    }
    fn high(&self) -> Price {
        self.high
    }
    fn low(&self) -> Price {
        self.low
    }
    fn close(&self) -> Price {
        self.close
    }
    fn open_time(&self) -> Timestamp {
        self.open_time
    }
}

// ── Strategies (proptest) ────────────────────────────────────────────

/// Random walk: each step moves the mid price, then spans a range around it
/// with the close somewhere inside.
fn arb_bars() -> impl Strategy<Value = Vec<Bar>> {
    prop::collection::vec((-0.05..0.05_f64, 0.0..0.04_f64, 0.0..=1.0_f64), 1..200).prop_map(
        |steps| {
            let mut mid = 100.0_f64;
            steps
                .into_iter()
                .zip(0_u64..)
                .map(|((step, range, at), open_time)| {
                    mid *= 1.0 + step;
                    let high = mid * (1.0 + range);
                    let low = mid * (1.0 - range);
                    Bar {
                        high,
                        low,
                        close: low + (high - low) * at,
                        open_time,
                    }
                })
                .collect()
        },
    )
}

fn arb_ratchet() -> impl Strategy<Value = BandRatchet> {
    prop_oneof![Just(BandRatchet::Standard), Just(BandRatchet::InTrend)]
}

fn arb_config() -> impl Strategy<Value = SupertrendConfig> {
    (1_usize..30, 0.5..5.0_f64, arb_ratchet()).prop_map(|(length, multiplier, ratchet)| {
        SupertrendConfig::builder()
            .length(std::num::NonZero::new(length).unwrap())
            .multiplier(Multiplier::new(multiplier).unwrap())
            .ratchet(ratchet)
            .build()
            .unwrap()
    })
}

fn run(config: SupertrendConfig, bars: &[Bar]) -> Vec<SupertrendValue> {
    Supertrend::process(config, bars).unwrap()
}

// ── 1. Exclusivity ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn exactly_one_side_per_bar(config in arb_config(), bars in arb_bars()) {
        for value in run(config, &bars) {
            prop_assert!(value.long().is_some() != value.short().is_some());
            prop_assert_eq!(value.long().or(value.short()), Some(value.trend_line()));
            prop_assert!(value.trend_line().is_finite());
            prop_assert!(value.atr() >= 0.0);
        }
    }
}

// ── 2. Causality & determinism ───────────────────────────────────────

proptest! {
    #[test]
    fn prefix_output_is_stable(
        config in arb_config(),
        bars in arb_bars(),
        cut in any::<prop::sample::Index>(),
    ) {
        let full = run(config, &bars);
        let k = cut.index(bars.len()) + 1;
        let prefix = run(config, &bars[..k]);

        prop_assert_eq!(&prefix[..], &full[..k]);
    }

    #[test]
    fn deterministic(config in arb_config(), bars in arb_bars()) {
        prop_assert_eq!(run(config, &bars), run(config, &bars));
    }

    #[test]
    fn streaming_matches_batch(config in arb_config(), bars in arb_bars()) {
        let mut st = Supertrend::new(config);
        let streamed: Vec<_> = st.compute_iter(&bars).collect::<Result<_, _>>().unwrap();

        prop_assert_eq!(streamed, run(config, &bars));
    }
}

// ── 3. Direction ─────────────────────────────────────────────────────

proptest! {
    #[test]
    fn direction_follows_prior_bands(config in arb_config(), bars in arb_bars()) {
        let values = run(config, &bars);
        prop_assert_eq!(values[0].direction(), config.initial_direction());

        for i in 1..values.len() {
            let (prev, cur, close) = (values[i - 1], values[i], bars[i].close);

            let expected = if close > prev.upper() {
                Direction::Long
            } else if close < prev.lower() {
                Direction::Short
            } else {
                prev.direction()
            };
            prop_assert_eq!(cur.direction(), expected, "bar {}", i);
            prop_assert_eq!(cur.is_reversal(), cur.direction() != prev.direction());
        }
    }
}

// ── 4. Ratchet monotonicity ──────────────────────────────────────────

proptest! {
    /// Standard bands only loosen after the previous close crossed them.
    #[test]
    fn standard_bands_only_tighten(
        length in 1_usize..30,
        multiplier in 0.5..5.0_f64,
        bars in arb_bars(),
    ) {
        let config = SupertrendConfig::new(length, multiplier).unwrap();
        prop_assert_eq!(config.length(), length);
        let values = run(config, &bars);

        for i in 1..values.len() {
            let (prev, cur, prev_close) = (values[i - 1], values[i], bars[i - 1].close);

            if prev_close >= prev.lower() {
                prop_assert!(cur.lower() >= prev.lower(), "lower loosened at bar {}", i);
            }
            if prev_close <= prev.upper() {
                prop_assert!(cur.upper() <= prev.upper(), "upper loosened at bar {}", i);
            }
        }
    }

    /// In-trend, the active band never loosens while the direction carries.
    #[test]
    fn in_trend_active_band_only_tightens(
        length in 1_usize..30,
        multiplier in 0.5..5.0_f64,
        bars in arb_bars(),
    ) {
        let config = SupertrendConfig::builder()
            .length(std::num::NonZero::new(length).unwrap())
            .multiplier(Multiplier::new(multiplier).unwrap())
            .ratchet(BandRatchet::InTrend)
            .build()
            .unwrap();
        let values = run(config, &bars);

        for i in 1..values.len() {
            let (prev, cur, close) = (values[i - 1], values[i], bars[i].close);
            let inside = prev.lower() <= close && close <= prev.upper();

            if inside && cur.direction() == Direction::Long {
                prop_assert!(cur.trend_line() >= prev.trend_line(), "long line fell at bar {}", i);
            }
            if inside && cur.direction() == Direction::Short {
                prop_assert!(cur.trend_line() <= prev.trend_line(), "short line rose at bar {}", i);
            }
        }
    }
}
