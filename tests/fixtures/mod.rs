#![allow(dead_code)]

use serde::{Deserialize, de::DeserializeOwned};
use supertrend_ta::{Direction, Ohlcv, Price, SupertrendValue, Timestamp};

/// OHLCV bar parsed from the hourly fixture series.
#[derive(Debug, Clone, Deserialize)]
pub struct RefBar {
    pub open_time: u64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Ohlcv for RefBar {
    fn open(&self) -> Price {
        self.open
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

    fn volume(&self) -> f64 {
        self.volume
    }
}

/// Reference Supertrend row. `direction` is `1` for long, `-1` for short.
#[derive(Debug, Deserialize)]
pub struct RefSupertrend {
    pub open_time: u64,
    pub upper: f64,
    pub lower: f64,
    pub atr: f64,
    pub direction: i8,
    pub trend_line: f64,
}

const OHLCV_PATH: &str = "tests/fixtures/data/synthetic-1h.csv";

/// Load the reference OHLCV bars.
pub fn load_reference_ohlcvs() -> Vec<RefBar> {
    load_records(OHLCV_PATH, "invalid OHLCV record")
}

/// Load Supertrend reference data (bands, ATR, direction, trend line).
pub fn load_supertrend_ref(path: &str) -> Vec<RefSupertrend> {
    load_records(path, "invalid Supertrend reference record")
}

/// Assert two f64 values are within tolerance.
pub fn assert_near(actual: f64, expected: f64, tolerance: f64, context: &str) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= tolerance,
        "{context}: expected {expected:.10}, got {actual:.10}, diff {diff:.2e} > tolerance {tolerance:.2e}"
    );
}

/// Assert a computed Supertrend value matches a reference row.
pub fn assert_supertrend_near(
    actual: &SupertrendValue,
    expected: &RefSupertrend,
    tolerance: f64,
    context: &str,
) {
    assert_eq!(
        actual.direction().sign(),
        expected.direction,
        "{context}: direction"
    );
    for (field, av, ev) in [
        ("upper", actual.upper(), expected.upper),
        ("lower", actual.lower(), expected.lower),
        ("atr", actual.atr(), expected.atr),
        ("trend_line", actual.trend_line(), expected.trend_line),
    ] {
        assert_near(av, ev, tolerance, &format!("{context}: {field}"));
    }
}

/// Creates perturbed versions of a bar to simulate live repaints.
///
/// Returns 2 intermediate bars (with shifted close/high/low) followed
/// by the original bar. All share the same `open_time`.
pub fn repaint_sequence(bar: &RefBar) -> Vec<RefBar> {
    let t = bar.open_time;
    vec![
        // First tick: only open is known, close near open
        RefBar {
            open: bar.open,
            high: bar.open * 1.001,
            low: bar.open * 0.999,
            close: bar.open * 1.0005,
            volume: bar.volume - 2.0,
            open_time: t,
        },
        // Mid-bar: partial movement toward final values
        RefBar {
            open: bar.open,
            high: bar.open.midpoint(bar.high),
            low: bar.open.midpoint(bar.low),
            close: bar.open.midpoint(bar.close),
            volume: bar.volume - 1.0,
            open_time: t,
        },
        // Final: real OHLCV values
        bar.clone(),
    ]
}

/// Assert Supertrend values match between closed and repainted indicators.
pub fn assert_supertrend_values_match(
    bar_idx: usize,
    closed: Option<SupertrendValue>,
    repainted: Option<SupertrendValue>,
    tolerance: f64,
) {
    match (closed, repainted) {
        (Some(c), Some(r)) => {
            assert_eq!(
                c.direction(),
                r.direction(),
                "direction diverged at bar {bar_idx}"
            );
            assert_eq!(
                c.is_reversal(),
                r.is_reversal(),
                "reversal diverged at bar {bar_idx}"
            );
            for (band, cv, rv) in [
                ("upper", c.upper(), r.upper()),
                ("lower", c.lower(), r.lower()),
                ("atr", c.atr(), r.atr()),
            ] {
                let diff = (cv - rv).abs();
                assert!(
                    diff <= tolerance,
                    "Supertrend {band} diverged at bar {bar_idx}: closed={cv:.10}, repainted={rv:.10}, diff={diff:.2e}"
                );
            }
        }
        (c, r) => {
            panic!("missing value at bar {bar_idx}: closed={c:?}, repainted={r:?}");
        }
    }
}

pub fn long_count(values: &[SupertrendValue]) -> usize {
    values
        .iter()
        .filter(|v| v.direction() == Direction::Long)
        .count()
}

fn load_records<D>(path: &str, expect_msg: &str) -> Vec<D>
where
    D: DeserializeOwned,
{
    let mut rdr =
        csv::Reader::from_path(path).unwrap_or_else(|e| panic!("failed to open {path}: {e}"));

    rdr.deserialize().map(|r| r.expect(expect_msg)).collect()
}
