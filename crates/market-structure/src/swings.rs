use advisor_core::Candle;
use serde::{Deserialize, Serialize};

/// A confirmed local extreme.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwingPoint {
    pub index: usize,
    pub price: f64,
}

/// Swing highs: candles whose high is strictly greater than every high in a
/// symmetric `window` on each side.
pub fn swing_highs(candles: &[Candle], window: usize) -> Vec<SwingPoint> {
    find_swings(candles, window, |c| c.high, |a, b| a > b)
}

/// Swing lows: strict mirror of [`swing_highs`].
pub fn swing_lows(candles: &[Candle], window: usize) -> Vec<SwingPoint> {
    find_swings(candles, window, |c| c.low, |a, b| a < b)
}

fn find_swings(
    candles: &[Candle],
    window: usize,
    value: impl Fn(&Candle) -> f64,
    beats: impl Fn(f64, f64) -> bool,
) -> Vec<SwingPoint> {
    if window == 0 || candles.len() < 2 * window + 1 {
        return vec![];
    }

    let mut points = Vec::new();
    for i in window..candles.len() - window {
        let candidate = value(&candles[i]);
        let extremal = (i - window..=i + window)
            .filter(|&j| j != i)
            .all(|j| beats(candidate, value(&candles[j])));
        if extremal {
            points.push(SwingPoint {
                index: i,
                price: candidate,
            });
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::candles_from;

    #[test]
    fn detects_single_peak() {
        // Peak at index 3, trough shoulders around it.
        let candles = candles_from(&[
            (100.0, 101.0, 99.0, 100.5),
            (100.5, 102.0, 100.0, 101.5),
            (101.5, 103.0, 101.0, 102.5),
            (102.5, 106.0, 102.0, 105.0),
            (105.0, 105.0, 102.5, 103.0),
            (103.0, 103.5, 101.0, 101.5),
            (101.5, 102.0, 100.0, 100.5),
        ]);
        let highs = swing_highs(&candles, 2);
        assert_eq!(highs.len(), 1);
        assert_eq!(highs[0].index, 3);
        assert_eq!(highs[0].price, 106.0);
    }

    #[test]
    fn strictness_rejects_ties() {
        let candles = candles_from(&[
            (100.0, 105.0, 99.0, 101.0),
            (101.0, 106.0, 100.0, 102.0),
            (102.0, 106.0, 101.0, 103.0), // tied high, not strictly extremal
            (103.0, 105.0, 102.0, 104.0),
            (104.0, 104.5, 103.0, 104.2),
        ]);
        // Neither tied candle is strictly extremal.
        assert!(swing_highs(&candles, 1).is_empty());
    }

    #[test]
    fn short_history_yields_nothing() {
        let candles = candles_from(&[(100.0, 101.0, 99.0, 100.5); 4]);
        assert!(swing_highs(&candles, 5).is_empty());
        assert!(swing_lows(&candles, 5).is_empty());
    }
}
