use advisor_core::Candle;
use serde::{Deserialize, Serialize};

const SWEEP_LOOKBACK: usize = 20;
/// Relative tolerance for treating two extremes as "equal" resting liquidity.
const EQUAL_LEVEL_TOLERANCE: f64 = 0.0005;

/// Stop-hunt and resting-liquidity read for the latest candle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidityAssessment {
    /// Latest high exceeded the second-highest of the lookback window.
    pub swept_high: bool,
    /// Latest low undercut the second-lowest of the lookback window.
    pub swept_low: bool,
    /// Clustered highs within tolerance of the window maximum.
    pub equal_highs: usize,
    /// Clustered lows within tolerance of the window minimum.
    pub equal_lows: usize,
    /// Composite liquidity score in [0, 1].
    pub score: f64,
}

impl LiquidityAssessment {
    fn empty() -> Self {
        Self {
            swept_high: false,
            swept_low: false,
            equal_highs: 0,
            equal_lows: 0,
            score: 0.0,
        }
    }
}

/// A sweep compares the current extreme against the *second*-most-extreme
/// value of the prior window rather than the absolute extreme, which is what
/// distinguishes a stop-hunt from a plain breakout.
pub fn assess_liquidity(candles: &[Candle]) -> LiquidityAssessment {
    if candles.len() < SWEEP_LOOKBACK + 1 {
        return LiquidityAssessment::empty();
    }

    let current = candles.last().unwrap();
    let window = &candles[candles.len() - 1 - SWEEP_LOOKBACK..candles.len() - 1];

    let mut highs: Vec<f64> = window.iter().map(|c| c.high).collect();
    let mut lows: Vec<f64> = window.iter().map(|c| c.low).collect();
    highs.sort_by(|a, b| b.partial_cmp(a).unwrap());
    lows.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let swept_high = current.high > highs[1];
    let swept_low = current.low < lows[1];

    let top = highs[0];
    let equal_highs = highs
        .iter()
        .filter(|&&h| (top - h) / top <= EQUAL_LEVEL_TOLERANCE)
        .count();
    let bottom = lows[0];
    let equal_lows = lows
        .iter()
        .filter(|&&l| (l - bottom) / bottom.max(f64::MIN_POSITIVE) <= EQUAL_LEVEL_TOLERANCE)
        .count();

    let mut score = 0.0;
    if swept_high {
        score += 0.2;
    }
    if swept_low {
        score += 0.2;
    }
    // Two or more clustered extremes mark a resting pool.
    score += ((equal_highs.saturating_sub(1)).min(3) as f64 / 3.0) * 0.3;
    score += ((equal_lows.saturating_sub(1)).min(3) as f64 / 3.0) * 0.3;

    LiquidityAssessment {
        swept_high,
        swept_low,
        equal_highs,
        equal_lows,
        score: score.clamp(0.0, 1.0),
    }
}
