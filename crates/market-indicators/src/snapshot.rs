use advisor_core::Candle;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::series;

/// Repair a candle sequence in place of rejecting it.
///
/// Candles with non-finite fields are dropped; candles whose high/low do not
/// enclose open/close are clamped so they do. Every correction is logged.
pub fn sanitize_candles(candles: &[Candle]) -> Vec<Candle> {
    let mut out = Vec::with_capacity(candles.len());
    for (i, c) in candles.iter().enumerate() {
        let finite = [c.open, c.high, c.low, c.close, c.volume]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            warn!(index = i, "dropping candle with non-finite fields");
            continue;
        }

        let body_high = c.open.max(c.close);
        let body_low = c.open.min(c.close);
        if c.high < body_high || c.low > body_low {
            warn!(
                index = i,
                high = c.high,
                low = c.low,
                "clamping high/low to enclose open/close"
            );
            let mut fixed = c.clone();
            fixed.high = c.high.max(body_high);
            fixed.low = c.low.min(body_low);
            out.push(fixed);
        } else {
            out.push(c.clone());
        }
    }
    out
}

/// Latest value of every indicator the pipeline consumes.
///
/// Stateless: recomputed per call, never mutated in place. When history is
/// shorter than an indicator's required period the field holds its neutral
/// default instead (RSI 50, stochastic 50, ADX 0, MACD 0, ATR = floor,
/// moving averages and bands collapse to the last close).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSet {
    pub ema_9: f64,
    pub ema_21: f64,
    pub ema_50: f64,
    pub ema_200: f64,
    pub sma_20: f64,
    pub sma_50: f64,
    pub rsi: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_histogram: f64,
    pub atr: f64,
    pub bb_upper: f64,
    pub bb_middle: f64,
    pub bb_lower: f64,
    pub adx: f64,
    pub plus_di: f64,
    pub minus_di: f64,
    pub stoch_k: f64,
    pub stoch_d: f64,
    pub vwap: f64,
}

impl IndicatorSet {
    /// Compute the snapshot for a (sanitized) candle sequence.
    ///
    /// `atr_floor` is the minimum ATR in price units; it keeps stop
    /// distances meaningful in a low-range regime.
    pub fn compute(candles: &[Candle], atr_floor: f64) -> Self {
        let last_close = candles.last().map(|c| c.close).unwrap_or(0.0);
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();

        let last = |v: Vec<f64>, neutral: f64| v.last().copied().unwrap_or(neutral);

        let macd = series::macd(&closes, 12, 26, 9);
        let bb = series::bollinger_bands(&closes, 20, 2.0);
        let adx = series::adx(candles, 14);
        let stoch = series::stochastic(candles, 14, 3);

        Self {
            ema_9: last(series::ema(&closes, 9), last_close),
            ema_21: last(series::ema(&closes, 21), last_close),
            ema_50: last(series::ema(&closes, 50), last_close),
            ema_200: last(series::ema(&closes, 200), last_close),
            sma_20: last(series::sma(&closes, 20), last_close),
            sma_50: last(series::sma(&closes, 50), last_close),
            rsi: last(series::rsi(&closes, 14), 50.0),
            macd: last(macd.line, 0.0),
            macd_signal: last(macd.signal, 0.0),
            macd_histogram: last(macd.histogram, 0.0),
            atr: last(series::atr(candles, 14), atr_floor).max(atr_floor),
            bb_upper: last(bb.upper, last_close),
            bb_middle: last(bb.middle, last_close),
            bb_lower: last(bb.lower, last_close),
            adx: last(adx.adx, 0.0),
            plus_di: last(adx.plus_di, 0.0),
            minus_di: last(adx.minus_di, 0.0),
            stoch_k: last(stoch.k, 50.0),
            stoch_d: last(stoch.d, 50.0),
            vwap: last(series::vwap(candles), last_close),
        }
    }
}
