use advisor_core::Candle;
use serde::{Deserialize, Serialize};

use crate::swings::SwingPoint;

const ZONE_CONTEXT: usize = 5;
const MAX_ZONES_PER_SIDE: usize = 5;

pub const FIB_RATIOS: [f64; 5] = [0.236, 0.382, 0.5, 0.618, 0.786];

/// Supply or demand zone anchored to an impulse candle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub index: usize,
    pub low: f64,
    pub high: f64,
    /// Impulse body relative to the average body that followed it.
    pub strength: f64,
}

/// One Fibonacci retracement level over the dominant swing leg.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FibLevel {
    pub ratio: f64,
    pub price: f64,
}

/// Detect demand (bullish impulse) and supply (bearish impulse) zones.
///
/// An impulse is a candle whose body is at least twice the mean body of the
/// preceding five candles; its zone spans the candle's full high/low range.
/// Zones are ranked by strength and only the strongest five per side are
/// retained.
pub fn detect_zones(candles: &[Candle]) -> (Vec<Zone>, Vec<Zone>) {
    let mut demand = Vec::new();
    let mut supply = Vec::new();

    for i in ZONE_CONTEXT..candles.len() {
        let c = &candles[i];
        let mean_before: f64 = candles[i - ZONE_CONTEXT..i]
            .iter()
            .map(Candle::body)
            .sum::<f64>()
            / ZONE_CONTEXT as f64;
        if mean_before <= 0.0 || c.body() < 2.0 * mean_before {
            continue;
        }

        let after = &candles[i + 1..candles.len().min(i + 1 + ZONE_CONTEXT)];
        let mean_after = if after.is_empty() {
            mean_before
        } else {
            after.iter().map(Candle::body).sum::<f64>() / after.len() as f64
        };
        let strength = if mean_after > 0.0 {
            c.body() / mean_after
        } else {
            c.body() / mean_before
        };

        let zone = Zone {
            index: i,
            low: c.low,
            high: c.high,
            strength,
        };
        if c.is_bullish() {
            demand.push(zone);
        } else if c.is_bearish() {
            supply.push(zone);
        }
    }

    keep_strongest(&mut demand);
    keep_strongest(&mut supply);
    (demand, supply)
}

fn keep_strongest(zones: &mut Vec<Zone>) {
    zones.sort_by(|a, b| b.strength.partial_cmp(&a.strength).unwrap());
    zones.truncate(MAX_ZONES_PER_SIDE);
}

/// Retracement levels over the dominant swing leg: the most recent swing low
/// to swing high when the leg points up, high to low when it points down.
pub fn fibonacci_levels(swing_highs: &[SwingPoint], swing_lows: &[SwingPoint]) -> Vec<FibLevel> {
    let (Some(high), Some(low)) = (swing_highs.last(), swing_lows.last()) else {
        return vec![];
    };
    let span = high.price - low.price;
    if span <= 0.0 {
        return vec![];
    }

    let leg_up = low.index < high.index;
    FIB_RATIOS
        .iter()
        .map(|&ratio| FibLevel {
            ratio,
            price: if leg_up {
                high.price - ratio * span
            } else {
                low.price + ratio * span
            },
        })
        .collect()
}
