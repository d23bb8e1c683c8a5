use advisor_core::{Candle, TrendDirection};
use serde::{Deserialize, Serialize};

use crate::swings::SwingPoint;

/// Break of structure / change of character result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureBreak {
    pub detected: bool,
    pub direction: TrendDirection,
    /// True when the break also violates the established higher-low /
    /// lower-high sequence (CHoCH rather than plain BOS).
    pub change_of_character: bool,
}

impl StructureBreak {
    pub fn none() -> Self {
        Self {
            detected: false,
            direction: TrendDirection::Neutral,
            change_of_character: false,
        }
    }
}

/// Bullish when the latest close clears the most recent major swing high,
/// bearish when it loses the most recent major swing low. The break is a
/// change of character only when the prior swing sequence pointed the other
/// way.
pub fn detect_structure_break(
    candles: &[Candle],
    swing_highs: &[SwingPoint],
    swing_lows: &[SwingPoint],
) -> StructureBreak {
    let Some(last_close) = candles.last().map(|c| c.close) else {
        return StructureBreak::none();
    };
    let (Some(last_high), Some(last_low)) = (swing_highs.last(), swing_lows.last()) else {
        return StructureBreak::none();
    };

    let higher_lows = swing_lows
        .windows(2)
        .last()
        .map(|w| w[1].price > w[0].price)
        .unwrap_or(false);
    let lower_highs = swing_highs
        .windows(2)
        .last()
        .map(|w| w[1].price < w[0].price)
        .unwrap_or(false);

    if last_close > last_high.price {
        StructureBreak {
            detected: true,
            direction: TrendDirection::Bullish,
            // Punching up through a lower-high sequence flips the regime.
            change_of_character: lower_highs,
        }
    } else if last_close < last_low.price {
        StructureBreak {
            detected: true,
            direction: TrendDirection::Bearish,
            change_of_character: higher_lows,
        }
    } else {
        StructureBreak::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::candles_from;

    fn swings(prices: &[(usize, f64)]) -> Vec<SwingPoint> {
        prices
            .iter()
            .map(|&(index, price)| SwingPoint { index, price })
            .collect()
    }

    #[test]
    fn close_above_swing_high_is_bullish_bos() {
        let candles = candles_from(&[(104.0, 106.5, 103.5, 106.0)]);
        let result = detect_structure_break(
            &candles,
            &swings(&[(2, 103.0), (8, 105.0)]), // rising highs: continuation
            &swings(&[(5, 100.0), (11, 101.0)]),
        );
        assert!(result.detected);
        assert_eq!(result.direction, TrendDirection::Bullish);
        assert!(!result.change_of_character);
    }

    #[test]
    fn break_up_through_lower_highs_is_choch() {
        let candles = candles_from(&[(104.0, 106.5, 103.5, 106.0)]);
        let result = detect_structure_break(
            &candles,
            &swings(&[(2, 108.0), (8, 105.0)]), // lower highs: downtrend
            &swings(&[(5, 101.0), (11, 100.0)]),
        );
        assert!(result.detected);
        assert_eq!(result.direction, TrendDirection::Bullish);
        assert!(result.change_of_character);
    }

    #[test]
    fn losing_higher_low_is_bearish_choch() {
        let candles = candles_from(&[(101.0, 101.5, 99.0, 99.5)]);
        let result = detect_structure_break(
            &candles,
            &swings(&[(2, 103.0), (8, 105.0)]),
            &swings(&[(5, 99.8), (11, 100.5)]), // higher lows: uptrend
        );
        assert!(result.detected);
        assert_eq!(result.direction, TrendDirection::Bearish);
        assert!(result.change_of_character);
    }

    #[test]
    fn inside_range_detects_nothing() {
        let candles = candles_from(&[(102.0, 103.0, 101.0, 102.5)]);
        let result = detect_structure_break(
            &candles,
            &swings(&[(8, 105.0)]),
            &swings(&[(11, 100.0)]),
        );
        assert!(!result.detected);
        assert_eq!(result.direction, TrendDirection::Neutral);
    }
}
