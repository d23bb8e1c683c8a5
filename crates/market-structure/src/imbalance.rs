use advisor_core::Candle;
use serde::{Deserialize, Serialize};

/// Directional polarity of an imbalance feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    Bullish,
    Bearish,
}

/// A candle marking presumed large directional commitment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBlock {
    pub index: usize,
    pub low: f64,
    pub high: f64,
    pub polarity: Polarity,
}

/// An untraded gap between non-overlapping candle extremes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FairValueGap {
    /// Index of the middle candle of the three-candle pattern.
    pub index: usize,
    pub lower: f64,
    pub upper: f64,
    pub polarity: Polarity,
}

const MAX_ORDER_BLOCKS: usize = 10;

/// Displacement candles: body at least twice the prior candle's range, body
/// dominating its own range, with the two preceding candles colored against
/// the move. The block spans body-to-extreme on the origin side.
pub fn detect_order_blocks(candles: &[Candle]) -> Vec<OrderBlock> {
    let mut blocks = Vec::new();

    for i in 2..candles.len() {
        let c = &candles[i];
        let prior = &candles[i - 1];

        if prior.range() <= 0.0 || c.range() <= 0.0 {
            continue;
        }
        if c.body() < 2.0 * prior.range() || c.body() / c.range() <= 0.7 {
            continue;
        }

        let flanked = if c.is_bullish() {
            candles[i - 2].is_bearish() && candles[i - 1].is_bearish()
        } else if c.is_bearish() {
            candles[i - 2].is_bullish() && candles[i - 1].is_bullish()
        } else {
            false
        };
        if !flanked {
            continue;
        }

        let block = if c.is_bullish() {
            OrderBlock {
                index: i,
                low: c.low,
                high: c.open.max(c.close),
                polarity: Polarity::Bullish,
            }
        } else {
            OrderBlock {
                index: i,
                low: c.open.min(c.close),
                high: c.high,
                polarity: Polarity::Bearish,
            }
        };
        blocks.push(block);
    }

    // Most recent blocks are the ones that still matter.
    if blocks.len() > MAX_ORDER_BLOCKS {
        blocks.drain(..blocks.len() - MAX_ORDER_BLOCKS);
    }
    blocks
}

/// Three-candle gaps whose void has not been re-entered by any later wick.
pub fn detect_fair_value_gaps(candles: &[Candle]) -> Vec<FairValueGap> {
    let mut gaps = Vec::new();

    for i in 1..candles.len().saturating_sub(1) {
        let before = &candles[i - 1];
        let after = &candles[i + 1];

        let gap = if before.high < after.low {
            Some(FairValueGap {
                index: i,
                lower: before.high,
                upper: after.low,
                polarity: Polarity::Bullish,
            })
        } else if before.low > after.high {
            Some(FairValueGap {
                index: i,
                lower: after.high,
                upper: before.low,
                polarity: Polarity::Bearish,
            })
        } else {
            None
        };

        let Some(gap) = gap else { continue };

        // Invalidated once any later candle trades back into the void.
        let touched = candles[i + 2..]
            .iter()
            .any(|c| c.low < gap.upper && c.high > gap.lower);
        if !touched {
            gaps.push(gap);
        }
    }
    gaps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::candles_from;

    #[test]
    fn bullish_order_block_after_bearish_flank() {
        let candles = candles_from(&[
            (102.0, 102.5, 101.0, 101.2), // bearish
            (101.2, 101.6, 100.8, 101.0), // bearish, range 0.8
            (101.0, 103.2, 100.9, 103.1), // bullish displacement, body 2.1
        ]);
        let blocks = detect_order_blocks(&candles);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].polarity, Polarity::Bullish);
        assert_eq!(blocks[0].index, 2);
        assert_eq!(blocks[0].low, 100.9);
        assert_eq!(blocks[0].high, 103.1);
    }

    #[test]
    fn small_body_is_not_a_block() {
        let candles = candles_from(&[
            (102.0, 102.5, 101.0, 101.2),
            (101.2, 101.6, 100.8, 101.0),
            (101.0, 102.0, 100.9, 101.5), // body 0.5 < 2x prior range
        ]);
        assert!(detect_order_blocks(&candles).is_empty());
    }

    #[test]
    fn untouched_bullish_gap_survives() {
        let candles = candles_from(&[
            (100.0, 101.0, 99.5, 100.8),
            (101.0, 104.0, 100.9, 103.8), // displacement
            (103.9, 105.0, 102.5, 104.5), // low 102.5 > 101.0: gap [101, 102.5]
            (104.5, 106.0, 103.5, 105.5), // never re-enters the gap
        ]);
        let gaps = detect_fair_value_gaps(&candles);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].polarity, Polarity::Bullish);
        assert_eq!(gaps[0].lower, 101.0);
        assert_eq!(gaps[0].upper, 102.5);
    }

    #[test]
    fn wick_into_gap_invalidates_it() {
        let candles = candles_from(&[
            (100.0, 101.0, 99.5, 100.8),
            (101.0, 104.0, 100.9, 103.8),
            (103.9, 105.0, 102.5, 104.5),
            (104.5, 104.8, 101.5, 104.0), // wick re-enters [101, 102.5]
        ]);
        assert!(detect_fair_value_gaps(&candles).is_empty());
    }

    #[test]
    fn bearish_gap_detected() {
        let candles = candles_from(&[
            (105.0, 105.5, 104.0, 104.2),
            (104.0, 104.1, 100.5, 100.8), // displacement down
            (100.5, 101.5, 99.5, 100.0),  // high 101.5 < 104.0: gap [101.5, 104]
            (100.0, 101.0, 99.0, 99.5),
        ]);
        let gaps = detect_fair_value_gaps(&candles);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].polarity, Polarity::Bearish);
    }
}
