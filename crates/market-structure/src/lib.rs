pub mod breaks;
pub mod imbalance;
pub mod liquidity;
pub mod swings;
pub mod zones;

use advisor_core::Candle;
use serde::{Deserialize, Serialize};

pub use breaks::*;
pub use imbalance::*;
pub use liquidity::*;
pub use swings::*;
pub use zones::*;

/// Everything the structure detector knows about a candle sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureAssessment {
    pub swing_highs: Vec<SwingPoint>,
    pub swing_lows: Vec<SwingPoint>,
    pub order_blocks: Vec<OrderBlock>,
    pub fair_value_gaps: Vec<FairValueGap>,
    pub liquidity: LiquidityAssessment,
    pub structure_break: StructureBreak,
    pub fibonacci_levels: Vec<FibLevel>,
    pub demand_zones: Vec<Zone>,
    pub supply_zones: Vec<Zone>,
}

impl StructureAssessment {
    /// Run every detector over the sequence. `swing_window` is the symmetric
    /// window for swing-point detection (5 intraday, 10 swing-scale).
    ///
    /// Degrades to an empty assessment when the sequence is too short for a
    /// given detector; nothing here errors.
    pub fn analyze(candles: &[Candle], swing_window: usize) -> Self {
        let swing_highs = swings::swing_highs(candles, swing_window);
        let swing_lows = swings::swing_lows(candles, swing_window);
        let structure_break = breaks::detect_structure_break(candles, &swing_highs, &swing_lows);
        let fibonacci_levels = zones::fibonacci_levels(&swing_highs, &swing_lows);
        let (demand_zones, supply_zones) = zones::detect_zones(candles);

        Self {
            order_blocks: imbalance::detect_order_blocks(candles),
            fair_value_gaps: imbalance::detect_fair_value_gaps(candles),
            liquidity: liquidity::assess_liquidity(candles),
            structure_break,
            fibonacci_levels,
            demand_zones,
            supply_zones,
            swing_highs,
            swing_lows,
        }
    }

    /// Composite structure quality in [0, 1], consumed by the confluence
    /// master filter. Weights favor a confirmed break and fresh imbalances.
    pub fn quality(&self) -> f64 {
        let mut q = 0.0;
        if self.structure_break.detected {
            q += 0.30;
        }
        q += (self.order_blocks.len().min(3) as f64 / 3.0) * 0.20;
        q += (self.fair_value_gaps.len().min(2) as f64 / 2.0) * 0.15;
        let zone_count = self.demand_zones.len() + self.supply_zones.len();
        q += (zone_count.min(4) as f64 / 4.0) * 0.20;
        q += self.liquidity.score * 0.15;
        q.clamp(0.0, 1.0)
    }

    /// Directional structure evidence in [0, 1] for the bull side.
    pub fn bullish_score(&self) -> f64 {
        let mut s = 0.0;
        if self.structure_break.detected
            && self.structure_break.direction == advisor_core::TrendDirection::Bullish
        {
            s += if self.structure_break.change_of_character {
                0.35
            } else {
                0.25
            };
        }
        let bull_blocks = self
            .order_blocks
            .iter()
            .filter(|b| b.polarity == Polarity::Bullish)
            .count();
        s += (bull_blocks.min(2) as f64 / 2.0) * 0.20;
        let bull_gaps = self
            .fair_value_gaps
            .iter()
            .filter(|g| g.polarity == Polarity::Bullish)
            .count();
        s += (bull_gaps.min(2) as f64 / 2.0) * 0.15;
        s += (self.demand_zones.len().min(3) as f64 / 3.0) * 0.15;
        // A swept low is reversal fuel for the bull side.
        if self.liquidity.swept_low {
            s += 0.15;
        }
        s.clamp(0.0, 1.0)
    }

    /// Directional structure evidence in [0, 1] for the bear side.
    pub fn bearish_score(&self) -> f64 {
        let mut s = 0.0;
        if self.structure_break.detected
            && self.structure_break.direction == advisor_core::TrendDirection::Bearish
        {
            s += if self.structure_break.change_of_character {
                0.35
            } else {
                0.25
            };
        }
        let bear_blocks = self
            .order_blocks
            .iter()
            .filter(|b| b.polarity == Polarity::Bearish)
            .count();
        s += (bear_blocks.min(2) as f64 / 2.0) * 0.20;
        let bear_gaps = self
            .fair_value_gaps
            .iter()
            .filter(|g| g.polarity == Polarity::Bearish)
            .count();
        s += (bear_gaps.min(2) as f64 / 2.0) * 0.15;
        s += (self.supply_zones.len().min(3) as f64 / 3.0) * 0.15;
        if self.liquidity.swept_high {
            s += 0.15;
        }
        s.clamp(0.0, 1.0)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::wavy_uptrend;

    #[test]
    fn analyze_degrades_on_short_history() {
        let candles = wavy_uptrend(3, 0);
        let assessment = StructureAssessment::analyze(&candles, 5);
        assert!(assessment.swing_highs.is_empty());
        assert!(!assessment.structure_break.detected);
        assert!(assessment.fibonacci_levels.is_empty());
    }

    #[test]
    fn quality_bounded() {
        let candles = wavy_uptrend(120, 10);
        let assessment = StructureAssessment::analyze(&candles, 5);
        let q = assessment.quality();
        assert!((0.0..=1.0).contains(&q));
        assert!((0.0..=1.0).contains(&assessment.bullish_score()));
        assert!((0.0..=1.0).contains(&assessment.bearish_score()));
    }

    #[test]
    fn uptrend_scores_bullish() {
        let candles = wavy_uptrend(120, 10);
        let assessment = StructureAssessment::analyze(&candles, 5);
        assert!(assessment.bullish_score() >= assessment.bearish_score());
    }
}
