pub mod confluence;
pub mod phase;
pub mod trend;

use advisor_core::{AdvisorConfig, Candle, TradingMode};
use market_indicators::IndicatorSet;
use market_structure::StructureAssessment;
use serde::{Deserialize, Serialize};

pub use confluence::*;
pub use phase::*;
pub use trend::*;

/// Candles required before the trend/confluence stage trades at all.
pub const MIN_CANDLES: usize = 50;

/// Short-window lookback for the micro trend.
const MICRO_WINDOW: usize = 30;

/// Everything the downstream engines need to know about the market, computed
/// once per analysis call. Pure and recomputed from scratch each time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketView {
    pub indicators: IndicatorSet,
    pub structure: StructureAssessment,
    pub micro_trend: TrendAssessment,
    pub macro_trend: TrendAssessment,
    pub phase: PhaseAssessment,
    pub chaos: ChaosAssessment,
    /// Latest volume relative to its 20-period average, normalized to [0, 1].
    pub volume_profile: f64,
    /// Agreement between micro and macro trend, [0, 1].
    pub timeframe_alignment: f64,
    /// Signed momentum read, [-1, 1].
    pub momentum: f64,
}

impl MarketView {
    /// Assemble the full market view from a sanitized candle sequence.
    pub fn assemble(candles: &[Candle], mode: TradingMode, config: &AdvisorConfig) -> Self {
        let indicators = IndicatorSet::compute(candles, config.atr_floor);
        let structure = StructureAssessment::analyze(candles, mode.swing_window());

        let micro_slice = &candles[candles.len().saturating_sub(MICRO_WINDOW)..];
        let micro_trend = trend::classify_trend(micro_slice, config);
        let macro_trend = trend::classify_trend(candles, config);

        let phase = phase::assess_phase(candles, &indicators);
        let chaos = phase::assess_chaos(candles, &indicators);

        let volume_profile = volume_profile(candles);
        let timeframe_alignment = trend::alignment(&micro_trend, &macro_trend);
        let momentum = momentum_score(&indicators);

        Self {
            indicators,
            structure,
            micro_trend,
            macro_trend,
            phase,
            chaos,
            volume_profile,
            timeframe_alignment,
            momentum,
        }
    }

    /// Signed trend strength for the Bayesian engine, [-1, 1]. Micro and
    /// macro scores contribute equally.
    pub fn trend_strength(&self) -> f64 {
        ((self.micro_trend.score + self.macro_trend.score) as f64 / 20.0).clamp(-1.0, 1.0)
    }
}

/// Latest volume against its 20-period mean, squashed into [0, 1] where 0.5
/// means average participation.
fn volume_profile(candles: &[Candle]) -> f64 {
    if candles.is_empty() {
        return 0.5;
    }
    let volumes: Vec<f64> = candles.iter().map(|c| c.volume).collect();
    let averages = market_indicators::sma(&volumes, 20);
    let Some(&avg) = averages.last() else {
        return 0.5;
    };
    if avg <= 0.0 {
        return 0.5;
    }
    let ratio = volumes.last().unwrap() / avg;
    (ratio / 2.0).clamp(0.0, 1.0)
}

/// Signed momentum in [-1, 1] from RSI displacement, stochastic %K and the
/// MACD histogram sign.
fn momentum_score(indicators: &IndicatorSet) -> f64 {
    let rsi_part = (indicators.rsi - 50.0) / 50.0;
    let stoch_part = (indicators.stoch_k - 50.0) / 50.0;
    let macd_part = indicators.macd_histogram.signum();
    (0.45 * rsi_part + 0.35 * stoch_part + 0.20 * macd_part).clamp(-1.0, 1.0)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{clean_downtrend, clean_uptrend};
    use advisor_core::TrendDirection;

    #[test]
    fn view_is_deterministic() {
        let candles = clean_uptrend(200);
        let config = AdvisorConfig::default();
        let a = MarketView::assemble(&candles, TradingMode::Intraday, &config);
        let b = MarketView::assemble(&candles, TradingMode::Intraday, &config);
        assert_eq!(a, b);
    }

    #[test]
    fn uptrend_view_reads_bullish() {
        let candles = clean_uptrend(300);
        let config = AdvisorConfig::default();
        let view = MarketView::assemble(&candles, TradingMode::Intraday, &config);
        assert_eq!(view.macro_trend.direction, TrendDirection::Bullish);
        assert!(view.trend_strength() > 0.0);
        assert!(view.momentum > 0.0);
        assert!((0.0..=1.0).contains(&view.timeframe_alignment));
    }

    #[test]
    fn downtrend_view_reads_bearish() {
        let candles = clean_downtrend(300);
        let config = AdvisorConfig::default();
        let view = MarketView::assemble(&candles, TradingMode::Swing, &config);
        assert_eq!(view.macro_trend.direction, TrendDirection::Bearish);
        assert!(view.trend_strength() < 0.0);
        assert!(view.momentum < 0.0);
    }
}
