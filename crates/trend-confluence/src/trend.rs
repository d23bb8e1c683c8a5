use advisor_core::{AdvisorConfig, Candle, TrendDirection, TrendStrength};
use market_indicators::IndicatorSet;
use market_structure::swings;
use serde::{Deserialize, Serialize};

/// Window used for the swing-sequence contribution inside a trend window.
const SEQUENCE_SWING_WINDOW: usize = 3;
/// Candles inspected for the color-dominance contribution.
const DOMINANCE_LOOKBACK: usize = 10;

/// Classified trend with its raw signed score and audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAssessment {
    pub direction: TrendDirection,
    pub strength: TrendStrength,
    pub score: i32,
    /// Human-readable contributions, for logging and post-mortems.
    pub signals: Vec<String>,
}

impl TrendAssessment {
    pub fn neutral() -> Self {
        Self {
            direction: TrendDirection::Neutral,
            strength: TrendStrength::None,
            score: 0,
            signals: vec!["insufficient history".to_string()],
        }
    }
}

/// Weighted-sum trend classifier over one window of candles.
///
/// Contributions: EMA stacking (±1..5), price vs moving averages (±2), swing
/// sequence HH/HL vs LH/LL (±3..4), RSI zone (±1..2), MACD (±1..2) and
/// candle-color dominance (±2). Direction goes neutral below an absolute
/// score of 3.
pub fn classify_trend(candles: &[Candle], config: &AdvisorConfig) -> TrendAssessment {
    if candles.len() < 10 {
        return TrendAssessment::neutral();
    }

    let ind = IndicatorSet::compute(candles, config.atr_floor);
    let close = candles.last().unwrap().close;

    let mut score = 0;
    let mut signals = Vec::new();
    let add = |pts: i32, label: &str, signals: &mut Vec<String>| {
        signals.push(format!("{} {:+}", label, pts));
        pts
    };

    // EMA stacking.
    if ind.ema_9 > ind.ema_21 && ind.ema_21 > ind.ema_50 && ind.ema_50 > ind.ema_200 {
        score += add(5, "full bullish EMA stack", &mut signals);
    } else if ind.ema_9 < ind.ema_21 && ind.ema_21 < ind.ema_50 && ind.ema_50 < ind.ema_200 {
        score += add(-5, "full bearish EMA stack", &mut signals);
    } else if ind.ema_9 > ind.ema_21 && ind.ema_21 > ind.ema_50 {
        score += add(3, "partial bullish EMA stack", &mut signals);
    } else if ind.ema_9 < ind.ema_21 && ind.ema_21 < ind.ema_50 {
        score += add(-3, "partial bearish EMA stack", &mut signals);
    } else if ind.ema_9 > ind.ema_21 {
        score += add(1, "fast EMA above slow", &mut signals);
    } else if ind.ema_9 < ind.ema_21 {
        score += add(-1, "fast EMA below slow", &mut signals);
    }

    // Price relative to the moving averages.
    if close > ind.sma_20 && close > ind.sma_50 {
        score += add(2, "price above MAs", &mut signals);
    } else if close < ind.sma_20 && close < ind.sma_50 {
        score += add(-2, "price below MAs", &mut signals);
    }

    // Swing sequence.
    let highs = swings::swing_highs(candles, SEQUENCE_SWING_WINDOW);
    let lows = swings::swing_lows(candles, SEQUENCE_SWING_WINDOW);
    let higher_highs = rising(&highs);
    let higher_lows = rising(&lows);
    let lower_highs = falling(&highs);
    let lower_lows = falling(&lows);
    if higher_highs && higher_lows {
        score += add(4, "higher highs and higher lows", &mut signals);
    } else if higher_highs || higher_lows {
        score += add(3, "partial bullish swing sequence", &mut signals);
    }
    if lower_highs && lower_lows {
        score += add(-4, "lower highs and lower lows", &mut signals);
    } else if lower_highs || lower_lows {
        score += add(-3, "partial bearish swing sequence", &mut signals);
    }

    // RSI zone.
    if ind.rsi > config.rsi_bull_threshold + 10.0 {
        score += add(2, "RSI strongly bullish", &mut signals);
    } else if ind.rsi > config.rsi_bull_threshold {
        score += add(1, "RSI bullish", &mut signals);
    } else if ind.rsi < config.rsi_bear_threshold - 10.0 {
        score += add(-2, "RSI strongly bearish", &mut signals);
    } else if ind.rsi < config.rsi_bear_threshold {
        score += add(-1, "RSI bearish", &mut signals);
    }

    // MACD.
    if ind.macd > ind.macd_signal && ind.macd > 0.0 {
        score += add(2, "MACD positive and above signal", &mut signals);
    } else if ind.macd_histogram > 0.0 {
        score += add(1, "MACD histogram positive", &mut signals);
    } else if ind.macd < ind.macd_signal && ind.macd < 0.0 {
        score += add(-2, "MACD negative and below signal", &mut signals);
    } else if ind.macd_histogram < 0.0 {
        score += add(-1, "MACD histogram negative", &mut signals);
    }

    // Candle-color dominance over the recent tape.
    let tail = &candles[candles.len().saturating_sub(DOMINANCE_LOOKBACK)..];
    let bullish = tail.iter().filter(|c| c.is_bullish()).count();
    if bullish >= 7 {
        score += add(2, "bullish candle dominance", &mut signals);
    } else if tail.len() - bullish >= 7 {
        score += add(-2, "bearish candle dominance", &mut signals);
    }

    let direction = if score >= 3 {
        TrendDirection::Bullish
    } else if score <= -3 {
        TrendDirection::Bearish
    } else {
        TrendDirection::Neutral
    };

    TrendAssessment {
        direction,
        strength: TrendStrength::from_score(score),
        score,
        signals,
    }
}

/// Agreement between two trend windows, [0, 1].
pub fn alignment(micro: &TrendAssessment, macro_: &TrendAssessment) -> f64 {
    use TrendDirection::*;
    match (micro.direction, macro_.direction) {
        (Bullish, Bullish) | (Bearish, Bearish) => 1.0,
        (Neutral, Neutral) => 0.3,
        (Bullish, Bearish) | (Bearish, Bullish) => 0.0,
        _ => 0.5,
    }
}

fn rising(points: &[swings::SwingPoint]) -> bool {
    points
        .windows(2)
        .last()
        .map(|w| w[1].price > w[0].price)
        .unwrap_or(false)
}

fn falling(points: &[swings::SwingPoint]) -> bool {
    points
        .windows(2)
        .last()
        .map(|w| w[1].price < w[0].price)
        .unwrap_or(false)
}
