use advisor_core::{
    AdvisorConfig, AdvisorError, Candle, Direction, MarketPhase, RawSignal, TradingMode,
    TrendDirection,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::MarketView;

/// Point totals accumulated for each side, with an audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfluenceBreakdown {
    pub bullish: f64,
    pub bearish: f64,
    pub notes: Vec<String>,
}

/// Volume-profile value above which the latest candle counts as confirmed
/// by participation (ratio > 1.2x the 20-period average).
const VOLUME_CONFIRMATION: f64 = 0.6;

/// Accumulate bullish/bearish confluence points from the market view.
///
/// Point weights: multi-timeframe alignment 25, structure 25, EMA alignment
/// 15, MACD 15, RSI zone 10, volume confirmation 10.
pub fn score_confluence(view: &MarketView, config: &AdvisorConfig) -> ConfluenceBreakdown {
    let mut bullish = 0.0;
    let mut bearish = 0.0;
    let mut notes = Vec::new();

    // Multi-timeframe alignment.
    match (view.micro_trend.direction, view.macro_trend.direction) {
        (TrendDirection::Bullish, TrendDirection::Bullish) => {
            bullish += 25.0;
            notes.push("micro and macro trend aligned bullish".to_string());
        }
        (TrendDirection::Bearish, TrendDirection::Bearish) => {
            bearish += 25.0;
            notes.push("micro and macro trend aligned bearish".to_string());
        }
        (TrendDirection::Bullish, _) | (_, TrendDirection::Bullish) => {
            bullish += 10.0;
            notes.push("single-timeframe bullish trend".to_string());
        }
        (TrendDirection::Bearish, _) | (_, TrendDirection::Bearish) => {
            bearish += 10.0;
            notes.push("single-timeframe bearish trend".to_string());
        }
        _ => {}
    }

    // Structure / smart-money evidence.
    let structure_bull = view.structure.bullish_score() * 25.0;
    let structure_bear = view.structure.bearish_score() * 25.0;
    bullish += structure_bull;
    bearish += structure_bear;
    if structure_bull >= structure_bear + 5.0 {
        notes.push("structure favors the bull side".to_string());
    } else if structure_bear >= structure_bull + 5.0 {
        notes.push("structure favors the bear side".to_string());
    }

    // EMA alignment.
    let ind = &view.indicators;
    if ind.ema_9 > ind.ema_21 && ind.ema_21 > ind.ema_50 {
        bullish += 15.0;
        notes.push("EMAs stacked bullish".to_string());
    } else if ind.ema_9 < ind.ema_21 && ind.ema_21 < ind.ema_50 {
        bearish += 15.0;
        notes.push("EMAs stacked bearish".to_string());
    } else if ind.ema_9 > ind.ema_21 {
        bullish += 8.0;
    } else if ind.ema_9 < ind.ema_21 {
        bearish += 8.0;
    }

    // MACD.
    if ind.macd_histogram > 0.0 {
        bullish += 10.0;
    } else if ind.macd_histogram < 0.0 {
        bearish += 10.0;
    }
    if ind.macd > ind.macd_signal {
        bullish += 5.0;
    } else if ind.macd < ind.macd_signal {
        bearish += 5.0;
    }

    // RSI zone.
    if ind.rsi > config.rsi_bull_threshold {
        bullish += 10.0;
    } else if ind.rsi < config.rsi_bear_threshold {
        bearish += 10.0;
    }

    // Volume confirmation goes to the side of the latest candle.
    if view.volume_profile > VOLUME_CONFIRMATION {
        if view.momentum >= 0.0 {
            bullish += 10.0;
            notes.push("volume confirms the advance".to_string());
        } else {
            bearish += 10.0;
            notes.push("volume confirms the decline".to_string());
        }
    }

    ConfluenceBreakdown {
        bullish,
        bearish,
        notes,
    }
}

/// Run the master filters and, if they pass, turn confluence points into a
/// directional signal with ATR-derived stop and laddered targets.
pub fn generate_signal(
    view: &MarketView,
    candles: &[Candle],
    mode: TradingMode,
    config: &AdvisorConfig,
) -> RawSignal {
    if candles.len() < crate::MIN_CANDLES {
        let err = AdvisorError::InsufficientData(format!(
            "{} candles, need {}",
            candles.len(),
            crate::MIN_CANDLES
        ));
        return RawSignal::no_trade(err.to_string());
    }

    // Master filters: each one is a hard gate.
    if view.micro_trend.score.abs() < config.min_trend_score
        && view.macro_trend.score.abs() < config.min_trend_score
    {
        return RawSignal::no_trade(format!(
            "trend too weak (micro {:+}, macro {:+})",
            view.micro_trend.score, view.macro_trend.score
        ));
    }
    let rsi = view.indicators.rsi;
    if rsi > config.rsi_extreme_high || rsi < config.rsi_extreme_low {
        return RawSignal::no_trade(format!("RSI {:.1} beyond tradable extremes", rsi));
    }
    if view.phase.phase == MarketPhase::Ranging {
        return RawSignal::no_trade("ranging phase, no directional edge");
    }
    let quality = view.structure.quality();
    if quality < config.min_structure_quality {
        return RawSignal::no_trade(format!(
            "structure quality {:.2} below minimum {:.2}",
            quality, config.min_structure_quality
        ));
    }

    let breakdown = score_confluence(view, config);
    debug!(
        bullish = breakdown.bullish,
        bearish = breakdown.bearish,
        "confluence scored"
    );

    // An ambiguous read is never traded.
    let direction = if breakdown.bullish > breakdown.bearish {
        Direction::Buy
    } else if breakdown.bearish > breakdown.bullish {
        Direction::Sell
    } else {
        return RawSignal::no_trade(format!(
            "bullish and bearish confluence tied at {:.0}",
            breakdown.bullish
        ));
    };

    let winning = breakdown.bullish.max(breakdown.bearish);
    if winning < config.min_confluence_score {
        return RawSignal::no_trade(format!(
            "confluence {:.0} below minimum {:.0}",
            winning, config.min_confluence_score
        ));
    }

    let entry = candles.last().unwrap().close;
    let stop_distance = view.indicators.atr * config.stop_multiplier(mode);
    let risk_reward = config.risk_reward_for(view.phase.phase);

    let (stop_loss, take_profits) = match direction {
        Direction::Buy => {
            let tp1 = entry + stop_distance;
            let tp2 = entry + stop_distance * risk_reward;
            (entry - stop_distance, ladder(tp1, tp2))
        }
        Direction::Sell => {
            let tp1 = entry - stop_distance;
            let tp2 = entry - stop_distance * risk_reward;
            (entry + stop_distance, ladder(tp1, tp2))
        }
        Direction::NoTrade => unreachable!(),
    };

    let reason = format!(
        "{} confluence {:.0} vs {:.0} in {} phase: {}",
        direction.label(),
        breakdown.bullish,
        breakdown.bearish,
        view.phase.phase.label(),
        breakdown.notes.join("; ")
    );

    RawSignal {
        direction,
        entry,
        stop_loss,
        take_profits,
        raw_confidence: winning.clamp(0.0, 100.0),
        reason,
    }
}

fn ladder(tp1: f64, tp2: f64) -> Vec<f64> {
    if (tp1 - tp2).abs() < f64::EPSILON {
        vec![tp1]
    } else {
        vec![tp1, tp2]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisor_core::Candle;
    use chrono::Utc;

    /// Uptrend in 12-candle waves: nine advancing candles then a three-candle
    /// pullback, with deterministic jitter so no two extremes tie. RSI lands
    /// in the 60s instead of pinning at 100 and the pullbacks leave real
    /// swing structure behind.
    pub fn scenario_uptrend(n: usize) -> Vec<Candle> {
        wave_tape(n, 1.0)
    }

    pub fn scenario_downtrend(n: usize) -> Vec<Candle> {
        wave_tape(n, -1.0)
    }

    fn wave_tape(n: usize, sign: f64) -> Vec<Candle> {
        let mut close = 2_600.0;
        (0..n)
            .map(|i| {
                let pos = i % 12;
                let step = if (4..=6).contains(&pos) {
                    -sign * (3.0 + 0.1 * (i % 5) as f64)
                } else {
                    sign * (2.0 + 0.1 * (i % 7) as f64)
                };
                let open = close;
                close += step;
                let volume = if i == n - 1 {
                    4_000.0
                } else {
                    1_400.0 + 20.0 * (i % 9) as f64
                };
                Candle {
                    timestamp: Utc::now() - chrono::Duration::minutes(((n - i) * 15) as i64),
                    open,
                    // Jittered wicks keep extremes distinct so strict swing
                    // detection sees real structure.
                    high: open.max(close) + 0.5 + 0.05 * (i % 3) as f64,
                    low: open.min(close) - 0.5 - 0.05 * (i % 4) as f64,
                    close,
                    volume,
                }
            })
            .collect()
    }

    fn signal_for(candles: &[Candle], mode: TradingMode) -> (RawSignal, MarketView) {
        let config = AdvisorConfig::default();
        let view = MarketView::assemble(candles, mode, &config);
        let signal = generate_signal(&view, candles, mode, &config);
        (signal, view)
    }

    #[test]
    fn clean_uptrend_emits_buy_with_ordered_levels() {
        let candles = scenario_uptrend(300);
        let (signal, view) = signal_for(&candles, TradingMode::Intraday);
        assert_eq!(signal.direction, Direction::Buy, "reason: {}", signal.reason);
        assert!(view.indicators.rsi > 50.0 && view.indicators.rsi < 80.0);
        assert!(signal.stop_loss < signal.entry);
        assert!(!signal.take_profits.is_empty());
        for &tp in &signal.take_profits {
            assert!(tp > signal.entry);
        }
        assert!(signal.raw_confidence >= 65.0);
    }

    #[test]
    fn sell_levels_are_mirrored() {
        let candles = scenario_downtrend(300);
        let (signal, _) = signal_for(&candles, TradingMode::Intraday);
        assert_eq!(
            signal.direction,
            Direction::Sell,
            "reason: {}",
            signal.reason
        );
        assert!(signal.stop_loss > signal.entry);
        for &tp in &signal.take_profits {
            assert!(tp < signal.entry);
        }
    }

    #[test]
    fn short_history_degrades_to_no_trade() {
        let candles = scenario_uptrend(30);
        let (signal, _) = signal_for(&candles, TradingMode::Intraday);
        assert_eq!(signal.direction, Direction::NoTrade);
        assert!(signal.reason.contains("Insufficient data"));
    }

    #[test]
    fn ranging_phase_is_filtered() {
        let candles = scenario_uptrend(300);
        let config = AdvisorConfig::default();
        let mut view = MarketView::assemble(&candles, TradingMode::Intraday, &config);
        view.phase.phase = MarketPhase::Ranging;
        let signal = generate_signal(&view, &candles, TradingMode::Intraday, &config);
        assert_eq!(signal.direction, Direction::NoTrade);
        assert!(signal.reason.contains("ranging"));
    }

    #[test]
    fn extreme_rsi_is_filtered() {
        let candles = scenario_uptrend(300);
        let config = AdvisorConfig::default();
        let mut view = MarketView::assemble(&candles, TradingMode::Intraday, &config);
        view.indicators.rsi = 91.0;
        let signal = generate_signal(&view, &candles, TradingMode::Intraday, &config);
        assert_eq!(signal.direction, Direction::NoTrade);
        assert!(signal.reason.contains("RSI"));
    }

    #[test]
    fn weak_structure_is_filtered() {
        let candles = scenario_uptrend(300);
        let mut config = AdvisorConfig::default();
        config.min_structure_quality = 1.0; // impossible bar to clear
        let view = MarketView::assemble(&candles, TradingMode::Intraday, &config);
        let signal = generate_signal(&view, &candles, TradingMode::Intraday, &config);
        assert_eq!(signal.direction, Direction::NoTrade);
        assert!(signal.reason.contains("structure quality"));
    }

    #[test]
    fn stop_distance_scales_with_mode() {
        let candles = scenario_uptrend(300);
        let mut config = AdvisorConfig::default();
        // Structure quality varies with the swing window; pin the filter so
        // both modes reach signal generation.
        config.min_structure_quality = 0.0;
        let view_i = MarketView::assemble(&candles, TradingMode::Intraday, &config);
        let view_s = MarketView::assemble(&candles, TradingMode::Swing, &config);
        let intraday = generate_signal(&view_i, &candles, TradingMode::Intraday, &config);
        let swing = generate_signal(&view_s, &candles, TradingMode::Swing, &config);
        assert!(intraday.direction.is_trade());
        assert!(swing.direction.is_trade());
        assert!(swing.risk_per_unit() > intraday.risk_per_unit());
    }

    #[test]
    fn idempotent_signal_generation() {
        let candles = scenario_uptrend(300);
        let (a, _) = signal_for(&candles, TradingMode::Intraday);
        let (b, _) = signal_for(&candles, TradingMode::Intraday);
        assert_eq!(a, b);
    }
}
