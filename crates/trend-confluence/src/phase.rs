use advisor_core::{AdvisorError, Candle, MarketPhase};
use market_indicators::IndicatorSet;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Recent window used when comparing short-run to full-window volatility.
const RECENT_VOL_WINDOW: usize = 10;

/// Phase classification with the metrics that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseAssessment {
    pub phase: MarketPhase,
    /// ATR as a fraction of the last close.
    pub atr_fraction: f64,
    /// Bollinger band width relative to the middle band.
    pub band_width: f64,
    pub adx: f64,
    pub reasoning: String,
}

/// Chaos read: how hostile the current tape is to a fresh position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChaosAssessment {
    /// Composite risk level in [0, 1].
    pub risk_level: f64,
    /// Population standard deviation of single-candle returns.
    pub volatility: f64,
    /// Short-run volatility relative to the full window.
    pub volatility_ratio: f64,
    pub reasons: Vec<String>,
}

/// Classify the market phase from trend strength (ADX), realized range (ATR)
/// and band width.
pub fn assess_phase(candles: &[Candle], indicators: &IndicatorSet) -> PhaseAssessment {
    let last_close = candles.last().map(|c| c.close).unwrap_or(0.0);
    let atr_fraction = if last_close > 0.0 {
        indicators.atr / last_close
    } else {
        0.0
    };
    let band_width = if indicators.bb_middle > 0.0 {
        (indicators.bb_upper - indicators.bb_lower) / indicators.bb_middle
    } else {
        0.0
    };

    let (phase, reasoning) = if atr_fraction > 0.025 {
        (
            MarketPhase::Volatile,
            format!("ATR {:.2}% of price", atr_fraction * 100.0),
        )
    } else if indicators.adx > 25.0 {
        (
            MarketPhase::Trending,
            format!("ADX {:.1} signals a directional market", indicators.adx),
        )
    } else if band_width < 0.015 && indicators.adx < 20.0 {
        (
            MarketPhase::Quiet,
            format!("band width {:.2}% with flat ADX", band_width * 100.0),
        )
    } else {
        (
            MarketPhase::Ranging,
            format!("ADX {:.1} without expansion", indicators.adx),
        )
    };

    PhaseAssessment {
        phase,
        atr_fraction,
        band_width,
        adx: indicators.adx,
        reasoning,
    }
}

/// Compute the chaos risk level in [0, 1].
///
/// Blends short-run volatility expansion, realized range and band width; a
/// quiet tape scores near zero, a disorderly one near one.
pub fn assess_chaos(candles: &[Candle], indicators: &IndicatorSet) -> ChaosAssessment {
    if candles.len() < RECENT_VOL_WINDOW + 2 {
        return ChaosAssessment {
            risk_level: 0.5,
            volatility: 0.0,
            volatility_ratio: 1.0,
            reasons: vec!["insufficient history, assuming moderate chaos".to_string()],
        };
    }

    let returns: Vec<f64> = candles
        .windows(2)
        .filter(|w| w[0].close != 0.0)
        .map(|w| (w[1].close - w[0].close) / w[0].close)
        .collect();

    let full_vol = returns.iter().population_std_dev();
    let recent_vol = returns[returns.len() - RECENT_VOL_WINDOW..]
        .iter()
        .population_std_dev();
    let mut degenerate_note = None;
    let volatility_ratio = if full_vol > 0.0 {
        recent_vol / full_vol
    } else {
        degenerate_note = Some(
            AdvisorError::NumericDegenerate("flat return window, ratio defaulted to 1".to_string())
                .to_string(),
        );
        1.0
    };

    let last_close = candles.last().unwrap().close;
    let atr_fraction = if last_close > 0.0 {
        indicators.atr / last_close
    } else {
        0.0
    };
    let band_width = if indicators.bb_middle > 0.0 {
        (indicators.bb_upper - indicators.bb_lower) / indicators.bb_middle
    } else {
        0.0
    };

    let expansion = ((volatility_ratio - 0.8) / 1.7).clamp(0.0, 1.0);
    let range_pressure = (atr_fraction / 0.03).clamp(0.0, 1.0);
    let width_pressure = (band_width / 0.06).clamp(0.0, 1.0);

    let risk_level = (0.40 * expansion + 0.35 * range_pressure + 0.25 * width_pressure)
        .clamp(0.0, 1.0);

    let mut reasons = Vec::new();
    if expansion > 0.5 {
        reasons.push(format!(
            "short-run volatility {:.1}x the window average",
            volatility_ratio
        ));
    }
    if range_pressure > 0.5 {
        reasons.push(format!("ATR at {:.2}% of price", atr_fraction * 100.0));
    }
    if width_pressure > 0.5 {
        reasons.push(format!("bands {:.1}% wide", band_width * 100.0));
    }
    if let Some(note) = degenerate_note {
        reasons.push(note);
    }
    if reasons.is_empty() {
        reasons.push("volatility within normal bounds".to_string());
    }

    ChaosAssessment {
        risk_level,
        volatility: full_vol,
        volatility_ratio,
        reasons,
    }
}
