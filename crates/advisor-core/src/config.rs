use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::AdvisorError;
use crate::types::{MarketPhase, TradingMode};

/// Hysteresis thresholds for one trading mode.
///
/// The source system shipped two independently-tuned variants of these
/// thresholds; both are exposed here as named constructors instead of
/// hard-coding either set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilityConfig {
    /// Minimum age before a cached signal may be replaced on staleness alone.
    pub min_age_secs: i64,
    /// Price displacement (fraction of cached price) that unlocks replacement.
    pub price_threshold_pct: f64,
    /// Confidence drop (points, 0-100 scale) that unlocks replacement.
    pub confidence_drop: f64,
}

impl StabilityConfig {
    /// Tight variant: replace on small displacements (0.1% / 0.3%).
    pub fn tight(mode: TradingMode) -> Self {
        match mode {
            TradingMode::Intraday => Self {
                min_age_secs: 15 * 60,
                price_threshold_pct: 0.001,
                confidence_drop: 15.0,
            },
            TradingMode::Swing => Self {
                min_age_secs: 4 * 60 * 60,
                price_threshold_pct: 0.003,
                confidence_drop: 15.0,
            },
        }
    }

    /// Loose variant: hold signals through larger displacements (0.5% / 1.0%).
    pub fn loose(mode: TradingMode) -> Self {
        match mode {
            TradingMode::Intraday => Self {
                min_age_secs: 15 * 60,
                price_threshold_pct: 0.005,
                confidence_drop: 20.0,
            },
            TradingMode::Swing => Self {
                min_age_secs: 4 * 60 * 60,
                price_threshold_pct: 0.010,
                confidence_drop: 20.0,
            },
        }
    }
}

/// Tunable parameters recognized by the pipeline.
///
/// Every field has a serde default so partial configuration files deserialize
/// cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisorConfig {
    /// ATR multiple for intraday stops.
    #[serde(default = "default_stop_multiplier_short")]
    pub stop_multiplier_short: f64,

    /// ATR multiple for swing stops.
    #[serde(default = "default_stop_multiplier_long")]
    pub stop_multiplier_long: f64,

    /// Risk:reward target per detected market phase.
    #[serde(default = "default_risk_reward_table")]
    pub risk_reward_table: HashMap<MarketPhase, f64>,

    /// Minimum winning confluence score (0-100) required to emit Buy/Sell.
    #[serde(default = "default_min_confluence_score")]
    pub min_confluence_score: f64,

    /// Chaos risk above which the decision engine aborts unconditionally.
    #[serde(default = "default_chaos_abort_threshold")]
    pub chaos_abort_threshold: f64,

    #[serde(default = "default_stability_intraday")]
    pub stability_intraday: StabilityConfig,

    #[serde(default = "default_stability_swing")]
    pub stability_swing: StabilityConfig,

    #[serde(default = "default_max_position_percent")]
    pub max_position_percent: f64,

    #[serde(default = "default_min_position_percent")]
    pub min_position_percent: f64,

    /// Minimum ATR in price units. Keeps stops away from zero in dead tape.
    #[serde(default = "default_atr_floor")]
    pub atr_floor: f64,

    /// Instrument constant converting dollar exposure to lots.
    #[serde(default = "default_dollars_per_lot")]
    pub dollars_per_lot: f64,

    /// RSI above this supports the bull case.
    #[serde(default = "default_rsi_bull_threshold")]
    pub rsi_bull_threshold: f64,

    /// RSI below this supports the bear case.
    #[serde(default = "default_rsi_bear_threshold")]
    pub rsi_bear_threshold: f64,

    /// Buys are filtered out above this RSI, sells below the mirror value.
    #[serde(default = "default_rsi_extreme_high")]
    pub rsi_extreme_high: f64,

    #[serde(default = "default_rsi_extreme_low")]
    pub rsi_extreme_low: f64,

    /// Minimum absolute trend score required by the confluence master filter.
    #[serde(default = "default_min_trend_score")]
    pub min_trend_score: i32,

    /// Minimum structure quality required by the confluence master filter.
    #[serde(default = "default_min_structure_quality")]
    pub min_structure_quality: f64,
}

fn default_stop_multiplier_short() -> f64 {
    1.5
}
fn default_stop_multiplier_long() -> f64 {
    3.0
}
fn default_risk_reward_table() -> HashMap<MarketPhase, f64> {
    HashMap::from([
        (MarketPhase::Trending, 3.0),
        (MarketPhase::Ranging, 1.5),
        (MarketPhase::Volatile, 2.0),
        (MarketPhase::Quiet, 2.5),
    ])
}
fn default_min_confluence_score() -> f64 {
    65.0
}
fn default_chaos_abort_threshold() -> f64 {
    0.8
}
fn default_stability_intraday() -> StabilityConfig {
    StabilityConfig::tight(TradingMode::Intraday)
}
fn default_stability_swing() -> StabilityConfig {
    StabilityConfig::tight(TradingMode::Swing)
}
fn default_max_position_percent() -> f64 {
    0.10
}
fn default_min_position_percent() -> f64 {
    0.005
}
fn default_atr_floor() -> f64 {
    5.0
}
fn default_dollars_per_lot() -> f64 {
    1_000.0
}
fn default_rsi_bull_threshold() -> f64 {
    55.0
}
fn default_rsi_bear_threshold() -> f64 {
    45.0
}
fn default_rsi_extreme_high() -> f64 {
    85.0
}
fn default_rsi_extreme_low() -> f64 {
    15.0
}
fn default_min_trend_score() -> i32 {
    3
}
fn default_min_structure_quality() -> f64 {
    0.3
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            stop_multiplier_short: default_stop_multiplier_short(),
            stop_multiplier_long: default_stop_multiplier_long(),
            risk_reward_table: default_risk_reward_table(),
            min_confluence_score: default_min_confluence_score(),
            chaos_abort_threshold: default_chaos_abort_threshold(),
            stability_intraday: default_stability_intraday(),
            stability_swing: default_stability_swing(),
            max_position_percent: default_max_position_percent(),
            min_position_percent: default_min_position_percent(),
            atr_floor: default_atr_floor(),
            dollars_per_lot: default_dollars_per_lot(),
            rsi_bull_threshold: default_rsi_bull_threshold(),
            rsi_bear_threshold: default_rsi_bear_threshold(),
            rsi_extreme_high: default_rsi_extreme_high(),
            rsi_extreme_low: default_rsi_extreme_low(),
            min_trend_score: default_min_trend_score(),
            min_structure_quality: default_min_structure_quality(),
        }
    }
}

impl AdvisorConfig {
    /// Stop multiplier for the given trading mode.
    pub fn stop_multiplier(&self, mode: TradingMode) -> f64 {
        match mode {
            TradingMode::Intraday => self.stop_multiplier_short,
            TradingMode::Swing => self.stop_multiplier_long,
        }
    }

    /// Stability thresholds for the given trading mode.
    pub fn stability(&self, mode: TradingMode) -> &StabilityConfig {
        match mode {
            TradingMode::Intraday => &self.stability_intraday,
            TradingMode::Swing => &self.stability_swing,
        }
    }

    /// Risk:reward target for a phase, falling back to 2.0 for phases
    /// missing from a user-supplied table.
    pub fn risk_reward_for(&self, phase: MarketPhase) -> f64 {
        self.risk_reward_table.get(&phase).copied().unwrap_or(2.0)
    }

    /// Reject configurations the pipeline cannot honor.
    pub fn validate(&self) -> Result<(), AdvisorError> {
        if self.min_position_percent <= 0.0 || self.min_position_percent > self.max_position_percent
        {
            return Err(AdvisorError::InvalidInput(
                "min_position_percent must be > 0 and <= max_position_percent".to_string(),
            ));
        }
        if self.max_position_percent > 1.0 {
            return Err(AdvisorError::InvalidInput(
                "max_position_percent must be at most 1.0".to_string(),
            ));
        }
        if self.stop_multiplier_short <= 0.0 || self.stop_multiplier_long <= 0.0 {
            return Err(AdvisorError::InvalidInput(
                "stop multipliers must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.chaos_abort_threshold) {
            return Err(AdvisorError::InvalidInput(
                "chaos_abort_threshold must be in [0, 1]".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.min_confluence_score) {
            return Err(AdvisorError::InvalidInput(
                "min_confluence_score must be in [0, 100]".to_string(),
            ));
        }
        if self.atr_floor <= 0.0 || self.dollars_per_lot <= 0.0 {
            return Err(AdvisorError::InvalidInput(
                "atr_floor and dollars_per_lot must be positive".to_string(),
            ));
        }
        if self.rsi_extreme_low >= self.rsi_extreme_high {
            return Err(AdvisorError::InvalidInput(
                "rsi_extreme_low must be below rsi_extreme_high".to_string(),
            ));
        }
        Ok(())
    }
}
