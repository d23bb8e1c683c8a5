use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV candle. Sequences are ordered oldest to newest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Absolute distance between open and close.
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// Full high-to-low extent.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// True when high/low enclose open/close and all fields are finite.
    pub fn is_well_formed(&self) -> bool {
        let finite = [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|v| v.is_finite());
        finite
            && self.high >= self.open.max(self.close)
            && self.low <= self.open.min(self.close)
    }
}

/// Signal direction emitted by the confluence scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Buy,
    Sell,
    NoTrade,
}

impl Direction {
    pub fn is_trade(&self) -> bool {
        !matches!(self, Direction::NoTrade)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Direction::Buy => "Buy",
            Direction::Sell => "Sell",
            Direction::NoTrade => "No Trade",
        }
    }
}

/// Trend direction over a given window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendDirection {
    Bullish,
    Bearish,
    Neutral,
}

impl TrendDirection {
    pub fn label(&self) -> &'static str {
        match self {
            TrendDirection::Bullish => "Bullish",
            TrendDirection::Bearish => "Bearish",
            TrendDirection::Neutral => "Neutral",
        }
    }
}

/// Trend strength bucket derived from the absolute trend score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TrendStrength {
    None,
    Weak,
    Moderate,
    Strong,
    VeryStrong,
}

impl TrendStrength {
    /// Bucket an absolute trend score.
    pub fn from_score(score: i32) -> Self {
        match score.abs() {
            0 => TrendStrength::None,
            1..=2 => TrendStrength::Weak,
            3..=5 => TrendStrength::Moderate,
            6..=9 => TrendStrength::Strong,
            _ => TrendStrength::VeryStrong,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TrendStrength::None => "None",
            TrendStrength::Weak => "Weak",
            TrendStrength::Moderate => "Moderate",
            TrendStrength::Strong => "Strong",
            TrendStrength::VeryStrong => "Very Strong",
        }
    }
}

/// Trading horizon. Structure windows, stop multipliers and stability
/// thresholds are all tuned per mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradingMode {
    Intraday,
    Swing,
}

impl TradingMode {
    /// Symmetric window used for swing-point detection.
    pub fn swing_window(&self) -> usize {
        match self {
            TradingMode::Intraday => 5,
            TradingMode::Swing => 10,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TradingMode::Intraday => "Intraday",
            TradingMode::Swing => "Swing",
        }
    }

    pub fn all() -> [TradingMode; 2] {
        [TradingMode::Intraday, TradingMode::Swing]
    }
}

/// Market phase classification, drives the risk:reward table and the
/// ranging-market master filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketPhase {
    Trending,
    Ranging,
    Volatile,
    Quiet,
}

impl MarketPhase {
    pub fn label(&self) -> &'static str {
        match self {
            MarketPhase::Trending => "Trending",
            MarketPhase::Ranging => "Ranging",
            MarketPhase::Volatile => "Volatile",
            MarketPhase::Quiet => "Quiet",
        }
    }
}

/// Trade quality tier assigned by the Bayesian engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QualityTier {
    Poor,
    Acceptable,
    Good,
    Excellent,
}

impl QualityTier {
    pub fn label(&self) -> &'static str {
        match self {
            QualityTier::Excellent => "Excellent",
            QualityTier::Good => "Good",
            QualityTier::Acceptable => "Acceptable",
            QualityTier::Poor => "Poor",
        }
    }
}

/// Final action recommended to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeAction {
    Execute,
    Wait,
    Abort,
}

impl TradeAction {
    pub fn label(&self) -> &'static str {
        match self {
            TradeAction::Execute => "Execute",
            TradeAction::Wait => "Wait",
            TradeAction::Abort => "Abort",
        }
    }
}

/// Coarse risk bucket derived from the chaos risk level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    Elevated,
    Extreme,
}

impl RiskLevel {
    pub fn from_chaos(chaos: f64) -> Self {
        match chaos {
            c if c > 0.8 => RiskLevel::Extreme,
            c if c > 0.6 => RiskLevel::Elevated,
            c if c > 0.35 => RiskLevel::Moderate,
            _ => RiskLevel::Low,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Moderate => "Moderate",
            RiskLevel::Elevated => "Elevated",
            RiskLevel::Extreme => "Extreme",
        }
    }
}

/// Raw directional signal produced by the confluence scorer.
///
/// `raw_confidence` is on a 0-100 point scale (the winning confluence score);
/// downstream probabilities are on [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSignal {
    pub direction: Direction,
    pub entry: f64,
    pub stop_loss: f64,
    /// Laddered targets, nearest first. Empty for NoTrade.
    pub take_profits: Vec<f64>,
    pub raw_confidence: f64,
    pub reason: String,
}

impl RawSignal {
    /// Neutral signal used when a stage degrades below its data minimum.
    pub fn no_trade(reason: impl Into<String>) -> Self {
        Self {
            direction: Direction::NoTrade,
            entry: 0.0,
            stop_loss: 0.0,
            take_profits: Vec::new(),
            raw_confidence: 0.0,
            reason: reason.into(),
        }
    }

    /// Distance between entry and stop, in price units.
    pub fn risk_per_unit(&self) -> f64 {
        (self.entry - self.stop_loss).abs()
    }

    /// Final (furthest) take-profit, if any.
    pub fn final_target(&self) -> Option<f64> {
        self.take_profits.last().copied()
    }
}

/// Final vetted recommendation for one analysis cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeDecision {
    pub action: TradeAction,
    /// Calibrated confidence from the Bayesian engine, [0, 1].
    pub confidence: f64,
    /// Recommended fraction of capital, [0.005, 0.10] when trading.
    pub position_size: f64,
    pub risk_level: RiskLevel,
    /// Single health metric, 0-10.
    pub quality_score: f64,
    pub reasons: Vec<String>,
}

/// Account context supplied by the caller alongside the candle history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountProfile {
    pub balance: f64,
    /// Base risk per trade as a fraction of capital (e.g. 0.05 = 5%).
    pub risk_percent: f64,
}

impl Default for AccountProfile {
    fn default() -> Self {
        Self {
            balance: 10_000.0,
            risk_percent: 0.05,
        }
    }
}
