use advisor_core::{AccountProfile, AdvisorConfig};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Risk-adjusted position sizing.
///
/// Two models share the same bounds: a multiplicative discount stack
/// (`base * (1-chaos) * posterior^0.8 * (0.5+0.5*confidence) * (1-0.3*vol)`)
/// and a fractional Kelly variant (`f* = (p*b - q) / b`, halved, then
/// chaos- and confidence-discounted). Output is always clamped to
/// `[min_position, max_position]` as a fraction of capital.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionSizer {
    /// Minimum position as a fraction of capital.
    pub min_position: f64,
    /// Maximum position as a fraction of capital.
    pub max_position: f64,
    /// Fractional Kelly multiplier (0.5 = half-Kelly).
    pub kelly_multiplier: f64,
    /// Instrument constant converting dollar exposure to lots.
    pub dollars_per_lot: f64,
}

/// Per-signal sizing context.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SizingInputs {
    /// Posterior success probability, [0, 1].
    pub posterior: f64,
    /// Calibrated confidence level, [0, 1].
    pub confidence: f64,
    /// Chaos risk level, [0, 1].
    pub chaos_risk: f64,
    /// Realized volatility, [0, 1].
    pub volatility: f64,
    /// Risk:reward ratio of the signal, [1, 5].
    pub risk_reward: f64,
}

/// Size classification for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizingTier {
    Micro,
    Conservative,
    Moderate,
    Aggressive,
}

impl SizingTier {
    pub fn label(&self) -> &'static str {
        match self {
            SizingTier::Micro => "Micro",
            SizingTier::Conservative => "Conservative",
            SizingTier::Moderate => "Moderate",
            SizingTier::Aggressive => "Aggressive",
        }
    }
}

/// One named multiplier applied during sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentFactor {
    pub name: String,
    pub multiplier: f64,
}

/// Sizing recommendation with its audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSizeResult {
    /// Fraction of capital, within the configured bounds.
    pub percent_of_capital: f64,
    pub dollar_amount: f64,
    /// Lots at the configured dollars-per-lot divisor, 2 decimals.
    pub lot_size: f64,
    pub tier: SizingTier,
    pub adjustment_factors: Vec<AdjustmentFactor>,
    pub reasons: Vec<String>,
}

impl Default for PositionSizer {
    fn default() -> Self {
        Self {
            min_position: 0.005,
            max_position: 0.10,
            kelly_multiplier: 0.5,
            dollars_per_lot: 1_000.0,
        }
    }
}

impl PositionSizer {
    pub fn new(
        min_position: f64,
        max_position: f64,
        kelly_multiplier: f64,
        dollars_per_lot: f64,
    ) -> Result<Self> {
        if min_position <= 0.0 || min_position > max_position {
            bail!("min_position must be > 0 and <= max_position");
        }
        if max_position > 1.0 {
            bail!("max_position must be at most 1.0");
        }
        if kelly_multiplier <= 0.0 || kelly_multiplier > 1.0 {
            bail!("kelly_multiplier must be between 0 and 1");
        }
        if dollars_per_lot <= 0.0 {
            bail!("dollars_per_lot must be positive");
        }
        Ok(Self {
            min_position,
            max_position,
            kelly_multiplier,
            dollars_per_lot,
        })
    }

    pub fn from_config(config: &AdvisorConfig) -> Self {
        Self {
            min_position: config.min_position_percent,
            max_position: config.max_position_percent,
            kelly_multiplier: 0.5,
            dollars_per_lot: config.dollars_per_lot,
        }
    }

    /// Multiplicative discount model.
    pub fn multiplicative(
        &self,
        inputs: &SizingInputs,
        account: &AccountProfile,
    ) -> PositionSizeResult {
        let factors = vec![
            AdjustmentFactor {
                name: "chaos discount".to_string(),
                multiplier: 1.0 - inputs.chaos_risk.clamp(0.0, 1.0),
            },
            AdjustmentFactor {
                name: "posterior scaling".to_string(),
                multiplier: inputs.posterior.clamp(0.0, 1.0).powf(0.8),
            },
            AdjustmentFactor {
                name: "confidence scaling".to_string(),
                multiplier: 0.5 + 0.5 * inputs.confidence.clamp(0.0, 1.0),
            },
            AdjustmentFactor {
                name: "volatility discount".to_string(),
                multiplier: 1.0 - 0.3 * inputs.volatility.clamp(0.0, 1.0),
            },
        ];

        let raw = factors
            .iter()
            .fold(account.risk_percent, |acc, f| acc * f.multiplier);
        let size = raw.clamp(self.min_position, self.max_position);

        let mut reasons = vec![format!(
            "base risk {:.2}% scaled to {:.2}%",
            account.risk_percent * 100.0,
            size * 100.0
        )];
        if let Some(dominant) = factors
            .iter()
            .min_by(|a, b| a.multiplier.partial_cmp(&b.multiplier).unwrap())
        {
            reasons.push(format!(
                "{} dominated sizing (x{:.2})",
                dominant.name, dominant.multiplier
            ));
        }

        self.finish(size, inputs, account, factors, reasons)
    }

    /// Fractional Kelly model using the posterior as win probability and the
    /// signal's risk:reward as the payoff ratio.
    pub fn half_kelly(&self, inputs: &SizingInputs, account: &AccountProfile) -> PositionSizeResult {
        let p = inputs.posterior.clamp(0.0, 1.0);
        let b = inputs.risk_reward.max(1.0);
        let kelly = (p * b - (1.0 - p)) / b;

        if kelly <= 0.0 {
            let reasons = vec![format!(
                "no positive edge (kelly {:.3}), using minimum position",
                kelly
            )];
            return self.finish(self.min_position, inputs, account, vec![], reasons);
        }

        let factors = vec![
            AdjustmentFactor {
                name: "fractional kelly".to_string(),
                multiplier: self.kelly_multiplier,
            },
            AdjustmentFactor {
                name: "chaos discount".to_string(),
                multiplier: 1.0 - inputs.chaos_risk.clamp(0.0, 1.0),
            },
            AdjustmentFactor {
                name: "confidence scaling".to_string(),
                multiplier: 0.5 + 0.5 * inputs.confidence.clamp(0.0, 1.0),
            },
        ];
        let raw = factors.iter().fold(kelly, |acc, f| acc * f.multiplier);
        let size = raw.clamp(self.min_position, self.max_position);

        let reasons = vec![format!(
            "kelly {:.2}% (p {:.0}%, b {:.2}) scaled to {:.2}%",
            kelly * 100.0,
            p * 100.0,
            b,
            size * 100.0
        )];

        self.finish(size, inputs, account, factors, reasons)
    }

    fn finish(
        &self,
        size: f64,
        inputs: &SizingInputs,
        account: &AccountProfile,
        adjustment_factors: Vec<AdjustmentFactor>,
        mut reasons: Vec<String>,
    ) -> PositionSizeResult {
        let tier = classify_tier(size, inputs.posterior, inputs.chaos_risk);
        reasons.push(format!("{} tier", tier.label()));

        let dollar_amount = size * account.balance;
        let lot_size = (dollar_amount / self.dollars_per_lot * 100.0).round() / 100.0;

        PositionSizeResult {
            percent_of_capital: size,
            dollar_amount,
            lot_size,
            tier,
            adjustment_factors,
            reasons,
        }
    }
}

/// Tier rules: chaos dominates, then posterior and the realized size.
fn classify_tier(size: f64, posterior: f64, chaos: f64) -> SizingTier {
    if chaos > 0.7 {
        SizingTier::Micro
    } else if chaos > 0.5 || posterior < 0.6 {
        SizingTier::Conservative
    } else if size >= 0.04 && posterior > 0.75 {
        SizingTier::Aggressive
    } else if size >= 0.025 {
        SizingTier::Moderate
    } else {
        SizingTier::Conservative
    }
}
