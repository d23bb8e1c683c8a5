use advisor_core::QualityTier;
use serde::{Deserialize, Serialize};

/// Bayesian confidence engine.
///
/// Converts a raw directional signal and its market context into a posterior
/// success probability via `posterior = likelihood * prior / evidence`, with
/// every term clamped to its documented range so downstream consumers can
/// rely on the numeric contracts:
/// prior, likelihood, evidence, posterior, confidence in [0, 1];
/// risk:reward in [1, 5].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BayesianInputs {
    /// Strength of the raw signal, [0, 1].
    pub signal_strength: f64,
    /// Signed trend strength, [-1, 1].
    pub trend_strength: f64,
    /// Signed momentum, [-1, 1].
    pub momentum: f64,
    /// Realized volatility, [0, 1].
    pub volatility: f64,
    /// Volume participation, [0, 1].
    pub volume_profile: f64,
    /// Micro/macro timeframe agreement, [0, 1].
    pub timeframe_alignment: f64,
    /// Structure detector quality, [0, 1].
    pub structure_quality: f64,
    /// Chaos risk level, [0, 1].
    pub chaos_risk: f64,
}

impl BayesianInputs {
    /// Clamp every factor to its documented domain.
    fn normalized(&self) -> Self {
        Self {
            signal_strength: self.signal_strength.clamp(0.0, 1.0),
            trend_strength: self.trend_strength.clamp(-1.0, 1.0),
            momentum: self.momentum.clamp(-1.0, 1.0),
            volatility: self.volatility.clamp(0.0, 1.0),
            volume_profile: self.volume_profile.clamp(0.0, 1.0),
            timeframe_alignment: self.timeframe_alignment.clamp(0.0, 1.0),
            structure_quality: self.structure_quality.clamp(0.0, 1.0),
            chaos_risk: self.chaos_risk.clamp(0.0, 1.0),
        }
    }
}

/// Posterior analysis of one signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BayesianAnalysis {
    pub prior: f64,
    pub likelihood: f64,
    pub evidence: f64,
    pub posterior: f64,
    pub expected_return: f64,
    pub risk_reward_ratio: f64,
    pub confidence_level: f64,
    pub quality_tier: QualityTier,
}

const PRIOR_FLOOR: f64 = 0.30;
const PRIOR_CAP: f64 = 0.80;
const LIKELIHOOD_CAP: f64 = 0.95;
/// Evidence is floored before division to keep the posterior finite.
const EVIDENCE_FLOOR: f64 = 0.10;

/// Run the full Bayesian update.
pub fn analyze(inputs: &BayesianInputs) -> BayesianAnalysis {
    let x = inputs.normalized();

    // 1. Prior: directional lean from trend and momentum around a 0.5 base.
    let prior = (0.5 + 0.15 * x.trend_strength + 0.10 * x.momentum).clamp(PRIOR_FLOOR, PRIOR_CAP);

    // 2. Likelihood: weighted vote of the confirming factors.
    let trend_momentum = agreement(x.trend_strength, x.momentum);
    let likelihood = (0.25 * x.signal_strength
        + 0.20 * trend_momentum
        + 0.15 * x.volume_profile
        + 0.15 * x.timeframe_alignment
        + 0.15 * x.structure_quality
        + 0.10 * (1.0 - x.chaos_risk))
        .min(LIKELIHOOD_CAP);

    // 3. Evidence over all seven observable factors.
    let evidence = (0.20 * x.signal_strength
        + 0.15 * x.trend_strength.abs()
        + 0.15 * x.momentum.abs()
        + 0.10 * x.volatility
        + 0.15 * x.volume_profile
        + 0.15 * x.timeframe_alignment
        + 0.10 * x.structure_quality)
        .max(EVIDENCE_FLOOR);

    // 4. Posterior.
    let posterior = (likelihood * prior / evidence).clamp(0.0, 1.0);

    // 5. Expected return: payoff scales with how much the market is moving.
    let avg_win =
        0.02 + 0.03 * x.trend_strength.abs() + 0.02 * x.momentum.abs() + 0.01 * x.volatility;
    let avg_loss = 0.015 + 0.010 * x.volatility;
    let expected_return = posterior * avg_win - (1.0 - posterior) * avg_loss;

    // 6. Risk:reward.
    let risk_reward_ratio = (2.0 + (posterior - 0.5) * 4.0 - x.chaos_risk * 1.5
        + x.trend_strength.abs()
        + x.volatility * 0.5)
        .clamp(1.0, 5.0);

    // 7. Blended confidence level.
    let confidence_level = (0.40 * posterior
        + 0.25 * likelihood
        + 0.15 * evidence
        + 0.10 * x.signal_strength
        + 0.10 * x.timeframe_alignment)
        .clamp(0.0, 1.0);

    let quality_tier = quality_tier(posterior, risk_reward_ratio, x.chaos_risk, confidence_level);

    BayesianAnalysis {
        prior,
        likelihood,
        evidence,
        posterior,
        expected_return,
        risk_reward_ratio,
        confidence_level,
        quality_tier,
    }
}

/// Agreement between two signed factors: strong when they point the same
/// way, heavily discounted when they conflict.
fn agreement(a: f64, b: f64) -> f64 {
    let magnitude = (a.abs() + b.abs()) / 2.0;
    if a * b >= 0.0 {
        magnitude
    } else {
        magnitude / 4.0
    }
}

/// Tier rules, checked strongest first.
pub fn quality_tier(posterior: f64, risk_reward: f64, chaos: f64, confidence: f64) -> QualityTier {
    if posterior > 0.75 && risk_reward > 2.5 && chaos < 0.3 && confidence > 0.75 {
        QualityTier::Excellent
    } else if posterior > 0.65 && risk_reward > 2.0 && chaos < 0.5 && confidence > 0.65 {
        QualityTier::Good
    } else if posterior > 0.55 && risk_reward > 1.5 && chaos < 0.7 && confidence > 0.55 {
        QualityTier::Acceptable
    } else {
        QualityTier::Poor
    }
}
