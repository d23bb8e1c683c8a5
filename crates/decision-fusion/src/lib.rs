use advisor_core::{Direction, QualityTier, RawSignal, RiskLevel, TradeAction, TradeDecision};
use bayesian_confidence::{BayesianAnalysis, BayesianInputs};
use position_sizing::PositionSizeResult;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Rule-based fusion of the Bayesian analysis, chaos risk and position size
/// into a final Execute / Wait / Abort call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionEngine {
    /// Chaos above this aborts unconditionally.
    pub chaos_abort_threshold: f64,
    /// Chaos must stay below this for an Execute.
    pub chaos_execute_ceiling: f64,
    /// Confidence a Good-tier setup needs to execute.
    pub good_tier_confidence: f64,
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self {
            chaos_abort_threshold: 0.8,
            chaos_execute_ceiling: 0.5,
            good_tier_confidence: 0.75,
        }
    }
}

impl DecisionEngine {
    pub fn with_abort_threshold(chaos_abort_threshold: f64) -> Self {
        Self {
            chaos_abort_threshold,
            ..Self::default()
        }
    }

    /// Fuse one analyzed signal into a decision.
    pub fn fuse(
        &self,
        signal: &RawSignal,
        bayesian: &BayesianAnalysis,
        factors: &BayesianInputs,
        size: &PositionSizeResult,
    ) -> TradeDecision {
        let chaos = factors.chaos_risk;

        if signal.direction == Direction::NoTrade {
            return self.hold(&signal.reason);
        }

        let mut reasons = vec![format!(
            "{} quality, posterior {:.0}%, r:r {:.1}",
            bayesian.quality_tier.label(),
            bayesian.posterior * 100.0,
            bayesian.risk_reward_ratio
        )];

        let action = if bayesian.quality_tier == QualityTier::Poor
            || chaos > self.chaos_abort_threshold
        {
            if chaos > self.chaos_abort_threshold {
                reasons.push(format!(
                    "chaos {:.2} above abort threshold {:.2}",
                    chaos, self.chaos_abort_threshold
                ));
            } else {
                reasons.push("poor trade quality".to_string());
            }
            TradeAction::Abort
        } else if chaos < self.chaos_execute_ceiling
            && (bayesian.quality_tier == QualityTier::Excellent
                || (bayesian.quality_tier == QualityTier::Good
                    && bayesian.confidence_level > self.good_tier_confidence))
        {
            reasons.push(format!(
                "chaos {:.2} acceptable, {} sizing",
                chaos,
                size.tier.label()
            ));
            TradeAction::Execute
        } else {
            reasons.push("setup not strong enough to execute yet".to_string());
            TradeAction::Wait
        };

        if factors.timeframe_alignment >= 1.0 {
            reasons.push("timeframes fully aligned".to_string());
        }
        if factors.volume_profile > 0.6 {
            reasons.push("volume supportive".to_string());
        }

        let decision = TradeDecision {
            action,
            confidence: bayesian.confidence_level,
            position_size: if action == TradeAction::Execute {
                size.percent_of_capital
            } else {
                0.0
            },
            risk_level: RiskLevel::from_chaos(chaos),
            quality_score: quality_score(bayesian, chaos),
            reasons,
        };
        debug!(action = decision.action.label(), quality = decision.quality_score, "decision fused");
        decision
    }

    /// Structured hold used when no tradable signal exists; never an error.
    pub fn hold(&self, reason: &str) -> TradeDecision {
        TradeDecision {
            action: TradeAction::Wait,
            confidence: 0.0,
            position_size: 0.0,
            risk_level: RiskLevel::Low,
            quality_score: 0.0,
            reasons: vec![reason.to_string()],
        }
    }
}

/// Single health metric on a 0-10 scale.
pub fn quality_score(bayesian: &BayesianAnalysis, chaos: f64) -> f64 {
    let rr_part = ((bayesian.risk_reward_ratio - 1.0) / 4.0).clamp(0.0, 1.0);
    (10.0
        * (0.35 * bayesian.posterior
            + 0.25 * bayesian.confidence_level
            + 0.20 * rr_part
            + 0.20 * (1.0 - chaos.clamp(0.0, 1.0))))
    .clamp(0.0, 10.0)
}
