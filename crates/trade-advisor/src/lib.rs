use advisor_core::{
    AccountProfile, AdvisorConfig, AdvisorError, RawSignal, TradeDecision, TradingMode,
};
use bayesian_confidence::{BayesianAnalysis, BayesianInputs};
use chrono::{DateTime, Utc};
use decision_fusion::DecisionEngine;
use market_indicators::sanitize_candles;
use position_sizing::{PositionSizeResult, PositionSizer, SizingInputs};
use serde::{Deserialize, Serialize};
use signal_stability::{GateOutcome, StabilityManager};
use tracing::{debug, info};
use trend_confluence::{generate_signal, ChaosAssessment, MarketView, PhaseAssessment, TrendAssessment};

pub use advisor_core::Candle;

/// Full output of one analysis cycle: the vetted decision plus every
/// intermediate the surrounding application may want to log or display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeAdvice {
    pub decision: TradeDecision,
    /// The signal in force after the stability gate.
    pub signal: RawSignal,
    pub bayesian: BayesianAnalysis,
    pub position: PositionSizeResult,
    pub micro_trend: TrendAssessment,
    pub macro_trend: TrendAssessment,
    pub phase: PhaseAssessment,
    pub chaos: ChaosAssessment,
    pub gate_outcome: GateOutcome,
}

/// End-to-end trading advisor.
///
/// Composes the pipeline: indicators -> structure -> trend/confluence ->
/// Bayesian -> sizing -> fusion -> stability gate. Everything up to the gate
/// is pure; the gate owns the only mutable state and serializes access per
/// mode, so one `TradeAdvisor` can be shared across threads.
pub struct TradeAdvisor {
    config: AdvisorConfig,
    sizer: PositionSizer,
    decision_engine: DecisionEngine,
    stability: StabilityManager,
}

impl TradeAdvisor {
    pub fn new(config: AdvisorConfig) -> Result<Self, AdvisorError> {
        config.validate()?;
        let sizer = PositionSizer::from_config(&config);
        let decision_engine = DecisionEngine::with_abort_threshold(config.chaos_abort_threshold);
        let stability = StabilityManager::new(
            config.stability_intraday.clone(),
            config.stability_swing.clone(),
        );
        Ok(Self {
            config,
            sizer,
            decision_engine,
            stability,
        })
    }

    pub fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    /// Analyze one candle history and produce a vetted recommendation.
    ///
    /// Degrades to a structured NoTrade/Wait advice on short or repaired
    /// input; never panics and never errors.
    pub fn advise(
        &self,
        candles: &[Candle],
        account: &AccountProfile,
        mode: TradingMode,
        now: DateTime<Utc>,
    ) -> TradeAdvice {
        let candles = sanitize_candles(candles);
        let view = MarketView::assemble(&candles, mode, &self.config);
        let raw = generate_signal(&view, &candles, mode, &self.config);

        let current_price = candles.last().map(|c| c.close).unwrap_or(0.0);
        let gated = self.stability.gate(mode, &raw, current_price, now);
        debug!(
            outcome = ?gated.outcome,
            direction = gated.signal.direction.label(),
            "stability gate applied"
        );

        let inputs = self.bayesian_inputs(&view, &gated.signal);
        let bayesian = bayesian_confidence::analyze(&inputs);
        let position = self.sizer.multiplicative(
            &SizingInputs {
                posterior: bayesian.posterior,
                confidence: bayesian.confidence_level,
                chaos_risk: view.chaos.risk_level,
                volatility: inputs.volatility,
                risk_reward: bayesian.risk_reward_ratio,
            },
            account,
        );

        let mut decision = self
            .decision_engine
            .fuse(&gated.signal, &bayesian, &inputs, &position);
        decision.reasons.push(format!("stability: {}", gated.reason));

        info!(
            action = decision.action.label(),
            direction = gated.signal.direction.label(),
            quality = decision.quality_score,
            "advice produced"
        );

        TradeAdvice {
            decision,
            signal: gated.signal,
            bayesian,
            position,
            micro_trend: view.micro_trend,
            macro_trend: view.macro_trend,
            phase: view.phase,
            chaos: view.chaos,
            gate_outcome: gated.outcome,
        }
    }

    /// Convenience wrapper stamping the current wall-clock time.
    pub fn advise_now(
        &self,
        candles: &[Candle],
        account: &AccountProfile,
        mode: TradingMode,
    ) -> TradeAdvice {
        self.advise(candles, account, mode, Utc::now())
    }

    /// Forced reset of the per-mode signal cache.
    pub fn reset_stability(&self) {
        self.stability.reset();
    }

    fn bayesian_inputs(&self, view: &MarketView, signal: &RawSignal) -> BayesianInputs {
        BayesianInputs {
            signal_strength: (signal.raw_confidence / 100.0).clamp(0.0, 1.0),
            trend_strength: view.trend_strength(),
            momentum: view.momentum,
            volatility: (view.phase.atr_fraction / 0.03).clamp(0.0, 1.0),
            volume_profile: view.volume_profile,
            timeframe_alignment: view.timeframe_alignment,
            structure_quality: view.structure.quality(),
            chaos_risk: view.chaos.risk_level,
        }
    }
}
