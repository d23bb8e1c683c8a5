use advisor_core::{RawSignal, StabilityConfig, TradingMode};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Last accepted signal for one trading mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedSignal {
    pub signal: RawSignal,
    pub price_at_cache: f64,
    pub cached_at: DateTime<Utc>,
}

/// What the gate did with the fresh computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateOutcome {
    /// First tradable signal for this mode; cached and returned.
    Stored,
    /// Hysteresis held the cached signal; the fresh one was discarded.
    Held,
    /// A gate condition passed; the fresh signal replaced the cache.
    Replaced,
    /// A gate condition passed on a non-tradable fresh read; cache cleared.
    Cleared,
    /// No cache and nothing tradable to store.
    Bypassed,
}

/// The signal the caller must act on, plus how it was arrived at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateResult {
    pub signal: RawSignal,
    pub outcome: GateOutcome,
    pub reason: String,
}

/// Anti-flicker hysteresis layer.
///
/// Holds the last accepted signal per trading mode and only lets a fresh
/// computation replace it when the cached one has aged out, price has
/// displaced beyond the mode threshold, the cached stop or a target was
/// touched, or confidence collapsed. A contradictory fresh signal alone is
/// NOT an unlock: flapping between Buy and Sell on a quiet tape is exactly
/// what this layer exists to prevent.
///
/// All state lives in a per-mode map; the entry API serializes each
/// read-modify-write so concurrent refreshes cannot both pass the staleness
/// check and race the overwrite.
#[derive(Debug)]
pub struct StabilityManager {
    intraday: StabilityConfig,
    swing: StabilityConfig,
    cache: DashMap<TradingMode, CachedSignal>,
}

impl StabilityManager {
    pub fn new(intraday: StabilityConfig, swing: StabilityConfig) -> Self {
        Self {
            intraday,
            swing,
            cache: DashMap::new(),
        }
    }

    pub fn config_for(&self, mode: TradingMode) -> &StabilityConfig {
        match mode {
            TradingMode::Intraday => &self.intraday,
            TradingMode::Swing => &self.swing,
        }
    }

    /// Run one fresh computation through the gate.
    ///
    /// `now` is explicit so the gate stays a pure function of its inputs.
    pub fn gate(
        &self,
        mode: TradingMode,
        candidate: &RawSignal,
        current_price: f64,
        now: DateTime<Utc>,
    ) -> GateResult {
        let config = self.config_for(mode).clone();

        match self.cache.entry(mode) {
            Entry::Vacant(slot) => {
                if candidate.direction.is_trade() {
                    slot.insert(CachedSignal {
                        signal: candidate.clone(),
                        price_at_cache: current_price,
                        cached_at: now,
                    });
                    GateResult {
                        signal: candidate.clone(),
                        outcome: GateOutcome::Stored,
                        reason: format!("first {} signal cached", mode.label()),
                    }
                } else {
                    GateResult {
                        signal: candidate.clone(),
                        outcome: GateOutcome::Bypassed,
                        reason: "nothing cached and nothing tradable".to_string(),
                    }
                }
            }
            Entry::Occupied(mut slot) => {
                let cached = slot.get();
                let unlock = unlock_reason(&config, cached, candidate, current_price, now);

                match unlock {
                    Some(reason) => {
                        debug!(mode = mode.label(), %reason, "stability gate unlocked");
                        if candidate.direction.is_trade() {
                            slot.insert(CachedSignal {
                                signal: candidate.clone(),
                                price_at_cache: current_price,
                                cached_at: now,
                            });
                            GateResult {
                                signal: candidate.clone(),
                                outcome: GateOutcome::Replaced,
                                reason,
                            }
                        } else {
                            slot.remove();
                            GateResult {
                                signal: candidate.clone(),
                                outcome: GateOutcome::Cleared,
                                reason: format!("{reason}; no tradable replacement"),
                            }
                        }
                    }
                    None => GateResult {
                        signal: cached.signal.clone(),
                        outcome: GateOutcome::Held,
                        reason: format!(
                            "holding cached {} signal from {}",
                            cached.signal.direction.label(),
                            cached.cached_at.format("%H:%M:%S")
                        ),
                    },
                }
            }
        }
    }

    /// Cached signal for a mode, if any.
    pub fn peek(&self, mode: TradingMode) -> Option<CachedSignal> {
        self.cache.get(&mode).map(|entry| entry.value().clone())
    }

    /// Forced reset: unconditionally clears every mode.
    pub fn reset(&self) {
        self.cache.clear();
    }
}

fn unlock_reason(
    config: &StabilityConfig,
    cached: &CachedSignal,
    candidate: &RawSignal,
    current_price: f64,
    now: DateTime<Utc>,
) -> Option<String> {
    let age_secs = (now - cached.cached_at).num_seconds();
    if age_secs >= config.min_age_secs {
        return Some(format!(
            "cached signal aged {}s past the {}s minimum",
            age_secs, config.min_age_secs
        ));
    }

    if cached.price_at_cache > 0.0 {
        let displacement = ((current_price - cached.price_at_cache) / cached.price_at_cache).abs();
        if displacement >= config.price_threshold_pct {
            return Some(format!(
                "price displaced {:.2}% beyond the {:.2}% threshold",
                displacement * 100.0,
                config.price_threshold_pct * 100.0
            ));
        }
    }

    if touched_level(&cached.signal, current_price) {
        return Some("cached stop or target touched".to_string());
    }

    let confidence_drop = cached.signal.raw_confidence - candidate.raw_confidence;
    if confidence_drop > config.confidence_drop {
        return Some(format!(
            "confidence dropped {:.0} points",
            confidence_drop
        ));
    }

    None
}

/// Whether price has reached the cached stop or any cached target.
fn touched_level(signal: &RawSignal, price: f64) -> bool {
    match signal.direction {
        advisor_core::Direction::Buy => {
            price <= signal.stop_loss || signal.take_profits.iter().any(|&tp| price >= tp)
        }
        advisor_core::Direction::Sell => {
            price >= signal.stop_loss || signal.take_profits.iter().any(|&tp| price <= tp)
        }
        advisor_core::Direction::NoTrade => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisor_core::Direction;
    use chrono::TimeZone;

    fn manager() -> StabilityManager {
        StabilityManager::new(
            StabilityConfig::tight(TradingMode::Intraday),
            StabilityConfig::tight(TradingMode::Swing),
        )
    }

    fn at(minute: u32, second: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 4, 12, minute, second).unwrap()
    }

    fn buy(confidence: f64) -> RawSignal {
        RawSignal {
            direction: Direction::Buy,
            entry: 2_650.0,
            stop_loss: 2_640.0,
            take_profits: vec![2_660.0, 2_680.0],
            raw_confidence: confidence,
            reason: "buy setup".to_string(),
        }
    }

    fn sell(confidence: f64) -> RawSignal {
        RawSignal {
            direction: Direction::Sell,
            entry: 2_650.0,
            stop_loss: 2_660.0,
            take_profits: vec![2_640.0, 2_620.0],
            raw_confidence: confidence,
            reason: "sell setup".to_string(),
        }
    }

    #[test]
    fn first_signal_is_stored() {
        let mgr = manager();
        let result = mgr.gate(TradingMode::Intraday, &buy(75.0), 2_650.0, at(0, 0));
        assert_eq!(result.outcome, GateOutcome::Stored);
        assert!(mgr.peek(TradingMode::Intraday).is_some());
    }

    #[test]
    fn contradictory_fresh_sell_does_not_replace_young_buy() {
        let mgr = manager();
        mgr.gate(TradingMode::Intraday, &buy(75.0), 2_650.0, at(0, 0));
        // 5 minutes later, 0.02% away: every unlock condition fails.
        let result = mgr.gate(TradingMode::Intraday, &sell(74.0), 2_650.5, at(5, 0));
        assert_eq!(result.outcome, GateOutcome::Held);
        assert_eq!(result.signal.direction, Direction::Buy);
        assert_eq!(
            mgr.peek(TradingMode::Intraday).unwrap().signal.direction,
            Direction::Buy
        );
    }

    #[test]
    fn cached_sell_held_at_tiny_displacement() {
        // Cached Sell at 2650, price 2649 (0.04%), age 5 min, thresholds
        // (15 min, 0.1%): returned unchanged.
        let mgr = manager();
        mgr.gate(TradingMode::Intraday, &sell(80.0), 2_650.0, at(0, 0));
        let result = mgr.gate(TradingMode::Intraday, &sell(78.0), 2_649.0, at(5, 0));
        assert_eq!(result.outcome, GateOutcome::Held);
        assert_eq!(result.signal, sell(80.0));
    }

    #[test]
    fn age_unlocks_replacement() {
        let mgr = manager();
        mgr.gate(TradingMode::Intraday, &buy(75.0), 2_650.0, at(0, 0));
        let result = mgr.gate(TradingMode::Intraday, &sell(74.0), 2_650.5, at(16, 0));
        assert_eq!(result.outcome, GateOutcome::Replaced);
        assert_eq!(result.signal.direction, Direction::Sell);
    }

    #[test]
    fn displacement_unlocks_replacement() {
        let mgr = manager();
        mgr.gate(TradingMode::Intraday, &buy(75.0), 2_650.0, at(0, 0));
        // 0.15% move with intraday threshold 0.1%.
        let result = mgr.gate(TradingMode::Intraday, &sell(74.0), 2_654.0, at(3, 0));
        assert_eq!(result.outcome, GateOutcome::Replaced);
    }

    #[test]
    fn stop_touch_unlocks_replacement() {
        let mgr = manager();
        let mut cached = buy(75.0);
        // Stop 0.11% below entry, inside the 0.3% swing displacement
        // threshold, so only the touch condition can fire here.
        cached.stop_loss = 2_647.0;
        mgr.gate(TradingMode::Swing, &cached, 2_650.0, at(0, 0));
        let result = mgr.gate(TradingMode::Swing, &buy(70.0), 2_647.0, at(2, 0));
        assert_eq!(result.outcome, GateOutcome::Replaced);
        assert!(result.reason.contains("stop or target"));
    }

    #[test]
    fn confidence_collapse_unlocks_replacement() {
        let mgr = manager();
        mgr.gate(TradingMode::Intraday, &buy(80.0), 2_650.0, at(0, 0));
        // 20-point drop against a 15-point threshold; price barely moved.
        let result = mgr.gate(TradingMode::Intraday, &buy(60.0), 2_650.5, at(2, 0));
        assert_eq!(result.outcome, GateOutcome::Replaced);
        assert!(result.reason.contains("confidence dropped"));
    }

    #[test]
    fn unlocked_no_trade_clears_the_cache() {
        let mgr = manager();
        mgr.gate(TradingMode::Intraday, &buy(75.0), 2_650.0, at(0, 0));
        let no_trade = RawSignal::no_trade("edge gone");
        let result = mgr.gate(TradingMode::Intraday, &no_trade, 2_650.0, at(20, 0));
        assert_eq!(result.outcome, GateOutcome::Cleared);
        assert!(mgr.peek(TradingMode::Intraday).is_none());
    }

    #[test]
    fn modes_are_independent() {
        let mgr = manager();
        mgr.gate(TradingMode::Intraday, &buy(75.0), 2_650.0, at(0, 0));
        assert!(mgr.peek(TradingMode::Swing).is_none());
        mgr.gate(TradingMode::Swing, &sell(70.0), 2_650.0, at(0, 0));
        assert_eq!(
            mgr.peek(TradingMode::Intraday).unwrap().signal.direction,
            Direction::Buy
        );
        assert_eq!(
            mgr.peek(TradingMode::Swing).unwrap().signal.direction,
            Direction::Sell
        );
    }

    #[test]
    fn reset_clears_everything() {
        let mgr = manager();
        mgr.gate(TradingMode::Intraday, &buy(75.0), 2_650.0, at(0, 0));
        mgr.gate(TradingMode::Swing, &sell(70.0), 2_650.0, at(0, 0));
        mgr.reset();
        assert!(mgr.peek(TradingMode::Intraday).is_none());
        assert!(mgr.peek(TradingMode::Swing).is_none());
    }

    #[test]
    fn no_trade_with_empty_cache_bypasses() {
        let mgr = manager();
        let result = mgr.gate(
            TradingMode::Intraday,
            &RawSignal::no_trade("nothing yet"),
            2_650.0,
            at(0, 0),
        );
        assert_eq!(result.outcome, GateOutcome::Bypassed);
        assert!(mgr.peek(TradingMode::Intraday).is_none());
    }

    #[test]
    fn manager_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StabilityManager>();
    }
}
