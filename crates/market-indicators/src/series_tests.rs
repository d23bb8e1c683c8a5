#[cfg(test)]
mod tests {
    use crate::series::*;
    use crate::snapshot::{sanitize_candles, IndicatorSet};
    use advisor_core::Candle;
    use approx::assert_relative_eq;
    use chrono::Utc;

    fn make_candles(ohlc: &[(f64, f64, f64, f64)]) -> Vec<Candle> {
        ohlc.iter()
            .enumerate()
            .map(|(i, &(open, high, low, close))| Candle {
                timestamp: Utc::now() - chrono::Duration::minutes((ohlc.len() - i) as i64),
                open,
                high,
                low,
                close,
                volume: 1_000.0,
            })
            .collect()
    }

    /// Steady uptrend: each candle closes one unit above the last.
    fn trending_candles(n: usize) -> Vec<Candle> {
        (0..n)
            .map(|i| {
                let base = 100.0 + i as f64;
                Candle {
                    timestamp: Utc::now() - chrono::Duration::minutes((n - i) as i64),
                    open: base,
                    high: base + 1.5,
                    low: base - 0.5,
                    close: base + 1.0,
                    volume: 1_000.0 + i as f64,
                }
            })
            .collect()
    }

    #[test]
    fn sma_basic() {
        let result = sma(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_eq!(result.len(), 3);
        assert_relative_eq!(result[0], 2.0, epsilon = 1e-9);
        assert_relative_eq!(result[2], 4.0, epsilon = 1e-9);
    }

    #[test]
    fn sma_insufficient_data() {
        assert!(sma(&[1.0, 2.0], 5).is_empty());
        assert!(sma(&[1.0, 2.0], 0).is_empty());
    }

    #[test]
    fn ema_seeded_with_sma() {
        let data = [22.0, 24.0, 23.0, 25.0, 26.0];
        let result = ema(&data, 3);
        assert_eq!(result.len(), data.len());
        assert_relative_eq!(result[0], (22.0 + 24.0 + 23.0) / 3.0, epsilon = 1e-9);
    }

    #[test]
    fn ema_tracks_uptrend() {
        let data: Vec<f64> = (1..=10).map(|i| i as f64).collect();
        let result = ema(&data, 3);
        for pair in result.windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }

    #[test]
    fn rsi_stays_in_bounds() {
        let data = [
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08, 45.89, 46.03,
            45.61, 46.28, 46.28, 46.00, 46.03, 46.41, 46.22, 45.64,
        ];
        for &value in &rsi(&data, 14) {
            assert!((0.0..=100.0).contains(&value));
        }
    }

    #[test]
    fn rsi_pinned_at_100_on_pure_gains() {
        let data: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let values = rsi(&data, 14);
        assert_relative_eq!(*values.last().unwrap(), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn macd_signal_is_true_ema_of_line() {
        let data: Vec<f64> = (0..80)
            .map(|i| 100.0 + (i as f64 * 0.3).sin() * 5.0 + i as f64 * 0.1)
            .collect();
        let result = macd(&data, 12, 26, 9);

        let expected_signal = ema(&result.line, 9);
        assert_eq!(result.signal.len(), expected_signal.len());
        for (got, want) in result.signal.iter().zip(expected_signal.iter()) {
            assert_relative_eq!(got, want, epsilon = 1e-9);
        }
        // Regression against the constant-fraction shortcut.
        let last_line = *result.line.last().unwrap();
        let last_signal = *result.signal.last().unwrap();
        assert!((last_signal - last_line * 0.9).abs() > 1e-12 || last_line == 0.0);
    }

    #[test]
    fn bollinger_bands_enclose_middle() {
        let data: Vec<f64> = (0..40).map(|i| 50.0 + ((i * 7) % 11) as f64).collect();
        let bb = bollinger_bands(&data, 20, 2.0);
        assert_eq!(bb.upper.len(), bb.middle.len());
        for i in 0..bb.middle.len() {
            assert!(bb.upper[i] >= bb.middle[i]);
            assert!(bb.lower[i] <= bb.middle[i]);
            // Bands are symmetric around the middle.
            assert_relative_eq!(
                bb.upper[i] - bb.middle[i],
                bb.middle[i] - bb.lower[i],
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn atr_positive_on_ranging_candles() {
        let candles = trending_candles(30);
        let values = atr(&candles, 14);
        assert!(!values.is_empty());
        for &v in &values {
            assert!(v > 0.0);
        }
    }

    #[test]
    fn adx_detects_strong_trend() {
        let candles = trending_candles(120);
        let result = adx(&candles, 14);
        assert!(!result.adx.is_empty());
        let last = *result.adx.last().unwrap();
        assert!(last > 25.0, "expected strong-trend ADX, got {last}");
        assert!(result.plus_di.last().unwrap() > result.minus_di.last().unwrap());
    }

    #[test]
    fn stochastic_high_in_uptrend() {
        let candles = trending_candles(40);
        let result = stochastic(&candles, 14, 3);
        let last_k = *result.k.last().unwrap();
        assert!((0.0..=100.0).contains(&last_k));
        assert!(last_k > 70.0);
    }

    #[test]
    fn vwap_between_session_extremes() {
        let candles = trending_candles(25);
        let values = vwap(&candles);
        assert_eq!(values.len(), candles.len());
        let high = candles.iter().map(|c| c.high).fold(f64::MIN, f64::max);
        let low = candles.iter().map(|c| c.low).fold(f64::MAX, f64::min);
        let last = *values.last().unwrap();
        assert!(last >= low && last <= high);
    }

    #[test]
    fn sanitize_clamps_bad_high_low() {
        let mut candles = make_candles(&[(100.0, 102.0, 99.0, 101.0)]);
        candles[0].high = 100.5; // below the close
        let fixed = sanitize_candles(&candles);
        assert_eq!(fixed.len(), 1);
        assert_relative_eq!(fixed[0].high, 101.0, epsilon = 1e-9);
        assert!(fixed[0].is_well_formed());
    }

    #[test]
    fn sanitize_drops_non_finite() {
        let mut candles = make_candles(&[(100.0, 102.0, 99.0, 101.0), (101.0, 103.0, 100.0, 102.0)]);
        candles[0].close = f64::NAN;
        let fixed = sanitize_candles(&candles);
        assert_eq!(fixed.len(), 1);
    }

    #[test]
    fn snapshot_neutral_defaults_on_short_history() {
        let candles = trending_candles(5);
        let set = IndicatorSet::compute(&candles, 5.0);
        assert_relative_eq!(set.rsi, 50.0, epsilon = 1e-9);
        assert_relative_eq!(set.atr, 5.0, epsilon = 1e-9);
        assert_relative_eq!(set.adx, 0.0, epsilon = 1e-9);
        assert_relative_eq!(set.sma_50, candles.last().unwrap().close, epsilon = 1e-9);
    }

    #[test]
    fn snapshot_atr_respects_floor() {
        // Tight candles with tiny true ranges: floor must win.
        let candles: Vec<Candle> = (0..60)
            .map(|i| Candle {
                timestamp: Utc::now() - chrono::Duration::minutes((60 - i) as i64),
                open: 100.0,
                high: 100.02,
                low: 99.98,
                close: 100.01,
                volume: 500.0,
            })
            .collect();
        let set = IndicatorSet::compute(&candles, 5.0);
        assert_relative_eq!(set.atr, 5.0, epsilon = 1e-9);
    }
}
