use advisor_core::Candle;

/// Simple Moving Average over `period` values.
pub fn sma(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return vec![];
    }

    data.windows(period)
        .map(|w| w.iter().sum::<f64>() / period as f64)
        .collect()
}

/// Exponential Moving Average, seeded with the SMA of the first `period`
/// values, multiplier `2 / (period + 1)`.
pub fn ema(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.is_empty() {
        return vec![];
    }
    if data.len() < period {
        return vec![data.iter().sum::<f64>() / data.len() as f64];
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let seed = data[..period].iter().sum::<f64>() / period as f64;

    let mut result = Vec::with_capacity(data.len());
    result.push(seed);
    for &value in &data[1..] {
        let prev = *result.last().unwrap();
        result.push((value - prev) * multiplier + prev);
    }
    result
}

/// Relative Strength Index with Wilder smoothing: seed average gain/loss over
/// the first `period` deltas, then `avg = (avg * (period-1) + x) / period`.
pub fn rsi(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period + 1 {
        return vec![];
    }

    let deltas: Vec<f64> = data.windows(2).map(|w| w[1] - w[0]).collect();
    let gain = |d: f64| d.max(0.0);
    let loss = |d: f64| (-d).max(0.0);

    let mut avg_gain = deltas[..period].iter().map(|&d| gain(d)).sum::<f64>() / period as f64;
    let mut avg_loss = deltas[..period].iter().map(|&d| loss(d)).sum::<f64>() / period as f64;

    let mut values = Vec::with_capacity(deltas.len() - period);
    for &delta in &deltas[period..] {
        avg_gain = (avg_gain * (period - 1) as f64 + gain(delta)) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + loss(delta)) / period as f64;

        if avg_loss == 0.0 {
            values.push(100.0);
        } else {
            let rs = avg_gain / avg_loss;
            values.push(100.0 - 100.0 / (1.0 + rs));
        }
    }
    values
}

pub struct MacdSeries {
    pub line: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// MACD line with its signal line and histogram. The signal line is a true
/// `signal_period` EMA of the MACD line.
pub fn macd(data: &[f64], fast: usize, slow: usize, signal_period: usize) -> MacdSeries {
    if fast == 0 || slow == 0 || signal_period == 0 || slow <= fast || data.len() < slow {
        return MacdSeries {
            line: vec![],
            signal: vec![],
            histogram: vec![],
        };
    }

    let ema_fast = ema(data, fast);
    let ema_slow = ema(data, slow);

    // Both EMA series are full-length and index-aligned with `data`.
    let line: Vec<f64> = ema_fast
        .iter()
        .zip(ema_slow.iter())
        .map(|(f, s)| f - s)
        .collect();

    let signal = ema(&line, signal_period);

    let hist_offset = line.len().saturating_sub(signal.len());
    let histogram: Vec<f64> = signal
        .iter()
        .enumerate()
        .map(|(i, s)| line[i + hist_offset] - s)
        .collect();

    MacdSeries {
        line,
        signal,
        histogram,
    }
}

pub struct BollingerSeries {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

/// Bollinger Bands using population standard deviation over `period` values.
pub fn bollinger_bands(data: &[f64], period: usize, width: f64) -> BollingerSeries {
    if period == 0 || data.len() < period {
        return BollingerSeries {
            upper: vec![],
            middle: vec![],
            lower: vec![],
        };
    }

    let middle = sma(data, period);
    let mut upper = Vec::with_capacity(middle.len());
    let mut lower = Vec::with_capacity(middle.len());

    for (w, &mean) in data.windows(period).zip(middle.iter()) {
        let variance = w.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / period as f64;
        let sigma = variance.sqrt();
        upper.push(mean + width * sigma);
        lower.push(mean - width * sigma);
    }

    BollingerSeries {
        upper,
        middle,
        lower,
    }
}

/// True range of each candle against its predecessor's close.
fn true_ranges(candles: &[Candle]) -> Vec<f64> {
    candles
        .windows(2)
        .map(|w| {
            let (prev, cur) = (&w[0], &w[1]);
            (cur.high - cur.low)
                .max((cur.high - prev.close).abs())
                .max((cur.low - prev.close).abs())
        })
        .collect()
}

/// Average True Range, Wilder-smoothed over `period`.
pub fn atr(candles: &[Candle], period: usize) -> Vec<f64> {
    if period == 0 || candles.len() < period + 1 {
        return vec![];
    }

    let ranges = true_ranges(candles);
    let mut value = ranges[..period].iter().sum::<f64>() / period as f64;

    let mut values = Vec::with_capacity(ranges.len() - period + 1);
    values.push(value);
    for &tr in &ranges[period..] {
        value = (value * (period - 1) as f64 + tr) / period as f64;
        values.push(value);
    }
    values
}

pub struct AdxSeries {
    pub adx: Vec<f64>,
    pub plus_di: Vec<f64>,
    pub minus_di: Vec<f64>,
}

/// Average Directional Index with +DI/-DI, Wilder smoothing throughout.
pub fn adx(candles: &[Candle], period: usize) -> AdxSeries {
    if period == 0 || candles.len() < period * 2 + 1 {
        return AdxSeries {
            adx: vec![],
            plus_di: vec![],
            minus_di: vec![],
        };
    }

    let mut plus_dm = Vec::with_capacity(candles.len() - 1);
    let mut minus_dm = Vec::with_capacity(candles.len() - 1);
    for w in candles.windows(2) {
        let up = w[1].high - w[0].high;
        let down = w[0].low - w[1].low;
        plus_dm.push(if up > down && up > 0.0 { up } else { 0.0 });
        minus_dm.push(if down > up && down > 0.0 { down } else { 0.0 });
    }
    let ranges = true_ranges(candles);

    let mut smooth_plus = plus_dm[..period].iter().sum::<f64>();
    let mut smooth_minus = minus_dm[..period].iter().sum::<f64>();
    let mut smooth_tr = ranges[..period].iter().sum::<f64>();

    let mut plus_di = Vec::new();
    let mut minus_di = Vec::new();
    let mut dx = Vec::new();

    for i in period..plus_dm.len() {
        smooth_plus = smooth_plus - smooth_plus / period as f64 + plus_dm[i];
        smooth_minus = smooth_minus - smooth_minus / period as f64 + minus_dm[i];
        smooth_tr = smooth_tr - smooth_tr / period as f64 + ranges[i];

        let (pdi, mdi) = if smooth_tr > 0.0 {
            (
                100.0 * smooth_plus / smooth_tr,
                100.0 * smooth_minus / smooth_tr,
            )
        } else {
            (0.0, 0.0)
        };
        plus_di.push(pdi);
        minus_di.push(mdi);

        let sum = pdi + mdi;
        dx.push(if sum > 0.0 {
            100.0 * (pdi - mdi).abs() / sum
        } else {
            0.0
        });
    }

    if dx.len() < period {
        return AdxSeries {
            adx: vec![],
            plus_di,
            minus_di,
        };
    }

    let mut value = dx[..period].iter().sum::<f64>() / period as f64;
    let mut adx_values = Vec::with_capacity(dx.len() - period + 1);
    adx_values.push(value);
    for &d in &dx[period..] {
        value = (value * (period - 1) as f64 + d) / period as f64;
        adx_values.push(value);
    }

    AdxSeries {
        adx: adx_values,
        plus_di,
        minus_di,
    }
}

pub struct StochasticSeries {
    pub k: Vec<f64>,
    pub d: Vec<f64>,
}

/// Stochastic oscillator %K over `k_period`, %D as SMA(`d_period`) of %K.
pub fn stochastic(candles: &[Candle], k_period: usize, d_period: usize) -> StochasticSeries {
    if k_period == 0 || candles.len() < k_period {
        return StochasticSeries { k: vec![], d: vec![] };
    }

    let k: Vec<f64> = candles
        .windows(k_period)
        .map(|w| {
            let highest = w.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
            let lowest = w.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
            if highest == lowest {
                50.0
            } else {
                100.0 * (w.last().unwrap().close - lowest) / (highest - lowest)
            }
        })
        .collect();

    let d = sma(&k, d_period);
    StochasticSeries { k, d }
}

/// Volume-Weighted Average Price, cumulative over the supplied session.
pub fn vwap(candles: &[Candle]) -> Vec<f64> {
    let mut values = Vec::with_capacity(candles.len());
    let mut price_volume = 0.0;
    let mut volume = 0.0;

    for c in candles {
        let typical = (c.high + c.low + c.close) / 3.0;
        price_volume += typical * c.volume;
        volume += c.volume;
        values.push(if volume > 0.0 {
            price_volume / volume
        } else {
            typical
        });
    }
    values
}
