//! Timeframe analyzer: the indicator library applied to one timeframe's candles.

use crate::domain::{closes, volumes, Candle, Interval, TimeframeAnalysis};
use crate::indicators::{
    atr, bollinger, detect_trend, macd, momentum_score, rsi, trend::MIN_TREND_CANDLES,
    DEFAULT_ATR_PERIOD, DEFAULT_BAND_PERIOD, DEFAULT_BAND_WIDTH, DEFAULT_RSI_PERIOD,
};

/// Trend, oscillators and band position for `candles`.
///
/// `None` below 20 candles; such a timeframe is excluded from aggregation.
pub fn analyze_timeframe(timeframe: Interval, candles: &[Candle]) -> Option<TimeframeAnalysis> {
    if candles.len() < MIN_TREND_CANDLES {
        return None;
    }

    let closes = closes(candles);
    let volumes = volumes(candles);
    let price = closes[closes.len() - 1];

    let trend = detect_trend(candles);
    let macd = macd(&closes);
    let bands = bollinger(&closes, DEFAULT_BAND_PERIOD, DEFAULT_BAND_WIDTH);

    Some(TimeframeAnalysis {
        timeframe,
        trend: trend.trend,
        strength: trend.strength,
        rsi: rsi(&closes, DEFAULT_RSI_PERIOD),
        macd: macd.macd,
        macd_signal: macd.signal,
        macd_histogram: macd.histogram,
        atr: atr(candles, DEFAULT_ATR_PERIOD),
        momentum_score: momentum_score(&closes, &volumes),
        band_position: bands.position(price),
    })
}
