//! Signal scorer: turns a ticker plus market context into a BUY or HOLD.
//!
//! Per call:
//! 1. validate the ticker and append it to the symbol's rolling history
//! 2. HOLD if a position is already open for the symbol
//! 3. backfill the history from 1m candles when it holds fewer than 20 samples
//! 4. oscillators and bands on the rolling series; ATR, regime and volume
//!    profile from 5m candles
//! 5. multi-timeframe score
//! 6. checklist, extreme-RSI veto, regime-adaptive threshold
//!
//! Missing market data never fails a call; it degrades to neutral readings.
//! Only malformed input (bad ticker, malformed candles) returns `Err`.

use tracing::{debug, info, warn};

use super::criteria::{evaluate, is_extreme_rsi, ScoringInputs};
use super::mtf::{analyze_multi_timeframe, MtfReading};
use super::regime::RegimeClassifier;
use crate::config::EngineConfig;
use crate::data::MarketData;
use crate::domain::{validate_series, Action, Interval, Position, Signal, Ticker};
use crate::error::EngineError;
use crate::history::{HistorySnapshot, HistoryStore};
use crate::indicators::{
    atr, bollinger, ema, macd, rsi, sma, volume_profile, volume_spike, RegimeReading,
    VolumeProfile, VolumeSpike, DEFAULT_ATR_PERIOD, DEFAULT_BAND_PERIOD, DEFAULT_BAND_WIDTH,
    DEFAULT_PROFILE_PERIODS, DEFAULT_RSI_PERIOD,
};

pub const MIN_HISTORY: usize = 20;
pub const BACKFILL_LIMIT: usize = 50;
pub const CONTEXT_CANDLE_LIMIT: usize = 50;
pub const HOT_COIN_LIMIT: usize = 10;

/// Readings taken from the medium-interval candles.
struct MarketContext {
    regime: RegimeReading,
    profile: VolumeProfile,
    atr: f64,
}

impl MarketContext {
    const NEUTRAL: MarketContext = MarketContext {
        regime: RegimeReading::UNKNOWN,
        profile: VolumeProfile::NEUTRAL,
        atr: 0.0,
    };
}

#[derive(Debug)]
pub struct SignalScorer {
    config: EngineConfig,
    history: HistoryStore,
    classifier: RegimeClassifier,
}

impl SignalScorer {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_history(config, HistoryStore::default())
    }

    pub fn with_history(config: EngineConfig, history: HistoryStore) -> Self {
        Self {
            config,
            history,
            classifier: RegimeClassifier::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Score one ticker.
    ///
    /// Calls for the same symbol must not overlap; the rolling window is
    /// ordered by call order.
    pub fn score(
        &self,
        ticker: &Ticker,
        market: &dyn MarketData,
        open_positions: &[Position],
    ) -> Result<Signal, EngineError> {
        ticker.validate()?;
        let symbol = ticker.symbol.as_str();
        let price = ticker.last_price;

        let mut snapshot = self.history.append(symbol, price, ticker.volume);

        if open_positions.iter().any(|p| p.symbol == symbol) {
            debug!(symbol, "skipping, already positioned");
            return Ok(Signal::hold(symbol, price, "already positioned", ticker.timestamp));
        }

        if snapshot.len() < MIN_HISTORY {
            match self.backfill(ticker, market)? {
                Some(filled) => snapshot = filled,
                None => {
                    return Ok(Signal::hold(
                        symbol,
                        price,
                        "insufficient history",
                        ticker.timestamp,
                    ))
                }
            }
        }

        let context = self.market_context(symbol, market)?;

        let mtf = if self.config.strategy.use_multi_timeframe {
            analyze_multi_timeframe(market, symbol)?
        } else {
            MtfReading::disabled()
        };

        let inputs = self.scoring_inputs(ticker, &snapshot, &context, mtf.score);
        let card = evaluate(&inputs, &self.config.strategy);
        let threshold = self.classifier.threshold(context.regime.regime);

        debug!(
            symbol,
            points = card.points,
            strength = card.strength,
            threshold,
            regime = %context.regime.regime,
            mtf = mtf.score,
            rsi = inputs.rsi,
            "scored"
        );

        let mut signal = Signal {
            symbol: symbol.to_string(),
            action: Action::Hold,
            price,
            strength: card.strength,
            mtf_score: mtf.score,
            rsi: inputs.rsi,
            atr: context.atr,
            regime: context.regime.regime,
            regime_confidence: context.regime.confidence,
            rationale: Vec::new(),
            timeframes: mtf.analyses.clone(),
            timestamp: ticker.timestamp,
        };

        if is_extreme_rsi(inputs.rsi) {
            warn!(symbol, rsi = inputs.rsi, "extreme RSI, signal rejected");
            signal
                .rationale
                .push(format!("extreme RSI ({:.1}), rejected for safety", inputs.rsi));
            return Ok(signal);
        }

        if card.strength >= threshold {
            signal.action = Action::Buy;
            signal
                .rationale
                .push(format!("score {:.0}%", card.strength * 100.0));
            signal.rationale.extend(card.satisfied);
            signal.rationale.push(format!(
                "RSI {:.1} | Bollinger {:.4}-{:.4}",
                inputs.rsi, inputs.bands.lower, inputs.bands.upper
            ));
            signal.rationale.push(format!(
                "multi-timeframe {:.0}% ({})",
                mtf.score * 100.0,
                mtf.breakdown()
            ));
            info!(
                symbol,
                strength = signal.strength,
                regime = %signal.regime,
                "BUY signal"
            );
        } else {
            signal.rationale.push(format!(
                "score too low ({:.0}% < {:.0}%)",
                card.strength * 100.0,
                threshold * 100.0
            ));
            signal.rationale.extend(card.unmet);
        }

        Ok(signal)
    }

    /// Replace a short window with recent 1m candles. `None` when the fetch
    /// fails or still leaves fewer than 20 samples.
    fn backfill(
        &self,
        ticker: &Ticker,
        market: &dyn MarketData,
    ) -> Result<Option<HistorySnapshot>, EngineError> {
        let symbol = ticker.symbol.as_str();
        let candles = match market.candles(symbol, Interval::OneMinute, BACKFILL_LIMIT) {
            Ok(candles) if !candles.is_empty() => candles,
            Ok(_) => {
                warn!(symbol, "backfill returned no candles");
                return Ok(None);
            }
            Err(err) => {
                warn!(symbol, error = %err, "backfill failed");
                return Ok(None);
            }
        };
        validate_series(symbol, &candles)?;

        let snapshot = self
            .history
            .backfill(symbol, &candles, ticker.last_price, ticker.volume);
        debug!(symbol, samples = snapshot.len(), "history backfilled");
        if snapshot.len() < MIN_HISTORY {
            return Ok(None);
        }
        Ok(Some(snapshot))
    }

    fn market_context(
        &self,
        symbol: &str,
        market: &dyn MarketData,
    ) -> Result<MarketContext, EngineError> {
        let candles = match market.candles(symbol, Interval::FiveMinutes, CONTEXT_CANDLE_LIMIT) {
            Ok(candles) if !candles.is_empty() => candles,
            Ok(_) => return Ok(MarketContext::NEUTRAL),
            Err(err) => {
                warn!(symbol, error = %err, "context candles unavailable, using neutral readings");
                return Ok(MarketContext::NEUTRAL);
            }
        };
        validate_series(symbol, &candles)?;

        Ok(MarketContext {
            regime: self.classifier.classify(&candles),
            profile: volume_profile(&candles, DEFAULT_PROFILE_PERIODS),
            atr: atr(&candles, DEFAULT_ATR_PERIOD),
        })
    }

    fn scoring_inputs(
        &self,
        ticker: &Ticker,
        snapshot: &HistorySnapshot,
        context: &MarketContext,
        mtf_score: f64,
    ) -> ScoringInputs {
        let prices = &snapshot.prices;
        let volumes = &snapshot.volumes;

        let spike = match volumes.split_last() {
            Some((current, prior)) if !prior.is_empty() => volume_spike(prior, *current),
            _ => VolumeSpike {
                spike: false,
                ratio: 1.0,
            },
        };

        ScoringInputs {
            price: ticker.last_price,
            price_change_percent: ticker.price_change_percent,
            quote_volume: ticker.quote_volume,
            volume_spike: spike,
            volume_profile: context.profile,
            rsi: rsi(prices, DEFAULT_RSI_PERIOD),
            sma20: sma(prices, 20),
            ema12: ema(prices, 12),
            ema26: ema(prices, 26),
            macd: macd(prices),
            bands: bollinger(prices, DEFAULT_BAND_PERIOD, DEFAULT_BAND_WIDTH),
            mtf_score,
            regime: context.regime,
        }
    }

    /// Pairs in the configured quote asset that pass the volume and change
    /// filters, ranked by 2 × change + quote volume / 1e6, best 10.
    pub fn scan_hot_coins(&self, tickers: &[Ticker]) -> Vec<Ticker> {
        let strategy = &self.config.strategy;
        let mut hot: Vec<Ticker> = tickers
            .iter()
            .filter(|t| t.validate().is_ok())
            .filter(|t| t.is_quoted_in(&strategy.quote_asset))
            .filter(|t| t.quote_volume >= strategy.min_volume)
            .filter(|t| t.price_change_percent >= strategy.min_price_change)
            .cloned()
            .collect();

        hot.sort_by(|a, b| hot_score(b).total_cmp(&hot_score(a)));
        hot.truncate(HOT_COIN_LIMIT);
        hot
    }
}

fn hot_score(ticker: &Ticker) -> f64 {
    ticker.price_change_percent * 2.0 + ticker.quote_volume / 1_000_000.0
}
