//! Binance spot REST client.
//!
//! Public endpoints (24h tickers, klines, spot price) plus the signed account
//! endpoint. Every request goes through the circuit breaker; 418 trips it at
//! once, 429 and transport failures count towards the threshold. Connection
//! failures and timeouts are retried with exponential backoff.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use tracing::{debug, warn};

use scout_core::data::{AccountSource, DataError, MarketData};
use scout_core::domain::{Candle, Interval, Ticker};

use super::circuit_breaker::CircuitBreaker;
use crate::config::ExchangeConfig;

type HmacSha256 = Hmac<Sha256>;

const API_KEY_HEADER: &str = "X-MBX-APIKEY";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawTicker {
    symbol: String,
    last_price: String,
    price_change_percent: String,
    volume: String,
    quote_volume: String,
    #[serde(default)]
    close_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct PriceResponse {
    price: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AccountResponse {
    balances: Vec<RawBalance>,
}

#[derive(Debug, Deserialize)]
struct RawBalance {
    asset: String,
    free: String,
    locked: String,
}

pub struct BinanceClient {
    client: Client,
    base_url: String,
    api_key: String,
    secret_key: String,
    recv_window_ms: u64,
    circuit_breaker: Arc<CircuitBreaker>,
    max_retries: u32,
    base_delay: Duration,
}

impl BinanceClient {
    pub fn new(
        config: &ExchangeConfig,
        circuit_breaker: Arc<CircuitBreaker>,
    ) -> Result<Self, DataError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
            api_key: config.api_key.clone(),
            secret_key: config.secret_key.clone(),
            recv_window_ms: config.recv_window_ms,
            circuit_breaker,
            max_retries: 2,
            base_delay: Duration::from_millis(500),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send with breaker checks and retries, then decode the JSON body.
    fn send_json<T: DeserializeOwned>(
        &self,
        what: &str,
        build: impl Fn() -> RequestBuilder,
    ) -> Result<T, DataError> {
        let resp = self.send(what, build)?;
        resp.json::<T>().map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse {what} response: {e}"))
        })
    }

    fn send(&self, what: &str, build: impl Fn() -> RequestBuilder) -> Result<Response, DataError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                std::thread::sleep(self.base_delay * 2u32.pow(attempt - 1));
            }
            if !self.circuit_breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }

            match build().send() {
                Ok(resp) => return self.check_status(what, resp),
                Err(e) if e.is_connect() || e.is_timeout() => {
                    self.circuit_breaker.record_failure();
                    warn!(request = what, attempt, error = %e, "exchange request failed");
                    last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                }
                Err(e) => {
                    self.circuit_breaker.record_failure();
                    return Err(DataError::NetworkUnreachable(e.to_string()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }

    fn check_status(&self, what: &str, resp: Response) -> Result<Response, DataError> {
        let status = resp.status();
        if status.is_success() {
            self.circuit_breaker.record_success();
            return Ok(resp);
        }

        match status {
            // Binance answers 418 once an IP is banned for ignoring 429s
            StatusCode::IM_A_TEAPOT => {
                self.circuit_breaker.trip();
                Err(DataError::CircuitBreakerTripped)
            }
            StatusCode::TOO_MANY_REQUESTS => {
                self.circuit_breaker.record_failure();
                let retry_after_secs = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                Err(DataError::RateLimited { retry_after_secs })
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                let body = resp.text().unwrap_or_default();
                Err(DataError::AuthenticationRequired(format!("{what}: {body}")))
            }
            _ => {
                self.circuit_breaker.record_failure();
                let body = resp.text().unwrap_or_default();
                Err(DataError::Other(format!("HTTP {status} for {what}: {body}")))
            }
        }
    }

    /// `query&signature=<hex hmac>` for signed endpoints.
    fn signed_query(&self, params: &[(&str, String)]) -> Result<String, DataError> {
        let query = params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        let signature = sign(&self.secret_key, &query)?;
        Ok(format!("{query}&signature={signature}"))
    }
}

/// Hex HMAC-SHA256 of `payload` keyed with `secret`.
pub(crate) fn sign(secret: &str, payload: &str) -> Result<String, DataError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| DataError::Other(format!("failed to init signer: {e}")))?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn parse_number(what: &str, text: &str) -> Result<f64, DataError> {
    text.parse::<f64>()
        .map_err(|_| DataError::ResponseFormatChanged(format!("{what}: not a number: {text:?}")))
}

fn millis_to_utc(ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
}

/// Tickers that fail to parse are skipped, not fatal.
pub(crate) fn parse_tickers(raw: Vec<RawTicker>, fetched_at: DateTime<Utc>) -> Vec<Ticker> {
    let total = raw.len();
    let tickers: Vec<Ticker> = raw
        .into_iter()
        .filter_map(|t| {
            let parsed = (|| -> Result<Ticker, DataError> {
                Ok(Ticker {
                    last_price: parse_number("lastPrice", &t.last_price)?,
                    price_change_percent: parse_number(
                        "priceChangePercent",
                        &t.price_change_percent,
                    )?,
                    volume: parse_number("volume", &t.volume)?,
                    quote_volume: parse_number("quoteVolume", &t.quote_volume)?,
                    timestamp: t.close_time.and_then(millis_to_utc).unwrap_or(fetched_at),
                    symbol: t.symbol.clone(),
                })
            })();
            match parsed {
                Ok(ticker) => Some(ticker),
                Err(err) => {
                    debug!(symbol = %t.symbol, error = %err, "skipping ticker");
                    None
                }
            }
        })
        .collect();
    if tickers.len() < total {
        debug!(skipped = total - tickers.len(), "unparseable tickers dropped");
    }
    tickers
}

/// Kline rows: `[openTime, "open", "high", "low", "close", "volume", closeTime, ...]`.
/// Any malformed row fails the whole batch.
pub(crate) fn parse_klines(symbol: &str, rows: &[Vec<Value>]) -> Result<Vec<Candle>, DataError> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let malformed =
                || DataError::ResponseFormatChanged(format!("{symbol}: malformed kline at {i}"));
            if row.len() < 7 {
                return Err(malformed());
            }
            let time = |idx: usize| row[idx].as_i64().and_then(millis_to_utc).ok_or_else(malformed);
            let number = |idx: usize| {
                row[idx]
                    .as_str()
                    .and_then(|s| s.parse::<f64>().ok())
                    .ok_or_else(malformed)
            };
            Ok(Candle {
                open_time: time(0)?,
                open: number(1)?,
                high: number(2)?,
                low: number(3)?,
                close: number(4)?,
                volume: number(5)?,
                close_time: time(6)?,
            })
        })
        .collect()
}

/// Total (free + locked) per asset, zero balances dropped.
pub(crate) fn parse_balances(account: AccountResponse) -> Result<HashMap<String, f64>, DataError> {
    let mut balances = HashMap::new();
    for b in account.balances {
        let total = parse_number(&b.asset, &b.free)? + parse_number(&b.asset, &b.locked)?;
        if total > 0.0 {
            balances.insert(b.asset, total);
        }
    }
    Ok(balances)
}

impl MarketData for BinanceClient {
    fn name(&self) -> &str {
        "binance"
    }

    fn tickers(&self) -> Result<Vec<Ticker>, DataError> {
        let url = self.url("/api/v3/ticker/24hr");
        let raw: Vec<RawTicker> = self.send_json("24h tickers", || self.client.get(&url))?;
        Ok(parse_tickers(raw, Utc::now()))
    }

    fn candles(
        &self,
        symbol: &str,
        interval: Interval,
        limit: usize,
    ) -> Result<Vec<Candle>, DataError> {
        let url = self.url("/api/v3/klines");
        let limit = limit.clamp(1, 1000).to_string();
        let rows: Vec<Vec<Value>> = self.send_json("klines", || {
            self.client.get(&url).query(&[
                ("symbol", symbol),
                ("interval", interval.label()),
                ("limit", limit.as_str()),
            ])
        })?;
        if rows.is_empty() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        parse_klines(symbol, &rows)
    }

    fn current_price(&self, symbol: &str) -> Result<f64, DataError> {
        let url = self.url("/api/v3/ticker/price");
        let resp: PriceResponse = self.send_json("spot price", || {
            self.client.get(&url).query(&[("symbol", symbol)])
        })?;
        parse_number("price", &resp.price)
    }
}

impl AccountSource for BinanceClient {
    fn balances(&self) -> Result<HashMap<String, f64>, DataError> {
        if self.api_key.is_empty() || self.secret_key.is_empty() {
            return Err(DataError::AuthenticationRequired(
                "BINANCE_API_KEY and BINANCE_SECRET_KEY are required for balances".into(),
            ));
        }

        let mut params = vec![("timestamp", Utc::now().timestamp_millis().to_string())];
        if self.recv_window_ms > 0 {
            params.push(("recvWindow", self.recv_window_ms.to_string()));
        }
        let url = format!("{}?{}", self.url("/api/v3/account"), self.signed_query(&params)?);

        let account: AccountResponse = self.send_json("account", || {
            self.client.get(&url).header(API_KEY_HEADER, &self.api_key)
        })?;
        parse_balances(account)
    }
}
