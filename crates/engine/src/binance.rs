//! Public-data Binance REST client. No authentication: candles, tickers and
//! the volume-ranked universe all come from open endpoints.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use common::{Candle, Error, MarketData, Result, Ticker, Timeframe};

const DEFAULT_BASE: &str = "https://api.binance.com";
const REQUEST_TIMEOUT_SECS: u64 = 10;

pub struct BinanceData {
    http: reqwest::Client,
    base: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ticker24h {
    symbol: String,
    last_price: String,
    quote_volume: String,
    price_change_percent: String,
}

impl BinanceData {
    pub fn new() -> Self {
        Self::with_base(DEFAULT_BASE)
    }

    pub fn with_base(base: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("reqwest client construction");
        Self {
            http,
            base: base.into(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path_and_query: &str) -> Result<T> {
        let url = format!("{}{}", self.base, path_and_query);
        debug!(%url, "binance request");
        let response = self.http.get(&url).send().await.map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }
        response.json::<T>().await.map_err(request_error)
    }
}

impl Default for BinanceData {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketData for BinanceData {
    async fn candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        let rows: Vec<Vec<Value>> = self
            .get_json(&format!(
                "/api/v3/klines?symbol={symbol}&interval={}&limit={limit}",
                timeframe.interval()
            ))
            .await?;
        rows.iter().map(|row| parse_kline(row)).collect()
    }

    async fn ticker(&self, symbol: &str) -> Result<Ticker> {
        let raw: Ticker24h = self
            .get_json(&format!("/api/v3/ticker/24hr?symbol={symbol}"))
            .await?;
        parse_ticker(&raw)
    }

    async fn universe(&self, limit: usize) -> Result<Vec<String>> {
        let mut all: Vec<Ticker24h> = self.get_json("/api/v3/ticker/24hr").await?;
        all.retain(|t| t.symbol.ends_with("USDT"));

        // Rank by quote volume; unparseable rows sink to the bottom
        all.sort_by(|a, b| {
            let va = a.quote_volume.parse::<f64>().unwrap_or(0.0);
            let vb = b.quote_volume.parse::<f64>().unwrap_or(0.0);
            vb.total_cmp(&va)
        });
        Ok(all.into_iter().take(limit).map(|t| t.symbol).collect())
    }
}

/// Kline row layout: [open_time, open, high, low, close, volume, ...],
/// with the prices as decimal strings.
fn parse_kline(row: &[Value]) -> Result<Candle> {
    if row.len() < 6 {
        return Err(Error::Permanent(format!(
            "kline row too short: {} fields",
            row.len()
        )));
    }
    let open_time_ms = row[0]
        .as_i64()
        .ok_or_else(|| Error::Permanent("kline open_time is not an integer".into()))?;
    let open_time = Utc
        .timestamp_millis_opt(open_time_ms)
        .single()
        .ok_or_else(|| Error::Permanent(format!("kline open_time out of range: {open_time_ms}")))?;

    Ok(Candle {
        open_time,
        open: decimal_field(&row[1], "open")?,
        high: decimal_field(&row[2], "high")?,
        low: decimal_field(&row[3], "low")?,
        close: decimal_field(&row[4], "close")?,
        volume: decimal_field(&row[5], "volume")?,
    })
}

fn parse_ticker(raw: &Ticker24h) -> Result<Ticker> {
    Ok(Ticker {
        last_price: decimal_str(&raw.last_price, "lastPrice")?,
        quote_volume: decimal_str(&raw.quote_volume, "quoteVolume")?,
        pct_change_24h: decimal_str(&raw.price_change_percent, "priceChangePercent")?,
    })
}

fn decimal_field(value: &Value, name: &str) -> Result<f64> {
    match value {
        Value::String(s) => decimal_str(s, name),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| Error::Permanent(format!("{name} is not a finite number"))),
        other => Err(Error::Permanent(format!("{name} has type {other:?}"))),
    }
}

fn decimal_str(s: &str, name: &str) -> Result<f64> {
    s.parse::<f64>()
        .map_err(|_| Error::Permanent(format!("unparseable {name}: {s:?}")))
}

fn request_error(err: reqwest::Error) -> Error {
    if err.is_timeout() || err.is_connect() {
        Error::Transient(err.to_string())
    } else if err.is_decode() {
        Error::Permanent(err.to_string())
    } else {
        Error::Transient(err.to_string())
    }
}

/// 429/418 are Binance rate-limit and ban responses; any 5xx is worth a
/// retry, any other 4xx is a caller mistake.
fn status_error(status: StatusCode, body: &str) -> Error {
    if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() == 418 || status.is_server_error()
    {
        Error::Transient(format!("binance {status}: {body}"))
    } else {
        Error::Permanent(format!("binance {status}: {body}"))
    }
}
