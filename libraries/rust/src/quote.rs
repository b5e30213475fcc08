use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const BULK_PROVIDER: &str = "FMP Bulk Real-time";

pub const REALTIME_PROVIDER: &str = "FMP Real-time";

pub const REALTIME_SOURCE: &str = "FMP Real-time API";

pub const DEFAULT_EXCHANGE: &str = "NASDAQ";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// One upstream quote record. Every field is optional; the upstream omits or
/// nulls fields freely and sometimes sends numbers as strings.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawQuote {
    #[serde(default, deserialize_with = "lenient_string")]
    pub symbol: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub changes_percentage: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub change: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub volume: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub market_cap: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub pe: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub day_low: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub day_high: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub year_low: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub year_high: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub exchange: Option<String>,
}

impl RawQuote {
    /// Non-object records decode to an all-empty quote.
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }

    /// The records of an upstream body, or `None` when the body is not an
    /// array.
    pub fn records(body: Value) -> Option<Vec<RawQuote>> {
        match body {
            Value::Array(values) => Some(values.into_iter().map(RawQuote::from_value).collect()),
            _ => None,
        }
    }

    fn price_or_zero(&self) -> f64 {
        self.price.unwrap_or(0.0)
    }

    fn change_percentage_or_zero(&self) -> f64 {
        self.changes_percentage.unwrap_or(0.0)
    }

    fn change_or_zero(&self) -> f64 {
        self.change.unwrap_or(0.0)
    }

    fn volume_or_zero(&self) -> u64 {
        whole(self.volume)
    }

    fn market_cap_or_zero(&self) -> u64 {
        whole(self.market_cap)
    }

    // a zero P/E carries no information and is reported like a missing one
    fn price_to_earnings(&self) -> Option<f64> {
        self.pe.filter(|pe| *pe != 0.0)
    }
}

/// One quote of a universe fetch. `volume` and `market_cap` are whole
/// numbers: fractions are dropped and negative values become 0. A P/E of 0 is
/// reported as `null`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NormalizedQuote {
    pub ticker: String,
    pub price: f64,
    pub change: f64,
    pub change_amount: f64,
    pub volume: u64,
    pub market_cap: u64,
    pub pe: Option<f64>,
    pub day_low: f64,
    pub day_high: f64,
    pub timestamp: i64,
    pub is_real_time: bool,
    pub universe: String,
}

impl NormalizedQuote {
    pub fn from_raw(raw: &RawQuote, universe: &str, captured_at: i64) -> Self {
        NormalizedQuote {
            ticker: raw.symbol.clone().unwrap_or_default(),
            price: raw.price_or_zero(),
            change: raw.change_percentage_or_zero(),
            change_amount: raw.change_or_zero(),
            volume: raw.volume_or_zero(),
            market_cap: raw.market_cap_or_zero(),
            pe: raw.price_to_earnings(),
            day_low: raw.day_low.unwrap_or(0.0),
            day_high: raw.day_high.unwrap_or(0.0),
            timestamp: captured_at,
            is_real_time: true,
            universe: universe.to_string(),
        }
    }
}

/// Single-ticker quote with the yearly range and listing exchange. `pe` is
/// `null` only when the upstream leaves it out. `volume` and `market_cap` are
/// rounded down to whole numbers.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct QuoteDetail {
    pub ticker: String,
    pub price: f64,
    pub change: f64,
    pub change_amount: f64,
    pub volume: u64,
    pub market_cap: u64,
    pub pe: Option<f64>,
    pub day_low: f64,
    pub day_high: f64,
    pub year_low: f64,
    pub year_high: f64,
    pub timestamp: i64,
    pub exchange: String,
    pub is_real_time: bool,
}

impl QuoteDetail {
    pub fn from_raw(raw: &RawQuote, requested_ticker: &str, captured_at: i64) -> Self {
        QuoteDetail {
            ticker: raw
                .symbol
                .clone()
                .unwrap_or_else(|| requested_ticker.to_uppercase()),
            price: raw.price_or_zero(),
            change: raw.change_percentage_or_zero(),
            change_amount: raw.change_or_zero(),
            volume: raw.volume_or_zero(),
            market_cap: raw.market_cap_or_zero(),
            pe: raw.pe,
            day_low: raw.day_low.unwrap_or(0.0),
            day_high: raw.day_high.unwrap_or(0.0),
            year_low: raw.year_low.unwrap_or(0.0),
            year_high: raw.year_high.unwrap_or(0.0),
            timestamp: captured_at,
            exchange: raw
                .exchange
                .clone()
                .unwrap_or(DEFAULT_EXCHANGE.to_string()),
            is_real_time: true,
        }
    }
}

/// `volume` and `market_cap` are rounded down to whole numbers.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BatchQuote {
    pub ticker: String,
    pub price: f64,
    pub change: f64,
    pub change_amount: f64,
    pub volume: u64,
    pub market_cap: u64,
    pub timestamp: i64,
    pub is_real_time: bool,
}

impl BatchQuote {
    pub fn from_raw(raw: &RawQuote, captured_at: i64) -> Self {
        BatchQuote {
            ticker: raw.symbol.clone().unwrap_or_default(),
            price: raw.price_or_zero(),
            change: raw.change_percentage_or_zero(),
            change_amount: raw.change_or_zero(),
            volume: raw.volume_or_zero(),
            market_cap: raw.market_cap_or_zero(),
            timestamp: captured_at,
            is_real_time: true,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RealtimeQuote {
    pub ticker: String,
    pub price: f64,
    pub change: f64,
    pub change_amount: f64,
    pub volume: u64,
    pub timestamp: i64,
    pub is_real_time: bool,
    pub source: String,
}

impl RealtimeQuote {
    /// Price and volume come from the short quote when present, otherwise
    /// from the full quote.
    pub fn from_raw(ticker: &str, short: &RawQuote, detail: &RawQuote, captured_at: i64) -> Self {
        RealtimeQuote {
            ticker: ticker.to_string(),
            price: short.price.or(detail.price).unwrap_or(0.0),
            change: detail.change_percentage_or_zero(),
            change_amount: detail.change_or_zero(),
            volume: whole(short.volume.or(detail.volume)),
            timestamp: captured_at,
            is_real_time: true,
            source: REALTIME_SOURCE.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AggregateResult {
    pub status: Status,
    pub universe: String,
    pub count: usize,
    pub total_requested: usize,
    pub quotes: Vec<NormalizedQuote>,
    pub provider: String,
    pub fetch_time: String,
}

impl AggregateResult {
    pub fn new(
        universe: &str,
        total_requested: usize,
        quotes: Vec<NormalizedQuote>,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        AggregateResult {
            status: Status::Success,
            universe: universe.to_string(),
            count: quotes.len(),
            total_requested,
            quotes,
            provider: BULK_PROVIDER.to_string(),
            fetch_time: iso_timestamp(fetched_at),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BatchQuotesResult {
    pub status: Status,
    pub count: usize,
    pub quotes: Vec<BatchQuote>,
    pub provider: String,
}

impl BatchQuotesResult {
    pub fn new(quotes: Vec<BatchQuote>) -> Self {
        BatchQuotesResult {
            status: Status::Success,
            count: quotes.len(),
            quotes,
            provider: REALTIME_PROVIDER.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RealtimeQuotesResult {
    pub status: Status,
    pub count: usize,
    pub quotes: Vec<RealtimeQuote>,
    pub provider: String,
    pub fetch_time: String,
}

impl RealtimeQuotesResult {
    pub fn new(quotes: Vec<RealtimeQuote>, fetched_at: DateTime<Utc>) -> Self {
        RealtimeQuotesResult {
            status: Status::Success,
            count: quotes.len(),
            quotes,
            provider: REALTIME_PROVIDER.to_string(),
            fetch_time: iso_timestamp(fetched_at),
        }
    }
}

pub fn iso_timestamp(datetime: DateTime<Utc>) -> String {
    datetime.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Splits a comma-separated ticker list, upper-cases it, drops blanks and
/// keeps at most `limit` entries.
pub fn parse_tickers(tickers: &str, limit: usize) -> Vec<String> {
    tickers
        .split(',')
        .map(|ticker| ticker.trim().to_uppercase())
        .filter(|ticker| !ticker.is_empty())
        .take(limit)
        .collect()
}

fn whole(value: Option<f64>) -> u64 {
    // truncates; negatives and NaN become 0
    value.map(|v| v as u64).unwrap_or(0)
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;

    Ok(value.and_then(|value| match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;

    Ok(value.and_then(|value| match value {
        Value::String(text) if !text.is_empty() => Some(text),
        _ => None,
    }))
}
