use crate::config::BatchSettings;
use crate::data::Interface;
use crate::errors::Error;
use crate::quote::{
    AggregateResult, BatchQuote, BatchQuotesResult, NormalizedQuote, QuoteDetail, RawQuote,
    RealtimeQuote, RealtimeQuotesResult,
};
use crate::universe::{UniverseRegistry, DEFAULT_UNIVERSE};
use chrono::Utc;
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, info, warn};

pub const BATCH_QUOTES_LIMIT: usize = 20;

pub const REALTIME_QUOTES_LIMIT: usize = 10;

/// Fetches quotes from the upstream provider.
///
/// Universe fetches walk the ticker list one batch at a time and sleep between
/// batches; the pause is the only thing keeping the upstream under its rate
/// limit, so batches are never issued concurrently.
#[derive(Clone)]
pub struct Fetcher {
    client: Arc<dyn Interface>,
    registry: Arc<UniverseRegistry>,
    settings: BatchSettings,
}

impl Fetcher {
    pub fn new(
        client: Arc<dyn Interface>,
        registry: Arc<UniverseRegistry>,
        settings: BatchSettings,
    ) -> Self {
        Fetcher {
            client,
            registry,
            settings,
        }
    }

    pub fn registry(&self) -> &UniverseRegistry {
        &self.registry
    }

    pub async fn fetch_universe(&self, universe: &str) -> Result<AggregateResult, Error> {
        if self.settings.batch_size == 0 {
            return Err(Error::ConfigurationError(
                "batch size must be greater than zero".to_string(),
            ));
        }

        if !self.registry.contains(universe) {
            info!("Unknown universe {}, using {}", universe, DEFAULT_UNIVERSE);
        }

        let tickers = self.registry.resolve(universe);

        info!(
            "Processing {} stocks for {} universe",
            tickers.len(),
            universe
        );

        let batches: Vec<&[String]> = tickers.chunks(self.settings.batch_size).collect();
        let batch_count = batches.len();

        let mut quotes: Vec<NormalizedQuote> = Vec::with_capacity(tickers.len());

        for (index, batch) in batches.into_iter().enumerate() {
            debug!(
                "Processing batch {}/{}: {}",
                index + 1,
                batch_count,
                batch.join(", ")
            );

            match self.client.get_quotes(batch.to_vec()).await {
                Ok(body) => {
                    let captured_at = Utc::now().timestamp();

                    match RawQuote::records(body) {
                        Some(records) => quotes.extend(
                            records
                                .iter()
                                .map(|raw| NormalizedQuote::from_raw(raw, universe, captured_at)),
                        ),
                        None => warn!(
                            "Batch {} returned a non-array body, skipping",
                            batch.join(", ")
                        ),
                    }
                }
                Err(e) if e.is_batch_scoped() => {
                    warn!("Batch error for {}: {}", batch.join(", "), e);
                }
                Err(e) => return Err(e),
            }

            if index + 1 < batch_count {
                sleep(self.settings.batch_delay).await;
            }
        }

        info!(
            "Successfully fetched {} quotes from {} universe",
            quotes.len(),
            universe
        );

        Ok(AggregateResult::new(
            universe,
            tickers.len(),
            quotes,
            Utc::now(),
        ))
    }

    /// Full quote for one ticker, `None` when the upstream has no record.
    pub async fn fetch_quote(&self, ticker: &str) -> Result<Option<QuoteDetail>, Error> {
        let ticker = ticker.trim().to_uppercase();

        info!("Fetching real-time quote for {}", ticker);

        let body = self.client.get_quotes(vec![ticker.clone()]).await?;

        let captured_at = Utc::now().timestamp();

        Ok(first_record(body).map(|raw| QuoteDetail::from_raw(&raw, &ticker, captured_at)))
    }

    /// One upstream call for at most [`BATCH_QUOTES_LIMIT`] tickers.
    pub async fn fetch_batch(&self, tickers: &[String]) -> Result<BatchQuotesResult, Error> {
        let tickers: Vec<String> = tickers.iter().take(BATCH_QUOTES_LIMIT).cloned().collect();

        info!("Fetching real-time batch quotes for: {}", tickers.join(", "));

        let body = self.client.get_quotes(tickers).await?;

        let captured_at = Utc::now().timestamp();

        let quotes: Vec<BatchQuote> = RawQuote::records(body)
            .unwrap_or_default()
            .iter()
            .map(|raw| BatchQuote::from_raw(raw, captured_at))
            .collect();

        info!("Fetched {} real-time quotes from FMP", quotes.len());

        Ok(BatchQuotesResult::new(quotes))
    }

    /// Short quote then full quote for each of the first
    /// [`REALTIME_QUOTES_LIMIT`] tickers, one ticker at a time. Tickers that
    /// fail or have no data are left out.
    pub async fn fetch_realtime(&self, tickers: &[String]) -> Result<RealtimeQuotesResult, Error> {
        let mut quotes: Vec<RealtimeQuote> = Vec::new();

        for ticker in tickers.iter().take(REALTIME_QUOTES_LIMIT) {
            match self.fetch_realtime_quote(ticker).await {
                Ok(Some(quote)) => {
                    debug!("{}: {} (REAL-TIME)", quote.ticker, quote.price);
                    quotes.push(quote);
                }
                Ok(None) => debug!("No real-time data for {}", ticker),
                Err(e) if e.is_batch_scoped() => {
                    warn!("Error fetching real-time data for {}: {}", ticker, e);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(RealtimeQuotesResult::new(quotes, Utc::now()))
    }

    async fn fetch_realtime_quote(&self, ticker: &str) -> Result<Option<RealtimeQuote>, Error> {
        let ticker = ticker.trim().to_uppercase();

        let short = match first_record(self.client.get_short_quote(ticker.clone()).await?) {
            Some(short) => short,
            None => return Ok(None),
        };

        let detail = match first_record(self.client.get_quotes(vec![ticker.clone()]).await?) {
            Some(detail) => detail,
            None => return Ok(None),
        };

        Ok(Some(RealtimeQuote::from_raw(
            &ticker,
            &short,
            &detail,
            Utc::now().timestamp(),
        )))
    }
}

fn first_record(body: serde_json::Value) -> Option<RawQuote> {
    RawQuote::records(body).and_then(|records| records.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MockInterface;
    use crate::quote::Status;
    use mockall::predicate::eq;
    use mockall::Sequence;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn registry(universes: &[(&str, &[&str])]) -> Arc<UniverseRegistry> {
        let table: BTreeMap<String, Vec<String>> = universes
            .iter()
            .map(|(name, tickers)| {
                (
                    name.to_string(),
                    tickers.iter().map(|t| t.to_string()).collect(),
                )
            })
            .collect();

        Arc::new(UniverseRegistry::from_table(table).unwrap())
    }

    fn no_delay() -> BatchSettings {
        BatchSettings {
            batch_size: 8,
            batch_delay: Duration::ZERO,
        }
    }

    fn echo_records(tickers: &[String]) -> serde_json::Value {
        json!(tickers
            .iter()
            .map(|ticker| json!({"symbol": ticker, "price": 100, "change": 1.5}))
            .collect::<Vec<_>>())
    }

    #[tokio::test]
    async fn test_fetch_universe_three_tickers() {
        let mut mock_client = MockInterface::new();

        mock_client
            .expect_get_quotes()
            .with(eq(vec![
                "AAPL".to_string(),
                "MSFT".to_string(),
                "NVDA".to_string(),
            ]))
            .times(1)
            .returning(|tickers| Ok(echo_records(&tickers)));

        let fetcher = Fetcher::new(
            Arc::new(mock_client),
            registry(&[("popular", &["AAPL", "MSFT", "NVDA"])]),
            no_delay(),
        );

        let result = fetcher.fetch_universe("popular").await.unwrap();

        assert_eq!(result.status, Status::Success);
        assert_eq!(result.universe, "popular");
        assert_eq!(result.count, 3);
        assert_eq!(result.total_requested, 3);
        assert_eq!(result.provider, "FMP Bulk Real-time");

        for quote in &result.quotes {
            assert_eq!(quote.price, 100.0);
            assert_eq!(quote.change_amount, 1.5);
            assert!(quote.is_real_time);
            assert_eq!(quote.universe, "popular");
            assert_eq!(quote.pe, None);
        }

        let tickers: Vec<&str> = result.quotes.iter().map(|q| q.ticker.as_str()).collect();

        assert_eq!(tickers, vec!["AAPL", "MSFT", "NVDA"]);
    }

    #[tokio::test]
    async fn test_fetch_universe_batches_are_contiguous_slices() {
        let builtin = UniverseRegistry::builtin();
        let popular: Vec<String> = builtin.resolve("popular").to_vec();

        let mut sequence = Sequence::new();
        let mut mock_client = MockInterface::new();

        for chunk in popular.chunks(8) {
            mock_client
                .expect_get_quotes()
                .with(eq(chunk.to_vec()))
                .times(1)
                .in_sequence(&mut sequence)
                .returning(|tickers| Ok(echo_records(&tickers)));
        }

        let fetcher = Fetcher::new(Arc::new(mock_client), Arc::new(builtin), no_delay());

        let result = fetcher.fetch_universe("sp500").await.unwrap();

        assert_eq!(result.universe, "sp500");
        assert_eq!(result.total_requested, 48);
        assert_eq!(result.count, 48);
        assert!(result.quotes.iter().all(|q| q.universe == "sp500"));
    }

    #[tokio::test]
    async fn test_fetch_universe_upstream_calls_match_batch_count() {
        for (size, expected_calls) in [(1usize, 1usize), (8, 1), (9, 2), (16, 2), (17, 3), (24, 3)] {
            let tickers: Vec<String> = (0..size).map(|i| format!("T{}", i)).collect();
            let names: Vec<&str> = tickers.iter().map(|t| t.as_str()).collect();

            let mut mock_client = MockInterface::new();

            mock_client
                .expect_get_quotes()
                .withf(|tickers| !tickers.is_empty() && tickers.len() <= 8)
                .times(expected_calls)
                .returning(|tickers| Ok(echo_records(&tickers)));

            let fetcher = Fetcher::new(
                Arc::new(mock_client),
                registry(&[("popular", names.as_slice())]),
                no_delay(),
            );

            let result = fetcher.fetch_universe("popular").await.unwrap();

            assert_eq!(result.total_requested, size);
            assert_eq!(result.count, size);
        }
    }

    #[tokio::test]
    async fn test_fetch_universe_skips_failed_batch() {
        let mut sequence = Sequence::new();
        let mut mock_client = MockInterface::new();

        mock_client
            .expect_get_quotes()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|tickers| Ok(echo_records(&tickers)));

        mock_client
            .expect_get_quotes()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Err(Error::OtherError("connection reset".to_string())));

        mock_client
            .expect_get_quotes()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|tickers| Ok(echo_records(&tickers)));

        let tickers: Vec<String> = (0..20).map(|i| format!("T{}", i)).collect();
        let names: Vec<&str> = tickers.iter().map(|t| t.as_str()).collect();

        let fetcher = Fetcher::new(
            Arc::new(mock_client),
            registry(&[("popular", names.as_slice())]),
            no_delay(),
        );

        let result = fetcher.fetch_universe("popular").await.unwrap();

        assert_eq!(result.status, Status::Success);
        assert_eq!(result.total_requested, 20);
        assert_eq!(result.count, 12);
        assert_eq!(result.quotes[8].ticker, "T16");
    }

    #[tokio::test]
    async fn test_fetch_universe_non_array_body_contributes_nothing() {
        let mut sequence = Sequence::new();
        let mut mock_client = MockInterface::new();

        mock_client
            .expect_get_quotes()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(json!({"Error Message": "Limit Reach"})));

        mock_client
            .expect_get_quotes()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(json!([{"symbol": "T8"}])));

        let tickers: Vec<String> = (0..10).map(|i| format!("T{}", i)).collect();
        let names: Vec<&str> = tickers.iter().map(|t| t.as_str()).collect();

        let fetcher = Fetcher::new(
            Arc::new(mock_client),
            registry(&[("popular", names.as_slice())]),
            no_delay(),
        );

        let result = fetcher.fetch_universe("popular").await.unwrap();

        assert_eq!(result.count, 1);
        assert!(result.count <= result.total_requested);
        assert_eq!(result.quotes[0].ticker, "T8");
        assert_eq!(result.quotes[0].price, 0.0);
        assert_eq!(result.quotes[0].pe, None);
    }

    #[tokio::test]
    async fn test_fetch_universe_aborts_on_request_scoped_error() {
        let mut mock_client = MockInterface::new();

        mock_client
            .expect_get_quotes()
            .times(1)
            .returning(|_| Err(Error::URLError(url::ParseError::RelativeUrlWithoutBase)));

        let fetcher = Fetcher::new(
            Arc::new(mock_client),
            Arc::new(UniverseRegistry::builtin()),
            no_delay(),
        );

        let result = fetcher.fetch_universe("biotech").await;

        assert!(matches!(result, Err(Error::URLError(_))));
    }

    #[tokio::test]
    async fn test_fetch_universe_rejects_zero_batch_size() {
        let mock_client = MockInterface::new();

        let fetcher = Fetcher::new(
            Arc::new(mock_client),
            Arc::new(UniverseRegistry::builtin()),
            BatchSettings {
                batch_size: 0,
                batch_delay: Duration::ZERO,
            },
        );

        let result = fetcher.fetch_universe("popular").await;

        assert!(matches!(result, Err(Error::ConfigurationError(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_universe_pauses_between_batches() {
        let mut mock_client = MockInterface::new();

        mock_client
            .expect_get_quotes()
            .times(3)
            .returning(|_| Err(Error::OtherError("timeout".to_string())));

        let tickers: Vec<String> = (0..24).map(|i| format!("T{}", i)).collect();
        let names: Vec<&str> = tickers.iter().map(|t| t.as_str()).collect();

        let fetcher = Fetcher::new(
            Arc::new(mock_client),
            registry(&[("popular", names.as_slice())]),
            BatchSettings::default(),
        );

        let started = tokio::time::Instant::now();

        let result = fetcher.fetch_universe("popular").await.unwrap();

        let elapsed = started.elapsed();

        // two pauses for three batches, none after the last
        assert!(elapsed >= Duration::from_millis(400));
        assert!(elapsed < Duration::from_millis(600));
        assert_eq!(result.count, 0);
        assert_eq!(result.status, Status::Success);
    }

    #[tokio::test]
    async fn test_fetch_quote() {
        let mut mock_client = MockInterface::new();

        mock_client
            .expect_get_quotes()
            .with(eq(vec!["AAPL".to_string()]))
            .times(1)
            .returning(|_| {
                Ok(json!([{
                    "symbol": "AAPL",
                    "price": 189.5,
                    "yearHigh": 199.62,
                    "exchange": "NASDAQ"
                }]))
            });

        mock_client
            .expect_get_quotes()
            .with(eq(vec!["ZZZZ".to_string()]))
            .times(1)
            .returning(|_| Ok(json!([])));

        let fetcher = Fetcher::new(
            Arc::new(mock_client),
            Arc::new(UniverseRegistry::builtin()),
            no_delay(),
        );

        let quote = fetcher.fetch_quote(" aapl ").await.unwrap().unwrap();

        assert_eq!(quote.ticker, "AAPL");
        assert_eq!(quote.price, 189.5);
        assert_eq!(quote.year_high, 199.62);

        assert!(fetcher.fetch_quote("zzzz").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fetch_batch_caps_tickers() {
        let mut mock_client = MockInterface::new();

        mock_client
            .expect_get_quotes()
            .withf(|tickers| tickers.len() == BATCH_QUOTES_LIMIT)
            .times(1)
            .returning(|tickers| Ok(echo_records(&tickers)));

        let fetcher = Fetcher::new(
            Arc::new(mock_client),
            Arc::new(UniverseRegistry::builtin()),
            no_delay(),
        );

        let tickers: Vec<String> = (0..25).map(|i| format!("T{}", i)).collect();

        let result = fetcher.fetch_batch(&tickers).await.unwrap();

        assert_eq!(result.count, 20);
        assert_eq!(result.provider, "FMP Real-time");
        assert_eq!(result.quotes[0].price, 100.0);
    }

    #[tokio::test]
    async fn test_fetch_batch_propagates_upstream_error() {
        let mut mock_client = MockInterface::new();

        mock_client
            .expect_get_quotes()
            .returning(|_| Err(Error::OtherError("connection refused".to_string())));

        let fetcher = Fetcher::new(
            Arc::new(mock_client),
            Arc::new(UniverseRegistry::builtin()),
            no_delay(),
        );

        let result = fetcher.fetch_batch(&["AAPL".to_string()]).await;

        assert!(matches!(result, Err(Error::OtherError(_))));
    }

    #[tokio::test]
    async fn test_fetch_realtime() {
        let mut mock_client = MockInterface::new();

        mock_client
            .expect_get_short_quote()
            .with(eq("AAPL".to_string()))
            .returning(|_| Ok(json!([{"symbol": "AAPL", "price": 190.25, "volume": 1200}])));

        mock_client
            .expect_get_short_quote()
            .with(eq("MSFT".to_string()))
            .returning(|_| Err(Error::OtherError("timeout".to_string())));

        mock_client
            .expect_get_short_quote()
            .with(eq("NOPE".to_string()))
            .returning(|_| Ok(json!([])));

        mock_client
            .expect_get_quotes()
            .with(eq(vec!["AAPL".to_string()]))
            .times(1)
            .returning(|_| {
                Ok(json!([{
                    "symbol": "AAPL",
                    "price": 189.5,
                    "changesPercentage": 0.4,
                    "change": 0.75,
                    "volume": 99
                }]))
            });

        let fetcher = Fetcher::new(
            Arc::new(mock_client),
            Arc::new(UniverseRegistry::builtin()),
            no_delay(),
        );

        let tickers = vec!["aapl".to_string(), "MSFT".to_string(), "NOPE".to_string()];

        let result = fetcher.fetch_realtime(&tickers).await.unwrap();

        assert_eq!(result.count, 1);
        assert_eq!(result.quotes[0].ticker, "AAPL");
        assert_eq!(result.quotes[0].price, 190.25);
        assert_eq!(result.quotes[0].volume, 1200);
        assert_eq!(result.quotes[0].change_amount, 0.75);
    }
}
