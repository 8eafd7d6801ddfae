//! CSV-over-HTTP price feed client.
//!
//! The published feed is semicolon-delimited with one header row; each data
//! row is `name;price` with the price as an exact-decimal string. A malformed
//! row fails the whole fetch rather than being silently dropped.

use std::io::Read;
use std::time::Duration;

use anyhow::anyhow;
use bigdecimal::BigDecimal;
use csv::{ReaderBuilder, StringRecord};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONNECTION};
use tracing::{debug, instrument};

use crate::catalog::error::Error;
use crate::catalog::product::PriceUpdate;
use crate::catalog::service::PriceFeed;

#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub http_timeout: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            http_timeout: Duration::from_secs(30),
        }
    }
}

pub struct HttpFeed {
    cli: reqwest::Client,
}

impl HttpFeed {
    pub fn new(cfg: FeedConfig) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("text/csv; charset=utf-8"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

        let cli = reqwest::Client::builder()
            .timeout(cfg.http_timeout)
            .default_headers(headers)
            .build()
            .map_err(Error::internal)?;
        Ok(Self { cli })
    }
}

#[async_trait::async_trait]
impl PriceFeed for HttpFeed {
    #[instrument(skip(self))]
    async fn list(&self, locator: &str) -> Result<Vec<PriceUpdate>, Error> {
        let resp = self.cli.get(locator).send().await.map_err(|e| {
            Error::internal(anyhow::Error::new(e).context("price feed request failed"))
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::internal(anyhow!(
                "price feed returned {status}, expected 200"
            )));
        }

        let body = resp.bytes().await.map_err(|e| {
            Error::internal(anyhow::Error::new(e).context("price feed body read failed"))
        })?;

        let updates = parse_feed(body.as_ref())?;
        debug!(rows = updates.len(), "parsed price feed");
        Ok(updates)
    }
}

/// Parse a `name;price` CSV document, skipping the single header row.
pub fn parse_feed(input: impl Read) -> Result<Vec<PriceUpdate>, Error> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .from_reader(input);

    let mut updates = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            Error::internal(anyhow::Error::new(e).context(format!("malformed csv row {}", i + 1)))
        })?;
        updates.push(record_to_update(&record, i + 1)?);
    }
    Ok(updates)
}

fn record_to_update(record: &StringRecord, row: usize) -> Result<PriceUpdate, Error> {
    let name = record
        .get(0)
        .ok_or_else(|| Error::internal(anyhow!("csv row {row}: missing name column")))?;
    let raw_price = record
        .get(1)
        .ok_or_else(|| Error::internal(anyhow!("csv row {row}: missing price column")))?;

    let price = raw_price.trim().parse::<BigDecimal>().map_err(|e| {
        Error::internal(
            anyhow::Error::new(e).context(format!("csv row {row}: bad price {raw_price:?}")),
        )
    })?;

    Ok(PriceUpdate {
        name: name.to_string(),
        price,
    })
}
