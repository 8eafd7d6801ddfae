use std::sync::Arc;

use tracing::{info, instrument};
use url::Url;

use crate::catalog::error::Error;
use crate::catalog::options::PageQuery;
use crate::catalog::product::{PriceUpdate, Product};
use crate::catalog::store::CatalogStore;

/// Source of `(name, price)` pairs, typically CSV over HTTP.
#[async_trait::async_trait]
pub trait PriceFeed: Send + Sync {
    async fn list(&self, locator: &str) -> Result<Vec<PriceUpdate>, Error>;
}

/// Ties the feed client and the store together behind the two operations the
/// remote API exposes: fetch-and-reconcile, and paginated list.
#[derive(Clone)]
pub struct CatalogService {
    feed: Arc<dyn PriceFeed>,
    store: CatalogStore,
}

impl CatalogService {
    pub fn new(feed: Arc<dyn PriceFeed>, store: CatalogStore) -> Self {
        Self { feed, store }
    }

    /// Pull the price list at `locator` and reconcile it into the catalog.
    #[instrument(skip(self))]
    pub async fn fetch(&self, locator: &str) -> Result<(), Error> {
        validate_locator(locator)?;

        let updates = self.feed.list(locator).await?;
        info!(rows = updates.len(), "fetched price feed");

        self.store.reconcile(&updates).await
    }

    /// Paginated, sorted catalog read.
    pub async fn list(&self, query: &PageQuery) -> Result<Vec<Product>, Error> {
        self.store.query(query).await
    }
}

fn validate_locator(locator: &str) -> Result<(), Error> {
    Url::parse(locator).map(|_| ()).map_err(|e| {
        Error::invalid_input(anyhow::Error::new(e).context(format!("bad feed locator: {locator}")))
    })
}
