//! Persistence orchestration for the product catalog.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::anyhow;
use chrono::Utc;
use sqlx::{Postgres, QueryBuilder};
use tracing::{info, instrument};

use crate::catalog::error::Error;
use crate::catalog::options::PageQuery;
use crate::catalog::product::{PriceUpdate, Product};
use crate::catalog::seek::{SeekFilter, SeekOrder};
use crate::db::Db;

/// Tuning for the store's per-call execution contexts.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Deadline applied to every statement; expiry aborts the in-flight call
    /// and surfaces a timeout-classified internal error.
    pub query_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            query_timeout: Duration::from_secs(10),
        }
    }
}

/// Executes reconciliation writes and paginated reads against the catalog.
///
/// Holds a cloned pool handle and no other state; cross-call consistency is
/// pushed entirely to Postgres through the conditional upsert in
/// [`CatalogStore::reconcile`], so concurrent calls never coordinate
/// in-process.
#[derive(Clone)]
pub struct CatalogStore {
    db: Db,
    cfg: StoreConfig,
}

impl CatalogStore {
    pub fn new(db: Db, cfg: StoreConfig) -> Self {
        Self { db, cfg }
    }

    /// Merge a price feed into the catalog as one bulk conditional upsert.
    ///
    /// Per name: insert when absent (the insert itself counts as the first
    /// update, so the counter starts at 1), bump price, counter and timestamp
    /// when the incoming price differs, and leave the row untouched
    /// otherwise. The price-differs condition is part of the statement, not a
    /// read-modify-write pair, so concurrent identical writes degrade to
    /// storage-level no-ops and racing inserts on one name collapse into the
    /// conflict action instead of surfacing a duplicate-key error.
    #[instrument(skip(self, updates), fields(batch = updates.len()))]
    pub async fn reconcile(&self, updates: &[PriceUpdate]) -> Result<(), Error> {
        if updates.is_empty() {
            return Ok(());
        }

        // A single INSERT .. ON CONFLICT may not touch the same row twice, so
        // collapse duplicate names first; the last occurrence wins.
        let mut latest: HashMap<&str, &PriceUpdate> = HashMap::new();
        for update in updates {
            latest.insert(update.name.as_str(), update);
        }
        let uniques: Vec<&PriceUpdate> = latest.into_values().collect();

        let now = Utc::now();
        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            "INSERT INTO products (name, price, price_update_count, last_modified) ",
        );
        builder.push_values(&uniques, |mut row, update| {
            row.push_bind(&update.name)
                .push_bind(&update.price)
                .push_bind(1i64)
                .push_bind(now);
        });
        builder.push(
            " ON CONFLICT (name) DO UPDATE \
             SET price = EXCLUDED.price, \
                 price_update_count = products.price_update_count + 1, \
                 last_modified = EXCLUDED.last_modified \
             WHERE products.price <> EXCLUDED.price",
        );

        let result = tokio::time::timeout(
            self.cfg.query_timeout,
            builder.build().persistent(false).execute(&self.db.pool),
        )
        .await
        .map_err(|_| deadline_exceeded("reconcile", self.cfg.query_timeout))?
        .map_err(|e| Error::internal(anyhow::Error::new(e).context("reconcile: bulk upsert failed")))?;

        info!(
            entities = uniques.len(),
            written = result.rows_affected(),
            "reconciled price feed"
        );
        Ok(())
    }

    /// Execute a paginated read: seek predicate, composite order, then limit.
    ///
    /// An empty result is an empty vec, never an error.
    #[instrument(skip(self, query))]
    pub async fn query(&self, query: &PageQuery) -> Result<Vec<Product>, Error> {
        let filter = SeekFilter::resolve(query)?;
        let order = SeekOrder::for_query(query);

        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            "SELECT id, name, price, price_update_count, last_modified FROM products",
        );
        filter.push_where(&mut builder);
        order.push_order_by(&mut builder);
        if let Some(limit) = query.limit() {
            builder.push(" LIMIT ");
            builder.push_bind(i64::from(limit));
        }

        let products = tokio::time::timeout(
            self.cfg.query_timeout,
            builder
                .build_query_as::<Product>()
                .persistent(false)
                .fetch_all(&self.db.pool),
        )
        .await
        .map_err(|_| deadline_exceeded("query", self.cfg.query_timeout))?
        .map_err(|e| Error::internal(anyhow::Error::new(e).context("query: select failed")))?;

        Ok(products)
    }
}

fn deadline_exceeded(op: &'static str, after: Duration) -> Error {
    Error::internal(anyhow!("{op}: deadline exceeded after {after:?}"))
}

// End-to-end store behavior against a live Postgres. These need a scratch
// database and therefore stay out of the default test run:
//
//   TEST_DATABASE_URL=postgres://... cargo test -- --ignored --test-threads=1
//
// Single-threaded because each test resets the products table.
#[cfg(test)]
mod pg_tests {
    use super::*;
    use crate::catalog::options::PageQuery;

    async fn store() -> CatalogStore {
        let url = std::env::var("TEST_DATABASE_URL")
            .expect("TEST_DATABASE_URL must point at a scratch database");
        let db = Db::connect(&url, 5).await.expect("connect");
        db.migrate().await.expect("migrate");
        sqlx::query("TRUNCATE products RESTART IDENTITY")
            .execute(&db.pool)
            .await
            .expect("reset products");
        CatalogStore::new(db, StoreConfig::default())
    }

    fn update(name: &str, price: &str) -> PriceUpdate {
        PriceUpdate {
            name: name.into(),
            price: price.parse().expect("price literal"),
        }
    }

    async fn all_products(store: &CatalogStore) -> Vec<Product> {
        store.query(&PageQuery::default()).await.expect("query")
    }

    #[tokio::test]
    #[ignore = "needs a scratch Postgres via TEST_DATABASE_URL"]
    async fn reconcile_is_idempotent() {
        let store = store().await;
        store.reconcile(&[update("A", "10.00")]).await.expect("first");
        store.reconcile(&[update("A", "10.00")]).await.expect("second");

        let products = all_products(&store).await;
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].price_update_count, 1, "identical write must be a no-op");
    }

    #[tokio::test]
    #[ignore = "needs a scratch Postgres via TEST_DATABASE_URL"]
    async fn price_change_bumps_counter_and_timestamp() {
        let store = store().await;
        store.reconcile(&[update("A", "10.00")]).await.expect("insert");
        let before = all_products(&store).await.remove(0);

        store.reconcile(&[update("A", "12.00")]).await.expect("update");
        let after = all_products(&store).await.remove(0);

        assert_eq!(after.price_update_count, 2);
        assert_eq!(after.price_fixed2(), "12.00");
        assert!(after.last_modified > before.last_modified);
        assert_eq!(after.id, before.id, "identity must never be reassigned");
    }

    #[tokio::test]
    #[ignore = "needs a scratch Postgres via TEST_DATABASE_URL"]
    async fn unchanged_price_preserves_timestamp() {
        let store = store().await;
        store.reconcile(&[update("A", "10.00")]).await.expect("insert");
        let before = all_products(&store).await.remove(0);

        store.reconcile(&[update("A", "10.00")]).await.expect("no-op");
        let after = all_products(&store).await.remove(0);

        assert_eq!(after.last_modified, before.last_modified);
    }

    #[tokio::test]
    #[ignore = "needs a scratch Postgres via TEST_DATABASE_URL"]
    async fn duplicate_names_in_one_batch_collapse() {
        let store = store().await;
        store
            .reconcile(&[update("A", "10.00"), update("A", "11.00")])
            .await
            .expect("batch with duplicate");

        let products = all_products(&store).await;
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].price_fixed2(), "11.00", "last occurrence wins");
    }

    #[tokio::test]
    #[ignore = "needs a scratch Postgres via TEST_DATABASE_URL"]
    async fn concurrent_insert_race_yields_one_product() {
        let store = store().await;
        let batch = [update("C", "7.00")];
        let (a, b) = tokio::join!(store.reconcile(&batch), store.reconcile(&batch));
        a.expect("first racer");
        b.expect("second racer");

        let products = all_products(&store).await;
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "C");
        assert_eq!(products[0].price_update_count, 1);
    }

    #[tokio::test]
    #[ignore = "needs a scratch Postgres via TEST_DATABASE_URL"]
    async fn names_match_byte_for_byte() {
        let store = store().await;
        store
            .reconcile(&[update("widget", "1.00"), update("Widget", "2.00")])
            .await
            .expect("reconcile");

        assert_eq!(all_products(&store).await.len(), 2);
    }

    #[tokio::test]
    #[ignore = "needs a scratch Postgres via TEST_DATABASE_URL"]
    async fn price_sorted_pages_chain_through_the_cursor() {
        let store = store().await;
        store
            .reconcile(&[update("A", "10.00"), update("B", "5.00")])
            .await
            .expect("reconcile");

        let first = store
            .query(
                &PageQuery::builder()
                    .sorting("price", true)
                    .unwrap()
                    .paging(1, None)
                    .build(),
            )
            .await
            .expect("first page");
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].name, "B");

        let second = store
            .query(
                &PageQuery::builder()
                    .sorting("price", true)
                    .unwrap()
                    .paging(1, Some(first[0].clone()))
                    .build(),
            )
            .await
            .expect("second page");
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].name, "A");
    }

    #[tokio::test]
    #[ignore = "needs a scratch Postgres via TEST_DATABASE_URL"]
    async fn pagination_is_complete_even_with_ties() {
        let store = store().await;
        // Three distinct prices, each shared by three products, so every page
        // boundary can land inside a tie.
        let mut batch = Vec::new();
        for i in 0..9 {
            batch.push(update(&format!("product-{i:02}"), &format!("{}.00", i % 3)));
        }
        store.reconcile(&batch).await.expect("reconcile");

        let mut seen = Vec::new();
        let mut cursor: Option<Product> = None;
        loop {
            let page = store
                .query(
                    &PageQuery::builder()
                        .sorting("price", true)
                        .unwrap()
                        .paging(2, cursor.take())
                        .build(),
                )
                .await
                .expect("page");
            if page.is_empty() {
                break;
            }
            cursor = page.last().cloned();
            seen.extend(page);
        }

        assert_eq!(seen.len(), 9, "every product exactly once");
        let mut ids: Vec<i64> = seen.iter().map(|p| p.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 9, "no duplicates across page boundaries");
        for pair in seen.windows(2) {
            let ordered = pair[0].price < pair[1].price
                || (pair[0].price == pair[1].price && pair[0].id < pair[1].id);
            assert!(ordered, "composite order violated: {pair:?}");
        }
    }

    #[tokio::test]
    #[ignore = "needs a scratch Postgres via TEST_DATABASE_URL"]
    async fn empty_catalog_reads_as_empty_page() {
        let store = store().await;
        assert!(all_products(&store).await.is_empty());
    }
}
