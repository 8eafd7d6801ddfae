use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use pricebook::catalog::{CatalogService, CatalogStore, PageQuery, Product, StoreConfig};
use pricebook::config::Config;
use pricebook::db::Db;
use pricebook::ingest::{FeedConfig, HttpFeed};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pbctl", version, about = "Pricebook admin CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Commands {
    /// Fetch a CSV price list (`name;price` rows) and reconcile it into the catalog
    Fetch {
        /// Feed URL
        url: String,
    },
    /// List catalog products
    List {
        /// Sort field: name | price | priceUpdateCount | lastModified
        #[arg(long)]
        sort_by: Option<String>,
        /// Sort descending instead of ascending
        #[arg(long, default_value_t = false)]
        descending: bool,
        /// Page size (0 = unbounded)
        #[arg(long, default_value_t = 0)]
        limit: u32,
        /// Walk every page through the seek cursor instead of stopping after one
        #[arg(long, default_value_t = false)]
        all: bool,
    },
    /// Print row counts for the catalog tables
    DbCounts,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn,pricebook=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let cfg = Config::from_env()?;

    let db = Db::connect(&cfg.database_url, cfg.db_max_conns).await?;
    let store = CatalogStore::new(
        db.clone(),
        StoreConfig {
            query_timeout: cfg.query_timeout,
        },
    );

    match cli.command {
        Commands::Fetch { url } => {
            let feed = HttpFeed::new(FeedConfig {
                http_timeout: cfg.http_timeout,
            })?;
            let service = CatalogService::new(Arc::new(feed), store);
            service.fetch(&url).await?;
            println!("feed reconciled");
        }
        Commands::List {
            sort_by,
            descending,
            limit,
            all,
        } => {
            if all {
                let page_size = if limit == 0 { 100 } else { limit };
                let mut cursor: Option<Product> = None;
                let mut total = 0usize;
                loop {
                    let page = store
                        .query(&build_query(sort_by.as_deref(), descending, page_size, cursor.take())?)
                        .await?;
                    if page.is_empty() {
                        break;
                    }
                    total += page.len();
                    cursor = page.last().cloned();
                    print_products(&page);
                }
                println!("-- {total} products");
            } else {
                let page = store
                    .query(&build_query(sort_by.as_deref(), descending, limit, None)?)
                    .await?;
                print_products(&page);
                println!("-- {} products", page.len());
            }
        }
        Commands::DbCounts => {
            let products: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
                .fetch_one(&db.pool)
                .await?;
            println!("products: {products}");
        }
    }

    Ok(())
}

fn build_query(
    sort_by: Option<&str>,
    descending: bool,
    limit: u32,
    cursor: Option<Product>,
) -> Result<PageQuery> {
    let mut builder = PageQuery::builder();
    if let Some(field) = sort_by {
        builder = builder.sorting(field, !descending)?;
    }
    Ok(builder.paging(limit, cursor).build())
}

fn print_products(products: &[Product]) {
    for p in products {
        println!(
            "{:>8}  {:<40}  {:>12}  x{:<4}  {}",
            p.id,
            p.name,
            p.price_fixed2(),
            p.price_update_count,
            p.last_modified.to_rfc3339()
        );
    }
}
