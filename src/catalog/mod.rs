//! Catalog core: the product entity model, query descriptors, seek
//! pagination, and the persistence-backed store that executes both the
//! reconciliation write path and the paginated read path.

pub mod error;
pub mod options;
pub mod product;
pub(crate) mod seek;
pub mod service;
pub mod store;

pub use error::Error;
pub use options::{PageQuery, PageQueryBuilder, Paging, SortField, Sorting};
pub use product::{PriceUpdate, Product};
pub use service::{CatalogService, PriceFeed};
pub use store::{CatalogStore, StoreConfig};
