//! Query descriptors: paging and sorting intent, validated at construction.

use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};

use crate::catalog::error::Error;
use crate::catalog::product::Product;

/// Catalog fields a query may sort on.
///
/// Each variant carries its own column name and typed cursor accessor, so an
/// unknown field is rejected when the query is built rather than when the
/// seek predicate is assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    Price,
    PriceUpdateCount,
    LastModified,
}

/// Cursor value for a sort field, typed per column.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SortKey<'a> {
    Name(&'a str),
    Price(&'a BigDecimal),
    PriceUpdateCount(i64),
    LastModified(DateTime<Utc>),
}

impl SortField {
    pub const ALL: [SortField; 4] = [
        SortField::Name,
        SortField::Price,
        SortField::PriceUpdateCount,
        SortField::LastModified,
    ];

    /// External identifier, as it appears in requests.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::Price => "price",
            SortField::PriceUpdateCount => "priceUpdateCount",
            SortField::LastModified => "lastModified",
        }
    }

    /// Column backing this field in the products table.
    pub(crate) fn column(&self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::Price => "price",
            SortField::PriceUpdateCount => "price_update_count",
            SortField::LastModified => "last_modified",
        }
    }

    /// Cursor value of `product` for this field.
    pub(crate) fn key_of<'a>(&self, product: &'a Product) -> SortKey<'a> {
        match self {
            SortField::Name => SortKey::Name(&product.name),
            SortField::Price => SortKey::Price(&product.price),
            SortField::PriceUpdateCount => SortKey::PriceUpdateCount(product.price_update_count),
            SortField::LastModified => SortKey::LastModified(product.last_modified),
        }
    }
}

impl FromStr for SortField {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self, Error> {
        SortField::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(raw))
            .ok_or_else(|| Error::invalid_input(anyhow!("cannot sort products by field: {raw}")))
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sorting {
    pub field: SortField,
    pub ascending: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paging {
    /// Row cap for the page; 0 means unbounded.
    pub limit: u32,
    /// Last product of the previous page, absent on the first page.
    pub last: Option<Product>,
}

/// Immutable page descriptor. The empty descriptor means "everything, in
/// identity order".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageQuery {
    sorting: Option<Sorting>,
    paging: Option<Paging>,
}

impl PageQuery {
    pub fn builder() -> PageQueryBuilder {
        PageQueryBuilder::default()
    }

    pub fn sorting(&self) -> Option<&Sorting> {
        self.sorting.as_ref()
    }

    pub fn paging(&self) -> Option<&Paging> {
        self.paging.as_ref()
    }

    /// Row cap, `None` when unset or 0 (unbounded).
    pub fn limit(&self) -> Option<u32> {
        self.paging.as_ref().map(|p| p.limit).filter(|limit| *limit > 0)
    }

    pub(crate) fn cursor(&self) -> Option<&Product> {
        self.paging.as_ref().and_then(|p| p.last.as_ref())
    }
}

/// Builder over the two independent query axes. Applying paging and sorting
/// in either order produces the same query.
#[derive(Debug, Default)]
pub struct PageQueryBuilder {
    sorting: Option<Sorting>,
    paging: Option<Paging>,
}

impl PageQueryBuilder {
    /// Sort by `field`, matched case-insensitively against the catalog's four
    /// sortable fields. Unknown fields fail here, before storage is touched,
    /// and no default sort is substituted.
    pub fn sorting(mut self, field: &str, ascending: bool) -> Result<Self, Error> {
        let field = field.parse::<SortField>()?;
        self.sorting = Some(Sorting { field, ascending });
        Ok(self)
    }

    /// Cap the page at `limit` rows (0 = unbounded) and resume after `last`.
    pub fn paging(mut self, limit: u32, last: Option<Product>) -> Self {
        self.paging = Some(Paging { limit, last });
        self
    }

    pub fn build(self) -> PageQuery {
        PageQuery {
            sorting: self.sorting,
            paging: self.paging,
        }
    }
}
