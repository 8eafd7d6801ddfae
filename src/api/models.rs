// API request/response models (DTOs)

use anyhow::anyhow;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::error::Error;
use crate::catalog::options::PageQuery;
use crate::catalog::product::Product;

/// Standard API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            meta: Some(Meta::now()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            meta: Some(Meta::now()),
        }
    }
}

/// Metadata included in all API responses
#[derive(Debug, Serialize, Deserialize)]
pub struct Meta {
    pub timestamp: DateTime<Utc>,
    pub request_id: String,
    pub version: String,
}

impl Meta {
    pub fn now() -> Self {
        Self {
            timestamp: Utc::now(),
            request_id: uuid::Uuid::new_v4().to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub uptime_seconds: u64,
}

/// Wire form of a catalog product. `id` travels as a string and `price` as a
/// fixed two-decimal string so clients never lose precision.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: String,
    pub name: String,
    pub price: String,
    pub price_update_count: u64,
    pub last_modified: DateTime<Utc>,
}

impl From<&Product> for ProductDto {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price: product.price_fixed2(),
            price_update_count: product.price_update_count.max(0) as u64,
            last_modified: product.last_modified,
        }
    }
}

impl ProductDto {
    /// Rebuild the core entity, e.g. when the DTO arrives as a page cursor.
    pub fn into_product(self) -> Result<Product, Error> {
        let id = self.id.parse::<i64>().map_err(|e| {
            Error::invalid_input(
                anyhow::Error::new(e).context(format!("cursor id {:?} is not an identity", self.id)),
            )
        })?;
        let price = self.price.parse::<BigDecimal>().map_err(|e| {
            Error::invalid_input(
                anyhow::Error::new(e).context(format!("cursor price {:?} is not a decimal", self.price)),
            )
        })?;
        Ok(Product {
            id,
            name: self.name,
            price,
            price_update_count: i64::try_from(self.price_update_count)
                .map_err(|_| Error::invalid_input(anyhow!("cursor update count out of range")))?,
            last_modified: self.last_modified,
        })
    }
}

/// Trigger a feed fetch-and-reconcile.
#[derive(Debug, Serialize, Deserialize)]
pub struct FetchRequest {
    pub url: String,
}

/// Paginated catalog read. Both axes are optional and independent.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRequest {
    #[serde(default)]
    pub paging: Option<PagingDto>,
    #[serde(default)]
    pub sorting: Option<SortingDto>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagingDto {
    /// 0 means unbounded.
    #[serde(default)]
    pub limit: u32,
    /// Last product of the previous page.
    #[serde(default)]
    pub last: Option<ProductDto>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortingDto {
    pub sort_by: String,
    #[serde(default)]
    pub ascending: bool,
}

impl ListRequest {
    /// Translate the wire request into a validated core query.
    pub fn into_query(self) -> Result<PageQuery, Error> {
        let mut builder = PageQuery::builder();
        if let Some(sorting) = self.sorting {
            builder = builder.sorting(&sorting.sort_by, sorting.ascending)?;
        }
        if let Some(paging) = self.paging {
            let last = paging.last.map(ProductDto::into_product).transpose()?;
            builder = builder.paging(paging.limit, last);
        }
        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> Product {
        Product {
            id: 17,
            name: "mozzarella".into(),
            price: "30.1".parse().expect("price literal"),
            price_update_count: 3,
            last_modified: DateTime::from_timestamp(1_700_000_000, 0).expect("timestamp"),
        }
    }

    #[test]
    fn dto_renders_wire_formats() {
        let dto = ProductDto::from(&product());
        assert_eq!(dto.id, "17");
        assert_eq!(dto.price, "30.10");
        assert_eq!(dto.price_update_count, 3);
    }

    #[test]
    fn dto_round_trips_back_to_the_entity() {
        let original = product();
        let restored = ProductDto::from(&original).into_product().expect("round trip");
        assert_eq!(restored.id, original.id);
        assert_eq!(restored.name, original.name);
        assert_eq!(restored.price, original.price);
        assert_eq!(restored.last_modified, original.last_modified);
    }

    #[test]
    fn non_numeric_cursor_id_is_invalid_input() {
        let mut dto = ProductDto::from(&product());
        dto.id = "definitely-not-an-id".into();
        let err = dto.into_product().expect_err("bad id must be rejected");
        assert!(err.is_invalid_input());
    }

    #[test]
    fn list_request_with_bogus_sort_field_is_rejected() {
        let req = ListRequest {
            paging: None,
            sorting: Some(SortingDto {
                sort_by: "bogus".into(),
                ascending: true,
            }),
        };
        let err = req.into_query().expect_err("bogus sort must be rejected");
        assert!(err.is_invalid_input());
    }

    #[test]
    fn list_request_carries_cursor_through_to_the_query() {
        let req = ListRequest {
            paging: Some(PagingDto {
                limit: 5,
                last: Some(ProductDto::from(&product())),
            }),
            sorting: Some(SortingDto {
                sort_by: "price".into(),
                ascending: true,
            }),
        };
        let query = req.into_query().expect("valid request");
        assert_eq!(query.limit(), Some(5));
        assert_eq!(query.paging().and_then(|p| p.last.as_ref()).map(|p| p.id), Some(17));
    }

    #[test]
    fn empty_list_request_builds_the_empty_query() {
        let query = ListRequest::default().into_query().expect("empty request");
        assert_eq!(query, PageQuery::default());
    }
}
