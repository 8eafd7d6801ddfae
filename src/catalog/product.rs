use bigdecimal::{BigDecimal, RoundingMode};
use chrono::{DateTime, Utc};

/// A catalog entry.
///
/// `id` is assigned by the store on first insert and never reassigned.
/// `name` is the natural key and is matched byte-for-byte: two names that
/// differ only in casing or whitespace are distinct products.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: BigDecimal,
    /// Bumped exactly once per write that changes `price`; starts at 1
    /// because the insert itself counts as the first update.
    pub price_update_count: i64,
    /// Timestamp of the last write that changed `price`.
    pub last_modified: DateTime<Utc>,
}

impl Product {
    /// Price rendered with exactly two decimal places, the wire format.
    pub fn price_fixed2(&self) -> String {
        self.price.with_scale_round(2, RoundingMode::HalfUp).to_string()
    }
}

/// One `(name, price)` pair from a price feed, the reconciliation input unit.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceUpdate {
    pub name: String,
    pub price: BigDecimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product_with_price(raw: &str) -> Product {
        Product {
            id: 1,
            name: "Widget".into(),
            price: raw.parse().expect("price literal"),
            price_update_count: 1,
            last_modified: DateTime::from_timestamp(1_700_000_000, 0).expect("timestamp"),
        }
    }

    #[test]
    fn price_fixed2_pads_whole_numbers() {
        assert_eq!(product_with_price("5").price_fixed2(), "5.00");
        assert_eq!(product_with_price("10.5").price_fixed2(), "10.50");
    }

    #[test]
    fn price_fixed2_rounds_excess_precision() {
        assert_eq!(product_with_price("10.555").price_fixed2(), "10.56");
        assert_eq!(product_with_price("10.554").price_fixed2(), "10.55");
    }
}
