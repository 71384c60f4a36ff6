//! Product availability status and the classifier that derives it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Availability status of a product.
///
/// Always derived from quantity, threshold and expiry; a stored value is only
/// a cache of [`classify`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    #[default]
    InStock,
    LowStock,
    OutOfStock,
    Expired,
}

impl ProductStatus {
    pub const ALL: [ProductStatus; 4] = [
        ProductStatus::InStock,
        ProductStatus::LowStock,
        ProductStatus::OutOfStock,
        ProductStatus::Expired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::InStock => "in_stock",
            ProductStatus::LowStock => "low_stock",
            ProductStatus::OutOfStock => "out_of_stock",
            ProductStatus::Expired => "expired",
        }
    }

    /// Whether the product can still be sold (counts toward the in-stock KPI).
    pub fn is_available(&self) -> bool {
        matches!(self, ProductStatus::InStock | ProductStatus::LowStock)
    }
}

impl core::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derives a product status. First match wins:
///
/// 1. expiry set and `expiry <= now` → `Expired`
/// 2. `quantity == 0` → `OutOfStock`
/// 3. threshold set and `quantity <= threshold` → `LowStock`
/// 4. otherwise `InStock`
///
/// `quantity` is already clamped by the caller; a missing threshold never
/// yields `LowStock`.
pub fn classify(
    quantity: u64,
    threshold: Option<u64>,
    expiry_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> ProductStatus {
    if expiry_date.is_some_and(|expiry| expiry <= now) {
        return ProductStatus::Expired;
    }
    if quantity == 0 {
        return ProductStatus::OutOfStock;
    }
    match threshold {
        Some(threshold) if quantity <= threshold => ProductStatus::LowStock,
        _ => ProductStatus::InStock,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 9, 30, 0).unwrap()
    }

    #[test]
    fn below_threshold_is_low_stock() {
        assert_eq!(classify(5, Some(10), None, now()), ProductStatus::LowStock);
    }

    #[test]
    fn zero_quantity_beats_threshold_when_not_expired() {
        let expiry = Utc.with_ymd_and_hms(2099, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            classify(0, Some(10), Some(expiry), now()),
            ProductStatus::OutOfStock
        );
    }

    #[test]
    fn expiry_at_exactly_now_is_expired() {
        assert_eq!(classify(50, None, Some(now()), now()), ProductStatus::Expired);
    }

    #[test]
    fn expiry_beats_zero_quantity() {
        let yesterday = now() - Duration::days(1);
        assert_eq!(
            classify(0, Some(3), Some(yesterday), now()),
            ProductStatus::Expired
        );
    }

    #[test]
    fn quantity_equal_to_threshold_is_low_stock() {
        assert_eq!(classify(10, Some(10), None, now()), ProductStatus::LowStock);
        assert_eq!(classify(11, Some(10), None, now()), ProductStatus::InStock);
    }

    #[test]
    fn missing_threshold_is_in_stock() {
        assert_eq!(classify(1, None, None, now()), ProductStatus::InStock);
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&ProductStatus::OutOfStock).unwrap();
        assert_eq!(json, "\"out_of_stock\"");
        assert_eq!(ProductStatus::LowStock.to_string(), "low_stock");
    }

    #[test]
    fn availability_covers_in_and_low_stock_only() {
        let available: Vec<_> = ProductStatus::ALL
            .iter()
            .filter(|s| s.is_available())
            .collect();
        assert_eq!(
            available,
            vec![&ProductStatus::InStock, &ProductStatus::LowStock]
        );
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 1000,
                ..ProptestConfig::default()
            })]

            /// Property: a past (or current) expiry always wins.
            #[test]
            fn past_expiry_is_always_expired(
                quantity in 0u64..100_000,
                threshold in proptest::option::of(0u64..100_000),
                minutes_ago in 0i64..10_000_000,
            ) {
                let expiry = now() - Duration::minutes(minutes_ago);
                prop_assert_eq!(
                    classify(quantity, threshold, Some(expiry), now()),
                    ProductStatus::Expired
                );
            }

            /// Property: unexpired records with no stock are out of stock.
            #[test]
            fn zero_quantity_is_out_of_stock(
                threshold in proptest::option::of(0u64..100_000),
                minutes_ahead in proptest::option::of(1i64..10_000_000),
            ) {
                let expiry = minutes_ahead.map(|m| now() + Duration::minutes(m));
                prop_assert_eq!(
                    classify(0, threshold, expiry, now()),
                    ProductStatus::OutOfStock
                );
            }

            /// Property: without a threshold, positive stock is never low.
            #[test]
            fn no_threshold_is_never_low_stock(
                quantity in 1u64..100_000,
                minutes_ahead in proptest::option::of(1i64..10_000_000),
            ) {
                let expiry = minutes_ahead.map(|m| now() + Duration::minutes(m));
                prop_assert_ne!(
                    classify(quantity, None, expiry, now()),
                    ProductStatus::LowStock
                );
            }
        }
    }
}
