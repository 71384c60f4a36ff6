//! Boundary coercion for loosely-typed input.
//!
//! Malformed numeric input is never an error: it collapses to zero before it
//! reaches any domain rule. These helpers are the only place that happens.
//! The `deserialize_*` variants apply the same rules to stored rows through
//! `#[serde(deserialize_with = ...)]`.

use serde::{Deserialize, Deserializer};

/// Coerces an optional number into a non-negative whole count.
///
/// Missing, non-finite or negative values become 0; fractions are truncated.
pub fn coerce_count(value: Option<f64>) -> u64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v.trunc() as u64,
        _ => 0,
    }
}

/// Coerces an optional number into a non-negative monetary amount.
pub fn coerce_amount(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => 0.0,
    }
}

/// Trims optional text; blank strings become `None`.
pub fn normalize_text(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Reads any JSON number (or null) as a count.
pub fn deserialize_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<f64>::deserialize(deserializer).map(coerce_count)
}

/// Like [`deserialize_count`], but null stays absent.
pub fn deserialize_opt_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<f64>::deserialize(deserializer).map(|v| v.map(|n| coerce_count(Some(n))))
}

/// Reads any JSON number (or null) as a non-negative amount.
pub fn deserialize_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<f64>::deserialize(deserializer).map(coerce_amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn count_collapses_malformed_input_to_zero() {
        assert_eq!(coerce_count(None), 0);
        assert_eq!(coerce_count(Some(f64::NAN)), 0);
        assert_eq!(coerce_count(Some(f64::INFINITY)), 0);
        assert_eq!(coerce_count(Some(-3.0)), 0);
        assert_eq!(coerce_count(Some(4.9)), 4);
        assert_eq!(coerce_count(Some(12.0)), 12);
    }

    #[test]
    fn amount_keeps_fractions() {
        assert_eq!(coerce_amount(Some(19.99)), 19.99);
        assert_eq!(coerce_amount(Some(-1.0)), 0.0);
        assert_eq!(coerce_amount(None), 0.0);
    }

    #[test]
    fn blank_text_is_absent() {
        assert_eq!(normalize_text(Some("   ".into())), None);
        assert_eq!(normalize_text(Some(" Dairy ".into())), Some("Dairy".into()));
        assert_eq!(normalize_text(None), None);
    }

    #[derive(Debug, Deserialize)]
    struct Row {
        #[serde(default, deserialize_with = "deserialize_count")]
        qty: u64,
        #[serde(default, deserialize_with = "deserialize_opt_count")]
        threshold: Option<u64>,
        #[serde(default, deserialize_with = "deserialize_amount")]
        total: f64,
    }

    #[test]
    fn stored_rows_are_coerced_on_read() {
        let row: Row =
            serde_json::from_str(r#"{"qty": 2.5, "threshold": -4, "total": -50}"#).unwrap();
        assert_eq!(row.qty, 2);
        assert_eq!(row.threshold, Some(0));
        assert_eq!(row.total, 0.0);

        let row: Row = serde_json::from_str(r#"{"qty": null, "threshold": null}"#).unwrap();
        assert_eq!(row.qty, 0);
        assert_eq!(row.threshold, None);
        assert_eq!(row.total, 0.0);
    }

    proptest! {
        #[test]
        fn amount_is_never_negative(v in proptest::num::f64::ANY) {
            prop_assert!(coerce_amount(Some(v)) >= 0.0);
        }
    }
}
