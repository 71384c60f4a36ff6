//! Series materialization and the sparse-data fallback.
//!
//! [`materialize`] joins paid invoices into a [`BucketScaffold`].
//! [`GraphSeries::present`] is the only place the sample-series substitution
//! happens; nothing downstream re-checks sparseness.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use stockpulse_invoicing::Invoice;

use crate::buckets::{BucketScaffold, Period};

const WEEKLY_SAMPLE: [f64; 7] = [8200.0, 10200.0, 7600.0, 9400.0, 10800.0, 5600.0, 6100.0];
const MONTHLY_SAMPLE: [f64; 12] = [
    48000.0, 50500.0, 38000.0, 31000.0, 37000.0, 30000.0, 28000.0, 24000.0, 39000.0, 26000.0,
    21000.0, 23000.0,
];
const YEARLY_SAMPLE: [f64; 5] = [420000.0, 455000.0, 390000.0, 365000.0, 410000.0];

/// Illustrative sales series shown when real data is too sparse to chart.
///
/// Same length as the period's scaffold, oldest first.
pub fn sample_sales(period: Period) -> &'static [f64] {
    match period {
        Period::Weekly => &WEEKLY_SAMPLE,
        Period::Monthly => &MONTHLY_SAMPLE,
        Period::Yearly => &YEARLY_SAMPLE,
    }
}

/// Sales and purchase values aligned 1:1 with a scaffold's keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub sales: Vec<f64>,
    /// There is no purchase data source; always zero-filled.
    pub purchase: Vec<f64>,
}

impl Series {
    /// Number of strictly positive sales points.
    pub fn positive_sales_points(&self) -> usize {
        self.sales.iter().filter(|v| **v > 0.0).count()
    }
}

/// Sum paid invoice totals into the scaffold's buckets.
///
/// Invoices outside the window or not paid are ignored; empty buckets are 0.
pub fn materialize(scaffold: &BucketScaffold, invoices: &[Invoice]) -> Series {
    let mut sums: HashMap<String, f64> = HashMap::new();
    for invoice in invoices
        .iter()
        .filter(|inv| inv.is_paid() && scaffold.window.contains(inv.created_at()))
    {
        *sums
            .entry(scaffold.period.bucket_key(invoice.created_at()))
            .or_insert(0.0) += invoice.total();
    }

    let sales: Vec<f64> = scaffold
        .keys
        .iter()
        .map(|key| sums.get(key).copied().unwrap_or(0.0))
        .collect();
    let purchase = vec![0.0; sales.len()];

    tracing::debug!(
        period = %scaffold.period,
        buckets = sales.len(),
        filled = sums.len(),
        "materialized sales series"
    );

    Series { sales, purchase }
}

/// Whether sparse series are swapped for the sample series.
///
/// The rule is fixed: a series with at most one strictly positive point is
/// sparse.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SparseFallback {
    #[default]
    Substitute,
    Disabled,
}

impl SparseFallback {
    pub const MAX_SPARSE_POINTS: usize = 1;

    pub fn is_sparse(series: &Series) -> bool {
        series.positive_sales_points() <= Self::MAX_SPARSE_POINTS
    }

    pub fn applies_to(&self, series: &Series) -> bool {
        matches!(self, SparseFallback::Substitute) && Self::is_sparse(series)
    }
}

/// Chart payload: `{period, labels, sales, purchase}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSeries {
    pub period: Period,
    pub labels: Vec<String>,
    pub sales: Vec<f64>,
    pub purchase: Vec<f64>,
    /// `true` when `sales` is the illustrative sample, not real data.
    #[serde(default)]
    pub sample: bool,
}

impl GraphSeries {
    /// Turn a materialized series into the chart payload, applying the
    /// sparse-data policy.
    pub fn present(scaffold: &BucketScaffold, series: Series, policy: SparseFallback) -> Self {
        let sample = policy.applies_to(&series);
        let sales = if sample {
            tracing::debug!(
                period = %scaffold.period,
                positive_points = series.positive_sales_points(),
                "sales series too sparse, substituting sample"
            );
            sample_sales(scaffold.period).to_vec()
        } else {
            series.sales
        };

        Self {
            period: scaffold.period,
            labels: scaffold.labels.clone(),
            purchase: vec![0.0; sales.len()],
            sales,
            sample,
        }
    }
}
