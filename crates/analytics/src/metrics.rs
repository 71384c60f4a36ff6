//! Dashboard aggregates over product and invoice collections.
//!
//! Every function here is a pure scan: it borrows the records, never mutates
//! them, and returns a fresh value. Status is recomputed per product with the
//! classifier rather than read from the cached field.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use stockpulse_invoicing::{Invoice, InvoiceStatus};
use stockpulse_products::{Product, ProductStatus};

use crate::buckets::TimeWindow;

/// Product counts per availability status.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryMetrics {
    pub total: u64,
    pub in_stock: u64,
    pub low_stock: u64,
    pub out_of_stock: u64,
    pub expired: u64,
    /// Distinct non-empty categories.
    pub categories: u64,
}

/// Invoice counts and amounts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceMetrics {
    pub total: u64,
    /// Created within the trailing window.
    pub recent: u64,
    /// Viewed at least once.
    pub processed: u64,
    /// Paid totals created within the trailing window.
    pub paid_amount: f64,
    /// Totals of all unpaid invoices.
    pub unpaid_amount: f64,
    /// Number of unpaid invoices.
    pub pending: u64,
}

/// Headline KPIs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpis {
    pub revenue: f64,
    pub sold: u64,
    pub in_stock: u64,
}

/// A product name and the units sold under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopProduct {
    pub name: String,
    pub sales: u64,
}

pub fn inventory_metrics(products: &[Product], now: DateTime<Utc>) -> InventoryMetrics {
    let mut metrics = InventoryMetrics {
        total: products.len() as u64,
        ..InventoryMetrics::default()
    };
    let mut categories: BTreeSet<&str> = BTreeSet::new();

    for product in products {
        match product.status_at(now) {
            ProductStatus::InStock => metrics.in_stock += 1,
            ProductStatus::LowStock => metrics.low_stock += 1,
            ProductStatus::OutOfStock => metrics.out_of_stock += 1,
            ProductStatus::Expired => metrics.expired += 1,
        }
        if let Some(category) = product.category() {
            categories.insert(category);
        }
    }
    metrics.categories = categories.len() as u64;

    tracing::debug!(products = metrics.total, "computed inventory metrics");
    metrics
}

/// Invoice metrics with a trailing window of `recent_window` ending at `now`.
pub fn invoice_metrics(
    invoices: &[Invoice],
    now: DateTime<Utc>,
    recent_window: Duration,
) -> InvoiceMetrics {
    let since = now - recent_window;
    let mut metrics = InvoiceMetrics {
        total: invoices.len() as u64,
        ..InvoiceMetrics::default()
    };

    for invoice in invoices {
        let recent = invoice.created_at() >= since;
        if recent {
            metrics.recent += 1;
        }
        if invoice.viewed_at().is_some() {
            metrics.processed += 1;
        }
        match invoice.status() {
            InvoiceStatus::Paid if recent => metrics.paid_amount += invoice.total(),
            InvoiceStatus::Paid => {}
            InvoiceStatus::Unpaid => {
                metrics.unpaid_amount += invoice.total();
                metrics.pending += 1;
            }
        }
    }

    tracing::debug!(invoices = metrics.total, recent = metrics.recent, "computed invoice metrics");
    metrics
}

/// Revenue and units over paid invoices, plus the sellable product count.
///
/// `window` bounds the invoices by creation time; `None` means all time.
pub fn kpis(
    products: &[Product],
    invoices: &[Invoice],
    now: DateTime<Utc>,
    window: Option<TimeWindow>,
) -> Kpis {
    let mut kpis = Kpis::default();

    for invoice in invoices.iter().filter(|inv| inv.is_paid()) {
        if window.is_some_and(|w| !w.contains(invoice.created_at())) {
            continue;
        }
        kpis.revenue += invoice.total();
        kpis.sold = kpis.sold.saturating_add(invoice.units_sold());
    }

    kpis.in_stock = products
        .iter()
        .filter(|p| p.status_at(now).is_available())
        .count() as u64;

    kpis
}

/// Units sold per line-item name across all invoices, best sellers first.
///
/// Ties keep the order in which names were first seen.
pub fn top_products(invoices: &[Invoice], limit: usize) -> Vec<TopProduct> {
    let mut ranked: Vec<TopProduct> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for line in invoices.iter().flat_map(|inv| inv.items()) {
        match index.get(line.name.as_str()) {
            Some(&i) => ranked[i].sales = ranked[i].sales.saturating_add(line.quantity),
            None => {
                index.insert(line.name.as_str(), ranked.len());
                ranked.push(TopProduct {
                    name: line.name.clone(),
                    sales: line.quantity,
                });
            }
        }
    }

    // `sort_by` is stable.
    ranked.sort_by(|a, b| b.sales.cmp(&a.sales));
    ranked.truncate(limit);
    ranked
}
