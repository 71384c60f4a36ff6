//! Dev-only graph seeding: backdated paid invoices, one per chart bucket.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;

use stockpulse_analytics::{Period, build_buckets, sample_sales};
use stockpulse_core::coerce_amount;
use stockpulse_invoicing::{Invoice, InvoiceDraft, InvoiceId, InvoiceLine, InvoiceStatus};

use crate::store::{StoreError, StoreSession};

pub const SEED_ITEM: &str = "Seed Item";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SeedError {
    #[error("graph seeding is disabled in this environment")]
    Disabled,

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedReport {
    pub period: Period,
    pub removed: usize,
    pub inserted: usize,
}

/// Code prefix marking invoices created by [`seed_graph`] for `period`.
pub fn seed_prefix(period: Period) -> &'static str {
    match period {
        Period::Weekly => "SEED-W-",
        Period::Monthly => "SEED-M-",
        Period::Yearly => "SEED-Y-",
    }
}

/// Replace earlier seeded invoices in `period`'s window with one paid
/// invoice per bucket.
///
/// `sales` defaults to the sample series. Values beyond the bucket count are
/// ignored; a shorter series seeds only the leading buckets.
pub fn seed_graph(
    session: &StoreSession<'_>,
    period: Period,
    sales: Option<&[f64]>,
    allowed: bool,
    now: DateTime<Utc>,
) -> Result<SeedReport, SeedError> {
    if !allowed {
        tracing::warn!(%period, "graph seeding refused");
        return Err(SeedError::Disabled);
    }

    let scaffold = build_buckets(period, now);
    let sales = sales.unwrap_or_else(|| sample_sales(period));
    let prefix = seed_prefix(period);

    let invoices: Vec<Invoice> = scaffold
        .keys
        .iter()
        .zip(sales)
        .enumerate()
        .filter_map(|(index, (key, total))| {
            let at = bucket_instant(period, scaffold.window.start, index)?;
            let suffix = match period {
                Period::Yearly => key.clone(),
                Period::Weekly | Period::Monthly => (index + 1).to_string(),
            };
            Some(seeded_invoice(prefix, &suffix, *total, at))
        })
        .collect();
    let inserted = invoices.len();

    let window = scaffold.window;
    let removed = session.replace_invoices(
        |inv| inv.is_paid() && window.contains(inv.created_at()) && inv.code().starts_with(prefix),
        invoices,
    )?;

    tracing::info!(%period, removed, inserted, "graph seeded");
    Ok(SeedReport {
        period,
        removed,
        inserted,
    })
}

/// 10:00 UTC on the bucket's day: each weekly day, the 15th of each month,
/// July 1st of each year.
fn bucket_instant(period: Period, window_start: DateTime<Utc>, index: usize) -> Option<DateTime<Utc>> {
    let day = match period {
        Period::Weekly => window_start.date_naive() + Duration::days(index as i64),
        Period::Monthly => NaiveDate::from_ymd_opt(window_start.year(), index as u32 + 1, 15)?,
        Period::Yearly => NaiveDate::from_ymd_opt(window_start.year() + index as i32, 7, 1)?,
    };
    Some(day.and_hms_opt(10, 0, 0)?.and_utc())
}

fn seeded_invoice(prefix: &str, suffix: &str, total: f64, at: DateTime<Utc>) -> Invoice {
    let id = InvoiceId::generate();
    let total = coerce_amount(Some(total));
    let qty = ((total / 500.0).round() as u64).max(1);
    Invoice::create(
        id,
        InvoiceDraft {
            code: Some(format!("{prefix}{suffix}-{}", id.0.fold(10_000))),
            items: vec![InvoiceLine::new(SEED_ITEM, qty, total)],
            subtotal: Some(total),
            tax: Some(0.0),
            total: Some(total),
            status: Some(InvoiceStatus::Paid),
            due_date: None,
        },
        at,
    )
}
