//! Dashboard service: reads the collaborator fresh on every call and runs the
//! aggregation functions over the result.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockpulse_core::Clock;
use stockpulse_invoicing::Invoice;
use stockpulse_products::Product;

use crate::buckets::{Period, build_buckets};
use crate::metrics::{self, InventoryMetrics, InvoiceMetrics, Kpis, TopProduct};
use crate::reader::{InvoiceReader, ProductReader, SourceError};
use crate::series::{GraphSeries, SparseFallback, materialize};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalyticsError {
    #[error(transparent)]
    Source(#[from] SourceError),
}

pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

/// Tunables for [`DashboardService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardSettings {
    pub recent_window_days: i64,
    pub top_products_limit: usize,
    pub sparse_fallback: SparseFallback,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            recent_window_days: 7,
            top_products_limit: 10,
            sparse_fallback: SparseFallback::Substitute,
        }
    }
}

impl DashboardSettings {
    pub fn recent_window(&self) -> Duration {
        Duration::days(self.recent_window_days.max(0))
    }
}

/// Every dashboard output for one period, computed against one read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub inventory: InventoryMetrics,
    pub invoices: InvoiceMetrics,
    pub kpis: Kpis,
    pub top_products: Vec<TopProduct>,
    pub graph: GraphSeries,
}

pub struct DashboardService<P, I, C> {
    products: P,
    invoices: I,
    clock: C,
    settings: DashboardSettings,
}

impl<P, I, C> DashboardService<P, I, C>
where
    P: ProductReader,
    I: InvoiceReader,
    C: Clock,
{
    pub fn new(products: P, invoices: I, clock: C) -> Self {
        Self::with_settings(products, invoices, clock, DashboardSettings::default())
    }

    pub fn with_settings(products: P, invoices: I, clock: C, settings: DashboardSettings) -> Self {
        Self {
            products,
            invoices,
            clock,
            settings,
        }
    }

    pub fn settings(&self) -> &DashboardSettings {
        &self.settings
    }

    pub fn inventory_metrics(&self) -> AnalyticsResult<InventoryMetrics> {
        let products = self.load_products()?;
        Ok(metrics::inventory_metrics(&products, self.clock.now()))
    }

    pub fn invoice_metrics(&self) -> AnalyticsResult<InvoiceMetrics> {
        let invoices = self.load_invoices()?;
        Ok(metrics::invoice_metrics(
            &invoices,
            self.clock.now(),
            self.settings.recent_window(),
        ))
    }

    /// KPIs over all time, or bounded to `period`'s window.
    pub fn kpis(&self, period: Option<Period>) -> AnalyticsResult<Kpis> {
        let products = self.load_products()?;
        let invoices = self.load_invoices()?;
        let now = self.clock.now();
        let window = period.map(|p| build_buckets(p, now).window);
        Ok(metrics::kpis(&products, &invoices, now, window))
    }

    pub fn top_products(&self) -> AnalyticsResult<Vec<TopProduct>> {
        let invoices = self.load_invoices()?;
        Ok(metrics::top_products(
            &invoices,
            self.settings.top_products_limit,
        ))
    }

    pub fn graph(&self, period: Period) -> AnalyticsResult<GraphSeries> {
        let invoices = self.load_invoices()?;
        Ok(self.graph_from(period, self.clock.now(), &invoices))
    }

    pub fn snapshot(&self, period: Period) -> AnalyticsResult<DashboardSnapshot> {
        let products = self.load_products()?;
        let invoices = self.load_invoices()?;
        let now = self.clock.now();

        let snapshot = DashboardSnapshot {
            inventory: metrics::inventory_metrics(&products, now),
            invoices: metrics::invoice_metrics(&invoices, now, self.settings.recent_window()),
            kpis: metrics::kpis(&products, &invoices, now, None),
            top_products: metrics::top_products(&invoices, self.settings.top_products_limit),
            graph: self.graph_from(period, now, &invoices),
        };

        tracing::debug!(
            %period,
            products = products.len(),
            invoices = invoices.len(),
            sample = snapshot.graph.sample,
            "dashboard snapshot computed"
        );
        Ok(snapshot)
    }

    fn graph_from(&self, period: Period, now: DateTime<Utc>, invoices: &[Invoice]) -> GraphSeries {
        let scaffold = build_buckets(period, now);
        let series = materialize(&scaffold, invoices);
        GraphSeries::present(&scaffold, series, self.settings.sparse_fallback)
    }

    fn load_products(&self) -> AnalyticsResult<Vec<Product>> {
        self.products.products().map_err(|err| {
            tracing::warn!(error = %err, "failed to read products");
            AnalyticsError::from(err)
        })
    }

    fn load_invoices(&self) -> AnalyticsResult<Vec<Invoice>> {
        self.invoices.invoices().map_err(|err| {
            tracing::warn!(error = %err, "failed to read invoices");
            AnalyticsError::from(err)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use std::sync::Mutex;
    use stockpulse_core::FixedClock;
    use stockpulse_invoicing::{InvoiceDraft, InvoiceId, InvoiceLine, InvoiceStatus};
    use stockpulse_products::{ProductDraft, ProductId};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 18, 0, 0).unwrap()
    }

    struct Fixture {
        products: Vec<Product>,
        invoices: Vec<Invoice>,
    }

    impl ProductReader for Fixture {
        fn products(&self) -> Result<Vec<Product>, SourceError> {
            Ok(self.products.clone())
        }
    }

    impl InvoiceReader for Fixture {
        fn invoices(&self) -> Result<Vec<Invoice>, SourceError> {
            Ok(self.invoices.clone())
        }
    }

    struct Down;

    impl ProductReader for Down {
        fn products(&self) -> Result<Vec<Product>, SourceError> {
            Err(SourceError::Unavailable("connection refused".to_string()))
        }
    }

    impl InvoiceReader for Down {
        fn invoices(&self) -> Result<Vec<Invoice>, SourceError> {
            Err(SourceError::Unavailable("connection refused".to_string()))
        }
    }

    fn fixture() -> Fixture {
        let product = Product::create(
            ProductId::generate(),
            ProductDraft {
                name: "Oat Milk".to_string(),
                quantity: Some(40.0),
                threshold: Some(10.0),
                category: Some("Dairy".to_string()),
                ..ProductDraft::default()
            },
            now(),
        )
        .unwrap();

        let paid = |days: i64, total: f64| {
            Invoice::create(
                InvoiceId::generate(),
                InvoiceDraft {
                    items: vec![InvoiceLine::new("Oat Milk", 2, total / 2.0)],
                    total: Some(total),
                    status: Some(InvoiceStatus::Paid),
                    ..InvoiceDraft::default()
                },
                now() - Duration::days(days),
            )
        };

        Fixture {
            products: vec![product],
            invoices: vec![paid(0, 120.0), paid(2, 80.0), paid(500, 1000.0)],
        }
    }

    #[test]
    fn snapshot_combines_every_output() {
        let fixture = fixture();
        let service = DashboardService::new(&fixture, &fixture, FixedClock::new(now()));
        let snapshot = service.snapshot(Period::Weekly).unwrap();

        assert_eq!(snapshot.inventory.total, 1);
        assert_eq!(snapshot.inventory.in_stock, 1);
        assert_eq!(snapshot.invoices.recent, 2);
        assert_eq!(snapshot.invoices.paid_amount, 200.0);
        assert_eq!(snapshot.kpis.revenue, 1200.0);
        assert_eq!(snapshot.kpis.sold, 6);
        assert_eq!(snapshot.top_products[0].sales, 6);
        assert!(!snapshot.graph.sample);
        assert_eq!(snapshot.graph.sales[6], 120.0);
        assert_eq!(snapshot.graph.sales[4], 80.0);
    }

    /// Advances one day on every read.
    struct SteppingClock(Mutex<DateTime<Utc>>);

    impl Clock for SteppingClock {
        fn now(&self) -> DateTime<Utc> {
            let mut at = self.0.lock().unwrap();
            let current = *at;
            *at += Duration::days(1);
            current
        }
    }

    #[test]
    fn snapshot_reads_the_clock_once() {
        let fixture = fixture();
        // Sunday evening; the next read would fall in the following week.
        let clock = SteppingClock(Mutex::new(now() + Duration::hours(5)));
        let service = DashboardService::new(&fixture, &fixture, clock);
        let snapshot = service.snapshot(Period::Weekly).unwrap();

        assert_eq!(snapshot.invoices.recent, 2);
        assert!(!snapshot.graph.sample);
        assert_eq!(snapshot.graph.sales[6], 120.0);
        assert_eq!(snapshot.graph.sales[4], 80.0);
    }

    #[test]
    fn kpis_can_be_bounded_to_a_period() {
        let fixture = fixture();
        let service = DashboardService::new(&fixture, &fixture, FixedClock::new(now()));
        let bounded = service.kpis(Some(Period::Monthly)).unwrap();
        assert_eq!(bounded.revenue, 200.0);
        assert_eq!(bounded.sold, 4);
    }

    #[test]
    fn settings_flow_into_outputs() {
        let fixture = fixture();
        let service = DashboardService::with_settings(
            &fixture,
            &fixture,
            FixedClock::new(now()),
            DashboardSettings {
                recent_window_days: 1,
                top_products_limit: 0,
                sparse_fallback: SparseFallback::Disabled,
            },
        );
        assert_eq!(service.invoice_metrics().unwrap().recent, 1);
        assert!(service.top_products().unwrap().is_empty());
        let yearly = service.graph(Period::Yearly).unwrap();
        assert!(!yearly.sample);
    }

    #[test]
    fn empty_collections_are_not_errors() {
        let empty = Fixture {
            products: vec![],
            invoices: vec![],
        };
        let service = DashboardService::new(&empty, &empty, FixedClock::new(now()));
        let snapshot = service.snapshot(Period::Monthly).unwrap();
        assert_eq!(snapshot.inventory, InventoryMetrics::default());
        assert_eq!(snapshot.kpis, Kpis::default());
        assert!(snapshot.top_products.is_empty());
        assert!(snapshot.graph.sample);
        assert_eq!(snapshot.graph.sales.len(), 12);
    }

    #[test]
    fn collaborator_failure_is_surfaced() {
        let service = DashboardService::new(Down, Down, FixedClock::new(now()));
        assert!(matches!(
            service.inventory_metrics(),
            Err(AnalyticsError::Source(SourceError::Unavailable(_)))
        ));
        assert!(service.snapshot(Period::Weekly).is_err());
        assert!(service.graph(Period::Weekly).is_err());
    }
}
