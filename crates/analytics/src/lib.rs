//! Dashboard analytics over products and invoices.
//!
//! Aggregations are pure functions over borrowed collections. The only IO
//! seam is the pair of reader ports used by [`DashboardService`].

pub mod buckets;
pub mod metrics;
pub mod reader;
pub mod series;
pub mod service;

pub use buckets::{BucketScaffold, Period, TimeWindow, build_buckets};
pub use metrics::{
    InventoryMetrics, InvoiceMetrics, Kpis, TopProduct, inventory_metrics, invoice_metrics, kpis,
    top_products,
};
pub use reader::{InvoiceReader, ProductReader, SourceError};
pub use series::{GraphSeries, Series, SparseFallback, materialize, sample_sales};
pub use service::{
    AnalyticsError, AnalyticsResult, DashboardService, DashboardSettings, DashboardSnapshot,
};
