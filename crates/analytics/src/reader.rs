use std::sync::Arc;

use thiserror::Error;

use stockpulse_invoicing::Invoice;
use stockpulse_products::Product;

/// Failure reading records from the backing store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("data source unavailable: {0}")]
    Unavailable(String),

    #[error("query failed: {0}")]
    Query(String),
}

/// Read access to the full product collection.
pub trait ProductReader: Send + Sync {
    fn products(&self) -> Result<Vec<Product>, SourceError>;
}

/// Read access to the full invoice collection.
pub trait InvoiceReader: Send + Sync {
    fn invoices(&self) -> Result<Vec<Invoice>, SourceError>;
}

impl<R> ProductReader for Arc<R>
where
    R: ProductReader + ?Sized,
{
    fn products(&self) -> Result<Vec<Product>, SourceError> {
        (**self).products()
    }
}

impl<R> ProductReader for &R
where
    R: ProductReader + ?Sized,
{
    fn products(&self) -> Result<Vec<Product>, SourceError> {
        (**self).products()
    }
}

impl<R> InvoiceReader for Arc<R>
where
    R: InvoiceReader + ?Sized,
{
    fn invoices(&self) -> Result<Vec<Invoice>, SourceError> {
        (**self).invoices()
    }
}

impl<R> InvoiceReader for &R
where
    R: InvoiceReader + ?Sized,
{
    fn invoices(&self) -> Result<Vec<Invoice>, SourceError> {
        (**self).invoices()
    }
}
