//! In-memory storage collaborator for products and invoices.
//!
//! Callers take an explicit [`StoreSession`] from [`InMemoryStore::acquire`]
//! for each unit of work; the session is released when dropped. Sessions
//! implement the analytics reader ports, so a dashboard request reads through
//! the same handle it acquired.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockpulse_analytics::{InvoiceReader, ProductReader, SourceError};
use stockpulse_core::{DomainError, Record};
use stockpulse_invoicing::{Invoice, InvoiceDraft, InvoiceId, ReferenceNumber};
use stockpulse_products::{Product, ProductDraft, ProductId, ProductPatch};

pub const MAX_PAGE_SIZE: usize = 100;
pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Pagination and search for list operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    page: usize,
    limit: usize,
    search: Option<String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            search: None,
        }
    }
}

impl ListQuery {
    /// Page numbers start at 1; limit is clamped to `1..=100`.
    pub fn new(page: usize, limit: usize) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, MAX_PAGE_SIZE),
            search: None,
        }
    }

    /// Case-insensitive product name filter. Blank input means no filter.
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        let trimmed = search.trim();
        self.search = (!trimmed.is_empty()).then(|| trimmed.to_lowercase());
        self
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// One page of a newest-first listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
}

impl<T: Record + Clone> Page<T> {
    fn slice(mut rows: Vec<&T>, query: &ListQuery) -> Self {
        rows.sort_by(|a, b| b.created().cmp(&a.created()));
        let total = rows.len();
        let items = rows
            .into_iter()
            .skip(query.offset())
            .take(query.limit)
            .cloned()
            .collect();
        Self {
            items,
            total,
            page: query.page,
            limit: query.limit,
            total_pages: total.div_ceil(query.limit),
        }
    }
}

/// Serialized store contents: `{ "products": [...], "invoices": [...] }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSnapshot {
    pub products: Vec<Product>,
    pub invoices: Vec<Invoice>,
}

impl CatalogSnapshot {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Products and invoices behind `RwLock`s, with an availability switch.
#[derive(Debug)]
pub struct InMemoryStore {
    products: RwLock<Vec<Product>>,
    invoices: RwLock<Vec<Invoice>>,
    available: AtomicBool,
    sessions: AtomicUsize,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            products: RwLock::new(Vec::new()),
            invoices: RwLock::new(Vec::new()),
            available: AtomicBool::new(true),
            sessions: AtomicUsize::new(0),
        }
    }

    /// Load a snapshot, recomputing every product's cached status as of `now`.
    pub fn from_snapshot(snapshot: CatalogSnapshot, now: DateTime<Utc>) -> Self {
        let CatalogSnapshot {
            mut products,
            invoices,
        } = snapshot;

        let refreshed = products
            .iter_mut()
            .map(|p| p.refresh_status(now))
            .filter(|changed| *changed)
            .count();
        for invoice in &invoices {
            if let Err(err) = invoice.check_reference() {
                tracing::warn!(invoice = invoice.code(), error = %err, "loaded inconsistent invoice");
            }
        }
        tracing::debug!(
            products = products.len(),
            invoices = invoices.len(),
            refreshed,
            "store loaded from snapshot"
        );

        Self {
            products: RwLock::new(products),
            invoices: RwLock::new(invoices),
            ..Self::new()
        }
    }

    /// Toggle availability. While unavailable, acquiring a session and every
    /// session operation fail with [`SourceError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Number of sessions currently held.
    pub fn open_sessions(&self) -> usize {
        self.sessions.load(Ordering::SeqCst)
    }

    pub fn acquire(&self) -> Result<StoreSession<'_>, SourceError> {
        self.ensure_available()?;
        let open = self.sessions.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::trace!(open, "store session acquired");
        Ok(StoreSession { store: self })
    }

    fn ensure_available(&self) -> Result<(), SourceError> {
        if self.is_available() {
            Ok(())
        } else {
            Err(SourceError::Unavailable("store is offline".to_string()))
        }
    }

    fn read_products(&self) -> Result<RwLockReadGuard<'_, Vec<Product>>, SourceError> {
        self.ensure_available()?;
        self.products
            .read()
            .map_err(|_| SourceError::Query("products lock poisoned".to_string()))
    }

    fn write_products(&self) -> Result<RwLockWriteGuard<'_, Vec<Product>>, SourceError> {
        self.ensure_available()?;
        self.products
            .write()
            .map_err(|_| SourceError::Query("products lock poisoned".to_string()))
    }

    fn read_invoices(&self) -> Result<RwLockReadGuard<'_, Vec<Invoice>>, SourceError> {
        self.ensure_available()?;
        self.invoices
            .read()
            .map_err(|_| SourceError::Query("invoices lock poisoned".to_string()))
    }

    fn write_invoices(&self) -> Result<RwLockWriteGuard<'_, Vec<Invoice>>, SourceError> {
        self.ensure_available()?;
        self.invoices
            .write()
            .map_err(|_| SourceError::Query("invoices lock poisoned".to_string()))
    }
}

/// A scoped handle on an [`InMemoryStore`]. Released on drop.
#[derive(Debug)]
pub struct StoreSession<'a> {
    store: &'a InMemoryStore,
}

impl Drop for StoreSession<'_> {
    fn drop(&mut self) {
        let open = self
            .store
            .sessions
            .fetch_sub(1, Ordering::SeqCst)
            .saturating_sub(1);
        tracing::trace!(open, "store session released");
    }
}

impl StoreSession<'_> {
    pub fn snapshot(&self) -> StoreResult<CatalogSnapshot> {
        Ok(CatalogSnapshot {
            products: self.store.read_products()?.clone(),
            invoices: self.store.read_invoices()?.clone(),
        })
    }

    // --- products -------------------------------------------------------

    pub fn list_products(&self, query: &ListQuery) -> StoreResult<Page<Product>> {
        let products = self.store.read_products()?;
        let rows = products
            .iter()
            .filter(|p| match &query.search {
                Some(needle) => p.name().to_lowercase().contains(needle.as_str()),
                None => true,
            })
            .collect();
        Ok(Page::slice(rows, query))
    }

    pub fn product(&self, id: ProductId) -> StoreResult<Product> {
        let products = self.store.read_products()?;
        Ok(find(products.as_slice(), id)?.clone())
    }

    pub fn create_product(&self, draft: ProductDraft, now: DateTime<Utc>) -> StoreResult<Product> {
        let product = Product::create(ProductId::generate(), draft, now)?;
        self.store.write_products()?.push(product.clone());
        tracing::debug!(product_id = %product.id_typed(), status = %product.status(), "product created");
        Ok(product)
    }

    pub fn update_product(
        &self,
        id: ProductId,
        patch: ProductPatch,
        now: DateTime<Utc>,
    ) -> StoreResult<Product> {
        self.with_product(id, |product| {
            product.apply_patch(patch, now)?;
            Ok(product.clone())
        })
    }

    /// Add (or remove, with a negative delta) stock.
    pub fn order_product(&self, id: ProductId, delta: i64, now: DateTime<Utc>) -> StoreResult<Product> {
        self.with_product(id, |product| {
            product.adjust_quantity(delta, now);
            Ok(product.clone())
        })
    }

    pub fn delete_product(&self, id: ProductId) -> StoreResult<()> {
        let mut products = self.store.write_products()?;
        Ok(remove(&mut *products, id)?)
    }

    /// Expiry sweep over the whole catalog. Returns how many products changed.
    pub fn mark_expired(&self, now: DateTime<Utc>) -> StoreResult<usize> {
        let mut products = self.store.write_products()?;
        let expired = products
            .iter_mut()
            .map(|p| p.expire_if_due(now))
            .filter(|changed| *changed)
            .count();
        tracing::debug!(expired, "expiry sweep finished");
        Ok(expired)
    }

    fn with_product<T>(
        &self,
        id: ProductId,
        f: impl FnOnce(&mut Product) -> Result<T, DomainError>,
    ) -> StoreResult<T> {
        let mut products = self.store.write_products()?;
        Ok(f(find_mut(products.as_mut_slice(), id)?)?)
    }

    // --- invoices -------------------------------------------------------

    pub fn list_invoices(&self, query: &ListQuery) -> StoreResult<Page<Invoice>> {
        let invoices = self.store.read_invoices()?;
        Ok(Page::slice(invoices.iter().collect(), query))
    }

    pub fn create_invoice(&self, draft: InvoiceDraft, now: DateTime<Utc>) -> StoreResult<Invoice> {
        let invoice = Invoice::create(InvoiceId::generate(), draft, now);
        self.store.write_invoices()?.push(invoice.clone());
        tracing::debug!(invoice = invoice.code(), paid = invoice.is_paid(), "invoice created");
        Ok(invoice)
    }

    /// Fetch an invoice, recording the first view.
    pub fn view_invoice(&self, id: InvoiceId, now: DateTime<Utc>) -> StoreResult<Invoice> {
        self.with_invoice(id, |invoice| {
            invoice.mark_viewed(now);
            invoice.clone()
        })
    }

    pub fn mark_invoice_paid(&self, id: InvoiceId) -> StoreResult<Invoice> {
        self.with_invoice(id, |invoice| {
            if invoice.mark_paid(ReferenceNumber::generate()) {
                tracing::debug!(invoice = invoice.code(), "invoice paid");
            }
            invoice.clone()
        })
    }

    pub fn delete_invoice(&self, id: InvoiceId) -> StoreResult<()> {
        let mut invoices = self.store.write_invoices()?;
        Ok(remove(&mut *invoices, id)?)
    }

    /// Remove every invoice matching `pred`, then append `replacements`.
    ///
    /// Both happen under one write lock. Returns the number removed.
    pub(crate) fn replace_invoices(
        &self,
        pred: impl Fn(&Invoice) -> bool,
        replacements: Vec<Invoice>,
    ) -> StoreResult<usize> {
        let mut invoices = self.store.write_invoices()?;
        let before = invoices.len();
        invoices.retain(|inv| !pred(inv));
        let removed = before - invoices.len();
        invoices.extend(replacements);
        Ok(removed)
    }

    fn with_invoice<T>(&self, id: InvoiceId, f: impl FnOnce(&mut Invoice) -> T) -> StoreResult<T> {
        let mut invoices = self.store.write_invoices()?;
        Ok(f(find_mut(invoices.as_mut_slice(), id)?))
    }
}

fn find<T: Record>(rows: &[T], id: T::Id) -> Result<&T, DomainError> {
    rows.iter()
        .find(|row| row.record_id() == id)
        .ok_or(DomainError::not_found(T::KIND))
}

fn find_mut<T: Record>(rows: &mut [T], id: T::Id) -> Result<&mut T, DomainError> {
    rows.iter_mut()
        .find(|row| row.record_id() == id)
        .ok_or(DomainError::not_found(T::KIND))
}

fn remove<T: Record>(rows: &mut Vec<T>, id: T::Id) -> Result<(), DomainError> {
    let index = rows
        .iter()
        .position(|row| row.record_id() == id)
        .ok_or(DomainError::not_found(T::KIND))?;
    rows.remove(index);
    Ok(())
}

impl ProductReader for StoreSession<'_> {
    fn products(&self) -> Result<Vec<Product>, SourceError> {
        Ok(self.store.read_products()?.clone())
    }
}

impl InvoiceReader for StoreSession<'_> {
    fn invoices(&self) -> Result<Vec<Invoice>, SourceError> {
        Ok(self.store.read_invoices()?.clone())
    }
}
