use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockpulse_core::{
    DomainError, DomainResult, Record, RecordId, coerce_amount, coerce_count, deserialize_amount,
    deserialize_count, deserialize_opt_count, normalize_text,
};

use crate::status::{ProductStatus, classify};

/// Product identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub RecordId);

impl ProductId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }

    pub fn generate() -> Self {
        Self(RecordId::new())
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Loosely-typed input for creating a product.
///
/// Numbers arrive as optional floats and are coerced (never rejected) when the
/// product is built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductDraft {
    pub name: String,
    pub sku: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub price: Option<f64>,
    pub quantity: Option<f64>,
    pub threshold: Option<f64>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
}

/// Partial update of a product. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub price: Option<f64>,
    pub quantity: Option<f64>,
    pub threshold: Option<f64>,
    /// `Some(None)` clears the expiry date, `Some(Some(t))` sets it.
    pub expiry_date: Option<Option<DateTime<Utc>>>,
    pub image_url: Option<String>,
}

impl ProductPatch {
    /// Whether the patch touches a field the status depends on.
    pub fn affects_status(&self) -> bool {
        self.quantity.is_some() || self.threshold.is_some() || self.expiry_date.is_some()
    }
}

/// A catalog product with its cached availability status.
///
/// Invariant: `status` equals [`classify`] of the other fields as of the last
/// mutation. Every mutating method recomputes it before returning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    id: ProductId,
    name: String,
    #[serde(default)]
    sku: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    price: f64,
    #[serde(default, deserialize_with = "deserialize_count")]
    quantity: u64,
    #[serde(default, deserialize_with = "deserialize_opt_count")]
    threshold: Option<u64>,
    #[serde(default)]
    expiry_date: Option<DateTime<Utc>>,
    #[serde(default)]
    status: ProductStatus,
    #[serde(default)]
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Product {
    /// Build a new product from a draft, coercing numeric input.
    ///
    /// A draft without a threshold is stored with threshold 0.
    pub fn create(id: ProductId, draft: ProductDraft, now: DateTime<Utc>) -> DomainResult<Self> {
        let name = draft.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        let mut product = Self {
            id,
            name,
            sku: normalize_text(draft.sku),
            category: normalize_text(draft.category),
            unit: normalize_text(draft.unit),
            price: coerce_amount(draft.price),
            quantity: coerce_count(draft.quantity),
            threshold: Some(coerce_count(draft.threshold)),
            expiry_date: draft.expiry_date,
            status: ProductStatus::InStock,
            image_url: normalize_text(draft.image_url),
            created_at: now,
            updated_at: now,
        };
        product.refresh_status(now);
        Ok(product)
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sku(&self) -> Option<&str> {
        self.sku.as_deref()
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    pub fn threshold(&self) -> Option<u64> {
        self.threshold
    }

    pub fn expiry_date(&self) -> Option<DateTime<Utc>> {
        self.expiry_date
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// The cached status (as of the last mutation or refresh).
    pub fn status(&self) -> ProductStatus {
        self.status
    }

    /// Status recomputed from the current fields; ignores the cache.
    pub fn status_at(&self, now: DateTime<Utc>) -> ProductStatus {
        classify(self.quantity, self.threshold, self.expiry_date, now)
    }

    /// Recompute the cached status. Returns `true` if it changed.
    pub fn refresh_status(&mut self, now: DateTime<Utc>) -> bool {
        let next = self.status_at(now);
        let changed = next != self.status;
        self.status = next;
        changed
    }

    /// Apply a partial update and recompute the status.
    pub fn apply_patch(&mut self, patch: ProductPatch, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(name) = &patch.name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("name cannot be empty"));
            }
        }

        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if patch.sku.is_some() {
            self.sku = normalize_text(patch.sku);
        }
        if patch.category.is_some() {
            self.category = normalize_text(patch.category);
        }
        if patch.unit.is_some() {
            self.unit = normalize_text(patch.unit);
        }
        if patch.image_url.is_some() {
            self.image_url = normalize_text(patch.image_url);
        }
        if patch.price.is_some() {
            self.price = coerce_amount(patch.price);
        }
        if patch.quantity.is_some() {
            self.quantity = coerce_count(patch.quantity);
        }
        if patch.threshold.is_some() {
            self.threshold = Some(coerce_count(patch.threshold));
        }
        if let Some(expiry_date) = patch.expiry_date {
            self.expiry_date = expiry_date;
        }

        self.refresh_status(now);
        self.updated_at = now;
        Ok(())
    }

    /// Order or adjust stock by `delta`. The result never drops below zero.
    pub fn adjust_quantity(&mut self, delta: i64, now: DateTime<Utc>) {
        let next = i128::from(self.quantity) + i128::from(delta);
        self.quantity = u64::try_from(next.max(0)).unwrap_or(u64::MAX);
        self.refresh_status(now);
        self.updated_at = now;
    }

    /// Expiry sweep: an expired product has its stock written off.
    ///
    /// Returns `true` if the product was not yet marked expired and is now.
    pub fn expire_if_due(&mut self, now: DateTime<Utc>) -> bool {
        let due = self.expiry_date.is_some_and(|expiry| expiry <= now);
        if !due || self.status == ProductStatus::Expired {
            return false;
        }
        self.status = ProductStatus::Expired;
        self.quantity = 0;
        self.updated_at = now;
        true
    }
}

impl Record for Product {
    type Id = ProductId;

    const KIND: &'static str = "product";

    fn record_id(&self) -> ProductId {
        self.id
    }

    fn created(&self) -> DateTime<Utc> {
        self.created_at
    }
}
