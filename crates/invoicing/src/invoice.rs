use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockpulse_core::{
    DomainError, DomainResult, Record, RecordId, coerce_amount, deserialize_amount,
    deserialize_count, normalize_text,
};

/// Invoice identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceId(pub RecordId);

impl InvoiceId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }

    pub fn generate() -> Self {
        Self(RecordId::new())
    }
}

impl core::fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Invoice payment status.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    #[default]
    Unpaid,
    Paid,
}

/// Payment reference assigned when an invoice is marked paid (`REF-482913`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceNumber(String);

impl ReferenceNumber {
    /// A fresh six-digit reference.
    pub fn generate() -> Self {
        Self(format!("REF-{}", 100_000 + RecordId::new().fold(900_000)))
    }

    pub fn new(value: impl Into<String>) -> DomainResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(DomainError::validation("reference number cannot be empty"));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ReferenceNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One billed line: a product name, a whole quantity and its price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub name: String,
    #[serde(rename = "qty", alias = "quantity", default, deserialize_with = "deserialize_count")]
    pub quantity: u64,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub price: f64,
}

impl InvoiceLine {
    pub fn new(name: impl Into<String>, quantity: u64, price: f64) -> Self {
        Self {
            name: name.into(),
            quantity,
            price: coerce_amount(Some(price)),
        }
    }
}

/// Input for creating an invoice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvoiceDraft {
    #[serde(alias = "invoiceId")]
    pub code: Option<String>,
    pub items: Vec<InvoiceLine>,
    pub subtotal: Option<f64>,
    pub tax: Option<f64>,
    /// Defaults to `subtotal + tax` when absent.
    pub total: Option<f64>,
    pub status: Option<InvoiceStatus>,
    pub due_date: Option<DateTime<Utc>>,
}

/// An issued invoice.
///
/// Invariant: a reference number is present exactly when the invoice is
/// paid. Paid rows without a reference are tolerated (imported legacy data).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    id: InvoiceId,
    #[serde(alias = "invoiceId")]
    code: String,
    #[serde(default)]
    items: Vec<InvoiceLine>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    subtotal: f64,
    #[serde(default, deserialize_with = "deserialize_amount")]
    tax: f64,
    #[serde(default, deserialize_with = "deserialize_amount")]
    total: f64,
    #[serde(default)]
    status: InvoiceStatus,
    #[serde(default)]
    reference_number: Option<ReferenceNumber>,
    #[serde(default)]
    due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    viewed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl Invoice {
    /// Issue an invoice created at `now`.
    pub fn create(id: InvoiceId, draft: InvoiceDraft, now: DateTime<Utc>) -> Self {
        let code = normalize_text(draft.code)
            .unwrap_or_else(|| format!("INV-{}", 1_000 + id.0.fold(9_000)));
        let subtotal = coerce_amount(draft.subtotal);
        let tax = coerce_amount(draft.tax);
        let total = match draft.total {
            Some(total) => coerce_amount(Some(total)),
            None => subtotal + tax,
        };
        let status = draft.status.unwrap_or_default();
        let reference_number = match status {
            InvoiceStatus::Paid => Some(ReferenceNumber::generate()),
            InvoiceStatus::Unpaid => None,
        };

        Self {
            id,
            code,
            items: draft.items,
            subtotal,
            tax,
            total,
            status,
            reference_number,
            due_date: draft.due_date,
            viewed_at: None,
            created_at: now,
        }
    }

    pub fn id_typed(&self) -> InvoiceId {
        self.id
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn items(&self) -> &[InvoiceLine] {
        &self.items
    }

    pub fn subtotal(&self) -> f64 {
        self.subtotal
    }

    pub fn tax(&self) -> f64 {
        self.tax
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn status(&self) -> InvoiceStatus {
        self.status
    }

    pub fn is_paid(&self) -> bool {
        self.status == InvoiceStatus::Paid
    }

    pub fn reference_number(&self) -> Option<&ReferenceNumber> {
        self.reference_number.as_ref()
    }

    pub fn due_date(&self) -> Option<DateTime<Utc>> {
        self.due_date
    }

    pub fn viewed_at(&self) -> Option<DateTime<Utc>> {
        self.viewed_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Total units across all lines.
    pub fn units_sold(&self) -> u64 {
        self.items
            .iter()
            .fold(0u64, |acc, line| acc.saturating_add(line.quantity))
    }

    /// Mark the invoice paid with the given reference.
    ///
    /// Returns `false` (and keeps the first reference) if already paid.
    pub fn mark_paid(&mut self, reference: ReferenceNumber) -> bool {
        if self.is_paid() {
            if self.reference_number.is_none() {
                self.reference_number = Some(reference);
            }
            return false;
        }
        self.status = InvoiceStatus::Paid;
        self.reference_number = Some(reference);
        true
    }

    /// Record the first view. Later views are ignored.
    pub fn mark_viewed(&mut self, now: DateTime<Utc>) -> bool {
        if self.viewed_at.is_some() {
            return false;
        }
        self.viewed_at = Some(now);
        true
    }

    /// Checks the reference invariant on rows that did not come through
    /// [`Invoice::create`].
    pub fn check_reference(&self) -> DomainResult<()> {
        if !self.is_paid() && self.reference_number.is_some() {
            return Err(DomainError::invariant(format!(
                "unpaid invoice {} carries a reference number",
                self.code
            )));
        }
        Ok(())
    }
}

impl Record for Invoice {
    type Id = InvoiceId;

    const KIND: &'static str = "invoice";

    fn record_id(&self) -> InvoiceId {
        self.id
    }

    fn created(&self) -> DateTime<Utc> {
        self.created_at
    }
}
