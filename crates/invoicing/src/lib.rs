//! Invoicing domain module.
//!
//! This crate contains business rules for invoices (payment references,
//! first-view tracking), implemented purely as deterministic domain logic
//! (no IO, no HTTP, no storage).

pub mod invoice;

pub use invoice::{
    Invoice, InvoiceDraft, InvoiceId, InvoiceLine, InvoiceStatus, ReferenceNumber,
};
