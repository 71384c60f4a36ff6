//! Products domain module.
//!
//! This crate contains the product record and the availability rules that
//! derive its status, implemented purely as deterministic domain logic
//! (no IO, no HTTP, no storage).

pub mod product;
pub mod status;

pub use product::{Product, ProductDraft, ProductId, ProductPatch};
pub use status::{ProductStatus, classify};
