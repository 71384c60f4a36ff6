//! Stored records: identity plus creation time.

use chrono::{DateTime, Utc};

/// A record the storage collaborator keeps and lists.
///
/// Two records with equal fields but different ids are different records.
/// Listings order by [`Record::created`], newest first.
pub trait Record {
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Record kind used in error messages (`"product"`).
    const KIND: &'static str;

    fn record_id(&self) -> Self::Id;

    fn created(&self) -> DateTime<Utc>;
}
