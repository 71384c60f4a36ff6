//! Shared building blocks for the stockpulse domain crates.
//!
//! Nothing here touches storage or IO; time comes in through [`Clock`].

pub mod clock;
pub mod coerce;
pub mod error;
pub mod id;
pub mod record;

pub use clock::{Clock, FixedClock, SystemClock};
pub use coerce::{
    coerce_amount, coerce_count, deserialize_amount, deserialize_count, deserialize_opt_count,
    normalize_text,
};
pub use error::{DomainError, DomainResult};
pub use id::RecordId;
pub use record::Record;
