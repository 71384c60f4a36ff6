//! Infrastructure layer: in-memory storage, environment config, dev seeding.

pub mod config;
pub mod seed;
pub mod store;

pub use config::{AppConfig, ConfigError};
pub use seed::{SeedError, SeedReport, seed_graph};
pub use store::{
    CatalogSnapshot, InMemoryStore, ListQuery, Page, StoreError, StoreResult, StoreSession,
};
