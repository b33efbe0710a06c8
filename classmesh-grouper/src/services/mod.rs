//! Services wiring the grouping engine to the database

pub mod grouping_service;
pub mod seed;

pub use grouping_service::{ClassAssignment, GroupingService, DEFAULT_MAX_LOCK_WAIT_MS};
pub use seed::{seed_catalog, SeedClass, SeedFile, SeedReport};
