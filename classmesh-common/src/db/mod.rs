//! Database schema, settings and shared models

pub mod init;
pub mod models;
pub mod settings;

pub use init::*;
pub use models::*;
