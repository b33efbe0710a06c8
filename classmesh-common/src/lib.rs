//! # Classmesh Common Library
//!
//! Shared code for the classmesh services including:
//! - Error and result types
//! - Bootstrap configuration loading and root folder resolution
//! - Database schema initialization, settings and shared models

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
