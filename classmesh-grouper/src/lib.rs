//! classmesh-grouper library - Cross-institution class grouping
//!
//! Decides, one class at a time, which canonical group of equivalent courses
//! a class belongs to, creating a new group when nothing matches.

pub mod config;
pub mod db;
pub mod grouping;
pub mod services;
pub mod utils;

pub use grouping::{Assignment, GroupCatalog, GroupingEngine, GroupingError, MatchKind, Threshold};
pub use services::{ClassAssignment, GroupingService};
