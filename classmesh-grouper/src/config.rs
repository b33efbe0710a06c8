//! Configuration resolution for classmesh-grouper
//!
//! Threshold priority: CLI → TOML → database settings → built-in default.
//! The winning value is validated, never clamped.

use crate::grouping::{Denylists, GroupingEngine, Threshold, Tokenizer};
use classmesh_common::config::TomlConfig;
use classmesh_common::db::settings::{get_setting, CLASS_GROUP_THRESHOLD, DB_MAX_LOCK_WAIT_MS};
use classmesh_common::Result;
use sqlx::SqlitePool;
use tracing::info;

/// Resolve the fuzzy match threshold
pub async fn resolve_threshold(
    cli_threshold: Option<f64>,
    toml_config: &TomlConfig,
    db: &SqlitePool,
) -> Result<Threshold> {
    // Tier 1: Command line
    if let Some(value) = cli_threshold {
        info!(threshold = value, "Grouping threshold from command line");
        return Ok(Threshold::new(value)?);
    }

    // Tier 2: TOML config
    if let Some(value) = toml_config.grouping.threshold {
        info!(threshold = value, "Grouping threshold from TOML config");
        return Ok(Threshold::new(value)?);
    }

    // Tier 3: Database settings
    if let Some(value) = get_setting::<f64>(db, CLASS_GROUP_THRESHOLD).await? {
        info!(threshold = value, "Grouping threshold from database settings");
        return Ok(Threshold::new(value)?);
    }

    Ok(Threshold::DEFAULT)
}

/// Lock-contention retry budget from database settings
pub async fn resolve_max_lock_wait_ms(db: &SqlitePool, default_ms: u64) -> Result<u64> {
    Ok(get_setting::<u64>(db, DB_MAX_LOCK_WAIT_MS).await?.unwrap_or(default_ms))
}

/// Engine with denylists built once from the TOML config
pub fn build_engine(toml_config: &TomlConfig) -> GroupingEngine {
    let denylists = Denylists::from_config(&toml_config.grouping);
    GroupingEngine::new(Tokenizer::new(denylists))
}
