//! Settings table access
//!
//! Settings are stored as text key/value pairs. Missing or NULL values are
//! (re)initialized to built-in defaults by [`init_default_settings`].

use crate::{Error, Result};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::warn;

/// Fuzzy match threshold used when neither CLI nor TOML supply one
pub const CLASS_GROUP_THRESHOLD: &str = "class_group_threshold";

/// Upper bound on total time spent retrying a locked database write
pub const DB_MAX_LOCK_WAIT_MS: &str = "db_max_lock_wait_ms";

/// Create the settings table
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Initialize or repair default settings
pub async fn init_default_settings(pool: &SqlitePool) -> Result<()> {
    ensure_setting(pool, CLASS_GROUP_THRESHOLD, "0.4").await?;
    ensure_setting(pool, DB_MAX_LOCK_WAIT_MS, "5000").await?;
    Ok(())
}

/// Ensure a setting exists with the specified default value
///
/// If the setting doesn't exist, it will be created with the default.
/// If the setting exists but has a NULL value, it will be reset to the default.
pub async fn ensure_setting(pool: &SqlitePool, key: &str, default_value: &str) -> Result<()> {
    // INSERT OR IGNORE tolerates concurrent initialization
    sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
        .bind(key)
        .bind(default_value)
        .execute(pool)
        .await?;

    let reset = sqlx::query(
        "UPDATE settings SET value = ?, updated_at = CURRENT_TIMESTAMP WHERE key = ? AND value IS NULL",
    )
    .bind(default_value)
    .bind(key)
    .execute(pool)
    .await?;

    if reset.rows_affected() > 0 {
        warn!("Setting '{}' was NULL, reset to default: {}", key, default_value);
    }

    Ok(())
}

/// Read and parse a setting, `None` when absent or NULL
pub async fn get_setting<T>(pool: &SqlitePool, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let value: Option<Option<String>> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(pool)
            .await?;

    match value.flatten() {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| Error::Config(format!("Invalid value for setting '{}': {}", key, e))),
        None => Ok(None),
    }
}

/// Write a setting
pub async fn set_setting(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::init_memory_database;

    #[tokio::test]
    async fn test_defaults_present_after_init() {
        let pool = init_memory_database().await.unwrap();

        let threshold: Option<f64> = get_setting(&pool, CLASS_GROUP_THRESHOLD).await.unwrap();
        assert_eq!(threshold, Some(0.4));

        let wait: Option<u64> = get_setting(&pool, DB_MAX_LOCK_WAIT_MS).await.unwrap();
        assert_eq!(wait, Some(5000));
    }

    #[tokio::test]
    async fn test_null_setting_reset_to_default() {
        let pool = init_memory_database().await.unwrap();

        sqlx::query("UPDATE settings SET value = NULL WHERE key = ?")
            .bind(CLASS_GROUP_THRESHOLD)
            .execute(&pool)
            .await
            .unwrap();
        let missing: Option<f64> = get_setting(&pool, CLASS_GROUP_THRESHOLD).await.unwrap();
        assert_eq!(missing, None);

        init_default_settings(&pool).await.unwrap();
        let restored: Option<f64> = get_setting(&pool, CLASS_GROUP_THRESHOLD).await.unwrap();
        assert_eq!(restored, Some(0.4));
    }

    #[tokio::test]
    async fn test_existing_value_not_overwritten() {
        let pool = init_memory_database().await.unwrap();

        set_setting(&pool, CLASS_GROUP_THRESHOLD, "0.55").await.unwrap();
        init_default_settings(&pool).await.unwrap();

        let threshold: Option<f64> = get_setting(&pool, CLASS_GROUP_THRESHOLD).await.unwrap();
        assert_eq!(threshold, Some(0.55));
    }

    #[tokio::test]
    async fn test_unparseable_value_is_config_error() {
        let pool = init_memory_database().await.unwrap();

        set_setting(&pool, CLASS_GROUP_THRESHOLD, "lots").await.unwrap();
        let result: Result<Option<f64>> = get_setting(&pool, CLASS_GROUP_THRESHOLD).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
