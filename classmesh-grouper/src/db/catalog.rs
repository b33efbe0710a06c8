//! SQLite-backed [`GroupCatalog`]
//!
//! Groups are listed in insertion (rowid) order, which is the iteration order
//! the fuzzy scan's first-seen tie-break relies on.

use crate::db::{conflict_on_unique, parse_guid};
use crate::grouping::GroupCatalog;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use classmesh_common::db::ClassGroup;
use classmesh_common::{Error, Result};
use sqlx::SqliteConnection;
use uuid::Uuid;

type GroupRow = (String, String, String, DateTime<Utc>);

pub(crate) fn group_from_row((guid, label, signature, created_at): GroupRow) -> Result<ClassGroup> {
    Ok(ClassGroup {
        id: parse_guid(&guid)?,
        label,
        signature,
        created_at,
    })
}

/// Catalog bound to one connection (usually an open transaction)
pub struct SqliteCatalog<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> SqliteCatalog<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl<'c> GroupCatalog for SqliteCatalog<'c> {
    async fn find_group_by_signature(&mut self, signature: &str) -> Result<Option<ClassGroup>> {
        let row: Option<GroupRow> = sqlx::query_as(
            "SELECT guid, label, signature, created_at FROM class_groups WHERE signature = ?",
        )
        .bind(signature)
        .fetch_optional(&mut *self.conn)
        .await?;

        row.map(group_from_row).transpose()
    }

    async fn list_all_groups(&mut self) -> Result<Vec<ClassGroup>> {
        let rows: Vec<GroupRow> = sqlx::query_as(
            "SELECT guid, label, signature, created_at FROM class_groups ORDER BY rowid ASC",
        )
        .fetch_all(&mut *self.conn)
        .await?;

        rows.into_iter().map(group_from_row).collect()
    }

    async fn create_group(&mut self, label: &str, signature: &str) -> Result<ClassGroup> {
        let group = ClassGroup {
            id: Uuid::new_v4(),
            label: label.to_string(),
            signature: signature.to_string(),
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO class_groups (guid, label, signature, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(group.id.to_string())
        .bind(&group.label)
        .bind(&group.signature)
        .bind(group.created_at)
        .execute(&mut *self.conn)
        .await
        .map_err(|e| {
            conflict_on_unique(e, || {
                format!("class group signature '{}' already exists", signature)
            })
        })?;

        tracing::debug!(group_id = %group.id, signature = %group.signature, "Inserted class group");

        Ok(group)
    }

    async fn upsert_membership(&mut self, class_id: Uuid, group_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO class_group_members (class_guid, group_guid)
            VALUES (?, ?)
            ON CONFLICT(class_guid) DO UPDATE
                SET group_guid = excluded.group_guid,
                    updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(class_id.to_string())
        .bind(group_id.to_string())
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    async fn set_class_group_pointer(&mut self, class_id: Uuid, group_id: Uuid) -> Result<()> {
        let result = sqlx::query(
            "UPDATE classes SET class_group_guid = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
        )
        .bind(group_id.to_string())
        .bind(class_id.to_string())
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("class {}", class_id)));
        }

        Ok(())
    }
}
