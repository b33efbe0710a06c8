//! Read-side group queries

use crate::db::catalog::group_from_row;
use crate::db::classes::class_tag_names;
use crate::db::parse_guid;
use chrono::{DateTime, Utc};
use classmesh_common::db::{ClassGroup, GroupMember, GroupSiblings};
use classmesh_common::{Error, Result};
use sqlx::SqliteConnection;
use uuid::Uuid;

/// All groups, oldest first
pub async fn list_groups(conn: &mut SqliteConnection) -> Result<Vec<ClassGroup>> {
    let rows: Vec<(String, String, String, DateTime<Utc>)> = sqlx::query_as(
        "SELECT guid, label, signature, created_at FROM class_groups ORDER BY rowid ASC",
    )
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter().map(group_from_row).collect()
}

pub async fn get_group(conn: &mut SqliteConnection, group_id: Uuid) -> Result<ClassGroup> {
    let row: Option<(String, String, String, DateTime<Utc>)> = sqlx::query_as(
        "SELECT guid, label, signature, created_at FROM class_groups WHERE guid = ?",
    )
    .bind(group_id.to_string())
    .fetch_optional(&mut *conn)
    .await?;

    row.map(group_from_row)
        .transpose()?
        .ok_or_else(|| Error::NotFound(format!("class group {}", group_id)))
}

/// Classes whose membership points at the group, ordered by class name
pub async fn group_members(conn: &mut SqliteConnection, group_id: Uuid) -> Result<Vec<GroupMember>> {
    let rows: Vec<(String, String, String)> = sqlx::query_as(
        r#"
        SELECT c.guid, c.name, u.name
        FROM class_group_members m
        JOIN classes c ON c.guid = m.class_guid
        JOIN universities u ON u.guid = c.university_guid
        WHERE m.group_guid = ?
        ORDER BY c.name ASC, u.name ASC
        "#,
    )
    .bind(group_id.to_string())
    .fetch_all(&mut *conn)
    .await?;

    let mut members = Vec::with_capacity(rows.len());
    for (guid, name, university) in rows {
        let class_id = parse_guid(&guid)?;
        members.push(GroupMember {
            class_id,
            name,
            university,
            tags: class_tag_names(conn, class_id).await?,
        });
    }

    Ok(members)
}

/// Group of the given class plus every class in it (the class included)
pub async fn siblings_of_class(conn: &mut SqliteConnection, class_id: Uuid) -> Result<GroupSiblings> {
    let group_guid: Option<String> =
        sqlx::query_scalar("SELECT group_guid FROM class_group_members WHERE class_guid = ?")
            .bind(class_id.to_string())
            .fetch_optional(&mut *conn)
            .await?;

    let group_id = match group_guid {
        Some(guid) => parse_guid(&guid)?,
        None => return Err(Error::NotFound(format!("group membership for class {}", class_id))),
    };

    Ok(GroupSiblings {
        group_id,
        classes: group_members(conn, group_id).await?,
    })
}
