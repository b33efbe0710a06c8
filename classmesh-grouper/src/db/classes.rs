//! Universities, tags and class records
//!
//! Minimal persistence for the records the grouping engine consumes. Class
//! names are unique per university; tags are created on first use.

use crate::db::{conflict_on_unique, parse_guid};
use classmesh_common::db::{ClassRecord, University};
use classmesh_common::{Error, Result};
use sqlx::SqliteConnection;
use std::collections::BTreeSet;
use uuid::Uuid;

/// Insert a university
pub async fn create_university(conn: &mut SqliteConnection, name: &str) -> Result<University> {
    let name = required(name, "university name")?;
    let university = University {
        id: Uuid::new_v4(),
        name: name.to_string(),
    };

    sqlx::query("INSERT INTO universities (guid, name) VALUES (?, ?)")
        .bind(university.id.to_string())
        .bind(&university.name)
        .execute(&mut *conn)
        .await
        .map_err(|e| conflict_on_unique(e, || format!("university '{}' already exists", name)))?;

    Ok(university)
}

/// Look up a university by exact name
pub async fn find_university_by_name(
    conn: &mut SqliteConnection,
    name: &str,
) -> Result<Option<University>> {
    let row: Option<(String, String)> =
        sqlx::query_as("SELECT guid, name FROM universities WHERE name = ?")
            .bind(name.trim())
            .fetch_optional(&mut *conn)
            .await?;

    row.map(|(guid, name)| {
        Ok(University {
            id: parse_guid(&guid)?,
            name,
        })
    })
    .transpose()
}

/// Look up a class by its university and exact (trimmed) name
pub async fn find_class_by_name(
    conn: &mut SqliteConnection,
    university_id: Uuid,
    name: &str,
) -> Result<Option<ClassRecord>> {
    let guid: Option<String> =
        sqlx::query_scalar("SELECT guid FROM classes WHERE university_guid = ? AND name = ?")
            .bind(university_id.to_string())
            .bind(name.trim())
            .fetch_optional(&mut *conn)
            .await?;

    match guid {
        Some(guid) => Ok(Some(load_class(conn, parse_guid(&guid)?).await?)),
        None => Ok(None),
    }
}

/// Insert a class and attach its tags
pub async fn insert_class(
    conn: &mut SqliteConnection,
    university_id: Uuid,
    name: &str,
    tags: &[String],
) -> Result<ClassRecord> {
    let name = required(name, "class name")?;
    let tags = clean_tags(tags)?;

    let university_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM universities WHERE guid = ?)")
            .bind(university_id.to_string())
            .fetch_one(&mut *conn)
            .await?;
    if !university_exists {
        return Err(Error::NotFound(format!("university {}", university_id)));
    }

    let class_id = Uuid::new_v4();
    sqlx::query("INSERT INTO classes (guid, name, university_guid) VALUES (?, ?, ?)")
        .bind(class_id.to_string())
        .bind(name)
        .bind(university_id.to_string())
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            conflict_on_unique(e, || {
                format!("a class named '{}' already exists in this university", name)
            })
        })?;

    replace_tags(conn, class_id, &tags).await?;

    Ok(ClassRecord {
        id: class_id,
        name: name.to_string(),
        university_id,
        tags: tags.into_iter().collect(),
        group_id: None,
    })
}

/// Rename a class and/or replace its tag set
///
/// `None` leaves the corresponding field untouched.
pub async fn update_class(
    conn: &mut SqliteConnection,
    class_id: Uuid,
    name: Option<&str>,
    tags: Option<&[String]>,
) -> Result<ClassRecord> {
    // Fails with NotFound before any write
    load_class(conn, class_id).await?;

    if let Some(name) = name {
        let name = required(name, "class name")?;
        sqlx::query("UPDATE classes SET name = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?")
            .bind(name)
            .bind(class_id.to_string())
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                conflict_on_unique(e, || {
                    format!("a class named '{}' already exists in this university", name)
                })
            })?;
    }

    if let Some(tags) = tags {
        let tags = clean_tags(tags)?;
        replace_tags(conn, class_id, &tags).await?;
    }

    load_class(conn, class_id).await
}

/// Load a class record with its tag names
pub async fn load_class(conn: &mut SqliteConnection, class_id: Uuid) -> Result<ClassRecord> {
    let row: Option<(String, String, Option<String>)> = sqlx::query_as(
        "SELECT name, university_guid, class_group_guid FROM classes WHERE guid = ?",
    )
    .bind(class_id.to_string())
    .fetch_optional(&mut *conn)
    .await?;

    let (name, university_guid, group_guid) =
        row.ok_or_else(|| Error::NotFound(format!("class {}", class_id)))?;

    Ok(ClassRecord {
        id: class_id,
        name,
        university_id: parse_guid(&university_guid)?,
        tags: class_tag_names(conn, class_id).await?,
        group_id: group_guid.as_deref().map(parse_guid).transpose()?,
    })
}

/// Tag names of a class, ordered by name
pub async fn class_tag_names(conn: &mut SqliteConnection, class_id: Uuid) -> Result<Vec<String>> {
    let names: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT t.name
        FROM class_tags ct
        JOIN tags t ON t.guid = ct.tag_guid
        WHERE ct.class_guid = ?
        ORDER BY t.name ASC
        "#,
    )
    .bind(class_id.to_string())
    .fetch_all(&mut *conn)
    .await?;

    Ok(names)
}

/// Tag id for `name`, creating the tag if needed
pub async fn ensure_tag(conn: &mut SqliteConnection, name: &str) -> Result<Uuid> {
    sqlx::query("INSERT OR IGNORE INTO tags (guid, name) VALUES (?, ?)")
        .bind(Uuid::new_v4().to_string())
        .bind(name)
        .execute(&mut *conn)
        .await?;

    let guid: String = sqlx::query_scalar("SELECT guid FROM tags WHERE name = ?")
        .bind(name)
        .fetch_one(&mut *conn)
        .await?;

    parse_guid(&guid)
}

async fn replace_tags(conn: &mut SqliteConnection, class_id: Uuid, tags: &BTreeSet<String>) -> Result<()> {
    sqlx::query("DELETE FROM class_tags WHERE class_guid = ?")
        .bind(class_id.to_string())
        .execute(&mut *conn)
        .await?;

    for tag in tags {
        let tag_id = ensure_tag(conn, tag).await?;
        sqlx::query("INSERT INTO class_tags (class_guid, tag_guid) VALUES (?, ?)")
            .bind(class_id.to_string())
            .bind(tag_id.to_string())
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

fn required<'a>(value: &'a str, field: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(trimmed)
}

/// Trimmed, deduplicated tag names; blank names are rejected
fn clean_tags(tags: &[String]) -> Result<BTreeSet<String>> {
    tags.iter()
        .map(|t| required(t, "tag name").map(str::to_string))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use classmesh_common::db::init::init_memory_database;

    #[tokio::test]
    async fn test_insert_and_load_class() {
        let pool = init_memory_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let uni = create_university(&mut conn, "UNSW Sydney").await.unwrap();
        let tags = vec!["Operating Systems".to_string(), "Computer Science".to_string()];
        let created = insert_class(&mut conn, uni.id, "  COMP3231 ", &tags).await.unwrap();

        assert_eq!(created.name, "COMP3231");
        assert_eq!(created.tags, vec!["Computer Science", "Operating Systems"]);

        let loaded = load_class(&mut conn, created.id).await.unwrap();
        assert_eq!(loaded, created);
    }

    #[tokio::test]
    async fn test_duplicate_class_name_per_university_conflicts() {
        let pool = init_memory_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let uni = create_university(&mut conn, "RMIT University").await.unwrap();
        insert_class(&mut conn, uni.id, "Algorithms", &[]).await.unwrap();

        let again = insert_class(&mut conn, uni.id, "Algorithms", &[]).await;
        assert!(matches!(again, Err(Error::Conflict(_))));

        let other = create_university(&mut conn, "Monash University").await.unwrap();
        assert!(insert_class(&mut conn, other.id, "Algorithms", &[]).await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_university_not_found() {
        let pool = init_memory_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let result = insert_class(&mut conn, Uuid::new_v4(), "Algorithms", &[]).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_blank_inputs_rejected() {
        let pool = init_memory_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let uni = create_university(&mut conn, "ANU").await.unwrap();

        assert!(matches!(
            insert_class(&mut conn, uni.id, "   ", &[]).await,
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            insert_class(&mut conn, uni.id, "Physics", &[" ".to_string()]).await,
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            create_university(&mut conn, "").await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_update_replaces_tags_and_name() {
        let pool = init_memory_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let uni = create_university(&mut conn, "UQ").await.unwrap();
        let class = insert_class(&mut conn, uni.id, "Genetics", &["Biology".to_string()])
            .await
            .unwrap();

        let renamed = update_class(&mut conn, class.id, Some("Molecular Genetics"), None)
            .await
            .unwrap();
        assert_eq!(renamed.name, "Molecular Genetics");
        assert_eq!(renamed.tags, vec!["Biology"]);

        let retagged = update_class(&mut conn, class.id, None, Some(&["Chemistry".to_string()][..]))
            .await
            .unwrap();
        assert_eq!(retagged.tags, vec!["Chemistry"]);

        let missing = update_class(&mut conn, Uuid::new_v4(), Some("X"), None).await;
        assert!(matches!(missing, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_tags_shared_between_classes() {
        let pool = init_memory_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let first = ensure_tag(&mut conn, "Mathematics").await.unwrap();
        let second = ensure_tag(&mut conn, "Mathematics").await.unwrap();
        assert_eq!(first, second);
    }
}
