//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct University {
    pub id: Uuid,
    pub name: String,
}

/// A course offering at one university, as seen by the grouping core
///
/// `group_id` mirrors the denormalized `classes.class_group_guid` pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRecord {
    pub id: Uuid,
    pub name: String,
    pub university_id: Uuid,
    /// Tag names, ordered by name
    pub tags: Vec<String>,
    pub group_id: Option<Uuid>,
}

impl ClassRecord {
    /// Build an unpersisted record with a fresh id
    pub fn new(name: impl Into<String>, university_id: Uuid, tags: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            university_id,
            tags,
            group_id: None,
        }
    }
}

/// Canonical cluster of equivalent course offerings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassGroup {
    pub id: Uuid,
    pub label: String,
    /// Founding record's signature, never updated
    pub signature: String,
    pub created_at: DateTime<Utc>,
}

/// One class listed under a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    pub class_id: Uuid,
    pub name: String,
    pub university: String,
    pub tags: Vec<String>,
}

/// A class together with every class sharing its group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSiblings {
    pub group_id: Uuid,
    pub classes: Vec<GroupMember>,
}
