//! Group catalog storage contract
//!
//! The grouping engine reads and mutates groups only through [`GroupCatalog`].
//! The SQLite implementation lives in [`crate::db::catalog`]; [`MemoryCatalog`]
//! keeps everything in process.

use async_trait::async_trait;
use chrono::Utc;
use classmesh_common::db::ClassGroup;
use classmesh_common::{Error, Result};
use std::collections::HashMap;
use uuid::Uuid;

/// Storage operations required by the grouping engine
///
/// One `assign` call issues several of these; the caller must run them as one
/// atomic unit and serialize it against other `assign` calls.
#[async_trait]
pub trait GroupCatalog: Send {
    /// Group whose stored signature equals `signature`
    async fn find_group_by_signature(&mut self, signature: &str) -> Result<Option<ClassGroup>>;

    /// Every group, in catalog order (oldest first)
    async fn list_all_groups(&mut self) -> Result<Vec<ClassGroup>>;

    /// Persist a new group
    ///
    /// Fails with [`Error::Conflict`] if the signature is already taken.
    async fn create_group(&mut self, label: &str, signature: &str) -> Result<ClassGroup>;

    /// Point the class's single membership at `group_id`, creating it if absent
    async fn upsert_membership(&mut self, class_id: Uuid, group_id: Uuid) -> Result<()>;

    /// Update the denormalized group pointer on the class record
    async fn set_class_group_pointer(&mut self, class_id: Uuid, group_id: Uuid) -> Result<()>;
}

/// In-process catalog, iterated in insertion order
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    groups: Vec<ClassGroup>,
    by_signature: HashMap<String, usize>,
    memberships: HashMap<Uuid, Uuid>,
    class_pointers: HashMap<Uuid, Uuid>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn groups(&self) -> &[ClassGroup] {
        &self.groups
    }

    pub fn group(&self, group_id: Uuid) -> Option<&ClassGroup> {
        self.groups.iter().find(|g| g.id == group_id)
    }

    /// Group the class currently belongs to
    pub fn membership_of(&self, class_id: Uuid) -> Option<Uuid> {
        self.memberships.get(&class_id).copied()
    }

    /// Denormalized pointer last written for the class
    pub fn class_group_pointer(&self, class_id: Uuid) -> Option<Uuid> {
        self.class_pointers.get(&class_id).copied()
    }

    /// Classes whose membership points at `group_id`, sorted by id
    pub fn members_of(&self, group_id: Uuid) -> Vec<Uuid> {
        let mut members: Vec<Uuid> = self
            .memberships
            .iter()
            .filter(|(_, g)| **g == group_id)
            .map(|(c, _)| *c)
            .collect();
        members.sort();
        members
    }

    pub fn membership_count(&self) -> usize {
        self.memberships.len()
    }
}

#[async_trait]
impl GroupCatalog for MemoryCatalog {
    async fn find_group_by_signature(&mut self, signature: &str) -> Result<Option<ClassGroup>> {
        Ok(self
            .by_signature
            .get(signature)
            .map(|&index| self.groups[index].clone()))
    }

    async fn list_all_groups(&mut self) -> Result<Vec<ClassGroup>> {
        Ok(self.groups.clone())
    }

    async fn create_group(&mut self, label: &str, signature: &str) -> Result<ClassGroup> {
        if self.by_signature.contains_key(signature) {
            return Err(Error::Conflict(format!(
                "class group signature '{}' already exists",
                signature
            )));
        }

        let group = ClassGroup {
            id: Uuid::new_v4(),
            label: label.to_string(),
            signature: signature.to_string(),
            created_at: Utc::now(),
        };

        self.by_signature
            .insert(group.signature.clone(), self.groups.len());
        self.groups.push(group.clone());

        Ok(group)
    }

    async fn upsert_membership(&mut self, class_id: Uuid, group_id: Uuid) -> Result<()> {
        self.memberships.insert(class_id, group_id);
        Ok(())
    }

    async fn set_class_group_pointer(&mut self, class_id: Uuid, group_id: Uuid) -> Result<()> {
        self.class_pointers.insert(class_id, group_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_find_by_signature() {
        let mut catalog = MemoryCatalog::new();
        let created = catalog.create_group("Algorithms", "algorithms").await.unwrap();

        let found = catalog.find_group_by_signature("algorithms").await.unwrap();
        assert_eq!(found, Some(created));
        assert!(catalog.find_group_by_signature("biology").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_signature_conflicts() {
        let mut catalog = MemoryCatalog::new();
        catalog.create_group("Algorithms", "algorithms").await.unwrap();

        let second = catalog.create_group("Algorithms", "algorithms").await;
        assert!(matches!(second, Err(Error::Conflict(_))));
        assert_eq!(catalog.groups().len(), 1);
    }

    #[tokio::test]
    async fn test_list_preserves_insertion_order() {
        let mut catalog = MemoryCatalog::new();
        for sig in ["zoology", "algebra", "music"] {
            catalog.create_group(sig, sig).await.unwrap();
        }

        let listed: Vec<String> = catalog
            .list_all_groups()
            .await
            .unwrap()
            .into_iter()
            .map(|g| g.signature)
            .collect();
        assert_eq!(listed, vec!["zoology", "algebra", "music"]);
    }

    #[tokio::test]
    async fn test_upsert_membership_overwrites() {
        let mut catalog = MemoryCatalog::new();
        let a = catalog.create_group("A", "a").await.unwrap();
        let b = catalog.create_group("B", "b").await.unwrap();
        let class_id = Uuid::new_v4();

        catalog.upsert_membership(class_id, a.id).await.unwrap();
        catalog.upsert_membership(class_id, b.id).await.unwrap();

        assert_eq!(catalog.membership_count(), 1);
        assert_eq!(catalog.membership_of(class_id), Some(b.id));
        assert!(catalog.members_of(a.id).is_empty());
        assert_eq!(catalog.members_of(b.id), vec![class_id]);
    }
}
