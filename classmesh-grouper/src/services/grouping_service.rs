//! Class Grouping Service
//!
//! Runs the grouping engine against the SQLite catalog for class create, edit
//! and re-assign events.
//!
//! Every write runs under one process-wide async mutex (single writer) inside
//! one transaction, so a create-group and its membership link commit together
//! and two near-duplicate classes can never both miss each other's new group.
//! Lock contention from other processes is retried here, never in the engine.

use crate::db::{classes, groups, SqliteCatalog};
use crate::grouping::{GroupingEngine, MatchKind, Threshold};
use crate::utils::retry_on_lock;
use classmesh_common::db::{ClassGroup, ClassRecord, GroupMember, GroupSiblings, University};
use classmesh_common::Result;
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Default upper bound on lock-contention retries
pub const DEFAULT_MAX_LOCK_WAIT_MS: u64 = 5000;

/// A class after (re)assignment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassAssignment {
    pub class: ClassRecord,
    pub group: ClassGroup,
    #[serde(rename = "match")]
    pub kind: MatchKind,
}

/// Class Grouping Service
pub struct GroupingService {
    pool: SqlitePool,
    engine: GroupingEngine,
    threshold: Threshold,
    max_lock_wait_ms: u64,
    write_lock: Mutex<()>,
}

impl GroupingService {
    pub fn new(pool: SqlitePool, engine: GroupingEngine, threshold: Threshold) -> Self {
        Self {
            pool,
            engine,
            threshold,
            max_lock_wait_ms: DEFAULT_MAX_LOCK_WAIT_MS,
            write_lock: Mutex::new(()),
        }
    }

    /// Override the total time spent retrying a locked database
    pub fn with_max_lock_wait_ms(mut self, max_lock_wait_ms: u64) -> Self {
        self.max_lock_wait_ms = max_lock_wait_ms;
        self
    }

    pub fn threshold(&self) -> Threshold {
        self.threshold
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn create_university(&self, name: &str) -> Result<University> {
        let mut conn = self.pool.acquire().await?;
        classes::create_university(&mut conn, name).await
    }

    pub async fn find_university(&self, name: &str) -> Result<Option<University>> {
        let mut conn = self.pool.acquire().await?;
        classes::find_university_by_name(&mut conn, name).await
    }

    pub async fn find_class(&self, university_id: Uuid, name: &str) -> Result<Option<ClassRecord>> {
        let mut conn = self.pool.acquire().await?;
        classes::find_class_by_name(&mut conn, university_id, name).await
    }

    /// Create a class and assign it to a group in one transaction
    pub async fn create_class(
        &self,
        university_id: Uuid,
        name: &str,
        tags: &[String],
    ) -> Result<ClassAssignment> {
        let _writer = self.write_lock.lock().await;

        retry_on_lock("create class", self.max_lock_wait_ms, move || async move {
            let mut tx = self.pool.begin().await?;
            let record = classes::insert_class(&mut tx, university_id, name, tags).await?;
            let assignment = self.assign_record(&mut tx, record).await?;
            tx.commit().await?;
            Ok(assignment)
        })
        .await
    }

    /// Apply a name and/or tag edit and re-assign the class
    ///
    /// The class is re-assigned even when nothing changed; the result is the
    /// same group via the exact-signature path unless the catalog moved on.
    pub async fn update_class(
        &self,
        class_id: Uuid,
        name: Option<&str>,
        tags: Option<&[String]>,
    ) -> Result<ClassAssignment> {
        let _writer = self.write_lock.lock().await;

        retry_on_lock("update class", self.max_lock_wait_ms, move || async move {
            let mut tx = self.pool.begin().await?;
            let record = classes::update_class(&mut tx, class_id, name, tags).await?;
            let assignment = self.assign_record(&mut tx, record).await?;
            tx.commit().await?;
            Ok(assignment)
        })
        .await
    }

    /// Re-run grouping for an existing class
    pub async fn assign_class(&self, class_id: Uuid) -> Result<ClassAssignment> {
        let _writer = self.write_lock.lock().await;

        retry_on_lock("assign class", self.max_lock_wait_ms, move || async move {
            let mut tx = self.pool.begin().await?;
            let record = classes::load_class(&mut tx, class_id).await?;
            let assignment = self.assign_record(&mut tx, record).await?;
            tx.commit().await?;
            Ok(assignment)
        })
        .await
    }

    pub async fn list_groups(&self) -> Result<Vec<ClassGroup>> {
        let mut conn = self.pool.acquire().await?;
        groups::list_groups(&mut conn).await
    }

    pub async fn get_group(&self, group_id: Uuid) -> Result<ClassGroup> {
        let mut conn = self.pool.acquire().await?;
        groups::get_group(&mut conn, group_id).await
    }

    pub async fn group_members(&self, group_id: Uuid) -> Result<Vec<GroupMember>> {
        let mut conn = self.pool.acquire().await?;
        // NotFound for unknown groups rather than an empty list
        groups::get_group(&mut conn, group_id).await?;
        groups::group_members(&mut conn, group_id).await
    }

    pub async fn siblings_of_class(&self, class_id: Uuid) -> Result<GroupSiblings> {
        let mut conn = self.pool.acquire().await?;
        groups::siblings_of_class(&mut conn, class_id).await
    }

    async fn assign_record(
        &self,
        conn: &mut SqliteConnection,
        mut record: ClassRecord,
    ) -> Result<ClassAssignment> {
        let mut catalog = SqliteCatalog::new(conn);
        let assignment = self
            .engine
            .assign(&mut record, self.threshold, &mut catalog)
            .await?;

        tracing::info!(
            class_id = %record.id,
            group_id = %assignment.group.id,
            label = %assignment.group.label,
            kind = ?assignment.kind,
            "Class assigned to group"
        );

        Ok(ClassAssignment {
            class: record,
            group: assignment.group,
            kind: assignment.kind,
        })
    }
}
