//! Grouping engine
//!
//! Resolves a class record to a canonical group in three steps:
//! 1. exact signature match
//! 2. best Jaccard match over every catalog group, accepted at `>= threshold`
//! 3. otherwise a new group founded by this record
//!
//! Exact signature equality always wins over fuzzy scoring, even a perfect one.
//! The fuzzy scan is linear in the number of groups.

use crate::grouping::catalog::GroupCatalog;
use crate::grouping::signature::{signature, signature_tokens};
use crate::grouping::similarity::jaccard;
use crate::grouping::tokenizer::{TokenSet, Tokenizer};
use crate::grouping::GroupingError;
use classmesh_common::db::{ClassGroup, ClassRecord};
use serde::Serialize;
use tracing::{debug, info};

/// Label of a group founded by a record with no usable tokens
pub const GENERAL_LABEL: &str = "General";

/// Maximum number of tokens in a minted label
pub const LABEL_TOKENS: usize = 3;

/// Minimum Jaccard score for a fuzzy match, within [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct Threshold(f64);

impl Threshold {
    pub const DEFAULT: Threshold = Threshold(0.4);

    /// Validate a caller-supplied threshold
    ///
    /// Out-of-range and NaN values are rejected rather than clamped.
    pub fn new(value: f64) -> Result<Self, GroupingError> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(GroupingError::InvalidThreshold(value))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<f64> for Threshold {
    type Error = GroupingError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// How a record was resolved
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchKind {
    /// Signature equal to an existing group's
    Exact,
    /// Best fuzzy candidate at or above threshold
    Fuzzy { score: f64 },
    /// No match, new group founded
    Created,
}

/// Outcome of [`GroupingEngine::assign`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assignment {
    pub group: ClassGroup,
    pub kind: MatchKind,
}

/// Online class grouping
#[derive(Debug, Clone, Default)]
pub struct GroupingEngine {
    tokenizer: Tokenizer,
}

impl GroupingEngine {
    pub fn new(tokenizer: Tokenizer) -> Self {
        Self { tokenizer }
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Resolve `record` to a group, creating one if nothing matches
    ///
    /// On success `record.group_id` holds the resolved group and the catalog
    /// carries the class pointer and an overwritten (never duplicated)
    /// membership. Catalog failures are returned untouched; nothing is retried.
    pub async fn assign<C>(
        &self,
        record: &mut ClassRecord,
        threshold: Threshold,
        catalog: &mut C,
    ) -> Result<Assignment, GroupingError>
    where
        C: GroupCatalog + ?Sized,
    {
        let tokens = self.tokenizer.normalize(&record.name, &record.tags);
        let sig = signature(&tokens);

        debug!(
            class_id = %record.id,
            signature = %sig,
            token_count = tokens.len(),
            "Assigning class to group"
        );

        if let Some(group) = catalog.find_group_by_signature(&sig).await? {
            debug!(class_id = %record.id, group_id = %group.id, "Exact signature match");
            link(record, &group, catalog).await?;
            return Ok(Assignment {
                group,
                kind: MatchKind::Exact,
            });
        }

        if let Some((group, score)) = best_fuzzy_match(&tokens, catalog.list_all_groups().await?) {
            if score >= threshold.value() {
                debug!(
                    class_id = %record.id,
                    group_id = %group.id,
                    score,
                    threshold = threshold.value(),
                    "Fuzzy match accepted"
                );
                link(record, &group, catalog).await?;
                return Ok(Assignment {
                    group,
                    kind: MatchKind::Fuzzy { score },
                });
            }

            debug!(
                class_id = %record.id,
                best_group_id = %group.id,
                score,
                threshold = threshold.value(),
                "Best fuzzy match below threshold"
            );
        }

        let label = label_from_tokens(&tokens);
        let group = catalog.create_group(&label, &sig).await?;
        info!(
            class_id = %record.id,
            group_id = %group.id,
            label = %group.label,
            signature = %group.signature,
            "Created class group"
        );
        link(record, &group, catalog).await?;

        Ok(Assignment {
            group,
            kind: MatchKind::Created,
        })
    }
}

/// Highest-scoring group, earliest in catalog order on ties
///
/// Groups scoring 0.0 never become candidates.
fn best_fuzzy_match(tokens: &TokenSet, groups: Vec<ClassGroup>) -> Option<(ClassGroup, f64)> {
    let mut best: Option<(ClassGroup, f64)> = None;
    let mut best_score = 0.0;

    for group in groups {
        let score = jaccard(tokens.as_set(), &signature_tokens(&group.signature));
        if score > best_score {
            best_score = score;
            best = Some((group, score));
        }
    }

    best
}

async fn link<C>(record: &mut ClassRecord, group: &ClassGroup, catalog: &mut C) -> Result<(), GroupingError>
where
    C: GroupCatalog + ?Sized,
{
    catalog.set_class_group_pointer(record.id, group.id).await?;
    catalog.upsert_membership(record.id, group.id).await?;
    record.group_id = Some(group.id);
    Ok(())
}

/// Up to [`LABEL_TOKENS`] non-numeric tokens, capitalized and space-joined
pub fn label_from_tokens(tokens: &TokenSet) -> String {
    let words: Vec<String> = tokens
        .iter()
        .filter(|t| !t.chars().all(|c| c.is_ascii_digit()))
        .take(LABEL_TOKENS)
        .map(capitalize)
        .collect();

    if words.is_empty() {
        GENERAL_LABEL.to_string()
    } else {
        words.join(" ")
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}
