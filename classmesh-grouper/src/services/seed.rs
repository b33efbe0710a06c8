//! Seeding universities and classes from a TOML file
//!
//! ```toml
//! universities = ["UNSW Sydney", "RMIT University"]
//!
//! [[classes]]
//! university = "UNSW Sydney"
//! name = "Operating Systems"
//! tags = ["Computer Science"]
//! ```
//!
//! Classes are created and grouped in file order, so group founders follow
//! the file. Re-running a seed skips rows that already exist.

use crate::services::GroupingService;
use classmesh_common::db::University;
use classmesh_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub universities: Vec<String>,
    #[serde(default)]
    pub classes: Vec<SeedClass>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedClass {
    pub university: String,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl SeedFile {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::InvalidInput(format!("Invalid seed file: {}", e)))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub universities_created: usize,
    pub classes_created: usize,
    pub classes_skipped: usize,
    pub groups_created: usize,
}

/// Create every listed university and class, grouping each class as it lands
pub async fn seed_catalog(service: &GroupingService, seed: &SeedFile) -> Result<SeedReport> {
    let mut report = SeedReport::default();
    let mut universities: HashMap<String, University> = HashMap::new();

    let groups_before = service.list_groups().await?.len();

    let referenced = seed
        .universities
        .iter()
        .chain(seed.classes.iter().map(|c| &c.university));

    for name in referenced {
        let key = name.trim().to_string();
        if universities.contains_key(&key) {
            continue;
        }

        let university = match service.find_university(&key).await? {
            Some(existing) => existing,
            None => {
                report.universities_created += 1;
                service.create_university(&key).await?
            }
        };
        universities.insert(key, university);
    }

    for class in &seed.classes {
        let university = universities
            .get(class.university.trim())
            .ok_or_else(|| Error::Internal(format!("university '{}' not seeded", class.university)))?;

        if service.find_class(university.id, &class.name).await?.is_some() {
            report.classes_skipped += 1;
            warn!(class = %class.name, university = %university.name, "Skipping existing class");
            continue;
        }

        // Any failure here, a Conflict included, aborts the seed
        let assignment = service.create_class(university.id, &class.name, &class.tags).await?;
        report.classes_created += 1;
        info!(
            class = %class.name,
            university = %university.name,
            group = %assignment.group.label,
            "Seeded class"
        );
    }

    report.groups_created = service.list_groups().await?.len() - groups_before;

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seed_file() {
        let seed = SeedFile::from_toml_str(
            r#"
            universities = ["ANU"]

            [[classes]]
            university = "UNSW Sydney"
            name = "Operating Systems"
            tags = ["Computer Science"]

            [[classes]]
            university = "ANU"
            name = "Genetics"
            "#,
        )
        .unwrap();

        assert_eq!(seed.universities, vec!["ANU"]);
        assert_eq!(seed.classes.len(), 2);
        assert_eq!(seed.classes[0].tags, vec!["Computer Science"]);
        assert!(seed.classes[1].tags.is_empty());
    }

    #[test]
    fn test_class_without_name_rejected() {
        let result = SeedFile::from_toml_str("[[classes]]\nuniversity = \"ANU\"\n");
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
