//! Capability catalog ("skills") consumed by the cognitive cycle.
//!
//! The cycle only enumerates descriptions and looks capabilities up by
//! identifier; execution lives behind [`crate::action::SkillInvoker`].

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::{info, warn};

pub mod arguments;

pub use arguments::{ArgumentResolver, OracleArgumentResolver, SkillArguments};

/// Worked example shown to the oracle when resolving arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillExample {
    pub ask: String,
    pub answer: String,
}

/// A named, independently executable ability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capability {
    /// Identifier emitted after `[SKILL]:`.
    pub name: String,
    pub description: String,
    /// Argument name to human-readable description.
    #[serde(default)]
    pub arguments: BTreeMap<String, String>,
    #[serde(default)]
    pub examples: Vec<SkillExample>,
}

/// Read-only table of capabilities.
pub trait CapabilityCatalog: Send + Sync {
    /// `(description, identifier)` pairs in catalog order.
    fn list_descriptions(&self) -> Vec<(String, String)>;

    fn lookup(&self, identifier: &str) -> Option<Capability>;
}

#[derive(Debug, Default, Deserialize)]
struct SkillFile {
    #[serde(default)]
    skills: Vec<Capability>,
}

/// Catalog backed by a YAML skill file, preserving file order.
#[derive(Debug, Clone, Default)]
pub struct SkillCatalog {
    skills: Vec<Capability>,
}

impl SkillCatalog {
    pub fn new(skills: Vec<Capability>) -> Self {
        let mut seen = HashSet::new();
        let skills = skills
            .into_iter()
            .filter(|skill| {
                if skill.name.trim().is_empty() {
                    warn!(description = %skill.description, "Skipping skill without a name");
                    return false;
                }
                if !seen.insert(skill.name.clone()) {
                    warn!(skill_name = %skill.name, "Skipping duplicate skill definition");
                    return false;
                }
                true
            })
            .collect();
        Self { skills }
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let file: SkillFile =
            serde_yaml::from_str(raw).context("failed to parse skill catalog YAML")?;
        Ok(Self::new(file.skills))
    }

    pub async fn load_from_file(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read skill catalog {}", path.display()))?;
        let catalog = Self::from_yaml_str(&raw)?;
        info!(
            path = %path.display(),
            skills = catalog.skills.len(),
            "Loaded skill catalog"
        );
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}

impl CapabilityCatalog for SkillCatalog {
    fn list_descriptions(&self) -> Vec<(String, String)> {
        self.skills
            .iter()
            .map(|s| (s.description.clone(), s.name.clone()))
            .collect()
    }

    fn lookup(&self, identifier: &str) -> Option<Capability> {
        self.skills.iter().find(|s| s.name == identifier).cloned()
    }
}
