use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::defaults::DEFAULT_BELIEFS_YAML;
use crate::core::errors::ApiError;

#[derive(Debug, Error)]
pub enum BeliefMapError {
    #[error("failed to read belief map {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse belief map: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("belief map defines no beliefs")]
    Empty,
    #[error("belief key '{0}' is defined more than once")]
    DuplicateKey(String),
    #[error("belief '{0}' has an empty key or statement")]
    Blank(String),
}

impl From<BeliefMapError> for ApiError {
    fn from(err: BeliefMapError) -> Self {
        ApiError::internal(err)
    }
}

#[derive(Debug, Deserialize)]
struct BeliefFile {
    categories: Vec<CategoryEntry>,
}

#[derive(Debug, Deserialize)]
struct CategoryEntry {
    name: String,
    #[serde(default)]
    description: String,
    beliefs: Vec<BeliefEntry>,
}

#[derive(Debug, Deserialize)]
struct BeliefEntry {
    key: String,
    statement: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Belief {
    pub key: String,
    pub statement: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BeliefCategory {
    pub name: String,
    pub description: String,
    pub keys: Vec<String>,
}

/// Belief keys and their user-facing statements, in load order.
///
/// Built once at startup and shared read-only; the key set never changes
/// for the lifetime of the process.
#[derive(Debug, Clone, Serialize)]
pub struct BeliefMap {
    beliefs: Vec<Belief>,
    categories: Vec<BeliefCategory>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl BeliefMap {
    pub fn from_yaml(contents: &str) -> Result<Self, BeliefMapError> {
        let file: BeliefFile = serde_yaml::from_str(contents)?;

        let mut beliefs = Vec::new();
        let mut categories = Vec::with_capacity(file.categories.len());
        let mut index = HashMap::new();

        for category in file.categories {
            let mut keys = Vec::with_capacity(category.beliefs.len());
            for entry in category.beliefs {
                let key = entry.key.trim().to_string();
                let statement = entry.statement.trim().to_string();
                if key.is_empty() || statement.is_empty() {
                    return Err(BeliefMapError::Blank(key));
                }
                if index.insert(key.clone(), beliefs.len()).is_some() {
                    return Err(BeliefMapError::DuplicateKey(key));
                }
                keys.push(key.clone());
                beliefs.push(Belief {
                    key,
                    statement,
                    category: category.name.clone(),
                });
            }
            categories.push(BeliefCategory {
                name: category.name,
                description: category.description.trim().to_string(),
                keys,
            });
        }

        if beliefs.is_empty() {
            return Err(BeliefMapError::Empty);
        }

        Ok(Self {
            beliefs,
            categories,
            index,
        })
    }

    /// The built-in colorectal-screening beliefs.
    pub fn builtin() -> Result<Self, BeliefMapError> {
        Self::from_yaml(DEFAULT_BELIEFS_YAML)
    }

    pub fn load(path: &Path) -> Result<Self, BeliefMapError> {
        let contents = std::fs::read_to_string(path).map_err(|source| BeliefMapError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&contents)
    }

    pub fn len(&self) -> usize {
        self.beliefs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beliefs.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.beliefs.iter().map(|b| b.key.as_str())
    }

    pub fn beliefs(&self) -> &[Belief] {
        &self.beliefs
    }

    pub fn statement(&self, key: &str) -> Option<&str> {
        self.index
            .get(key)
            .map(|idx| self.beliefs[*idx].statement.as_str())
    }

    pub fn categories(&self) -> &[BeliefCategory] {
        &self.categories
    }
}
