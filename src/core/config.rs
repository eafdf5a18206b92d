//! Workload configuration from YAML

use crate::core::workload::Workload;
use crate::tree::TreeKind;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Seed used when a workload with a generator does not set one
pub const DEFAULT_SEED: u64 = 0;

/// Errors raised while loading a workload
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read workload file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid workload YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid workload: {0}")]
    Invalid(String),
}

/// Top-level workload configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadConfig {
    /// Workload name, used to group runs in history
    pub name: String,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,

    /// Structures to run against (all of them when omitted)
    #[serde(default = "TreeKind::all")]
    pub structures: Vec<TreeKind>,

    /// Seed for the random generator
    #[serde(default)]
    pub seed: Option<u64>,

    /// Explicit operations, executed before generated ones
    #[serde(default)]
    pub operations: Vec<OperationConfig>,

    /// Random operation generator
    #[serde(default)]
    pub generate: Option<GeneratorConfig>,
}

/// A single operation as written in YAML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum OperationConfig {
    Insert {
        key: String,
        value: u64,
    },
    Find {
        key: String,
        /// Value the lookup must return
        #[serde(default)]
        expect: Option<u64>,
        /// The lookup must miss
        #[serde(default)]
        missing: bool,
    },
    Delete {
        key: String,
    },
}

/// Random workload generator settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Number of random keys to insert
    pub inserts: usize,

    /// Length of each alphanumeric key
    #[serde(default = "default_key_length")]
    pub key_length: usize,

    /// Lookups of inserted keys, checked against the inserted value
    #[serde(default)]
    pub finds: usize,

    /// Deletions of inserted keys, each followed by a lookup that must miss
    #[serde(default)]
    pub deletes: usize,
}

fn default_key_length() -> usize {
    16
}

impl WorkloadConfig {
    /// Load a workload from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Parse a workload from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: WorkloadConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the workload configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("Workload name is empty".to_string()));
        }

        if self.structures.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "Workload '{}' lists no structures",
                self.name
            )));
        }
        let mut seen = HashSet::new();
        for kind in &self.structures {
            if !seen.insert(kind) {
                return Err(ConfigError::Invalid(format!("Duplicate structure: {}", kind)));
            }
        }

        for (index, op) in self.operations.iter().enumerate() {
            if let OperationConfig::Find {
                key,
                expect: Some(_),
                missing: true,
            } = op
            {
                return Err(ConfigError::Invalid(format!(
                    "Operation {} (find '{}') cannot both expect a value and be missing",
                    index, key
                )));
            }
        }

        if let Some(generate) = &self.generate {
            if generate.inserts == 0 {
                return Err(ConfigError::Invalid("Generator must insert at least one key".to_string()));
            }
            if generate.key_length == 0 {
                return Err(ConfigError::Invalid("Generator key_length must be positive".to_string()));
            }
            if generate.finds > generate.inserts || generate.deletes > generate.inserts {
                return Err(ConfigError::Invalid(format!(
                    "Generator finds ({}) and deletes ({}) cannot exceed inserts ({})",
                    generate.finds, generate.deletes, generate.inserts
                )));
            }
        } else if self.operations.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "Workload '{}' has no operations",
                self.name
            )));
        }

        Ok(())
    }

    pub fn seed(&self) -> u64 {
        self.seed.unwrap_or(DEFAULT_SEED)
    }

    /// Expand into a runnable workload
    pub fn to_workload(&self) -> Workload {
        Workload::from_config(self)
    }
}
