//! Workload domain model

use crate::core::config::{GeneratorConfig, OperationConfig, WorkloadConfig};
use crate::tree::TreeKind;
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// What a lookup is checked against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expectation {
    /// Not checked
    Any,
    /// Must return this value
    Value(u64),
    /// Must miss
    Missing,
}

impl Expectation {
    pub fn is_met(&self, actual: Option<u64>) -> bool {
        match self {
            Expectation::Any => true,
            Expectation::Value(expected) => actual == Some(*expected),
            Expectation::Missing => actual.is_none(),
        }
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expectation::Any => f.write_str("any"),
            Expectation::Value(v) => write!(f, "{}", v),
            Expectation::Missing => f.write_str("missing"),
        }
    }
}

/// A single operation against a key store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Insert { key: String, value: u64 },
    Find { key: String, expect: Expectation },
    Delete { key: String },
}

impl Operation {
    pub fn key(&self) -> &str {
        match self {
            Operation::Insert { key, .. } | Operation::Find { key, .. } | Operation::Delete { key } => key,
        }
    }
}

impl From<&OperationConfig> for Operation {
    fn from(config: &OperationConfig) -> Self {
        match config {
            OperationConfig::Insert { key, value } => Operation::Insert {
                key: key.clone(),
                value: *value,
            },
            OperationConfig::Find {
                key,
                expect,
                missing,
            } => {
                let expect = match (expect, missing) {
                    (Some(value), _) => Expectation::Value(*value),
                    (None, true) => Expectation::Missing,
                    (None, false) => Expectation::Any,
                };
                Operation::Find {
                    key: key.clone(),
                    expect,
                }
            }
            OperationConfig::Delete { key } => Operation::Delete { key: key.clone() },
        }
    }
}

/// A runnable workload: the operations plus the structures to replay them on
#[derive(Debug, Clone)]
pub struct Workload {
    /// Workload name
    pub name: String,

    /// Structures to run against
    pub structures: Vec<TreeKind>,

    /// Operations in execution order
    pub operations: Vec<Operation>,
}

impl Workload {
    pub fn new(name: impl Into<String>, structures: Vec<TreeKind>, operations: Vec<Operation>) -> Self {
        Self {
            name: name.into(),
            structures,
            operations,
        }
    }

    /// Build a workload from configuration, expanding the generator
    pub fn from_config(config: &WorkloadConfig) -> Self {
        let mut operations: Vec<Operation> = config.operations.iter().map(Operation::from).collect();
        if let Some(generate) = &config.generate {
            operations.extend(generate_operations(generate, config.seed()));
        }

        Self {
            name: config.name.clone(),
            structures: config.structures.clone(),
            operations,
        }
    }

    /// Replace the structures, e.g. from a command-line override.
    /// Repeated kinds are kept once, in first-seen order.
    pub fn with_structures(mut self, structures: Vec<TreeKind>) -> Self {
        if !structures.is_empty() {
            let mut unique = Vec::with_capacity(structures.len());
            for kind in structures {
                if !unique.contains(&kind) {
                    unique.push(kind);
                }
            }
            self.structures = unique;
        }
        self
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

fn random_key(rng: &mut StdRng, len: usize) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Deterministically expand a generator: inserts, then lookups of inserted
/// keys, then deletes each followed by a lookup that must miss
pub fn generate_operations(config: &GeneratorConfig, seed: u64) -> Vec<Operation> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut model: HashMap<String, u64> = HashMap::with_capacity(config.inserts);
    let mut inserted: Vec<String> = Vec::with_capacity(config.inserts);
    let mut operations = Vec::with_capacity(config.inserts + config.finds + 2 * config.deletes);

    for _ in 0..config.inserts {
        let key = random_key(&mut rng, config.key_length);
        let value: u64 = rng.gen();
        if model.insert(key.clone(), value).is_none() {
            inserted.push(key.clone());
        }
        operations.push(Operation::Insert { key, value });
    }

    for _ in 0..config.finds {
        let Some(key) = inserted.choose(&mut rng) else {
            break;
        };
        let expect = model
            .get(key)
            .map_or(Expectation::Missing, |value| Expectation::Value(*value));
        operations.push(Operation::Find {
            key: key.clone(),
            expect,
        });
    }

    let doomed: Vec<String> = inserted
        .choose_multiple(&mut rng, config.deletes)
        .cloned()
        .collect();
    for key in doomed {
        operations.push(Operation::Delete { key: key.clone() });
        operations.push(Operation::Find {
            key,
            expect: Expectation::Missing,
        });
    }

    operations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator(inserts: usize, finds: usize, deletes: usize) -> GeneratorConfig {
        GeneratorConfig {
            inserts,
            key_length: 8,
            finds,
            deletes,
        }
    }

    #[test]
    fn test_expectation_is_met() {
        assert!(Expectation::Any.is_met(None));
        assert!(Expectation::Any.is_met(Some(3)));
        assert!(Expectation::Value(3).is_met(Some(3)));
        assert!(!Expectation::Value(3).is_met(Some(4)));
        assert!(!Expectation::Value(3).is_met(None));
        assert!(Expectation::Missing.is_met(None));
        assert!(!Expectation::Missing.is_met(Some(0)));
    }

    #[test]
    fn test_operation_from_config() {
        let op = Operation::from(&OperationConfig::Find {
            key: "k".to_string(),
            expect: None,
            missing: true,
        });
        assert_eq!(
            op,
            Operation::Find {
                key: "k".to_string(),
                expect: Expectation::Missing
            }
        );
        assert_eq!(op.key(), "k");
    }

    #[test]
    fn test_generator_is_deterministic() {
        let config = generator(50, 10, 5);
        let first = generate_operations(&config, 9);
        let second = generate_operations(&config, 9);
        let other = generate_operations(&config, 10);
        assert_eq!(first, second);
        assert_ne!(first, other);
        assert_eq!(first.len(), 50 + 10 + 2 * 5);
    }

    #[test]
    fn test_generator_shapes_operations() {
        let ops = generate_operations(&generator(20, 5, 3), 1);

        assert!(ops[..20].iter().all(|op| matches!(op, Operation::Insert { key, .. } if key.len() == 8)));
        assert!(ops[20..25]
            .iter()
            .all(|op| matches!(op, Operation::Find { expect: Expectation::Value(_), .. })));

        for pair in ops[25..].chunks(2) {
            match pair {
                [Operation::Delete { key: deleted }, Operation::Find { key, expect }] => {
                    assert_eq!(deleted, key);
                    assert_eq!(*expect, Expectation::Missing);
                }
                other => panic!("unexpected operations: {:?}", other),
            }
        }
    }

    #[test]
    fn test_from_config_puts_explicit_operations_first() {
        let config = WorkloadConfig::from_yaml(
            r#"
name: "mixed"
seed: 3
operations:
  - op: insert
    key: "fixed"
    value: 7
generate:
  inserts: 4
"#,
        )
        .unwrap();

        let workload = config.to_workload();
        assert_eq!(workload.len(), 5);
        assert_eq!(
            workload.operations[0],
            Operation::Insert {
                key: "fixed".to_string(),
                value: 7
            }
        );

        let narrowed = workload.with_structures(vec![TreeKind::Art]);
        assert_eq!(narrowed.structures, vec![TreeKind::Art]);
    }

    #[test]
    fn test_with_structures_drops_repeats() {
        let workload = Workload::new("repeats", TreeKind::all(), Vec::new());

        let narrowed = workload.clone().with_structures(vec![
            TreeKind::Art,
            TreeKind::Trie,
            TreeKind::Art,
        ]);
        assert_eq!(narrowed.structures, vec![TreeKind::Art, TreeKind::Trie]);

        let unchanged = workload.with_structures(Vec::new());
        assert_eq!(unchanged.structures, TreeKind::all());
    }
}
