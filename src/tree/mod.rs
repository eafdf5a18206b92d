//! Prefix tree implementations
//!
//! Each structure can be used directly with its own key type, or through the
//! [`KeyStore`] trait which fixes keys to `&str` and values to `u64` so a
//! workload can be replayed against any of them.

pub mod arena;
pub mod art;
pub mod radix;
pub mod trie;

pub use arena::Arena;
pub use art::{Art, ArtKey, NodeStats};
pub use radix::RadixTree;
pub use trie::Trie;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The structures a workload can run against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[derive(clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TreeKind {
    /// Arena-backed radix tree
    Radix,
    /// Adaptive radix tree
    Art,
    /// Uncompressed character trie
    Trie,
    /// `std::collections::BTreeMap`, used as the reference
    #[value(name = "btree")]
    BTree,
}

impl TreeKind {
    pub fn all() -> Vec<TreeKind> {
        vec![TreeKind::Radix, TreeKind::Art, TreeKind::Trie, TreeKind::BTree]
    }

    pub fn name(&self) -> &'static str {
        match self {
            TreeKind::Radix => "radix",
            TreeKind::Art => "art",
            TreeKind::Trie => "trie",
            TreeKind::BTree => "btree",
        }
    }

    /// Create an empty store of this kind
    pub fn build(&self) -> Box<dyn KeyStore> {
        match self {
            TreeKind::Radix => Box::new(RadixTree::<u64>::new()),
            TreeKind::Art => Box::new(Art::<String, u64>::new()),
            TreeKind::Trie => Box::new(Trie::<char, u64>::new()),
            TreeKind::BTree => Box::new(BTreeMap::<String, u64>::new()),
        }
    }
}

impl fmt::Display for TreeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for TreeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TreeKind::all()
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown structure: {}", s))
    }
}

/// String-keyed map interface shared by every structure
pub trait KeyStore: Send {
    fn kind(&self) -> TreeKind;

    /// Insert, returning the replaced value
    fn insert(&mut self, key: &str, value: u64) -> Option<u64>;

    fn find(&self, key: &str) -> Option<u64>;

    fn delete(&mut self, key: &str) -> Option<u64>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All keys in ascending order
    fn keys(&self) -> Vec<String>;
}

impl KeyStore for RadixTree<u64> {
    fn kind(&self) -> TreeKind {
        TreeKind::Radix
    }

    fn insert(&mut self, key: &str, value: u64) -> Option<u64> {
        RadixTree::insert(self, key, value)
    }

    fn find(&self, key: &str) -> Option<u64> {
        RadixTree::find(self, key).copied()
    }

    fn delete(&mut self, key: &str) -> Option<u64> {
        RadixTree::delete(self, key)
    }

    fn len(&self) -> usize {
        RadixTree::len(self)
    }

    fn keys(&self) -> Vec<String> {
        RadixTree::keys(self)
    }
}

impl KeyStore for Art<String, u64> {
    fn kind(&self) -> TreeKind {
        TreeKind::Art
    }

    fn insert(&mut self, key: &str, value: u64) -> Option<u64> {
        Art::insert(self, key.to_string(), value)
    }

    fn find(&self, key: &str) -> Option<u64> {
        Art::find(self, &key.to_string()).copied()
    }

    fn delete(&mut self, key: &str) -> Option<u64> {
        Art::delete(self, &key.to_string())
    }

    fn len(&self) -> usize {
        Art::len(self)
    }

    fn keys(&self) -> Vec<String> {
        self.iter().map(|(key, _)| key).collect()
    }
}

impl KeyStore for Trie<char, u64> {
    fn kind(&self) -> TreeKind {
        TreeKind::Trie
    }

    fn insert(&mut self, key: &str, value: u64) -> Option<u64> {
        Trie::insert(self, key.chars(), value)
    }

    fn find(&self, key: &str) -> Option<u64> {
        Trie::find(self, key.chars()).copied()
    }

    fn delete(&mut self, key: &str) -> Option<u64> {
        Trie::delete(self, key.chars())
    }

    fn len(&self) -> usize {
        Trie::len(self)
    }

    fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = Trie::keys(self)
            .into_iter()
            .map(|symbols| symbols.into_iter().collect())
            .collect();
        keys.sort();
        keys
    }
}

impl KeyStore for BTreeMap<String, u64> {
    fn kind(&self) -> TreeKind {
        TreeKind::BTree
    }

    fn insert(&mut self, key: &str, value: u64) -> Option<u64> {
        BTreeMap::insert(self, key.to_string(), value)
    }

    fn find(&self, key: &str) -> Option<u64> {
        self.get(key).copied()
    }

    fn delete(&mut self, key: &str) -> Option<u64> {
        self.remove(key)
    }

    fn len(&self) -> usize {
        BTreeMap::len(self)
    }

    fn keys(&self) -> Vec<String> {
        BTreeMap::keys(self).cloned().collect()
    }
}
