//! Fixed walkthrough of the three structures

use crate::tree::{Art, NodeStats, RadixTree, Trie};
use anyhow::{anyhow, Result};
use tracing::debug;

/// Integer keys inserted into the ART, with their values
pub const ART_SEQUENCE: [(u32, u32); 6] = [
    (10, 10),
    (20, 120),
    (30, 240),
    (40, 480),
    (50, 960),
    (300, 1920),
];

/// Deleted again right after [`ART_SEQUENCE`]
pub const ART_DELETED: u32 = 300;

/// Inserted once [`ART_DELETED`] is gone
pub const ART_REINSERTED: (u32, u32) = (301, 3840);

/// Words shared by the radix tree and trie walkthroughs
pub const WORDS: [&str; 6] = ["test", "testing", "tests", "team", "toast", "toaster"];

/// Deleted from the radix tree to show edges merging back
pub const RADIX_DELETED: &str = "team";

/// What the walkthrough observed
#[derive(Debug, Clone)]
pub struct DemoReport {
    /// (key, value) for every ART lookup, in insertion order
    pub art_found: Vec<(u32, u32)>,
    pub art_stats: NodeStats,
    /// Radix tree shape after inserting every word
    pub radix_before: Vec<Vec<String>>,
    /// Radix tree shape after deleting [`RADIX_DELETED`]
    pub radix_after: Vec<Vec<String>>,
    pub radix_keys: Vec<String>,
    /// (prefix, whether any trie word starts with it)
    pub trie_prefixes: Vec<(String, bool)>,
    pub trie_words: Vec<String>,
}

pub fn run_demo() -> Result<DemoReport> {
    let mut art = Art::<u32, u32>::new();
    for (key, value) in ART_SEQUENCE {
        debug!("art insert {} -> {}", key, value);
        art.insert(key, value);
    }
    art.delete(&ART_DELETED);
    let (key, value) = ART_REINSERTED;
    debug!("art insert {} -> {}", key, value);
    art.insert(key, value);

    let mut art_found = Vec::new();
    let live = ART_SEQUENCE
        .iter()
        .filter(|(key, _)| *key != ART_DELETED)
        .chain(std::iter::once(&ART_REINSERTED));
    for (key, _) in live {
        let value = art
            .find(key)
            .ok_or_else(|| anyhow!("ART lost key {} during the walkthrough", key))?;
        art_found.push((*key, *value));
    }
    if art.contains(&ART_DELETED) {
        return Err(anyhow!("ART still holds deleted key {}", ART_DELETED));
    }

    let mut radix = RadixTree::new();
    for (value, word) in WORDS.iter().enumerate() {
        radix.insert(word, value);
    }
    let radix_before = radix.levels();
    radix.delete(RADIX_DELETED);
    let radix_after = radix.levels();

    let mut trie: Trie<char> = Trie::new();
    for word in WORDS {
        trie.add(word.chars());
    }
    let trie_prefixes = ["te", "toa", "tea", "x"]
        .iter()
        .map(|prefix| (prefix.to_string(), trie.starts_with(prefix.chars())))
        .collect();
    let mut trie_words: Vec<String> = trie
        .keys()
        .into_iter()
        .map(|chars| chars.into_iter().collect())
        .collect();
    trie_words.sort();

    Ok(DemoReport {
        art_found,
        art_stats: art.stats(),
        radix_before,
        radix_after,
        radix_keys: radix.keys(),
        trie_prefixes,
        trie_words,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_finds_every_live_key() {
        let report = run_demo().unwrap();
        assert_eq!(
            report.art_found,
            vec![(10, 10), (20, 120), (30, 240), (40, 480), (50, 960), (301, 3840)]
        );
        assert_eq!(report.art_stats.leaves, 6);
    }

    #[test]
    fn test_demo_reinserts_after_delete() {
        assert!(ART_SEQUENCE.iter().any(|(key, _)| *key == ART_DELETED));
        assert!(ART_SEQUENCE.iter().all(|(key, _)| *key != ART_REINSERTED.0));
        let report = run_demo().unwrap();
        assert_eq!(report.art_found.last(), Some(&ART_REINSERTED));
        assert!(report.art_found.iter().all(|(key, _)| *key != ART_DELETED));
    }

    #[test]
    fn test_demo_radix_shapes() {
        let report = run_demo().unwrap();
        assert_eq!(report.radix_before[0], vec!["t"]);
        assert_eq!(report.radix_after[1], vec!["est", "oast"]);
        assert_eq!(
            report.radix_keys,
            vec!["test", "testing", "tests", "toast", "toaster"]
        );
    }

    #[test]
    fn test_demo_trie() {
        let report = run_demo().unwrap();
        assert_eq!(report.trie_words.len(), WORDS.len());
        assert_eq!(
            report.trie_prefixes,
            vec![
                ("te".to_string(), true),
                ("toa".to_string(), true),
                ("tea".to_string(), true),
                ("x".to_string(), false),
            ]
        );
    }
}
