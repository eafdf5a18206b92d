//! Uncompressed trie over arbitrary symbols

use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone)]
struct TrieNode<T, V> {
    next: HashMap<T, TrieNode<T, V>>,
    value: Option<V>,
}

impl<T, V> TrieNode<T, V> {
    fn new() -> Self {
        Self {
            next: HashMap::new(),
            value: None,
        }
    }
}

/// One node per symbol, children kept in a `HashMap`.
///
/// Keys are any sequence of `T`, e.g. `"word".chars()`. With `V = ()` the
/// trie is a plain set, see [`Trie::add`].
#[derive(Debug, Clone)]
pub struct Trie<T, V = ()> {
    root: TrieNode<T, V>,
    len: usize,
}

impl<T: Eq + Hash + Clone, V> Trie<T, V> {
    pub fn new() -> Self {
        Self {
            root: TrieNode::new(),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert a key, returning the value it replaced
    pub fn insert<I: IntoIterator<Item = T>>(&mut self, key: I, value: V) -> Option<V> {
        let mut node = &mut self.root;
        for symbol in key {
            node = node.next.entry(symbol).or_insert_with(TrieNode::new);
        }
        let old = node.value.replace(value);
        if old.is_none() {
            self.len += 1;
        }
        old
    }

    fn node<I: IntoIterator<Item = T>>(&self, key: I) -> Option<&TrieNode<T, V>> {
        let mut node = &self.root;
        for symbol in key {
            node = node.next.get(&symbol)?;
        }
        Some(node)
    }

    pub fn find<I: IntoIterator<Item = T>>(&self, key: I) -> Option<&V> {
        self.node(key)?.value.as_ref()
    }

    pub fn find_mut<I: IntoIterator<Item = T>>(&mut self, key: I) -> Option<&mut V> {
        let mut node = &mut self.root;
        for symbol in key {
            node = node.next.get_mut(&symbol)?;
        }
        node.value.as_mut()
    }

    pub fn contains<I: IntoIterator<Item = T>>(&self, key: I) -> bool {
        self.find(key).is_some()
    }

    /// Whether any stored key starts with `prefix`
    pub fn starts_with<I: IntoIterator<Item = T>>(&self, prefix: I) -> bool {
        match self.node(prefix) {
            Some(node) => node.value.is_some() || !node.next.is_empty(),
            None => false,
        }
    }

    /// Remove a key, pruning branches that no longer lead to a value
    pub fn delete<I: IntoIterator<Item = T>>(&mut self, key: I) -> Option<V> {
        let symbols: Vec<T> = key.into_iter().collect();
        let removed = Self::delete_at(&mut self.root, &symbols)?;
        self.len -= 1;
        Some(removed)
    }

    fn delete_at(node: &mut TrieNode<T, V>, symbols: &[T]) -> Option<V> {
        let Some((first, rest)) = symbols.split_first() else {
            return node.value.take();
        };
        let child = node.next.get_mut(first)?;
        let removed = Self::delete_at(child, rest)?;
        if child.value.is_none() && child.next.is_empty() {
            node.next.remove(first);
        }
        Some(removed)
    }

    /// All keys as symbol vectors, in no particular order
    pub fn keys(&self) -> Vec<Vec<T>> {
        let mut out = Vec::with_capacity(self.len);
        let mut stack: Vec<(&TrieNode<T, V>, Vec<T>)> = vec![(&self.root, Vec::new())];
        while let Some((node, path)) = stack.pop() {
            if node.value.is_some() {
                out.push(path.clone());
            }
            for (symbol, child) in &node.next {
                let mut next = path.clone();
                next.push(symbol.clone());
                stack.push((child, next));
            }
        }
        out
    }
}

impl<T: Eq + Hash + Clone> Trie<T, ()> {
    /// Add a key to a set trie, returning whether it was new
    pub fn add<I: IntoIterator<Item = T>>(&mut self, key: I) -> bool {
        self.insert(key, ()).is_none()
    }
}

impl<T: Eq + Hash + Clone, V> Default for Trie<T, V> {
    fn default() -> Self {
        Self::new()
    }
}
