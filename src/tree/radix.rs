//! Arena-backed radix tree over string keys

use crate::tree::arena::Arena;
use std::collections::VecDeque;

const ROOT: usize = 0;

#[derive(Debug, Clone)]
struct Edge {
    target: usize,
    label: String,
}

impl Edge {
    fn new(target: usize, label: String) -> Self {
        Self { target, label }
    }
}

#[derive(Debug, Clone)]
struct Node<V> {
    /// Outgoing edges, sorted by label
    edges: Vec<usize>,
    value: Option<V>,
}

impl<V> Node<V> {
    fn empty() -> Self {
        Self {
            edges: Vec::new(),
            value: None,
        }
    }

    fn with_value(value: V) -> Self {
        Self {
            edges: Vec::new(),
            value: Some(value),
        }
    }
}

/// Compressed trie keyed by `String`.
///
/// Nodes and edges are stored in two arenas and refer to each other by
/// handle. Edge labels are never empty and sibling labels never share a
/// first character, so at most one edge can match while descending.
#[derive(Debug, Clone)]
pub struct RadixTree<V> {
    nodes: Arena<Node<V>>,
    edges: Arena<Edge>,
    len: usize,
}

/// Byte length of the longest common prefix, always on a char boundary
fn common_prefix_len(a: &str, b: &str) -> usize {
    a.char_indices()
        .zip(b.chars())
        .take_while(|((_, x), y)| x == y)
        .last()
        .map(|((i, c), _)| i + c.len_utf8())
        .unwrap_or(0)
}

impl<V> RadixTree<V> {
    pub fn new() -> Self {
        let mut nodes = Arena::new();
        let root = nodes.insert(Node::empty());
        debug_assert_eq!(root, ROOT);
        Self {
            nodes,
            edges: Arena::new(),
            len: 0,
        }
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of live nodes, including the root
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The outgoing edge of `node` whose label starts like `rest`
    fn edge_towards(&self, node: usize, rest: &str) -> Option<usize> {
        let first = rest.chars().next()?;
        self.nodes[node]
            .edges
            .iter()
            .copied()
            .find(|&e| self.edges[e].label.starts_with(first))
    }

    fn attach(&mut self, node: usize, edge: usize) {
        let label = self.edges[edge].label.as_str();
        let edges = &self.edges;
        let pos = self.nodes[node]
            .edges
            .partition_point(|&e| edges[e].label.as_str() < label);
        self.nodes[node].edges.insert(pos, edge);
    }

    /// Split `edge` after `at` bytes, inserting a valueless node in between
    fn split_edge(&mut self, edge: usize, at: usize) {
        let tail = self.edges[edge].label.split_off(at);
        let old_target = self.edges[edge].target;
        let tail_edge = self.edges.insert(Edge::new(old_target, tail));
        let mid = self.nodes.insert(Node {
            edges: vec![tail_edge],
            value: None,
        });
        self.edges[edge].target = mid;
    }

    /// Insert a key, returning the value it replaced
    pub fn insert(&mut self, key: &str, value: V) -> Option<V> {
        let mut node = ROOT;
        let mut rest = key;

        loop {
            if rest.is_empty() {
                let old = self.nodes[node].value.replace(value);
                if old.is_none() {
                    self.len += 1;
                }
                return old;
            }

            let Some(edge) = self.edge_towards(node, rest) else {
                let leaf = self.nodes.insert(Node::with_value(value));
                let edge = self.edges.insert(Edge::new(leaf, rest.to_string()));
                self.attach(node, edge);
                self.len += 1;
                return None;
            };

            let shared = common_prefix_len(rest, &self.edges[edge].label);
            if shared < self.edges[edge].label.len() {
                self.split_edge(edge, shared);
            }
            node = self.edges[edge].target;
            rest = &rest[shared..];
        }
    }

    fn locate(&self, key: &str) -> Option<usize> {
        let mut node = ROOT;
        let mut rest = key;
        while !rest.is_empty() {
            let edge = &self.edges[self.edge_towards(node, rest)?];
            rest = rest.strip_prefix(edge.label.as_str())?;
            node = edge.target;
        }
        Some(node)
    }

    pub fn find(&self, key: &str) -> Option<&V> {
        let node = self.locate(key)?;
        self.nodes[node].value.as_ref()
    }

    pub fn find_mut(&mut self, key: &str) -> Option<&mut V> {
        let node = self.locate(key)?;
        self.nodes[node].value.as_mut()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.find(key).is_some()
    }

    /// Remove a key and compress the path it leaves behind
    pub fn delete(&mut self, key: &str) -> Option<V> {
        // (parent node, edge taken) for every hop from the root
        let mut path: Vec<(usize, usize)> = Vec::new();
        let mut node = ROOT;
        let mut rest = key;
        while !rest.is_empty() {
            let edge_idx = self.edge_towards(node, rest)?;
            let edge = &self.edges[edge_idx];
            rest = rest.strip_prefix(edge.label.as_str())?;
            path.push((node, edge_idx));
            node = edge.target;
        }

        let value = self.nodes[node].value.take()?;
        self.len -= 1;
        self.compress(node, &path);
        Some(value)
    }

    fn compress(&mut self, node: usize, path: &[(usize, usize)]) {
        let Some(&(parent, edge)) = path.last() else {
            return;
        };

        match self.nodes[node].edges.len() {
            0 => {
                self.nodes[parent].edges.retain(|&e| e != edge);
                self.edges.remove(edge);
                self.nodes.remove(node);

                let parent_is_passthrough = self.nodes[parent].value.is_none()
                    && self.nodes[parent].edges.len() == 1;
                if parent_is_passthrough && path.len() >= 2 {
                    let (_, parent_edge) = path[path.len() - 2];
                    self.merge(parent_edge);
                }
            }
            1 => self.merge(edge),
            _ => {}
        }
    }

    /// Fold the only child edge of `edge`'s target into `edge`
    fn merge(&mut self, edge: usize) {
        let mid = self.edges[edge].target;
        let child_edge = self.nodes[mid].edges[0];
        if let Some(child) = self.edges.remove(child_edge) {
            self.edges[edge].label.push_str(&child.label);
            self.edges[edge].target = child.target;
        }
        self.nodes.remove(mid);
    }

    fn collect<'a>(&'a self, node: usize, prefix: &mut String, out: &mut Vec<(String, &'a V)>) {
        if let Some(value) = &self.nodes[node].value {
            out.push((prefix.clone(), value));
        }
        for &e in &self.nodes[node].edges {
            let edge = &self.edges[e];
            let mark = prefix.len();
            prefix.push_str(&edge.label);
            self.collect(edge.target, prefix, out);
            prefix.truncate(mark);
        }
    }

    /// All entries in lexicographic key order
    pub fn entries(&self) -> Vec<(String, &V)> {
        let mut out = Vec::with_capacity(self.len);
        self.collect(ROOT, &mut String::new(), &mut out);
        out
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries().into_iter().map(|(k, _)| k).collect()
    }

    /// All keys starting with `prefix`, in lexicographic order
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut node = ROOT;
        let mut rest = prefix;
        let mut acc = String::new();

        while !rest.is_empty() {
            let Some(e) = self.edge_towards(node, rest) else {
                return Vec::new();
            };
            let edge = &self.edges[e];
            if let Some(remaining) = rest.strip_prefix(edge.label.as_str()) {
                rest = remaining;
            } else if edge.label.starts_with(rest) {
                rest = "";
            } else {
                return Vec::new();
            }
            acc.push_str(&edge.label);
            node = edge.target;
        }

        let mut out = Vec::new();
        self.collect(node, &mut acc, &mut out);
        out.into_iter().map(|(k, _)| k).collect()
    }

    /// Edge labels grouped by depth, breadth first
    pub fn levels(&self) -> Vec<Vec<String>> {
        let mut levels = Vec::new();
        let mut queue: VecDeque<usize> = self.nodes[ROOT].edges.iter().copied().collect();

        while !queue.is_empty() {
            let mut level = Vec::with_capacity(queue.len());
            for _ in 0..queue.len() {
                let Some(e) = queue.pop_front() else { break };
                let edge = &self.edges[e];
                level.push(edge.label.clone());
                queue.extend(self.nodes[edge.target].edges.iter().copied());
            }
            levels.push(level);
        }

        levels
    }

    #[cfg(test)]
    fn assert_invariants(&self) {
        let mut stack = vec![ROOT];
        while let Some(node) = stack.pop() {
            let edges = &self.nodes[node].edges;
            let mut firsts = std::collections::HashSet::new();
            for &e in edges {
                let label = &self.edges[e].label;
                assert!(!label.is_empty(), "empty edge label");
                assert!(firsts.insert(label.chars().next()), "siblings share a first char");
                stack.push(self.edges[e].target);
            }
            if node != ROOT {
                let n = &self.nodes[node];
                assert!(
                    n.value.is_some() || n.edges.len() >= 2,
                    "uncompressed node {}",
                    node
                );
            }
        }
    }
}

impl<V> Default for RadixTree<V> {
    fn default() -> Self {
        Self::new()
    }
}
