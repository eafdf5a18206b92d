//! Adaptive radix tree
//!
//! Inner nodes come in four classes sized for 4, 16, 48 and 256 children and
//! are swapped for the next class up or down as their fan-out changes.
//! Prefixes are stored in full on inner nodes (pessimistic path
//! compression) and leaves carry the complete key so a single-key subtree is
//! just a leaf (lazy expansion).

use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::mem;

/// A key that can be turned into bytes whose lexicographic order matches
/// the key's own order.
pub trait ArtKey: Sized {
    fn encode(&self) -> Vec<u8>;
    fn decode(bytes: &[u8]) -> Option<Self>;
}

macro_rules! impl_art_key_uint {
    ($($t:ty),*) => {
        $(
            impl ArtKey for $t {
                fn encode(&self) -> Vec<u8> {
                    self.to_be_bytes().to_vec()
                }

                fn decode(bytes: &[u8]) -> Option<Self> {
                    Some(<$t>::from_be_bytes(bytes.try_into().ok()?))
                }
            }
        )*
    };
}

impl_art_key_uint!(u8, u16, u32, u64, u128);

impl ArtKey for String {
    fn encode(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    fn decode(bytes: &[u8]) -> Option<Self> {
        String::from_utf8(bytes.to_vec()).ok()
    }
}

impl ArtKey for Vec<u8> {
    fn encode(&self) -> Vec<u8> {
        self.clone()
    }

    fn decode(bytes: &[u8]) -> Option<Self> {
        Some(bytes.to_vec())
    }
}

/// Inner node fan-out thresholds: shrink once children drop to these counts
const SHRINK_16_TO_4: usize = 3;
const SHRINK_48_TO_16: usize = 12;
const SHRINK_256_TO_48: usize = 40;

/// Marks an unused byte in a Node48 index
const EMPTY: u8 = u8::MAX;

#[derive(Debug)]
struct Leaf<V> {
    key: Box<[u8]>,
    value: V,
}

impl<V> Leaf<V> {
    fn boxed(key: &[u8], value: V) -> Box<Self> {
        Box::new(Self {
            key: key.into(),
            value,
        })
    }
}

#[derive(Debug)]
enum Node<V> {
    Leaf(Box<Leaf<V>>),
    Inner(Box<Inner<V>>),
}

impl<V> Node<V> {
    fn leaf(key: &[u8], value: V) -> Self {
        Node::Leaf(Leaf::boxed(key, value))
    }

    fn into_value(self) -> Option<V> {
        match self {
            Node::Leaf(leaf) => Some(leaf.value),
            Node::Inner(_) => None,
        }
    }
}

#[derive(Debug)]
struct Inner<V> {
    prefix: Vec<u8>,
    /// Key that ends exactly after `prefix`
    terminal: Option<Box<Leaf<V>>>,
    children: Children<V>,
}

impl<V> Inner<V> {
    fn new(prefix: Vec<u8>) -> Self {
        Self {
            prefix,
            terminal: None,
            children: Children::new(),
        }
    }

    /// Hang a leaf off this node, `depth` being the key offset just past the prefix
    fn place_leaf(&mut self, leaf: Box<Leaf<V>>, depth: usize) {
        match leaf.key.get(depth).copied() {
            None => self.terminal = Some(leaf),
            Some(byte) => self.children.add(byte, Node::Leaf(leaf)),
        }
    }

    fn insert_below(&mut self, key: &[u8], depth: usize, value: V) -> Option<V> {
        let Some(&byte) = key.get(depth) else {
            return match &mut self.terminal {
                Some(leaf) => Some(mem::replace(&mut leaf.value, value)),
                None => {
                    self.terminal = Some(Leaf::boxed(key, value));
                    None
                }
            };
        };

        match self.children.slot_mut(byte) {
            Some(slot) => insert_into(slot, key, depth + 1, value),
            None => {
                self.children.add(byte, Node::leaf(key, value));
                None
            }
        }
    }
}

/// Sorted keys with parallel child slots; Node4 and Node16
#[derive(Debug)]
struct Sorted<V, const N: usize> {
    len: usize,
    keys: [u8; N],
    slots: [Option<Node<V>>; N],
}

impl<V, const N: usize> Sorted<V, N> {
    fn new() -> Self {
        Self {
            len: 0,
            keys: [0; N],
            slots: std::array::from_fn(|_| None),
        }
    }

    fn is_full(&self) -> bool {
        self.len == N
    }

    fn position(&self, byte: u8) -> Option<usize> {
        self.keys[..self.len].binary_search(&byte).ok()
    }

    fn find(&self, byte: u8) -> Option<&Node<V>> {
        self.slots[self.position(byte)?].as_ref()
    }

    fn slot_mut(&mut self, byte: u8) -> Option<&mut Option<Node<V>>> {
        let pos = self.position(byte)?;
        Some(&mut self.slots[pos])
    }

    fn insert(&mut self, byte: u8, node: Node<V>) {
        debug_assert!(self.len < N);
        let pos = self.keys[..self.len].partition_point(|&k| k < byte);
        self.keys[pos..=self.len].rotate_right(1);
        self.slots[pos..=self.len].rotate_right(1);
        self.keys[pos] = byte;
        self.slots[pos] = Some(node);
        self.len += 1;
    }

    fn remove(&mut self, byte: u8) -> Option<Node<V>> {
        let pos = self.position(byte)?;
        let node = self.slots[pos].take();
        self.keys[pos..self.len].rotate_left(1);
        self.slots[pos..self.len].rotate_left(1);
        self.len -= 1;
        node
    }

    fn entries(&self) -> Vec<(u8, &Node<V>)> {
        self.keys[..self.len]
            .iter()
            .zip(&self.slots)
            .filter_map(|(&k, slot)| slot.as_ref().map(|n| (k, n)))
            .collect()
    }

    fn into_entries(self) -> Vec<(u8, Node<V>)> {
        let len = self.len;
        self.keys
            .into_iter()
            .zip(self.slots)
            .take(len)
            .filter_map(|(k, slot)| slot.map(|n| (k, n)))
            .collect()
    }
}

/// 256-entry byte index into 48 child slots; Node48
#[derive(Debug)]
struct Indexed<V> {
    count: usize,
    index: [u8; 256],
    slots: [Option<Node<V>>; 48],
}

impl<V> Indexed<V> {
    fn new() -> Self {
        Self {
            count: 0,
            index: [EMPTY; 256],
            slots: std::array::from_fn(|_| None),
        }
    }

    fn find(&self, byte: u8) -> Option<&Node<V>> {
        match self.index[byte as usize] {
            EMPTY => None,
            i => self.slots[i as usize].as_ref(),
        }
    }

    fn slot_mut(&mut self, byte: u8) -> Option<&mut Option<Node<V>>> {
        match self.index[byte as usize] {
            EMPTY => None,
            i => Some(&mut self.slots[i as usize]),
        }
    }

    fn insert(&mut self, byte: u8, node: Node<V>) {
        let free = self.slots.iter().position(Option::is_none);
        debug_assert!(free.is_some(), "Node48 has no free slot");
        if let Some(i) = free {
            self.index[byte as usize] = i as u8;
            self.slots[i] = Some(node);
            self.count += 1;
        }
    }

    fn remove(&mut self, byte: u8) -> Option<Node<V>> {
        let i = mem::replace(&mut self.index[byte as usize], EMPTY);
        if i == EMPTY {
            return None;
        }
        self.count -= 1;
        self.slots[i as usize].take()
    }

    fn entries(&self) -> Vec<(u8, &Node<V>)> {
        (0..=u8::MAX).filter_map(|b| self.find(b).map(|n| (b, n))).collect()
    }

    fn into_entries(self) -> Vec<(u8, Node<V>)> {
        let Indexed {
            index, mut slots, ..
        } = self;
        (0..=u8::MAX)
            .filter_map(|b| match index[b as usize] {
                EMPTY => None,
                i => slots[i as usize].take().map(|n| (b, n)),
            })
            .collect()
    }
}

/// One slot per byte; Node256
#[derive(Debug)]
struct Direct<V> {
    count: usize,
    slots: [Option<Node<V>>; 256],
}

impl<V> Direct<V> {
    fn new() -> Self {
        Self {
            count: 0,
            slots: std::array::from_fn(|_| None),
        }
    }

    fn insert(&mut self, byte: u8, node: Node<V>) {
        if self.slots[byte as usize].replace(node).is_none() {
            self.count += 1;
        }
    }

    fn remove(&mut self, byte: u8) -> Option<Node<V>> {
        let node = self.slots[byte as usize].take();
        if node.is_some() {
            self.count -= 1;
        }
        node
    }

    fn entries(&self) -> Vec<(u8, &Node<V>)> {
        (0..=u8::MAX)
            .filter_map(|b| self.slots[b as usize].as_ref().map(|n| (b, n)))
            .collect()
    }

    fn into_entries(self) -> Vec<(u8, Node<V>)> {
        (0..=u8::MAX).zip(self.slots).filter_map(|(b, slot)| slot.map(|n| (b, n))).collect()
    }
}

#[derive(Debug)]
enum Children<V> {
    N4(Sorted<V, 4>),
    N16(Box<Sorted<V, 16>>),
    N48(Box<Indexed<V>>),
    N256(Box<Direct<V>>),
}

impl<V> Children<V> {
    fn new() -> Self {
        Children::N4(Sorted::new())
    }

    fn len(&self) -> usize {
        match self {
            Children::N4(s) => s.len,
            Children::N16(s) => s.len,
            Children::N48(s) => s.count,
            Children::N256(s) => s.count,
        }
    }

    fn find(&self, byte: u8) -> Option<&Node<V>> {
        match self {
            Children::N4(s) => s.find(byte),
            Children::N16(s) => s.find(byte),
            Children::N48(s) => s.find(byte),
            Children::N256(s) => s.slots[byte as usize].as_ref(),
        }
    }

    fn find_mut(&mut self, byte: u8) -> Option<&mut Node<V>> {
        self.slot_mut(byte)?.as_mut()
    }

    /// The occupied slot for `byte`, if any
    fn slot_mut(&mut self, byte: u8) -> Option<&mut Option<Node<V>>> {
        let slot = match self {
            Children::N4(s) => s.slot_mut(byte)?,
            Children::N16(s) => s.slot_mut(byte)?,
            Children::N48(s) => s.slot_mut(byte)?,
            Children::N256(s) => &mut s.slots[byte as usize],
        };
        if slot.is_some() {
            Some(slot)
        } else {
            None
        }
    }

    /// Add a child under a byte that is not present yet
    fn add(&mut self, byte: u8, node: Node<V>) {
        let full = match self {
            Children::N4(s) => s.is_full(),
            Children::N16(s) => s.is_full(),
            Children::N48(s) => s.count == 48,
            Children::N256(_) => false,
        };
        if full {
            self.grow();
        }
        match self {
            Children::N4(s) => s.insert(byte, node),
            Children::N16(s) => s.insert(byte, node),
            Children::N48(s) => s.insert(byte, node),
            Children::N256(s) => s.insert(byte, node),
        }
    }

    fn remove(&mut self, byte: u8) -> Option<Node<V>> {
        let node = match self {
            Children::N4(s) => s.remove(byte),
            Children::N16(s) => s.remove(byte),
            Children::N48(s) => s.remove(byte),
            Children::N256(s) => s.remove(byte),
        };
        if node.is_some() {
            self.shrink();
        }
        node
    }

    /// Remove and return the only child
    fn take_only(&mut self) -> Option<(u8, Node<V>)> {
        if self.len() != 1 {
            return None;
        }
        let byte = self.entries().first().map(|(b, _)| *b)?;
        self.remove(byte).map(|node| (byte, node))
    }

    /// Children in ascending byte order
    fn entries(&self) -> Vec<(u8, &Node<V>)> {
        match self {
            Children::N4(s) => s.entries(),
            Children::N16(s) => s.entries(),
            Children::N48(s) => s.entries(),
            Children::N256(s) => s.entries(),
        }
    }

    fn grow(&mut self) {
        *self = match mem::replace(self, Children::new()) {
            Children::N4(s) => {
                let mut next = Box::new(Sorted::<V, 16>::new());
                for (byte, node) in s.into_entries() {
                    next.insert(byte, node);
                }
                Children::N16(next)
            }
            Children::N16(s) => {
                let mut next = Box::new(Indexed::new());
                for (byte, node) in (*s).into_entries() {
                    next.insert(byte, node);
                }
                Children::N48(next)
            }
            Children::N48(s) => {
                let mut next = Box::new(Direct::new());
                for (byte, node) in (*s).into_entries() {
                    next.insert(byte, node);
                }
                Children::N256(next)
            }
            full => full,
        };
    }

    fn shrink(&mut self) {
        let sparse = match self {
            Children::N4(_) => false,
            Children::N16(s) => s.len <= SHRINK_16_TO_4,
            Children::N48(s) => s.count <= SHRINK_48_TO_16,
            Children::N256(s) => s.count <= SHRINK_256_TO_48,
        };
        if !sparse {
            return;
        }

        *self = match mem::replace(self, Children::new()) {
            Children::N16(s) => {
                let mut next = Sorted::<V, 4>::new();
                for (byte, node) in (*s).into_entries() {
                    next.insert(byte, node);
                }
                Children::N4(next)
            }
            Children::N48(s) => {
                let mut next = Box::new(Sorted::<V, 16>::new());
                for (byte, node) in (*s).into_entries() {
                    next.insert(byte, node);
                }
                Children::N16(next)
            }
            Children::N256(s) => {
                let mut next = Box::new(Indexed::new());
                for (byte, node) in (*s).into_entries() {
                    next.insert(byte, node);
                }
                Children::N48(next)
            }
            small => small,
        };
    }
}

fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Insert into an occupied or empty slot, `depth` bytes of `key` already consumed
fn insert_into<V>(slot: &mut Option<Node<V>>, key: &[u8], depth: usize, value: V) -> Option<V> {
    let (node, replaced) = match slot.take() {
        None => (Node::leaf(key, value), None),
        Some(Node::Leaf(mut leaf)) => {
            if *leaf.key == *key {
                let old = mem::replace(&mut leaf.value, value);
                (Node::Leaf(leaf), Some(old))
            } else {
                // Leaves on this path share key[..depth] with us
                let split = depth + common_prefix_len(&leaf.key[depth..], &key[depth..]);
                let mut inner = Inner::new(key[depth..split].to_vec());
                inner.place_leaf(leaf, split);
                inner.place_leaf(Leaf::boxed(key, value), split);
                (Node::Inner(Box::new(inner)), None)
            }
        }
        Some(Node::Inner(mut inner)) => {
            let shared = common_prefix_len(&inner.prefix, &key[depth..]);
            if shared < inner.prefix.len() {
                let branch = inner.prefix[shared];
                let mut parent = Inner::new(inner.prefix[..shared].to_vec());
                inner.prefix = inner.prefix.split_off(shared + 1);
                parent.children.add(branch, Node::Inner(inner));
                parent.place_leaf(Leaf::boxed(key, value), depth + shared);
                (Node::Inner(Box::new(parent)), None)
            } else {
                let replaced = inner.insert_below(key, depth + shared, value);
                (Node::Inner(inner), replaced)
            }
        }
    };
    *slot = Some(node);
    replaced
}

fn find_in_mut<'a, V>(node: &'a mut Node<V>, key: &[u8], depth: usize) -> Option<&'a mut V> {
    match node {
        Node::Leaf(leaf) => (*leaf.key == *key).then_some(&mut leaf.value),
        Node::Inner(inner) => {
            if !key.get(depth..)?.starts_with(&inner.prefix) {
                return None;
            }
            let depth = depth + inner.prefix.len();
            match key.get(depth) {
                None => inner.terminal.as_mut().map(|leaf| &mut leaf.value),
                Some(&byte) => find_in_mut(inner.children.find_mut(byte)?, key, depth + 1),
            }
        }
    }
}

/// Remove `key` from below the inner node `node`, then collapse `node` if it
/// is left with a single entry
fn remove_below<V>(node: &mut Node<V>, key: &[u8], depth: usize) -> Option<V> {
    let Node::Inner(inner) = node else {
        return None;
    };
    if !key.get(depth..)?.starts_with(&inner.prefix) {
        return None;
    }
    let depth = depth + inner.prefix.len();

    let removed = match key.get(depth) {
        None => inner.terminal.take().map(|leaf| leaf.value),
        Some(&byte) => {
            let child = inner.children.find_mut(byte)?;
            match child {
                Node::Leaf(leaf) if *leaf.key == *key => {
                    inner.children.remove(byte).and_then(Node::into_value)
                }
                Node::Leaf(_) => None,
                Node::Inner(_) => remove_below(child, key, depth + 1),
            }
        }
    }?;

    collapse(node);
    Some(removed)
}

fn collapse<V>(node: &mut Node<V>) {
    let Node::Inner(inner) = node else {
        return;
    };
    let replacement = match (inner.children.len(), inner.terminal.is_some()) {
        (0, true) => inner.terminal.take().map(Node::Leaf),
        (1, false) => inner.children.take_only().map(|(byte, child)| match child {
            Node::Inner(mut below) => {
                let mut prefix = mem::take(&mut inner.prefix);
                prefix.push(byte);
                prefix.extend_from_slice(&below.prefix);
                below.prefix = prefix;
                Node::Inner(below)
            }
            leaf => leaf,
        }),
        _ => None,
    };
    if let Some(replacement) = replacement {
        *node = replacement;
    }
}

/// Node counts per class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStats {
    pub leaves: usize,
    pub node4: usize,
    pub node16: usize,
    pub node48: usize,
    pub node256: usize,
}

/// Adaptive radix tree keyed by any [`ArtKey`]
#[derive(Debug)]
pub struct Art<K, V> {
    root: Option<Node<V>>,
    len: usize,
    _key: PhantomData<fn() -> K>,
}

impl<K: ArtKey, V> Art<K, V> {
    pub fn new() -> Self {
        Self {
            root: None,
            len: 0,
            _key: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert a key, returning the value it replaced
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let key = key.encode();
        let replaced = insert_into(&mut self.root, &key, 0, value);
        if replaced.is_none() {
            self.len += 1;
        }
        replaced
    }

    pub fn find(&self, key: &K) -> Option<&V> {
        let key = key.encode();
        let mut node = self.root.as_ref()?;
        let mut depth = 0;
        loop {
            match node {
                Node::Leaf(leaf) => return (*leaf.key == *key).then_some(&leaf.value),
                Node::Inner(inner) => {
                    if !key[depth..].starts_with(&inner.prefix) {
                        return None;
                    }
                    depth += inner.prefix.len();
                    let Some(&byte) = key.get(depth) else {
                        return inner.terminal.as_ref().map(|leaf| &leaf.value);
                    };
                    node = inner.children.find(byte)?;
                    depth += 1;
                }
            }
        }
    }

    pub fn find_mut(&mut self, key: &K) -> Option<&mut V> {
        let key = key.encode();
        find_in_mut(self.root.as_mut()?, &key, 0)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    pub fn delete(&mut self, key: &K) -> Option<V> {
        let key = key.encode();
        let removed = match self.root.as_mut() {
            None => None,
            Some(Node::Leaf(leaf)) => {
                if *leaf.key == *key {
                    self.root.take().and_then(Node::into_value)
                } else {
                    None
                }
            }
            Some(node) => remove_below(node, &key, 0),
        }?;
        self.len -= 1;
        Some(removed)
    }

    /// Entries in ascending key order
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            stack: self.root.iter().map(Frame::Node).collect(),
            _key: PhantomData,
        }
    }

    pub fn stats(&self) -> NodeStats {
        let mut stats = NodeStats::default();
        let mut stack: Vec<&Node<V>> = self.root.iter().collect();
        while let Some(node) = stack.pop() {
            match node {
                Node::Leaf(_) => stats.leaves += 1,
                Node::Inner(inner) => {
                    match &inner.children {
                        Children::N4(_) => stats.node4 += 1,
                        Children::N16(_) => stats.node16 += 1,
                        Children::N48(_) => stats.node48 += 1,
                        Children::N256(_) => stats.node256 += 1,
                    }
                    if inner.terminal.is_some() {
                        stats.leaves += 1;
                    }
                    stack.extend(inner.children.entries().into_iter().map(|(_, n)| n));
                }
            }
        }
        stats
    }
}

impl<K: ArtKey, V> Default for Art<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

enum Frame<'a, V> {
    Node(&'a Node<V>),
    Leaf(&'a Leaf<V>),
}

/// Ordered iterator over an [`Art`]
pub struct Iter<'a, K, V> {
    stack: Vec<Frame<'a, V>>,
    _key: PhantomData<fn() -> K>,
}

impl<'a, K: ArtKey, V> Iterator for Iter<'a, K, V> {
    type Item = (K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(frame) = self.stack.pop() {
            let leaf = match frame {
                Frame::Leaf(leaf) => leaf,
                Frame::Node(Node::Leaf(leaf)) => &**leaf,
                Frame::Node(Node::Inner(inner)) => {
                    for (_, child) in inner.children.entries().into_iter().rev() {
                        self.stack.push(Frame::Node(child));
                    }
                    // A key ending here sorts before every key below it
                    if let Some(terminal) = &inner.terminal {
                        self.stack.push(Frame::Leaf(terminal));
                    }
                    continue;
                }
            };
            if let Some(key) = K::decode(&leaf.key) {
                return Some((key, &leaf.value));
            }
        }
        None
    }
}
