//! Lazy traversals over the nodes of a trie. Every iterator borrows the trie and yields
//! [`TrieNode`]s; it can be dropped at any point.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::{
    inner::{Direction, Table},
    map::AssociativeAddressTrie,
    node::TrieNode,
    AddressKey,
};

/// Iterator over the nodes of a (sub-)trie in sorted key order: a node, then its lower sub-trie,
/// then its upper sub-trie. In reverse, the order is exactly inverted.
pub struct NodeIter<'a, K, V> {
    trie: &'a AssociativeAddressTrie<K, V>,
    root: usize,
    next: Option<usize>,
    forward: bool,
    added_only: bool,
}

impl<'a, K, V> NodeIter<'a, K, V> {
    pub(crate) fn new(
        trie: &'a AssociativeAddressTrie<K, V>,
        root: usize,
        forward: bool,
        added_only: bool,
    ) -> Self {
        let table = &trie.table;
        let next = match (forward, added_only) {
            (true, true) => table.first_added_in(root),
            (true, false) => Some(root),
            (false, true) => table.last_added_in(root),
            (false, false) => Some(table.last_in(root)),
        };
        Self {
            trie,
            root,
            next,
            forward,
            added_only,
        }
    }

    /// Start the iteration at `start` instead of the first node.
    pub(crate) fn starting_at(mut self, start: Option<usize>) -> Self {
        self.next = start;
        self
    }
}

impl<'a, K, V> Iterator for NodeIter<'a, K, V> {
    type Item = TrieNode<'a, K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let cur = self.next?;
        let table = &self.trie.table;
        self.next = match (self.forward, self.added_only) {
            (true, true) => table.next_added_in(cur, self.root),
            (true, false) => table.next_in(cur, self.root),
            (false, true) => table.prev_added_in(cur, self.root),
            (false, false) => table.prev_in(cur, self.root),
        };
        Some(TrieNode::new(self.trie, cur))
    }
}

struct Pending<C> {
    idx: usize,
    lower: Option<C>,
    upper: Option<C>,
}

/// Pre-order iterator: every node is visited before the nodes it contains. In the forward
/// direction the lower sub-trie is visited before the upper one.
///
/// While iterating, a value of type `C` can be attached to the lower or upper branch of the node
/// that was returned last (see [`ContainingFirstIter::cache_with_lower_sub_node`]). The value is
/// returned by [`ContainingFirstIter::cached`] when the next node of that branch is visited. If
/// only added nodes are yielded, the skipped nodes hand their value to both of their branches.
///
/// ```
/// # use address_trie::*;
/// # #[cfg(feature = "ipnet")]
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let trie: AddressTrie<ipnet::Ipv4Net> = [
///     "10.0.0.0/8".parse()?,
///     "10.0.0.0/16".parse()?,
///     "10.1.0.0/16".parse()?,
///     "10.1.1.0/24".parse()?,
/// ].into_iter().collect();
///
/// // compute the depth of every added node
/// let mut iter = trie.containing_first_caching_iter::<usize>(true);
/// let mut depths = Vec::new();
/// while let Some(node) = iter.next() {
///     let depth = iter.cached().copied().unwrap_or(0);
///     depths.push((*node.key(), depth));
///     iter.cache_with_lower_sub_node(depth + 1);
///     iter.cache_with_upper_sub_node(depth + 1);
/// }
/// assert_eq!(depths, vec![
///     ("10.0.0.0/8".parse()?, 0),
///     ("10.0.0.0/16".parse()?, 1),
///     ("10.1.0.0/16".parse()?, 1),
///     ("10.1.1.0/24".parse()?, 2),
/// ]);
/// # Ok(())
/// # }
/// # #[cfg(not(feature = "ipnet"))]
/// # fn main() {}
/// ```
pub struct ContainingFirstIter<'a, K, V, C = ()> {
    trie: &'a AssociativeAddressTrie<K, V>,
    stack: Vec<(usize, Option<C>)>,
    forward: bool,
    added_only: bool,
    pending: Option<Pending<C>>,
    cached: Option<C>,
}

impl<'a, K, V, C> ContainingFirstIter<'a, K, V, C> {
    pub(crate) fn new(
        trie: &'a AssociativeAddressTrie<K, V>,
        root: usize,
        forward: bool,
        added_only: bool,
    ) -> Self {
        Self {
            trie,
            stack: vec![(root, None)],
            forward,
            added_only,
            pending: None,
            cached: None,
        }
    }

    /// The value attached to the branch of the node that was returned last, if any.
    pub fn cached(&self) -> Option<&C> {
        self.cached.as_ref()
    }

    /// Attach `value` to the lower branch of the node that was returned last. Returns `false` (and
    /// drops the value) if that node has no lower sub-node.
    pub fn cache_with_lower_sub_node(&mut self, value: C) -> bool {
        match self.pending.as_mut() {
            Some(p) if self.trie.table[p.idx].lower.is_some() => {
                p.lower = Some(value);
                true
            }
            _ => false,
        }
    }

    /// Attach `value` to the upper branch of the node that was returned last. Returns `false` (and
    /// drops the value) if that node has no upper sub-node.
    pub fn cache_with_upper_sub_node(&mut self, value: C) -> bool {
        match self.pending.as_mut() {
            Some(p) if self.trie.table[p.idx].upper.is_some() => {
                p.upper = Some(value);
                true
            }
            _ => false,
        }
    }

    fn push_children(&mut self, idx: usize, lower_cache: Option<C>, upper_cache: Option<C>) {
        let node = &self.trie.table[idx];
        let lower = node.lower.map(|c| (c, lower_cache));
        let upper = node.upper.map(|c| (c, upper_cache));
        // the branch that is visited first goes on top
        let (first, second) = if self.forward {
            (lower, upper)
        } else {
            (upper, lower)
        };
        self.stack.extend(second);
        self.stack.extend(first);
    }
}

impl<'a, K, V, C: Clone> Iterator for ContainingFirstIter<'a, K, V, C> {
    type Item = TrieNode<'a, K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(p) = self.pending.take() {
            self.push_children(p.idx, p.lower, p.upper);
        }
        while let Some((idx, cache)) = self.stack.pop() {
            if self.added_only && !self.trie.table[idx].added {
                self.push_children(idx, cache.clone(), cache);
                continue;
            }
            self.cached = cache;
            self.pending = Some(Pending {
                idx,
                lower: None,
                upper: None,
            });
            return Some(TrieNode::new(self.trie, idx));
        }
        self.cached = None;
        None
    }
}

/// Post-order iterator: every node is visited after the nodes it contains. In the forward
/// direction the lower sub-trie is visited before the upper one.
pub struct ContainedFirstIter<'a, K, V> {
    trie: &'a AssociativeAddressTrie<K, V>,
    stack: Vec<(usize, bool)>,
    forward: bool,
    added_only: bool,
}

impl<'a, K, V> ContainedFirstIter<'a, K, V> {
    pub(crate) fn new(
        trie: &'a AssociativeAddressTrie<K, V>,
        root: usize,
        forward: bool,
        added_only: bool,
    ) -> Self {
        Self {
            trie,
            stack: vec![(root, false)],
            forward,
            added_only,
        }
    }
}

impl<'a, K, V> Iterator for ContainedFirstIter<'a, K, V> {
    type Item = TrieNode<'a, K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let table = &self.trie.table;
        while let Some((idx, expanded)) = self.stack.pop() {
            if expanded {
                if !self.added_only || table[idx].added {
                    return Some(TrieNode::new(self.trie, idx));
                }
                continue;
            }
            self.stack.push((idx, true));
            let node = &table[idx];
            let (first, second) = if self.forward {
                (node.lower, node.upper)
            } else {
                (node.upper, node.lower)
            };
            self.stack.extend(second.map(|c| (c, false)));
            self.stack.extend(first.map(|c| (c, false)));
        }
        None
    }
}

struct BlockEntry<R> {
    len: u8,
    bits: R,
    idx: usize,
    lower_first: bool,
}

impl<R: Ord> Ord for BlockEntry<R> {
    fn cmp(&self, other: &Self) -> Ordering {
        // the heap pops the greatest entry, which must be the shortest prefix
        other.len.cmp(&self.len).then_with(|| {
            if self.lower_first {
                other.bits.cmp(&self.bits)
            } else {
                self.bits.cmp(&other.bits)
            }
        })
    }
}

impl<R: Ord> PartialOrd for BlockEntry<R> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<R: Ord> PartialEq for BlockEntry<R> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<R: Ord> Eq for BlockEntry<R> {}

/// Iterator that visits the largest blocks first: nodes are ordered by their prefix length, and
/// nodes of equal prefix length by their address (ascending if `lower_sub_node_first`).
pub struct BlockSizeIter<'a, K: AddressKey, V> {
    trie: &'a AssociativeAddressTrie<K, V>,
    heap: BinaryHeap<BlockEntry<K::R>>,
    lower_first: bool,
    added_only: bool,
}

impl<'a, K: AddressKey, V> BlockSizeIter<'a, K, V> {
    pub(crate) fn new(
        trie: &'a AssociativeAddressTrie<K, V>,
        root: usize,
        lower_first: bool,
        added_only: bool,
    ) -> Self {
        let mut iter = Self {
            trie,
            heap: BinaryHeap::new(),
            lower_first,
            added_only,
        };
        iter.push(root);
        iter
    }

    fn push(&mut self, idx: usize) {
        let key = &self.trie.table[idx].key;
        self.heap.push(BlockEntry {
            len: key.block_len(),
            bits: key.mask(),
            idx,
            lower_first: self.lower_first,
        });
    }
}

impl<'a, K: AddressKey, V> Iterator for BlockSizeIter<'a, K, V> {
    type Item = TrieNode<'a, K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(entry) = self.heap.pop() {
            let node = &self.trie.table[entry.idx];
            let (lower, upper, added) = (node.lower, node.upper, node.added);
            if let Some(lower) = lower {
                self.push(lower);
            }
            if let Some(upper) = upper {
                self.push(upper);
            }
            if !self.added_only || added {
                return Some(TrieNode::new(self.trie, entry.idx));
            }
        }
        None
    }
}

/// Iterator over the added nodes whose block contains a given key, starting with the largest
/// block. See [`AssociativeAddressTrie::elements_containing`].
pub struct ContainingElements<'a, K, V> {
    trie: &'a AssociativeAddressTrie<K, V>,
    next: Option<usize>,
    key: K,
}

impl<'a, K: AddressKey, V> ContainingElements<'a, K, V> {
    pub(crate) fn new(
        trie: &'a AssociativeAddressTrie<K, V>,
        start: Option<usize>,
        key: K,
    ) -> Self {
        let next = start.filter(|s| trie.table[*s].key.contains(&key));
        Self { trie, next, key }
    }
}

impl<'a, K: AddressKey, V> Iterator for ContainingElements<'a, K, V> {
    type Item = TrieNode<'a, K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let table: &Table<K, V> = &self.trie.table;
        while let Some(idx) = self.next {
            self.next = match table.get_direction(idx, &self.key) {
                Direction::Enter { next, .. } => Some(next),
                _ => None,
            };
            if table[idx].added {
                return Some(TrieNode::new(self.trie, idx));
            }
        }
        None
    }
}
