//! Views on the part of a trie that lies within a range of keys. A view does not copy anything;
//! changes made through a [`BoundedTrieMut`] are changes of the underlying trie.

use std::cmp::Ordering;
use std::ops::{Bound, RangeBounds};

use log::debug;

use crate::{map::AssociativeAddressTrie, node::TrieNode, set::AddressTrie, AddressKey};

/// A range of keys, using the ordering of [`AddressKey::key_cmp`]. Each end may be inclusive,
/// exclusive or unbounded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bounds<K> {
    lower: Bound<K>,
    upper: Bound<K>,
}

impl<K> Bounds<K> {
    /// Create bounds from both ends.
    pub fn new(lower: Bound<K>, upper: Bound<K>) -> Self {
        Self { lower, upper }
    }

    /// Bounds that contain every key.
    pub fn unbounded() -> Self {
        Self::new(Bound::Unbounded, Bound::Unbounded)
    }
}

impl<K: AddressKey> Bounds<K> {
    /// Create bounds from any range expression, like `a..b` or `a..=b`.
    pub fn from_range<B: RangeBounds<K>>(range: B) -> Self {
        Self::new(range.start_bound().cloned(), range.end_bound().cloned())
    }

    /// `key` lies before the lower end.
    pub fn is_below(&self, key: &K) -> bool {
        match &self.lower {
            Bound::Included(l) => l.key_cmp(key) == Ordering::Greater,
            Bound::Excluded(l) => l.key_cmp(key) != Ordering::Less,
            Bound::Unbounded => false,
        }
    }

    /// `key` lies after the upper end.
    pub fn is_above(&self, key: &K) -> bool {
        match &self.upper {
            Bound::Included(u) => u.key_cmp(key) == Ordering::Less,
            Bound::Excluded(u) => u.key_cmp(key) != Ordering::Greater,
            Bound::Unbounded => false,
        }
    }

    /// `key` lies within both ends.
    pub fn contains(&self, key: &K) -> bool {
        !self.is_below(key) && !self.is_above(key)
    }
}

impl<K> RangeBounds<K> for Bounds<K> {
    fn start_bound(&self) -> Bound<&K> {
        self.lower.as_ref()
    }

    fn end_bound(&self) -> Bound<&K> {
        self.upper.as_ref()
    }
}

/// A shared view on the keys of a trie that lie within some [`Bounds`].
///
/// ```
/// # use address_trie::*;
/// # use ipnet::Ipv4Net;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let trie: AddressTrie<Ipv4Net> = [
///     "10.0.0.0/8".parse()?,
///     "10.1.0.0/16".parse()?,
///     "10.2.0.0/16".parse()?,
///     "10.3.0.0/16".parse()?,
/// ].into_iter().collect();
/// let lower: Ipv4Net = "10.1.0.0/16".parse()?;
/// let upper: Ipv4Net = "10.3.0.0/16".parse()?;
/// let view = trie.create_sub_trie(lower..upper);
/// let keys: Vec<_> = view.node_iter(true).map(|n| n.key().to_string()).collect();
/// assert_eq!(keys, vec!["10.1.0.0/16", "10.2.0.0/16"]);
/// assert!(!view.contains(&"10.0.0.0/8".parse()?));
/// assert_eq!(view.size(), 2);
/// # Ok(())
/// # }
/// ```
pub struct BoundedTrie<'a, K, V> {
    trie: &'a AssociativeAddressTrie<K, V>,
    bounds: Bounds<K>,
}

impl<'a, K, V> BoundedTrie<'a, K, V>
where
    K: AddressKey,
{
    pub(crate) fn new(trie: &'a AssociativeAddressTrie<K, V>, bounds: Bounds<K>) -> Self {
        Self { trie, bounds }
    }

    /// The bounds of this view.
    pub fn bounds(&self) -> &Bounds<K> {
        &self.bounds
    }

    fn within(&self, node: &TrieNode<'_, K, V>) -> bool {
        self.bounds.contains(node.key())
    }

    /// Number of added keys in range. This operation is `O(n)`.
    pub fn size(&self) -> usize {
        self.node_iter(true).count()
    }

    /// Whether no added key lies in range.
    pub fn is_empty(&self) -> bool {
        self.node_iter(true).next().is_none()
    }

    /// Check if `key` is in range and added (exact match).
    pub fn contains(&self, key: &K) -> bool {
        self.bounds.contains(key) && self.trie.contains(key)
    }

    /// Check if some added block in range contains `key`.
    pub fn element_contains(&self, key: &K) -> bool {
        self.elements_containing(key).next().is_some()
    }

    /// Get the node that exactly matches `key`, if `key` is in range.
    pub fn get_node(&self, key: &K) -> Option<TrieNode<'a, K, V>> {
        if !self.bounds.contains(key) {
            return None;
        }
        self.trie.get_node(key)
    }

    /// Get the added node that exactly matches `key`, if `key` is in range.
    pub fn get_added_node(&self, key: &K) -> Option<TrieNode<'a, K, V>> {
        self.get_node(key).filter(|n| n.is_added())
    }

    /// Get the value of `key`, if `key` is in range.
    pub fn get(&self, key: &K) -> Option<&'a V> {
        self.get_added_node(key)?.value()
    }

    /// The added nodes in range whose block contains `key`, root-most first.
    pub fn elements_containing(&self, key: &K) -> impl Iterator<Item = TrieNode<'a, K, V>> + '_ {
        self.trie
            .root()
            .elements_containing(key)
            .filter(move |n| self.within(n))
    }

    /// The deepest added node in range whose block contains `key`.
    pub fn longest_prefix_match(&self, key: &K) -> Option<TrieNode<'a, K, V>> {
        self.elements_containing(key).last()
    }

    /// The shallowest added node in range whose block contains `key`.
    pub fn shortest_prefix_match(&self, key: &K) -> Option<TrieNode<'a, K, V>> {
        self.elements_containing(key).next()
    }

    /// The first added node in range.
    pub fn first_added_node(&self) -> Option<TrieNode<'a, K, V>> {
        self.node_iter(true).next()
    }

    /// The last added node in range.
    pub fn last_added_node(&self) -> Option<TrieNode<'a, K, V>> {
        self.node_iter(false).next()
    }

    fn clamp_down(&self, found: Option<TrieNode<'a, K, V>>) -> Option<TrieNode<'a, K, V>> {
        let node = found?;
        if self.bounds.is_below(node.key()) {
            None
        } else if self.bounds.is_above(node.key()) {
            self.last_added_node()
        } else {
            Some(node)
        }
    }

    fn clamp_up(&self, found: Option<TrieNode<'a, K, V>>) -> Option<TrieNode<'a, K, V>> {
        let node = found?;
        if self.bounds.is_above(node.key()) {
            None
        } else if self.bounds.is_below(node.key()) {
            self.first_added_node()
        } else {
            Some(node)
        }
    }

    /// The greatest added node in range that is strictly smaller than `key`.
    pub fn lower_added_node(&self, key: &K) -> Option<TrieNode<'a, K, V>> {
        self.clamp_down(self.trie.root().lower_added_node(key))
    }

    /// The greatest added node in range that is smaller than or equal to `key`.
    pub fn floor_added_node(&self, key: &K) -> Option<TrieNode<'a, K, V>> {
        self.clamp_down(self.trie.root().floor_added_node(key))
    }

    /// The smallest added node in range that is strictly greater than `key`.
    pub fn higher_added_node(&self, key: &K) -> Option<TrieNode<'a, K, V>> {
        self.clamp_up(self.trie.root().higher_added_node(key))
    }

    /// The smallest added node in range that is greater than or equal to `key`.
    pub fn ceiling_added_node(&self, key: &K) -> Option<TrieNode<'a, K, V>> {
        self.clamp_up(self.trie.root().ceiling_added_node(key))
    }

    /// Iterate over the added nodes in range, in sorted order (or in reverse).
    pub fn node_iter(&self, forward: bool) -> impl Iterator<Item = TrieNode<'a, K, V>> + '_ {
        let root = self.trie.root();
        let start = if forward {
            match &self.bounds.lower {
                Bound::Included(l) => root.ceiling_added_node(l),
                Bound::Excluded(l) => root.higher_added_node(l),
                Bound::Unbounded => root.first_added_node(),
            }
        } else {
            match &self.bounds.upper {
                Bound::Included(u) => root.floor_added_node(u),
                Bound::Excluded(u) => root.lower_added_node(u),
                Bound::Unbounded => root.last_added_node(),
            }
        };
        root.node_iter(forward)
            .starting_at(start.map(|n| n.index()))
            .take_while(move |n| self.within(n))
    }

    /// Iterate over all nodes in range, including branching nodes, in sorted order.
    pub fn all_node_iter(&self, forward: bool) -> impl Iterator<Item = TrieNode<'a, K, V>> + '_ {
        self.trie
            .all_node_iter(forward)
            .filter(move |n| self.within(n))
    }

    /// Iterate over the added nodes in range, every node before the nodes it contains.
    pub fn containing_first_iter(
        &self,
        forward: bool,
    ) -> impl Iterator<Item = TrieNode<'a, K, V>> + '_ {
        self.trie
            .containing_first_iter(forward)
            .filter(move |n| self.within(n))
    }

    /// Iterate over the added nodes in range, every node after the nodes it contains.
    pub fn contained_first_iter(
        &self,
        forward: bool,
    ) -> impl Iterator<Item = TrieNode<'a, K, V>> + '_ {
        self.trie
            .contained_first_iter(forward)
            .filter(move |n| self.within(n))
    }

    /// Iterate over the added nodes in range, largest blocks first.
    pub fn block_size_node_iter(
        &self,
        lower_sub_node_first: bool,
    ) -> impl Iterator<Item = TrieNode<'a, K, V>> + '_ {
        self.trie
            .block_size_node_iter(lower_sub_node_first)
            .filter(move |n| self.within(n))
    }

    /// Copy the added keys in range (and their values) into a new trie.
    pub fn clone_tree(&self) -> AssociativeAddressTrie<K, V>
    where
        V: Clone,
    {
        let entries = self
            .node_iter(true)
            .map(|n| (n.key().clone(), n.value().cloned()))
            .collect();
        AssociativeAddressTrie::from_entries(entries)
    }
}

/// An exclusive view on the keys of a trie that lie within some [`Bounds`]. Keys outside the
/// range are neither visible nor changed. Adding a key outside the range is rejected.
///
/// ```
/// # use address_trie::*;
/// # use ipnet::Ipv4Net;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut trie: AssociativeAddressTrie<Ipv4Net, u32> = AssociativeAddressTrie::new();
/// trie.put("10.0.0.0/8".parse()?, 1);
/// trie.put("10.1.0.0/16".parse()?, 2);
/// let lower: Ipv4Net = "10.1.0.0/16".parse()?;
/// let mut view = trie.create_sub_trie_mut(lower..);
/// assert!(view.put_node("10.2.0.0/16".parse()?, 3).is_some());
/// assert!(view.put_node("9.0.0.0/8".parse()?, 4).is_none());
/// view.clear();
/// assert_eq!(trie.values().copied().collect::<Vec<_>>(), vec![1]);
/// # Ok(())
/// # }
/// ```
pub struct BoundedTrieMut<'a, K, V> {
    trie: &'a mut AssociativeAddressTrie<K, V>,
    bounds: Bounds<K>,
}

impl<'a, K, V> BoundedTrieMut<'a, K, V>
where
    K: AddressKey,
{
    pub(crate) fn new(trie: &'a mut AssociativeAddressTrie<K, V>, bounds: Bounds<K>) -> Self {
        Self { trie, bounds }
    }

    /// A shared view with the same bounds.
    pub fn view(&self) -> BoundedTrie<'_, K, V> {
        BoundedTrie::new(&*self.trie, self.bounds.clone())
    }

    fn accepts(&self, key: &K) -> bool {
        let ok = self.bounds.contains(key);
        if !ok {
            debug!("rejected a key outside the bounds of the sub-trie");
        }
        ok
    }

    /// Add a key without a value. Returns `false` if the key was already added, or if it lies
    /// outside the range.
    pub fn add(&mut self, key: K) -> bool {
        self.accepts(&key) && self.trie.add(key)
    }

    /// Add a key and return its node, or `None` if the key lies outside the range.
    pub fn add_node(&mut self, key: K) -> Option<TrieNode<'_, K, V>> {
        if !self.accepts(&key) {
            return None;
        }
        Some(self.trie.add_node(key))
    }

    /// Insert an item and return its node, or `None` (dropping the value) if the key lies
    /// outside the range.
    pub fn put_node(&mut self, key: K, value: V) -> Option<TrieNode<'_, K, V>> {
        if !self.accepts(&key) {
            return None;
        }
        Some(self.trie.put_node(key, value))
    }

    /// Same as [`AssociativeAddressTrie::remap`], for a key in range.
    pub fn remap<F>(&mut self, key: K, f: F) -> Option<TrieNode<'_, K, V>>
    where
        F: FnOnce(Option<&V>) -> Option<V>,
    {
        if !self.accepts(&key) {
            return None;
        }
        self.trie.remap(key, f)
    }

    /// Get a mutable reference to the value of `key`, if `key` is in range.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        if !self.bounds.contains(key) {
            return None;
        }
        self.trie.get_mut(key)
    }

    /// Remove `key` if it is in range, and return its value.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        if !self.bounds.contains(key) {
            return None;
        }
        self.trie.remove(key)
    }

    /// Remove all added keys in range that are contained in `key`, and return them as a new trie.
    pub fn remove_elements_contained_by(
        &mut self,
        key: &K,
    ) -> Option<AssociativeAddressTrie<K, V>> {
        let keys: Vec<K> = match self.trie.elements_contained_by(key) {
            Some(sub) => sub
                .node_iter(true)
                .filter(|n| self.bounds.contains(n.key()))
                .map(|n| n.key().clone())
                .collect(),
            None => return None,
        };
        self.take_all(keys)
    }

    /// Remove all added keys in range.
    pub fn clear(&mut self) {
        let keys: Vec<K> = self.view().node_iter(true).map(|n| n.key().clone()).collect();
        self.take_all(keys);
    }

    fn take_all(&mut self, keys: Vec<K>) -> Option<AssociativeAddressTrie<K, V>> {
        let entries: Vec<(K, Option<V>)> = keys
            .into_iter()
            .filter_map(|k| {
                let value = self.trie.remove_added(&k)?;
                Some((k, value))
            })
            .collect();
        if entries.is_empty() {
            return None;
        }
        Some(AssociativeAddressTrie::from_entries(entries))
    }
}

impl<K, V> AssociativeAddressTrie<K, V>
where
    K: AddressKey,
{
    /// A view on all keys within `range`.
    pub fn create_sub_trie<B: RangeBounds<K>>(&self, range: B) -> BoundedTrie<'_, K, V> {
        BoundedTrie::new(self, Bounds::from_range(range))
    }

    /// An exclusive view on all keys within `range`.
    pub fn create_sub_trie_mut<B: RangeBounds<K>>(&mut self, range: B) -> BoundedTrieMut<'_, K, V> {
        BoundedTrieMut::new(self, Bounds::from_range(range))
    }
}

impl<K> AddressTrie<K>
where
    K: AddressKey,
{
    /// A view on all keys within `range`.
    pub fn create_sub_trie<B: RangeBounds<K>>(&self, range: B) -> BoundedTrie<'_, K, ()> {
        self.0.create_sub_trie(range)
    }

    /// An exclusive view on all keys within `range`.
    pub fn create_sub_trie_mut<B: RangeBounds<K>>(
        &mut self,
        range: B,
    ) -> BoundedTrieMut<'_, K, ()> {
        self.0.create_sub_trie_mut(range)
    }
}
