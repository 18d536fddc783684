//! Implementation of the associative address trie.

use log::trace;

use crate::{
    inner::{Direction, Table, ROOT},
    node::TrieNode,
    traversal::{
        BlockSizeIter, ContainedFirstIter, ContainingElements, ContainingFirstIter, NodeIter,
    },
    AddressKey, BitCountMismatch,
};

mod iter;
mod remap;

pub use iter::*;

/// Address trie that maps added keys to values. Every added node may hold a value; nodes added
/// through [`AssociativeAddressTrie::add`] or [`AssociativeAddressTrie::remap_if_absent`] may also
/// be added without one.
#[derive(Clone)]
pub struct AssociativeAddressTrie<K, V> {
    pub(crate) table: Table<K, V>,
    count: usize,
    bit_count: Option<u8>,
}

impl<K, V> Default for AssociativeAddressTrie<K, V>
where
    K: AddressKey,
{
    fn default() -> Self {
        Self {
            table: Table::with_root(K::root(0)),
            count: 0,
            bit_count: None,
        }
    }
}

impl<K, V> AssociativeAddressTrie<K, V>
where
    K: AddressKey,
{
    /// Create an empty trie. The bit count is fixed by the first key that is added.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of added keys in the trie.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Number of added keys in the trie. Same as [`Self::len`].
    pub fn size(&self) -> usize {
        self.count
    }

    /// Number of nodes in the trie, including the root and the branching nodes.
    ///
    /// ```
    /// # use address_trie::*;
    /// # use ipnet::Ipv4Net;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut trie: AssociativeAddressTrie<Ipv4Net, u32> = AssociativeAddressTrie::new();
    /// assert_eq!(trie.node_size(), 1);
    /// trie.put("10.0.0.0/16".parse()?, 1);
    /// trie.put("10.1.0.0/16".parse()?, 2);
    /// // root, the branch 10.0.0.0/15 and both leaves
    /// assert_eq!(trie.node_size(), 4);
    /// # Ok(())
    /// # }
    /// ```
    pub fn node_size(&self) -> usize {
        self.table.live()
    }

    /// Returns `true` if no key is added.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The bit count of all keys in the trie, or `None` if it was not fixed yet.
    pub fn bit_count(&self) -> Option<u8> {
        self.bit_count
    }

    /// The root node. It represents the block of all addresses and always exists.
    pub fn root(&self) -> TrieNode<'_, K, V> {
        TrieNode::new(self, ROOT)
    }

    /// Whether `key` has the bit count of this trie.
    pub(crate) fn fits(&self, key: &K) -> bool {
        self.bit_count.map_or(true, |w| w == key.bit_count())
    }

    fn fix_bit_count(&mut self, key: &K) -> Result<(), BitCountMismatch> {
        let actual = key.bit_count();
        match self.bit_count {
            Some(expected) if expected != actual => Err(BitCountMismatch { expected, actual }),
            Some(_) => Ok(()),
            None => {
                self.bit_count = Some(actual);
                self.table[ROOT].key = K::root(actual);
                trace!("bit count fixed to {actual}");
                Ok(())
            }
        }
    }

    /// Mark the node of `key` as added. Returns its index, and whether it was newly added.
    pub(crate) fn insert_key(&mut self, key: K) -> Result<(usize, bool), BitCountMismatch> {
        self.fix_bit_count(&key)?;
        let idx = self.table.locate_or_create(key);
        let node = &mut self.table[idx];
        if node.added {
            Ok((idx, false))
        } else {
            node.added = true;
            self.count += 1;
            Ok((idx, true))
        }
    }

    fn insert_or_panic(&mut self, key: K) -> (usize, bool) {
        match self.insert_key(key) {
            Ok(x) => x,
            Err(e) => panic!("{e}"),
        }
    }

    /// Unmark an added node and restore the compressed form of the trie around it.
    pub(crate) fn remove_idx(&mut self, idx: usize) -> Option<V> {
        let node = &mut self.table[idx];
        debug_assert!(node.added);
        node.added = false;
        let value = node.value.take();
        self.count -= 1;
        self.table.compact(idx);
        value
    }

    pub(crate) fn locate(&self, key: &K) -> Option<usize> {
        if !self.fits(key) {
            return None;
        }
        self.table.locate(ROOT, key)
    }

    pub(crate) fn locate_added(&self, key: &K) -> Option<usize> {
        self.locate(key).filter(|idx| self.table[*idx].added)
    }

    /// Deepest added node below (or at) `start` whose block contains `key`.
    pub(crate) fn lpm_idx(&self, start: usize, key: &K) -> Option<usize> {
        if !self.fits(key) || !self.table[start].key.contains(key) {
            return None;
        }
        let mut idx = start;
        let mut best_match = None;
        loop {
            if self.table[idx].added {
                best_match = Some(idx);
            }
            match self.table.get_direction(idx, key) {
                Direction::Enter { next, .. } => idx = next,
                _ => return best_match,
            }
        }
    }

    /// Shallowest added node below (or at) `start` whose block contains `key`.
    pub(crate) fn spm_idx(&self, start: usize, key: &K) -> Option<usize> {
        if !self.fits(key) || !self.table[start].key.contains(key) {
            return None;
        }
        let mut idx = start;
        loop {
            if self.table[idx].added {
                return Some(idx);
            }
            match self.table.get_direction(idx, key) {
                Direction::Enter { next, .. } => idx = next,
                _ => return None,
            }
        }
    }

    /// Build a new trie from entries that all share one bit count.
    pub(crate) fn from_entries(entries: Vec<(K, Option<V>)>) -> Self {
        let mut trie = Self::new();
        for (key, value) in entries {
            let (idx, _) = trie.insert_or_panic(key);
            trie.table[idx].value = value;
        }
        trie
    }

    /// Add a key without a value. Returns `true` if the key was not added before. An existing
    /// value of that key is kept.
    ///
    /// Panics if the bit count of `key` differs from the bit count of the trie. Use
    /// [`Self::try_add`] to get an error instead.
    ///
    /// ```
    /// # use address_trie::*;
    /// # use ipnet::Ipv4Net;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut trie: AssociativeAddressTrie<Ipv4Net, u32> = AssociativeAddressTrie::new();
    /// assert!(trie.add("192.168.0.0/16".parse()?));
    /// assert!(!trie.add("192.168.0.0/16".parse()?));
    /// assert!(trie.contains(&"192.168.0.0/16".parse()?));
    /// assert_eq!(trie.get(&"192.168.0.0/16".parse()?), None);
    /// # Ok(())
    /// # }
    /// ```
    pub fn add(&mut self, key: K) -> bool {
        self.insert_or_panic(key).1
    }

    /// Add a key without a value, or return an error if its bit count does not match.
    ///
    /// ```
    /// # use address_trie::*;
    /// # use ipnet::IpNet;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut trie: AssociativeAddressTrie<IpNet, ()> = AssociativeAddressTrie::new();
    /// assert_eq!(trie.try_add("10.0.0.0/8".parse()?), Ok(true));
    /// let err = trie.try_add("2001:db8::/32".parse()?).unwrap_err();
    /// assert_eq!(err, BitCountMismatch { expected: 32, actual: 128 });
    /// # Ok(())
    /// # }
    /// ```
    pub fn try_add(&mut self, key: K) -> Result<bool, BitCountMismatch> {
        Ok(self.insert_key(key)?.1)
    }

    /// Add a key and return its node.
    pub fn add_node(&mut self, key: K) -> TrieNode<'_, K, V> {
        let (idx, _) = self.insert_or_panic(key);
        TrieNode::new(self, idx)
    }

    /// Insert a new item into the trie, and return the value that was stored before.
    ///
    /// Panics if the bit count of `key` differs from the bit count of the trie.
    ///
    /// ```
    /// # use address_trie::*;
    /// # use ipnet::Ipv4Net;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut trie: AssociativeAddressTrie<Ipv4Net, _> = AssociativeAddressTrie::new();
    /// assert_eq!(trie.put("192.168.0.0/23".parse()?, 1), None);
    /// assert_eq!(trie.put("192.168.1.0/24".parse()?, 2), None);
    /// assert_eq!(trie.put("192.168.1.0/24".parse()?, 3), Some(2));
    /// # Ok(())
    /// # }
    /// ```
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        let (idx, _) = self.insert_or_panic(key);
        self.table[idx].value.replace(value)
    }

    /// Insert a new item, or return an error if the bit count of `key` does not match.
    pub fn try_put(&mut self, key: K, value: V) -> Result<Option<V>, BitCountMismatch> {
        let (idx, _) = self.insert_key(key)?;
        Ok(self.table[idx].value.replace(value))
    }

    /// Insert the item only if `key` is not added yet. Returns `true` if the item was inserted.
    ///
    /// ```
    /// # use address_trie::*;
    /// # use ipnet::Ipv4Net;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut trie: AssociativeAddressTrie<Ipv4Net, _> = AssociativeAddressTrie::new();
    /// assert!(trie.put_new("192.168.0.0/24".parse()?, 1));
    /// assert!(!trie.put_new("192.168.0.0/24".parse()?, 2));
    /// assert_eq!(trie.get(&"192.168.0.0/24".parse()?), Some(&1));
    /// # Ok(())
    /// # }
    /// ```
    pub fn put_new(&mut self, key: K, value: V) -> bool {
        let (idx, new) = self.insert_or_panic(key);
        if new {
            self.table[idx].value = Some(value);
        }
        new
    }

    /// Insert a new item and return its node.
    pub fn put_node(&mut self, key: K, value: V) -> TrieNode<'_, K, V> {
        let (idx, _) = self.insert_or_panic(key);
        self.table[idx].value = Some(value);
        TrieNode::new(self, idx)
    }

    /// Add every added key of the sub-trie rooted at `other` (values are not copied). Returns the
    /// node of this trie that matches the key of `other`, if it exists.
    ///
    /// ```
    /// # use address_trie::*;
    /// # use ipnet::Ipv4Net;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let other: AddressTrie<Ipv4Net> = [
    ///     "10.0.0.0/8".parse()?,
    ///     "10.1.0.0/16".parse()?,
    ///     "192.168.0.0/16".parse()?,
    /// ].into_iter().collect();
    /// let mut trie: AssociativeAddressTrie<Ipv4Net, u32> = AssociativeAddressTrie::new();
    /// let node = trie.add_trie(other.get_node(&"10.0.0.0/8".parse()?).unwrap()).unwrap();
    /// assert_eq!(node.size(), 2);
    /// assert_eq!(trie.len(), 2);
    /// # Ok(())
    /// # }
    /// ```
    pub fn add_trie<V2>(&mut self, other: TrieNode<'_, K, V2>) -> Option<TrieNode<'_, K, V>> {
        for node in other.node_iter(true) {
            self.add(node.key().clone());
        }
        self.get_node(other.key())
    }

    /// Add every added key of the sub-trie rooted at `other` together with its value. Returns the
    /// node of this trie that matches the key of `other`, if it exists.
    pub fn put_trie(&mut self, other: TrieNode<'_, K, V>) -> Option<TrieNode<'_, K, V>>
    where
        V: Clone,
    {
        for node in other.node_iter(true) {
            let (idx, _) = self.insert_or_panic(node.key().clone());
            self.table[idx].value = node.value().cloned();
        }
        self.get_node(other.key())
    }

    /// Get the node that exactly matches `key`, whether it is added or not.
    pub fn get_node(&self, key: &K) -> Option<TrieNode<'_, K, V>> {
        self.locate(key).map(|idx| TrieNode::new(self, idx))
    }

    /// Get the added node that exactly matches `key`.
    pub fn get_added_node(&self, key: &K) -> Option<TrieNode<'_, K, V>> {
        self.locate_added(key).map(|idx| TrieNode::new(self, idx))
    }

    /// Check if `key` is added to the trie (exact match).
    ///
    /// ```
    /// # use address_trie::*;
    /// # use ipnet::Ipv4Net;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut trie: AssociativeAddressTrie<Ipv4Net, _> = AssociativeAddressTrie::new();
    /// trie.put("192.168.1.0/24".parse()?, 1);
    /// assert!(trie.contains(&"192.168.1.0/24".parse()?));
    /// assert!(!trie.contains(&"192.168.2.0/24".parse()?));
    /// assert!(!trie.contains(&"192.168.0.0/23".parse()?));
    /// assert!(!trie.contains(&"192.168.1.128/25".parse()?));
    /// # Ok(())
    /// # }
    /// ```
    pub fn contains(&self, key: &K) -> bool {
        self.locate_added(key).is_some()
    }

    /// Check if some added block contains `key`.
    ///
    /// ```
    /// # use address_trie::*;
    /// # use ipnet::Ipv4Net;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut trie: AssociativeAddressTrie<Ipv4Net, _> = AssociativeAddressTrie::new();
    /// trie.put("192.168.1.0/24".parse()?, 1);
    /// assert!(trie.element_contains(&"192.168.1.0/24".parse()?));
    /// assert!(trie.element_contains(&"192.168.1.128/25".parse()?));
    /// assert!(!trie.element_contains(&"192.168.0.0/23".parse()?));
    /// # Ok(())
    /// # }
    /// ```
    pub fn element_contains(&self, key: &K) -> bool {
        self.lpm_idx(ROOT, key).is_some()
    }

    /// Get the value of an element by matching exactly on the key.
    ///
    /// ```
    /// # use address_trie::*;
    /// # use ipnet::Ipv4Net;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut trie: AssociativeAddressTrie<Ipv4Net, _> = AssociativeAddressTrie::new();
    /// trie.put("192.168.1.0/24".parse()?, 1);
    /// assert_eq!(trie.get(&"192.168.1.0/24".parse()?), Some(&1));
    /// assert_eq!(trie.get(&"192.168.2.0/24".parse()?), None);
    /// assert_eq!(trie.get(&"192.168.0.0/23".parse()?), None);
    /// # Ok(())
    /// # }
    /// ```
    pub fn get(&self, key: &K) -> Option<&V> {
        self.table[self.locate_added(key)?].value.as_ref()
    }

    /// Get a mutable reference to the value of an element by matching exactly on the key.
    ///
    /// ```
    /// # use address_trie::*;
    /// # use ipnet::Ipv4Net;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut trie: AssociativeAddressTrie<Ipv4Net, _> = AssociativeAddressTrie::new();
    /// let key = "192.168.1.0/24".parse()?;
    /// trie.put(key, 1);
    /// *trie.get_mut(&key).unwrap() += 1;
    /// assert_eq!(trie.get(&key), Some(&2));
    /// # Ok(())
    /// # }
    /// ```
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let idx = self.locate_added(key)?;
        self.table[idx].value.as_mut()
    }

    /// Get the stored key and the value of an element by matching exactly on the key.
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        let node = &self.table[self.locate_added(key)?];
        Some((&node.key, node.value.as_ref()?))
    }

    /// Get the longest added key that contains `key`.
    ///
    /// ```
    /// # use address_trie::*;
    /// # use ipnet::Ipv4Net;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut trie: AssociativeAddressTrie<Ipv4Net, _> = AssociativeAddressTrie::new();
    /// trie.put("192.168.1.0/24".parse()?, 1);
    /// trie.put("192.168.0.0/23".parse()?, 2);
    /// let lpm = |k: &str| trie.longest_prefix_match(&k.parse().unwrap()).copied();
    /// assert_eq!(lpm("192.168.1.1/32"), Some("192.168.1.0/24".parse()?));
    /// assert_eq!(lpm("192.168.1.0/24"), Some("192.168.1.0/24".parse()?));
    /// assert_eq!(lpm("192.168.0.0/24"), Some("192.168.0.0/23".parse()?));
    /// assert_eq!(lpm("192.168.2.0/24"), None);
    /// # Ok(())
    /// # }
    /// ```
    pub fn longest_prefix_match(&self, key: &K) -> Option<&K> {
        self.lpm_idx(ROOT, key).map(|idx| &self.table[idx].key)
    }

    /// Get the node of the longest added key that contains `key`.
    pub fn longest_prefix_match_node(&self, key: &K) -> Option<TrieNode<'_, K, V>> {
        self.lpm_idx(ROOT, key).map(|idx| TrieNode::new(self, idx))
    }

    /// Get the longest added key that contains `key` together with its value. Returns `None` if
    /// that node carries no value.
    ///
    /// ```
    /// # use address_trie::*;
    /// # use ipnet::Ipv4Net;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut trie: AssociativeAddressTrie<Ipv4Net, _> = AssociativeAddressTrie::new();
    /// trie.put("192.168.0.0/23".parse()?, 2);
    /// assert_eq!(
    ///     trie.longest_prefix_match_value(&"192.168.1.1/32".parse()?),
    ///     Some((&"192.168.0.0/23".parse()?, &2))
    /// );
    /// # Ok(())
    /// # }
    /// ```
    pub fn longest_prefix_match_value(&self, key: &K) -> Option<(&K, &V)> {
        let node = &self.table[self.lpm_idx(ROOT, key)?];
        Some((&node.key, node.value.as_ref()?))
    }

    /// Get the shortest added key that contains `key`.
    ///
    /// ```
    /// # use address_trie::*;
    /// # use ipnet::Ipv4Net;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut trie: AssociativeAddressTrie<Ipv4Net, _> = AssociativeAddressTrie::new();
    /// trie.put("192.168.1.0/24".parse()?, 1);
    /// trie.put("192.168.0.0/23".parse()?, 2);
    /// assert_eq!(
    ///     trie.shortest_prefix_match(&"192.168.1.1/32".parse()?),
    ///     Some(&"192.168.0.0/23".parse()?)
    /// );
    /// assert_eq!(trie.shortest_prefix_match(&"192.168.2.0/24".parse()?), None);
    /// # Ok(())
    /// # }
    /// ```
    pub fn shortest_prefix_match(&self, key: &K) -> Option<&K> {
        self.spm_idx(ROOT, key).map(|idx| &self.table[idx].key)
    }

    /// Get the node of the shortest added key that contains `key`.
    pub fn shortest_prefix_match_node(&self, key: &K) -> Option<TrieNode<'_, K, V>> {
        self.spm_idx(ROOT, key).map(|idx| TrieNode::new(self, idx))
    }

    /// Iterate over all added nodes whose block contains `key`, starting with the largest block.
    ///
    /// ```
    /// # use address_trie::*;
    /// # use ipnet::Ipv4Net;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut trie: AssociativeAddressTrie<Ipv4Net, _> = AssociativeAddressTrie::new();
    /// trie.put("10.0.0.0/8".parse()?, 1);
    /// trie.put("10.1.0.0/16".parse()?, 2);
    /// trie.put("10.1.2.0/24".parse()?, 3);
    /// trie.put("10.2.0.0/16".parse()?, 4);
    /// let values: Vec<_> = trie
    ///     .elements_containing(&"10.1.2.3/32".parse()?)
    ///     .filter_map(|n| n.value().copied())
    ///     .collect();
    /// assert_eq!(values, vec![1, 2, 3]);
    /// # Ok(())
    /// # }
    /// ```
    pub fn elements_containing(&self, key: &K) -> ContainingElements<'_, K, V> {
        self.root().elements_containing(key)
    }

    /// The sub-trie of all nodes whose block is contained in `key`.
    pub fn elements_contained_by(&self, key: &K) -> Option<TrieNode<'_, K, V>> {
        self.root().elements_contained_by(key)
    }

    /// Remove a key from the trie, returning its value. The trie is compacted afterwards: branching
    /// nodes that are no longer needed are removed.
    ///
    /// ```
    /// # use address_trie::*;
    /// # use ipnet::Ipv4Net;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut trie: AssociativeAddressTrie<Ipv4Net, _> = AssociativeAddressTrie::new();
    /// let key = "192.168.1.0/24".parse()?;
    /// trie.put(key, 1);
    /// assert_eq!(trie.remove(&key), Some(1));
    /// assert_eq!(trie.get(&key), None);
    /// assert_eq!(trie.node_size(), 1);
    /// # Ok(())
    /// # }
    /// ```
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_added(key).flatten()
    }

    /// Remove a key. The outer option tells whether the key was added.
    pub(crate) fn remove_added(&mut self, key: &K) -> Option<Option<V>> {
        let idx = self.locate_added(key)?;
        Some(self.remove_idx(idx))
    }

    /// Remove all added keys that are contained in `key` (including `key` itself), and return them
    /// as a new trie. Returns `None` if nothing was removed. This operation is `O(w + n)`, as the
    /// nodes are released one by one.
    ///
    /// ```
    /// # use address_trie::*;
    /// # use ipnet::Ipv4Net;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut trie: AssociativeAddressTrie<Ipv4Net, _> = AssociativeAddressTrie::new();
    /// trie.put("192.168.0.0/22".parse()?, 1);
    /// trie.put("192.168.0.0/23".parse()?, 2);
    /// trie.put("192.168.0.0/24".parse()?, 3);
    /// trie.put("192.168.2.0/23".parse()?, 4);
    /// let removed = trie.remove_elements_contained_by(&"192.168.0.0/23".parse()?).unwrap();
    /// assert_eq!(removed.len(), 2);
    /// assert_eq!(trie.len(), 2);
    /// assert_eq!(removed.get(&"192.168.0.0/24".parse()?), Some(&3));
    /// # Ok(())
    /// # }
    /// ```
    pub fn remove_elements_contained_by(&mut self, key: &K) -> Option<Self> {
        if !self.fits(key) {
            return None;
        }
        let idx = self.table.contained_root(ROOT, key)?;
        let removed = self.table.detach(idx);
        if removed.is_empty() {
            return None;
        }
        self.count -= removed.len();
        trace!("removed {} elements contained in a block", removed.len());
        Some(Self::from_entries(removed))
    }

    /// Remove all added keys that either contain `key` or are contained in `key`, and return them
    /// as a new trie. Returns `None` if nothing was removed.
    ///
    /// ```
    /// # use address_trie::*;
    /// # use ipnet::Ipv4Net;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut trie: AssociativeAddressTrie<Ipv4Net, _> = AssociativeAddressTrie::new();
    /// trie.put("10.0.0.0/8".parse()?, 1);
    /// trie.put("10.1.0.0/16".parse()?, 2);
    /// trie.put("10.1.2.0/24".parse()?, 3);
    /// trie.put("10.2.0.0/16".parse()?, 4);
    /// let removed = trie.remove_elements_intersected_by(&"10.1.0.0/16".parse()?).unwrap();
    /// assert_eq!(removed.values().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
    /// assert_eq!(trie.values().copied().collect::<Vec<_>>(), vec![4]);
    /// # Ok(())
    /// # }
    /// ```
    pub fn remove_elements_intersected_by(&mut self, key: &K) -> Option<Self> {
        if !self.fits(key) {
            return None;
        }
        let containing: Vec<usize> = self
            .elements_containing(key)
            .filter(|n| !n.key().key_eq(key))
            .map(|n| n.index())
            .collect();
        let mut removed = match self.table.contained_root(ROOT, key) {
            Some(idx) => self.table.detach(idx),
            None => Vec::new(),
        };
        self.count -= removed.len();
        // deepest first, so that every index stays valid
        for idx in containing.into_iter().rev() {
            let key = self.table[idx].key.clone();
            let value = self.remove_idx(idx);
            removed.push((key, value));
        }
        if removed.is_empty() {
            return None;
        }
        trace!("removed {} elements intersecting a block", removed.len());
        Some(Self::from_entries(removed))
    }

    /// Only keep the added keys for which `f` returns `true`.
    ///
    /// ```
    /// # use address_trie::*;
    /// # use ipnet::Ipv4Net;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut trie: AssociativeAddressTrie<Ipv4Net, _> = AssociativeAddressTrie::new();
    /// trie.put("10.0.0.0/8".parse()?, 1);
    /// trie.put("10.1.0.0/16".parse()?, 2);
    /// trie.put("10.2.0.0/16".parse()?, 3);
    /// trie.retain(|_, v| v.map_or(false, |v| *v != 2));
    /// assert_eq!(trie.values().copied().collect::<Vec<_>>(), vec![1, 3]);
    /// # Ok(())
    /// # }
    /// ```
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, Option<&V>) -> bool,
    {
        let added: Vec<usize> = self
            .table
            .preorder(ROOT)
            .into_iter()
            .filter(|idx| self.table[*idx].added)
            .collect();
        for idx in added {
            let node = &self.table[idx];
            if !f(&node.key, node.value.as_ref()) {
                self.remove_idx(idx);
            }
        }
    }

    /// Remove all keys, and release the bit count.
    pub fn clear(&mut self) {
        self.table.reset(K::root(0));
        self.count = 0;
        self.bit_count = None;
    }

    /// The first added node in sorted order.
    pub fn first_added_node(&self) -> Option<TrieNode<'_, K, V>> {
        self.root().first_added_node()
    }

    /// The last added node in sorted order.
    pub fn last_added_node(&self) -> Option<TrieNode<'_, K, V>> {
        self.root().last_added_node()
    }

    /// The greatest added node strictly smaller than `key`.
    ///
    /// ```
    /// # use address_trie::*;
    /// # use ipnet::Ipv4Net;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let trie: AddressTrie<Ipv4Net> = [
    ///     "10.0.0.0/8".parse()?,
    ///     "10.1.0.0/16".parse()?,
    ///     "10.2.0.0/16".parse()?,
    /// ].into_iter().collect();
    /// let lower = trie.lower_added_node(&"10.2.0.0/16".parse()?).unwrap();
    /// assert_eq!(lower.key(), &"10.1.0.0/16".parse()?);
    /// let floor = trie.floor_added_node(&"10.2.0.0/16".parse()?).unwrap();
    /// assert_eq!(floor.key(), &"10.2.0.0/16".parse()?);
    /// let higher = trie.higher_added_node(&"10.0.0.0/8".parse()?).unwrap();
    /// assert_eq!(higher.key(), &"10.1.0.0/16".parse()?);
    /// assert!(trie.ceiling_added_node(&"10.2.0.1/32".parse()?).is_none());
    /// # Ok(())
    /// # }
    /// ```
    pub fn lower_added_node(&self, key: &K) -> Option<TrieNode<'_, K, V>> {
        self.root().lower_added_node(key)
    }

    /// The greatest added node smaller than or equal to `key`.
    pub fn floor_added_node(&self, key: &K) -> Option<TrieNode<'_, K, V>> {
        self.root().floor_added_node(key)
    }

    /// The smallest added node strictly greater than `key`.
    pub fn higher_added_node(&self, key: &K) -> Option<TrieNode<'_, K, V>> {
        self.root().higher_added_node(key)
    }

    /// The smallest added node greater than or equal to `key`.
    pub fn ceiling_added_node(&self, key: &K) -> Option<TrieNode<'_, K, V>> {
        self.root().ceiling_added_node(key)
    }

    /// Iterate over all added nodes in sorted order (or in reverse).
    pub fn node_iter(&self, forward: bool) -> NodeIter<'_, K, V> {
        self.root().node_iter(forward)
    }

    /// Iterate over all nodes, including the root and the branching nodes, in sorted order.
    pub fn all_node_iter(&self, forward: bool) -> NodeIter<'_, K, V> {
        self.root().all_node_iter(forward)
    }

    /// Iterate over the added nodes, largest blocks first.
    pub fn block_size_node_iter(&self, lower_sub_node_first: bool) -> BlockSizeIter<'_, K, V> {
        self.root().block_size_node_iter(lower_sub_node_first)
    }

    /// Iterate over all nodes, largest blocks first.
    pub fn block_size_all_node_iter(
        &self,
        lower_sub_node_first: bool,
    ) -> BlockSizeIter<'_, K, V> {
        self.root().block_size_all_node_iter(lower_sub_node_first)
    }

    /// Iterate over the added nodes, every node before the nodes it contains.
    pub fn containing_first_iter(&self, forward: bool) -> ContainingFirstIter<'_, K, V> {
        self.root().containing_first_iter(forward)
    }

    /// Iterate over all nodes, every node before the nodes it contains.
    pub fn containing_first_all_node_iter(&self, forward: bool) -> ContainingFirstIter<'_, K, V> {
        self.root().containing_first_all_node_iter(forward)
    }

    /// Same as [`Self::containing_first_iter`], with values of type `C` cached per branch.
    pub fn containing_first_caching_iter<C: Clone>(
        &self,
        forward: bool,
    ) -> ContainingFirstIter<'_, K, V, C> {
        self.root().containing_first_caching_iter(forward)
    }

    /// Same as [`Self::containing_first_all_node_iter`], with values of type `C` cached per branch.
    pub fn containing_first_all_node_caching_iter<C: Clone>(
        &self,
        forward: bool,
    ) -> ContainingFirstIter<'_, K, V, C> {
        self.root().containing_first_all_node_caching_iter(forward)
    }

    /// Iterate over the added nodes, every node after the nodes it contains.
    pub fn contained_first_iter(&self, forward: bool) -> ContainedFirstIter<'_, K, V> {
        self.root().contained_first_iter(forward)
    }

    /// Iterate over all nodes, every node after the nodes it contains.
    pub fn contained_first_all_node_iter(&self, forward: bool) -> ContainedFirstIter<'_, K, V> {
        self.root().contained_first_all_node_iter(forward)
    }
}

impl<K, V> PartialEq for AssociativeAddressTrie<K, V>
where
    K: AddressKey,
    V: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .node_iter(true)
                .zip(other.node_iter(true))
                .all(|(a, b)| a.key().key_eq(b.key()) && a.value() == b.value())
    }
}

impl<K, V> Eq for AssociativeAddressTrie<K, V>
where
    K: AddressKey,
    V: Eq,
{
}
