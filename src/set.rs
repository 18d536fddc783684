//! AddressTrie, the set variant of the trie, based on the [`AssociativeAddressTrie`].

use crate::{
    map::AssociativeAddressTrie,
    node::TrieNode,
    traversal::{
        BlockSizeIter, ContainedFirstIter, ContainingElements, ContainingFirstIter, NodeIter,
    },
    AddressKey, BitCountMismatch,
};

/// Set of addresses and address blocks, organized in a compressed binary trie. This structure
/// gives efficient access to the longest block in the set that contains some address, and to the
/// neighbors of a key in sorted order.
#[derive(Clone)]
pub struct AddressTrie<K>(pub(crate) AssociativeAddressTrie<K, ()>);

impl<K: AddressKey> AddressTrie<K> {
    /// Create a new, empty trie.
    pub fn new() -> Self {
        Self(Default::default())
    }

    /// Returns the number of elements stored in `self`.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the number of elements stored in `self`. Same as [`Self::len`].
    #[inline(always)]
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// Number of nodes, including the root and the branching nodes.
    #[inline(always)]
    pub fn node_size(&self) -> usize {
        self.0.node_size()
    }

    /// Returns `true` if the set contains no elements.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The bit count of the keys, or `None` if no key was added yet.
    pub fn bit_count(&self) -> Option<u8> {
        self.0.bit_count()
    }

    /// The root node, representing the block of all addresses.
    pub fn root(&self) -> TrieNode<'_, K, ()> {
        self.0.root()
    }

    /// Adds a key to the set.
    ///
    /// Returns whether the key was newly inserted. Panics if the bit count of `key` differs from
    /// the bit count of the keys in the set.
    ///
    /// ```
    /// # use address_trie::*;
    /// # #[cfg(feature = "ipnet")]
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut set: AddressTrie<ipnet::Ipv4Net> = AddressTrie::new();
    /// assert!(set.add("192.168.0.0/23".parse()?));
    /// assert!(set.add("192.168.1.0/24".parse()?));
    /// assert!(!set.add("192.168.1.0/24".parse()?));
    /// # Ok(())
    /// # }
    /// # #[cfg(not(feature = "ipnet"))]
    /// # fn main() {}
    /// ```
    pub fn add(&mut self, key: K) -> bool {
        self.0.add(key)
    }

    /// Adds a key to the set, or returns an error if its bit count does not match.
    pub fn try_add(&mut self, key: K) -> Result<bool, BitCountMismatch> {
        self.0.try_add(key)
    }

    /// Adds a key to the set and returns its node.
    pub fn add_node(&mut self, key: K) -> TrieNode<'_, K, ()> {
        self.0.add_node(key)
    }

    /// Adds every added key of the sub-trie rooted at `other`.
    pub fn add_trie<V>(&mut self, other: TrieNode<'_, K, V>) -> Option<TrieNode<'_, K, ()>> {
        self.0.add_trie(other)
    }

    /// Check wether some key is present in the set, without using longest prefix match.
    ///
    /// ```
    /// # use address_trie::*;
    /// # #[cfg(feature = "ipnet")]
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut set: AddressTrie<ipnet::Ipv4Net> = AddressTrie::new();
    /// set.add("192.168.1.0/24".parse()?);
    /// assert!(set.contains(&"192.168.1.0/24".parse()?));
    /// assert!(!set.contains(&"192.168.2.0/24".parse()?));
    /// assert!(!set.contains(&"192.168.0.0/23".parse()?));
    /// assert!(!set.contains(&"192.168.1.128/25".parse()?));
    /// # Ok(())
    /// # }
    /// # #[cfg(not(feature = "ipnet"))]
    /// # fn main() {}
    /// ```
    pub fn contains(&self, key: &K) -> bool {
        self.0.contains(key)
    }

    /// Check whether some block in the set contains `key`.
    pub fn element_contains(&self, key: &K) -> bool {
        self.0.element_contains(key)
    }

    /// Get the node that exactly matches `key`, added or not.
    pub fn get_node(&self, key: &K) -> Option<TrieNode<'_, K, ()>> {
        self.0.get_node(key)
    }

    /// Get the added node that exactly matches `key`.
    pub fn get_added_node(&self, key: &K) -> Option<TrieNode<'_, K, ()>> {
        self.0.get_added_node(key)
    }

    /// Get the longest key in the set that contains the given key.
    ///
    /// ```
    /// # use address_trie::*;
    /// # #[cfg(feature = "ipnet")]
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut set: AddressTrie<ipnet::Ipv4Net> = AddressTrie::new();
    /// set.add("192.168.1.0/24".parse()?);
    /// set.add("192.168.0.0/23".parse()?);
    /// assert_eq!(set.longest_prefix_match(&"192.168.1.1/32".parse()?), Some(&"192.168.1.0/24".parse()?));
    /// assert_eq!(set.longest_prefix_match(&"192.168.1.0/24".parse()?), Some(&"192.168.1.0/24".parse()?));
    /// assert_eq!(set.longest_prefix_match(&"192.168.0.0/24".parse()?), Some(&"192.168.0.0/23".parse()?));
    /// assert_eq!(set.longest_prefix_match(&"192.168.2.0/24".parse()?), None);
    /// # Ok(())
    /// # }
    /// # #[cfg(not(feature = "ipnet"))]
    /// # fn main() {}
    /// ```
    pub fn longest_prefix_match(&self, key: &K) -> Option<&K> {
        self.0.longest_prefix_match(key)
    }

    /// Get the node of the longest key in the set that contains the given key.
    pub fn longest_prefix_match_node(&self, key: &K) -> Option<TrieNode<'_, K, ()>> {
        self.0.longest_prefix_match_node(key)
    }

    /// Get the shortest key in the set that contains the given key.
    pub fn shortest_prefix_match(&self, key: &K) -> Option<&K> {
        self.0.shortest_prefix_match(key)
    }

    /// Get the node of the shortest key in the set that contains the given key.
    pub fn shortest_prefix_match_node(&self, key: &K) -> Option<TrieNode<'_, K, ()>> {
        self.0.shortest_prefix_match_node(key)
    }

    /// Iterate over all nodes in the set whose block contains `key`, starting with the largest.
    pub fn elements_containing(&self, key: &K) -> ContainingElements<'_, K, ()> {
        self.0.elements_containing(key)
    }

    /// The sub-trie of all nodes whose block is contained in `key`.
    pub fn elements_contained_by(&self, key: &K) -> Option<TrieNode<'_, K, ()>> {
        self.0.elements_contained_by(key)
    }

    /// Removes a key from the set. Returns whether the key was present in the set.
    ///
    /// ```
    /// # use address_trie::*;
    /// # #[cfg(feature = "ipnet")]
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut set: AddressTrie<ipnet::Ipv4Net> = AddressTrie::new();
    /// let key = "192.168.1.0/24".parse()?;
    /// set.add(key);
    /// assert!(set.contains(&key));
    /// assert!(set.remove(&key));
    /// assert!(!set.contains(&key));
    /// assert!(!set.remove(&key));
    /// # Ok(())
    /// # }
    /// # #[cfg(not(feature = "ipnet"))]
    /// # fn main() {}
    /// ```
    pub fn remove(&mut self, key: &K) -> bool {
        self.0.remove_added(key).is_some()
    }

    /// Remove all keys that are contained in `key`, and return them as a new set.
    pub fn remove_elements_contained_by(&mut self, key: &K) -> Option<Self> {
        self.0.remove_elements_contained_by(key).map(Self)
    }

    /// Remove all keys that contain `key` or are contained in `key`, and return them as a new set.
    pub fn remove_elements_intersected_by(&mut self, key: &K) -> Option<Self> {
        self.0.remove_elements_intersected_by(key).map(Self)
    }

    /// Clear the set and release its bit count.
    pub fn clear(&mut self) {
        self.0.clear()
    }

    /// Keep only the elements in the set for which `f` returns `true`.
    ///
    /// ```
    /// # use address_trie::*;
    /// # #[cfg(feature = "ipnet")]
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut set: AddressTrie<ipnet::Ipv4Net> = AddressTrie::new();
    /// set.add("192.168.0.0/24".parse()?);
    /// set.add("192.168.1.0/24".parse()?);
    /// set.add("192.168.2.0/24".parse()?);
    /// set.add("192.168.2.0/25".parse()?);
    /// set.retain(|p| p.prefix_len() == 24);
    /// assert!(set.contains(&"192.168.0.0/24".parse()?));
    /// assert!(set.contains(&"192.168.2.0/24".parse()?));
    /// assert!(!set.contains(&"192.168.2.0/25".parse()?));
    /// # Ok(())
    /// # }
    /// # #[cfg(not(feature = "ipnet"))]
    /// # fn main() {}
    /// ```
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&K) -> bool,
    {
        self.0.retain(|k, _| f(k))
    }

    /// The first key in sorted order.
    pub fn first_added_node(&self) -> Option<TrieNode<'_, K, ()>> {
        self.0.first_added_node()
    }

    /// The last key in sorted order.
    pub fn last_added_node(&self) -> Option<TrieNode<'_, K, ()>> {
        self.0.last_added_node()
    }

    /// The greatest key strictly smaller than `key`.
    pub fn lower_added_node(&self, key: &K) -> Option<TrieNode<'_, K, ()>> {
        self.0.lower_added_node(key)
    }

    /// The greatest key smaller than or equal to `key`.
    pub fn floor_added_node(&self, key: &K) -> Option<TrieNode<'_, K, ()>> {
        self.0.floor_added_node(key)
    }

    /// The smallest key strictly greater than `key`.
    pub fn higher_added_node(&self, key: &K) -> Option<TrieNode<'_, K, ()>> {
        self.0.higher_added_node(key)
    }

    /// The smallest key greater than or equal to `key`.
    pub fn ceiling_added_node(&self, key: &K) -> Option<TrieNode<'_, K, ()>> {
        self.0.ceiling_added_node(key)
    }

    /// Iterate over the added nodes in sorted order (or in reverse).
    pub fn node_iter(&self, forward: bool) -> NodeIter<'_, K, ()> {
        self.0.node_iter(forward)
    }

    /// Iterate over all nodes in sorted order (or in reverse).
    pub fn all_node_iter(&self, forward: bool) -> NodeIter<'_, K, ()> {
        self.0.all_node_iter(forward)
    }

    /// Iterate over the added nodes, largest blocks first.
    pub fn block_size_node_iter(&self, lower_sub_node_first: bool) -> BlockSizeIter<'_, K, ()> {
        self.0.block_size_node_iter(lower_sub_node_first)
    }

    /// Iterate over all nodes, largest blocks first.
    pub fn block_size_all_node_iter(
        &self,
        lower_sub_node_first: bool,
    ) -> BlockSizeIter<'_, K, ()> {
        self.0.block_size_all_node_iter(lower_sub_node_first)
    }

    /// Iterate over the added nodes, containing blocks first.
    pub fn containing_first_iter(&self, forward: bool) -> ContainingFirstIter<'_, K, ()> {
        self.0.containing_first_iter(forward)
    }

    /// Iterate over all nodes, containing blocks first.
    pub fn containing_first_all_node_iter(&self, forward: bool) -> ContainingFirstIter<'_, K, ()> {
        self.0.containing_first_all_node_iter(forward)
    }

    /// Iterate over the added nodes, containing blocks first, caching a value of type `C` per
    /// branch.
    pub fn containing_first_caching_iter<C: Clone>(
        &self,
        forward: bool,
    ) -> ContainingFirstIter<'_, K, (), C> {
        self.0.containing_first_caching_iter(forward)
    }

    /// Iterate over all nodes, containing blocks first, caching a value of type `C` per branch.
    pub fn containing_first_all_node_caching_iter<C: Clone>(
        &self,
        forward: bool,
    ) -> ContainingFirstIter<'_, K, (), C> {
        self.0.containing_first_all_node_caching_iter(forward)
    }

    /// Iterate over the added nodes, contained blocks first.
    pub fn contained_first_iter(&self, forward: bool) -> ContainedFirstIter<'_, K, ()> {
        self.0.contained_first_iter(forward)
    }

    /// Iterate over all nodes, contained blocks first.
    pub fn contained_first_all_node_iter(&self, forward: bool) -> ContainedFirstIter<'_, K, ()> {
        self.0.contained_first_all_node_iter(forward)
    }

    /// An iterator over all keys of the set in sorted order.
    ///
    /// ```
    /// # use address_trie::*;
    /// # #[cfg(feature = "ipnet")]
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut set: AddressTrie<ipnet::Ipv4Net> = AddressTrie::new();
    /// set.add("192.168.2.0/24".parse()?);
    /// set.add("192.168.0.0/22".parse()?);
    /// set.add("192.168.0.0/24".parse()?);
    /// assert_eq!(
    ///     set.iter().collect::<Vec<_>>(),
    ///     vec![
    ///         &"192.168.0.0/22".parse()?,
    ///         &"192.168.0.0/24".parse()?,
    ///         &"192.168.2.0/24".parse()?,
    ///     ]
    /// );
    /// # Ok(())
    /// # }
    /// # #[cfg(not(feature = "ipnet"))]
    /// # fn main() {}
    /// ```
    pub fn iter(&self) -> Iter<'_, K> {
        self.into_iter()
    }
}

impl<K: AddressKey> Default for AddressTrie<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: AddressKey> From<AssociativeAddressTrie<K, ()>> for AddressTrie<K> {
    fn from(trie: AssociativeAddressTrie<K, ()>) -> Self {
        Self(trie)
    }
}

impl<K> PartialEq for AddressTrie<K>
where
    K: AddressKey,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<K> Eq for AddressTrie<K> where K: AddressKey {}

/// An iterator over all keys of an [`AddressTrie`] in sorted order.
pub struct Iter<'a, K>(NodeIter<'a, K, ()>);

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|n| n.key())
    }
}

/// A consuming iterator over all keys of an [`AddressTrie`] in sorted order.
pub struct IntoIter<K>(std::vec::IntoIter<(K, Option<()>)>);

impl<K> Iterator for IntoIter<K> {
    type Item = K;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(k, _)| k)
    }
}

impl<K: AddressKey> IntoIterator for AddressTrie<K> {
    type Item = K;

    type IntoIter = IntoIter<K>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter(self.0.into_entries().into_iter())
    }
}

impl<'a, K: AddressKey> IntoIterator for &'a AddressTrie<K> {
    type Item = &'a K;

    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        Iter(self.0.node_iter(true))
    }
}

impl<K: AddressKey> FromIterator<K> for AddressTrie<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<K: AddressKey> Extend<K> for AddressTrie<K> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for k in iter {
            self.add(k);
        }
    }
}
