//! A shared handle on a single node of a trie, together with the queries restricted to the
//! sub-trie rooted at that node.

use crate::{
    inner::{Node, ROOT},
    map::AssociativeAddressTrie,
    to_upper,
    traversal::{
        BlockSizeIter, ContainedFirstIter, ContainingElements, ContainingFirstIter, NodeIter,
    },
    AddressKey,
};

/// A node of an [`AssociativeAddressTrie`] (or of an [`crate::AddressTrie`]). The node is either
/// added, or a branching node that the trie created to split two added keys. The root always
/// exists and represents the block of all addresses.
pub struct TrieNode<'a, K, V> {
    trie: &'a AssociativeAddressTrie<K, V>,
    idx: usize,
}

impl<K, V> Clone for TrieNode<'_, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for TrieNode<'_, K, V> {}

impl<'a, K, V> TrieNode<'a, K, V> {
    pub(crate) fn new(trie: &'a AssociativeAddressTrie<K, V>, idx: usize) -> Self {
        Self { trie, idx }
    }

    pub(crate) fn index(&self) -> usize {
        self.idx
    }

    fn node(&self) -> &'a Node<K, V> {
        &self.trie.table[self.idx]
    }

    fn at(&self, idx: usize) -> Self {
        Self::new(self.trie, idx)
    }

    /// The key of the node.
    pub fn key(&self) -> &'a K {
        &self.node().key
    }

    /// Whether the key of this node was added to the trie.
    pub fn is_added(&self) -> bool {
        self.node().added
    }

    /// The value of this node, if any.
    pub fn value(&self) -> Option<&'a V> {
        self.node().value.as_ref()
    }

    /// Whether this is the root of the trie.
    pub fn is_root(&self) -> bool {
        self.idx == ROOT
    }

    /// The parent node, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        self.node().parent.map(|p| self.at(p))
    }

    /// The child in the lower half of this node's block.
    pub fn lower_sub_node(&self) -> Option<Self> {
        self.node().lower.map(|c| self.at(c))
    }

    /// The child in the upper half of this node's block.
    pub fn upper_sub_node(&self) -> Option<Self> {
        self.node().upper.map(|c| self.at(c))
    }

    /// The next node of the trie in sorted order, added or not.
    pub fn next_node(&self) -> Option<Self> {
        self.trie.table.next_in(self.idx, ROOT).map(|i| self.at(i))
    }

    /// The previous node of the trie in sorted order, added or not.
    pub fn previous_node(&self) -> Option<Self> {
        self.trie.table.prev_in(self.idx, ROOT).map(|i| self.at(i))
    }

    /// The next added node of the trie in sorted order.
    pub fn next_added_node(&self) -> Option<Self> {
        self.trie.table.next_added_in(self.idx, ROOT).map(|i| self.at(i))
    }

    /// The previous added node of the trie in sorted order.
    pub fn previous_added_node(&self) -> Option<Self> {
        self.trie.table.prev_added_in(self.idx, ROOT).map(|i| self.at(i))
    }

    /// The first added node of the sub-trie rooted at this node.
    pub fn first_added_node(&self) -> Option<Self> {
        self.trie.table.first_added_in(self.idx).map(|i| self.at(i))
    }

    /// The last added node of the sub-trie rooted at this node.
    pub fn last_added_node(&self) -> Option<Self> {
        self.trie.table.last_added_in(self.idx).map(|i| self.at(i))
    }

    /// Number of added nodes in the sub-trie rooted at this node. This operation is `O(n)`.
    pub fn size(&self) -> usize {
        self.node_iter(true).count()
    }

    /// Number of nodes in the sub-trie rooted at this node, including branching nodes.
    pub fn node_size(&self) -> usize {
        self.all_node_iter(true).count()
    }

    /// Iterate over the added nodes of this sub-trie in sorted order (or in reverse).
    pub fn node_iter(&self, forward: bool) -> NodeIter<'a, K, V> {
        NodeIter::new(self.trie, self.idx, forward, true)
    }

    /// Iterate over all nodes of this sub-trie in sorted order (or in reverse).
    pub fn all_node_iter(&self, forward: bool) -> NodeIter<'a, K, V> {
        NodeIter::new(self.trie, self.idx, forward, false)
    }

    /// Iterate over the added nodes of this sub-trie, every node before the nodes it contains.
    pub fn containing_first_iter(&self, forward: bool) -> ContainingFirstIter<'a, K, V> {
        ContainingFirstIter::new(self.trie, self.idx, forward, true)
    }

    /// Iterate over all nodes of this sub-trie, every node before the nodes it contains.
    pub fn containing_first_all_node_iter(&self, forward: bool) -> ContainingFirstIter<'a, K, V> {
        ContainingFirstIter::new(self.trie, self.idx, forward, false)
    }

    /// Same as [`Self::containing_first_iter`], with a cache of type `C` per branch.
    pub fn containing_first_caching_iter<C: Clone>(
        &self,
        forward: bool,
    ) -> ContainingFirstIter<'a, K, V, C> {
        ContainingFirstIter::new(self.trie, self.idx, forward, true)
    }

    /// Same as [`Self::containing_first_all_node_iter`], with a cache of type `C` per branch.
    pub fn containing_first_all_node_caching_iter<C: Clone>(
        &self,
        forward: bool,
    ) -> ContainingFirstIter<'a, K, V, C> {
        ContainingFirstIter::new(self.trie, self.idx, forward, false)
    }

    /// Iterate over the added nodes of this sub-trie, every node after the nodes it contains.
    pub fn contained_first_iter(&self, forward: bool) -> ContainedFirstIter<'a, K, V> {
        ContainedFirstIter::new(self.trie, self.idx, forward, true)
    }

    /// Iterate over all nodes of this sub-trie, every node after the nodes it contains.
    pub fn contained_first_all_node_iter(&self, forward: bool) -> ContainedFirstIter<'a, K, V> {
        ContainedFirstIter::new(self.trie, self.idx, forward, false)
    }
}

/// Position of a node relative to a searched key.
enum Relation {
    Equal,
    /// The node's block strictly contains the key.
    Contains,
    /// The key strictly contains the node's block.
    ContainedBy,
    /// The node's block lies entirely before the key.
    Before,
    /// The node's block lies entirely after the key.
    After,
}

fn relation<K: AddressKey>(node: &K, key: &K) -> Relation {
    if node.key_eq(key) {
        Relation::Equal
    } else if node.contains(key) {
        Relation::Contains
    } else if key.contains(node) {
        Relation::ContainedBy
    } else if node.mask() < key.mask() {
        Relation::Before
    } else {
        Relation::After
    }
}

impl<'a, K, V> TrieNode<'a, K, V>
where
    K: AddressKey,
{
    /// Iterate over the added nodes of this sub-trie, largest blocks first. Blocks of equal size
    /// are visited in ascending address order if `lower_sub_node_first` is set.
    pub fn block_size_node_iter(&self, lower_sub_node_first: bool) -> BlockSizeIter<'a, K, V> {
        BlockSizeIter::new(self.trie, self.idx, lower_sub_node_first, true)
    }

    /// Iterate over all nodes of this sub-trie, largest blocks first.
    pub fn block_size_all_node_iter(&self, lower_sub_node_first: bool) -> BlockSizeIter<'a, K, V> {
        BlockSizeIter::new(self.trie, self.idx, lower_sub_node_first, false)
    }

    /// The sub-trie of this node whose keys are all contained in `key`: either the node that
    /// matches `key`, or the shallowest node whose block lies inside `key`.
    ///
    /// ```
    /// # use address_trie::*;
    /// # use ipnet::Ipv4Net;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let trie: AddressTrie<Ipv4Net> = [
    ///     "10.0.0.0/8".parse()?,
    ///     "10.1.0.0/16".parse()?,
    ///     "10.1.2.0/24".parse()?,
    ///     "10.2.0.0/16".parse()?,
    /// ].into_iter().collect();
    /// let sub = trie.root().elements_contained_by(&"10.1.0.0/16".parse()?).unwrap();
    /// assert_eq!(sub.size(), 2);
    /// let sub = trie.root().elements_contained_by(&"10.0.0.0/14".parse()?).unwrap();
    /// // the branching node 10.0.0.0/14 holds both /16 blocks
    /// assert_eq!(sub.size(), 3);
    /// assert!(trie.root().elements_contained_by(&"11.0.0.0/8".parse()?).is_none());
    /// # Ok(())
    /// # }
    /// ```
    pub fn elements_contained_by(&self, key: &K) -> Option<Self> {
        if !self.trie.fits(key) {
            return None;
        }
        self.trie
            .table
            .contained_root(self.idx, key)
            .map(|i| self.at(i))
    }

    /// Iterate over the added nodes of this sub-trie whose block contains `key`, root-most
    /// first.
    pub fn elements_containing(&self, key: &K) -> ContainingElements<'a, K, V> {
        let start = Some(self.idx).filter(|_| self.trie.fits(key));
        ContainingElements::new(self.trie, start, key.clone())
    }

    /// The deepest added node of this sub-trie whose block contains `key`.
    pub fn longest_prefix_match(&self, key: &K) -> Option<Self> {
        self.trie.lpm_idx(self.idx, key).map(|i| self.at(i))
    }

    /// The shallowest added node of this sub-trie whose block contains `key`.
    pub fn shortest_prefix_match(&self, key: &K) -> Option<Self> {
        self.trie.spm_idx(self.idx, key).map(|i| self.at(i))
    }

    /// The greatest added node of this sub-trie that is strictly smaller than `key`.
    pub fn lower_added_node(&self, key: &K) -> Option<Self> {
        self.floor(key, true)
    }

    /// The greatest added node of this sub-trie that is smaller than or equal to `key`.
    pub fn floor_added_node(&self, key: &K) -> Option<Self> {
        self.floor(key, false)
    }

    /// The smallest added node of this sub-trie that is strictly greater than `key`.
    pub fn higher_added_node(&self, key: &K) -> Option<Self> {
        self.ceiling(key, true)
    }

    /// The smallest added node of this sub-trie that is greater than or equal to `key`.
    pub fn ceiling_added_node(&self, key: &K) -> Option<Self> {
        self.ceiling(key, false)
    }

    fn floor(&self, key: &K, strict: bool) -> Option<Self> {
        if !self.trie.fits(key) {
            return None;
        }
        let t = &self.trie.table;
        let mut idx = self.idx;
        let mut best = None;
        let found = loop {
            match relation(&t[idx].key, key) {
                Relation::Equal => {
                    break if !strict && t[idx].added {
                        Some(idx)
                    } else {
                        best
                    }
                }
                Relation::Contains => {
                    if t[idx].added {
                        best = Some(idx);
                    }
                    let upper = to_upper(&t[idx].key, key);
                    if upper {
                        // the whole lower half comes before the key
                        if let Some(l) = t[idx].lower.and_then(|l| t.last_added_in(l)) {
                            best = Some(l);
                        }
                    }
                    match t.get_child(idx, upper) {
                        Some(child) => idx = child,
                        None => break best,
                    }
                }
                Relation::ContainedBy | Relation::After => break best,
                Relation::Before => break t.last_added_in(idx).or(best),
            }
        };
        found.map(|i| self.at(i))
    }

    fn ceiling(&self, key: &K, strict: bool) -> Option<Self> {
        if !self.trie.fits(key) {
            return None;
        }
        let t = &self.trie.table;
        let mut idx = self.idx;
        let mut best = None;
        let found = loop {
            match relation(&t[idx].key, key) {
                Relation::Equal => {
                    break if !strict && t[idx].added {
                        Some(idx)
                    } else {
                        t.next_added_in(idx, idx).or(best)
                    }
                }
                Relation::Contains => {
                    let upper = to_upper(&t[idx].key, key);
                    if !upper {
                        // the whole upper half comes after the key
                        if let Some(f) = t[idx].upper.and_then(|u| t.first_added_in(u)) {
                            best = Some(f);
                        }
                    }
                    match t.get_child(idx, upper) {
                        Some(child) => idx = child,
                        None => break best,
                    }
                }
                Relation::ContainedBy | Relation::After => break t.first_added_in(idx).or(best),
                Relation::Before => break best,
            }
        };
        found.map(|i| self.at(i))
    }

    /// Copy the sub-trie rooted at this node into a new trie.
    ///
    /// ```
    /// # use address_trie::*;
    /// # use ipnet::Ipv4Net;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut trie: AssociativeAddressTrie<Ipv4Net, u32> = AssociativeAddressTrie::new();
    /// trie.put("10.0.0.0/8".parse()?, 1);
    /// trie.put("10.1.0.0/16".parse()?, 2);
    /// trie.put("192.168.0.0/16".parse()?, 3);
    /// let copy = trie.get_node(&"10.0.0.0/8".parse()?).unwrap().clone_tree();
    /// assert_eq!(copy.values().copied().collect::<Vec<_>>(), vec![1, 2]);
    /// # Ok(())
    /// # }
    /// ```
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
