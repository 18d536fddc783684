//! A summary of a trie that only shows its added nodes. Each added node is linked to its nearest
//! added descendants, skipping the branching nodes in between.

use crate::{map::AssociativeAddressTrie, node::TrieNode, AddressKey};

/// The value stored for each node of an [`AddedTree`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddedSubNodes<K, V> {
    added: bool,
    value: Option<V>,
    sub_nodes: Vec<K>,
}

impl<K, V> AddedSubNodes<K, V> {
    /// Whether the node was added in the source trie. Only the root may be `false`.
    pub fn is_added(&self) -> bool {
        self.added
    }

    /// The value of the node in the source trie.
    pub fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    /// The keys of the nearest added descendants, in sorted order.
    pub fn sub_nodes(&self) -> &[K] {
        &self.sub_nodes
    }
}

/// A trie of the added nodes of another trie, together with the root. Created by
/// [`AssociativeAddressTrie::construct_added_nodes_tree`].
///
/// ```
/// # use address_trie::*;
/// # use ipnet::Ipv4Net;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let trie: AddressTrie<Ipv4Net> = [
///     "1.2.0.0/16".parse()?,
///     "1.2.3.0/24".parse()?,
///     "1.2.4.0/24".parse()?,
/// ].into_iter().collect();
/// let tree = trie.construct_added_nodes_tree();
/// let root = tree.root();
/// assert!(!root.is_added());
/// let subs = root.sub_nodes();
/// assert_eq!(subs.len(), 1);
/// let keys: Vec<_> = subs[0].sub_nodes().iter().map(|n| n.key().to_string()).collect();
/// assert_eq!(keys, vec!["1.2.3.0/24", "1.2.4.0/24"]);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AddedTree<K, V> {
    pub(crate) trie: AssociativeAddressTrie<K, AddedSubNodes<K, V>>,
}

impl<K: AddressKey, V> AddedTree<K, V> {
    /// The root of the summary. It is always present, even if it was not added.
    pub fn root(&self) -> AddedTreeNode<'_, K, V> {
        AddedTreeNode {
            tree: self,
            node: self.trie.root(),
        }
    }

    /// Number of nodes in the summary, including the root.
    pub fn len(&self) -> usize {
        self.trie.len()
    }

    /// Always `false`, as the root is part of the summary.
    pub fn is_empty(&self) -> bool {
        self.trie.is_empty()
    }

    /// Get the summary node of `key`.
    pub fn get_node(&self, key: &K) -> Option<AddedTreeNode<'_, K, V>> {
        self.trie
            .get_added_node(key)
            .map(|node| AddedTreeNode { tree: self, node })
    }

    /// The underlying trie, mapping each key to its [`AddedSubNodes`].
    pub fn as_trie(&self) -> &AssociativeAddressTrie<K, AddedSubNodes<K, V>> {
        &self.trie
    }
}

/// A node of an [`AddedTree`].
pub struct AddedTreeNode<'a, K, V> {
    tree: &'a AddedTree<K, V>,
    node: TrieNode<'a, K, AddedSubNodes<K, V>>,
}

impl<K, V> Clone for AddedTreeNode<'_, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for AddedTreeNode<'_, K, V> {}

impl<'a, K: AddressKey, V> AddedTreeNode<'a, K, V> {
    fn info(&self) -> Option<&'a AddedSubNodes<K, V>> {
        self.node.value()
    }

    /// The key of the node.
    pub fn key(&self) -> &'a K {
        self.node.key()
    }

    /// Whether the node was added in the source trie.
    pub fn is_added(&self) -> bool {
        self.info().map_or(false, |i| i.added)
    }

    /// The value of the node in the source trie.
    pub fn value(&self) -> Option<&'a V> {
        self.info()?.value.as_ref()
    }

    /// The nearest added descendants of this node in the source trie, in sorted order.
    pub fn sub_nodes(&self) -> Vec<AddedTreeNode<'a, K, V>> {
        let tree = self.tree;
        self.info()
            .map(|i| i.sub_nodes.iter().filter_map(|k| tree.get_node(k)).collect())
            .unwrap_or_default()
    }
}

impl<K: AddressKey, V: Clone> AssociativeAddressTrie<K, V> {
    /// Build an [`AddedTree`]: a summary trie that holds the root and every added node, each with
    /// the keys of its nearest added descendants.
    pub fn construct_added_nodes_tree(&self) -> AddedTree<K, V> {
        let mut entries: Vec<(K, AddedSubNodes<K, V>)> = Vec::new();
        // the cache holds the position of the nearest recorded ancestor in `entries`
        let mut iter = self.containing_first_all_node_caching_iter::<usize>(true);
        while let Some(node) = iter.next() {
            let parent = iter.cached().copied();
            let slot = if node.is_root() || node.is_added() {
                if let Some(p) = parent {
                    entries[p].1.sub_nodes.push(node.key().clone());
                }
                entries.push((
                    node.key().clone(),
                    AddedSubNodes {
                        added: node.is_added(),
                        value: node.value().cloned(),
                        sub_nodes: Vec::new(),
                    },
                ));
                Some(entries.len() - 1)
            } else {
                parent
            };
            if let Some(slot) = slot {
                iter.cache_with_lower_sub_node(slot);
                iter.cache_with_upper_sub_node(slot);
            }
        }
        let mut trie = AssociativeAddressTrie::new();
        for (key, info) in entries {
            trie.put(key, info);
        }
        AddedTree { trie }
    }
}

impl<K: AddressKey> crate::AddressTrie<K> {
    /// Build an [`AddedTree`] of this set. See
    /// [`AssociativeAddressTrie::construct_added_nodes_tree`].
    pub fn construct_added_nodes_tree(&self) -> AddedTree<K, ()> {
        self.0.construct_added_nodes_tree()
    }
}
