//! Formatting implementation for the tries and their nodes

use std::fmt::{Debug, Formatter, Result};

use super::*;

impl<K: Debug, V: Debug> Debug for AssociativeAddressTrie<K, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        DebugNode(self, inner::ROOT).fmt(f)
    }
}

impl<K: AddressKey + Debug> Debug for AddressTrie<K> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.debug_set()
            .entries(self.0.node_iter(true).map(|n| n.key()))
            .finish()
    }
}

struct DebugNode<'a, K, V>(&'a AssociativeAddressTrie<K, V>, usize);

impl<K: Debug, V: Debug> Debug for DebugNode<'_, K, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let trie = self.0;
        let node = &trie.table[self.1];
        let children: Vec<Self> = [node.lower, node.upper]
            .into_iter()
            .flatten()
            .map(|c| Self(trie, c))
            .collect();
        match (node.added.then_some(&node.value), children.is_empty()) {
            (None, true) => node.key.fmt(f),
            (None, false) => f.debug_map().entry(&node.key, &children).finish(),
            (Some(v), true) => f.debug_map().entry(&node.key, v).finish(),
            (Some(v), false) => f.debug_map().entry(&node.key, &(v, children)).finish(),
        }
    }
}

impl<K: Debug, V: Debug> Debug for TrieNode<'_, K, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.debug_struct("TrieNode")
            .field("key", self.key())
            .field("added", &self.is_added())
            .field("value", &self.value())
            .finish()
    }
}

/// Draws the summary as an indented tree, marking added nodes with `●` and the root (if not
/// added) with `○`.
impl<K: AddressKey + Debug, V: Debug> Debug for AddedTree<K, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write_added(f, self.root(), "", "")
    }
}

fn write_added<K: AddressKey + Debug, V: Debug>(
    f: &mut Formatter<'_>,
    node: AddedTreeNode<'_, K, V>,
    head: &str,
    indent: &str,
) -> Result {
    let mark = if node.is_added() { '●' } else { '○' };
    write!(f, "{head}{mark} {:?}", node.key())?;
    if let Some(v) = node.value() {
        write!(f, " = {v:?}")?;
    }
    writeln!(f)?;
    let subs = node.sub_nodes();
    let n = subs.len();
    for (i, sub) in subs.into_iter().enumerate() {
        let (branch, cont) = if i + 1 == n {
            ("└─", "  ")
        } else {
            ("├─", "│ ")
        };
        write_added(f, sub, &format!("{indent}{branch}"), &format!("{indent}{cont}"))?;
    }
    Ok(())
}

impl<K: AddressKey + Debug, V: Debug> Debug for AddedTreeNode<'_, K, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.debug_struct("AddedTreeNode")
            .field("key", self.key())
            .field("added", &self.is_added())
            .field("value", &self.value())
            .finish()
    }
}
