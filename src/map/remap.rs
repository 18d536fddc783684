//! In-place updates of the value of a single key.

use log::trace;

use crate::{node::TrieNode, AddressKey};

use super::AssociativeAddressTrie;

impl<K, V> AssociativeAddressTrie<K, V>
where
    K: AddressKey,
{
    /// Compute a new value for `key` from its current value (`None` if the key is not added or
    /// has no value). If `f` returns a value, it is stored (adding the key if needed), and the node
    /// is returned. If `f` returns `None`, the key is removed just like with [`Self::remove`].
    ///
    /// ```
    /// # use address_trie::*;
    /// # use ipnet::Ipv4Net;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut trie: AssociativeAddressTrie<Ipv4Net, u32> = AssociativeAddressTrie::new();
    /// let key: Ipv4Net = "10.0.0.0/8".parse()?;
    /// // count the occurrences of a key
    /// trie.remap(key, |v| Some(v.copied().unwrap_or(0) + 1));
    /// trie.remap(key, |v| Some(v.copied().unwrap_or(0) + 1));
    /// assert_eq!(trie.get(&key), Some(&2));
    /// // returning `None` removes the key
    /// assert!(trie.remap(key, |_| None).is_none());
    /// assert!(!trie.contains(&key));
    /// // nothing is added if there is no value
    /// trie.remap("10.1.0.0/16".parse()?, |_| None);
    /// assert!(trie.is_empty());
    /// # Ok(())
    /// # }
    /// ```
    pub fn remap<F>(&mut self, key: K, f: F) -> Option<TrieNode<'_, K, V>>
    where
        F: FnOnce(Option<&V>) -> Option<V>,
    {
        match self.locate_added(&key) {
            Some(idx) => match f(self.table[idx].value.as_ref()) {
                Some(value) => {
                    self.table[idx].value = Some(value);
                    Some(TrieNode::new(self, idx))
                }
                None => {
                    self.remove_idx(idx);
                    trace!("remap removed node {idx}");
                    None
                }
            },
            None => {
                let value = f(None)?;
                Some(self.put_node(key, value))
            }
        }
    }

    /// Compute a value for `key` only if it has none yet. The supplier is not called if a value
    /// is present. If the supplier returns `None`, the key is still added (without a value) if
    /// `insert_null` is set. This never removes a key.
    ///
    /// ```
    /// # use address_trie::*;
    /// # use ipnet::Ipv4Net;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut trie: AssociativeAddressTrie<Ipv4Net, String> = AssociativeAddressTrie::new();
    /// let key: Ipv4Net = "10.0.0.0/8".parse()?;
    /// trie.remap_if_absent(key, || Some("a".to_string()), false);
    /// trie.remap_if_absent(key, || Some("b".to_string()), false);
    /// assert_eq!(trie.get(&key).map(String::as_str), Some("a"));
    ///
    /// let other: Ipv4Net = "10.1.0.0/16".parse()?;
    /// assert!(trie.remap_if_absent(other, || None, false).is_none());
    /// assert!(!trie.contains(&other));
    /// let node = trie.remap_if_absent(other, || None, true).unwrap();
    /// assert!(node.is_added());
    /// assert_eq!(node.value(), None);
    /// # Ok(())
    /// # }
    /// ```
    pub fn remap_if_absent<F>(
        &mut self,
        key: K,
        supplier: F,
        insert_null: bool,
    ) -> Option<TrieNode<'_, K, V>>
    where
        F: FnOnce() -> Option<V>,
    {
        if let Some(idx) = self.locate_added(&key) {
            if self.table[idx].value.is_none() {
                self.table[idx].value = supplier();
            }
            return Some(TrieNode::new(self, idx));
        }
        match supplier() {
            Some(value) => Some(self.put_node(key, value)),
            None if insert_null => Some(self.add_node(key)),
            None => None,
        }
    }
}
