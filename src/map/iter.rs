//! Module that contains the implementation for the iterators over key-value pairs.

use crate::{
    inner::{Node, ROOT},
    AddressKey,
};

use super::AssociativeAddressTrie;

/// An iterator over all entries of an [`AssociativeAddressTrie`] in sorted order. Added keys
/// without a value are skipped.
#[derive(Clone)]
pub struct Iter<'a, K, V> {
    pub(crate) trie: &'a AssociativeAddressTrie<K, V>,
    pub(crate) nodes: Vec<usize>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<(&'a K, &'a V)> {
        while let Some(cur) = self.nodes.pop() {
            let node = &self.trie.table[cur];
            if let Some(upper) = node.upper {
                self.nodes.push(upper);
            }
            if let Some(lower) = node.lower {
                self.nodes.push(lower);
            }
            if let (true, Some(v)) = (node.added, &node.value) {
                return Some((&node.key, v));
            }
        }
        None
    }
}

/// An iterator over all keys of an [`AssociativeAddressTrie`] that carry a value, in sorted order.
#[derive(Clone)]
pub struct Keys<'a, K, V> {
    pub(crate) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(k, _)| k)
    }
}

/// An iterator over all values of an [`AssociativeAddressTrie`] in sorted order of their keys.
#[derive(Clone)]
pub struct Values<'a, K, V> {
    pub(crate) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, v)| v)
    }
}

/// An iterator over all owned entries of an [`AssociativeAddressTrie`] in sorted order.
#[derive(Clone)]
pub struct IntoIter<K, V> {
    trie: AssociativeAddressTrie<K, V>,
    nodes: Vec<usize>,
}

impl<K: AddressKey, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        while let Some(cur) = self.nodes.pop() {
            let node = &mut self.trie.table[cur];
            if let Some(upper) = node.upper {
                self.nodes.push(upper);
            }
            if let Some(lower) = node.lower {
                self.nodes.push(lower);
            }
            if !node.added {
                continue;
            }
            if let Some(v) = node.value.take() {
                return Some((std::mem::replace(&mut node.key, K::root(0)), v));
            }
        }
        None
    }
}

/// An iterator over all owned keys of an [`AssociativeAddressTrie`] that carry a value.
#[derive(Clone)]
pub struct IntoKeys<K, V> {
    inner: IntoIter<K, V>,
}

impl<K: AddressKey, V> Iterator for IntoKeys<K, V> {
    type Item = K;

    fn next(&mut self) -> Option<K> {
        self.inner.next().map(|(k, _)| k)
    }
}

/// An iterator over all owned values of an [`AssociativeAddressTrie`] in sorted order of their
/// keys.
#[derive(Clone)]
pub struct IntoValues<K, V> {
    inner: IntoIter<K, V>,
}

impl<K: AddressKey, V> Iterator for IntoValues<K, V> {
    type Item = V;

    fn next(&mut self) -> Option<V> {
        self.inner.next().map(|(_, v)| v)
    }
}

impl<K: AddressKey, V> IntoIterator for AssociativeAddressTrie<K, V> {
    type Item = (K, V);

    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            trie: self,
            nodes: vec![ROOT],
        }
    }
}

impl<'a, K, V> IntoIterator for &'a AssociativeAddressTrie<K, V> {
    type Item = (&'a K, &'a V);

    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        Iter {
            trie: self,
            nodes: vec![ROOT],
        }
    }
}

/// A mutable iterator over an [`AssociativeAddressTrie`]. This iterator yields elements in sorted
/// order of their keys.
pub struct IterMut<'a, K, V> {
    entries: std::vec::IntoIter<(&'a K, &'a mut V)>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

/// A mutable iterator over values of an [`AssociativeAddressTrie`]. This iterator yields elements
/// in sorted order.
pub struct ValuesMut<'a, K, V> {
    pub(crate) inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }
}

impl<K, V> AssociativeAddressTrie<K, V> {
    /// An iterator visiting all key-value pairs in sorted order. The iterator element type is
    /// `(&K, &V)`.
    ///
    /// ```
    /// # use address_trie::*;
    /// # #[cfg(feature = "ipnet")]
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut trie: AssociativeAddressTrie<ipnet::Ipv4Net, _> = AssociativeAddressTrie::new();
    /// trie.put("192.168.0.0/22".parse()?, 1);
    /// trie.put("192.168.0.0/23".parse()?, 2);
    /// trie.put("192.168.2.0/23".parse()?, 3);
    /// trie.put("192.168.0.0/24".parse()?, 4);
    /// trie.put("192.168.2.0/24".parse()?, 5);
    /// assert_eq!(
    ///     trie.iter().collect::<Vec<_>>(),
    ///     vec![
    ///         (&"192.168.0.0/22".parse()?, &1),
    ///         (&"192.168.0.0/23".parse()?, &2),
    ///         (&"192.168.0.0/24".parse()?, &4),
    ///         (&"192.168.2.0/23".parse()?, &3),
    ///         (&"192.168.2.0/24".parse()?, &5),
    ///     ]
    /// );
    /// # Ok(())
    /// # }
    /// # #[cfg(not(feature = "ipnet"))]
    /// # fn main() {}
    /// ```
    #[inline(always)]
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.into_iter()
    }

    /// Get a mutable iterator over all key-value pairs, in sorted order.
    ///
    /// ```
    /// # use address_trie::*;
    /// # #[cfg(feature = "ipnet")]
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut trie: AssociativeAddressTrie<ipnet::Ipv4Net, _> = AssociativeAddressTrie::new();
    /// trie.put("192.168.0.0/22".parse()?, 1);
    /// trie.put("192.168.0.0/23".parse()?, 2);
    /// trie.iter_mut().for_each(|(_, v)| *v *= 10);
    /// assert_eq!(trie.values().copied().collect::<Vec<_>>(), vec![10, 20]);
    /// # Ok(())
    /// # }
    /// # #[cfg(not(feature = "ipnet"))]
    /// # fn main() {}
    /// ```
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let order = self.table.preorder(ROOT);
        let mut slots: Vec<_> = self.table.nodes_mut().iter_mut().map(Some).collect();
        let entries: Vec<(&K, &mut V)> = order
            .into_iter()
            .filter_map(|idx| slots[idx].take())
            .filter(|node| node.added)
            .filter_map(|node| Some((&node.key, node.value.as_mut()?)))
            .collect();
        IterMut {
            entries: entries.into_iter(),
        }
    }

    /// An iterator visiting all keys that carry a value, in sorted order.
    #[inline(always)]
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// An iterator visiting all values in sorted order of their keys.
    ///
    /// ```
    /// # use address_trie::*;
    /// # #[cfg(feature = "ipnet")]
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut trie: AssociativeAddressTrie<ipnet::Ipv4Net, _> = AssociativeAddressTrie::new();
    /// trie.put("192.168.0.0/22".parse()?, 1);
    /// trie.put("192.168.0.0/23".parse()?, 2);
    /// trie.put("192.168.2.0/23".parse()?, 3);
    /// trie.put("192.168.0.0/24".parse()?, 4);
    /// trie.put("192.168.2.0/24".parse()?, 5);
    /// assert_eq!(trie.values().collect::<Vec<_>>(), vec![&1, &2, &4, &3, &5]);
    /// # Ok(())
    /// # }
    /// # #[cfg(not(feature = "ipnet"))]
    /// # fn main() {}
    /// ```
    #[inline(always)]
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Get a mutable iterator over all values, in sorted order of their keys.
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }
}

impl<K: AddressKey, V> AssociativeAddressTrie<K, V> {
    /// All added entries in sorted order, including the ones without a value.
    pub(crate) fn into_entries(self) -> Vec<(K, Option<V>)> {
        let order = self.table.preorder(ROOT);
        let mut slots: Vec<Option<Node<K, V>>> =
            self.table.into_nodes().into_iter().map(Some).collect();
        order
            .into_iter()
            .filter_map(|idx| slots[idx].take())
            .filter(|node| node.added)
            .map(|node| (node.key, node.value))
            .collect()
    }

    /// Creates a consuming iterator visiting all keys that carry a value, in sorted order.
    #[inline(always)]
    pub fn into_keys(self) -> IntoKeys<K, V> {
        IntoKeys {
            inner: self.into_iter(),
        }
    }

    /// Creates a consuming iterator visiting all values in sorted order of their keys.
    #[inline(always)]
    pub fn into_values(self) -> IntoValues<K, V> {
        IntoValues {
            inner: self.into_iter(),
        }
    }
}

impl<K, V> FromIterator<(K, V)> for AssociativeAddressTrie<K, V>
where
    K: AddressKey,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut trie = Self::new();
        trie.extend(iter);
        trie
    }
}

impl<K, V> Extend<(K, V)> for AssociativeAddressTrie<K, V>
where
    K: AddressKey,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        iter.into_iter().for_each(|(k, v)| {
            self.put(k, v);
        });
    }
}
