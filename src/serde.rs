//! Serialization and Deserialization implementation. A trie is written as the sequence of its
//! added entries in sorted order, and read back by adding them one by one.

use ::serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::*;

impl<K: AddressKey + Serialize, V: Serialize> Serialize for AssociativeAddressTrie<K, V> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.node_iter(true).map(|n| (n.key(), n.value())))
    }
}

impl<K: AddressKey + Serialize> Serialize for AddressTrie<K> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.iter())
    }
}

impl<'de, K, V> Deserialize<'de> for AssociativeAddressTrie<K, V>
where
    K: AddressKey + Deserialize<'de>,
    V: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries: Vec<(K, Option<V>)> = Vec::deserialize(deserializer)?;
        let mut trie = Self::new();
        for (key, value) in entries {
            let (idx, _) = trie.insert_key(key).map_err(::serde::de::Error::custom)?;
            trie.table[idx].value = value;
        }
        Ok(trie)
    }
}

impl<'de, K: AddressKey + Deserialize<'de>> Deserialize<'de> for AddressTrie<K> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let keys: Vec<K> = Vec::deserialize(deserializer)?;
        let mut set = Self::new();
        for key in keys {
            set.try_add(key).map_err(::serde::de::Error::custom)?;
        }
        Ok(set)
    }
}
