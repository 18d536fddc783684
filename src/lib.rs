//! This crate provides a compressed binary prefix trie for address keys: IPv4 and IPv6 addresses
//! and networks, MAC addresses, or any other fixed-width bit string with an optional prefix
//! length. Keys come from [ipnet](https://docs.rs/ipnet/2.10.0) (and optionally
//! [ipnetwork](https://crates.io/crates/ipnetwork) or [cidr](https://crates.io/crates/cidr)), from
//! the tagged [`Key`] type, or from any tuple `(R, u8)` where `R` is an unsigned primitive integer.
//!
//! The crate offers an [`AddressTrie`] (a set of keys) and an [`AssociativeAddressTrie`] (a map
//! from keys to values). Both support exact lookups, containment queries, longest-prefix match,
//! ordered navigation (`floor`, `ceiling`, `lower`, `higher`), several traversal orders, bounded
//! views on a key range, and the construction of an [`AddedTree`] that only shows the added
//! keys and their nearest added descendants.
//!
//! # Description of the Tree
//!
//! The tree is structured as follows: Each node consists of a key, an `added` flag, a container
//! for a potential value (`Option`), two optional children and a link to its parent. Adding a new
//! child, or traversing into the tree is done as follows: we look at the most significant bit
//! that is **not** part of the node's prefix. If it is not set, then we take the lower branch, and
//! otherwise, we take the upper one. Nodes that were not added by the user (branching nodes) exist
//! only where two branches diverge, and they are removed again as soon as they are no longer
//! needed.
//!
//! The root node always represents the block of all addresses (prefix length 0). The bit count of
//! the keys is fixed by the first key that is added. Adding a key with a different bit count is a
//! contract violation and panics (use `try_add` or `try_put` to get an error instead).
//!
//! # Ordering and Traversals
//!
//! Keys are ordered by the lower bound of their block, and the larger block comes first if two
//! blocks start at the same address. This is exactly the pre-order of the trie (a node, then its
//! lower sub-trie, then its upper sub-trie), so every sorted iteration is a tree walk.
//!
//! | Iterator                            | Order                                             |
//! |-------------------------------------|---------------------------------------------------|
//! | `node_iter`, `all_node_iter`        | sorted (forward or reverse)                       |
//! | `containing_first_iter`             | ancestors before descendants (with cached context) |
//! | `contained_first_iter`              | descendants before ancestors                      |
//! | `block_size_node_iter`              | largest blocks first, then by address             |
//!
//! # Operations on the tree
//!
//! The following are the computational complexities of the functions, where `n` is the number of
//! elements in the tree, and `w` is the bit count of the keys.
//!
//! | Operation                                    | Complexity |
//! |----------------------------------------------|------------|
//! | `add`, `put`, `remap`                        | `O(w)`     |
//! | `remove`                                     | `O(w)`     |
//! | `remove_elements_contained_by`               | `O(w + n)` |
//! | `get_node`, `contains`, `longest_prefix_match` | `O(w)`   |
//! | `floor_added_node` and friends               | `O(w)`     |
//! | `len` and `is_empty`                         | `O(1)`     |
//!
//! ```
//! # use address_trie::*;
//! # #[cfg(feature = "ipnet")]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut trie: AddressTrie<ipnet::Ipv4Net> = AddressTrie::new();
//! trie.add("10.0.0.0/8".parse()?);
//! trie.add("10.1.0.0/16".parse()?);
//! trie.add("10.1.2.0/24".parse()?);
//! assert_eq!(
//!     trie.longest_prefix_match(&"10.1.2.5/32".parse()?),
//!     Some(&"10.1.2.0/24".parse()?)
//! );
//! trie.remove(&"10.1.0.0/16".parse()?);
//! assert_eq!(
//!     trie.longest_prefix_match(&"10.1.3.0/32".parse()?),
//!     Some(&"10.0.0.0/8".parse()?)
//! );
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "ipnet"))]
//! # fn main() {}
//! ```

#![allow(clippy::collapsible_else_if)]
#![deny(missing_docs)]

mod error;
mod fmt;
mod inner;
mod key;
#[cfg(feature = "serde")]
mod serde;
#[cfg(test)]
#[cfg(feature = "ipnet")]
mod test;
#[cfg(test)]
mod fuzzing;

pub mod added_tree;
pub mod bounded;
pub mod map;
pub mod node;
pub mod set;
pub mod traversal;

pub use added_tree::{AddedSubNodes, AddedTree, AddedTreeNode};
pub use bounded::{BoundedTrie, BoundedTrieMut, Bounds};
pub use error::BitCountMismatch;
pub use key::{AddressKey, Bits, Key};
pub use map::AssociativeAddressTrie;
pub use node::TrieNode;
pub use set::AddressTrie;

#[inline(always)]
pub(crate) fn to_upper<K: AddressKey>(branch_k: &K, child_k: &K) -> bool {
    child_k.bit_at(branch_k.block_len())
}
