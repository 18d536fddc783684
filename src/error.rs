//! Errors of the address trie.

use std::fmt;

/// A key was added whose bit count differs from the bit count fixed by the first key of the trie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BitCountMismatch {
    /// Bit count of the keys already stored in the trie.
    pub expected: u8,
    /// Bit count of the rejected key.
    pub actual: u8,
}

impl fmt::Display for BitCountMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot add a {}-bit key to a trie of {}-bit keys",
            self.actual, self.expected
        )
    }
}

impl std::error::Error for BitCountMismatch {}
