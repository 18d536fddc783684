//! Module for testing using fuzzing (quickcheck)
#![allow(clippy::type_complexity)]

use std::fmt::Debug;

use crate::*;
use quickcheck::Arbitrary;

mod basic;
mod traversals;

type TestMap = AssociativeAddressTrie<TestPrefix, i32>;

/// One modification of a map. `Remap` adds the value to the existing one (or to 0), and removes
/// the key if the result is negative.
#[derive(Debug, PartialEq, Clone, Copy)]
enum Operation<P, T> {
    Put(P, T),
    Remove(P),
    Remap(P, T),
}

#[cfg(miri)]
const DEFAULT_NUM_TESTS: usize = 10;
#[cfg(not(miri))]
const DEFAULT_NUM_TESTS: usize = 10000;
const DEFAULT_GEN_SIZE: usize = 100;

fn env_or(var: &str, default: usize) -> usize {
    std::env::var(var)
        .ok()
        .and_then(|x| x.parse().ok())
        .unwrap_or(default)
}

fn proptest_runner<A: Arbitrary + Debug + PartialEq, F: Fn(A) -> bool>(f: F) {
    let mut gen = quickcheck::Gen::new(env_or("QUICKCHECK_GENERATOR_SIZE", DEFAULT_GEN_SIZE));
    for _ in 0..env_or("QUICKCHECK_TESTS", DEFAULT_NUM_TESTS) {
        let input = A::arbitrary(&mut gen);
        if !f(input.clone()) {
            shrink_failure(f, input)
        }
    }
}

/// Descend into the first shrunk input that still fails, and report the input once none does.
fn shrink_failure<A: Arbitrary + Debug + PartialEq, F: Fn(A) -> bool>(f: F, input: A) -> ! {
    let smaller = input.shrink().find(|i| !f(i.clone()));
    if let Some(smaller) = smaller {
        shrink_failure(f, smaller)
    }
    panic!("[QUICKCHECK] Test case failed!\n  Minimal input:\n    {input:?}");
}

#[allow(missing_docs)]
#[macro_export]
macro_rules! qc {
    ($name:ident, $f:ident) => {
        #[test]
        fn $name() {
            proptest_runner($f)
        }
    };
}

/// All entries of the map (including the ones without a value) that satisfy `f`, sorted.
fn select<T: Clone, F: Fn(&TestPrefix) -> bool>(
    map: &AssociativeAddressTrie<TestPrefix, T>,
    f: F,
) -> Vec<(TestPrefix, Option<T>)> {
    map.node_iter(true)
        .filter(|n| f(n.key()))
        .map(|n| (*n.key(), n.value().cloned()))
        .collect()
}

fn select_keys<T, F: Fn(&TestPrefix) -> bool>(
    map: &AssociativeAddressTrie<TestPrefix, T>,
    f: F,
) -> Vec<TestPrefix> {
    map.node_iter(true)
        .map(|n| *n.key())
        .filter(|p| f(p))
        .collect()
}

fn node_keys<'a, T: 'a>(
    iter: impl Iterator<Item = TrieNode<'a, TestPrefix, T>>,
) -> Vec<TestPrefix> {
    iter.map(|n| *n.key()).collect()
}

/// Every node except the root is either added or has two sub-nodes.
fn is_compact<T>(map: &AssociativeAddressTrie<TestPrefix, T>) -> bool {
    map.all_node_iter(true).all(|n| {
        n.is_root()
            || n.is_added()
            || (n.lower_sub_node().is_some() && n.upper_sub_node().is_some())
    })
}

impl<T: Arbitrary> Arbitrary for AssociativeAddressTrie<TestPrefix, T> {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        <Vec<(TestPrefix, T)> as Arbitrary>::arbitrary(g)
            .into_iter()
            .collect()
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        let elems = self.clone().into_iter().collect::<Vec<_>>();
        let shrinked = elems.shrink();
        Box::new(shrinked.map(AssociativeAddressTrie::from_iter))
    }
}

impl<P: Arbitrary, T: Arbitrary> Arbitrary for Operation<P, T> {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        let p = P::arbitrary(g);
        match g.choose(&[0, 0, 0, 0, 0, 1, 1, 1, 2, 2]).copied() {
            Some(1) => Self::Remove(p),
            Some(2) => Self::Remap(p, T::arbitrary(g)),
            _ => Self::Put(p, T::arbitrary(g)),
        }
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        match self.clone() {
            Operation::Put(p, t) => {
                Box::new(p.shrink().map(move |p| Operation::Put(p, t.clone())))
            }
            Operation::Remove(p) => Box::new(p.shrink().map(Operation::Remove)),
            Operation::Remap(p, t) => {
                Box::new(p.shrink().map(move |p| Operation::Remap(p, t.clone())))
            }
        }
    }
}

/// A 32-bit block with masked host bits. The derived order is the order of the trie.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
struct TestPrefix(u32, u8);

impl Debug for TestPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let addr = format!("{:032b}", self.0)[..10].to_string();
        write!(f, "0b{addr}/{}", self.1)
    }
}

impl Arbitrary for TestPrefix {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        #[rustfmt::skip]
        let len: u8 = *g
            .choose(&[
                0,
                1, 1,
                2, 2, 2,
                3, 3, 3, 3,
                4, 4, 4, 4, 4,
                5, 5, 5, 5, 5, 5,
                6, 6, 6, 6, 6, 6, 6,
                7, 7, 7, 7, 7, 7, 7, 7,
                8, 8, 8, 8, 8, 8, 8, 8, 8,
                9, 9, 9, 9, 9, 9, 9, 9, 9, 9,
            ])
            .unwrap();
        let x = u32::arbitrary(g);
        Self::from_parts(x, 32, Some(len))
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        if self.1 == 0 {
            quickcheck::empty_shrinker()
        } else {
            let x = Self::from_parts(self.0, 32, Some(self.1 - 1));
            quickcheck::single_shrinker(x)
        }
    }
}

impl AddressKey for TestPrefix {
    type R = u32;

    fn bits(&self) -> u32 {
        self.0
    }

    fn bit_count(&self) -> u8 {
        32
    }

    fn prefix_len(&self) -> Option<u8> {
        Some(self.1)
    }

    fn from_parts(bits: u32, _bit_count: u8, prefix_len: Option<u8>) -> Self {
        let len = prefix_len.unwrap_or(32);
        Self(bits & crate::key::mask_from_prefix_len::<u32>(len), len)
    }

    fn mask(&self) -> u32 {
        self.0
    }
}
