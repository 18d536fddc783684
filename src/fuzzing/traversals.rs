use std::ops::Bound;

use super::*;

qc!(navigation, _navigation);
fn _navigation((map, key): (TestMap, TestPrefix)) -> bool {
    let keys = select_keys(&map, |_| true);
    fn get(n: Option<TrieNode<'_, TestPrefix, i32>>) -> Option<TestPrefix> {
        n.map(|n| *n.key())
    }
    get(map.floor_added_node(&key)) == keys.iter().copied().filter(|p| *p <= key).last()
        && get(map.lower_added_node(&key)) == keys.iter().copied().filter(|p| *p < key).last()
        && get(map.ceiling_added_node(&key)) == keys.iter().copied().find(|p| *p >= key)
        && get(map.higher_added_node(&key)) == keys.iter().copied().find(|p| *p > key)
        && get(map.first_added_node()) == keys.first().copied()
        && get(map.last_added_node()) == keys.last().copied()
}

qc!(next_and_previous, _next_and_previous);
fn _next_and_previous(map: TestMap) -> bool {
    let all = node_keys(map.all_node_iter(true));
    let added = select_keys(&map, |_| true);
    map.all_node_iter(true).zip(0..).all(|(n, pos)| {
        n.next_node().map(|m| *m.key()) == all.get(pos + 1).copied()
            && n.previous_node().map(|m| *m.key()) == pos.checked_sub(1).map(|i| all[i])
            && n.next_added_node().map(|m| *m.key())
                == added.iter().copied().find(|p| p > n.key())
            && n.previous_added_node().map(|m| *m.key())
                == added.iter().copied().filter(|p| p < n.key()).last()
    })
}

qc!(block_size, _block_size);
fn _block_size(map: TestMap) -> bool {
    let mut want = select_keys(&map, |_| true);
    want.sort_by_key(|p| (p.1, p.0));
    let mut want_rev = want.clone();
    want_rev.sort_by_key(|p| (p.1, std::cmp::Reverse(p.0)));
    node_keys(map.block_size_node_iter(true)) == want
        && node_keys(map.block_size_node_iter(false)) == want_rev
}

qc!(containing_first, _containing_first);
fn _containing_first(map: TestMap) -> bool {
    // in the forward direction, the pre-order is the sorted order
    let mut backward = select_keys(&map, |_| true);
    let forward = node_keys(map.containing_first_iter(true));
    let ok = forward == backward;
    // in reverse, every node still comes before the nodes it contains
    backward = node_keys(map.containing_first_iter(false));
    ok && backward.len() == forward.len()
        && backward
            .iter()
            .enumerate()
            .all(|(i, p)| backward[..i].iter().all(|q| !p.contains(q) || p == q))
}

qc!(contained_first, _contained_first);
fn _contained_first(map: TestMap) -> bool {
    let want = select_keys(&map, |_| true);
    [true, false].into_iter().all(|forward| {
        let got = node_keys(map.contained_first_iter(forward));
        let mut sorted = got.clone();
        sorted.sort();
        sorted == want
            && got
                .iter()
                .enumerate()
                .all(|(i, p)| got[i + 1..].iter().all(|q| !p.contains(q)))
    })
}

qc!(caching, _caching);
fn _caching(map: TestMap) -> bool {
    // the cache of each node is its nearest added ancestor
    let keys = select_keys(&map, |_| true);
    let mut iter = map.containing_first_caching_iter::<TestPrefix>(true);
    while let Some(node) = iter.next() {
        let key = *node.key();
        let want = keys
            .iter()
            .copied()
            .filter(|p| p.contains(&key) && *p != key)
            .max_by_key(|p| p.1);
        if iter.cached().copied() != want {
            return false;
        }
        iter.cache_with_lower_sub_node(key);
        iter.cache_with_upper_sub_node(key);
    }
    true
}

qc!(added_tree, _added_tree);
fn _added_tree(map: TestMap) -> bool {
    let keys = select_keys(&map, |_| true);
    let tree = map.construct_added_nodes_tree();
    let parent_of = |k: &TestPrefix| {
        keys.iter()
            .copied()
            .filter(|p| p.contains(k) && p != k)
            .max_by_key(|p| p.1)
    };
    let root = *map.root().key();
    let root_children: Vec<_> = keys
        .iter()
        .copied()
        .filter(|k| *k != root && parent_of(k).map_or(true, |p| p == root))
        .collect();
    let root_ok = tree
        .root()
        .sub_nodes()
        .iter()
        .map(|n| *n.key())
        .eq(root_children);
    root_ok
        && keys.iter().filter(|k| **k != root).all(|k| {
            let want: Vec<_> = keys
                .iter()
                .copied()
                .filter(|c| parent_of(c) == Some(*k))
                .collect();
            tree.get_node(k).map_or(false, |n| {
                n.sub_nodes().iter().map(|s| *s.key()).eq(want)
                    && n.value() == map.get(k)
            })
        })
}

qc!(bounded, _bounded);
fn _bounded((map, a, b): (TestMap, TestPrefix, TestPrefix)) -> bool {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let incl = map.create_sub_trie(lo..=hi);
    let excl = map.create_sub_trie((Bound::Excluded(lo), Bound::Excluded(hi)));
    let want_incl = select_keys(&map, |p| lo <= *p && *p <= hi);
    let want_excl = select_keys(&map, |p| lo < *p && *p < hi);
    let mut rev = node_keys(incl.node_iter(false));
    rev.reverse();
    node_keys(incl.node_iter(true)) == want_incl
        && rev == want_incl
        && node_keys(excl.node_iter(true)) == want_excl
        && incl.size() == want_incl.len()
        && incl.first_added_node().map(|n| *n.key()) == want_incl.first().copied()
        && incl.floor_added_node(&hi).map(|n| *n.key()) == want_incl.last().copied()
}

qc!(bounded_mut, _bounded_mut);
fn _bounded_mut((mut map, a, b): (TestMap, TestPrefix, TestPrefix)) -> bool {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let want_rest = select(&map, |p| *p < lo || hi < *p);
    let outside = TestPrefix(0, 0) < lo;
    let mut view = map.create_sub_trie_mut(lo..=hi);
    let added = view.add(TestPrefix(0, 0));
    view.clear();
    !(outside && added) && select(&map, |_| true) == want_rest && is_compact(&map)
}
