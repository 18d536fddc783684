use std::collections::HashMap;

use super::*;
use itertools::Itertools;

fn remap_value(old: Option<&i32>, t: i32) -> Option<i32> {
    Some(old.copied().unwrap_or(0).wrapping_add(t)).filter(|x| *x >= 0)
}

fn apply(list: Vec<Operation<TestPrefix, i32>>) -> (TestMap, HashMap<TestPrefix, i32>) {
    let mut pmap = AssociativeAddressTrie::new();
    let mut hmap = HashMap::new();
    for op in list {
        match op {
            Operation::Put(p, t) => {
                pmap.put(p, t);
                hmap.insert(p, t);
            }
            Operation::Remove(p) => {
                pmap.remove(&p);
                hmap.remove(&p);
            }
            Operation::Remap(p, t) => {
                match remap_value(hmap.get(&p), t) {
                    Some(x) => hmap.insert(p, x),
                    None => hmap.remove(&p),
                };
                pmap.remap(p, |old| remap_value(old, t));
            }
        }
    }
    (pmap, hmap)
}

qc!(new, _new);
fn _new(list: Vec<(TestPrefix, i32)>) -> bool {
    let mut pmap = AssociativeAddressTrie::new();
    let mut hmap = HashMap::new();

    for (p, t) in list {
        pmap.put(p, t);
        hmap.insert(p, t);
    }

    // assert that the iterator of both is the same
    pmap.len() == hmap.len() && pmap.into_iter().eq(hmap.into_iter().sorted())
}

qc!(new_mods, _new_mods);
fn _new_mods(list: Vec<Operation<TestPrefix, i32>>) -> bool {
    let (pmap, hmap) = apply(list);
    pmap.len() == hmap.len()
        && is_compact(&pmap)
        && pmap.into_iter().eq(hmap.into_iter().sorted())
}

qc!(remap_if_absent, _remap_if_absent);
fn _remap_if_absent((mut map, key, insert_null): (TestMap, TestPrefix, bool)) -> bool {
    let before = select(&map, |p| *p != key);
    let old = map.get(&key).copied();
    let node = map.remap_if_absent(key, || None, insert_null);
    let found = node.map(|n| (n.is_added(), n.value().copied()));
    let want = match old {
        Some(v) => Some((true, Some(v))),
        None if insert_null => Some((true, None)),
        None => None,
    };
    found == want && select(&map, |p| *p != key) == before && is_compact(&map)
}

qc!(reverse, _reverse);
fn _reverse(list: Vec<Operation<TestPrefix, i32>>) -> bool {
    let (pmap, _) = apply(list);
    let mut backward = node_keys(pmap.node_iter(false));
    backward.reverse();
    backward == node_keys(pmap.node_iter(true))
        && pmap.all_node_iter(false).count() == pmap.node_size()
}

qc!(equality, _equality);
fn _equality(list: Vec<Operation<TestPrefix, i32>>) -> bool {
    let (map, _) = apply(list);
    let clone = map.clone().into_iter().collect::<AssociativeAddressTrie<_, _>>();
    clone == map
}

qc!(idempotent_add, _idempotent_add);
fn _idempotent_add(list: Vec<TestPrefix>) -> bool {
    let mut set: AddressTrie<TestPrefix> = list.iter().copied().collect();
    let size = set.node_size();
    let len = set.len();
    let again = list.iter().all(|p| !set.add(*p));
    again && set.node_size() == size && set.len() == len && len == list.iter().unique().count()
}

qc!(contains, _contains);
fn _contains((map, key): (TestMap, TestPrefix)) -> bool {
    let keys = select_keys(&map, |_| true);
    map.contains(&key) == keys.contains(&key)
        && map.element_contains(&key) == keys.iter().any(|p| p.contains(&key))
}

qc!(longest_prefix_match, _longest_prefix_match);
fn _longest_prefix_match((map, key): (TestMap, TestPrefix)) -> bool {
    let containing = select_keys(&map, |p| p.contains(&key));
    let want_lpm = containing.iter().max_by_key(|p| p.1);
    let want_spm = containing.iter().min_by_key(|p| p.1);
    map.longest_prefix_match(&key) == want_lpm
        && map.shortest_prefix_match(&key) == want_spm
        && node_keys(map.elements_containing(&key)) == containing
}

qc!(remove_contained, _remove_contained);
fn _remove_contained((mut map, key): (TestMap, TestPrefix)) -> bool {
    let want_removed = select(&map, |p| key.contains(p));
    let want_rest = select(&map, |p| !key.contains(p));
    let removed = map
        .remove_elements_contained_by(&key)
        .map(|m| select(&m, |_| true))
        .unwrap_or_default();
    removed == want_removed && select(&map, |_| true) == want_rest && is_compact(&map)
}

qc!(remove_intersected, _remove_intersected);
fn _remove_intersected((mut map, key): (TestMap, TestPrefix)) -> bool {
    let hit = |p: &TestPrefix| key.contains(p) || p.contains(&key);
    let want_removed = select(&map, hit);
    let want_rest = select(&map, |p| !hit(p));
    let removed = map
        .remove_elements_intersected_by(&key)
        .map(|m| select(&m, |_| true))
        .unwrap_or_default();
    removed == want_removed
        && select(&map, |_| true) == want_rest
        && map.len() == want_rest.len()
        && is_compact(&map)
}

qc!(retain, _retain);
fn _retain(mut map: TestMap) -> bool {
    let want = select(&map, |_| true)
        .into_iter()
        .filter(|(_, t)| t.map_or(false, |t| t % 2 == 0))
        .collect::<Vec<_>>();
    map.retain(|_, t| t.map_or(false, |t| t % 2 == 0));
    select(&map, |_| true) == want && is_compact(&map)
}

qc!(sub_trie_size, _sub_trie_size);
fn _sub_trie_size((map, key): (TestMap, TestPrefix)) -> bool {
    let want = select_keys(&map, |p| key.contains(p));
    match map.elements_contained_by(&key) {
        Some(node) => node.size() == want.len() && node_keys(node.node_iter(true)) == want,
        None => want.is_empty(),
    }
}
