use ipnet::{IpNet, Ipv4Net};
use pretty_assertions::assert_eq;

use super::*;

type Map = AssociativeAddressTrie<Ipv4Net, u32>;
type Set = AddressTrie<Ipv4Net>;

fn ip(s: &str) -> Ipv4Net {
    s.parse().unwrap()
}

fn set(keys: &[&str]) -> Set {
    keys.iter().map(|k| ip(k)).collect()
}

fn keys<'a, V: 'a>(iter: impl Iterator<Item = TrieNode<'a, Ipv4Net, V>>) -> Vec<String> {
    iter.map(|n| n.key().to_string()).collect()
}

/// Every node except the root is either added or has two sub-nodes.
fn assert_compact<V>(trie: &AssociativeAddressTrie<Ipv4Net, V>) {
    for node in trie.all_node_iter(true) {
        if node.is_root() || node.is_added() {
            continue;
        }
        assert!(
            node.lower_sub_node().is_some() && node.upper_sub_node().is_some(),
            "branching node {} has less than two sub-nodes",
            node.key()
        );
    }
}

#[test]
fn longest_prefix_match_after_remove() {
    let mut trie = set(&["10.0.0.0/8", "10.1.0.0/16", "10.1.2.0/24"]);
    assert_eq!(
        trie.longest_prefix_match(&ip("10.1.2.5/32")),
        Some(&ip("10.1.2.0/24"))
    );
    assert_eq!(
        trie.shortest_prefix_match(&ip("10.1.2.5/32")),
        Some(&ip("10.0.0.0/8"))
    );
    assert_eq!(
        trie.longest_prefix_match(&ip("10.1.3.0/32")),
        Some(&ip("10.1.0.0/16"))
    );
    assert!(trie.remove(&ip("10.1.0.0/16")));
    assert!(!trie.remove(&ip("10.1.0.0/16")));
    assert_eq!(
        trie.longest_prefix_match(&ip("10.1.3.0/32")),
        Some(&ip("10.0.0.0/8"))
    );
    assert_eq!(trie.longest_prefix_match(&ip("11.0.0.0/32")), None);
    assert_compact(&trie.0);
}

#[test]
fn lpm_value() {
    let mut map = Map::new();
    map.put(ip("10.0.0.0/8"), 1);
    map.add(ip("10.1.0.0/16"));
    // the deepest match has no value
    assert_eq!(map.longest_prefix_match_value(&ip("10.1.1.1/32")), None);
    assert_eq!(
        map.longest_prefix_match_value(&ip("10.2.1.1/32")),
        Some((&ip("10.0.0.0/8"), &1))
    );
    assert_eq!(
        map.longest_prefix_match(&ip("10.1.1.1/32")),
        Some(&ip("10.1.0.0/16"))
    );
}

#[test]
fn contains_is_exact() {
    let trie = set(&["192.168.1.0/24"]);
    assert!(trie.contains(&ip("192.168.1.0/24")));
    assert!(trie.contains(&ip("192.168.1.77/24")));
    assert!(!trie.contains(&ip("192.168.1.0/25")));
    assert!(trie.element_contains(&ip("192.168.1.0/25")));
    assert!(!trie.element_contains(&ip("192.168.0.0/16")));
}

#[test]
fn sorted_and_reverse_order() {
    let trie = set(&[
        "192.168.0.0/16",
        "10.1.2.0/24",
        "10.0.0.0/16",
        "10.0.0.0/8",
        "10.1.0.0/16",
    ]);
    let want = vec![
        "10.0.0.0/8",
        "10.0.0.0/16",
        "10.1.0.0/16",
        "10.1.2.0/24",
        "192.168.0.0/16",
    ];
    assert_eq!(keys(trie.node_iter(true)), want);
    let mut rev = want.clone();
    rev.reverse();
    assert_eq!(keys(trie.node_iter(false)), rev);
    assert_eq!(
        trie.iter().map(|k| k.to_string()).collect::<Vec<_>>(),
        want
    );
    // branching nodes only show up in the all-node iterator
    assert_eq!(
        keys(trie.all_node_iter(true)),
        vec![
            "0.0.0.0/0",
            "10.0.0.0/8",
            "10.0.0.0/15",
            "10.0.0.0/16",
            "10.1.0.0/16",
            "10.1.2.0/24",
            "192.168.0.0/16",
        ]
    );
}

#[test]
fn block_size_order() {
    let trie = set(&[
        "10.0.0.0/8",
        "10.0.0.0/16",
        "10.1.0.0/16",
        "10.1.2.0/24",
        "192.168.0.0/16",
    ]);
    assert_eq!(
        keys(trie.block_size_node_iter(true)),
        vec![
            "10.0.0.0/8",
            "10.0.0.0/16",
            "10.1.0.0/16",
            "192.168.0.0/16",
            "10.1.2.0/24",
        ]
    );
    assert_eq!(
        keys(trie.block_size_node_iter(false)),
        vec![
            "10.0.0.0/8",
            "192.168.0.0/16",
            "10.1.0.0/16",
            "10.0.0.0/16",
            "10.1.2.0/24",
        ]
    );
}

#[test]
fn contained_first_order() {
    let trie = set(&[
        "10.0.0.0/8",
        "10.0.0.0/16",
        "10.1.0.0/16",
        "10.1.2.0/24",
        "192.168.0.0/16",
    ]);
    assert_eq!(
        keys(trie.contained_first_iter(true)),
        vec![
            "10.0.0.0/16",
            "10.1.2.0/24",
            "10.1.0.0/16",
            "10.0.0.0/8",
            "192.168.0.0/16",
        ]
    );
    assert_eq!(
        keys(trie.contained_first_iter(false)),
        vec![
            "192.168.0.0/16",
            "10.1.2.0/24",
            "10.1.0.0/16",
            "10.0.0.0/16",
            "10.0.0.0/8",
        ]
    );
    assert_eq!(
        keys(trie.containing_first_iter(false)),
        vec![
            "192.168.0.0/16",
            "10.0.0.0/8",
            "10.1.0.0/16",
            "10.1.2.0/24",
            "10.0.0.0/16",
        ]
    );
}

#[test]
fn containing_first_cache() {
    let trie = set(&[
        "10.0.0.0/8",
        "10.0.0.0/16",
        "10.1.0.0/16",
        "10.1.2.0/24",
        "192.168.0.0/16",
    ]);
    // every node records the key of its nearest added ancestor
    let mut parents = Vec::new();
    let mut iter = trie.containing_first_caching_iter::<Ipv4Net>(true);
    while let Some(node) = iter.next() {
        parents.push((
            node.key().to_string(),
            iter.cached().map(|k| k.to_string()),
        ));
        let key = *node.key();
        iter.cache_with_lower_sub_node(key);
        iter.cache_with_upper_sub_node(key);
    }
    let s = |x: &str| x.to_string();
    assert_eq!(
        parents,
        vec![
            (s("10.0.0.0/8"), None),
            (s("10.0.0.0/16"), Some(s("10.0.0.0/8"))),
            (s("10.1.0.0/16"), Some(s("10.0.0.0/8"))),
            (s("10.1.2.0/24"), Some(s("10.1.0.0/16"))),
            (s("192.168.0.0/16"), None),
        ]
    );
}

#[test]
fn cache_without_sub_node_is_dropped() {
    let trie = set(&["10.0.0.0/8"]);
    let mut iter = trie.containing_first_caching_iter::<u8>(true);
    assert!(iter.next().is_some());
    assert!(!iter.cache_with_lower_sub_node(1));
    assert!(!iter.cache_with_upper_sub_node(1));
    assert!(iter.next().is_none());
    assert_eq!(iter.cached(), None);
}

#[test]
fn added_nodes_tree() {
    let trie = set(&["1.2.0.0/16", "1.2.3.0/24", "1.2.4.0/24"]);
    let tree = trie.construct_added_nodes_tree();
    assert_eq!(tree.len(), 4);
    assert_eq!(
        format!("{tree:?}"),
        "○ 0.0.0.0/0\n└─● 1.2.0.0/16\n  ├─● 1.2.3.0/24\n  └─● 1.2.4.0/24\n"
    );
    let node = tree.get_node(&ip("1.2.0.0/16")).unwrap();
    assert!(node.is_added());
    let info = tree.as_trie().get(&ip("1.2.0.0/16")).unwrap();
    assert_eq!(info.sub_nodes(), &[ip("1.2.3.0/24"), ip("1.2.4.0/24")]);
    // branching nodes are not part of the summary
    assert!(tree.get_node(&ip("1.2.0.0/21")).is_none());
}

#[test]
fn added_nodes_tree_with_values() {
    let mut map = Map::new();
    map.put(ip("0.0.0.0/0"), 0);
    map.put(ip("10.0.0.0/8"), 1);
    map.put(ip("10.1.2.0/24"), 2);
    map.put(ip("192.168.0.0/16"), 3);
    let tree = map.construct_added_nodes_tree();
    let root = tree.root();
    assert!(root.is_added());
    assert_eq!(root.value(), Some(&0));
    let subs: Vec<_> = root.sub_nodes().iter().map(|n| *n.value().unwrap()).collect();
    assert_eq!(subs, vec![1, 3]);
    let deep = tree.get_node(&ip("10.0.0.0/8")).unwrap().sub_nodes();
    assert_eq!(deep.len(), 1);
    assert_eq!(deep[0].key(), &ip("10.1.2.0/24"));
    assert!(deep[0].sub_nodes().is_empty());
}

#[test]
fn navigation() {
    let trie = set(&["10.0.0.0/8", "10.1.0.0/16", "10.2.0.0/16"]);
    fn key(n: Option<TrieNode<'_, Ipv4Net, ()>>) -> Option<String> {
        n.map(|n| n.key().to_string())
    }
    let s = |x: &str| Some(x.to_string());

    let probe = ip("10.1.5.0/24");
    assert_eq!(key(trie.floor_added_node(&probe)), s("10.1.0.0/16"));
    assert_eq!(key(trie.lower_added_node(&probe)), s("10.1.0.0/16"));
    assert_eq!(key(trie.ceiling_added_node(&probe)), s("10.2.0.0/16"));
    assert_eq!(key(trie.higher_added_node(&probe)), s("10.2.0.0/16"));

    let probe = ip("10.1.0.0/16");
    assert_eq!(key(trie.floor_added_node(&probe)), s("10.1.0.0/16"));
    assert_eq!(key(trie.lower_added_node(&probe)), s("10.0.0.0/8"));
    assert_eq!(key(trie.ceiling_added_node(&probe)), s("10.1.0.0/16"));
    assert_eq!(key(trie.higher_added_node(&probe)), s("10.2.0.0/16"));

    assert_eq!(key(trie.lower_added_node(&ip("9.0.0.0/8"))), None);
    assert_eq!(
        key(trie.ceiling_added_node(&ip("9.0.0.0/8"))),
        s("10.0.0.0/8")
    );
    assert_eq!(
        key(trie.floor_added_node(&ip("11.0.0.0/8"))),
        s("10.2.0.0/16")
    );
    assert_eq!(key(trie.higher_added_node(&ip("11.0.0.0/8"))), None);

    assert_eq!(key(trie.first_added_node()), s("10.0.0.0/8"));
    assert_eq!(key(trie.last_added_node()), s("10.2.0.0/16"));
    let first = trie.first_added_node().unwrap();
    assert_eq!(key(first.next_added_node()), s("10.1.0.0/16"));
    assert_eq!(key(first.previous_added_node()), None);
}

#[test]
fn bounded_view() {
    let trie = set(&[
        "10.0.0.0/8",
        "10.1.0.0/16",
        "10.1.2.0/24",
        "10.2.0.0/16",
        "10.3.0.0/16",
    ]);
    let view = trie.create_sub_trie(ip("10.1.0.0/16")..=ip("10.2.0.0/16"));
    assert_eq!(
        keys(view.node_iter(true)),
        vec!["10.1.0.0/16", "10.1.2.0/24", "10.2.0.0/16"]
    );
    assert_eq!(
        keys(view.node_iter(false)),
        vec!["10.2.0.0/16", "10.1.2.0/24", "10.1.0.0/16"]
    );
    assert_eq!(view.size(), 3);
    assert!(!view.contains(&ip("10.0.0.0/8")));
    assert!(view.contains(&ip("10.1.2.0/24")));
    // the floor outside the range is clamped to the last node in range
    let floor = view.floor_added_node(&ip("10.3.5.0/24")).unwrap();
    assert_eq!(floor.key(), &ip("10.2.0.0/16"));
    assert!(view.lower_added_node(&ip("10.1.0.0/16")).is_none());
    let lpm = view.longest_prefix_match(&ip("10.1.2.3/32")).unwrap();
    assert_eq!(lpm.key(), &ip("10.1.2.0/24"));
    assert!(view.longest_prefix_match(&ip("10.5.0.0/16")).is_none());
    assert_eq!(view.clone_tree().len(), 3);
}

#[test]
fn bounded_view_mut() {
    let mut map = Map::new();
    map.put(ip("10.0.0.0/8"), 1);
    map.put(ip("10.1.0.0/16"), 2);
    map.put(ip("10.2.0.0/16"), 3);
    {
        let mut view = map.create_sub_trie_mut(ip("10.1.0.0/16")..ip("10.2.0.0/16"));
        assert!(!view.add(ip("10.2.0.0/16")));
        assert!(view.put_node(ip("11.0.0.0/8"), 9).is_none());
        assert!(view.get_mut(&ip("10.0.0.0/8")).is_none());
        *view.get_mut(&ip("10.1.0.0/16")).unwrap() += 10;
        assert!(view.add(ip("10.1.4.0/24")));
        assert_eq!(view.remove(&ip("10.2.0.0/16")), None);
        let removed = view
            .remove_elements_contained_by(&ip("10.0.0.0/8"))
            .unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(removed.get(&ip("10.1.0.0/16")), Some(&12));
    }
    assert_eq!(map.values().copied().collect::<Vec<_>>(), vec![1, 3]);
    assert_compact(&map);
}

#[test]
fn remap() {
    let mut map = Map::new();
    let key = ip("10.0.0.0/8");
    assert!(map.remap(key, |v| v.map(|x| x + 1)).is_none());
    assert!(map.is_empty());
    let node = map.remap(key, |v| Some(v.copied().unwrap_or(41) + 1)).unwrap();
    assert_eq!(node.value(), Some(&42));
    map.put(ip("10.1.0.0/16"), 5);
    assert!(map.remap(key, |_| None).is_none());
    assert_eq!(map.len(), 1);
    assert!(!map.contains(&key));
    assert_compact(&map);

    // an added node without a value is filled, but an existing value is kept
    map.add(key);
    map.remap_if_absent(key, || Some(7), false);
    assert_eq!(map.get(&key), Some(&7));
    map.remap_if_absent(key, || Some(8), false);
    assert_eq!(map.get(&key), Some(&7));
}

#[test]
fn remove_keeps_trie_compact() {
    let mut map = Map::new();
    for (i, k) in ["10.0.0.0/16", "10.1.0.0/16", "10.1.0.0/24", "10.1.1.0/24"]
        .iter()
        .enumerate()
    {
        map.put(ip(k), i as u32);
    }
    // root, 10.0.0.0/15, both /16 blocks, 10.1.0.0/23, both /24 blocks
    assert_eq!(map.node_size(), 7);
    assert_eq!(map.remove(&ip("10.1.0.0/24")), Some(2));
    assert_compact(&map);
    assert_eq!(map.node_size(), 5);
    assert_eq!(map.remove(&ip("10.1.0.0/16")), Some(1));
    assert_compact(&map);
    assert_eq!(map.node_size(), 4);
    assert_eq!(map.remove(&ip("10.0.0.0/16")), Some(0));
    assert_compact(&map);
    assert_eq!(map.node_size(), 2);
    assert_eq!(map.remove(&ip("10.1.1.0/24")), Some(3));
    assert_eq!(map.node_size(), 1);
    assert!(map.is_empty());
}

#[test]
fn remove_intersected() {
    let mut trie = set(&[
        "10.0.0.0/8",
        "10.1.0.0/16",
        "10.1.2.0/24",
        "10.2.0.0/16",
        "192.168.0.0/16",
    ]);
    let removed = trie
        .remove_elements_intersected_by(&ip("10.1.0.0/16"))
        .unwrap();
    assert_eq!(
        removed.iter().map(|k| k.to_string()).collect::<Vec<_>>(),
        vec!["10.0.0.0/8", "10.1.0.0/16", "10.1.2.0/24"]
    );
    assert_eq!(
        trie.iter().map(|k| k.to_string()).collect::<Vec<_>>(),
        vec!["10.2.0.0/16", "192.168.0.0/16"]
    );
    assert_compact(&trie.0);
    assert!(trie
        .remove_elements_intersected_by(&ip("172.16.0.0/12"))
        .is_none());
}

#[test]
fn remove_contained() {
    let mut trie = set(&["10.0.0.0/8", "10.1.0.0/16", "10.1.2.0/24", "10.2.0.0/16"]);
    let removed = trie
        .remove_elements_contained_by(&ip("10.0.0.0/14"))
        .unwrap();
    assert_eq!(removed.len(), 3);
    assert_eq!(trie.len(), 1);
    assert_eq!(trie.node_size(), 2);
    assert!(trie.remove_elements_contained_by(&ip("10.0.0.0/14")).is_none());
    // removing everything keeps the root
    trie.remove_elements_contained_by(&ip("0.0.0.0/0")).unwrap();
    assert!(trie.is_empty());
    assert_eq!(trie.node_size(), 1);
}

#[test]
fn retain_and_clear() {
    let mut map: Map = [
        (ip("10.0.0.0/8"), 1),
        (ip("10.1.0.0/16"), 2),
        (ip("10.2.0.0/16"), 3),
        (ip("10.2.1.0/24"), 4),
    ]
    .into_iter()
    .collect();
    map.retain(|_, v| v.map_or(false, |v| v % 2 == 0));
    assert_eq!(map.values().copied().collect::<Vec<_>>(), vec![2, 4]);
    assert_compact(&map);
    map.clear();
    assert!(map.is_empty());
    assert_eq!(map.bit_count(), None);
    assert_eq!(map.node_size(), 1);
}

#[test]
fn sub_trie_counts() {
    let trie = set(&["10.0.0.0/8", "10.1.0.0/16", "10.2.0.0/16"]);
    let node = trie.get_node(&ip("10.0.0.0/8")).unwrap();
    assert_eq!(node.size(), 3);
    assert_eq!(node.node_size(), 4);
    let branch = trie.get_node(&ip("10.0.0.0/14")).unwrap();
    assert!(!branch.is_added());
    assert!(trie.get_added_node(&ip("10.0.0.0/14")).is_none());
    assert_eq!(branch.parent().unwrap().key(), &ip("10.0.0.0/8"));
    let clone = branch.clone_tree();
    assert_eq!(clone.len(), 2);
    assert_eq!(trie.root().size(), 3);
}

#[test]
fn clone_and_eq() {
    let mut map = Map::new();
    map.put(ip("10.0.0.0/8"), 1);
    map.add(ip("10.1.0.0/16"));
    let copy = map.clone();
    assert_eq!(copy, map);
    let mut other = Map::new();
    other.put_trie(map.root());
    assert_eq!(other, map);
    assert_eq!(other.get(&ip("10.1.0.0/16")), None);
    assert!(other.contains(&ip("10.1.0.0/16")));
    other.put(ip("10.1.0.0/16"), 2);
    assert_ne!(other, map);
}

#[test]
fn map_iterators_skip_missing_values() {
    let mut map = Map::new();
    map.put(ip("10.0.0.0/8"), 1);
    map.add(ip("10.1.0.0/16"));
    map.put(ip("10.2.0.0/16"), 3);
    assert_eq!(map.len(), 3);
    assert_eq!(
        map.keys().map(|k| k.to_string()).collect::<Vec<_>>(),
        vec!["10.0.0.0/8", "10.2.0.0/16"]
    );
    map.values_mut().for_each(|v| *v *= 2);
    assert_eq!(
        map.clone().into_values().collect::<Vec<_>>(),
        vec![2, 6]
    );
    assert_eq!(map.node_iter(true).count(), 3);
}

#[test]
fn debug_output() {
    let mut map = Map::new();
    map.put(ip("10.0.0.0/8"), 1);
    assert_eq!(format!("{map:?}"), "{0.0.0.0/0: [{10.0.0.0/8: Some(1)}]}");
    let trie = set(&["10.0.0.0/8", "10.1.0.0/16"]);
    assert_eq!(format!("{trie:?}"), "{10.0.0.0/8, 10.1.0.0/16}");
}

#[test]
#[should_panic(expected = "cannot add a 128-bit key to a trie of 32-bit keys")]
fn mixed_bit_count_panics() {
    let mut trie: AddressTrie<IpNet> = AddressTrie::new();
    trie.add("10.0.0.0/8".parse().unwrap());
    trie.add("2001:db8::/32".parse().unwrap());
}

#[test]
fn mixed_bit_count_error() {
    let mut trie: AddressTrie<IpNet> = AddressTrie::new();
    assert_eq!(trie.bit_count(), None);
    assert_eq!(trie.try_add("10.0.0.0/8".parse().unwrap()), Ok(true));
    assert_eq!(trie.bit_count(), Some(32));
    let v6: IpNet = "2001:db8::/32".parse().unwrap();
    assert_eq!(
        trie.try_add(v6),
        Err(BitCountMismatch {
            expected: 32,
            actual: 128
        })
    );
    // lookups with another bit count find nothing
    assert!(!trie.contains(&v6));
    assert!(!trie.element_contains(&"::/0".parse().unwrap()));
    assert_eq!(trie.longest_prefix_match(&v6), None);
    // after clearing, the other family is accepted
    trie.clear();
    assert_eq!(trie.try_add(v6), Ok(true));
    assert_eq!(trie.bit_count(), Some(128));
}

#[test]
fn mac_addresses() {
    let mut trie: AssociativeAddressTrie<Key<u64>, &str> = AssociativeAddressTrie::new();
    trie.put(Key::block(0x001b21_000000, 48, 24), "vendor a");
    trie.put(Key::block(0x3c22fb_000000, 48, 24), "vendor b");
    trie.put(Key::exact(0x001b21_3a4f5e, 48), "host");
    assert_eq!(trie.bit_count(), Some(48));
    let lpm = trie.longest_prefix_match_value(&Key::exact(0x001b21_000001, 48));
    assert_eq!(lpm.map(|(_, v)| *v), Some("vendor a"));
    let lpm = trie.longest_prefix_match_value(&Key::exact(0x001b21_3a4f5e, 48));
    assert_eq!(lpm.map(|(_, v)| *v), Some("host"));
    assert_eq!(
        trie.values().copied().collect::<Vec<_>>(),
        vec!["vendor a", "host", "vendor b"]
    );
    // an exact address is the same as a full-length block
    assert!(trie.contains(&Key::block(0x001b21_3a4f5e, 48, 48)));
}
