use std::net::Ipv4Addr;

use address_trie::*;

use ipnet::Ipv4Net;
use rand::prelude::*;

fn main() {
    env_logger::init();

    let mut trie = AssociativeAddressTrie::<Ipv4Net, u32>::new();

    let mut rng = thread_rng();

    for _ in 0..1_000_000 {
        let prefix = Ipv4Net::new(Ipv4Addr::new(rng.gen(), 0, 0, 0), rng.gen_range(1..=8)).unwrap();
        let prefix = prefix.trunc();

        if rng.gen_bool(0.7) {
            let value: u32 = rng.gen::<u8>() as u32;
            trie.put(prefix, value);
        } else if rng.gen_bool(0.1) {
            // remove all blocks inside that prefix
            trie.remove_elements_contained_by(&prefix);
        } else if rng.gen_bool(0.5) {
            trie.remap(prefix, |v| v.map(|v| v / 2).filter(|v| *v > 0));
        } else {
            trie.remove(&prefix);
        }
    }

    let probe = Ipv4Net::new(Ipv4Addr::new(rng.gen(), rng.gen(), 0, 0), 16).unwrap();
    println!(
        "{} keys in {} nodes, longest match of {probe}: {:?}",
        trie.len(),
        trie.node_size(),
        trie.longest_prefix_match_value(&probe)
    );
}
