//! The node table of an address trie. Nodes are addressed by their index; the root is always at
//! index 0.

use std::ops::{Index, IndexMut};

use log::trace;

use crate::{to_upper, AddressKey};

pub(crate) const ROOT: usize = 0;

#[derive(Clone)]
pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) added: bool,
    pub(crate) value: Option<V>,
    pub(crate) parent: Option<usize>,
    pub(crate) lower: Option<usize>,
    pub(crate) upper: Option<usize>,
}

impl<K, V> Node<K, V> {
    fn new(key: K, parent: Option<usize>) -> Self {
        Self {
            key,
            added: false,
            value: None,
            parent,
            lower: None,
            upper: None,
        }
    }

    pub(crate) fn num_children(&self) -> usize {
        self.lower.is_some() as usize + self.upper.is_some() as usize
    }
}

/// Node storage with a free list of released slots.
#[derive(Clone)]
pub(crate) struct Table<K, V> {
    nodes: Vec<Node<K, V>>,
    free: Vec<usize>,
}

impl<K, V> Index<usize> for Table<K, V> {
    type Output = Node<K, V>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.nodes[index]
    }
}

impl<K, V> IndexMut<usize> for Table<K, V> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.nodes[index]
    }
}

pub(crate) enum Direction {
    /// The key is already reached.
    Reached,
    /// Enter the next index and search again.
    Enter { next: usize, upper: bool },
    /// The node was not found.
    Missing,
}

pub(crate) enum DirectionForInsert<K> {
    /// The key is already reached.
    Reached,
    /// Enter the next index and search again.
    Enter { next: usize, upper: bool },
    /// Insert a new child at the given position as a leaf.
    NewLeaf { upper: bool },
    /// Insert a new child at the given position, moving the old child to be a child of the new
    /// node. `upper` tells where to insert the new node, while `child_upper` tells where to insert
    /// the old child (below the new node).
    NewChild { upper: bool, child_upper: bool },
    /// Insert a new branch at the parent with the given key. `upper` tells where to insert the
    /// branch, while `key_upper` tells where to insert the new node at the branch. The old child
    /// of the parent goes to `!key_upper` of the branch.
    NewBranch {
        branch_key: K,
        upper: bool,
        key_upper: bool,
    },
}

impl<K, V> Table<K, V> {
    pub(crate) fn with_root(key: K) -> Self {
        Self {
            nodes: vec![Node::new(key, None)],
            free: Vec::new(),
        }
    }

    /// Number of nodes that are linked into the tree.
    pub(crate) fn live(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [Node<K, V>] {
        &mut self.nodes
    }

    pub(crate) fn into_nodes(self) -> Vec<Node<K, V>> {
        self.nodes
    }

    /// Get the child of a node, either the lower or the upper one.
    #[inline(always)]
    pub(crate) fn get_child(&self, idx: usize, upper: bool) -> Option<usize> {
        if upper {
            self[idx].upper
        } else {
            self[idx].lower
        }
    }

    /// set the child of a node (either lower or upper), update the parent link of the child, and
    /// return the index of the old child.
    #[inline(always)]
    pub(crate) fn set_child(&mut self, idx: usize, child: usize, upper: bool) -> Option<usize> {
        self[child].parent = Some(idx);
        if upper {
            self[idx].upper.replace(child)
        } else {
            self[idx].lower.replace(child)
        }
    }

    /// remove a child from a node (just the reference).
    #[inline(always)]
    pub(crate) fn clear_child(&mut self, idx: usize, upper: bool) -> Option<usize> {
        if upper {
            self[idx].upper.take()
        } else {
            self[idx].lower.take()
        }
    }

    /// Whether `idx` is the upper child of its parent.
    pub(crate) fn is_upper_child(&self, idx: usize) -> bool {
        match self[idx].parent {
            Some(parent) => self[parent].upper == Some(idx),
            None => false,
        }
    }

    pub(crate) fn new_node(&mut self, key: K, parent: usize) -> usize {
        if let Some(idx) = self.free.pop() {
            self.nodes[idx] = Node::new(key, Some(parent));
            idx
        } else {
            let idx = self.nodes.len();
            self.nodes.push(Node::new(key, Some(parent)));
            idx
        }
    }

    /// Release a node that is no longer linked into the tree. Returns its value.
    pub(crate) fn free_node(&mut self, idx: usize) -> Option<V> {
        debug_assert_ne!(idx, ROOT, "the root is never released");
        let node = &mut self.nodes[idx];
        node.parent = None;
        node.lower = None;
        node.upper = None;
        node.added = false;
        self.free.push(idx);
        node.value.take()
    }

    /// Reset the table to only contain a root with the given key.
    pub(crate) fn reset(&mut self, key: K) {
        self.nodes.clear();
        self.free.clear();
        self.nodes.push(Node::new(key, None));
    }

    /// Pre-order successor of `idx`, without leaving the sub-trie rooted at `root`.
    pub(crate) fn next_in(&self, idx: usize, root: usize) -> Option<usize> {
        if let Some(lower) = self[idx].lower {
            return Some(lower);
        }
        if let Some(upper) = self[idx].upper {
            return Some(upper);
        }
        let mut cur = idx;
        while cur != root {
            let parent = self[cur].parent?;
            if self[parent].lower == Some(cur) {
                if let Some(upper) = self[parent].upper {
                    return Some(upper);
                }
            }
            cur = parent;
        }
        None
    }

    /// Pre-order predecessor of `idx`, without leaving the sub-trie rooted at `root`.
    pub(crate) fn prev_in(&self, idx: usize, root: usize) -> Option<usize> {
        if idx == root {
            return None;
        }
        let parent = self[idx].parent?;
        if self[parent].upper == Some(idx) {
            if let Some(lower) = self[parent].lower {
                return Some(self.last_in(lower));
            }
        }
        Some(parent)
    }

    /// The last node of the sub-trie rooted at `root` in pre-order.
    pub(crate) fn last_in(&self, root: usize) -> usize {
        let mut cur = root;
        loop {
            let node = &self[cur];
            match (node.lower, node.upper) {
                (_, Some(upper)) => cur = upper,
                (Some(lower), None) => cur = lower,
                (None, None) => return cur,
            }
        }
    }

    pub(crate) fn next_added_in(&self, idx: usize, root: usize) -> Option<usize> {
        let mut cur = idx;
        loop {
            cur = self.next_in(cur, root)?;
            if self[cur].added {
                return Some(cur);
            }
        }
    }

    pub(crate) fn prev_added_in(&self, idx: usize, root: usize) -> Option<usize> {
        let mut cur = idx;
        loop {
            cur = self.prev_in(cur, root)?;
            if self[cur].added {
                return Some(cur);
            }
        }
    }

    pub(crate) fn first_added_in(&self, root: usize) -> Option<usize> {
        if self[root].added {
            Some(root)
        } else {
            self.next_added_in(root, root)
        }
    }

    pub(crate) fn last_added_in(&self, root: usize) -> Option<usize> {
        let last = self.last_in(root);
        if self[last].added {
            Some(last)
        } else {
            self.prev_added_in(last, root)
        }
    }

    /// Indices of the sub-trie rooted at `root`, in pre-order.
    pub(crate) fn preorder(&self, root: usize) -> Vec<usize> {
        let mut result = Vec::new();
        let mut next = Some(root);
        while let Some(idx) = next {
            result.push(idx);
            next = self.next_in(idx, root);
        }
        result
    }
}

impl<K: AddressKey, V> Table<K, V> {
    /// Get the directions from some node `cur` to get to `key`.
    #[inline(always)]
    pub(crate) fn get_direction(&self, cur: usize, key: &K) -> Direction {
        let cur_k = &self[cur].key;
        if cur_k.key_eq(key) {
            Direction::Reached
        } else {
            let upper = to_upper(cur_k, key);
            match self.get_child(cur, upper) {
                Some(child) if self[child].key.contains(key) => {
                    Direction::Enter { next: child, upper }
                }
                _ => Direction::Missing,
            }
        }
    }

    /// Get the directions from some node `cur` to insert `key`.
    #[inline(always)]
    pub(crate) fn get_direction_for_insert(&self, cur: usize, key: &K) -> DirectionForInsert<K> {
        let cur_k = &self[cur].key;
        if cur_k.key_eq(key) {
            DirectionForInsert::Reached
        } else {
            let upper = to_upper(cur_k, key);
            if let Some(child) = self.get_child(cur, upper) {
                let child_k = &self[child].key;
                if child_k.contains(key) {
                    DirectionForInsert::Enter { next: child, upper }
                } else if key.contains(child_k) {
                    DirectionForInsert::NewChild {
                        upper,
                        child_upper: to_upper(key, child_k),
                    }
                } else {
                    let branch_key = key.longest_common_prefix(child_k);
                    let key_upper = to_upper(&branch_key, key);
                    DirectionForInsert::NewBranch {
                        branch_key,
                        upper,
                        key_upper,
                    }
                }
            } else {
                DirectionForInsert::NewLeaf { upper }
            }
        }
    }

    /// Find the node that holds `key`, or create it (together with a branching node if needed).
    /// The returned node is not yet marked as added.
    pub(crate) fn locate_or_create(&mut self, key: K) -> usize {
        let mut idx = ROOT;
        loop {
            match self.get_direction_for_insert(idx, &key) {
                DirectionForInsert::Enter { next, .. } => idx = next,
                DirectionForInsert::Reached => {
                    if !self[idx].added {
                        // implicit nodes take the caller's key
                        self[idx].key = key;
                    }
                    return idx;
                }
                DirectionForInsert::NewLeaf { upper } => {
                    let new = self.new_node(key, idx);
                    self.set_child(idx, new, upper);
                    trace!("created leaf node {new} below {idx}");
                    return new;
                }
                DirectionForInsert::NewChild { upper, child_upper } => {
                    let new = self.new_node(key, idx);
                    if let Some(child) = self.set_child(idx, new, upper) {
                        self.set_child(new, child, child_upper);
                    }
                    trace!("created node {new} between {idx} and its child");
                    return new;
                }
                DirectionForInsert::NewBranch {
                    branch_key,
                    upper,
                    key_upper,
                } => {
                    let branch_len = branch_key.block_len();
                    let branch = self.new_node(branch_key, idx);
                    let new = self.new_node(key, branch);
                    if let Some(child) = self.set_child(idx, branch, upper) {
                        self.set_child(branch, child, !key_upper);
                    }
                    self.set_child(branch, new, key_upper);
                    trace!("created node {new} with branch {branch} at prefix length {branch_len}");
                    return new;
                }
            }
        }
    }

    /// Find the node that exactly matches `key` (added or not).
    pub(crate) fn locate(&self, start: usize, key: &K) -> Option<usize> {
        if !self[start].key.contains(key) {
            return None;
        }
        let mut idx = start;
        loop {
            match self.get_direction(idx, key) {
                Direction::Reached => return Some(idx),
                Direction::Enter { next, .. } => idx = next,
                Direction::Missing => return None,
            }
        }
    }

    /// Find the root of the sub-trie of `start` whose nodes are all contained in `key`: either the
    /// node matching `key`, or the shallowest node below it.
    pub(crate) fn contained_root(&self, start: usize, key: &K) -> Option<usize> {
        let start_k = &self[start].key;
        if key.contains(start_k) {
            return Some(start);
        }
        if !start_k.contains(key) {
            return None;
        }
        let mut idx = start;
        loop {
            let cur_k = &self[idx].key;
            let child = self.get_child(idx, to_upper(cur_k, key))?;
            let child_k = &self[child].key;
            if key.contains(child_k) {
                return Some(child);
            } else if child_k.contains(key) {
                idx = child;
            } else {
                return None;
            }
        }
    }

    /// Remove `idx` from the tree structure if it is an implicit node that is no longer needed:
    /// a leaf is pruned, and a node with a single child is spliced out. The root is never
    /// removed.
    pub(crate) fn compact(&mut self, idx: usize) {
        if idx == ROOT || self[idx].added {
            return;
        }
        let Some(parent) = self[idx].parent else {
            return;
        };
        let upper = self[parent].upper == Some(idx);
        match (self[idx].lower, self[idx].upper) {
            (Some(_), Some(_)) => {}
            (None, None) => {
                self.clear_child(parent, upper);
                self.free_node(idx);
                trace!("pruned node {idx} below {parent}");
                self.compact(parent);
            }
            (Some(child), None) | (None, Some(child)) => {
                self.set_child(parent, child, upper);
                self.free_node(idx);
                trace!("spliced out node {idx} below {parent}");
            }
        }
    }

    /// Detach the sub-trie rooted at `idx` and release all its nodes, returning the added entries
    /// in pre-order. If `idx` is the root, it only loses its children and its entry.
    pub(crate) fn detach(&mut self, idx: usize) -> Vec<(K, Option<V>)> {
        let order = self.preorder(idx);
        let parent = self[idx].parent;
        let mut removed = Vec::new();
        for i in order {
            if self[i].added {
                removed.push((self[i].key.clone(), self[i].value.take()));
            }
            if i != ROOT {
                self.free_node(i);
            }
        }
        if idx == ROOT {
            let root = &mut self[ROOT];
            root.added = false;
            root.lower = None;
            root.upper = None;
        } else if let Some(parent) = parent {
            let upper = self[parent].upper == Some(idx);
            self.clear_child(parent, upper);
            trace!("detached sub-trie {idx} from {parent}");
            self.compact(parent);
        }
        removed
    }
}
