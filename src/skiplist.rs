//! Persistent skip list keyed by opaque byte strings.
//!
//! An ordered map holding full key/value bytes in place, built as a
//! multi-level skip list with forward and backward links at every level.
//! The structure lives on byte-addressable persistent memory: the level-0
//! forward chain is the durable spine, and every mutation of a level-0
//! forward link is written back through the injected [`CacheFlush`] before
//! the operation returns. Higher-level links are a volatile acceleration
//! structure that recovery rebuilds from the spine, so they are never
//! flushed.
//!
//! ```text
//! level 2:  HEAD ──────────────► c ──────────────────► TAIL
//! level 1:  HEAD ──────► b ────► c ──────► e ────────► TAIL
//! level 0:  HEAD ─► a ─► b ────► c ─► d ─► e ─► f ───► TAIL   (flushed)
//! ```
//!
//! Nodes are slots in an arena owned by the list; [`NodeRef`] handles are
//! indices into that arena, which models the persistent region. The two
//! sentinels occupy the first two slots and carry the maximum level, so
//! splice walks terminate on them without ever comparing their keys.
//!
//! The list is not thread-safe; callers serialize access externally, which
//! the `&mut self` mutation methods encode.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::mem;
use std::sync::Arc;

use crate::comparator::Comparator;
use crate::error::{Error, Result};
use crate::flush::CacheFlush;

/// Tallest tower a node can have.
pub const MAX_LEVEL: usize = 32;

/// Probability that a node's tower grows by one more level.
const BRANCH_PROBABILITY: f64 = 0.25;

/// Opaque handle to a node slot in the list's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef(u32);

const HEAD: NodeRef = NodeRef(0);
const TAIL: NodeRef = NodeRef(1);

impl NodeRef {
    #[inline]
    fn idx(self) -> usize {
        self.0 as usize
    }
}

struct Node {
    key: Vec<u8>,
    value: Vec<u8>,
    level: usize,
    next: Vec<NodeRef>,
    prev: Vec<NodeRef>,
}

impl Node {
    fn new(key: &[u8], value: &[u8], level: usize) -> Self {
        Self {
            key: key.to_vec(),
            value: value.to_vec(),
            level,
            next: vec![TAIL; level],
            prev: vec![HEAD; level],
        }
    }

    fn footprint(&self) -> usize {
        self.key.len() + self.value.len()
    }
}

/// Ordered byte-string map with crash-consistent level-0 links.
pub struct SkipList {
    arena: Vec<Node>,
    comparator: Arc<dyn Comparator>,
    flush: Arc<dyn CacheFlush>,
    max_level: usize,
    p: f64,
    current_level: usize,
    current_size: usize,
}

impl SkipList {
    /// Creates an empty list with the default tower height and branching
    /// probability.
    pub fn new(comparator: Arc<dyn Comparator>, flush: Arc<dyn CacheFlush>) -> Self {
        Self::build(comparator, flush, MAX_LEVEL, BRANCH_PROBABILITY)
    }

    /// Creates an empty list with a bounded tower height.
    pub fn with_max_level(
        comparator: Arc<dyn Comparator>,
        flush: Arc<dyn CacheFlush>,
        max_level: usize,
    ) -> Result<Self> {
        Self::with_max_level_and_p(comparator, flush, max_level, BRANCH_PROBABILITY)
    }

    /// Creates an empty list with a bounded tower height and a custom
    /// branching probability.
    pub fn with_max_level_and_p(
        comparator: Arc<dyn Comparator>,
        flush: Arc<dyn CacheFlush>,
        max_level: usize,
        p: f64,
    ) -> Result<Self> {
        if max_level == 0 || max_level > MAX_LEVEL {
            return Err(Error::InvalidInput(format!(
                "max level must be in 1..={MAX_LEVEL}, got {max_level}"
            )));
        }
        if !(p > 0.0 && p < 1.0) {
            return Err(Error::InvalidInput(format!(
                "branch probability must be in (0, 1), got {p}"
            )));
        }
        Ok(Self::build(comparator, flush, max_level, p))
    }

    fn build(
        comparator: Arc<dyn Comparator>,
        flush: Arc<dyn CacheFlush>,
        max_level: usize,
        p: f64,
    ) -> Self {
        // Sentinels first, at stable slots 0 and 1, linked to each other at
        // every level. Their keys stay empty and are never compared.
        let head = Node::new(b"", b"", max_level);
        let mut tail = Node::new(b"", b"", max_level);
        for slot in tail.next.iter_mut() {
            *slot = TAIL;
        }
        let list = Self {
            arena: vec![head, tail],
            comparator,
            flush,
            max_level,
            p,
            current_level: 0,
            current_size: 0,
        };
        list.flush_forward_link(HEAD);
        list
    }

    /// Adopts the level-0 chain `[first, last]` previously erased from
    /// `donor` as the contents of a fresh list.
    ///
    /// The chain's nodes move into the new list's arena in spine order,
    /// keeping their towers; head and tail are then re-bound level by
    /// level, walking each endpoint inward along the next-lower level
    /// until a node tall enough for the level is found. Link slots that
    /// pointed outside the chain are re-bound to the sentinels, so every
    /// walk is sentinel-bounded even when the chain is shorter than its
    /// claimed levels. `donor` keeps the remaining nodes; the moved slots
    /// are left as empty husks.
    pub fn adopt(
        comparator: Arc<dyn Comparator>,
        flush: Arc<dyn CacheFlush>,
        donor: &mut SkipList,
        first: NodeRef,
        last: NodeRef,
    ) -> Self {
        let mut list = Self::build(comparator, flush, donor.max_level, donor.p);

        // Collect the spine in order. The chain's own level-0 links are
        // intact after the erase that detached it.
        let mut chain = Vec::new();
        let mut cursor = first;
        loop {
            chain.push(cursor);
            if cursor == last || cursor == TAIL {
                debug_assert_eq!(cursor, last, "chain endpoints are not linked at level 0");
                break;
            }
            cursor = donor.node(cursor).next[0];
        }

        let mut remap = HashMap::with_capacity(chain.len());
        for (pos, &old) in chain.iter().enumerate() {
            remap.insert(old, NodeRef((pos + 2) as u32));
        }
        for &old in &chain {
            let node = donor.take_node(old);
            let next = node
                .next
                .iter()
                .map(|r| remap.get(r).copied().unwrap_or(TAIL))
                .collect();
            let prev = node
                .prev
                .iter()
                .map(|r| remap.get(r).copied().unwrap_or(HEAD))
                .collect();
            list.current_size += node.key.len() + node.value.len();
            list.arena.push(Node {
                key: node.key,
                value: node.value,
                level: node.level,
                next,
                prev,
            });
        }

        let mut left = remap[&first];
        let mut right = remap[&last];
        loop {
            let level = list.current_level;
            list.node_mut(HEAD).next[level] = left;
            list.node_mut(left).prev[level] = HEAD;
            list.node_mut(TAIL).prev[level] = right;
            list.node_mut(right).next[level] = TAIL;
            if level == 0 {
                list.flush_forward_link(HEAD);
            }
            list.current_level += 1;
            if list.current_level >= list.max_level {
                break;
            }
            // Step inward along the level below until both endpoints are
            // tall enough for the next level.
            while left != TAIL && list.node(left).level <= list.current_level {
                left = list.node(left).next[list.current_level - 1];
            }
            while right != HEAD && list.node(right).level <= list.current_level {
                right = list.node(right).prev[list.current_level - 1];
            }
            if left == TAIL || right == HEAD {
                break;
            }
        }
        list
    }

    /// Inserts a key/value pair, always creating a node; equal keys are
    /// admitted and the new node lands after the existing one at level 0.
    ///
    /// Returns a handle to the new node. The node's key and value bytes
    /// and every mutated level-0 forward link are flushed before return.
    pub fn insert(&mut self, key: &[u8], value: &[u8]) -> NodeRef {
        let found = self.find_greater_or_equal(key);
        let level = self.random_level();

        let mut next_node = found;
        let mut prev_node = self.node(found).prev[0];
        if found != TAIL && self.compare_key(found, key) == Ordering::Equal {
            // Keep equal keys in arrival order: splice after the duplicate.
            prev_node = found;
            next_node = self.node(found).next[0];
        }

        let new_node = self.alloc(Node::new(key, value, level));
        self.flush_payload(new_node);
        if level > self.current_level {
            self.current_level = level;
        }

        for i in 0..level {
            while self.node(next_node).level <= i {
                next_node = self.node(next_node).next[i - 1];
            }
            while self.node(prev_node).level <= i {
                prev_node = self.node(prev_node).prev[i - 1];
            }
            // Forward linking.
            self.node_mut(new_node).next[i] = next_node;
            self.node_mut(next_node).prev[i] = new_node;
            // Backward linking.
            self.node_mut(new_node).prev[i] = prev_node;
            self.node_mut(prev_node).next[i] = new_node;
            if i == 0 {
                self.flush_forward_link(new_node);
                self.flush_forward_link(prev_node);
            }
        }

        self.current_size += self.node(new_node).footprint();
        new_node
    }

    /// Returns the first node whose key compares equal, or `None`.
    pub fn find(&self, key: &[u8]) -> Option<NodeRef> {
        let node = self.find_greater_or_equal(key);
        if node != TAIL && self.compare_key(node, key) == Ordering::Equal {
            Some(node)
        } else {
            None
        }
    }

    /// Unlinks the inclusive node range `[first, last]` from every level.
    ///
    /// The endpoints must be live nodes of this list with `first` at or
    /// before `last` on the spine. Detached nodes keep their slots and
    /// their interior links; the caller may hand them to [`SkipList::adopt`]
    /// or let them go with the list. The tracked footprint is not
    /// decremented.
    pub fn erase(&mut self, first: NodeRef, last: NodeRef) {
        debug_assert!(first != HEAD && first != TAIL);
        debug_assert!(last != HEAD && last != TAIL);
        debug_assert!(
            self.comparator
                .compare(&self.node(first).key, &self.node(last).key)
                != Ordering::Greater
        );

        let mut left = self.node(first).prev[0];
        let mut right = self.node(last).next[0];
        for level in 0..self.current_level {
            self.node_mut(left).next[level] = right;
            self.node_mut(right).prev[level] = left;
            if level == 0 {
                self.flush_forward_link(left);
            }
            while self.node(left).level <= level + 1 {
                left = self.node(left).prev[level];
            }
            while self.node(right).level <= level + 1 {
                right = self.node(right).next[level];
            }
        }
        // Collapse levels emptied by the removal.
        while self.current_level > 0
            && self.node(HEAD).next[self.current_level - 1] == TAIL
            && self.node(TAIL).prev[self.current_level - 1] == HEAD
        {
            self.current_level -= 1;
        }
    }

    /// The head sentinel.
    pub fn head(&self) -> NodeRef {
        HEAD
    }

    /// The tail sentinel.
    pub fn tail(&self) -> NodeRef {
        TAIL
    }

    pub fn key(&self, node: NodeRef) -> &[u8] {
        &self.node(node).key
    }

    pub fn value(&self, node: NodeRef) -> &[u8] {
        &self.node(node).value
    }

    /// Forward link of `node` at `level`.
    pub fn next(&self, node: NodeRef, level: usize) -> NodeRef {
        self.node(node).next[level]
    }

    /// Backward link of `node` at `level`.
    pub fn prev(&self, node: NodeRef, level: usize) -> NodeRef {
        self.node(node).prev[level]
    }

    /// Total key and value bytes ever stored. Never decremented by
    /// [`SkipList::erase`], so the figure is an upper bound on live data.
    pub fn approximate_memory_usage(&self) -> usize {
        self.current_size
    }

    /// Iterates the live nodes along the level-0 spine in key order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            list: self,
            cursor: self.node(HEAD).next[0],
        }
    }

    fn find_greater_or_equal(&self, key: &[u8]) -> NodeRef {
        let mut node = HEAD;
        let mut i = self.current_level;
        while i > 0 {
            i -= 1;
            loop {
                let next = self.node(node).next[i];
                if next == TAIL || self.compare_key(next, key) != Ordering::Less {
                    break;
                }
                node = next;
            }
        }
        self.node(node).next[0]
    }

    fn random_level(&self) -> usize {
        let mut level = 1;
        while level < self.max_level && fastrand::f64() < self.p {
            level += 1;
        }
        level
    }

    #[inline]
    fn compare_key(&self, node: NodeRef, key: &[u8]) -> Ordering {
        self.comparator.compare(&self.node(node).key, key)
    }

    #[inline]
    fn node(&self, r: NodeRef) -> &Node {
        &self.arena[r.idx()]
    }

    #[inline]
    fn node_mut(&mut self, r: NodeRef) -> &mut Node {
        &mut self.arena[r.idx()]
    }

    fn alloc(&mut self, node: Node) -> NodeRef {
        let r = NodeRef(self.arena.len() as u32);
        self.arena.push(node);
        r
    }

    fn take_node(&mut self, r: NodeRef) -> Node {
        mem::replace(self.node_mut(r), Node::new(b"", b"", 1))
    }

    /// Writes back the level-0 forward-link slot of `node`. The spine is
    /// the only part of the graph recovery depends on.
    fn flush_forward_link(&self, node: NodeRef) {
        let slot = &self.node(node).next[0];
        self.flush
            .flush(slot as *const NodeRef as *const u8, mem::size_of::<NodeRef>());
    }

    /// Writes back the key and value bytes of a freshly built node.
    fn flush_payload(&self, node: NodeRef) {
        let n = self.node(node);
        self.flush.flush(n.key.as_ptr(), n.key.len());
        self.flush.flush(n.value.as_ptr(), n.value.len());
    }
}

/// Level-0 traversal of a [`SkipList`].
pub struct Iter<'a> {
    list: &'a SkipList,
    cursor: NodeRef,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a [u8], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == TAIL {
            return None;
        }
        let list: &'a SkipList = self.list;
        let node = list.node(self.cursor);
        self.cursor = node.next[0];
        Some((node.key.as_slice(), node.value.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparator::BytewiseComparator;
    use crate::flush::RecordingFlush;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::BTreeMap;

    fn new_list() -> (SkipList, Arc<RecordingFlush>) {
        let flush = Arc::new(RecordingFlush::new());
        let list = SkipList::new(Arc::new(BytewiseComparator), flush.clone());
        (list, flush)
    }

    fn keys(list: &SkipList) -> Vec<Vec<u8>> {
        list.iter().map(|(k, _)| k.to_vec()).collect()
    }

    /// Walks every active level asserting mutual pointer integrity and
    /// non-decreasing key order.
    fn check_integrity(list: &SkipList) {
        let cmp = BytewiseComparator;
        for level in 0..list.current_level {
            let mut node = list.head();
            loop {
                let next = list.next(node, level);
                assert_eq!(
                    list.prev(next, level),
                    node,
                    "broken back link at level {level}"
                );
                if next == list.tail() {
                    break;
                }
                if node != list.head() {
                    assert_ne!(
                        cmp.compare(list.key(node), list.key(next)),
                        Ordering::Greater,
                        "keys out of order at level {level}"
                    );
                }
                node = next;
            }
        }
    }

    #[test]
    fn test_empty_list() {
        let (list, _) = new_list();
        assert_eq!(list.next(list.head(), 0), list.tail());
        assert_eq!(list.prev(list.tail(), 0), list.head());
        assert!(list.find(b"a").is_none());
        assert_eq!(list.iter().count(), 0);
        assert_eq!(list.approximate_memory_usage(), 0);
        assert_eq!(list.current_level, 0);
    }

    #[test]
    fn test_constructor_validation() {
        let cmp: Arc<dyn Comparator> = Arc::new(BytewiseComparator);
        let flush: Arc<dyn CacheFlush> = Arc::new(RecordingFlush::new());
        assert!(SkipList::with_max_level(cmp.clone(), flush.clone(), 0).is_err());
        assert!(SkipList::with_max_level(cmp.clone(), flush.clone(), MAX_LEVEL + 1).is_err());
        assert!(SkipList::with_max_level_and_p(cmp.clone(), flush.clone(), 8, 0.0).is_err());
        assert!(SkipList::with_max_level_and_p(cmp.clone(), flush.clone(), 8, 1.0).is_err());
        assert!(SkipList::with_max_level_and_p(cmp, flush, 8, 0.5).is_ok());
    }

    #[test]
    fn test_insert_and_find() {
        let (mut list, _) = new_list();
        list.insert(b"a", b"1");
        list.insert(b"b", b"2");
        list.insert(b"c", b"3");

        let node = list.find(b"b").expect("key b should be present");
        assert_eq!(list.value(node), b"2");
        assert!(list.find(b"d").is_none());
        assert_eq!(keys(&list), vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
        check_integrity(&list);
    }

    #[test]
    fn test_insert_into_empty_list_links_spine() {
        let (mut list, _) = new_list();
        let node = list.insert(b"k", b"v");
        assert_eq!(list.next(list.head(), 0), node);
        assert_eq!(list.next(node, 0), list.tail());
        assert_eq!(list.prev(node, 0), list.head());
    }

    #[test]
    fn test_insert_unsorted_input_is_ordered() {
        let (mut list, _) = new_list();
        for key in [&b"d"[..], b"a", b"c", b"b", b"e"] {
            list.insert(key, b"x");
        }
        assert_eq!(
            keys(&list),
            vec![
                b"a".to_vec(),
                b"b".to_vec(),
                b"c".to_vec(),
                b"d".to_vec(),
                b"e".to_vec()
            ]
        );
        check_integrity(&list);
    }

    #[test]
    fn test_duplicate_keys_preserve_arrival_order() {
        let (mut list, _) = new_list();
        let older = list.insert(b"k", b"v1");
        let newer = list.insert(b"k", b"v2");

        // Two nodes for the same key, later insertion after the earlier.
        assert_eq!(list.next(older, 0), newer);
        let values: Vec<_> = list.iter().map(|(_, v)| v.to_vec()).collect();
        assert_eq!(values, vec![b"v1".to_vec(), b"v2".to_vec()]);

        // Find returns the first equal node.
        assert_eq!(list.find(b"k"), Some(older));
        check_integrity(&list);
    }

    #[test]
    fn test_size_accounting() {
        let (mut list, _) = new_list();
        list.insert(b"ab", b"xyz");
        assert_eq!(list.approximate_memory_usage(), 5);
        list.insert(b"c", b"");
        assert_eq!(list.approximate_memory_usage(), 6);
    }

    #[test]
    fn test_insert_flushes_payload_and_spine_links() {
        let (mut list, flush) = new_list();
        list.insert(b"b", b"2");

        flush.clear();
        let node = list.insert(b"a", b"11");

        let n_key = list.key(node);
        let n_value = list.value(node);
        let link = &list.node(node).next[0] as *const NodeRef as *const u8;
        let pred = list.prev(node, 0);
        let pred_link = &list.node(pred).next[0] as *const NodeRef as *const u8;

        // Payload first, then the two mutated level-0 forward links.
        let extents = flush.extents();
        assert_eq!(extents[0], (n_key.as_ptr() as usize, n_key.len()));
        assert_eq!(extents[1], (n_value.as_ptr() as usize, n_value.len()));
        assert!(flush.flushed(link, mem::size_of::<NodeRef>()));
        assert!(flush.flushed(pred_link, mem::size_of::<NodeRef>()));
        assert_eq!(extents.len(), 4);
    }

    #[test]
    fn test_erase_flushes_predecessor_link() {
        let (mut list, flush) = new_list();
        list.insert(b"a", b"1");
        let b = list.insert(b"b", b"2");
        let c = list.insert(b"c", b"3");

        let left = list.prev(b, 0);
        flush.clear();
        list.erase(b, c);

        let left_link = &list.node(left).next[0] as *const NodeRef as *const u8;
        assert!(flush.flushed(left_link, mem::size_of::<NodeRef>()));
    }

    #[test]
    fn test_erase_middle_range() {
        let (mut list, _) = new_list();
        let mut nodes = Vec::new();
        for key in [&b"a"[..], b"b", b"c", b"d", b"e"] {
            nodes.push(list.insert(key, key));
        }
        list.erase(nodes[1], nodes[3]);

        assert_eq!(keys(&list), vec![b"a".to_vec(), b"e".to_vec()]);
        assert!(list.find(b"c").is_none());
        assert_eq!(list.next(nodes[0], 0), nodes[4]);
        assert_eq!(list.prev(nodes[4], 0), nodes[0]);
        check_integrity(&list);
    }

    #[test]
    fn test_erase_full_range_collapses_levels() {
        let (mut list, _) = new_list();
        let a = list.insert(b"a", b"1");
        list.insert(b"b", b"2");
        let c = list.insert(b"c", b"3");

        list.erase(a, c);

        assert_eq!(list.current_level, 0);
        assert_eq!(list.iter().count(), 0);
        assert!(list.find(b"a").is_none());
        assert!(list.find(b"b").is_none());
        assert_eq!(list.next(list.head(), 0), list.tail());
    }

    #[test]
    fn test_erase_is_monotone_on_memory_usage() {
        let (mut list, _) = new_list();
        let a = list.insert(b"a", b"1");
        let b = list.insert(b"b", b"2");
        let before = list.approximate_memory_usage();
        list.erase(a, b);
        assert_eq!(list.approximate_memory_usage(), before);
    }

    #[test]
    fn test_current_level_exact_after_erase() {
        let (mut list, _) = new_list();
        let mut nodes = Vec::new();
        for i in 0..64u32 {
            nodes.push(list.insert(format!("{i:04}").as_bytes(), b"v"));
        }
        // Remove a prefix of the key space and check the collapse left
        // current_level at the tallest survivor.
        list.erase(nodes[0], nodes[39]);
        let tallest = nodes[40..]
            .iter()
            .map(|&n| list.node(n).level)
            .max()
            .unwrap();
        assert_eq!(list.current_level, tallest);
        check_integrity(&list);
    }

    #[test]
    fn test_adopt_erased_chain() {
        let flush = Arc::new(RecordingFlush::new());
        let cmp: Arc<dyn Comparator> = Arc::new(BytewiseComparator);
        let mut donor = SkipList::new(cmp.clone(), flush.clone());

        let mut nodes = Vec::new();
        for key in [&b"a"[..], b"b", b"c", b"d", b"e"] {
            nodes.push(donor.insert(key, key));
        }
        donor.erase(nodes[1], nodes[3]);

        let grafted = SkipList::adopt(cmp, flush, &mut donor, nodes[1], nodes[3]);

        assert_eq!(keys(&donor), vec![b"a".to_vec(), b"e".to_vec()]);
        assert_eq!(
            keys(&grafted),
            vec![b"b".to_vec(), b"c".to_vec(), b"d".to_vec()]
        );
        let b = grafted.find(b"b").expect("b should be in the grafted list");
        assert_eq!(grafted.value(b), b"b");
        assert!(grafted.find(b"a").is_none());
        assert_eq!(grafted.approximate_memory_usage(), 6);
        assert!(grafted.current_level >= 1);
        check_integrity(&grafted);
        check_integrity(&donor);
    }

    #[test]
    fn test_adopt_single_node_chain() {
        let flush = Arc::new(RecordingFlush::new());
        let cmp: Arc<dyn Comparator> = Arc::new(BytewiseComparator);
        let mut donor = SkipList::new(cmp.clone(), flush.clone());
        donor.insert(b"a", b"1");
        let b = donor.insert(b"b", b"2");
        donor.insert(b"c", b"3");
        donor.erase(b, b);

        let grafted = SkipList::adopt(cmp, flush, &mut donor, b, b);
        assert_eq!(keys(&grafted), vec![b"b".to_vec()]);
        assert_eq!(keys(&donor), vec![b"a".to_vec(), b"c".to_vec()]);
        check_integrity(&grafted);
    }

    #[test]
    fn test_randomized_against_btreemap() {
        let flush = Arc::new(RecordingFlush::new());
        let mut list = SkipList::new(Arc::new(BytewiseComparator), flush);
        let mut model = BTreeMap::new();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..512 {
            let key = format!("key-{:05}", rng.gen_range(0..100_000));
            let value = format!("value-{}", rng.gen_range(0..1_000));
            if model
                .insert(key.clone().into_bytes(), value.clone().into_bytes())
                .is_none()
            {
                list.insert(key.as_bytes(), value.as_bytes());
            }
        }

        for (key, value) in &model {
            let node = list.find(key).expect("model key missing from list");
            assert_eq!(list.value(node), value.as_slice());
        }
        let listed: Vec<_> = list.iter().map(|(k, _)| k.to_vec()).collect();
        let modeled: Vec<_> = model.keys().cloned().collect();
        assert_eq!(listed, modeled);
        check_integrity(&list);
    }

    #[test]
    fn test_randomized_erase_against_btreemap() {
        let flush = Arc::new(RecordingFlush::new());
        let mut list = SkipList::new(Arc::new(BytewiseComparator), flush);
        let mut rng = StdRng::seed_from_u64(11);

        let mut entries = Vec::new();
        for i in 0..256u32 {
            let key = format!("{i:04}").into_bytes();
            let node = list.insert(&key, b"v");
            entries.push((key, node));
        }

        // Erase a few contiguous runs, skipping any that touch nodes a
        // previous run already detached.
        let mut live: Vec<bool> = vec![true; entries.len()];
        for _ in 0..4 {
            let lo = rng.gen_range(0..entries.len() - 8);
            let hi = lo + rng.gen_range(1..8);
            if live[lo..=hi].iter().all(|&alive| alive) {
                list.erase(entries[lo].1, entries[hi].1);
                live[lo..=hi].iter_mut().for_each(|alive| *alive = false);
            }
        }

        let expected: Vec<_> = entries
            .iter()
            .zip(&live)
            .filter(|(_, &alive)| alive)
            .map(|((key, _), _)| key.clone())
            .collect();
        assert_eq!(keys(&list), expected);
        check_integrity(&list);
    }
}
