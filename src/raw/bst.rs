use alloc::vec::Vec;
use core::borrow::Borrow;
use core::cmp::Ordering;

use super::arena::Arena;
use super::node::{Node, Side};
use super::node_id::NodeId;

/// Unbalanced binary search tree storage.
///
/// Owns every node through the arena and keeps the parent/left/right
/// relations consistent. It knows nothing about balancing; `RawAvlTree` drives
/// these primitives and repairs the balance factors afterwards.
#[derive(Clone)]
pub(crate) struct RawBst<K, V> {
    /// Arena storing all tree nodes.
    nodes: Arena<Node<K, V>>,
    /// Root node, if the tree is non-empty.
    root: Option<NodeId>,
}

/// Outcome of descending the tree for a key.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Search {
    /// A node already holds the key.
    Found(NodeId),
    /// The key is absent; it belongs in `parent`'s empty `side` slot, or at the
    /// root when `parent` is `None`.
    Vacant { parent: Option<NodeId>, side: Side },
}

impl<K, V> RawBst<K, V> {
    pub(crate) const fn new() -> Self {
        Self {
            nodes: Arena::new(),
            root: None,
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Arena::with_capacity(capacity),
            root: None,
        }
    }

    pub(crate) const fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.nodes.len() == 0
    }

    pub(crate) fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    #[inline]
    pub(crate) fn root(&self) -> Option<NodeId> {
        self.root
    }

    #[inline]
    pub(crate) fn node(&self, id: NodeId) -> &Node<K, V> {
        self.nodes.get(id)
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node<K, V> {
        self.nodes.get_mut(id)
    }

    #[inline]
    pub(crate) fn key(&self, id: NodeId) -> &K {
        self.node(id).key()
    }

    #[inline]
    pub(crate) fn value(&self, id: NodeId) -> &V {
        self.node(id).value()
    }

    #[inline]
    pub(crate) fn value_mut(&mut self, id: NodeId) -> &mut V {
        self.node_mut(id).value_mut()
    }

    /// Overwrites the value stored at `id`, returning the old one.
    pub(crate) fn set_value(&mut self, id: NodeId, value: V) -> V {
        self.node_mut(id).set_value(value)
    }

    #[inline]
    pub(crate) fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent()
    }

    #[inline]
    pub(crate) fn left(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).left()
    }

    #[inline]
    pub(crate) fn right(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).right()
    }

    #[inline]
    pub(crate) fn child(&self, id: NodeId, side: Side) -> Option<NodeId> {
        self.node(id).child(side)
    }

    #[inline]
    pub(crate) fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) {
        self.node_mut(id).set_parent(parent);
    }

    #[inline]
    pub(crate) fn set_left(&mut self, id: NodeId, left: Option<NodeId>) {
        self.node_mut(id).set_child(Side::Left, left);
    }

    #[inline]
    pub(crate) fn set_right(&mut self, id: NodeId, right: Option<NodeId>) {
        self.node_mut(id).set_child(Side::Right, right);
    }

    #[inline]
    pub(crate) fn set_child(&mut self, id: NodeId, side: Side, child: Option<NodeId>) {
        self.node_mut(id).set_child(side, child);
    }

    /// Returns which side of its parent `id` hangs on, or `None` for the root.
    pub(crate) fn child_side(&self, id: NodeId) -> Option<Side> {
        let parent = self.parent(id)?;
        if self.left(parent) == Some(id) {
            Some(Side::Left)
        } else {
            debug_assert_eq!(self.right(parent), Some(id), "`RawBst::child_side()` - broken parent link!");
            Some(Side::Right)
        }
    }

    /// Links `child` into `parent`'s `side` slot, or makes it the root when
    /// `parent` is `None`. Also points `child` back at `parent`.
    pub(crate) fn replace_child(&mut self, parent: Option<NodeId>, side: Side, child: Option<NodeId>) {
        match parent {
            Some(parent) => self.set_child(parent, side, child),
            None => self.root = child,
        }
        if let Some(child) = child {
            self.set_parent(child, parent);
        }
    }

    /// Allocates a new leaf and links it into a vacant slot.
    pub(crate) fn attach(&mut self, parent: Option<NodeId>, side: Side, key: K, value: V) -> NodeId {
        debug_assert!(
            parent.map_or(self.root.is_none(), |p| self.child(p, side).is_none()),
            "`RawBst::attach()` - slot is occupied!"
        );
        let id = self.nodes.alloc(Node::new(key, value, parent));
        self.replace_child(parent, side, Some(id));
        id
    }

    /// Releases a node that has already been unlinked from the tree.
    pub(crate) fn free(&mut self, id: NodeId) -> (K, V) {
        self.nodes.take(id).into_entry()
    }

    /// Leftmost node of the subtree rooted at `id`.
    pub(crate) fn min_of(&self, mut id: NodeId) -> NodeId {
        while let Some(left) = self.left(id) {
            id = left;
        }
        id
    }

    /// Rightmost node of the subtree rooted at `id`.
    pub(crate) fn max_of(&self, mut id: NodeId) -> NodeId {
        while let Some(right) = self.right(id) {
            id = right;
        }
        id
    }

    pub(crate) fn first(&self) -> Option<NodeId> {
        self.root.map(|root| self.min_of(root))
    }

    pub(crate) fn last(&self) -> Option<NodeId> {
        self.root.map(|root| self.max_of(root))
    }

    /// In-order predecessor of `id`.
    pub(crate) fn predecessor(&self, id: NodeId) -> Option<NodeId> {
        if let Some(left) = self.left(id) {
            return Some(self.max_of(left));
        }
        self.first_ancestor_from(id, Side::Right)
    }

    /// In-order successor of `id`.
    pub(crate) fn successor(&self, id: NodeId) -> Option<NodeId> {
        if let Some(right) = self.right(id) {
            return Some(self.min_of(right));
        }
        self.first_ancestor_from(id, Side::Left)
    }

    /// Walks up from `id` and returns the first ancestor reached through its
    /// `side` child.
    fn first_ancestor_from(&self, mut id: NodeId, side: Side) -> Option<NodeId> {
        while let Some(parent) = self.parent(id) {
            if self.child(parent, side) == Some(id) {
                return Some(parent);
            }
            id = parent;
        }
        None
    }

    /// Exchanges the structural positions of `a` and `b`.
    ///
    /// Every other node keeps its relations, apart from now pointing at the
    /// swapped node. Entries and balance factors stay with the node objects.
    pub(crate) fn node_swap(&mut self, a: NodeId, b: NodeId) {
        if a == b {
            return;
        }

        let a_side = self.child_side(a);
        let b_side = self.child_side(b);
        let (a_parent, a_left, a_right) = (self.parent(a), self.left(a), self.right(a));
        let (b_parent, b_left, b_right) = (self.parent(b), self.left(b), self.right(b));

        // Relations naming the other node must name this node after the swap.
        let swap = |x: Option<NodeId>| match x {
            Some(x) if x == a => Some(b),
            Some(x) if x == b => Some(a),
            other => other,
        };

        let a_node = self.node_mut(a);
        a_node.set_parent(swap(b_parent));
        a_node.set_child(Side::Left, swap(b_left));
        a_node.set_child(Side::Right, swap(b_right));

        let b_node = self.node_mut(b);
        b_node.set_parent(swap(a_parent));
        b_node.set_child(Side::Left, swap(a_left));
        b_node.set_child(Side::Right, swap(a_right));

        self.relink_neighbours(a, b, b_side);
        self.relink_neighbours(b, a, a_side);
    }

    /// Points the parent and children of `moved` back at it, skipping `other`,
    /// whose links were already written by the swap. `side` is the slot
    /// `moved` now occupies in its parent.
    fn relink_neighbours(&mut self, moved: NodeId, other: NodeId, side: Option<Side>) {
        match (self.parent(moved), side) {
            (Some(parent), Some(side)) if parent != other => self.set_child(parent, side, Some(moved)),
            (None, _) => self.root = Some(moved),
            _ => {}
        }
        for child in [self.left(moved), self.right(moved)].into_iter().flatten() {
            if child != other {
                self.set_parent(child, Some(moved));
            }
        }
    }

    /// Removes every node, returning the entries in key order.
    pub(crate) fn drain_in_order(&mut self) -> Vec<(K, V)> {
        let mut ids = Vec::with_capacity(self.len());
        let mut current = self.first();
        while let Some(id) = current {
            ids.push(id);
            current = self.successor(id);
        }

        let entries = ids.into_iter().map(|id| self.free(id)).collect();
        self.clear();
        entries
    }
}

impl<K: Ord, V> RawBst<K, V> {
    /// Descends from the root comparing against `key`.
    pub(crate) fn search<Q>(&self, key: &Q) -> Search
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let Some(mut current) = self.root else {
            return Search::Vacant {
                parent: None,
                side: Side::Left,
            };
        };

        loop {
            let side = match key.cmp(self.key(current).borrow()) {
                Ordering::Equal => return Search::Found(current),
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
            };
            match self.child(current, side) {
                Some(child) => current = child,
                None => {
                    return Search::Vacant {
                        parent: Some(current),
                        side,
                    };
                }
            }
        }
    }

    pub(crate) fn find<Q>(&self, key: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        match self.search(key) {
            Search::Found(id) => Some(id),
            Search::Vacant { .. } => None,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use alloc::vec;
    use proptest::prelude::*;

    impl<K: Ord, V> RawBst<K, V> {
        /// Inserts without any balancing, for building arbitrary shapes.
        /// Returns the old value for an existing key.
        pub(crate) fn insert(&mut self, key: K, value: V) -> Option<V> {
            match self.search(&key) {
                Search::Found(id) => Some(self.set_value(id, value)),
                Search::Vacant { parent, side } => {
                    self.attach(parent, side, key, value);
                    None
                }
            }
        }
    }

    fn build(keys: &[i32]) -> RawBst<i32, i32> {
        let mut bst = RawBst::new();
        for &key in keys {
            bst.insert(key, key * 10);
        }
        bst
    }

    fn id_of(bst: &RawBst<i32, i32>, key: i32) -> NodeId {
        bst.find(&key).expect("key is present")
    }

    fn key_of(bst: &RawBst<i32, i32>, id: Option<NodeId>) -> Option<i32> {
        id.map(|id| *bst.key(id))
    }

    fn in_order(bst: &RawBst<i32, i32>) -> Vec<i32> {
        let mut keys = Vec::new();
        let mut current = bst.first();
        while let Some(id) = current {
            keys.push(*bst.key(id));
            current = bst.successor(id);
        }
        keys
    }

    /// Checks that each child names its parent and the root has none.
    fn assert_links(bst: &RawBst<i32, i32>) {
        let Some(root) = bst.root() else { return };
        assert_eq!(bst.parent(root), None);
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            for child in [bst.left(id), bst.right(id)].into_iter().flatten() {
                assert_eq!(bst.parent(child), Some(id), "child {} of {}", bst.key(child), bst.key(id));
                stack.push(child);
            }
        }
    }

    #[test]
    fn search_reports_vacant_slot() {
        let bst = build(&[5, 3, 8]);
        assert_eq!(
            bst.search(&4),
            Search::Vacant {
                parent: Some(id_of(&bst, 3)),
                side: Side::Right
            }
        );
        assert_eq!(bst.search(&8), Search::Found(id_of(&bst, 8)));

        let empty: RawBst<i32, i32> = RawBst::new();
        assert_eq!(
            empty.search(&1),
            Search::Vacant {
                parent: None,
                side: Side::Left
            }
        );
    }

    #[test]
    fn insert_overwrites_existing_value() {
        let mut bst = build(&[2, 1, 3]);
        assert_eq!(bst.insert(1, 99), Some(10));
        assert_eq!(*bst.value(id_of(&bst, 1)), 99);
        assert_eq!(bst.len(), 3);
    }

    #[test]
    fn unbalanced_insert_builds_a_chain() {
        let bst = build(&[1, 2, 3]);
        let root = bst.root().unwrap();
        assert_eq!(*bst.key(root), 1);
        assert_eq!(key_of(&bst, bst.right(root)), Some(2));
        assert_eq!(bst.child_side(id_of(&bst, 3)), Some(Side::Right));
        assert_eq!(bst.child_side(root), None);
    }

    #[test]
    fn predecessor_and_successor_cross_subtrees() {
        //        50
        //      /    \
        //    30      70
        //      \    /
        //      40  60
        let bst = build(&[50, 30, 70, 40, 60]);
        assert_eq!(key_of(&bst, bst.predecessor(id_of(&bst, 50))), Some(40));
        assert_eq!(key_of(&bst, bst.successor(id_of(&bst, 40))), Some(50));
        assert_eq!(key_of(&bst, bst.predecessor(id_of(&bst, 60))), Some(50));
        assert_eq!(key_of(&bst, bst.successor(id_of(&bst, 50))), Some(60));
        assert_eq!(bst.predecessor(id_of(&bst, 30)), None);
        assert_eq!(bst.successor(id_of(&bst, 70)), None);
        assert_eq!(key_of(&bst, bst.first()), Some(30));
        assert_eq!(key_of(&bst, bst.last()), Some(70));
    }

    #[test]
    fn swap_with_distant_predecessor() {
        //        50
        //      /    \
        //    30      70
        //   /  \
        // 20    40
        //      /
        //    35
        let mut bst = build(&[50, 30, 70, 20, 40, 35]);
        let n = id_of(&bst, 50);
        let pred = bst.predecessor(n).unwrap();
        assert_eq!(*bst.key(pred), 40);

        bst.node_swap(n, pred);
        assert_links(&bst);

        // 40 now sits at the root and 50 where 40 was.
        assert_eq!(bst.root(), Some(pred));
        assert_eq!(key_of(&bst, bst.left(pred)), Some(30));
        assert_eq!(key_of(&bst, bst.right(pred)), Some(70));
        assert_eq!(key_of(&bst, bst.parent(n)), Some(30));
        assert_eq!(bst.right(id_of(&bst, 30)), Some(n));
        assert_eq!(key_of(&bst, bst.left(n)), Some(35));
        assert_eq!(bst.right(n), None);
    }

    #[test]
    fn swap_with_adjacent_child() {
        //    20
        //   /  \
        // 10    30
        let mut bst = build(&[20, 10, 30]);
        let (root, left) = (id_of(&bst, 20), id_of(&bst, 10));

        bst.node_swap(root, left);
        assert_links(&bst);

        assert_eq!(bst.root(), Some(left));
        assert_eq!(bst.left(left), Some(root));
        assert_eq!(key_of(&bst, bst.right(left)), Some(30));
        assert_eq!(bst.left(root), None);
        assert_eq!(bst.right(root), None);

        // Order of arguments does not matter.
        bst.node_swap(root, left);
        assert_links(&bst);
        assert_eq!(bst.root(), Some(root));
        assert_eq!(bst.left(root), Some(left));
    }

    #[test]
    fn swap_siblings_exchanges_slots() {
        let mut bst = build(&[20, 10, 30, 5, 35]);
        let (left, right) = (id_of(&bst, 10), id_of(&bst, 30));

        bst.node_swap(left, right);
        assert_links(&bst);

        let root = bst.root().unwrap();
        assert_eq!(bst.left(root), Some(right));
        assert_eq!(bst.right(root), Some(left));
        assert_eq!(key_of(&bst, bst.left(right)), Some(5));
        assert_eq!(key_of(&bst, bst.right(left)), Some(35));
    }

    #[test]
    fn drain_yields_sorted_entries() {
        let mut bst = build(&[4, 2, 6, 1, 3]);
        assert_eq!(bst.drain_in_order(), vec![(1, 10), (2, 20), (3, 30), (4, 40), (6, 60)]);
        assert!(bst.is_empty());
        assert_eq!(bst.root(), None);
    }

    proptest! {
        #[test]
        fn unbalanced_tree_stays_ordered(keys in prop::collection::vec(-500i32..500, 0..200)) {
            let bst = build(&keys);
            let mut expected = keys.clone();
            expected.sort_unstable();
            expected.dedup();

            prop_assert_eq!(in_order(&bst), expected.clone());
            prop_assert_eq!(bst.len(), expected.len());
            assert_links(&bst);

            let mut backwards = Vec::new();
            let mut current = bst.last();
            while let Some(id) = current {
                backwards.push(*bst.key(id));
                current = bst.predecessor(id);
            }
            backwards.reverse();
            prop_assert_eq!(backwards, expected);
        }

        #[test]
        fn swapping_any_pair_keeps_links(keys in prop::collection::vec(0i32..100, 2..60), x in any::<usize>(), y in any::<usize>()) {
            let mut bst = build(&keys);
            let ids: Vec<NodeId> = {
                let mut ids = Vec::new();
                let mut current = bst.first();
                while let Some(id) = current {
                    ids.push(id);
                    current = bst.successor(id);
                }
                ids
            };
            let (a, b) = (ids[x % ids.len()], ids[y % ids.len()]);
            let (a_parent, a_left, a_right) = (bst.parent(a), bst.left(a), bst.right(a));

            bst.node_swap(a, b);
            assert_links(&bst);
            prop_assert_eq!(bst.len(), ids.len());

            let rename = |x: Option<NodeId>| match x {
                Some(x) if x == a => Some(b),
                Some(x) if x == b => Some(a),
                other => other,
            };
            prop_assert_eq!(bst.parent(b), rename(a_parent));
            prop_assert_eq!(bst.left(b), rename(a_left));
            prop_assert_eq!(bst.right(b), rename(a_right));
        }
    }
}
