use alloc::vec::Vec;
use core::borrow::Borrow;

use tracing::trace;

use super::bst::{RawBst, Search};
use super::node::Side;
use super::node_id::NodeId;

/// The AVL tree backing `AvlTreeMap`.
///
/// Structural edits go through [`RawBst`]; this layer owns the balance
/// factors. Every mutation is followed by an upward fix-up so that each node
/// satisfies `|balance| <= 1` once the call returns.
#[derive(Clone)]
pub(crate) struct RawAvlTree<K, V> {
    bst: RawBst<K, V>,
}

impl<K, V> RawAvlTree<K, V> {
    pub(crate) const fn new() -> Self {
        Self { bst: RawBst::new() }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            bst: RawBst::with_capacity(capacity),
        }
    }

    pub(crate) const fn len(&self) -> usize {
        self.bst.len()
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.bst.is_empty()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.bst.capacity()
    }

    pub(crate) fn clear(&mut self) {
        self.bst.clear();
    }

    /// Read access to the node store, for lookups and iteration.
    #[inline]
    pub(crate) fn bst(&self) -> &RawBst<K, V> {
        &self.bst
    }

    #[inline]
    pub(crate) fn value_mut(&mut self, id: NodeId) -> &mut V {
        self.bst.value_mut(id)
    }

    /// Returns the key and a mutable value for the node at `id`.
    #[inline]
    pub(crate) fn entry_mut(&mut self, id: NodeId) -> (&K, &mut V) {
        self.bst.node_mut(id).entry_mut()
    }

    pub(crate) fn drain_in_order(&mut self) -> Vec<(K, V)> {
        self.bst.drain_in_order()
    }

    #[inline]
    fn balance(&self, id: NodeId) -> i8 {
        self.bst.node(id).balance()
    }

    #[inline]
    fn set_balance(&mut self, id: NodeId, balance: i8) {
        self.bst.node_mut(id).set_balance(balance);
    }

    /// The child a non-zero balance factor promises on `side`.
    fn heavy_child(&self, id: NodeId, side: Side) -> NodeId {
        self.bst
            .child(id, side)
            .expect("`RawAvlTree::heavy_child()` - balance factor names a missing subtree!")
    }

    /// Number of levels, found by following the taller side at each node.
    pub(crate) fn height(&self) -> usize {
        let mut height = 0;
        let mut current = self.bst.root();
        while let Some(id) = current {
            height += 1;
            current = if self.balance(id) > 0 {
                self.bst.right(id)
            } else {
                self.bst.left(id)
            };
        }
        height
    }

    /// Recomputes every subtree height and checks it against the stored
    /// balance factors and the AVL bound.
    pub(crate) fn is_balanced(&self) -> bool {
        self.bst.root().is_none_or(|root| self.checked_height(root).is_some())
    }

    fn checked_height(&self, id: NodeId) -> Option<usize> {
        let left = match self.bst.left(id) {
            Some(left) => self.checked_height(left)?,
            None => 0,
        };
        let right = match self.bst.right(id) {
            Some(right) => self.checked_height(right)?,
            None => 0,
        };
        #[allow(clippy::cast_possible_wrap)]
        let diff = right as isize - left as isize;
        (diff.abs() <= 1 && diff == isize::from(self.balance(id))).then_some(1 + left.max(right))
    }

    /// Rotates `n` down to the left, lifting its right child into its slot.
    ///
    /// ```text
    ///     n                c
    ///    / \              / \
    ///   a   c     =>     n   d
    ///      / \          / \
    ///     g   d        a   g
    /// ```
    ///
    /// Only relations change; balance factors are left to the caller.
    pub(crate) fn rotate_left(&mut self, n: NodeId) {
        trace!(node = n.to_index(), "rotate left");
        let parent = self.bst.parent(n);
        let side = self.bst.child_side(n);
        let c = self.heavy_child(n, Side::Right);
        let g = self.bst.left(c);

        self.bst.set_right(n, g);
        if let Some(g) = g {
            self.bst.set_parent(g, Some(n));
        }
        self.bst.set_left(c, Some(n));
        self.bst.set_parent(n, Some(c));
        self.bst.replace_child(parent, side.unwrap_or(Side::Left), Some(c));
    }

    /// Mirror of [`Self::rotate_left`]: lifts the left child of `n`.
    pub(crate) fn rotate_right(&mut self, n: NodeId) {
        trace!(node = n.to_index(), "rotate right");
        let parent = self.bst.parent(n);
        let side = self.bst.child_side(n);
        let c = self.heavy_child(n, Side::Left);
        let g = self.bst.right(c);

        self.bst.set_left(n, g);
        if let Some(g) = g {
            self.bst.set_parent(g, Some(n));
        }
        self.bst.set_right(c, Some(n));
        self.bst.set_parent(n, Some(c));
        self.bst.replace_child(parent, side.unwrap_or(Side::Right), Some(c));
    }

    /// Lifts the child of `n` on `side` into `n`'s slot.
    fn rotate_up(&mut self, n: NodeId, side: Side) {
        match side {
            Side::Left => self.rotate_right(n),
            Side::Right => self.rotate_left(n),
        }
    }

    /// `n` and `p` hang on the same side of their parents.
    pub(crate) fn is_zig_zig(&self, n: NodeId, p: NodeId, g: NodeId) -> bool {
        (self.bst.left(g) == Some(p) && self.bst.left(p) == Some(n))
            || (self.bst.right(g) == Some(p) && self.bst.right(p) == Some(n))
    }

    /// `n` and `p` hang on opposite sides of their parents.
    pub(crate) fn is_zig_zag(&self, n: NodeId, p: NodeId, g: NodeId) -> bool {
        (self.bst.left(g) == Some(p) && self.bst.right(p) == Some(n))
            || (self.bst.right(g) == Some(p) && self.bst.left(p) == Some(n))
    }

    /// Swaps the positions of `a` and `b` together with their balance factors.
    pub(crate) fn node_swap(&mut self, a: NodeId, b: NodeId) {
        self.bst.node_swap(a, b);
        let balance = self.balance(a);
        self.set_balance(a, self.balance(b));
        self.set_balance(b, balance);
    }

    /// Restores the invariant after `p`'s subtree grew through its child `n`.
    ///
    /// `p.balance` has already been updated and is non-zero.
    fn insert_fix(&mut self, mut p: NodeId, mut n: NodeId) {
        while let Some(g) = self.bst.parent(p) {
            let side = if self.bst.left(g) == Some(p) { Side::Left } else { Side::Right };
            let sign = side.sign();

            self.bst.node_mut(g).update_balance(sign);
            let balance = self.balance(g);
            if balance == 0 {
                return;
            }
            if balance == sign {
                n = p;
                p = g;
                continue;
            }

            // |g.balance| == 2: one or two rotations settle the subtree at
            // its height from before the insert.
            if self.is_zig_zig(n, p, g) {
                trace!(grandparent = g.to_index(), ?side, "insert zig-zig");
                self.rotate_up(g, side);
                self.set_balance(p, 0);
                self.set_balance(g, 0);
            } else {
                debug_assert!(self.is_zig_zag(n, p, g), "`RawAvlTree::insert_fix()` - unknown shape!");
                trace!(grandparent = g.to_index(), ?side, "insert zig-zag");
                let inner = self.balance(n);
                self.rotate_up(p, side.opposite());
                self.rotate_up(g, side);
                let (p_balance, g_balance) = if inner == sign {
                    (0, -sign)
                } else if inner == -sign {
                    (sign, 0)
                } else {
                    (0, 0)
                };
                self.set_balance(p, p_balance);
                self.set_balance(g, g_balance);
                self.set_balance(n, 0);
            }
            return;
        }
    }

    /// Restores the invariant after the subtree on one side of `node` lost a
    /// level. `diff` is `+1` when the left side shrank and `-1` for the right.
    fn remove_fix(&mut self, mut node: Option<NodeId>, mut diff: i8) {
        while let Some(n) = node {
            if diff == 0 {
                return;
            }

            let parent = self.bst.parent(n);
            let next_diff = self.bst.child_side(n).map_or(0, |side| -side.sign());

            // `heavy` is the side left taller by the shrink; `sign` its delta.
            let heavy = if diff < 0 { Side::Left } else { Side::Right };
            let sign = heavy.sign();
            let balance = self.balance(n) + diff;

            if balance == 2 * sign {
                let c = self.heavy_child(n, heavy);
                let c_balance = self.balance(c);
                if c_balance == sign {
                    trace!(node = n.to_index(), ?heavy, "remove single rotation");
                    self.rotate_up(n, heavy);
                    self.set_balance(n, 0);
                    self.set_balance(c, 0);
                } else if c_balance == 0 {
                    trace!(node = n.to_index(), ?heavy, "remove single rotation, height kept");
                    self.rotate_up(n, heavy);
                    self.set_balance(n, sign);
                    self.set_balance(c, -sign);
                    return;
                } else {
                    trace!(node = n.to_index(), ?heavy, "remove double rotation");
                    let g = self.heavy_child(c, heavy.opposite());
                    let g_balance = self.balance(g);
                    self.rotate_up(c, heavy.opposite());
                    self.rotate_up(n, heavy);
                    let (n_balance, c_balance) = if g_balance == -sign {
                        (0, sign)
                    } else if g_balance == sign {
                        (-sign, 0)
                    } else {
                        (0, 0)
                    };
                    self.set_balance(n, n_balance);
                    self.set_balance(c, c_balance);
                    self.set_balance(g, 0);
                }
            } else if balance == sign {
                self.set_balance(n, sign);
                return;
            } else {
                self.set_balance(n, 0);
            }

            node = parent;
            diff = next_diff;
        }
    }

    /// Unlinks and frees the node at `id`, rebalancing on the way up.
    pub(crate) fn remove_node(&mut self, id: NodeId) -> (K, V) {
        if self.bst.left(id).is_some() && self.bst.right(id).is_some() {
            let pred = self
                .bst
                .predecessor(id)
                .expect("`RawAvlTree::remove_node()` - left subtree has no maximum!");
            self.node_swap(id, pred);
        }

        // At most one child remains; after a swap it can only be on the left.
        let parent = self.bst.parent(id);
        let side = self.bst.child_side(id);
        let child = self.bst.left(id).or(self.bst.right(id));
        self.bst.replace_child(parent, side.unwrap_or(Side::Left), child);
        let diff = side.map_or(0, |side| -side.sign());

        let entry = self.bst.free(id);
        self.remove_fix(parent, diff);
        entry
    }

    /// Unlinks the first (smallest) entry.
    pub(crate) fn pop_first(&mut self) -> Option<(K, V)> {
        let first = self.bst.first()?;
        Some(self.remove_node(first))
    }

    /// Unlinks the last (largest) entry.
    pub(crate) fn pop_last(&mut self) -> Option<(K, V)> {
        let last = self.bst.last()?;
        Some(self.remove_node(last))
    }
}

impl<K: Ord, V> RawAvlTree<K, V> {
    /// Inserts a key-value pair, or overwrites the value of an existing key
    /// without touching the tree's shape. Returns the old value, if any.
    pub(crate) fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.bst.search(&key) {
            Search::Found(id) => Some(self.bst.set_value(id, value)),
            Search::Vacant { parent, side } => {
                let n = self.bst.attach(parent, side, key, value);
                if let Some(p) = parent {
                    self.bst.node_mut(p).update_balance(side.sign());
                    // A parent that was leaning the other way absorbs the new leaf.
                    if self.balance(p) != 0 {
                        self.insert_fix(p, n);
                    }
                }
                None
            }
        }
    }

    /// Removes `key`, returning its entry. An absent key is a no-op.
    pub(crate) fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let Some(id) = self.bst.find(key) else {
            trace!(len = self.len(), "remove of absent key");
            return None;
        };
        Some(self.remove_node(id))
    }
}
