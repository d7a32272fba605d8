//! An arena-backed AVL tree map for Rust.
//!
//! This crate provides [`AvlTreeMap`], an ordered map with the familiar
//! `BTreeMap` vocabulary, backed by a height-balanced binary search tree.
//! Insertion, lookup and removal are O(log n) in the worst case, and the tree
//! height never exceeds about 1.44 log2(n).
//!
//! # Example
//!
//! ```
//! use avl_tree::{AvlTreeMap, KeyError};
//!
//! let mut scores = AvlTreeMap::new();
//! scores.insert("Alice", 100);
//! scores.insert("Bob", 85);
//! scores.insert("Carol", 92);
//!
//! assert_eq!(scores.get("Bob"), Some(&85));
//! assert_eq!(scores.len(), 3);
//!
//! // Re-inserting a key overwrites its value in place.
//! assert_eq!(scores.insert("Bob", 88), Some(85));
//!
//! // Strict lookups report missing keys as an error.
//! assert_eq!(scores.try_get("Dave"), Err(KeyError));
//!
//! // Removing an absent key is a no-op.
//! assert_eq!(scores.remove("Dave"), None);
//!
//! let names: Vec<_> = scores.keys().copied().collect();
//! assert_eq!(names, ["Alice", "Bob", "Carol"]);
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - Only requires `alloc`. The `std` feature
//!   forwards to `tracing` and `thiserror`.
//! - **Tracing** - Rotations and rebalancing decisions are emitted as
//!   `tracing` events at `TRACE` level; install a subscriber to see them.
//!
//! # Implementation
//!
//! Nodes live in a single arena and refer to their parent and children by
//! index. Each node stores a balance factor (right height minus left height).
//! After every structural edit a fix-up walks upward from the edited node,
//! adjusting balance factors and rotating until the tree is height-balanced
//! again. Removal of a node with two children first swaps it with its in-order
//! predecessor so that only nodes with at most one child are ever unlinked.

#![no_std]
// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod error;
mod raw;

pub mod avl_tree_map;

pub use avl_tree_map::AvlTreeMap;
pub use error::KeyError;
