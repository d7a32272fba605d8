mod arena;
mod avl;
mod bst;
mod node;
mod node_id;

pub(crate) use avl::RawAvlTree;
pub(crate) use bst::RawBst;
pub(crate) use node_id::NodeId;
