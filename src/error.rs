use thiserror::Error;

/// The error returned by [`AvlTreeMap::try_get`](crate::AvlTreeMap::try_get)
/// when the map holds no entry for the requested key.
///
/// # Examples
///
/// ```
/// use avl_tree::{AvlTreeMap, KeyError};
///
/// let map: AvlTreeMap<u32, &str> = AvlTreeMap::new();
/// assert_eq!(map.try_get(&7), Err(KeyError));
/// assert_eq!(KeyError.to_string(), "key not found");
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Error)]
#[error("key not found")]
pub struct KeyError;
