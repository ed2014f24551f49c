//! Deterministic ordering of rendered collections.
//!
//! Source lists and method lists are sorted by the byte-wise comparison of
//! their rendered text, so generated files do not depend on the order in
//! which an upstream extractor discovered things.

use crate::descriptor::Renderable;
use std::cmp::Ordering;

/// Compare two items by their rendered text, byte by byte.
pub fn compare_rendered<A, B>(a: &A, b: &B) -> Ordering
where
    A: Renderable + ?Sized,
    B: Renderable + ?Sized,
{
    a.rendered_form().as_bytes().cmp(b.rendered_form().as_bytes())
}

/// Sort items in place by their rendered text.
///
/// The sort is stable: items that render identically keep their input order.
///
/// # Examples
///
/// ```
/// use grpc_contract_core::ordering::sort_rendered;
///
/// let mut sources = vec!["b.sol".to_string(), "a.sol".to_string(), "B.sol".to_string()];
/// sort_rendered(&mut sources);
/// assert_eq!(sources, ["B.sol", "a.sol", "b.sol"]);
/// ```
pub fn sort_rendered<T: Renderable>(items: &mut [T]) {
    items.sort_by(compare_rendered);
}

/// Check whether items are already in rendered order.
pub fn is_sorted_rendered<T: Renderable>(items: &[T]) -> bool {
    items
        .windows(2)
        .all(|pair| compare_rendered(&pair[0], &pair[1]) != Ordering::Greater)
}
