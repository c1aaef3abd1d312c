//! Fragment ordering
//!
//! Fragments are read top to bottom by the topmost point of their bounding
//! polygon. Each fragment stays its own group: no proximity merging happens, so
//! the configured horizontal gap has no effect on the order.

use super::Fragment;

/// Sort fragments by vertical position, ascending. Ties keep detector order.
pub fn order_fragments(mut fragments: Vec<Fragment>) -> Vec<Fragment> {
    fragments.sort_by(|a, b| a.top().total_cmp(&b.top()));
    fragments
}
