//! Cycle detection over the subcategory graph.

use crate::models::PageRef;
use crate::store::GraphStore;
use rustc_hash::FxHashSet;
use tracing::debug;

struct Frame {
    category: PageRef,
    children: Vec<PageRef>,
    next: usize,
}

impl Frame {
    fn new(store: &GraphStore, category: PageRef) -> Self {
        let children = store
            .page(category)
            .category
            .as_ref()
            .map(|members| members.subcategories.iter().copied().collect())
            .unwrap_or_default();
        Self {
            category,
            children,
            next: 0,
        }
    }
}

/// Finds subcategory cycles reachable from `root`.
///
/// Each cycle starts at the category the back edge points to and follows the
/// DFS stack down to the category that closed it. Once a category is part of
/// a reported cycle its outgoing edges are no longer followed, so a category
/// sitting on two cycles only shows up in the first one found.
pub fn find_category_cycles(store: &GraphStore, root: PageRef) -> Vec<Vec<PageRef>> {
    let mut cycles = Vec::new();
    let mut on_stack = FxHashSet::default();
    let mut visited = FxHashSet::default();
    let mut confirmed = FxHashSet::default();
    let mut walked_edges = FxHashSet::default();

    let mut stack = vec![Frame::new(store, root)];
    on_stack.insert(root);
    visited.insert(root);

    while let Some(frame) = stack.last_mut() {
        let category = frame.category;
        if confirmed.contains(&category) || frame.next >= frame.children.len() {
            on_stack.remove(&category);
            stack.pop();
            continue;
        }
        let child = frame.children[frame.next];
        frame.next += 1;

        if !walked_edges.insert((category, child)) || confirmed.contains(&child) {
            continue;
        }

        if on_stack.contains(&child) {
            if let Some(start) = stack.iter().position(|f| f.category == child) {
                let cycle: Vec<PageRef> = stack[start..].iter().map(|f| f.category).collect();
                debug!(length = cycle.len(), "Category cycle found");
                confirmed.extend(cycle.iter().copied());
                cycles.push(cycle);
            }
            continue;
        }

        if visited.insert(child) {
            on_stack.insert(child);
            stack.push(Frame::new(store, child));
        }
    }

    cycles
}
