//! Longest shortest-path searches over main-namespace internal links.
//!
//! Both searches measure distance the same way: following a link out of a
//! redirect is free, following a link out of any other page costs one step.

use crate::config::ALL_PAIRS_WARN_THRESHOLD;
use crate::models::{Namespace, PageRef};
use crate::store::GraphStore;
use rustc_hash::FxHashMap;
use std::collections::{BTreeSet, VecDeque};
use tracing::{debug, info, warn};

/// For every main-namespace page, the main-namespace pages linking to it.
#[derive(Debug, Default)]
pub struct ReverseLinkIndex {
    incoming: FxHashMap<PageRef, BTreeSet<PageRef>>,
    pages: Vec<PageRef>,
}

impl ReverseLinkIndex {
    pub fn build(store: &GraphStore) -> Self {
        let mut incoming: FxHashMap<PageRef, BTreeSet<PageRef>> = FxHashMap::default();
        let mut pages = Vec::new();
        let mut edges = 0usize;

        for (source, page) in store.iter() {
            if page.namespace() != Namespace::Main {
                continue;
            }
            pages.push(source);
            for &target in &page.internal_links {
                if store.page(target).namespace() == Namespace::Main {
                    incoming.entry(target).or_default().insert(source);
                    edges += 1;
                }
            }
        }

        info!(pages = pages.len(), edges, "Reverse link index built");
        Self { incoming, pages }
    }

    pub fn linking_to(&self, page: PageRef) -> impl Iterator<Item = PageRef> + '_ {
        self.incoming
            .get(&page)
            .into_iter()
            .flat_map(|sources| sources.iter().copied())
    }

    /// Main-namespace pages in handle order
    pub fn pages(&self) -> &[PageRef] {
        &self.pages
    }
}

/// The greatest distance found and every path achieving it, each listed from
/// its source page to its destination page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LongestPaths {
    pub distance: u32,
    pub paths: Vec<Vec<PageRef>>,
}

fn step_cost(store: &GraphStore, from: PageRef) -> u32 {
    if store.page(from).is_redirect {
        0
    } else {
        1
    }
}

/// Expands backwards from `destination` in order of increasing distance and
/// reports the pages farthest away, with the chain each one takes.
///
/// The chains are shortest paths to the destination; the result is the
/// maximum over pages of their shortest distance, not a longest simple path.
pub fn longest_path_to(
    store: &GraphStore,
    index: &ReverseLinkIndex,
    destination: PageRef,
) -> LongestPaths {
    let mut distance: FxHashMap<PageRef, u32> = FxHashMap::default();
    let mut parent: FxHashMap<PageRef, PageRef> = FxHashMap::default();
    let mut queue = VecDeque::new();

    distance.insert(destination, 0);
    queue.push_back(destination);

    while let Some(page) = queue.pop_front() {
        let depth = distance[&page];
        for source in index.linking_to(page) {
            let cost = step_cost(store, source);
            let candidate = depth + cost;
            if distance.get(&source).is_some_and(|&d| d <= candidate) {
                continue;
            }
            distance.insert(source, candidate);
            parent.insert(source, page);
            // redirect hops keep the depth, so they go to the front
            if cost == 0 {
                queue.push_front(source);
            } else {
                queue.push_back(source);
            }
        }
    }

    let max = distance.values().copied().max().unwrap_or(0);
    let mut farthest: Vec<PageRef> = distance
        .iter()
        .filter(|(_, &d)| d == max)
        .map(|(&page, _)| page)
        .collect();
    farthest.sort_unstable();

    let paths = farthest
        .into_iter()
        .map(|start| {
            let mut path = vec![start];
            let mut current = start;
            while let Some(&next) = parent.get(&current) {
                path.push(next);
                current = next;
            }
            path
        })
        .collect();

    debug!(reached = distance.len(), distance = max, "Longest path search complete");
    LongestPaths {
        distance: max,
        paths,
    }
}

const NO_PATH: u32 = u32::MAX;

/// All-pairs shortest distances (Floyd–Warshall) over main-namespace pages,
/// returning the largest finite distance between two distinct pages and the
/// path of every pair achieving it.
///
/// Uses two n×n matrices, so memory grows quadratically with the number of
/// pages; only practical for moderately sized page sets.
pub fn globally_longest_path(store: &GraphStore, index: &ReverseLinkIndex) -> LongestPaths {
    let pages = index.pages();
    let n = pages.len();
    if n > ALL_PAIRS_WARN_THRESHOLD {
        warn!(
            pages = n,
            matrix_bytes = (n as u64) * (n as u64) * 8,
            "All-pairs search over a large page set"
        );
    }

    let position: FxHashMap<PageRef, usize> =
        pages.iter().enumerate().map(|(i, &p)| (p, i)).collect();
    let mut dist = vec![NO_PATH; n * n];
    let mut next = vec![NO_PATH; n * n];

    for i in 0..n {
        dist[i * n + i] = 0;
        next[i * n + i] = i as u32;
    }
    for (j, &target) in pages.iter().enumerate() {
        for source in index.linking_to(target) {
            let i = position[&source];
            if i == j {
                continue;
            }
            let cost = step_cost(store, source);
            if cost < dist[i * n + j] {
                dist[i * n + j] = cost;
                next[i * n + j] = j as u32;
            }
        }
    }

    for k in 0..n {
        for i in 0..n {
            let dik = dist[i * n + k];
            if dik == NO_PATH {
                continue;
            }
            for j in 0..n {
                let dkj = dist[k * n + j];
                if dkj == NO_PATH {
                    continue;
                }
                let through = dik + dkj;
                if through < dist[i * n + j] {
                    dist[i * n + j] = through;
                    next[i * n + j] = next[i * n + k];
                }
            }
        }
    }

    let mut best = LongestPaths::default();
    for i in 0..n {
        for j in 0..n {
            let d = dist[i * n + j];
            if i == j || d == NO_PATH {
                continue;
            }
            if d > best.distance {
                best.distance = d;
                best.paths.clear();
            }
            if d == best.distance {
                best.paths.push(reconstruct(&next, n, i, j, pages));
            }
        }
    }

    debug!(pages = n, distance = best.distance, pairs = best.paths.len(), "All-pairs search complete");
    best
}

fn reconstruct(next: &[u32], n: usize, from: usize, to: usize, pages: &[PageRef]) -> Vec<PageRef> {
    let mut path = vec![pages[from]];
    let mut current = from;
    while current != to && path.len() <= n {
        current = next[current * n + to] as usize;
        path.push(pages[current]);
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn main_page(store: &mut GraphStore, title: &str, id: i64, redirect: bool) -> PageRef {
        store.create_page(Namespace::Main, title, id, redirect).unwrap()
    }

    #[test]
    fn reverse_index_is_main_namespace_only() {
        let mut store = GraphStore::new();
        let a = main_page(&mut store, "A", 1, false);
        let b = main_page(&mut store, "B", 2, false);
        let talk = store.create_page(Namespace::Talk, "A", 3, false).unwrap();
        store.add_link_edge(b, a);
        store.add_link_edge(talk, a);
        store.add_link_edge(a, talk);

        let index = ReverseLinkIndex::build(&store);
        assert_eq!(index.linking_to(a).collect::<Vec<_>>(), vec![b]);
        assert_eq!(index.linking_to(talk).count(), 0);
        assert_eq!(index.pages(), &[a, b]);
    }

    #[test]
    fn single_link_pair() {
        let mut store = GraphStore::new();
        let p1 = main_page(&mut store, "P1", 1, false);
        let p2 = main_page(&mut store, "P2", 2, false);
        store.add_link_edge(p2, p1);
        let index = ReverseLinkIndex::build(&store);

        let global = globally_longest_path(&store, &index);
        assert_eq!(global.distance, 1);
        assert_eq!(global.paths, vec![vec![p2, p1]]);

        let to_p1 = longest_path_to(&store, &index, p1);
        assert_eq!(to_p1.distance, 1);
        assert_eq!(to_p1.paths, vec![vec![p2, p1]]);
    }

    #[test]
    fn redirects_are_free_hops() {
        // A -> R (redirect) -> D
        let mut store = GraphStore::new();
        let a = main_page(&mut store, "A", 1, false);
        let r = main_page(&mut store, "R", 2, true);
        let d = main_page(&mut store, "D", 3, false);
        store.add_link_edge(a, r);
        store.add_link_edge(r, d);
        let index = ReverseLinkIndex::build(&store);

        let result = longest_path_to(&store, &index, d);
        assert_eq!(result.distance, 1);
        assert_eq!(result.paths, vec![vec![a, r, d]]);

        let global = globally_longest_path(&store, &index);
        assert_eq!(global.distance, 1);
        assert_eq!(global.paths, vec![vec![a, r], vec![a, r, d]]);
    }

    #[test]
    fn shortest_chain_wins_over_longer_detour() {
        // A -> B -> C -> D and A -> D
        let mut store = GraphStore::new();
        let a = main_page(&mut store, "A", 1, false);
        let b = main_page(&mut store, "B", 2, false);
        let c = main_page(&mut store, "C", 3, false);
        let d = main_page(&mut store, "D", 4, false);
        store.add_link_edge(a, b);
        store.add_link_edge(b, c);
        store.add_link_edge(c, d);
        store.add_link_edge(a, d);
        let index = ReverseLinkIndex::build(&store);

        let result = longest_path_to(&store, &index, d);
        assert_eq!(result.distance, 2);
        assert_eq!(result.paths, vec![vec![b, c, d]]);

        let global = globally_longest_path(&store, &index);
        assert_eq!(global.distance, 2);
        assert_eq!(global.paths, vec![vec![a, b, c], vec![b, c, d]]);
    }

    #[test]
    fn every_farthest_page_gets_a_path() {
        let mut store = GraphStore::new();
        let d = main_page(&mut store, "D", 1, false);
        let x = main_page(&mut store, "X", 2, false);
        let y = main_page(&mut store, "Y", 3, false);
        store.add_link_edge(x, d);
        store.add_link_edge(y, d);
        let index = ReverseLinkIndex::build(&store);

        let result = longest_path_to(&store, &index, d);
        assert_eq!(result.distance, 1);
        assert_eq!(result.paths, vec![vec![x, d], vec![y, d]]);
    }

    #[test]
    fn cycles_terminate() {
        let mut store = GraphStore::new();
        let a = main_page(&mut store, "A", 1, false);
        let b = main_page(&mut store, "B", 2, false);
        store.add_link_edge(a, b);
        store.add_link_edge(b, a);
        let index = ReverseLinkIndex::build(&store);

        let result = longest_path_to(&store, &index, a);
        assert_eq!(result.paths, vec![vec![b, a]]);
        let global = globally_longest_path(&store, &index);
        assert_eq!(global.distance, 1);
        assert_eq!(global.paths.len(), 2);
    }

    #[test]
    fn unlinked_destination_is_its_own_path() {
        let mut store = GraphStore::new();
        let lonely = main_page(&mut store, "Lonely", 1, false);
        let index = ReverseLinkIndex::build(&store);

        let result = longest_path_to(&store, &index, lonely);
        assert_eq!(result.distance, 0);
        assert_eq!(result.paths, vec![vec![lonely]]);

        let global = globally_longest_path(&store, &index);
        assert_eq!(global, LongestPaths::default());
    }
}
