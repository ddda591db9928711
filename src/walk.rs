//! Category walks and single-pass page filters behind the selectors.

use crate::models::{Namespace, PageRef};
use crate::store::GraphStore;
use regex::Regex;
use rustc_hash::FxHashSet;
use std::collections::BTreeSet;
use tracing::debug;

/// Depth-first walk over the subcategories of `root`, calling `on_article`
/// once per article edge encountered. Each category expands at most once,
/// which is what makes the walk terminate on cyclic category graphs.
fn walk_category<F>(store: &GraphStore, root: PageRef, mut on_article: F) -> usize
where
    F: FnMut(PageRef),
{
    let mut visited = FxHashSet::default();
    let mut stack = vec![root];
    visited.insert(root);

    while let Some(category) = stack.pop() {
        let Some(members) = store.page(category).category.as_ref() else {
            continue;
        };
        for &article in &members.articles {
            on_article(article);
        }
        for &sub in members.subcategories.iter().rev() {
            if visited.insert(sub) {
                stack.push(sub);
            }
        }
    }
    visited.len()
}

/// All articles in `root` and, transitively, in its subcategories.
pub fn pages_in_category(store: &GraphStore, root: PageRef) -> BTreeSet<PageRef> {
    let mut pages = BTreeSet::new();
    let expanded = walk_category(store, root, |article| {
        pages.insert(article);
    });
    debug!(categories = expanded, pages = pages.len(), "Category walk complete");
    pages
}

/// Union of [`pages_in_category`] over every category whose title matches.
///
/// Each matching category gets a walk of its own, so overlapping subtrees
/// are explored again rather than cut short by an earlier walk.
pub fn pages_in_matching_categories(store: &GraphStore, pattern: &Regex) -> BTreeSet<PageRef> {
    let mut pages = BTreeSet::new();
    let mut matched = 0usize;
    for &category in store.categories() {
        if pattern.is_match(store.page(category).title()) {
            matched += 1;
            walk_category(store, category, |article| {
                pages.insert(article);
            });
        }
    }
    debug!(pattern = %pattern, categories = matched, pages = pages.len(), "Category regex walk complete");
    pages
}

/// Articles reached more than once while walking below `root`.
pub fn duplicate_pages_in_category(store: &GraphStore, root: PageRef) -> BTreeSet<PageRef> {
    let mut seen = FxHashSet::default();
    let mut duplicates = BTreeSet::new();
    walk_category(store, root, |article| {
        if !seen.insert(article) {
            duplicates.insert(article);
        }
    });
    duplicates
}

pub fn filter_namespace<I>(store: &GraphStore, universe: I, namespace: Namespace) -> BTreeSet<PageRef>
where
    I: IntoIterator<Item = PageRef>,
{
    universe
        .into_iter()
        .filter(|&page| store.page(page).namespace() == namespace)
        .collect()
}

pub fn filter_template<I>(store: &GraphStore, universe: I, template: PageRef) -> BTreeSet<PageRef>
where
    I: IntoIterator<Item = PageRef>,
{
    universe
        .into_iter()
        .filter(|&page| store.page(page).templates.contains(&template))
        .collect()
}

pub fn filter_links_to<I>(store: &GraphStore, universe: I, target: PageRef) -> BTreeSet<PageRef>
where
    I: IntoIterator<Item = PageRef>,
{
    universe
        .into_iter()
        .filter(|&page| store.page(page).internal_links.contains(&target))
        .collect()
}

pub fn filter_external_links<I>(store: &GraphStore, universe: I, pattern: &Regex) -> BTreeSet<PageRef>
where
    I: IntoIterator<Item = PageRef>,
{
    universe
        .into_iter()
        .filter(|&page| {
            store
                .page(page)
                .external_links
                .iter()
                .any(|url| pattern.is_match(url))
        })
        .collect()
}
