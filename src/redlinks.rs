use crate::models::Namespace;
use crate::store::GraphStore;
use std::collections::BTreeMap;

/// Counts links from main-namespace pages to pages that were never declared,
/// keyed by the missing page's prefixed title.
pub fn red_links(store: &GraphStore) -> BTreeMap<String, usize> {
    let mut wanted = BTreeMap::new();
    for (_, page) in store.iter() {
        if page.namespace() != Namespace::Main {
            continue;
        }
        for &target in &page.internal_links {
            let target = store.page(target);
            if target.id < 0 {
                *wanted.entry(target.full_title()).or_insert(0) += 1;
            }
        }
    }
    wanted
}

/// Red links ordered by descending count, ties broken by title.
pub fn most_wanted(wanted: &BTreeMap<String, usize>, limit: usize) -> Vec<(&str, usize)> {
    let mut entries: Vec<(&str, usize)> = wanted.iter().map(|(t, &c)| (t.as_str(), c)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    entries.truncate(limit);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Placeholder;

    #[test]
    fn counts_links_to_placeholders_from_main_pages() {
        let mut store = GraphStore::new();
        let a = store.create_page(Namespace::Main, "A", 1, false).unwrap();
        let b = store.create_page(Namespace::Main, "B", 2, false).unwrap();
        let talk = store.create_page(Namespace::Talk, "A", 3, false).unwrap();
        let (ghost, _) =
            store.resolve_or_synthesize(Namespace::Main, "Ghost", Placeholder::LinkTarget);
        let (tpl_ghost, _) =
            store.resolve_or_synthesize(Namespace::Template, "Gone", Placeholder::LinkTarget);

        store.add_link_edge(a, ghost);
        store.add_link_edge(b, ghost);
        store.add_link_edge(a, b);
        store.add_link_edge(a, tpl_ghost);
        store.add_link_edge(talk, ghost);

        let wanted = red_links(&store);
        assert_eq!(wanted.len(), 2);
        assert_eq!(wanted["Ghost"], 2);
        assert_eq!(wanted["Template:Gone"], 1);
    }

    #[test]
    fn most_wanted_orders_by_count() {
        let wanted: BTreeMap<String, usize> = [("B", 1), ("A", 1), ("C", 5)]
            .into_iter()
            .map(|(t, c)| (t.to_string(), c))
            .collect();
        assert_eq!(most_wanted(&wanted, 2), vec![("C", 5), ("A", 1)]);
    }
}
