//! The query engine: graph store, lazy loads, working set and variables.

use crate::command::Fixup;
use crate::cycles;
use crate::diagnostics::DiagnosticSink;
use crate::error::{GraphError, Result};
use crate::loader::Loader;
use crate::models::{normalize_category_title, normalize_title, Namespace, PageRef};
use crate::paths::{self, LongestPaths, ReverseLinkIndex};
use crate::redlinks;
use crate::selector::{Operator, Selector};
use crate::source::RowProvider;
use crate::store::GraphStore;
use crate::walk;
use rustc_hash::FxHashSet;
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

/// The pages a universe-sensitive selector filters
#[derive(Debug, Clone, Copy)]
pub enum Universe<'a> {
    All,
    Pages(&'a BTreeSet<PageRef>),
}

impl<'a> Universe<'a> {
    fn pages(self, store: &'a GraphStore) -> Box<dyn Iterator<Item = PageRef> + 'a> {
        match self {
            Universe::All => Box::new(store.refs()),
            Universe::Pages(pages) => Box::new(pages.iter().copied()),
        }
    }
}

pub struct Engine {
    store: GraphStore,
    loader: Loader,
    working: BTreeSet<PageRef>,
    variables: BTreeMap<String, BTreeSet<PageRef>>,
    reverse_links: Option<ReverseLinkIndex>,
}

impl Engine {
    pub fn new(provider: impl RowProvider + 'static) -> Self {
        Self {
            store: GraphStore::new(),
            loader: Loader::new(Box::new(provider)),
            working: BTreeSet::new(),
            variables: BTreeMap::new(),
            reverse_links: None,
        }
    }

    /// Routes load diagnostics to `sink` instead of `tracing`.
    pub fn with_sink(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.loader.set_sink(Box::new(sink));
        self
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn loader(&self) -> &Loader {
        &self.loader
    }

    pub fn load_pages(&mut self) -> Result<()> {
        self.loader.load_pages(&mut self.store)
    }

    pub fn load_category_links(&mut self) -> Result<()> {
        self.load_pages()?;
        self.loader.load_category_links(&mut self.store)
    }

    pub fn load_template_links(&mut self) -> Result<()> {
        self.load_pages()?;
        self.loader.load_template_links(&mut self.store)
    }

    pub fn load_page_links(&mut self) -> Result<()> {
        self.load_pages()?;
        self.loader.load_page_links(&mut self.store)
    }

    pub fn load_external_links(&mut self) -> Result<()> {
        self.load_pages()?;
        self.loader.load_external_links(&mut self.store)
    }

    pub fn load_page_views(&mut self, projects: &FxHashSet<String>) -> Result<()> {
        self.load_pages()?;
        self.loader.load_page_views(&mut self.store, projects)
    }

    /// Applies post-load corrections; loads category links first.
    pub fn apply_fixups(&mut self, fixups: &[Fixup]) -> Result<()> {
        self.load_category_links()?;
        for fixup in fixups {
            match fixup {
                Fixup::DetachCategory {
                    namespace,
                    title,
                    category,
                } => {
                    let page = self.find_page(*namespace, title)?;
                    let category_page = self.find_category(category)?;
                    self.store.remove_category_edge(page, category_page)?;
                    info!(page = %namespace.prefixed(title), category = %category, "Detached page from category");
                }
            }
        }
        Ok(())
    }

    fn find_page(&self, namespace: Namespace, title: &str) -> Result<PageRef> {
        self.store
            .lookup(namespace, title)
            .ok_or_else(|| GraphError::PageNotFound(namespace.prefixed(title)))
    }

    fn find_category(&self, title: &str) -> Result<PageRef> {
        self.find_page(Namespace::Category, title)
    }

    /// Triggers the loads a selector depends on.
    fn prepare(&mut self, selector: &Selector) -> Result<()> {
        self.load_pages()?;
        match selector {
            Selector::InCategory { .. }
            | Selector::InMatchingCategories { .. }
            | Selector::DuplicatesInCategory { .. } => self.load_category_links(),
            Selector::InNamespace { .. } => Ok(()),
            Selector::LinkingToTemplate { .. } => self.load_template_links(),
            Selector::LinkingToPage { .. } => self.load_page_links(),
            Selector::ExternalLinkMatching { .. } => self.load_external_links(),
        }
    }

    fn evaluate_prepared(
        &self,
        selector: &Selector,
        universe: Universe<'_>,
    ) -> Result<BTreeSet<PageRef>> {
        let store = &self.store;
        let result = match selector {
            Selector::InCategory { title } => {
                walk::pages_in_category(store, self.find_category(title)?)
            }
            Selector::InMatchingCategories { pattern } => {
                walk::pages_in_matching_categories(store, pattern)
            }
            Selector::DuplicatesInCategory { title } => {
                walk::duplicate_pages_in_category(store, self.find_category(title)?)
            }
            Selector::InNamespace { namespace } => {
                walk::filter_namespace(store, universe.pages(store), *namespace)
            }
            Selector::LinkingToTemplate { namespace, title } => {
                let template = self.find_page(*namespace, title)?;
                walk::filter_template(store, universe.pages(store), template)
            }
            Selector::LinkingToPage { namespace, title } => {
                let target = self.find_page(*namespace, title)?;
                walk::filter_links_to(store, universe.pages(store), target)
            }
            Selector::ExternalLinkMatching { pattern } => {
                walk::filter_external_links(store, universe.pages(store), pattern)
            }
        };
        Ok(result)
    }

    /// Evaluates `selector`, loading whatever tables it needs first.
    ///
    /// Category selectors always walk the full subtree; the others filter `universe`.
    pub fn evaluate(
        &mut self,
        selector: &Selector,
        universe: Universe<'_>,
    ) -> Result<BTreeSet<PageRef>> {
        self.prepare(selector)?;
        self.evaluate_prepared(selector, universe)
    }

    /// Combines the selector's result into the working set.
    ///
    /// Returns the size of the selector's result rather than of the new
    /// working set, so callers can report how many pages matched.
    pub fn operate(&mut self, operator: Operator, selector: &Selector) -> Result<usize> {
        self.prepare(selector)?;
        let result = if operator.evaluates_against_working_set() && selector.uses_universe() {
            self.evaluate_prepared(selector, Universe::Pages(&self.working))?
        } else {
            self.evaluate_prepared(selector, Universe::All)?
        };
        let matched = result.len();

        match operator {
            Operator::Replace => self.working = result,
            Operator::Add => self.working.extend(result),
            Operator::Subtract => self.working.retain(|page| !result.contains(page)),
            Operator::ReverseSubtract => {
                self.working = result.difference(&self.working).copied().collect();
            }
            Operator::Intersect => self.working.retain(|page| result.contains(page)),
        }

        info!(
            operator = operator.symbol(),
            selector = %selector,
            matched,
            working_set = self.working.len(),
            "Operation applied"
        );
        Ok(matched)
    }

    /// Size of the selector's result over all pages; the working set is untouched.
    pub fn compute_count(&mut self, selector: &Selector) -> Result<usize> {
        Ok(self.evaluate(selector, Universe::All)?.len())
    }

    pub fn working_set(&self) -> &BTreeSet<PageRef> {
        &self.working
    }

    /// Saves a copy of the working set under `name`, replacing any earlier copy.
    pub fn store_variable(&mut self, name: &str) -> usize {
        self.variables.insert(name.to_string(), self.working.clone());
        self.working.len()
    }

    /// Replaces the working set with a stored copy.
    pub fn load_variable(&mut self, name: &str) -> Result<usize> {
        let stored = self
            .variables
            .get(name)
            .ok_or_else(|| GraphError::VariableNotFound(name.to_string()))?;
        self.working = stored.clone();
        Ok(self.working.len())
    }

    pub fn unset_variable(&mut self, name: &str) -> bool {
        self.variables.remove(name).is_some()
    }

    pub fn variable_names(&self) -> Vec<&str> {
        self.variables.keys().map(String::as_str).collect()
    }

    /// Prefixed titles of `pages`, sorted.
    pub fn titles<'a>(&self, pages: impl IntoIterator<Item = &'a PageRef>) -> Vec<String> {
        self.store.sorted_titles(pages)
    }

    pub fn category_cycles(&mut self, category: &str) -> Result<Vec<Vec<PageRef>>> {
        self.load_category_links()?;
        let root = self.find_category(&normalize_category_title(category))?;
        Ok(cycles::find_category_cycles(&self.store, root))
    }

    /// Builds the reverse link index on first use; later calls reuse it.
    fn indexed(&mut self) -> Result<(&GraphStore, &ReverseLinkIndex)> {
        self.load_page_links()?;
        let store = &self.store;
        let index = self
            .reverse_links
            .get_or_insert_with(|| ReverseLinkIndex::build(store));
        Ok((store, index))
    }

    pub fn reverse_link_index(&mut self) -> Result<&ReverseLinkIndex> {
        Ok(self.indexed()?.1)
    }

    /// Farthest pages from `title` along incoming links; `title` may carry a namespace prefix.
    pub fn longest_path_to(&mut self, title: &str) -> Result<LongestPaths> {
        // the destination may only exist as a link placeholder
        self.load_page_links()?;
        let (namespace, rest) = Namespace::split_title(title);
        let destination = self.find_page(namespace, &normalize_title(rest))?;
        let (store, index) = self.indexed()?;
        Ok(paths::longest_path_to(store, index, destination))
    }

    pub fn globally_longest_path(&mut self) -> Result<LongestPaths> {
        let (store, index) = self.indexed()?;
        Ok(paths::globally_longest_path(store, index))
    }

    pub fn red_links(&mut self) -> Result<BTreeMap<String, usize>> {
        self.load_page_links()?;
        Ok(redlinks::red_links(&self.store))
    }
}
