//! Page arena and identity indices.
//!
//! Pages are stored in a flat vector and addressed by [`PageRef`]; every edge
//! set holds handles rather than owning pointers, so cyclic category graphs
//! need no special ownership treatment.

use crate::config::{UNKNOWN_CATEGORY_ID, UNKNOWN_LINK_TARGET_ID, UNKNOWN_TEMPLATE_ID};
use crate::error::{GraphError, Result};
use crate::models::{Namespace, Page, PageRef};
use rustc_hash::FxHashMap;
use tracing::trace;

/// Why a page had to be synthesized instead of coming from the page table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    Category,
    Template,
    LinkTarget,
}

impl Placeholder {
    pub fn id(self) -> i64 {
        match self {
            Placeholder::Category => UNKNOWN_CATEGORY_ID,
            Placeholder::Template => UNKNOWN_TEMPLATE_ID,
            Placeholder::LinkTarget => UNKNOWN_LINK_TARGET_ID,
        }
    }
}

#[derive(Debug, Default)]
pub struct GraphStore {
    pages: Vec<Page>,
    by_key: FxHashMap<(Namespace, String), PageRef>,
    by_id: FxHashMap<i64, PageRef>,
    categories: Vec<PageRef>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Registers a page declared by the page table.
    pub fn create_page(
        &mut self,
        namespace: Namespace,
        title: &str,
        id: i64,
        is_redirect: bool,
    ) -> Result<PageRef> {
        let key = (namespace, title.to_string());
        if self.by_key.contains_key(&key) {
            return Err(GraphError::DuplicateKey {
                namespace,
                title: key.1,
            });
        }
        if id > 0 && self.by_id.contains_key(&id) {
            return Err(GraphError::DuplicateId(id));
        }
        Ok(self.insert(key, id, is_redirect))
    }

    /// Looks a page up by key, synthesizing a placeholder when it is unknown.
    ///
    /// Category placeholders are always created in the Category namespace.
    /// The flag reports whether a placeholder was created.
    pub fn resolve_or_synthesize(
        &mut self,
        namespace: Namespace,
        title: &str,
        kind: Placeholder,
    ) -> (PageRef, bool) {
        let namespace = match kind {
            Placeholder::Category => Namespace::Category,
            _ => namespace,
        };
        if let Some(found) = self.lookup(namespace, title) {
            return (found, false);
        }
        trace!(namespace = %namespace, title, id = kind.id(), "Synthesizing placeholder");
        let page = self.insert((namespace, title.to_string()), kind.id(), false);
        (page, true)
    }

    fn insert(&mut self, key: (Namespace, String), id: i64, is_redirect: bool) -> PageRef {
        let page = PageRef(self.pages.len() as u32);
        let (namespace, title) = key.clone();
        let node = Page::new(namespace, title, id, is_redirect);
        if node.is_category() {
            self.categories.push(page);
        }
        self.pages.push(node);
        self.by_key.insert(key, page);
        if id > 0 {
            self.by_id.insert(id, page);
        }
        page
    }

    pub fn lookup_id(&self, id: i64) -> Option<PageRef> {
        self.by_id.get(&id).copied()
    }

    pub fn lookup(&self, namespace: Namespace, title: &str) -> Option<PageRef> {
        self.by_key.get(&(namespace, title.to_string())).copied()
    }

    pub fn page(&self, page: PageRef) -> &Page {
        &self.pages[page.index()]
    }

    pub(crate) fn page_mut(&mut self, page: PageRef) -> &mut Page {
        &mut self.pages[page.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (PageRef, &Page)> {
        self.pages
            .iter()
            .enumerate()
            .map(|(i, page)| (PageRef(i as u32), page))
    }

    pub fn refs(&self) -> impl Iterator<Item = PageRef> {
        (0..self.pages.len() as u32).map(PageRef)
    }

    pub fn categories(&self) -> &[PageRef] {
        &self.categories
    }

    pub fn full_title(&self, page: PageRef) -> String {
        self.page(page).full_title()
    }

    /// Prefixed titles of `pages`, sorted.
    pub fn sorted_titles<'a>(&self, pages: impl IntoIterator<Item = &'a PageRef>) -> Vec<String> {
        let mut titles: Vec<String> = pages.into_iter().map(|&page| self.full_title(page)).collect();
        titles.sort();
        titles
    }

    /// Puts `child` into `category`, as a subcategory when `child` is itself a category.
    pub fn add_category_edge(&mut self, child: PageRef, category: PageRef) -> Result<bool> {
        if !self.page(category).is_category() {
            return Err(GraphError::NotACategory(self.full_title(category)));
        }
        let child_is_category = self.page(child).is_category();
        let added = self.page_mut(child).categories.insert(category);
        if let Some(members) = self.page_mut(category).category.as_mut() {
            if child_is_category {
                members.subcategories.insert(child);
            } else {
                members.articles.insert(child);
            }
        }
        Ok(added)
    }

    /// Detaches `child` from `category`; the only edge removal the graph supports.
    pub fn remove_category_edge(&mut self, child: PageRef, category: PageRef) -> Result<()> {
        if !self.page_mut(child).categories.remove(&category) {
            return Err(GraphError::NotAMember {
                page: self.full_title(child),
                category: self.full_title(category),
            });
        }
        if let Some(members) = self.page_mut(category).category.as_mut() {
            members.subcategories.remove(&child);
            members.articles.remove(&child);
        }
        Ok(())
    }

    pub fn add_template_edge(&mut self, page: PageRef, template: PageRef) -> bool {
        self.page_mut(page).templates.insert(template)
    }

    pub fn add_link_edge(&mut self, from: PageRef, to: PageRef) -> bool {
        self.page_mut(from).internal_links.insert(to)
    }

    pub fn add_external_link(&mut self, page: PageRef, url: &str) -> bool {
        self.page_mut(page).external_links.insert(url.to_string())
    }

    pub fn add_views(&mut self, page: PageRef, views: u64) {
        let page = self.page_mut(page);
        page.views = page.views.saturating_add(views);
    }
}
