//! Memoized bulk loads that populate the [`GraphStore`] from row sources.
//!
//! Every table loads at most once. The loaded flag is raised before the first
//! row is read and is never lowered, so a load that fails partway is not
//! retried; later calls return immediately with whatever was loaded.

use crate::config::PROGRESS_INTERVAL;
use crate::diagnostics::{Diagnostic, DiagnosticSink, Severity, TracingSink};
use crate::error::{GraphError, Result};
use crate::models::{normalize_title, Namespace, PageRef};
use crate::source::{Row, RowProvider, SourcePosition, Table};
use crate::stats::LoadStats;
use crate::store::{GraphStore, Placeholder};
use percent_encoding::percent_decode_str;
use rustc_hash::{FxHashMap, FxHashSet};
use std::str::FromStr;
use tracing::{debug, info};

/// Column indices within the supported tables
mod col {
    pub const PAGE_ID: usize = 0;
    pub const PAGE_NAMESPACE: usize = 1;
    pub const PAGE_TITLE: usize = 2;
    pub const PAGE_RESTRICTIONS: usize = 3;
    pub const PAGE_IS_REDIRECT: usize = 4;
    pub const PAGE_LEN: usize = 10;

    pub const LINK_FROM: usize = 0;
    pub const LINK_NAMESPACE: usize = 1;
    pub const LINK_TITLE: usize = 2;

    pub const CATEGORY_TO: usize = 1;

    pub const EXTERNAL_URL: usize = 1;

    pub const VIEWS_PROJECT: usize = 0;
    pub const VIEWS_TITLE: usize = 1;
    pub const VIEWS_COUNT: usize = 2;
}

/// Per-row context handed to the table handlers
struct RowScope<'a> {
    table: Table,
    position: SourcePosition,
    sink: &'a mut dyn DiagnosticSink,
    stats: &'a mut LoadStats,
}

impl RowScope<'_> {
    fn report(&mut self, severity: Severity, message: String) {
        self.sink.report(Diagnostic {
            severity,
            table: self.table,
            position: self.position.clone(),
            message,
        });
    }

    fn warn(&mut self, message: String) {
        self.report(Severity::Warning, message);
    }

    fn notice(&mut self, message: String) {
        self.report(Severity::Notice, message);
    }

    fn parse<T: FromStr>(&self, row: &Row, index: usize, column: &'static str) -> Result<T> {
        row[index]
            .trim()
            .parse()
            .map_err(|_| GraphError::InvalidColumn {
                table: self.table,
                position: self.position.at_column(index as u64 + 1),
                column,
                value: row[index].clone(),
            })
    }

    fn namespace(&self, row: &Row, index: usize) -> Result<Namespace> {
        self.parse::<i32>(row, index, "namespace")
            .map(Namespace::from_id)
    }
}

pub struct Loader {
    provider: Box<dyn RowProvider>,
    sink: Box<dyn DiagnosticSink>,
    loaded: FxHashSet<Table>,
    stats: FxHashMap<Table, LoadStats>,
}

impl Loader {
    pub fn new(provider: Box<dyn RowProvider>) -> Self {
        Self {
            provider,
            sink: Box::new(TracingSink),
            loaded: FxHashSet::default(),
            stats: FxHashMap::default(),
        }
    }

    pub fn set_sink(&mut self, sink: Box<dyn DiagnosticSink>) {
        self.sink = sink;
    }

    pub fn is_loaded(&self, table: Table) -> bool {
        self.loaded.contains(&table)
    }

    /// Statistics of a completed load; absent for loads that failed or never ran.
    pub fn stats(&self, table: Table) -> Option<&LoadStats> {
        self.stats.get(&table)
    }

    pub fn load_pages(&mut self, store: &mut GraphStore) -> Result<()> {
        self.drive(Table::Page, store, |store, row, scope| {
            let id: i64 = scope.parse(row, col::PAGE_ID, "page id")?;
            let namespace = scope.namespace(row, col::PAGE_NAMESPACE)?;
            let title = normalize_title(&row[col::PAGE_TITLE]);
            let is_redirect = row[col::PAGE_IS_REDIRECT].trim() == "1";
            let length: u64 = if row[col::PAGE_LEN].is_empty() {
                0
            } else {
                scope.parse(row, col::PAGE_LEN, "page length")?
            };

            match store.create_page(namespace, &title, id, is_redirect) {
                Ok(page) => {
                    let page = store.page_mut(page);
                    page.restrictions = row[col::PAGE_RESTRICTIONS].clone();
                    page.length = length;
                    scope.stats.inc_pages();
                }
                Err(e @ (GraphError::DuplicateKey { .. } | GraphError::DuplicateId(_))) => {
                    scope.warn(format!("Skipping page row: {}", e));
                    scope.stats.inc_dropped();
                }
                Err(e) => return Err(e),
            }
            Ok(())
        })
    }

    pub fn load_category_links(&mut self, store: &mut GraphStore) -> Result<()> {
        self.drive(Table::CategoryLinks, store, |store, row, scope| {
            let Some(from) = resolve_from(store, row, scope)? else {
                return Ok(());
            };
            let title = normalize_title(&row[col::CATEGORY_TO]);
            let (category, created) =
                store.resolve_or_synthesize(Namespace::Category, &title, Placeholder::Category);
            scope.stats.record_placeholder(created);
            let added = store.add_category_edge(from, category)?;
            scope.stats.record_edge(added);
            Ok(())
        })
    }

    pub fn load_template_links(&mut self, store: &mut GraphStore) -> Result<()> {
        self.drive(Table::TemplateLinks, store, |store, row, scope| {
            let Some(from) = resolve_from(store, row, scope)? else {
                return Ok(());
            };
            let namespace = scope.namespace(row, col::LINK_NAMESPACE)?;
            let title = normalize_title(&row[col::LINK_TITLE]);
            let (template, created) =
                store.resolve_or_synthesize(namespace, &title, Placeholder::Template);
            scope.stats.record_placeholder(created);
            scope.stats.record_edge(store.add_template_edge(from, template));
            Ok(())
        })
    }

    pub fn load_page_links(&mut self, store: &mut GraphStore) -> Result<()> {
        self.drive(Table::PageLinks, store, |store, row, scope| {
            let Some(from) = resolve_from(store, row, scope)? else {
                return Ok(());
            };
            let namespace = scope.namespace(row, col::LINK_NAMESPACE)?;
            let title = normalize_title(&row[col::LINK_TITLE]);
            let (target, created) =
                store.resolve_or_synthesize(namespace, &title, Placeholder::LinkTarget);
            scope.stats.record_placeholder(created);
            scope.stats.record_edge(store.add_link_edge(from, target));
            Ok(())
        })
    }

    pub fn load_external_links(&mut self, store: &mut GraphStore) -> Result<()> {
        self.drive(Table::ExternalLinks, store, |store, row, scope| {
            let Some(from) = resolve_from(store, row, scope)? else {
                return Ok(());
            };
            let url = row[col::EXTERNAL_URL].trim();
            scope.stats.record_edge(store.add_external_link(from, url));
            Ok(())
        })
    }

    /// Adds view counts of the accepted projects to each page's counter.
    pub fn load_page_views(
        &mut self,
        store: &mut GraphStore,
        projects: &FxHashSet<String>,
    ) -> Result<()> {
        self.drive(Table::PageViews, store, |store, row, scope| {
            if !projects.contains(row[col::VIEWS_PROJECT].trim()) {
                scope.stats.inc_skipped();
                return Ok(());
            }
            let views: u64 = scope.parse(row, col::VIEWS_COUNT, "view count")?;
            let decoded = percent_decode_str(&row[col::VIEWS_TITLE]).decode_utf8_lossy();
            let (namespace, title) = Namespace::split_title(&decoded);
            let title = normalize_title(title);

            match store.lookup(namespace, &title) {
                Some(page) => {
                    store.add_views(page, views);
                    scope.stats.record_edge(true);
                }
                None => {
                    scope.notice(format!(
                        "No page for view counts of {}",
                        namespace.prefixed(&title)
                    ));
                    scope.stats.inc_dropped();
                }
            }
            Ok(())
        })
    }

    /// Runs one memoized load, feeding each row of the table to `apply`.
    fn drive<F>(&mut self, table: Table, store: &mut GraphStore, mut apply: F) -> Result<()>
    where
        F: FnMut(&mut GraphStore, &Row, &mut RowScope<'_>) -> Result<()>,
    {
        if !self.loaded.insert(table) {
            debug!(table = %table, "Already loaded, skipping");
            return Ok(());
        }
        info!(table = %table, "Loading");

        let mut stream = self.provider.open(table).inspect_err(|e| {
            self.sink.report(Diagnostic {
                severity: Severity::Error,
                table,
                position: SourcePosition::default(),
                message: e.to_string(),
            })
        })?;
        let mut stats = LoadStats::new();

        while let Some(row) = stream.next_row() {
            let position = stream.position();
            let mut scope = RowScope {
                table,
                position,
                sink: self.sink.as_mut(),
                stats: &mut stats,
            };

            let outcome = row.and_then(|row| {
                if row.len() != table.arity() {
                    return Err(GraphError::Arity {
                        table,
                        position: scope.position.clone(),
                        expected: table.arity(),
                        found: row.len(),
                    });
                }
                scope.stats.inc_rows();
                apply(store, &row, &mut scope)
            });

            if let Err(e) = outcome {
                scope.report(Severity::Error, e.to_string());
                return Err(e);
            }

            if scope.stats.rows_read % PROGRESS_INTERVAL == 0 && scope.stats.rows_read > 0 {
                let rows = scope.stats.rows_read;
                scope.report(Severity::Progress, format!("{} rows", rows));
            }
        }

        stats.log(table);
        self.stats.insert(table, stats);
        Ok(())
    }
}

/// Resolves the row's "from" page id; unknown ids are warned about and dropped.
fn resolve_from(
    store: &GraphStore,
    row: &Row,
    scope: &mut RowScope<'_>,
) -> Result<Option<PageRef>> {
    let id: i64 = scope.parse(row, col::LINK_FROM, "from id")?;
    match store.lookup_id(id) {
        Some(page) => Ok(Some(page)),
        None => {
            scope.warn(format!("Dropping edge from unknown page id {}", id));
            scope.stats.inc_dropped();
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemoryProvider;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn page_row(id: i64, ns: i32, title: &str, redirect: bool) -> Vec<String> {
        let mut row = vec![String::new(); 13];
        row[0] = id.to_string();
        row[1] = ns.to_string();
        row[2] = title.to_string();
        row[4] = if redirect { "1" } else { "0" }.to_string();
        row[10] = "42".to_string();
        row
    }

    fn loader(provider: MemoryProvider) -> (Loader, Rc<RefCell<Vec<Diagnostic>>>) {
        let sink = Rc::new(RefCell::new(Vec::new()));
        let mut loader = Loader::new(Box::new(provider));
        loader.set_sink(Box::new(sink.clone()));
        (loader, sink)
    }

    fn base_pages() -> MemoryProvider {
        MemoryProvider::new().with_rows(
            Table::Page,
            vec![
                page_row(1, 0, "Rust", false),
                page_row(2, 0, "Rust_language", true),
                page_row(3, 14, "Languages", false),
                page_row(4, 10, "Infobox", false),
            ],
        )
    }

    #[test]
    fn page_load_creates_pages() {
        let (mut loader, _) = loader(base_pages());
        let mut store = GraphStore::new();
        loader.load_pages(&mut store).unwrap();

        assert_eq!(store.len(), 4);
        let redirect = store.lookup_id(2).unwrap();
        assert!(store.page(redirect).is_redirect);
        assert_eq!(store.page(redirect).length, 42);
        assert_eq!(loader.stats(Table::Page).unwrap().pages_created, 4);
    }

    #[test]
    fn loads_are_memoized() {
        let (mut loader, _) = loader(
            base_pages().with_rows(Table::PageLinks, [["1", "0", "Nowhere", "0"]]),
        );
        let mut store = GraphStore::new();
        loader.load_pages(&mut store).unwrap();
        loader.load_page_links(&mut store).unwrap();
        let pages = store.len();
        loader.load_pages(&mut store).unwrap();
        loader.load_page_links(&mut store).unwrap();

        assert_eq!(store.len(), pages);
        assert!(loader.is_loaded(Table::PageLinks));
        assert_eq!(loader.stats(Table::PageLinks).unwrap().rows_read, 1);
    }

    #[test]
    fn arity_mismatch_fails_and_is_not_retried() {
        let (mut loader, sink) = loader(
            base_pages().with_rows(
                Table::ExternalLinks,
                vec![
                    vec!["1", "http://a.example", "x"],
                    vec!["1", "http://b.example"],
                    vec!["1", "http://c.example", "z"],
                ],
            ),
        );
        let mut store = GraphStore::new();
        loader.load_pages(&mut store).unwrap();

        let err = loader.load_external_links(&mut store).unwrap_err();
        match err {
            GraphError::Arity {
                expected,
                found,
                ref position,
                ..
            } => {
                assert_eq!(expected, 3);
                assert_eq!(found, 2);
                assert_eq!(position.line, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
        let rust = store.lookup_id(1).unwrap();
        assert_eq!(store.page(rust).external_links.len(), 1);
        assert!(sink
            .borrow()
            .iter()
            .any(|d| d.severity == Severity::Error && d.position.line == 2));

        // the flag stays raised, so a retry does nothing
        loader.load_external_links(&mut store).unwrap();
        assert_eq!(store.page(rust).external_links.len(), 1);
        assert!(loader.stats(Table::ExternalLinks).is_none());
    }

    #[test]
    fn unknown_from_is_dropped_with_warning() {
        let (mut loader, sink) = loader(
            base_pages().with_rows(Table::CategoryLinks, [["99", "Languages", "", "", "", "", ""]]),
        );
        let mut store = GraphStore::new();
        loader.load_pages(&mut store).unwrap();
        loader.load_category_links(&mut store).unwrap();

        let stats = loader.stats(Table::CategoryLinks).unwrap();
        assert_eq!(stats.rows_dropped, 1);
        assert_eq!(stats.edges_added, 0);
        let warnings: Vec<_> = sink
            .borrow()
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .cloned()
            .collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].position.line, 1);
    }

    #[test]
    fn unknown_targets_become_placeholders() {
        let (mut loader, _) = loader(
            base_pages()
                .with_rows(
                    Table::CategoryLinks,
                    [["1", "Missing cat", "", "", "", "", ""]],
                )
                .with_rows(Table::TemplateLinks, [["1", "10", "Cite", "0"]])
                .with_rows(Table::PageLinks, [["1", "0", "Ghost", "0"]]),
        );
        let mut store = GraphStore::new();
        loader.load_pages(&mut store).unwrap();
        loader.load_category_links(&mut store).unwrap();
        loader.load_template_links(&mut store).unwrap();
        loader.load_page_links(&mut store).unwrap();

        let cat = store.lookup(Namespace::Category, "Missing_cat").unwrap();
        let tpl = store.lookup(Namespace::Template, "Cite").unwrap();
        let ghost = store.lookup(Namespace::Main, "Ghost").unwrap();
        assert_eq!(store.page(cat).id, -1);
        assert_eq!(store.page(tpl).id, -2);
        assert_eq!(store.page(ghost).id, -3);

        let rust = store.lookup_id(1).unwrap();
        assert!(store.page(rust).categories.contains(&cat));
        assert!(store.page(rust).templates.contains(&tpl));
        assert!(store.page(rust).internal_links.contains(&ghost));
    }

    #[test]
    fn category_links_attach_subcategories() {
        let (mut loader, _) = loader(
            base_pages()
                .with_rows(Table::Page, [page_row(5, 14, "Systems_languages", false)])
                .with_rows(
                    Table::CategoryLinks,
                    [["5", "Languages", "", "", "", "", ""]],
                ),
        );
        let mut store = GraphStore::new();
        loader.load_pages(&mut store).unwrap();
        loader.load_category_links(&mut store).unwrap();

        let parent = store.lookup_id(3).unwrap();
        let child = store.lookup_id(5).unwrap();
        let members = store.page(parent).category.as_ref().unwrap();
        assert!(members.subcategories.contains(&child));
        assert!(members.articles.is_empty());
    }

    #[test]
    fn invalid_number_is_a_format_error() {
        let (mut loader, _) = loader(
            base_pages().with_rows(Table::PageLinks, [["one", "0", "Rust", "0"]]),
        );
        let mut store = GraphStore::new();
        loader.load_pages(&mut store).unwrap();
        match loader.load_page_links(&mut store) {
            Err(GraphError::InvalidColumn {
                position, column, ..
            }) => {
                assert_eq!(column, "from id");
                assert_eq!(position.column, 1);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn duplicate_page_rows_are_skipped() {
        let (mut loader, sink) = loader(
            base_pages().with_rows(Table::Page, [page_row(1, 0, "Another", false)]),
        );
        let mut store = GraphStore::new();
        loader.load_pages(&mut store).unwrap();
        assert_eq!(store.len(), 4);
        assert_eq!(loader.stats(Table::Page).unwrap().rows_dropped, 1);
        assert_eq!(sink.borrow().len(), 1);
    }

    #[test]
    fn page_views_filter_projects_and_decode_titles() {
        let (mut loader, sink) = loader(
            base_pages().with_rows(
                Table::PageViews,
                vec![
                    vec!["en", "Rust", "10"],
                    vec!["de", "Rust", "1000"],
                    vec!["en", "Category%3ALanguages", "4"],
                    vec!["en", "rust", "5"],
                    vec!["en", "Unknown%20page", "3"],
                ],
            ),
        );
        let mut store = GraphStore::new();
        loader.load_pages(&mut store).unwrap();
        let projects: FxHashSet<String> = ["en".to_string()].into_iter().collect();
        loader.load_page_views(&mut store, &projects).unwrap();

        let rust = store.lookup_id(1).unwrap();
        let cat = store.lookup_id(3).unwrap();
        assert_eq!(store.page(rust).views, 15);
        assert_eq!(store.page(cat).views, 4);

        let stats = loader.stats(Table::PageViews).unwrap();
        assert_eq!(stats.rows_skipped, 1);
        assert_eq!(stats.rows_dropped, 1);
        assert!(sink
            .borrow()
            .iter()
            .any(|d| d.severity == Severity::Notice && d.message.contains("Unknown_page")));
    }
}
