//! Title-resolved results for printing or JSON output.

use crate::loader::Loader;
use crate::models::PageRef;
use crate::paths::LongestPaths;
use crate::redlinks;
use crate::source::Table;
use crate::stats::LoadStats;
use crate::store::GraphStore;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

fn titles_of(store: &GraphStore, pages: &[PageRef]) -> Vec<String> {
    pages.iter().map(|&page| store.full_title(page)).collect()
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SetReport {
    pub count: usize,
    pub pages: Vec<String>,
}

impl SetReport {
    pub fn new(store: &GraphStore, pages: &BTreeSet<PageRef>) -> Self {
        let titles = store.sorted_titles(pages);
        Self {
            count: titles.len(),
            pages: titles,
        }
    }
}

impl fmt::Display for SetReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} pages", self.count)?;
        for title in &self.pages {
            writeln!(f, "  {}", title)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PathReport {
    pub distance: u32,
    /// Each path runs from its source page to its destination page
    pub paths: Vec<Vec<String>>,
}

impl PathReport {
    pub fn new(store: &GraphStore, longest: &LongestPaths) -> Self {
        Self {
            distance: longest.distance,
            paths: longest.paths.iter().map(|p| titles_of(store, p)).collect(),
        }
    }
}

impl fmt::Display for PathReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Distance: {} ({} paths)", self.distance, self.paths.len())?;
        for path in &self.paths {
            writeln!(f, "  {}", path.join(" -> "))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CycleReport {
    pub category: String,
    pub cycles: Vec<Vec<String>>,
}

impl CycleReport {
    pub fn new(store: &GraphStore, category: &str, cycles: &[Vec<PageRef>]) -> Self {
        Self {
            category: category.to_string(),
            cycles: cycles.iter().map(|c| titles_of(store, c)).collect(),
        }
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.cycles.is_empty() {
            return writeln!(f, "No cycles below {}", self.category);
        }
        writeln!(f, "{} cycles below {}", self.cycles.len(), self.category)?;
        for cycle in &self.cycles {
            // close the loop for readability
            let first = cycle.first().map(String::as_str).unwrap_or_default();
            writeln!(f, "  {} -> {}", cycle.join(" -> "), first)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RedLink {
    pub title: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RedLinkReport {
    /// Distinct missing targets, before the limit is applied
    pub targets: usize,
    pub links: usize,
    pub most_wanted: Vec<RedLink>,
}

impl RedLinkReport {
    pub fn new(wanted: &BTreeMap<String, usize>, limit: usize) -> Self {
        Self {
            targets: wanted.len(),
            links: wanted.values().sum(),
            most_wanted: redlinks::most_wanted(wanted, limit)
                .into_iter()
                .map(|(title, count)| RedLink {
                    title: title.to_string(),
                    count,
                })
                .collect(),
        }
    }
}

impl fmt::Display for RedLinkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} red links to {} missing pages",
            self.links, self.targets
        )?;
        for entry in &self.most_wanted {
            writeln!(f, "  {:>8}  {}", entry.count, entry.title)?;
        }
        Ok(())
    }
}

/// Statistics of every table loaded so far, keyed by table name
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LoadReport {
    pub tables: BTreeMap<&'static str, LoadStats>,
}

impl LoadReport {
    pub fn new(loader: &Loader) -> Self {
        let tables = Table::ALL
            .iter()
            .filter_map(|&table| loader.stats(table).map(|stats| (table.name(), *stats)))
            .collect();
        Self { tables }
    }
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<14} {:>10} {:>10} {:>10} {:>12} {:>8}",
            "table", "rows", "pages", "edges", "placeholders", "dropped"
        )?;
        for (name, s) in &self.tables {
            writeln!(
                f,
                "{:<14} {:>10} {:>10} {:>10} {:>12} {:>8}",
                name, s.rows_read, s.pages_created, s.edges_added, s.placeholders_created, s.rows_dropped
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Namespace;

    #[test]
    fn set_report_sorts_titles() {
        let mut store = GraphStore::new();
        let b = store.create_page(Namespace::Main, "B", 1, false).unwrap();
        let a = store.create_page(Namespace::Talk, "A", 2, false).unwrap();
        let report = SetReport::new(&store, &[a, b].into_iter().collect());
        assert_eq!(report.count, 2);
        assert_eq!(report.pages, vec!["B", "Talk:A"]);
        assert_eq!(report.to_string(), "2 pages\n  B\n  Talk:A\n");
    }

    #[test]
    fn path_report_keeps_path_order() {
        let mut store = GraphStore::new();
        let p1 = store.create_page(Namespace::Main, "P1", 1, false).unwrap();
        let p2 = store.create_page(Namespace::Main, "P2", 2, false).unwrap();
        let longest = LongestPaths {
            distance: 1,
            paths: vec![vec![p2, p1]],
        };
        let report = PathReport::new(&store, &longest);
        assert_eq!(report.paths, vec![vec!["P2".to_string(), "P1".to_string()]]);
        assert!(report.to_string().contains("P2 -> P1"));
    }

    #[test]
    fn red_link_report_serializes() {
        let wanted: BTreeMap<String, usize> =
            [("Ghost".to_string(), 3), ("Gone".to_string(), 1)].into_iter().collect();
        let report = RedLinkReport::new(&wanted, 1);
        assert_eq!(report.targets, 2);
        assert_eq!(report.links, 4);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["most_wanted"][0]["title"], "Ghost");
        assert_eq!(json["most_wanted"].as_array().unwrap().len(), 1);
    }
}
