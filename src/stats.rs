use crate::source::Table;
use serde::Serialize;
use tracing::info;

/// Counters collected while loading one table
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    pub rows_read: u64,
    pub pages_created: u64,
    pub edges_added: u64,
    pub placeholders_created: u64,
    /// Rows whose "from" endpoint (or page-view title) did not resolve
    pub rows_dropped: u64,
    /// Rows ignored on purpose, e.g. page views of other projects
    pub rows_skipped: u64,
}

impl LoadStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_rows(&mut self) {
        self.rows_read += 1;
    }

    pub fn inc_pages(&mut self) {
        self.pages_created += 1;
    }

    /// Counts an edge only when the underlying set actually grew.
    pub fn record_edge(&mut self, added: bool) {
        if added {
            self.edges_added += 1;
        }
    }

    pub fn record_placeholder(&mut self, created: bool) {
        if created {
            self.placeholders_created += 1;
        }
    }

    pub fn inc_dropped(&mut self) {
        self.rows_dropped += 1;
    }

    pub fn inc_skipped(&mut self) {
        self.rows_skipped += 1;
    }

    pub fn log(&self, table: Table) {
        info!(
            table = %table,
            rows = self.rows_read,
            pages = self.pages_created,
            edges = self.edges_added,
            placeholders = self.placeholders_created,
            dropped = self.rows_dropped,
            skipped = self.rows_skipped,
            "Load complete"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values_are_zero() {
        let stats = LoadStats::new();
        assert_eq!(stats, LoadStats::default());
        assert_eq!(stats.rows_read, 0);
        assert_eq!(stats.edges_added, 0);
    }

    #[test]
    fn record_edge_ignores_duplicates() {
        let mut stats = LoadStats::new();
        stats.record_edge(true);
        stats.record_edge(false);
        stats.record_edge(true);
        assert_eq!(stats.edges_added, 2);
    }

    #[test]
    fn mixed_operations() {
        let mut stats = LoadStats::new();
        stats.inc_rows();
        stats.inc_rows();
        stats.inc_pages();
        stats.record_placeholder(true);
        stats.record_placeholder(false);
        stats.inc_dropped();
        stats.inc_skipped();

        assert_eq!(stats.rows_read, 2);
        assert_eq!(stats.pages_created, 1);
        assert_eq!(stats.placeholders_created, 1);
        assert_eq!(stats.rows_dropped, 1);
        assert_eq!(stats.rows_skipped, 1);
    }

    #[test]
    fn serializes_to_json() {
        let mut stats = LoadStats::new();
        stats.inc_rows();
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["rows_read"], 1);
    }
}
