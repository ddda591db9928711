//! Pull-based row sources feeding the loader.
//!
//! A row is an ordered list of string columns. Sources do not check arity;
//! the loader validates each row against [`Table::arity`].

use crate::config::{
    CATEGORY_LINKS_ARITY, EXTERNAL_LINKS_ARITY, NULL_MARKER, PAGE_ARITY, PAGE_LINKS_ARITY,
    PAGE_VIEWS_ARITY, TEMPLATE_LINKS_ARITY,
};
use crate::error::{GraphError, Result};
use csv::{ReaderBuilder, StringRecord};
use rustc_hash::FxHashMap;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;

pub type Row = Vec<String>;

/// The tables the engine knows how to load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Page,
    CategoryLinks,
    TemplateLinks,
    PageLinks,
    ExternalLinks,
    PageViews,
}

impl Table {
    pub const ALL: [Table; 6] = [
        Table::Page,
        Table::CategoryLinks,
        Table::TemplateLinks,
        Table::PageLinks,
        Table::ExternalLinks,
        Table::PageViews,
    ];

    pub fn arity(self) -> usize {
        match self {
            Table::Page => PAGE_ARITY,
            Table::CategoryLinks => CATEGORY_LINKS_ARITY,
            Table::TemplateLinks => TEMPLATE_LINKS_ARITY,
            Table::PageLinks => PAGE_LINKS_ARITY,
            Table::ExternalLinks => EXTERNAL_LINKS_ARITY,
            Table::PageViews => PAGE_VIEWS_ARITY,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Table::Page => "page",
            Table::CategoryLinks => "categorylinks",
            Table::TemplateLinks => "templatelinks",
            Table::PageLinks => "pagelinks",
            Table::ExternalLinks => "externallinks",
            Table::PageViews => "pageviews",
        }
    }

    /// Table exports are tab-separated; page-view files are space-separated.
    pub fn delimiter(self) -> u8 {
        match self {
            Table::PageViews => b' ',
            _ => b'\t',
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Location of the row currently being processed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourcePosition {
    pub file: String,
    pub line: u64,
    pub column: u64,
}

impl SourcePosition {
    pub fn new(file: impl Into<String>, line: u64) -> Self {
        Self {
            file: file.into(),
            line,
            column: 0,
        }
    }

    pub fn at_column(&self, column: u64) -> Self {
        Self {
            column,
            ..self.clone()
        }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// A lazily consumed sequence of rows.
pub trait RowStream {
    /// Next row, `None` at end of input.
    fn next_row(&mut self) -> Option<Result<Row>>;

    /// Position of the row most recently returned by [`RowStream::next_row`].
    fn position(&self) -> SourcePosition;
}

/// Opens row streams on demand, one per table load.
pub trait RowProvider {
    fn open(&mut self, table: Table) -> Result<Box<dyn RowStream>>;
}

/// Reads tables from delimited files on disk.
#[derive(Debug, Default, Clone)]
pub struct FileProvider {
    paths: FxHashMap<Table, PathBuf>,
}

impl FileProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: Table, path: impl Into<PathBuf>) -> Self {
        self.paths.insert(table, path.into());
        self
    }

    pub fn set_table(&mut self, table: Table, path: impl Into<PathBuf>) {
        self.paths.insert(table, path.into());
    }

    pub fn has_table(&self, table: Table) -> bool {
        self.paths.contains_key(&table)
    }
}

impl RowProvider for FileProvider {
    fn open(&mut self, table: Table) -> Result<Box<dyn RowStream>> {
        let path = self
            .paths
            .get(&table)
            .ok_or(GraphError::MissingSource(table))?;
        debug!(table = %table, path = ?path, "Opening row source");
        Ok(Box::new(DelimitedRowStream::open(path, table.delimiter())?))
    }
}

/// Row stream over one delimited file.
///
/// Quoting is disabled since MediaWiki exports never quote, and titles may
/// contain literal quote characters.
pub struct DelimitedRowStream {
    reader: csv::Reader<BufReader<File>>,
    record: StringRecord,
    file: String,
    line: u64,
}

impl DelimitedRowStream {
    pub fn open(path: &Path, delimiter: u8) -> Result<Self> {
        let file = File::open(path)?;
        let reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_reader(BufReader::with_capacity(256 * 1024, file));
        Ok(Self {
            reader,
            record: StringRecord::new(),
            file: path.display().to_string(),
            line: 0,
        })
    }
}

impl RowStream for DelimitedRowStream {
    fn next_row(&mut self) -> Option<Result<Row>> {
        match self.reader.read_record(&mut self.record) {
            Ok(true) => {
                self.line = self
                    .record
                    .position()
                    .map(|p| p.line())
                    .unwrap_or(self.line + 1);
                let row = self
                    .record
                    .iter()
                    .map(|field| {
                        if field == NULL_MARKER {
                            String::new()
                        } else {
                            field.to_string()
                        }
                    })
                    .collect();
                Some(Ok(row))
            }
            Ok(false) => None,
            Err(e) => Some(Err(e.into())),
        }
    }

    fn position(&self) -> SourcePosition {
        SourcePosition::new(self.file.clone(), self.line)
    }
}

/// Serves rows from memory; tables without rows yield empty streams.
#[derive(Debug, Default, Clone)]
pub struct MemoryProvider {
    tables: FxHashMap<Table, Vec<Row>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows<R, C>(mut self, table: Table, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let entry = self.tables.entry(table).or_default();
        entry.extend(
            rows.into_iter()
                .map(|row| row.into_iter().map(Into::into).collect::<Row>()),
        );
        self
    }
}

impl RowProvider for MemoryProvider {
    fn open(&mut self, table: Table) -> Result<Box<dyn RowStream>> {
        let rows = self.tables.get(&table).cloned().unwrap_or_default();
        Ok(Box::new(MemoryRowStream {
            name: format!("<memory:{}>", table),
            rows: rows.into_iter(),
            line: 0,
        }))
    }
}

pub struct MemoryRowStream {
    name: String,
    rows: std::vec::IntoIter<Row>,
    line: u64,
}

impl RowStream for MemoryRowStream {
    fn next_row(&mut self) -> Option<Result<Row>> {
        let row = self.rows.next()?;
        self.line += 1;
        Some(Ok(row))
    }

    fn position(&self) -> SourcePosition {
        SourcePosition::new(self.name.clone(), self.line)
    }
}
