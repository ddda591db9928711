//! Error types for the graph engine

use crate::models::Namespace;
use crate::source::{SourcePosition, Table};
use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors that can occur while loading or querying the graph
#[derive(Error, Debug)]
pub enum GraphError {
    /// A page with the same (namespace, title) key already exists
    #[error("duplicate page key: {}", namespace.prefixed(title))]
    DuplicateKey { namespace: Namespace, title: String },

    /// A page with the same positive id already exists
    #[error("duplicate page id: {0}")]
    DuplicateId(i64),

    /// Detaching a page from a category it does not belong to
    #[error("{page} is not a member of {category}")]
    NotAMember { page: String, category: String },

    /// A category edge was requested towards a page outside the Category namespace
    #[error("{0} is not a category")]
    NotACategory(String),

    /// Named page or category does not exist in the graph
    #[error("page not found: {0}")]
    PageNotFound(String),

    /// Named variable was never stored
    #[error("variable not found: {0}")]
    VariableNotFound(String),

    /// Selector or filter pattern failed to compile
    #[error("invalid regex '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Row has the wrong number of columns for its source
    #[error("{position}: {table} row has {found} columns, expected {expected}")]
    Arity {
        table: Table,
        position: SourcePosition,
        expected: usize,
        found: usize,
    },

    /// Column value could not be parsed
    #[error("{position}: invalid {column} '{value}' in {table} row")]
    InvalidColumn {
        table: Table,
        position: SourcePosition,
        column: &'static str,
        value: String,
    },

    /// No row source is configured for a table that a query needs
    #[error("no row source configured for {0}")]
    MissingSource(Table),

    /// Unknown set operator symbol
    #[error("unknown operator: {0}")]
    UnknownOperator(String),

    /// Unknown selector specifier
    #[error("unknown selector: {0}")]
    UnknownSelector(String),

    /// Unknown namespace name or id
    #[error("unknown namespace: {0}")]
    UnknownNamespace(String),

    /// Malformed query or fixup line
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Delimited-file reader error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
