//! Wikigraph: an in-memory analytical graph engine over MediaWiki tables
//!
//! This crate loads the page, category-link, template-link, page-link and
//! external-link tables of a MediaWiki database export into an arena-backed
//! graph and answers set-algebra queries and graph analytics over it:
//!
//! 1. **Loading** -- Each table is streamed row by row from a [`source::RowProvider`]
//!    and loaded at most once, on first use. Link targets that were never declared
//!    become placeholder pages; rows whose source page is unknown are dropped
//! 2. **Selecting** -- A [`selector::Selector`] describes a set of pages (category
//!    subtree, namespace, template users, linking pages, external link pattern)
//! 3. **Combining** -- The [`engine::Engine`] folds selector results into a single
//!    working set with replace, union, difference and intersection operators, and
//!    keeps named snapshots of it
//! 4. **Analysing** -- Category cycle detection, longest shortest-path searches over
//!    internal links (redirects are free hops) and red link counts
//!
//! # Architecture
//!
//! - **Arena + indices** -- Pages live in one `Vec`, referenced by dense [`models::PageRef`]
//!   handles; lookups by (namespace, title) and by id go through `FxHashMap` indices
//! - **Ordered edge sets** -- `BTreeSet<PageRef>` edges keep every result deterministic
//! - **Pull-based row streams** -- Loaders never hold a whole table in memory
//! - **Diagnostics** -- Per-row warnings and progress flow to a [`diagnostics::DiagnosticSink`],
//!   `tracing` by default
//!
//! # Key Modules
//!
//! - [`source`] -- Row streams over delimited files or memory
//! - [`loader`] -- Memoized table loads with placeholder synthesis
//! - [`store`] -- Page arena, identity indices and edge mutation
//! - [`selector`] -- Selectors and set operators
//! - [`walk`] -- Category walks and page filters
//! - [`engine`] -- Working set, variables and lazy loading
//! - [`command`] -- Query and fixup line parsers
//! - [`cycles`] -- Category cycle detection
//! - [`paths`] -- Reverse link index and longest path searches
//! - [`redlinks`] -- Links to missing pages
//! - [`report`] -- Title-resolved, serializable results
//! - [`models`] -- Core data types (Page, Namespace, PageRef, User)
//! - [`stats`] -- Per-table load counters
//! - [`config`] -- Constants for loading and analytics
//!
//! # Example Usage
//!
//! ```bash
//! # Articles in Physics that do not link to Atom
//! echo -e "= cat Physics\n- pagelink Atom" > query.txt
//! wikigraph --pages page.tsv --categorylinks categorylinks.tsv --pagelinks pagelinks.tsv query query.txt
//!
//! # Category cycles below Mathematics
//! wikigraph --pages page.tsv --categorylinks categorylinks.tsv cycles Mathematics
//! ```

pub mod command;
pub mod config;
pub mod cycles;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod loader;
pub mod models;
pub mod paths;
pub mod redlinks;
pub mod report;
pub mod selector;
pub mod source;
pub mod stats;
pub mod store;
pub mod walk;

pub use engine::Engine;
pub use error::{GraphError, Result};
