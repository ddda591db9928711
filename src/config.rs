/// Sentinel id for a category referenced by the category-link table but never declared
pub const UNKNOWN_CATEGORY_ID: i64 = -1;

/// Sentinel id for a template referenced by the template-link table but never declared
pub const UNKNOWN_TEMPLATE_ID: i64 = -2;

/// Sentinel id for a link target referenced by the page-link table but never declared
pub const UNKNOWN_LINK_TARGET_ID: i64 = -3;

/// Column counts of the supported row sources
pub const PAGE_ARITY: usize = 13;
pub const CATEGORY_LINKS_ARITY: usize = 7;
pub const TEMPLATE_LINKS_ARITY: usize = 4;
pub const PAGE_LINKS_ARITY: usize = 4;
pub const EXTERNAL_LINKS_ARITY: usize = 3;
pub const PAGE_VIEWS_ARITY: usize = 3;

/// Progress update interval (report every N rows)
pub const PROGRESS_INTERVAL: u64 = 100_000;

/// Above this many main-namespace pages the all-pairs search logs a memory warning
pub const ALL_PAIRS_WARN_THRESHOLD: usize = 20_000;

/// Page-view project accepted when none is given on the command line
pub const DEFAULT_PAGE_VIEW_PROJECT: &str = "en";

/// Value MySQL exports write for NULL columns
pub const NULL_MARKER: &str = "\\N";
