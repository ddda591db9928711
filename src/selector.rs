use crate::error::{GraphError, Result};
use crate::models::{normalize_category_title, normalize_title, Namespace};
use regex::Regex;
use std::fmt;

/// Immutable description of a set of pages.
///
/// Title-bearing variants hold normalized titles; pattern-bearing variants
/// keep the pattern verbatim and are validated when constructed.
#[derive(Debug, Clone)]
pub enum Selector {
    /// Articles anywhere below a category
    InCategory { title: String },
    /// Articles below every category whose title matches
    InMatchingCategories { pattern: Regex },
    /// Articles reachable from a category along more than one path
    DuplicatesInCategory { title: String },
    InNamespace { namespace: Namespace },
    LinkingToTemplate { namespace: Namespace, title: String },
    LinkingToPage { namespace: Namespace, title: String },
    ExternalLinkMatching { pattern: Regex },
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| GraphError::InvalidRegex {
        pattern: pattern.to_string(),
        source,
    })
}

impl Selector {
    pub fn in_category(name: &str) -> Self {
        Selector::InCategory {
            title: normalize_category_title(name),
        }
    }

    pub fn in_matching_categories(pattern: &str) -> Result<Self> {
        Ok(Selector::InMatchingCategories {
            pattern: compile(pattern)?,
        })
    }

    pub fn duplicates_in_category(name: &str) -> Self {
        Selector::DuplicatesInCategory {
            title: normalize_category_title(name),
        }
    }

    pub fn in_namespace(namespace: Namespace) -> Self {
        Selector::InNamespace { namespace }
    }

    pub fn linking_to_template(namespace: Namespace, name: &str) -> Self {
        Selector::LinkingToTemplate {
            namespace,
            title: normalize_title(name),
        }
    }

    pub fn linking_to_page(namespace: Namespace, name: &str) -> Self {
        Selector::LinkingToPage {
            namespace,
            title: normalize_title(name),
        }
    }

    pub fn external_link_matching(pattern: &str) -> Result<Self> {
        Ok(Selector::ExternalLinkMatching {
            pattern: compile(pattern)?,
        })
    }

    /// Whether evaluation filters the supplied universe rather than walking categories
    pub fn uses_universe(&self) -> bool {
        !matches!(
            self,
            Selector::InCategory { .. }
                | Selector::InMatchingCategories { .. }
                | Selector::DuplicatesInCategory { .. }
        )
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::InCategory { title } => write!(f, "category {}", title),
            Selector::InMatchingCategories { pattern } => write!(f, "categoryre {}", pattern),
            Selector::DuplicatesInCategory { title } => write!(f, "dupes {}", title),
            Selector::InNamespace { namespace } => write!(f, "namespace {}", namespace),
            Selector::LinkingToTemplate { namespace, title } => {
                write!(f, "template {}", namespace.prefixed(title))
            }
            Selector::LinkingToPage { namespace, title } => {
                write!(f, "pagelink {}", namespace.prefixed(title))
            }
            Selector::ExternalLinkMatching { pattern } => write!(f, "extlink {}", pattern),
        }
    }
}

/// How a selector's result is combined into the working set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// W := R
    Replace,
    /// W := W ∪ R
    Add,
    /// W := W \ R, evaluated against W
    Subtract,
    /// W := R \ W
    ReverseSubtract,
    /// W := W ∩ R, evaluated against W
    Intersect,
}

impl Operator {
    pub fn from_symbol(symbol: &str) -> Result<Self> {
        match symbol {
            "=" => Ok(Operator::Replace),
            "+" => Ok(Operator::Add),
            "-" => Ok(Operator::Subtract),
            "~" => Ok(Operator::ReverseSubtract),
            "*" => Ok(Operator::Intersect),
            other => Err(GraphError::UnknownOperator(other.to_string())),
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Replace => "=",
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::ReverseSubtract => "~",
            Operator::Intersect => "*",
        }
    }

    /// Subtract and Intersect only need the current working set as their universe.
    pub fn evaluates_against_working_set(self) -> bool {
        matches!(self, Operator::Subtract | Operator::Intersect)
    }
}
