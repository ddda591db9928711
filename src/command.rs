//! Line-oriented query and fixup languages.

use crate::engine::Engine;
use crate::error::{GraphError, Result};
use crate::models::{normalize_category_title, normalize_title, Namespace};
use crate::selector::{Operator, Selector};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

static OPERATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([=+\-~*?])\s*(\S+)\s+(.+)$").unwrap());

static VARIABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(store|load|unset)\s+(\S+)$").unwrap());

/// One line of a query script
#[derive(Debug, Clone)]
pub enum Command {
    Operate(Operator, Selector),
    Count(Selector),
    Store(String),
    Load(String),
    Unset(String),
    List,
}

/// What executing a [`Command`] produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Size of the selector's result; the working set changed
    Matched(usize),
    /// Size of the selector's result; the working set is untouched
    Counted(usize),
    Stored { name: String, size: usize },
    Loaded { name: String, size: usize },
    Unset { name: String, existed: bool },
    Variables(Vec<String>),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Matched(n) => write!(f, "{} pages matched", n),
            Outcome::Counted(n) => write!(f, "{} pages", n),
            Outcome::Stored { name, size } => write!(f, "stored {} pages in {}", size, name),
            Outcome::Loaded { name, size } => write!(f, "loaded {} pages from {}", size, name),
            Outcome::Unset { name, existed: true } => write!(f, "unset {}", name),
            Outcome::Unset { name, existed: false } => write!(f, "{} was not set", name),
            Outcome::Variables(names) => write!(f, "variables: {}", names.join(", ")),
        }
    }
}

/// Builds a selector from its specifier keyword and argument.
///
/// Template names without a namespace prefix are looked up in the Template
/// namespace; page link targets default to Main.
pub fn parse_selector(specifier: &str, argument: &str) -> Result<Selector> {
    let argument = argument.trim();
    match specifier.to_ascii_lowercase().as_str() {
        "category" | "cat" => Ok(Selector::in_category(argument)),
        "categoryre" | "catre" => Selector::in_matching_categories(argument),
        "dupes" | "duplicates" => Ok(Selector::duplicates_in_category(argument)),
        "ns" | "namespace" => Ok(Selector::in_namespace(argument.parse()?)),
        "template" => match Namespace::split_title(argument) {
            (Namespace::Main, name) => Ok(Selector::linking_to_template(Namespace::Template, name)),
            (namespace, name) => Ok(Selector::linking_to_template(namespace, name)),
        },
        "pagelink" => {
            let (namespace, name) = Namespace::split_title(argument);
            Ok(Selector::linking_to_page(namespace, name))
        }
        "extlink" => Selector::external_link_matching(argument),
        other => Err(GraphError::UnknownSelector(other.to_string())),
    }
}

impl FromStr for Command {
    type Err = GraphError;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        if line == "vars" {
            return Ok(Command::List);
        }
        if let Some(caps) = VARIABLE.captures(line) {
            let name = caps[2].to_string();
            return Ok(match &caps[1] {
                "store" => Command::Store(name),
                "load" => Command::Load(name),
                _ => Command::Unset(name),
            });
        }
        let caps = OPERATION
            .captures(line)
            .ok_or_else(|| GraphError::InvalidCommand(line.to_string()))?;
        let selector = parse_selector(&caps[2], &caps[3])?;
        match &caps[1] {
            "?" => Ok(Command::Count(selector)),
            symbol => Ok(Command::Operate(Operator::from_symbol(symbol)?, selector)),
        }
    }
}

impl Command {
    pub fn execute(&self, engine: &mut Engine) -> Result<Outcome> {
        match self {
            Command::Operate(operator, selector) => {
                engine.operate(*operator, selector).map(Outcome::Matched)
            }
            Command::Count(selector) => engine.compute_count(selector).map(Outcome::Counted),
            Command::Store(name) => Ok(Outcome::Stored {
                name: name.clone(),
                size: engine.store_variable(name),
            }),
            Command::Load(name) => Ok(Outcome::Loaded {
                name: name.clone(),
                size: engine.load_variable(name)?,
            }),
            Command::Unset(name) => Ok(Outcome::Unset {
                name: name.clone(),
                existed: engine.unset_variable(name),
            }),
            Command::List => Ok(Outcome::Variables(
                engine.variable_names().into_iter().map(str::to_string).collect(),
            )),
        }
    }
}

/// Correction applied to the category graph after it is loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fixup {
    /// `-cat|<page>|<category>`: drop one membership edge
    DetachCategory {
        namespace: Namespace,
        title: String,
        category: String,
    },
}

impl FromStr for Fixup {
    type Err = GraphError;

    fn from_str(line: &str) -> Result<Self> {
        let mut fields = line.trim().split('|');
        match (fields.next(), fields.next(), fields.next(), fields.next()) {
            (Some("-cat"), Some(page), Some(category), None)
                if !page.trim().is_empty() && !category.trim().is_empty() =>
            {
                let (namespace, title) = Namespace::split_title(page);
                Ok(Fixup::DetachCategory {
                    namespace,
                    title: normalize_title(title),
                    category: normalize_category_title(category),
                })
            }
            _ => Err(GraphError::InvalidCommand(line.to_string())),
        }
    }
}
