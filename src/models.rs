use crate::error::GraphError;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Dense handle of a page inside one [`GraphStore`](crate::store::GraphStore).
///
/// Handles are only meaningful for the store that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageRef(pub(crate) u32);

impl PageRef {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// MediaWiki namespace of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {
    Media,
    Special,
    Main,
    Talk,
    User,
    UserTalk,
    Project,
    ProjectTalk,
    File,
    FileTalk,
    MediaWiki,
    MediaWikiTalk,
    Template,
    TemplateTalk,
    Help,
    HelpTalk,
    Category,
    CategoryTalk,
    /// Wiki-specific namespace (Portal, Draft, ...) known only by number
    Other(i32),
}

const NAMED: &[(Namespace, i32, &str)] = &[
    (Namespace::Media, -2, "Media"),
    (Namespace::Special, -1, "Special"),
    (Namespace::Talk, 1, "Talk"),
    (Namespace::User, 2, "User"),
    (Namespace::UserTalk, 3, "User_talk"),
    (Namespace::Project, 4, "Project"),
    (Namespace::ProjectTalk, 5, "Project_talk"),
    (Namespace::File, 6, "File"),
    (Namespace::FileTalk, 7, "File_talk"),
    (Namespace::MediaWiki, 8, "MediaWiki"),
    (Namespace::MediaWikiTalk, 9, "MediaWiki_talk"),
    (Namespace::Template, 10, "Template"),
    (Namespace::TemplateTalk, 11, "Template_talk"),
    (Namespace::Help, 12, "Help"),
    (Namespace::HelpTalk, 13, "Help_talk"),
    (Namespace::Category, 14, "Category"),
    (Namespace::CategoryTalk, 15, "Category_talk"),
];

impl Namespace {
    pub fn id(self) -> i32 {
        match self {
            Namespace::Main => 0,
            Namespace::Other(id) => id,
            ns => NAMED
                .iter()
                .find(|(named, _, _)| *named == ns)
                .map(|(_, id, _)| *id)
                .unwrap_or_default(),
        }
    }

    pub fn from_id(id: i32) -> Self {
        if id == 0 {
            return Namespace::Main;
        }
        NAMED
            .iter()
            .find(|(_, named_id, _)| *named_id == id)
            .map(|(ns, _, _)| *ns)
            .unwrap_or(Namespace::Other(id))
    }

    /// Canonical title prefix, `None` for Main and unnamed namespaces.
    pub fn name(self) -> Option<&'static str> {
        NAMED
            .iter()
            .find(|(ns, _, _)| *ns == self)
            .map(|(_, _, name)| *name)
    }

    /// Case-insensitive lookup by canonical name; spaces and underscores are interchangeable.
    pub fn from_name(name: &str) -> Option<Self> {
        let wanted = name.trim().replace(' ', "_").to_ascii_lowercase();
        match wanted.as_str() {
            "main" | "(main)" | "article" => return Some(Namespace::Main),
            "image" => return Some(Namespace::File),
            "image_talk" => return Some(Namespace::FileTalk),
            _ => {}
        }
        NAMED
            .iter()
            .find(|(_, _, canonical)| canonical.to_ascii_lowercase() == wanted)
            .map(|(ns, _, _)| *ns)
    }

    /// Renders `title` with this namespace's prefix, e.g. `Category:Physics`.
    pub fn prefixed(self, title: &str) -> String {
        match (self, self.name()) {
            (_, Some(name)) => format!("{}:{}", name, title),
            (Namespace::Other(id), None) => format!("{{ns{}}}:{}", id, title),
            _ => title.to_string(),
        }
    }

    /// Splits a prefixed title into its namespace and the remaining title.
    ///
    /// Titles without a recognised prefix belong to the Main namespace.
    pub fn split_title(full: &str) -> (Namespace, &str) {
        let full = full.trim();
        if let Some((prefix, rest)) = full.split_once(':') {
            if let Some(ns) = Namespace::from_name(prefix) {
                if ns != Namespace::Main {
                    return (ns, rest.trim());
                }
            }
        }
        (Namespace::Main, full)
    }
}

impl FromStr for Namespace {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(id) = s.trim().parse::<i32>() {
            return Ok(Namespace::from_id(id));
        }
        Namespace::from_name(s).ok_or_else(|| GraphError::UnknownNamespace(s.to_string()))
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self, self.name()) {
            (_, Some(name)) => f.write_str(name),
            (Namespace::Main, None) => f.write_str("Main"),
            _ => write!(f, "{}", self.id()),
        }
    }
}

/// Normalizes a raw title the way MediaWiki stores it: trimmed, spaces
/// replaced by underscores, first character uppercased.
pub fn normalize_title(raw: &str) -> String {
    let trimmed = raw.trim().replace(' ', "_");
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Normalizes a category name, accepting an optional `Category:` prefix.
pub fn normalize_category_title(name: &str) -> String {
    match Namespace::split_title(name) {
        (Namespace::Category, rest) => normalize_title(rest),
        _ => normalize_title(name),
    }
}

/// Member sets carried by pages in the Category namespace
#[derive(Debug, Clone, Default)]
pub struct CategoryMembers {
    pub subcategories: BTreeSet<PageRef>,
    pub articles: BTreeSet<PageRef>,
}

#[derive(Debug, Clone)]
pub struct Page {
    pub(crate) namespace: Namespace,
    pub(crate) title: String,
    pub id: i64,
    pub is_redirect: bool,
    pub restrictions: String,
    pub length: u64,
    pub views: u64,
    pub categories: BTreeSet<PageRef>,
    pub templates: BTreeSet<PageRef>,
    pub internal_links: BTreeSet<PageRef>,
    pub external_links: BTreeSet<String>,
    /// Present exactly when the page lives in the Category namespace
    pub category: Option<CategoryMembers>,
}

impl Page {
    pub(crate) fn new(namespace: Namespace, title: String, id: i64, is_redirect: bool) -> Self {
        let category = (namespace == Namespace::Category).then(CategoryMembers::default);
        Self {
            namespace,
            title,
            id,
            is_redirect,
            restrictions: String::new(),
            length: 0,
            views: 0,
            categories: BTreeSet::new(),
            templates: BTreeSet::new(),
            internal_links: BTreeSet::new(),
            external_links: BTreeSet::new(),
            category,
        }
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn full_title(&self) -> String {
        self.namespace.prefixed(&self.title)
    }

    pub fn is_category(&self) -> bool {
        self.category.is_some()
    }

    /// Synthesized while loading links, never declared in the page table
    pub fn is_placeholder(&self) -> bool {
        self.id <= 0
    }
}

/// Author of a revision.
///
/// Anonymous users sort before registered ones; registered users sort by id
/// and then by name. The derived ordering relies on variant and field order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum User {
    Anonymous { ip: String },
    Registered { id: u64, name: String },
}

impl User {
    /// Builds a user from revision contributor fields; id 0 marks an IP edit.
    pub fn from_contributor(name: &str, id: u64) -> Self {
        if id == 0 {
            User::Anonymous {
                ip: name.trim().to_string(),
            }
        } else {
            User::Registered {
                id,
                name: normalize_title(name),
            }
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            User::Anonymous { ip } => ip,
            User::Registered { name, .. } => name,
        }
    }
}
