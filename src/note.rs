//! Loader for the Tomboy/Gnote `.note` XML format.
//!
//! A note file looks like this:
//! ```xml
//! <note version="0.3" xmlns="http://beatniksoftware.com/tomboy"
//!       xmlns:link="http://beatniksoftware.com/tomboy/link"
//!       xmlns:size="http://beatniksoftware.com/tomboy/size">
//!   <title>Groceries</title>
//!   <text xml:space="preserve"><note-content version="0.1">Groceries
//! Buy <bold>milk</bold></note-content></text>
//!   <last-change-date>2021-03-01T10:20:30.1234560+01:00</last-change-date>
//!   <create-date>2020-12-24T08:00:00.0000000+01:00</create-date>
//!   <tags><tag>system:notebook:Home</tag></tags>
//! </note>
//! ```
//!
//! Parsing produces an owned [`ContentNode`] tree, so nothing downstream
//! borrows from the XML document.
use std::sync::LazyLock;

use regex::Regex;
use roxmltree::{Document, Node, ParsingOptions};

pub const TOMBOY_NS: &str = "http://beatniksoftware.com/tomboy";
pub const LINK_NS: &str = "http://beatniksoftware.com/tomboy/link";
pub const SIZE_NS: &str = "http://beatniksoftware.com/tomboy/size";

/// Note schema versions the converter has been checked against.
pub const SUPPORTED_VERSIONS: [&str; 2] = ["0.2", "0.3"];

/// Placeholder used when a note has no timestamp element.
pub const DATE_NOT_FOUND: &str = "Not found";

static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4}-\d{2}-\d{2})T(\d{2}:\d{2}:\d{2})").unwrap());
static NOTEBOOK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)system:notebook:(.+)$").unwrap());

#[derive(Debug, thiserror::Error)]
pub enum NoteError {
    #[error("could not parse note (invalid file?)")]
    Parse(#[from] roxmltree::Error),
    #[error("could not find note title")]
    MissingTitle,
    #[error("could not find note content")]
    MissingContent,
}

impl NoteError {
    /// Errors that stop the whole run when strict mode is on.
    pub fn halts_in_strict_mode(&self) -> bool {
        matches!(self, NoteError::MissingTitle | NoteError::MissingContent)
    }
}

/// Element kinds that can appear inside `<note-content>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tag {
    List,
    ListItem,
    Italic,
    Bold,
    Strikethrough,
    Highlight,
    Monospace,
    Underline,
    InternalLink,
    BrokenLink,
    UrlLink,
    /// Any element of the size namespace (`small`, `large`, `huge`).
    Size(String),
    /// Tag outside the known vocabulary, kept as `{namespace}name`.
    Unknown(String),
}

impl Tag {
    pub fn classify(namespace: Option<&str>, name: &str) -> Tag {
        match (namespace, name) {
            (Some(TOMBOY_NS), "list") => Tag::List,
            (Some(TOMBOY_NS), "list-item") => Tag::ListItem,
            (Some(TOMBOY_NS), "italic") => Tag::Italic,
            (Some(TOMBOY_NS), "bold") => Tag::Bold,
            (Some(TOMBOY_NS), "strikethrough") => Tag::Strikethrough,
            (Some(TOMBOY_NS), "highlight") => Tag::Highlight,
            (Some(TOMBOY_NS), "monospace") => Tag::Monospace,
            (Some(TOMBOY_NS), "underline") => Tag::Underline,
            (Some(LINK_NS), "internal") => Tag::InternalLink,
            (Some(LINK_NS), "broken") => Tag::BrokenLink,
            (Some(LINK_NS), "url") => Tag::UrlLink,
            (Some(SIZE_NS), variant) => Tag::Size(variant.to_string()),
            (Some(ns), other) => Tag::Unknown(format!("{{{}}}{}", ns, other)),
            (None, other) => Tag::Unknown(other.to_string()),
        }
    }

    /// Zim markup placed on both sides of styled text. Empty for styles Zim
    /// has no equivalent for.
    pub fn wrapper(&self) -> &'static str {
        match self {
            Tag::Italic => "//",
            Tag::Bold => "**",
            Tag::Strikethrough => "~~",
            Tag::Highlight => "__",
            Tag::Monospace => "''",
            _ => "",
        }
    }
}

/// One element of the note body with its positional text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentNode {
    pub tag: Tag,
    /// Text between the opening tag and the first child.
    pub text: Option<String>,
    /// Text between the closing tag and the next sibling.
    pub tail: Option<String>,
    pub children: Vec<ContentNode>,
}

impl ContentNode {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            text: None,
            tail: None,
            children: Vec::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_tail(mut self, tail: impl Into<String>) -> Self {
        self.tail = Some(tail.into());
        self
    }

    pub fn with_child(mut self, child: ContentNode) -> Self {
        self.children.push(child);
        self
    }

    fn from_xml(node: Node<'_, '_>) -> Self {
        let name = node.tag_name();
        Self {
            tag: Tag::classify(name.namespace(), name.name()),
            text: text_run(node.first_child()),
            tail: text_run(node.next_sibling()),
            children: node
                .children()
                .filter(Node::is_element)
                .map(ContentNode::from_xml)
                .collect(),
        }
    }
}

// Concatenates the text nodes from `start` up to the next element. Comments
// and processing instructions in between are skipped, not treated as a stop.
fn text_run(start: Option<Node<'_, '_>>) -> Option<String> {
    std::iter::successors(start, |n| n.next_sibling())
        .take_while(|n| !n.is_element())
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .fold(None, |acc: Option<String>, t| {
            let mut acc = acc.unwrap_or_default();
            acc.push_str(t);
            Some(acc)
        })
}

#[derive(Debug, Clone)]
pub struct Note {
    pub version: Option<String>,
    pub title: String,
    pub last_change_date: String,
    pub create_date: String,
    pub notebook: Option<String>,
    /// The `<note-content>` element.
    pub content: ContentNode,
}

pub fn is_supported_version(version: Option<&str>) -> bool {
    version.is_some_and(|v| SUPPORTED_VERSIONS.contains(&v))
}

pub fn parse_note(xml: &str) -> Result<Note, NoteError> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(xml, options)?;
    let root = doc.root_element();

    let mut title = None;
    let mut last_change_date = None;
    let mut create_date = None;
    let mut notebook = None;
    let mut content = None;

    for child in root.children().filter(Node::is_element) {
        let name = child.tag_name();
        if name.namespace() != Some(TOMBOY_NS) {
            continue;
        }
        match name.name() {
            "title" => title = child.text().filter(|t| !t.is_empty()).map(str::to_string),
            "last-change-date" => last_change_date = Some(format_date(child.text())),
            "create-date" => create_date = Some(format_date(child.text())),
            "tags" => notebook = find_notebook(child),
            "text" => {
                content = child
                    .descendants()
                    .find(|n| n.has_tag_name((TOMBOY_NS, "note-content")))
                    .map(ContentNode::from_xml);
            }
            _ => {}
        }
    }

    Ok(Note {
        version: root.attribute("version").map(str::to_string),
        title: title.ok_or(NoteError::MissingTitle)?,
        last_change_date: last_change_date.unwrap_or_else(|| DATE_NOT_FOUND.to_string()),
        create_date: create_date.unwrap_or_else(|| DATE_NOT_FOUND.to_string()),
        notebook,
        content: content.ok_or(NoteError::MissingContent)?,
    })
}

/// `2021-03-01T10:20:30.1234560+01:00` becomes `2021-03-01 10:20:30`.
/// Text without a recognizable timestamp is kept verbatim.
fn format_date(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return DATE_NOT_FOUND.to_string();
    };
    match DATE_RE.captures(raw) {
        Some(caps) => format!("{} {}", &caps[1], &caps[2]),
        None => raw.to_string(),
    }
}

// Only `system:notebook:<name>` entries name a folder; `system:template`
// and plain user tags are skipped.
fn find_notebook(tags: Node<'_, '_>) -> Option<String> {
    tags.descendants()
        .filter(|n| n.has_tag_name((TOMBOY_NS, "tag")))
        .filter_map(|n| n.text())
        .find_map(|t| NOTEBOOK_RE.captures(t).map(|caps| caps[1].to_string()))
}
