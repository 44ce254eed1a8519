//! Tomboy note content to Zim markup.
//!
//! Rendering is pure: the walker never logs. Anything worth reporting (tags
//! it does not understand) comes back as a [`Diagnostic`] next to the text.
use crate::note::{ContentNode, Tag};

const INDENT: &str = "\t";
const BULLET: &str = "* ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    UnknownTag { tag: String },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::UnknownTag { tag } => {
                write!(f, "Unknown/unsupported tag in source note: '{}'", tag)
            }
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Render a `<note-content>` element as the body of a Zim page.
///
/// The first line of the content repeats the note title, so it is dropped.
pub fn render_content(root: &ContentNode) -> Rendered {
    let mut walker = Walker::default();
    if let Some(text) = &root.text {
        walker.out.push_str(strip_title_line(text));
    }
    walker.walk(root, 0);
    if let Some(tail) = &root.tail {
        walker.out.push_str(tail);
    }
    Rendered {
        text: walker.out,
        diagnostics: walker.diagnostics,
    }
}

/// Wrap a single styled element. Children are ignored.
///
/// When the element has no text of its own the tail is dropped as well.
pub fn format_inline(node: &ContentNode, wrapper: &str) -> String {
    match node.text.as_deref() {
        Some(text) if !text.is_empty() => {
            let mut out = format!("{wrapper}{text}{wrapper}");
            if let Some(tail) = &node.tail {
                out.push_str(tail);
            }
            out
        }
        _ => String::new(),
    }
}

// Drops a leading non-empty line together with its newline. A body that
// starts with a newline, or has none, is left alone.
fn strip_title_line(text: &str) -> &str {
    match text.find('\n') {
        Some(idx) if idx > 0 => &text[idx + 1..],
        _ => text,
    }
}

#[derive(Default)]
struct Walker {
    out: String,
    diagnostics: Vec<Diagnostic>,
}

impl Walker {
    fn walk(&mut self, node: &ContentNode, depth: usize) {
        for child in &node.children {
            match &child.tag {
                Tag::List => {
                    self.walk(child, depth + 1);
                    self.push_opt(&child.tail);
                }
                Tag::ListItem => {
                    self.out.push_str(&INDENT.repeat(depth));
                    self.out.push_str(BULLET);
                    self.push_opt(&child.text);
                    // The item's tail goes before its nested children.
                    self.push_opt(&child.tail);
                    self.walk(child, depth);
                }
                Tag::InternalLink | Tag::BrokenLink => {
                    if let Some(text) = &child.text {
                        self.out.push_str("[[");
                        self.out.push_str(text);
                        self.out.push_str("]]");
                    }
                    self.push_opt(&child.tail);
                }
                Tag::Unknown(name) => {
                    self.diagnostics.push(Diagnostic::UnknownTag { tag: name.clone() });
                    let formatted = format_inline(child, "");
                    if formatted.is_empty() {
                        self.push_opt(&child.tail);
                    } else {
                        self.out.push_str(&formatted);
                    }
                }
                Tag::UrlLink | Tag::Underline | Tag::Size(_) => {
                    self.out.push_str(&format_inline(child, ""));
                }
                Tag::Italic | Tag::Bold | Tag::Strikethrough | Tag::Highlight | Tag::Monospace => {
                    self.out.push_str(&format_inline(child, child.tag.wrapper()));
                }
            }
        }
    }

    fn push_opt(&mut self, text: &Option<String>) {
        if let Some(text) = text {
            self.out.push_str(text);
        }
    }
}
