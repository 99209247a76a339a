//! Hierarchical text form of a schema document
//!
//! Tooling edits schemas as a tree: one root element with the document
//! scalars plus one `Field` node per descriptor. Each `Field` node carries a
//! required composite `Def` attribute (`<type> <name>[ :<bits> | [<len>] ][ = <default>]`)
//! and up to nine optional child elements for the remaining metadata.
//!
//! Optional children follow the **sparse defaulting** contract: the encoder
//! writes a child only when its value differs from the computed default for
//! the field's storage kind, and the decoder fills absent children from the
//! same default table, so encode/decode stay symmetric.
//!
//! Two text versions exist, differing only in the element names used for
//! the data version and format version scalars: version 0 uses the legacy
//! `Unk06`/`Version`, version 1 uses `DataVersion`/`FormatVersion`. The
//! decoder accepts either transparently.
//!
//! The tree itself is a plain in-memory value ([`Node`]); no markup
//! (de)serialization layer is part of this crate.

mod read;
mod write;


pub use read::decode_text;
pub use write::encode_text;

use serde::{Deserialize, Serialize};

/// Newest text version produced by [`encode_text`].
pub const TEXT_VERSION_CURRENT: u32 = 1;

/// One element of the hierarchical text form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Element name.
    pub name: String,
    /// Attributes in document order.
    pub attributes: Vec<(String, String)>,
    /// Text content.
    pub text: String,
    /// Child elements in document order.
    pub children: Vec<Node>,
}

impl Node {
    /// Create an empty element.
    pub fn new(name: impl Into<String>) -> Node {
        Node {
            name: name.into(),
            ..Node::default()
        }
    }

    /// Create an element holding only text content.
    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Node {
        Node {
            name: name.into(),
            text: text.into(),
            ..Node::default()
        }
    }

    /// Append an attribute.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.push((name.into(), value.into()));
    }

    /// Look up an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(attr, _)| attr == name)
            .map(|(_, value)| value.as_str())
    }

    /// Append a child element.
    pub fn push(&mut self, child: Node) {
        self.children.push(child);
    }

    /// First child element with the given name.
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Text content of the first child with the given name.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|child| child.text.as_str())
    }

    /// All children with the given name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> {
        self.children.iter().filter(move |child| child.name == name)
    }
}
