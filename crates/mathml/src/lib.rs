//! A light-weight presentation MathML tree.
//!
//! This crate holds the node types produced by the `texmath` converter and a
//! markup writer for them. Nodes are plain data: a type tag, child nodes (or
//! leaf text), and attribute/class/style maps. Attribute and style maps are
//! ordered so that the emitted markup is deterministic.

use std::collections::BTreeMap;
use std::fmt::Write;

/// The closed set of MathML element types this crate emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MathNodeType {
    Math,
    Mrow,
    Mi,
    Mn,
    Mo,
    Mtext,
    Mspace,
    Mtable,
    Mtr,
    Mtd,
    Mstyle,
    Msub,
    Msup,
    Msubsup,
}

impl MathNodeType {
    /// The element's tag name.
    pub fn tag(&self) -> &'static str {
        match self {
            MathNodeType::Math => "math",
            MathNodeType::Mrow => "mrow",
            MathNodeType::Mi => "mi",
            MathNodeType::Mn => "mn",
            MathNodeType::Mo => "mo",
            MathNodeType::Mtext => "mtext",
            MathNodeType::Mspace => "mspace",
            MathNodeType::Mtable => "mtable",
            MathNodeType::Mtr => "mtr",
            MathNodeType::Mtd => "mtd",
            MathNodeType::Mstyle => "mstyle",
            MathNodeType::Msub => "msub",
            MathNodeType::Msup => "msup",
            MathNodeType::Msubsup => "msubsup",
        }
    }
}

/// A single MathML element.
///
/// Container elements carry `children`; token elements (`mi`, `mn`, `mo`,
/// `mtext`) carry `text`. Nothing stops an element from carrying both, but
/// the writer emits children after text and the converter never mixes them.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MathNode {
    pub node_type: MathNodeType,
    pub children: Vec<MathNode>,
    pub text: String,
    pub attributes: BTreeMap<String, String>,
    pub classes: Vec<String>,
    pub style: BTreeMap<String, String>,
}

impl MathNode {
    /// Create a container element.
    pub fn new(node_type: MathNodeType, children: Vec<MathNode>) -> MathNode {
        MathNode {
            node_type,
            children,
            text: String::new(),
            attributes: BTreeMap::new(),
            classes: Vec::new(),
            style: BTreeMap::new(),
        }
    }

    /// Create a token element holding text.
    pub fn text<T: Into<String>>(node_type: MathNodeType, text: T) -> MathNode {
        MathNode {
            node_type,
            children: Vec::new(),
            text: text.into(),
            attributes: BTreeMap::new(),
            classes: Vec::new(),
            style: BTreeMap::new(),
        }
    }

    /// Create an element with no children and no text.
    pub fn empty(node_type: MathNodeType) -> MathNode {
        MathNode::new(node_type, Vec::new())
    }

    pub fn set_attribute<K: Into<String>, V: Into<String>>(&mut self, name: K, value: V) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Set an inline style property. Property names are the hyphenated CSS
    /// names (`text-align`, not `textAlign`).
    pub fn set_style<K: Into<String>, V: Into<String>>(&mut self, property: K, value: V) {
        self.style.insert(property.into(), value.into());
    }

    /// Write this node and its descendants as markup.
    pub fn to_markup(&self) -> String {
        let mut buffer = String::new();
        self.write_markup(&mut buffer);
        buffer
    }

    fn write_markup(&self, buffer: &mut String) {
        write!(buffer, "<{}", self.node_type.tag()).unwrap();
        for (name, value) in &self.attributes {
            write!(buffer, " {}=\"{}\"", name, escape(value)).unwrap();
        }
        if !self.classes.is_empty() {
            write!(buffer, " class=\"{}\"", escape(&self.classes.join(" "))).unwrap();
        }
        if !self.style.is_empty() {
            buffer.push_str(" style=\"");
            for (property, value) in &self.style {
                write!(buffer, "{}:{};", property, escape(value)).unwrap();
            }
            buffer.push('"');
        }
        buffer.push('>');
        buffer.push_str(&escape(&self.text));
        for child in &self.children {
            child.write_markup(buffer);
        }
        write!(buffer, "</{}>", self.node_type.tag()).unwrap();
    }
}

/// A sequence of sibling nodes with no element of its own.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DocumentFragment {
    pub children: Vec<MathNode>,
}

impl DocumentFragment {
    pub fn new(children: Vec<MathNode>) -> DocumentFragment {
        DocumentFragment { children }
    }

    pub fn to_markup(&self) -> String {
        let mut buffer = String::new();
        for child in &self.children {
            child.write_markup(&mut buffer);
        }
        buffer
    }
}

/// Escape text for inclusion in markup.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '>' => escaped.push_str("&gt;"),
            '<' => escaped.push_str("&lt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Format a length in ems, rounded to the nearest 1/10,000 em.
///
/// The TeXbook gives an acceptable rounding error of 100sp, which is coarser
/// than this.
pub fn em(size: f64) -> String {
    let rounded = (size * 10000.0).round() / 10000.0;
    // Avoid "-0em" for tiny negative values.
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{}em", rounded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markup_token_element() {
        let node = MathNode::text(MathNodeType::Mi, "x");
        assert_eq!(node.to_markup(), "<mi>x</mi>");
    }

    #[test]
    fn markup_escapes_text() {
        let node = MathNode::text(MathNodeType::Mo, "<");
        assert_eq!(node.to_markup(), "<mo>&lt;</mo>");
    }

    #[test]
    fn markup_attributes_classes_and_style() {
        let mut node = MathNode::empty(MathNodeType::Mtd);
        node.set_attribute("columnalign", "left");
        node.classes.push("tml-tag".to_string());
        node.set_style("padding", "0");
        node.set_style("width", "50%");
        assert_eq!(
            node.to_markup(),
            "<mtd columnalign=\"left\" class=\"tml-tag\" style=\"padding:0;width:50%;\"></mtd>"
        );
    }

    #[test]
    fn markup_nested() {
        let row = MathNode::new(
            MathNodeType::Mrow,
            vec![
                MathNode::text(MathNodeType::Mi, "a"),
                MathNode::text(MathNodeType::Mo, "+"),
                MathNode::text(MathNodeType::Mi, "b"),
            ],
        );
        assert_eq!(row.to_markup(), "<mrow><mi>a</mi><mo>+</mo><mi>b</mi></mrow>");
    }

    #[test]
    fn em_rounds_to_four_places() {
        assert_eq!(em(0.16), "0.16em");
        assert_eq!(em(0.27777777), "0.2778em");
        assert_eq!(em(1.0), "1em");
        assert_eq!(em(0.0), "0em");
    }

    #[test]
    fn fragment_markup() {
        let fragment = DocumentFragment::new(vec![
            MathNode::text(MathNodeType::Mi, "a"),
            MathNode::text(MathNodeType::Mi, "b"),
        ]);
        assert_eq!(fragment.to_markup(), "<mi>a</mi><mi>b</mi>");
    }
}
