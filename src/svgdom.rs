//! Owned SVG tree: parsed with `roxmltree`, edited in place, serialized back.
//!
//! Attribute order is preserved. New attributes are appended, and rewriting an
//! existing one keeps its position, so repeated transforms produce identical
//! markup.

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SvgNode {
    Element(SvgElement),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvgElement {
    /// Qualified name as written, e.g. `svg` or `sodipodi:namedview`.
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<SvgNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvgDocument {
    root: SvgElement,
}

impl SvgDocument {
    pub fn parse(input: &str) -> Result<Self> {
        let options = roxmltree::ParsingOptions {
            allow_dtd: true,
            ..Default::default()
        };
        let doc = roxmltree::Document::parse_with_options(input, options).map_err(|err| {
            Error::SvgParse {
                message: err.to_string(),
            }
        })?;
        let root = doc.root_element();
        if root.tag_name().name() != "svg" {
            return Err(Error::SvgParse {
                message: format!("root element is <{}>, expected <svg>", root.tag_name().name()),
            });
        }
        Ok(Self {
            root: build_element(root, None),
        })
    }

    pub fn from_root(root: SvgElement) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &SvgElement {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut SvgElement {
        &mut self.root
    }

    /// Renames every `id` to `{prefix}-{id}` and rewrites `href` and `url(#...)`
    /// references to match, so the tree can be nested next to other documents.
    /// Returns how many ids were renamed.
    pub fn prefix_ids(&mut self, prefix: &str) -> usize {
        let mut ids: Vec<String> = Vec::new();
        self.root.walk(&mut |el| {
            if let Some(id) = el.attr("id") {
                ids.push(id.to_string());
            }
        });
        if ids.is_empty() {
            return 0;
        }

        let rename = |id: &str| format!("{prefix}-{id}");
        self.root.walk_mut(&mut |el| {
            for (key, value) in el.attrs.iter_mut() {
                if key == "id" {
                    *value = rename(value);
                } else if key == "href" || key.ends_with(":href") {
                    if let Some(target) = value.strip_prefix('#') {
                        if ids.iter().any(|id| id == target) {
                            *value = format!("#{}", rename(target));
                        }
                    }
                } else if value.contains("url(") {
                    for id in &ids {
                        for (open, close) in [("url(#", ")"), ("url('#", "')"), ("url(\"#", "\")")] {
                            let from = format!("{open}{id}{close}");
                            if value.contains(&from) {
                                *value = value.replace(&from, &format!("{open}{}{close}", rename(id)));
                            }
                        }
                    }
                }
            }
        });
        ids.len()
    }

    pub fn to_svg_string(&self) -> String {
        let mut out = String::new();
        write_element(&self.root, &mut out);
        out
    }
}

impl SvgElement {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn local_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(key, _)| key == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let idx = self.attrs.iter().position(|(key, _)| key == name)?;
        Some(self.attrs.remove(idx).1)
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &SvgElement> {
        self.children.iter().filter_map(|child| match child {
            SvgNode::Element(el) => Some(el),
            _ => None,
        })
    }

    /// Pre-order visit of this element and every descendant element.
    pub fn walk_mut(&mut self, visit: &mut impl FnMut(&mut SvgElement)) {
        visit(self);
        for child in &mut self.children {
            if let SvgNode::Element(el) = child {
                el.walk_mut(visit);
            }
        }
    }

    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a SvgElement)) {
        visit(self);
        for child in self.child_elements() {
            child.walk(visit);
        }
    }

    pub fn descendants_named(&self, local: &str) -> Vec<&SvgElement> {
        let mut found = Vec::new();
        self.walk(&mut |el| {
            if el.local_name() == local {
                found.push(el);
            }
        });
        found
    }

    /// Concatenated text content of this element and its descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            match child {
                SvgNode::Text(text) => out.push_str(text),
                SvgNode::Element(el) => out.push_str(&el.text_content()),
                SvgNode::Comment(_) => {}
            }
        }
        out
    }
}

fn build_element(node: roxmltree::Node<'_, '_>, parent: Option<roxmltree::Node<'_, '_>>) -> SvgElement {
    let mut attrs = Vec::new();

    for ns in node.namespaces() {
        if ns.name() == Some("xml") {
            continue;
        }
        let inherited = parent.is_some_and(|p| {
            p.namespaces()
                .any(|pns| pns.name() == ns.name() && pns.uri() == ns.uri())
        });
        if inherited {
            continue;
        }
        let key = match ns.name() {
            Some(prefix) => format!("xmlns:{prefix}"),
            None => "xmlns".to_string(),
        };
        attrs.push((key, ns.uri().to_string()));
    }

    for attr in node.attributes() {
        let key = match attr.namespace().and_then(|uri| node.lookup_prefix(uri)) {
            Some(prefix) if !prefix.is_empty() => format!("{prefix}:{}", attr.name()),
            _ => attr.name().to_string(),
        };
        attrs.push((key, attr.value().to_string()));
    }

    let tag = node.tag_name();
    let name = match tag.namespace().and_then(|uri| node.lookup_prefix(uri)) {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}:{}", tag.name()),
        _ => tag.name().to_string(),
    };

    let mut children = Vec::new();
    for child in node.children() {
        if child.is_element() {
            children.push(SvgNode::Element(build_element(child, Some(node))));
        } else if child.is_text() {
            if let Some(text) = child.text() {
                children.push(SvgNode::Text(text.to_string()));
            }
        } else if child.is_comment() {
            if let Some(text) = child.text() {
                children.push(SvgNode::Comment(text.to_string()));
            }
        }
    }

    SvgElement {
        name,
        attrs,
        children,
    }
}

fn write_element(el: &SvgElement, out: &mut String) {
    out.push('<');
    out.push_str(&el.name);
    for (key, value) in &el.attrs {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape_xml(value));
        out.push('"');
    }
    if el.children.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for child in &el.children {
        match child {
            SvgNode::Element(child) => write_element(child, out),
            SvgNode::Text(text) => out.push_str(&escape_text(text)),
            SvgNode::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
        }
    }
    out.push_str("</");
    out.push_str(&el.name);
    out.push('>');
}

pub(crate) fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn escape_text(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
