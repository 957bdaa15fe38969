use crate::error::Error;

pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";
pub const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub const DML_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub const WPD_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
pub const PIC_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
pub const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QName {
    pub namespace: Option<String>,
    pub prefix: Option<String>,
    pub local: String,
}

impl QName {
    pub fn new(namespace: &str, prefix: &str, local: &str) -> Self {
        QName {
            namespace: Some(namespace.to_string()),
            prefix: Some(prefix.to_string()),
            local: local.to_string(),
        }
    }

    /// A name outside any namespace (plain attributes such as `cx`).
    pub fn plain(local: &str) -> Self {
        QName { namespace: None, prefix: None, local: local.to_string() }
    }

    pub fn wml(local: &str) -> Self {
        QName::new(WML_NS, "w", local)
    }

    pub fn is(&self, namespace: &str, local: &str) -> bool {
        self.local == local && self.namespace.as_deref() == Some(namespace)
    }

    fn qualified(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}:{}", self.local),
            None => self.local.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Namespace {
    pub prefix: Option<String>,
    pub uri: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub name: QName,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// Owned element. Keeps its namespace URI for matching, its prefix for
/// writing and the declarations it carried, so untouched markup survives a
/// round trip.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    pub name: QName,
    pub namespaces: Vec<Namespace>,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: QName) -> Self {
        Element { name, namespaces: Vec::new(), attributes: Vec::new(), children: Vec::new() }
    }

    pub fn wml(local: &str) -> Self {
        Element::new(QName::wml(local))
    }

    pub fn parse(xml: &str) -> Result<Element, Error> {
        let doc = roxmltree::Document::parse(xml)?;
        Ok(Element::from_node(doc.root_element()))
    }

    /// Copies a roxmltree element (and its subtree) into an owned element.
    /// Namespaces that are in scope at `node` but not at its parent are
    /// recorded as declarations on the copy.
    pub fn from_node(node: roxmltree::Node) -> Element {
        let mut element = Element::shell(node);
        for child in node.children() {
            if child.is_element() {
                element.children.push(Node::Element(Element::from_node(child)));
            } else if child.is_text()
                && let Some(text) = child.text()
            {
                element.children.push(Node::Text(text.to_string()));
            }
        }
        element
    }

    /// Copies a roxmltree element's name, declarations and attributes, but
    /// none of its children.
    pub fn shell(node: roxmltree::Node) -> Element {
        let inherited: Vec<(Option<&str>, &str)> = node
            .parent_element()
            .map(|p| p.namespaces().map(|ns| (ns.name(), ns.uri())).collect())
            .unwrap_or_default();
        let namespaces = node
            .namespaces()
            .filter(|ns| ns.uri() != XML_NS)
            .filter(|ns| !inherited.contains(&(ns.name(), ns.uri())))
            .map(|ns| Namespace { prefix: ns.name().map(String::from), uri: ns.uri().to_string() })
            .collect();

        let tag = node.tag_name();
        let name = QName {
            namespace: tag.namespace().map(String::from),
            prefix: tag.namespace().and_then(|uri| prefix_for(node, uri)),
            local: tag.name().to_string(),
        };

        let attributes = node
            .attributes()
            .map(|attr| Attribute {
                name: QName {
                    namespace: attr.namespace().map(String::from),
                    prefix: attr.namespace().and_then(|uri| prefix_for(node, uri)),
                    local: attr.name().to_string(),
                },
                value: attr.value().to_string(),
            })
            .collect();

        Element { name, namespaces, attributes, children: Vec::new() }
    }

    pub fn is(&self, namespace: &str, local: &str) -> bool {
        self.name.is(namespace, local)
    }

    pub fn is_wml(&self, local: &str) -> bool {
        self.name.is(WML_NS, local)
    }

    pub fn with_attr(mut self, name: QName, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Shorthand for a `w:`-qualified attribute, the common case in WordprocessingML.
    pub fn with_wml_attr(self, local: &str, value: impl Into<String>) -> Self {
        self.with_attr(QName::wml(local), value)
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn set_attr(&mut self, name: QName, value: impl Into<String>) {
        let value = value.into();
        match self
            .attributes
            .iter_mut()
            .find(|a| a.name.local == name.local && a.name.namespace == name.namespace)
        {
            Some(existing) => existing.value = value,
            None => self.attributes.push(Attribute { name, value }),
        }
    }

    pub fn attr(&self, namespace: Option<&str>, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.local == local && a.name.namespace.as_deref() == namespace)
            .map(|a| a.value.as_str())
    }

    pub fn wml_attr(&self, local: &str) -> Option<&str> {
        self.attr(Some(WML_NS), local)
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|c| match c {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    pub fn child(&self, namespace: &str, local: &str) -> Option<&Element> {
        self.elements().find(|e| e.is(namespace, local))
    }

    /// Depth-first search for the first descendant with the given name.
    pub fn find(&self, namespace: &str, local: &str) -> Option<&Element> {
        for child in self.elements() {
            if child.is(namespace, local) {
                return Some(child);
            }
            if let Some(found) = child.find(namespace, local) {
                return Some(found);
            }
        }
        None
    }

    pub fn remove_children(&mut self, namespace: &str, local: &str) {
        self.children.retain(|c| !matches!(c, Node::Element(e) if e.is(namespace, local)));
    }

    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|c| match c {
                Node::Text(t) => Some(t.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    /// Serializes the element as a standalone XML part, declaration included.
    pub fn to_xml(&self) -> String {
        let mut out = String::with_capacity(4096);
        out.push_str(DECLARATION);
        let mut scope = Vec::new();
        write_element(self, &mut out, &mut scope);
        out
    }
}

fn prefix_for(node: roxmltree::Node, uri: &str) -> Option<String> {
    if uri == XML_NS {
        return Some("xml".to_string());
    }
    node.namespaces()
        .filter(|ns| ns.uri() == uri)
        .find_map(|ns| ns.name())
        .map(String::from)
}

fn in_scope(scope: &[(Option<String>, String)], prefix: Option<&str>, uri: &str) -> bool {
    scope
        .iter()
        .rev()
        .find(|(p, _)| p.as_deref() == prefix)
        .is_some_and(|(_, u)| u == uri)
}

fn write_element(el: &Element, out: &mut String, scope: &mut Vec<(Option<String>, String)>) {
    let mark = scope.len();
    let mut declarations: Vec<(Option<String>, String)> = Vec::new();

    for ns in &el.namespaces {
        declarations.push((ns.prefix.clone(), ns.uri.clone()));
    }
    // Synthesized elements may use prefixes the surrounding part never declared.
    let attr_names = el.attributes.iter().map(|a| &a.name).filter(|n| n.prefix.is_some());
    for name in std::iter::once(&el.name).chain(attr_names) {
        let Some(uri) = name.namespace.as_deref() else { continue };
        if uri == XML_NS {
            continue;
        }
        let prefix = name.prefix.as_deref();
        let declared = declarations.iter().any(|(p, u)| p.as_deref() == prefix && u == uri);
        if !declared && !in_scope(scope, prefix, uri) {
            declarations.push((name.prefix.clone(), uri.to_string()));
        }
    }

    out.push('<');
    out.push_str(&el.name.qualified());
    for (prefix, uri) in &declarations {
        match prefix {
            Some(p) => out.push_str(&format!(" xmlns:{p}=\"")),
            None => out.push_str(" xmlns=\""),
        }
        out.push_str(&escape_attr(uri));
        out.push('"');
    }
    for attr in &el.attributes {
        out.push(' ');
        out.push_str(&attr.name.qualified());
        out.push_str("=\"");
        out.push_str(&escape_attr(&attr.value));
        out.push('"');
    }
    scope.extend(declarations);

    if el.children.is_empty() {
        out.push_str("/>");
    } else {
        out.push('>');
        for child in &el.children {
            match child {
                Node::Element(e) => write_element(e, out, scope),
                Node::Text(t) => out.push_str(&escape_text(t)),
            }
        }
        out.push_str("</");
        out.push_str(&el.name.qualified());
        out.push('>');
    }

    scope.truncate(mark);
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
