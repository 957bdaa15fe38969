use crate::error::Error;
use crate::model::{Block, Document, Drawing, Inline, Paragraph, Run, RunContent, text_element};
use crate::package::{DOCUMENT_PART, Package};
use crate::xml::{Element, Node, WML_NS, WPD_NS};

fn is_wml(node: roxmltree::Node, name: &str) -> bool {
    node.tag_name().name() == name && node.tag_name().namespace() == Some(WML_NS)
}

fn wml<'a>(node: roxmltree::Node<'a, 'a>, name: &str) -> Option<roxmltree::Node<'a, 'a>> {
    node.children().find(|n| is_wml(*n, name))
}

fn owned(node: roxmltree::Node) -> Node {
    match node.text().filter(|_| node.is_text()) {
        Some(text) => Node::Text(text.to_string()),
        None => Node::Element(Element::from_node(node)),
    }
}

fn keep(node: roxmltree::Node) -> bool {
    node.is_element() || node.is_text()
}

pub fn load(package: &Package) -> Result<Document, Error> {
    parse(&package.part_text(DOCUMENT_PART)?)
}

pub fn store(doc: &Document, package: &mut Package) {
    package.set_part(DOCUMENT_PART, to_xml(doc).into_bytes());
}

pub fn parse(xml_content: &str) -> Result<Document, Error> {
    let xml = roxmltree::Document::parse(xml_content)?;
    let root_node = xml.root_element();
    if !is_wml(root_node, "document") {
        return Err(Error::InvalidDocx("root element is not w:document".into()));
    }
    let body_node =
        wml(root_node, "body").ok_or_else(|| Error::InvalidDocx("missing w:body".into()))?;

    let mut root = Element::shell(root_node);
    let mut body_index = 0;
    for child in root_node.children().filter(|n| keep(*n)) {
        if child == body_node {
            body_index = root.children.len();
            root.children.push(Node::Element(Element::wml("body")));
        } else {
            root.children.push(owned(child));
        }
    }

    let mut blocks = Vec::new();
    for node in body_node.children().filter(|n| keep(*n)) {
        let block = if is_wml(node, "p") {
            Block::Paragraph(parse_paragraph(node))
        } else if is_wml(node, "tbl") {
            Block::Table(Element::from_node(node))
        } else {
            Block::Other(owned(node))
        };
        blocks.push(block);
    }

    Ok(Document { root, body_index, body: Element::shell(body_node), blocks })
}

fn parse_paragraph(node: roxmltree::Node) -> Paragraph {
    let mut properties = None;
    let mut inlines = Vec::new();
    for child in node.children().filter(|n| keep(*n)) {
        if is_wml(child, "pPr") {
            properties = Some(Element::from_node(child));
        } else if is_wml(child, "r") {
            inlines.push(Inline::Run(parse_run(child)));
        } else {
            inlines.push(Inline::Other(owned(child)));
        }
    }
    Paragraph { shell: Element::shell(node), properties, inlines }
}

fn parse_run(node: roxmltree::Node) -> Run {
    let mut properties = None;
    let mut content = Vec::new();
    for child in node.children().filter(|n| keep(*n)) {
        if is_wml(child, "rPr") {
            properties = Some(Element::from_node(child));
        } else if is_wml(child, "t") {
            content.push(RunContent::Text(child.text().unwrap_or_default().to_string()));
        } else if is_wml(child, "tab") {
            content.push(RunContent::Tab(Element::from_node(child)));
        } else if is_wml(child, "drawing") && has_picture_container(child) {
            content.push(RunContent::Drawing(Drawing { element: Element::from_node(child) }));
        } else {
            content.push(RunContent::Other(owned(child)));
        }
    }
    Run { shell: Element::shell(node), properties, content }
}

fn has_picture_container(drawing: roxmltree::Node) -> bool {
    drawing.children().any(|container| {
        let name = container.tag_name().name();
        (name == "inline" || name == "anchor") && container.tag_name().namespace() == Some(WPD_NS)
    })
}

pub fn to_xml(doc: &Document) -> String {
    to_element(doc).to_xml()
}

/// Reassembles `w:document` with the current blocks spliced into the body.
pub fn to_element(doc: &Document) -> Element {
    let mut body = doc.body.clone();
    body.children = doc.blocks.iter().map(block_node).collect();
    let mut root = doc.root.clone();
    if let Some(slot) = root.children.get_mut(doc.body_index) {
        *slot = Node::Element(body);
    }
    root
}

fn block_node(block: &Block) -> Node {
    match block {
        Block::Paragraph(p) => Node::Element(paragraph_element(p)),
        Block::Table(t) => Node::Element(t.clone()),
        Block::Other(n) => n.clone(),
    }
}

pub(crate) fn paragraph_element(paragraph: &Paragraph) -> Element {
    let mut el = paragraph.shell.clone();
    if let Some(ppr) = &paragraph.properties {
        el.children.push(Node::Element(ppr.clone()));
    }
    for inline in &paragraph.inlines {
        el.children.push(match inline {
            Inline::Run(r) => Node::Element(run_element(r)),
            Inline::Other(n) => n.clone(),
        });
    }
    el
}

fn run_element(run: &Run) -> Element {
    let mut el = run.shell.clone();
    if let Some(rpr) = &run.properties {
        el.children.push(Node::Element(rpr.clone()));
    }
    for item in &run.content {
        el.children.push(match item {
            RunContent::Text(t) => Node::Element(text_element(t)),
            RunContent::Tab(e) => Node::Element(e.clone()),
            RunContent::Drawing(d) => Node::Element(d.element.clone()),
            RunContent::Other(n) => n.clone(),
        });
    }
    el
}

/// Highest `wp:docPr/@id` anywhere in the document, so new drawings get a
/// unique id.
pub fn max_drawing_id(doc: &Document) -> u32 {
    fn walk(el: &Element, max: &mut u32) {
        if el.is(WPD_NS, "docPr")
            && let Some(id) = el.attr(None, "id").and_then(|v| v.parse::<u32>().ok())
        {
            *max = (*max).max(id);
        }
        for child in el.elements() {
            walk(child, max);
        }
    }
    let mut max = 0;
    walk(&to_element(doc), &mut max);
    max
}
