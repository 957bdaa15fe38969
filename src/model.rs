use serde::{Deserialize, Serialize};

use crate::xml::{DML_NS, Element, Node, PIC_NS, QName, REL_NS, WML_NS, WPD_NS, XML_NS};

/// English Metric Units per inch, the native length unit of DrawingML.
pub const EMU_PER_INCH: f64 = 914_400.0;
/// Twentieths of a point per inch, used for table and cell widths.
pub const TWIPS_PER_INCH: f64 = 1_440.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
}

impl Alignment {
    pub fn as_wml(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
        }
    }
}

/// The body of `word/document.xml`. Everything outside the body is kept
/// verbatim in `root`; the body's block children live in `blocks`.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub(crate) root: Element,
    pub(crate) body_index: usize,
    pub(crate) body: Element,
    pub blocks: Vec<Block>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Element),
    Other(Node),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Paragraph {
    pub(crate) shell: Element,
    pub properties: Option<Element>,
    pub inlines: Vec<Inline>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Inline {
    Run(Run),
    Other(Node),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Run {
    pub(crate) shell: Element,
    pub properties: Option<Element>,
    pub content: Vec<RunContent>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RunContent {
    Text(String),
    Tab(Element),
    Drawing(Drawing),
    Other(Node),
}

/// A `w:drawing` element. Only the parts the pipeline needs are decoded;
/// the element itself is kept whole.
#[derive(Clone, Debug, PartialEq)]
pub struct Drawing {
    pub element: Element,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RunFont {
    pub name: Option<String>,
    pub east_asia: Option<String>,
    pub size_pt: Option<f32>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl Document {
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Paragraph(p) => Some(p),
            _ => None,
        })
    }

    /// Visible text of every body paragraph, one entry per paragraph.
    pub fn paragraph_texts(&self) -> Vec<String> {
        self.paragraphs().map(Paragraph::text).collect()
    }
}

impl Paragraph {
    pub fn new() -> Self {
        Paragraph { shell: Element::wml("p"), properties: None, inlines: Vec::new() }
    }

    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.inlines.iter().filter_map(|i| match i {
            Inline::Run(r) => Some(r),
            Inline::Other(_) => None,
        })
    }

    pub fn runs_mut(&mut self) -> impl Iterator<Item = &mut Run> {
        self.inlines.iter_mut().filter_map(|i| match i {
            Inline::Run(r) => Some(r),
            Inline::Other(_) => None,
        })
    }

    pub fn run(&self, index: usize) -> Option<&Run> {
        self.runs().nth(index)
    }

    pub fn run_mut(&mut self, index: usize) -> Option<&mut Run> {
        self.runs_mut().nth(index)
    }

    pub fn run_count(&self) -> usize {
        self.runs().count()
    }

    pub fn run_texts(&self) -> Vec<String> {
        self.runs().map(Run::text).collect()
    }

    pub fn text(&self) -> String {
        self.runs().map(Run::text).collect()
    }

    pub fn push_run(&mut self, run: Run) {
        self.inlines.push(Inline::Run(run));
    }

    pub fn alignment(&self) -> Option<&str> {
        self.properties
            .as_ref()
            .and_then(|ppr| ppr.child(WML_NS, "jc"))
            .and_then(|jc| jc.wml_attr("val"))
    }

    pub fn set_alignment(&mut self, alignment: Alignment) {
        let ppr = self.properties.get_or_insert_with(|| Element::wml("pPr"));
        ppr.remove_children(WML_NS, "jc");
        ppr.children.push(Node::Element(Element::wml("jc").with_wml_attr("val", alignment.as_wml())));
    }
}

impl Default for Paragraph {
    fn default() -> Self {
        Paragraph::new()
    }
}

impl Run {
    pub fn new(text: &str) -> Self {
        let mut run = Run { shell: Element::wml("r"), properties: None, content: Vec::new() };
        run.set_text(text);
        run
    }

    /// Text as Word displays it: `w:t` content with `w:tab` as a tab character.
    pub fn text(&self) -> String {
        let mut text = String::new();
        for item in &self.content {
            match item {
                RunContent::Text(t) => text.push_str(t),
                RunContent::Tab(_) => text.push('\t'),
                RunContent::Drawing(_) | RunContent::Other(_) => {}
            }
        }
        text
    }

    /// Replaces the run's text, keeping drawings, breaks and other content.
    /// The new text takes the position of the first text item removed.
    pub fn set_text(&mut self, text: &str) {
        let at = self
            .content
            .iter()
            .position(|c| matches!(c, RunContent::Text(_) | RunContent::Tab(_)))
            .unwrap_or(self.content.len());
        self.content.retain(|c| !matches!(c, RunContent::Text(_) | RunContent::Tab(_)));
        let at = at.min(self.content.len());
        if !text.is_empty() {
            self.content.insert(at, RunContent::Text(text.to_string()));
        }
    }

    pub fn drawings(&self) -> impl Iterator<Item = &Drawing> {
        self.content.iter().filter_map(|c| match c {
            RunContent::Drawing(d) => Some(d),
            _ => None,
        })
    }

    pub fn has_drawing(&self) -> bool {
        self.drawings().next().is_some()
    }

    pub fn font(&self) -> RunFont {
        let Some(rpr) = &self.properties else {
            return RunFont::default();
        };
        let rfonts = rpr.child(WML_NS, "rFonts");
        RunFont {
            name: rfonts.and_then(|f| f.wml_attr("ascii")).map(String::from),
            east_asia: rfonts.and_then(|f| f.wml_attr("eastAsia")).map(String::from),
            size_pt: rpr
                .child(WML_NS, "sz")
                .and_then(|sz| sz.wml_attr("val"))
                .and_then(|v| v.parse::<f32>().ok())
                .map(|hp| hp / 2.0),
            bold: toggle(rpr, "b"),
            italic: toggle(rpr, "i"),
            underline: rpr
                .child(WML_NS, "u")
                .is_some_and(|u| u.wml_attr("val") != Some("none")),
        }
    }

    /// Copies typeface, size, bold, italic and underline from `source`.
    /// Properties the source does not set are left alone.
    pub fn copy_font_from(&mut self, source: &Run) {
        let Some(src) = &source.properties else { return };
        let dst = self.properties.get_or_insert_with(|| Element::wml("rPr"));
        for name in FONT_PROPERTIES {
            if let Some(prop) = src.child(WML_NS, name) {
                dst.remove_children(WML_NS, name);
                dst.children.push(Node::Element(prop.clone()));
            }
        }
    }
}

/// Run properties carried over by `copy_font_from`, in schema order.
const FONT_PROPERTIES: [&str; 8] = ["rFonts", "b", "bCs", "i", "iCs", "sz", "szCs", "u"];

fn toggle(rpr: &Element, name: &str) -> bool {
    rpr.child(WML_NS, name)
        .is_some_and(|e| !matches!(e.wml_attr("val"), Some("0" | "false" | "off")))
}

impl Drawing {
    fn container(&self) -> Option<&Element> {
        self.element
            .elements()
            .find(|e| e.is(WPD_NS, "inline") || e.is(WPD_NS, "anchor"))
    }

    pub fn is_inline(&self) -> bool {
        self.container().is_some_and(|c| c.is(WPD_NS, "inline"))
    }

    /// Declared display size `(cx, cy)` in EMU.
    pub fn extent(&self) -> Option<(u64, u64)> {
        let extent = self.container()?.child(WPD_NS, "extent")?;
        let cx = extent.attr(None, "cx")?.parse().ok()?;
        let cy = extent.attr(None, "cy")?.parse().ok()?;
        Some((cx, cy))
    }

    /// Relationship id of the embedded picture (`a:blip/@r:embed`).
    pub fn embed_id(&self) -> Option<&str> {
        self.container()?.find(DML_NS, "blip")?.attr(Some(REL_NS), "embed")
    }

    pub fn doc_pr_id(&self) -> Option<u32> {
        self.container()?.child(WPD_NS, "docPr")?.attr(None, "id")?.parse().ok()
    }

    /// A fresh inline picture of `cx` × `cy` EMU showing relationship `rel_id`.
    pub fn new_inline(cx: u64, cy: u64, rel_id: &str, id: u32, name: &str) -> Drawing {
        let wp = |local: &str| Element::new(QName::new(WPD_NS, "wp", local));
        let a = |local: &str| Element::new(QName::new(DML_NS, "a", local));
        let pic = |local: &str| Element::new(QName::new(PIC_NS, "pic", local));
        let plain = QName::plain;

        let blip_fill = pic("blipFill")
            .with_child(a("blip").with_attr(QName::new(REL_NS, "r", "embed"), rel_id))
            .with_child(a("stretch").with_child(a("fillRect")));
        let shape_properties = pic("spPr")
            .with_child(
                a("xfrm")
                    .with_child(a("off").with_attr(plain("x"), "0").with_attr(plain("y"), "0"))
                    .with_child(
                        a("ext")
                            .with_attr(plain("cx"), cx.to_string())
                            .with_attr(plain("cy"), cy.to_string()),
                    ),
            )
            .with_child(a("prstGeom").with_attr(plain("prst"), "rect").with_child(a("avLst")));
        let picture = pic("pic")
            .with_child(
                pic("nvPicPr")
                    .with_child(
                        pic("cNvPr").with_attr(plain("id"), "0").with_attr(plain("name"), name),
                    )
                    .with_child(pic("cNvPicPr")),
            )
            .with_child(blip_fill)
            .with_child(shape_properties);

        let mut inline = wp("inline");
        for side in ["distT", "distB", "distL", "distR"] {
            inline.set_attr(plain(side), "0");
        }
        let inline = inline
            .with_child(
                wp("extent")
                    .with_attr(plain("cx"), cx.to_string())
                    .with_attr(plain("cy"), cy.to_string()),
            )
            .with_child(
                wp("effectExtent")
                    .with_attr(plain("l"), "0")
                    .with_attr(plain("t"), "0")
                    .with_attr(plain("r"), "0")
                    .with_attr(plain("b"), "0"),
            )
            .with_child(
                wp("docPr").with_attr(plain("id"), id.to_string()).with_attr(plain("name"), name),
            )
            .with_child(
                wp("cNvGraphicFramePr")
                    .with_child(a("graphicFrameLocks").with_attr(plain("noChangeAspect"), "1")),
            )
            .with_child(
                a("graphic").with_child(
                    a("graphicData").with_attr(plain("uri"), PIC_NS).with_child(picture),
                ),
            );

        Drawing { element: Element::wml("drawing").with_child(inline) }
    }
}

pub(crate) fn text_element(text: &str) -> Element {
    let mut t = Element::wml("t");
    if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
        t.set_attr(QName::new(XML_NS, "xml", "space"), "preserve");
    }
    t.with_text(text)
}
