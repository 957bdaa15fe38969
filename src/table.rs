use std::fmt;

use crate::config::TableSpec;
use crate::docx::paragraph_element;
use crate::model::{Alignment, Paragraph, Run, TWIPS_PER_INCH};
use crate::xml::Element;

const BORDER_SIDES: [&str; 6] = ["top", "left", "bottom", "right", "insideH", "insideV"];

#[derive(Debug, Clone, PartialEq)]
pub enum LayoutError {
    InvalidWidth { column: &'static str, inches: f64 },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::InvalidWidth { column, inches } => {
                write!(f, "{column} column width {inches} in is not usable")
            }
        }
    }
}

impl std::error::Error for LayoutError {}

/// One side of the row: its text, alignment and the run whose font it takes.
pub struct Cell<'a> {
    pub text: &'a str,
    pub alignment: Option<Alignment>,
    pub font_from: Option<&'a Run>,
}

/// Borderless fixed-layout 1×2 table for a `label：value` line.
pub fn label_table(label: Cell, value: Cell, spec: &TableSpec) -> Result<Element, LayoutError> {
    let left = twips("left", spec.left_col_width_in)?;
    let right = twips("right", spec.right_col_width_in)?;

    let mut borders = Element::wml("tblBorders");
    for side in BORDER_SIDES {
        borders = borders.with_child(Element::wml(side).with_wml_attr("val", "nil"));
    }
    let properties = Element::wml("tblPr")
        .with_child(
            Element::wml("tblW")
                .with_wml_attr("w", (left + right).to_string())
                .with_wml_attr("type", "dxa"),
        )
        .with_child(borders)
        .with_child(Element::wml("tblLayout").with_wml_attr("type", "fixed"));
    let grid = Element::wml("tblGrid")
        .with_child(Element::wml("gridCol").with_wml_attr("w", left.to_string()))
        .with_child(Element::wml("gridCol").with_wml_attr("w", right.to_string()));
    let row = Element::wml("tr").with_child(cell(left, &label)).with_child(cell(right, &value));

    Ok(Element::wml("tbl").with_child(properties).with_child(grid).with_child(row))
}

fn twips(column: &'static str, inches: f64) -> Result<u32, LayoutError> {
    let value = (inches * TWIPS_PER_INCH).round();
    if !value.is_finite() || value < 1.0 || value > u32::MAX as f64 {
        return Err(LayoutError::InvalidWidth { column, inches });
    }
    Ok(value as u32)
}

fn cell(width: u32, content: &Cell) -> Element {
    let properties = Element::wml("tcPr")
        .with_child(
            Element::wml("tcW").with_wml_attr("w", width.to_string()).with_wml_attr("type", "dxa"),
        )
        .with_child(Element::wml("vAlign").with_wml_attr("val", "center"));

    let mut run = Run::new(content.text);
    if let Some(source) = content.font_from {
        run.copy_font_from(source);
    }
    let mut paragraph = Paragraph::new();
    if let Some(alignment) = content.alignment {
        paragraph.set_alignment(alignment);
    }
    paragraph.push_run(run);

    Element::wml("tc").with_child(properties).with_child(paragraph_element(&paragraph))
}
