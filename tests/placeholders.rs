mod common;

use common::*;
use docx_cover::config::{FieldMapping, Markers, RuleSpec};
use docx_cover::docx;
use docx_cover::model::{Block, Document};
use docx_cover::placeholder::{splice_value, substitute_placeholders};
use docx_cover::xml::{Element, WML_NS};
use docx_cover::TemplateSpec;

fn doc(body: &str) -> Document {
    docx::parse(&document_xml(body)).unwrap()
}

fn fields(pairs: &[(&str, &str)]) -> FieldMapping {
    FieldMapping::from_pairs(pairs.iter().copied())
}

fn table(doc: &Document, index: usize) -> &Element {
    match &doc.blocks[index] {
        Block::Table(t) => t,
        other => panic!("expected a table, found {other:?}"),
    }
}

fn run_texts(doc: &Document, index: usize) -> Vec<String> {
    match &doc.blocks[index] {
        Block::Paragraph(p) => p.run_texts(),
        other => panic!("expected a paragraph, found {other:?}"),
    }
}

#[test]
fn label_line_becomes_a_two_cell_table() {
    let body = format!(
        "<w:p>{}{}</w:p>",
        styled_run("学生姓名：", "宋体", 14),
        styled_run("×××", "黑体", 16)
    );
    let mut doc = doc(&body);
    let count = substitute_placeholders(&mut doc, &fields(&[("学生姓名", "张三")]), &TemplateSpec::default());

    assert_eq!(count, 1);
    let table = table(&doc, 0);
    assert_eq!(cell_texts(table), vec!["学生姓名：", "张三"]);

    let grid: Vec<&str> = table
        .child(WML_NS, "tblGrid")
        .unwrap()
        .elements()
        .filter_map(|c| c.wml_attr("w"))
        .collect();
    assert_eq!(grid, vec!["3168", "5760"]);

    let borders = table.find(WML_NS, "tblBorders").unwrap();
    assert_eq!(borders.elements().count(), 6);
    assert!(borders.elements().all(|b| b.wml_attr("val") == Some("nil")));
    let layout = table.find(WML_NS, "tblLayout").unwrap();
    assert_eq!(layout.wml_attr("type"), Some("fixed"));
}

#[test]
fn table_cells_keep_alignment_and_fonts() {
    let body = format!(
        "<w:p>{}{}</w:p>",
        styled_run("学生姓名：", "宋体", 14),
        styled_run("×××", "黑体", 16)
    );
    let mut doc = doc(&body);
    substitute_placeholders(&mut doc, &fields(&[("学生姓名", "张三")]), &TemplateSpec::default());

    let row = table(&doc, 0).child(WML_NS, "tr").unwrap();
    let cells: Vec<&Element> = row.elements().filter(|e| e.is_wml("tc")).collect();
    assert_eq!(cells.len(), 2);
    for cell in &cells {
        let v_align = cell.find(WML_NS, "vAlign").unwrap();
        assert_eq!(v_align.wml_attr("val"), Some("center"));
    }

    let jc = |cell: &Element| cell.find(WML_NS, "jc").and_then(|j| j.wml_attr("val")).map(String::from);
    assert_eq!(jc(cells[0]).as_deref(), Some("right"));
    assert_eq!(jc(cells[1]).as_deref(), Some("center"));

    let font = |cell: &Element| {
        cell.find(WML_NS, "rFonts").and_then(|f| f.wml_attr("ascii")).map(String::from)
    };
    assert_eq!(font(cells[0]).as_deref(), Some("宋体"));
    assert_eq!(font(cells[1]).as_deref(), Some("黑体"));
    let size = cells[1].find(WML_NS, "sz").and_then(|s| s.wml_attr("val"));
    assert_eq!(size, Some("32"));
}

#[test]
fn graduate_major_is_not_taken_for_the_applied_major() {
    let mut doc = doc(&paragraph(&["毕业专业：", "×××"]));
    let mapping = fields(&[("申请专业", "计算机"), ("毕业专业", "软件工程")]);
    substitute_placeholders(&mut doc, &mapping, &TemplateSpec::default());
    assert_eq!(cell_texts(table(&doc, 0)), vec!["毕业专业：", "软件工程"]);
}

#[test]
fn applying_wording_picks_the_applied_major() {
    let mut doc = doc(&paragraph(&["申请 ", "×××"]));
    let mapping = fields(&[("学生姓名", "张三"), ("申请专业", "计算机")]);
    substitute_placeholders(&mut doc, &mapping, &TemplateSpec::default());
    assert_eq!(run_texts(&doc, 0), vec!["申请 ", "计算机"]);
}

#[test]
fn keys_outside_the_priority_list_match_literally() {
    let mut doc = doc(&paragraph(&["Name: ", "XXX"]));
    substitute_placeholders(&mut doc, &fields(&[("Name", "Alice")]), &TemplateSpec::default());
    assert_eq!(cell_texts(table(&doc, 0)), vec!["Name:", "Alice"]);
}

#[test]
fn unusable_widths_fall_back_to_in_place() {
    let mut spec = TemplateSpec::default();
    spec.table.left_col_width_in = 0.0;
    let mut doc = doc(&paragraph(&["学生姓名：", "  ×××", "×"]));
    let count = substitute_placeholders(&mut doc, &fields(&[("学生姓名", "张三")]), &spec);

    assert_eq!(count, 1);
    assert_eq!(run_texts(&doc, 0), vec!["学生姓名：", "  张三", ""]);
}

#[test]
fn label_and_marker_in_one_run_keep_the_label_in_place() {
    let mut spec = TemplateSpec::default();
    spec.table.right_col_width_in = f64::NAN;
    let mut doc = doc(&paragraph(&["邮箱：____"]));
    substitute_placeholders(&mut doc, &fields(&[("邮箱", "a@b.cn")]), &spec);
    assert_eq!(run_texts(&doc, 0), vec!["邮箱：a@b.cn"]);
}

#[test]
fn composite_runs_take_school_and_college() {
    let mut doc = doc(&paragraph(&["×××", "大学", "×××", "学院"]));
    let mapping = fields(&[("本科院校", "北京大学"), ("申请专业", "计算机")]);
    let count = substitute_placeholders(&mut doc, &mapping, &TemplateSpec::default());

    assert_eq!(count, 2);
    assert_eq!(run_texts(&doc, 0), vec!["北京", "大学", "计算机", "学院"]);
}

#[test]
fn composite_uses_the_alternate_key() {
    let mut doc = doc(&paragraph(&["××", "大学"]));
    substitute_placeholders(&mut doc, &fields(&[("学校", "清华")]), &TemplateSpec::default());
    assert_eq!(run_texts(&doc, 0), vec!["清华", "大学"]);
}

#[test]
fn residual_markers_use_paragraph_context() {
    let mut doc = doc(&paragraph(&["联系电话 ", "×××", "××"]));
    let mapping = fields(&[("学生姓名", "张三"), ("联系方式", "138-0000-0000")]);
    let count = substitute_placeholders(&mut doc, &mapping, &TemplateSpec::default());

    assert_eq!(count, 1);
    assert_eq!(run_texts(&doc, 0), vec!["联系电话 ", "138-0000-0000", ""]);
}

#[test]
fn unmatched_markers_fall_back_to_the_first_key() {
    let mut doc = doc(&paragraph(&["备注 ×××"]));
    let mapping = fields(&[("学生姓名", "张三"), ("邮箱", "a@b.cn")]);
    let count = substitute_placeholders(&mut doc, &mapping, &TemplateSpec::default());

    assert_eq!(count, 1);
    assert_eq!(run_texts(&doc, 0), vec!["备注 张三"]);
}

#[test]
fn written_values_do_not_steer_later_markers() {
    // "北京邮电大学" contains 邮; only the template's own wording may pick 邮箱.
    let mut doc = doc(&paragraph(&["×××", "、", "×××"]));
    let mapping = fields(&[("本科院校", "北京邮电大学"), ("邮箱", "x@y.com")]);
    let count = substitute_placeholders(&mut doc, &mapping, &TemplateSpec::default());

    assert_eq!(count, 2);
    assert_eq!(run_texts(&doc, 0), vec!["北京邮电大学", "、", "北京邮电大学"]);
}

#[test]
fn configured_rules_replace_the_builtin_ones() {
    let mut spec = TemplateSpec::default();
    spec.rules.insert(
        "学生姓名".into(),
        RuleSpec { label: "称呼".into(), context: "称呼".into(), exclude: String::new() },
    );
    let mut doc = doc(&paragraph(&["称呼：", "×××"]));
    substitute_placeholders(&mut doc, &fields(&[("学生姓名", "张三")]), &spec);
    assert_eq!(cell_texts(table(&doc, 0)), vec!["称呼：", "张三"]);
}

#[test]
fn empty_mapping_leaves_markers_alone() {
    let mut doc = doc(&paragraph(&["学生姓名：", "×××"]));
    let before = doc.clone();
    let count = substitute_placeholders(&mut doc, &FieldMapping::default(), &TemplateSpec::default());
    assert_eq!(count, 0);
    assert_eq!(doc, before);
}

#[test]
fn second_pass_changes_nothing() {
    let body = format!(
        "{}{}{}",
        paragraph(&["学生姓名：", "×××"]),
        paragraph(&["×××", "大学"]),
        paragraph(&["联系 ", "____"]),
    );
    let mut doc = doc(&body);
    let mapping = fields(&[("学生姓名", "张三"), ("本科院校", "复旦大学"), ("联系方式", "021-123")]);
    let spec = TemplateSpec::default();

    assert_eq!(substitute_placeholders(&mut doc, &mapping, &spec), 3);
    let populated = docx::to_xml(&doc);
    assert_eq!(substitute_placeholders(&mut doc, &mapping, &spec), 0);
    assert_eq!(docx::to_xml(&doc), populated);
}

#[test]
fn paragraphs_without_markers_are_untouched() {
    let mut doc = doc(&paragraph(&["学生姓名：", "李四"]));
    let before = doc.clone();
    let count = substitute_placeholders(&mut doc, &fields(&[("学生姓名", "张三")]), &TemplateSpec::default());
    assert_eq!(count, 0);
    assert_eq!(doc, before);
}

#[test]
fn splice_keeps_text_around_the_marker() {
    let markers = Markers::default();
    assert_eq!(splice_value("  ×××", "v", &markers), "  v");
    assert_eq!(splice_value("姓名 ××× 同学", "v", &markers), "姓名 v 同学");
    assert_eq!(splice_value("______", "v", &markers), "v");
    assert_eq!(splice_value(" [请填写] ", "v", &markers), " v ");
    assert_eq!(splice_value("  plain", "v", &markers), "  v");
}
