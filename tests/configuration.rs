mod common;

use docx_cover::config::{FieldMapping, Markers};
use docx_cover::model::Alignment;
use docx_cover::{Error, TemplateSpec};

#[test]
fn defaults_match_the_stock_template() {
    let spec = TemplateSpec::default();
    assert_eq!(spec.keys_priority[0], "学生姓名");
    assert_eq!(spec.placeholder_chars, vec!["×", "X"]);
    assert_eq!(spec.table.left_col_width_in, 2.2);
    assert_eq!(spec.table.right_col_width_in, 4.0);
    assert_eq!(spec.table.left_cell_alignment, Some(Alignment::Right));
    assert_eq!(spec.table.right_cell_alignment, Some(Alignment::Center));
    assert_eq!(spec.defaults.get("学生姓名"), Some("王小明"));
}

#[test]
fn spec_file_overrides_only_what_it_names() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write(
        dir.path(),
        "spec.json",
        r#"{
            "placeholder_chars": ["_"],
            "table": {"left_col_width_in": 1.5, "left_cell_alignment": "l", "right_cell_alignment": "centre"},
            "defaults": {"邮箱": "x@y.cn", "学生姓名": "某某"},
            "rules": {"邮箱": {"label": "mail"}},
            "composite": [{"suffix": "中学", "keys": ["高中"]}]
        }"#
        .as_bytes(),
    );
    let spec = TemplateSpec::load(&path).unwrap();

    assert_eq!(spec.placeholder_chars, vec!["_"]);
    assert_eq!(spec.keys_priority.len(), 6);
    assert_eq!(spec.table.left_col_width_in, 1.5);
    assert_eq!(spec.table.right_col_width_in, 4.0);
    assert_eq!(spec.table.left_cell_alignment, Some(Alignment::Left));
    assert_eq!(spec.table.right_cell_alignment, Some(Alignment::Center));
    assert_eq!(spec.defaults.first_key(), Some("邮箱"));
    assert_eq!(spec.rules["邮箱"].label, "mail");
    assert_eq!(spec.composite.len(), 1);
}

#[test]
fn unknown_alignment_leaves_the_cell_unaligned() {
    let spec: TemplateSpec =
        serde_json::from_str(r#"{"table": {"left_cell_alignment": "justify"}}"#).unwrap();
    assert_eq!(spec.table.left_cell_alignment, None);
}

#[test]
fn mapping_keeps_insertion_order() {
    let mapping = FieldMapping::parse_json(r#"{"邮箱": "a", "学生姓名": "b", "Zeta": "c"}"#).unwrap();
    let keys: Vec<&str> = mapping.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["邮箱", "学生姓名", "Zeta"]);
    assert_eq!(mapping.first_key(), Some("邮箱"));
}

#[test]
fn mapping_from_a_file_or_inline() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write(dir.path(), "fields.json", r#"{"学生姓名": "张三"}"#.as_bytes());

    let from_file = FieldMapping::from_arg(path.to_str().unwrap()).unwrap();
    assert_eq!(from_file.get("学生姓名"), Some("张三"));

    let inline = FieldMapping::from_arg(r#"{"学生姓名": "李四"}"#).unwrap();
    assert_eq!(inline.get("学生姓名"), Some("李四"));
}

#[test]
fn bad_mappings_are_parse_errors() {
    for bad in [r#"{"a": 1}"#, "[1, 2]", "{not json", "missing.json"] {
        assert!(
            matches!(FieldMapping::from_arg(bad), Err(Error::MappingParse(_))),
            "{bad} should not parse"
        );
    }
}

#[test]
fn markers_recognize_fillers() {
    let markers = Markers::default();
    assert!(markers.contains_marker("×××"));
    assert!(markers.contains_marker("XXX"));
    assert!(markers.contains_marker("____"));
    assert!(markers.contains_marker(" [姓名] "));
    assert!(markers.contains_marker("【学校】"));
    assert!(!markers.contains_marker("张三"));
    assert!(!markers.contains_marker("a_b"));

    assert!(markers.is_marker_only(" ×× "));
    assert!(markers.is_marker_only("X__"));
    assert!(!markers.is_marker_only("   "));
    assert!(!markers.is_marker_only("×大学"));
}
