use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};

use crate::error::Error;
use crate::model::Alignment;

pub const DEFAULT_KEYS_PRIORITY: [&str; 6] =
    ["学生姓名", "申请专业", "本科院校", "毕业专业", "联系方式", "邮箱"];
pub const DEFAULT_PLACEHOLDER_CHARS: [&str; 2] = ["×", "X"];
/// Sample values used when a run supplies no fields at all.
pub const DEFAULT_FIELDS: [(&str, &str); 6] = [
    ("学生姓名", "王小明"),
    ("申请专业", "计算机科学与技术"),
    ("本科院校", "北京大学"),
    ("毕业专业", "软件工程"),
    ("联系方式", "138-0000-0000"),
    ("邮箱", "wangxiaoming@pku.edu.cn"),
];
/// Mapping file looked up inside the logo directory when the spec names none.
pub const LOGO_MAPPING_FILE: &str = "logo_mapping.json";

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct TemplateSpec {
    pub keys_priority: Vec<String>,
    pub placeholder_chars: Vec<String>,
    pub table: TableSpec,
    pub defaults: FieldMapping,
    pub logo_mapping: Option<PathBuf>,
    /// Per-key match characters, replacing the built-in rules for that key.
    pub rules: HashMap<String, RuleSpec>,
    /// Fixed-suffix runs whose preceding filler run takes a field value.
    pub composite: Vec<SuffixSlot>,
}

impl Default for TemplateSpec {
    fn default() -> Self {
        TemplateSpec {
            keys_priority: DEFAULT_KEYS_PRIORITY.iter().map(|k| k.to_string()).collect(),
            placeholder_chars: DEFAULT_PLACEHOLDER_CHARS.iter().map(|c| c.to_string()).collect(),
            table: TableSpec::default(),
            defaults: FieldMapping::from_pairs(DEFAULT_FIELDS),
            logo_mapping: None,
            rules: HashMap::new(),
            composite: vec![
                SuffixSlot { suffix: "大学".into(), keys: vec!["本科院校".into(), "学校".into()] },
                SuffixSlot {
                    suffix: "学院".into(),
                    keys: vec!["申请专业".into(), "毕业专业".into()],
                },
            ],
        }
    }
}

impl TemplateSpec {
    pub fn load(path: &Path) -> Result<TemplateSpec, Error> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn markers(&self) -> Markers {
        Markers::new(self.placeholder_chars.clone())
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct TableSpec {
    pub left_col_width_in: f64,
    pub right_col_width_in: f64,
    #[serde(deserialize_with = "alignment")]
    pub left_cell_alignment: Option<Alignment>,
    #[serde(deserialize_with = "alignment")]
    pub right_cell_alignment: Option<Alignment>,
}

impl Default for TableSpec {
    fn default() -> Self {
        TableSpec {
            left_col_width_in: 2.2,
            right_col_width_in: 4.0,
            left_cell_alignment: Some(Alignment::Right),
            right_cell_alignment: Some(Alignment::Center),
        }
    }
}

/// Accepts `left|right|center` and the short forms; anything else leaves the
/// cell's alignment unset.
pub fn parse_alignment(val: &str) -> Option<Alignment> {
    match val.to_ascii_lowercase().as_str() {
        "left" | "l" => Some(Alignment::Left),
        "right" | "r" => Some(Alignment::Right),
        "center" | "centre" | "c" => Some(Alignment::Center),
        _ => None,
    }
}

fn alignment<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Alignment>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_alignment))
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct RuleSpec {
    /// Characters that must all appear in a `label：` text.
    pub label: String,
    /// Characters that must all appear in the paragraph around a bare marker.
    pub context: String,
    /// Characters that rule the key out in either mode.
    pub exclude: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SuffixSlot {
    pub suffix: String,
    pub keys: Vec<String>,
}

/// Filler text that stands in for an unfilled field.
#[derive(Clone, Debug, PartialEq)]
pub struct Markers {
    chars: Vec<String>,
}

const FILLER_TOKENS: [&str; 2] = ["XXX", "____"];

impl Markers {
    pub fn new(chars: Vec<String>) -> Self {
        Markers { chars: chars.into_iter().filter(|c| !c.is_empty()).collect() }
    }

    /// Marker characters, filler tokens, or a bracket-wrapped run.
    pub fn contains_marker(&self, text: &str) -> bool {
        self.chars.iter().any(|c| text.contains(c.as_str()))
            || FILLER_TOKENS.iter().any(|t| text.contains(t))
            || is_bracketed(text.trim())
    }

    /// Byte range from the first marker in `text` to the end of the last one.
    pub fn marker_span(&self, text: &str) -> Option<(usize, usize)> {
        let trimmed = text.trim();
        if is_bracketed(trimmed) {
            let start = text.len() - text.trim_start().len();
            return Some((start, start + trimmed.len()));
        }

        let mut span: Option<(usize, usize)> = None;
        for pattern in self.chars.iter().map(String::as_str).chain(FILLER_TOKENS) {
            for (at, found) in text.match_indices(pattern) {
                let (start, end) = (at, at + found.len());
                span = Some(match span {
                    Some((s, e)) => (s.min(start), e.max(end)),
                    None => (start, end),
                });
            }
        }
        // A filler line may be longer than the token that found it.
        let (mut start, mut end) = span?;
        while text[..start].ends_with('_') {
            start -= 1;
        }
        while text[end..].starts_with('_') {
            end += 1;
        }
        Some((start, end))
    }

    /// Non-empty text made of nothing but marker characters and underscores.
    pub fn is_marker_only(&self, text: &str) -> bool {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return false;
        }
        let mut rest = trimmed.replace('_', "");
        for c in &self.chars {
            rest = rest.replace(c.as_str(), "");
        }
        rest.trim().is_empty()
    }
}

impl Default for Markers {
    fn default() -> Self {
        TemplateSpec::default().markers()
    }
}

fn is_bracketed(text: &str) -> bool {
    let pairs = [('[', ']'), ('【', '】')];
    text.chars().count() >= 2
        && pairs.iter().any(|(open, close)| text.starts_with(*open) && text.ends_with(*close))
}

/// Field key → value, in the order the caller supplied them. Order matters:
/// the first key is the last-resort value for unmatched markers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldMapping {
    entries: Vec<(String, String)>,
}

impl FieldMapping {
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut entries: Vec<(String, String)> = Vec::new();
        for (k, v) in pairs {
            let (k, v) = (k.into(), v.into());
            match entries.iter_mut().find(|(existing, _)| *existing == k) {
                Some(slot) => slot.1 = v,
                None => entries.push((k, v)),
            }
        }
        FieldMapping { entries }
    }

    /// Parses a JSON object of string values.
    pub fn parse_json(text: &str) -> Result<FieldMapping, Error> {
        serde_json::from_str(text).map_err(|e| Error::MappingParse(e.to_string()))
    }

    /// A path to a JSON file if one exists there, else inline JSON.
    pub fn from_arg(arg: &str) -> Result<FieldMapping, Error> {
        let path = Path::new(arg);
        if path.is_file() {
            let text = std::fs::read_to_string(path)
                .map_err(|e| Error::MappingParse(format!("{}: {e}", path.display())))?;
            return FieldMapping::parse_json(&text);
        }
        FieldMapping::parse_json(arg)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn first_key(&self) -> Option<&str> {
        self.entries.first().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'de> Deserialize<'de> for FieldMapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let object = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;
        let mut entries = Vec::with_capacity(object.len());
        for (key, value) in object {
            match value {
                serde_json::Value::String(s) => entries.push((key, s)),
                other => {
                    return Err(serde::de::Error::custom(format!(
                        "value for '{key}' must be a string, found {other}"
                    )));
                }
            }
        }
        Ok(FieldMapping { entries })
    }
}

/// Display name → logo file name, as written by
/// [`crate::logo_assets::apply_plan`] when logos are renamed to ASCII-safe
/// names.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LogoMapping {
    names: FieldMapping,
}

impl LogoMapping {
    pub fn load(path: &Path) -> Result<LogoMapping, Error> {
        let text = std::fs::read_to_string(path)?;
        let names: FieldMapping = serde_json::from_str(&text)?;
        Ok(LogoMapping { names })
    }

    pub fn from_pairs<K: Into<String>, V: Into<String>>(
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        LogoMapping { names: FieldMapping::from_pairs(pairs) }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names.iter()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Pretty JSON object, entries in insertion order.
    pub fn to_json(&self) -> Result<String, Error> {
        let object: serde_json::Map<String, serde_json::Value> = self
            .names
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
            .collect();
        Ok(serde_json::to_string_pretty(&object)?)
    }

    /// File names bound to `name`: the case-sensitive entry first, then every
    /// case-insensitive one.
    pub fn lookup<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        let lowered = name.to_lowercase();
        self.names.get(name).into_iter().chain(
            self.names
                .iter()
                .filter(move |(k, _)| *k != name && k.to_lowercase() == lowered)
                .map(|(_, v)| v),
        )
    }

    /// Path of the mapping file to use for `logo_dir`, if any exists.
    pub fn locate(spec: &TemplateSpec, logo_dir: &Path) -> Option<PathBuf> {
        match &spec.logo_mapping {
            Some(path) => Some(path.clone()),
            None => Some(logo_dir.join(LOGO_MAPPING_FILE)).filter(|p| p.is_file()),
        }
    }
}
