use crate::config::{FieldMapping, RuleSpec, TemplateSpec};

/// `(key, label, context, exclude)` for the default priority list.
const BUILTIN_RULES: [(&str, &str, &str, &str); 6] = [
    ("学生姓名", "学名", "姓名", ""),
    ("申请专业", "专业", "申", "毕"),
    ("本科院校", "院校", "院校", ""),
    ("毕业专业", "毕业", "毕", ""),
    ("联系方式", "联系", "联", ""),
    ("邮箱", "邮", "邮", ""),
];

#[derive(Clone, Debug, PartialEq)]
pub struct FieldRule {
    pub key: String,
    label: Vec<char>,
    context: Vec<char>,
    exclude: Vec<char>,
}

impl FieldRule {
    pub fn new(key: &str, spec: &RuleSpec) -> Self {
        FieldRule {
            key: key.to_string(),
            label: spec.label.chars().filter(|c| !c.is_whitespace()).collect(),
            context: spec.context.chars().filter(|c| !c.is_whitespace()).collect(),
            exclude: spec.exclude.chars().filter(|c| !c.is_whitespace()).collect(),
        }
    }

    /// A rule with no characters configured: the key text must appear itself.
    pub fn literal(key: &str) -> Self {
        FieldRule::new(key, &RuleSpec::default())
    }

    pub fn matches_label(&self, label: &str) -> bool {
        self.matches(&self.label, label)
    }

    pub fn matches_context(&self, text: &str) -> bool {
        self.matches(&self.context, text)
    }

    fn matches(&self, required: &[char], text: &str) -> bool {
        if self.exclude.iter().any(|c| text.contains(*c)) {
            return false;
        }
        if required.is_empty() {
            return !self.key.is_empty() && text.contains(self.key.as_str());
        }
        required.iter().all(|c| text.contains(*c))
    }
}

/// Rules in priority order. Keys that only appear in the mapping are
/// appended as literal rules.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldRules {
    rules: Vec<FieldRule>,
}

impl FieldRules {
    pub fn from_spec(spec: &TemplateSpec) -> Self {
        let rules = spec
            .keys_priority
            .iter()
            .map(|key| match spec.rules.get(key) {
                Some(configured) => FieldRule::new(key, configured),
                None => builtin(key).unwrap_or_else(|| FieldRule::literal(key)),
            })
            .collect();
        FieldRules { rules }
    }

    /// Key and value for the label of a `label：value` line.
    pub fn resolve_label<'m>(
        &self,
        label: &str,
        mapping: &'m FieldMapping,
    ) -> Option<(&'m str, &'m str)> {
        self.resolve(mapping, |rule| rule.matches_label(label))
    }

    /// Key and value for a bare marker, judged by its paragraph's text.
    pub fn resolve_context<'m>(
        &self,
        paragraph_text: &str,
        mapping: &'m FieldMapping,
    ) -> Option<(&'m str, &'m str)> {
        self.resolve(mapping, |rule| rule.matches_context(paragraph_text))
    }

    fn resolve<'m>(
        &self,
        mapping: &'m FieldMapping,
        accept: impl Fn(&FieldRule) -> bool,
    ) -> Option<(&'m str, &'m str)> {
        let listed = self.rules.iter().filter(|r| accept(r)).map(|r| r.key.as_str());
        let unlisted: Vec<FieldRule> = mapping
            .iter()
            .map(|(k, _)| k)
            .filter(|k| !self.rules.iter().any(|r| r.key == *k))
            .map(FieldRule::literal)
            .collect();
        let extra = unlisted.iter().filter(|r| accept(r)).map(|r| r.key.as_str());

        listed
            .chain(extra)
            .find_map(|key| mapping.iter().find(|(k, _)| *k == key))
    }
}

fn builtin(key: &str) -> Option<FieldRule> {
    BUILTIN_RULES.iter().find(|(k, ..)| *k == key).map(|(k, label, context, exclude)| {
        FieldRule::new(
            k,
            &RuleSpec {
                label: label.to_string(),
                context: context.to_string(),
                exclude: exclude.to_string(),
            },
        )
    })
}
