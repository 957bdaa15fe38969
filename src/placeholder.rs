use std::collections::HashSet;

use log::{debug, warn};

use crate::analyzer::split_label;
use crate::config::{FieldMapping, Markers, TemplateSpec};
use crate::model::{Block, Document, Paragraph};
use crate::rules::FieldRules;
use crate::table::{Cell, label_table};
use crate::xml::Element;

/// Fills the body paragraphs in three passes: `label：marker` lines become
/// tables, markers before a fixed suffix run take the matching field, and
/// leftover markers are resolved from the paragraph's wording. Tables are
/// never scanned. Returns how many placeholders were written.
pub fn substitute_placeholders(
    doc: &mut Document,
    mapping: &FieldMapping,
    spec: &TemplateSpec,
) -> usize {
    if mapping.is_empty() {
        debug!("empty field mapping, placeholders left as they are");
        return 0;
    }

    let mut engine = Engine {
        mapping,
        spec,
        markers: spec.markers(),
        rules: FieldRules::from_spec(spec),
        consumed: HashSet::new(),
        count: 0,
    };

    let mut paragraph_index = 0;
    for block in doc.blocks.iter_mut() {
        let Block::Paragraph(paragraph) = block else { continue };
        let index = paragraph_index;
        paragraph_index += 1;
        // Rules judge the template's wording, not values written this pass.
        let context = paragraph.text();

        if let Some(table) = engine.label_line(paragraph, index) {
            *block = Block::Table(table);
            continue;
        }
        engine.composite(paragraph, index);
        engine.residual(paragraph, index, &context);
    }
    engine.count
}

struct Engine<'a> {
    mapping: &'a FieldMapping,
    spec: &'a TemplateSpec,
    markers: Markers,
    rules: FieldRules,
    /// `(paragraph index, run index)` of every run already written.
    consumed: HashSet<(usize, usize)>,
    count: usize,
}

impl Engine<'_> {
    /// `label：×××`. Returns the table that replaces the paragraph, or writes
    /// the value in place when no table can be built.
    fn label_line(&mut self, paragraph: &mut Paragraph, index: usize) -> Option<Element> {
        let (mapping, spec) = (self.mapping, self.spec);
        let text = paragraph.text();
        let (left, sep, right) = split_label(&text)?;
        if !self.markers.contains_marker(right) {
            return None;
        }
        let (key, value) = self.rules.resolve_label(left.trim(), mapping)?;

        let texts = paragraph.run_texts();
        let needle = right.trim();
        let target = texts
            .iter()
            .position(|t| self.markers.contains_marker(t))
            .or_else(|| texts.iter().position(|t| !needle.is_empty() && t.contains(needle)));

        let label_text = format!("{left}{sep}");
        let table = label_table(
            Cell {
                text: &label_text,
                alignment: spec.table.left_cell_alignment,
                font_from: paragraph.run(0),
            },
            Cell {
                text: value,
                alignment: spec.table.right_cell_alignment,
                font_from: target.and_then(|i| paragraph.run(i)),
            },
            &spec.table,
        );
        match table {
            Ok(table) => {
                debug!("paragraph {index}: '{}' -> table for {key}", left.trim());
                self.count += 1;
                Some(table)
            }
            Err(e) => {
                warn!("paragraph {index}: {e}; writing {key} in place");
                let run = target.or_else(|| texts.len().checked_sub(1))?;
                self.write(paragraph, index, run, value);
                None
            }
        }
    }

    /// `×××` `大学`: the filler run before a fixed suffix run.
    fn composite(&mut self, paragraph: &mut Paragraph, index: usize) {
        let (mapping, spec) = (self.mapping, self.spec);
        for slot in &spec.composite {
            let texts = paragraph.run_texts();
            for i in 1..texts.len() {
                let prev = i - 1;
                if texts[i].trim() != slot.suffix
                    || self.consumed.contains(&(index, prev))
                    || !self.markers.contains_marker(&texts[prev])
                {
                    continue;
                }
                let Some((key, value)) = slot
                    .keys
                    .iter()
                    .find_map(|k| mapping.get(k).map(|v| (k.as_str(), v)))
                else {
                    debug!("paragraph {index}: no value for '{}' slot", slot.suffix);
                    continue;
                };
                let value = value.strip_suffix(slot.suffix.as_str()).unwrap_or(value);
                debug!("paragraph {index} run {prev}: {key} before '{}'", slot.suffix);
                self.write(paragraph, index, prev, value);
            }
        }
    }

    /// Markers no other mode claimed, resolved from the paragraph's text.
    fn residual(&mut self, paragraph: &mut Paragraph, index: usize, context: &str) {
        let mapping = self.mapping;
        for i in 0..paragraph.run_count() {
            if self.consumed.contains(&(index, i)) {
                continue;
            }
            let Some(text) = paragraph.run(i).map(|r| r.text()) else { continue };
            if !self.markers.contains_marker(&text) {
                continue;
            }
            let resolved = self.rules.resolve_context(context, mapping).or_else(|| {
                let key = mapping.first_key()?;
                debug!("paragraph {index} run {i}: no rule matches, falling back to {key}");
                Some((key, mapping.get(key)?))
            });
            let Some((key, value)) = resolved else { continue };
            debug!("paragraph {index} run {i}: {key}");
            self.write(paragraph, index, i, value);
        }
    }

    /// Writes `value` over the marker in run `run`, then blanks the runs
    /// right after it that hold nothing but marker characters.
    fn write(&mut self, paragraph: &mut Paragraph, index: usize, run: usize, value: &str) {
        let Some(target) = paragraph.run_mut(run) else { return };
        let spliced = splice_value(&target.text(), value, &self.markers);
        target.set_text(&spliced);
        self.consumed.insert((index, run));
        self.count += 1;

        for next in run + 1..paragraph.run_count() {
            let Some(follower) = paragraph.run_mut(next) else { break };
            if !self.markers.is_marker_only(&follower.text()) {
                break;
            }
            follower.set_text("");
            self.consumed.insert((index, next));
        }
    }
}

/// Replaces the marker span of `text` with `value`, keeping whatever comes
/// before and after it. Text with no recognizable span keeps only its
/// leading whitespace.
pub fn splice_value(text: &str, value: &str, markers: &Markers) -> String {
    match markers.marker_span(text) {
        Some((start, end)) => format!("{}{value}{}", &text[..start], &text[end..]),
        None => {
            let leading = &text[..text.len() - text.trim_start().len()];
            format!("{leading}{value}")
        }
    }
}
