//! Settings Form: eleven index-settings fields, suggestion lists, and the
//! flat-diff producer (spec.md §4.6, expanded field list in §4.6 of the
//! expanded spec).

use std::collections::HashMap;

use crate::gateway::types::IndexSettingsValues;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Numeric,
    FreeText,
    Categorical,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub label: &'static str,
    pub key: &'static str,
    pub kind: FieldKind,
    pub input: String,
    pub current_val: String,
    pub suggestions: Vec<String>,
}

/// The eleven fields in fixed form order (spec.md §4.6).
const FIELD_DEFS: &[(&str, &str, FieldKind)] = &[
    ("Number of replicas", "number_of_replicas", FieldKind::Numeric),
    ("Refresh interval", "refresh_interval", FieldKind::FreeText),
    ("Routing include _name", "routing.allocation.include._name", FieldKind::FreeText),
    ("Routing include _ip", "routing.allocation.include._ip", FieldKind::FreeText),
    ("Routing exclude _name", "routing.allocation.exclude._name", FieldKind::FreeText),
    ("Routing exclude _ip", "routing.allocation.exclude._ip", FieldKind::FreeText),
    ("Routing require _name", "routing.allocation.require._name", FieldKind::FreeText),
    ("Routing require _ip", "routing.allocation.require._ip", FieldKind::FreeText),
    ("Total shards per node", "routing.allocation.total_shards_per_node", FieldKind::Numeric),
    ("Mapping total fields limit", "mapping.total_fields.limit", FieldKind::Numeric),
    ("Read-only-allow-delete", "blocks.read_only_allow_delete", FieldKind::Categorical),
];

fn static_suggestions(key: &str) -> Vec<String> {
    match key {
        "number_of_replicas" => vec!["0".into(), "1".into(), "2".into()],
        "refresh_interval" => vec!["1s".into(), "5s".into(), "30s".into(), "-1".into()],
        "blocks.read_only_allow_delete" => vec!["true".into(), "false".into(), "".into()],
        _ => Vec::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    Loading,
    Ready,
}

#[derive(Debug, Clone)]
pub struct SettingsForm {
    pub index_name: String,
    pub fields: Vec<Field>,
    pub focused: usize,
    pub state: FormState,
    pub nonce: u64,
}

impl SettingsForm {
    /// Opens a fresh session for `index_name`; suggestion lists for the
    /// `_name`/`_ip` routing fields are seeded from the live node roster.
    pub fn open(index_name: String, nonce: u64, node_names: &[String], node_ips: &[String]) -> Self {
        let fields = FIELD_DEFS
            .iter()
            .map(|&(label, key, kind)| {
                let suggestions = if key.ends_with("._name") {
                    node_names.to_vec()
                } else if key.ends_with("._ip") {
                    node_ips.to_vec()
                } else {
                    static_suggestions(key)
                };
                Field {
                    label,
                    key,
                    kind,
                    input: String::new(),
                    current_val: String::new(),
                    suggestions,
                }
            })
            .collect();

        Self {
            index_name,
            fields,
            focused: 0,
            state: FormState::Loading,
            nonce,
        }
    }

    /// Applies loaded values; clears the loading flag. Idempotent on an
    /// unchanged value set (spec.md §8 round-trip law).
    pub fn apply_loaded(&mut self, values: &IndexSettingsValues) {
        for field in &mut self.fields {
            let val = lookup_dotted(&values.0, field.key).unwrap_or_default();
            field.input = val.clone();
            field.current_val = val;
        }
        self.state = FormState::Ready;
    }

    pub fn focus_next(&mut self) {
        self.focused = (self.focused + 1) % self.fields.len();
    }

    pub fn focus_prev(&mut self) {
        self.focused = (self.focused + self.fields.len() - 1) % self.fields.len();
    }

    pub fn push_char(&mut self, c: char) {
        if self.state == FormState::Loading {
            return;
        }
        self.fields[self.focused].input.push(c);
    }

    pub fn backspace(&mut self) {
        if self.state == FormState::Loading {
            return;
        }
        self.fields[self.focused].input.pop();
    }

    /// Diff of fields whose input differs from the value captured at load
    /// time. An input cleared to `""` becomes a `None` sentinel so the
    /// gateway sends JSON `null`, clearing the setting server-side
    /// (spec.md §4.6).
    pub fn changed_settings(&self) -> HashMap<String, Option<String>> {
        self.fields
            .iter()
            .filter(|f| f.input != f.current_val)
            .map(|f| {
                let value = if f.input.is_empty() { None } else { Some(f.input.clone()) };
                (f.key.to_string(), value)
            })
            .collect()
    }
}

fn lookup_dotted(values: &HashMap<String, serde_json::Value>, dotted_key: &str) -> Option<String> {
    // `IndexSettingsValues` stores the `index.*` subtree already one level
    // stripped of the `index` prefix; fields nest further by dots.
    let mut parts = dotted_key.split('.');
    let first = parts.next()?;
    let mut current = values.get(first)?.clone();
    for part in parts {
        current = current.get(part)?.clone();
    }
    match current {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        serde_json::Value::Null => None,
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn changed_settings_empty_immediately_after_apply() {
        let mut values = HashMap::new();
        values.insert("number_of_replicas".to_string(), serde_json::json!("1"));
        let wire = IndexSettingsValues(values);

        let mut form = SettingsForm::open("my-index".into(), 1, &[], &[]);
        form.apply_loaded(&wire);
        assert!(form.changed_settings().is_empty());
    }

    #[test]
    fn setting_input_back_to_current_val_produces_no_diff() {
        let mut values = HashMap::new();
        values.insert("refresh_interval".to_string(), serde_json::json!("5s"));
        let wire = IndexSettingsValues(values);

        let mut form = SettingsForm::open("my-index".into(), 1, &[], &[]);
        form.apply_loaded(&wire);
        let field = form.fields.iter_mut().find(|f| f.key == "refresh_interval").unwrap();
        field.input = "30s".into();
        field.input = "5s".into();
        assert!(form.changed_settings().is_empty());
    }

    #[test]
    fn cleared_field_becomes_null_sentinel() {
        let mut values = HashMap::new();
        values.insert("refresh_interval".to_string(), serde_json::json!("5s"));
        let wire = IndexSettingsValues(values);

        let mut form = SettingsForm::open("my-index".into(), 1, &[], &[]);
        form.apply_loaded(&wire);
        let field = form.fields.iter_mut().find(|f| f.key == "refresh_interval").unwrap();
        field.input.clear();

        let diff = form.changed_settings();
        assert_eq!(diff.get("refresh_interval"), Some(&None));
    }

    #[test]
    fn routing_name_fields_seeded_from_node_roster() {
        let nodes = vec!["node-a".to_string(), "node-b".to_string()];
        let form = SettingsForm::open("idx".into(), 1, &nodes, &[]);
        let field = form.fields.iter().find(|f| f.key == "routing.allocation.include._name").unwrap();
        assert_eq!(field.suggestions, nodes);
    }

    #[test]
    fn focus_wraps_around() {
        let mut form = SettingsForm::open("idx".into(), 1, &[], &[]);
        let last = form.fields.len() - 1;
        form.focused = last;
        form.focus_next();
        assert_eq!(form.focused, 0);
        form.focus_prev();
        assert_eq!(form.focused, last);
    }
}
