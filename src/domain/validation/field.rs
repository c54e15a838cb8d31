//! Field specifications.

use serde::{Deserialize, Serialize};

use super::FieldRule;

/// One unit of expected input inside a dialogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Key under which the value is collected and persisted.
    pub name: String,

    /// Human-readable name used in replies; defaults to `name`.
    #[serde(default)]
    pub label: Option<String>,

    pub rule: FieldRule,

    /// Optional fields can be skipped with `/skip`.
    #[serde(default)]
    pub optional: bool,

    /// No two committed records of the same dialogue may share this value.
    #[serde(default)]
    pub unique: bool,

    /// Text sent when asking for this field.
    pub prompt: String,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, rule: FieldRule, prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            rule,
            optional: false,
            unique: false,
            prompt: prompt.into(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// Prompt shown to the user, with a skip hint for optional fields.
    pub fn prompt_text(&self) -> String {
        if self.optional {
            format!("{} (optional, /skip to leave it empty)", self.prompt)
        } else {
            self.prompt.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_falls_back_to_name() {
        let spec = FieldSpec::new("age", FieldRule::integer_between(0, 120), "How old?");
        assert_eq!(spec.label(), "age");
        assert_eq!(spec.with_label("Age").label(), "Age");
    }

    #[test]
    fn optional_prompt_mentions_skip() {
        let spec = FieldSpec::new("email", FieldRule::Email, "Email?").optional();
        assert!(spec.prompt_text().contains("/skip"));
    }

    #[test]
    fn deserializes_with_defaults() {
        let yaml = "name: phone\nrule:\n  type: phone\nprompt: Phone number?\n";
        let spec: FieldSpec = serde_yaml::from_str(yaml).unwrap();
        assert!(!spec.optional);
        assert!(!spec.unique);
        assert_eq!(spec.rule, FieldRule::Phone);
    }
}
