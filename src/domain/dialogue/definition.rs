//! Dialogue definitions and the catalog that holds them.
//!
//! A definition is the static, ordered list of fields one bot feature
//! collects. The catalog is loaded once at startup and shared read-only by
//! every conversation.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

use super::command::CANCEL_WORDS;
use crate::domain::validation::{FieldRule, FieldSpec};

/// Slash commands handled by the router itself; dialogues cannot claim them.
pub const RESERVED_COMMANDS: &[&str] = &[
    "start", "menu", "help", "cancel", "cancelar", "skip", "edit", "list",
];

/// Errors raised while loading or validating a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read dialogue catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse dialogue catalog: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Dialogue catalog is empty")]
    Empty,

    #[error("Duplicate dialogue name: {0}")]
    DuplicateName(String),

    #[error("Command '/{command}' is claimed more than once")]
    DuplicateCommand { command: String },

    #[error("Command '/{command}' is reserved")]
    ReservedCommand { command: String },

    #[error("Menu label '{label}' is used more than once")]
    DuplicateMenuLabel { label: String },

    #[error("Menu label '{label}' is reserved")]
    ReservedMenuLabel { label: String },

    #[error("Dialogue '{0}' has no fields")]
    NoFields(String),

    #[error("Dialogue '{dialogue}' declares field '{field}' twice")]
    DuplicateField { dialogue: String, field: String },

    #[error("Dialogue '{dialogue}', field '{field}': {reason}")]
    InvalidRule {
        dialogue: String,
        field: String,
        reason: String,
    },
}

/// Ordered fields plus the wording around them for one bot feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueDefinition {
    /// Stable identifier, stored with conversations and records.
    pub name: String,

    /// Title used in replies.
    pub title: String,

    /// Slash commands (without `/`) that start this dialogue.
    #[serde(default)]
    pub commands: Vec<String>,

    /// Menu button text that also starts this dialogue.
    #[serde(default)]
    pub menu_label: Option<String>,

    pub fields: Vec<FieldSpec>,

    #[serde(default = "default_completion_message")]
    pub completion_message: String,
}

fn default_completion_message() -> String {
    "Saved, thank you!".to_string()
}

impl DialogueDefinition {
    pub fn new(name: impl Into<String>, title: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        let name = name.into();
        Self {
            commands: vec![name.clone()],
            name,
            title: title.into(),
            menu_label: None,
            fields,
            completion_message: default_completion_message(),
        }
    }

    pub fn with_menu_label(mut self, label: impl Into<String>) -> Self {
        self.menu_label = Some(label.into());
        self
    }

    pub fn with_commands(mut self, commands: &[&str]) -> Self {
        self.commands = commands.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_completion_message(mut self, message: impl Into<String>) -> Self {
        self.completion_message = message.into();
        self
    }

    pub fn field(&self, index: usize) -> Option<&FieldSpec> {
        self.fields.get(index)
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn index_of(&self, field_name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| f.name.eq_ignore_ascii_case(field_name))
    }

    /// Names of fields whose committed values must be unique.
    pub fn unique_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.unique)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if self.fields.is_empty() {
            return Err(CatalogError::NoFields(self.name.clone()));
        }
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.to_lowercase()) {
                return Err(CatalogError::DuplicateField {
                    dialogue: self.name.clone(),
                    field: field.name.clone(),
                });
            }
            field
                .rule
                .check_definition()
                .map_err(|reason| CatalogError::InvalidRule {
                    dialogue: self.name.clone(),
                    field: field.name.clone(),
                    reason,
                })?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    dialogues: Vec<DialogueDefinition>,
}

/// Validated, immutable set of dialogue definitions.
#[derive(Debug, Clone)]
pub struct DialogueCatalog {
    dialogues: Vec<DialogueDefinition>,
}

impl DialogueCatalog {
    /// Builds a catalog, rejecting ambiguous or unusable definitions.
    pub fn new(dialogues: Vec<DialogueDefinition>) -> Result<Self, CatalogError> {
        if dialogues.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut names = HashSet::new();
        let mut triggers = HashSet::new();
        let mut labels = HashSet::new();
        for dialogue in &dialogues {
            if !names.insert(dialogue.name.to_lowercase()) {
                return Err(CatalogError::DuplicateName(dialogue.name.clone()));
            }
            dialogue.validate()?;

            for command in &dialogue.commands {
                let command = command.trim_start_matches('/').to_lowercase();
                if RESERVED_COMMANDS.contains(&command.as_str()) {
                    return Err(CatalogError::ReservedCommand { command });
                }
                if !triggers.insert(command.clone()) {
                    return Err(CatalogError::DuplicateCommand { command });
                }
            }

            if let Some(label) = &dialogue.menu_label {
                let label = label.trim().to_lowercase();
                if CANCEL_WORDS.contains(&label.as_str()) {
                    return Err(CatalogError::ReservedMenuLabel { label });
                }
                if !labels.insert(label.clone()) {
                    return Err(CatalogError::DuplicateMenuLabel { label });
                }
            }
        }

        Ok(Self { dialogues })
    }

    /// Parses a YAML document with a top-level `dialogues:` list.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_yaml::from_str(yaml)?;
        Self::new(file.dialogues)
    }

    /// Reads a YAML catalog from disk.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// The bot's stock features: registering clients and logging collections.
    pub fn builtin() -> Self {
        let client = DialogueDefinition::new(
            "client",
            "Add client",
            vec![
                FieldSpec::new(
                    "first_name",
                    FieldRule::Text {
                        min_len: Some(1),
                        max_len: Some(60),
                        pattern: None,
                    },
                    "What is the client's first name?",
                )
                .with_label("First name"),
                FieldSpec::new(
                    "last_name",
                    FieldRule::Text {
                        min_len: Some(1),
                        max_len: Some(60),
                        pattern: None,
                    },
                    "And the last name?",
                )
                .with_label("Last name"),
                FieldSpec::new("phone", FieldRule::Phone, "Phone number?")
                    .with_label("Phone")
                    .unique(),
                FieldSpec::new("email", FieldRule::Email, "Email address?")
                    .with_label("Email")
                    .optional(),
            ],
        )
        .with_commands(&["client", "cliente"])
        .with_menu_label("Add client")
        .with_completion_message("Client saved.");

        let harvest = DialogueDefinition::new(
            "harvest",
            "Collection",
            vec![
                FieldSpec::new(
                    "client_phone",
                    FieldRule::Phone,
                    "Phone number of the client who delivered?",
                )
                .with_label("Client phone"),
                FieldSpec::new(
                    "product",
                    FieldRule::Text {
                        min_len: Some(2),
                        max_len: Some(80),
                        pattern: None,
                    },
                    "Which product was collected?",
                )
                .with_label("Product"),
                FieldSpec::new(
                    "weight_kg",
                    FieldRule::Number {
                        min: Some(0.1),
                        max: Some(100_000.0),
                    },
                    "Weight in kilograms?",
                )
                .with_label("Weight (kg)"),
                FieldSpec::new(
                    "collected_on",
                    FieldRule::Date {
                        format: "%d/%m/%Y".to_string(),
                        allow_future: false,
                    },
                    "Collection date (DD/MM/YYYY)?",
                )
                .with_label("Date"),
                FieldSpec::new(
                    "notes",
                    FieldRule::Text {
                        min_len: None,
                        max_len: Some(200),
                        pattern: None,
                    },
                    "Any notes?",
                )
                .with_label("Notes")
                .optional(),
            ],
        )
        .with_commands(&["harvest", "recoleccion"])
        .with_menu_label("Collection")
        .with_completion_message("Collection recorded.");

        Self {
            dialogues: vec![client, harvest],
        }
    }

    /// Finds a dialogue by name, ignoring case.
    pub fn get(&self, name: &str) -> Option<&DialogueDefinition> {
        self.dialogues
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(name))
    }

    /// Finds the dialogue started by a slash command (given without `/`).
    pub fn find_by_command(&self, command: &str) -> Option<&DialogueDefinition> {
        self.dialogues.iter().find(|d| {
            d.commands
                .iter()
                .any(|c| c.trim_start_matches('/').eq_ignore_ascii_case(command))
        })
    }

    /// Finds the dialogue whose menu label is exactly `text` (case-insensitive).
    pub fn find_by_label(&self, text: &str) -> Option<&DialogueDefinition> {
        let text = text.trim().to_lowercase();
        self.dialogues.iter().find(|d| {
            d.menu_label
                .as_deref()
                .is_some_and(|label| label.trim().to_lowercase() == text)
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &DialogueDefinition> {
        self.dialogues.iter()
    }

    pub fn len(&self) -> usize {
        self.dialogues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dialogues.is_empty()
    }
}
