//! Reply texts sent by the dialogue engine and the router.

use super::{Conversation, DialogueCatalog, DialogueDefinition};
use crate::domain::foundation::{Page, ValidationError};
use crate::domain::record::PersistedRecord;
use crate::domain::validation::FieldSpec;

pub fn help(catalog: &DialogueCatalog) -> String {
    let mut text = String::from("Send /menu to see what I can do, or start directly with:");
    for definition in catalog.iter() {
        if let Some(command) = definition.commands.first() {
            text.push_str(&format!("\n/{} - {}", command, definition.title));
        }
    }
    text.push_str(
        "\nWhile answering, /skip leaves an optional question empty, \
         /edit <field> changes an earlier answer and /cancel stops.",
    );
    text
}

pub fn menu(catalog: &DialogueCatalog) -> String {
    let mut text = String::from("What would you like to do?");
    for definition in catalog.iter() {
        let label = definition.menu_label.as_deref().unwrap_or(&definition.title);
        match definition.commands.first() {
            Some(command) => text.push_str(&format!("\n- {label} (/{command})")),
            None => text.push_str(&format!("\n- {label}")),
        }
    }
    text
}

pub fn greeting(first_name: Option<&str>, catalog: &DialogueCatalog) -> String {
    let hello = match first_name {
        Some(name) if !name.trim().is_empty() => format!("Hello {}!", name.trim()),
        _ => "Hello!".to_string(),
    };
    format!("{hello}\n{}", menu(catalog))
}

pub fn started(definition: &DialogueDefinition) -> String {
    format!("{}: send /cancel at any time to stop.", definition.title)
}

pub fn reprompt(error: &ValidationError, spec: &FieldSpec) -> String {
    format!("{}. {}", error.reason, spec.prompt_text())
}

pub fn required(spec: &FieldSpec) -> String {
    format!("this field is required. {}", spec.prompt_text())
}

pub fn updated(spec: &FieldSpec) -> String {
    format!("{} updated.", spec.label())
}

pub fn cancelled(definition: Option<&DialogueDefinition>) -> String {
    match definition {
        Some(definition) => format!("{} cancelled. Nothing was saved.", definition.title),
        None => "Cancelled. Nothing was saved.".to_string(),
    }
}

pub fn unknown_command(command: &str, catalog: &DialogueCatalog) -> String {
    format!("I don't know the command /{command}.\n{}", help(catalog))
}

pub fn reminder(definition: &DialogueDefinition, prompt: &str) -> String {
    format!("You are filling in {}. {}", definition.title, prompt)
}

pub fn awaiting_commit() -> String {
    "All answers are in. Send any message to save, /edit <field> to change an answer or /cancel to discard."
        .to_string()
}

pub fn edit_which(fields: &[&FieldSpec]) -> String {
    if fields.is_empty() {
        return "There is nothing to edit yet.".to_string();
    }
    let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
    format!("Which answer? Use /edit <field> with one of: {}", names.join(", "))
}

pub fn dialogue_gone() -> String {
    "That form is no longer available, so I discarded it.".to_string()
}

pub fn saved(definition: &DialogueDefinition, conversation: &Conversation) -> String {
    format!("{}\n{}", definition.completion_message, summary(definition, conversation))
}

/// One `label: value` line per collected field, in definition order.
pub fn summary(definition: &DialogueDefinition, conversation: &Conversation) -> String {
    definition
        .fields
        .iter()
        .filter_map(|field| {
            conversation
                .value(&field.name)
                .map(|value| format!("{}: {}", field.label(), value))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn duplicate_value(message: &str) -> String {
    format!(
        "Could not save: {message}. Use /edit <field> to change the answer or /cancel to discard."
    )
}

pub fn temporarily_unavailable() -> String {
    "The service is temporarily unavailable, try again later. Your answers are kept.".to_string()
}

pub fn apology() -> String {
    "Sorry, something went wrong on my side. Please try again.".to_string()
}

pub fn expired() -> String {
    "Your previous answers expired after a long pause.".to_string()
}

pub fn list_usage(catalog: &DialogueCatalog) -> String {
    let names: Vec<&str> = catalog.iter().map(|d| d.name.as_str()).collect();
    format!("Use /list <form> [page] with one of: {}", names.join(", "))
}

/// One page of a dialogue's records, newest first, with a pointer to the
/// next page when there is one.
pub fn record_page(definition: &DialogueDefinition, page: &Page<PersistedRecord>) -> String {
    if page.total == 0 {
        return format!("No {} records yet.", definition.title);
    }
    if page.is_empty() {
        return format!(
            "No {} records on that page; there are {} in total.",
            definition.title, page.total
        );
    }
    let mut text = format!(
        "{}: showing {}-{} of {}",
        definition.title,
        page.offset + 1,
        page.offset as usize + page.items.len(),
        page.total
    );
    for record in &page.items {
        text.push_str(&format!(
            "\n\n{}",
            record.created_at.as_datetime().format("%d/%m/%Y %H:%M")
        ));
        for field in &definition.fields {
            if let Some(value) = record.fields.get(&field.name) {
                text.push_str(&format!("\n{}: {}", field.label(), value));
            }
        }
    }
    if page.has_more() {
        let next = page.offset / page.limit.max(1) + 2;
        text.push_str(&format!("\n\nMore: /list {} {}", definition.name, next));
    }
    text
}

pub fn not_allowed() -> String {
    "Only administrators can list records.".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::validation::FieldRule;

    #[test]
    fn reprompt_is_reason_then_prompt() {
        let spec = FieldSpec::new("age", FieldRule::integer_between(0, 120), "How old are you?");
        let error = ValidationError::invalid_format("age", "not a valid integer");
        assert_eq!(reprompt(&error, &spec), "not a valid integer. How old are you?");
    }

    #[test]
    fn greeting_uses_first_name() {
        let catalog = DialogueCatalog::builtin();
        assert!(greeting(Some("Ana"), &catalog).starts_with("Hello Ana!"));
        assert!(greeting(Some("  "), &catalog).starts_with("Hello!"));
    }

    #[test]
    fn menu_lists_every_dialogue() {
        let text = menu(&DialogueCatalog::builtin());
        assert!(text.contains("Add client (/client)"));
        assert!(text.contains("Collection (/harvest)"));
    }

    #[test]
    fn record_page_lists_labelled_values() {
        use crate::domain::foundation::{ChatId, Pagination, RecordId, Timestamp, UserId};
        use crate::domain::validation::FieldValue;

        let definition = DialogueDefinition::new(
            "person",
            "Person",
            vec![FieldSpec::new("name", FieldRule::text(), "Name?").with_label("Name")],
        );
        let record = PersistedRecord {
            id: RecordId::new(),
            dialogue: "person".into(),
            chat_id: ChatId::new(1),
            submitted_by: UserId::new(1),
            fields: [("name".to_string(), FieldValue::from("Alice"))].into_iter().collect(),
            created_at: Timestamp::from_unix_secs(0),
        };
        let page = Page::new(vec![record], 3, Pagination::default());

        let text = record_page(&definition, &page);

        assert!(text.starts_with("Person: showing 1-1 of 3"));
        assert!(text.contains("01/01/1970 00:00\nName: Alice"));
        assert!(text.ends_with("More: /list person 2"));
    }

    #[test]
    fn page_past_the_end_says_so() {
        let definition = DialogueDefinition::new("person", "Person", vec![]);
        let page: Page<PersistedRecord> = Page::new(vec![], 4, crate::domain::foundation::Pagination::new(10, 10));
        assert_eq!(
            record_page(&definition, &page),
            "No Person records on that page; there are 4 in total."
        );
    }

    #[test]
    fn empty_record_page() {
        let definition = DialogueDefinition::new("person", "Person", vec![]);
        let page: Page<PersistedRecord> = Page::new(vec![], 0, Default::default());
        assert_eq!(record_page(&definition, &page), "No Person records yet.");
    }

    #[test]
    fn edit_which_lists_names() {
        let a = FieldSpec::new("name", FieldRule::text(), "Name?");
        let b = FieldSpec::new("age", FieldRule::integer_between(0, 1), "Age?");
        assert!(edit_which(&[&a, &b]).ends_with("name, age"));
        assert_eq!(edit_which(&[]), "There is nothing to edit yet.");
    }
}
