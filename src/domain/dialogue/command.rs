//! Classification of inbound text into commands.

use super::DialogueCatalog;

/// Plain-text words that cancel the active dialogue.
pub(super) const CANCEL_WORDS: &[&str] = &["cancel", "cancelar"];

/// What an inbound message asks for, resolved once per message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Menu,
    Help,
    Cancel,
    Skip,
    /// `/edit <field>`; `None` when no field was given.
    Edit(Option<String>),
    /// `/list <dialogue> [page]` with its raw argument; `None` when none was given.
    List(Option<String>),
    /// Start the named dialogue.
    Begin(String),
    /// An unrecognised slash command, without the slash.
    Unknown(String),
    /// Anything else: an answer to the current prompt.
    Text(String),
}

impl Command {
    /// Classifies `text` against the built-in commands and `catalog`.
    ///
    /// Slash commands may carry a `@botname` suffix, as chat clients add
    /// one in group chats.
    pub fn classify(text: &str, catalog: &DialogueCatalog) -> Self {
        let trimmed = text.trim();

        let Some(body) = trimmed.strip_prefix('/') else {
            if CANCEL_WORDS.iter().any(|w| trimmed.eq_ignore_ascii_case(w)) {
                return Command::Cancel;
            }
            if let Some(definition) = catalog.find_by_label(trimmed) {
                return Command::Begin(definition.name.clone());
            }
            return Command::Text(trimmed.to_string());
        };

        let mut parts = body.splitn(2, char::is_whitespace);
        let head = parts.next().unwrap_or_default();
        let name = head.split('@').next().unwrap_or_default().to_lowercase();
        let argument = parts
            .next()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string);

        match name.as_str() {
            "start" => Command::Start,
            "menu" => Command::Menu,
            "help" => Command::Help,
            "cancel" | "cancelar" => Command::Cancel,
            "skip" => Command::Skip,
            "edit" => Command::Edit(argument),
            "list" => Command::List(argument),
            other => match catalog.find_by_command(other) {
                Some(definition) => Command::Begin(definition.name.clone()),
                None => Command::Unknown(other.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(text: &str) -> Command {
        Command::classify(text, &DialogueCatalog::builtin())
    }

    #[test]
    fn recognises_builtin_commands() {
        assert_eq!(classify("/start"), Command::Start);
        assert_eq!(classify("/menu"), Command::Menu);
        assert_eq!(classify("/help"), Command::Help);
        assert_eq!(classify("/skip"), Command::Skip);
        assert_eq!(classify("/CANCEL"), Command::Cancel);
    }

    #[test]
    fn strips_bot_mention() {
        assert_eq!(classify("/start@arquea_bot"), Command::Start);
    }

    #[test]
    fn plain_cancel_words_cancel() {
        assert_eq!(classify("cancel"), Command::Cancel);
        assert_eq!(classify(" Cancelar "), Command::Cancel);
    }

    #[test]
    fn edit_and_list_take_an_argument() {
        assert_eq!(classify("/edit  phone "), Command::Edit(Some("phone".into())));
        assert_eq!(classify("/edit"), Command::Edit(None));
        assert_eq!(classify("/list client"), Command::List(Some("client".into())));
    }

    #[test]
    fn dialogue_commands_and_labels_begin() {
        assert_eq!(classify("/cliente"), Command::Begin("client".into()));
        assert_eq!(classify("/harvest"), Command::Begin("harvest".into()));
        assert_eq!(classify("Add client"), Command::Begin("client".into()));
    }

    #[test]
    fn unknown_slash_command() {
        assert_eq!(classify("/frobnicate now"), Command::Unknown("frobnicate".into()));
    }

    #[test]
    fn anything_else_is_text() {
        assert_eq!(classify("  Alice "), Command::Text("Alice".into()));
        assert_eq!(classify("canceled"), Command::Text("canceled".into()));
    }
}
