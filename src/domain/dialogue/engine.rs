//! Dialogue engine - the pure state machine behind every conversation.
//!
//! `advance` takes the loaded conversation (if any) and the classified
//! command, and returns what should happen to the stored conversation plus
//! the replies to send. It performs no I/O; the router applies the effect.

use std::sync::Arc;

use super::{
    replies, Command, Conversation, DialogueCatalog, DialogueDefinition, DialogueState,
    InvalidTransition,
};
use crate::domain::foundation::{ConversationKey, Timestamp};
use crate::domain::validation::{self, FieldSpec, FieldValue};

/// What the router must do with the stored conversation.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Leave storage untouched.
    None,
    /// Upsert the conversation.
    Save(Conversation),
    /// Delete the conversation for the key.
    Clear,
    /// Persist the completed conversation as a record, clearing it atomically.
    Commit(Conversation),
}

/// Result of advancing a conversation by one command.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub effect: Effect,
    pub replies: Vec<String>,
}

impl Transition {
    pub fn new(effect: Effect, replies: Vec<String>) -> Self {
        Self { effect, replies }
    }

    /// A reply that leaves storage untouched.
    pub fn reply(text: String) -> Self {
        Self::new(Effect::None, vec![text])
    }
}

/// Pure dialogue state machine over a shared catalog.
#[derive(Debug, Clone)]
pub struct DialogueEngine {
    catalog: Arc<DialogueCatalog>,
}

impl DialogueEngine {
    pub fn new(catalog: Arc<DialogueCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &DialogueCatalog {
        &self.catalog
    }

    pub fn classify(&self, text: &str) -> Command {
        Command::classify(text, &self.catalog)
    }

    /// Advances `current` by `command`.
    ///
    /// Errors only when a computed move is illegal for the dialogue, which
    /// means the stored conversation no longer matches its definition.
    pub fn advance(
        &self,
        key: ConversationKey,
        current: Option<Conversation>,
        command: Command,
        now: Timestamp,
    ) -> Result<Transition, InvalidTransition> {
        match command {
            Command::Begin(name) => Ok(self.begin(key, &name, now)),
            Command::Start | Command::Menu => Ok(Transition::reply(replies::menu(&self.catalog))),
            Command::Help | Command::List(_) => {
                Ok(self.with_reminder(current.as_ref(), replies::help(&self.catalog)))
            }
            Command::Unknown(name) => Ok(self.with_reminder(
                current.as_ref(),
                replies::unknown_command(&name, &self.catalog),
            )),
            Command::Cancel => Ok(self.cancel(current)),
            Command::Text(raw) => self.with_active(current, |definition, conversation| {
                self.answer(definition, conversation, &raw, now)
            }),
            Command::Skip => self.with_active(current, |definition, conversation| {
                self.skip(definition, conversation, now)
            }),
            Command::Edit(field) => self.with_active(current, |definition, conversation| {
                self.edit(definition, conversation, field.as_deref(), now)
            }),
        }
    }

    fn begin(&self, key: ConversationKey, name: &str, now: Timestamp) -> Transition {
        let Some(definition) = self.catalog.get(name) else {
            return Transition::reply(replies::help(&self.catalog));
        };
        let conversation = Conversation::start(key, definition.name.clone(), now);
        Transition::new(
            Effect::Save(conversation),
            vec![replies::started(definition), prompt(definition, 0)],
        )
    }

    fn cancel(&self, current: Option<Conversation>) -> Transition {
        match current {
            Some(conversation) => {
                let definition = self.catalog.get(conversation.dialogue());
                Transition::new(Effect::Clear, vec![replies::cancelled(definition)])
            }
            None => Transition::reply(replies::help(&self.catalog)),
        }
    }

    /// Runs `f` against the active conversation and its definition, or
    /// answers with help when there is nothing to continue.
    fn with_active<F>(
        &self,
        current: Option<Conversation>,
        f: F,
    ) -> Result<Transition, InvalidTransition>
    where
        F: FnOnce(&DialogueDefinition, Conversation) -> Result<Transition, InvalidTransition>,
    {
        let Some(conversation) = current else {
            return Ok(Transition::reply(replies::help(&self.catalog)));
        };
        if conversation.state() == DialogueState::Cancelled {
            return Ok(Transition::new(
                Effect::Clear,
                vec![replies::help(&self.catalog)],
            ));
        }
        match self.catalog.get(conversation.dialogue()) {
            Some(definition) => f(definition, conversation),
            None => Ok(Transition::new(
                Effect::Clear,
                vec![replies::dialogue_gone()],
            )),
        }
    }

    fn answer(
        &self,
        definition: &DialogueDefinition,
        conversation: Conversation,
        raw: &str,
        now: Timestamp,
    ) -> Result<Transition, InvalidTransition> {
        let Some(index) = conversation.state().field_index() else {
            // Completed: the previous commit did not go through, try again.
            return Ok(Transition::new(Effect::Commit(conversation), vec![]));
        };
        let Some(spec) = definition.field(index) else {
            return Ok(Transition::new(
                Effect::Clear,
                vec![replies::dialogue_gone()],
            ));
        };

        match validation::check(spec, raw) {
            Ok(value) => self.accept(definition, conversation, spec, Some(value), now),
            Err(error) => Ok(Transition::reply(replies::reprompt(&error, spec))),
        }
    }

    fn skip(
        &self,
        definition: &DialogueDefinition,
        conversation: Conversation,
        now: Timestamp,
    ) -> Result<Transition, InvalidTransition> {
        let Some(index) = conversation.state().field_index() else {
            return Ok(Transition::reply(replies::awaiting_commit()));
        };
        let Some(spec) = definition.field(index) else {
            return Ok(Transition::new(
                Effect::Clear,
                vec![replies::dialogue_gone()],
            ));
        };

        if !spec.optional {
            return Ok(Transition::reply(replies::required(spec)));
        }
        self.accept(definition, conversation, spec, None, now)
    }

    /// Stores (or clears) the value for `spec` and moves past it.
    fn accept(
        &self,
        definition: &DialogueDefinition,
        mut conversation: Conversation,
        spec: &FieldSpec,
        value: Option<FieldValue>,
        now: Timestamp,
    ) -> Result<Transition, InvalidTransition> {
        match value {
            Some(value) => conversation.set_value(spec.name.clone(), value, now),
            None => conversation.remove_value(&spec.name, now),
        }

        let count = definition.field_count();
        match conversation.state() {
            DialogueState::AwaitingField { index } if index + 1 == count => {
                conversation.transition_to(DialogueState::Completed, count, now)?;
                Ok(Transition::new(Effect::Commit(conversation), vec![]))
            }
            DialogueState::AwaitingField { index } => {
                let next = index + 1;
                conversation.transition_to(DialogueState::AwaitingField { index: next }, count, now)?;
                Ok(Transition::new(
                    Effect::Save(conversation),
                    vec![prompt(definition, next)],
                ))
            }
            DialogueState::Revising {
                resume_at: Some(at),
                ..
            } => {
                conversation.transition_to(DialogueState::AwaitingField { index: at }, count, now)?;
                Ok(Transition::new(
                    Effect::Save(conversation),
                    vec![replies::updated(spec), prompt(definition, at)],
                ))
            }
            DialogueState::Revising { resume_at: None, .. } => {
                conversation.transition_to(DialogueState::Completed, count, now)?;
                Ok(Transition::new(
                    Effect::Commit(conversation),
                    vec![replies::updated(spec)],
                ))
            }
            state @ (DialogueState::Completed | DialogueState::Cancelled) => Err(InvalidTransition {
                from: state,
                to: state,
            }),
        }
    }

    fn edit(
        &self,
        definition: &DialogueDefinition,
        mut conversation: Conversation,
        field: Option<&str>,
        now: Timestamp,
    ) -> Result<Transition, InvalidTransition> {
        let state = conversation.state();
        let (editable, resume_at) = match state {
            DialogueState::AwaitingField { index } => (index, Some(index)),
            DialogueState::Revising { resume_at, .. } => {
                (resume_at.unwrap_or(definition.field_count()), resume_at)
            }
            DialogueState::Completed => (definition.field_count(), None),
            DialogueState::Cancelled => (0, None),
        };
        let editable: Vec<&FieldSpec> = definition.fields.iter().take(editable).collect();

        let target = field.and_then(|name| {
            editable
                .iter()
                .position(|spec| spec.name.eq_ignore_ascii_case(name))
        });
        let Some(index) = target else {
            return Ok(Transition::reply(replies::edit_which(&editable)));
        };

        let spec = editable[index];
        let ask = match conversation.value(&spec.name) {
            Some(current) => format!("Current answer: {}. {}", current, spec.prompt_text()),
            None => spec.prompt_text(),
        };
        conversation.transition_to(DialogueState::Revising { index, resume_at }, definition.field_count(), now)?;
        Ok(Transition::new(Effect::Save(conversation), vec![ask]))
    }

    fn with_reminder(&self, current: Option<&Conversation>, text: String) -> Transition {
        let mut texts = vec![text];
        if let Some(conversation) = current {
            if let Some(definition) = self.catalog.get(conversation.dialogue()) {
                let next = match conversation.state().field_index() {
                    Some(index) => prompt(definition, index),
                    None => replies::awaiting_commit(),
                };
                texts.push(replies::reminder(definition, &next));
            }
        }
        Transition::new(Effect::None, texts)
    }
}

fn prompt(definition: &DialogueDefinition, index: usize) -> String {
    definition
        .field(index)
        .map(FieldSpec::prompt_text)
        .unwrap_or_default()
}
