//! Dialogue progress states.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a conversation stands inside its dialogue.
///
/// Indices refer to positions in the dialogue definition's field list, so
/// which moves are legal depends on how many fields the dialogue has. See
/// [`DialogueState::can_transition_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogueState {
    /// Waiting for the answer to field `index`.
    AwaitingField { index: usize },

    /// Re-collecting field `index`. With `resume_at` set, collection
    /// continues at that field afterwards; otherwise the dialogue goes back
    /// to `Completed`.
    Revising {
        index: usize,
        resume_at: Option<usize>,
    },

    /// All fields collected; the record has not been committed yet.
    Completed,

    /// Abandoned by the user.
    Cancelled,
}

impl DialogueState {
    pub fn initial() -> Self {
        DialogueState::AwaitingField { index: 0 }
    }

    /// Index of the field an answer would be checked against.
    pub fn field_index(&self) -> Option<usize> {
        match self {
            DialogueState::AwaitingField { index } | DialogueState::Revising { index, .. } => {
                Some(*index)
            }
            DialogueState::Completed | DialogueState::Cancelled => None,
        }
    }

    /// True once no more fields are collected in order.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DialogueState::Completed | DialogueState::Cancelled)
    }

    /// Checks whether moving to `target` is legal in a dialogue of
    /// `field_count` fields.
    pub fn can_transition_to(&self, target: &DialogueState, field_count: usize) -> bool {
        use DialogueState::*;

        if matches!(target, Cancelled) {
            return !matches!(self, Cancelled);
        }

        match (self, target) {
            (AwaitingField { index: i }, AwaitingField { index: j }) => *j == i + 1 && *j < field_count,
            (AwaitingField { index: i }, Completed) => i + 1 == field_count,
            (
                AwaitingField { index: i },
                Revising {
                    index: r,
                    resume_at: Some(at),
                },
            ) => r < i && at == i,

            (
                Revising {
                    resume_at: Some(at), ..
                },
                AwaitingField { index },
            ) => at == index,
            (Revising { resume_at: None, .. }, Completed) => true,
            (
                Revising { resume_at: from, .. },
                Revising {
                    index: r,
                    resume_at: to,
                },
            ) => from == to && *r < from.unwrap_or(field_count),

            (Completed, Revising { index, resume_at: None }) => *index < field_count,

            _ => false,
        }
    }
}

impl fmt::Display for DialogueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DialogueState::AwaitingField { index } => write!(f, "awaiting_field({index})"),
            DialogueState::Revising {
                index,
                resume_at: Some(at),
            } => write!(f, "revising({index}, resume {at})"),
            DialogueState::Revising { index, resume_at: None } => write!(f, "revising({index})"),
            DialogueState::Completed => write!(f, "completed"),
            DialogueState::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use DialogueState::*;

    mod transitions {
        use super::*;

        #[test]
        fn awaiting_moves_forward_one_field_at_a_time() {
            let state = AwaitingField { index: 0 };
            assert!(state.can_transition_to(&AwaitingField { index: 1 }, 3));
            assert!(!state.can_transition_to(&AwaitingField { index: 2 }, 3));
            assert!(!state.can_transition_to(&Completed, 3));
        }

        #[test]
        fn last_field_completes() {
            assert!(AwaitingField { index: 2 }.can_transition_to(&Completed, 3));
            assert!(!AwaitingField { index: 2 }.can_transition_to(&AwaitingField { index: 3 }, 3));
        }

        #[test]
        fn revising_only_earlier_fields_mid_dialogue() {
            let state = AwaitingField { index: 2 };
            let earlier = Revising {
                index: 0,
                resume_at: Some(2),
            };
            let later = Revising {
                index: 2,
                resume_at: Some(2),
            };
            assert!(state.can_transition_to(&earlier, 3));
            assert!(!state.can_transition_to(&later, 3));
        }

        #[test]
        fn revising_returns_where_it_came_from() {
            let mid = Revising {
                index: 0,
                resume_at: Some(2),
            };
            assert!(mid.can_transition_to(&AwaitingField { index: 2 }, 3));
            assert!(!mid.can_transition_to(&Completed, 3));

            let after = Revising {
                index: 1,
                resume_at: None,
            };
            assert!(after.can_transition_to(&Completed, 3));
            assert!(!after.can_transition_to(&AwaitingField { index: 2 }, 3));
        }

        #[test]
        fn revising_can_switch_field() {
            let mid = Revising {
                index: 0,
                resume_at: Some(2),
            };
            assert!(mid.can_transition_to(
                &Revising {
                    index: 1,
                    resume_at: Some(2)
                },
                3
            ));
            assert!(!mid.can_transition_to(
                &Revising {
                    index: 2,
                    resume_at: Some(2)
                },
                3
            ));
            assert!(!mid.can_transition_to(
                &Revising {
                    index: 1,
                    resume_at: None
                },
                3
            ));
        }

        #[test]
        fn completed_only_revises() {
            assert!(Completed.can_transition_to(
                &Revising {
                    index: 1,
                    resume_at: None
                },
                3
            ));
            assert!(!Completed.can_transition_to(&AwaitingField { index: 0 }, 3));
            assert!(!Completed.can_transition_to(
                &Revising {
                    index: 5,
                    resume_at: None
                },
                3
            ));
        }

        #[test]
        fn anything_but_cancelled_can_cancel() {
            assert!(AwaitingField { index: 0 }.can_transition_to(&Cancelled, 1));
            assert!(Completed.can_transition_to(&Cancelled, 1));
            assert!(!Cancelled.can_transition_to(&Cancelled, 1));
            assert!(!Cancelled.can_transition_to(&AwaitingField { index: 0 }, 1));
        }
    }

    #[test]
    fn terminal_states() {
        assert!(Completed.is_terminal());
        assert!(Cancelled.is_terminal());
        assert!(!AwaitingField { index: 0 }.is_terminal());
    }

    #[test]
    fn field_index_follows_state() {
        assert_eq!(AwaitingField { index: 3 }.field_index(), Some(3));
        assert_eq!(
            Revising {
                index: 1,
                resume_at: None
            }
            .field_index(),
            Some(1)
        );
        assert_eq!(Completed.field_index(), None);
    }

    #[test]
    fn serializes_snake_case_tagged() {
        let json = serde_json::to_string(&AwaitingField { index: 1 }).unwrap();
        assert_eq!(json, r#"{"awaiting_field":{"index":1}}"#);
        assert_eq!(serde_json::to_string(&Completed).unwrap(), r#""completed""#);

        let back: DialogueState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, AwaitingField { index: 1 });
    }
}
