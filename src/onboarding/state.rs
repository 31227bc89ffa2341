//! Onboarding state machine: asks the three preference questions in order.

use serde::{Deserialize, Serialize};

use super::model::{PreferenceField, PreferenceState};
use super::prompts::{COMPLETION_MESSAGE, QUESTIONS};

/// The steps of the onboarding conversation.
///
/// Progresses linearly: Country → Continent → Destination → Complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    Country,
    Continent,
    Destination,
    Complete,
}

impl OnboardingStep {
    /// Map a question index to its step. Indices past the last question are
    /// terminal.
    pub fn from_index(index: usize) -> Self {
        match index {
            0 => Self::Country,
            1 => Self::Continent,
            2 => Self::Destination,
            _ => Self::Complete,
        }
    }

    /// Question index, `None` for the terminal step.
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Country => Some(0),
            Self::Continent => Some(1),
            Self::Destination => Some(2),
            Self::Complete => None,
        }
    }

    /// The preference this step writes.
    pub fn field(&self) -> Option<PreferenceField> {
        match self {
            Self::Country => Some(PreferenceField::Country),
            Self::Continent => Some(PreferenceField::Continent),
            Self::Destination => Some(PreferenceField::Destination),
            Self::Complete => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete)
    }

    pub fn next(&self) -> Option<OnboardingStep> {
        match self {
            Self::Country => Some(Self::Continent),
            Self::Continent => Some(Self::Destination),
            Self::Destination => Some(Self::Complete),
            Self::Complete => None,
        }
    }
}

impl std::fmt::Display for OnboardingStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Country => "country",
            Self::Continent => "continent",
            Self::Destination => "destination",
            Self::Complete => "complete",
        };
        write!(f, "{s}")
    }
}

/// Outcome of feeding one answer to the sequencer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    /// Field that received the answer.
    pub field: PreferenceField,
    /// Step the state moved to.
    pub next: OnboardingStep,
    /// Assistant reply: the next question, or the completion message.
    pub reply: &'static str,
}

/// Record `value` as the answer to the current question and advance.
///
/// Returns `None` once onboarding is complete; the answer is then left for
/// the relay.
///
/// `value` must be non-empty; [`crate::chat::ChatSession`] drops blank input
/// before it gets here.
pub fn answer(state: &mut PreferenceState, value: &str) -> Option<StepOutcome> {
    let step = state.step();
    let field = step.field()?;
    let next = step.next()?;

    state.preferences.set(field, value);

    let reply = match next.index() {
        Some(i) => {
            state.current_question = i;
            QUESTIONS[i]
        }
        None => {
            state.onboarding_complete = true;
            COMPLETION_MESSAGE
        }
    };
    debug_assert!(
        !state.onboarding_complete || state.preferences.is_filled(),
        "onboarding completed with an empty preference"
    );

    tracing::debug!(field = %field, next = %next, "Onboarding answer recorded");

    Some(StepOutcome { field, next, reply })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onboarding::model::Preferences;

    #[test]
    fn next_walks_all_steps() {
        use OnboardingStep::*;
        let mut current = Country;
        for expected in [Continent, Destination, Complete] {
            let next = current.next().unwrap();
            assert_eq!(next, expected);
            current = next;
        }
        assert!(current.next().is_none());
        assert!(current.is_terminal());
    }

    #[test]
    fn index_roundtrip() {
        for i in 0..3 {
            assert_eq!(OnboardingStep::from_index(i).index(), Some(i));
        }
        assert_eq!(OnboardingStep::from_index(3), OnboardingStep::Complete);
    }

    #[test]
    fn display_matches_serde() {
        use OnboardingStep::*;
        for step in [Country, Continent, Destination, Complete] {
            let json = serde_json::to_string(&step).unwrap();
            assert_eq!(format!("\"{step}\""), json);
        }
    }

    #[test]
    fn three_answers_complete_onboarding() {
        let mut state = PreferenceState::default();
        assert_eq!(state.step(), OnboardingStep::Country);

        let first = answer(&mut state, "Italy").unwrap();
        assert_eq!(first.field, PreferenceField::Country);
        assert_eq!(first.reply, "What is your favorite continent?");
        assert_eq!(state.current_question, 1);

        let second = answer(&mut state, "Europe").unwrap();
        assert_eq!(second.reply, "What is your favorite destination?");
        assert_eq!(state.current_question, 2);
        assert!(!state.onboarding_complete);

        let third = answer(&mut state, "Rome").unwrap();
        assert_eq!(third.next, OnboardingStep::Complete);
        assert_eq!(
            third.reply,
            "Great! Now I can help you with geography questions."
        );
        assert!(state.onboarding_complete);
        assert_eq!(state.preferences, Preferences::new("Italy", "Europe", "Rome"));
        assert!(state.preferences.is_filled());
    }

    #[test]
    fn answers_after_completion_are_not_consumed() {
        let mut state = PreferenceState::default();
        for value in ["Italy", "Europe", "Rome"] {
            answer(&mut state, value).unwrap();
        }
        assert!(answer(&mut state, "What is the capital of Peru?").is_none());
        assert_eq!(state.preferences.destination, "Rome");
    }

    #[test]
    fn answers_are_stored_verbatim() {
        let mut state = PreferenceState::default();
        answer(&mut state, "  the one with the boot  ").unwrap();
        assert_eq!(state.preferences.country, "  the one with the boot  ");
    }
}
