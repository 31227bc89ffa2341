//! Fixed onboarding texts and the personalization instruction sent to the
//! completion provider.

use super::model::{PreferenceField, Preferences};

/// Onboarding questions, indexed by step.
pub const QUESTIONS: [&str; 3] = [
    "What is your favorite country?",
    "What is your favorite continent?",
    "What is your favorite destination?",
];

/// Sent once the last question is answered.
pub const COMPLETION_MESSAGE: &str = "Great! Now I can help you with geography questions.";

/// Confirmation appended after a command-driven preference edit.
pub fn edit_confirmation(field: PreferenceField, value: &str) -> String {
    format!("Got it! Your favorite {field} is now {value}.")
}

/// Build the system instruction that personalizes the model's answers.
///
/// Never shown in the conversation; only sent on the wire.
pub fn preference_instruction(preferences: &Preferences) -> String {
    format!(
        "You are a geography chatbot. The user's preferences are: \
         Favorite country: {}, Favorite continent: {}, Favorite destination: {}. \
         Use this information to provide personalized responses about world geography.",
        preferences.country, preferences.continent, preferences.destination
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruction_names_all_preferences() {
        let prompt = preference_instruction(&Preferences::new("Italy", "Europe", "Rome"));
        assert!(prompt.starts_with("You are a geography chatbot."));
        assert!(prompt.contains("Favorite country: Italy, "));
        assert!(prompt.contains("Favorite continent: Europe, "));
        assert!(prompt.contains("Favorite destination: Rome. "));
        assert!(prompt.ends_with("about world geography."));
    }

    #[test]
    fn confirmation_names_field_and_value() {
        assert_eq!(
            edit_confirmation(PreferenceField::Destination, "Paris"),
            "Got it! Your favorite destination is now Paris."
        );
    }
}
