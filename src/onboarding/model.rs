//! Preference data models collected during onboarding.

use serde::{Deserialize, Serialize};

use super::state::OnboardingStep;

/// One of the three collected preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceField {
    Country,
    Continent,
    Destination,
}

impl PreferenceField {
    /// Lower-case name used in user-facing messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Country => "country",
            Self::Continent => "continent",
            Self::Destination => "destination",
        }
    }
}

impl std::fmt::Display for PreferenceField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three preferences sent to the completion endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub continent: String,
    #[serde(default)]
    pub destination: String,
}

impl Preferences {
    pub fn new(
        country: impl Into<String>,
        continent: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            country: country.into(),
            continent: continent.into(),
            destination: destination.into(),
        }
    }

    /// Overwrite a single field.
    pub fn set(&mut self, field: PreferenceField, value: impl Into<String>) {
        let slot = match field {
            PreferenceField::Country => &mut self.country,
            PreferenceField::Continent => &mut self.continent,
            PreferenceField::Destination => &mut self.destination,
        };
        *slot = value.into();
    }

    /// Whether all three fields hold a value.
    pub fn is_filled(&self) -> bool {
        !self.country.is_empty() && !self.continent.is_empty() && !self.destination.is_empty()
    }
}

/// Per-session preference state: the collected values plus onboarding
/// progress.
///
/// Serialized in camelCase so it matches what the chat widget posts as
/// `preferences` (extra fields are ignored by [`Preferences`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceState {
    #[serde(flatten)]
    pub preferences: Preferences,
    pub onboarding_complete: bool,
    pub current_question: usize,
}

impl PreferenceState {
    /// The onboarding step the state is currently waiting on.
    pub fn step(&self) -> OnboardingStep {
        if self.onboarding_complete {
            OnboardingStep::Complete
        } else {
            OnboardingStep::from_index(self.current_question)
        }
    }
}
