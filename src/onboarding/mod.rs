//! Onboarding: the fixed three-question preference collection that runs
//! before free-form chat.
//!
//! Each answer is written verbatim into [`PreferenceState`]; once the last
//! question is answered the state is terminal and later messages go to the
//! relay. The collected [`Preferences`] feed the system instruction sent
//! with every relayed message.

pub mod model;
pub mod prompts;
pub mod state;

pub use model::{PreferenceField, PreferenceState, Preferences};
pub use prompts::{COMPLETION_MESSAGE, QUESTIONS, preference_instruction};
pub use state::{OnboardingStep, StepOutcome};
