//! Slash-command grammar for editing a single preference after (or during)
//! onboarding.
//!
//! The command set is closed: each variant carries a static record with its
//! literal key, the prompt asked when it is issued, and a help line.
//! Execution matches keys exactly (after trimming, case-sensitive);
//! autocomplete matches prefixes case-insensitively.

use serde::{Deserialize, Serialize};

use crate::onboarding::model::PreferenceField;

/// A recognized slash-command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Command {
    ChangeDestination,
    ChangeContinent,
    ChangeCountry,
}

/// Static description of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    /// Literal text the user types, e.g. `/change-country`.
    pub key: &'static str,
    /// Assistant prompt asking for the replacement value.
    pub prompt: &'static str,
    /// Human-readable description.
    pub help: &'static str,
    /// Preference field the command overwrites.
    pub field: PreferenceField,
}

/// Command table, in suggestion order.
pub const COMMANDS: [Command; 3] = [
    Command::ChangeDestination,
    Command::ChangeContinent,
    Command::ChangeCountry,
];

impl Command {
    pub const fn spec(self) -> CommandSpec {
        match self {
            Self::ChangeDestination => CommandSpec {
                key: "/change-destination",
                prompt: "What is your new favorite destination?",
                help: "Change your favorite destination",
                field: PreferenceField::Destination,
            },
            Self::ChangeContinent => CommandSpec {
                key: "/change-continent",
                prompt: "What is your new favorite continent?",
                help: "Change your favorite continent",
                field: PreferenceField::Continent,
            },
            Self::ChangeCountry => CommandSpec {
                key: "/change-country",
                prompt: "What is your new favorite country?",
                help: "Change your favorite country",
                field: PreferenceField::Country,
            },
        }
    }

    pub fn key(self) -> &'static str {
        self.spec().key
    }

    pub fn prompt(self) -> &'static str {
        self.spec().prompt
    }

    pub fn help(self) -> &'static str {
        self.spec().help
    }

    pub fn field(self) -> PreferenceField {
        self.spec().field
    }

    /// Exact lookup by literal key. The input must already be trimmed.
    fn from_key(key: &str) -> Option<Self> {
        COMMANDS.into_iter().find(|cmd| cmd.key() == key)
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Result of running user input through the command grammar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandMatch {
    pub is_command: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<Command>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_prompt: Option<&'static str>,
}

impl CommandMatch {
    fn none() -> Self {
        Self {
            is_command: false,
            command: None,
            response_prompt: None,
        }
    }
}

/// Match `input` exactly (after trimming) against the command table.
pub fn parse_command(input: &str) -> CommandMatch {
    match Command::from_key(input.trim()) {
        Some(command) => CommandMatch {
            is_command: true,
            command: Some(command),
            response_prompt: Some(command.prompt()),
        },
        None => CommandMatch::none(),
    }
}

/// Help text for a fully-typed command, if `input` is one.
pub fn command_help(input: &str) -> Option<&'static str> {
    Command::from_key(input.trim()).map(Command::help)
}

/// Autocomplete candidates for partial input.
///
/// Yields every command key that starts with the trimmed input, compared
/// case-insensitively, in table order. Input that does not start with `/`
/// yields nothing.
pub fn command_suggestions(input: &str) -> impl Iterator<Item = &'static str> {
    let needle = input.trim().to_lowercase();
    let active = needle.starts_with('/');
    COMMANDS
        .into_iter()
        .map(Command::key)
        .filter(move |key| active && key.to_lowercase().starts_with(&needle))
}
