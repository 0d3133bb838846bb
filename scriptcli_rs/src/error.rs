//! Error types for building, parsing and running command trees.
//!
//! Three families, kept apart because callers treat them differently:
//! [`BuildError`] is a bug in the script that declares the tree,
//! [`ParseError`] is bad user input and is printed, never raised,
//! [`RunError`] covers dispatch failures after a successful parse.

use thiserror::Error;

use crate::value::{Value, ValueType};

/// Construction errors raised by [`crate::CommandBuilder::build`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BuildError {
    #[error("command built without a name")]
    MissingName,

    #[error("command '{command}' has neither sub-commands nor an action")]
    NoAction { command: String },

    #[error("default value {default} of option '{option}' in '{command}' is not one of its choices")]
    DefaultNotInChoices {
        command: String,
        option: String,
        default: String,
    },

    #[error("default value of option '{option}' in '{command}' must be of type '{expected}'")]
    DefaultTypeMismatch {
        command: String,
        option: String,
        expected: ValueType,
    },

    #[error("option name '{option}' is declared twice in '{command}'")]
    DuplicateOption { command: String, option: String },

    #[error("option name '{option}' in '{command}' is taken by the launcher or a special flag")]
    ReservedOption { command: String, option: String },
}

/// User input errors. `Display` is the exact message shown to the user.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unknown option '{token}' for '{command}'{}", hint_suffix(suggestion))]
    UnknownOption {
        token: String,
        command: String,
        suggestion: Option<String>,
    },

    #[error("Option '{token}' requires type '{expected}', got '{}'", got_type(got))]
    OptionType {
        token: String,
        expected: ValueType,
        got: Option<Value>,
    },

    #[error("'{value}' is not a valid choice for option '{option}' for '{command}'")]
    OptionChoice {
        value: Value,
        option: String,
        command: String,
    },

    #[error("Option '{option}' is required but not provided for '{command}'")]
    RequiredOption { option: String, command: String },

    #[error("Too many arguments provided for '{command}'")]
    TooManyArguments { command: String },

    #[error("Missing argument '{argument}' for '{command}'")]
    MissingArgument { argument: String, command: String },

    #[error("Argument '{argument}' is not of type '{expected}', got '{}'", got.value_type())]
    ArgumentType {
        argument: String,
        expected: ValueType,
        got: Value,
    },

    #[error("'{value}' is not a valid choice for argument '{argument}' of '{command}'")]
    ArgumentChoice {
        value: Value,
        argument: String,
        command: String,
    },
}

fn hint_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(". Did you mean '{}'?", s),
        None => String::new(),
    }
}

fn got_type(got: &Option<Value>) -> &'static str {
    match got {
        Some(value) => value.value_type().as_str(),
        None => "nothing",
    }
}

/// Failures while dispatching a parsed invocation.
#[derive(Debug, Error)]
pub enum RunError {
    /// The tree resolved to a node with no reachable action. This is a
    /// malformed program, not a user mistake.
    #[error("no action registered for '{command}'")]
    MissingAction { command: String },

    #[error("action for '{command}' failed: {error:#}")]
    Action { command: String, error: anyhow::Error },
}
