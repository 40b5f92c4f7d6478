//! Typed faults raised inside the engine.
//!
//! None of these cross the interpreter boundary: each is turned into a
//! failed [`CommandResult`](crate::result::CommandResult) by the feature that raised it.

use thiserror::Error;

/// Grammar or evaluation fault of the expression language.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExpressionError {
    #[error("Malformed expression '{0}'")]
    Malformed(String),
    #[error("Missing expression after '{0}'")]
    MissingOperand(String),
    #[error("Could not parse boolean value '{0}'")]
    InvalidBoolean(String),
    #[error("Unknown function {0}")]
    UnknownFunction(String),
    #[error("Invalid operator {0}")]
    InvalidOperator(String),
    #[error("Unknown attribute {0}")]
    UnknownAttribute(String),
    #[error("Missing the cast type")]
    MissingCastType,
    #[error("Unknown cast type {0}")]
    UnknownCastType(String),
    #[error("Missing the flag")]
    MissingFlag,
    #[error("Unknown flag {0}")]
    UnknownFlag(String),
    #[error("{0} is not a number")]
    NotANumber(String),
    #[error("{0} is not a date")]
    NotADate(String),
}

/// A raw argument could not be converted to the type a parameter declares.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BindError {
    #[error("Cannot convert '{value}' for parameter '{property}': {reason}")]
    Conversion {
        property: String,
        value: String,
        reason: String,
    },
    #[error("Unknown parameter '{0}'")]
    UnknownProperty(String),
}

impl BindError {
    pub fn conversion(property: &str, value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Conversion {
            property: property.to_string(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ScriptError {
    /// More than one source answers to the same name.
    #[error("Multiple scripts found: {}", names.join(", "))]
    MultipleScriptsFound { names: Vec<String> },
    #[error("Failed to read script '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Alias '{0}' already exists")]
    AliasExists(String),
    #[error("Cannot add alias '{0}' with the same name as an existing command")]
    AliasShadowsCommand(String),
    #[error("Alias '{0}' not found")]
    AliasNotFound(String),
    #[error("Alias '{0}' refers back to itself")]
    AliasCycle(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("Failed to find item '{0}'")]
    ItemNotFound(String),
    #[error("Failed to find database '{0}'")]
    PartitionNotFound(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown directive '{0}'")]
pub struct DirectiveError(pub String);
