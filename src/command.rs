//! The contract between the dispatcher and command implementations.
//!
//! Every command declares a fixed parameter schema as a `&'static [Param]`.
//! The binder reads the schema, converts raw arguments to [`Value`]s and hands
//! them to [`Command::assign`] one property at a time.

use std::marker::PhantomData;

use crate::context::Context;
use crate::error::BindError;
use crate::help::HelpDetails;
use crate::interpreter::Interpreter;
use crate::lexer::parse_boolean;
use crate::result::CommandResult;

/// How a parameter is recognised on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// `-name`, toggles a boolean.
    Flag { name: &'static str },
    /// `-name value`, or `-name w1 .. wN` when `words` is greater than one.
    Named { name: &'static str, words: usize },
    /// Positional, by zero-based index among the unnamed arguments.
    Numbered { index: usize },
    /// Every positional argument past the highest numbered index.
    List,
}

/// Type a property expects; selects the conversion applied before assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Text,
    Integer,
    Bool,
    /// Exactly two words.
    KeyValue,
    TextList,
}

/// One entry of a command's parameter schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    pub property: &'static str,
    pub kind: ParamKind,
    pub placeholder: &'static str,
    pub description: &'static str,
    pub value_type: ValueType,
    pub optional: bool,
    /// Variables are not interpolated into this parameter's value.
    pub no_substitution: bool,
}

impl Param {
    const fn new(
        property: &'static str,
        kind: ParamKind,
        placeholder: &'static str,
        description: &'static str,
        value_type: ValueType,
    ) -> Self {
        Self {
            property,
            kind,
            placeholder,
            description,
            value_type,
            optional: false,
            no_substitution: false,
        }
    }

    pub const fn flag(property: &'static str, name: &'static str, description: &'static str) -> Self {
        Self::new(property, ParamKind::Flag { name }, "", description, ValueType::Bool)
    }

    pub const fn named(
        property: &'static str,
        name: &'static str,
        placeholder: &'static str,
        description: &'static str,
    ) -> Self {
        Self::new(
            property,
            ParamKind::Named { name, words: 1 },
            placeholder,
            description,
            ValueType::Text,
        )
    }

    pub const fn multi_word(
        property: &'static str,
        name: &'static str,
        words: usize,
        placeholder: &'static str,
        description: &'static str,
    ) -> Self {
        Self::new(
            property,
            ParamKind::Named { name, words },
            placeholder,
            description,
            ValueType::TextList,
        )
    }

    pub const fn numbered(
        property: &'static str,
        index: usize,
        placeholder: &'static str,
        description: &'static str,
    ) -> Self {
        Self::new(
            property,
            ParamKind::Numbered { index },
            placeholder,
            description,
            ValueType::Text,
        )
    }

    pub const fn list(property: &'static str, placeholder: &'static str, description: &'static str) -> Self {
        Self::new(property, ParamKind::List, placeholder, description, ValueType::TextList)
    }

    pub const fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub const fn no_substitution(mut self) -> Self {
        self.no_substitution = true;
        self
    }

    pub const fn typed(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    /// The `-name` or positional word this parameter shows up as in usage text.
    pub fn usage_token(&self) -> String {
        match self.kind {
            ParamKind::Flag { name } => format!("-{}", name),
            ParamKind::Named { name, .. } => format!("-{} {}", name, self.placeholder),
            ParamKind::Numbered { .. } | ParamKind::List => self.placeholder.to_string(),
        }
    }

    /// The key listed in the parameter table of generated help.
    pub fn help_key(&self) -> String {
        match self.kind {
            ParamKind::Flag { name } | ParamKind::Named { name, .. } => format!("-{}", name),
            ParamKind::Numbered { .. } | ParamKind::List => self.placeholder.to_string(),
        }
    }
}

/// A bound property value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Bool(bool),
    KeyValue(String, String),
    List(Vec<String>),
}

impl Value {
    /// Converts to the declared type of `property`, or reports why it can't.
    pub fn convert(self, property: &str, to: ValueType) -> Result<Value, BindError> {
        match (self, to) {
            (v @ Value::Text(_), ValueType::Text)
            | (v @ Value::Integer(_), ValueType::Integer)
            | (v @ Value::Bool(_), ValueType::Bool)
            | (v @ Value::KeyValue(..), ValueType::KeyValue)
            | (v @ Value::List(_), ValueType::TextList) => Ok(v),
            (Value::Text(s), ValueType::Integer) => s
                .trim()
                .parse()
                .map(Value::Integer)
                .map_err(|e| BindError::conversion(property, s.clone(), e.to_string())),
            (Value::Text(s), ValueType::Bool) => parse_boolean(&s)
                .map(Value::Bool)
                .ok_or_else(|| BindError::conversion(property, s, "not a boolean")),
            (Value::Text(s), ValueType::TextList) => Ok(Value::List(vec![s])),
            (Value::List(mut words), ValueType::KeyValue) if words.len() == 2 => {
                let value = words.pop().unwrap_or_default();
                let key = words.pop().unwrap_or_default();
                Ok(Value::KeyValue(key, value))
            }
            (Value::List(words), ValueType::KeyValue) => Err(BindError::conversion(
                property,
                words.join(" "),
                "wrong number of arguments provided",
            )),
            (Value::List(words), ValueType::Text) => Ok(Value::Text(words.join(" "))),
            (Value::Integer(n), ValueType::Text) => Ok(Value::Text(n.to_string())),
            (Value::Bool(b), ValueType::Text) => Ok(Value::Text(b.to_string())),
            (other, to) => Err(BindError::conversion(
                property,
                format!("{:?}", other),
                format!("cannot convert to {:?}", to),
            )),
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Value::Text(s) => s,
            Value::Integer(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::KeyValue(k, v) => format!("{} {}", k, v),
            Value::List(words) => words.join(" "),
        }
    }

    pub fn into_list(self) -> Vec<String> {
        match self {
            Value::List(words) => words,
            Value::KeyValue(k, v) => vec![k, v],
            other => vec![other.into_text()],
        }
    }

    pub fn as_bool(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Integer(n) => *n != 0,
            Value::Text(s) => parse_boolean(s).unwrap_or(false),
            Value::KeyValue(..) | Value::List(_) => false,
        }
    }
}

/// Object-safe interface of anything the dispatcher can invoke.
///
/// A fresh instance is created for every invocation; properties start at their
/// defaults and are filled in by the binder before [`Command::run`].
pub trait Command {
    fn params(&self) -> &'static [Param];

    /// Stores a bound value on the property named `property`.
    fn assign(&mut self, property: &str, value: Value) -> Result<(), BindError>;

    /// Current value of a flag property, toggled when the flag is present.
    fn flag(&self, property: &str) -> bool;

    /// Commands answering `true` receive their substituted arguments through
    /// [`Command::accept_raw_args`] instead of the binder.
    fn manual_parse(&self) -> bool {
        false
    }

    fn accept_raw_args(&mut self, _args: Vec<String>) {}

    fn run(&mut self, interp: &mut Interpreter, ctx: &mut dyn Context) -> CommandResult;

    fn description(&self) -> &'static str;

    /// Adds command specific comments and examples to generated help.
    fn help(&self, _details: &mut HelpDetails) {}
}

/// Creates fresh command instances.
pub trait CommandFactory: Send + Sync {
    fn create(&self) -> Box<dyn Command>;

    /// Rust type name of the command, used when binding by implementation.
    fn type_name(&self) -> &'static str;
}

/// Factory for any `Default` command type.
pub struct Factory<T> {
    _phantom: PhantomData<fn() -> T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<T: Command + Default + 'static> CommandFactory for Factory<T> {
    fn create(&self) -> Box<dyn Command> {
        Box::new(T::default())
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_conversions() {
        assert_eq!(
            Value::Text(" 12 ".into()).convert("n", ValueType::Integer),
            Ok(Value::Integer(12))
        );
        assert_eq!(
            Value::Text("yes".into()).convert("b", ValueType::Bool),
            Ok(Value::Bool(true))
        );
        assert!(Value::Text("twelve".into()).convert("n", ValueType::Integer).is_err());
        assert_eq!(
            Value::Text("a".into()).convert("l", ValueType::TextList),
            Ok(Value::List(vec!["a".into()]))
        );
    }

    #[test]
    fn test_key_value_needs_two_words() {
        let ok = Value::List(vec!["title".into(), "hello".into()]).convert("f", ValueType::KeyValue);
        assert_eq!(ok, Ok(Value::KeyValue("title".into(), "hello".into())));

        let err = Value::List(vec!["title".into()])
            .convert("f", ValueType::KeyValue)
            .unwrap_err();
        assert!(err.to_string().contains("wrong number of arguments"));
    }

    #[test]
    fn test_usage_tokens() {
        const SCHEMA: &[Param] = &[
            Param::flag("recursive", "r", "Recurse"),
            Param::named("symbol", "s", "symbol", "Split symbol").optional(),
            Param::numbered("input", 0, "input", "Input"),
            Param::list("rest", "parameters", "Others").no_substitution(),
        ];
        let tokens: Vec<String> = SCHEMA.iter().map(Param::usage_token).collect();
        assert_eq!(tokens, vec!["-r", "-s symbol", "input", "parameters"]);
        assert!(SCHEMA[1].optional);
        assert!(SCHEMA[3].no_substitution);
        assert_eq!(SCHEMA[1].help_key(), "-s");
    }
}
