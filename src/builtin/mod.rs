//! Commands the engine knows at compile time.

mod binding;
mod flow;
mod help;
mod math;
mod nav;
mod text;
mod vars;

use std::sync::Arc;

use crate::command::{Command, CommandFactory, Factory, Param, Value};
use crate::context::Context;
use crate::error::BindError;
use crate::help::HelpDetails;
use crate::interpreter::Interpreter;
use crate::registry::CommandRegistry;
use crate::result::CommandResult;

pub use binding::{Alias, Bind};
pub use flow::{Exit, If, Repeat, Split};
pub use help::{Help, ListScripts};
pub use math::{Add, Divide, Modulus, Multiply, Random, Subtract};
pub use nav::{ChangePath, PrintPath};
pub use text::Replace;
pub use vars::{Echo, SetVariable};

/// Built-in commands with a static schema.
///
/// Builtins execute in-process with the interpreter and context passed in.
/// Expected problems are returned as failed results; anything else may be
/// propagated with `?` and is reported as a failure carrying the error text.
pub(crate) trait BuiltinCommand: Default + 'static {
    /// Canonical name of the command, e.g. "echo" or "cd".
    fn name() -> &'static str;

    fn schema() -> &'static [Param];

    fn about() -> &'static str;

    fn set_property(&mut self, property: &str, value: Value) -> Result<(), BindError>;

    fn flag_value(&self, _property: &str) -> bool {
        false
    }

    fn execute(
        &mut self,
        interp: &mut Interpreter,
        ctx: &mut dyn Context,
    ) -> anyhow::Result<CommandResult>;

    fn examples(_details: &mut HelpDetails) {}
}

impl<T: BuiltinCommand> Command for T {
    fn params(&self) -> &'static [Param] {
        T::schema()
    }

    fn assign(&mut self, property: &str, value: Value) -> Result<(), BindError> {
        self.set_property(property, value)
    }

    fn flag(&self, property: &str) -> bool {
        self.flag_value(property)
    }

    fn run(&mut self, interp: &mut Interpreter, ctx: &mut dyn Context) -> CommandResult {
        match self.execute(interp, ctx) {
            Ok(result) => result,
            Err(e) => CommandResult::failure(format!("{:#}", e)),
        }
    }

    fn description(&self) -> &'static str {
        T::about()
    }

    fn help(&self, details: &mut HelpDetails) {
        T::examples(details)
    }
}

fn entry<T: BuiltinCommand>() -> (&'static str, Arc<dyn CommandFactory>) {
    (T::name(), Arc::new(Factory::<T>::default()))
}

/// Name and factory of every built-in command.
pub fn core_commands() -> Vec<(&'static str, Arc<dyn CommandFactory>)> {
    vec![
        entry::<Echo>(),
        entry::<SetVariable>(),
        entry::<Alias>(),
        entry::<Bind>(),
        entry::<If>(),
        entry::<Exit>(),
        entry::<Repeat>(),
        entry::<Split>(),
        entry::<Add>(),
        entry::<Subtract>(),
        entry::<Multiply>(),
        entry::<Divide>(),
        entry::<Modulus>(),
        entry::<Random>(),
        entry::<Replace>(),
        entry::<Help>(),
        entry::<ListScripts>(),
        entry::<ChangePath>(),
        entry::<PrintPath>(),
    ]
}

/// A registry holding the built-in commands and nothing else.
pub fn core_registry() -> CommandRegistry {
    CommandRegistry::with_core(core_commands())
}

fn unknown(property: &str) -> BindError {
    BindError::UnknownProperty(property.to_string())
}
