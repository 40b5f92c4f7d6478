use anyhow::Result;

use super::{BuiltinCommand, unknown};
use crate::command::{Param, Value};
use crate::constants::{PREVIOUS_PATH_VARIABLE, missing_parameter};
use crate::context::Context;
use crate::error::BindError;
use crate::help::HelpDetails;
use crate::interpreter::Interpreter;
use crate::result::CommandResult;

/// Moves the current position.
#[derive(Default)]
pub struct ChangePath {
    path: String,
}

impl BuiltinCommand for ChangePath {
    fn name() -> &'static str {
        "cd"
    }

    fn schema() -> &'static [Param] {
        const SCHEMA: &[Param] = &[Param::numbered(
            "path",
            0,
            "path",
            "The path of the item to change to. Path can either be relative or absolute.",
        )];
        SCHEMA
    }

    fn about() -> &'static str {
        "Change the context item"
    }

    fn set_property(&mut self, property: &str, value: Value) -> Result<(), BindError> {
        match property {
            "path" => self.path = value.into_text(),
            _ => return Err(unknown(property)),
        }
        Ok(())
    }

    fn execute(&mut self, _interp: &mut Interpreter, ctx: &mut dyn Context) -> Result<CommandResult> {
        let target = self.path.trim();
        if target.is_empty() {
            return Ok(CommandResult::failure(missing_parameter("path")));
        }
        let previous = ctx.current_path();
        ctx.set_current_path(target)?;
        ctx.env_mut().set_var(PREVIOUS_PATH_VARIABLE, previous);
        Ok(CommandResult::success(ctx.current_path()))
    }

    fn examples(details: &mut HelpDetails) {
        details.add_example("item1");
        details.add_example("item1/item2");
        details.add_example("../item1");
        details.add_example("$prevpath$");
    }
}

/// Prints the current position.
#[derive(Default)]
pub struct PrintPath;

impl BuiltinCommand for PrintPath {
    fn name() -> &'static str {
        "pwd"
    }

    fn schema() -> &'static [Param] {
        &[]
    }

    fn about() -> &'static str {
        "Print the path of the context item"
    }

    fn set_property(&mut self, property: &str, _value: Value) -> Result<(), BindError> {
        Err(unknown(property))
    }

    fn execute(&mut self, _interp: &mut Interpreter, ctx: &mut dyn Context) -> Result<CommandResult> {
        Ok(CommandResult::success(ctx.current_path()))
    }
}
