use anyhow::Result;

use super::{BuiltinCommand, unknown};
use crate::command::{Param, Value};
use crate::constants::RESERVED_VARIABLES;
use crate::context::Context;
use crate::error::BindError;
use crate::help::HelpDetails;
use crate::interpreter::Interpreter;
use crate::result::CommandResult;

/// Token in a new value that stands for the variable's previous value.
const PREVIOUS_VALUE_TOKEN: &str = "$prev";

/// Writes the arguments back, separated by spaces.
#[derive(Default)]
pub struct Echo {
    input: Vec<String>,
}

impl BuiltinCommand for Echo {
    fn name() -> &'static str {
        "echo"
    }

    fn schema() -> &'static [Param] {
        const SCHEMA: &[Param] = &[Param::list(
            "input",
            "input",
            "The input to echo back after substitution.",
        )
        .optional()];
        SCHEMA
    }

    fn about() -> &'static str {
        "Echo input after substitution"
    }

    fn set_property(&mut self, property: &str, value: Value) -> Result<(), BindError> {
        match property {
            "input" => self.input = value.into_list(),
            _ => return Err(unknown(property)),
        }
        Ok(())
    }

    fn execute(&mut self, _interp: &mut Interpreter, _ctx: &mut dyn Context) -> Result<CommandResult> {
        Ok(CommandResult::success(self.input.join(" ")))
    }

    fn examples(details: &mut HelpDetails) {
        details.add_example("this is input");
        details.add_example("$prevpath$");
    }
}

/// Sets, clears or lists session variables.
#[derive(Default)]
pub struct SetVariable {
    name: String,
    value: String,
}

impl BuiltinCommand for SetVariable {
    fn name() -> &'static str {
        "set"
    }

    fn schema() -> &'static [Param] {
        const SCHEMA: &[Param] = &[
            Param::numbered(
                "name",
                0,
                "variable",
                "The name of the variable to set. If omitted all variables are displayed.",
            )
            .optional(),
            Param::numbered(
                "value",
                1,
                "value",
                "The value to set the variable to. If omitted the variable is cleared. Can contain the '$prev' token to use the previous value.",
            )
            .optional(),
        ];
        SCHEMA
    }

    fn about() -> &'static str {
        "Set an environment variable or see all currently set variables"
    }

    fn set_property(&mut self, property: &str, value: Value) -> Result<(), BindError> {
        match property {
            "name" => self.name = value.into_text(),
            "value" => self.value = value.into_text(),
            _ => return Err(unknown(property)),
        }
        Ok(())
    }

    fn execute(&mut self, interp: &mut Interpreter, ctx: &mut dyn Context) -> Result<CommandResult> {
        if RESERVED_VARIABLES.contains(&self.name.as_str()) || self.name == "prev" {
            return Ok(CommandResult::failure("Cannot set a reserved variable"));
        }

        if self.name.is_empty() {
            let formatter = interp.formatter();
            let mut buf = String::new();
            for (key, value) in ctx.env().iter() {
                formatter.print_definition(key, 0, value, &mut buf);
            }
            let count = ctx.env().len();
            let plural = if count == 1 { "" } else { "s" };
            formatter.print_line(&format!("{} variable{} currently set", count, plural), &mut buf);
            return Ok(CommandResult::success(buf));
        }

        if self.value.is_empty() {
            let message = match ctx.env_mut().remove_var(&self.name) {
                Some(_) => format!("Cleared '{}'", self.name),
                None => format!("Variable '{}' wasn't set", self.name),
            };
            return Ok(CommandResult::success(message));
        }

        let mut value = std::mem::take(&mut self.value);
        if value.contains(PREVIOUS_VALUE_TOKEN) {
            let previous = ctx.env().get_var(&self.name).unwrap_or_default();
            value = value.replace(PREVIOUS_VALUE_TOKEN, previous);
        }
        ctx.env_mut().set_var(self.name.as_str(), value.as_str());
        Ok(CommandResult::success(value))
    }

    fn examples(details: &mut HelpDetails) {
        details.add_example("");
        details.add_example("name");
        details.add_example("name value");
        details.add_example("path ($prev/child)");
    }
}
