use anyhow::Result;

use super::{BuiltinCommand, unknown};
use crate::command::{Param, Value};
use crate::constants::missing_parameter;
use crate::context::{Context, with_position};
use crate::error::BindError;
use crate::expression::evaluate_expression;
use crate::help::HelpDetails;
use crate::interpreter::Interpreter;
use crate::result::{CommandResult, CommandStatus};

const CURRENT_VARIABLE: &str = "current";
const COUNTER_VARIABLE: &str = "num";

/// Runs a command when an expression holds.
#[derive(Default)]
pub struct If {
    expression: String,
    command: String,
}

impl BuiltinCommand for If {
    fn name() -> &'static str {
        "if"
    }

    fn schema() -> &'static [Param] {
        const SCHEMA: &[Param] = &[
            Param::numbered("expression", 0, "expression", "The expression to evaluate.")
                .no_substitution(),
            Param::numbered("command", 1, "command", "The command to execute.").no_substitution(),
        ];
        SCHEMA
    }

    fn about() -> &'static str {
        "Executes the given command if the given expression evaluates to true."
    }

    fn set_property(&mut self, property: &str, value: Value) -> Result<(), BindError> {
        match property {
            "expression" => self.expression = value.into_text(),
            "command" => self.command = value.into_text(),
            _ => return Err(unknown(property)),
        }
        Ok(())
    }

    fn execute(&mut self, interp: &mut Interpreter, ctx: &mut dyn Context) -> Result<CommandResult> {
        if self.expression.is_empty() {
            return Ok(CommandResult::failure(missing_parameter("expression")));
        }
        if self.command.is_empty() {
            return Ok(CommandResult::failure(missing_parameter("command")));
        }
        if evaluate_expression(interp.registry(), &*ctx, &self.expression)? {
            return Ok(interp.execute_nested(ctx, &self.command));
        }
        Ok(CommandResult::success(""))
    }

    fn examples(details: &mut HelpDetails) {
        details.comments = "This command makes use of expressions. See the extended help topic 'expressions' for more detail (help expressions)".to_string();
        details.add_example("($var$ > 15 as number) (echo is it larger)");
        details.add_example("(@title ? company) (echo found it)");
    }
}

/// Stops the current script or session.
#[derive(Default)]
pub struct Exit {
    message: Vec<String>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn schema() -> &'static [Param] {
        const SCHEMA: &[Param] =
            &[Param::list("message", "message", "A message to display to the user").optional()];
        SCHEMA
    }

    fn about() -> &'static str {
        "Aborts the current execution context"
    }

    fn set_property(&mut self, property: &str, value: Value) -> Result<(), BindError> {
        match property {
            "message" => self.message = value.into_list(),
            _ => return Err(unknown(property)),
        }
        Ok(())
    }

    fn execute(&mut self, _interp: &mut Interpreter, _ctx: &mut dyn Context) -> Result<CommandResult> {
        Ok(CommandResult::abort(self.message.join(" ")))
    }

    fn examples(details: &mut HelpDetails) {
        details.add_example("");
        details.add_example("(missing parameter)");
    }
}

/// Runs a command a number of times, optionally at another position.
#[derive(Default)]
pub struct Repeat {
    number: String,
    command: String,
    path: String,
}

impl BuiltinCommand for Repeat {
    fn name() -> &'static str {
        "rep"
    }

    fn schema() -> &'static [Param] {
        const SCHEMA: &[Param] = &[
            Param::numbered("number", 0, "number", "The number of times to repeat the command."),
            Param::numbered("command", 1, "command", "The command to execute multiple times.")
                .no_substitution(),
            Param::numbered(
                "path",
                2,
                "path",
                "The path of the item to execute this command against.",
            )
            .optional(),
        ];
        SCHEMA
    }

    fn about() -> &'static str {
        "Repeat a command"
    }

    fn set_property(&mut self, property: &str, value: Value) -> Result<(), BindError> {
        match property {
            "number" => self.number = value.into_text(),
            "command" => self.command = value.into_text(),
            "path" => self.path = value.into_text(),
            _ => return Err(unknown(property)),
        }
        Ok(())
    }

    fn execute(&mut self, interp: &mut Interpreter, ctx: &mut dyn Context) -> Result<CommandResult> {
        if self.number.is_empty() {
            return Ok(CommandResult::failure(missing_parameter("number")));
        }
        if self.command.is_empty() {
            return Ok(CommandResult::failure(missing_parameter("command")));
        }
        let Ok(count) = self.number.trim().parse::<u32>() else {
            return Ok(CommandResult::failure(
                "Parameter 'number' must be a positive integer",
            ));
        };

        let command = self.command.as_str();
        let output = with_position(ctx, Some(self.path.as_str()), |ctx| {
            let mut output = String::new();
            ctx.env_mut().remove_var(COUNTER_VARIABLE);
            for i in 1..=count {
                ctx.env_mut().set_var(COUNTER_VARIABLE, i.to_string());
                let result = interp.execute_nested(ctx, command);
                ctx.env_mut().remove_var(COUNTER_VARIABLE);
                if result.status() == CommandStatus::Abort {
                    output.push_str(result.message());
                    return CommandResult::abort(output);
                }
                output.push_str(&result.to_string());
                interp.formatter().print_line("", &mut output);
            }
            CommandResult::success(output)
        })?;
        Ok(output)
    }

    fn examples(details: &mut HelpDetails) {
        details.comments =
            "On each repetition the $num$ environment variable contains the current count of runs"
                .to_string();
        details.add_example("3 (echo $num$)");
        details.add_example("5 (echo $num$) /content/home");
    }
}

/// Splits text and runs a command for each piece.
#[derive(Default)]
pub struct Split {
    no_statistics: bool,
    on_newline: bool,
    on_tab: bool,
    symbol: String,
    input: String,
    command: String,
}

impl Split {
    fn separators(&self) -> Vec<&str> {
        let mut separators = Vec::new();
        if self.on_newline {
            separators.push("\n");
        }
        if self.on_tab {
            separators.push("\t");
        }
        if !self.symbol.is_empty() {
            separators.push(self.symbol.as_str());
        }
        separators
    }
}

/// Splits on any of `separators`, dropping empty pieces. Splits on
/// whitespace when no separator is given.
fn split_any(input: &str, separators: &[&str]) -> Vec<String> {
    if separators.is_empty() {
        return input.split_whitespace().map(str::to_string).collect();
    }
    let mut pieces = vec![input.replace("\r\n", "\n")];
    for separator in separators {
        pieces = pieces
            .iter()
            .flat_map(|piece| piece.split(separator))
            .map(str::to_string)
            .collect();
    }
    pieces.retain(|piece| !piece.is_empty());
    pieces
}

impl BuiltinCommand for Split {
    fn name() -> &'static str {
        "split"
    }

    fn schema() -> &'static [Param] {
        const SCHEMA: &[Param] = &[
            Param::flag(
                "no_statistics",
                "ns",
                "No Statistics. Don't show how many items were found.",
            )
            .optional(),
            Param::flag("on_newline", "n", "Split on newline character.").optional(),
            Param::flag("on_tab", "t", "Split on tab character.").optional(),
            Param::named("symbol", "s", "symbol", "The symbol to split on.").optional(),
            Param::numbered("input", 0, "input", "The input string to split."),
            Param::numbered(
                "command",
                1,
                "command",
                "The command to execute against each element. The environment variable 'current' contains the current string.",
            )
            .no_substitution(),
        ];
        SCHEMA
    }

    fn about() -> &'static str {
        "Split a string and iterate over the results"
    }

    fn set_property(&mut self, property: &str, value: Value) -> Result<(), BindError> {
        match property {
            "no_statistics" => self.no_statistics = value.as_bool(),
            "on_newline" => self.on_newline = value.as_bool(),
            "on_tab" => self.on_tab = value.as_bool(),
            "symbol" => self.symbol = value.into_text(),
            "input" => self.input = value.into_text(),
            "command" => self.command = value.into_text(),
            _ => return Err(unknown(property)),
        }
        Ok(())
    }

    fn flag_value(&self, property: &str) -> bool {
        match property {
            "no_statistics" => self.no_statistics,
            "on_newline" => self.on_newline,
            "on_tab" => self.on_tab,
            _ => false,
        }
    }

    fn execute(&mut self, interp: &mut Interpreter, ctx: &mut dyn Context) -> Result<CommandResult> {
        if self.input.is_empty() {
            return Ok(CommandResult::failure(missing_parameter("input")));
        }
        if self.command.is_empty() {
            return Ok(CommandResult::failure(missing_parameter("command")));
        }

        let elements = split_any(&self.input, &self.separators());
        let mut output = String::new();
        if ctx.env_mut().remove_var(CURRENT_VARIABLE).is_some() {
            interp.formatter().print_line(
                "WARNING: Environment variable 'current' contains a value. It has been overwritten.",
                &mut output,
            );
        }

        for element in &elements {
            ctx.env_mut().set_var(CURRENT_VARIABLE, element.as_str());
            let result = interp.execute_nested(ctx, &self.command);
            ctx.env_mut().remove_var(CURRENT_VARIABLE);
            if result.status() == CommandStatus::Abort {
                output.push_str(result.message());
                return Ok(CommandResult::abort(output));
            }
            output.push_str(&result.to_string());
            interp.formatter().print_line("", &mut output);
        }

        if !self.no_statistics {
            let noun = if elements.len() == 1 { "string" } else { "strings" };
            output.push_str(&format!("Processed {} {}", elements.len(), noun));
        }
        Ok(CommandResult::success(output))
    }

    fn examples(details: &mut HelpDetails) {
        details.add_example("-s , 1,2,3,4 (echo $current$)");
        details.add_example("-n < (ls-scripts) (help $current$)");
    }
}
