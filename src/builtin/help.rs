use anyhow::Result;

use super::{BuiltinCommand, unknown};
use crate::command::{CommandFactory, Param, Value};
use crate::context::Context;
use crate::error::{BindError, ScriptError};
use crate::help::{EXTENDED_TOPICS, HelpDetails, command_help, extended_topic};
use crate::interpreter::Interpreter;
use crate::result::CommandResult;

const RULE_WIDTH: usize = 50;

/// Lists commands or prints detailed help for a command, topic or script.
#[derive(Default)]
pub struct Help {
    command: String,
}

impl BuiltinCommand for Help {
    fn name() -> &'static str {
        "help"
    }

    fn schema() -> &'static [Param] {
        const SCHEMA: &[Param] = &[Param::numbered(
            "command",
            0,
            "command",
            "The name of the command or script to get help for",
        )
        .optional()];
        SCHEMA
    }

    fn about() -> &'static str {
        "List available commands and provide detailed help information about them"
    }

    fn set_property(&mut self, property: &str, value: Value) -> Result<(), BindError> {
        match property {
            "command" => self.command = value.into_text(),
            _ => return Err(unknown(property)),
        }
        Ok(())
    }

    fn execute(&mut self, interp: &mut Interpreter, _ctx: &mut dyn Context) -> Result<CommandResult> {
        let name = self.command.as_str();
        if name.is_empty() {
            return Ok(CommandResult::success(list_commands(interp)));
        }

        let registry = interp.registry();
        let formatter = interp.formatter();

        if let Some(factory) = registry.core_command(name) {
            return Ok(CommandResult::success(help_for(interp, name, factory.as_ref())));
        }
        if registry.find_alias(name).is_some() {
            if let Some(resolved) = registry.resolve(name, &[])? {
                return Ok(CommandResult::success(help_for(
                    interp,
                    name,
                    resolved.factory.as_ref(),
                )));
            }
        }
        if let Some(details) = extended_topic(name) {
            return Ok(CommandResult::success(formatter.print_help(&details, None)));
        }
        if let Some(factory) = registry.custom_command(name) {
            return Ok(CommandResult::success(help_for(interp, name, factory.as_ref())));
        }

        match interp.scripts().get_script_help(name) {
            Ok(Some(details)) => Ok(CommandResult::success(formatter.print_help(&details, None))),
            Ok(None) => Ok(CommandResult::failure(format!(
                "Unknown command or script name {}",
                name
            ))),
            Err(ScriptError::MultipleScriptsFound { names }) => Ok(CommandResult::failure(
                interp.multiple_scripts_message(name, &names),
            )),
            Err(err) => Err(err.into()),
        }
    }

    fn examples(details: &mut HelpDetails) {
        details.add_example("");
        details.add_example("echo");
        details.add_example("expressions");
    }
}

fn help_for(interp: &Interpreter, binding: &str, factory: &dyn CommandFactory) -> String {
    let command = factory.create();
    let details = command_help(binding, command.as_ref());
    interp.formatter().print_help(&details, Some(binding))
}

fn list_commands(interp: &Interpreter) -> String {
    let registry = interp.registry();
    let formatter = interp.formatter();
    let mut buf = String::new();

    formatter.print_line("Available core commands:", &mut buf);
    formatter.print_line(&"-".repeat(RULE_WIDTH), &mut buf);
    for (name, factory) in registry.core_commands() {
        formatter.print_definition(name, 0, factory.create().description(), &mut buf);
    }

    let mut custom = registry.custom_commands().peekable();
    if custom.peek().is_some() {
        formatter.print_line("", &mut buf);
        formatter.print_line("Available custom commands:", &mut buf);
        formatter.print_line(&"-".repeat(RULE_WIDTH), &mut buf);
        for (name, factory) in custom {
            formatter.print_definition(name, 0, factory.create().description(), &mut buf);
        }
    }

    formatter.print_line("", &mut buf);
    formatter.print_line("help <cmd> for command specific help", &mut buf);
    formatter.print_line("", &mut buf);
    buf.push_str("Other help topics: ");
    buf.push_str(&EXTENDED_TOPICS.join(", "));
    buf
}

/// Lists the names of every script the locator knows.
#[derive(Default)]
pub struct ListScripts;

impl BuiltinCommand for ListScripts {
    fn name() -> &'static str {
        "ls-scripts"
    }

    fn schema() -> &'static [Param] {
        &[]
    }

    fn about() -> &'static str {
        "List all script names"
    }

    fn set_property(&mut self, property: &str, _value: Value) -> Result<(), BindError> {
        Err(unknown(property))
    }

    fn execute(&mut self, interp: &mut Interpreter, _ctx: &mut dyn Context) -> Result<CommandResult> {
        let mut buf = String::new();
        for script in interp.scripts().script_names() {
            interp.formatter().print_line(&script, &mut buf);
        }
        Ok(CommandResult::success(buf))
    }
}
