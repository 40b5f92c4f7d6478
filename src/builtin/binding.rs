use std::collections::BTreeMap;

use anyhow::Result;

use super::{BuiltinCommand, unknown};
use crate::command::{Param, Value};
use crate::constants::missing_parameter;
use crate::context::Context;
use crate::error::BindError;
use crate::help::HelpDetails;
use crate::interpreter::Interpreter;
use crate::result::CommandResult;

const RULE_WIDTH: usize = 50;

/// Creates, removes and lists command aliases.
#[derive(Default)]
pub struct Alias {
    name: String,
    command: String,
    parameters: Vec<String>,
}

impl BuiltinCommand for Alias {
    fn name() -> &'static str {
        "alias"
    }

    fn schema() -> &'static [Param] {
        const SCHEMA: &[Param] = &[
            Param::numbered("name", 0, "name", "The name for the alias."),
            Param::numbered("command", 1, "command", "The command to alias.").optional(),
            Param::list(
                "parameters",
                "parameters",
                "Additional parameters to pass to the command.",
            )
            .optional(),
        ];
        SCHEMA
    }

    fn about() -> &'static str {
        "Create and remove aliases for commands"
    }

    fn set_property(&mut self, property: &str, value: Value) -> Result<(), BindError> {
        match property {
            "name" => self.name = value.into_text(),
            "command" => self.command = value.into_text(),
            "parameters" => self.parameters = value.into_list(),
            _ => return Err(unknown(property)),
        }
        Ok(())
    }

    fn execute(&mut self, interp: &mut Interpreter, _ctx: &mut dyn Context) -> Result<CommandResult> {
        if self.name.trim().is_empty() {
            return Ok(CommandResult::success(list_aliases(interp)));
        }
        let registry = interp.registry_mut();
        if self.command.trim().is_empty() {
            registry.remove_alias(&self.name)?;
            return Ok(CommandResult::success(format!("Alias '{}' removed", self.name)));
        }
        registry.add_alias(&self.name, &self.command, std::mem::take(&mut self.parameters))?;
        Ok(CommandResult::success(format!("Alias '{}' added", self.name)))
    }

    fn examples(details: &mut HelpDetails) {
        details.comments = "To remove the alias, exclude the 'command' parameter.".to_string();
        details.add_example("dir echo");
        details.add_example("greet echo hello");
        details.add_example("dir");
    }
}

fn list_aliases(interp: &Interpreter) -> String {
    let mut by_target: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (name, target) in interp.registry().aliases() {
        by_target.entry(target.command.as_str()).or_default().push(name);
    }
    if by_target.is_empty() {
        return "No aliases defined.".to_string();
    }

    let formatter = interp.formatter();
    let mut buf = String::new();
    formatter.print_definition("Command", 0, "Aliases", &mut buf);
    formatter.print_line(&"-".repeat(RULE_WIDTH), &mut buf);
    for (command, aliases) in by_target {
        formatter.print_definition(command, 0, &aliases.join(", "), &mut buf);
    }
    buf
}

/// Binds catalog commands to new names, or manages aliases with `-a`.
#[derive(Default)]
pub struct Bind {
    remove: bool,
    as_alias: bool,
    command_name: String,
    command: String,
    parameters: Vec<String>,
}

impl BuiltinCommand for Bind {
    fn name() -> &'static str {
        "bind"
    }

    fn schema() -> &'static [Param] {
        const SCHEMA: &[Param] = &[
            Param::flag("remove", "r", "Remove the binding.").optional(),
            Param::flag("as_alias", "a", "Process as a command alias.").optional(),
            Param::numbered("command_name", 0, "commandName", "The name to bind the command to."),
            Param::numbered(
                "command",
                1,
                "command",
                "The command to bind. If not an existing command name, the type name of a known command.",
            )
            .optional(),
            Param::list(
                "parameters",
                "parameters",
                "Additional parameters to use for an alias. Cannot be used when binding a new command.",
            )
            .optional(),
        ];
        SCHEMA
    }

    fn about() -> &'static str {
        "Bind a new command or rebind an existing command to a new name"
    }

    fn set_property(&mut self, property: &str, value: Value) -> Result<(), BindError> {
        match property {
            "remove" => self.remove = value.as_bool(),
            "as_alias" => self.as_alias = value.as_bool(),
            "command_name" => self.command_name = value.into_text(),
            "command" => self.command = value.into_text(),
            "parameters" => self.parameters = value.into_list(),
            _ => return Err(unknown(property)),
        }
        Ok(())
    }

    fn flag_value(&self, property: &str) -> bool {
        match property {
            "remove" => self.remove,
            "as_alias" => self.as_alias,
            _ => false,
        }
    }

    fn execute(&mut self, interp: &mut Interpreter, _ctx: &mut dyn Context) -> Result<CommandResult> {
        if self.command.is_empty() && self.command_name.is_empty() && !self.remove {
            return Ok(CommandResult::success(list_bindings(interp)));
        }
        if self.command_name.is_empty() {
            return Ok(CommandResult::failure(missing_parameter("commandName")));
        }
        if self.command.is_empty() && !self.remove {
            return Ok(CommandResult::failure(missing_parameter("command")));
        }
        if !self.command.is_empty() && self.remove {
            return Ok(CommandResult::failure("Cannot use -r with 'command' parameter"));
        }

        let registry = interp.registry_mut();
        if self.as_alias {
            if self.remove {
                registry.remove_alias(&self.command_name)?;
                return Ok(CommandResult::success(format!(
                    "Alias '{}' removed",
                    self.command_name
                )));
            }
            let parameters = std::mem::take(&mut self.parameters);
            registry.add_alias(&self.command_name, &self.command, parameters)?;
            return Ok(CommandResult::success(format!("Alias '{}' added", self.command_name)));
        }

        if self.remove {
            return Ok(if registry.remove_custom_command(&self.command_name) {
                CommandResult::success(format!("Removed command '{}'", self.command_name))
            } else {
                CommandResult::failure(format!("Failed to find command '{}'", self.command_name))
            });
        }

        if !self.parameters.is_empty() {
            return Ok(CommandResult::failure("Parameters are only valid for aliases"));
        }
        if registry.core_command(&self.command_name).is_some() {
            return Ok(CommandResult::failure(format!(
                "Cannot bind '{}', it is a core command",
                self.command_name
            )));
        }
        if registry.find_alias(&self.command_name).is_some() {
            return Ok(CommandResult::failure(format!(
                "Cannot bind '{}', it is an alias",
                self.command_name
            )));
        }

        let Some(factory) = registry.find_implementation(&self.command) else {
            return Ok(CommandResult::failure(format!("Failed to load type {}", self.command)));
        };
        let type_name = short_type_name(factory.type_name());
        registry.add_custom_command(self.command_name.as_str(), factory);
        Ok(CommandResult::success(format!(
            "{} bound to {}",
            type_name, self.command_name
        )))
    }

    fn examples(details: &mut HelpDetails) {
        details.comments = "-r cannot be used with 'command'".to_string();
        details.add_example("-a dir echo");
        details.add_example("say echo");
        details.add_example("say Echo");
        details.add_example("-r say");
    }
}

fn short_type_name(full: &str) -> &str {
    full.rsplit("::").next().unwrap_or(full)
}

fn list_bindings(interp: &Interpreter) -> String {
    let registry = interp.registry();
    let formatter = interp.formatter();
    let mut buf = String::new();

    formatter.print_line("Available core commands:", &mut buf);
    formatter.print_line(&"-".repeat(RULE_WIDTH), &mut buf);
    for (name, factory) in registry.core_commands() {
        let mut value = factory.type_name().to_string();
        let aliases = registry.aliases_for(name);
        if !aliases.is_empty() {
            value.push_str(&format!(" ({})", aliases.join(", ")));
        }
        formatter.print_definition(name, 0, &value, &mut buf);
    }

    let mut custom = registry.custom_commands().peekable();
    if custom.peek().is_some() {
        formatter.print_line("", &mut buf);
        formatter.print_line("Available custom commands:", &mut buf);
        formatter.print_line(&"-".repeat(RULE_WIDTH), &mut buf);
        for (name, factory) in custom {
            formatter.print_definition(name, 0, factory.type_name(), &mut buf);
        }
    }
    buf
}
