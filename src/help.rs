//! Help records and their generation from parameter schemas.

use crate::command::{Command, Param};

/// Structured help for a command, script or topic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HelpDetails {
    pub description: String,
    pub usage: String,
    pub comments: String,
    /// Ordered `(name, description)` pairs.
    pub parameters: Vec<(String, String)>,
    pub examples: Vec<String>,
}

impl HelpDetails {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn add_parameter(&mut self, name: impl Into<String>, description: impl Into<String>) {
        self.parameters.push((name.into(), description.into()));
    }

    pub fn add_example(&mut self, example: impl Into<String>) {
        self.examples.push(example.into());
    }
}

/// Builds help for `command` from its schema, then lets it add its own notes.
pub fn command_help(binding: &str, command: &dyn Command) -> HelpDetails {
    let mut details = HelpDetails::new(command.description());
    let mut usage = binding.to_string();

    for param in command.params() {
        usage.push(' ');
        usage.push_str(&wrap_optional(param, param.usage_token()));
        let prefix = if param.optional { "Optional. " } else { "" };
        details.add_parameter(param.help_key(), format!("{}{}", prefix, param.description));
    }

    details.usage = usage;
    command.help(&mut details);
    details
}

fn wrap_optional(param: &Param, token: String) -> String {
    if param.optional {
        format!("[{}]", token)
    } else {
        token
    }
}

/// Names of the help topics that are not commands.
pub const EXTENDED_TOPICS: &[&str] = &["expressions", "prompt", "subcommand", "useenvironmentvariable"];

pub fn extended_topic(name: &str) -> Option<HelpDetails> {
    let details = match name {
        "expressions" => expressions(),
        "prompt" => prompt(),
        "subcommand" => subcommand(),
        "useenvironmentvariable" => use_environment_variable(),
        _ => return None,
    };
    Some(details)
}

fn expressions() -> HelpDetails {
    let mut d = HelpDetails::new("Allows logical testing against fields and attributes");
    d.usage = "[@field | @@attribute] operator [@field | @@attribute] [as cast] [with flag] [and | or expression]".into();
    d.add_parameter(
        "operator",
        "How to compare the 2 arguments. Must be one of = (equals), < (less than), > (greater than), \
         != (not equal), <= (less or equal), >= (greater or equal), [ (starts with), ] (ends with), \
         ? (contains), !? (doesn't contain).",
    );
    d.add_parameter("cast", "Treat the arguments as a specific data type. Must be one of string, number, date.");
    d.add_parameter(
        "flag",
        "Treat the arguments in a specific way. Must be one of ignorecase, ignoredecimal, round, ceiling, floor.",
    );
    d.add_parameter(
        "expression",
        "Another expression. Clauses are combined strictly left to right.",
    );
    d.add_parameter("function", "isempty value, not expression or isbound command.");
    d.comments = "Expressions are used as arguments to other commands such as if.".into();
    d.add_example("@title != hello");
    d.add_example("(@__created by) = admin with ignorecase");
    d.add_example("@price >= 70 as number with round and @title = bananas with ignorecase");
    d.add_example("@@key = a or @@key = b or @@key = c");
    d.add_example("@__created = 2007-12-01 as date");
    d.add_example("@@name [ a");
    d
}

fn prompt() -> HelpDetails {
    let mut d = HelpDetails::new("The prompt is set through the environment variable 'prompt'");
    d.usage = "[Any characters] [%path%] [%itemname%] [%ver%] [%db%] [%lang%] [%langcode%] [%date%] [%time%]".into();
    d.add_parameter("%path%", "Provides the full path of the current item");
    d.add_parameter("%itemname%", "Provides the name of the current item");
    d.add_parameter("%ver%", "Provides the version number of the current item");
    d.add_parameter("%db%", "Provides the name of the current database");
    d.add_parameter("%lang%", "Provides the current language");
    d.add_parameter("%langcode%", "Provides the code of the current language");
    d.add_parameter("%date%", "Provides the current date");
    d.add_parameter("%time%", "Provides the current time");
    d.add_example("%db%:%path% >");
    d.add_example("%date% %lang%|%itemname% >");
    d
}

fn subcommand() -> HelpDetails {
    let mut d = HelpDetails::new(
        "Allows the evaluation of a command to be used as a parameter of another command",
    );
    d.usage = "< command".into();
    d.add_parameter("command", "The command to evaluate");
    d.add_example("echo < (add 2 3)");
    d.add_example("cd < (echo $prevpath$)");
    d.add_example("set total < (multiply < (add 1 2) 4)");
    d
}

fn use_environment_variable() -> HelpDetails {
    let mut d = HelpDetails::new("Allows substitution of environment variables into commands");
    d.usage = "$name$".into();
    d.add_parameter("name", "The name of the environment variable");
    d.add_example("$prevpath$");
    d.add_example("$myvar$");
    d.add_example("echo $prevpath$");
    d
}
