use anyhow::{Context as _, Result};
use regex::RegexBuilder;

use super::{BuiltinCommand, unknown};
use crate::command::{Param, Value};
use crate::constants::missing_parameter;
use crate::context::Context;
use crate::error::BindError;
use crate::help::HelpDetails;
use crate::interpreter::Interpreter;
use crate::result::CommandResult;

/// Regular expression replacement over its input.
#[derive(Default)]
pub struct Replace {
    input: String,
    pattern: String,
    replacement: String,
    case_sensitive: bool,
}

impl BuiltinCommand for Replace {
    fn name() -> &'static str {
        "replace"
    }

    fn schema() -> &'static [Param] {
        const SCHEMA: &[Param] = &[
            Param::numbered("input", 0, "input", "The string input to perform replacement on."),
            Param::numbered(
                "pattern",
                1,
                "regexMatch",
                "Regular expression to match text to replace.",
            ),
            Param::numbered(
                "replacement",
                2,
                "regexReplace",
                "Regular expression to replace matched text.",
            ),
            Param::flag(
                "case_sensitive",
                "c",
                "Perform case sensitive regular expression matching.",
            )
            .optional(),
        ];
        SCHEMA
    }

    fn about() -> &'static str {
        "Replace text in string input using regular expressions"
    }

    fn set_property(&mut self, property: &str, value: Value) -> Result<(), BindError> {
        match property {
            "input" => self.input = value.into_text(),
            "pattern" => self.pattern = value.into_text(),
            "replacement" => self.replacement = value.into_text(),
            "case_sensitive" => self.case_sensitive = value.as_bool(),
            _ => return Err(unknown(property)),
        }
        Ok(())
    }

    fn flag_value(&self, property: &str) -> bool {
        property == "case_sensitive" && self.case_sensitive
    }

    fn execute(&mut self, _interp: &mut Interpreter, _ctx: &mut dyn Context) -> Result<CommandResult> {
        if self.input.is_empty() {
            return Ok(CommandResult::failure(missing_parameter("input")));
        }
        if self.pattern.is_empty() {
            return Ok(CommandResult::failure(missing_parameter("regexMatch")));
        }

        let regex = RegexBuilder::new(&self.pattern)
            .case_insensitive(!self.case_sensitive)
            .build()
            .with_context(|| format!("Invalid regular expression '{}'", self.pattern))?;
        let replaced = regex.replace_all(&self.input, self.replacement.as_str());
        Ok(CommandResult::success(replaced.into_owned()))
    }

    fn examples(details: &mut HelpDetails) {
        details.add_example("(this is input) (^this) (that)");
        details.add_example("(this is input) (^(\\w+)) (${1}s)");
        details.add_example("(this is input) \\s -");
        details.add_example("(This Is Input) is in -c");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::MemoryContext;
    use crate::result::CommandStatus;

    fn run(line: &str) -> CommandResult {
        Interpreter::default().execute(&mut MemoryContext::new(), line)
    }

    #[test]
    fn test_replace_is_case_insensitive_by_default() {
        assert_eq!(
            run("replace (This Is Input) is at"),
            CommandResult::success("That at Input")
        );
        assert_eq!(
            run("replace (This Is Input) is at -c"),
            CommandResult::success("That Is Input")
        );
    }

    #[test]
    fn test_replace_with_groups() {
        assert_eq!(
            run("replace (one two) (^(\\w+)) (${1}s)"),
            CommandResult::success("ones two")
        );
        assert_eq!(run("replace (a b) \\s ()"), CommandResult::success("ab"));
    }

    #[test]
    fn test_replace_reports_bad_pattern() {
        let result = run("replace abc ([) x");
        assert_eq!(result.status(), CommandStatus::Failure);
        assert!(result.message().starts_with("Invalid regular expression '['"));
        assert_eq!(
            run("replace abc"),
            CommandResult::failure("Required parameter 'regexMatch' is missing")
        );
    }
}
