use chrono::Local;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, trace, warn};

use crate::binder::bind;
use crate::command::Command;
use crate::constants::{
    CHAIN_SYMBOL, CHAINED_VALUE_VARIABLE, COMMENT_INDICATOR, DIRECTIVE_INDICATOR, INIT_SCRIPT,
    MAX_NESTING_DEPTH, NOW_FORMAT, NOW_VARIABLE, SUBCOMMAND_SYMBOL,
};
use crate::context::Context;
use crate::directive::ExecutionDirective;
use crate::error::ScriptError;
use crate::format::{Formatter, TextFormatter};
use crate::lexer::{parse_input_line, parse_script_lines, restore_operator_escapes};
use crate::registry::{CommandRegistry, Resolved};
use crate::result::{CommandResult, CommandStatus};
use crate::script::{MemoryScriptLocator, ScriptLocator};
use crate::substitution::{perform_script_substitution, perform_substitution};

/// Parses, resolves and runs command lines and scripts.
///
/// The interpreter owns the command tables, the script source and the
/// session-level fault flag. The content position is not owned: every call
/// takes the context it should operate on.
///
/// Example
/// ```
/// use canopy::{Interpreter, MemoryContext};
/// let mut sh = Interpreter::default();
/// let mut ctx = MemoryContext::new();
/// let result = sh.execute(&mut ctx, "echo < (add 2 3)");
/// assert_eq!(result.message(), "5");
/// ```
pub struct Interpreter {
    registry: CommandRegistry,
    scripts: Box<dyn ScriptLocator>,
    formatter: Box<dyn Formatter>,
    rng: StdRng,
    faulted: bool,
    depth: usize,
    // Directive of the command currently running, inherited by lines it executes.
    active_directive: ExecutionDirective,
}

impl Interpreter {
    pub fn new(registry: CommandRegistry, scripts: Box<dyn ScriptLocator>) -> Self {
        Self {
            registry,
            scripts,
            formatter: Box::new(TextFormatter::new()),
            rng: StdRng::from_entropy(),
            faulted: false,
            depth: 0,
            active_directive: ExecutionDirective::defaults(),
        }
    }

    /// Makes random output reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_formatter(mut self, formatter: Box<dyn Formatter>) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut CommandRegistry {
        &mut self.registry
    }

    pub fn scripts(&self) -> &dyn ScriptLocator {
        self.scripts.as_ref()
    }

    pub fn formatter(&self) -> &dyn Formatter {
        self.formatter.as_ref()
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Set when a failure happened under stop-on-error in the current script run.
    pub fn is_faulted(&self) -> bool {
        self.faulted
    }

    /// Executes one line with the default directive.
    pub fn execute(&mut self, ctx: &mut dyn Context, line: &str) -> CommandResult {
        self.execute_with(ctx, line, &ExecutionDirective::defaults(), None)
    }

    /// Executes a line on behalf of the running command, with its directive.
    pub fn execute_nested(&mut self, ctx: &mut dyn Context, line: &str) -> CommandResult {
        let directive = self.active_directive;
        self.execute_with(ctx, line, &directive, None)
    }

    pub fn execute_with(
        &mut self,
        ctx: &mut dyn Context,
        line: &str,
        directive: &ExecutionDirective,
        script_args: Option<&[String]>,
    ) -> CommandResult {
        let elements = parse_input_line(line);
        self.execute_elements(ctx, elements, directive, script_args)
    }

    /// Runs the `init` script if there is one. Unknown commands inside it are ignored.
    pub fn init(&mut self, ctx: &mut dyn Context) -> CommandResult {
        let directive = ExecutionDirective::defaults().patched(&ExecutionDirective {
            ignore_unknown_commands: Some(true),
            ..ExecutionDirective::default()
        });
        self.execute_with(ctx, INIT_SCRIPT, &directive, None)
    }

    fn execute_elements(
        &mut self,
        ctx: &mut dyn Context,
        elements: Vec<String>,
        directive: &ExecutionDirective,
        script_args: Option<&[String]>,
    ) -> CommandResult {
        if self.depth >= MAX_NESTING_DEPTH {
            return CommandResult::failure("Maximum nesting depth exceeded");
        }
        self.depth += 1;
        let result = self.resolve_and_dispatch(ctx, elements, directive, script_args);
        self.depth -= 1;
        result
    }

    fn resolve_and_dispatch(
        &mut self,
        ctx: &mut dyn Context,
        mut elements: Vec<String>,
        directive: &ExecutionDirective,
        script_args: Option<&[String]>,
    ) -> CommandResult {
        // Sub-commands, left to right, each spliced in before the next is looked for.
        while let Some(pos) = elements.iter().position(|e| e == SUBCOMMAND_SYMBOL) {
            if pos + 1 >= elements.len() {
                break;
            }
            let inner = self.execute_with(ctx, &elements[pos + 1], directive, script_args);
            if !inner.is_success() {
                return wrap_failure(inner);
            }
            elements[pos] = inner.into_message();
            elements.remove(pos + 1);
        }

        while let Some(pos) = elements.iter().position(|e| e == CHAIN_SYMBOL) {
            let mut head: Vec<String> = elements.drain(..=pos).collect();
            head.pop();
            let result = self.execute_elements(ctx, head, directive, script_args);
            if !result.is_success() {
                return wrap_failure(result);
            }
            ctx.env_mut()
                .set_var(CHAINED_VALUE_VARIABLE, result.into_message());
        }

        let elements: Vec<String> = elements
            .iter()
            .map(|element| restore_operator_escapes(element))
            .collect();
        match elements.split_first() {
            Some((name, args)) => self.dispatch(ctx, name.trim(), args, directive, script_args),
            None => CommandResult::success(""),
        }
    }

    fn dispatch(
        &mut self,
        ctx: &mut dyn Context,
        name: &str,
        args: &[String],
        directive: &ExecutionDirective,
        script_args: Option<&[String]>,
    ) -> CommandResult {
        let now = Local::now().format(NOW_FORMAT).to_string();
        ctx.env_mut().set_var(NOW_VARIABLE, now);

        let name = perform_script_substitution(&perform_substitution(ctx.env(), name), script_args);
        if name.is_empty() {
            return CommandResult::success("");
        }

        let resolved = match self.registry.resolve(&name, args) {
            Ok(resolved) => resolved,
            Err(err) => return CommandResult::failure(err.to_string()),
        };

        let result = match resolved {
            Some(Resolved { factory, args }) => {
                debug!(%name, implementation = factory.type_name(), "dispatching command");
                self.execute_command(ctx, factory.create(), &args, directive, script_args)
            }
            None => {
                let args: Vec<String> = args
                    .iter()
                    .map(|arg| {
                        perform_substitution(ctx.env(), &perform_script_substitution(arg, script_args))
                    })
                    .collect();
                match self.execute_script(ctx, &name, &args, directive) {
                    Some(result) => result,
                    None if directive.ignore_unknown_commands() => CommandResult::success(""),
                    None => {
                        CommandResult::failure(format!("Unknown command or script name {}", name))
                    }
                }
            }
        };

        if directive.stop_on_error() && result.status() == CommandStatus::Failure {
            self.faulted = true;
        }
        result
    }

    fn execute_command(
        &mut self,
        ctx: &mut dyn Context,
        mut command: Box<dyn Command>,
        args: &[String],
        directive: &ExecutionDirective,
        script_args: Option<&[String]>,
    ) -> CommandResult {
        if command.manual_parse() {
            let raw = args
                .iter()
                .map(|arg| {
                    perform_substitution(ctx.env(), &perform_script_substitution(arg, script_args))
                })
                .collect();
            command.accept_raw_args(raw);
        } else if let Err(err) = bind(command.as_mut(), args, ctx.env(), script_args) {
            return CommandResult::failure(err.to_string());
        }

        let saved = std::mem::replace(&mut self.active_directive, *directive);
        let result = command.run(self, ctx);
        self.active_directive = saved;
        result
    }

    /// `None` when no script has this name.
    fn execute_script(
        &mut self,
        ctx: &mut dyn Context,
        name: &str,
        args: &[String],
        directive: &ExecutionDirective,
    ) -> Option<CommandResult> {
        match self.scripts.get_script(name) {
            Ok(Some(source)) => {
                debug!(%name, "running script");
                Some(self.run_script(ctx, &source, directive, args))
            }
            Ok(None) => None,
            Err(ScriptError::MultipleScriptsFound { names }) => {
                warn!(%name, ?names, "ambiguous script name");
                Some(CommandResult::failure(self.multiple_scripts_message(name, &names)))
            }
            Err(err) => Some(CommandResult::failure(err.to_string())),
        }
    }

    /// Lists colliding script names followed by an explanation.
    pub fn multiple_scripts_message(&self, name: &str, names: &[String]) -> String {
        let mut message = String::new();
        for script in names {
            self.formatter.print_line(script, &mut message);
        }
        self.formatter
            .print_line(&format!("Multiple scripts found by name '{}'", name), &mut message);
        message.push_str("Script names must be unique");
        message
    }

    /// Runs script source line by line and aggregates the output.
    ///
    /// The working directive starts from [`ExecutionDirective::defaults`],
    /// takes `directive` on top and is then patched by `@` lines. Once a
    /// failure under stop-on-error marks the run as faulted, the remaining
    /// lines are skipped. An abort ends the script successfully.
    pub fn run_script(
        &mut self,
        ctx: &mut dyn Context,
        source: &str,
        directive: &ExecutionDirective,
        args: &[String],
    ) -> CommandResult {
        let mut working = ExecutionDirective::defaults();
        if !directive.is_empty() {
            working.patch(directive);
        }

        let outer_fault = std::mem::replace(&mut self.faulted, false);
        let mut output = String::new();
        let mut status = CommandStatus::Success;

        for line in parse_script_lines(source) {
            let trimmed = line.trim_start();
            if trimmed.starts_with(COMMENT_INDICATOR) || self.faulted {
                continue;
            }

            if let Some(keyword) = trimmed.strip_prefix(DIRECTIVE_INDICATOR) {
                match keyword.parse::<ExecutionDirective>() {
                    Ok(patch) => working.patch(&patch),
                    Err(err) => {
                        warn!(%err, "ignoring directive");
                        self.formatter.print_line(&err.to_string(), &mut output);
                    }
                }
                continue;
            }

            let result = self.execute_with(ctx, &line, &working, Some(args));
            trace!(line = %line, status = ?result.status(), "script line done");
            if !working.echo_off() {
                self.formatter.print_line(result.message(), &mut output);
            }

            match result.status() {
                CommandStatus::Abort => {
                    if working.echo_off() {
                        self.formatter.print_line(result.message(), &mut output);
                    }
                    self.faulted = outer_fault;
                    return CommandResult::success(output);
                }
                CommandStatus::Failure | CommandStatus::Undetermined => {
                    status = CommandStatus::Failure
                }
                CommandStatus::Success => {}
            }
        }

        self.faulted = outer_fault;
        CommandResult::new(status, output)
    }
}

fn wrap_failure(inner: CommandResult) -> CommandResult {
    CommandResult::new(
        inner.status(),
        format!("Subcommand failure: {}", inner.message()),
    )
}

impl Default for Interpreter {
    /// An interpreter with every built-in command and no scripts.
    fn default() -> Self {
        Self::new(
            crate::builtin::core_registry(),
            Box::new(MemoryScriptLocator::new()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::MemoryContext;

    fn shell(scripts: MemoryScriptLocator) -> Interpreter {
        Interpreter::new(crate::builtin::core_registry(), Box::new(scripts)).with_seed(7)
    }

    fn run(line: &str) -> CommandResult {
        Interpreter::default().execute(&mut MemoryContext::new(), line)
    }

    #[test]
    fn test_subcommand_output_is_spliced() {
        assert_eq!(run("echo < (add 2 3)"), CommandResult::success("5"));
        assert_eq!(
            run("echo a < (add 1 1) b < (multiply 2 3)"),
            CommandResult::success("a 2 b 6")
        );
        assert_eq!(
            run("add 1 < (add 1 < (add 1 1))"),
            CommandResult::success("4")
        );
    }

    #[test]
    fn test_subcommand_failure_wraps_message() {
        let result = run("echo < (nosuchthing)");
        assert_eq!(result.status(), CommandStatus::Failure);
        assert_eq!(
            result.message(),
            "Subcommand failure: Unknown command or script name nosuchthing"
        );
    }

    #[test]
    fn test_chain_passes_value_through_variable() {
        let mut sh = Interpreter::default();
        let mut ctx = MemoryContext::new();
        let result = sh.execute(&mut ctx, "add 2 3 > echo got $~$");
        assert_eq!(result, CommandResult::success("got 5"));
        assert_eq!(ctx.env().get_var("~"), Some("5"));

        let result = sh.execute(&mut ctx, "add 1 1 > add $~$ 1 > multiply $~$ 10");
        assert_eq!(result.message(), "30");
    }

    #[test]
    fn test_chain_failure_aborts_line() {
        let mut sh = Interpreter::default();
        let mut ctx = MemoryContext::new();
        let result = sh.execute(&mut ctx, "add x > echo never");
        assert_eq!(result.status(), CommandStatus::Failure);
        assert!(result.message().starts_with("Subcommand failure: "));
        assert_eq!(ctx.env().get_var("~"), None);
    }

    #[test]
    fn test_escaped_operators_are_literal() {
        assert_eq!(run("echo a \\> b \\< c"), CommandResult::success("a > b < c"));
    }

    #[test]
    fn test_blank_line_is_a_no_op() {
        assert_eq!(run("   "), CommandResult::success(""));
    }

    #[test]
    fn test_command_name_is_substituted() {
        let mut sh = Interpreter::default();
        let mut ctx = MemoryContext::new();
        ctx.env_mut().set_var("cmd", "echo");
        assert_eq!(sh.execute(&mut ctx, "$cmd$ hi"), CommandResult::success("hi"));
        assert!(ctx.env().get_var("now").is_some());
    }

    #[test]
    fn test_unknown_command() {
        let mut sh = Interpreter::default();
        let mut ctx = MemoryContext::new();
        let result = sh.execute(&mut ctx, "frobnicate now");
        assert_eq!(
            result,
            CommandResult::failure("Unknown command or script name frobnicate")
        );
        assert!(sh.is_faulted());

        let ignore = ExecutionDirective {
            ignore_unknown_commands: Some(true),
            ..ExecutionDirective::default()
        };
        let result = sh.execute_with(&mut ctx, "frobnicate", &ignore, None);
        assert_eq!(result, CommandResult::success(""));
    }

    #[test]
    fn test_alias_prefixes_parameters() {
        let mut sh = Interpreter::default();
        let mut ctx = MemoryContext::new();
        sh.execute(&mut ctx, "alias greet echo hello");
        assert_eq!(sh.execute(&mut ctx, "greet world"), CommandResult::success("hello world"));
    }

    #[test]
    fn test_script_fault_short_circuit() {
        let scripts = MemoryScriptLocator::new()
            .with_script("three", "echo one\nadd nope\necho three");
        let mut sh = shell(scripts);
        let mut ctx = MemoryContext::new();
        let result = sh.execute(&mut ctx, "three");
        assert_eq!(result.status(), CommandStatus::Failure);
        assert!(result.message().starts_with("one\n"));
        assert!(result.message().contains("Failed to parse 'nope' as a number"));
        assert!(!result.message().contains("three"));
        assert!(sh.is_faulted());
    }

    #[test]
    fn test_script_continue_on_error() {
        let scripts = MemoryScriptLocator::new()
            .with_script("three", "@continueonerror\necho one\nadd nope\necho three");
        let mut sh = shell(scripts);
        let result = sh.execute(&mut MemoryContext::new(), "three");
        assert_eq!(result.status(), CommandStatus::Failure);
        assert!(result.message().ends_with("three\n"));
    }

    #[derive(Default)]
    struct Maybe;

    impl Command for Maybe {
        fn params(&self) -> &'static [crate::command::Param] {
            &[]
        }

        fn assign(
            &mut self,
            property: &str,
            _value: crate::command::Value,
        ) -> Result<(), crate::error::BindError> {
            Err(crate::error::BindError::UnknownProperty(property.to_string()))
        }

        fn flag(&self, _property: &str) -> bool {
            false
        }

        fn run(&mut self, _interp: &mut Interpreter, _ctx: &mut dyn Context) -> CommandResult {
            CommandResult::new(CommandStatus::Undetermined, "not implemented")
        }

        fn description(&self) -> &'static str {
            "Neither succeeds nor fails"
        }
    }

    #[test]
    fn test_undetermined_line_fails_the_script() {
        let scripts =
            MemoryScriptLocator::new().with_script("unsure", "echo one\nmaybe\necho two");
        let mut sh = shell(scripts);
        sh.registry_mut().add_custom_command(
            "maybe",
            std::sync::Arc::new(crate::command::Factory::<Maybe>::default()),
        );
        let mut ctx = MemoryContext::new();
        let result = sh.execute(&mut ctx, "unsure");
        assert_eq!(result.status(), CommandStatus::Failure);
        assert_eq!(result.message(), "one\nnot implemented\ntwo\n");
        assert!(!sh.is_faulted());
    }

    #[test]
    fn test_script_abort_is_success() {
        let scripts = MemoryScriptLocator::new()
            .with_script("quit", "@echooff\necho hidden\nexit bye\necho after");
        let mut sh = shell(scripts);
        let result = sh.execute(&mut MemoryContext::new(), "quit");
        assert_eq!(result, CommandResult::success("bye\n"));
    }

    #[test]
    fn test_script_directives_and_comments() {
        let scripts = MemoryScriptLocator::new().with_script(
            "d",
            "# comment\n@loud\n@echooff\necho quiet\n@echoon\necho loud",
        );
        let mut sh = shell(scripts);
        let result = sh.execute(&mut MemoryContext::new(), "d");
        assert_eq!(
            result,
            CommandResult::success("Unknown directive 'loud'\nloud\n")
        );
    }

    #[test]
    fn test_script_arguments() {
        let scripts = MemoryScriptLocator::new().with_script("greet", "echo hello $1$ and $2$");
        let mut sh = shell(scripts);
        let result = sh.execute(&mut MemoryContext::new(), "greet (big world) you");
        assert_eq!(result, CommandResult::success("hello big world and you\n"));
    }

    #[test]
    fn test_nested_script_and_missing_argument_check() {
        let scripts = MemoryScriptLocator::new()
            .with_script("inner", "if (($1$) = ()) (exit (Missing name))\necho inner $1$")
            .with_script("outer", "inner\ninner x");
        let mut sh = shell(scripts);
        let result = sh.execute(&mut MemoryContext::new(), "outer");
        assert_eq!(result, CommandResult::success("Missing name\n\n\ninner x\n\n"));
    }

    #[test]
    fn test_multiple_scripts_found() {
        let composite = crate::script::CompositeScriptLocator::new(vec![
            Box::new(MemoryScriptLocator::new().with_script("dup", "echo 1")),
            Box::new(MemoryScriptLocator::new().with_script("dup", "echo 2")),
        ]);
        let mut sh = Interpreter::new(crate::builtin::core_registry(), Box::new(composite));
        let result = sh.execute(&mut MemoryContext::new(), "dup");
        assert_eq!(result.status(), CommandStatus::Failure);
        assert!(result.message().contains("Multiple scripts found by name 'dup'"));
        assert!(result.message().ends_with("Script names must be unique"));
    }

    #[test]
    fn test_recursion_is_bounded() {
        let scripts = MemoryScriptLocator::new().with_script("loop", "loop");
        let mut sh = shell(scripts);
        let result = sh.execute(&mut MemoryContext::new(), "loop");
        assert_eq!(result.status(), CommandStatus::Failure);
        assert!(result.message().contains("Maximum nesting depth exceeded"));
    }

    #[test]
    fn test_init_script_ignores_unknown_commands() {
        let scripts = MemoryScriptLocator::new().with_script("init", "set ready yes\nnotacommand");
        let mut sh = shell(scripts);
        let mut ctx = MemoryContext::new();
        let result = sh.init(&mut ctx);
        assert!(result.is_success());
        assert_eq!(ctx.env().get_var("ready"), Some("yes"));

        let mut bare = Interpreter::default();
        assert!(bare.init(&mut MemoryContext::new()).is_success());
    }
}
