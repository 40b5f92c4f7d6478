use std::process::ExitCode;

use anyhow::{Context as _, Result, bail};
use canopy::config::{Config, Mode, Options};
use canopy::error::ScriptError;
use canopy::{CommandResult, CommandStatus, ExecutionDirective, Interpreter, MemoryContext};
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> ExitCode {
    // Logs go to stderr so command output on stdout stays clean. Filtered by RUST_LOG.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let options: Options = argh::from_env();
    let config = Config::from_env(options);
    let mut interp = config.build_interpreter();
    let mut ctx = MemoryContext::new();

    let init = interp.init(&mut ctx);
    if !init.is_success() {
        warn!(message = %init.message(), "init script failed");
    }

    let result = match &config.mode {
        Mode::Command(line) => {
            let directive = ExecutionDirective::defaults().patched(&config.directive);
            interp.execute_with(&mut ctx, line, &directive, None)
        }
        Mode::Script { name, args } => run_named_script(&mut interp, &mut ctx, &config, name, args)?,
        Mode::Interactive => {
            interp.repl(&mut ctx).context("interactive session failed")?;
            return Ok(ExitCode::SUCCESS);
        }
    };

    if !result.message().is_empty() {
        print!("{}", result);
        if !result.message().ends_with('\n') {
            println!();
        }
    }
    Ok(exit_code(&result))
}

fn run_named_script(
    interp: &mut Interpreter,
    ctx: &mut MemoryContext,
    config: &Config,
    name: &str,
    args: &[String],
) -> Result<CommandResult> {
    let source = match interp.scripts().get_script(name) {
        Ok(Some(source)) => source,
        Ok(None) => bail!("Unknown script name {}", name),
        Err(ScriptError::MultipleScriptsFound { names }) => {
            return Ok(CommandResult::failure(interp.multiple_scripts_message(name, &names)));
        }
        Err(err) => return Err(err.into()),
    };
    Ok(interp.run_script(ctx, &source, &config.directive, args))
}

fn exit_code(result: &CommandResult) -> ExitCode {
    match result.status() {
        CommandStatus::Success | CommandStatus::Abort => ExitCode::SUCCESS,
        CommandStatus::Failure | CommandStatus::Undetermined => ExitCode::FAILURE,
    }
}
