//! Command-line options and the session configuration derived from them.

use std::ffi::OsString;
use std::path::PathBuf;

use argh::FromArgs;
use tracing::debug;

use crate::builtin::core_registry;
use crate::directive::ExecutionDirective;
use crate::interpreter::Interpreter;
use crate::script::{CompositeScriptLocator, FileScriptLocator, ScriptLocator};

/// Environment variable holding extra script directories, separated like `PATH`.
pub const SCRIPTS_ENV: &str = "CANOPY_SCRIPTS";

pub const DEFAULT_SCRIPT_EXTENSION: &str = "cnp";

fn default_extension() -> String {
    DEFAULT_SCRIPT_EXTENSION.to_string()
}

#[derive(FromArgs, Debug, PartialEq)]
/// Interactive shell and script runner for a content tree.
pub struct Options {
    #[argh(option, short = 'c')]
    /// execute a single line and exit.
    pub command: Option<String>,

    #[argh(option, short = 's')]
    /// directory searched for script files; may be given more than once.
    pub scripts: Vec<PathBuf>,

    #[argh(option, default = "default_extension()")]
    /// file extension of script files.
    pub ext: String,

    #[argh(option)]
    /// seed for the random number generator.
    pub seed: Option<u64>,

    #[argh(switch)]
    /// do not echo the output of script lines.
    pub echo_off: bool,

    #[argh(switch)]
    /// keep running a script after a command fails.
    pub continue_on_error: bool,

    #[argh(switch)]
    /// treat unknown commands in scripts as no-ops.
    pub ignore_unknown: bool,

    #[argh(positional, greedy)]
    /// script to run instead of starting the interactive loop, followed by its arguments.
    pub script: Vec<String>,
}

/// What the binary should do once the session is set up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Command(String),
    Script { name: String, args: Vec<String> },
    Interactive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub script_dirs: Vec<PathBuf>,
    pub extension: String,
    pub seed: Option<u64>,
    /// Caller directive applied to script runs.
    pub directive: ExecutionDirective,
    pub mode: Mode,
}

impl Config {
    /// Builds the configuration from parsed options and the value of [`SCRIPTS_ENV`].
    pub fn from_options(options: Options, scripts_env: Option<OsString>) -> Self {
        let mut script_dirs = options.scripts;
        if let Some(paths) = scripts_env {
            script_dirs.extend(std::env::split_paths(&paths).filter(|p| !p.as_os_str().is_empty()));
        }

        let directive = ExecutionDirective {
            echo_off: options.echo_off.then_some(true),
            stop_on_error: options.continue_on_error.then_some(false),
            ignore_unknown_commands: options.ignore_unknown.then_some(true),
        };

        let mut script = options.script.into_iter();
        let mode = match (options.command, script.next()) {
            (Some(line), _) => Mode::Command(line),
            (None, Some(name)) => Mode::Script {
                name,
                args: script.collect(),
            },
            (None, None) => Mode::Interactive,
        };

        Self {
            script_dirs,
            extension: options.ext,
            seed: options.seed,
            directive,
            mode,
        }
    }

    pub fn from_env(options: Options) -> Self {
        Self::from_options(options, std::env::var_os(SCRIPTS_ENV))
    }

    /// One file locator per script directory, searched together.
    pub fn script_locator(&self) -> Box<dyn ScriptLocator> {
        let mut composite = CompositeScriptLocator::default();
        for dir in &self.script_dirs {
            debug!(dir = %dir.display(), ext = %self.extension, "script directory");
            composite.push(Box::new(FileScriptLocator::new(dir.clone(), self.extension.as_str())));
        }
        Box::new(composite)
    }

    pub fn build_interpreter(&self) -> Interpreter {
        let interp = Interpreter::new(core_registry(), self.script_locator());
        match self.seed {
            Some(seed) => interp.with_seed(seed),
            None => interp,
        }
    }
}
