//! Interactive read-eval-print loop.

use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result};
use tracing::debug;

use crate::constants::{DEFAULT_PROMPT, PROMPT_VARIABLE};
use crate::context::Context;
use crate::interpreter::Interpreter;
use crate::prompt::evaluate_prompt;
use crate::result::CommandStatus;

impl Interpreter {
    /// Reads lines until end of input, an interrupt or an aborting command.
    ///
    /// The prompt is the `prompt` session variable, expanded before every read.
    pub fn repl(&mut self, ctx: &mut dyn Context) -> Result<()> {
        let mut rl = DefaultEditor::new()?;

        loop {
            let template = ctx
                .env()
                .get_var(PROMPT_VARIABLE)
                .unwrap_or(DEFAULT_PROMPT)
                .to_string();
            let prompt = format!("{} ", evaluate_prompt(&*ctx, &template));

            match rl.readline(&prompt) {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    rl.add_history_entry(line.as_str())?;
                    let result = self.execute(ctx, &line);
                    if !result.message().is_empty() {
                        println!("{}", result);
                    }
                    if result.status() == CommandStatus::Abort {
                        debug!("session aborted");
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        Ok(())
    }
}
