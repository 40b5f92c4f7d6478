//! A command language and script runner for navigating and scripting a content tree.
//!
//! A line is split into top-level elements (parentheses group words), sub-commands
//! marked with `<` are executed and spliced in, `>` chains commands through the `~`
//! variable, and the first element is resolved to a core command, a custom binding,
//! an alias or finally a script. Scripts are plain text run line by line under an
//! [`ExecutionDirective`].
//!
//! The main entry point is [`Interpreter`]. It operates on any [`Context`]; the
//! in-memory [`MemoryContext`] is provided for the binary and for tests.

pub mod binder;
pub mod builtin;
pub mod command;
pub mod config;
pub mod constants;
pub mod context;
pub mod directive;
pub mod env;
pub mod error;
pub mod expression;
pub mod format;
pub mod help;
mod interpreter;
pub mod lexer;
pub mod prompt;
pub mod registry;
mod repl;
pub mod result;
pub mod script;
pub mod substitution;

pub use context::{Context, MemoryContext};
pub use directive::ExecutionDirective;
/// The line and script executor.
///
/// See [`Interpreter`] for the high-level API and examples.
pub use interpreter::Interpreter;
pub use registry::CommandRegistry;
pub use result::{CommandResult, CommandStatus};
pub use script::{CompositeScriptLocator, FileScriptLocator, MemoryScriptLocator, ScriptLocator};
