//! Structural characters and shared names of the command language.

/// Escapes the following structural character.
pub const ESCAPE: char = '\\';

/// Marks the next element as a sub-command whose output is spliced in.
pub const SUBCOMMAND_SYMBOL: &str = "<";

/// Separates chained commands on a single line.
pub const CHAIN_SYMBOL: &str = ">";

pub const GROUP_OPEN: char = '(';
pub const GROUP_CLOSE: char = ')';

// Stand-ins for escaped structural characters while a line is being grouped.
pub(crate) const ESCAPED_OPEN: char = '\u{E000}';
pub(crate) const ESCAPED_CLOSE: char = '\u{E001}';
pub(crate) const ESCAPED_SUBCOMMAND: char = '\u{E002}';
pub(crate) const ESCAPED_CHAIN: char = '\u{E003}';

/// Brackets environment variable names: `$name$`.
pub const TOKEN_INDICATOR: char = '$';

/// Script lines starting with this are ignored.
pub const COMMENT_INDICATOR: &str = "#";

/// Script lines starting with this patch the working directive.
pub const DIRECTIVE_INDICATOR: &str = "@";

/// A script line ending with this continues on the next line.
pub const LINE_CONTINUATION: char = '-';

/// Holds the result of the previous segment of a chain.
pub const CHAINED_VALUE_VARIABLE: &str = "~";

/// Variables that user commands are not allowed to assign.
pub const RESERVED_VARIABLES: &[&str] = &[CHAINED_VALUE_VARIABLE];

pub const NOW_VARIABLE: &str = "now";
pub const PROMPT_VARIABLE: &str = "prompt";
pub const PREVIOUS_PATH_VARIABLE: &str = "prevpath";

pub const DEFAULT_PROMPT: &str = "%db%:%path% >";

/// Format of the `now` variable.
pub const NOW_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Nesting of sub-commands, chains and scripts is cut off past this depth.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Name of the script run before the first prompt.
pub const INIT_SCRIPT: &str = "init";

pub fn missing_parameter(name: &str) -> String {
    format!("Required parameter '{}' is missing", name)
}
