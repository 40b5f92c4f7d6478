//! Plain-text presentation of command output.

use crate::help::HelpDetails;

const DEFAULT_PADDING: usize = 20;
const NEW_LINE: &str = "\n";

/// Presentation helpers shared by commands and the script runner.
///
/// Methods that take a `buf` append to it, so output can be accumulated
/// across several calls before it becomes a command result.
pub trait Formatter {
    fn print_line(&self, line: &str, buf: &mut String);

    /// Splits text into its non-empty lines.
    fn split_lines(&self, input: &str) -> Vec<String>;

    fn join_lines(&self, lines: &[String]) -> String;

    /// Writes `name` padded to a column followed by `definition`.
    fn print_definition(&self, name: &str, leading: usize, definition: &str, buf: &mut String);

    /// Writes one table row, padding each cell to its column width.
    fn print_table(&self, cells: &[&str], widths: &[usize], buf: &mut String);

    /// Renders a help record. Examples are prefixed with `binding` when given.
    fn print_help(&self, details: &HelpDetails, binding: Option<&str>) -> String;
}

#[derive(Debug, Clone, Copy)]
pub struct TextFormatter {
    padding: usize,
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl TextFormatter {
    pub fn new() -> Self {
        Self {
            padding: DEFAULT_PADDING,
        }
    }

    pub fn with_padding(padding: usize) -> Self {
        Self { padding }
    }
}

impl Formatter for TextFormatter {
    fn print_line(&self, line: &str, buf: &mut String) {
        buf.push_str(line);
        buf.push_str(NEW_LINE);
    }

    fn split_lines(&self, input: &str) -> Vec<String> {
        input
            .split(['\n', '\r'])
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn join_lines(&self, lines: &[String]) -> String {
        lines.join(NEW_LINE)
    }

    fn print_definition(&self, name: &str, leading: usize, definition: &str, buf: &mut String) {
        let pad = self.padding.saturating_sub(name.chars().count()).max(1);
        buf.push_str(&" ".repeat(leading));
        buf.push_str(name);
        buf.push_str(&" ".repeat(pad));
        buf.push_str(definition);
        buf.push_str(NEW_LINE);
    }

    fn print_table(&self, cells: &[&str], widths: &[usize], buf: &mut String) {
        for (i, cell) in cells.iter().enumerate() {
            let width = widths.get(i).copied().unwrap_or(0);
            buf.push_str(cell);
            buf.push_str(&" ".repeat(width.saturating_sub(cell.chars().count())));
        }
        buf.push_str(NEW_LINE);
    }

    fn print_help(&self, details: &HelpDetails, binding: Option<&str>) -> String {
        let mut buf = String::with_capacity(300);
        self.print_line(&details.description, &mut buf);
        buf.push_str(NEW_LINE);
        self.print_line("Usage: ", &mut buf);
        self.print_line(&format!("  {}", details.usage), &mut buf);

        if !details.parameters.is_empty() {
            buf.push_str(NEW_LINE);
            self.print_line("Parameters:", &mut buf);
            for (name, description) in &details.parameters {
                self.print_definition(name, 2, description, &mut buf);
            }
        }

        if !details.comments.is_empty() {
            buf.push_str(NEW_LINE);
            self.print_line("Comments:", &mut buf);
            self.print_line(&format!("  {}", details.comments), &mut buf);
        }

        if !details.examples.is_empty() {
            buf.push_str(NEW_LINE);
            self.print_line("Examples:", &mut buf);
            for example in &details.examples {
                let line = match binding {
                    Some(binding) if !binding.is_empty() => format!("  {} {}", binding, example),
                    _ => format!("  {}", example),
                };
                self.print_line(line.trim_end(), &mut buf);
            }
        }
        buf
    }
}
