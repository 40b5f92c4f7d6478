//! Splitting of raw input into elements.
//!
//! A line is split on whitespace, except that a parenthesised group is kept as a
//! single element with its inner whitespace and nested parens intact. Nested
//! groups are only split when that element is itself dispatched as a command.

use crate::constants::{
    ESCAPE, ESCAPED_CHAIN, ESCAPED_CLOSE, ESCAPED_OPEN, ESCAPED_SUBCOMMAND, GROUP_CLOSE,
    GROUP_OPEN, LINE_CONTINUATION,
};
use tracing::trace;

/// Tokenizes one command line into its first-level elements.
///
/// Escaped parens and escaped sub-command/chain operators are hidden from the
/// grouping pass. Escaped parens are restored afterwards in every element that
/// does not carry a structural paren of its own; escaped operators stay hidden
/// until the dispatcher has resolved the real ones.
pub fn parse_input_line(line: &str) -> Vec<String> {
    let normalized = normalize_line_endings(line.trim());
    let hidden = hide_escapes(&normalized);
    let elements: Vec<String> = parse_first_level_groups(&hidden, GROUP_OPEN, GROUP_CLOSE)
        .into_iter()
        .map(|element| restore_group_escapes(&element))
        .collect();
    trace!(?elements, "tokenized line");
    elements
}

/// Splits `input` on whitespace outside groups delimited by `open`/`close`.
///
/// Each top-level group becomes one trimmed element without its delimiters.
/// Unbalanced input is salvaged: a close with no matching open is dropped, and
/// the contents of a group left open at the end are split on whitespace.
pub fn parse_first_level_groups(input: &str, open: char, close: char) -> Vec<String> {
    let mut elements = Vec::new();
    let mut outside = String::new();
    let mut group = String::new();
    let mut depth = 0usize;

    for ch in input.chars() {
        if ch == open {
            if depth == 0 {
                push_words(&mut elements, &outside);
                outside.clear();
            } else {
                group.push(ch);
            }
            depth += 1;
        } else if ch == close {
            match depth {
                0 => outside.push(' '),
                1 => {
                    depth = 0;
                    elements.push(group.trim().to_string());
                    group.clear();
                }
                _ => {
                    depth -= 1;
                    group.push(ch);
                }
            }
        } else if depth == 0 {
            outside.push(ch);
        } else {
            group.push(ch);
        }
    }

    push_words(&mut elements, &outside);
    if depth > 0 {
        push_words(&mut elements, &group);
    }
    elements
}

/// Splits script source into executable lines.
///
/// Blank lines are dropped. A line ending in the continuation character is
/// joined with the line after it; an escaped trailing continuation character is
/// kept as a literal.
pub fn parse_script_lines(source: &str) -> Vec<String> {
    let normalized = normalize_line_endings(source);
    let lines: Vec<&str> = normalized
        .split('\n')
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect();

    let escaped_suffix = format!("{}{}", ESCAPE, LINE_CONTINUATION);

    // Built bottom-up so that runs of continued lines fold into one.
    let mut reversed: Vec<String> = Vec::with_capacity(lines.len());
    for line in lines.into_iter().rev() {
        if let Some(stripped) = line.strip_suffix(escaped_suffix.as_str()) {
            reversed.push(format!("{}{}", stripped, LINE_CONTINUATION));
        } else if let Some(stripped) = line.strip_suffix(LINE_CONTINUATION) {
            match reversed.pop() {
                Some(next) => reversed.push(format!("{}{}", stripped, next)),
                None => reversed.push(line.to_string()),
            }
        } else {
            reversed.push(line.to_string());
        }
    }
    reversed.reverse();
    reversed
}

/// Parses the loose boolean literals accepted by the command language.
///
/// An empty string reads as `false`.
pub fn parse_boolean(input: &str) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Some(true),
        "false" | "no" | "n" | "0" | "" => Some(false),
        _ => None,
    }
}

/// Puts escaped sub-command and chain operators back as literal characters.
pub fn restore_operator_escapes(element: &str) -> String {
    element
        .replace(ESCAPED_SUBCOMMAND, "<")
        .replace(ESCAPED_CHAIN, ">")
}

fn normalize_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

fn hide_escapes(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == ESCAPE {
            let hidden = match chars.peek() {
                Some('(') => Some(ESCAPED_OPEN),
                Some(')') => Some(ESCAPED_CLOSE),
                Some('<') => Some(ESCAPED_SUBCOMMAND),
                Some('>') => Some(ESCAPED_CHAIN),
                _ => None,
            };
            if let Some(placeholder) = hidden {
                chars.next();
                out.push(placeholder);
                continue;
            }
        }
        out.push(ch);
    }
    out
}

fn restore_group_escapes(element: &str) -> String {
    let mut restored = element.to_string();
    if !restored.contains(GROUP_OPEN) {
        restored = restored.replace(ESCAPED_OPEN, "(");
    }
    if !restored.contains(GROUP_CLOSE) {
        restored = restored.replace(ESCAPED_CLOSE, ")");
    }
    restored
}

fn push_words(elements: &mut Vec<String>, text: &str) {
    elements.extend(text.split_whitespace().map(str::to_string));
}
