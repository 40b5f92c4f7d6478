//! `$name$` and `$N$` interpolation.

use crate::constants::{ESCAPE, TOKEN_INDICATOR};
use crate::env::Environment;

/// Replaces every `$name$` whose name is a set variable with its value.
///
/// Unknown names are left as written. `\$` yields a literal `$` that never
/// opens a substitution. Values are inserted verbatim and not re-scanned.
pub fn perform_substitution(env: &Environment, input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find([ESCAPE, TOKEN_INDICATOR]) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if let Some(after) = tail.strip_prefix(ESCAPE) {
            if let Some(after_token) = after.strip_prefix(TOKEN_INDICATOR) {
                out.push(TOKEN_INDICATOR);
                rest = after_token;
            } else {
                out.push(ESCAPE);
                rest = after;
            }
            continue;
        }

        let after = &tail[TOKEN_INDICATOR.len_utf8()..];
        if let Some(end) = after.find(TOKEN_INDICATOR) {
            let name = &after[..end];
            if let Some(value) = env.get_var(name) {
                out.push_str(value);
                rest = &after[end + TOKEN_INDICATOR.len_utf8()..];
                continue;
            }
        }
        out.push(TOKEN_INDICATOR);
        rest = after;
    }

    out.push_str(rest);
    out
}

/// Replaces `$1$`, `$2$`, ... with the script arguments (1-based).
///
/// Outside a script (`None`) the input is returned unchanged. Inside a script
/// an index with no matching argument becomes the empty string.
pub fn perform_script_substitution(input: &str, script_args: Option<&[String]>) -> String {
    let Some(args) = script_args else {
        return input.to_string();
    };

    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find(TOKEN_INDICATOR) {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + TOKEN_INDICATOR.len_utf8()..];
        let digits = after.chars().take_while(char::is_ascii_digit).count();
        let closed = digits > 0 && after[digits..].starts_with(TOKEN_INDICATOR);
        if !closed {
            out.push(TOKEN_INDICATOR);
            rest = after;
            continue;
        }

        let value = after[..digits]
            .parse::<usize>()
            .ok()
            .and_then(|index| index.checked_sub(1))
            .and_then(|index| args.get(index));
        if let Some(value) = value {
            out.push_str(value);
        }
        rest = &after[digits + TOKEN_INDICATOR.len_utf8()..];
    }

    out.push_str(rest);
    out
}
