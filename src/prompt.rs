//! Expansion of the interactive prompt.

use chrono::Local;

use crate::context::Context;
use crate::substitution::perform_substitution;

const UNDEFINED: &str = "<undefined>";

/// Replaces the `%token%` placeholders of `prompt`, then session variables.
pub fn evaluate_prompt(ctx: &dyn Context, prompt: &str) -> String {
    let now = Local::now();
    let version = ctx
        .version()
        .map(|v| v.to_string())
        .unwrap_or_else(|| UNDEFINED.to_string());
    let language = ctx.language();

    let tokens = [
        ("%path%", ctx.current_path()),
        ("%itemname%", ctx.current_item_name()),
        ("%ver%", version),
        ("%db%", ctx.partition()),
        ("%langcode%", language.clone()),
        ("%lang%", language),
        ("%date%", now.format("%Y-%m-%d").to_string()),
        ("%time%", now.format("%H:%M").to_string()),
    ];

    let mut out = prompt.to_string();
    for (token, value) in tokens {
        out = out.replace(token, &value);
    }
    perform_substitution(ctx.env(), &out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_PROMPT;
    use crate::context::MemoryContext;

    #[test]
    fn test_default_prompt() {
        let mut ctx = MemoryContext::new();
        ctx.add_item("/home", "page").unwrap();
        ctx.set_current_path("/home").unwrap();
        assert_eq!(evaluate_prompt(&ctx, DEFAULT_PROMPT), "master:/home >");
    }

    #[test]
    fn test_item_tokens_and_variables() {
        let mut ctx = MemoryContext::new();
        ctx.add_item("/home", "page").unwrap();
        ctx.set_current_path("/home").unwrap();
        ctx.env_mut().set_var("user", "sam");
        assert_eq!(
            evaluate_prompt(&ctx, "$user$@%itemname%#%ver% [%langcode%|%lang%]"),
            "sam@home#1 [en|en]"
        );
    }
}
