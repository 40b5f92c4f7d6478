//! Maps raw arguments onto a command's declared parameters.

use std::collections::HashMap;

use tracing::trace;

use crate::command::{Command, Param, ParamKind, Value};
use crate::env::Environment;
use crate::error::BindError;
use crate::substitution::{perform_script_substitution, perform_substitution};

/// Binds `args` onto `command` according to its schema.
///
/// The binder only assigns what it finds. Checking that required parameters
/// were supplied is left to the command itself.
pub fn bind(
    command: &mut dyn Command,
    args: &[String],
    env: &Environment,
    script_args: Option<&[String]>,
) -> Result<(), BindError> {
    let params = command.params();
    let substitute = |raw: &str, param: &Param| -> String {
        let value = if param.no_substitution {
            raw.to_string()
        } else {
            perform_substitution(env, raw)
        };
        perform_script_substitution(&value, script_args)
    };

    // Multi-word named parameters consume their span before anything else.
    let mut working = args.to_vec();
    for param in params {
        let ParamKind::Named { name, words } = param.kind else {
            continue;
        };
        if words <= 1 {
            continue;
        }
        let token = format!("-{}", name);
        let Some(pos) = working.iter().position(|arg| *arg == token) else {
            continue;
        };
        let taken = words.min(working.len() - pos - 1);
        if taken == 0 {
            continue;
        }
        let values: Vec<String> = working
            .drain(pos..=pos + taken)
            .skip(1)
            .map(|word| substitute(&word, param))
            .collect();
        assign(command, param, Value::List(values))?;
    }

    let flags: Vec<&str> = params
        .iter()
        .filter_map(|param| match param.kind {
            ParamKind::Flag { name } => Some(name),
            _ => None,
        })
        .collect();

    let (named, numbered) = extract_parameters(&working, &flags);
    trace!(?named, ?numbered, "extracted parameters");

    for param in params {
        match param.kind {
            ParamKind::Named { name, words } if words <= 1 => {
                if let Some(raw) = named.get(name) {
                    assign(command, param, Value::Text(substitute(raw, param)))?;
                }
            }
            ParamKind::Numbered { index } => {
                if let Some(raw) = numbered.get(index) {
                    assign(command, param, Value::Text(substitute(raw, param)))?;
                }
            }
            ParamKind::Flag { name } => {
                if named.contains_key(name) {
                    let toggled = !command.flag(param.property);
                    assign(command, param, Value::Bool(toggled))?;
                }
            }
            ParamKind::Named { .. } | ParamKind::List => {}
        }
    }

    if let Some(list) = params.iter().find(|p| p.kind == ParamKind::List) {
        let start = params
            .iter()
            .filter_map(|param| match param.kind {
                ParamKind::Numbered { index } => Some(index + 1),
                _ => None,
            })
            .max()
            .unwrap_or(0);
        let values = numbered
            .iter()
            .skip(start)
            .map(|raw| substitute(raw, list))
            .collect();
        assign(command, list, Value::List(values))?;
    }

    Ok(())
}

fn assign(command: &mut dyn Command, param: &Param, value: Value) -> Result<(), BindError> {
    let value = value.convert(param.property, param.value_type)?;
    command.assign(param.property, value)
}

/// Splits arguments into `-name value` pairs and positional values.
///
/// Declared flags are taken out first and recorded with an empty value. A
/// value that itself looks like `-name` leaves the pending name empty and
/// starts a new one. `\-` at the start of a token escapes the dash.
fn extract_parameters(args: &[String], flags: &[&str]) -> (HashMap<String, String>, Vec<String>) {
    let mut slots: Vec<Option<&str>> = args.iter().map(|arg| Some(arg.as_str())).collect();
    let mut named = HashMap::new();

    for flag in flags {
        let token = format!("-{}", flag);
        if let Some(pos) = slots.iter().position(|slot| *slot == Some(token.as_str())) {
            slots[pos] = None;
            named.insert(flag.to_string(), String::new());
        }
    }

    let mut numbered = Vec::new();
    let mut pending: Option<String> = None;
    for slot in slots {
        match (slot, pending.take()) {
            (Some(token), Some(name)) => match parameter_name(token) {
                Some(next) => {
                    named.insert(name, String::new());
                    pending = Some(next);
                }
                None => {
                    named.insert(name, unescape_dash(token));
                }
            },
            (Some(token), None) => match parameter_name(token) {
                Some(next) => pending = Some(next),
                None => numbered.push(unescape_dash(token)),
            },
            (None, Some(name)) => {
                named.insert(name, String::new());
            }
            (None, None) => {}
        }
    }
    if let Some(name) = pending {
        named.insert(name, String::new());
    }

    (named, numbered)
}

fn parameter_name(token: &str) -> Option<String> {
    token
        .strip_prefix('-')
        .filter(|rest| !rest.is_empty())
        .map(str::to_string)
}

fn unescape_dash(token: &str) -> String {
    match token.strip_prefix("\\-") {
        Some(rest) => format!("-{}", rest),
        None => token.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ValueType;
    use crate::context::Context;
    use crate::interpreter::Interpreter;
    use crate::result::CommandResult;

    #[derive(Default, Debug)]
    struct Probe {
        field: Vec<String>,
        pair: Option<(String, String)>,
        symbol: Option<String>,
        first: Option<String>,
        raw: Option<String>,
        count: Option<i64>,
        rest: Vec<String>,
        verbose: bool,
        quiet: bool,
    }

    const PROBE_PARAMS: &[Param] = &[
        Param::multi_word("field", "f", 2, "name value", "Field to set"),
        Param::multi_word("pair", "p", 2, "key value", "Pair").typed(ValueType::KeyValue),
        Param::named("symbol", "s", "symbol", "Symbol"),
        Param::named("count", "n", "count", "Count").typed(ValueType::Integer),
        Param::flag("verbose", "v", "Verbose"),
        Param::flag("quiet", "q", "Quiet"),
        Param::numbered("first", 0, "first", "First"),
        Param::numbered("raw", 1, "raw", "Raw").no_substitution(),
        Param::list("rest", "rest", "Remainder"),
    ];

    impl Command for Probe {
        fn params(&self) -> &'static [Param] {
            PROBE_PARAMS
        }

        fn assign(&mut self, property: &str, value: Value) -> Result<(), BindError> {
            match (property, value) {
                ("field", v) => self.field = v.into_list(),
                ("pair", Value::KeyValue(k, v)) => self.pair = Some((k, v)),
                ("symbol", v) => self.symbol = Some(v.into_text()),
                ("count", Value::Integer(n)) => self.count = Some(n),
                ("verbose", v) => self.verbose = v.as_bool(),
                ("quiet", v) => self.quiet = v.as_bool(),
                ("first", v) => self.first = Some(v.into_text()),
                ("raw", v) => self.raw = Some(v.into_text()),
                ("rest", v) => self.rest = v.into_list(),
                (other, _) => return Err(BindError::UnknownProperty(other.to_string())),
            }
            Ok(())
        }

        fn flag(&self, property: &str) -> bool {
            match property {
                "verbose" => self.verbose,
                "quiet" => self.quiet,
                _ => false,
            }
        }

        fn run(&mut self, _interp: &mut Interpreter, _ctx: &mut dyn Context) -> CommandResult {
            CommandResult::success("")
        }

        fn description(&self) -> &'static str {
            "probe"
        }
    }

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn bind_probe(input: &[&str]) -> Probe {
        let mut probe = Probe::default();
        bind(&mut probe, &args(input), &Environment::default(), None).unwrap();
        probe
    }

    #[test]
    fn test_multi_word_named_is_consumed_first() {
        let probe = bind_probe(&["-f", "title", "hello", "extra1", "extra2", "extra3"]);
        assert_eq!(probe.field, vec!["title", "hello"]);
        assert_eq!(probe.first.as_deref(), Some("extra1"));
        assert_eq!(probe.raw.as_deref(), Some("extra2"));
        assert_eq!(probe.rest, vec!["extra3"]);
    }

    #[test]
    fn test_list_takes_everything_past_numbered() {
        let probe = bind_probe(&["a", "b", "c", "d"]);
        assert_eq!(probe.first.as_deref(), Some("a"));
        assert_eq!(probe.raw.as_deref(), Some("b"));
        assert_eq!(probe.rest, vec!["c", "d"]);
    }

    #[test]
    fn test_flags_toggle_current_value() {
        let mut probe = Probe {
            quiet: true,
            ..Probe::default()
        };
        bind(&mut probe, &args(&["-v", "-q", "x"]), &Environment::default(), None).unwrap();
        assert!(probe.verbose);
        assert!(!probe.quiet);
        assert_eq!(probe.first.as_deref(), Some("x"));
    }

    #[test]
    fn test_named_followed_by_name_gets_empty_value() {
        let probe = bind_probe(&["-s", "-n", "3", "pos"]);
        assert_eq!(probe.symbol.as_deref(), Some(""));
        assert_eq!(probe.count, Some(3));
        assert_eq!(probe.first.as_deref(), Some("pos"));
    }

    #[test]
    fn test_named_before_flag_gets_empty_value() {
        let probe = bind_probe(&["-s", "-v"]);
        assert_eq!(probe.symbol.as_deref(), Some(""));
        assert!(probe.verbose);
    }

    #[test]
    fn test_escaped_dash_is_a_value() {
        let probe = bind_probe(&["-s", "\\-", "\\-5"]);
        assert_eq!(probe.symbol.as_deref(), Some("-"));
        assert_eq!(probe.first.as_deref(), Some("-5"));
    }

    #[test]
    fn test_substitution_respects_no_substitution() {
        let mut env = Environment::default();
        env.set_var("x", "value");
        let script_args = args(&["one"]);
        let mut probe = Probe::default();
        bind(
            &mut probe,
            &args(&["$x$", "$x$ $1$", "$x$"]),
            &env,
            Some(&script_args),
        )
        .unwrap();
        assert_eq!(probe.first.as_deref(), Some("value"));
        assert_eq!(probe.raw.as_deref(), Some("$x$ one"));
        assert_eq!(probe.rest, vec!["value"]);
    }

    #[test]
    fn test_conversion_failure_is_reported() {
        let mut probe = Probe::default();
        let err = bind(&mut probe, &args(&["-n", "many"]), &Environment::default(), None).unwrap_err();
        assert!(matches!(err, BindError::Conversion { ref property, .. } if property == "count"));

        let mut probe = Probe::default();
        assert!(bind(&mut probe, &args(&["-p", "only"]), &Environment::default(), None).is_err());
    }

    #[test]
    fn test_multi_word_key_value() {
        let probe = bind_probe(&["x", "-p", "k", "v"]);
        assert_eq!(probe.pair, Some(("k".to_string(), "v".to_string())));
        assert_eq!(probe.first.as_deref(), Some("x"));
    }

    #[test]
    fn test_missing_parameters_are_left_alone() {
        let probe = bind_probe(&[]);
        assert_eq!(probe.first, None);
        assert!(probe.rest.is_empty());
        assert!(!probe.verbose);
    }
}
