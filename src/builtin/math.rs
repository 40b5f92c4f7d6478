use anyhow::{Result, bail};
use rand::Rng;

use super::{BuiltinCommand, unknown};
use crate::command::{Param, Value, ValueType};
use crate::context::Context;
use crate::error::BindError;
use crate::help::HelpDetails;
use crate::interpreter::Interpreter;
use crate::result::CommandResult;

const NUMBERS: &[Param] = &[Param::list("numbers", "numbers", "Any number of numbers to operate on.")];

/// Left fold of `numbers` with `op`, seeded by the first number.
fn fold(numbers: &[String], op: fn(f64, f64) -> Result<f64>) -> Result<CommandResult> {
    let mut acc: Option<f64> = None;
    for raw in numbers {
        let Ok(n) = raw.trim().parse::<f64>() else {
            return Ok(CommandResult::failure(format!(
                "Failed to parse '{}' as a number",
                raw
            )));
        };
        acc = Some(match acc {
            Some(acc) => op(acc, n)?,
            None => n,
        });
    }
    Ok(CommandResult::success(acc.unwrap_or(0.0).to_string()))
}

fn set_numbers(numbers: &mut Vec<String>, property: &str, value: Value) -> Result<(), BindError> {
    match property {
        "numbers" => *numbers = value.into_list(),
        _ => return Err(unknown(property)),
    }
    Ok(())
}

#[derive(Default)]
pub struct Add {
    numbers: Vec<String>,
}

impl BuiltinCommand for Add {
    fn name() -> &'static str {
        "add"
    }

    fn schema() -> &'static [Param] {
        NUMBERS
    }

    fn about() -> &'static str {
        "Add multiple numbers together"
    }

    fn set_property(&mut self, property: &str, value: Value) -> Result<(), BindError> {
        set_numbers(&mut self.numbers, property, value)
    }

    fn execute(&mut self, _interp: &mut Interpreter, _ctx: &mut dyn Context) -> Result<CommandResult> {
        fold(&self.numbers, |a, b| Ok(a + b))
    }

    fn examples(details: &mut HelpDetails) {
        details.add_example("2 3");
        details.add_example("2 3 6");
    }
}

#[derive(Default)]
pub struct Subtract {
    numbers: Vec<String>,
}

impl BuiltinCommand for Subtract {
    fn name() -> &'static str {
        "subtract"
    }

    fn schema() -> &'static [Param] {
        NUMBERS
    }

    fn about() -> &'static str {
        "Subtract multiple numbers from each other"
    }

    fn set_property(&mut self, property: &str, value: Value) -> Result<(), BindError> {
        set_numbers(&mut self.numbers, property, value)
    }

    fn execute(&mut self, _interp: &mut Interpreter, _ctx: &mut dyn Context) -> Result<CommandResult> {
        fold(&self.numbers, |a, b| Ok(a - b))
    }

    fn examples(details: &mut HelpDetails) {
        details.add_example("10 2");
        details.add_example("10 2 3");
    }
}

#[derive(Default)]
pub struct Multiply {
    numbers: Vec<String>,
}

impl BuiltinCommand for Multiply {
    fn name() -> &'static str {
        "multiply"
    }

    fn schema() -> &'static [Param] {
        NUMBERS
    }

    fn about() -> &'static str {
        "Multiply multiple numbers together"
    }

    fn set_property(&mut self, property: &str, value: Value) -> Result<(), BindError> {
        set_numbers(&mut self.numbers, property, value)
    }

    fn execute(&mut self, _interp: &mut Interpreter, _ctx: &mut dyn Context) -> Result<CommandResult> {
        fold(&self.numbers, |a, b| Ok(a * b))
    }

    fn examples(details: &mut HelpDetails) {
        details.add_example("2 3");
    }
}

#[derive(Default)]
pub struct Divide {
    numbers: Vec<String>,
}

impl BuiltinCommand for Divide {
    fn name() -> &'static str {
        "divide"
    }

    fn schema() -> &'static [Param] {
        NUMBERS
    }

    fn about() -> &'static str {
        "Divide multiple numbers from each other"
    }

    fn set_property(&mut self, property: &str, value: Value) -> Result<(), BindError> {
        set_numbers(&mut self.numbers, property, value)
    }

    fn execute(&mut self, _interp: &mut Interpreter, _ctx: &mut dyn Context) -> Result<CommandResult> {
        fold(&self.numbers, |a, b| {
            if b == 0.0 {
                bail!("Cannot divide by zero");
            }
            Ok(a / b)
        })
    }

    fn examples(details: &mut HelpDetails) {
        details.add_example("10 2");
        details.add_example("36 6");
    }
}

#[derive(Default)]
pub struct Modulus {
    numbers: Vec<String>,
}

impl BuiltinCommand for Modulus {
    fn name() -> &'static str {
        "mod"
    }

    fn schema() -> &'static [Param] {
        NUMBERS
    }

    fn about() -> &'static str {
        "Calculate the remainder of dividing multiple numbers"
    }

    fn set_property(&mut self, property: &str, value: Value) -> Result<(), BindError> {
        set_numbers(&mut self.numbers, property, value)
    }

    fn execute(&mut self, _interp: &mut Interpreter, _ctx: &mut dyn Context) -> Result<CommandResult> {
        fold(&self.numbers, |a, b| {
            if b == 0.0 {
                bail!("Cannot divide by zero");
            }
            Ok(a % b)
        })
    }

    fn examples(details: &mut HelpDetails) {
        details.add_example("10 3");
    }
}

/// Random integers in `[min, max)` or fractions rounded to a number of digits.
#[derive(Default)]
pub struct Random {
    max: String,
    min: String,
    fractions: i64,
}

const DEFAULT_MIN: i64 = 0;
const DEFAULT_MAX: i64 = 10;

fn parse_bound(raw: &str, default: i64, name: &str) -> Result<i64> {
    if raw.is_empty() {
        return Ok(default);
    }
    match raw.trim().parse() {
        Ok(n) => Ok(n),
        Err(_) => bail!("Cannot parse '{}' as integer for parameter '{}'", raw, name),
    }
}

impl BuiltinCommand for Random {
    fn name() -> &'static str {
        "random"
    }

    fn schema() -> &'static [Param] {
        const SCHEMA: &[Param] = &[
            Param::numbered("max", 0, "max", "The maximum allowed value.").optional(),
            Param::numbered("min", 1, "min", "The minimum allowed value.").optional(),
            Param::named("fractions", "f", "fractions", "The number of fractional digits.")
                .optional()
                .typed(ValueType::Integer),
        ];
        SCHEMA
    }

    fn about() -> &'static str {
        "Generate random numbers"
    }

    fn set_property(&mut self, property: &str, value: Value) -> Result<(), BindError> {
        match (property, value) {
            ("max", value) => self.max = value.into_text(),
            ("min", value) => self.min = value.into_text(),
            ("fractions", Value::Integer(n)) => self.fractions = n,
            (property, _) => return Err(unknown(property)),
        }
        Ok(())
    }

    fn execute(&mut self, interp: &mut Interpreter, _ctx: &mut dyn Context) -> Result<CommandResult> {
        let min = parse_bound(&self.min, DEFAULT_MIN, "min")?;
        let max = parse_bound(&self.max, DEFAULT_MAX, "max")?;
        let Ok(digits) = usize::try_from(self.fractions) else {
            bail!("Parameter 'fractions' must not be negative");
        };

        if digits == 0 {
            if min >= max {
                bail!("Parameter 'max' must be greater than 'min'");
            }
            let value = interp.rng().gen_range(min..max);
            return Ok(CommandResult::success(value.to_string()));
        }

        let unit: f64 = interp.rng().gen_range(0.0..1.0);
        let value = min as f64 + (max - min) as f64 * unit;
        Ok(CommandResult::success(format!("{:.*}", digits, value)))
    }

    fn examples(details: &mut HelpDetails) {
        details.add_example("");
        details.add_example("10");
        details.add_example("50 5");
        details.add_example("10 -f 2");
    }
}
