// Batch evaluation: an ordered list of lines sharing one variable scope

use std::fmt;

use crate::formula::eval::{eval_statement, EvalError, Scope};
use crate::formula::parser::parse_statement;
use crate::units::{UnitDefinition, UnitError, UnitRegistry};
use crate::value::Value;

/// A batch failed: `line` is the zero-based index of the first bad line
#[derive(Debug, Clone, PartialEq)]
pub struct BatchError {
    pub line: usize,
    pub error: EvalError,
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line + 1, self.error)
    }
}

impl std::error::Error for BatchError {}

/// Unit-aware evaluator contract used by the calculator pipeline.
///
/// `evaluate_batch` is all-or-nothing: any malformed line fails the whole
/// batch. Each call starts from an empty variable scope; registered units
/// persist for the evaluator's lifetime.
pub trait MathEvaluator {
    fn evaluate_batch(&self, lines: &[String]) -> Result<Vec<Value>, BatchError>;

    fn create_unit(&mut self, name: &str, definition: UnitDefinition) -> Result<(), UnitError>;

    fn has_unit(&self, name: &str) -> bool;
}

#[derive(Default)]
pub struct Engine {
    units: UnitRegistry,
}

impl Engine {
    /// Engine with the built-in physical units
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_units(units: UnitRegistry) -> Self {
        Self { units }
    }

    pub fn units(&self) -> &UnitRegistry {
        &self.units
    }

    /// Evaluate a single line with a fresh scope
    pub fn evaluate_line(&self, line: &str) -> Result<Value, EvalError> {
        let stmt = parse_statement(line).map_err(EvalError::Parse)?;
        eval_statement(&stmt, &mut Scope::default(), &self.units)
    }
}

impl MathEvaluator for Engine {
    fn evaluate_batch(&self, lines: &[String]) -> Result<Vec<Value>, BatchError> {
        let mut scope = Scope::default();
        let mut results = Vec::with_capacity(lines.len());

        for (line, text) in lines.iter().enumerate() {
            let stmt = parse_statement(text)
                .map_err(|e| BatchError { line, error: EvalError::Parse(e) })?;
            let value = eval_statement(&stmt, &mut scope, &self.units)
                .map_err(|error| BatchError { line, error })?;
            results.push(value);
        }

        Ok(results)
    }

    fn create_unit(&mut self, name: &str, definition: UnitDefinition) -> Result<(), UnitError> {
        self.units.define(name, definition)
    }

    fn has_unit(&self, name: &str) -> bool {
        self.units.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(src: &[&str]) -> Vec<String> {
        src.iter().map(|s| s.to_string()).collect()
    }

    fn numbers(engine: &Engine, src: &[&str]) -> Vec<Option<f64>> {
        engine
            .evaluate_batch(&lines(src))
            .unwrap()
            .iter()
            .map(Value::to_number)
            .collect()
    }

    #[test]
    fn test_variables_flow_between_lines() {
        let engine = Engine::new();
        let out = numbers(&engine, &["data=9", "data^2.5"]);
        assert_eq!(out[0], Some(9.0));
        assert!((out[1].unwrap() - 243.0).abs() < 1e-9);
    }

    #[test]
    fn test_blank_and_comment_lines_are_empty() {
        let engine = Engine::new();
        let out = engine.evaluate_batch(&lines(&["1+2", "", "# note", "   "])).unwrap();
        assert_eq!(out.len(), 4);
        assert_eq!(out[0], Value::Number(3.0));
        assert!(out[1..].iter().all(Value::is_empty));
    }

    #[test]
    fn test_batch_fails_on_first_bad_line() {
        let engine = Engine::new();
        let err = engine
            .evaluate_batch(&lines(&["1+1", "2 +* 3", "nope"]))
            .unwrap_err();
        assert_eq!(err.line, 1);
        assert!(matches!(err.error, EvalError::Parse(_)));
    }

    #[test]
    fn test_scope_does_not_leak_between_batches() {
        let engine = Engine::new();
        engine.evaluate_batch(&lines(&["a = 5"])).unwrap();
        let err = engine.evaluate_batch(&lines(&["a + 1"])).unwrap_err();
        assert_eq!(err.error, EvalError::UndefinedSymbol("a".into()));
    }

    #[test]
    fn test_created_units_persist() {
        let mut engine = Engine::new();
        engine.create_unit("inr", UnitDefinition::Base).unwrap();
        engine
            .create_unit("usd", UnitDefinition::Scaled { factor: 83.0, unit: "inr".into() })
            .unwrap();
        assert!(engine.has_unit("usd"));

        let out = numbers(&engine, &["10 usd to inr"]);
        assert!((out[0].unwrap() - 830.0).abs() < 1e-9);

        assert_eq!(
            engine.create_unit("usd", UnitDefinition::Base),
            Err(UnitError::AlreadyDefined("usd".into()))
        );
    }

    #[test]
    fn test_evaluate_line() {
        let engine = Engine::new();
        assert_eq!(engine.evaluate_line("2*3"), Ok(Value::Number(6.0)));
        assert!(engine.evaluate_line("").unwrap().is_empty());
    }
}
