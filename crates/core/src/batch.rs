// Batch evaluation with per-line degradation

use typecalc_engine::{MathEvaluator, Value};

use crate::record::LineResult;

/// Evaluate normalized lines. The output always has one entry per line.
///
/// The whole batch is tried first. If any line fails, the batch is rebuilt
/// line by line: each failing line gets `Missing` and is blanked in the
/// working batch so later lines still see every earlier assignment.
pub fn evaluate<E: MathEvaluator + ?Sized>(evaluator: &E, lines: &[String]) -> Vec<LineResult> {
    match evaluator.evaluate_batch(lines) {
        Ok(values) => values.iter().map(project).collect(),
        Err(err) => {
            log::debug!("Batch evaluation failed at {}; evaluating incrementally", err);
            evaluate_incrementally(evaluator, lines)
        }
    }
}

fn evaluate_incrementally<E: MathEvaluator + ?Sized>(
    evaluator: &E,
    lines: &[String],
) -> Vec<LineResult> {
    let mut working: Vec<String> = Vec::with_capacity(lines.len());
    let mut results = Vec::with_capacity(lines.len());

    for (index, line) in lines.iter().enumerate() {
        working.push(line.clone());
        match evaluator.evaluate_batch(&working) {
            Ok(values) => results.push(values.get(index).map_or(LineResult::Empty, project)),
            Err(err) => {
                log::debug!("Couldn't evaluate line {}: {}", index + 1, err.error);
                results.push(LineResult::Missing);
                working[index] = String::new();
            }
        }
    }

    results
}

/// Numeric projection of an evaluator value
fn project(value: &Value) -> LineResult {
    match value.to_number() {
        Some(n) => LineResult::Number(n),
        None => LineResult::Empty,
    }
}
