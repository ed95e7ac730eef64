// One full evaluation pass: text -> lines -> records

use typecalc_engine::MathEvaluator;

use crate::batch;
use crate::keywords;
use crate::normalize::convert_x_to_multiplication;
use crate::record::EvaluationRecord;

/// Split, normalize, evaluate and post-process `text`.
/// Always returns one record per `\n`-separated line.
pub fn run<E: MathEvaluator + ?Sized>(evaluator: &E, text: &str) -> Vec<EvaluationRecord> {
    let lines: Vec<&str> = text.split('\n').collect();
    let normalized = convert_x_to_multiplication(&lines);
    let results = keywords::apply(&lines, batch::evaluate(evaluator, &normalized));

    lines
        .iter()
        .zip(results)
        .map(|(line, result)| EvaluationRecord::new(line, result))
        .collect()
}
