// Per-line evaluation records

use serde::Serialize;

/// What a line is. Rebuilt on every pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RecordKind {
    Expression,
    Variable { name: String },
    Comment,
    Blank,
    Error { message: String },
}

/// Result of one line after numeric projection
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum LineResult {
    Number(f64),
    /// Evaluated, but nothing renderable (blank line, bare unit)
    Empty,
    /// Evaluation failed
    Missing,
}

impl LineResult {
    /// A finite or infinite number; NaN is never usable
    pub fn as_number(&self) -> Option<f64> {
        match self {
            LineResult::Number(n) if !n.is_nan() => Some(*n),
            _ => None,
        }
    }

    pub fn is_usable(&self) -> bool {
        self.as_number().is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationRecord {
    #[serde(flatten)]
    pub kind: RecordKind,
    pub raw_text: String,
    pub result: LineResult,
}

impl EvaluationRecord {
    /// Classify a raw input line
    pub fn new(line: &str, result: LineResult) -> Self {
        let raw_text = line.trim().to_string();
        let kind = if raw_text.is_empty() {
            RecordKind::Blank
        } else if raw_text.starts_with('#') {
            RecordKind::Comment
        } else {
            RecordKind::Expression
        };
        Self { kind, raw_text, result }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self.kind, RecordKind::Blank)
    }
}

/// Result of the last record holding a number
pub fn last_numeric_result(records: &[EvaluationRecord]) -> Option<f64> {
    records.iter().rev().find_map(|r| r.result.as_number())
}
