// Display tokens - what the presentation layer renders for each line

use serde::Serialize;

use crate::record::{EvaluationRecord, LineResult, RecordKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Null,
    Variable,
    Result,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TokenValue {
    Number(f64),
    Text(String),
}

impl TokenValue {
    pub fn empty() -> Self {
        TokenValue::Text(String::new())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayToken {
    #[serde(rename = "type")]
    pub kind: TokenKind,
    pub value: TokenValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl DisplayToken {
    pub fn null() -> Self {
        Self { kind: TokenKind::Null, value: TokenValue::empty(), name: None }
    }

    /// Numeric value of a result token
    pub fn number(&self) -> Option<f64> {
        match (self.kind, &self.value) {
            (TokenKind::Result, TokenValue::Number(n)) => Some(*n),
            _ => None,
        }
    }
}

/// Project records to tokens, lazily and in order
pub fn project(records: &[EvaluationRecord]) -> impl Iterator<Item = DisplayToken> + '_ {
    records.iter().map(project_record)
}

pub fn project_record(record: &EvaluationRecord) -> DisplayToken {
    match &record.kind {
        RecordKind::Blank | RecordKind::Comment => DisplayToken::null(),
        RecordKind::Variable { name } => DisplayToken {
            kind: TokenKind::Variable,
            value: TokenValue::Text(record.raw_text.clone()),
            name: Some(name.clone()),
        },
        RecordKind::Error { message } => DisplayToken {
            kind: TokenKind::Error,
            value: TokenValue::Text(message.clone()),
            name: None,
        },
        RecordKind::Expression => match record.result {
            LineResult::Number(n) if !n.is_nan() => DisplayToken {
                kind: TokenKind::Result,
                value: TokenValue::Number(n),
                name: None,
            },
            LineResult::Number(_) | LineResult::Empty | LineResult::Missing => DisplayToken::null(),
        },
    }
}
