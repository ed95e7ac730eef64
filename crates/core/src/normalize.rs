//! Notation normalizer: `x` as a multiplication sign.
//!
//! `2x3`, `2 x 3`, `data x 2` and `3x(1+2)` all use a lower-case `x` as an
//! operator. Each such `x` becomes `*`; the `x` of a hex literal such as
//! `0x90` is left alone. Upper-case `X` is never touched.
//!
//! A single regex scan cannot see every operator in runs like `2x2x2`
//! because matches may not overlap, so the line is scanned a second time.
//! Exactly two passes, never a fixed-point loop.

use regex::Regex;
use std::sync::OnceLock;

/// An operand character, optional whitespace, `x`, then whitespace or a
/// digit/dot; or an operand, `x` and an opening parenthesis.
const X_IN_EXPRESSION: &str = r"[0-9A-Za-z_.)]\s*x(?:\s+|[0-9.])|[0-9.)]\s*x\s*\(";

const HEX_LITERAL: &str = r"\b0x[0-9a-fA-F]+";

fn x_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(X_IN_EXPRESSION).expect("valid regex"))
}

fn hex_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(HEX_LITERAL).expect("valid regex"))
}

/// Normalize every line. Output has the same length as the input.
pub fn convert_x_to_multiplication<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    lines.iter().map(|l| normalize_line(l.as_ref())).collect()
}

pub fn normalize_line(line: &str) -> String {
    let once = replace_pass(line);
    if x_regex().is_match(&once) {
        replace_pass(&once)
    } else {
        once
    }
}

fn replace_pass(line: &str) -> String {
    let mut out = line.to_string();
    for start in operator_starts(line) {
        out = replace_first_x_from(&out, start);
    }
    out
}

/// Start offsets of operator matches, skipping matches that begin a hex
/// literal. A skipped match is rescanned from its next byte so that the
/// literal's last digit can still be the operand of a following `x`.
fn operator_starts(line: &str) -> Vec<usize> {
    let hex_starts: Vec<usize> = hex_regex().find_iter(line).map(|m| m.start()).collect();
    let mut starts = Vec::new();
    let mut pos = 0;
    while let Some(m) = x_regex().find_at(line, pos) {
        if hex_starts.contains(&m.start()) {
            // Hex literals start with ASCII `0`
            pos = m.start() + 1;
        } else {
            starts.push(m.start());
            pos = m.end();
        }
    }
    starts
}

/// Replace the first `x` at or after byte offset `start`.
/// `x` and `*` are both one byte, so later offsets stay valid.
fn replace_first_x_from(line: &str, start: usize) -> String {
    format!("{}{}", &line[..start], line[start..].replacen('x', "*", 1))
}
