// Running-total keywords

use crate::record::LineResult;

/// Lines that show the running total of everything above them
pub const TOTAL_KEYWORDS: &[&str] = &["total", "sum", "="];

pub fn is_total_keyword(input: &str) -> bool {
    let word = input.trim().to_lowercase();
    TOTAL_KEYWORDS.contains(&word.as_str())
}

/// Replace keyword lines with the running total.
///
/// One left-to-right pass; a line's own number is added before its keyword
/// is checked. The total is never reset and a substituted total counts as a
/// number itself, so a second `total` includes the first one's value.
/// Mismatched lengths or empty input return `outputs` untouched.
pub fn apply<S: AsRef<str>>(inputs: &[S], outputs: Vec<LineResult>) -> Vec<LineResult> {
    if inputs.is_empty() || inputs.len() != outputs.len() {
        return outputs;
    }

    let mut total = 0.0;
    outputs
        .into_iter()
        .zip(inputs)
        .map(|(output, input)| {
            if let LineResult::Number(n) = output {
                total += n;
            }
            if is_total_keyword(input.as_ref()) {
                let running = total;
                total += running;
                LineResult::Number(running)
            } else {
                output
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use LineResult::{Empty, Number};

    #[test]
    fn test_total_after_numbers() {
        assert_eq!(
            apply(&["2", "5", "total", "3"], vec![Number(2.0), Number(5.0), Empty, Number(3.0)]),
            vec![Number(2.0), Number(5.0), Number(7.0), Number(3.0)]
        );
        assert_eq!(
            apply(&["2", "=", "3"], vec![Number(2.0), Empty, Number(3.0)]),
            vec![Number(2.0), Number(2.0), Number(3.0)]
        );
    }

    #[test]
    fn test_total_is_cumulative() {
        let out = apply(
            &["1", "SUM ", "2", "total"],
            vec![Number(1.0), LineResult::Missing, Number(2.0), LineResult::Missing],
        );
        assert_eq!(out, vec![Number(1.0), Number(1.0), Number(2.0), Number(4.0)]);
    }

    #[test]
    fn test_second_total_includes_first() {
        let out = apply(
            &["2", "5", "total", "3", "total"],
            vec![Number(2.0), Number(5.0), Empty, Number(3.0), Empty],
        );
        assert_eq!(out[2], Number(7.0));
        assert_eq!(out[4], Number(17.0));
    }

    #[test]
    fn test_noop_cases() {
        let outputs = vec![Number(2.0), Number(5.0)];
        assert_eq!(apply::<&str>(&[], outputs.clone()), outputs);
        assert_eq!(apply(&["2", "sum", "3"], outputs.clone()), outputs);
    }
}
