// Output rendering: side-by-side text and JSON tokens

use typecalc_core::{DisplayToken, EvaluationRecord, TokenKind, TokenValue};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Widest input column before lines are cut
const MAX_INPUT_WIDTH: usize = 48;
const MAX_FRACTION_DIGITS: usize = 15;

/// en-US style: grouped integer part, at most 15 fraction digits
pub(crate) fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "∞".to_string() } else { "-∞".to_string() };
    }

    let mut plain = n.abs().to_string();
    if let Some(dot) = plain.find('.') {
        if plain.len() - dot - 1 > MAX_FRACTION_DIGITS {
            plain = format!("{:.*}", MAX_FRACTION_DIGITS, n.abs());
        }
    }
    let (int_part, frac_part) = match plain.split_once('.') {
        Some((i, f)) => (i, f.trim_end_matches('0')),
        None => (plain.as_str(), ""),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let negative = n < 0.0 && (grouped != "0" || !frac_part.is_empty());
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

/// What goes in the result column for one token
pub(crate) fn token_text(token: &DisplayToken) -> String {
    match (&token.kind, &token.value) {
        (TokenKind::Null, _) => String::new(),
        (TokenKind::Error, _) => "error".to_string(),
        (_, TokenValue::Number(n)) => format_number(*n),
        (_, TokenValue::Text(text)) => text.clone(),
    }
}

fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Cut `s` to `width` display columns, marking the cut with ".."
fn fit(s: &str, width: usize) -> String {
    if display_width(s) <= width {
        return s.to_string();
    }
    let budget = width.saturating_sub(2);
    let mut used = 0;
    let mut out = String::new();
    for ch in s.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push_str("..");
    out
}

/// Input lines on the left, results right-aligned on the right.
/// Lines without a result are printed as-is.
pub(crate) fn render_text(records: &[EvaluationRecord], tokens: &[DisplayToken]) -> String {
    let inputs: Vec<String> = records.iter().map(|r| fit(&r.raw_text, MAX_INPUT_WIDTH)).collect();
    let results: Vec<String> = tokens.iter().map(token_text).collect();

    let input_width = inputs
        .iter()
        .zip(&results)
        .filter(|(_, result)| !result.is_empty())
        .map(|(input, _)| display_width(input))
        .max()
        .unwrap_or(0);
    let result_width = results.iter().map(|r| display_width(r)).max().unwrap_or(0);

    let mut out = String::new();
    for (input, result) in inputs.iter().zip(&results) {
        if result.is_empty() {
            out.push_str(input.trim_end());
        } else {
            let pad = input_width - display_width(input);
            let lead = result_width - display_width(result);
            out.push_str(input);
            out.push_str(&" ".repeat(pad + 3 + lead));
            out.push_str(result);
        }
        out.push('\n');
    }
    out
}

pub(crate) fn render_json(tokens: &[DisplayToken]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use typecalc_core::LineResult;

    #[test]
    fn format_number_grouping() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(1234.5), "1,234.5");
        assert_eq!(format_number(-1234567.0), "-1,234,567");
        assert_eq!(format_number(100000.0), "100,000");
        assert_eq!(format_number(0.1 + 0.2), "0.3");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(f64::INFINITY), "∞");
    }

    #[test]
    fn format_number_fraction_limit() {
        assert_eq!(format_number(1.0 / 3.0), "0.333333333333333");
        assert_eq!(format_number(2.5e-16), "0");
    }

    #[test]
    fn text_columns_align() {
        let records = vec![
            EvaluationRecord::new("2+1", LineResult::Number(3.0)),
            EvaluationRecord::new("# total below", LineResult::Empty),
            EvaluationRecord::new("1000 x 3", LineResult::Number(3000.0)),
        ];
        let tokens: Vec<_> = typecalc_core::projection::project(&records).collect();
        let text = render_text(&records, &tokens);
        let expected = format!("2+1{}3\n# total below\n1000 x 3   3,000\n", " ".repeat(12));
        assert_eq!(text, expected);
    }

    #[test]
    fn long_input_is_cut() {
        let long = "a".repeat(60);
        let cut = fit(&long, 10);
        assert_eq!(cut, "aaaaaaaa..");
        assert_eq!(display_width(&cut), 10);
    }
}
