//! Merging AI answers into the document.
//!
//! The AI sees the whole document and answers with one line per input line.
//! An answer is only used for lines the evaluator could not resolve: the
//! answer replaces that input line's text and the full pipeline runs again,
//! so every later position is judged against the refreshed records.

use std::collections::BTreeSet;

use crate::record::EvaluationRecord;

/// True when some non-blank line has no usable result
pub fn needs_ai(records: &[EvaluationRecord]) -> bool {
    records
        .iter()
        .any(|r| !r.is_blank() && !r.result.is_usable())
}

/// Result of a successful merge
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub text: String,
    pub records: Vec<EvaluationRecord>,
    /// Positions whose text came from the AI
    pub overrides: BTreeSet<usize>,
}

/// Number of records the answer lines up with, if any.
///
/// When the counts differ by exactly one and the trailing record has no
/// usable result, that record is ignored and the counts are compared again.
pub fn aligned_len(answer_lines: usize, records: &[EvaluationRecord]) -> Option<usize> {
    let count = records.len();
    if answer_lines == count {
        return Some(count);
    }
    let trailing_unusable = records.last().is_some_and(|r| !r.result.is_usable());
    // An extra trailing record can be dropped; an extra answer line cannot
    if trailing_unusable && answer_lines + 1 == count {
        return Some(count - 1);
    }
    None
}

fn usable_answer(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Splice `answer` into `live_text`.
///
/// `records` must be the current records for `live_text`; `rerun` runs the
/// full pipeline. Returns `None` when the answer does not line up, or when
/// nothing in it was usable.
pub fn merge<F>(
    live_text: &str,
    records: Vec<EvaluationRecord>,
    answer: &str,
    mut rerun: F,
) -> Option<MergeOutcome>
where
    F: FnMut(&str) -> Vec<EvaluationRecord>,
{
    let answer_lines: Vec<&str> = answer.split('\n').collect();
    let Some(len) = aligned_len(answer_lines.len(), &records) else {
        log::debug!(
            "AI answer has {} lines for {} records; discarding",
            answer_lines.len(),
            records.len()
        );
        return None;
    };

    let mut lines: Vec<String> = live_text.split('\n').map(str::to_string).collect();
    let mut records = records;
    let mut overrides = BTreeSet::new();

    for (position, answer_line) in answer_lines.iter().enumerate().take(len) {
        let Some(value) = usable_answer(answer_line) else {
            continue;
        };
        let unresolved = records.get(position).is_some_and(|r| !r.result.is_usable());
        let has_input = lines.get(position).is_some_and(|l| !l.trim().is_empty());
        if !(unresolved && has_input) {
            continue;
        }

        log::debug!("AI answer for line {}: {:?} -> {:?}", position + 1, lines[position], value);
        lines[position] = value.to_string();
        records = rerun(&lines.join("\n"));
        overrides.insert(position);
    }

    if overrides.is_empty() {
        return None;
    }

    log::info!("Merged {} AI answer(s)", overrides.len());
    Some(MergeOutcome { text: lines.join("\n"), records, overrides })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline;
    use crate::record::LineResult;
    use typecalc_engine::Engine;

    fn records(text: &str) -> Vec<EvaluationRecord> {
        pipeline::run(&Engine::new(), text)
    }

    #[test]
    fn test_needs_ai() {
        assert!(!needs_ai(&records("1+2\n\n3")));
        assert!(needs_ai(&records("1+2\nfive apples")));
        assert!(!needs_ai(&records("")));
    }

    #[test]
    fn test_aligned_len() {
        let recs = records("1\ntwo\n");
        assert_eq!(recs.len(), 3);
        assert_eq!(aligned_len(3, &recs), Some(3));
        // Trailing blank record has no result: dropped
        assert_eq!(aligned_len(2, &recs), Some(2));
        assert_eq!(aligned_len(4, &recs), None);
        assert_eq!(aligned_len(1, &recs), None);

        let recs = records("1\ntwo\n3");
        assert_eq!(aligned_len(2, &recs), None);
    }

    #[test]
    fn test_merge_replaces_only_unresolved_lines() {
        let text = "2+1\nfive plus two\ntotal";
        let engine = Engine::new();
        let outcome = merge(text, records(text), "3\n7\n10", |t| pipeline::run(&engine, t)).unwrap();

        assert_eq!(outcome.text, "2+1\n7\ntotal");
        assert_eq!(outcome.overrides, BTreeSet::from([1]));
        assert_eq!(outcome.records[1].result, LineResult::Number(7.0));
        // The total is recomputed by the pipeline, not taken from the answer
        assert_eq!(outcome.records[2].result, LineResult::Number(10.0));
    }

    #[test]
    fn test_merge_skips_blank_inputs_and_empty_answers() {
        let text = "one\n\nthree";
        let engine = Engine::new();
        let outcome = merge(text, records(text), "\n5\n3", |t| pipeline::run(&engine, t)).unwrap();
        assert_eq!(outcome.text, "one\n\n3");
        assert_eq!(outcome.overrides, BTreeSet::from([2]));
    }

    #[test]
    fn test_merge_with_trailing_record_dropped() {
        let text = "ten x two\n";
        let engine = Engine::new();
        let outcome = merge(text, records(text), "20", |t| pipeline::run(&engine, t)).unwrap();
        assert_eq!(outcome.text, "20\n");
        assert_eq!(outcome.records.len(), 2);
    }

    #[test]
    fn test_merge_discards_misaligned_answer() {
        let text = "one\ntwo";
        let mut calls = 0;
        let result = merge(text, records(text), "1\n2\n3\n4", |t| {
            calls += 1;
            records(t)
        });
        assert!(result.is_none());
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_merge_reruns_per_accepted_line() {
        let text = "a = six\na x 2";
        let engine = Engine::new();
        let mut calls = 0;
        let outcome = merge(text, records(text), "a = 6\n12", |t| {
            calls += 1;
            pipeline::run(&engine, t)
        })
        .unwrap();
        // Line 2 resolves after line 1 is fixed, so its answer is not used
        assert_eq!(calls, 1);
        assert_eq!(outcome.text, "a = 6\na x 2");
        assert_eq!(outcome.records[1].result, LineResult::Number(12.0));
    }
}
