//! Calculator session driver.
//!
//! Owns the evaluator, the current text revision and its records, the AI
//! debounce timer and the in-flight AI request. It is the only mutator of
//! session state. Evaluation is synchronous; the AI request runs on a
//! background thread and reports back over a channel that `poll` drains.
//!
//! Every edit starts a new revision: the timer is rescheduled, any in-flight
//! request is dropped (its answer is discarded), the attempted flag and the
//! override set are cleared.

use std::collections::BTreeSet;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use typecalc_config::ai::AiPolicy;
use typecalc_engine::MathEvaluator;
use typecalc_providers::{AiClient, ProviderError};

use crate::ai_merge;
use crate::debounce::{Clock, Debouncer, RealClock};
use crate::pipeline;
use crate::projection::{self, DisplayToken};
use crate::record::{self, EvaluationRecord};

/// Blocking AI completion. Called from a background thread.
pub trait AiProvider: Send + Sync {
    fn complete(&self, input: &str) -> Result<String, ProviderError>;
}

impl AiProvider for AiClient {
    fn complete(&self, input: &str) -> Result<String, ProviderError> {
        AiClient::complete(self, input)
    }
}

/// Where the current revision is in the AI fallback cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiState {
    /// Nothing pending for this revision
    Idle,
    /// Records are current; an AI call is waiting for the debounce timer
    Evaluated,
    /// Request in flight
    Requesting,
}

type AiReply = Result<String, ProviderError>;

pub struct Calculator<E: MathEvaluator, C: Clock = RealClock> {
    evaluator: E,
    clock: C,
    ai: Option<Arc<dyn AiProvider>>,
    policy: AiPolicy,
    text: String,
    records: Vec<EvaluationRecord>,
    overrides: BTreeSet<usize>,
    ai_attempted: bool,
    debounce: Debouncer,
    in_flight: Option<Receiver<AiReply>>,
    saved_calls: u64,
}

impl<E: MathEvaluator> Calculator<E, RealClock> {
    pub fn new(evaluator: E) -> Self {
        Self::with_clock(evaluator, RealClock)
    }
}

impl<E: MathEvaluator, C: Clock> Calculator<E, C> {
    pub fn with_clock(evaluator: E, clock: C) -> Self {
        let policy = AiPolicy::default();
        let records = pipeline::run(&evaluator, "");
        Self {
            evaluator,
            clock,
            ai: None,
            debounce: Debouncer::new(policy.debounce),
            policy,
            text: String::new(),
            records,
            overrides: BTreeSet::new(),
            ai_attempted: false,
            in_flight: None,
            saved_calls: 0,
        }
    }

    /// Enable the AI fallback
    pub fn with_ai(mut self, provider: Arc<dyn AiProvider>, policy: AiPolicy) -> Self {
        self.debounce = Debouncer::new(policy.debounce);
        self.policy = policy;
        self.ai = Some(provider);
        self
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    pub fn evaluator_mut(&mut self) -> &mut E {
        &mut self.evaluator
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn records(&self) -> &[EvaluationRecord] {
        &self.records
    }

    pub fn tokens(&self) -> Vec<DisplayToken> {
        projection::project(&self.records).collect()
    }

    /// Line positions whose value came from the AI in this revision
    pub fn overrides(&self) -> &BTreeSet<usize> {
        &self.overrides
    }

    pub fn last_numeric_result(&self) -> Option<f64> {
        record::last_numeric_result(&self.records)
    }

    pub fn ai_state(&self) -> AiState {
        if self.in_flight.is_some() {
            AiState::Requesting
        } else if self.debounce.is_pending() {
            AiState::Evaluated
        } else {
            AiState::Idle
        }
    }

    /// AI calls skipped because every line already had a result
    pub fn saved_calls(&self) -> u64 {
        self.saved_calls
    }

    /// New revision of the document
    pub fn set_text(&mut self, text: &str) {
        if text == self.text {
            return;
        }

        self.text = text.to_string();
        self.debounce.cancel();
        if self.in_flight.take().is_some() {
            log::debug!("Edit superseded the in-flight AI request");
        }
        self.ai_attempted = false;
        self.overrides.clear();

        self.evaluate();
        self.check_ai();
    }

    /// Re-run the pipeline on the current text (e.g. after adding units)
    pub fn evaluate(&mut self) {
        self.records = pipeline::run(&self.evaluator, &self.text);
    }

    fn check_ai(&mut self) {
        if self.ai.is_none() || !self.policy.enabled || self.ai_attempted {
            return;
        }
        if !ai_merge::needs_ai(&self.records) {
            self.saved_calls += 1;
            log::debug!("Every line has a result; AI call saved ({} so far)", self.saved_calls);
            return;
        }
        if let Err(reason) = self.policy.check(&self.text) {
            log::debug!("Not calling AI: {}", reason.as_str());
            return;
        }
        self.debounce.schedule(self.clock.now());
    }

    /// Advance timers and drain the AI channel. Returns true when the
    /// records changed.
    pub fn poll(&mut self) -> bool {
        if self.debounce.fire(self.clock.now()) {
            self.start_request();
        }

        let Some(rx) = &self.in_flight else {
            return false;
        };
        match rx.try_recv() {
            Ok(reply) => {
                self.in_flight = None;
                self.apply_reply(reply)
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => {
                self.in_flight = None;
                false
            }
        }
    }

    /// Skip the debounce delay and wait up to `timeout` for the AI answer.
    /// For non-interactive use. Returns true when the records changed.
    pub fn flush_ai(&mut self, timeout: Duration) -> bool {
        if self.debounce.flush() {
            self.start_request();
        }

        let Some(rx) = self.in_flight.take() else {
            return false;
        };
        match rx.recv_timeout(timeout) {
            Ok(reply) => self.apply_reply(reply),
            Err(RecvTimeoutError::Timeout) => {
                log::warn!("AI request timed out after {:?}", timeout);
                false
            }
            Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    fn start_request(&mut self) {
        let Some(provider) = self.ai.clone() else {
            return;
        };
        if self.ai_attempted {
            return;
        }
        self.ai_attempted = true;

        let (tx, rx) = mpsc::channel();
        let input = self.text.clone();
        thread::spawn(move || {
            // Receiver is gone when the revision was superseded
            let _ = tx.send(provider.complete(&input));
        });
        self.in_flight = Some(rx);
        log::debug!("AI request sent ({} chars)", self.text.chars().count());
    }

    fn apply_reply(&mut self, reply: AiReply) -> bool {
        let answer = match reply {
            Ok(answer) => answer,
            Err(e) => {
                log::info!("Assuming no response from AI: {}", e);
                return false;
            }
        };

        // Merge against the live text and its current records
        let evaluator = &self.evaluator;
        let outcome = ai_merge::merge(&self.text, self.records.clone(), &answer, |text| {
            pipeline::run(evaluator, text)
        });

        match outcome {
            Some(outcome) => {
                self.text = outcome.text;
                self.records = outcome.records;
                self.overrides.extend(outcome.overrides);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debounce::tests::MockClock;
    use crate::projection::{TokenKind, TokenValue};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use typecalc_engine::Engine;

    /// Held until the test releases it; signals once the answer is ready
    struct Gate {
        release: mpsc::Receiver<()>,
        answered: mpsc::Sender<()>,
    }

    /// Answers from a script and counts calls
    struct ScriptedAi {
        answer: AiReply,
        gate: Mutex<Option<Gate>>,
        calls: AtomicUsize,
        inputs: Mutex<Vec<String>>,
    }

    impl ScriptedAi {
        fn new(answer: AiReply) -> Arc<Self> {
            Arc::new(Self {
                answer,
                gate: Mutex::new(None),
                calls: AtomicUsize::new(0),
                inputs: Mutex::new(Vec::new()),
            })
        }

        /// Blocks the first call until `release` is sent; `answered` fires
        /// once that call has its answer.
        fn gated(answer: AiReply) -> (Arc<Self>, mpsc::Sender<()>, mpsc::Receiver<()>) {
            let (release_tx, release_rx) = mpsc::channel();
            let (answered_tx, answered_rx) = mpsc::channel();
            let ai = Self::new(answer);
            *ai.gate.lock().unwrap() = Some(Gate { release: release_rx, answered: answered_tx });
            (ai, release_tx, answered_rx)
        }
    }

    impl AiProvider for ScriptedAi {
        fn complete(&self, input: &str) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inputs.lock().unwrap().push(input.to_string());
            let gate = self.gate.lock().unwrap().take();
            if let Some(gate) = gate {
                let _ = gate.release.recv();
                let _ = gate.answered.send(());
            }
            self.answer.clone()
        }
    }

    fn policy() -> AiPolicy {
        AiPolicy { enabled: true, min_chars: 5, max_chars: 1000, debounce: Duration::from_millis(3000) }
    }

    fn calculator(ai: Arc<ScriptedAi>) -> (Calculator<Engine, MockClock>, MockClock) {
        let clock = MockClock::new();
        let calc = Calculator::with_clock(Engine::new(), clock.clone()).with_ai(ai, policy());
        (calc, clock)
    }

    fn wait_for_reply(calc: &mut Calculator<Engine, MockClock>) -> bool {
        for _ in 0..500 {
            if calc.poll() {
                return true;
            }
            if calc.ai_state() == AiState::Idle {
                return false;
            }
            thread::sleep(Duration::from_millis(2));
        }
        false
    }

    #[test]
    fn test_end_to_end_tokens() {
        let mut calc = Calculator::new(Engine::new());
        calc.set_text("2+1");
        let tokens = calc.tokens();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Result);
        assert_eq!(tokens[0].value, TokenValue::Number(3.0));

        calc.set_text("data=10\n+10-1\ndata +2.5-0.50\n=");
        let fourth = calc.tokens()[3].number().unwrap();
        assert!((fourth - 31.0).abs() < 1e-9);
    }

    #[test]
    fn test_repeated_passes_are_deterministic() {
        let text = "a = 3 km\na to m\nfoo bar\n\n# note\n2x3\ntotal";
        let mut calc = Calculator::new(Engine::new());
        calc.set_text(text);
        let first = calc.tokens();
        calc.evaluate();
        assert_eq!(calc.tokens(), first);

        let mut other = Calculator::new(Engine::new());
        other.set_text(text);
        assert_eq!(other.tokens(), first);
    }

    #[test]
    fn test_ai_skipped_when_everything_resolves() {
        let ai = ScriptedAi::new(Ok("unused".into()));
        let (mut calc, clock) = calculator(ai.clone());
        calc.set_text("2+1\n3x4");
        assert_eq!(calc.ai_state(), AiState::Idle);
        assert_eq!(calc.saved_calls(), 1);

        clock.advance(Duration::from_secs(10));
        assert!(!calc.poll());
        assert_eq!(ai.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_ai_policy_blocks_symbol_only_input() {
        let ai = ScriptedAi::new(Ok("1".into()));
        let (mut calc, _clock) = calculator(ai);
        calc.set_text("2 +* 3");
        assert_eq!(calc.ai_state(), AiState::Idle);
    }

    #[test]
    fn test_ai_fires_after_debounce_and_merges() {
        let ai = ScriptedAi::new(Ok("3\n8".into()));
        let (mut calc, clock) = calculator(ai.clone());
        calc.set_text("2+1\nfive plus three");
        assert_eq!(calc.ai_state(), AiState::Evaluated);

        clock.advance(Duration::from_millis(2999));
        assert!(!calc.poll());
        assert_eq!(ai.calls.load(Ordering::SeqCst), 0);

        clock.advance(Duration::from_millis(1));
        assert!(wait_for_reply(&mut calc));
        assert_eq!(ai.calls.load(Ordering::SeqCst), 1);
        assert_eq!(ai.inputs.lock().unwrap()[0], "2+1\nfive plus three");
        assert_eq!(calc.text(), "2+1\n8");
        assert_eq!(calc.overrides(), &BTreeSet::from([1]));
        assert_eq!(calc.tokens()[1].number(), Some(8.0));
    }

    #[test]
    fn test_edits_collapse_into_one_call() {
        let ai = ScriptedAi::new(Ok("x\ny".into()));
        let (mut calc, clock) = calculator(ai.clone());
        calc.set_text("one apple");
        clock.advance(Duration::from_millis(1000));
        calc.poll();
        calc.set_text("one apple\ntwo pears");
        clock.advance(Duration::from_millis(2000));
        calc.poll();
        assert_eq!(ai.calls.load(Ordering::SeqCst), 0);

        clock.advance(Duration::from_millis(1000));
        wait_for_reply(&mut calc);
        assert_eq!(ai.calls.load(Ordering::SeqCst), 1);
        assert_eq!(ai.inputs.lock().unwrap()[0], "one apple\ntwo pears");
    }

    #[test]
    fn test_one_request_per_revision() {
        let ai = ScriptedAi::new(Err(ProviderError::Http(500, String::new())));
        let (mut calc, clock) = calculator(ai.clone());
        calc.set_text("seven dwarfs");
        clock.advance(Duration::from_secs(3));
        assert!(!wait_for_reply(&mut calc));

        // Same revision: no second attempt
        calc.set_text("seven dwarfs");
        calc.evaluate();
        clock.advance(Duration::from_secs(3));
        assert!(!calc.poll());
        assert_eq!(ai.calls.load(Ordering::SeqCst), 1);
        assert!(calc.tokens().iter().all(|t| t.kind == TokenKind::Null));

        // A real edit starts a new revision
        calc.set_text("seven dwarfs!");
        clock.advance(Duration::from_secs(3));
        wait_for_reply(&mut calc);
        assert_eq!(ai.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_edit_discards_in_flight_answer() {
        let (ai, release, answered) = ScriptedAi::gated(Ok("42".into()));
        let (mut calc, clock) = calculator(ai.clone());
        calc.set_text("the answer");
        clock.advance(Duration::from_secs(3));
        calc.poll();
        assert_eq!(calc.ai_state(), AiState::Requesting);

        calc.set_text("2+2");
        assert_eq!(calc.ai_state(), AiState::Idle);
        release.send(()).unwrap();
        answered.recv().unwrap();
        assert!(!calc.poll());
        assert_eq!(ai.calls.load(Ordering::SeqCst), 1);
        assert_eq!(calc.text(), "2+2");
        assert!(calc.overrides().is_empty());
    }

    #[test]
    fn test_flush_ai_skips_debounce() {
        let ai = ScriptedAi::new(Ok("5".into()));
        let (mut calc, _clock) = calculator(ai);
        calc.set_text("two plus three");
        assert!(calc.flush_ai(Duration::from_secs(5)));
        assert_eq!(calc.last_numeric_result(), Some(5.0));
    }
}
