// AI fallback call policy
//
// Decides whether a document is worth sending to the AI endpoint. The
// endpoint is only called for text that plausibly contains words; pure
// arithmetic is always left to the local evaluator.

use std::time::Duration;

use crate::settings::Settings;

/// Punctuation accepted by the "nothing but numbers and symbols" rule
const SYMBOL_CHARS: &str = "!@#$%^&*()_+-=[]{};':\"\\|,.<>/?";

/// Why an input was not sent to the AI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Empty,
    TooShort,
    TooLong,
    Whitespace,
    NumbersAndSymbols,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::Empty => "input is empty",
            Rejection::TooShort => "input is too short",
            Rejection::TooLong => "input is too long",
            Rejection::Whitespace => "input contains only whitespace",
            Rejection::NumbersAndSymbols => "input contains only numbers, spaces and symbols",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AiPolicy {
    pub enabled: bool,
    pub min_chars: usize,
    pub max_chars: usize,
    pub debounce: Duration,
}

impl Default for AiPolicy {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl AiPolicy {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            enabled: settings.ai_enabled && settings.ai_endpoint.is_some(),
            min_chars: settings.ai_min_chars,
            max_chars: settings.ai_max_chars,
            debounce: Duration::from_millis(settings.ai_debounce_ms),
        }
    }

    /// Check `input` against the call rules, in order
    pub fn check(&self, input: &str) -> Result<(), Rejection> {
        if input.is_empty() {
            return Err(Rejection::Empty);
        }
        let len = input.chars().count();
        if len < self.min_chars {
            return Err(Rejection::TooShort);
        }
        if len > self.max_chars {
            return Err(Rejection::TooLong);
        }
        if input.trim().is_empty() {
            return Err(Rejection::Whitespace);
        }
        let numbers_and_symbols = input
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_whitespace() || SYMBOL_CHARS.contains(c));
        if numbers_and_symbols {
            return Err(Rejection::NumbersAndSymbols);
        }
        Ok(())
    }

    pub fn can_call(&self, input: &str) -> bool {
        self.check(input).is_ok()
    }
}
