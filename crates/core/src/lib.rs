//! Calculator pipeline.
//!
//! Text goes through the notation normalizer, the batch evaluator and the
//! keyword post-processor to become one [`EvaluationRecord`] per line;
//! [`projection`] turns records into display tokens. [`currency`] provisions
//! currency units into the evaluator and [`ai_merge`] splices AI answers
//! into lines the evaluator could not resolve. [`Calculator`] drives a
//! session.

pub mod ai_merge;
pub mod batch;
pub mod currency;
pub mod debounce;
pub mod document;
pub mod keywords;
pub mod normalize;
pub mod pipeline;
pub mod projection;
pub mod record;
pub mod session;

pub use currency::{ProvisionReport, FALLBACK_CURRENCY, RATES_CACHE_KEY};
pub use document::{document_title, placeholder_text, Document, DocumentHistory};
pub use normalize::convert_x_to_multiplication;
pub use projection::{DisplayToken, TokenKind, TokenValue};
pub use record::{last_numeric_result, EvaluationRecord, LineResult, RecordKind};
pub use session::{AiProvider, AiState, Calculator};
