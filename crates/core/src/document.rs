// Documents: titles, starter text and saved history

use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use typecalc_config::store::{KeyValueStore, StoreError};

const TITLE_MAX_CHARS: usize = 30;
const DOC_ID_LEN: usize = 8;
const DOC_KEY_PREFIX: &str = "doc:";

/// Title for a document: its first line, cut at the last space at or
/// before character 30, or hard-cut at 30 characters when there is none.
pub fn document_title(text: &str) -> String {
    let first_line = text.trim().lines().next().unwrap_or("");
    if first_line.chars().count() <= TITLE_MAX_CHARS {
        return first_line.to_string();
    }

    // One past the limit: a space right after the 30th character counts
    let window: Vec<char> = first_line.chars().take(TITLE_MAX_CHARS + 1).collect();
    let cut = window
        .iter()
        .rposition(|c| *c == ' ')
        .unwrap_or(TITLE_MAX_CHARS);
    window[..cut].iter().collect()
}

/// Starter text when there is no saved document
pub fn placeholder_text(currency_loaded: bool) -> String {
    let mut text = String::from("2+1\n12x3\n3miles to km\ndata = 12\ndata+5\n");
    if currency_loaded {
        text.push_str("10 usd to inr\n");
    }
    text
}

pub fn generate_doc_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(DOC_ID_LEN)
        .map(char::from)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub text: String,
    /// RFC 3339
    pub modified: String,
}

impl Document {
    pub fn new(text: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: generate_doc_id(),
            title: document_title(text),
            text: text.to_string(),
            modified: now.to_rfc3339(),
        }
    }

    fn modified_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.modified)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

/// Saved documents, one store entry per document under `doc:<id>`
pub struct DocumentHistory<'a> {
    store: &'a mut dyn KeyValueStore,
}

impl<'a> DocumentHistory<'a> {
    pub fn new(store: &'a mut dyn KeyValueStore) -> Self {
        Self { store }
    }

    fn key(id: &str) -> String {
        format!("{}{}", DOC_KEY_PREFIX, id)
    }

    pub fn get(&self, id: &str) -> Option<Document> {
        let raw = self.store.get(&Self::key(id))?;
        match serde_json::from_str(&raw) {
            Ok(doc) => Some(doc),
            Err(e) => {
                log::warn!("Ignoring unreadable document {}: {}", id, e);
                None
            }
        }
    }

    /// Insert or replace a document
    pub fn save(&mut self, doc: &Document) -> Result<(), StoreError> {
        let json = serde_json::to_string(doc).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        self.store.set(&Self::key(&doc.id), json)
    }

    /// Update an existing document's text, keeping its id
    pub fn update(&mut self, id: &str, text: &str, now: DateTime<Utc>) -> Result<Document, StoreError> {
        let doc = Document {
            id: id.to_string(),
            title: document_title(text),
            text: text.to_string(),
            modified: now.to_rfc3339(),
        };
        self.save(&doc)?;
        Ok(doc)
    }

    /// All documents, newest first
    pub fn list(&self) -> Vec<Document> {
        let mut docs: Vec<Document> = self
            .store
            .keys()
            .iter()
            .filter_map(|key| key.strip_prefix(DOC_KEY_PREFIX))
            .filter_map(|id| self.get(id))
            .collect();
        docs.sort_by(|a, b| b.modified_at().cmp(&a.modified_at()));
        docs
    }

    pub fn latest(&self) -> Option<Document> {
        self.list().into_iter().next()
    }
}
