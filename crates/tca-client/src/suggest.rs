//! Autocomplete helpers
//!
//! - [`SuggestionAdapter`]: maps per-module backend fields onto [`Suggestion`]
//! - [`Debouncer`]: waits for keystrokes to settle before a fetch is issued
//! - [`LatestRequest`]: drops responses that were overtaken by a newer request
//!
//! Debouncing and discarding are caller policies; the data service itself
//! issues one request per call.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::watch;

use crate::constants::SUGGESTION_DEBOUNCE_MS;
use crate::model::{Module, Suggestion};

const ID_FIELDS: &[&str] = &["id", "matricula", "codigo", "cpf"];
const NAME_FIELDS: &[&str] = &["nome", "nome_aluno", "descricao", "titulo"];
const DESCRIPTION_FIELDS: &[&str] = &["descricao", "titulo", "tipo", "nome"];

/// Maps one backend suggestion item to the normalized shape
pub trait SuggestionAdapter: Send + Sync {
    fn adapt(&self, module: Module, item: &Value) -> Option<Suggestion>;
}

/// Default adapter: person-like modules are labelled by name, the others by
/// description, each falling back to the other field family.
#[derive(Clone, Copy, Debug, Default)]
pub struct FieldAdapter;

impl FieldAdapter {
    fn label_fields(module: Module) -> &'static [&'static str] {
        match module {
            Module::Person | Module::Enrollment | Module::GradeAbsence | Module::Financial => {
                NAME_FIELDS
            }
            Module::Document | Module::Certificate | Module::Occurrence | Module::Request => {
                DESCRIPTION_FIELDS
            }
        }
    }
}

impl SuggestionAdapter for FieldAdapter {
    fn adapt(&self, module: Module, item: &Value) -> Option<Suggestion> {
        match item {
            Value::String(s) if !s.trim().is_empty() => Some(Suggestion {
                id: s.clone(),
                label: s.clone(),
            }),
            Value::Object(_) => {
                let label = first_text(item, Self::label_fields(module))?;
                let id = first_text(item, ID_FIELDS).unwrap_or_else(|| label.clone());
                Some(Suggestion { id, label })
            }
            _ => None,
        }
    }
}

fn first_text(item: &Value, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|field| match item.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Emits a term once it has stayed unchanged for the debounce delay
pub struct Debouncer {
    input: watch::Receiver<String>,
    delay: Duration,
}

impl Debouncer {
    pub fn new(input: watch::Receiver<String>, delay: Duration) -> Self {
        Self { input, delay }
    }

    pub fn with_default_delay(input: watch::Receiver<String>) -> Self {
        Self::new(input, Duration::from_millis(SUGGESTION_DEBOUNCE_MS))
    }

    /// Wait for the next settled term. Returns `None` once the input side is
    /// closed and no change is pending.
    pub async fn next(&mut self) -> Option<String> {
        self.input.changed().await.ok()?;

        loop {
            match tokio::time::timeout(self.delay, self.input.changed()).await {
                // another keystroke restarts the window
                Ok(Ok(())) => continue,
                Ok(Err(_)) | Err(_) => return Some(self.input.borrow_and_update().clone()),
            }
        }
    }
}

/// Ticket identifying one issued request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ticket {
    seq: u64,
    term: String,
}

impl Ticket {
    pub fn term(&self) -> &str {
        &self.term
    }
}

/// Last-request-wins bookkeeping for out-of-order responses
#[derive(Clone, Default)]
pub struct LatestRequest {
    latest: Arc<AtomicU64>,
}

impl LatestRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new request for `term`; every earlier ticket becomes stale
    pub fn issue(&self, term: &str) -> Ticket {
        let seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        Ticket {
            seq,
            term: term.to_string(),
        }
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.seq
    }

    /// Hand back `value` only if no newer request has been issued
    pub fn accept<T>(&self, ticket: &Ticket, value: T) -> Option<T> {
        self.is_current(ticket).then_some(value)
    }
}
