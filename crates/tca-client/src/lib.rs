//! TCA Client - data-access client for the TCA academic records backend
//!
//! This crate provides:
//! - HTTP client with bearer authentication and failure classification
//! - Session store over pluggable durable storage
//! - Auth, data access and health services
//! - Autocomplete helpers (field adapters, debouncing, stale response discard)

pub mod auth;
pub mod client;
pub mod config;
pub mod constants;
pub mod data;
pub mod error;
pub mod health;
pub mod http;
pub mod model;
pub mod session;
pub mod suggest;

pub use auth::AuthService;
pub use client::PortalClient;
pub use config::ClientConfig;
pub use data::DataService;
pub use error::{ClientError, ErrorKind, LoginError};
pub use health::HealthProbe;
pub use http::{AuthMode, PortalHttpClient};
pub use model::{
    AggregatedPersonRecord, CreatedOccurrence, Module, OccurrenceDraft, OccurrenceType, PageQuery,
    PageResult, Reachability, Record, Role, Session, Suggestion,
};
pub use session::{FileStorage, MemoryStorage, SessionStorage, SessionStore};
pub use suggest::{Debouncer, FieldAdapter, LatestRequest, SuggestionAdapter, Ticket};
