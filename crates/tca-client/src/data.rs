//! Data access service
//!
//! Typed access to the record endpoints: paged module listings, autocomplete
//! suggestions, the aggregated person lookup, occurrence creation and the
//! per-person lookups. Every call is gated by the last health probe result.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::constants::{MIN_SUGGESTION_TERM_CHARS, api_path};
use crate::error::{ClientError, Result};
use crate::health::HealthProbe;
use crate::http::PortalHttpClient;
use crate::model::{
    AggregatedPersonRecord, ApiResponse, CreatedOccurrence, ExistsResponse, Module,
    OccurrenceDraft, PageQuery, PageResult, Record, Suggestion,
};
use crate::suggest::{FieldAdapter, SuggestionAdapter};

pub struct DataService {
    http_client: Arc<PortalHttpClient>,
    health: HealthProbe,
    adapter: Arc<dyn SuggestionAdapter>,
}

impl DataService {
    pub fn new(http_client: Arc<PortalHttpClient>, health: HealthProbe) -> Self {
        Self {
            http_client,
            health,
            adapter: Arc::new(FieldAdapter),
        }
    }

    /// Replace the suggestion field adapter
    pub fn with_adapter(mut self, adapter: Arc<dyn SuggestionAdapter>) -> Self {
        self.adapter = adapter;
        self
    }

    pub fn health(&self) -> &HealthProbe {
        &self.health
    }

    // ============== Module listings ==============

    /// Fetch one page of a module, optionally filtered.
    ///
    /// A blank search term means no filter. Pages past the end are whatever
    /// the backend returns for them, normally an empty record list.
    pub async fn fetch_page(&self, query: &PageQuery) -> Result<PageResult> {
        if query.page == 0 || query.page_size == 0 {
            return Err(ClientError::InvalidInput(format!(
                "page and page size must be positive (page={}, page_size={})",
                query.page, query.page_size
            )));
        }
        self.health.ensure_reachable()?;

        #[derive(Serialize)]
        struct Query<'a> {
            page: u32,
            limit: u32,
            #[serde(skip_serializing_if = "Option::is_none")]
            search: Option<&'a str>,
        }

        let path = format!("{}/{}", api_path::DATA, query.module.as_str());
        debug!(
            "Fetching module {} page {} (limit {}, search {:?})",
            query.module,
            query.page,
            query.page_size,
            query.effective_search()
        );

        let response: ApiResponse<Vec<Record>> = self
            .http_client
            .get_with_query(
                &path,
                &Query {
                    page: query.page,
                    limit: query.page_size,
                    search: query.effective_search(),
                },
            )
            .await?;

        if !response.success {
            return Err(ClientError::LogicalFailure(
                response.failure_message("failed to fetch records"),
            ));
        }

        let pagination = response.pagination.unwrap_or_default();
        let records = response.data.unwrap_or_default();
        debug!("Received {} records from module {}", records.len(), query.module);

        Ok(PageResult {
            records,
            current_page: pagination
                .current_page
                .filter(|&n| n > 0)
                .unwrap_or(query.page),
            total_pages: pagination.total_pages.filter(|&n| n > 0).unwrap_or(1),
            total_records: pagination.total_records.unwrap_or(0),
        })
    }

    // ============== Autocomplete ==============

    /// Suggestions for a partially typed term. Terms shorter than two
    /// characters return nothing without contacting the backend.
    pub async fn fetch_suggestions(&self, module: Module, term: &str) -> Result<Vec<Suggestion>> {
        if term.chars().count() < MIN_SUGGESTION_TERM_CHARS {
            return Ok(Vec::new());
        }
        self.health.ensure_reachable()?;

        #[derive(Serialize)]
        struct Query<'a> {
            termo: &'a str,
        }

        debug!("Fetching suggestions for {} with term {:?}", module, term);
        let path = format!("{}/{}", api_path::SUGGESTIONS, module.as_str());
        let response: ApiResponse<Vec<Value>> = self
            .http_client
            .get_with_query(&path, &Query { termo: term })
            .await?;

        if !response.success {
            return Err(ClientError::LogicalFailure(
                response.failure_message("failed to fetch suggestions"),
            ));
        }

        Ok(response
            .data
            .unwrap_or_default()
            .iter()
            .filter_map(|item| self.adapter.adapt(module, item))
            .collect())
    }

    // ============== Aggregated person lookup ==============

    /// Everything the backend holds for one person, assembled server side
    pub async fn fetch_aggregated_person(&self, term: &str) -> Result<AggregatedPersonRecord> {
        let term = term.trim();
        if term.is_empty() {
            return Err(ClientError::InvalidInput(
                "enter a name or code to search".to_string(),
            ));
        }
        self.health.ensure_reachable()?;

        #[derive(Serialize)]
        struct Query<'a> {
            termo: &'a str,
        }

        debug!("Fetching all data for {:?}", term);
        let response: ApiResponse<AggregatedPersonRecord> = self
            .http_client
            .get_with_query(api_path::SEARCH_ALL, &Query { termo: term })
            .await?;

        if !response.success {
            return Err(ClientError::LogicalFailure(
                response.failure_message("no data found"),
            ));
        }

        let aggregated = response.data.unwrap_or_default();
        debug!(
            "Received {} records across {} categories",
            aggregated.total_records(),
            aggregated.0.len()
        );
        Ok(aggregated)
    }

    // ============== Occurrences ==============

    /// Submit a new occurrence as-is. Field validation belongs to the caller;
    /// backend rejections come back unmodified.
    pub async fn create_occurrence(&self, draft: &OccurrenceDraft) -> Result<CreatedOccurrence> {
        self.health.ensure_reachable()?;

        #[derive(Deserialize)]
        struct CreateResponse {
            #[serde(default)]
            success: bool,
            id: Option<Value>,
            data: Option<Value>,
            message: Option<String>,
            error: Option<String>,
        }

        debug!(
            "Creating {} occurrence for student {}",
            draft.occurrence_type, draft.student_id
        );
        let response: CreateResponse = self
            .http_client
            .post_json(api_path::OCCURRENCES, draft)
            .await?;

        if !response.success {
            return Err(ClientError::LogicalFailure(
                response
                    .message
                    .or(response.error)
                    .unwrap_or_else(|| "failed to create occurrence".to_string()),
            ));
        }

        let id = response.id.or_else(|| {
            response
                .data
                .as_ref()
                .and_then(|d| d.get("id"))
                .cloned()
        });
        Ok(CreatedOccurrence {
            id,
            message: response.message,
        })
    }

    pub async fn occurrences_by_student(&self, student_id: &str) -> Result<Vec<Record>> {
        let student_id = path_id(student_id)?;
        self.record_list(
            &format!("{}/{}", api_path::OCCURRENCES_BY_STUDENT, student_id),
            "failed to fetch occurrences",
        )
        .await
    }

    // ============== Person lookups ==============

    pub async fn person_by_id(&self, id: &str) -> Result<Record> {
        let id = path_id(id)?;
        self.health.ensure_reachable()?;

        let response: ApiResponse<Record> = self
            .http_client
            .get(&format!("{}/{}", api_path::PERSON, id))
            .await?;

        match response {
            ApiResponse {
                success: true,
                data: Some(record),
                ..
            } => Ok(record),
            other => Err(ClientError::LogicalFailure(
                other.failure_message("person not found"),
            )),
        }
    }

    pub async fn person_exists(&self, id: &str) -> Result<bool> {
        let id = path_id(id)?;
        self.health.ensure_reachable()?;

        let response: ExistsResponse = self
            .http_client
            .get(&format!("{}/{}/exists", api_path::PERSON, id))
            .await?;

        if !response.success {
            return Err(ClientError::LogicalFailure(
                response
                    .message
                    .unwrap_or_else(|| "failed to check person".to_string()),
            ));
        }

        let from_data = response.data.as_ref().and_then(|d| {
            d.as_bool()
                .or_else(|| d.get("exists").and_then(Value::as_bool))
        });
        Ok(response.exists.or(from_data).unwrap_or(false))
    }

    pub async fn documents_by_person(&self, person_id: &str) -> Result<Vec<Record>> {
        let person_id = path_id(person_id)?;
        self.record_list(
            &format!("{}/{}", api_path::DOCUMENTS_BY_PERSON, person_id),
            "failed to fetch documents",
        )
        .await
    }

    async fn record_list(&self, path: &str, fallback: &str) -> Result<Vec<Record>> {
        self.health.ensure_reachable()?;

        let response: ApiResponse<Vec<Record>> = self.http_client.get(path).await?;
        if !response.success {
            return Err(ClientError::LogicalFailure(response.failure_message(fallback)));
        }
        Ok(response.data.unwrap_or_default())
    }
}

/// Validate an identifier used as a single path segment
fn path_id(id: &str) -> Result<&str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ClientError::InvalidInput("id must not be empty".to_string()));
    }
    if id.contains(['/', '?', '#']) {
        return Err(ClientError::InvalidInput(format!("invalid id: {id}")));
    }
    Ok(id)
}
