//! Domain and wire model types
//!
//! Records coming from the backend are flat JSON objects whose columns differ
//! per module, so they are kept as [`Record`] maps rather than typed structs.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::constants::{ADMIN_ROLE, DEFAULT_PAGE_SIZE};
use crate::error::ClientError;

/// One backend row: field name to scalar value
pub type Record = Map<String, Value>;

/// Backend resource collections
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Module {
    #[serde(rename = "pessoa")]
    Person,
    #[serde(rename = "documento")]
    Document,
    #[serde(rename = "certificado")]
    Certificate,
    #[serde(rename = "ocorrencia")]
    Occurrence,
    #[serde(rename = "notafalta")]
    GradeAbsence,
    #[serde(rename = "requerimento")]
    Request,
    #[serde(rename = "matricula")]
    Enrollment,
    #[serde(rename = "financeiro")]
    Financial,
}

impl Module {
    pub const ALL: [Module; 8] = [
        Module::Person,
        Module::Document,
        Module::Certificate,
        Module::Occurrence,
        Module::GradeAbsence,
        Module::Request,
        Module::Enrollment,
        Module::Financial,
    ];

    /// Path segment used by the backend for this module
    pub fn as_str(&self) -> &'static str {
        match self {
            Module::Person => "pessoa",
            Module::Document => "documento",
            Module::Certificate => "certificado",
            Module::Occurrence => "ocorrencia",
            Module::GradeAbsence => "notafalta",
            Module::Request => "requerimento",
            Module::Enrollment => "matricula",
            Module::Financial => "financeiro",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Module::Person => "Pessoa",
            Module::Document => "Documento",
            Module::Certificate => "Certificado",
            Module::Occurrence => "Ocorrência",
            Module::GradeAbsence => "Nota/Falta",
            Module::Request => "Requerimento",
            Module::Enrollment => "Matrícula",
            Module::Financial => "Financeiro",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Module::Person => "Dados pessoais dos usuários",
            Module::Document => "Documentos acadêmicos",
            Module::Certificate => "Certificados emitidos",
            Module::Occurrence => "Histórico de ocorrências",
            Module::GradeAbsence => "Notas e faltas dos alunos",
            Module::Request => "Solicitações acadêmicas",
            Module::Enrollment => "Dados de matrícula",
            Module::Financial => "Informações financeiras",
        }
    }

    /// Financial data is only listed for administrators. The backend must
    /// enforce the same rule; this only drives what is offered.
    pub fn is_visible_to(&self, role: Role) -> bool {
        match self {
            Module::Financial => role == Role::Admin,
            _ => true,
        }
    }

    pub fn visible_to(role: Role) -> Vec<Module> {
        Self::ALL
            .into_iter()
            .filter(|m| m.is_visible_to(role))
            .collect()
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Module {
    type Err = ClientError;

    /// Accepts the backend identifier or the English name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let module = match s.trim().to_ascii_lowercase().as_str() {
            "pessoa" | "person" => Module::Person,
            "documento" | "document" => Module::Document,
            "certificado" | "certificate" => Module::Certificate,
            "ocorrencia" | "occurrence" => Module::Occurrence,
            "notafalta" | "grade-absence" | "grades" => Module::GradeAbsence,
            "requerimento" | "request" => Module::Request,
            "matricula" | "enrollment" => Module::Enrollment,
            "financeiro" | "financial" => Module::Financial,
            other => {
                return Err(ClientError::InvalidInput(format!("unknown module: {other}")));
            }
        };
        Ok(module)
    }
}

/// Interpreted user role
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Admin,
    Standard,
}

impl Role {
    pub fn from_name(name: &str) -> Self {
        if name == ADMIN_ROLE {
            Role::Admin
        } else {
            Role::Standard
        }
    }
}

/// An authenticated session. Role and username are kept exactly as the
/// backend returned them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Session {
    #[serde(skip_serializing)]
    pub token: String,
    pub role: String,
    pub username: String,
}

impl Session {
    pub fn role_kind(&self) -> Role {
        Role::from_name(&self.role)
    }

    pub fn is_admin(&self) -> bool {
        self.role_kind() == Role::Admin
    }
}

/// Paged, optionally filtered retrieval request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageQuery {
    pub module: Module,
    /// 1-based page number
    pub page: u32,
    pub page_size: u32,
    pub search_term: Option<String>,
}

impl PageQuery {
    pub fn new(module: Module) -> Self {
        Self {
            module,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            search_term: None,
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search_term = Some(term.into());
        self
    }

    /// Search term to send, `None` when absent or blank
    pub fn effective_search(&self) -> Option<&str> {
        self.search_term
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// One page of records
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    pub records: Vec<Record>,
    pub current_page: u32,
    pub total_pages: u32,
    pub total_records: u64,
}

impl PageResult {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }
}

/// Normalized autocomplete entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: String,
    pub label: String,
}

/// Everything the backend knows about one person, by category
/// (e.g. "pessoa", "documentos", "ocorrencias", "financeiro").
/// A category sent as `null` reads as empty.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AggregatedPersonRecord(pub BTreeMap<String, Vec<Record>>);

impl<'de> Deserialize<'de> for AggregatedPersonRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, Option<Vec<Record>>>::deserialize(deserializer)?;
        Ok(Self(
            raw.into_iter()
                .map(|(category, records)| (category, records.unwrap_or_default()))
                .collect(),
        ))
    }
}

impl AggregatedPersonRecord {
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn get(&self, category: &str) -> &[Record] {
        self.0.get(category).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn total_records(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }
}

/// Fixed set of occurrence categories accepted by the backend
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OccurrenceType {
    #[serde(rename = "Disciplinar")]
    Disciplinary,
    #[serde(rename = "Acadêmica")]
    Academic,
    #[serde(rename = "Financeira")]
    Financial,
    #[serde(rename = "Administrativa")]
    Administrative,
    #[serde(rename = "Comportamental")]
    Behavioral,
    #[serde(rename = "Frequência")]
    Attendance,
    #[serde(rename = "Avaliação")]
    Evaluation,
    #[serde(rename = "Outros")]
    Other,
}

impl OccurrenceType {
    pub const ALL: [OccurrenceType; 8] = [
        OccurrenceType::Disciplinary,
        OccurrenceType::Academic,
        OccurrenceType::Financial,
        OccurrenceType::Administrative,
        OccurrenceType::Behavioral,
        OccurrenceType::Attendance,
        OccurrenceType::Evaluation,
        OccurrenceType::Other,
    ];

    /// Label sent to and shown by the backend
    pub fn label(&self) -> &'static str {
        match self {
            OccurrenceType::Disciplinary => "Disciplinar",
            OccurrenceType::Academic => "Acadêmica",
            OccurrenceType::Financial => "Financeira",
            OccurrenceType::Administrative => "Administrativa",
            OccurrenceType::Behavioral => "Comportamental",
            OccurrenceType::Attendance => "Frequência",
            OccurrenceType::Evaluation => "Avaliação",
            OccurrenceType::Other => "Outros",
        }
    }
}

impl fmt::Display for OccurrenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OccurrenceType {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| {
                t.label().to_lowercase() == wanted || format!("{t:?}").to_lowercase() == wanted
            })
            .ok_or_else(|| ClientError::InvalidInput(format!("unknown occurrence type: {s}")))
    }
}

/// A new occurrence as submitted by the form. Field names on the wire are
/// the ones the backend reads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OccurrenceDraft {
    #[serde(rename = "matricula_aluno")]
    pub student_id: String,
    #[serde(rename = "nome_aluno")]
    pub student_name: String,
    #[serde(rename = "data")]
    pub timestamp: String,
    #[serde(rename = "descricao_novo")]
    pub description: String,
    #[serde(rename = "tipo")]
    pub occurrence_type: OccurrenceType,
    #[serde(rename = "usuario")]
    pub responsible_user: String,
}

impl OccurrenceDraft {
    /// Current UTC time in the backend's `YYYY-MM-DD HH:MM:SS` format
    pub fn now_timestamp() -> String {
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Success marker returned by occurrence creation
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CreatedOccurrence {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Liveness as last observed by the health probe
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Reachability {
    #[default]
    Unknown,
    Reachable,
    Unreachable,
}

// ============================================================================
// Wire envelopes
// ============================================================================

/// Generic backend response; absent `success` counts as failure
#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub error: Option<String>,
    pub pagination: Option<Pagination>,
}

impl<T> ApiResponse<T> {
    pub fn failure_message(&self, fallback: &str) -> String {
        self.message
            .clone()
            .or_else(|| self.error.clone())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| fallback.to_string())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Pagination {
    pub current_page: Option<u32>,
    pub total_pages: Option<u32>,
    pub total_records: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    #[serde(default)]
    pub success: bool,
    pub token: Option<String>,
    pub role: Option<String>,
    pub username: Option<String>,
    pub message: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExistsResponse {
    #[serde(default)]
    pub success: bool,
    pub exists: Option<bool>,
    pub data: Option<Value>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}
