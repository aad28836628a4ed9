// Backend API path constants and client defaults

pub mod api_path {
    // Auth
    pub const LOGIN: &str = "/login";
    pub const VERIFY_TOKEN: &str = "/verify-token";
    pub const LOGOUT: &str = "/logout";

    // Health
    pub const HEALTH: &str = "/health";

    // Records
    pub const DATA: &str = "/dados";
    pub const SUGGESTIONS: &str = "/sugestoes";
    pub const SEARCH_ALL: &str = "/buscar-tudo";

    // Occurrences
    pub const OCCURRENCES: &str = "/ocorrencias";
    pub const OCCURRENCES_BY_STUDENT: &str = "/ocorrencia/aluno";

    // Person lookups
    pub const PERSON: &str = "/pessoa";
    pub const DOCUMENTS_BY_PERSON: &str = "/documento/pessoa";
}

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Shorter terms never reach the backend.
pub const MIN_SUGGESTION_TERM_CHARS: usize = 2;
pub const SUGGESTION_DEBOUNCE_MS: u64 = 300;

// Durable session keys
pub const TOKEN_KEY: &str = "token";
pub const ROLE_KEY: &str = "role";
pub const USERNAME_KEY: &str = "username";

pub const ADMIN_ROLE: &str = "admin";
pub const SESSION_FILE_NAME: &str = "session.json";
