//! Data access service tests against a mock backend

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Value, json};
use tca_client::{
    ClientConfig, ClientError, DataService, ErrorKind, LatestRequest, MemoryStorage, Module,
    OccurrenceDraft, OccurrenceType, PageQuery, PortalClient, Suggestion, Ticket,
};
use wiremock::matchers::{body_json, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn setup() -> (MockServer, PortalClient) {
    let server = MockServer::start().await;
    let config = ClientConfig::new(&format!("{}/api", server.uri())).with_timeout_ms(2000);
    let client = PortalClient::with_storage(config, Arc::new(MemoryStorage::new())).unwrap();
    client.session().set_session("tok", "admin", "maria").unwrap();
    (server, client)
}

fn people(range: std::ops::Range<u32>) -> Vec<Value> {
    range
        .map(|i| {
            json!({"id": i, "nome": format!("Aluno {i}"), "cpf": format!("000.000.000-{i:02}")})
        })
        .collect()
}

fn sample_draft() -> OccurrenceDraft {
    OccurrenceDraft {
        student_id: "2023001".to_string(),
        student_name: "Ana Souza".to_string(),
        timestamp: "2026-10-16 09:30:00".to_string(),
        description: "Saiu da sala sem autorização".to_string(),
        occurrence_type: OccurrenceType::Disciplinary,
        responsible_user: "maria".to_string(),
    }
}

// ============== Paged listings ==============

#[tokio::test]
async fn test_fetch_first_page_of_persons() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/dados/pessoa"))
        .and(query_param("page", "1"))
        .and(query_param("limit", "10"))
        .and(query_param_is_missing("search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": people(1..11),
            "pagination": {"currentPage": 1, "totalPages": 3, "totalRecords": 25}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let query = PageQuery::new(Module::Person)
        .with_page(1)
        .with_page_size(10)
        .with_search("");
    let page = client.data().fetch_page(&query).await.unwrap();

    assert_eq!(page.records.len(), 10);
    assert_eq!(page.current_page, 1);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.total_records, 25);
    assert!(page.has_next());
    assert_eq!(page.records[0]["nome"], "Aluno 1");
}

#[tokio::test]
async fn test_fetch_page_sends_trimmed_search() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/dados/matricula"))
        .and(query_param("page", "2"))
        .and(query_param("limit", "5"))
        .and(query_param("search", "Ana"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": people(6..8),
            "pagination": {"currentPage": 2, "totalPages": 2, "totalRecords": 7}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let query = PageQuery::new(Module::Enrollment)
        .with_page(2)
        .with_page_size(5)
        .with_search("  Ana ");
    let page = client.data().fetch_page(&query).await.unwrap();

    assert_eq!(page.records.len(), 2);
    assert!(!page.has_next());
}

#[tokio::test]
async fn test_fetch_page_past_end_is_empty() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/dados/pessoa"))
        .and(query_param("page", "9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [],
            "pagination": {"currentPage": 9, "totalPages": 3, "totalRecords": 25}
        })))
        .mount(&server)
        .await;

    let page = client
        .data()
        .fetch_page(&PageQuery::new(Module::Person).with_page(9))
        .await
        .unwrap();

    assert!(page.is_empty());
    assert_eq!(page.current_page, 9);
    assert_eq!(page.total_records, 25);
}

#[tokio::test]
async fn test_fetch_page_pagination_fallbacks() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/dados/requerimento"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [{"id": 1, "descricao": "Revisão de nota"}]
        })))
        .mount(&server)
        .await;

    let page = client
        .data()
        .fetch_page(&PageQuery::new(Module::Request).with_page(4))
        .await
        .unwrap();

    assert_eq!(page.records.len(), 1);
    assert_eq!(page.current_page, 4);
    assert_eq!(page.total_pages, 1);
    assert_eq!(page.total_records, 0);
}

#[tokio::test]
async fn test_fetch_page_zero_totals_fall_back() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/dados/matricula"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [],
            "pagination": {"currentPage": 0, "totalPages": 0, "totalRecords": 0}
        })))
        .mount(&server)
        .await;

    let page = client
        .data()
        .fetch_page(&PageQuery::new(Module::Enrollment).with_page(2))
        .await
        .unwrap();

    assert_eq!(page.current_page, 2);
    assert_eq!(page.total_pages, 1);
    assert!(!page.has_next());
}

#[tokio::test]
async fn test_fetch_page_keeps_backend_column_order() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/dados/pessoa"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"success":true,"data":[{"nome":"Ana","matricula":"1","cpf":"x"}]}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let page = client
        .data()
        .fetch_page(&PageQuery::new(Module::Person))
        .await
        .unwrap();

    let keys: Vec<&str> = page.records[0].keys().map(String::as_str).collect();
    assert_eq!(keys, ["nome", "matricula", "cpf"]);
}

#[tokio::test]
async fn test_fetch_page_logical_failure() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/dados/notafalta"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Tabela indisponível"
        })))
        .mount(&server)
        .await;

    let err = client
        .data()
        .fetch_page(&PageQuery::new(Module::GradeAbsence))
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::LogicalFailure(ref m) if m == "Tabela indisponível"));
    assert_eq!(err.kind(), ErrorKind::LogicalFailure);
}

#[tokio::test]
async fn test_fetch_page_rejects_zero_page() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client
        .data()
        .fetch_page(&PageQuery::new(Module::Person).with_page(0))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let err = client
        .data()
        .fetch_page(&PageQuery::new(Module::Person).with_page_size(0))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

// ============== Suggestions ==============

#[tokio::test]
async fn test_short_terms_never_reach_backend() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/sugestoes/pessoa"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": []})),
        )
        .expect(0)
        .mount(&server)
        .await;

    for term in ["", "a", "é"] {
        let suggestions = client
            .data()
            .fetch_suggestions(Module::Person, term)
            .await
            .unwrap();
        assert!(suggestions.is_empty());
    }
}

#[tokio::test]
async fn test_suggestions_are_normalized() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/sugestoes/pessoa"))
        .and(query_param("termo", "an"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [
                {"id": 17, "nome": "Ana Souza"},
                {"matricula": "2023002", "nome": "Anderson Lima"},
                {"sem_nome": true}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let suggestions = client
        .data()
        .fetch_suggestions(Module::Person, "an")
        .await
        .unwrap();

    assert_eq!(
        suggestions,
        vec![
            Suggestion {
                id: "17".to_string(),
                label: "Ana Souza".to_string()
            },
            Suggestion {
                id: "2023002".to_string(),
                label: "Anderson Lima".to_string()
            },
        ]
    );
}

async fn fetch_and_show(
    data: &DataService,
    tracker: &LatestRequest,
    ticket: Ticket,
    shown: &Mutex<Vec<Suggestion>>,
) {
    let suggestions = data
        .fetch_suggestions(Module::Person, ticket.term())
        .await
        .unwrap();
    if let Some(fresh) = tracker.accept(&ticket, suggestions) {
        *shown.lock().unwrap() = fresh;
    }
}

#[tokio::test]
async fn test_stale_suggestion_response_is_discarded() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/sugestoes/pessoa"))
        .and(query_param("termo", "an"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "success": true,
                    "data": [{"id": 1, "nome": "Anderson"}, {"id": 2, "nome": "Ana"}]
                }))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/sugestoes/pessoa"))
        .and(query_param("termo", "ana"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [{"id": 2, "nome": "Ana"}]
        })))
        .mount(&server)
        .await;

    let tracker = LatestRequest::new();
    let shown = Mutex::new(Vec::new());

    let first = tracker.issue("an");
    let second = tracker.issue("ana");
    tokio::join!(
        fetch_and_show(client.data(), &tracker, first, &shown),
        fetch_and_show(client.data(), &tracker, second, &shown),
    );

    let shown = shown.into_inner().unwrap();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].label, "Ana");
}

// ============== Aggregated person lookup ==============

#[tokio::test]
async fn test_aggregated_blank_term_is_rejected_locally() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/buscar-tudo"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client
        .data()
        .fetch_aggregated_person("   ")
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::InvalidInput(_)));
}

#[tokio::test]
async fn test_aggregated_no_match_is_logical_failure() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/buscar-tudo"))
        .and(query_param("termo", "12345"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Nenhuma pessoa encontrada para: 12345"
        })))
        .mount(&server)
        .await;

    let err = client
        .data()
        .fetch_aggregated_person("12345")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::LogicalFailure);
    assert_eq!(err.message(), "Nenhuma pessoa encontrada para: 12345");
}

#[tokio::test]
async fn test_aggregated_person_categories() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/buscar-tudo"))
        .and(query_param("termo", "Ana Souza"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "pessoa": [{"id": 17, "nome": "Ana Souza"}],
                "documentos": [{"id": 3, "descricao": "RG"}, {"id": 4, "descricao": "Histórico"}],
                "ocorrencias": [],
                "financeiro": [{"parcela": 1, "valor": 850.0}]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let record = client
        .data()
        .fetch_aggregated_person(" Ana Souza ")
        .await
        .unwrap();

    assert_eq!(record.total_records(), 4);
    assert_eq!(record.get("documentos").len(), 2);
    assert!(record.get("ocorrencias").is_empty());
    assert_eq!(record.get("pessoa")[0]["nome"], "Ana Souza");
}

#[tokio::test]
async fn test_aggregated_null_category_reads_as_empty() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/buscar-tudo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "pessoa": [{"id": 17, "nome": "Ana Souza"}],
                "financeiro": null
            }
        })))
        .mount(&server)
        .await;

    let record = client.data().fetch_aggregated_person("17").await.unwrap();

    assert_eq!(record.total_records(), 1);
    assert_eq!(record.get("pessoa")[0]["nome"], "Ana Souza");
    assert!(record.categories().any(|c| c == "financeiro"));
    assert!(record.get("financeiro").is_empty());
}

// ============== Occurrences ==============

#[tokio::test]
async fn test_create_occurrence_posts_draft() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/ocorrencias"))
        .and(body_json(json!({
            "matricula_aluno": "2023001",
            "nome_aluno": "Ana Souza",
            "data": "2026-10-16 09:30:00",
            "descricao_novo": "Saiu da sala sem autorização",
            "tipo": "Disciplinar",
            "usuario": "maria"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "id": 981,
            "message": "Ocorrência inserida com sucesso"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let created = client
        .data()
        .create_occurrence(&sample_draft())
        .await
        .unwrap();

    assert_eq!(created.id, Some(json!(981)));
    assert_eq!(created.message.as_deref(), Some("Ocorrência inserida com sucesso"));
}

#[tokio::test]
async fn test_create_occurrence_validation_error_is_surfaced() {
    let (server, client) = setup().await;
    let payload = json!({
        "success": false,
        "message": "Tipo de ocorrência inválido",
        "field": "tipo"
    });

    Mock::given(method("POST"))
        .and(path("/api/ocorrencias"))
        .respond_with(ResponseTemplate::new(400).set_body_json(payload.clone()))
        .mount(&server)
        .await;

    let err = client
        .data()
        .create_occurrence(&sample_draft())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    match err {
        ClientError::Http {
            status,
            payload: received,
        } => {
            assert_eq!(status, 400);
            assert_eq!(received, payload);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_create_occurrence_logical_failure() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/ocorrencias"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Aluno não encontrado"
        })))
        .mount(&server)
        .await;

    let err = client
        .data()
        .create_occurrence(&sample_draft())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::LogicalFailure(ref m) if m == "Aluno não encontrado"));
}

#[tokio::test]
async fn test_occurrences_by_student() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/ocorrencia/aluno/2023001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [{"id": 5, "tipo": "Frequência"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let records = client
        .data()
        .occurrences_by_student("2023001")
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["tipo"], "Frequência");
}

// ============== Person lookups ==============

#[tokio::test]
async fn test_person_by_id() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/pessoa/17"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"id": 17, "nome": "Ana Souza"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/pessoa/99"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "success": false,
            "error": "Pessoa não encontrada"
        })))
        .mount(&server)
        .await;

    let person = client.data().person_by_id("17").await.unwrap();
    assert_eq!(person["nome"], "Ana Souza");

    let err = client.data().person_by_id("99").await.unwrap_err();
    assert!(matches!(err, ClientError::Http { status: 404, .. }));
    assert_eq!(err.message(), "Pessoa não encontrada");
}

#[tokio::test]
async fn test_person_exists_and_documents() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/pessoa/17/exists"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "exists": true})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/pessoa/18/exists"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "data": {"exists": false}})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/documento/pessoa/17"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [{"id": 3, "descricao": "RG"}]
        })))
        .mount(&server)
        .await;

    assert!(client.data().person_exists("17").await.unwrap());
    assert!(!client.data().person_exists("18").await.unwrap());

    let documents = client.data().documents_by_person("17").await.unwrap();
    assert_eq!(documents[0]["descricao"], "RG");

    let err = client.data().documents_by_person("").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}
