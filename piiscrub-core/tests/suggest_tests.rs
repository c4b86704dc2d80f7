// piiscrub-core/tests/suggest_tests.rs
use mockito::Matcher;

use piiscrub_core::suggest::{SuggestClient, SuggestConfig};
use piiscrub_core::{suggestions_to_rules, ScrubError};

fn gemini_body(answer: &str) -> String {
    serde_json::json!({
        "candidates": [{ "content": { "parts": [{ "text": answer }], "role": "model" } }]
    })
    .to_string()
}

fn client(server: &mockito::Server) -> SuggestClient {
    SuggestClient::new(SuggestConfig::new("test-key").with_base_url(server.url())).unwrap()
}

#[test]
fn suggest_parses_fenced_model_answer() {
    let mut server = mockito::Server::new();
    let answer = "```json\n[{\"entity_name\": \"EMPLOYEE_ID\", \"patterns\": [\"EMP-\\\\d{4}-\\\\d{3}\"], \"context\": [\"employee\"], \"score\": 0.8}]\n```";
    let mock = server
        .mock("POST", "/v1beta/models/gemini-2.0-flash:generateContent")
        .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
        .match_body(Matcher::Regex("EMP-2024-789".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(gemini_body(answer))
        .create();

    let suggestions = client(&server).suggest("Their employee ID is EMP-2024-789").unwrap();
    mock.assert();

    assert_eq!(suggestions.len(), 1);
    let rules = suggestions_to_rules(&suggestions);
    assert_eq!(rules[0].name, "llm_employee_id");
    assert_eq!(rules[0].patterns[0].regex, r"EMP-\d{4}-\d{3}");
    assert_eq!(rules[0].context, vec!["employee".to_string()]);
}

#[test]
fn non_success_status_is_a_request_error() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("POST", Matcher::Any)
        .with_status(403)
        .with_body("API key not valid")
        .create();

    let err = client(&server).suggest("anything").unwrap_err();
    match err {
        ScrubError::SuggestRequest(message) => assert!(message.contains("403")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn empty_candidates_is_a_parse_error() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("POST", Matcher::Any)
        .with_status(200)
        .with_body(r#"{"candidates": []}"#)
        .create();

    assert!(matches!(client(&server).suggest("anything"), Err(ScrubError::SuggestParse(_))));
}

#[test]
fn missing_api_key_is_reported() {
    std::env::remove_var("GEMINI_API_KEY");
    assert!(matches!(SuggestConfig::from_env(), Err(ScrubError::MissingApiKey(var)) if var == "GEMINI_API_KEY"));
}
