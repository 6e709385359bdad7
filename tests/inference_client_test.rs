//! Integration tests for the inference service client
//!
//! These tests run against a local mock HTTP server and verify that:
//! - Well-formed replies are parsed into suspects
//! - Malformed replies degrade to an empty batch instead of an error
//! - Authentication and server failures surface as typed errors

use claimsync::adapters::inference::InferenceClient;
use claimsync::config::schema::InferenceConfig;
use claimsync::config::secret_string;
use claimsync::domain::{InferenceError, SyncError};
use serde_json::json;

fn config(endpoint: &str) -> InferenceConfig {
    InferenceConfig {
        endpoint: endpoint.to_string(),
        api_key: secret_string("sk-test".to_string()),
        model: "gpt-4o-mini".to_string(),
        timeout_seconds: 5,
        batch_size: 4,
    }
}

fn chat_reply(content: &str) -> String {
    json!({
        "choices": [
            {"message": {"role": "assistant", "content": content}}
        ]
    })
    .to_string()
}

fn staged_documents() -> Vec<serde_json::Value> {
    vec![json!({
        "memberId": "10001",
        "eligibility": {"planCode": "HMO-A"},
        "medicalClaims": [{"Diagnosis_1": "E11.9"}],
        "pharmacyClaims": [{"ndc": "0002-1433-80", "drugName": "TRULICITY"}],
    })]
}

#[tokio::test]
async fn test_infer_suspects_parses_valid_reply() {
    let mut server = mockito::Server::new_async().await;

    let suspects = json!([{
        "memberId": "10001",
        "suspectType": "undiagnosed",
        "suspectDiagnosis": {
            "code": "E11.9",
            "description": "Type 2 diabetes mellitus without complications",
            "hccCategory": "HCC 19"
        },
        "confidenceScore": 0.87,
        "priority": "high",
        "evidence": {
            "summary": "GLP-1 agonist fill without a diabetes diagnosis",
            "details": ["TRULICITY 30-day supply"]
        },
        "suggestedAction": "Chart review"
    }]);

    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer sk-test")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(chat_reply(&suspects.to_string()))
        .create_async()
        .await;

    let client = InferenceClient::new(config(&server.url())).unwrap();
    let result = client.infer_suspects(&staged_documents()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].member_id, "10001");
    assert_eq!(result[0].suspect_diagnosis.code, "E11.9");
    assert_eq!(result[0].priority, "high");
}

#[tokio::test]
async fn test_infer_suspects_malformed_reply_yields_empty_batch() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(chat_reply("I could not find any suspects."))
        .create_async()
        .await;

    let client = InferenceClient::new(config(&server.url())).unwrap();
    let result = client.infer_suspects(&staged_documents()).await.unwrap();

    mock.assert_async().await;
    assert!(result.is_empty());
}

#[tokio::test]
async fn test_infer_suspects_skips_nonconforming_elements() {
    let mut server = mockito::Server::new_async().await;

    // One valid suspect next to one junk element
    let body = json!([
        {"unexpected": "shape"},
        {
            "memberId": "10002",
            "suspectType": "undocumented",
            "suspectDiagnosis": {"code": "I10", "description": "Essential hypertension", "hccCategory": "None"},
            "confidenceScore": 0.61,
            "priority": "medium",
            "evidence": {"summary": "Lisinopril fill", "details": []},
            "suggestedAction": "Confirm with provider"
        }
    ]);

    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(chat_reply(&body.to_string()))
        .create_async()
        .await;

    let client = InferenceClient::new(config(&server.url())).unwrap();
    let result = client.infer_suspects(&staged_documents()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].member_id, "10002");
}

#[tokio::test]
async fn test_infer_suspects_authentication_failure() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(401)
        .with_body("unauthorized")
        .create_async()
        .await;

    let client = InferenceClient::new(config(&server.url())).unwrap();
    let err = client
        .infer_suspects(&staged_documents())
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert!(matches!(
        err,
        SyncError::Inference(InferenceError::AuthenticationFailed(_))
    ));
}

#[tokio::test]
async fn test_infer_suspects_server_error() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(503)
        .with_body("service unavailable")
        .create_async()
        .await;

    let client = InferenceClient::new(config(&server.url())).unwrap();
    let err = client
        .infer_suspects(&staged_documents())
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert!(matches!(
        err,
        SyncError::Inference(InferenceError::ServerError { status: 503, .. })
    ));
}

#[tokio::test]
async fn test_infer_suspects_empty_input_skips_request() {
    // No server at all: an empty batch must never hit the network
    let client = InferenceClient::new(config("http://127.0.0.1:1")).unwrap();
    let result = client.infer_suspects(&[]).await.unwrap();
    assert!(result.is_empty());
}
