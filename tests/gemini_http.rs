use std::net::TcpListener;

use nutria::credentials::ApiKey;
use nutria::gemini::{AiError, GeminiClient, Generator};
use nutria::prompt::SYSTEM_INSTRUCTION;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ENDPOINT: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

/// The blocking client must not live on an async worker thread.
async fn generate_against(server: &MockServer, prompt: &'static str) -> Result<String, AiError> {
    let base = format!("{}/v1beta", server.uri());
    tokio::task::spawn_blocking(move || {
        let client = GeminiClient::new(ApiKey::new("test-key"), "gemini-2.5-flash", base, None)
            .expect("client builds")
            .with_progress(false);
        client.generate(prompt)
    })
    .await
    .expect("blocking task completes")
}

#[tokio::test(flavor = "multi_thread")]
async fn sends_key_system_instruction_and_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "systemInstruction": { "parts": [{ "text": SYSTEM_INSTRUCTION }] },
            "contents": [{ "role": "user", "parts": [{ "text": "¿Es buena la avena?" }] }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "Sí, " }, { "text": "con moderación." }] },
                "finishReason": "STOP"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let text = generate_against(&server, "¿Es buena la avena?").await.unwrap();
    assert_eq!(text, "Sí, con moderación.");
}

#[tokio::test(flavor = "multi_thread")]
async fn provider_error_is_tagged() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": 403, "message": "Permission denied.", "status": "PERMISSION_DENIED" }
        })))
        .mount(&server)
        .await;

    let err = generate_against(&server, "hola").await.unwrap_err();
    assert_eq!(
        err,
        AiError::Provider {
            status: 403,
            message: "PERMISSION_DENIED: Permission denied.".into()
        }
    );
    assert!(err.user_message().contains("PERMISSION_DENIED"));
}

#[tokio::test(flavor = "multi_thread")]
async fn non_json_success_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
        .mount(&server)
        .await;

    let err = generate_against(&server, "hola").await.unwrap_err();
    assert!(matches!(err, AiError::MalformedResponse(_)), "got {err:?}");
}

/// A port that was bound and released, so connecting to it is refused.
fn closed_local_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    listener.local_addr().expect("local addr").port()
}

#[test]
fn refused_connection_is_transport_error() {
    let base = format!("http://127.0.0.1:{}/v1beta", closed_local_port());
    let err = GeminiClient::new(ApiKey::new("k"), "gemini-2.5-flash", base, None)
        .expect("client builds")
        .with_progress(false)
        .generate("hola")
        .unwrap_err();

    assert!(matches!(err, AiError::Transport(_)), "got {err:?}");
    assert!(err.user_message().starts_with("Ocurrio un error al contactar a la IA: "));
}
