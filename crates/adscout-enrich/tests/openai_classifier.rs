use adscout_enrich::{ChatPrompt, Classifier, EnrichError, OpenAiClassifier};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn classifier(server: &MockServer) -> OpenAiClassifier {
    OpenAiClassifier::new("sk-test", 5)
        .expect("client builds")
        .with_base_url(&server.uri())
        .with_model("test-model")
}

fn prompt() -> ChatPrompt {
    ChatPrompt {
        system: "classify".to_owned(),
        user: "HEADLINE: Buy now".to_owned(),
        max_tokens: 2000,
        temperature: 0.3,
    }
}

#[tokio::test]
async fn sends_chat_completion_and_returns_first_choice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "max_tokens": 2000,
            "messages": [
                {"role": "system", "content": "classify"},
                {"role": "user", "content": "HEADLINE: Buy now"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [
                {"message": {"role": "assistant", "content": "{\"hookType\":\"urgency\"}"}}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let text = classifier(&server).complete(&prompt()).await.unwrap();
    assert_eq!(text, "{\"hookType\":\"urgency\"}");
}

#[tokio::test]
async fn non_success_status_carries_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let err = classifier(&server).complete(&prompt()).await.unwrap_err();
    match err {
        EnrichError::Api { status, body } => {
            assert_eq!(status, 429);
            assert_eq!(body, "rate limited");
        }
        other => panic!("expected Api error, got {other}"),
    }
}

#[tokio::test]
async fn empty_choices_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let err = classifier(&server).complete(&prompt()).await.unwrap_err();
    assert!(matches!(err, EnrichError::EmptyResponse));
}

#[tokio::test]
async fn null_content_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": null}}]
        })))
        .mount(&server)
        .await;

    let err = classifier(&server).complete(&prompt()).await.unwrap_err();
    assert!(matches!(err, EnrichError::EmptyResponse));
}

#[tokio::test]
async fn trailing_slash_in_base_url_is_ignored() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "ok"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenAiClassifier::new("sk-test", 5)
        .unwrap()
        .with_base_url(&format!("{}/", server.uri()));
    assert_eq!(client.complete(&prompt()).await.unwrap(), "ok");
}
