//! OpenAI-compatible client against a local one-shot HTTP server.

use scrivener::error::GenerationFailure;
use scrivener::provider::{
    ChatMessage, CompletionOptions, Credential, GenerationClient, OpenAiCompatibleClient,
    ProviderConfig,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serve exactly one request with `status` and `body`; resolves to the raw request text.
async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}/v1", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut raw = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&raw);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if raw.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        String::from_utf8_lossy(&raw).into_owned()
    });

    (base_url, handle)
}

fn client(base_url: String) -> OpenAiCompatibleClient {
    let config = ProviderConfig {
        base_url,
        request_timeout_secs: 5,
        options: CompletionOptions {
            temperature: Some(0.7),
            max_tokens: None,
        },
        ..ProviderConfig::default()
    };
    OpenAiCompatibleClient::new(&config, Credential::new("sk-forwarded")).unwrap()
}

#[tokio::test]
async fn forwards_model_credential_and_conversation() {
    let (base_url, server) = serve_once(
        "200 OK",
        r#"{"choices":[{"message":{"role":"assistant","content":"Chapter text."}}]}"#,
    )
    .await;

    let text = client(base_url)
        .generate(
            "deepseek-chat",
            vec![ChatMessage::system("be brief"), ChatMessage::user("write")],
        )
        .await
        .unwrap();
    assert_eq!(text, "Chapter text.");

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /v1/chat/completions"));
    let lower = request.to_ascii_lowercase();
    assert!(lower.contains("authorization: bearer sk-forwarded"));

    let body: serde_json::Value =
        serde_json::from_str(request.split("\r\n\r\n").nth(1).unwrap()).unwrap();
    assert_eq!(body["model"], "deepseek-chat");
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["content"], "write");
    assert_eq!(body["stream"], false);
    assert!(body.get("max_tokens").is_none());
}

#[tokio::test]
async fn unauthorized_maps_to_auth_failure() {
    let (base_url, server) = serve_once("401 Unauthorized", r#"{"error":"bad key"}"#).await;
    let result = client(base_url)
        .generate("m", vec![ChatMessage::user("write")])
        .await;
    assert!(matches!(result, Err(GenerationFailure::AuthFailed(_))));
    server.await.unwrap();
}

#[tokio::test]
async fn rate_limit_maps_to_rate_limited() {
    let (base_url, server) = serve_once("429 Too Many Requests", r#"{"error":"slow down"}"#).await;
    let result = client(base_url)
        .generate("m", vec![ChatMessage::user("write")])
        .await;
    assert!(matches!(result, Err(GenerationFailure::RateLimited(_))));
    server.await.unwrap();
}

#[tokio::test]
async fn response_without_choices_is_invalid() {
    let (base_url, server) = serve_once("200 OK", r#"{"choices":[]}"#).await;
    let result = client(base_url)
        .generate("m", vec![ChatMessage::user("write")])
        .await;
    assert!(matches!(result, Err(GenerationFailure::InvalidResponse(_))));
    server.await.unwrap();
}
