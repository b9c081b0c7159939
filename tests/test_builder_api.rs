use menu_extract::config::{AppConfig, ProviderConfig};
use menu_extract::{AnalysisType, ExtractError, MenuScanner, Provider, StorageBackend};
use mockito::{Matcher, Server};
use serde_json::json;

fn config_for(provider: Provider, base_url: String) -> AppConfig {
    let mut config = AppConfig::default();
    config.providers.insert(
        provider.as_str().to_string(),
        ProviderConfig {
            api_key: Some("test-key".to_string()),
            base_url: Some(base_url),
            ..ProviderConfig::default()
        },
    );
    config
}

fn completion(content: &str) -> String {
    json!({ "choices": [{ "message": { "content": content } }] }).to_string()
}

/// Image URL → items, nothing uploaded
#[tokio::test]
async fn test_builder_image_url_with_groq() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({ "model": "llama-3.2-11b-vision-preview" })),
            Matcher::Regex(r#""image_url":\{"url":"https://img.test/menu.jpg"\}"#.to_string()),
        ]))
        .with_status(200)
        .with_body(completion(
            "```json\n[{\"codigo\": 7, \"name\": \"Feijoada\", \"category\": \"Pratos\", \"price\": \"R$ 49,90\"}]\n```",
        ))
        .create_async()
        .await;

    let result = MenuScanner::builder()
        .image_url("https://img.test/menu.jpg")
        .config(config_for(Provider::Groq, server.url()))
        .build()
        .await
        .unwrap();

    assert_eq!(result.image_url, "https://img.test/menu.jpg");
    assert_eq!(result.items.len(), 1);
    assert_eq!(result.items[0].codigo, "7");
    assert_eq!(result.items[0].price, "R$ 49,90");
    assert_eq!(result.items[0].description, "");
    mock.assert_async().await;
}

/// In-memory bytes → data URL → items, through OpenAI with the invoice prompt
#[tokio::test]
async fn test_builder_image_bytes_inline_with_openai() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_body(Matcher::PartialJson(json!({
            "model": "gpt-4o-mini",
            "response_format": { "type": "json_object" }
        })))
        .with_status(200)
        .with_body(completion(
            r#"{"items": [{"codigo": "A1", "name": "Arroz 5kg", "quantidade": 2, "valor_total": "45.80"}]}"#,
        ))
        .create_async()
        .await;

    let result = MenuScanner::builder()
        .image_bytes("nota.png", vec![0x89, b'P', b'N', b'G'], None)
        .provider(Provider::OpenAI)
        .analysis(AnalysisType::Nfe)
        .storage(StorageBackend::Inline)
        .config(config_for(Provider::OpenAI, server.url()))
        .build()
        .await
        .unwrap();

    assert!(result.image_url.starts_with("data:image/png;base64,"));
    let item = &result.items[0];
    assert_eq!(item.name, "Arroz 5kg");
    assert_eq!(item.extra["quantidade"], json!(2));
    assert_eq!(item.extra["valor_total"], json!("45.80"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_builder_api_key_override() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer override-key")
        .with_status(200)
        .with_body(completion("[]"))
        .create_async()
        .await;

    let result = MenuScanner::builder()
        .image_url("https://img.test/empty.jpg")
        .api_key("override-key")
        .config(config_for(Provider::Groq, server.url()))
        .build()
        .await
        .unwrap();

    assert!(result.items.is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_builder_disabled_provider() {
    let mut config = AppConfig::default();
    config.providers.insert(
        "openai".to_string(),
        ProviderConfig {
            enabled: false,
            api_key: Some("sk-test".to_string()),
            ..ProviderConfig::default()
        },
    );

    let err = MenuScanner::builder()
        .image_url("https://img.test/menu.jpg")
        .provider(Provider::OpenAI)
        .config(config)
        .build()
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractError::ProviderNotConfigured(_)));
}

#[tokio::test]
async fn test_builder_missing_image_file() {
    let err = MenuScanner::builder()
        .image_path("/definitely/not/here/menu.jpg")
        .api_key("gsk_test")
        .storage(StorageBackend::Inline)
        .config(AppConfig::default())
        .build()
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractError::Io(_)));
}

/// Real vendor call; needs GROQ_API_KEY and network access
#[tokio::test]
#[ignore]
async fn test_builder_live_groq() {
    let result = MenuScanner::builder()
        .image_url("https://upload.wikimedia.org/wikipedia/commons/6/6e/Menu_board.jpg")
        .config(AppConfig::default())
        .build()
        .await;

    assert!(result.is_ok());
}
