#[cfg(test)]
mod tests {
    use crate::ai::{generate_command, build_system_prompt, AIError};
    use crate::config::{AIConfig, AIProvider, Config, ContextConfig};
    use mockito::{Server, ServerGuard};
    use serde_json::json;

    async fn setup_anthropic(server: &ServerGuard) -> Config {
        Config {
            ai: AIConfig {
                provider: AIProvider::Anthropic,
                model: "claude-test".to_string(),
                max_tokens: 256,
                anthropic_api_key: Some("test_key".to_string()),
                openai_api_key: None,
                api_url: Some(format!("{}/v1/messages", server.url())),
            },
            context: ContextConfig::default(),
        }
    }

    async fn setup_openai(server: &ServerGuard) -> Config {
        Config {
            ai: AIConfig {
                provider: AIProvider::OpenAI,
                model: "gpt-test".to_string(),
                max_tokens: 256,
                anthropic_api_key: None,
                openai_api_key: Some("test_key".to_string()),
                api_url: Some(format!("{}/v1/chat/completions", server.url())),
            },
            context: ContextConfig::default(),
        }
    }

    #[tokio::test]
    async fn test_anthropic_returns_raw_content() {
        let mut server = Server::new_async().await;
        let config = setup_anthropic(&server).await;

        let mock = server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "content": [{ "type": "text", "text": "ls -la" }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let result = generate_command("list files", "system prompt", &config).await;
        assert_eq!(result.unwrap(), "ls -la");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_anthropic_rate_limit_maps_to_error() {
        let mut server = Server::new_async().await;
        let config = setup_anthropic(&server).await;

        let mock = server
            .mock("POST", "/v1/messages")
            .with_status(429)
            .create_async()
            .await;

        let result = generate_command("list files", "system prompt", &config).await;
        assert!(matches!(result, Err(AIError::RateLimitError(_))));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_anthropic_unauthorized_maps_to_error() {
        let mut server = Server::new_async().await;
        let config = setup_anthropic(&server).await;

        let mock = server
            .mock("POST", "/v1/messages")
            .with_status(401)
            .create_async()
            .await;

        let result = generate_command("list files", "system prompt", &config).await;
        assert!(matches!(result, Err(AIError::AuthenticationError(_))));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_anthropic_malformed_body_is_parse_error() {
        let mut server = Server::new_async().await;
        let config = setup_anthropic(&server).await;

        let mock = server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("not json at all")
            .create_async()
            .await;

        let result = generate_command("list files", "system prompt", &config).await;
        assert!(matches!(result, Err(AIError::ParseError(_))));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_anthropic_empty_content_is_parse_error() {
        let mut server = Server::new_async().await;
        let config = setup_anthropic(&server).await;

        let mock = server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "content": [] }).to_string())
            .create_async()
            .await;

        let result = generate_command("list files", "system prompt", &config).await;
        assert!(matches!(result, Err(AIError::ParseError(_))));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_openai_returns_raw_content() {
        let mut server = Server::new_async().await;
        let config = setup_openai(&server).await;

        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "choices": [{ "message": { "role": "assistant", "content": "git status" } }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let result = generate_command("show repo state", "system prompt", &config).await;
        assert_eq!(result.unwrap(), "git status");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_api_key_is_validation_error() {
        let config = Config {
            ai: AIConfig {
                provider: AIProvider::Anthropic,
                model: "claude-test".to_string(),
                max_tokens: 256,
                anthropic_api_key: None,
                openai_api_key: None,
                api_url: Some("http://127.0.0.1:1/unused".to_string()),
            },
            context: ContextConfig::default(),
        };

        // Only meaningful when the environment does not provide a key.
        if std::env::var("ANTHROPIC_API_KEY").is_err() {
            let result = generate_command("list files", "system prompt", &config).await;
            assert!(matches!(result, Err(AIError::ValidationError(_))));
        }
    }

    #[test]
    fn test_system_prompt_includes_context_sections() {
        let prompt = build_system_prompt("OS: linux", "Cargo.toml\nsrc/", "\n--- RECENT COMMANDS ---\n1. ls\n");
        assert!(prompt.contains("--- ENVIRONMENT CONTEXT ---"));
        assert!(prompt.contains("OS: linux"));
        assert!(prompt.contains("Cargo.toml"));
        assert!(prompt.contains("--- RECENT COMMANDS ---"));
        assert!(prompt.contains("Output only the"));
    }
}
