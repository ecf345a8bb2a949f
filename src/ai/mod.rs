use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

mod error;
mod tests;

pub use error::AIError;

use crate::config::{AIProvider, Config};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

pub fn build_system_prompt(env_context: &str, listing: &str, history_block: &str) -> String {
    format!(
        "You live in a developer's CLI, helping them convert natural language into shell commands.\n\
         Based on the description of the command given, generate the command. Output only the\n\
         command and nothing else. Make sure to escape characters when appropriate. Do not wrap\n\
         the command in quotes. Do not include any other text in your response, except for the\n\
         command.\n\
         \n\
         --- ENVIRONMENT CONTEXT ---\n\
         {env_context}\n\
         --- END ENVIRONMENT CONTEXT ---\n\
         \n\
         Listing of the working directory:\n\
         {listing}\n\
         {history_block}"
    )
}

/// Ask the configured provider to translate the description into a command.
/// Returns the model's raw text; sanitization happens at the caller.
pub async fn generate_command(
    description: &str,
    system_prompt: &str,
    config: &Config,
) -> Result<String, AIError> {
    match config.ai.provider {
        AIProvider::Anthropic => generate_anthropic(description, system_prompt, config).await,
        AIProvider::OpenAI => generate_openai(description, system_prompt, config).await,
    }
}

async fn generate_anthropic(
    description: &str,
    system_prompt: &str,
    config: &Config,
) -> Result<String, AIError> {
    let api_key = config
        .ai
        .resolve_api_key()
        .ok_or_else(|| AIError::ValidationError("Anthropic API key not configured".to_string()))?;

    let client = reqwest::Client::new();
    let mut headers = HeaderMap::new();
    headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));
    headers.insert(
        "x-api-key",
        HeaderValue::from_str(&api_key)
            .map_err(|e| AIError::ValidationError(format!("Invalid API key: {}", e)))?,
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let api_url = config.ai.api_url.as_deref().unwrap_or(ANTHROPIC_API_URL);
    debug!("requesting command from Anthropic model {}", config.ai.model);

    let response = client
        .post(api_url)
        .headers(headers)
        .json(&json!({
            "model": &config.ai.model,
            "max_tokens": config.ai.max_tokens,
            "system": system_prompt,
            "messages": [
                {
                    "role": "user",
                    "content": format!("Command description: {}", description)
                }
            ]
        }))
        .send()
        .await
        .map_err(|e| AIError::NetworkError(e.to_string()))?;

    match response.status() {
        StatusCode::OK => (),
        StatusCode::TOO_MANY_REQUESTS => {
            return Err(AIError::RateLimitError("Rate limit exceeded".to_string()));
        }
        StatusCode::UNAUTHORIZED => {
            return Err(AIError::AuthenticationError("Invalid API key".to_string()));
        }
        status => {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(AIError::APIError(format!(
                "Unexpected status code: {} - Response: {}",
                status, error_body
            )));
        }
    }

    let body = response
        .text()
        .await
        .map_err(|e| AIError::NetworkError(format!("Failed to read response body: {}", e)))?;

    #[derive(Debug, Deserialize)]
    struct AnthropicResponse {
        #[serde(default)]
        content: Vec<AnthropicContent>,
    }

    #[derive(Debug, Deserialize)]
    struct AnthropicContent {
        #[serde(default)]
        text: String,
    }

    let parsed: AnthropicResponse = serde_json::from_str(&body)
        .map_err(|e| AIError::ParseError(format!("Failed to parse Anthropic response: {}", e)))?;

    let content = parsed
        .content
        .iter()
        .rev()
        .find(|block| !block.text.is_empty())
        .ok_or_else(|| AIError::ParseError("Empty response from Anthropic".to_string()))?;

    Ok(content.text.trim().to_string())
}

async fn generate_openai(
    description: &str,
    system_prompt: &str,
    config: &Config,
) -> Result<String, AIError> {
    let api_key = config
        .ai
        .resolve_api_key()
        .ok_or_else(|| AIError::ValidationError("OpenAI API key not configured".to_string()))?;

    let client = reqwest::Client::new();
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| AIError::ValidationError(format!("Invalid API key: {}", e)))?,
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let api_url = config.ai.api_url.as_deref().unwrap_or(OPENAI_API_URL);
    debug!("requesting command from OpenAI model {}", config.ai.model);

    let response = client
        .post(api_url)
        .headers(headers)
        .json(&json!({
            "model": &config.ai.model,
            "max_tokens": config.ai.max_tokens,
            "messages": [
                {
                    "role": "system",
                    "content": system_prompt
                },
                {
                    "role": "user",
                    "content": format!("Command description: {}", description)
                }
            ]
        }))
        .send()
        .await
        .map_err(|e| AIError::NetworkError(e.to_string()))?;

    match response.status() {
        StatusCode::OK => (),
        StatusCode::TOO_MANY_REQUESTS => {
            return Err(AIError::RateLimitError("Rate limit exceeded".to_string()));
        }
        StatusCode::UNAUTHORIZED => {
            return Err(AIError::AuthenticationError("Invalid API key".to_string()));
        }
        status => {
            return Err(AIError::APIError(format!(
                "Unexpected status code: {}",
                status
            )));
        }
    }

    let body = response
        .text()
        .await
        .map_err(|e| AIError::NetworkError(format!("Failed to read response body: {}", e)))?;

    #[derive(Debug, Deserialize)]
    struct OpenAIResponse {
        #[serde(default)]
        choices: Vec<OpenAIChoice>,
    }

    #[derive(Debug, Deserialize)]
    struct OpenAIChoice {
        message: OpenAIMessage,
    }

    #[derive(Debug, Deserialize)]
    struct OpenAIMessage {
        #[serde(default)]
        content: String,
    }

    let parsed: OpenAIResponse = serde_json::from_str(&body)
        .map_err(|e| AIError::ParseError(format!("Failed to parse OpenAI response: {}", e)))?;

    let choice = parsed
        .choices
        .first()
        .ok_or_else(|| AIError::ParseError("Empty response from OpenAI".to_string()))?;

    Ok(choice.message.content.trim().to_string())
}
