//! Google Gemini `generateContent` client

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{Generation, ResponseGenerator};
use crate::conversation::{Message, Role};
use crate::{Error, Result};

/// Default Gemini API base URL
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// A role-tagged turn (or the system instruction, which has no role)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    /// `user` or `model`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Content parts
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    fn text(role: Option<&str>, text: &str) -> Self {
        Self {
            role: role.map(ToString::to_string),
            parts: vec![Part {
                text: Some(text.to_string()),
            }],
        }
    }
}

/// A single content part; only text is used
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    /// Text payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Request body for `models/{model}:generateContent`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// Conversation turns, oldest first, ending with the prompt
    pub contents: Vec<Content>,

    /// Persona preamble
    pub system_instruction: Content,
}

/// Response body of `generateContent`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Generated candidates
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

/// One generated candidate
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Generated content (absent when blocked)
    #[serde(default)]
    pub content: Option<Content>,

    /// Why generation stopped
    #[serde(default)]
    pub finish_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate
    #[must_use]
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// Role vocabulary expected by the Gemini API
const fn api_role(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "model",
    }
}

/// Gemini-backed response generator
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    base_url: String,
    system_instruction: String,
}

impl GeminiClient {
    /// Create a client for `model`
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty
    pub fn new(
        api_key: SecretString,
        model: impl Into<String>,
        system_instruction: impl Into<String>,
    ) -> Result<Self> {
        if api_key.expose_secret().trim().is_empty() {
            return Err(Error::Config("API_KEY environment variable not set".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: model.into(),
            base_url: GEMINI_API_BASE.to_string(),
            system_instruction: system_instruction.into(),
        })
    }

    /// Point the client at a different API base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Model identifier
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Build the request body: history, then the prompt as the last user turn
    #[must_use]
    pub fn build_request(&self, prompt: &str, history: &[Message]) -> GenerateContentRequest {
        let contents = history
            .iter()
            .map(|m| Content::text(Some(api_role(m.role())), m.text()))
            .chain(std::iter::once(Content::text(Some("user"), prompt)))
            .collect();

        GenerateContentRequest {
            contents,
            system_instruction: Content::text(None, &self.system_instruction),
        }
    }

    /// Send one generation request
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, a non-success status, or an
    /// empty response
    pub async fn request(&self, prompt: &str, history: &[Message]) -> Result<String> {
        let body = self.build_request(prompt, history);
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        tracing::debug!(
            model = %self.model,
            turns = body.contents.len(),
            "sending generation request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Generation(format!("Gemini API error {status}: {text}")));
        }

        let parsed: GenerateContentResponse = response.json().await?;
        let text = parsed.text();
        if text.is_empty() {
            let reason = parsed
                .candidates
                .first()
                .and_then(|c| c.finish_reason.clone())
                .unwrap_or_else(|| "no candidates".to_string());
            return Err(Error::Generation(format!("empty response from API ({reason})")));
        }

        tracing::debug!(response_len = text.len(), "model responded");
        Ok(text)
    }
}

#[async_trait]
impl ResponseGenerator for GeminiClient {
    async fn generate(&self, prompt: &str, history: &[Message]) -> Generation {
        let generation = Generation::from_result(self.request(prompt, history).await);
        if let Generation::Failed(reason) = &generation {
            tracing::error!(reason = %reason, "Gemini API error");
        }
        generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GeminiClient {
        GeminiClient::new(SecretString::from("test-key"), "gemini-2.5-flash", "Be helpful.")
            .unwrap()
    }

    #[test]
    fn test_rejects_empty_key() {
        let err = GeminiClient::new(SecretString::from(""), "m", "s").err().unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_build_request_maps_roles_and_appends_prompt() {
        let history = vec![
            Message::assistant("Hello! How can I help?"),
            Message::user("Hi"),
            Message::assistant("Hey there"),
        ];
        let request = client().build_request("Tell me about the RV400", &history);

        let roles: Vec<_> = request
            .contents
            .iter()
            .map(|c| c.role.as_deref().unwrap())
            .collect();
        assert_eq!(roles, vec!["model", "user", "model", "user"]);
        assert_eq!(
            request.contents[3].parts[0].text.as_deref(),
            Some("Tell me about the RV400")
        );
        assert_eq!(request.system_instruction.role, None);
        assert_eq!(
            request.system_instruction.parts[0].text.as_deref(),
            Some("Be helpful.")
        );
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let request = client().build_request("hi", &[]);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "Be helpful.");
        assert!(json["systemInstruction"].get("role").is_none());
    }

    #[test]
    fn test_response_text_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"The RV400 "},{"text":"is electric."}]},"finishReason":"STOP"}]}"#,
        )
        .unwrap();
        assert_eq!(response.text(), "The RV400 is electric.");
    }

    #[test]
    fn test_response_without_candidates_is_empty() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        assert_eq!(response.text(), "");
    }
}
