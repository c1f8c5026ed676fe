//! OpenAI-backed event extractor.
//!
//! Talks to the chat-completions REST API directly via `reqwest`.
//! The response is expected to be a JSON object with an `events`
//! array; individual records that fail to parse are dropped with a
//! warning so one malformed record cannot suppress a page's
//! legitimate events.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::{ExtractError, ExtractResult};
use crate::traits::{EventExtractor, ExtractionContext};
use crate::types::EventDraft;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const MAX_CONTENT_CHARS: usize = 12_000;

/// Event extractor backed by the OpenAI chat-completions API.
pub struct OpenAiExtractor {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiExtractor {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Create from the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> ExtractResult<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ExtractError::Config("OPENAI_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Override the model (default `gpt-4o-mini`).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the base URL (for proxies or compatible endpoints).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Parse the model's response text into drafts.
    ///
    /// Handles markdown fence wrapping; a record that fails to
    /// deserialize is skipped, not fatal.
    fn parse_response(text: &str) -> ExtractResult<Vec<EventDraft>> {
        let cleaned = strip_markdown_fences(text);

        let payload: ExtractionPayload =
            serde_json::from_str(&cleaned).map_err(|e| ExtractError::UnparseableResponse {
                reason: format!("response is not an events object: {e}"),
            })?;

        let mut drafts = Vec::with_capacity(payload.events.len());
        for (index, value) in payload.events.into_iter().enumerate() {
            match serde_json::from_value::<EventDraft>(value) {
                Ok(draft) => drafts.push(draft),
                Err(e) => {
                    warn!(index, error = %e, "Dropping malformed event record");
                }
            }
        }
        Ok(drafts)
    }
}

#[derive(Deserialize)]
struct ExtractionPayload {
    #[serde(default)]
    events: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[async_trait]
impl EventExtractor for OpenAiExtractor {
    async fn extract(
        &self,
        content: &str,
        ctx: &ExtractionContext<'_>,
    ) -> ExtractResult<Vec<EventDraft>> {
        let content = truncate_content(content);
        let prompt = extraction_prompt(ctx.artist, ctx.source_url, content);

        debug!(
            url = %ctx.source_url,
            model = %self.model,
            content_chars = content.len(),
            "Requesting event extraction"
        );

        let body = json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": "You extract event information from Japanese entertainment content. Respond only with valid JSON.",
                },
                { "role": "user", "content": prompt },
            ],
            "temperature": 0.1,
            "max_tokens": 2000,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ExtractError::Api(Box::new(e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ExtractError::Api(
                format!("chat completions returned {status}: {detail}").into(),
            ));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ExtractError::Api(Box::new(e)))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ExtractError::UnparseableResponse {
                reason: "no completion choices in response".into(),
            })?;

        Self::parse_response(&text)
    }
}

/// Cut oversized pages down before prompting.
fn truncate_content(content: &str) -> &str {
    match content.char_indices().nth(MAX_CONTENT_CHARS) {
        Some((byte_idx, _)) => &content[..byte_idx],
        None => content,
    }
}

/// Drop markdown code-fence lines the model sometimes wraps JSON in.
fn strip_markdown_fences(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    trimmed
        .lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn extraction_prompt(artist: &str, source_url: &str, content: &str) -> String {
    format!(
        r#"Given the following content from {source_url}, extract any time-bound events related to the artist "{artist}".

Each event needs:
- event_type: one of live, release, lottery, sale, broadcast, streaming, screening, other
- title: event title in the original language
- date: ISO format (YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS); for lottery/sale this is the APPLICATION period start, not the concert date
- end_date: end of a multi-day event or application period (optional)
- venue, location: for live events (optional)
- action_required: true if the user must act; action_deadline and a SPECIFIC action_description when so
- event_url, ticket_url: if present (optional)

Ticket phases (lottery, sale) are CHILDREN of their parent concert. For them also set:
- parent_title: the EXACT title of the parent concert (which must be extracted as its own "live" event)
- ticket_requirement: cd (CD先行/シリアル先行/BD先行), fc (FC先行/ファンクラブ先行), playguide (プレイガイド先行/e+先行), none (一般発売/一般販売), or other
- ticket_priority: fastest (最速先行/1次先行), secondary (2次先行), tertiary (3次先行), general (一般発売), or other
- ticket_requirement_detail: for cd requirements, the specific product and edition carrying the serial code

A concert may run several phases with different requirements; emit a separate event for each. For standalone events leave the ticket fields null.

Content to analyze:
---
{content}
---

Respond ONLY with a JSON object, no markdown:
{{"events": [...]}}

If no events are found, respond with: {{"events": []}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response_plain_json() {
        let text = r#"{"events": [{"event_type": "live", "title": "9th LIVE", "date": "2026-07-18"}]}"#;
        let drafts = OpenAiExtractor::parse_response(text).unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].title, "9th LIVE");
    }

    #[test]
    fn test_parse_response_strips_fences() {
        let text = "```json\n{\"events\": [{\"event_type\": \"live\", \"title\": \"Fest\", \"date\": \"2026-07-18\"}]}\n```";
        let drafts = OpenAiExtractor::parse_response(text).unwrap();
        assert_eq!(drafts.len(), 1);
    }

    #[test]
    fn test_parse_response_drops_malformed_record() {
        // Second record has a non-object shape and cannot deserialize
        let text = r#"{"events": [
            {"event_type": "live", "title": "Fest", "date": "2026-07-18"},
            "not an event"
        ]}"#;
        let drafts = OpenAiExtractor::parse_response(text).unwrap();
        assert_eq!(drafts.len(), 1);
    }

    #[test]
    fn test_parse_response_rejects_non_object() {
        let err = OpenAiExtractor::parse_response("here are the events you asked for");
        assert!(matches!(
            err,
            Err(ExtractError::UnparseableResponse { .. })
        ));
    }

    #[test]
    fn test_parse_response_empty_events() {
        let drafts = OpenAiExtractor::parse_response(r#"{"events": []}"#).unwrap();
        assert!(drafts.is_empty());
    }

    #[test]
    fn test_truncate_content_respects_char_boundaries() {
        let long = "響".repeat(MAX_CONTENT_CHARS + 100);
        let truncated = truncate_content(&long);
        assert_eq!(truncated.chars().count(), MAX_CONTENT_CHARS);
    }
}
