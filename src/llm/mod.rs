//! Content-generation collaborator via rig-core.
//!
//! Provides the Anthropic [`Client`] constructor and the [`Narrator`], a
//! thin agent wrapper for the generation the app consumes: level titles,
//! task suggestions, weekly summaries. Responses are provider-defined JSON
//! kept opaque until the consumption site. Every call here is fallible and
//! callers treat the results as optional — a level-up succeeds even when
//! its title never arrives.
//!
//! [`Client`]: rig::providers::anthropic::Client

use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers::anthropic;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::Instrument;

use crate::error::{Error, Result};
use crate::telemetry::{genai, metrics};
use opentelemetry::KeyValue;

/// Default completion model for narration.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Create an Anthropic client from a secret API key.
///
/// # Errors
/// Returns an error if the underlying HTTP client cannot be constructed.
pub fn anthropic_client(api_key: &SecretString) -> Result<anthropic::Client> {
    anthropic::Client::new(api_key.expose_secret())
        .map_err(|e| Error::Llm(format!("failed to create Anthropic client: {e}")))
}

// ---------------------------------------------------------------------------
// Narrator
// ---------------------------------------------------------------------------

/// Context for task suggestions, assembled by the sweep.
#[derive(Debug, Clone)]
pub struct SuggestionContext {
    pub display_name: String,
    /// (stat name, current level) pairs.
    pub stats: Vec<(String, u32)>,
    pub focus_theme: Option<String>,
    pub recent_titles: Vec<String>,
    pub max_tasks: usize,
}

/// One suggested task, parsed from the provider's JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskSuggestion {
    pub title: String,
    pub estimated_xp: i64,
    /// Name of the stat this task should feed, if the provider picked one.
    pub stat_name: Option<String>,
}

/// Prompt-based content generation over a rig agent.
pub struct Narrator {
    agent: rig::agent::Agent<anthropic::completion::CompletionModel>,
    model: String,
}

impl Narrator {
    pub fn new(client: &anthropic::Client, model: impl Into<String>) -> Self {
        let model = model.into();
        let agent = client
            .agent(&model)
            .preamble(
                "You generate content for a gamified personal-development \
                 tracker. Respond with JSON only, no prose and no code fences.",
            )
            .max_tokens(1024)
            .build();
        Self { agent, model }
    }

    /// Generate a human-readable title for a level a stat just reached.
    pub async fn level_title(&self, stat_name: &str, level: u32) -> Result<String> {
        let prompt = format!(
            "A player's \"{stat_name}\" stat just reached level {level}. \
             Invent a short, evocative title for this level. \
             Respond as {{\"title\": \"...\"}}."
        );

        #[derive(Deserialize)]
        struct TitleResponse {
            title: String,
        }

        let value = self.prompt_json("level_title", &prompt).await?;
        let parsed: TitleResponse = serde_json::from_value(value)
            .map_err(|e| Error::Llm(format!("bad level title response: {e}")))?;
        Ok(parsed.title)
    }

    /// Suggest tasks for one user's day.
    pub async fn suggest_tasks(&self, ctx: &SuggestionContext) -> Result<Vec<TaskSuggestion>> {
        let stats = ctx
            .stats
            .iter()
            .map(|(name, level)| format!("{name} (level {level})"))
            .collect::<Vec<_>>()
            .join(", ");
        let focus = ctx.focus_theme.as_deref().unwrap_or("none");
        let recent = if ctx.recent_titles.is_empty() {
            "none".to_string()
        } else {
            ctx.recent_titles.join("; ")
        };

        let prompt = format!(
            "Suggest up to {max} concrete daily tasks for {name}. \
             Their stats: {stats}. Today's focus: {focus}. \
             Recently completed: {recent}. \
             Respond as {{\"tasks\": [{{\"title\": \"...\", \
             \"estimated_xp\": 50, \"stat_name\": \"...\"}}]}}.",
            max = ctx.max_tasks,
            name = ctx.display_name,
        );

        #[derive(Deserialize)]
        struct SuggestionResponse {
            tasks: Vec<TaskSuggestion>,
        }

        let value = self.prompt_json("suggest_tasks", &prompt).await?;
        let parsed: SuggestionResponse = serde_json::from_value(value)
            .map_err(|e| Error::Llm(format!("bad suggestion response: {e}")))?;
        Ok(parsed.tasks)
    }

    /// Summarize a user's week. The context and the response are both
    /// provider-defined JSON — persisted and surfaced verbatim, not
    /// strongly typed.
    pub async fn weekly_summary(&self, context: &serde_json::Value) -> Result<serde_json::Value> {
        let prompt = format!(
            "Write a weekly progress summary for this player from the data \
             below. Respond as JSON with whatever fields fit the data \
             (e.g. summary, highlights, suggestions).\n\n{context}"
        );
        self.prompt_json("weekly_summary", &prompt).await
    }

    /// Run one prompt, expecting a JSON document back.
    async fn prompt_json(&self, operation: &str, prompt: &str) -> Result<serde_json::Value> {
        let span = genai::start_chat_span(&self.model, "anthropic");
        let response = async { self.agent.prompt(prompt).await }
            .instrument(span)
            .await;

        let result_label = if response.is_ok() { "ok" } else { "error" };
        metrics::llm_requests().add(
            1,
            &[
                KeyValue::new("operation", operation.to_string()),
                KeyValue::new("result", result_label),
            ],
        );

        let text = response.map_err(|e| Error::Llm(format!("{operation}: {e}")))?;
        serde_json::from_str(strip_fences(&text))
            .map_err(|e| Error::Llm(format!("{operation}: response is not JSON: {e}")))
    }
}

/// Providers sometimes fence JSON despite instructions. Strip the fences,
/// keep everything else as-is.
fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
