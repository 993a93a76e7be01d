//! services/api/src/adapters/recommendations_llm.rs
//!
//! This module contains the adapter for the study-coach LLM.
//! It implements the `RecommendationService` port from the `core` crate.

const SYSTEM_INSTRUCTIONS: &str = r#"You are an AI study coach that analyzes student data and provides personalized recommendations for better academic performance.

Analyze the data and respond with a single JSON object and nothing else, in exactly this shape:
{"recommendations": ["..."], "prioritySuggestions": ["..."], "scheduleOptimization": ["..."]}

Each list should hold two to four short, actionable sentences."#;

const USER_INPUT_TEMPLATE: &str = r#"Based on the following student data, provide personalized study recommendations.

CURRENT TASKS:
{tasks}

RECENT STUDY SESSIONS:
{sessions}

Focus on:
1. Time management and productivity
2. Subject balance and priority
3. Study session optimization
4. Deadline management"#;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use study_tracker_core::{
    domain::{StudySuggestions, StudySummary},
    ports::{PortError, PortResult, RecommendationService},
};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `RecommendationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiRecommendationAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiRecommendationAdapter {
    /// Creates a new `OpenAiRecommendationAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

/// The JSON shape the model is asked to produce. Every list is optional so a
/// partially conforming answer still yields something useful.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct SuggestionsPayload {
    recommendations: Vec<String>,
    priority_suggestions: Vec<String>,
    schedule_optimization: Vec<String>,
}

/// Renders the bounded summary as the user message.
pub fn render_prompt(summary: &StudySummary) -> String {
    let tasks: Vec<_> = summary
        .tasks
        .iter()
        .map(|t| {
            json!({
                "title": t.title,
                "subject": t.subject,
                "priority": t.priority.as_str(),
                "status": t.status.as_str(),
                "dueDate": t.due_date.map(|d| d.to_rfc3339()),
            })
        })
        .collect();
    let sessions: Vec<_> = summary
        .sessions
        .iter()
        .map(|s| {
            json!({
                "subject": s.subject,
                "duration": s.minutes,
                "status": s.status.as_str(),
                "sessionType": s.session_type.as_str(),
            })
        })
        .collect();

    USER_INPUT_TEMPLATE
        .replace("{tasks}", &pretty(&tasks))
        .replace("{sessions}", &pretty(&sessions))
}

fn pretty(items: &[serde_json::Value]) -> String {
    serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_string())
}

/// Extracts the suggestions from the raw model output, tolerating markdown code fences.
pub fn parse_suggestions(raw: &str) -> PortResult<StudySuggestions> {
    let fence = Regex::new(r"(?s)^\s*```(?:json)?\s*(.*?)\s*```\s*$")
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
    let body = fence
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(raw);

    let payload: SuggestionsPayload = serde_json::from_str(body.trim())
        .map_err(|e| PortError::Gateway(format!("Malformed recommendation JSON: {}", e)))?;

    Ok(StudySuggestions {
        recommendations: payload.recommendations,
        priority_suggestions: payload.priority_suggestions,
        schedule_optimization: payload.schedule_optimization,
    }
    .or_fallback())
}

//=========================================================================================
// `RecommendationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl RecommendationService for OpenAiRecommendationAdapter {
    async fn summarize(&self, summary: &StudySummary) -> PortResult<StudySuggestions> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_INSTRUCTIONS)
                .build()
                .map_err(|e| PortError::Gateway(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(render_prompt(summary))
                .build()
                .map_err(|e| PortError::Gateway(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(|e| PortError::Gateway(e.to_string()))?;

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Gateway(e.to_string()))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::Gateway("Recommendation LLM response contained no text content.".to_string())
            })?;

        parse_suggestions(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use study_tracker_core::domain::{SessionStatus, SessionSummary, SessionType};

    #[test]
    fn parses_plain_json() {
        let raw = r#"{"recommendations":["Revise calculus"],"prioritySuggestions":["Finish lab report"],"scheduleOptimization":["Study mornings"]}"#;
        let suggestions = parse_suggestions(raw).unwrap();
        assert_eq!(suggestions.recommendations, vec!["Revise calculus".to_string()]);
        assert_eq!(suggestions.priority_suggestions, vec!["Finish lab report".to_string()]);
        assert_eq!(suggestions.schedule_optimization, vec!["Study mornings".to_string()]);
    }

    #[test]
    fn strips_code_fences_and_fills_missing_lists() {
        let raw = "```json\n{\"recommendations\": [\"Use flashcards\"]}\n```";
        let suggestions = parse_suggestions(raw).unwrap();
        assert_eq!(suggestions.recommendations, vec!["Use flashcards".to_string()]);
        assert_eq!(
            suggestions.schedule_optimization,
            StudySuggestions::fallback().schedule_optimization
        );
    }

    #[test]
    fn malformed_output_is_a_gateway_error() {
        let err = parse_suggestions("Sure! Here are some tips: sleep more.").unwrap_err();
        assert!(matches!(err, PortError::Gateway(_)));
    }

    #[test]
    fn prompt_contains_the_summary() {
        let summary = StudySummary {
            tasks: vec![],
            sessions: vec![SessionSummary {
                subject: "Biology".to_string(),
                minutes: 25,
                status: SessionStatus::Completed,
                session_type: SessionType::Pomodoro,
            }],
        };
        let prompt = render_prompt(&summary);
        assert!(prompt.contains("\"subject\": \"Biology\""));
        assert!(prompt.contains("\"sessionType\": \"pomodoro\""));
    }
}
