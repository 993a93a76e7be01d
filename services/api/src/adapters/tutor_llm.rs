//! services/api/src/adapters/tutor_llm.rs
//!
//! The AI tutor that drafts answers for the doubt board.
//! It implements the `TutorService` port from the `core` crate.

const USER_INPUT_TEMPLATE: &str = r#"You are an expert tutor in {subject}. A student has asked the following question:

Title: {title}
Description: {description}

Please provide a comprehensive, educational answer that:
1. Explains the concept clearly
2. Provides step-by-step solutions if applicable
3. Includes examples or analogies to aid understanding
4. Suggests related topics for further study

Keep the answer educational and encouraging."#;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs},
    Client,
};
use async_trait::async_trait;
use study_tracker_core::{
    domain::Doubt,
    ports::{PortError, PortResult, TutorService},
};

#[derive(Clone)]
pub struct OpenAiTutorAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiTutorAdapter {
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

pub fn render_prompt(doubt: &Doubt) -> String {
    USER_INPUT_TEMPLATE
        .replace("{subject}", &doubt.subject)
        .replace("{title}", &doubt.title)
        .replace("{description}", &doubt.description)
}

#[async_trait]
impl TutorService for OpenAiTutorAdapter {
    async fn answer_doubt(&self, doubt: &Doubt) -> PortResult<String> {
        let messages = vec![ChatCompletionRequestUserMessageArgs::default()
            .content(render_prompt(doubt))
            .build()
            .map_err(|e| PortError::Gateway(e.to_string()))?
            .into()];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(|e| PortError::Gateway(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Gateway(e.to_string()))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| PortError::Gateway("Tutor LLM returned an empty answer.".to_string()))
    }
}
