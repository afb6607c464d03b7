use std::collections::BTreeMap;

use async_openai::{
    error::OpenAIError,
    types::{
        ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
    },
};
use common::{
    error::AppError,
    types::message::{format_history, ChatMessage},
};

pub const DEFAULT_MESSAGE: &str = "Please review my exemption request form and provide feedback or generate a complete exception request.";

pub const FORM_ASSISTANT_SYSTEM_MESSAGE: &str = "You are an assistant helping a requestor complete a security exemption request. \
    Use the submitted form data and the indexed policy and exemption criteria as context. \
    Point out missing or inconsistent fields, and when the form is complete, draft a full exception request.";

/// Renders the form data, chat history, and question into the single user
/// message forwarded to the completion call.
pub fn create_user_message(
    form_data: &BTreeMap<String, String>,
    history: &[ChatMessage],
    message: &str,
) -> String {
    let form_lines = form_data
        .iter()
        .map(|(field, value)| format!("{field}: {value}"))
        .collect::<Vec<String>>()
        .join("\n");

    format!(
        r"
        Form data:
        ==================
        {}

        Chat history:
        ==================
        {}

        User Question:
        ==================
        {}
        ",
        form_lines,
        format_history(history),
        message
    )
}

pub fn create_chat_request(
    user_message: String,
    model: &str,
) -> Result<CreateChatCompletionRequest, OpenAIError> {
    CreateChatCompletionRequestArgs::default()
        .model(model)
        .messages([
            ChatCompletionRequestSystemMessage::from(FORM_ASSISTANT_SYSTEM_MESSAGE).into(),
            ChatCompletionRequestUserMessage::from(user_message).into(),
        ])
        .build()
}

pub fn process_chat_response(response: CreateChatCompletionResponse) -> Result<String, AppError> {
    response
        .choices
        .first()
        .and_then(|choice| choice.message.content.clone())
        .ok_or(AppError::LLMParsing(
            "No content found in LLM response".into(),
        ))
}
