use std::collections::BTreeMap;

use axum::{extract::State, Json};
use common::{error::AppError, types::message::ChatMessage};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::{
    api_state::ApiState,
    context::{create_chat_request, create_user_message, process_chat_response, DEFAULT_MESSAGE},
};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    /// Remaining body fields are treated as free-form form data.
    #[serde(flatten)]
    pub form: BTreeMap<String, Value>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ChatResponse {
    pub reply: String,
}

/// Receives form data plus chat history and answers with form-aware
/// assistance. Failures never surface as HTTP errors; they are converted
/// to a textual reply instead.
pub async fn chat(
    State(state): State<ApiState>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let reply = match answer(&state, request).await {
        Ok(reply) => reply,
        Err(err) => {
            warn!(error = %err, "chat completion failed");
            format!("Error processing request: {err}")
        }
    };

    Json(ChatResponse { reply })
}

async fn answer(state: &ApiState, request: ChatRequest) -> Result<String, AppError> {
    let message = request
        .message
        .as_deref()
        .filter(|message| !message.trim().is_empty())
        .unwrap_or(DEFAULT_MESSAGE);

    let form_data = non_empty_form_fields(&request.form);
    info!(
        form_fields = form_data.len(),
        history_len = request.history.len(),
        "processing chat request"
    );

    let user_message = create_user_message(&form_data, &request.history, message);
    let chat_request = create_chat_request(user_message, &state.config.chat_model)?;
    let response = state.openai_client.chat().create(chat_request).await?;

    process_chat_response(response)
}

/// Keeps form fields whose values are non-empty strings; everything else
/// carries no context worth forwarding.
fn non_empty_form_fields(form: &BTreeMap<String, Value>) -> BTreeMap<String, String> {
    form.iter()
        .filter_map(|(field, value)| match value {
            Value::String(text) if !text.trim().is_empty() => {
                Some((field.clone(), text.clone()))
            }
            _ => None,
        })
        .collect()
}
