//! `POST /chat`: one or many comma-separated symptom entries in, ranked
//! diseases per entry out.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde_json::Value;

use crate::api::error::ApiError;
use crate::api::types::AppState;
use crate::predict::ChatResponse;

/// `POST /chat`.
///
/// The body is read as JSON whatever its content type. `message` may be a
/// string or a list of strings and defaults to `""` when absent.
pub async fn chat(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ChatResponse>, ApiError> {
    let entries = parse_entries(&body)?;
    tracing::debug!(entries = entries.len(), "Chat request");

    let predictor = state.predictor.clone();
    let responses = tokio::task::spawn_blocking(move || {
        entries
            .iter()
            .map(|entry| predictor.respond(entry))
            .collect::<Vec<_>>()
    })
    .await
    .map_err(|e| ApiError::Internal(format!("prediction task failed: {e}")))?;

    Ok(Json(ChatResponse::from_entries(responses)))
}

/// Pull the entries out of a chat body
pub fn parse_entries(body: &[u8]) -> Result<Vec<String>, ApiError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Malformed JSON: {e}")))?;

    let Value::Object(mut fields) = value else {
        return Err(ApiError::InvalidInput);
    };

    match fields.remove("message") {
        None => Ok(vec![String::new()]),
        Some(Value::String(entry)) => Ok(vec![entry]),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(entry) => Ok(entry),
                _ => Err(ApiError::InvalidInput),
            })
            .collect(),
        Some(_) => Err(ApiError::InvalidInput),
    }
}
