use {
    axum::extract::{Multipart, Query, State},
    tracing::info,
};

use crate::{
    error::GatewayError, params::ChatParams, session::SessionKey, state::AppState, upload,
};

/// `POST /upload`: store the `file` field and make it the session's active
/// document.
pub async fn upload(
    State(state): State<AppState>,
    SessionKey(session): SessionKey,
    mut multipart: Multipart,
) -> Result<String, GatewayError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let client_name = field.file_name().map(str::to_string);
        let path = upload::store_field(field, &state.upload_dir).await?;
        let path = path.to_string_lossy().into_owned();

        info!(session = %session, path = %path, client_name = ?client_name, "upload stored");
        state.sessions.set_active(&session, path.clone());
        return Ok(format!("{path} upload successfully."));
    }
    Err(GatewayError::BadRequest(
        "missing multipart field 'file'".into(),
    ))
}

/// `GET /chat?question=...`: answer against the session's active document.
pub async fn chat(
    State(state): State<AppState>,
    SessionKey(session): SessionKey,
    Query(params): Query<ChatParams>,
) -> Result<String, GatewayError> {
    let question = params
        .question()
        .map_err(|msg| GatewayError::BadRequest(msg.into()))?;
    let path = state
        .sessions
        .active(&session)
        .ok_or(GatewayError::NoActiveDocument)?;

    info!(session = %session, path = %path, "answering question");
    Ok(state.chat.answer(&path, question).await?)
}

pub async fn health() -> &'static str {
    "ok"
}
