use {
    axum::{
        extract::multipart::MultipartError,
        http::StatusCode,
        response::{IntoResponse, Response},
    },
    docchat_chat::ChatError,
    tracing::{error, warn},
};

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("no document uploaded for this session yet; upload a PDF first")]
    NoActiveDocument,

    #[error("{0}")]
    BadRequest(String),

    #[error("invalid upload: {0}")]
    Multipart(#[from] MultipartError),

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error("failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NoActiveDocument => StatusCode::CONFLICT,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Multipart(e) => e.status(),
            Self::Chat(ChatError::Document(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Chat(ChatError::Embedding(_) | ChatError::Generation(_)) => {
                StatusCode::BAD_GATEWAY
            },
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %message, "request failed");
        } else {
            warn!(status = status.as_u16(), error = %message, "request rejected");
        }
        (status, message).into_response()
    }
}
