//! Typed query parameters for gateway routes.

use serde::Deserialize;

/// Query for `GET /chat`.
#[derive(Debug, Default, Deserialize)]
pub struct ChatParams {
    #[serde(default)]
    pub question: Option<String>,
}

impl ChatParams {
    /// The question, rejecting a missing or blank one. Surrounding
    /// whitespace is kept.
    pub fn question(&self) -> Result<&str, &'static str> {
        match self.question.as_deref() {
            Some(q) if !q.trim().is_empty() => Ok(q),
            _ => Err("missing 'question' query parameter"),
        }
    }
}
