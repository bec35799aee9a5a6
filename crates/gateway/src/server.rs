use std::future::Future;

use {
    axum::{
        Router,
        extract::DefaultBodyLimit,
        routing::{get, post},
    },
    docchat_config::ServerConfig,
    tokio::net::TcpListener,
    tower_http::{cors::CorsLayer, trace::TraceLayer},
    tracing::info,
};

use crate::{routes, state::AppState};

pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    let router = Router::new()
        .route("/upload", post(routes::upload))
        .route("/chat", get(routes::chat))
        .route("/health", get(routes::health))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if config.cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

/// Create the upload directory, bind `bind:port`, and serve until `shutdown`
/// resolves.
pub async fn serve<F>(config: &ServerConfig, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let listener = TcpListener::bind((config.bind.as_str(), config.port)).await?;
    let addr = listener.local_addr()?;
    info!(
        %addr,
        upload_dir = %config.upload_dir.display(),
        cors = config.cors,
        "gateway listening"
    );

    axum::serve(listener, build_router(state, config))
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("gateway stopped");
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::session::SESSION_HEADER,
        async_trait::async_trait,
        axum::{
            body::{Body, to_bytes},
            http::{Request, StatusCode, header::CONTENT_TYPE},
            response::Response,
        },
        docchat_agents::{ChatMessage, Completion, LlmProvider, ProviderError, Usage},
        docchat_chat::DocumentChat,
        docchat_documents::{FileLoader, ProcessingCache, RecursiveCharacterSplitter},
        docchat_retrieval::{EmbeddingError, EmbeddingProvider},
        std::{path::Path, sync::Arc},
        tower::ServiceExt,
    };

    struct FlatEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FlatEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(vec![1.0, 0.0])
        }

        fn model_name(&self) -> &str {
            "flat"
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    /// Replies with the prompt it was given, so tests can see the context.
    struct EchoLlm {
        fail: bool,
    }

    #[async_trait]
    impl LlmProvider for EchoLlm {
        fn name(&self) -> &str {
            "echo"
        }

        fn model(&self) -> &str {
            "echo"
        }

        async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion, ProviderError> {
            if self.fail {
                return Err(ProviderError::Api {
                    status: 500,
                    message: "upstream down".into(),
                });
            }
            Ok(Completion {
                text: messages
                    .iter()
                    .map(|m| m.content.as_str())
                    .collect::<Vec<_>>()
                    .join("\n"),
                usage: Usage::default(),
            })
        }
    }

    fn app_with(dir: &Path, fail_llm: bool) -> Router {
        let cache = ProcessingCache::new(
            Arc::new(FileLoader),
            Arc::new(RecursiveCharacterSplitter::default()),
            8,
        );
        let chat = DocumentChat::new(
            Arc::new(cache),
            Arc::new(FlatEmbedder),
            Arc::new(EchoLlm { fail: fail_llm }),
            4,
        );
        let config = ServerConfig {
            upload_dir: dir.to_path_buf(),
            ..Default::default()
        };
        build_router(AppState::new(chat, dir), &config)
    }

    fn app(dir: &Path) -> Router {
        app_with(dir, false)
    }

    fn upload_request(session: Option<&str>, field: &str, filename: &str, content: &str) -> Request<Body> {
        let boundary = "docchat-test-boundary";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\
             \r\n\
             {content}\r\n\
             --{boundary}--\r\n"
        );
        let mut builder = Request::post("/upload").header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        );
        if let Some(session) = session {
            builder = builder.header(SESSION_HEADER, session);
        }
        builder.body(Body::from(body)).unwrap()
    }

    fn chat_request(session: Option<&str>, query: &str) -> Request<Body> {
        let mut builder = Request::get(format!("/chat{query}"));
        if let Some(session) = session {
            builder = builder.header(SESSION_HEADER, session);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_text(resp: Response) -> String {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    /// Upload `content` and return the stored path from the response.
    async fn upload(app: &Router, session: Option<&str>, filename: &str, content: &str) -> String {
        let resp = app
            .clone()
            .oneshot(upload_request(session, "file", filename, content))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        body_text(resp)
            .await
            .strip_suffix(" upload successfully.")
            .unwrap()
            .to_string()
    }

    async fn ask(app: &Router, session: Option<&str>, question: &str) -> (StatusCode, String) {
        let resp = app
            .clone()
            .oneshot(chat_request(session, &format!("?question={question}")))
            .await
            .unwrap();
        let status = resp.status();
        (status, body_text(resp).await)
    }

    #[tokio::test]
    async fn upload_then_chat_answers_from_the_document() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());

        let path = upload(&app, None, "notes.txt", "The launch is on Tuesday.").await;
        assert!(Path::new(&path).starts_with(dir.path()));
        assert!(path.ends_with(".txt"));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "The launch is on Tuesday."
        );

        let (status, answer) = ask(&app, None, "When%20is%20the%20launch%3F").await;
        assert_eq!(status, StatusCode::OK);
        assert!(answer.contains("The launch is on Tuesday."));
        assert!(answer.ends_with("Question: When is the launch?\nHelpful Answer:"));
    }

    #[tokio::test]
    async fn later_upload_replaces_the_active_document() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());

        let first = upload(&app, None, "a.txt", "Alpha document.").await;
        let second = upload(&app, None, "b.txt", "Beta document.").await;
        assert_ne!(first, second);

        let (status, answer) = ask(&app, None, "which").await;
        assert_eq!(status, StatusCode::OK);
        assert!(answer.contains("Beta document."));
        assert!(!answer.contains("Alpha document."));
    }

    #[tokio::test]
    async fn chat_before_upload_is_a_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = ask(&app(dir.path()), None, "hello").await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body.contains("upload"));
    }

    #[tokio::test]
    async fn sessions_do_not_share_documents() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());

        upload(&app, Some("alice"), "a.txt", "Alice's notes.").await;
        upload(&app, Some("bob"), "b.txt", "Bob's notes.").await;

        let (_, answer) = ask(&app, Some("alice"), "whose").await;
        assert!(answer.contains("Alice's notes."));
        let (_, answer) = ask(&app, Some("bob"), "whose").await;
        assert!(answer.contains("Bob's notes."));

        let (status, _) = ask(&app, None, "whose").await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn traversal_in_client_filename_stays_in_upload_dir() {
        let root = tempfile::tempdir().unwrap();
        let uploads = root.path().join("uploads");
        std::fs::create_dir(&uploads).unwrap();
        let app = app(&uploads);

        let path = upload(&app, None, "../../escape.txt", "payload").await;
        assert_eq!(Path::new(&path).parent(), Some(uploads.as_path()));
        assert!(!root.path().join("escape.txt").exists());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn upload_without_file_field_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let resp = app(dir.path())
            .oneshot(upload_request(None, "document", "a.txt", "text"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn missing_or_blank_question_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());
        upload(&app, None, "a.txt", "text").await;

        let resp = app.clone().oneshot(chat_request(None, "")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let (status, _) = ask(&app, None, "%20%20").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unreadable_document_is_unprocessable() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());
        upload(&app, None, "sheet.xlsx", "PK").await;

        let (status, _) = ask(&app, None, "anything").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn generation_failure_is_a_bad_gateway() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with(dir.path(), true);
        upload(&app, None, "a.txt", "text").await;

        let (status, body) = ask(&app, None, "anything").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body.contains("upstream down"));
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let dir = tempfile::tempdir().unwrap();
        let resp = app(dir.path())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_text(resp).await, "ok");
    }
}
