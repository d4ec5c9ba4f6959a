//! Shared fixtures for handler tests: an in-memory app, fake extraction
//! backends and request builders.

use crate::server::{create_router, AppState};
use crate::services::llm::{Completion, CompletionClient, CompletionRequest, LlmError};
use crate::services::pdf::{PdfError, PdfTextSource};
use crate::services::PdfUploadStash;
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use lib_core::config::{LlmSettings, PdfSettings, DEFAULT_MAX_UPLOAD_BYTES};
use lib_core::model::models::TokenCounts;
use lib_core::model::store::create_test_pool;
use lib_core::{Config, DbPool};
use lib_utils::Environment;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub const TEST_PASSWORD: &str = "Str0ng!pass";

pub fn test_config() -> Config {
    Config {
        environment: Environment::Test,
        database_url: "sqlite::memory:".to_string(),
        session_secret: b"test-secret-key-must-be-at-least-32-bytes".to_vec(),
        jwt_expiration_hours: 24,
        app_domain: "localhost".to_string(),
        frontend_port: 3000,
        backend_port: 8080,
        llm: LlmSettings {
            api_key: None,
            base_url: "http://127.0.0.1:9".to_string(),
            receipt_model: "receipt-model".to_string(),
            statement_model: "statement-model".to_string(),
        },
        pdf: PdfSettings {
            extractor_program: "false".to_string(),
            extractor_script: "unused.py".to_string(),
            info_program: "false".to_string(),
        },
        max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
    }
}

// region: --- Fakes

/// Completion client answering every request with the same content.
#[derive(Default)]
pub struct FakeLlm {
    content: Option<String>,
    usage: TokenCounts,
    models: Mutex<Vec<String>>,
}

impl FakeLlm {
    pub fn replying(content: Value) -> Self {
        Self {
            content: Some(content.to_string()),
            usage: TokenCounts {
                prompt_tokens: 100,
                completion_tokens: 20,
                total_tokens: 120,
            },
            models: Mutex::default(),
        }
    }

    /// Reply with raw text, which may not be JSON.
    pub fn replying_raw(content: &str) -> Self {
        Self {
            content: Some(content.to_string()),
            ..Self::default()
        }
    }

    /// Every call fails as if the API returned nothing.
    pub fn failing() -> Self {
        Self::default()
    }

    pub fn models(&self) -> Vec<String> {
        self.models.lock().map(|m| m.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl CompletionClient for FakeLlm {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, LlmError> {
        if let Ok(mut models) = self.models.lock() {
            models.push(request.model);
        }
        let content = self.content.clone().ok_or(LlmError::EmptyResponse)?;
        Ok(Completion {
            content,
            usage: self.usage,
        })
    }
}

/// PDF backend serving fixed page texts.
///
/// `requested` is shared with the test so it can see which pages were read.
#[derive(Default)]
pub struct FakePdf {
    pages: Vec<String>,
    pub requested: Arc<Mutex<Vec<u32>>>,
}

impl FakePdf {
    pub fn with_pages(pages: &[&str]) -> Self {
        Self {
            pages: pages.iter().map(|p| p.to_string()).collect(),
            requested: Arc::default(),
        }
    }
}

#[async_trait]
impl PdfTextSource for FakePdf {
    async fn page_count(&self, pdf: &Path) -> Result<u32, PdfError> {
        if !pdf.exists() {
            return Err(PdfError::Failed(format!("{} missing", pdf.display())));
        }
        Ok(self.pages.len() as u32)
    }

    async fn page_text(&self, _pdf: &Path, page: u32) -> Result<String, PdfError> {
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(page);
        }
        self.pages
            .get(page as usize - 1)
            .cloned()
            .ok_or_else(|| PdfError::Failed(format!("page {page} out of range")))
    }
}

// endregion: --- Fakes

// region: --- App

pub struct TestApp {
    pub router: Router,
    pub pool: DbPool,
    pub llm: Arc<FakeLlm>,
    pub uploads: PdfUploadStash,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_backends(FakeLlm::failing(), FakePdf::default()).await
    }

    pub async fn with_backends(llm: FakeLlm, pdf: FakePdf) -> Self {
        Self::build(test_config(), llm, pdf).await
    }

    /// App running with `config`, e.g. a production cookie policy or a small body limit.
    pub async fn with_config(config: Config) -> Self {
        Self::build(config, FakeLlm::failing(), FakePdf::default()).await
    }

    async fn build(config: Config, llm: FakeLlm, pdf: FakePdf) -> Self {
        let pool = create_test_pool().await.unwrap();
        let llm = Arc::new(llm);
        let uploads = PdfUploadStash::default();
        let state = AppState {
            db: pool.clone(),
            config,
            llm: llm.clone(),
            pdf: Arc::new(pdf),
            uploads: uploads.clone(),
        };
        Self {
            router: create_router(state),
            pool,
            llm,
            uploads,
        }
    }

    pub async fn send(&self, req: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(req).await.unwrap()
    }

    /// Sign up `username` and return the session cookie (`jwt=...`).
    pub async fn signup(&self, username: &str) -> String {
        let res = self
            .send(json_request(
                "POST",
                "/api/auth/signup",
                None,
                signup_body(username, &format!("{username}@example.com")),
            ))
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        session_cookie(&res).expect("signup sets the session cookie")
    }

    pub async fn user_id(&self, username: &str) -> String {
        let (id,): (String,) = sqlx::query_as("SELECT id FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .unwrap();
        id
    }
}

// endregion: --- App

// region: --- Requests

pub fn signup_body(username: &str, email: &str) -> Value {
    json!({
        "username": username,
        "email": email,
        "password": TEST_PASSWORD,
        "confirmPassword": TEST_PASSWORD,
        "termsAccepted": true
    })
}

pub fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

/// One multipart field. `file_name` and `content_type` make it a file part.
pub struct Part<'a> {
    pub name: &'a str,
    pub file_name: Option<&'a str>,
    pub content_type: Option<&'a str>,
    pub data: &'a [u8],
}

impl<'a> Part<'a> {
    pub fn text(name: &'a str, value: &'a str) -> Self {
        Self {
            name,
            file_name: None,
            content_type: None,
            data: value.as_bytes(),
        }
    }

    pub fn file(name: &'a str, file_name: &'a str, content_type: &'a str, data: &'a [u8]) -> Self {
        Self {
            name,
            file_name: Some(file_name),
            content_type: Some(content_type),
            data,
        }
    }
}

const BOUNDARY: &str = "tallybook-test-boundary";

pub fn multipart_request(uri: &str, cookie: &str, parts: &[Part<'_>]) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", part.name);
        if let Some(file_name) = part.file_name {
            disposition.push_str(&format!("; filename=\"{file_name}\""));
        }
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(b"\r\n");
        if let Some(content_type) = part.content_type {
            body.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::COOKIE, cookie)
        .body(Body::from(body))
        .unwrap()
}

// endregion: --- Requests

// region: --- Responses

/// `jwt=<value>` from the response's `Set-Cookie`, ready for a `Cookie` header.
pub fn session_cookie(res: &Response<Body>) -> Option<String> {
    set_cookie_header(res).and_then(|raw| raw.split(';').next().map(|pair| pair.trim().to_string()))
}

pub fn set_cookie_header(res: &Response<Body>) -> Option<String> {
    res.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("jwt="))
        .map(|v| v.to_string())
}

pub async fn body_json(res: Response<Body>) -> Value {
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(res: Response<Body>) -> String {
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// endregion: --- Responses
