#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use sqlx::PgPool;
use tower::ServiceExt;

use civic_api::auth::jwt::{issue_token_pair, JwtConfig, TokenPair};
use civic_api::auth::password::hash_password;
use civic_api::config::ServerConfig;
use civic_api::router::build_app_router;
use civic_api::state::AppState;
use civic_db::models::complaint::{Complaint, CreateComplaint};
use civic_db::models::user::{CreateUser, User};
use civic_db::repositories::{ComplaintRepo, UserRepo};
use civic_storage::{MemoryStorage, StorageConfig};

pub const TEST_PASSWORD: &str = "correct-horse-battery";

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        access_secret: "test-access-secret-long-enough-for-hmac".to_string(),
        refresh_secret: "test-refresh-secret-long-enough-for-hmac".to_string(),
        access_ttl_secs: 15 * 60,
        refresh_ttl_secs: 7 * 24 * 3600,
    }
}

pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        production: false,
        jwt: test_jwt_config(),
        storage: StorageConfig::in_memory(),
    }
}

/// The application router plus handles tests inspect directly.
pub struct TestApp {
    pub router: Router,
    pub storage: Arc<MemoryStorage>,
    pub pool: PgPool,
}

/// Build the production router over `pool` and an in-memory object store.
pub fn build_test_app(pool: PgPool) -> TestApp {
    let config = test_config();
    let storage = Arc::new(MemoryStorage::new(&config.storage.bucket));

    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(config.clone()),
        storage: storage.clone(),
    };

    TestApp {
        router: build_app_router(state, &config),
        storage,
        pool,
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

fn builder(method: Method, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match token {
        Some(token) => builder.header(AUTHORIZATION, format!("Bearer {token}")),
        None => builder,
    }
}

pub async fn get(app: &Router, uri: &str, token: Option<&str>) -> Response {
    send(app, builder(Method::GET, uri, token).body(Body::empty()).unwrap()).await
}

pub async fn delete(app: &Router, uri: &str, token: Option<&str>) -> Response {
    send(app, builder(Method::DELETE, uri, token).body(Body::empty()).unwrap()).await
}

pub async fn post_json(
    app: &Router,
    uri: &str,
    body: serde_json::Value,
    token: Option<&str>,
) -> Response {
    json_request(app, Method::POST, uri, body, token).await
}

pub async fn patch_json(
    app: &Router,
    uri: &str,
    body: serde_json::Value,
    token: Option<&str>,
) -> Response {
    json_request(app, Method::PATCH, uri, body, token).await
}

async fn json_request(
    app: &Router,
    method: Method,
    uri: &str,
    body: serde_json::Value,
    token: Option<&str>,
) -> Response {
    let request = builder(method, uri, token)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    send(app, request).await
}

/// Request carrying a raw `Cookie` header instead of a bearer token.
pub async fn with_cookie(app: &Router, method: Method, uri: &str, cookie: &str) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(COOKIE, cookie)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// All `Set-Cookie` header values of a response.
pub fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

/// The `Set-Cookie` value for `name`, if any.
pub fn set_cookie(response: &Response, name: &str) -> Option<String> {
    set_cookies(response)
        .into_iter()
        .find(|c| c.starts_with(&format!("{name}=")))
}

// ---------------------------------------------------------------------------
// Multipart
// ---------------------------------------------------------------------------

const BOUNDARY: &str = "civic-test-boundary";

/// One file part of a multipart upload.
pub struct FilePart {
    pub field: &'static str,
    pub file_name: &'static str,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl FilePart {
    pub fn new(content_type: &'static str, bytes: Vec<u8>) -> Self {
        Self {
            field: "files",
            file_name: "photo",
            content_type,
            bytes,
        }
    }

    pub fn jpeg(width: u32, height: u32) -> Self {
        Self::new("image/jpeg", encoded_image(width, height, ImageFormat::Jpeg))
    }

    pub fn png(width: u32, height: u32) -> Self {
        Self::new("image/png", encoded_image(width, height, ImageFormat::Png))
    }
}

fn multipart_body(parts: &[FilePart]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                part.field, part.file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", part.content_type).as_bytes());
        body.extend_from_slice(&part.bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn upload(
    app: &Router,
    complaint_id: i64,
    token: Option<&str>,
    parts: &[FilePart],
) -> Response {
    let request = builder(
        Method::POST,
        &format!("/complaints/{complaint_id}/images/upload"),
        token,
    )
    .header(
        CONTENT_TYPE,
        format!("multipart/form-data; boundary={BOUNDARY}"),
    )
    .body(Body::from(multipart_body(parts)))
    .unwrap();
    send(app, request).await
}

pub fn encoded_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let buffer = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 90])
    });
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(buffer)
        .write_to(&mut out, format)
        .unwrap();
    out.into_inner()
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

/// Insert a user with [`TEST_PASSWORD`] and mint tokens for it.
pub async fn create_user(pool: &PgPool, email: &str) -> (User, TokenPair) {
    let user = UserRepo::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            name: "Test Citizen".to_string(),
            password_hash: hash_password(TEST_PASSWORD).unwrap(),
        },
    )
    .await
    .unwrap();
    let tokens = issue_token_pair(user.id, &user.email, &test_jwt_config()).unwrap();
    (user, tokens)
}

pub async fn create_complaint(pool: &PgPool, user_id: i64) -> Complaint {
    ComplaintRepo::create(
        pool,
        &CreateComplaint {
            user_id,
            title: "Overflowing drain".to_string(),
            description: "Water on the road since Monday".to_string(),
        },
    )
    .await
    .unwrap()
}

pub async fn image_row_count(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM complaint_images")
        .fetch_one(pool)
        .await
        .unwrap()
}
