//! Axum stand-in for the LMS backend, served on an ephemeral local port.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use lms_portal::config::PortalConfig;
use lms_portal::models::TokenClaims;
use serde_json::{json, Value};

const SECRET: &[u8] = b"mock-backend-secret";

type Reply = (StatusCode, Json<Value>);

struct MockState {
    root_domain: String,
}

fn error(status: StatusCode, message: &str) -> Reply {
    (status, Json(json!({ "error": message })))
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

pub fn issue_token(email: &str, exp: u64) -> String {
    let claims = TokenClaims {
        sub: Some(json!(email)),
        exp: Some(exp),
        iat: Some(now()),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET)).unwrap()
}

pub fn valid_token(email: &str) -> String {
    issue_token(email, now() + 3600)
}

fn tenant(slug: &str) -> Option<Value> {
    match slug {
        "acme" => Some(json!({
            "id": "t-acme",
            "name": "Acme Academy",
            "slug": "acme",
            "subdomain": "acme.xyz.com",
            "subscription_tier": "professional",
            "is_setup": false
        })),
        "globex" => Some(json!({
            "id": "t-globex",
            "name": "Globex Institute",
            "slug": "globex",
            "is_setup": true
        })),
        _ => None,
    }
}

fn user(email: &str) -> Option<Value> {
    let (id, name, role) = match email {
        "ada@acme.edu" => ("u-ada", "Ada Lovelace", "student"),
        "owner@acme.edu" => ("u-owner", "Olive Owner", "tenant_admin"),
        "cfo@acme.edu" => ("u-cfo", "Carl Finance", "finance"),
        _ => return None,
    };
    Some(json!({
        "id": id,
        "full_name": name,
        "email": email,
        "role": role,
        "tenant_id": "t-acme"
    }))
}

fn authenticated(headers: &HeaderMap) -> Result<Value, Reply> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Missing token"))?;
    let claims = decode::<TokenClaims>(token, &DecodingKey::from_secret(SECRET), &Validation::default())
        .map_err(|_| error(StatusCode::UNAUTHORIZED, "Invalid token"))?
        .claims;
    claims
        .sub
        .as_ref()
        .and_then(Value::as_str)
        .and_then(user)
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Unknown user"))
}

async fn current_tenant(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Reply {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let suffix = format!(".{}", state.root_domain);
    match host.strip_suffix(&suffix).and_then(tenant) {
        Some(tenant) => (StatusCode::OK, Json(json!({ "tenant": tenant }))),
        None => error(StatusCode::NOT_FOUND, "Tenant not found"),
    }
}

async fn login(Json(body): Json<Value>) -> Reply {
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    match user(email) {
        Some(user) if password == "correct horse" => (
            StatusCode::OK,
            Json(json!({
                "message": "Login successful",
                "token": valid_token(email),
                "user": user
            })),
        ),
        _ => error(StatusCode::UNAUTHORIZED, "Invalid credentials"),
    }
}

async fn register(Json(body): Json<Value>) -> Reply {
    (
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "user": {
                "id": "u-new",
                "full_name": body["full_name"],
                "email": body["email"],
                "role": body["role"]
            }
        })),
    )
}

async fn me(headers: HeaderMap) -> Reply {
    match authenticated(&headers) {
        Ok(user) => (StatusCode::OK, Json(json!({ "user": user }))),
        Err(reply) => reply,
    }
}

async fn my_tenants(headers: HeaderMap) -> Reply {
    match authenticated(&headers) {
        Ok(_) => (
            StatusCode::OK,
            Json(json!([tenant("acme"), tenant("globex")])),
        ),
        Err(reply) => reply,
    }
}

async fn validate_slug(Path(slug): Path<String>) -> Reply {
    let taken = tenant(&slug).is_some();
    let suggestions: Vec<String> = if taken {
        (1..=3).map(|n| format!("{slug}-{n}")).collect()
    } else {
        vec![]
    };
    (
        StatusCode::OK,
        Json(json!({ "available": !taken, "suggestions": suggestions })),
    )
}

async fn create_tenant(Json(body): Json<Value>) -> Reply {
    let slug = body["slug"].as_str().unwrap_or_default().to_owned();
    if tenant(&slug).is_some() {
        return error(StatusCode::BAD_REQUEST, "Tenant slug already exists");
    }
    (
        StatusCode::CREATED,
        Json(json!({
            "message": "Tenant created successfully",
            "tenant": { "id": "t-new", "name": body["name"], "slug": slug }
        })),
    )
}

async fn broken() -> Reply {
    error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

pub fn router(root_domain: &str) -> Router {
    let state = Arc::new(MockState {
        root_domain: root_domain.to_owned(),
    });
    let api = Router::new()
        .route("/tenants/current", get(current_tenant))
        .route("/tenants/my-tenants", get(my_tenants))
        .route("/tenants/validate-slug/:slug", get(validate_slug))
        .route("/tenants/create", post(create_tenant))
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/me", get(me))
        .route("/broken", get(broken))
        .with_state(state);
    Router::new().nest("/api", api)
}

/// Serves the mock backend and returns its address.
pub async fn spawn_backend() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router("xyz.com");
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// An address nothing listens on.
pub async fn dead_address() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

pub fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("lms_portal_{name}_{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn config_for(addr: SocketAddr, dir: &std::path::Path) -> PortalConfig {
    PortalConfig {
        api_url: Some(format!("http://{addr}/api")),
        token_path: dir.join(".lms_token"),
        tenant_path: dir.join(".lms_tenant"),
        ..PortalConfig::default()
    }
}
