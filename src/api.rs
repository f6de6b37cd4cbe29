//! HTTP client for the LMS backend (reqwest, JSON).
//!
//! Only the endpoints behind tenant resolution, the session and tenant
//! onboarding are wrapped here:
//! - `GET  /tenants/current`, `GET /tenants/my-tenants`
//! - `POST /tenants/create`, `GET /tenants/validate-slug/{slug}`
//! - `POST /auth/login`, `POST /auth/register`, `GET /auth/me`
//!
//! Tenants are selected by the request's `Host` header, as the backend's
//! tenant middleware expects.

use async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::auth::bearer;
use crate::config::PortalConfig;
use crate::error::{PortalError, PortalResult};
use crate::models::{
    CreateTenant, CreateTenantResponse, CurrentTenantResponse, CurrentUserResponse, LoginRequest,
    LoginResponse, RegisterRequest, RegisterResponse, SlugAvailability, Tenant, User,
};
use crate::session::AuthBackend;
use crate::tenant::{api_base_url, normalize_host, tenant_base_url, TenantLookup};

/// Shape of the backend's error bodies (`{"error": "..."}`).
#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    root_domain: String,
    /// Fixed base URL; requests then carry the tenant in the `Host` header.
    api_url: Option<String>,
    /// Host the portal is being served from.
    host: String,
}

impl ApiClient {
    pub fn new(config: &PortalConfig, host: &str) -> PortalResult<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| PortalError::Config(format!("http client: {e}")))?;
        Ok(Self {
            http,
            root_domain: config.root_domain.clone(),
            api_url: config.api_url.clone(),
            host: normalize_host(host),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn base_url(&self) -> String {
        self.base_url_for(&self.host)
    }

    fn base_url_for(&self, host: &str) -> String {
        match &self.api_url {
            Some(url) => url.clone(),
            None => api_base_url(&self.root_domain, host),
        }
    }

    fn request(&self, method: Method, host: &str, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url_for(host), path);
        debug!(method = %method, url = %url, host, "api request");
        let builder = self.http.request(method, url);
        if self.api_url.is_some() {
            builder.header(header::HOST, host)
        } else {
            builder
        }
    }

    async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> PortalResult<T> {
        let response = check_status(builder.send().await?).await?;
        Ok(response.json::<T>().await?)
    }

    /// The tenant served at `{slug}.{root}`; `None` when the backend does not know it.
    pub async fn current_tenant(&self, slug: &str) -> PortalResult<Option<Tenant>> {
        let host = format!("{slug}.{}", self.root_domain);
        let builder = self.request(Method::GET, &host, "/tenants/current");
        match Self::send_json::<CurrentTenantResponse>(builder).await {
            Ok(body) => Ok(Some(body.tenant)),
            Err(PortalError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn login(&self, credentials: &LoginRequest) -> PortalResult<LoginResponse> {
        Self::send_json(
            self.request(Method::POST, &self.host, "/auth/login")
                .json(credentials),
        )
        .await
    }

    pub async fn register(&self, new_user: &RegisterRequest) -> PortalResult<RegisterResponse> {
        Self::send_json(
            self.request(Method::POST, &self.host, "/auth/register")
                .json(new_user),
        )
        .await
    }

    pub async fn current_user(&self, token: &str) -> PortalResult<User> {
        let body: CurrentUserResponse = Self::send_json(
            self.request(Method::GET, &self.host, "/auth/me")
                .header(header::AUTHORIZATION, bearer(token)),
        )
        .await?;
        Ok(body.user)
    }

    pub async fn my_tenants(&self, token: &str) -> PortalResult<Vec<Tenant>> {
        Self::send_json(
            self.request(Method::GET, &self.host, "/tenants/my-tenants")
                .header(header::AUTHORIZATION, bearer(token)),
        )
        .await
    }

    /// Onboards a new institution. The redirect URL falls back to the tenant's login page.
    pub async fn create_tenant(&self, request: &CreateTenant) -> PortalResult<CreateTenantResponse> {
        let mut created: CreateTenantResponse = Self::send_json(
            self.request(Method::POST, &self.host, "/tenants/create")
                .json(request),
        )
        .await?;
        if created.redirect_url.is_none() {
            created.redirect_url = Some(format!(
                "{}/login",
                tenant_base_url(&self.root_domain, Some(&created.tenant.slug))
            ));
        }
        Ok(created)
    }

    pub async fn check_slug(&self, slug: &str) -> PortalResult<SlugAvailability> {
        Self::send_json(self.request(
            Method::GET,
            &self.host,
            &format!("/tenants/validate-slug/{slug}"),
        ))
        .await
    }
}

/// Maps non-2xx responses onto `PortalError`.
pub async fn check_status(response: Response) -> PortalResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let path = response.url().path().to_owned();
    let body = response.text().await.unwrap_or_default();
    let parsed = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.error.or(b.message));
    let message = match parsed {
        Some(message) => message,
        None if body.is_empty() => path,
        None => body,
    };

    Err(error_for_status(status, message))
}

pub fn error_for_status(status: StatusCode, message: String) -> PortalError {
    match status {
        StatusCode::UNAUTHORIZED => PortalError::Unauthorized(message),
        StatusCode::FORBIDDEN => PortalError::Forbidden(message),
        StatusCode::NOT_FOUND => PortalError::NotFound(message),
        s if s.is_server_error() => PortalError::Server {
            status: s.as_u16(),
            message,
        },
        s => PortalError::Rejected {
            status: s.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl TenantLookup for ApiClient {
    async fn find_tenant(&self, slug: &str) -> PortalResult<Option<Tenant>> {
        self.current_tenant(slug).await
    }
}

#[async_trait]
impl AuthBackend for ApiClient {
    async fn login(&self, credentials: &LoginRequest) -> PortalResult<LoginResponse> {
        ApiClient::login(self, credentials).await
    }

    async fn register(&self, new_user: &RegisterRequest) -> PortalResult<RegisterResponse> {
        ApiClient::register(self, new_user).await
    }

    async fn current_user(&self, token: &str) -> PortalResult<User> {
        ApiClient::current_user(self, token).await
    }
}
