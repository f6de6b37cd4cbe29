//! The portal context: tenant resolution and session for one host, owned
//! together and handed to the route gate by reference.

use tracing::info;

use crate::api::ApiClient;
use crate::config::PortalConfig;
use crate::error::PortalResult;
use crate::gate::{self, GateContext, RouteDecision};
use crate::models::{RegisterRequest, Session, User};
use crate::session::{AuthBackend, RestorePolicy, SessionHolder, SessionState};
use crate::store::{FileStore, LocalStore};
use crate::tenant::{normalize_host, TenantLookup, TenantResolution, TenantResolver};

pub struct Portal<L, B, S> {
    host: String,
    resolver: TenantResolver<L>,
    tenant: TenantResolution,
    session: SessionHolder<B, S>,
}

/// Portal wired to the HTTP backend with a file-backed token.
pub type HttpPortal = Portal<ApiClient, ApiClient, FileStore>;

impl HttpPortal {
    /// Resolves the tenant for `host` and restores any saved session.
    pub async fn boot(config: &PortalConfig, host: &str) -> PortalResult<Self> {
        let api = ApiClient::new(config, host)?;
        let mut portal = Portal::new(
            host,
            api.clone(),
            api,
            FileStore::new(&config.token_path),
            config.restore_policy,
        );
        portal.start().await;
        Ok(portal)
    }
}

impl<L: TenantLookup, B: AuthBackend, S: LocalStore> Portal<L, B, S> {
    pub fn new(host: &str, lookup: L, backend: B, store: S, policy: RestorePolicy) -> Self {
        Self {
            host: normalize_host(host),
            resolver: TenantResolver::new(lookup),
            tenant: TenantResolution::Loading,
            session: SessionHolder::new(backend, store, policy),
        }
    }

    /// Runs the tenant lookup and the session check side by side.
    pub async fn start(&mut self) {
        let (tenant, session) = tokio::join!(
            self.resolver.resolve(&self.host),
            self.session.restore()
        );
        info!(
            host = %self.host,
            tenant = %tenant_label(&tenant),
            signed_in = matches!(session, SessionState::Active(_)),
            "portal ready"
        );
        self.tenant = tenant;
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn tenant(&self) -> &TenantResolution {
        &self.tenant
    }

    pub fn session(&self) -> &SessionState {
        self.session.state()
    }

    pub fn user(&self) -> Option<&User> {
        self.session.user()
    }

    pub fn token(&self) -> Option<&str> {
        self.session.token()
    }

    /// The client the session talks to, for calls made on its behalf.
    pub fn backend(&self) -> &B {
        self.session.backend()
    }

    pub fn gate_context(&self) -> GateContext<'_> {
        GateContext {
            auth_loading: self.session.is_loading(),
            tenant: &self.tenant,
            user: self.session.user(),
        }
    }

    pub fn route(&self, path: &str) -> RouteDecision {
        gate::route(&self.gate_context(), path)
    }

    pub async fn login(&mut self, email: &str, password: &str) -> PortalResult<Session> {
        self.session.login(email, password).await
    }

    pub async fn register(&mut self, new_user: RegisterRequest) -> PortalResult<User> {
        self.session.register(new_user).await
    }

    pub fn logout(&mut self) -> PortalResult<()> {
        self.session.logout()
    }
}

fn tenant_label(resolution: &TenantResolution) -> String {
    match resolution {
        TenantResolution::Loading => "loading".into(),
        TenantResolution::MainSite => "main-site".into(),
        TenantResolution::Found(tenant) => tenant.slug.clone(),
        TenantResolution::NotFound { slug } => format!("{slug} (not found)"),
    }
}
