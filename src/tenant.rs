//! Tenant resolution from the request hostname.
//!
//! `{slug}.{root-domain}` selects a tenant; the bare root domain and the
//! reserved `www`/`app`/`api` labels are the main site.

use std::net::IpAddr;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{PortalError, PortalResult};
use crate::models::Tenant;
use crate::store::LocalStore;

/// Left-most labels that never name a tenant.
pub const RESERVED_LABELS: [&str; 3] = ["www", "app", "api"];

const MAX_SLUG_LEN: usize = 63;

/// Host without port, lower-cased, trailing root dot removed.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim();
    let host = if let Some(rest) = host.strip_prefix('[') {
        // [v6]:port
        rest.split(']').next().unwrap_or(rest)
    } else if host.matches(':').count() == 1 {
        host.split(':').next().unwrap_or(host)
    } else {
        host
    };
    host.trim_end_matches('.').to_ascii_lowercase()
}

/// The tenant slug encoded in `host`, if any.
pub fn subdomain_of(host: &str) -> Option<String> {
    let host = normalize_host(host);
    if host.parse::<IpAddr>().is_ok() {
        return None;
    }

    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() <= 2 {
        return None;
    }
    let label = labels[0];
    if label.is_empty() || RESERVED_LABELS.contains(&label) {
        return None;
    }
    Some(label.to_owned())
}

pub fn is_reserved(slug: &str) -> bool {
    RESERVED_LABELS.contains(&slug)
}

/// Checks a slug before it is offered to onboarding.
pub fn validate_slug(slug: &str) -> PortalResult<()> {
    if slug.is_empty() || slug.len() > MAX_SLUG_LEN {
        return Err(PortalError::Validation(format!(
            "slug must be 1-{MAX_SLUG_LEN} characters"
        )));
    }
    if !slug
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    {
        return Err(PortalError::Validation(format!(
            "slug {slug:?} may only contain a-z, 0-9 and '-'"
        )));
    }
    if is_reserved(slug) {
        return Err(PortalError::Validation(format!("slug {slug:?} is reserved")));
    }
    Ok(())
}

/// Derives a slug from an institution name ("Acme Academy" -> "acme-academy").
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect()
}

pub fn tenant_base_url(root_domain: &str, slug: Option<&str>) -> String {
    match slug {
        Some(slug) => format!("https://{slug}.{root_domain}"),
        None => format!("https://{root_domain}"),
    }
}

/// API base for requests made from `host`.
pub fn api_base_url(root_domain: &str, host: &str) -> String {
    if subdomain_of(host).is_some() {
        format!("https://{}/api", normalize_host(host))
    } else {
        format!("https://{root_domain}/api")
    }
}

/// Outcome of resolving a hostname.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TenantResolution {
    #[default]
    Loading,
    MainSite,
    Found(Tenant),
    NotFound { slug: String },
}

impl TenantResolution {
    pub fn is_loading(&self) -> bool {
        matches!(self, TenantResolution::Loading)
    }

    pub fn tenant(&self) -> Option<&Tenant> {
        match self {
            TenantResolution::Found(tenant) => Some(tenant),
            _ => None,
        }
    }
}

/// Fetches a tenant record by slug. `Ok(None)` means the backend has no such tenant.
#[async_trait]
pub trait TenantLookup: Send + Sync {
    async fn find_tenant(&self, slug: &str) -> PortalResult<Option<Tenant>>;
}

pub struct TenantResolver<L> {
    lookup: L,
}

impl<L: TenantLookup> TenantResolver<L> {
    pub fn new(lookup: L) -> Self {
        Self { lookup }
    }

    pub async fn resolve(&self, host: &str) -> TenantResolution {
        let Some(slug) = subdomain_of(host) else {
            debug!(host, "no tenant label, main site");
            return TenantResolution::MainSite;
        };

        debug!(host, slug = %slug, "looking up tenant");
        match self.lookup.find_tenant(&slug).await {
            Ok(Some(tenant)) => TenantResolution::Found(tenant),
            Ok(None) => {
                warn!(slug = %slug, "tenant does not exist");
                TenantResolution::NotFound { slug }
            }
            Err(e) => {
                warn!(slug = %slug, error = %e, "tenant lookup failed");
                TenantResolution::NotFound { slug }
            }
        }
    }
}

/// The tenants a user belongs to, with one selected.
#[derive(Debug)]
pub struct TenantDirectory<S> {
    tenants: Vec<Tenant>,
    current: Option<usize>,
    store: S,
}

impl<S: LocalStore> TenantDirectory<S> {
    /// Selects the remembered tenant if it is still in the list, else the first.
    pub fn load(tenants: Vec<Tenant>, store: S) -> PortalResult<Self> {
        let saved = store.load()?;
        let current = saved
            .and_then(|id| tenants.iter().position(|t| t.id == id))
            .or(if tenants.is_empty() { None } else { Some(0) });
        Ok(Self {
            tenants,
            current,
            store,
        })
    }

    pub fn tenants(&self) -> &[Tenant] {
        &self.tenants
    }

    pub fn current(&self) -> Option<&Tenant> {
        self.current.map(|i| &self.tenants[i])
    }

    /// Unknown ids leave the selection unchanged.
    pub fn switch(&mut self, tenant_id: &str) -> PortalResult<&Tenant> {
        let index = self
            .tenants
            .iter()
            .position(|t| t.id == tenant_id)
            .ok_or_else(|| PortalError::NotFound(format!("tenant {tenant_id}")))?;
        self.store.save(tenant_id)?;
        self.current = Some(index);
        Ok(&self.tenants[index])
    }

    /// Adds a freshly created tenant and selects it.
    pub fn insert(&mut self, tenant: Tenant) -> PortalResult<()> {
        self.store.save(&tenant.id)?;
        self.tenants.push(tenant);
        self.current = Some(self.tenants.len() - 1);
        Ok(())
    }
}
