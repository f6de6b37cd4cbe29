use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

const MIB: u64 = 1024 * 1024;
const GIB: u64 = 1024 * MIB;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TenantStatus {
    #[default]
    Active,
    Inactive,
    Suspended,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Starter,
    Professional,
    Enterprise,
}

impl SubscriptionTier {
    /// Feature flags and quotas a tier grants. `None` limits mean unlimited.
    pub fn features(self) -> TenantFeatures {
        use SubscriptionTier::*;

        let paid = self >= Starter;
        let pro = self >= Professional;
        TenantFeatures {
            custom_domain: pro,
            advanced_analytics: pro,
            api_access: pro,
            white_label: pro,
            payment_integration: paid,
            scorm_support: paid,
            multi_branch: pro,
            sso_integration: self == Enterprise,
            storage_limit: Some(match self {
                Free => 500 * MIB,
                Starter => 5 * GIB,
                Professional => 50 * GIB,
                Enterprise => 250 * GIB,
            }),
            max_students: match self {
                Free => Some(50),
                Starter => Some(500),
                Professional => Some(2000),
                Enterprise => None,
            },
            max_courses: match self {
                Free => Some(3),
                Starter => Some(20),
                Professional | Enterprise => None,
            },
            max_instructors: match self {
                Free => Some(5),
                Starter => Some(20),
                Professional => Some(100),
                Enterprise => None,
            },
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct TenantFeatures {
    pub custom_domain: bool,
    pub advanced_analytics: bool,
    pub api_access: bool,
    pub white_label: bool,
    pub payment_integration: bool,
    pub scorm_support: bool,
    pub multi_branch: bool,
    pub sso_integration: bool,
    pub storage_limit: Option<u64>,
    pub max_students: Option<u64>,
    pub max_courses: Option<u64>,
    pub max_instructors: Option<u64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct TenantBranding {
    pub logo_url: Option<String>,
    pub primary_color: String,
    pub secondary_color: String,
    pub accent_color: String,
}

impl Default for TenantBranding {
    fn default() -> Self {
        Self {
            logo_url: None,
            primary_color: "#3b82f6".into(),
            secondary_color: "#1e40af".into(),
            accent_color: "#60a5fa".into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct TenantSettings {
    pub timezone: String,
    pub currency: String,
    pub language: String,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
}

impl Default for TenantSettings {
    fn default() -> Self {
        Self {
            timezone: "UTC".into(),
            currency: "USD".into(),
            language: "en".into(),
            contact_email: None,
            contact_phone: None,
        }
    }
}

/// An institution served from its own subdomain.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Tenant {
    pub id: String,
    pub name: String,
    /// URL-safe identifier, unique across the system (e.g. `acme`).
    pub slug: String,
    #[serde(default)]
    pub subdomain: Option<String>,
    #[serde(default)]
    pub status: TenantStatus,
    #[serde(default)]
    pub subscription_tier: SubscriptionTier,
    #[serde(default)]
    pub settings: TenantSettings,
    #[serde(default)]
    pub branding: TenantBranding,
    /// Flags as reported by the backend; derived from the tier when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<TenantFeatures>,
    /// Whether a tenant admin has finished the setup flow.
    #[serde(default)]
    pub is_setup: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Tenant {
    pub fn features(&self) -> TenantFeatures {
        self.features
            .clone()
            .unwrap_or_else(|| self.subscription_tier.features())
    }

    pub fn is_active(&self) -> bool {
        self.status == TenantStatus::Active
    }
}

/// Role carried by a user record.
///
/// Unknown role strings are kept verbatim in `Unrecognized` so a record
/// from a newer backend still deserializes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum UserRole {
    Student,
    Instructor,
    Admin,
    TenantAdmin,
    Unrecognized(String),
}

impl UserRole {
    pub fn as_str(&self) -> &str {
        match self {
            UserRole::Student => "student",
            UserRole::Instructor => "instructor",
            UserRole::Admin => "admin",
            UserRole::TenantAdmin => "tenant_admin",
            UserRole::Unrecognized(other) => other,
        }
    }
}

impl From<String> for UserRole {
    fn from(value: String) -> Self {
        match value.as_str() {
            "student" => UserRole::Student,
            "instructor" => UserRole::Instructor,
            "admin" => UserRole::Admin,
            "tenant_admin" => UserRole::TenantAdmin,
            _ => UserRole::Unrecognized(value),
        }
    }
}

impl From<&str> for UserRole {
    fn from(value: &str) -> Self {
        UserRole::from(value.to_owned())
    }
}

impl From<UserRole> for String {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Unrecognized(other) => other,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub full_name: String,
    pub email: String,
    pub role: UserRole,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

/// A logged-in user together with the bearer token that authenticates them.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user: User,
    pub token: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: UserRole,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RegisterResponse {
    pub user: User,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CurrentUserResponse {
    pub user: User,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CurrentTenantResponse {
    pub tenant: Tenant,
}

/// Onboarding payload: a new institution plus its first administrator.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateTenant {
    pub name: String,
    pub slug: String,
    pub admin_email: String,
    pub admin_name: String,
    pub admin_password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<TenantSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branding: Option<TenantBranding>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateTenantResponse {
    pub tenant: Tenant,
    #[serde(default)]
    pub redirect_url: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SlugAvailability {
    pub available: bool,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// Claims the client reads from a JWT bearer token.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TokenClaims {
    #[serde(default)]
    pub sub: Option<serde_json::Value>,
    #[serde(default)]
    pub exp: Option<u64>,
    #[serde(default)]
    pub iat: Option<u64>,
}
