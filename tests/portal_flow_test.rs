mod common;

use lms_portal::gate::{Layout, Page, RouteDecision, View};
use lms_portal::models::{RegisterRequest, UserRole};
use lms_portal::session::{RestorePolicy, SessionState};
use lms_portal::tenant::TenantResolution;
use lms_portal::{HttpPortal, PortalError};

use common::{config_for, dead_address, issue_token, spawn_backend, temp_dir, valid_token};

#[tokio::test]
async fn test_login_persists_and_restores_session() {
    let addr = spawn_backend().await;
    let dir = temp_dir("restore");
    let config = config_for(addr, &dir);

    let mut portal = HttpPortal::boot(&config, "acme.xyz.com").await.unwrap();
    assert!(portal.tenant().tenant().is_some());
    assert_eq!(portal.session(), &SessionState::LoggedOut);
    assert_eq!(portal.route("/"), RouteDecision::Public(View::Page(Page::Home)));

    let session = portal.login("ada@acme.edu", "correct horse").await.unwrap();
    assert_eq!(session.user.role, UserRole::Student);
    let saved = std::fs::read_to_string(&config.token_path).unwrap();
    assert_eq!(saved.trim(), session.token);

    let mut restored = HttpPortal::boot(&config, "acme.xyz.com").await.unwrap();
    assert_eq!(restored.user().map(|u| u.id.as_str()), Some("u-ada"));
    assert_eq!(
        restored.route("/grades"),
        RouteDecision::Dashboard {
            layout: Layout::Student,
            view: View::Page(Page::Grades),
        }
    );

    restored.logout().unwrap();
    assert!(!config.token_path.exists());
    let after = HttpPortal::boot(&config, "acme.xyz.com").await.unwrap();
    assert_eq!(after.session(), &SessionState::LoggedOut);
}

#[tokio::test]
async fn test_failed_login_leaves_no_token() {
    let addr = spawn_backend().await;
    let dir = temp_dir("failed_login");
    let config = config_for(addr, &dir);

    let mut portal = HttpPortal::boot(&config, "acme.xyz.com").await.unwrap();
    let err = portal.login("ada@acme.edu", "nope").await.unwrap_err();
    assert!(matches!(err, PortalError::Unauthorized(_)));
    assert_eq!(portal.session(), &SessionState::LoggedOut);
    assert!(!config.token_path.exists());
}

#[tokio::test]
async fn test_rejected_token_is_cleared_on_boot() {
    let addr = spawn_backend().await;
    let dir = temp_dir("rejected_token");
    let config = config_for(addr, &dir);
    std::fs::write(&config.token_path, "forged.token.value").unwrap();

    let portal = HttpPortal::boot(&config, "acme.xyz.com").await.unwrap();
    assert_eq!(portal.session(), &SessionState::LoggedOut);
    assert!(!config.token_path.exists());
}

#[tokio::test]
async fn test_expired_token_is_cleared_without_backend() {
    let addr = dead_address().await;
    let dir = temp_dir("expired_token");
    let config = config_for(addr, &dir);
    std::fs::write(&config.token_path, issue_token("ada@acme.edu", 1_000)).unwrap();

    let portal = HttpPortal::boot(&config, "acme.xyz.com").await.unwrap();
    assert_eq!(portal.session(), &SessionState::LoggedOut);
    assert!(!config.token_path.exists());
}

#[tokio::test]
async fn test_unreachable_backend_restore_policy() {
    let addr = dead_address().await;

    let dir = temp_dir("keep_token");
    let config = lms_portal::config::PortalConfig {
        restore_policy: RestorePolicy::KeepOnTransient,
        ..config_for(addr, &dir)
    };
    std::fs::write(&config.token_path, valid_token("ada@acme.edu")).unwrap();
    let portal = HttpPortal::boot(&config, "acme.xyz.com").await.unwrap();
    assert_eq!(portal.session(), &SessionState::LoggedOut);
    assert!(config.token_path.exists());

    let dir = temp_dir("clear_token");
    let config = config_for(addr, &dir);
    std::fs::write(&config.token_path, valid_token("ada@acme.edu")).unwrap();
    let portal = HttpPortal::boot(&config, "acme.xyz.com").await.unwrap();
    assert_eq!(portal.session(), &SessionState::LoggedOut);
    assert!(!config.token_path.exists());
}

#[tokio::test]
async fn test_tenant_admin_sent_to_setup() {
    let addr = spawn_backend().await;
    let dir = temp_dir("setup");
    let config = config_for(addr, &dir);

    let mut portal = HttpPortal::boot(&config, "acme.xyz.com").await.unwrap();
    portal.login("owner@acme.edu", "correct horse").await.unwrap();

    assert_eq!(
        portal.route("/users"),
        RouteDecision::TenantSetup(View::Redirect("/tenant/setup".into()))
    );
    assert_eq!(
        portal.route("/tenant/setup"),
        RouteDecision::TenantSetup(View::Page(Page::TenantSetup))
    );
}

#[tokio::test]
async fn test_unknown_tenant_and_unknown_role() {
    let addr = spawn_backend().await;
    let dir = temp_dir("unknown");
    let config = config_for(addr, &dir);

    let mut ghost = HttpPortal::boot(&config, "ghost.xyz.com").await.unwrap();
    assert_eq!(ghost.tenant(), &TenantResolution::NotFound { slug: "ghost".into() });
    assert_eq!(ghost.route("/login"), RouteDecision::Public(View::Page(Page::Login)));
    ghost.login("ada@acme.edu", "correct horse").await.unwrap();
    assert_eq!(
        ghost.route("/"),
        RouteDecision::TenantNotFound { slug: "ghost".into() }
    );

    let mut acme = HttpPortal::boot(&config, "acme.xyz.com").await.unwrap();
    acme.login("cfo@acme.edu", "correct horse").await.unwrap();
    assert_eq!(
        acme.route("/"),
        RouteDecision::UnrecognizedRole { role: "finance".into() }
    );
}

#[tokio::test]
async fn test_register_without_token_stays_logged_out() {
    let addr = spawn_backend().await;
    let dir = temp_dir("register");
    let config = config_for(addr, &dir);

    let mut portal = HttpPortal::boot(&config, "acme.xyz.com").await.unwrap();
    let user = portal
        .register(RegisterRequest {
            email: "new@acme.edu".into(),
            password: "longenough".into(),
            full_name: "New Student".into(),
            role: UserRole::Student,
        })
        .await
        .unwrap();
    assert_eq!(user.email, "new@acme.edu");
    assert_eq!(portal.session(), &SessionState::LoggedOut);
    assert!(!config.token_path.exists());
}

#[tokio::test]
async fn test_main_site_skips_tenant_lookup() {
    let addr = dead_address().await;
    let dir = temp_dir("main_site");
    let portal = HttpPortal::boot(&config_for(addr, &dir), "www.xyz.com").await.unwrap();
    assert_eq!(portal.tenant(), &TenantResolution::MainSite);
    assert_eq!(
        portal.route("/tenant/onboarding"),
        RouteDecision::Public(View::Page(Page::TenantOnboarding))
    );
}

#[tokio::test]
async fn test_logout_clears_kept_token_while_backend_is_down() {
    let addr = dead_address().await;
    let dir = temp_dir("logout_offline");
    let config = lms_portal::config::PortalConfig {
        restore_policy: RestorePolicy::KeepOnTransient,
        ..config_for(addr, &dir)
    };
    std::fs::write(&config.token_path, valid_token("ada@acme.edu")).unwrap();

    let mut portal = HttpPortal::boot(&config, "xyz.com").await.unwrap();
    assert!(config.token_path.exists());
    portal.logout().unwrap();
    assert!(!config.token_path.exists());
}

#[tokio::test]
async fn test_portal_client_lists_member_tenants() {
    let addr = spawn_backend().await;
    let dir = temp_dir("member_tenants");
    let config = config_for(addr, &dir);

    let mut portal = HttpPortal::boot(&config, "acme.xyz.com").await.unwrap();
    portal.login("owner@acme.edu", "correct horse").await.unwrap();
    let token = portal.token().unwrap().to_owned();

    let tenants = portal.backend().my_tenants(&token).await.unwrap();
    let slugs: Vec<&str> = tenants.iter().map(|t| t.slug.as_str()).collect();
    assert_eq!(slugs, ["acme", "globex"]);
    assert_eq!(portal.backend().host(), "acme.xyz.com");
}
