//! Route gate: picks the top-level layout and page for a request path.
//!
//! Order of precedence:
//! 1. anything still loading -> `Loading`
//! 2. no user -> public layout, whatever the tenant state
//! 3. tenant lookup failed -> tenant-not-found
//! 4. tenant admin of a tenant that is not set up -> setup flow only
//! 5. `/unauthorized`
//! 6. one dashboard layout per role

use serde::Serialize;
use tracing::warn;

use crate::models::{User, UserRole};
use crate::tenant::TenantResolution;

pub const SETUP_PATH: &str = "/tenant/setup";

/// Everything the gate looks at.
#[derive(Debug, Clone, Copy)]
pub struct GateContext<'a> {
    pub auth_loading: bool,
    pub tenant: &'a TenantResolution,
    pub user: Option<&'a User>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    Student,
    Instructor,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    // public
    Home,
    CourseCatalog,
    CourseDetail { id: String },
    About,
    Contact,
    Login,
    Register,
    ForgotPassword,
    TenantOnboarding,
    // setup
    TenantSetup,
    // student
    StudentDashboard,
    MyCourses,
    CoursePlayer { id: String },
    Assignments,
    Grades,
    Certificates,
    Profile,
    // instructor
    InstructorDashboard,
    CourseManagement,
    CourseBuilder { id: Option<String> },
    AssessmentBuilder,
    Gradebook,
    Attendance,
    Analytics,
    // admin and tenant admin
    AdminDashboard,
    UserManagement,
    AdminCourseManagement,
    EnrollmentManagement,
    PaymentManagement,
    CertificateManagement,
    InstitutionSettings,
    Reports,
}

/// What a layout shows for the requested path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Page(Page),
    Redirect(String),
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteDecision {
    Loading,
    Public(View),
    TenantNotFound { slug: String },
    TenantSetup(View),
    Dashboard { layout: Layout, view: View },
    Unauthorized,
    /// Terminal: a role no layout exists for.
    UnrecognizedRole { role: String },
}

/// Path segments with query, fragment and empty segments removed.
pub fn segments(path: &str) -> Vec<&str> {
    let path = path.split(['?', '#']).next().unwrap_or("");
    path.split('/').filter(|s| !s.is_empty()).collect()
}

pub fn route(ctx: &GateContext<'_>, path: &str) -> RouteDecision {
    if ctx.auth_loading || ctx.tenant.is_loading() {
        return RouteDecision::Loading;
    }

    let segs = segments(path);

    let Some(user) = ctx.user else {
        return RouteDecision::Public(public_view(&segs));
    };

    if let TenantResolution::NotFound { slug } = ctx.tenant {
        return RouteDecision::TenantNotFound { slug: slug.clone() };
    }

    if user.role == UserRole::TenantAdmin && !ctx.tenant.tenant().is_some_and(|t| t.is_setup) {
        let view = match segs.as_slice() {
            ["tenant", "setup"] => View::Page(Page::TenantSetup),
            _ => View::Redirect(SETUP_PATH.to_owned()),
        };
        return RouteDecision::TenantSetup(view);
    }

    if matches!(segs.as_slice(), ["unauthorized"]) {
        return RouteDecision::Unauthorized;
    }

    let (layout, view) = match &user.role {
        UserRole::Student => (Layout::Student, student_view(&segs)),
        UserRole::Instructor => (Layout::Instructor, instructor_view(&segs)),
        UserRole::Admin | UserRole::TenantAdmin => (Layout::Admin, admin_view(&segs)),
        UserRole::Unrecognized(role) => {
            warn!(user = %user.email, role = %role, "no layout for role");
            return RouteDecision::UnrecognizedRole { role: role.clone() };
        }
    };
    RouteDecision::Dashboard { layout, view }
}

fn public_view(segs: &[&str]) -> View {
    let page = match segs {
        [] => Page::Home,
        ["courses"] => Page::CourseCatalog,
        ["courses", id] => Page::CourseDetail { id: (*id).to_owned() },
        ["about"] => Page::About,
        ["contact"] => Page::Contact,
        ["login"] => Page::Login,
        ["register"] => Page::Register,
        ["forgot-password"] => Page::ForgotPassword,
        ["tenant", "onboarding"] => Page::TenantOnboarding,
        _ => return View::Redirect("/".to_owned()),
    };
    View::Page(page)
}

fn student_view(segs: &[&str]) -> View {
    let page = match segs {
        [] | ["dashboard"] => Page::StudentDashboard,
        ["my-courses"] => Page::MyCourses,
        ["course", id] => Page::CoursePlayer { id: (*id).to_owned() },
        ["assignments"] => Page::Assignments,
        ["grades"] => Page::Grades,
        ["certificates"] => Page::Certificates,
        ["profile"] => Page::Profile,
        _ => return View::NotFound,
    };
    View::Page(page)
}

fn instructor_view(segs: &[&str]) -> View {
    let page = match segs {
        [] | ["dashboard"] => Page::InstructorDashboard,
        ["courses"] => Page::CourseManagement,
        ["course-builder"] => Page::CourseBuilder { id: None },
        ["course-builder", id] => Page::CourseBuilder {
            id: Some((*id).to_owned()),
        },
        ["assessment-builder"] => Page::AssessmentBuilder,
        ["gradebook"] => Page::Gradebook,
        ["attendance"] => Page::Attendance,
        ["analytics"] => Page::Analytics,
        _ => return View::NotFound,
    };
    View::Page(page)
}

fn admin_view(segs: &[&str]) -> View {
    let page = match segs {
        [] | ["dashboard"] => Page::AdminDashboard,
        ["users"] => Page::UserManagement,
        ["courses"] => Page::AdminCourseManagement,
        ["enrollments"] => Page::EnrollmentManagement,
        ["payments"] => Page::PaymentManagement,
        ["certificates"] => Page::CertificateManagement,
        ["settings"] => Page::InstitutionSettings,
        ["reports"] => Page::Reports,
        _ => return View::NotFound,
    };
    View::Page(page)
}
