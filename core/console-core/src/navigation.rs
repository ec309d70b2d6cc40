//! Console routes and the private-route guard.

use blog_console_protocol::Role;
use std::fmt;

use crate::session::SessionSnapshot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Dashboard,
    Blogs,
    BlogDetail(i64),
    CreateBlog,
    EditBlog(i64),
    Users,
    Profile,
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Dashboard => "/".to_string(),
            Route::Blogs => "/blogs".to_string(),
            Route::BlogDetail(id) => format!("/blogs/{}", id),
            Route::CreateBlog => "/blogs/create".to_string(),
            Route::EditBlog(id) => format!("/blogs/{}/edit", id),
            Route::Users => "/users".to_string(),
            Route::Profile => "/profile".to_string(),
        }
    }

    pub fn parse(path: &str) -> Option<Route> {
        let trimmed = path.trim_end_matches('/');
        let segments: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] => Some(Route::Dashboard),
            ["login"] => Some(Route::Login),
            ["blogs"] => Some(Route::Blogs),
            ["blogs", "create"] => Some(Route::CreateBlog),
            ["blogs", id] => id.parse().ok().map(Route::BlogDetail),
            ["blogs", id, "edit"] => id.parse().ok().map(Route::EditBlog),
            ["users"] => Some(Route::Users),
            ["profile"] => Some(Route::Profile),
            _ => None,
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, Route::Login)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Navigation side effects.
///
/// `navigate` is an in-app transition that keeps in-memory state.
/// `hard_redirect` is a full reset: everything in memory is discarded.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &Route);
    fn hard_redirect(&self, route: &Route);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Render,
    RedirectToLogin { from: Route },
    Forbidden,
}

/// Private-route guard. Only token presence gates access; identity may still
/// be loading. Once identity is known, the users route requires an admin.
pub fn guard(route: &Route, snapshot: &SessionSnapshot) -> RouteDecision {
    if route.is_public() {
        return RouteDecision::Render;
    }
    if !snapshot.token_present {
        return RouteDecision::RedirectToLogin {
            from: route.clone(),
        };
    }
    if *route == Route::Users {
        if let Some(identity) = snapshot.identity.as_ref() {
            if !identity.role().can_manage_users() {
                return RouteDecision::Forbidden;
            }
        }
    }
    RouteDecision::Render
}

/// Where to go after a successful login.
pub fn post_login_destination(from: Option<&Route>) -> Route {
    match from {
        Some(route) if !route.is_public() => route.clone(),
        _ => Route::Dashboard,
    }
}

pub fn role_label(role: &str) -> &str {
    match Role::parse(role) {
        Role::Unknown => role.trim_start_matches("ROLE_"),
        known => known.label(),
    }
}
