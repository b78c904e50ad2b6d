//! Navigation routes and the authentication guard

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    Login,
    Register,
    Dashboard,
    Transfer,
    NotFound,
}

impl Route {
    /// Routes offered in navigation menus
    pub const NAVIGABLE: [Route; 4] = [Route::Login, Route::Register, Route::Dashboard, Route::Transfer];

    /// Map a path to a route; `/` is the dashboard
    pub fn from_path(path: &str) -> Route {
        let path = path.split(['?', '#']).next().unwrap_or(path);
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" | "/dashboard" => Route::Dashboard,
            "/login" => Route::Login,
            "/register" => Route::Register,
            "/transfer" => Route::Transfer,
            _ => Route::NotFound,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Register => "/register",
            Route::Dashboard => "/dashboard",
            Route::Transfer => "/transfer",
            Route::NotFound => "/404",
        }
    }

    /// Name used in logs and scope labels
    pub fn name(&self) -> &'static str {
        match self {
            Route::Login => "login",
            Route::Register => "register",
            Route::Dashboard => "dashboard",
            Route::Transfer => "transfer",
            Route::NotFound => "not_found",
        }
    }

    /// Menu label
    pub fn title(&self) -> &'static str {
        match self {
            Route::Login => "Accedi",
            Route::Register => "Registrati",
            Route::Dashboard => "Dashboard",
            Route::Transfer => "Nuovo bonifico",
            Route::NotFound => "Pagina non trovata",
        }
    }

    pub fn requires_auth(&self) -> bool {
        matches!(self, Route::Dashboard | Route::Transfer)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Decides where a navigation request actually lands
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteGuard;

impl RouteGuard {
    /// Protected routes without an authenticated session become [`Route::Login`]
    pub fn resolve(route: Route, session: &Session) -> Route {
        if route.requires_auth() && !session.is_authenticated() {
            Route::Login
        } else {
            route
        }
    }
}
