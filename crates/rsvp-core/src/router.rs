//! Route table, navigation guards, and lazy page loading.
//!
//! Six fixed paths map to pages. The admin dashboard is the only guarded
//! route: [`AuthGuard`] sends unauthenticated visitors to the admin login
//! page instead. Pages are built on first visit through a [`PageFactory`]
//! and cached per route.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use moka::future::Cache;

use crate::error::AppError;
use crate::session::AuthStore;
use crate::traits::PageFactory;

/// Guards may redirect at most this many times per navigation.
pub const MAX_REDIRECTS: usize = 8;

/// Every page the client knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Engagement,
    Wedding,
    Registry,
    AdminLogin,
    AdminDashboard,
}

impl Route {
    /// This route's row in [`ROUTES`].
    pub fn entry(self) -> &'static RouteEntry {
        &ROUTES[self as usize]
    }

    pub fn path(self) -> &'static str {
        self.entry().path
    }

    pub fn name(self) -> &'static str {
        self.entry().name
    }

    pub fn requires_auth(self) -> bool {
        self.entry().requires_auth
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One row of the static route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteEntry {
    pub path: &'static str,
    pub name: &'static str,
    pub route: Route,
    pub requires_auth: bool,
}

/// Indexed by `Route as usize`.
pub static ROUTES: &[RouteEntry] = &[
    RouteEntry {
        path: "/",
        name: "home",
        route: Route::Home,
        requires_auth: false,
    },
    RouteEntry {
        path: "/engagement",
        name: "engagement",
        route: Route::Engagement,
        requires_auth: false,
    },
    RouteEntry {
        path: "/wedding",
        name: "wedding",
        route: Route::Wedding,
        requires_auth: false,
    },
    RouteEntry {
        path: "/registry",
        name: "registry",
        route: Route::Registry,
        requires_auth: false,
    },
    RouteEntry {
        path: "/admin",
        name: "admin-login",
        route: Route::AdminLogin,
        requires_auth: false,
    },
    RouteEntry {
        path: "/admin/dashboard",
        name: "admin-dashboard",
        route: Route::AdminDashboard,
        requires_auth: true,
    },
];

/// Match a URL path against the route table.
///
/// Query strings, fragments and trailing slashes are ignored.
pub fn resolve(path: &str) -> Result<&'static RouteEntry, AppError> {
    let normalized = normalize_path(path);
    ROUTES
        .iter()
        .find(|entry| entry.path == normalized)
        .ok_or_else(|| AppError::RouteNotFound(path.to_string()))
}

/// Look up a route by its name (e.g. `"admin-login"`).
pub fn by_name(name: &str) -> Option<&'static RouteEntry> {
    ROUTES.iter().find(|entry| entry.name == name)
}

fn normalize_path(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

// ---------------------------------------------------------------------------
// Guards
// ---------------------------------------------------------------------------

/// Outcome of a guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Proceed,
    Redirect(Route),
    Deny(String),
}

/// Runs before every route transition.
pub trait NavigationGuard: Send + Sync {
    fn before_each(&self, to: &RouteEntry, from: Option<Route>) -> GuardDecision;
}

/// Sends unauthenticated visitors of `requires_auth` routes to the login page.
#[derive(Debug, Clone)]
pub struct AuthGuard {
    store: AuthStore,
}

impl AuthGuard {
    pub fn new(store: AuthStore) -> Self {
        Self { store }
    }
}

impl NavigationGuard for AuthGuard {
    fn before_each(&self, to: &RouteEntry, _from: Option<Route>) -> GuardDecision {
        if to.requires_auth && !self.store.is_authenticated() {
            return GuardDecision::Redirect(Route::AdminLogin);
        }
        GuardDecision::Proceed
    }
}

// ---------------------------------------------------------------------------
// Lazy page loading
// ---------------------------------------------------------------------------

/// Builds pages on demand and keeps them for later visits.
pub struct PageLoader<F: PageFactory> {
    factory: F,
    cache: Cache<Route, Arc<F::Page>>,
}

impl<F: PageFactory> PageLoader<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            cache: Cache::builder().build(),
        }
    }

    /// Return the page for `route`, constructing it on the first call.
    ///
    /// Concurrent first visits share a single construction. Failed loads are
    /// not cached, so the next visit tries again.
    pub async fn load(&self, route: Route) -> Result<Arc<F::Page>, AppError> {
        self.cache
            .try_get_with(route, async {
                tracing::debug!(%route, "Loading page");
                self.factory.load(route).await.map(Arc::new)
            })
            .await
            .map_err(|e| AppError::PageLoadError {
                route: route.to_string(),
                message: e.to_string(),
            })
    }

    pub fn is_loaded(&self, route: Route) -> bool {
        self.cache.contains_key(&route)
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// A completed navigation.
#[derive(Debug)]
pub struct Navigation<P> {
    /// Route actually shown
    pub route: Route,
    /// Route originally requested, when a guard redirected away from it
    pub redirected_from: Option<Route>,
    pub page: Arc<P>,
}

/// Maps paths to pages, consulting guards before every transition.
pub struct Router<F: PageFactory> {
    guards: Vec<Box<dyn NavigationGuard>>,
    loader: PageLoader<F>,
    current: Mutex<Option<Route>>,
}

impl<F: PageFactory> Router<F> {
    /// Router with no guards.
    pub fn new(factory: F) -> Self {
        Self {
            guards: Vec::new(),
            loader: PageLoader::new(factory),
            current: Mutex::new(None),
        }
    }

    /// Router guarded by [`AuthGuard`] over `store`.
    pub fn with_auth(store: AuthStore, factory: F) -> Self {
        Self::new(factory).with_guard(AuthGuard::new(store))
    }

    /// Append a guard; guards run in insertion order.
    pub fn with_guard(mut self, guard: impl NavigationGuard + 'static) -> Self {
        self.guards.push(Box::new(guard));
        self
    }

    pub fn loader(&self) -> &PageLoader<F> {
        &self.loader
    }

    /// Route of the last completed navigation.
    pub fn current(&self) -> Option<Route> {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Navigate to `path`, applying guards and loading the resulting page.
    pub async fn navigate(&self, path: &str) -> Result<Navigation<F::Page>, AppError> {
        let requested = resolve(path)?;
        self.navigate_to(requested.route).await
    }

    /// Navigate to a route directly.
    pub async fn navigate_to(&self, route: Route) -> Result<Navigation<F::Page>, AppError> {
        let from = self.current();
        let target = self.run_guards(route.entry(), from)?;

        let page = self.loader.load(target).await?;
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(target);

        Ok(Navigation {
            route: target,
            redirected_from: (target != route).then_some(route),
            page,
        })
    }

    /// Settle on the route to show. A redirect re-runs every guard against
    /// the new target.
    fn run_guards(&self, requested: &RouteEntry, from: Option<Route>) -> Result<Route, AppError> {
        let mut target = requested;
        let mut redirects = 0;

        'check: loop {
            for guard in &self.guards {
                match guard.before_each(target, from) {
                    GuardDecision::Proceed => {}
                    GuardDecision::Redirect(next) => {
                        redirects += 1;
                        if redirects > MAX_REDIRECTS {
                            return Err(AppError::RedirectLoop(requested.path.to_string()));
                        }
                        tracing::info!(from = %target.route, to = %next, "Navigation redirected");
                        target = next.entry();
                        continue 'check;
                    }
                    GuardDecision::Deny(reason) => {
                        return Err(AppError::NavigationDenied {
                            path: target.path.to_string(),
                            reason,
                        });
                    }
                }
            }
            return Ok(target.route);
        }
    }
}
