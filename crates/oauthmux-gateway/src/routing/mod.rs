//! Route table and endpoint registration
//!
//! The loader never owns the gateway's routes. It is handed a [`RouteTable`]
//! and only ever adds to it through the [`RouteRegistrar`].

mod registrar;

pub use registrar::{RegisterOutcome, RouteRegistrar};

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use axum::routing::{any_service, on_service, MethodFilter};
use axum::Router;
use http::Method;
use oauthmux_core::{EndpointDefinition, EndpointKind};
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use crate::middleware::{BoxedService, MiddlewareChain};

/// A validated endpoint together with its middleware chain
#[derive(Debug, Clone)]
pub struct Route {
    /// Name of the OAuth server the endpoint belongs to
    pub server: String,
    pub kind: EndpointKind,
    pub endpoint: EndpointDefinition,
    pub chain: MiddlewareChain,
}

impl Route {
    pub fn listen_path(&self) -> &str {
        &self.endpoint.listen_path
    }
}

/// Live routing table of the gateway
pub trait RouteTable: Send + Sync {
    /// Install a route. Conflicting listen paths are resolved by the table.
    fn add(&self, route: Route);
}

/// Route table kept in memory.
///
/// Adding a route whose listen path is already present replaces the earlier
/// route in place, so reloading a definition never duplicates it.
#[derive(Debug, Default)]
pub struct InMemoryRouteTable {
    routes: RwLock<Vec<Route>>,
}

impl InMemoryRouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Route>> {
        self.routes.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Route>> {
        self.routes.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot of the installed routes, in installation order
    pub fn routes(&self) -> Vec<Route> {
        self.read().clone()
    }

    pub fn get(&self, listen_path: &str) -> Option<Route> {
        self.read().iter().find(|r| r.listen_path() == listen_path).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    /// Assemble an axum router serving every installed route.
    ///
    /// `make_handler` produces the innermost service of a route (usually the
    /// upstream proxy); it is wrapped by the route's chain. Method restricted
    /// endpoints also accept `OPTIONS` so CORS preflights reach the chain.
    pub fn into_router<F>(&self, make_handler: F) -> Router
    where
        F: Fn(&Route) -> BoxedService,
    {
        let mut router = Router::new();
        for route in self.read().iter() {
            let Some(path) = axum_path(route.listen_path()) else {
                warn!(
                    server = %route.server,
                    listen_path = %route.listen_path(),
                    "[RouteTable] Listen path cannot be served, skipping"
                );
                continue;
            };

            let service = route.chain.apply(make_handler(route));
            let method_router = if route.endpoint.allows_any_method() {
                any_service(service)
            } else {
                on_service(method_filter(&route.endpoint.methods), service)
            };

            debug!(server = %route.server, kind = %route.kind, path = %path, "[RouteTable] Serving route");
            router = router.route(&path, method_router);
        }
        router.layer(TraceLayer::new_for_http())
    }
}

impl RouteTable for InMemoryRouteTable {
    fn add(&self, route: Route) {
        let mut routes = self.write();
        match routes.iter_mut().find(|r| r.listen_path() == route.listen_path()) {
            Some(existing) => {
                debug!(
                    listen_path = %route.listen_path(),
                    previous = %existing.server,
                    "[RouteTable] Replacing route"
                );
                *existing = route;
            }
            None => routes.push(route),
        }
    }
}

/// Methods an endpoint accepts, plus `OPTIONS`
fn method_filter(methods: &[String]) -> MethodFilter {
    methods
        .iter()
        .filter_map(|m| Method::from_bytes(m.trim().to_ascii_uppercase().as_bytes()).ok())
        .filter_map(|m| MethodFilter::try_from(m).ok())
        .fold(MethodFilter::OPTIONS, MethodFilter::or)
}

/// Translate a listen path into axum route syntax.
///
/// A trailing `/*` matches everything below the prefix. Paths using axum's
/// own capture syntax are rejected.
fn axum_path(listen_path: &str) -> Option<String> {
    let (prefix, catch_all) = match listen_path.strip_suffix("/*") {
        Some(prefix) => (prefix, true),
        None => (listen_path, false),
    };
    let reserved = prefix.contains(['{', '}', '*'])
        || prefix.split('/').any(|segment| segment.starts_with(':'));
    if reserved {
        return None;
    }

    Some(if catch_all {
        format!("{}/{{*path}}", prefix)
    } else {
        prefix.to_string()
    })
}
