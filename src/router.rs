//! The router: registration surface and the dispatch pipeline.
//!
//! Registration (routes, groups, filters, tokens, fallbacks) takes
//! `&mut self` and happens during the build phase. Matching and dispatch
//! take `&self` and are safe to run from several threads once registration
//! is done; no per-request call mutates shared state.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::callback::{Callback, CallbackResolver, DefaultResolver, HandlerFn, Invocation};
use crate::collection::{MatchOutcome, MatchStatus, Route, RouteCollection};
use crate::error::RouterError;
use crate::groups::{GroupOptions, GroupStack, RouteOptions};
use crate::method::Method;

/// Ambient source for request method, path and host.
///
/// Consulted whenever a dispatch call omits one of them; hosting
/// environments implement this over their request object.
pub trait RequestContext: Send + Sync {
    /// Request method, if known.
    fn method(&self) -> Option<Method> {
        None
    }

    /// Request path, if known.
    fn path(&self) -> Option<String> {
        None
    }

    /// Request host, if known.
    fn host(&self) -> Option<String> {
        None
    }
}

/// Dispatch input. Omitted parts are filled from the [`RequestContext`].
#[derive(Debug, Clone, Default)]
pub struct Request {
    /// Request method.
    pub method: Option<Method>,
    /// Request path; normalized to leading-slash, no-trailing-slash form.
    pub path: Option<String>,
    /// Request host; `None` restricts matching to wildcard-host routes.
    pub host: Option<String>,
}

impl Request {
    /// A request with method and path.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method: Some(method),
            path: Some(path.into()),
            host: None,
        }
    }

    /// Attach a host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }
}

impl From<(Method, &str)> for Request {
    fn from((method, path): (Method, &str)) -> Self {
        Request::new(method, path)
    }
}

impl From<(Method, &str, &str)> for Request {
    fn from((method, path, host): (Method, &str, &str)) -> Self {
        Request::new(method, path).with_host(host)
    }
}

/// A fully resolved match: everything [`Router::dispatch`] executes.
///
/// For 404/405 outcomes this carries the configured fallback callback with
/// empty filter lists; fallbacks never run filters.
#[derive(Debug, Clone)]
pub struct ResolvedMatch {
    /// Outcome status (also the HTTP status code to emit).
    pub status: MatchStatus,
    /// Handler (or fallback) reference to execute.
    pub callback: Callback,
    /// Before-filter names, in execution order.
    pub before: Vec<String>,
    /// After-filter names, in execution order.
    pub after: Vec<String>,
    /// Captured positional values.
    pub args: Vec<String>,
}

/// Route registration and dispatch.
///
/// ```
/// use serde_json::json;
/// use signpost::{from_fn, Method, RouteOptions, Router};
///
/// let mut router = Router::new();
/// router.get(
///     "/hello/(:any)",
///     from_fn(|inv| Ok(json!(format!("hello {}", inv.args[0])))),
///     RouteOptions::new(),
/// );
///
/// let response = router.dispatch((Method::Get, "/hello/world"))?;
/// assert_eq!(response, json!("hello world"));
/// # Ok::<(), signpost::RouterError>(())
/// ```
pub struct Router {
    collection: RouteCollection,
    groups: GroupStack,
    filters: HashMap<String, Callback>,
    resolver: Arc<dyn CallbackResolver>,
    context: Option<Arc<dyn RequestContext>>,
    not_found: Option<Callback>,
    method_not_allowed: Option<Callback>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Status code for a full match.
    pub const OK: u16 = 200;
    /// Status code when no pattern matches the path.
    pub const NOT_FOUND: u16 = 404;
    /// Status code when a pattern matches the path but not the method.
    pub const METHOD_NOT_ALLOWED: u16 = 405;

    /// A router with the default resolver (bound callbacks only).
    pub fn new() -> Self {
        Self {
            collection: RouteCollection::new(),
            groups: GroupStack::new(),
            filters: HashMap::new(),
            resolver: Arc::new(DefaultResolver),
            context: None,
            not_found: None,
            method_not_allowed: None,
        }
    }

    /// A router using the given resolver for symbolic references.
    pub fn with_resolver(resolver: Arc<dyn CallbackResolver>) -> Self {
        let mut router = Self::new();
        router.resolver = resolver;
        router
    }

    // =========================================================================
    // Registration (build phase)
    // =========================================================================

    /// Register a route for one or more methods.
    pub fn add(
        &mut self,
        methods: &[Method],
        pattern: &str,
        callback: impl Into<Callback>,
        options: RouteOptions,
    ) -> &mut Self {
        let grouped = self.groups.apply(pattern, options);
        self.collection.add(Route {
            pattern: grouped.pattern,
            host: grouped.host,
            methods: methods.to_vec(),
            before: grouped.before,
            after: grouped.after,
            callback: callback.into(),
            name: grouped.name,
        });
        self
    }

    /// Register a GET route.
    pub fn get(
        &mut self,
        pattern: &str,
        callback: impl Into<Callback>,
        options: RouteOptions,
    ) -> &mut Self {
        self.add(&[Method::Get], pattern, callback, options)
    }

    /// Register a POST route.
    pub fn post(
        &mut self,
        pattern: &str,
        callback: impl Into<Callback>,
        options: RouteOptions,
    ) -> &mut Self {
        self.add(&[Method::Post], pattern, callback, options)
    }

    /// Register a PUT route.
    pub fn put(
        &mut self,
        pattern: &str,
        callback: impl Into<Callback>,
        options: RouteOptions,
    ) -> &mut Self {
        self.add(&[Method::Put], pattern, callback, options)
    }

    /// Register a DELETE route.
    pub fn delete(
        &mut self,
        pattern: &str,
        callback: impl Into<Callback>,
        options: RouteOptions,
    ) -> &mut Self {
        self.add(&[Method::Delete], pattern, callback, options)
    }

    /// Register a PATCH route.
    pub fn patch(
        &mut self,
        pattern: &str,
        callback: impl Into<Callback>,
        options: RouteOptions,
    ) -> &mut Self {
        self.add(&[Method::Patch], pattern, callback, options)
    }

    /// Register a HEAD route.
    pub fn head(
        &mut self,
        pattern: &str,
        callback: impl Into<Callback>,
        options: RouteOptions,
    ) -> &mut Self {
        self.add(&[Method::Head], pattern, callback, options)
    }

    /// Register an OPTIONS route.
    pub fn options(
        &mut self,
        pattern: &str,
        callback: impl Into<Callback>,
        options: RouteOptions,
    ) -> &mut Self {
        self.add(&[Method::Options], pattern, callback, options)
    }

    /// Register a CONNECT route.
    pub fn connect(
        &mut self,
        pattern: &str,
        callback: impl Into<Callback>,
        options: RouteOptions,
    ) -> &mut Self {
        self.add(&[Method::Connect], pattern, callback, options)
    }

    /// Register a TRACE route.
    pub fn trace(
        &mut self,
        pattern: &str,
        callback: impl Into<Callback>,
        options: RouteOptions,
    ) -> &mut Self {
        self.add(&[Method::Trace], pattern, callback, options)
    }

    /// Register a route answering every method.
    pub fn any(
        &mut self,
        pattern: &str,
        callback: impl Into<Callback>,
        options: RouteOptions,
    ) -> &mut Self {
        self.add(&[Method::Any], pattern, callback, options)
    }

    /// Open a registration scope.
    ///
    /// Every route registered inside `scope` inherits the group's prefix,
    /// filters and host. Groups nest arbitrarily deep; the scope is popped
    /// when `scope` returns.
    pub fn group(&mut self, options: GroupOptions, scope: impl FnOnce(&mut Router)) -> &mut Self {
        self.groups.push(options);
        scope(self);
        self.groups.pop();
        self
    }

    /// Register a named filter.
    pub fn filter(&mut self, name: &str, callback: impl Into<Callback>) -> &mut Self {
        self.filters.insert(name.to_string(), callback.into());
        self
    }

    /// Register or overwrite a pattern token.
    pub fn add_token(&mut self, name: &str, fragment: &str) -> &mut Self {
        debug!(token = name, fragment, "token registered");
        self.collection.tokens_mut().add(name, fragment);
        self
    }

    /// All registered tokens.
    pub fn tokens(&self) -> &HashMap<String, String> {
        self.collection.tokens().all()
    }

    /// Override the not-found fallback.
    ///
    /// The fallback runs without filters and its return value becomes the
    /// dispatch result. Without an override, dispatch returns
    /// [`RouterError::NotFound`].
    pub fn not_found(&mut self, callback: impl Into<Callback>) -> &mut Self {
        self.not_found = Some(callback.into());
        self
    }

    /// Override the method-not-allowed fallback.
    ///
    /// Same contract as [`Router::not_found`]; the fallback receives the
    /// captured args of the first pattern that matched the path.
    pub fn method_not_allowed(&mut self, callback: impl Into<Callback>) -> &mut Self {
        self.method_not_allowed = Some(callback.into());
        self
    }

    /// Replace the callback resolver.
    pub fn set_resolver(&mut self, resolver: Arc<dyn CallbackResolver>) -> &mut Self {
        self.resolver = resolver;
        self
    }

    /// Attach an ambient request context.
    pub fn set_context(&mut self, context: Arc<dyn RequestContext>) -> &mut Self {
        self.context = Some(context);
        self
    }

    /// The underlying route collection.
    pub fn routes(&self) -> &RouteCollection {
        &self.collection
    }

    /// Resolve a named route into a concrete path.
    pub fn route_url(&self, name: &str, args: &[&str]) -> Result<String, RouterError> {
        self.collection.route_url(name, args)
    }

    // =========================================================================
    // Matching & dispatch (serve phase)
    // =========================================================================

    fn normalize(&self, request: Request) -> Result<(Method, String, Option<String>), RouterError> {
        let context = self.context.as_deref();

        let method = request
            .method
            .or_else(|| context.and_then(|c| c.method()))
            .ok_or(RouterError::MissingRequestInput("method"))?;

        let path = request
            .path
            .or_else(|| context.and_then(|c| c.path()))
            .unwrap_or_default();
        let path = format!("/{}", path.trim_matches('/'));

        let host = request.host.or_else(|| context.and_then(|c| c.host()));

        Ok((method, path, host))
    }

    /// Find the match for a request without dispatching it.
    ///
    /// A 404/405 outcome resolves to the configured fallback; without one,
    /// the corresponding taxonomy error is returned instead.
    pub fn get_match(&self, request: impl Into<Request>) -> Result<ResolvedMatch, RouterError> {
        let (method, path, host) = self.normalize(request.into())?;
        let outcome = self
            .collection
            .get_matching_route(method, &path, host.as_deref())?;

        match outcome {
            MatchOutcome::Matched { route, args } => Ok(ResolvedMatch {
                status: MatchStatus::Ok,
                callback: route.callback,
                before: route.before,
                after: route.after,
                args,
            }),
            MatchOutcome::MethodNotAllowed { args } => match &self.method_not_allowed {
                Some(fallback) => Ok(ResolvedMatch {
                    status: MatchStatus::MethodNotAllowed,
                    callback: fallback.clone(),
                    before: Vec::new(),
                    after: Vec::new(),
                    args,
                }),
                None => Err(RouterError::MethodNotAllowed { method, path }),
            },
            MatchOutcome::NotFound => match &self.not_found {
                Some(fallback) => Ok(ResolvedMatch {
                    status: MatchStatus::NotFound,
                    callback: fallback.clone(),
                    before: Vec::new(),
                    after: Vec::new(),
                    args: Vec::new(),
                }),
                None => Err(RouterError::NotFound { path }),
            },
        }
    }

    /// Match a request and run its filters and handler.
    ///
    /// Before-filters run in order; the first non-null return value becomes
    /// the response and nothing further runs. Otherwise the handler's return
    /// value is the provisional response, and each after-filter may replace
    /// it by returning non-null.
    pub fn dispatch(&self, request: impl Into<Request>) -> Result<Value, RouterError> {
        let matched = self.get_match(request)?;
        debug!(status = matched.status.code(), "dispatching");

        for name in &matched.before {
            let filter = self.resolve_filter(name)?;
            let response = filter.call(&Invocation::new(&matched.args))?;
            if !response.is_null() {
                return Ok(response);
            }
        }

        let handler = self.resolve_callback(&matched.callback)?;
        let mut response = handler.call(&Invocation::new(&matched.args))?;

        for name in &matched.after {
            let filter = self.resolve_filter(name)?;
            let outcome = filter.call(&Invocation::with_response(&matched.args, &response))?;
            if !outcome.is_null() {
                response = outcome;
            }
        }

        Ok(response)
    }

    fn resolve_filter(&self, name: &str) -> Result<HandlerFn, RouterError> {
        let callback = self
            .filters
            .get(name)
            .ok_or_else(|| RouterError::UnknownFilter(name.to_string()))?;
        self.resolve_callback(callback)
    }

    fn resolve_callback(&self, callback: &Callback) -> Result<HandlerFn, RouterError> {
        callback.validate()?;
        self.resolver.resolve(callback)
    }
}
