//! Ordered route storage and the matching algorithm.
//!
//! Routes are keyed by host pattern, then by absolute path pattern, then by
//! method. The path-pattern level is an explicit ordered sequence, not a
//! map: matching scans patterns in registration order and first-match
//! semantics depend on that order.

use std::collections::HashMap;

use tracing::{debug, trace, warn};

use crate::callback::Callback;
use crate::error::RouterError;
use crate::method::Method;
use crate::tokens::TokenSet;

/// Host bucket that applies when no host constraint was given.
pub const WILDCARD_HOST: &str = "*";

/// A registered route.
#[derive(Debug, Clone)]
pub struct Route {
    /// Absolute path pattern, placeholders intact.
    pub pattern: String,
    /// Host pattern (`*` when unconstrained).
    pub host: String,
    /// Methods the route was registered under.
    pub methods: Vec<Method>,
    /// Before-filter names, in execution order.
    pub before: Vec<String>,
    /// After-filter names, in execution order.
    pub after: Vec<String>,
    /// Handler reference.
    pub callback: Callback,
    /// Name for reverse resolution.
    pub name: Option<String>,
}

/// Match outcome status, doubling as the HTTP status code to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchStatus {
    /// A route matched path and method.
    Ok,
    /// No pattern matched the path for any host.
    NotFound,
    /// Some pattern matched the path, but not the method.
    MethodNotAllowed,
}

impl MatchStatus {
    /// HTTP status code for this outcome.
    pub fn code(self) -> u16 {
        match self {
            MatchStatus::Ok => 200,
            MatchStatus::NotFound => 404,
            MatchStatus::MethodNotAllowed => 405,
        }
    }
}

/// Result of [`RouteCollection::get_matching_route`].
#[derive(Debug, Clone)]
pub enum MatchOutcome {
    /// A route matched both path and method.
    Matched {
        /// The selected route.
        route: Route,
        /// Captured positional values.
        args: Vec<String>,
    },
    /// At least one pattern matched the path, but no method entry (nor an
    /// `any` entry) fit. Carries the captured args of the first pattern
    /// that matched the path.
    MethodNotAllowed {
        /// Captured positional values from the first path match.
        args: Vec<String>,
    },
    /// No pattern matched the path at all.
    NotFound,
}

impl MatchOutcome {
    /// Status for this outcome.
    pub fn status(&self) -> MatchStatus {
        match self {
            MatchOutcome::Matched { .. } => MatchStatus::Ok,
            MatchOutcome::MethodNotAllowed { .. } => MatchStatus::MethodNotAllowed,
            MatchOutcome::NotFound => MatchStatus::NotFound,
        }
    }
}

/// Per-pattern method table.
#[derive(Debug)]
struct PathBucket {
    pattern: String,
    methods: HashMap<Method, Route>,
}

/// All routes registered under one host pattern.
#[derive(Debug)]
struct HostBucket {
    pattern: String,
    paths: Vec<PathBucket>,
}

/// Routes keyed host → path (ordered) → method, plus the named-route index
/// and the token registry patterns compile against.
#[derive(Debug, Default)]
pub struct RouteCollection {
    hosts: Vec<HostBucket>,
    names: HashMap<String, String>,
    tokens: TokenSet,
}

impl RouteCollection {
    /// An empty collection with the default tokens.
    pub fn new() -> Self {
        Self::default()
    }

    /// The token registry.
    pub fn tokens(&self) -> &TokenSet {
        &self.tokens
    }

    /// Mutable access to the token registry (build phase only).
    pub fn tokens_mut(&mut self) -> &mut TokenSet {
        &mut self.tokens
    }

    /// Insert a route.
    ///
    /// Every (host, pattern, method) cell holds exactly one route; a later
    /// registration for an occupied cell silently replaces the earlier one.
    /// A named route records its pattern in the reverse-resolution index,
    /// overwriting any previous entry for that name.
    pub fn add(&mut self, route: Route) {
        if let Some(name) = &route.name {
            self.names.insert(name.clone(), route.pattern.clone());
        }

        debug!(
            pattern = %route.pattern,
            host = %route.host,
            methods = ?route.methods,
            "route registered"
        );

        let host = self.host_bucket_mut(&route.host);
        let path = match host.paths.iter().position(|p| p.pattern == route.pattern) {
            Some(index) => &mut host.paths[index],
            None => {
                host.paths.push(PathBucket {
                    pattern: route.pattern.clone(),
                    methods: HashMap::new(),
                });
                let last = host.paths.len() - 1;
                &mut host.paths[last]
            }
        };

        for method in route.methods.clone() {
            path.methods.insert(method, route.clone());
        }
    }

    fn host_bucket_mut(&mut self, pattern: &str) -> &mut HostBucket {
        let index = match self.hosts.iter().position(|h| h.pattern == pattern) {
            Some(index) => index,
            None => {
                self.hosts.push(HostBucket {
                    pattern: pattern.to_string(),
                    paths: Vec::new(),
                });
                self.hosts.len() - 1
            }
        };
        &mut self.hosts[index]
    }

    /// The effective path table for a request host.
    ///
    /// Starts from the wildcard bucket. When a concrete host is given,
    /// every other host bucket whose compiled pattern matches the host is
    /// deep-merged on top, in registration order: overlapping
    /// (pattern, method) cells are overridden, everything else is kept.
    fn effective_paths(
        &self,
        host: Option<&str>,
    ) -> Result<Vec<(&str, HashMap<Method, &Route>)>, RouterError> {
        let mut table: Vec<(&str, HashMap<Method, &Route>)> = Vec::new();

        if let Some(bucket) = self.hosts.iter().find(|h| h.pattern == WILDCARD_HOST) {
            for path in &bucket.paths {
                table.push((
                    path.pattern.as_str(),
                    path.methods.iter().map(|(m, r)| (*m, r)).collect(),
                ));
            }
        }

        let Some(host) = host else {
            return Ok(table);
        };

        for bucket in &self.hosts {
            if bucket.pattern == WILDCARD_HOST {
                continue;
            }
            if self.tokens.matches(&bucket.pattern, host)?.is_none() {
                continue;
            }

            for path in &bucket.paths {
                match table.iter_mut().find(|(p, _)| *p == path.pattern) {
                    Some((_, methods)) => {
                        for (method, route) in &path.methods {
                            methods.insert(*method, route);
                        }
                    }
                    None => table.push((
                        path.pattern.as_str(),
                        path.methods.iter().map(|(m, r)| (*m, r)).collect(),
                    )),
                }
            }
        }

        Ok(table)
    }

    /// The merged path table for a host, in match order.
    ///
    /// Each entry pairs a path pattern with the routes reachable under it.
    pub fn get_routes(&self, host: Option<&str>) -> Result<Vec<(String, Vec<Route>)>, RouterError> {
        Ok(self
            .effective_paths(host)?
            .into_iter()
            .map(|(pattern, methods)| {
                (
                    pattern.to_string(),
                    methods.into_values().cloned().collect(),
                )
            })
            .collect())
    }

    /// Find the route for a request.
    ///
    /// Patterns are scanned in registration order. An exact method entry
    /// wins immediately, then an `any` entry. A pattern that matches the
    /// path but not the method is remembered as a method-not-allowed
    /// candidate while the scan continues, because a later pattern may
    /// still match both.
    pub fn get_matching_route(
        &self,
        method: Method,
        path: &str,
        host: Option<&str>,
    ) -> Result<MatchOutcome, RouterError> {
        let mut candidate: Option<Vec<String>> = None;

        for (pattern, methods) in self.effective_paths(host)? {
            let Some(args) = self.tokens.matches(pattern, path)? else {
                continue;
            };

            if let Some(route) = methods.get(&method) {
                trace!(pattern, %method, "route matched");
                return Ok(MatchOutcome::Matched {
                    route: (*route).clone(),
                    args,
                });
            }
            if let Some(route) = methods.get(&Method::Any) {
                trace!(pattern, %method, "route matched via any");
                return Ok(MatchOutcome::Matched {
                    route: (*route).clone(),
                    args,
                });
            }

            if candidate.is_none() {
                candidate = Some(args);
            }
        }

        match candidate {
            Some(args) => {
                warn!(path, %method, "path matched but method not allowed");
                Ok(MatchOutcome::MethodNotAllowed { args })
            }
            None => {
                warn!(path, "no route matched");
                Ok(MatchOutcome::NotFound)
            }
        }
    }

    /// Reverse-resolve a named route into a concrete path.
    ///
    /// Arguments are consumed strictly left to right: a required placeholder
    /// takes the next one or fails, an optional placeholder takes the next
    /// one if any remain and otherwise contributes nothing. Surplus
    /// arguments are ignored.
    pub fn route_url(&self, name: &str, args: &[&str]) -> Result<String, RouterError> {
        let pattern = self
            .names
            .get(name)
            .ok_or_else(|| RouterError::UnknownRoute(name.to_string()))?;

        // Fast path: nothing to substitute.
        if !pattern.contains("(:") {
            return Ok(pattern.clone());
        }

        let mut remaining = args.iter();
        let mut segments: Vec<&str> = Vec::new();

        for fragment in pattern.trim_matches('/').split('/') {
            if fragment.starts_with("(:") {
                let optional = fragment.ends_with('?');
                match remaining.next() {
                    Some(value) => segments.push(value),
                    None if optional => {}
                    None => {
                        return Err(RouterError::MissingRouteParameter {
                            pattern: pattern.clone(),
                        })
                    }
                }
            } else {
                segments.push(fragment);
            }
        }

        Ok(format!("/{}", segments.join("/")))
    }
}
