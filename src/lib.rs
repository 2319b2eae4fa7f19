//! Route matching and dispatch with named tokens, groups and filters.
//!
//! `signpost` matches an incoming (method, path, host) triple against a
//! registered route table, runs the route's before-filters, handler and
//! after-filters, and can reverse a named route back into a concrete path.
//!
//! # Patterns
//!
//! Patterns are literal paths with `(:token)` placeholders. Tokens are
//! named regex fragments; `all`, `alphanum`, `alpha`, `num` and `any` are
//! built in and more can be registered with [`Router::add_token`]. A
//! trailing `?` makes a placeholder (and its leading slash) optional:
//!
//! ```text
//! /users/(:num)
//! /archive/(:num)/(:alpha)?
//! ```
//!
//! # Dispatch pipeline
//!
//! ```
//! use serde_json::{json, Value};
//! use signpost::{from_fn, GroupOptions, Method, RouteOptions, Router};
//!
//! let mut router = Router::new();
//!
//! router.filter("trace", from_fn(|_| Ok(Value::Null)));
//!
//! router.group(GroupOptions::new().prefix("api").before("trace"), |r| {
//!     r.get(
//!         "/users/(:num)",
//!         from_fn(|inv| Ok(json!({ "id": inv.arg(0) }))),
//!         RouteOptions::new().name("users.show"),
//!     );
//! });
//!
//! let response = router.dispatch((Method::Get, "/api/users/7"))?;
//! assert_eq!(response, json!({ "id": "7" }));
//! assert_eq!(router.route_url("users.show", &["7"])?, "/api/users/7");
//! # Ok::<(), signpost::RouterError>(())
//! ```
//!
//! A before-filter returning a non-null value short-circuits dispatch; an
//! after-filter returning non-null replaces the provisional response. The
//! response currency throughout is [`serde_json::Value`].
//!
//! # Symbolic handlers
//!
//! Handlers and filters can be registered as symbolic references
//! (`"handler_name"`, `"Type::method"`, `"Type@method"`) and resolved at
//! dispatch time by a [`CallbackResolver`], typically backed by whatever
//! service container the host application uses. See [`RouteDef`] for
//! loading whole route tables from configuration this way.
//!
//! # Build phase vs serve phase
//!
//! All registration takes `&mut Router`. Once built, dispatch takes
//! `&Router` and is safe to call from several threads.

mod callback;
mod collection;
mod config;
mod error;
mod groups;
mod method;
mod router;
mod tokens;

pub use callback::{from_fn, Callback, CallbackResolver, DefaultResolver, HandlerFn, Invocation};
pub use collection::{MatchOutcome, MatchStatus, Route, RouteCollection, WILDCARD_HOST};
pub use config::RouteDef;
pub use error::RouterError;
pub use groups::{FilterList, GroupOptions, GroupStack, RouteOptions};
pub use method::Method;
pub use router::{Request, RequestContext, ResolvedMatch, Router};
pub use tokens::{CompiledPattern, TokenSet};
