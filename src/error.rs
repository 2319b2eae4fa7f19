//! Error types surfaced by the router.
//!
//! Every variant is terminal: nothing is retried internally, and only
//! [`RouterError::NotFound`] and [`RouterError::MethodNotAllowed`] have an
//! override path (custom fallback handlers on the router). Handler and
//! filter failures travel through [`RouterError::Handler`] unchanged so
//! callers can downcast to whatever the handler actually returned.

use thiserror::Error;

use crate::method::Method;

/// Errors produced while registering, matching or dispatching routes.
#[derive(Debug, Error)]
pub enum RouterError {
    /// No pattern matched the path for any host.
    #[error("no route matched '{path}'")]
    NotFound {
        /// Normalized request path.
        path: String,
    },

    /// A pattern matched the path but no registered method (or `any`) fit.
    #[error("method '{method}' not allowed for '{path}'")]
    MethodNotAllowed {
        /// Requested method.
        method: Method,
        /// Normalized request path.
        path: String,
    },

    /// The resolver could not locate the referenced type, method or function.
    #[error("handler '{0}' not found")]
    HandlerNotFound(String),

    /// A handler reference is not in any accepted shape.
    #[error("invalid handler reference '{0}'")]
    InvalidHandlerReference(String),

    /// A before/after filter name has no registered implementation.
    #[error("unknown filter '{0}'")]
    UnknownFilter(String),

    /// Reverse resolution was asked for a name that was never registered.
    #[error("unknown route '{0}'")]
    UnknownRoute(String),

    /// Reverse resolution ran out of arguments for a required placeholder.
    #[error("missing parameter for route '{pattern}'")]
    MissingRouteParameter {
        /// The named route's raw pattern.
        pattern: String,
    },

    /// A pattern expanded into something that is not valid regex.
    ///
    /// Token fragments are user-supplied regex, so this only surfaces when a
    /// registered fragment is itself malformed.
    #[error("pattern '{pattern}' did not compile")]
    InvalidPattern {
        /// The raw pattern that failed to compile.
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A method string that is not one of the known HTTP verbs.
    #[error("unknown HTTP method '{0}'")]
    UnknownMethod(String),

    /// Dispatch was called without this part and no request context was
    /// configured to supply it.
    #[error("missing request {0} and no request context to supply it")]
    MissingRequestInput(&'static str),

    /// A handler or filter returned an error.
    #[error(transparent)]
    Handler(#[from] anyhow::Error),
}
