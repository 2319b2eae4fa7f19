//! Handler references and their resolution.
//!
//! A route (or filter) callback is registered as a [`Callback`]: either an
//! already-bound closure, or a symbolic reference that an external
//! [`CallbackResolver`] turns into a live invokable at dispatch time. The
//! router only dispatches over the reference's tag; it never instantiates
//! anything itself.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::RouterError;

/// Everything a handler or filter invocation gets to see.
///
/// `args` holds the values captured from the matched pattern, in placeholder
/// order. `response` is set only for after-filters and carries the
/// provisional response produced so far.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    /// Captured positional values.
    pub args: &'a [String],
    /// Provisional response, present for after-filters.
    pub response: Option<&'a Value>,
}

impl<'a> Invocation<'a> {
    /// An invocation carrying only captured args.
    pub fn new(args: &'a [String]) -> Self {
        Self {
            args,
            response: None,
        }
    }

    /// An invocation carrying the provisional response, for after-filters.
    pub fn with_response(args: &'a [String], response: &'a Value) -> Self {
        Self {
            args,
            response: Some(response),
        }
    }

    /// Positional argument by index.
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }
}

/// A bound invokable: the form every callback reference resolves into.
///
/// Returning [`Value::Null`] means "produced nothing": a before-filter
/// returning null lets dispatch continue, an after-filter returning null
/// leaves the provisional response untouched.
#[derive(Clone)]
pub struct HandlerFn(Arc<dyn Fn(&Invocation<'_>) -> Result<Value, anyhow::Error> + Send + Sync>);

impl HandlerFn {
    /// Wrap a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Invocation<'_>) -> Result<Value, anyhow::Error> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Invoke with the given invocation state.
    pub fn call(&self, invocation: &Invocation<'_>) -> Result<Value, anyhow::Error> {
        (self.0)(invocation)
    }
}

impl fmt::Debug for HandlerFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerFn").finish_non_exhaustive()
    }
}

/// Wrap a closure as a bound [`Callback`].
pub fn from_fn<F>(f: F) -> Callback
where
    F: Fn(&Invocation<'_>) -> Result<Value, anyhow::Error> + Send + Sync + 'static,
{
    Callback::Bound(HandlerFn::new(f))
}

/// A handler reference in one of the accepted shapes.
///
/// String references classify syntactically: `"Type::method"` is a static
/// method, `"Type@method"` an instance method, anything else a free function
/// name. A `(type, method)` pair builds the instance-method shape, since
/// both spell "instantiate, then call".
#[derive(Debug, Clone)]
pub enum Callback {
    /// An already-bound invokable.
    Bound(HandlerFn),
    /// A free function name.
    Function(String),
    /// A `Type::method` static-method reference.
    StaticMethod {
        /// Referenced type.
        type_name: String,
        /// Method on that type.
        method: String,
    },
    /// A `Type@method` instance-method reference.
    InstanceMethod {
        /// Referenced type.
        type_name: String,
        /// Method on an instance of that type.
        method: String,
    },
}

impl Callback {
    /// Reference text for error messages.
    pub fn describe(&self) -> String {
        match self {
            Callback::Bound(_) => "<bound>".to_string(),
            Callback::Function(name) => name.clone(),
            Callback::StaticMethod { type_name, method } => format!("{type_name}::{method}"),
            Callback::InstanceMethod { type_name, method } => format!("{type_name}@{method}"),
        }
    }

    /// Check the reference is well-formed.
    ///
    /// Registration is infallible; malformed references (empty names or
    /// parts) surface here, at resolution time, as
    /// [`RouterError::InvalidHandlerReference`].
    pub fn validate(&self) -> Result<(), RouterError> {
        let well_formed = match self {
            Callback::Bound(_) => true,
            Callback::Function(name) => !name.is_empty(),
            Callback::StaticMethod { type_name, method }
            | Callback::InstanceMethod { type_name, method } => {
                !type_name.is_empty() && !method.is_empty()
            }
        };

        if well_formed {
            Ok(())
        } else {
            Err(RouterError::InvalidHandlerReference(self.describe()))
        }
    }
}

impl From<&str> for Callback {
    fn from(reference: &str) -> Self {
        if let Some((type_name, method)) = reference.split_once("::") {
            Callback::StaticMethod {
                type_name: type_name.to_string(),
                method: method.to_string(),
            }
        } else if let Some((type_name, method)) = reference.split_once('@') {
            Callback::InstanceMethod {
                type_name: type_name.to_string(),
                method: method.to_string(),
            }
        } else {
            Callback::Function(reference.to_string())
        }
    }
}

impl From<String> for Callback {
    fn from(reference: String) -> Self {
        Callback::from(reference.as_str())
    }
}

impl From<(&str, &str)> for Callback {
    fn from((type_name, method): (&str, &str)) -> Self {
        Callback::InstanceMethod {
            type_name: type_name.to_string(),
            method: method.to_string(),
        }
    }
}

impl From<HandlerFn> for Callback {
    fn from(f: HandlerFn) -> Self {
        Callback::Bound(f)
    }
}

/// Turns a symbolic [`Callback`] into a bound invokable.
///
/// Environments with a service container (or any other instantiation
/// strategy) implement this and hand back instances as [`HandlerFn`]s. A
/// reference naming something that does not exist must be reported as
/// [`RouterError::HandlerNotFound`].
pub trait CallbackResolver: Send + Sync {
    /// Resolve one reference into an invokable.
    fn resolve(&self, callback: &Callback) -> Result<HandlerFn, RouterError>;
}

/// Resolver used when none is configured.
///
/// Bound callbacks pass through; every symbolic reference is reported as not
/// found, since the default environment has nothing to look names up in.
#[derive(Debug, Default)]
pub struct DefaultResolver;

impl CallbackResolver for DefaultResolver {
    fn resolve(&self, callback: &Callback) -> Result<HandlerFn, RouterError> {
        match callback {
            Callback::Bound(f) => Ok(f.clone()),
            other => Err(RouterError::HandlerNotFound(other.describe())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_references_classify_by_shape() {
        assert!(matches!(
            Callback::from("users_index"),
            Callback::Function(name) if name == "users_index"
        ));
        assert!(matches!(
            Callback::from("Users::index"),
            Callback::StaticMethod { type_name, method }
                if type_name == "Users" && method == "index"
        ));
        assert!(matches!(
            Callback::from("Users@show"),
            Callback::InstanceMethod { type_name, method }
                if type_name == "Users" && method == "show"
        ));
    }

    #[test]
    fn pair_builds_instance_method() {
        assert!(matches!(
            Callback::from(("Users", "show")),
            Callback::InstanceMethod { type_name, method }
                if type_name == "Users" && method == "show"
        ));
    }

    #[test]
    fn malformed_references_fail_validation() {
        assert!(Callback::from("").validate().is_err());
        assert!(Callback::from("Users::").validate().is_err());
        assert!(Callback::from("@show").validate().is_err());
        assert!(Callback::from("Users@show").validate().is_ok());
        assert!(from_fn(|_| Ok(Value::Null)).validate().is_ok());
    }

    #[test]
    fn default_resolver_only_accepts_bound() {
        let resolver = DefaultResolver;

        let bound = from_fn(|_| Ok(json!("ok")));
        let f = resolver.resolve(&bound).unwrap();
        let args: Vec<String> = vec![];
        assert_eq!(f.call(&Invocation::new(&args)).unwrap(), json!("ok"));

        let err = resolver.resolve(&Callback::from("Users@show")).unwrap_err();
        assert!(matches!(err, RouterError::HandlerNotFound(r) if r == "Users@show"));
    }

    #[test]
    fn invocation_exposes_args() {
        let args = vec!["a".to_string(), "b".to_string()];
        let inv = Invocation::new(&args);
        assert_eq!(inv.arg(0), Some("a"));
        assert_eq!(inv.arg(2), None);
        assert!(inv.response.is_none());
    }
}
