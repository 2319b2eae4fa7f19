//! Declarative route definitions.
//!
//! Routes can be described in configuration (any serde format) and loaded
//! in one call. Handler references stay symbolic and go through the
//! configured resolver at dispatch time, so a definition file never needs
//! to name Rust items directly.

use serde::{Deserialize, Serialize};

use crate::groups::{FilterList, RouteOptions};
use crate::method::Method;
use crate::router::Router;

/// One route described in configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteDef {
    /// Verbs to register under; defaults to `any`.
    #[serde(default = "default_methods")]
    pub methods: Vec<Method>,
    /// Path pattern, placeholders included.
    pub pattern: String,
    /// Symbolic handler reference (`"handler"`, `"Type::method"`,
    /// `"Type@method"`).
    pub handler: String,
    /// Before-filter names.
    #[serde(default)]
    pub before: Vec<String>,
    /// After-filter names.
    #[serde(default)]
    pub after: Vec<String>,
    /// Host pattern constraint.
    #[serde(default)]
    pub host: Option<String>,
    /// Name for reverse resolution.
    #[serde(default)]
    pub name: Option<String>,
}

fn default_methods() -> Vec<Method> {
    vec![Method::Any]
}

impl Router {
    /// Register every definition, in order.
    pub fn load(&mut self, defs: &[RouteDef]) -> &mut Self {
        for def in defs {
            let mut options = RouteOptions::new()
                .before(FilterList::from(def.before.clone()))
                .after(FilterList::from(def.after.clone()));
            if let Some(host) = &def.host {
                options = options.host(host.clone());
            }
            if let Some(name) = &def.name {
                options = options.name(name.clone());
            }

            self.add(&def.methods, &def.pattern, def.handler.as_str(), options);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::{Callback, CallbackResolver, HandlerFn};
    use crate::error::RouterError;
    use serde_json::json;
    use std::sync::Arc;

    /// Resolver with a fixed function table, standing in for a service
    /// container.
    struct TableResolver;

    impl CallbackResolver for TableResolver {
        fn resolve(&self, callback: &Callback) -> Result<HandlerFn, RouterError> {
            match callback {
                Callback::Bound(f) => Ok(f.clone()),
                Callback::Function(name) if name == "list_users" => {
                    Ok(HandlerFn::new(|_| Ok(json!(["ada", "grace"]))))
                }
                Callback::InstanceMethod { type_name, method }
                    if type_name == "Users" && method == "show" =>
                {
                    Ok(HandlerFn::new(|inv| Ok(json!({ "user": inv.arg(0) }))))
                }
                other => Err(RouterError::HandlerNotFound(other.describe())),
            }
        }
    }

    #[test]
    fn loads_definitions_from_json() {
        let defs: Vec<RouteDef> = serde_json::from_value(json!([
            {
                "methods": ["GET"],
                "pattern": "/users",
                "handler": "list_users",
                "name": "users.index"
            },
            {
                "methods": ["get", "head"],
                "pattern": "/users/(:num)",
                "handler": "Users@show"
            }
        ]))
        .unwrap();

        let mut router = Router::with_resolver(Arc::new(TableResolver));
        router.load(&defs);

        assert_eq!(
            router.dispatch((Method::Get, "/users")).unwrap(),
            json!(["ada", "grace"])
        );
        assert_eq!(
            router.dispatch((Method::Head, "/users/7")).unwrap(),
            json!({ "user": "7" })
        );
        assert_eq!(router.route_url("users.index", &[]).unwrap(), "/users");
    }

    #[test]
    fn methods_default_to_any() {
        let def: RouteDef = serde_json::from_value(json!({
            "pattern": "/ping",
            "handler": "list_users"
        }))
        .unwrap();
        assert_eq!(def.methods, vec![Method::Any]);
    }

    #[test]
    fn unresolvable_definition_surfaces_at_dispatch() {
        let defs: Vec<RouteDef> = serde_json::from_value(json!([
            { "pattern": "/ghost", "handler": "missing_fn" }
        ]))
        .unwrap();

        let mut router = Router::with_resolver(Arc::new(TableResolver));
        router.load(&defs);

        let err = router.dispatch((Method::Get, "/ghost")).unwrap_err();
        assert!(matches!(err, RouterError::HandlerNotFound(name) if name == "missing_fn"));
    }
}
