use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use signpost::{from_fn, GroupOptions, Method, RouteOptions, Router, RouterError};

fn opts() -> RouteOptions {
    RouteOptions::new()
}

#[test]
fn nested_prefixes_compose() {
    let mut r = Router::new();
    r.group(GroupOptions::new().prefix("foo"), |r| {
        r.group(GroupOptions::new().prefix("bar"), |r| {
            r.get("/test", from_fn(|_| Ok(json!("nested"))), opts());
        });
        r.get("/direct", from_fn(|_| Ok(json!("direct"))), opts());
    });
    r.get("/top", from_fn(|_| Ok(json!("top"))), opts());

    assert_eq!(
        r.dispatch((Method::Get, "/foo/bar/test")).unwrap(),
        json!("nested")
    );
    assert_eq!(
        r.dispatch((Method::Get, "/foo/direct")).unwrap(),
        json!("direct")
    );
    assert_eq!(r.dispatch((Method::Get, "/top")).unwrap(), json!("top"));

    // The nested route is not reachable without its prefixes.
    assert!(matches!(
        r.dispatch((Method::Get, "/test")).unwrap_err(),
        RouterError::NotFound { .. }
    ));
}

#[test]
fn root_route_inside_group_lands_on_prefix() {
    let mut r = Router::new();
    r.group(GroupOptions::new().prefix("admin"), |r| {
        r.get("/", from_fn(|_| Ok(json!("admin home"))), opts());
    });

    assert_eq!(
        r.dispatch((Method::Get, "/admin")).unwrap(),
        json!("admin home")
    );
}

#[test]
fn group_filters_accumulate_outer_to_inner() {
    let seen = Arc::new(Mutex::new(Vec::new()));

    let mut r = Router::new();
    for name in ["a", "b", "own"] {
        let seen = seen.clone();
        r.filter(
            name,
            from_fn(move |_| {
                seen.lock().unwrap().push(name);
                Ok(Value::Null)
            }),
        );
    }

    r.group(GroupOptions::new().before("a"), |r| {
        r.group(GroupOptions::new().before("b"), |r| {
            r.get(
                "/test",
                from_fn(|_| Ok(json!("done"))),
                opts().before("own"),
            );
        });
    });

    assert_eq!(r.dispatch((Method::Get, "/test")).unwrap(), json!("done"));
    assert_eq!(*seen.lock().unwrap(), vec!["a", "b", "own"]);
}

#[test]
fn group_after_filters_apply_to_members() {
    let mut r = Router::new();
    r.filter(
        "stamp",
        from_fn(|inv| {
            let prev = inv.response.and_then(Value::as_str).unwrap_or_default();
            Ok(json!(format!("{prev}!")))
        }),
    );

    r.group(GroupOptions::new().after("stamp"), |r| {
        r.get("/test", from_fn(|_| Ok(json!("body"))), opts());
    });

    assert_eq!(r.dispatch((Method::Get, "/test")).unwrap(), json!("body!"));
}

#[test]
fn scopes_do_not_leak_after_the_group_closes() {
    let mut r = Router::new();
    r.group(GroupOptions::new().prefix("scoped").before("ghost"), |r| {
        r.get("/inside", from_fn(|_| Ok(json!("inside"))), opts());
    });
    r.get("/outside", from_fn(|_| Ok(json!("outside"))), opts());

    // The route registered after the group carries neither prefix nor
    // filters, so it dispatches cleanly.
    assert_eq!(
        r.dispatch((Method::Get, "/outside")).unwrap(),
        json!("outside")
    );
}

#[test]
fn group_host_applies_to_members() {
    let mut r = Router::new();
    r.group(GroupOptions::new(), |r| {
        r.get("/", from_fn(|_| Ok(json!("home:default"))), opts());
    });
    r.group(GroupOptions::new().host("foo.com"), |r| {
        r.get("/", from_fn(|_| Ok(json!("home:foo.com"))), opts());
    });
    r.group(GroupOptions::new().host("example.com"), |r| {
        r.get("/", from_fn(|_| Ok(json!("home:example.com"))), opts());
    });

    assert_eq!(
        r.dispatch((Method::Get, "/")).unwrap(),
        json!("home:default")
    );
    assert_eq!(
        r.dispatch((Method::Get, "/", "foo.com")).unwrap(),
        json!("home:foo.com")
    );
    assert_eq!(
        r.dispatch((Method::Get, "/", "example.com")).unwrap(),
        json!("home:example.com")
    );
}

#[test]
fn group_prefixes_can_contain_tokens() {
    let mut r = Router::new();
    r.group(GroupOptions::new().prefix("foo/(:any)"), |r| {
        r.get("bar", from_fn(|inv| Ok(json!(inv.args))), opts());
    });

    // The prefix placeholder captures like any other.
    assert_eq!(
        r.dispatch((Method::Get, "/foo/test/bar")).unwrap(),
        json!(["test"])
    );
}

#[test]
fn nested_token_prefixes_capture_in_order() {
    let mut r = Router::new();
    r.group(GroupOptions::new().prefix("/foo/(:any)"), |r| {
        r.group(GroupOptions::new().prefix("/bar/(:any)"), |r| {
            r.get("/hello/(:any)", from_fn(|inv| Ok(json!(inv.args))), opts());
        });
    });

    assert_eq!(
        r.dispatch((Method::Get, "/foo/123/bar/abc/hello/world"))
            .unwrap(),
        json!(["123", "abc", "world"])
    );
}

#[test]
fn deeply_nested_groups_stay_balanced() {
    let mut r = Router::new();
    r.group(GroupOptions::new().prefix("a"), |r| {
        r.group(GroupOptions::new().prefix("b"), |r| {
            r.group(GroupOptions::new().prefix("c"), |r| {
                r.get("/leaf", from_fn(|_| Ok(json!("leaf"))), opts());
            });
            r.get("/mid", from_fn(|_| Ok(json!("mid"))), opts());
        });
    });
    r.get("/root", from_fn(|_| Ok(json!("root"))), opts());

    assert_eq!(
        r.dispatch((Method::Get, "/a/b/c/leaf")).unwrap(),
        json!("leaf")
    );
    assert_eq!(r.dispatch((Method::Get, "/a/b/mid")).unwrap(), json!("mid"));
    assert_eq!(r.dispatch((Method::Get, "/root")).unwrap(), json!("root"));
}
