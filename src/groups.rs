//! Nested registration scopes.
//!
//! Groups are pushed and popped around registration blocks; each frame can
//! contribute a path prefix, before/after filter names and a host
//! constraint. The *aggregate* of the whole stack is recomputed from
//! scratch on every push and pop, so it can never drift from the frames.

/// An ordered list of filter names.
///
/// Accepted either as a collection of names or as a single
/// `"first|second"` string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterList(Vec<String>);

impl FilterList {
    /// An empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// The filter names, in order.
    pub fn names(&self) -> &[String] {
        &self.0
    }

    /// True when no filters are listed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn into_names(self) -> Vec<String> {
        self.0
    }
}

impl From<&str> for FilterList {
    fn from(joined: &str) -> Self {
        Self(
            joined
                .split('|')
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }
}

impl From<Vec<String>> for FilterList {
    fn from(names: Vec<String>) -> Self {
        Self(names)
    }
}

impl From<&[&str]> for FilterList {
    fn from(names: &[&str]) -> Self {
        Self(names.iter().map(|n| n.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for FilterList {
    fn from(names: [&str; N]) -> Self {
        Self(names.iter().map(|n| n.to_string()).collect())
    }
}

/// Per-route registration options.
#[derive(Debug, Clone, Default)]
pub struct RouteOptions {
    /// Filters run before the handler.
    pub before: FilterList,
    /// Filters run after the handler.
    pub after: FilterList,
    /// Host pattern; empty or unset falls back to the group host, then `*`.
    pub host: Option<String>,
    /// Name for reverse resolution.
    pub name: Option<String>,
}

impl RouteOptions {
    /// Empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the before-filters.
    pub fn before(mut self, filters: impl Into<FilterList>) -> Self {
        self.before = filters.into();
        self
    }

    /// Set the after-filters.
    pub fn after(mut self, filters: impl Into<FilterList>) -> Self {
        self.after = filters.into();
        self
    }

    /// Constrain the route to a host pattern.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Name the route for reverse resolution.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Options for a group scope.
#[derive(Debug, Clone, Default)]
pub struct GroupOptions {
    /// Path prefix contributed to every route in the scope.
    pub prefix: Option<String>,
    /// Before-filters contributed to every route in the scope.
    pub before: FilterList,
    /// After-filters contributed to every route in the scope.
    pub after: FilterList,
    /// Host constraint for the scope.
    pub host: Option<String>,
}

impl GroupOptions {
    /// Empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the path prefix.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Set the before-filters.
    pub fn before(mut self, filters: impl Into<FilterList>) -> Self {
        self.before = filters.into();
        self
    }

    /// Set the after-filters.
    pub fn after(mut self, filters: impl Into<FilterList>) -> Self {
        self.after = filters.into();
        self
    }

    /// Constrain the scope to a host pattern.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }
}

/// One pushed scope.
#[derive(Debug, Clone, Default)]
struct GroupFrame {
    prefix: String,
    before: Vec<String>,
    after: Vec<String>,
    host: Option<String>,
}

/// Aggregate of the whole stack.
#[derive(Debug, Clone, Default)]
struct Aggregate {
    prefix: String,
    before: Vec<String>,
    after: Vec<String>,
    host: Option<String>,
}

/// The push/pop stack of registration scopes.
#[derive(Debug, Default)]
pub struct GroupStack {
    frames: Vec<GroupFrame>,
    aggregate: Aggregate,
}

impl GroupStack {
    /// An empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a scope.
    pub fn push(&mut self, options: GroupOptions) {
        self.frames.push(GroupFrame {
            prefix: options
                .prefix
                .unwrap_or_default()
                .trim_matches('/')
                .to_string(),
            before: options.before.into_names(),
            after: options.after.into_names(),
            host: options.host.filter(|host| !host.is_empty()),
        });
        self.aggregate = Self::rebuild(&self.frames);
    }

    /// Discard the innermost scope.
    pub fn pop(&mut self) {
        self.frames.pop();
        self.aggregate = Self::rebuild(&self.frames);
    }

    /// Current nesting depth.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    // The aggregate is a pure function of the frame stack; recomputing it
    // wholesale on every mutation keeps it impossible to desync.
    fn rebuild(frames: &[GroupFrame]) -> Aggregate {
        let mut aggregate = Aggregate::default();

        for frame in frames {
            if !frame.prefix.is_empty() {
                aggregate.prefix.push('/');
                aggregate.prefix.push_str(&frame.prefix);
            }
            aggregate.before.extend(frame.before.iter().cloned());
            aggregate.after.extend(frame.after.iter().cloned());
            if frame.host.is_some() {
                aggregate.host = frame.host.clone();
            }
        }

        aggregate
    }

    /// Merge the current aggregate with one route's own options.
    ///
    /// Group filters come first (outer scopes before inner ones, both before
    /// the route's own), the pattern is made absolute under the accumulated
    /// prefix, and the host falls back from the route option to the
    /// innermost group host to `*`.
    pub fn apply(&self, pattern: &str, options: RouteOptions) -> GroupedRoute {
        let pattern = format!("/{}", pattern.trim_matches('/'));
        let absolute = format!(
            "/{}",
            format!("{}{}", self.aggregate.prefix, pattern).trim_matches('/')
        );

        let mut before = self.aggregate.before.clone();
        before.extend(options.before.into_names());

        let mut after = self.aggregate.after.clone();
        after.extend(options.after.into_names());

        let host = options
            .host
            .filter(|host| !host.is_empty())
            .or_else(|| self.aggregate.host.clone())
            .unwrap_or_else(|| "*".to_string());

        GroupedRoute {
            pattern: absolute,
            host,
            before,
            after,
            name: options.name,
        }
    }
}

/// A route registration after group composition.
#[derive(Debug, Clone)]
pub struct GroupedRoute {
    /// Absolute path pattern.
    pub pattern: String,
    /// Effective host pattern (`*` when unconstrained).
    pub host: String,
    /// Effective before-filter names.
    pub before: Vec<String>,
    /// Effective after-filter names.
    pub after: Vec<String>,
    /// Route name, if any.
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(stack: &GroupStack, pattern: &str) -> GroupedRoute {
        stack.apply(pattern, RouteOptions::new())
    }

    #[test]
    fn empty_stack_normalizes_pattern() {
        let stack = GroupStack::new();
        assert_eq!(apply(&stack, "/test").pattern, "/test");
        assert_eq!(apply(&stack, "test/").pattern, "/test");
        assert_eq!(apply(&stack, "/").pattern, "/");
        assert_eq!(apply(&stack, "").pattern, "/");
    }

    #[test]
    fn nested_prefixes_accumulate() {
        let mut stack = GroupStack::new();
        stack.push(GroupOptions::new().prefix("foo"));
        stack.push(GroupOptions::new().prefix("/bar/"));

        assert_eq!(apply(&stack, "/test").pattern, "/foo/bar/test");
        assert_eq!(apply(&stack, "/").pattern, "/foo/bar");

        stack.pop();
        assert_eq!(apply(&stack, "/test").pattern, "/foo/test");

        stack.pop();
        assert_eq!(apply(&stack, "/test").pattern, "/test");
    }

    #[test]
    fn filters_accumulate_outer_to_inner() {
        let mut stack = GroupStack::new();
        stack.push(GroupOptions::new().before("a"));
        stack.push(GroupOptions::new().before("b|c").after("z"));

        let route = stack.apply("/test", RouteOptions::new().before("own").after("tail"));
        assert_eq!(route.before, vec!["a", "b", "c", "own"]);
        assert_eq!(route.after, vec!["z", "tail"]);
    }

    #[test]
    fn innermost_host_wins() {
        let mut stack = GroupStack::new();
        stack.push(GroupOptions::new().host("outer.com"));
        stack.push(GroupOptions::new());
        assert_eq!(apply(&stack, "/x").host, "outer.com");

        stack.push(GroupOptions::new().host("inner.com"));
        assert_eq!(apply(&stack, "/x").host, "inner.com");

        stack.pop();
        assert_eq!(apply(&stack, "/x").host, "outer.com");
    }

    #[test]
    fn route_host_overrides_group_host() {
        let mut stack = GroupStack::new();
        stack.push(GroupOptions::new().host("group.com"));

        let route = stack.apply("/x", RouteOptions::new().host("route.com"));
        assert_eq!(route.host, "route.com");

        // Empty host option is treated as unset.
        let route = stack.apply("/x", RouteOptions::new().host(""));
        assert_eq!(route.host, "group.com");
    }

    #[test]
    fn wildcard_host_when_nothing_set() {
        let stack = GroupStack::new();
        assert_eq!(apply(&stack, "/x").host, "*");
    }

    #[test]
    fn filter_list_accepts_joined_strings() {
        assert_eq!(FilterList::from("a|b|c").names(), ["a", "b", "c"]);
        assert_eq!(FilterList::from("solo").names(), ["solo"]);
        assert!(FilterList::from("").is_empty());
        assert_eq!(FilterList::from(["x", "y"]).names(), ["x", "y"]);
    }
}
