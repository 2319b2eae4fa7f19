//! Named regex tokens and pattern compilation.
//!
//! Path and host patterns may contain placeholders of the form `(:token)`,
//! optionally preceded by a slash and optionally followed by `?`:
//!
//! ```text
//! /users/(:num)/avatar/(:any)?
//! ```
//!
//! A leading slash is pulled inside the generated capture group, and a
//! trailing `?` makes the whole group optional, so an omitted optional
//! segment never leaves a dangling slash behind. Everything that is not a
//! recognized placeholder is escaped and matched literally; the final
//! matcher is anchored at both ends.
//!
//! Token fragments are plain regex and should avoid capturing groups of
//! their own (use `(?:...)` for alternation), since captured values are
//! collected positionally.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use regex::Regex;
use tracing::warn;

use crate::error::RouterError;

/// Scanner for `(/?)(:name)(?)` placeholder occurrences in a raw pattern.
fn placeholder_scanner() -> &'static Regex {
    static SCANNER: OnceLock<Regex> = OnceLock::new();
    SCANNER.get_or_init(|| Regex::new(r"(/?)\(:([^)]*)\)(\??)").expect("scanner regex is valid"))
}

/// Registry of named regex fragments usable inside patterns.
///
/// Seeded with `all`, `alphanum`, `alpha`, `num` and `any`. Registration is
/// additive; registering an existing name overwrites it. Compiled matchers
/// are cached per raw pattern, and the cache is dropped whenever a token
/// changes so caching never affects results.
#[derive(Debug)]
pub struct TokenSet {
    tokens: HashMap<String, String>,
    cache: RwLock<HashMap<String, Arc<CompiledPattern>>>,
}

impl Default for TokenSet {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenSet {
    /// A registry with the default tokens.
    pub fn new() -> Self {
        let mut tokens = HashMap::new();
        for (name, fragment) in [
            ("all", ".*"),
            ("alphanum", "[a-zA-Z0-9]+"),
            ("alpha", "[a-zA-Z]+"),
            ("num", "[-]?[0-9,.]+"),
            ("any", "[^/]+"),
        ] {
            tokens.insert(name.to_string(), fragment.to_string());
        }

        Self {
            tokens,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Register or overwrite a token.
    pub fn add(&mut self, name: &str, fragment: &str) {
        self.tokens.insert(name.to_string(), fragment.to_string());
        // The new fragment changes how existing patterns compile.
        self.cache.write().clear();
    }

    /// Fragment registered under `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.tokens.get(name).map(String::as_str)
    }

    /// All registered tokens.
    pub fn all(&self) -> &HashMap<String, String> {
        &self.tokens
    }

    /// Compile a pattern into an anchored matcher, reusing the cache.
    pub fn compile(&self, pattern: &str) -> Result<Arc<CompiledPattern>, RouterError> {
        if let Some(hit) = self.cache.read().get(pattern) {
            return Ok(hit.clone());
        }

        let compiled = Arc::new(CompiledPattern::compile(pattern, &self.tokens)?);
        self.cache
            .write()
            .insert(pattern.to_string(), compiled.clone());
        Ok(compiled)
    }

    /// Match `candidate` against `pattern`, returning captured values on a
    /// full match.
    pub fn matches(&self, pattern: &str, candidate: &str) -> Result<Option<Vec<String>>, RouterError> {
        Ok(self.compile(pattern)?.matches(candidate))
    }
}

/// An anchored matcher derived from a pattern, with one capture slot per
/// expanded placeholder, in left-to-right order.
pub struct CompiledPattern {
    pattern: String,
    regex: Regex,
}

impl fmt::Debug for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledPattern")
            .field("pattern", &self.pattern)
            .finish()
    }
}

impl CompiledPattern {
    fn compile(pattern: &str, tokens: &HashMap<String, String>) -> Result<Self, RouterError> {
        let mut source = String::with_capacity(pattern.len() + 16);
        source.push('^');

        let mut last = 0;
        for caps in placeholder_scanner().captures_iter(pattern) {
            let whole = caps.get(0).expect("group 0 always participates");
            source.push_str(&regex::escape(&pattern[last..whole.start()]));

            let name = &caps[2];
            match tokens.get(name) {
                Some(fragment) => {
                    source.push('(');
                    if !caps[1].is_empty() {
                        source.push('/');
                    }
                    source.push_str(fragment);
                    source.push(')');
                    source.push_str(&caps[3]);
                }
                None => {
                    // Unregistered token names stay literal text. That makes
                    // the fragment unmatchable in practice, so leave a trail.
                    warn!(token = name, pattern, "unregistered token left as literal text");
                    source.push_str(&regex::escape(whole.as_str()));
                }
            }

            last = whole.end();
        }
        source.push_str(&regex::escape(&pattern[last..]));
        source.push('$');

        let regex = Regex::new(&source).map_err(|err| RouterError::InvalidPattern {
            pattern: pattern.to_string(),
            source: err,
        })?;

        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    /// The raw pattern this matcher was compiled from.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Match the whole candidate string.
    ///
    /// On success, returns the captured values in placeholder order with
    /// surrounding slashes trimmed. Groups for omitted optional placeholders
    /// are skipped, so the list has no empty holes.
    pub fn matches(&self, candidate: &str) -> Option<Vec<String>> {
        let caps = self.regex.captures(candidate)?;
        Some(
            caps.iter()
                .skip(1)
                .flatten()
                .map(|m| m.as_str().trim_matches('/').to_string())
                .collect(),
        )
    }
}
