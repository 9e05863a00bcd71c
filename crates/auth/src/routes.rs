//! Route resolver: maps a URL path to the module that guards it.
//!
//! Resolution order:
//! 1. normalize the path (drop the query, one trailing slash),
//! 2. exact lookup,
//! 3. literal prefix match over every key except the root `/`,
//! 4. otherwise the path is unmapped.

use serde::{Deserialize, Serialize};

use crate::Module;

/// Tie-break used when more than one route key is a prefix of the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrefixMatch {
    /// The longest (most specific) key wins.
    #[default]
    LongestPrefix,
    /// The first matching key in declaration order wins.
    DeclarationOrder,
}

/// How a path was resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RouteMatch {
    Exact { module: Module },
    Prefix { route: String, module: Module },
    Unmapped,
}

/// Result of resolving a path against a [`RouteTable`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteResolution {
    pub normalized_path: String,
    #[serde(rename = "match")]
    pub matched: RouteMatch,
}

impl RouteResolution {
    pub fn module(&self) -> Option<&Module> {
        match &self.matched {
            RouteMatch::Exact { module } | RouteMatch::Prefix { module, .. } => Some(module),
            RouteMatch::Unmapped => None,
        }
    }

    pub fn is_unmapped(&self) -> bool {
        matches!(self.matched, RouteMatch::Unmapped)
    }
}

/// Normalize a request path for lookup.
///
/// Strips everything from the first `?`, then one trailing `/`; an empty
/// result becomes `/`.
pub fn normalize_path(path: &str) -> String {
    let without_query = path.split_once('?').map_or(path, |(base, _)| base);
    let trimmed = without_query.strip_suffix('/').unwrap_or(without_query);
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Ordered route → module table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    routes: Vec<(String, Module)>,
    prefix_match: PrefixMatch,
}

impl RouteTable {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            prefix_match: PrefixMatch::default(),
        }
    }

    /// Register a route.
    ///
    /// The key is normalized. Re-registering a key replaces its module but
    /// keeps its original declaration position.
    pub fn with_route(mut self, route: &str, module: Module) -> Self {
        let key = normalize_path(route);
        match self.routes.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = module,
            None => self.routes.push((key, module)),
        }
        self
    }

    pub fn with_prefix_match(mut self, prefix_match: PrefixMatch) -> Self {
        self.prefix_match = prefix_match;
        self
    }

    pub fn prefix_match(&self) -> PrefixMatch {
        self.prefix_match
    }

    /// Registered routes in declaration order.
    pub fn routes(&self) -> impl Iterator<Item = (&str, &Module)> + '_ {
        self.routes.iter().map(|(route, module)| (route.as_str(), module))
    }

    pub fn resolve(&self, path: &str) -> RouteResolution {
        let normalized_path = normalize_path(path);

        if let Some((_, module)) = self.routes.iter().find(|(route, _)| *route == normalized_path) {
            return RouteResolution {
                normalized_path,
                matched: RouteMatch::Exact {
                    module: module.clone(),
                },
            };
        }

        let mut candidates = self
            .routes
            .iter()
            .filter(|(route, _)| route != "/" && normalized_path.starts_with(route.as_str()));

        let best = match self.prefix_match {
            PrefixMatch::DeclarationOrder => candidates.next(),
            // `max_by_key` keeps the last maximum; keys are unique so equal
            // lengths cannot both be prefixes of the same path.
            PrefixMatch::LongestPrefix => candidates.max_by_key(|(route, _)| route.len()),
        };

        let matched = match best {
            Some((route, module)) => RouteMatch::Prefix {
                route: route.clone(),
                module: module.clone(),
            },
            None => RouteMatch::Unmapped,
        };

        RouteResolution {
            normalized_path,
            matched,
        }
    }

    /// Module guarding `path`, if any.
    pub fn resolve_module(&self, path: &str) -> Option<Module> {
        self.resolve(path).module().cloned()
    }
}

impl Default for RouteTable {
    /// Screen routes of the property-management application.
    fn default() -> Self {
        Self::new()
            .with_route("/", Module::DASHBOARD)
            .with_route("/dashboard", Module::DASHBOARD)
            .with_route("/listings", Module::LISTINGS)
            .with_route("/portfolios", Module::LISTINGS)
            .with_route("/tenants", Module::TENANTS)
            .with_route("/maintenance", Module::MAINTENANCE)
            .with_route("/reports", Module::REPORTS)
            .with_route("/settings", Module::SETTINGS)
    }
}
