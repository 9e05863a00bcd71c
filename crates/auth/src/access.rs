use serde::{Deserialize, Serialize};

use crate::{Module, Role, RoleRegistry, RouteMatch, RouteTable};

/// What to do with a path that no route key covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmappedRoutes {
    /// Fail-open: every authenticated role may open unmapped pages (auth
    /// pages, error pages, anything added without a route entry).
    #[default]
    Allow,
    /// Fail-closed: only explicitly mapped routes are reachable.
    Deny,
}

/// Answers "may role R open path P / use module M?".
///
/// - No IO
/// - No panics
/// - Tables are read-only after construction
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccessEvaluator {
    registry: RoleRegistry,
    routes: RouteTable,
    unmapped: UnmappedRoutes,
}

impl AccessEvaluator {
    pub fn new(registry: RoleRegistry, routes: RouteTable, unmapped: UnmappedRoutes) -> Self {
        Self {
            registry,
            routes,
            unmapped,
        }
    }

    pub fn registry(&self) -> &RoleRegistry {
        &self.registry
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn unmapped_routes(&self) -> UnmappedRoutes {
        self.unmapped
    }

    pub fn allowed_modules(&self, role: &Role) -> &[Module] {
        self.registry.allowed_modules(role)
    }

    pub fn has_module_access(&self, role: &Role, module: &Module) -> bool {
        self.registry.allowed_modules(role).contains(module)
    }

    pub fn has_route_access(&self, role: &Role, path: &str) -> bool {
        let granted = match self.routes.resolve(path).module() {
            Some(module) => self.has_module_access(role, module),
            None => self.unmapped == UnmappedRoutes::Allow,
        };

        tracing::debug!(role = %role, path, granted, "route access evaluated");
        granted
    }

    /// Explain why a route decision was made (or would be made).
    ///
    /// Always agrees with [`has_route_access`](Self::has_route_access).
    pub fn explain_route_access(&self, role: &Role, path: &str) -> AccessExplanation {
        let resolution = self.routes.resolve(path);
        let allowed_modules = self.registry.allowed_modules(role).to_vec();

        let (granted, reason, message) = match resolution.module() {
            None => match self.unmapped {
                UnmappedRoutes::Allow => (
                    true,
                    DecisionReason::UnmappedAllowed,
                    format!(
                        "No route entry covers '{}'; unmapped routes are open to every role",
                        resolution.normalized_path
                    ),
                ),
                UnmappedRoutes::Deny => (
                    false,
                    DecisionReason::UnmappedDenied,
                    format!(
                        "No route entry covers '{}'; unmapped routes are closed",
                        resolution.normalized_path
                    ),
                ),
            },
            Some(module) if allowed_modules.contains(module) => (
                true,
                DecisionReason::ModuleGranted,
                format!("Role '{role}' is granted module '{module}'"),
            ),
            Some(module) if !self.registry.knows_role(role) => (
                false,
                DecisionReason::UnknownRole,
                format!("Role '{role}' has no permission entry; module '{module}' is not granted"),
            ),
            Some(module) => (
                false,
                DecisionReason::ModuleNotGranted,
                format!(
                    "Role '{role}' lacks module '{module}'. Granted modules: {:?}",
                    allowed_modules.iter().map(Module::as_str).collect::<Vec<_>>()
                ),
            ),
        };

        AccessExplanation {
            role: role.clone(),
            path: path.to_string(),
            normalized_path: resolution.normalized_path.clone(),
            module: resolution.module().cloned(),
            matched: resolution.matched,
            granted,
            reason,
            message,
            allowed_modules,
        }
    }
}

/// Detailed, serializable record of a route access decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessExplanation {
    pub role: Role,
    pub path: String,
    pub normalized_path: String,
    pub module: Option<Module>,
    #[serde(rename = "match")]
    pub matched: RouteMatch,
    pub granted: bool,
    pub reason: DecisionReason,
    pub message: String,
    pub allowed_modules: Vec<Module>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    ModuleGranted,
    ModuleNotGranted,
    UnknownRole,
    UnmappedAllowed,
    UnmappedDenied,
}
