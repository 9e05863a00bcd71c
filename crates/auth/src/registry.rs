//! Role registry: which roles may use the application and which modules
//! each role may access.
//!
//! This is the single source of truth for role → module permissions. Guards,
//! navigation and audit endpoints all read from the same registry so they
//! cannot diverge.

use std::collections::HashMap;

use crate::{Module, Role};

/// Static role → module permission table plus the allowed-role list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRegistry {
    allowed_roles: Vec<Role>,
    permissions: HashMap<Role, Vec<Module>>,
}

impl RoleRegistry {
    /// Empty registry: no role is allowed and no role has any module.
    pub fn empty() -> Self {
        Self {
            allowed_roles: Vec::new(),
            permissions: HashMap::new(),
        }
    }

    /// Build a registry from an explicit permission table.
    ///
    /// Every role in the table is allowed to sign in, in table order.
    pub fn new<I, M>(table: I) -> Self
    where
        I: IntoIterator<Item = (Role, M)>,
        M: IntoIterator<Item = Module>,
    {
        table
            .into_iter()
            .fold(Self::empty(), |registry, (role, modules)| registry.with_role(role, modules))
    }

    /// Add (or replace) a role and the modules it may access.
    ///
    /// Module order is preserved; duplicates are dropped.
    pub fn with_role(mut self, role: Role, modules: impl IntoIterator<Item = Module>) -> Self {
        let mut ordered: Vec<Module> = Vec::new();
        for module in modules {
            if !ordered.contains(&module) {
                ordered.push(module);
            }
        }

        if !self.allowed_roles.contains(&role) {
            self.allowed_roles.push(role.clone());
        }
        self.permissions.insert(role, ordered);
        self
    }

    /// Restrict which roles may sign in.
    ///
    /// Roles listed here but missing from the permission table are kept (they
    /// resolve to no modules); [`AccessConfig`](crate::AccessConfig) rejects
    /// that situation at load time.
    pub fn with_allowed_roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.allowed_roles = Vec::new();
        for role in roles {
            if !self.allowed_roles.contains(&role) {
                self.allowed_roles.push(role);
            }
        }
        self
    }

    /// Modules the role may access, in declaration order.
    ///
    /// Unknown roles get an empty slice.
    pub fn allowed_modules(&self, role: &Role) -> &[Module] {
        self.permissions
            .get(role)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether a role may use the application at all.
    pub fn is_allowed_role(&self, role: &Role) -> bool {
        self.allowed_roles.contains(role)
    }

    pub fn allowed_roles(&self) -> &[Role] {
        &self.allowed_roles
    }

    /// Whether the role appears in the permission table.
    pub fn knows_role(&self, role: &Role) -> bool {
        self.permissions.contains_key(role)
    }

    /// Allowed roles with their modules, in allowed-role order.
    pub fn roles(&self) -> impl Iterator<Item = (&Role, &[Module])> + '_ {
        self.allowed_roles
            .iter()
            .map(move |role| (role, self.allowed_modules(role)))
    }
}

impl Default for RoleRegistry {
    /// The property-management permission table.
    fn default() -> Self {
        Self::empty()
            .with_role(
                Role::ADMIN,
                [
                    Module::DASHBOARD,
                    Module::LISTINGS,
                    Module::TENANTS,
                    Module::MAINTENANCE,
                    Module::REPORTS,
                    Module::SETTINGS,
                ],
            )
            .with_role(
                Role::PROPERTY_MANAGER,
                [
                    Module::DASHBOARD,
                    Module::LISTINGS,
                    Module::TENANTS,
                    Module::MAINTENANCE,
                    Module::REPORTS,
                ],
            )
            .with_role(
                Role::ASSOCIATE_MANAGER,
                [
                    Module::DASHBOARD,
                    Module::LISTINGS,
                    Module::TENANTS,
                    Module::MAINTENANCE,
                ],
            )
            .with_role(Role::MAINTENANCE, [Module::DASHBOARD, Module::MAINTENANCE])
    }
}
