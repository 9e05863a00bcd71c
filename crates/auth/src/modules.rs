use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Logical capability area of the application (e.g. `"listings"`).
///
/// Modules are independent of URL structure: several routes may resolve to
/// the same module, and access is always granted per module, never per route.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Module(Cow<'static, str>);

impl Module {
    pub const DASHBOARD: Module = Module::from_static("dashboard");
    pub const LISTINGS: Module = Module::from_static("listings");
    pub const TENANTS: Module = Module::from_static("tenants");
    pub const MAINTENANCE: Module = Module::from_static("maintenance");
    pub const REPORTS: Module = Module::from_static("reports");
    pub const SETTINGS: Module = Module::from_static("settings");

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Module {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Module {
    fn from(value: &str) -> Self {
        Self(Cow::Owned(value.to_string()))
    }
}
