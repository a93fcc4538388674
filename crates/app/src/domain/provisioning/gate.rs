//! Provisioning gate

use crate::config::AppEnvironment;

/// Decides whether tenant creation provisions the tenant database itself.
///
/// Production requires the explicit flag; elsewhere provisioning always runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvisioningGate {
    pub enabled: bool,
    pub environment: AppEnvironment,
}

impl ProvisioningGate {
    #[must_use]
    pub fn allows_automatic(&self) -> bool {
        self.enabled || self.environment != AppEnvironment::Production
    }
}
