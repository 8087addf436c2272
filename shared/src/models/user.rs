//! Actor identity and capability checks

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authenticated caller as seen by the services
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: Uuid,
    pub is_manager: bool,
    pub is_admin: bool,
}

impl Actor {
    /// Managers and admins may moderate and manage the catalog
    pub fn is_privileged(&self) -> bool {
        self.is_manager || self.is_admin
    }

    /// Owners always see their own orders; privileged actors see all
    pub fn can_access_order(&self, created_by: Uuid) -> bool {
        self.user_id == created_by || self.is_privileged()
    }
}

/// Capabilities gating privileged operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    ManageCatalog,
    ModerateOrders,
    ManageUsers,
}

/// Single authorization decision point for privileged operations
pub fn authorize(actor: &Actor, capability: Capability) -> bool {
    match capability {
        Capability::ManageCatalog | Capability::ModerateOrders => actor.is_privileged(),
        Capability::ManageUsers => actor.is_admin,
    }
}
