use crate::types::Role;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ViewOrders,
    UpdateOrderStatus,
    CreateOrder,
    ManageProducts,
    ManageInventory,
    ManageCustomers,
    ViewReports,
    ManageUsers,
    SystemSettings,
}

impl Permission {
    pub fn all() -> &'static [Permission] {
        use Permission::*;
        &[
            ViewOrders,
            UpdateOrderStatus,
            CreateOrder,
            ManageProducts,
            ManageInventory,
            ManageCustomers,
            ViewReports,
            ManageUsers,
            SystemSettings,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Permission::ViewOrders => "view_orders",
            Permission::UpdateOrderStatus => "update_order_status",
            Permission::CreateOrder => "create_order",
            Permission::ManageProducts => "manage_products",
            Permission::ManageInventory => "manage_inventory",
            Permission::ManageCustomers => "manage_customers",
            Permission::ViewReports => "view_reports",
            Permission::ManageUsers => "manage_users",
            Permission::SystemSettings => "system_settings",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PermissionTemplate {
    pub role: Role,
    pub description: &'static str,
    pub permissions: Vec<Permission>,
}

/// Default permission set for a role.
pub fn template(role: Role) -> PermissionTemplate {
    use Permission::*;
    let (description, permissions) = match role {
        Role::Admin => ("Full access to every store function", Permission::all().to_vec()),
        Role::Manager => (
            "Runs the floor: catalog, stock, customers and reports",
            vec![
                ViewOrders,
                UpdateOrderStatus,
                CreateOrder,
                ManageProducts,
                ManageInventory,
                ManageCustomers,
                ViewReports,
            ],
        ),
        Role::Cashier => (
            "Takes orders and looks after customers",
            vec![ViewOrders, CreateOrder, ManageCustomers],
        ),
        Role::Kitchen => (
            "Works the kitchen display",
            vec![ViewOrders, UpdateOrderStatus],
        ),
    };
    PermissionTemplate {
        role,
        description,
        permissions,
    }
}

pub fn templates() -> Vec<PermissionTemplate> {
    Role::all().iter().copied().map(template).collect()
}

pub fn has_permission(role: Role, permission: Permission) -> bool {
    template(role).permissions.contains(&permission)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_has_everything() {
        for p in Permission::all() {
            assert!(has_permission(Role::Admin, *p), "{p}");
        }
    }

    #[test]
    fn only_admin_manages_users_and_settings() {
        for role in [Role::Manager, Role::Cashier, Role::Kitchen] {
            assert!(!has_permission(role, Permission::ManageUsers));
            assert!(!has_permission(role, Permission::SystemSettings));
        }
    }

    #[test]
    fn kitchen_can_update_orders_but_not_products() {
        assert!(has_permission(Role::Kitchen, Permission::UpdateOrderStatus));
        assert!(!has_permission(Role::Kitchen, Permission::ManageProducts));
    }

    #[test]
    fn templates_cover_all_roles_and_serialize_snake_case() {
        let all = templates();
        assert_eq!(all.len(), Role::all().len());
        let json = serde_json::to_value(template(Role::Cashier)).unwrap();
        assert_eq!(json["role"], "cashier");
        assert_eq!(json["permissions"][0], "view_orders");
    }
}
