//! Built-in role and permission catalog
//!
//! Read-only reference data served by the roles and permissions endpoints.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PermissionType {
    Menu,
    Button,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CatalogStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionDef {
    pub id: u64,
    pub code: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub module: &'static str,
    #[serde(rename = "type")]
    pub kind: PermissionType,
    pub status: CatalogStatus,
    pub sort_order: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleDef {
    pub id: u64,
    pub code: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub status: CatalogStatus,
    pub sort_order: u32,
    pub permissions: Vec<&'static str>,
}

/// A role with its granted permissions resolved to full definitions
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleWithPermissions {
    #[serde(flatten)]
    pub role: RoleDef,
    pub permission_details: Vec<&'static PermissionDef>,
}

const USER_MANAGEMENT: &str = "User Management";
const ROLE_MANAGEMENT: &str = "Role Management";
const PERMISSION_MANAGEMENT: &str = "Permission Management";
const SYSTEM: &str = "System";
const DASHBOARD: &str = "Dashboard";

const fn perm(
    id: u64,
    code: &'static str,
    name: &'static str,
    description: &'static str,
    module: &'static str,
    kind: PermissionType,
    sort_order: u32,
) -> PermissionDef {
    PermissionDef {
        id,
        code,
        name,
        description,
        module,
        kind,
        status: CatalogStatus::Active,
        sort_order,
    }
}

use PermissionType::{Button, Menu};

static PERMISSIONS: [PermissionDef; 20] = [
    perm(1, "user:view", "View users", "List and inspect users", USER_MANAGEMENT, Menu, 0),
    perm(2, "user:create", "Create users", "Create new users", USER_MANAGEMENT, Button, 1),
    perm(3, "user:edit", "Edit users", "Edit user details", USER_MANAGEMENT, Button, 2),
    perm(4, "user:delete", "Delete users", "Delete users", USER_MANAGEMENT, Button, 3),
    perm(5, "user:import", "Import users", "Bulk import users", USER_MANAGEMENT, Button, 4),
    perm(6, "user:export", "Export users", "Export user data", USER_MANAGEMENT, Button, 5),
    perm(7, "role:view", "View roles", "List and inspect roles", ROLE_MANAGEMENT, Menu, 10),
    perm(8, "role:create", "Create roles", "Create new roles", ROLE_MANAGEMENT, Button, 11),
    perm(9, "role:edit", "Edit roles", "Edit role details", ROLE_MANAGEMENT, Button, 12),
    perm(10, "role:delete", "Delete roles", "Delete roles", ROLE_MANAGEMENT, Button, 13),
    perm(11, "role:assign", "Assign permissions", "Assign permissions to roles", ROLE_MANAGEMENT, Button, 14),
    perm(12, "permission:view", "View permissions", "List and inspect permissions", PERMISSION_MANAGEMENT, Menu, 20),
    perm(13, "permission:create", "Create permissions", "Create new permissions", PERMISSION_MANAGEMENT, Button, 21),
    perm(14, "permission:edit", "Edit permissions", "Edit permission details", PERMISSION_MANAGEMENT, Button, 22),
    perm(15, "permission:delete", "Delete permissions", "Delete permissions", PERMISSION_MANAGEMENT, Button, 23),
    perm(16, "system:settings", "System settings", "Manage system configuration", SYSTEM, Menu, 30),
    perm(17, "system:monitor", "System monitor", "Monitoring and logs", SYSTEM, Menu, 31),
    perm(18, "system:backup", "Data backup", "Backup and restore data", SYSTEM, Button, 32),
    perm(19, "dashboard:view", "View dashboard", "View the system dashboard", DASHBOARD, Menu, 40),
    perm(20, "dashboard:report", "Reports", "View statistical reports", DASHBOARD, Menu, 41),
];

/// Every permission, ordered by sort order
pub fn permissions() -> &'static [PermissionDef] {
    &PERMISSIONS
}

fn codes_where(filter: impl Fn(&PermissionDef) -> bool) -> Vec<&'static str> {
    PERMISSIONS.iter().filter(|p| filter(p)).map(|p| p.code).collect()
}

/// Every role with its granted permission codes, ordered by sort order
pub fn roles() -> Vec<RoleDef> {
    vec![
        RoleDef {
            id: 1,
            code: "SUPER_ADMIN",
            name: "Super administrator",
            description: "Holds every permission",
            status: CatalogStatus::Active,
            sort_order: 0,
            permissions: codes_where(|_| true),
        },
        RoleDef {
            id: 2,
            code: "ADMIN",
            name: "Administrator",
            description: "Holds most administrative permissions",
            status: CatalogStatus::Active,
            sort_order: 1,
            permissions: codes_where(|p| p.code != "system:backup"),
        },
        RoleDef {
            id: 3,
            code: "MANAGER",
            name: "Department manager",
            description: "Manages users within a department",
            status: CatalogStatus::Active,
            sort_order: 2,
            permissions: codes_where(|p| p.module == USER_MANAGEMENT || p.module == DASHBOARD),
        },
        RoleDef {
            id: 4,
            code: "USER",
            name: "User",
            description: "Basic read access",
            status: CatalogStatus::Active,
            sort_order: 3,
            permissions: codes_where(|p| p.code.contains("view")),
        },
        RoleDef {
            id: 5,
            code: "GUEST",
            name: "Guest",
            description: "Public information only",
            status: CatalogStatus::Active,
            sort_order: 4,
            permissions: codes_where(|p| p.code == "dashboard:view"),
        },
    ]
}

/// Role by id
pub fn role(id: u64) -> Option<RoleDef> {
    roles().into_iter().find(|r| r.id == id)
}

pub fn active_roles() -> Vec<RoleDef> {
    roles()
        .into_iter()
        .filter(|r| r.status == CatalogStatus::Active)
        .collect()
}

fn with_permissions(role: RoleDef) -> RoleWithPermissions {
    let permission_details = PERMISSIONS
        .iter()
        .filter(|p| role.permissions.contains(&p.code))
        .collect();
    RoleWithPermissions {
        role,
        permission_details,
    }
}

/// Role by id with its permission definitions
pub fn role_with_permissions(id: u64) -> Option<RoleWithPermissions> {
    role(id).map(with_permissions)
}

pub fn roles_with_permissions() -> Vec<RoleWithPermissions> {
    roles().into_iter().map(with_permissions).collect()
}

/// Permission by id
pub fn permission(id: u64) -> Option<&'static PermissionDef> {
    PERMISSIONS.iter().find(|p| p.id == id)
}

pub fn active_permissions() -> Vec<&'static PermissionDef> {
    PERMISSIONS
        .iter()
        .filter(|p| p.status == CatalogStatus::Active)
        .collect()
}

/// Active permissions of one module; the name is matched ignoring ASCII case
pub fn active_permissions_in(module: &str) -> Vec<&'static PermissionDef> {
    active_permissions()
        .into_iter()
        .filter(|p| p.module.eq_ignore_ascii_case(module))
        .collect()
}

/// Distinct module names in sort order
pub fn modules() -> Vec<&'static str> {
    let mut modules: Vec<&'static str> = Vec::new();
    for p in PERMISSIONS.iter() {
        if !modules.contains(&p.module) {
            modules.push(p.module);
        }
    }
    modules
}
