// Authentication data models and DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::{uuid, Uuid};
use validator::Validate;

/// Roles present from initialization; names are stored exactly as seeded
pub const SEEDED_ROLES: [(Uuid, &str); 5] = [
    (uuid!("ca27ff11-bc43-4c37-aca8-f43b39cff66d"), "user"),
    (uuid!("db2a81bd-87e7-4588-9eaa-75ebbd14c81b"), "Supervisor"),
    (uuid!("64f4ec66-f130-47bd-b8ca-9c51e2faa5dc"), "Manager"),
    (uuid!("e49fbccc-9453-4317-8c15-ee6e2ff43310"), "Admin"),
    (uuid!("a17c2e09-d89b-4716-a9b1-6f8a147aabaa"), "Developer"),
];

/// User database model
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub created_date: DateTime<Utc>,
}

/// Role database model
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub created_by_user_id: Option<Uuid>,
    pub created_date: Option<DateTime<Utc>>,
}

/// User/role link, keyed by (user_id, role_id)
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct UserRole {
    pub user_id: Uuid,
    pub role_id: Uuid,
    pub created_by_user_id: Option<Uuid>,
    pub created_date: DateTime<Utc>,
}

/// Registration request DTO
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(alias = "Username")]
    #[validate(length(min = 1, max = 20, message = "Username must be between 1 and 20 characters"))]
    pub username: String,
    #[serde(alias = "Password")]
    #[validate(length(min = 1, max = 20, message = "Password must be between 1 and 20 characters"))]
    pub password: String,
}

/// Login request DTO
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(alias = "Username")]
    #[validate(length(min = 1, max = 20, message = "Username must be between 1 and 20 characters"))]
    pub username: String,
    #[serde(alias = "Password")]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Role create/update DTO
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RoleRequest {
    #[serde(alias = "RoleName")]
    #[validate(
        length(min = 1, max = 20, message = "RoleName must be between 1 and 20 characters"),
        custom = "crate::validation::validate_first_letter_uppercase"
    )]
    pub role_name: String,
}

/// Role assignment DTO; ids arrive as strings and are parsed by the service
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssignRoleRequest {
    #[serde(alias = "UserId")]
    #[validate(length(min = 1, message = "UserId is required"))]
    pub user_id: String,
    #[serde(alias = "RoleId")]
    #[validate(length(min = 1, message = "RoleId is required"))]
    pub role_id: String,
}

/// `?id=` query parameter used by role update/delete
#[derive(Debug, Default, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

/// Role response DTO
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoleResponse {
    pub id: Uuid,
    pub role_name: String,
    pub created_by_user_id: Option<Uuid>,
    pub created_date: Option<DateTime<Utc>>,
}

impl From<Role> for RoleResponse {
    fn from(role: Role) -> Self {
        Self {
            id: role.id,
            role_name: role.name,
            created_by_user_id: role.created_by_user_id,
            created_date: role.created_date,
        }
    }
}

/// User response model (excludes password_hash)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub created_date: DateTime<Utc>,
    pub roles: Vec<RoleResponse>,
}

impl UserResponse {
    pub fn new(user: User, roles: Vec<Role>) -> Self {
        Self {
            id: user.id,
            username: user.username,
            created_date: user.created_date,
            roles: roles.into_iter().map(RoleResponse::from).collect(),
        }
    }
}

/// User/role link response DTO
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserRoleResponse {
    pub user_id: Uuid,
    pub role_id: Uuid,
    pub created_by_user_id: Option<Uuid>,
    pub created_date: DateTime<Utc>,
}

impl From<UserRole> for UserRoleResponse {
    fn from(link: UserRole) -> Self {
        Self {
            user_id: link.user_id,
            role_id: link.role_id,
            created_by_user_id: link.created_by_user_id,
            created_date: link.created_date,
        }
    }
}
