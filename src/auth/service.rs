// Authentication service - business logic layer

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{
    error::AuthError,
    models::{Role, RoleResponse, User, UserResponse, UserRole, UserRoleResponse},
    password::PasswordService,
    repository::CredentialStore,
    token::TokenService,
};
use crate::validation::{validate_first_letter_uppercase, FieldErrors};

/// Authentication service coordinating registration, login, roles and tokens
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    tokens: Arc<TokenService>,
}

impl AuthService {
    /// Create a new AuthService
    pub fn new(store: Arc<dyn CredentialStore>, tokens: Arc<TokenService>) -> Self {
        Self { store, tokens }
    }

    /// Register a new user
    ///
    /// The username must be unused; nothing is written when it is taken.
    pub async fn register(&self, username: &str, password: &str) -> Result<UserResponse, AuthError> {
        if self.store.find_user_by_username(username).await?.is_some() {
            warn!("Registration rejected, username taken: {}", username);
            return Err(AuthError::Conflict("User already exists.".to_string()));
        }

        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: PasswordService::hash_password(password)?,
            created_date: Utc::now(),
        };
        self.store.create_user(&user).await?;

        info!("User registered: id={}, username={}", user.id, user.username);
        Ok(UserResponse::new(user, Vec::new()))
    }

    /// Login with username and password, returning a signed token
    pub async fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        // Unknown username and wrong password fail the same way, at the same cost
        let Some(user) = self.store.find_user_by_username(username).await? else {
            PasswordService::verify_against_dummy(password);
            warn!("Login failed for username={}", username);
            return Err(AuthError::InvalidCredentials);
        };

        if !PasswordService::verify_password(password, &user.password_hash)? {
            warn!("Login failed for username={}", username);
            return Err(AuthError::InvalidCredentials);
        }

        let roles = self.store.roles_for_user(user.id).await?;
        let token = self.tokens.issue(&user, &roles)?;

        info!("User logged in: id={}", user.id);
        Ok(token)
    }

    /// Re-issue a token for a currently valid one, re-resolving roles
    pub async fn renew(&self, current_token: &str) -> Result<String, AuthError> {
        let claims = self.tokens.verify(current_token)?;
        let user = self
            .store
            .find_user_by_id(claims.user_id()?)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        let roles = self.store.roles_for_user(user.id).await?;
        self.tokens.issue(&user, &roles)
    }

    pub async fn get_roles(&self) -> Result<Vec<RoleResponse>, AuthError> {
        let roles = self.store.list_roles().await?;
        Ok(roles.into_iter().map(RoleResponse::from).collect())
    }

    /// Create a role; `created_by` is the authenticated caller, if any
    pub async fn add_role(&self, name: &str, created_by: Option<Uuid>) -> Result<RoleResponse, AuthError> {
        check_role_name(name)?;

        if self.store.find_role_by_name(name).await?.is_some() {
            return Err(AuthError::Conflict("Role already exists.".to_string()));
        }

        let role = Role {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_by_user_id: created_by,
            created_date: Some(Utc::now()),
        };
        self.store.create_role(&role).await?;

        info!("Role created: id={}, name={}", role.id, role.name);
        Ok(RoleResponse::from(role))
    }

    /// Rename a role
    pub async fn update_role(&self, id: &str, name: &str) -> Result<RoleResponse, AuthError> {
        let id = parse_id("Role", id)?;
        check_role_name(name)?;

        let mut role = self
            .store
            .find_role_by_id(id)
            .await?
            .ok_or(AuthError::NotFound("Role"))?;

        if let Some(existing) = self.store.find_role_by_name(name).await? {
            if existing.id != id {
                return Err(AuthError::Conflict("Role already exists.".to_string()));
            }
        }

        role.name = name.to_string();
        if !self.store.update_role(&role).await? {
            return Err(AuthError::NotFound("Role"));
        }

        info!("Role updated: id={}, name={}", role.id, role.name);
        Ok(RoleResponse::from(role))
    }

    /// Delete a role together with its user-role links
    pub async fn delete_role(&self, id: &str) -> Result<RoleResponse, AuthError> {
        let id = parse_id("Role", id)?;
        let role = self
            .store
            .find_role_by_id(id)
            .await?
            .ok_or(AuthError::NotFound("Role"))?;

        if !self.store.delete_role(id).await? {
            return Err(AuthError::NotFound("Role"));
        }

        info!("Role deleted: id={}, name={}", role.id, role.name);
        Ok(RoleResponse::from(role))
    }

    /// Link a user to a role
    pub async fn assign_role(
        &self,
        user_id: &str,
        role_id: &str,
        created_by: Option<Uuid>,
    ) -> Result<UserRoleResponse, AuthError> {
        let user_id = parse_id("User", user_id)?;
        let role_id = parse_id("Role", role_id)?;

        if self.store.find_user_by_id(user_id).await?.is_none() {
            return Err(AuthError::NotFound("User"));
        }
        if self.store.find_role_by_id(role_id).await?.is_none() {
            return Err(AuthError::NotFound("Role"));
        }
        if self.store.find_user_role(user_id, role_id).await?.is_some() {
            return Err(AuthError::Conflict("User already has this role.".to_string()));
        }

        let link = UserRole {
            user_id,
            role_id,
            created_by_user_id: created_by,
            created_date: Utc::now(),
        };
        self.store.create_user_role(&link).await?;

        info!("Role assigned: user_id={}, role_id={}", user_id, role_id);
        Ok(UserRoleResponse::from(link))
    }

    /// All users with their roles resolved
    pub async fn get_users(&self) -> Result<Vec<UserResponse>, AuthError> {
        let users = self.store.list_users().await?;
        let mut responses = Vec::with_capacity(users.len());
        for user in users {
            let roles = self.store.roles_for_user(user.id).await?;
            responses.push(UserResponse::new(user, roles));
        }
        Ok(responses)
    }

    pub async fn get_user_by_id(&self, id: &str) -> Result<UserResponse, AuthError> {
        let id = parse_id("User", id)?;
        let user = self
            .store
            .find_user_by_id(id)
            .await?
            .ok_or(AuthError::NotFound("User"))?;

        let roles = self.store.roles_for_user(user.id).await?;
        Ok(UserResponse::new(user, roles))
    }

    pub async fn get_user_roles(&self) -> Result<Vec<UserRoleResponse>, AuthError> {
        let links = self.store.list_user_roles().await?;
        Ok(links.into_iter().map(UserRoleResponse::from).collect())
    }
}

/// Parse a textual identifier, naming the object it should refer to
fn parse_id(object: &'static str, raw: &str) -> Result<Uuid, AuthError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AuthError::InvalidGuid {
        object,
        keys: raw.to_string(),
    })
}

fn check_role_name(name: &str) -> Result<(), AuthError> {
    validate_first_letter_uppercase(name).map_err(|_| {
        AuthError::Validation(FieldErrors::single("roleName", "First letter must be uppercase"))
    })
}
