// In-memory credential store used by the test suites

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::auth::models::{Role, User, UserRole, SEEDED_ROLES};
use crate::auth::repository::{CredentialStore, StoreError};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    roles: HashMap<Uuid, Role>,
    user_roles: Vec<UserRole>,
}

/// Mutex-guarded tables with the same uniqueness rules as the SQL schema
#[derive(Default)]
pub struct MemoryCredentialStore {
    tables: Mutex<Tables>,
    offline: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryCredentialStore {
    /// Store holding only the five seeded roles
    pub fn seeded() -> Self {
        let store = Self::default();
        {
            let mut tables = store.tables.lock().unwrap();
            for (id, name) in SEEDED_ROLES {
                tables.roles.insert(
                    id,
                    Role {
                        id,
                        name: name.to_string(),
                        created_by_user_id: None,
                        created_date: None,
                    },
                );
            }
        }
        store
    }

    /// Make every call fail as if the database were unreachable
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of successful mutations so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.check_online()
    }

    async fn create_user(&self, user: &User) -> Result<(), StoreError> {
        self.check_online()?;
        let mut tables = self.tables.lock().unwrap();
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::Duplicate("users_username_key".to_string()));
        }
        tables.users.insert(user.id, user.clone());
        self.record_write();
        Ok(())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        self.check_online()?;
        Ok(self.tables.lock().unwrap().users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.check_online()?;
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        self.check_online()?;
        let mut users: Vec<User> = self.tables.lock().unwrap().users.values().cloned().collect();
        users.sort_by(|a, b| (a.created_date, &a.username).cmp(&(b.created_date, &b.username)));
        Ok(users)
    }

    async fn create_role(&self, role: &Role) -> Result<(), StoreError> {
        self.check_online()?;
        let mut tables = self.tables.lock().unwrap();
        if tables.roles.values().any(|r| r.name == role.name) {
            return Err(StoreError::Duplicate("roles_name_key".to_string()));
        }
        tables.roles.insert(role.id, role.clone());
        self.record_write();
        Ok(())
    }

    async fn update_role(&self, role: &Role) -> Result<bool, StoreError> {
        self.check_online()?;
        let mut tables = self.tables.lock().unwrap();
        if tables.roles.values().any(|r| r.name == role.name && r.id != role.id) {
            return Err(StoreError::Duplicate("roles_name_key".to_string()));
        }
        match tables.roles.get_mut(&role.id) {
            Some(existing) => {
                existing.name = role.name.clone();
                self.record_write();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_role(&self, id: Uuid) -> Result<bool, StoreError> {
        self.check_online()?;
        let mut tables = self.tables.lock().unwrap();
        if tables.roles.remove(&id).is_none() {
            return Ok(false);
        }
        tables.user_roles.retain(|link| link.role_id != id);
        self.record_write();
        Ok(true)
    }

    async fn find_role_by_id(&self, id: Uuid) -> Result<Option<Role>, StoreError> {
        self.check_online()?;
        Ok(self.tables.lock().unwrap().roles.get(&id).cloned())
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, StoreError> {
        self.check_online()?;
        let tables = self.tables.lock().unwrap();
        Ok(tables.roles.values().find(|r| r.name == name).cloned())
    }

    async fn list_roles(&self) -> Result<Vec<Role>, StoreError> {
        self.check_online()?;
        let mut roles: Vec<Role> = self.tables.lock().unwrap().roles.values().cloned().collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn create_user_role(&self, link: &UserRole) -> Result<(), StoreError> {
        self.check_online()?;
        let mut tables = self.tables.lock().unwrap();
        if !tables.users.contains_key(&link.user_id) {
            return Err(StoreError::MissingReference("user_roles_user_id_fkey".to_string()));
        }
        if !tables.roles.contains_key(&link.role_id) {
            return Err(StoreError::MissingReference("user_roles_role_id_fkey".to_string()));
        }
        if tables
            .user_roles
            .iter()
            .any(|l| l.user_id == link.user_id && l.role_id == link.role_id)
        {
            return Err(StoreError::Duplicate("user_roles_pkey".to_string()));
        }
        tables.user_roles.push(link.clone());
        self.record_write();
        Ok(())
    }

    async fn find_user_role(&self, user_id: Uuid, role_id: Uuid) -> Result<Option<UserRole>, StoreError> {
        self.check_online()?;
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .user_roles
            .iter()
            .find(|l| l.user_id == user_id && l.role_id == role_id)
            .cloned())
    }

    async fn list_user_roles(&self) -> Result<Vec<UserRole>, StoreError> {
        self.check_online()?;
        Ok(self.tables.lock().unwrap().user_roles.clone())
    }

    async fn roles_for_user(&self, user_id: Uuid) -> Result<Vec<Role>, StoreError> {
        self.check_online()?;
        let tables = self.tables.lock().unwrap();
        let mut roles: Vec<Role> = tables
            .user_roles
            .iter()
            .filter(|l| l.user_id == user_id)
            .filter_map(|l| tables.roles.get(&l.role_id).cloned())
            .collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }
}
