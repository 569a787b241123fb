//! In-memory user directory

use super::{NewUser, UserDirectory, UserRecord};
use crate::error::{AuthzError, Result};
use crate::role::Role;
use crate::types::UserId;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;

#[derive(Default)]
struct Accounts {
    users: HashMap<UserId, UserRecord>,
    next_id: u64,
}

/// User directory kept in process memory
///
/// The first account ever created is made an admin; every later one starts
/// as a regular user.
#[derive(Default)]
pub struct InMemoryUserDirectory {
    accounts: RwLock<Accounts>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Change an account's role; `new_role` is parsed with [`Role::from_str`](std::str::FromStr)
    pub async fn change_role(&self, id: &UserId, new_role: &str) -> Result<Role> {
        let role: Role = new_role.parse()?;
        let mut accounts = self.accounts.write().await;
        let user = accounts
            .users
            .get_mut(id)
            .ok_or_else(|| AuthzError::UserNotFound(id.to_string()))?;

        user.role = role;
        info!(user = %id, role = %role, "User role changed");
        Ok(role)
    }

    /// Flip the banned flag; returns the new value
    pub async fn toggle_ban(&self, id: &UserId) -> Result<bool> {
        let mut accounts = self.accounts.write().await;
        let user = accounts
            .users
            .get_mut(id)
            .ok_or_else(|| AuthzError::UserNotFound(id.to_string()))?;

        user.banned = !user.banned;
        info!(user = %id, banned = user.banned, "User ban toggled");
        Ok(user.banned)
    }

    pub async fn len(&self) -> usize {
        self.accounts.read().await.users.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn create_user(&self, new_user: NewUser) -> Result<UserRecord> {
        let mut accounts = self.accounts.write().await;

        if accounts.users.values().any(|u| u.email == new_user.email) {
            return Err(AuthzError::AlreadyExists(new_user.email));
        }

        let role = if accounts.users.is_empty() {
            Role::Admin
        } else {
            Role::User
        };

        accounts.next_id += 1;
        let record = UserRecord {
            id: UserId::from(accounts.next_id),
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            role,
            is_active: false,
            banned: false,
            refresh_token: None,
            created_at: Utc::now(),
        };
        accounts.users.insert(record.id.clone(), record.clone());

        info!(user = %record.id, role = %record.role, "User created");
        Ok(record)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserRecord>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.users.get(id).cloned())
    }

    async fn activate(&self, id: &UserId) -> Result<()> {
        let mut accounts = self.accounts.write().await;
        let user = accounts
            .users
            .get_mut(id)
            .ok_or_else(|| AuthzError::UserNotFound(id.to_string()))?;

        user.is_active = true;
        Ok(())
    }

    async fn update_token(&self, id: &UserId, refresh_token: Option<&str>) -> Result<()> {
        let mut accounts = self.accounts.write().await;
        let user = accounts
            .users
            .get_mut(id)
            .ok_or_else(|| AuthzError::UserNotFound(id.to_string()))?;

        user.refresh_token = refresh_token.map(str::to_string);
        Ok(())
    }
}
