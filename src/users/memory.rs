use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::error::{UserError, UserResult};
use super::repo::UserRepo;
use super::repo_types::User;

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<i64, User>,
    last_id: i64,
}

impl Table {
    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.rows
            .values()
            .any(|u| Some(u.id) != except && u.email == email)
    }
}

/// In-memory gateway for development and tests.
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepo {
    table: Arc<RwLock<Table>>,
}

impl InMemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepo for InMemoryUserRepo {
    async fn find_all(&self) -> UserResult<Vec<User>> {
        let table = self.table.read().await;
        Ok(table.rows.values().cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> UserResult<Option<User>> {
        let table = self.table.read().await;
        Ok(table.rows.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let table = self.table.read().await;
        Ok(table.rows.values().find(|u| u.email == email).cloned())
    }

    async fn insert(&self, mut user: User) -> UserResult<User> {
        let mut table = self.table.write().await;
        // Same guard as the UNIQUE constraint on users.email.
        if table.email_taken(&user.email, None) {
            return Err(UserError::DuplicateEmail(user.email));
        }
        table.last_id += 1;
        user.id = table.last_id;
        table.rows.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> UserResult<Option<User>> {
        let mut table = self.table.write().await;
        if !table.rows.contains_key(&user.id) {
            return Ok(None);
        }
        if table.email_taken(&user.email, Some(user.id)) {
            return Err(UserError::DuplicateEmail(user.email));
        }
        table.rows.insert(user.id, user.clone());
        Ok(Some(user))
    }

    async fn delete_by_id(&self, id: i64) -> UserResult<bool> {
        let mut table = self.table.write().await;
        Ok(table.rows.remove(&id).is_some())
    }
}
