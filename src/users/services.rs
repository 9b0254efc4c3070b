use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use super::dto::UpdateUserRequest;
use super::error::{UserError, UserResult};
use super::password::hash_password;
use super::repo::UserRepo;
use super::repo_types::User;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn check_email(email: &str) -> UserResult<()> {
    if email.is_empty() {
        return Err(UserError::InvalidRequest("email is required".into()));
    }
    if !is_valid_email(email) {
        return Err(UserError::InvalidRequest(format!("invalid email {}", email)));
    }
    Ok(())
}

// Argon2 at this memory cost is too slow for a runtime worker thread.
async fn hash_off_runtime(plain: String) -> UserResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&plain))
        .await
        .map_err(|e| UserError::Other(anyhow::Error::new(e).context("password hashing task")))?
}

fn check_username(username: &str) -> UserResult<()> {
    if username.trim().is_empty() {
        return Err(UserError::InvalidRequest("username is required".into()));
    }
    Ok(())
}

/// Business rules for the user lifecycle on top of a [`UserRepo`].
#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepo>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepo>) -> Self {
        Self { repo }
    }

    /// Registers a new user. The email pre-check is a fast path; the
    /// gateway's unique constraint settles concurrent creates.
    #[instrument(skip(self, user), fields(email = %user.email))]
    pub async fn create(&self, mut user: User) -> UserResult<User> {
        user.email = normalize_email(&user.email);
        check_username(&user.username)?;
        check_email(&user.email)?;
        if user.password.is_empty() {
            return Err(UserError::InvalidRequest("password is required".into()));
        }

        if self.get_by_email(&user.email).await?.is_some() {
            warn!(email = %user.email, "email already registered");
            return Err(UserError::DuplicateEmail(user.email));
        }

        user.password = hash_off_runtime(std::mem::take(&mut user.password)).await?;
        let saved = self.repo.insert(user).await?;
        info!(user_id = saved.id, email = %saved.email, "user created");
        Ok(saved)
    }

    /// Applies the fields present in `changes` to an existing user.
    #[instrument(skip(self, changes), fields(user_id = ?changes.id))]
    pub async fn update(&self, changes: UpdateUserRequest) -> UserResult<User> {
        let id = changes
            .id
            .filter(|id| *id > 0)
            .ok_or_else(|| UserError::InvalidRequest("id is required".into()))?;

        let mut user = self.repo.find_by_id(id).await?.ok_or_else(|| {
            warn!(user_id = id, "update of unknown user");
            UserError::NotFound
        })?;

        if let Some(username) = changes.username {
            check_username(&username)?;
            user.username = username;
        }

        if let Some(email) = changes.email {
            let email = normalize_email(&email);
            check_email(&email)?;
            if email != user.email {
                if let Some(other) = self.get_by_email(&email).await? {
                    if other.id != id {
                        warn!(email = %email, user_id = id, "email owned by another user");
                        return Err(UserError::DuplicateEmail(email));
                    }
                }
            }
            user.email = email;
        }

        // Empty means "keep the current password".
        if let Some(plain) = changes.password.filter(|p| !p.is_empty()) {
            user.password = hash_off_runtime(plain).await?;
        }

        // The row may have been deleted since the lookup above.
        let saved = self.repo.update(user).await?.ok_or_else(|| {
            warn!(user_id = id, "user removed before update");
            UserError::NotFound
        })?;
        info!(user_id = saved.id, "user updated");
        Ok(saved)
    }

    pub async fn get_all(&self) -> UserResult<Vec<User>> {
        self.repo.find_all().await
    }

    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: i64) -> UserResult<User> {
        self.repo.find_by_id(id).await?.ok_or(UserError::NotFound)
    }

    /// `Ok(None)` is a normal outcome; only gateway failures are errors.
    pub async fn get_by_email(&self, email: &str) -> UserResult<Option<User>> {
        self.repo.find_by_email(&normalize_email(email)).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> UserResult<bool> {
        if self.repo.find_by_id(id).await?.is_none() {
            warn!(user_id = id, "delete of unknown user");
            return Err(UserError::NotFound);
        }
        if !self.repo.delete_by_id(id).await? {
            warn!(user_id = id, "user removed concurrently");
            return Err(UserError::NotFound);
        }
        info!(user_id = id, "user deleted");
        Ok(true)
    }
}
