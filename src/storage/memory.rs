use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Chirp, ChirpStore, RefreshTokenStore, User, UserCredentials, UserDirectory};
use crate::auth::{hash_token, RefreshToken};
use crate::error::{AppError, DatabaseError};

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, AppError> {
    mutex
        .lock()
        .map_err(|_| AppError::Internal("in-memory store lock poisoned".to_string()))
}

/// Users keyed by id
#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: Mutex<HashMap<Uuid, UserCredentials>>,
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn create(&self, email: &str, hashed_password: &str) -> Result<User, AppError> {
        let mut users = lock(&self.users)?;
        if users.values().any(|c| c.user.email == email) {
            return Err(AppError::Database(DatabaseError::Duplicate(
                "Email already registered".to_string(),
            )));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            email: email.to_string(),
            is_chirpy_red: false,
        };
        users.insert(
            user.id,
            UserCredentials {
                user: user.clone(),
                hashed_password: Some(hashed_password.to_string()),
            },
        );
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredentials>, AppError> {
        let users = lock(&self.users)?;
        Ok(users.values().find(|c| c.user.email == email).cloned())
    }

    async fn update_credentials(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<Option<User>, AppError> {
        let mut users = lock(&self.users)?;
        if users.values().any(|c| c.user.email == email && c.user.id != id) {
            return Err(AppError::Database(DatabaseError::Duplicate(
                "Email already registered".to_string(),
            )));
        }

        Ok(users.get_mut(&id).map(|credentials| {
            credentials.user.email = email.to_string();
            credentials.user.updated_at = Utc::now();
            credentials.hashed_password = Some(hashed_password.to_string());
            credentials.user.clone()
        }))
    }

    async fn upgrade_to_chirpy_red(&self, id: Uuid) -> Result<bool, AppError> {
        let mut users = lock(&self.users)?;
        Ok(match users.get_mut(&id) {
            Some(credentials) => {
                credentials.user.is_chirpy_red = true;
                credentials.user.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn delete_all(&self) -> Result<(), AppError> {
        lock(&self.users)?.clear();
        Ok(())
    }
}

/// Refresh tokens keyed by the SHA-256 of the token value
#[derive(Default)]
pub struct InMemoryRefreshTokenStore {
    tokens: Mutex<HashMap<String, RefreshToken>>,
}

#[async_trait]
impl RefreshTokenStore for InMemoryRefreshTokenStore {
    async fn create(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshToken, AppError> {
        let mut tokens = lock(&self.tokens)?;
        let key = hash_token(token);
        if tokens.contains_key(&key) {
            return Err(AppError::Database(DatabaseError::Duplicate(
                "Refresh token already exists".to_string(),
            )));
        }

        let now = Utc::now();
        let record = RefreshToken {
            user_id,
            created_at: now,
            updated_at: now,
            expires_at,
            revoked_at: None,
        };
        tokens.insert(key, record.clone());
        Ok(record)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshToken>, AppError> {
        let tokens = lock(&self.tokens)?;
        Ok(tokens.get(&hash_token(token)).cloned())
    }

    async fn revoke(&self, token: &str) -> Result<bool, AppError> {
        let mut tokens = lock(&self.tokens)?;
        Ok(match tokens.get_mut(&hash_token(token)) {
            Some(record) => {
                if record.revoked_at.is_none() {
                    let now = Utc::now();
                    record.revoked_at = Some(now);
                    record.updated_at = now;
                }
                true
            }
            None => false,
        })
    }

    async fn delete_all(&self) -> Result<(), AppError> {
        lock(&self.tokens)?.clear();
        Ok(())
    }
}

/// Chirps in insertion order
#[derive(Default)]
pub struct InMemoryChirpStore {
    chirps: Mutex<Vec<Chirp>>,
}

#[async_trait]
impl ChirpStore for InMemoryChirpStore {
    async fn create(&self, user_id: Uuid, body: &str) -> Result<Chirp, AppError> {
        let now = Utc::now();
        let chirp = Chirp {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            body: body.to_string(),
            user_id,
        };
        lock(&self.chirps)?.push(chirp.clone());
        Ok(chirp)
    }

    async fn list(&self, author_id: Option<Uuid>) -> Result<Vec<Chirp>, AppError> {
        let chirps = lock(&self.chirps)?;
        Ok(chirps
            .iter()
            .filter(|c| author_id.map_or(true, |author| c.user_id == author))
            .cloned()
            .collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Chirp>, AppError> {
        let chirps = lock(&self.chirps)?;
        Ok(chirps.iter().find(|c| c.id == id).cloned())
    }

    async fn delete_owned(&self, id: Uuid, owner: Uuid) -> Result<bool, AppError> {
        let mut chirps = lock(&self.chirps)?;
        let before = chirps.len();
        chirps.retain(|c| !(c.id == id && c.user_id == owner));
        Ok(chirps.len() < before)
    }

    async fn delete_all(&self) -> Result<(), AppError> {
        lock(&self.chirps)?.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let users = InMemoryUserDirectory::default();
        users.create("a@b.com", "hash").await.unwrap();

        let result = users.create("a@b.com", "hash").await;
        assert!(matches!(
            result,
            Err(AppError::Database(DatabaseError::Duplicate(_)))
        ));
    }

    #[tokio::test]
    async fn test_revoke_is_monotonic() {
        let store = InMemoryRefreshTokenStore::default();
        store
            .create(Uuid::new_v4(), "token", Utc::now() + Duration::days(60))
            .await
            .unwrap();

        assert!(store.revoke("token").await.unwrap());
        let first = store.find_by_token("token").await.unwrap().unwrap();

        assert!(store.revoke("token").await.unwrap());
        let second = store.find_by_token("token").await.unwrap().unwrap();

        assert!(first.revoked_at.is_some());
        assert_eq!(first.revoked_at, second.revoked_at);
        assert_eq!(first.updated_at, second.updated_at);
    }

    #[tokio::test]
    async fn test_revoke_unknown_token() {
        let store = InMemoryRefreshTokenStore::default();
        assert!(!store.revoke("missing").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_owned_only_deletes_own_chirp() {
        let store = InMemoryChirpStore::default();
        let owner = Uuid::new_v4();
        let chirp = store.create(owner, "hello").await.unwrap();

        assert!(!store.delete_owned(chirp.id, Uuid::new_v4()).await.unwrap());
        assert!(store.get(chirp.id).await.unwrap().is_some());

        assert!(store.delete_owned(chirp.id, owner).await.unwrap());
        assert!(store.get(chirp.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_filters_by_author() {
        let store = InMemoryChirpStore::default();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        store.create(alice, "one").await.unwrap();
        store.create(bob, "two").await.unwrap();
        store.create(alice, "three").await.unwrap();

        let all = store.list(None).await.unwrap();
        let bodies: Vec<_> = all.iter().map(|c| c.body.as_str()).collect();
        assert_eq!(bodies, vec!["one", "two", "three"]);

        let alices = store.list(Some(alice)).await.unwrap();
        assert_eq!(alices.len(), 2);
        assert!(alices.iter().all(|c| c.user_id == alice));
    }
}
