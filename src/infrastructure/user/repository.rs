//! In-memory user repository implementation

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::user::{NewUser, SearchFilter, User, UserId, UserRepository};
use crate::domain::DomainError;

/// In-memory implementation of `UserRepository`
///
/// All state sits behind a single lock, so the duplicate checks and the
/// write they guard are atomic: a racing create or update observes the
/// indexes of the finished winner and fails with a conflict.
#[derive(Debug)]
pub struct InMemoryUserRepository {
    inner: Arc<RwLock<Directory>>,
    unique_name: bool,
    unique_phone: bool,
}

#[derive(Debug, Default)]
struct Directory {
    users: HashMap<i64, User>,
    /// email -> user id
    email_index: HashMap<String, i64>,
    /// phone -> user id, maintained only under the unique-phone policy
    phone_index: HashMap<String, i64>,
    next_id: i64,
}

impl InMemoryUserRepository {
    /// Create an empty repository with the default policy
    /// (email and phone unique, name not)
    pub fn new() -> Self {
        Self::with_policy(false, true)
    }

    /// Create an empty repository with explicit uniqueness policy flags
    pub fn with_policy(unique_name: bool, unique_phone: bool) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Directory::default())),
            unique_name,
            unique_phone,
        }
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Directory {
    fn holder_of_name(&self, name: &str) -> Option<&User> {
        self.users.values().find(|u| u.name() == name)
    }

    fn holder_of_phone(&self, phone: &str) -> Option<&User> {
        self.users.values().find(|u| u.phone() == Some(phone))
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get(&self, id: UserId) -> Result<Option<User>, DomainError> {
        let dir = self.inner.read().await;
        Ok(dir.users.get(&id.as_i64()).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<User>, DomainError> {
        let dir = self.inner.read().await;
        Ok(dir.holder_of_name(name).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let dir = self.inner.read().await;

        if let Some(id) = dir.email_index.get(email) {
            return Ok(dir.users.get(id).cloned());
        }

        Ok(None)
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, DomainError> {
        let dir = self.inner.read().await;

        if self.unique_phone {
            if let Some(id) = dir.phone_index.get(phone) {
                return Ok(dir.users.get(id).cloned());
            }
            return Ok(None);
        }

        Ok(dir.holder_of_phone(phone).cloned())
    }

    async fn create(&self, draft: NewUser) -> Result<User, DomainError> {
        let mut dir = self.inner.write().await;

        // Hard constraint re-check under the write lock, in the same
        // field order the service reports conflicts in
        if self.unique_name && dir.holder_of_name(&draft.name).is_some() {
            return Err(DomainError::conflict(
                "name",
                format!("Name '{}' already exists", draft.name),
            ));
        }

        if dir.email_index.contains_key(&draft.email) {
            return Err(DomainError::conflict(
                "email",
                format!("Email '{}' already exists", draft.email),
            ));
        }

        if self.unique_phone {
            if let Some(phone) = &draft.phone {
                if dir.phone_index.contains_key(phone) {
                    return Err(DomainError::conflict(
                        "phone",
                        format!("Phone '{}' already exists", phone),
                    ));
                }
            }
        }

        dir.next_id += 1;
        let id = dir.next_id;

        let user = User::new(UserId::new(id), draft);

        dir.email_index.insert(user.email().to_string(), id);
        if self.unique_phone {
            if let Some(phone) = user.phone() {
                dir.phone_index.insert(phone.to_string(), id);
            }
        }
        dir.users.insert(id, user.clone());

        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<User, DomainError> {
        let mut dir = self.inner.write().await;

        let id = user.id().as_i64();

        let Some(current) = dir.users.get(&id) else {
            return Err(DomainError::not_found(format!(
                "User '{}' not found",
                id
            )));
        };

        let old_email = current.email().to_string();
        let old_phone = current.phone().map(String::from);
        let old_name = current.name().to_string();

        if self.unique_name && user.name() != old_name {
            if let Some(holder) = dir.holder_of_name(user.name()) {
                if holder.id() != user.id() {
                    return Err(DomainError::conflict(
                        "name",
                        format!("Name '{}' already exists", user.name()),
                    ));
                }
            }
        }

        if user.email() != old_email {
            if let Some(holder_id) = dir.email_index.get(user.email()) {
                if *holder_id != id {
                    return Err(DomainError::conflict(
                        "email",
                        format!("Email '{}' already exists", user.email()),
                    ));
                }
            }
        }

        if self.unique_phone && user.phone() != old_phone.as_deref() {
            if let Some(phone) = user.phone() {
                if let Some(holder_id) = dir.phone_index.get(phone) {
                    if *holder_id != id {
                        return Err(DomainError::conflict(
                            "phone",
                            format!("Phone '{}' already exists", phone),
                        ));
                    }
                }
            }
        }

        // Maintain the indexes, then replace the record
        if user.email() != old_email {
            dir.email_index.remove(&old_email);
            dir.email_index.insert(user.email().to_string(), id);
        }

        if self.unique_phone && user.phone() != old_phone.as_deref() {
            if let Some(old) = &old_phone {
                dir.phone_index.remove(old);
            }
            if let Some(phone) = user.phone() {
                dir.phone_index.insert(phone.to_string(), id);
            }
        }

        dir.users.insert(id, user.clone());

        Ok(user.clone())
    }

    async fn delete(&self, id: UserId) -> Result<bool, DomainError> {
        let mut dir = self.inner.write().await;

        if let Some(user) = dir.users.remove(&id.as_i64()) {
            dir.email_index.remove(user.email());
            if let Some(phone) = user.phone() {
                dir.phone_index.remove(phone);
            }
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn list(&self) -> Result<Vec<User>, DomainError> {
        let dir = self.inner.read().await;

        let mut users: Vec<User> = dir.users.values().cloned().collect();
        users.sort_by_key(|u| u.id().as_i64());

        Ok(users)
    }

    async fn search(&self, filter: &SearchFilter) -> Result<Vec<User>, DomainError> {
        let dir = self.inner.read().await;

        let mut users: Vec<User> = dir
            .users
            .values()
            .filter(|u| filter.matches(u))
            .cloned()
            .collect();
        users.sort_by_key(|u| u.id().as_i64());

        Ok(users)
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let dir = self.inner.read().await;
        Ok(dir.users.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str, email: &str, phone: Option<&str>) -> NewUser {
        NewUser {
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.map(String::from),
            password_hash: "hash".to_string(),
            status: true,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let repo = InMemoryUserRepository::new();

        let a = repo.create(draft("Ana", "ana@x.com", None)).await.unwrap();
        let b = repo.create(draft("Bruno", "bruno@x.com", None)).await.unwrap();

        assert_eq!(a.id().as_i64(), 1);
        assert_eq!(b.id().as_i64(), 2);
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = InMemoryUserRepository::new();

        let created = repo
            .create(draft("Ana", "ana@x.com", Some("+15550001")))
            .await
            .unwrap();

        let retrieved = repo.get(created.id()).await.unwrap().unwrap();
        assert_eq!(retrieved.email(), "ana@x.com");
        assert_eq!(retrieved.phone(), Some("+15550001"));
    }

    #[tokio::test]
    async fn test_find_by_email_and_phone() {
        let repo = InMemoryUserRepository::new();
        repo.create(draft("Ana", "ana@x.com", Some("+15550001")))
            .await
            .unwrap();

        assert!(repo.find_by_email("ana@x.com").await.unwrap().is_some());
        assert!(repo.find_by_email("other@x.com").await.unwrap().is_none());
        assert!(repo.find_by_phone("+15550001").await.unwrap().is_some());
        assert!(repo.find_by_phone("+15559999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts_and_persists_nothing() {
        let repo = InMemoryUserRepository::new();
        repo.create(draft("Ana", "ana@x.com", None)).await.unwrap();

        let err = repo
            .create(draft("Impostor", "ana@x.com", None))
            .await
            .unwrap_err();

        assert_eq!(err.conflict_field(), Some("email"));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_phone_conflicts() {
        let repo = InMemoryUserRepository::new();
        repo.create(draft("Ana", "ana@x.com", Some("+15550001")))
            .await
            .unwrap();

        let err = repo
            .create(draft("Bruno", "bruno@x.com", Some("+15550001")))
            .await
            .unwrap_err();

        assert_eq!(err.conflict_field(), Some("phone"));
    }

    #[tokio::test]
    async fn test_name_uniqueness_follows_policy() {
        let relaxed = InMemoryUserRepository::new();
        relaxed.create(draft("Ana", "a@x.com", None)).await.unwrap();
        assert!(relaxed.create(draft("Ana", "b@x.com", None)).await.is_ok());

        let strict = InMemoryUserRepository::with_policy(true, true);
        strict.create(draft("Ana", "a@x.com", None)).await.unwrap();
        let err = strict
            .create(draft("Ana", "b@x.com", None))
            .await
            .unwrap_err();
        assert_eq!(err.conflict_field(), Some("name"));
    }

    #[tokio::test]
    async fn test_update_rejects_taken_email() {
        let repo = InMemoryUserRepository::new();
        repo.create(draft("Ana", "ana@x.com", None)).await.unwrap();
        let mut bruno = repo
            .create(draft("Bruno", "bruno@x.com", None))
            .await
            .unwrap();

        bruno.set_email("ana@x.com");
        let err = repo.update(&bruno).await.unwrap_err();

        assert_eq!(err.conflict_field(), Some("email"));
    }

    #[tokio::test]
    async fn test_update_keeps_own_values_without_conflict() {
        let repo = InMemoryUserRepository::new();
        let mut ana = repo
            .create(draft("Ana", "ana@x.com", Some("+15550001")))
            .await
            .unwrap();

        // Same email and phone, new name: no conflict
        ana.set_name("Anabel");
        let updated = repo.update(&ana).await.unwrap();

        assert_eq!(updated.name(), "Anabel");
        assert_eq!(updated.phone(), Some("+15550001"));
    }

    #[tokio::test]
    async fn test_update_moves_index_entries() {
        let repo = InMemoryUserRepository::new();
        let mut ana = repo
            .create(draft("Ana", "ana@x.com", Some("+15550001")))
            .await
            .unwrap();

        ana.set_email("ana@new.com");
        ana.set_phone("+15550002");
        repo.update(&ana).await.unwrap();

        // Old values are free again
        assert!(repo.find_by_email("ana@x.com").await.unwrap().is_none());
        assert!(repo.find_by_phone("+15550001").await.unwrap().is_none());
        assert!(
            repo.create(draft("Bruno", "ana@x.com", Some("+15550001")))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_found() {
        let repo = InMemoryUserRepository::new();
        let ghost = User::new(UserId::new(99), draft("Ana", "ana@x.com", None));

        let err = repo.update(&ghost).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let repo = InMemoryUserRepository::new();
        let ana = repo
            .create(draft("Ana", "ana@x.com", Some("+15550001")))
            .await
            .unwrap();

        assert!(repo.delete(ana.id()).await.unwrap());
        assert!(!repo.delete(ana.id()).await.unwrap());

        // Indexes cleaned: values reusable
        assert!(
            repo.create(draft("Bruno", "ana@x.com", Some("+15550001")))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_list_is_insertion_ordered() {
        let repo = InMemoryUserRepository::new();
        repo.create(draft("Bruno", "bruno@x.com", None)).await.unwrap();
        repo.create(draft("Ana", "ana@x.com", None)).await.unwrap();

        let users = repo.list().await.unwrap();
        let names: Vec<&str> = users.iter().map(|u| u.name()).collect();
        assert_eq!(names, vec!["Bruno", "Ana"]);
    }

    #[tokio::test]
    async fn test_search_keyword() {
        let repo = InMemoryUserRepository::new();
        repo.create(draft("Ana", "ana@x.com", Some("+15550001")))
            .await
            .unwrap();
        repo.create(draft("Bruno", "bruno@y.org", None)).await.unwrap();

        let hits = repo
            .search(&SearchFilter::Keyword("y.org".to_string()))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name(), "Bruno");

        let none = repo
            .search(&SearchFilter::Keyword("nobody".to_string()))
            .await
            .unwrap();
        assert!(none.is_empty());
    }
}
