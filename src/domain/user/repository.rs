//! User repository trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::entity::{NewUser, User, UserId};
use super::search::SearchFilter;
use crate::domain::DomainError;

/// Repository trait for user record storage
///
/// Implementations own the durable record set and must enforce the
/// uniqueness invariants as hard constraints at write time: a create or
/// update that would duplicate a uniqueness-governed value fails with
/// `DomainError::Conflict` naming the field, even when the caller's
/// pre-check raced with a concurrent write.
#[async_trait]
pub trait UserRepository: Send + Sync + Debug {
    /// Get a user by id
    async fn get(&self, id: UserId) -> Result<Option<User>, DomainError>;

    /// Find the holder of an exact name value
    async fn find_by_name(&self, name: &str) -> Result<Option<User>, DomainError>;

    /// Find the holder of an exact email value
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;

    /// Find the holder of an exact phone value
    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, DomainError>;

    /// Persist a candidate record, assigning its id
    async fn create(&self, draft: NewUser) -> Result<User, DomainError>;

    /// Replace the stored record with the given one, matched by id
    async fn update(&self, user: &User) -> Result<User, DomainError>;

    /// Delete a user; returns whether a record was removed
    async fn delete(&self, id: UserId) -> Result<bool, DomainError>;

    /// List all users
    async fn list(&self) -> Result<Vec<User>, DomainError>;

    /// Return the records matching a search filter; an empty result is
    /// a successful outcome
    async fn search(&self, filter: &SearchFilter) -> Result<Vec<User>, DomainError>;

    /// Count all users
    async fn count(&self) -> Result<usize, DomainError>;
}
