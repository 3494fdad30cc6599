//! Application state for shared services

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{DomainError, User, UserRepository};
use crate::infrastructure::user::{
    CreateUserRequest, PasswordHasher, SearchRequest, UpdateUserRequest, UserService,
};

/// Application state shared across handlers, using dynamic dispatch so
/// deployments can swap the storage backend
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<dyn UserDirectory>,
    /// Search policy: report an empty result set as 404 instead of an
    /// empty 200 body
    pub empty_search_is_not_found: bool,
}

impl AppState {
    pub fn new(user_service: Arc<dyn UserDirectory>, empty_search_is_not_found: bool) -> Self {
        Self {
            user_service,
            empty_search_is_not_found,
        }
    }
}

/// Object-safe view of the directory service operations
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn create(&self, request: CreateUserRequest) -> Result<User, DomainError>;
    async fn get(&self, id: i64) -> Result<Option<User>, DomainError>;
    async fn list(&self) -> Result<Vec<User>, DomainError>;
    async fn update(&self, id: i64, request: UpdateUserRequest) -> Result<User, DomainError>;
    async fn delete(&self, id: i64) -> Result<(), DomainError>;
    async fn search(&self, request: SearchRequest) -> Result<Vec<User>, DomainError>;
    async fn count(&self) -> Result<usize, DomainError>;
}

#[async_trait]
impl<R, H> UserDirectory for UserService<R, H>
where
    R: UserRepository + 'static,
    H: PasswordHasher + 'static,
{
    async fn create(&self, request: CreateUserRequest) -> Result<User, DomainError> {
        UserService::create(self, request).await
    }

    async fn get(&self, id: i64) -> Result<Option<User>, DomainError> {
        UserService::get(self, id).await
    }

    async fn list(&self) -> Result<Vec<User>, DomainError> {
        UserService::list(self).await
    }

    async fn update(&self, id: i64, request: UpdateUserRequest) -> Result<User, DomainError> {
        UserService::update(self, id, request).await
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        UserService::delete(self, id).await
    }

    async fn search(&self, request: SearchRequest) -> Result<Vec<User>, DomainError> {
        UserService::search(self, request).await
    }

    async fn count(&self) -> Result<usize, DomainError> {
        UserService::count(self).await
    }
}
