//! User directory service

use std::sync::Arc;

use crate::config::DirectoryConfig;
use crate::domain::user::{
    NewUser, SearchFilter, SearchMode, User, UserId, UserRepository, normalize_email,
    validate_email, validate_name, validate_password, validate_phone,
};
use crate::domain::{DomainError, FieldError};

use super::password::PasswordHasher;

/// Request for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
    pub status: Option<bool>,
}

/// Partial update request; absent fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: Option<bool>,
    pub password: Option<String>,
}

/// Raw search parameters, resolved against the configured search mode
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub keyword: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Orchestrates validation, uniqueness enforcement, hashing and storage
/// into the directory operations
#[derive(Debug)]
pub struct UserService<R: UserRepository, H: PasswordHasher> {
    repository: Arc<R>,
    hasher: Arc<H>,
    config: DirectoryConfig,
}

impl<R: UserRepository, H: PasswordHasher> UserService<R, H> {
    /// Create a new user service
    pub fn new(repository: Arc<R>, hasher: Arc<H>, config: DirectoryConfig) -> Self {
        Self {
            repository,
            hasher,
            config,
        }
    }

    /// Create a new user record
    pub async fn create(&self, request: CreateUserRequest) -> Result<User, DomainError> {
        let email = normalize_email(&request.email);

        let mut errors = Vec::new();

        if let Err(e) = validate_name(&request.name) {
            errors.push(FieldError::new("name", e.to_string()));
        }
        if let Err(e) = validate_email(&email) {
            errors.push(FieldError::new("email", e.to_string()));
        }
        if let Some(phone) = &request.phone {
            if let Err(e) = validate_phone(phone) {
                errors.push(FieldError::new("phone", e.to_string()));
            }
        }
        if let Err(e) = validate_password(&request.password) {
            errors.push(FieldError::new("password", e.to_string()));
        }

        if !errors.is_empty() {
            return Err(DomainError::validation(errors));
        }

        // Conflicts abort before any hashing happens
        self.ensure_unique(
            Some(&request.name),
            Some(&email),
            request.phone.as_deref(),
            None,
        )
        .await?;

        let password_hash = self.hasher.hash(&request.password)?;

        self.repository
            .create(NewUser {
                name: request.name,
                email,
                phone: request.phone,
                password_hash,
                status: request.status.unwrap_or(true),
            })
            .await
    }

    /// Get a user by id
    pub async fn get(&self, id: i64) -> Result<Option<User>, DomainError> {
        self.repository.get(UserId::new(id)).await
    }

    /// List all users
    pub async fn list(&self) -> Result<Vec<User>, DomainError> {
        self.repository.list().await
    }

    /// Apply a partial update to an existing user
    pub async fn update(&self, id: i64, request: UpdateUserRequest) -> Result<User, DomainError> {
        let user_id = UserId::new(id);

        let Some(mut user) = self.repository.get(user_id).await? else {
            return Err(DomainError::not_found(format!("User '{}' not found", id)));
        };

        let email = request.email.as_deref().map(normalize_email);

        let mut errors = Vec::new();

        if let Some(name) = &request.name {
            if let Err(e) = validate_name(name) {
                errors.push(FieldError::new("name", e.to_string()));
            }
        }
        if let Some(email) = &email {
            if let Err(e) = validate_email(email) {
                errors.push(FieldError::new("email", e.to_string()));
            }
        }
        if let Some(phone) = &request.phone {
            if let Err(e) = validate_phone(phone) {
                errors.push(FieldError::new("phone", e.to_string()));
            }
        }
        if let Some(password) = &request.password {
            if let Err(e) = validate_password(password) {
                errors.push(FieldError::new("password", e.to_string()));
            }
        }

        if !errors.is_empty() {
            return Err(DomainError::validation(errors));
        }

        // Only changed values can conflict; keeping an own value is
        // always admissible
        let changed_name = request
            .name
            .as_deref()
            .filter(|n| *n != user.name());
        let changed_email = email.as_deref().filter(|e| *e != user.email());
        let changed_phone = request
            .phone
            .as_deref()
            .filter(|p| Some(*p) != user.phone());

        self.ensure_unique(changed_name, changed_email, changed_phone, Some(user_id))
            .await?;

        if let Some(name) = request.name {
            user.set_name(name);
        }
        if let Some(email) = email {
            user.set_email(email);
        }
        if let Some(phone) = request.phone {
            user.set_phone(phone);
        }
        if let Some(status) = request.status {
            user.set_status(status);
        }
        if let Some(password) = request.password {
            let password_hash = self.hasher.hash(&password)?;
            user.set_password_hash(password_hash);
        }

        self.repository.update(&user).await
    }

    /// Delete a user by id
    pub async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let user_id = UserId::new(id);

        if self.repository.get(user_id).await?.is_none() {
            return Err(DomainError::not_found(format!("User '{}' not found", id)));
        }

        if !self.repository.delete(user_id).await? {
            // Lost a race with a concurrent delete
            return Err(DomainError::not_found(format!("User '{}' not found", id)));
        }

        Ok(())
    }

    /// Count all users
    pub async fn count(&self) -> Result<usize, DomainError> {
        self.repository.count().await
    }

    /// Search the directory with the configured mode
    pub async fn search(&self, request: SearchRequest) -> Result<Vec<User>, DomainError> {
        let filter = self.resolve_filter(request)?;
        self.repository.search(&filter).await
    }

    /// Check the uniqueness-governed fields in declaration order
    /// (name, email, phone); the first conflicting field wins. `excluding`
    /// exempts the record currently being updated.
    async fn ensure_unique(
        &self,
        name: Option<&str>,
        email: Option<&str>,
        phone: Option<&str>,
        excluding: Option<UserId>,
    ) -> Result<(), DomainError> {
        if self.config.unique_name {
            if let Some(name) = name {
                if let Some(holder) = self.repository.find_by_name(name).await? {
                    if Some(holder.id()) != excluding {
                        return Err(DomainError::conflict(
                            "name",
                            format!("Name '{}' already exists", name),
                        ));
                    }
                }
            }
        }

        if let Some(email) = email {
            if let Some(holder) = self.repository.find_by_email(email).await? {
                if Some(holder.id()) != excluding {
                    return Err(DomainError::conflict(
                        "email",
                        format!("Email '{}' already exists", email),
                    ));
                }
            }
        }

        if self.config.unique_phone {
            if let Some(phone) = phone {
                if let Some(holder) = self.repository.find_by_phone(phone).await? {
                    if Some(holder.id()) != excluding {
                        return Err(DomainError::conflict(
                            "phone",
                            format!("Phone '{}' already exists", phone),
                        ));
                    }
                }
            }
        }

        Ok(())
    }

    fn resolve_filter(&self, request: SearchRequest) -> Result<SearchFilter, DomainError> {
        match self.config.search_mode {
            SearchMode::Keyword => {
                let keyword = request
                    .keyword
                    .filter(|k| !k.trim().is_empty())
                    .ok_or_else(|| DomainError::invalid_field("keyword", "Keyword is required"))?;

                Ok(SearchFilter::Keyword(keyword))
            }
            SearchMode::Faceted => Ok(SearchFilter::Faceted {
                name: request.name,
                email: request.email,
                phone: request.phone,
            }),
        }
    }
}
