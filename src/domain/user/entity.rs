//! User entity and related types

use chrono::{DateTime, Utc};
use serde::Serialize;

/// User identifier, assigned by the record store at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct UserId(i64);

impl UserId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Candidate record for creation; the id and timestamps are store-assigned
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub status: bool,
}

/// User record in the directory
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Unique identifier, immutable after creation
    id: UserId,
    /// Display name
    name: String,
    /// Email address, globally unique
    email: String,
    /// Phone number, globally unique when present
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<String>,
    /// Argon2 password hash - never exposed in serialization
    #[serde(skip_serializing)]
    password_hash: String,
    /// Whether the account is active
    status: bool,
    /// Creation timestamp
    created_at: DateTime<Utc>,
    /// Last update timestamp
    updated_at: DateTime<Utc>,
}

impl User {
    /// Assemble a newly created record around a store-assigned id
    pub fn new(id: UserId, draft: NewUser) -> Self {
        let now = Utc::now();

        Self {
            id,
            name: draft.name,
            email: draft.email,
            phone: draft.phone,
            password_hash: draft.password_hash,
            status: draft.status,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild a persisted record from its stored parts
    #[allow(clippy::too_many_arguments)]
    pub fn from_storage(
        id: UserId,
        name: String,
        email: String,
        phone: Option<String>,
        password_hash: String,
        status: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            email,
            phone,
            password_hash,
            status,
            created_at,
            updated_at,
        }
    }

    // Getters

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn status(&self) -> bool {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // Mutators

    /// Update the display name
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.touch();
    }

    /// Update the email address
    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
        self.touch();
    }

    /// Update the phone number
    pub fn set_phone(&mut self, phone: impl Into<String>) {
        self.phone = Some(phone.into());
        self.touch();
    }

    /// Update the password hash
    pub fn set_password_hash(&mut self, password_hash: impl Into<String>) {
        self.password_hash = password_hash.into();
        self.touch();
    }

    /// Toggle the active status
    pub fn set_status(&mut self, status: bool) {
        self.status = status;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_user(id: i64, name: &str, email: &str) -> User {
        User::new(
            UserId::new(id),
            NewUser {
                name: name.to_string(),
                email: email.to_string(),
                phone: None,
                password_hash: "hashed_password".to_string(),
                status: true,
            },
        )
    }

    #[test]
    fn test_user_creation() {
        let user = create_test_user(1, "Ana", "ana@example.com");

        assert_eq!(user.id().as_i64(), 1);
        assert_eq!(user.name(), "Ana");
        assert_eq!(user.email(), "ana@example.com");
        assert_eq!(user.phone(), None);
        assert_eq!(user.password_hash(), "hashed_password");
        assert!(user.status());
    }

    #[test]
    fn test_user_id_display() {
        assert_eq!(UserId::new(42).to_string(), "42");
    }

    #[test]
    fn test_user_mutators() {
        let mut user = create_test_user(1, "Ana", "ana@example.com");

        user.set_name("Anabel");
        user.set_email("anabel@example.com");
        user.set_phone("+15550001");
        user.set_status(false);

        assert_eq!(user.name(), "Anabel");
        assert_eq!(user.email(), "anabel@example.com");
        assert_eq!(user.phone(), Some("+15550001"));
        assert!(!user.status());
    }

    #[test]
    fn test_mutation_touches_updated_at() {
        let mut user = create_test_user(1, "Ana", "ana@example.com");
        let original_updated = user.updated_at();

        // Small delay to ensure timestamp differs
        std::thread::sleep(std::time::Duration::from_millis(10));

        user.set_password_hash("new_hash");
        assert_eq!(user.password_hash(), "new_hash");
        assert!(user.updated_at() > original_updated);
    }

    #[test]
    fn test_from_storage_preserves_timestamps() {
        let created = Utc::now() - chrono::Duration::days(3);
        let updated = Utc::now() - chrono::Duration::days(1);

        let user = User::from_storage(
            UserId::new(7),
            "Ana".to_string(),
            "ana@example.com".to_string(),
            Some("+15550001".to_string()),
            "hash".to_string(),
            false,
            created,
            updated,
        );

        assert_eq!(user.created_at(), created);
        assert_eq!(user.updated_at(), updated);
        assert!(!user.status());
    }

    #[test]
    fn test_user_serialization_excludes_password() {
        let user = create_test_user(1, "Ana", "ana@example.com");

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("hashed_password"));
        assert!(!json.contains("password_hash"));
        assert!(json.contains("ana@example.com"));
    }
}
