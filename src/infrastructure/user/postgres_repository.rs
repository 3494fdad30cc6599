//! PostgreSQL user repository implementation

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::domain::user::{NewUser, SearchFilter, User, UserId, UserRepository};
use crate::domain::DomainError;

const USER_COLUMNS: &str =
    "id, name, email, phone, password_hash, status, created_at, updated_at";

/// PostgreSQL implementation of `UserRepository`
///
/// The `users` table carries unique indexes on the uniqueness-governed
/// columns, so a write racing past the service's pre-check fails here and
/// is translated back into the same conflict outcome.
#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_by_column(&self, column: &str, value: &str) -> Result<Option<User>, DomainError> {
        let sql = format!("SELECT {} FROM users WHERE {} = $1", USER_COLUMNS, column);

        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                DomainError::storage(format!("Failed to look up user by {}: {}", column, e))
            })?;

        row.as_ref().map(row_to_user).transpose()
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn get(&self, id: UserId) -> Result<Option<User>, DomainError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        let row = sqlx::query(&sql)
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get user: {}", e)))?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<User>, DomainError> {
        self.find_by_column("name", name).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        self.find_by_column("email", email).await
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, DomainError> {
        self.find_by_column("phone", phone).await
    }

    async fn create(&self, draft: NewUser) -> Result<User, DomainError> {
        let sql = format!(
            r#"
            INSERT INTO users (name, email, phone, password_hash, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(&draft.name)
            .bind(&draft.email)
            .bind(&draft.phone)
            .bind(&draft.password_hash)
            .bind(draft.status)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| conflict_or_storage(e, "Failed to create user"))?;

        row_to_user(&row)
    }

    async fn update(&self, user: &User) -> Result<User, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = $2, email = $3, phone = $4, password_hash = $5,
                status = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(user.id().as_i64())
        .bind(user.name())
        .bind(user.email())
        .bind(user.phone())
        .bind(user.password_hash())
        .bind(user.status())
        .bind(user.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_or_storage(e, "Failed to update user"))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!(
                "User '{}' not found",
                user.id()
            )));
        }

        Ok(user.clone())
    }

    async fn delete(&self, id: UserId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete user: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> Result<Vec<User>, DomainError> {
        let sql = format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS);

        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to list users: {}", e)))?;

        rows.iter().map(row_to_user).collect()
    }

    async fn search(&self, filter: &SearchFilter) -> Result<Vec<User>, DomainError> {
        let (sql, patterns) = build_search_query(filter);

        let mut query = sqlx::query(&sql);
        for pattern in &patterns {
            query = query.bind(pattern);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to search users: {}", e)))?;

        rows.iter().map(row_to_user).collect()
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to count users: {}", e)))?;

        Ok(count as usize)
    }
}

fn row_to_user(row: &PgRow) -> Result<User, DomainError> {
    let read = |e: sqlx::Error| DomainError::storage(format!("Malformed user row: {}", e));

    Ok(User::from_storage(
        UserId::new(row.try_get("id").map_err(read)?),
        row.try_get("name").map_err(read)?,
        row.try_get("email").map_err(read)?,
        row.try_get("phone").map_err(read)?,
        row.try_get("password_hash").map_err(read)?,
        row.try_get("status").map_err(read)?,
        row.try_get("created_at").map_err(read)?,
        row.try_get("updated_at").map_err(read)?,
    ))
}

/// Translate a unique-constraint violation into the conflict the
/// uniqueness pre-check would have reported; anything else is a storage
/// failure.
fn conflict_or_storage(error: sqlx::Error, context: &str) -> DomainError {
    let msg = error.to_string();

    match unique_violation_field(&msg) {
        Some(field) => {
            DomainError::conflict(field, format!("{} already exists", capitalize(field)))
        }
        None => DomainError::storage(format!("{}: {}", context, msg)),
    }
}

fn unique_violation_field(msg: &str) -> Option<&'static str> {
    if !msg.contains("duplicate key") && !msg.contains("unique constraint") {
        return None;
    }

    if msg.contains("users_name_key") {
        Some("name")
    } else if msg.contains("users_email_key") {
        Some("email")
    } else if msg.contains("users_phone_key") {
        Some("phone")
    } else {
        None
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn build_search_query(filter: &SearchFilter) -> (String, Vec<String>) {
    let mut sql = format!("SELECT {} FROM users", USER_COLUMNS);
    let mut patterns = Vec::new();

    match filter {
        SearchFilter::Keyword(term) => {
            patterns.push(like_pattern(term));
            sql.push_str(" WHERE name ILIKE $1 OR email ILIKE $1 OR phone ILIKE $1");
        }
        SearchFilter::Faceted { name, email, phone } => {
            let mut clauses = Vec::new();

            for (column, value) in [("name", name), ("email", email), ("phone", phone)] {
                if let Some(term) = value {
                    patterns.push(like_pattern(term));
                    clauses.push(format!("{} ILIKE ${}", column, patterns.len()));
                }
            }

            if !clauses.is_empty() {
                sql.push_str(" WHERE ");
                sql.push_str(&clauses.join(" AND "));
            }
        }
    }

    sql.push_str(" ORDER BY id");
    (sql, patterns)
}

/// Wrap a term in `%` wildcards, escaping any LIKE metacharacters in it
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("ana"), "%ana%");
        assert_eq!(like_pattern("50%"), "%50\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_unique_violation_field() {
        let email_err = r#"error returned from database: duplicate key value violates unique constraint "users_email_key""#;
        assert_eq!(unique_violation_field(email_err), Some("email"));

        let phone_err = r#"duplicate key value violates unique constraint "users_phone_key""#;
        assert_eq!(unique_violation_field(phone_err), Some("phone"));

        let name_err = r#"duplicate key value violates unique constraint "users_name_key""#;
        assert_eq!(unique_violation_field(name_err), Some("name"));

        assert_eq!(unique_violation_field("connection refused"), None);
        // Unique violation on an unknown constraint is not a conflict we
        // can attribute to a field
        assert_eq!(
            unique_violation_field(r#"duplicate key value violates unique constraint "other""#),
            None
        );
    }

    #[test]
    fn test_keyword_search_query() {
        let (sql, patterns) = build_search_query(&SearchFilter::Keyword("ana".to_string()));

        assert!(sql.contains("name ILIKE $1 OR email ILIKE $1 OR phone ILIKE $1"));
        assert!(sql.ends_with("ORDER BY id"));
        assert_eq!(patterns, vec!["%ana%".to_string()]);
    }

    #[test]
    fn test_faceted_search_query_numbers_binds() {
        let (sql, patterns) = build_search_query(&SearchFilter::Faceted {
            name: Some("ana".to_string()),
            email: None,
            phone: Some("555".to_string()),
        });

        assert!(sql.contains("name ILIKE $1 AND phone ILIKE $2"));
        assert_eq!(patterns.len(), 2);
    }

    #[test]
    fn test_faceted_search_query_without_filters() {
        let (sql, patterns) = build_search_query(&SearchFilter::Faceted {
            name: None,
            email: None,
            phone: None,
        });

        assert!(!sql.contains("WHERE"));
        assert!(patterns.is_empty());
    }
}
