//! Search filters over the user directory

use serde::Deserialize;

use super::entity::User;

/// How search filters combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// One free-text term matched with OR across name, email and phone
    #[default]
    Keyword,
    /// Independent per-field filters combined with AND
    Faceted,
}

/// Resolved search filter handed to the record store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchFilter {
    /// Substring match against name, email or phone
    Keyword(String),
    /// Per-field substring filters; `None` leaves a field unconstrained
    Faceted {
        name: Option<String>,
        email: Option<String>,
        phone: Option<String>,
    },
}

impl SearchFilter {
    /// Case-insensitive substring check, used by the in-memory store
    pub fn matches(&self, user: &User) -> bool {
        match self {
            Self::Keyword(term) => {
                contains_ci(user.name(), term)
                    || contains_ci(user.email(), term)
                    || user.phone().is_some_and(|p| contains_ci(p, term))
            }
            Self::Faceted { name, email, phone } => {
                let name_ok = name.as_deref().is_none_or(|t| contains_ci(user.name(), t));
                let email_ok = email
                    .as_deref()
                    .is_none_or(|t| contains_ci(user.email(), t));
                let phone_ok = phone
                    .as_deref()
                    .is_none_or(|t| user.phone().is_some_and(|p| contains_ci(p, t)));

                name_ok && email_ok && phone_ok
            }
        }
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::entity::{NewUser, UserId};

    fn test_user(name: &str, email: &str, phone: Option<&str>) -> User {
        User::new(
            UserId::new(1),
            NewUser {
                name: name.to_string(),
                email: email.to_string(),
                phone: phone.map(String::from),
                password_hash: "hash".to_string(),
                status: true,
            },
        )
    }

    #[test]
    fn test_keyword_matches_any_field() {
        let user = test_user("Ana", "ana@example.com", Some("+15550001"));

        assert!(SearchFilter::Keyword("ana".to_string()).matches(&user));
        assert!(SearchFilter::Keyword("example".to_string()).matches(&user));
        assert!(SearchFilter::Keyword("5550".to_string()).matches(&user));
        assert!(!SearchFilter::Keyword("bruno".to_string()).matches(&user));
    }

    #[test]
    fn test_keyword_is_case_insensitive() {
        let user = test_user("Ana", "ana@example.com", None);

        assert!(SearchFilter::Keyword("ANA".to_string()).matches(&user));
        assert!(SearchFilter::Keyword("Example.COM".to_string()).matches(&user));
    }

    #[test]
    fn test_keyword_against_missing_phone() {
        let user = test_user("Ana", "ana@example.com", None);

        assert!(!SearchFilter::Keyword("555".to_string()).matches(&user));
    }

    #[test]
    fn test_faceted_combines_with_and() {
        let user = test_user("Ana", "ana@example.com", Some("+15550001"));

        let both_match = SearchFilter::Faceted {
            name: Some("an".to_string()),
            email: Some("example".to_string()),
            phone: None,
        };
        assert!(both_match.matches(&user));

        let one_misses = SearchFilter::Faceted {
            name: Some("an".to_string()),
            email: Some("other.org".to_string()),
            phone: None,
        };
        assert!(!one_misses.matches(&user));
    }

    #[test]
    fn test_faceted_phone_filter_skips_phoneless_records() {
        let user = test_user("Ana", "ana@example.com", None);

        let filter = SearchFilter::Faceted {
            name: None,
            email: None,
            phone: Some("555".to_string()),
        };
        assert!(!filter.matches(&user));
    }

    #[test]
    fn test_faceted_without_filters_matches_everything() {
        let user = test_user("Ana", "ana@example.com", None);

        let filter = SearchFilter::Faceted {
            name: None,
            email: None,
            phone: None,
        };
        assert!(filter.matches(&user));
    }
}
