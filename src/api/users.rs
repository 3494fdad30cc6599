//! User directory endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::User;
use crate::infrastructure::user::{CreateUserRequest, SearchRequest, UpdateUserRequest};

/// Request to create a user
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserApiRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub password: String,
    #[serde(default)]
    pub status: Option<bool>,
}

/// Request to partially update a user; absent fields stay untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserApiRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: Option<bool>,
    pub password: Option<String>,
}

/// User response; the password hash never leaves the service
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub status: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().as_i64(),
            name: user.name().to_string(),
            email: user.email().to_string(),
            phone: user.phone().map(String::from),
            status: user.status(),
            created_at: user.created_at().to_rfc3339(),
            updated_at: user.updated_at().to_rfc3339(),
        }
    }
}

/// List users response
#[derive(Debug, Clone, Serialize)]
pub struct ListUsersResponse {
    pub users: Vec<UserResponse>,
    pub total: usize,
}

impl ListUsersResponse {
    fn from_users(users: &[User]) -> Self {
        let users: Vec<UserResponse> = users.iter().map(UserResponse::from).collect();
        let total = users.len();
        Self { users, total }
    }
}

/// Search query parameters; which ones apply depends on the configured
/// search mode
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    pub keyword: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// GET /users
pub async fn list_users(State(state): State<AppState>) -> Result<Json<ListUsersResponse>, ApiError> {
    debug!("Listing all users");

    let users = state.user_service.list().await.map_err(ApiError::from)?;

    Ok(Json(ListUsersResponse::from_users(&users)))
}

/// POST /users
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserApiRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    debug!(name = %request.name, "Creating user");

    let service_request = CreateUserRequest {
        name: request.name,
        email: request.email,
        phone: request.phone,
        password: request.password,
        status: request.status,
    };

    let user = state
        .user_service
        .create(service_request)
        .await
        .map_err(ApiError::from)?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// GET /users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    debug!(user_id = id, "Getting user");

    let user = state
        .user_service
        .get(id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found(format!("User '{}' not found", id)))?;

    Ok(Json(UserResponse::from(&user)))
}

/// PATCH /users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateUserApiRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    debug!(user_id = id, "Updating user");

    let service_request = UpdateUserRequest {
        name: request.name,
        email: request.email,
        phone: request.phone,
        status: request.status,
        password: request.password,
    };

    let user = state
        .user_service
        .update(id, service_request)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(UserResponse::from(&user)))
}

/// DELETE /users/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    debug!(user_id = id, "Deleting user");

    state.user_service.delete(id).await.map_err(ApiError::from)?;

    Ok(Json(serde_json::json!({
        "deleted": true,
        "id": id
    })))
}

/// GET /users/search
pub async fn search_users(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ListUsersResponse>, ApiError> {
    debug!(?params, "Searching users");

    let service_request = SearchRequest {
        keyword: params.keyword,
        name: params.name,
        email: params.email,
        phone: params.phone,
    };

    let matches = state
        .user_service
        .search(service_request)
        .await
        .map_err(ApiError::from)?;

    if matches.is_empty() && state.empty_search_is_not_found {
        return Err(ApiError::not_found("No users matched the search"));
    }

    Ok(Json(ListUsersResponse::from_users(&matches)))
}
