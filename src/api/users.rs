use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::api::extract::{non_blank, path_id, ApiJson, ApiQuery, Validator};
use crate::api::views::UserView;
use crate::app::AppState;
use crate::auth::models::Role;
use crate::db::models::{User, UserFields};
use crate::db::Repositories;
use crate::error::{AppError, Resource};

/// Request body for creating or replacing a user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPayload {
    pub email: Option<String>,
    pub role: Option<String>,
    pub building: Option<String>,
    pub floor: Option<String>,
}

impl UserPayload {
    pub fn validate(self) -> Result<UserFields, AppError> {
        let mut v = Validator::default();
        let email = v.required_string("email", self.email, "Email");
        if let Some(email) = &email {
            if !is_plausible_email(email) {
                v.issue("email", "Invalid email");
            }
        }
        let role = v
            .required_string("role", self.role, "Role")
            .and_then(|raw| match Role::from_str_ci(&raw) {
                Some(role) => Some(role),
                None => {
                    v.issue("role", "Role must be one of admin, student, custodian");
                    None
                }
            });
        let building = v.optional_object_id("building", self.building, "Building");
        match (email, role) {
            (Some(email), Some(role)) if v.is_clean() => Ok(UserFields {
                email,
                role,
                building,
                floor: non_blank(self.floor),
            }),
            _ => Err(v.into_error()),
        }
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.contains('@'),
        None => false,
    }
}

/// `?email=` for user lookup.
#[derive(Debug, Default, Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}

pub async fn process_create_user(
    repos: &Repositories,
    fields: UserFields,
) -> Result<UserView, AppError> {
    let user = User::new(fields);
    repos.users.insert(&user).await?;
    tracing::info!(user_id = %user.id, role = %user.role, "user created");
    Ok(user.into())
}

pub async fn process_get_user_by_email(
    repos: &Repositories,
    email: &str,
) -> Result<UserView, AppError> {
    repos
        .users
        .find_by_email(email.trim())
        .await?
        .map(UserView::from)
        .ok_or(AppError::NotFound(Resource::User))
}

pub async fn process_update_user(
    repos: &Repositories,
    id: ObjectId,
    fields: UserFields,
) -> Result<UserView, AppError> {
    repos
        .users
        .update(id, fields)
        .await?
        .map(UserView::from)
        .ok_or(AppError::NotFound(Resource::User))
}

/// Delete a user. Requests filed by the user are kept.
pub async fn process_delete_user(repos: &Repositories, id: ObjectId) -> Result<(), AppError> {
    if !repos.users.delete(id).await? {
        return Err(AppError::NotFound(Resource::User));
    }
    tracing::info!(user_id = %id, "user deleted");
    Ok(())
}

/// Axum handler for `POST /api/user`.
pub async fn create_user_handler(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<UserPayload>,
) -> Result<(StatusCode, Json<UserView>), AppError> {
    let fields = payload.validate()?;
    let user = process_create_user(&state.repos, fields).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Axum handler for `GET /api/user?email=`.
pub async fn get_user_handler(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<EmailQuery>,
) -> Result<Json<UserView>, AppError> {
    let mut v = Validator::default();
    let email = v
        .required_string("email", query.email, "Email")
        .ok_or_else(|| v.into_error())?;
    Ok(Json(process_get_user_by_email(&state.repos, &email).await?))
}

/// Axum handler for `PUT /api/user/{id}`.
pub async fn update_user_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UserPayload>,
) -> Result<Json<UserView>, AppError> {
    let id = path_id(&id, Resource::User)?;
    let fields = payload.validate()?;
    Ok(Json(process_update_user(&state.repos, id, fields).await?))
}

/// Axum handler for `DELETE /api/user/{id}`.
pub async fn delete_user_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = path_id(&id, Resource::User)?;
    process_delete_user(&state.repos, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
